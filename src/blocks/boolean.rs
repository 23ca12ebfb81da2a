//! CSG-blok: doorsnede, verschil en vereniging van twee geometrieën.

use serde::{Deserialize, Serialize};

use crate::geom::{self, BooleanOperation};
use crate::graph::Graph;
use crate::graph::block::{Block, InputPin, OutputPin};
use crate::graph::context::EvalContext;
use crate::graph::evaluator::GeometryBuild;
use crate::graph::value::{PointType, Value};

use super::coerce::coerce_geometry;
use super::{BuildResult, Registration, single_output};

pub const PIN_OUTPUT: &str = "output";
const PIN_GEOMETRY_0: &str = "geometry0";
const PIN_GEOMETRY_1: &str = "geometry1";

/// Eigenschappen van een `BooleanGeometryBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct BooleanBlock {
    pub operation: BooleanOperation,
    pub evaluate_context: bool,
}

impl Default for BooleanBlock {
    fn default() -> Self {
        Self {
            operation: BooleanOperation::Intersect,
            evaluate_context: true,
        }
    }
}

pub const REGISTRATIONS: &[Registration] = &[Registration {
    class_name: "BooleanGeometryBlock",
    make: || super::BlockKind::Boolean(BooleanBlock::default()),
}];

impl BooleanBlock {
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        "BooleanGeometryBlock"
    }

    #[must_use]
    pub fn input_pins(&self) -> Vec<InputPin> {
        vec![
            InputPin::new(PIN_GEOMETRY_0, PointType::Geometry, Value::Null),
            InputPin::new(PIN_GEOMETRY_1, PointType::Geometry, Value::Null),
        ]
    }

    #[must_use]
    pub fn output_pins(&self) -> Vec<OutputPin> {
        vec![OutputPin::new(PIN_OUTPUT, PointType::Geometry)]
    }

    #[must_use]
    pub fn evaluate_context(&self) -> bool {
        self.evaluate_context
    }

    pub fn build(
        &self,
        graph: &Graph,
        block: &Block,
        state: &mut GeometryBuild,
        ctx: &EvalContext<'_>,
    ) -> BuildResult {
        let left = state.input_value(graph, block, PIN_GEOMETRY_0, ctx)?;
        let right = state.input_value(graph, block, PIN_GEOMETRY_1, ctx)?;
        let (Some(left), Some(right)) = (coerce_geometry(left), coerce_geometry(right)) else {
            return Ok(single_output(PIN_OUTPUT, Value::Null));
        };

        let value = match geom::boolean(&left, &right, self.operation) {
            // Een operatie kan alles wegsnijden; dat is gewoon "geen geometrie".
            Ok(result) if result.is_empty() => Value::Null,
            Ok(mut result) => {
                result.metadata.unique_id = state.fresh_geometry_id();
                Value::Geometry(result)
            }
            Err(error) => {
                log::warn!("csg-operatie mislukt op blok {}: {error}", block.id);
                Value::Null
            }
        };
        Ok(single_output(PIN_OUTPUT, value))
    }

    pub fn serialize_properties(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub fn apply_properties(&mut self, properties: &serde_json::Value) -> serde_json::Result<()> {
        *self = serde_json::from_value(properties.clone())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_two_required_geometries() {
        let block = BooleanBlock::default();
        let pins = block.input_pins();
        assert_eq!(pins.len(), 2);
        assert!(pins.iter().all(|pin| !pin.optional));
        assert!(
            pins.iter()
                .all(|pin| pin.point_type == PointType::Geometry)
        );
    }

    #[test]
    fn operation_round_trips_through_properties() {
        let mut block = BooleanBlock::default();
        let json = serde_json::json!({ "operation": "Union", "evaluateContext": false });
        block.apply_properties(&json).unwrap();
        assert_eq!(block.operation, BooleanOperation::Union);
        assert!(!block.evaluate_context());
        assert_eq!(block.serialize_properties().unwrap(), json);
    }
}
