//! Verzamelblok: kiest per evaluatie één geometrie uit maximaal tien
//! aangesloten kandidaten.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geom::VertexData;
use crate::graph::Graph;
use crate::graph::block::{Block, InputPin, OutputPin};
use crate::graph::context::EvalContext;
use crate::graph::evaluator::GeometryBuild;
use crate::graph::value::{PointType, Value};

use super::coerce::coerce_geometry;
use super::{BuildResult, Registration, single_output};

pub const PIN_OUTPUT: &str = "output";

const GEOMETRY_PINS: [&str; 10] = [
    "geometry0",
    "geometry1",
    "geometry2",
    "geometry3",
    "geometry4",
    "geometry5",
    "geometry6",
    "geometry7",
    "geometry8",
    "geometry9",
];

/// Eigenschappen van een `GeometryCollectionBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct CollectionBlock {
    pub evaluate_context: bool,
}

impl Default for CollectionBlock {
    fn default() -> Self {
        Self {
            evaluate_context: true,
        }
    }
}

pub const REGISTRATIONS: &[Registration] = &[Registration {
    class_name: "GeometryCollectionBlock",
    make: || super::BlockKind::Collection(CollectionBlock::default()),
}];

impl CollectionBlock {
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        "GeometryCollectionBlock"
    }

    #[must_use]
    pub fn input_pins(&self) -> Vec<InputPin> {
        GEOMETRY_PINS
            .iter()
            .map(|name| InputPin::new(name, PointType::Geometry, Value::Null).as_optional())
            .collect()
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
        let mut candidates: Vec<VertexData> = Vec::new();
        for (slot, pin) in GEOMETRY_PINS.iter().enumerate() {
            if !state.has_connection(block.id, pin) {
                continue;
            }
            let value = state.input_value(graph, block, pin, ctx)?;
            let Some(mut geometry) = coerce_geometry(value) else {
                continue;
            };
            geometry.metadata.collection_id = Some(slot as i64);
            candidates.push(geometry);
        }

        if candidates.is_empty() {
            return Ok(single_output(PIN_OUTPUT, Value::Null));
        }
        let index = state.rng().random_range(0..candidates.len());
        let chosen = candidates.swap_remove(index);
        Ok(single_output(PIN_OUTPUT, Value::Geometry(chosen)))
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
    fn exposes_ten_optional_geometry_slots() {
        let block = CollectionBlock::default();
        let pins = block.input_pins();
        assert_eq!(pins.len(), 10);
        assert_eq!(pins[0].name, "geometry0");
        assert_eq!(pins[9].name, "geometry9");
        assert!(pins.iter().all(|pin| pin.optional));
        assert!(
            pins.iter()
                .all(|pin| pin.point_type == PointType::Geometry)
        );
    }

    #[test]
    fn properties_round_trip() {
        let mut block = CollectionBlock::default();
        assert!(block.evaluate_context());

        let json = serde_json::json!({ "evaluateContext": false });
        block.apply_properties(&json).unwrap();
        assert!(!block.evaluate_context());
        assert_eq!(block.serialize_properties().unwrap(), json);
    }
}
