//! Het eindpunt van de graph: hier wordt de uiteindelijke geometrie
//! afgeleverd.

use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::graph::block::{Block, InputPin, OutputPin};
use crate::graph::context::EvalContext;
use crate::graph::evaluator::GeometryBuild;
use crate::graph::value::{PointType, Value};

use super::{BuildResult, OutputMap, Registration};

pub const PIN_GEOMETRY: &str = "geometry";

/// Eigenschappen van een `GeometryOutputBlock`; het blok heeft er geen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct OutputBlock {}

pub const REGISTRATIONS: &[Registration] = &[Registration {
    class_name: "GeometryOutputBlock",
    make: || super::BlockKind::Output(OutputBlock {}),
}];

impl OutputBlock {
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        "GeometryOutputBlock"
    }

    #[must_use]
    pub fn input_pins(&self) -> Vec<InputPin> {
        vec![InputPin::new(PIN_GEOMETRY, PointType::Geometry, Value::Null)]
    }

    /// Een eindblok heeft niets om door te geven.
    #[must_use]
    pub fn output_pins(&self) -> Vec<OutputPin> {
        Vec::new()
    }

    #[must_use]
    pub fn evaluate_context(&self) -> bool {
        true
    }

    /// De buildpass leest de `geometry`-ingang zelf uit; dit blok produceert
    /// geen eigen uitvoer.
    pub fn build(
        &self,
        _graph: &Graph,
        _block: &Block,
        _state: &mut GeometryBuild,
        _ctx: &EvalContext<'_>,
    ) -> BuildResult {
        Ok(OutputMap::new())
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
    fn sink_has_one_input_and_no_outputs() {
        let block = OutputBlock {};
        assert_eq!(block.input_pins().len(), 1);
        assert_eq!(block.input_pins()[0].name, PIN_GEOMETRY);
        assert!(block.output_pins().is_empty());
    }
}
