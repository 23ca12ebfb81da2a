//! Informatie- en doorgeefblokken.

use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::graph::block::{Block, InputPin, OutputPin};
use crate::graph::context::EvalContext;
use crate::graph::evaluator::GeometryBuild;
use crate::graph::value::{PointType, Value};

use super::coerce::coerce_geometry;
use super::{BuildResult, OutputMap, Registration, single_output};

pub const PIN_OUTPUT: &str = "output";
const PIN_GEOMETRY: &str = "geometry";
const PIN_INPUT: &str = "input";
const PIN_ID: &str = "id";
const PIN_COLLECTION_ID: &str = "collectionId";
const PIN_VERTICES_COUNT: &str = "verticesCount";
const PIN_FACES_COUNT: &str = "facesCount";

/// Leest kengetallen van een geometrie af.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct InfoBlock {}

/// Doorgeefpunt zonder eigen gedrag; handig om draden te ordenen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ElbowBlock {}

/// Beschikbare informatieblokken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockKind {
    Info(InfoBlock),
    Elbow(ElbowBlock),
}

pub const REGISTRATIONS: &[Registration] = &[
    Registration {
        class_name: "GeometryInfoBlock",
        make: || super::BlockKind::Info(BlockKind::Info(InfoBlock {})),
    },
    Registration {
        class_name: "GeometryElbowBlock",
        make: || super::BlockKind::Info(BlockKind::Elbow(ElbowBlock {})),
    },
];

impl BlockKind {
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Info(_) => "GeometryInfoBlock",
            Self::Elbow(_) => "GeometryElbowBlock",
        }
    }

    #[must_use]
    pub fn input_pins(&self) -> Vec<InputPin> {
        match self {
            Self::Info(_) => vec![InputPin::new(
                PIN_GEOMETRY,
                PointType::Geometry,
                Value::Null,
            )],
            Self::Elbow(_) => vec![InputPin::new(PIN_INPUT, PointType::AutoDetect, Value::Null)],
        }
    }

    #[must_use]
    pub fn output_pins(&self) -> Vec<OutputPin> {
        match self {
            Self::Info(_) => vec![
                OutputPin::new(PIN_OUTPUT, PointType::Geometry),
                OutputPin::new(PIN_ID, PointType::Int),
                OutputPin::new(PIN_COLLECTION_ID, PointType::Int),
                OutputPin::new(PIN_VERTICES_COUNT, PointType::Int),
                OutputPin::new(PIN_FACES_COUNT, PointType::Int),
            ],
            Self::Elbow(_) => vec![OutputPin::new(PIN_OUTPUT, PointType::BasedOnInput)],
        }
    }

    #[must_use]
    pub fn evaluate_context(&self) -> bool {
        true
    }

    pub fn build(
        &self,
        graph: &Graph,
        block: &Block,
        state: &mut GeometryBuild,
        ctx: &EvalContext<'_>,
    ) -> BuildResult {
        match self {
            Self::Info(_) => {
                let input = state.input_value(graph, block, PIN_GEOMETRY, ctx)?;
                let Some(geometry) = coerce_geometry(input) else {
                    return Ok(OutputMap::from([
                        (PIN_OUTPUT.to_owned(), Value::Null),
                        (PIN_ID.to_owned(), Value::Null),
                        (PIN_COLLECTION_ID.to_owned(), Value::Null),
                        (PIN_VERTICES_COUNT.to_owned(), Value::Null),
                        (PIN_FACES_COUNT.to_owned(), Value::Null),
                    ]));
                };

                let id = i64::try_from(geometry.metadata.unique_id).unwrap_or(i64::MAX);
                let collection_id = geometry.metadata.collection_id.unwrap_or(0);
                let vertices = i64::try_from(geometry.vertex_count()).unwrap_or(i64::MAX);
                let faces = i64::try_from(geometry.triangle_count()).unwrap_or(i64::MAX);
                Ok(OutputMap::from([
                    (PIN_OUTPUT.to_owned(), Value::Geometry(geometry)),
                    (PIN_ID.to_owned(), Value::Int(id)),
                    (PIN_COLLECTION_ID.to_owned(), Value::Int(collection_id)),
                    (PIN_VERTICES_COUNT.to_owned(), Value::Int(vertices)),
                    (PIN_FACES_COUNT.to_owned(), Value::Int(faces)),
                ]))
            }
            Self::Elbow(_) => {
                let input = state.input_value(graph, block, PIN_INPUT, ctx)?;
                Ok(single_output(PIN_OUTPUT, input))
            }
        }
    }

    pub fn serialize_properties(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::Info(settings) => serde_json::to_value(settings),
            Self::Elbow(settings) => serde_json::to_value(settings),
        }
    }

    pub fn apply_properties(&mut self, properties: &serde_json::Value) -> serde_json::Result<()> {
        match self {
            Self::Info(settings) => *settings = serde_json::from_value(properties.clone())?,
            Self::Elbow(settings) => *settings = serde_json::from_value(properties.clone())?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_exposes_counts_and_ids() {
        let kind = BlockKind::Info(InfoBlock {});
        let names: Vec<_> = kind.output_pins().iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec![
                PIN_OUTPUT,
                PIN_ID,
                PIN_COLLECTION_ID,
                PIN_VERTICES_COUNT,
                PIN_FACES_COUNT
            ]
        );
    }

    #[test]
    fn elbow_routes_a_single_auto_pin() {
        let kind = BlockKind::Elbow(ElbowBlock {});
        let inputs = kind.input_pins();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].point_type, PointType::AutoDetect);
        assert_eq!(kind.output_pins()[0].point_type, PointType::BasedOnInput);
    }
}
