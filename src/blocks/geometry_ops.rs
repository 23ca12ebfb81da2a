//! Bewerkingsblokken op bestaande geometrie: normalen, wellen,
//! transformeren en samenvoegen.

use serde::{Deserialize, Serialize};

use crate::geom::{Quat, Tolerance, Transform, Vec3, VertexData};
use crate::graph::Graph;
use crate::graph::block::{Block, InputPin, OutputPin};
use crate::graph::context::EvalContext;
use crate::graph::evaluator::GeometryBuild;
use crate::graph::value::{PointType, Value};

use super::coerce::{coerce_geometry, coerce_matrix, coerce_vector3};
use super::{BuildResult, Registration, single_output};

pub const PIN_OUTPUT: &str = "output";
const PIN_GEOMETRY: &str = "geometry";
const PIN_MATRIX: &str = "matrix";
const PIN_TRANSLATION: &str = "translation";
const PIN_ROTATION: &str = "rotation";
const PIN_SCALING: &str = "scaling";

const MERGE_PINS: [&str; 5] = [
    "geometry0",
    "geometry1",
    "geometry2",
    "geometry3",
    "geometry4",
];

/// Eigenschappen van een `ComputeNormalsBlock`; het blok heeft er geen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ComputeNormalsBlock {}

/// Eigenschappen van een `GeometryOptimizeBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct OptimizeBlock {
    pub epsilon: f64,
    pub evaluate_context: bool,
}

impl Default for OptimizeBlock {
    fn default() -> Self {
        Self {
            epsilon: Tolerance::WELD.eps,
            evaluate_context: true,
        }
    }
}

/// Eigenschappen van een `GeometryTransformBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TransformBlock {
    pub evaluate_context: bool,
}

impl Default for TransformBlock {
    fn default() -> Self {
        Self {
            evaluate_context: true,
        }
    }
}

/// Eigenschappen van een `MergeGeometryBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct MergeBlock {
    pub evaluate_context: bool,
}

impl Default for MergeBlock {
    fn default() -> Self {
        Self {
            evaluate_context: true,
        }
    }
}

/// Beschikbare bewerkingsblokken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockKind {
    ComputeNormals(ComputeNormalsBlock),
    Optimize(OptimizeBlock),
    Transform(TransformBlock),
    Merge(MergeBlock),
}

pub const REGISTRATIONS: &[Registration] = &[
    Registration {
        class_name: "ComputeNormalsBlock",
        make: || super::BlockKind::GeometryOps(BlockKind::ComputeNormals(ComputeNormalsBlock {})),
    },
    Registration {
        class_name: "GeometryOptimizeBlock",
        make: || super::BlockKind::GeometryOps(BlockKind::Optimize(OptimizeBlock::default())),
    },
    Registration {
        class_name: "GeometryTransformBlock",
        make: || super::BlockKind::GeometryOps(BlockKind::Transform(TransformBlock::default())),
    },
    Registration {
        class_name: "MergeGeometryBlock",
        make: || super::BlockKind::GeometryOps(BlockKind::Merge(MergeBlock::default())),
    },
];

impl BlockKind {
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::ComputeNormals(_) => "ComputeNormalsBlock",
            Self::Optimize(_) => "GeometryOptimizeBlock",
            Self::Transform(_) => "GeometryTransformBlock",
            Self::Merge(_) => "MergeGeometryBlock",
        }
    }

    #[must_use]
    pub fn input_pins(&self) -> Vec<InputPin> {
        match self {
            Self::ComputeNormals(_) | Self::Optimize(_) => vec![InputPin::new(
                PIN_GEOMETRY,
                PointType::Geometry,
                Value::Null,
            )],
            Self::Transform(_) => vec![
                InputPin::new(PIN_GEOMETRY, PointType::Geometry, Value::Null),
                InputPin::new(
                    PIN_MATRIX,
                    PointType::Matrix,
                    Value::Matrix(Transform::identity()),
                )
                .as_optional(),
                InputPin::new(PIN_TRANSLATION, PointType::Vector3, Value::Vector3([0.0; 3])),
                InputPin::new(PIN_ROTATION, PointType::Vector3, Value::Vector3([0.0; 3])),
                InputPin::new(PIN_SCALING, PointType::Vector3, Value::Vector3([1.0; 3])),
            ],
            Self::Merge(_) => MERGE_PINS
                .iter()
                .map(|name| InputPin::new(name, PointType::Geometry, Value::Null).as_optional())
                .collect(),
        }
    }

    #[must_use]
    pub fn output_pins(&self) -> Vec<OutputPin> {
        vec![OutputPin::new(PIN_OUTPUT, PointType::Geometry)]
    }

    #[must_use]
    pub fn evaluate_context(&self) -> bool {
        match self {
            Self::ComputeNormals(_) => true,
            Self::Optimize(settings) => settings.evaluate_context,
            Self::Transform(settings) => settings.evaluate_context,
            Self::Merge(settings) => settings.evaluate_context,
        }
    }

    pub fn build(
        &self,
        graph: &Graph,
        block: &Block,
        state: &mut GeometryBuild,
        ctx: &EvalContext<'_>,
    ) -> BuildResult {
        let value = match self {
            Self::ComputeNormals(_) => {
                let input = state.input_value(graph, block, PIN_GEOMETRY, ctx)?;
                match coerce_geometry(input) {
                    Some(mut geometry) => {
                        geometry.compute_normals();
                        Value::Geometry(geometry)
                    }
                    None => Value::Null,
                }
            }
            Self::Optimize(settings) => {
                let input = state.input_value(graph, block, PIN_GEOMETRY, ctx)?;
                match coerce_geometry(input) {
                    Some(geometry) => Value::Geometry(geometry.optimized(settings.epsilon)),
                    None => Value::Null,
                }
            }
            Self::Transform(_) => {
                let input = state.input_value(graph, block, PIN_GEOMETRY, ctx)?;
                match coerce_geometry(input) {
                    Some(mut geometry) => {
                        let transform = resolve_transform(graph, block, state, ctx)?;
                        geometry.transform(&transform);
                        Value::Geometry(geometry)
                    }
                    None => Value::Null,
                }
            }
            Self::Merge(_) => {
                let mut merged: Option<VertexData> = None;
                for pin in MERGE_PINS {
                    if !state.has_connection(block.id, pin) {
                        continue;
                    }
                    let value = state.input_value(graph, block, pin, ctx)?;
                    let Some(geometry) = coerce_geometry(value) else {
                        continue;
                    };
                    match merged.as_mut() {
                        Some(base) => base.merge(&geometry),
                        None => merged = Some(geometry),
                    }
                }
                merged.map_or(Value::Null, Value::Geometry)
            }
        };
        Ok(single_output(PIN_OUTPUT, value))
    }

    pub fn serialize_properties(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::ComputeNormals(settings) => serde_json::to_value(settings),
            Self::Optimize(settings) => serde_json::to_value(settings),
            Self::Transform(settings) => serde_json::to_value(settings),
            Self::Merge(settings) => serde_json::to_value(settings),
        }
    }

    pub fn apply_properties(&mut self, properties: &serde_json::Value) -> serde_json::Result<()> {
        match self {
            Self::ComputeNormals(settings) => {
                *settings = serde_json::from_value(properties.clone())?;
            }
            Self::Optimize(settings) => *settings = serde_json::from_value(properties.clone())?,
            Self::Transform(settings) => *settings = serde_json::from_value(properties.clone())?,
            Self::Merge(settings) => *settings = serde_json::from_value(properties.clone())?,
        }
        Ok(())
    }
}

/// Een aangesloten matrix wint; anders wordt translatie/rotatie/schaal
/// samengesteld (rotatie als Euler-XYZ in radialen).
fn resolve_transform(
    graph: &Graph,
    block: &Block,
    state: &mut GeometryBuild,
    ctx: &EvalContext<'_>,
) -> Result<Transform, crate::graph::evaluator::EvaluationError> {
    if state.has_connection(block.id, PIN_MATRIX) {
        let value = state.input_value(graph, block, PIN_MATRIX, ctx)?;
        return Ok(coerce_matrix(&value));
    }

    let translation = coerce_vector3(&state.input_value(graph, block, PIN_TRANSLATION, ctx)?);
    let rotation = coerce_vector3(&state.input_value(graph, block, PIN_ROTATION, ctx)?);
    let scaling = coerce_vector3(&state.input_value(graph, block, PIN_SCALING, ctx)?);
    Ok(Transform::compose_trs(
        Vec3::from_array(translation),
        Quat::from_euler_xyz(rotation[0], rotation[1], rotation[2]),
        Vec3::from_array(scaling),
    ))
}
