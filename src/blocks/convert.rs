//! Conversieblokken: vectoren splitsen en samenstellen, int↔float,
//! matrixvermenigvuldiging.

use serde::{Deserialize, Serialize};

use crate::geom::Transform;
use crate::graph::Graph;
use crate::graph::block::{Block, InputPin, OutputPin};
use crate::graph::context::EvalContext;
use crate::graph::evaluator::GeometryBuild;
use crate::graph::value::{PointType, Value};

use super::coerce::{coerce_float, coerce_matrix, coerce_vector2, coerce_vector3, coerce_vector4};
use super::{BuildResult, OutputMap, Registration};

const PIN_XYZW: &str = "xyzw";
const PIN_XYZ: &str = "xyz";
const PIN_XY: &str = "xy";
const PIN_ZW: &str = "zw";
const PIN_X: &str = "x";
const PIN_Y: &str = "y";
const PIN_Z: &str = "z";
const PIN_W: &str = "w";
const PIN_FLOAT: &str = "float";
const PIN_INT: &str = "int";
const PIN_MATRIX_0: &str = "matrix0";
const PIN_MATRIX_1: &str = "matrix1";
const PIN_MATRIX: &str = "matrix";

/// Splitst en bundelt vectorcomponenten; alle uitgangen zijn afgeleid van
/// dezelfde opgeloste (x, y, z, w).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct VectorConverterBlock {}

/// Koppelt een float- en een int-waarde aan elkaar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct IntFloatConverterBlock {}

/// Vermenigvuldigt twee matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct MatrixComposeBlock {}

/// Beschikbare conversieblokken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockKind {
    Vector(VectorConverterBlock),
    IntFloat(IntFloatConverterBlock),
    MatrixCompose(MatrixComposeBlock),
}

pub const REGISTRATIONS: &[Registration] = &[
    Registration {
        class_name: "VectorConverterBlock",
        make: || super::BlockKind::Convert(BlockKind::Vector(VectorConverterBlock {})),
    },
    Registration {
        class_name: "IntFloatConverterBlock",
        make: || super::BlockKind::Convert(BlockKind::IntFloat(IntFloatConverterBlock {})),
    },
    Registration {
        class_name: "MatrixComposeBlock",
        make: || super::BlockKind::Convert(BlockKind::MatrixCompose(MatrixComposeBlock {})),
    },
];

impl BlockKind {
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Vector(_) => "VectorConverterBlock",
            Self::IntFloat(_) => "IntFloatConverterBlock",
            Self::MatrixCompose(_) => "MatrixComposeBlock",
        }
    }

    #[must_use]
    pub fn input_pins(&self) -> Vec<InputPin> {
        match self {
            Self::Vector(_) => vec![
                InputPin::new(PIN_XYZW, PointType::Vector4, Value::Vector4([0.0; 4]))
                    .as_optional(),
                InputPin::new(PIN_XYZ, PointType::Vector3, Value::Vector3([0.0; 3])).as_optional(),
                InputPin::new(PIN_XY, PointType::Vector2, Value::Vector2([0.0; 2])).as_optional(),
                InputPin::new(PIN_ZW, PointType::Vector2, Value::Vector2([0.0; 2])).as_optional(),
                InputPin::new(PIN_X, PointType::Float, Value::Float(0.0)).as_optional(),
                InputPin::new(PIN_Y, PointType::Float, Value::Float(0.0)).as_optional(),
                InputPin::new(PIN_Z, PointType::Float, Value::Float(0.0)).as_optional(),
                InputPin::new(PIN_W, PointType::Float, Value::Float(0.0)).as_optional(),
            ],
            Self::IntFloat(_) => vec![
                InputPin::new(PIN_FLOAT, PointType::Float, Value::Float(0.0)).as_optional(),
                InputPin::new(PIN_INT, PointType::Int, Value::Int(0)).as_optional(),
            ],
            Self::MatrixCompose(_) => vec![
                InputPin::new(
                    PIN_MATRIX_0,
                    PointType::Matrix,
                    Value::Matrix(Transform::identity()),
                ),
                InputPin::new(
                    PIN_MATRIX_1,
                    PointType::Matrix,
                    Value::Matrix(Transform::identity()),
                ),
            ],
        }
    }

    #[must_use]
    pub fn output_pins(&self) -> Vec<OutputPin> {
        match self {
            Self::Vector(_) => vec![
                OutputPin::new(PIN_XYZW, PointType::Vector4),
                OutputPin::new(PIN_XYZ, PointType::Vector3),
                OutputPin::new(PIN_XY, PointType::Vector2),
                OutputPin::new(PIN_ZW, PointType::Vector2),
                OutputPin::new(PIN_X, PointType::Float),
                OutputPin::new(PIN_Y, PointType::Float),
                OutputPin::new(PIN_Z, PointType::Float),
                OutputPin::new(PIN_W, PointType::Float),
            ],
            Self::IntFloat(_) => vec![
                OutputPin::new(PIN_FLOAT, PointType::Float),
                OutputPin::new(PIN_INT, PointType::Int),
            ],
            Self::MatrixCompose(_) => vec![OutputPin::new(PIN_MATRIX, PointType::Matrix)],
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
            Self::Vector(_) => build_vector(graph, block, state, ctx),
            Self::IntFloat(_) => build_int_float(graph, block, state, ctx),
            Self::MatrixCompose(_) => build_matrix_compose(graph, block, state, ctx),
        }
    }

    pub fn serialize_properties(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::Vector(settings) => serde_json::to_value(settings),
            Self::IntFloat(settings) => serde_json::to_value(settings),
            Self::MatrixCompose(settings) => serde_json::to_value(settings),
        }
    }

    pub fn apply_properties(&mut self, properties: &serde_json::Value) -> serde_json::Result<()> {
        match self {
            Self::Vector(settings) => *settings = serde_json::from_value(properties.clone())?,
            Self::IntFloat(settings) => *settings = serde_json::from_value(properties.clone())?,
            Self::MatrixCompose(settings) => *settings = serde_json::from_value(properties.clone())?,
        }
        Ok(())
    }
}

/// De breedste aangesloten ingang wint: xyzw, anders xyz + w, anders
/// xy + zw, anders losse scalars.
fn build_vector(
    graph: &Graph,
    block: &Block,
    state: &mut GeometryBuild,
    ctx: &EvalContext<'_>,
) -> BuildResult {
    let (x, y, z, w) = if state.has_connection(block.id, PIN_XYZW) {
        let v = coerce_vector4(&state.input_value(graph, block, PIN_XYZW, ctx)?);
        (v[0], v[1], v[2], v[3])
    } else if state.has_connection(block.id, PIN_XYZ) {
        let v = coerce_vector3(&state.input_value(graph, block, PIN_XYZ, ctx)?);
        let w = coerce_float(&state.input_value(graph, block, PIN_W, ctx)?);
        (v[0], v[1], v[2], w)
    } else if state.has_connection(block.id, PIN_XY) || state.has_connection(block.id, PIN_ZW) {
        let xy = coerce_vector2(&state.input_value(graph, block, PIN_XY, ctx)?);
        let zw = coerce_vector2(&state.input_value(graph, block, PIN_ZW, ctx)?);
        (xy[0], xy[1], zw[0], zw[1])
    } else {
        (
            coerce_float(&state.input_value(graph, block, PIN_X, ctx)?),
            coerce_float(&state.input_value(graph, block, PIN_Y, ctx)?),
            coerce_float(&state.input_value(graph, block, PIN_Z, ctx)?),
            coerce_float(&state.input_value(graph, block, PIN_W, ctx)?),
        )
    };

    Ok(OutputMap::from([
        (PIN_XYZW.to_owned(), Value::Vector4([x, y, z, w])),
        (PIN_XYZ.to_owned(), Value::Vector3([x, y, z])),
        (PIN_XY.to_owned(), Value::Vector2([x, y])),
        (PIN_ZW.to_owned(), Value::Vector2([z, w])),
        (PIN_X.to_owned(), Value::Float(x)),
        (PIN_Y.to_owned(), Value::Float(y)),
        (PIN_Z.to_owned(), Value::Float(z)),
        (PIN_W.to_owned(), Value::Float(w)),
    ]))
}

fn build_int_float(
    graph: &Graph,
    block: &Block,
    state: &mut GeometryBuild,
    ctx: &EvalContext<'_>,
) -> BuildResult {
    let source = if state.has_connection(block.id, PIN_FLOAT) {
        coerce_float(&state.input_value(graph, block, PIN_FLOAT, ctx)?)
    } else if state.has_connection(block.id, PIN_INT) {
        coerce_float(&state.input_value(graph, block, PIN_INT, ctx)?)
    } else {
        coerce_float(&state.input_value(graph, block, PIN_FLOAT, ctx)?)
    };

    Ok(OutputMap::from([
        (PIN_FLOAT.to_owned(), Value::Float(source)),
        (PIN_INT.to_owned(), Value::Int(source.floor() as i64)),
    ]))
}

fn build_matrix_compose(
    graph: &Graph,
    block: &Block,
    state: &mut GeometryBuild,
    ctx: &EvalContext<'_>,
) -> BuildResult {
    let left = coerce_matrix(&state.input_value(graph, block, PIN_MATRIX_0, ctx)?);
    let right = coerce_matrix(&state.input_value(graph, block, PIN_MATRIX_1, ctx)?);
    Ok(OutputMap::from([(
        PIN_MATRIX.to_owned(),
        Value::Matrix(left.compose(right)),
    )]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_converter_exposes_all_projections() {
        let kind = BlockKind::Vector(VectorConverterBlock {});
        let inputs = kind.input_pins();
        assert_eq!(inputs.len(), 8);
        assert!(inputs.iter().all(|pin| pin.optional));

        let outputs = kind.output_pins();
        assert_eq!(outputs.len(), 8);
        assert_eq!(outputs[0].name, PIN_XYZW);
        assert_eq!(outputs[0].point_type, PointType::Vector4);
    }

    #[test]
    fn matrix_compose_defaults_to_identities() {
        let kind = BlockKind::MatrixCompose(MatrixComposeBlock {});
        for pin in kind.input_pins() {
            assert_eq!(pin.default, Value::Matrix(Transform::identity()));
        }
        assert_eq!(kind.output_pins()[0].name, PIN_MATRIX);
    }

    #[test]
    fn int_float_converter_has_paired_pins() {
        let kind = BlockKind::IntFloat(IntFloatConverterBlock {});
        let names: Vec<_> = kind.input_pins().iter().map(|p| p.name).collect();
        assert_eq!(names, vec![PIN_FLOAT, PIN_INT]);
        let names: Vec<_> = kind.output_pins().iter().map(|p| p.name).collect();
        assert_eq!(names, vec![PIN_FLOAT, PIN_INT]);
    }
}
