//! Hulpfuncties voor het converteren van pin-waarden.
//!
//! Blokken propageren `Null` in plaats van fouten: een waarde die niet past
//! valt terug op een neutrale default (0, nulvector, identiteit). Alleen de
//! geometry-coercion maakt het verschil tussen "iets" en "niets" zichtbaar.

use crate::geom::{Transform, VertexData};
use crate::graph::value::Value;

pub(crate) fn coerce_float(value: &Value) -> f64 {
    match value {
        Value::Float(v) => *v,
        Value::Int(v) => *v as f64,
        _ => 0.0,
    }
}

pub(crate) fn coerce_int(value: &Value) -> i64 {
    match value {
        Value::Int(v) => *v,
        Value::Float(v) => v.floor() as i64,
        _ => 0,
    }
}

pub(crate) fn coerce_vector2(value: &Value) -> [f64; 2] {
    match value {
        Value::Vector2(v) => *v,
        Value::Float(v) => [*v; 2],
        Value::Int(v) => [*v as f64; 2],
        _ => [0.0; 2],
    }
}

pub(crate) fn coerce_vector3(value: &Value) -> [f64; 3] {
    match value {
        Value::Vector3(v) => *v,
        Value::Float(v) => [*v; 3],
        Value::Int(v) => [*v as f64; 3],
        _ => [0.0; 3],
    }
}

pub(crate) fn coerce_vector4(value: &Value) -> [f64; 4] {
    match value {
        Value::Vector4(v) => *v,
        Value::Float(v) => [*v; 4],
        Value::Int(v) => [*v as f64; 4],
        _ => [0.0; 4],
    }
}

pub(crate) fn coerce_matrix(value: &Value) -> Transform {
    match value {
        Value::Matrix(transform) => *transform,
        _ => Transform::identity(),
    }
}

/// Neemt de geometrie uit een waarde; lege buffers tellen als niets.
pub(crate) fn coerce_geometry(value: Value) -> Option<VertexData> {
    match value {
        Value::Geometry(data) if !data.is_empty() => Some(data),
        _ => None,
    }
}

/// Vorm van een numerieke waarde, voor componentsgewijze bewerkingen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumericShape {
    Int,
    Float,
    Vector2,
    Vector3,
    Vector4,
}

impl NumericShape {
    pub(crate) fn arity(self) -> usize {
        match self {
            Self::Int | Self::Float => 1,
            Self::Vector2 => 2,
            Self::Vector3 => 3,
            Self::Vector4 => 4,
        }
    }

    /// Gedeelde vorm voor scalar↔vector broadcast; `None` bij
    /// onverenigbare ariteit.
    pub(crate) fn unified(a: Self, b: Self) -> Option<Self> {
        use NumericShape::{Float, Int, Vector2, Vector3, Vector4};
        match (a, b) {
            (Int, Int) => Some(Int),
            (Int | Float, Float) | (Float, Int) => Some(Float),
            (Int | Float | Vector2, Vector2) | (Vector2, Int | Float) => Some(Vector2),
            (Int | Float | Vector3, Vector3) | (Vector3, Int | Float) => Some(Vector3),
            (Int | Float | Vector4, Vector4) | (Vector4, Int | Float) => Some(Vector4),
            _ => None,
        }
    }
}

/// Numerieke waarde ontleed in componenten.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Numeric {
    pub shape: NumericShape,
    pub components: Vec<f64>,
}

impl Numeric {
    /// Component op index, met scalar-broadcast naar hogere ariteit.
    pub(crate) fn component(&self, index: usize) -> f64 {
        if self.components.len() == 1 {
            self.components[0]
        } else {
            self.components[index]
        }
    }
}

pub(crate) fn coerce_numeric(value: &Value) -> Option<Numeric> {
    let numeric = match value {
        Value::Int(v) => Numeric {
            shape: NumericShape::Int,
            components: vec![*v as f64],
        },
        Value::Float(v) => Numeric {
            shape: NumericShape::Float,
            components: vec![*v],
        },
        Value::Vector2(v) => Numeric {
            shape: NumericShape::Vector2,
            components: v.to_vec(),
        },
        Value::Vector3(v) => Numeric {
            shape: NumericShape::Vector3,
            components: v.to_vec(),
        },
        Value::Vector4(v) => Numeric {
            shape: NumericShape::Vector4,
            components: v.to_vec(),
        },
        _ => return None,
    };
    Some(numeric)
}

/// Pakt componenten terug in een waarde van de gegeven vorm. `Int` wordt
/// afgekapt richting nul.
pub(crate) fn pack_numeric(shape: NumericShape, components: &[f64]) -> Value {
    match shape {
        NumericShape::Int => Value::Int(components[0].trunc() as i64),
        NumericShape::Float => Value::Float(components[0]),
        NumericShape::Vector2 => Value::Vector2([components[0], components[1]]),
        NumericShape::Vector3 => Value::Vector3([components[0], components[1], components[2]]),
        NumericShape::Vector4 => Value::Vector4([
            components[0],
            components[1],
            components[2],
            components[3],
        ]),
    }
}
