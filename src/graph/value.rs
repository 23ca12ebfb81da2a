//! Waarden en pin-typen die door de geometry-graph stromen.
//!
//! Elke pin heeft een [`PointType`]; elke evaluatie levert een [`Value`].
//! `Null` is een gewone waarde: ontbrekende of lege geometrie propageert als
//! `Null` door de graph in plaats van als fout.

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geom::{Transform, VertexData};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Float(f64),
    Int(i64),
    Vector2([f64; 2]),
    Vector3([f64; 3]),
    Vector4([f64; 4]),
    Matrix(Transform),
    Geometry(VertexData),
}

impl Value {
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Float(_) => ValueKind::Float,
            Value::Int(_) => ValueKind::Int,
            Value::Vector2(_) => ValueKind::Vector2,
            Value::Vector3(_) => ValueKind::Vector3,
            Value::Vector4(_) => ValueKind::Vector4,
            Value::Matrix(_) => ValueKind::Matrix,
            Value::Geometry(_) => ValueKind::Geometry,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn expect_float(&self) -> Result<f64, ValueError> {
        match self {
            Value::Float(v) => Ok(*v),
            other => Err(ValueError::type_mismatch("float", other.kind())),
        }
    }

    pub fn expect_int(&self) -> Result<i64, ValueError> {
        match self {
            Value::Int(v) => Ok(*v),
            other => Err(ValueError::type_mismatch("int", other.kind())),
        }
    }

    pub fn expect_vector2(&self) -> Result<[f64; 2], ValueError> {
        match self {
            Value::Vector2(v) => Ok(*v),
            other => Err(ValueError::type_mismatch("vector2", other.kind())),
        }
    }

    pub fn expect_vector3(&self) -> Result<[f64; 3], ValueError> {
        match self {
            Value::Vector3(v) => Ok(*v),
            other => Err(ValueError::type_mismatch("vector3", other.kind())),
        }
    }

    pub fn expect_vector4(&self) -> Result<[f64; 4], ValueError> {
        match self {
            Value::Vector4(v) => Ok(*v),
            other => Err(ValueError::type_mismatch("vector4", other.kind())),
        }
    }

    pub fn expect_matrix(&self) -> Result<Transform, ValueError> {
        match self {
            Value::Matrix(m) => Ok(*m),
            other => Err(ValueError::type_mismatch("matrix", other.kind())),
        }
    }

    pub fn expect_geometry(&self) -> Result<&VertexData, ValueError> {
        match self {
            Value::Geometry(g) => Ok(g),
            other => Err(ValueError::type_mismatch("geometry", other.kind())),
        }
    }
}

/// Fout bij het uitpakken van een [`Value`] naar een concreet type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueError {
    expected: &'static str,
    found: ValueKind,
}

impl ValueError {
    #[must_use]
    pub const fn type_mismatch(expected: &'static str, found: ValueKind) -> Self {
        Self { expected, found }
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "verwachtte type `{}` maar kreeg `{}`",
            self.expected, self.found
        )
    }
}

impl Error for ValueError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Float,
    Int,
    Vector2,
    Vector3,
    Vector4,
    Matrix,
    Geometry,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Float => "float",
            ValueKind::Int => "int",
            ValueKind::Vector2 => "vector2",
            ValueKind::Vector3 => "vector3",
            ValueKind::Vector4 => "vector4",
            ValueKind::Matrix => "matrix",
            ValueKind::Geometry => "geometry",
        };
        f.write_str(name)
    }
}

/// Declaratief pin-type. Naast de concrete typen zijn er twee wildcards:
/// `AutoDetect` voor inputs die elk type aannemen en `BasedOnInput` voor
/// outputs waarvan het type de eerste aangesloten input volgt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointType {
    Float,
    Int,
    Vector2,
    Vector3,
    Vector4,
    Matrix,
    Geometry,
    AutoDetect,
    BasedOnInput,
}

impl PointType {
    /// Statische compatibiliteit van een inkomend type op een pin van dit
    /// type. Float en Int zijn onderling uitwisselbaar (het blok zelf
    /// converteert); bredere broadcast staat per pin in de accepted-lijst.
    #[must_use]
    pub fn accepts(self, incoming: Self) -> bool {
        if self == incoming {
            return true;
        }
        if matches!(self, PointType::AutoDetect) {
            return true;
        }
        if matches!(incoming, PointType::AutoDetect | PointType::BasedOnInput) {
            return true;
        }
        matches!(
            (self, incoming),
            (PointType::Float, PointType::Int) | (PointType::Int, PointType::Float)
        )
    }

    /// Het pin-type waar een waarde van deze soort op past, of `None` voor
    /// `Null` (dat op elke pin past).
    #[must_use]
    pub const fn of_kind(kind: ValueKind) -> Option<Self> {
        match kind {
            ValueKind::Null => None,
            ValueKind::Float => Some(PointType::Float),
            ValueKind::Int => Some(PointType::Int),
            ValueKind::Vector2 => Some(PointType::Vector2),
            ValueKind::Vector3 => Some(PointType::Vector3),
            ValueKind::Vector4 => Some(PointType::Vector4),
            ValueKind::Matrix => Some(PointType::Matrix),
            ValueKind::Geometry => Some(PointType::Geometry),
        }
    }
}

impl fmt::Display for PointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PointType::Float => "float",
            PointType::Int => "int",
            PointType::Vector2 => "vector2",
            PointType::Vector3 => "vector3",
            PointType::Vector4 => "vector4",
            PointType::Matrix => "matrix",
            PointType::Geometry => "geometry",
            PointType::AutoDetect => "autodetect",
            PointType::BasedOnInput => "basedoninput",
        };
        f.write_str(name)
    }
}
