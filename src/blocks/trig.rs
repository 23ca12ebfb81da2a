//! Unaire rekenfuncties over getallen en vectoren.

use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::graph::block::{Block, InputPin, OutputPin};
use crate::graph::context::EvalContext;
use crate::graph::evaluator::GeometryBuild;
use crate::graph::value::{PointType, Value};

use super::coerce::{coerce_numeric, pack_numeric};
use super::{BuildResult, Registration, single_output};

pub const PIN_OUTPUT: &str = "output";
const PIN_INPUT: &str = "input";

/// Functie van een `GeometryTrigonometryBlock`. De naam is historisch: naast
/// goniometrie zitten er ook afrondingen en tekenfuncties in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrigOperation {
    Cos,
    Sin,
    Tan,
    ArcCos,
    ArcSin,
    ArcTan,
    Sqrt,
    Abs,
    Exp,
    Log,
    Round,
    Floor,
    Ceiling,
    Fract,
    Negate,
    OneMinus,
    Reciprocal,
    Sign,
    ToDegrees,
    ToRadians,
}

/// Eigenschappen van een `GeometryTrigonometryBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TrigonometryBlock {
    pub operation: TrigOperation,
}

impl Default for TrigonometryBlock {
    fn default() -> Self {
        Self {
            operation: TrigOperation::Cos,
        }
    }
}

pub const REGISTRATIONS: &[Registration] = &[Registration {
    class_name: "GeometryTrigonometryBlock",
    make: || {
        super::BlockKind::Trig(TrigonometryBlock {
            operation: TrigOperation::Cos,
        })
    },
}];

impl TrigonometryBlock {
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        "GeometryTrigonometryBlock"
    }

    #[must_use]
    pub fn input_pins(&self) -> Vec<InputPin> {
        vec![InputPin::new(
            PIN_INPUT,
            PointType::AutoDetect,
            Value::Float(0.0),
        )]
    }

    #[must_use]
    pub fn output_pins(&self) -> Vec<OutputPin> {
        vec![OutputPin::new(PIN_OUTPUT, PointType::BasedOnInput)]
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
        let input = state.input_value(graph, block, PIN_INPUT, ctx)?;
        Ok(single_output(PIN_OUTPUT, apply_unary(self.operation, &input)))
    }

    pub fn serialize_properties(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub fn apply_properties(&mut self, properties: &serde_json::Value) -> serde_json::Result<()> {
        *self = serde_json::from_value(properties.clone())?;
        Ok(())
    }
}

/// Past de functie per component toe; de vorm van de invoer blijft behouden.
fn apply_unary(operation: TrigOperation, input: &Value) -> Value {
    let Some(numeric) = coerce_numeric(input) else {
        return Value::Null;
    };

    let mut components = Vec::with_capacity(numeric.shape.arity());
    for index in 0..numeric.shape.arity() {
        let x = numeric.component(index);
        components.push(match operation {
            TrigOperation::Cos => x.cos(),
            TrigOperation::Sin => x.sin(),
            TrigOperation::Tan => x.tan(),
            TrigOperation::ArcCos => x.acos(),
            TrigOperation::ArcSin => x.asin(),
            TrigOperation::ArcTan => x.atan(),
            TrigOperation::Sqrt => x.sqrt(),
            TrigOperation::Abs => x.abs(),
            TrigOperation::Exp => x.exp(),
            TrigOperation::Log => x.ln(),
            TrigOperation::Round => x.round(),
            TrigOperation::Floor => x.floor(),
            TrigOperation::Ceiling => x.ceil(),
            TrigOperation::Fract => x - x.floor(),
            TrigOperation::Negate => -x,
            TrigOperation::OneMinus => 1.0 - x,
            TrigOperation::Reciprocal => 1.0 / x,
            TrigOperation::Sign => {
                if x == 0.0 {
                    0.0
                } else {
                    x.signum()
                }
            }
            TrigOperation::ToDegrees => x.to_degrees(),
            TrigOperation::ToRadians => x.to_radians(),
        });
    }
    pack_numeric(numeric.shape, &components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn applies_componentwise_and_keeps_shape() {
        let result = apply_unary(TrigOperation::Negate, &Value::Vector3([1.0, -2.0, 3.0]));
        assert_eq!(result, Value::Vector3([-1.0, 2.0, -3.0]));

        let result = apply_unary(TrigOperation::Abs, &Value::Int(-4));
        assert_eq!(result, Value::Int(4));
    }

    #[test]
    fn cos_of_zero_is_one() {
        assert_eq!(apply_unary(TrigOperation::Cos, &Value::Float(0.0)), Value::Float(1.0));
    }

    #[test]
    fn fract_is_always_non_negative() {
        let result = apply_unary(TrigOperation::Fract, &Value::Float(-1.25));
        assert_eq!(result, Value::Float(0.75));
    }

    #[test]
    fn sign_of_zero_is_zero() {
        assert_eq!(apply_unary(TrigOperation::Sign, &Value::Float(0.0)), Value::Float(0.0));
        assert_eq!(apply_unary(TrigOperation::Sign, &Value::Float(-3.0)), Value::Float(-1.0));
    }

    #[test]
    fn degree_radian_conversions_are_inverse() {
        let Value::Float(deg) = apply_unary(TrigOperation::ToDegrees, &Value::Float(PI)) else {
            panic!("float verwacht");
        };
        assert!((deg - 180.0).abs() < 1e-9);

        let Value::Float(rad) = apply_unary(TrigOperation::ToRadians, &Value::Float(180.0)) else {
            panic!("float verwacht");
        };
        assert!((rad - PI).abs() < 1e-9);
    }

    #[test]
    fn non_numeric_input_yields_null() {
        assert_eq!(apply_unary(TrigOperation::Cos, &Value::Null), Value::Null);
    }
}
