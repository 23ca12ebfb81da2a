//! Rekenblokken: binaire wiskunde en random-trekkingen.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::graph::block::{Block, InputPin, OutputPin};
use crate::graph::context::EvalContext;
use crate::graph::evaluator::GeometryBuild;
use crate::graph::value::{PointType, Value};

use super::coerce::{NumericShape, coerce_numeric, pack_numeric};
use super::{BuildResult, Registration, single_output};

pub const PIN_OUTPUT: &str = "output";
const PIN_LEFT: &str = "left";
const PIN_RIGHT: &str = "right";
const PIN_MIN: &str = "min";
const PIN_MAX: &str = "max";

/// Binaire operatie van een `MathBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathOperation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Min,
    Max,
}

/// Eigenschappen van een `MathBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct MathBlock {
    pub operation: MathOperation,
}

impl Default for MathBlock {
    fn default() -> Self {
        Self {
            operation: MathOperation::Add,
        }
    }
}

/// Eigenschappen van een `RandomBlock`; het blok heeft er geen, maar het
/// record houdt het formaat uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct RandomBlock {}

/// Beschikbare rekenblokken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockKind {
    Math(MathBlock),
    Random(RandomBlock),
}

pub const REGISTRATIONS: &[Registration] = &[
    Registration {
        class_name: "MathBlock",
        make: || {
            super::BlockKind::Maths(BlockKind::Math(MathBlock {
                operation: MathOperation::Add,
            }))
        },
    },
    Registration {
        class_name: "RandomBlock",
        make: || super::BlockKind::Maths(BlockKind::Random(RandomBlock {})),
    },
];

impl BlockKind {
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Math(_) => "MathBlock",
            Self::Random(_) => "RandomBlock",
        }
    }

    #[must_use]
    pub fn input_pins(&self) -> Vec<InputPin> {
        match self {
            Self::Math(_) => vec![
                InputPin::new(PIN_LEFT, PointType::AutoDetect, Value::Float(0.0)),
                InputPin::new(PIN_RIGHT, PointType::AutoDetect, Value::Float(0.0)),
            ],
            Self::Random(_) => vec![
                InputPin::new(PIN_MIN, PointType::AutoDetect, Value::Float(0.0)),
                InputPin::new(PIN_MAX, PointType::AutoDetect, Value::Float(1.0)),
            ],
        }
    }

    #[must_use]
    pub fn output_pins(&self) -> Vec<OutputPin> {
        vec![OutputPin::new(PIN_OUTPUT, PointType::BasedOnInput)]
    }

    /// Rekenblokken zijn altijd contextueel: hun operanden kunnen het zijn,
    /// en een random-trekking hoort per pull te verschillen.
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
        let value = match self {
            Self::Math(settings) => {
                let left = state.input_value(graph, block, PIN_LEFT, ctx)?;
                let right = state.input_value(graph, block, PIN_RIGHT, ctx)?;
                apply_math(settings.operation, &left, &right)
            }
            Self::Random(_) => {
                let min = state.input_value(graph, block, PIN_MIN, ctx)?;
                let max = state.input_value(graph, block, PIN_MAX, ctx)?;
                draw_random(state.rng(), &min, &max)
            }
        };
        Ok(single_output(PIN_OUTPUT, value))
    }

    pub fn serialize_properties(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::Math(settings) => serde_json::to_value(settings),
            Self::Random(settings) => serde_json::to_value(settings),
        }
    }

    pub fn apply_properties(&mut self, properties: &serde_json::Value) -> serde_json::Result<()> {
        match self {
            Self::Math(settings) => *settings = serde_json::from_value(properties.clone())?,
            Self::Random(settings) => *settings = serde_json::from_value(properties.clone())?,
        }
        Ok(())
    }
}

/// Componentsgewijze binaire operatie met scalar↔vector broadcast.
fn apply_math(operation: MathOperation, left: &Value, right: &Value) -> Value {
    let (Some(a), Some(b)) = (coerce_numeric(left), coerce_numeric(right)) else {
        return Value::Null;
    };
    let Some(shape) = NumericShape::unified(a.shape, b.shape) else {
        return Value::Null;
    };

    let mut components = Vec::with_capacity(shape.arity());
    for index in 0..shape.arity() {
        let x = a.component(index);
        let y = b.component(index);
        components.push(match operation {
            MathOperation::Add => x + y,
            MathOperation::Subtract => x - y,
            MathOperation::Multiply => x * y,
            MathOperation::Divide => x / y,
            MathOperation::Min => x.min(y),
            MathOperation::Max => x.max(y),
        });
    }
    pack_numeric(shape, &components)
}

/// Trekking per component: `min + r·(max−min)`; gehele uitkomsten ronden af.
fn draw_random<R: Rng>(rng: &mut R, min: &Value, max: &Value) -> Value {
    let (Some(a), Some(b)) = (coerce_numeric(min), coerce_numeric(max)) else {
        return Value::Null;
    };
    let Some(shape) = NumericShape::unified(a.shape, b.shape) else {
        return Value::Null;
    };

    let mut components = Vec::with_capacity(shape.arity());
    for index in 0..shape.arity() {
        let low = a.component(index);
        let high = b.component(index);
        let r: f64 = rng.random();
        let mut drawn = low + r * (high - low);
        if shape == NumericShape::Int {
            drawn = drawn.round();
        }
        components.push(drawn);
    }
    pack_numeric(shape, &components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn math_operates_componentwise() {
        let result = apply_math(
            MathOperation::Add,
            &Value::Vector3([1.0, 2.0, 3.0]),
            &Value::Vector3([0.5, 0.5, 0.5]),
        );
        assert_eq!(result, Value::Vector3([1.5, 2.5, 3.5]));

        let result = apply_math(
            MathOperation::Max,
            &Value::Float(2.0),
            &Value::Float(-3.0),
        );
        assert_eq!(result, Value::Float(2.0));
    }

    #[test]
    fn scalars_broadcast_over_vectors() {
        let result = apply_math(
            MathOperation::Multiply,
            &Value::Vector2([1.0, 2.0]),
            &Value::Float(3.0),
        );
        assert_eq!(result, Value::Vector2([3.0, 6.0]));
    }

    #[test]
    fn int_pairs_stay_int_and_truncate() {
        let result = apply_math(MathOperation::Divide, &Value::Int(7), &Value::Int(2));
        assert_eq!(result, Value::Int(3));

        let result = apply_math(MathOperation::Add, &Value::Int(1), &Value::Float(0.5));
        assert_eq!(result, Value::Float(1.5));
    }

    #[test]
    fn incompatible_operands_yield_null() {
        let result = apply_math(
            MathOperation::Add,
            &Value::Vector2([1.0, 2.0]),
            &Value::Vector3([1.0, 2.0, 3.0]),
        );
        assert_eq!(result, Value::Null);

        let result = apply_math(MathOperation::Add, &Value::Null, &Value::Float(1.0));
        assert_eq!(result, Value::Null);
    }

    #[test]
    fn random_draws_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..32 {
            let value = draw_random(&mut rng, &Value::Float(2.0), &Value::Float(5.0));
            let Value::Float(v) = value else {
                panic!("float verwacht");
            };
            assert!((2.0..=5.0).contains(&v));
        }
    }

    #[test]
    fn random_int_draws_round_to_whole_numbers() {
        let mut rng = StdRng::seed_from_u64(7);
        let value = draw_random(&mut rng, &Value::Int(0), &Value::Int(10));
        let Value::Int(v) = value else {
            panic!("int verwacht");
        };
        assert!((0..=10).contains(&v));
    }

    #[test]
    fn same_seed_gives_same_draws() {
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        assert_eq!(
            draw_random(&mut a, &Value::Float(0.0), &Value::Float(1.0)),
            draw_random(&mut b, &Value::Float(0.0), &Value::Float(1.0)),
        );
    }
}
