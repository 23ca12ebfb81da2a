//! Blokken en hun getypeerde pins.
//!
//! Een [`Block`] krijgt zijn pin-set bij constructie uit zijn [`BlockKind`]
//! en die set verandert daarna nooit meer. Alleen default-waarden en
//! blok-properties zijn muteerbaar; bedrading raakt dit niet.

use std::fmt;

use crate::blocks::BlockKind;

use super::GraphError;
use super::value::{PointType, Value};

/// Identifier van een blok binnen een [`Graph`](super::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BlockId(pub usize);

impl BlockId {
    #[must_use]
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }
}

impl From<usize> for BlockId {
    fn from(raw: usize) -> Self {
        Self(raw)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Input-pin: declaratie plus de actuele default-waarde.
///
/// `accepted` is de expliciete extra-compatibiliteitslijst bovenop het
/// declaratieve type (bijvoorbeeld een vector-pin die een float accepteert
/// en die naar alle componenten broadcast).
#[derive(Debug, Clone, PartialEq)]
pub struct InputPin {
    pub name: &'static str,
    pub point_type: PointType,
    pub default: Value,
    pub optional: bool,
    pub accepted: &'static [PointType],
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl InputPin {
    #[must_use]
    pub fn new(name: &'static str, point_type: PointType, default: Value) -> Self {
        Self {
            name,
            point_type,
            default,
            optional: false,
            accepted: &[],
            min: None,
            max: None,
        }
    }

    #[must_use]
    pub fn as_optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[must_use]
    pub fn accepting(mut self, accepted: &'static [PointType]) -> Self {
        self.accepted = accepted;
        self
    }

    #[must_use]
    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    #[must_use]
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Statische check of een bron van het gegeven type op deze pin past.
    #[must_use]
    pub fn accepts_type(&self, incoming: PointType) -> bool {
        self.point_type.accepts(incoming) || self.accepted.contains(&incoming)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputPin {
    pub name: &'static str,
    pub point_type: PointType,
}

impl OutputPin {
    #[must_use]
    pub const fn new(name: &'static str, point_type: PointType) -> Self {
        Self { name, point_type }
    }
}

/// Blok in de graph: een kind (soort plus properties) met de daaruit
/// afgeleide pin-set en een optioneel label.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub name: Option<String>,
    kind: BlockKind,
    inputs: Vec<InputPin>,
    outputs: Vec<OutputPin>,
}

impl Block {
    /// Maak een blok zonder id; [`Graph::add_block`](super::Graph::add_block)
    /// kent er een toe.
    #[must_use]
    pub fn new(kind: BlockKind) -> Self {
        Self::with_id(BlockId::default(), kind)
    }

    #[must_use]
    pub fn with_id(id: BlockId, kind: BlockKind) -> Self {
        let inputs = kind.input_pins();
        let outputs = kind.output_pins();
        Self {
            id,
            name: None,
            kind,
            inputs,
            outputs,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn kind(&self) -> &BlockKind {
        &self.kind
    }

    /// Muteerbare toegang tot de properties van het blok. De pin-set wordt
    /// niet opnieuw opgebouwd: alleen waarde-properties aanpassen.
    pub fn kind_mut(&mut self) -> &mut BlockKind {
        &mut self.kind
    }

    #[must_use]
    pub fn input(&self, name: &str) -> Option<&InputPin> {
        self.inputs.iter().find(|pin| pin.name == name)
    }

    #[must_use]
    pub fn output(&self, name: &str) -> Option<&OutputPin> {
        self.outputs.iter().find(|pin| pin.name == name)
    }

    #[must_use]
    pub fn inputs(&self) -> &[InputPin] {
        &self.inputs
    }

    #[must_use]
    pub fn outputs(&self) -> &[OutputPin] {
        &self.outputs
    }

    /// Zet de default-waarde van een input-pin. Numerieke waarden worden
    /// geklemd op de min/max van de pin.
    pub fn set_default(&mut self, pin: &str, value: Value) -> Result<(), GraphError> {
        let id = self.id;
        let Some(slot) = self.inputs.iter_mut().find(|p| p.name == pin) else {
            return Err(GraphError::UnknownInputPin {
                block: id,
                pin: pin.to_owned(),
            });
        };
        slot.default = clamp_value(value, slot.min, slot.max);
        Ok(())
    }
}

fn clamp_value(value: Value, min: Option<f64>, max: Option<f64>) -> Value {
    if min.is_none() && max.is_none() {
        return value;
    }
    let clamp = |v: f64| {
        let v = min.map_or(v, |m| v.max(m));
        max.map_or(v, |m| v.min(m))
    };
    match value {
        Value::Float(v) => Value::Float(clamp(v)),
        Value::Int(v) => Value::Int(clamp(v as f64) as i64),
        other => other,
    }
}
