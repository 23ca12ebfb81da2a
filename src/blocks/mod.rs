//! Blokbibliotheek en registry.
//!
//! Elke module levert een eigen soort blokken plus een `REGISTRATIONS`-tabel
//! die geserialiseerde klasnamen aan constructors koppelt; [`BlockRegistry`]
//! raapt die tabellen bij elkaar.

use std::collections::{BTreeMap, HashMap};

use crate::graph::Graph;
use crate::graph::block::{Block, InputPin, OutputPin};
use crate::graph::context::EvalContext;
use crate::graph::evaluator::{EvaluationError, GeometryBuild};
use crate::graph::value::Value;

pub mod boolean;
mod coerce;
pub mod collection;
pub mod convert;
pub mod geometry_ops;
pub mod info;
pub mod input;
pub mod instantiate;
pub mod maths;
pub mod output;
pub mod sources;
pub mod trig;

/// Uitvoer van een blok-evaluatie: pinnaam → waarde.
pub type OutputMap = BTreeMap<String, Value>;

/// Resultaat van [`BlockKind::build`].
pub type BuildResult = Result<OutputMap, EvaluationError>;

/// Uitvoermap met precies één pin.
#[must_use]
pub fn single_output(pin: &str, value: Value) -> OutputMap {
    OutputMap::from([(pin.to_owned(), value)])
}

/// Koppeling van een geserialiseerde klasnaam aan een constructor met
/// default-properties.
pub struct Registration {
    pub class_name: &'static str,
    pub make: fn() -> BlockKind,
}

/// Beschikbare bloksoorten, gegroepeerd per module.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Input(input::InputBlock),
    Source(sources::BlockKind),
    Instantiate(instantiate::BlockKind),
    Maths(maths::BlockKind),
    Trig(trig::TrigonometryBlock),
    Convert(convert::BlockKind),
    Boolean(boolean::BooleanBlock),
    Collection(collection::CollectionBlock),
    GeometryOps(geometry_ops::BlockKind),
    Info(info::BlockKind),
    Output(output::OutputBlock),
}

impl BlockKind {
    /// Klasnaam zoals die in het JSON-formaat staat.
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Input(kind) => kind.class_name(),
            Self::Source(kind) => kind.class_name(),
            Self::Instantiate(kind) => kind.class_name(),
            Self::Maths(kind) => kind.class_name(),
            Self::Trig(kind) => kind.class_name(),
            Self::Convert(kind) => kind.class_name(),
            Self::Boolean(kind) => kind.class_name(),
            Self::Collection(kind) => kind.class_name(),
            Self::GeometryOps(kind) => kind.class_name(),
            Self::Info(kind) => kind.class_name(),
            Self::Output(kind) => kind.class_name(),
        }
    }

    #[must_use]
    pub fn input_pins(&self) -> Vec<InputPin> {
        match self {
            Self::Input(kind) => kind.input_pins(),
            Self::Source(kind) => kind.input_pins(),
            Self::Instantiate(kind) => kind.input_pins(),
            Self::Maths(kind) => kind.input_pins(),
            Self::Trig(kind) => kind.input_pins(),
            Self::Convert(kind) => kind.input_pins(),
            Self::Boolean(kind) => kind.input_pins(),
            Self::Collection(kind) => kind.input_pins(),
            Self::GeometryOps(kind) => kind.input_pins(),
            Self::Info(kind) => kind.input_pins(),
            Self::Output(kind) => kind.input_pins(),
        }
    }

    #[must_use]
    pub fn output_pins(&self) -> Vec<OutputPin> {
        match self {
            Self::Input(kind) => kind.output_pins(),
            Self::Source(kind) => kind.output_pins(),
            Self::Instantiate(kind) => kind.output_pins(),
            Self::Maths(kind) => kind.output_pins(),
            Self::Trig(kind) => kind.output_pins(),
            Self::Convert(kind) => kind.output_pins(),
            Self::Boolean(kind) => kind.output_pins(),
            Self::Collection(kind) => kind.output_pins(),
            Self::GeometryOps(kind) => kind.output_pins(),
            Self::Info(kind) => kind.output_pins(),
            Self::Output(kind) => kind.output_pins(),
        }
    }

    /// `true`: het blok wordt bij elke pull tegen de actuele context
    /// geëvalueerd; `false`: de buildpass cachet de uitkomst eenmalig.
    #[must_use]
    pub fn evaluate_context(&self) -> bool {
        match self {
            Self::Input(kind) => kind.evaluate_context(),
            Self::Source(kind) => kind.evaluate_context(),
            Self::Instantiate(kind) => kind.evaluate_context(),
            Self::Maths(kind) => kind.evaluate_context(),
            Self::Trig(kind) => kind.evaluate_context(),
            Self::Convert(kind) => kind.evaluate_context(),
            Self::Boolean(kind) => kind.evaluate_context(),
            Self::Collection(kind) => kind.evaluate_context(),
            Self::GeometryOps(kind) => kind.evaluate_context(),
            Self::Info(kind) => kind.evaluate_context(),
            Self::Output(kind) => kind.evaluate_context(),
        }
    }

    /// Evalueert het blok tegen de gegeven context.
    pub fn build(
        &self,
        graph: &Graph,
        block: &Block,
        state: &mut GeometryBuild,
        ctx: &EvalContext<'_>,
    ) -> BuildResult {
        match self {
            Self::Input(kind) => kind.build(graph, block, state, ctx),
            Self::Source(kind) => kind.build(graph, block, state, ctx),
            Self::Instantiate(kind) => kind.build(graph, block, state, ctx),
            Self::Maths(kind) => kind.build(graph, block, state, ctx),
            Self::Trig(kind) => kind.build(graph, block, state, ctx),
            Self::Convert(kind) => kind.build(graph, block, state, ctx),
            Self::Boolean(kind) => kind.build(graph, block, state, ctx),
            Self::Collection(kind) => kind.build(graph, block, state, ctx),
            Self::GeometryOps(kind) => kind.build(graph, block, state, ctx),
            Self::Info(kind) => kind.build(graph, block, state, ctx),
            Self::Output(kind) => kind.build(graph, block, state, ctx),
        }
    }

    /// Properties als JSON-object, voor persistentie.
    pub fn serialize_properties(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::Input(kind) => kind.serialize_properties(),
            Self::Source(kind) => kind.serialize_properties(),
            Self::Instantiate(kind) => kind.serialize_properties(),
            Self::Maths(kind) => kind.serialize_properties(),
            Self::Trig(kind) => kind.serialize_properties(),
            Self::Convert(kind) => kind.serialize_properties(),
            Self::Boolean(kind) => kind.serialize_properties(),
            Self::Collection(kind) => kind.serialize_properties(),
            Self::GeometryOps(kind) => kind.serialize_properties(),
            Self::Info(kind) => kind.serialize_properties(),
            Self::Output(kind) => kind.serialize_properties(),
        }
    }

    /// Overschrijft de properties vanuit een JSON-object.
    pub fn apply_properties(&mut self, properties: &serde_json::Value) -> serde_json::Result<()> {
        match self {
            Self::Input(kind) => kind.apply_properties(properties),
            Self::Source(kind) => kind.apply_properties(properties),
            Self::Instantiate(kind) => kind.apply_properties(properties),
            Self::Maths(kind) => kind.apply_properties(properties),
            Self::Trig(kind) => kind.apply_properties(properties),
            Self::Convert(kind) => kind.apply_properties(properties),
            Self::Boolean(kind) => kind.apply_properties(properties),
            Self::Collection(kind) => kind.apply_properties(properties),
            Self::GeometryOps(kind) => kind.apply_properties(properties),
            Self::Info(kind) => kind.apply_properties(properties),
            Self::Output(kind) => kind.apply_properties(properties),
        }
    }
}

/// Registry die blokken opzoekt op klasnaam.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    by_name: HashMap<String, fn() -> BlockKind>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        for table in [
            input::REGISTRATIONS,
            sources::REGISTRATIONS,
            instantiate::REGISTRATIONS,
            maths::REGISTRATIONS,
            trig::REGISTRATIONS,
            convert::REGISTRATIONS,
            boolean::REGISTRATIONS,
            collection::REGISTRATIONS,
            geometry_ops::REGISTRATIONS,
            info::REGISTRATIONS,
            output::REGISTRATIONS,
        ] {
            registry.register(table);
        }
        registry
    }
}

impl BlockRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }

    pub fn register(&mut self, registrations: &[Registration]) {
        for registration in registrations {
            self.by_name
                .insert(registration.class_name.to_owned(), registration.make);
        }
    }

    /// Maakt een vers blok-kind met default-properties aan, of `None` als de
    /// klasnaam onbekend is.
    #[must_use]
    pub fn create(&self, class_name: &str) -> Option<BlockKind> {
        self.by_name.get(class_name).map(|make| make())
    }

    #[must_use]
    pub fn contains(&self, class_name: &str) -> bool {
        self.by_name.contains_key(class_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_knows_every_block_class() {
        let registry = BlockRegistry::default();
        let expected = [
            "GeometryInputBlock",
            "BoxBlock",
            "PlaneBlock",
            "SphereBlock",
            "GridBlock",
            "InstantiateBlock",
            "InstantiateLinearBlock",
            "InstantiateOnVerticesBlock",
            "InstantiateOnFacesBlock",
            "InstantiateOnVolumeBlock",
            "MathBlock",
            "RandomBlock",
            "GeometryTrigonometryBlock",
            "VectorConverterBlock",
            "IntFloatConverterBlock",
            "MatrixComposeBlock",
            "BooleanGeometryBlock",
            "GeometryCollectionBlock",
            "ComputeNormalsBlock",
            "GeometryOptimizeBlock",
            "GeometryTransformBlock",
            "MergeGeometryBlock",
            "GeometryInfoBlock",
            "GeometryElbowBlock",
            "GeometryOutputBlock",
        ];
        for class_name in expected {
            assert!(registry.contains(class_name), "mist {class_name}");
        }
        assert_eq!(registry.len(), expected.len());
    }

    #[test]
    fn created_kinds_report_their_own_class_name() {
        let registry = BlockRegistry::default();
        let kind = registry.create("SphereBlock").unwrap();
        assert_eq!(kind.class_name(), "SphereBlock");

        let kind = registry.create("InstantiateOnFacesBlock").unwrap();
        assert_eq!(kind.class_name(), "InstantiateOnFacesBlock");
    }

    #[test]
    fn unknown_class_yields_none() {
        let registry = BlockRegistry::default();
        assert!(registry.create("BestaatNietBlock").is_none());
    }

    #[test]
    fn single_output_wraps_one_pin() {
        let map = single_output("output", Value::Int(3));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("output"), Some(&Value::Int(3)));
    }
}
