#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod blocks;
pub mod geom;
pub mod graph;
pub mod parse;

use thiserror::Error;

use blocks::BlockRegistry;
use geom::VertexData;
use graph::Graph;
use graph::block::BlockId;
use graph::evaluator::{self, BuildOptions, EvaluationError, GeometryBuild};
use graph::value::Value;
use parse::ParseError;

/// Beschrijft fouten op engine-niveau.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Er is nog geen graph geladen of gezet.
    #[error("er is geen graph geladen")]
    NoGraph,
    /// `build` is nog niet aangeroepen.
    #[error("graph is nog niet gebouwd")]
    NotBuilt,
    /// Fout bij het lezen of schrijven van een document.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Fout tijdens het bouwen van de graph.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// Public entry point for consumers.
#[derive(Debug)]
pub struct Engine {
    registry: BlockRegistry,
    graph: Option<Graph>,
    seed: u64,
    last_build: Option<GeometryBuild>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: BlockRegistry::default(),
            graph: None,
            seed: 0,
            last_build: None,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Laad een JSON-document en vervang de huidige graph.
    pub fn load_json(&mut self, json: &str) -> Result<(), EngineError> {
        let graph = parse::parse_str(json, &self.registry)?;
        self.set_graph(graph);
        Ok(())
    }

    /// Schrijf de huidige graph naar JSON.
    pub fn to_json(&self) -> Result<String, EngineError> {
        let graph = self.graph.as_ref().ok_or(EngineError::NoGraph)?;
        Ok(parse::to_string(graph)?)
    }

    /// Vervang de huidige graph. Een eerdere build vervalt.
    pub fn set_graph(&mut self, graph: Graph) {
        self.graph = Some(graph);
        self.last_build = None;
    }

    #[must_use]
    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }

    /// Muteerbare toegang tot de graph. Een bestaande build blijft staan:
    /// gecachte blokken houden hun build-waarde, contextuele blokken zien
    /// de mutatie bij de volgende pull.
    pub fn graph_mut(&mut self) -> Option<&mut Graph> {
        self.graph.as_mut()
    }

    /// Seed voor de volgende build.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    /// Bouw de geladen graph en bewaar het resultaat.
    pub fn build(&mut self) -> Result<(), EngineError> {
        let graph = self.graph.as_ref().ok_or(EngineError::NoGraph)?;
        let options = BuildOptions { seed: self.seed };
        self.last_build = Some(evaluator::build(graph, &options)?);
        Ok(())
    }

    /// De einduitvoer van de laatste build, als het output-blok geometrie
    /// ontving.
    pub fn vertex_data(&self) -> Result<Option<&VertexData>, EngineError> {
        let build = self.last_build.as_ref().ok_or(EngineError::NotBuilt)?;
        Ok(build.vertex_data())
    }

    /// Vraag een output-pin op tegen de laatste build.
    pub fn pull(&mut self, block: BlockId, pin: &str) -> Result<Value, EngineError> {
        let graph = self.graph.as_ref().ok_or(EngineError::NoGraph)?;
        let build = self.last_build.as_mut().ok_or(EngineError::NotBuilt)?;
        Ok(build.pull(graph, block, pin)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "blocks": [
            { "id": 1, "type": "BoxBlock" },
            { "id": 2, "type": "GeometryOutputBlock" }
        ],
        "connections": [
            { "fromBlock": 1, "fromPin": "output", "toBlock": 2, "toPin": "geometry" }
        ]
    }"#;

    #[test]
    fn engine_errors_before_load_and_build() {
        let mut engine = Engine::new();
        assert!(matches!(engine.build(), Err(EngineError::NoGraph)));
        assert!(matches!(engine.to_json(), Err(EngineError::NoGraph)));

        engine.load_json(DOC).unwrap();
        assert!(matches!(engine.vertex_data(), Err(EngineError::NotBuilt)));

        engine.build().unwrap();
        let data = engine.vertex_data().unwrap().expect("geometrie aanwezig");
        assert_eq!(data.vertex_count(), 24);
    }

    #[test]
    fn json_round_trip_via_engine() {
        let mut engine = Engine::new();
        engine.load_json(DOC).unwrap();
        let written = engine.to_json().unwrap();

        let mut second = Engine::new();
        second.load_json(&written).unwrap();
        second.build().unwrap();
        assert!(second.vertex_data().unwrap().is_some());
    }

    #[test]
    fn pull_reads_block_outputs_after_build() {
        let mut engine = Engine::new();
        engine.load_json(DOC).unwrap();
        engine.build().unwrap();
        let value = engine.pull(BlockId::new(1), "output").unwrap();
        assert!(matches!(value, Value::Geometry(_)));
    }
}
