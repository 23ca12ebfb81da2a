//! Bouwen en evalueren van geometry-grafen.
//!
//! `build` legt per blok een binding vast: gretig geëvalueerde blokken
//! krijgen hun outputs gecached, contextuele blokken worden bij elke pull
//! opnieuw geëvalueerd. De einduitvoer van het output-blok wordt op de
//! build bewaard.

use std::collections::{HashMap, HashSet};
use std::fmt;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::blocks::{BlockKind, OutputMap, output::PIN_GEOMETRY};
use crate::geom::VertexData;
use crate::graph::Graph;
use crate::graph::block::{Block, BlockId};
use crate::graph::context::EvalContext;
use crate::graph::topo::{Topology, TopologyError};
use crate::graph::value::Value;

/// Configuratie voor een build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildOptions {
    /// Seed voor de enkele generator die de hele build voedt.
    pub seed: u64,
}

/// Vooraf opgebouwd plan: evaluatievolgorde plus inkomende verbindingen.
#[derive(Debug, Clone, Default)]
pub struct EvaluationPlan {
    /// Topologische volgorde, beperkt tot voorouders van het output-blok.
    order: Vec<BlockId>,
    /// Inkomende verbinding per input-pin, voor alle wires in de graph.
    incoming: HashMap<BlockId, HashMap<String, (BlockId, String)>>,
}

impl EvaluationPlan {
    /// Bouwt een plan voor de voorouders van `output`.
    pub fn new(graph: &Graph, output: BlockId) -> Result<Self, EvaluationError> {
        let topology = Topology::sort(graph)?;

        let mut incoming: HashMap<BlockId, HashMap<String, (BlockId, String)>> = HashMap::new();
        for wire in graph.wires() {
            incoming.entry(wire.to_block).or_default().insert(
                wire.to_pin.0.clone(),
                (wire.from_block, wire.from_pin.0.clone()),
            );
        }

        let mut reachable: HashSet<BlockId> = HashSet::new();
        let mut stack = vec![output];
        while let Some(id) = stack.pop() {
            if reachable.insert(id) {
                if let Some(pins) = incoming.get(&id) {
                    for (from, _) in pins.values() {
                        stack.push(*from);
                    }
                }
            }
        }

        let order = topology
            .order
            .into_iter()
            .filter(|id| reachable.contains(id))
            .collect();

        Ok(Self { order, incoming })
    }

    #[must_use]
    pub fn order(&self) -> &[BlockId] {
        &self.order
    }

    fn upstream(&self, block: BlockId, pin: &str) -> Option<&(BlockId, String)> {
        self.incoming.get(&block).and_then(|pins| pins.get(pin))
    }
}

/// Fouttype voor evaluatieproblemen.
#[derive(Debug)]
pub enum EvaluationError {
    /// Topologiesortering is mislukt.
    Topology(TopologyError),
    /// Het blok kon niet teruggevonden worden in de graph.
    UnknownBlock(BlockId),
    /// Het blok heeft de gevraagde pin niet.
    UnknownPin { block: BlockId, pin: String },
    /// De graph bevat geen output-blok.
    MissingOutputBlock,
    /// De graph bevat meer dan een output-blok.
    MultipleOutputBlocks,
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topology(err) => write!(f, "topologiesortering mislukt: {err}"),
            Self::UnknownBlock(id) => write!(f, "blok {id} bestaat niet in de graph"),
            Self::UnknownPin { block, pin } => {
                write!(f, "blok {block} heeft geen pin `{pin}`")
            }
            Self::MissingOutputBlock => f.write_str("graph bevat geen output-blok"),
            Self::MultipleOutputBlocks => f.write_str("graph bevat meer dan een output-blok"),
        }
    }
}

impl std::error::Error for EvaluationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Topology(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TopologyError> for EvaluationError {
    fn from(error: TopologyError) -> Self {
        Self::Topology(error)
    }
}

/// Binding van een blok na de build-pass.
#[derive(Debug, Clone)]
pub enum OutputBindings {
    /// Outputs liggen vast; een pull kloont de opgeslagen waarde.
    Cached(OutputMap),
    /// Elke pull evalueert het blok opnieuw tegen de actuele graph.
    Recompute,
}

/// Resultaat van een build: bindings, generator en de vastgelegde uitvoer.
#[derive(Debug)]
pub struct GeometryBuild {
    plan: EvaluationPlan,
    bindings: HashMap<BlockId, OutputBindings>,
    rng: StdRng,
    next_geometry_id: u64,
    vertex_data: Option<VertexData>,
}

/// Bouwt de graph: bindings vastleggen en het output-blok uitrekenen.
pub fn build(graph: &Graph, options: &BuildOptions) -> Result<GeometryBuild, EvaluationError> {
    let output = find_output_block(graph)?;
    let plan = EvaluationPlan::new(graph, output)?;

    let mut state = GeometryBuild {
        plan,
        bindings: HashMap::new(),
        rng: StdRng::seed_from_u64(options.seed),
        next_geometry_id: 1,
        vertex_data: None,
    };

    let order: Vec<BlockId> = state.plan.order().to_vec();
    let root = EvalContext::root();
    let mut cached = 0usize;
    for id in order {
        let block = graph.block(id).ok_or(EvaluationError::UnknownBlock(id))?;
        if block.kind().evaluate_context() {
            state.bindings.insert(id, OutputBindings::Recompute);
        } else {
            let outputs = state.build_block(graph, block, &root)?;
            state.bindings.insert(id, OutputBindings::Cached(outputs));
            cached += 1;
        }
    }

    log::debug!(
        "build: {} blokken in plan, {cached} gecached, seed {}",
        state.plan.order().len(),
        options.seed
    );

    let output_block = graph
        .block(output)
        .ok_or(EvaluationError::UnknownBlock(output))?;
    let value = state.input_value(graph, output_block, PIN_GEOMETRY, &root)?;
    state.vertex_data = match value {
        Value::Geometry(data) => Some(data),
        _ => None,
    };

    Ok(state)
}

fn find_output_block(graph: &Graph) -> Result<BlockId, EvaluationError> {
    let mut found = None;
    for block in graph.blocks() {
        if matches!(block.kind(), BlockKind::Output(_)) {
            if found.is_some() {
                return Err(EvaluationError::MultipleOutputBlocks);
            }
            found = Some(block.id);
        }
    }
    found.ok_or(EvaluationError::MissingOutputBlock)
}

impl GeometryBuild {
    /// De bij de build vastgelegde einduitvoer, als die er was.
    #[must_use]
    pub fn vertex_data(&self) -> Option<&VertexData> {
        self.vertex_data.as_ref()
    }

    #[must_use]
    pub fn plan(&self) -> &EvaluationPlan {
        &self.plan
    }

    /// Vraagt een output-waarde op onder de wortel-context.
    pub fn pull(
        &mut self,
        graph: &Graph,
        block: BlockId,
        pin: &str,
    ) -> Result<Value, EvaluationError> {
        let root = EvalContext::root();
        self.output_value(graph, block, pin, &root)
    }

    /// Lost een output-pin op tegen de gegeven context.
    ///
    /// Gecachte blokken leveren hun opgeslagen waarde; contextuele blokken
    /// worden opnieuw geëvalueerd. Een gretig blok buiten het plan wordt bij
    /// de eerste pull onder de wortel-context gememoizeerd.
    pub fn output_value(
        &mut self,
        graph: &Graph,
        id: BlockId,
        pin: &str,
        ctx: &EvalContext<'_>,
    ) -> Result<Value, EvaluationError> {
        if let Some(OutputBindings::Cached(map)) = self.bindings.get(&id) {
            return map.get(pin).cloned().ok_or_else(|| EvaluationError::UnknownPin {
                block: id,
                pin: pin.to_owned(),
            });
        }

        let block = graph.block(id).ok_or(EvaluationError::UnknownBlock(id))?;
        if block.output(pin).is_none() {
            return Err(EvaluationError::UnknownPin {
                block: id,
                pin: pin.to_owned(),
            });
        }

        let contextual = block.kind().evaluate_context();
        let root = EvalContext::root();
        let eval_ctx = if contextual { ctx } else { &root };
        let outputs = self.build_block(graph, block, eval_ctx)?;
        let value = outputs
            .get(pin)
            .cloned()
            .ok_or_else(|| EvaluationError::UnknownPin {
                block: id,
                pin: pin.to_owned(),
            })?;

        if !contextual {
            self.bindings.insert(id, OutputBindings::Cached(outputs));
        }

        Ok(value)
    }

    /// Waarde van een input-pin: de verbonden upstream-output, anders de
    /// default van de pin.
    pub fn input_value(
        &mut self,
        graph: &Graph,
        block: &Block,
        pin: &str,
        ctx: &EvalContext<'_>,
    ) -> Result<Value, EvaluationError> {
        let upstream = self.plan.upstream(block.id, pin).cloned();
        if let Some((from, from_pin)) = upstream {
            return self.output_value(graph, from, &from_pin, ctx);
        }
        match block.input(pin) {
            Some(slot) => Ok(slot.default.clone()),
            None => Err(EvaluationError::UnknownPin {
                block: block.id,
                pin: pin.to_owned(),
            }),
        }
    }

    /// Evalueert het blok en levert de volledige output-map.
    pub fn build_block(
        &mut self,
        graph: &Graph,
        block: &Block,
        ctx: &EvalContext<'_>,
    ) -> Result<OutputMap, EvaluationError> {
        block.kind().build(graph, block, self, ctx)
    }

    /// Of de gegeven input-pin door een wire gevoed wordt.
    #[must_use]
    pub fn has_connection(&self, block: BlockId, pin: &str) -> bool {
        self.plan.upstream(block, pin).is_some()
    }

    /// De generator waarmee de hele build zijn trekkingen doet.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Deelt een vers geometry-id uit.
    pub fn fresh_geometry_id(&mut self) -> u64 {
        let id = self.next_geometry_id;
        self.next_geometry_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::input::InputBlock;
    use crate::blocks::output::OutputBlock;
    use crate::blocks::sources::{self, BoxBlock};
    use crate::graph::wire::Wire;

    fn box_block() -> Block {
        Block::new(BlockKind::Source(sources::BlockKind::Box(BoxBlock::default())))
    }

    fn output_block() -> Block {
        Block::new(BlockKind::Output(OutputBlock::default()))
    }

    #[test]
    fn build_requires_exactly_one_output_block() {
        let mut graph = Graph::new();
        graph.add_block(box_block()).unwrap();
        let err = build(&graph, &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, EvaluationError::MissingOutputBlock));

        graph.add_block(output_block()).unwrap();
        graph.add_block(output_block()).unwrap();
        let err = build(&graph, &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, EvaluationError::MultipleOutputBlocks));
    }

    #[test]
    fn build_captures_output_geometry() {
        let mut graph = Graph::new();
        let source = graph.add_block(box_block()).unwrap();
        let sink = graph.add_block(output_block()).unwrap();
        graph
            .add_wire(Wire::new(source, "output", sink, "geometry"))
            .unwrap();

        let result = build(&graph, &BuildOptions::default()).expect("build slaagt");
        let data = result.vertex_data().expect("geometrie aanwezig");
        assert_eq!(data.vertex_count(), 24);
        assert_eq!(data.triangle_count(), 12);
    }

    #[test]
    fn plan_is_restricted_to_output_ancestors() {
        let mut graph = Graph::new();
        let source = graph.add_block(box_block()).unwrap();
        let stray = graph.add_block(box_block()).unwrap();
        let sink = graph.add_block(output_block()).unwrap();
        graph
            .add_wire(Wire::new(source, "output", sink, "geometry"))
            .unwrap();

        let mut result = build(&graph, &BuildOptions::default()).expect("build slaagt");
        assert!(result.plan().order().contains(&source));
        assert!(!result.plan().order().contains(&stray));

        // Buiten het plan blijft een blok gewoon opvraagbaar.
        let value = result.pull(&graph, stray, "output").expect("pull slaagt");
        assert!(matches!(value, Value::Geometry(_)));
    }

    #[test]
    fn lazy_blocks_observe_graph_mutation() {
        let mut graph = Graph::new();
        let source = graph.add_block(box_block()).unwrap();
        let sink = graph.add_block(output_block()).unwrap();
        graph
            .add_wire(Wire::new(source, "output", sink, "geometry"))
            .unwrap();

        let mut result = build(&graph, &BuildOptions::default()).expect("build slaagt");

        graph
            .block_mut(source)
            .unwrap()
            .set_default("width", Value::Float(3.0))
            .unwrap();

        let value = result.pull(&graph, source, "output").expect("pull slaagt");
        let Value::Geometry(data) = value else {
            panic!("geometrie verwacht");
        };
        let bbox = data.bounding_box().expect("bbox");
        let size = bbox.size();
        assert!((size.x - 3.0).abs() < 1e-9);
    }

    #[test]
    fn eager_blocks_keep_their_build_value() {
        let mut graph = Graph::new();
        let source = graph.add_block(box_block()).unwrap();
        let sink = graph.add_block(output_block()).unwrap();
        graph
            .add_wire(Wire::new(source, "output", sink, "geometry"))
            .unwrap();

        if let BlockKind::Source(sources::BlockKind::Box(settings)) =
            graph.block_mut(source).unwrap().kind_mut()
        {
            settings.evaluate_context = false;
        }

        let mut result = build(&graph, &BuildOptions::default()).expect("build slaagt");

        graph
            .block_mut(source)
            .unwrap()
            .set_default("width", Value::Float(3.0))
            .unwrap();

        let value = result.pull(&graph, source, "output").expect("pull slaagt");
        let Value::Geometry(data) = value else {
            panic!("geometrie verwacht");
        };
        let bbox = data.bounding_box().expect("bbox");
        assert!((bbox.size().x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn literal_inputs_are_cached_at_build() {
        let mut graph = Graph::new();
        let number = graph
            .add_block(Block::new(BlockKind::Input(InputBlock::literal(Value::Float(4.0)))))
            .unwrap();
        let source = graph.add_block(box_block()).unwrap();
        let sink = graph.add_block(output_block()).unwrap();
        graph
            .add_wire(Wire::new(number, "output", source, "width"))
            .unwrap();
        graph
            .add_wire(Wire::new(source, "output", sink, "geometry"))
            .unwrap();

        let mut result = build(&graph, &BuildOptions::default()).expect("build slaagt");

        if let BlockKind::Input(input) = graph.block_mut(number).unwrap().kind_mut() {
            input.set_value(Value::Float(9.0));
        }

        // De literal is gretig: de build-waarde blijft staan.
        let value = result.pull(&graph, number, "output").expect("pull slaagt");
        assert_eq!(value, Value::Float(4.0));
    }
}
