//! Kern datastructuren voor het modelleren van geometry-grafen.

use std::collections::HashMap;
use std::fmt;

pub mod block;
pub mod context;
pub mod evaluator;
pub mod topo;
pub mod value;
pub mod wire;

use block::{Block, BlockId};
use value::PointType;
use wire::Wire;

/// Graph container met een index voor snelle lookups.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    blocks: Vec<Block>,
    wires: Vec<Wire>,
    block_index: HashMap<BlockId, usize>,
    next_id: usize,
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Voeg een blok toe aan de graph. Als `block.id` niet gezet is, wordt een
    /// nieuw id uitgegeven.
    pub fn add_block(&mut self, mut block: Block) -> Result<BlockId, GraphError> {
        let id = if block.id == BlockId::default() {
            let assigned = BlockId::new(self.next_id);
            self.next_id += 1;
            block.id = assigned;
            assigned
        } else {
            self.next_id = self.next_id.max(block.id.0 + 1);
            block.id
        };

        if self.block_index.contains_key(&id) {
            return Err(GraphError::DuplicateBlock(id));
        }

        let idx = self.blocks.len();
        self.block_index.insert(id, idx);
        self.blocks.push(block);
        Ok(id)
    }

    /// Voeg een verbinding toe. Eindpunten en pins moeten bestaan, een
    /// input-pin mag maar een bron hebben en de typen moeten passen.
    pub fn add_wire(&mut self, wire: Wire) -> Result<(), GraphError> {
        let Some(from) = self.block(wire.from_block) else {
            return Err(GraphError::UnknownBlock(wire.from_block));
        };
        let Some(to) = self.block(wire.to_block) else {
            return Err(GraphError::UnknownBlock(wire.to_block));
        };

        if from.output(wire.from_pin.as_str()).is_none() {
            return Err(GraphError::UnknownOutputPin {
                block: wire.from_block,
                pin: wire.from_pin.0.clone(),
            });
        }
        let Some(input) = to.input(wire.to_pin.as_str()) else {
            return Err(GraphError::UnknownInputPin {
                block: wire.to_block,
                pin: wire.to_pin.0.clone(),
            });
        };

        if self.upstream_of(wire.to_block, wire.to_pin.as_str()).is_some() {
            return Err(GraphError::InputAlreadyConnected {
                block: wire.to_block,
                pin: wire.to_pin.0.clone(),
            });
        }

        let found = self
            .resolved_output_type(wire.from_block, wire.from_pin.as_str())
            .unwrap_or(PointType::AutoDetect);
        if !input.accepts_type(found) {
            return Err(GraphError::TypeMismatch {
                from_block: wire.from_block,
                from_pin: wire.from_pin.0.clone(),
                to_block: wire.to_block,
                to_pin: wire.to_pin.0.clone(),
                expected: input.point_type,
                found,
            });
        }

        self.wires.push(wire);
        Ok(())
    }

    /// De wire die de gegeven input-pin voedt, als die er is.
    #[must_use]
    pub fn upstream_of(&self, block: BlockId, pin: &str) -> Option<&Wire> {
        self.wires
            .iter()
            .find(|wire| wire.to_block == block && wire.to_pin.as_str() == pin)
    }

    /// Effectief type van een output-pin. `BasedOnInput` volgt de eerste
    /// verbonden input stroomopwaarts; onoplosbaar wordt `AutoDetect`.
    #[must_use]
    pub fn resolved_output_type(&self, block: BlockId, pin: &str) -> Option<PointType> {
        let mut visited = Vec::new();
        self.resolve_output_type(block, pin, &mut visited)
    }

    fn resolve_output_type(
        &self,
        id: BlockId,
        pin: &str,
        visited: &mut Vec<(BlockId, String)>,
    ) -> Option<PointType> {
        let block = self.block(id)?;
        let output = block.output(pin)?;
        if output.point_type != PointType::BasedOnInput {
            return Some(output.point_type);
        }

        let key = (id, pin.to_owned());
        if visited.contains(&key) {
            return Some(PointType::AutoDetect);
        }
        visited.push(key);

        for input in block.inputs() {
            if let Some(wire) = self.upstream_of(id, input.name) {
                let upstream =
                    self.resolve_output_type(wire.from_block, wire.from_pin.as_str(), visited);
                return Some(upstream.unwrap_or(PointType::AutoDetect));
            }
        }

        Some(PointType::AutoDetect)
    }

    #[must_use]
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.block_index
            .get(&id)
            .and_then(|idx| self.blocks.get(*idx))
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.block_index
            .get(&id)
            .copied()
            .and_then(move |idx| self.blocks.get_mut(idx))
    }

    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    #[must_use]
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }
}

/// Fouten die kunnen optreden bij het opbouwen van de graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    DuplicateBlock(BlockId),
    UnknownBlock(BlockId),
    UnknownInputPin { block: BlockId, pin: String },
    UnknownOutputPin { block: BlockId, pin: String },
    InputAlreadyConnected { block: BlockId, pin: String },
    TypeMismatch {
        from_block: BlockId,
        from_pin: String,
        to_block: BlockId,
        to_pin: String,
        expected: PointType,
        found: PointType,
    },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateBlock(id) => write!(f, "blok {id} bestaat al in de graph"),
            Self::UnknownBlock(id) => write!(f, "blok {id} niet gevonden in graph"),
            Self::UnknownInputPin { block, pin } => {
                write!(f, "blok {block} heeft geen input-pin `{pin}`")
            }
            Self::UnknownOutputPin { block, pin } => {
                write!(f, "blok {block} heeft geen output-pin `{pin}`")
            }
            Self::InputAlreadyConnected { block, pin } => {
                write!(f, "input-pin `{pin}` van blok {block} is al verbonden")
            }
            Self::TypeMismatch {
                from_block,
                from_pin,
                to_block,
                to_pin,
                expected,
                found,
            } => write!(
                f,
                "verbinding {from_block}.{from_pin} -> {to_block}.{to_pin}: verwachtte type `{expected}` maar kreeg `{found}`"
            ),
        }
    }
}

impl std::error::Error for GraphError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::BlockKind;
    use crate::blocks::info::{self, ElbowBlock, InfoBlock};
    use crate::blocks::input::InputBlock;
    use crate::blocks::sources;
    use value::Value;

    fn float_input(value: f64) -> Block {
        Block::new(BlockKind::Input(InputBlock::literal(Value::Float(value))))
    }

    fn box_source() -> Block {
        Block::new(BlockKind::Source(sources::BlockKind::Box(
            sources::BoxBlock::default(),
        )))
    }

    fn elbow() -> Block {
        Block::new(BlockKind::Info(info::BlockKind::Elbow(ElbowBlock::default())))
    }

    #[test]
    fn inserting_blocks_assigns_ids() {
        let mut graph = Graph::new();
        let a = graph.add_block(float_input(1.0)).unwrap();
        let b = graph.add_block(float_input(2.0)).unwrap();
        assert_eq!(graph.block_count(), 2);
        assert_ne!(a, b);
        assert!(graph.block(a).is_some());
    }

    #[test]
    fn explicit_ids_are_respected_and_bumped_past() {
        let mut graph = Graph::new();
        let block = Block::with_id(BlockId::new(7), BlockKind::Input(InputBlock::literal(Value::Int(3))));
        let id = graph.add_block(block).unwrap();
        assert_eq!(id, BlockId::new(7));

        let next = graph.add_block(float_input(0.0)).unwrap();
        assert_eq!(next, BlockId::new(8));
    }

    #[test]
    fn duplicate_blocks_error() {
        let mut graph = Graph::new();
        graph
            .add_block(Block::with_id(BlockId::new(5), BlockKind::Input(InputBlock::literal(Value::Int(1)))))
            .unwrap();
        let err = graph
            .add_block(Block::with_id(BlockId::new(5), BlockKind::Input(InputBlock::literal(Value::Int(2)))))
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateBlock(id) if id == BlockId::new(5)));
    }

    #[test]
    fn wire_endpoints_and_pins_are_checked() {
        let mut graph = Graph::new();
        let source = graph.add_block(box_source()).unwrap();

        let err = graph
            .add_wire(Wire::new(source, "output", BlockId::new(99), "geometry"))
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownBlock(_)));

        let info = graph
            .add_block(Block::new(BlockKind::Info(info::BlockKind::Info(
                InfoBlock::default(),
            ))))
            .unwrap();
        let err = graph
            .add_wire(Wire::new(source, "verkeerd", info, "geometry"))
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownOutputPin { .. }));

        let err = graph
            .add_wire(Wire::new(source, "output", info, "verkeerd"))
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownInputPin { .. }));

        graph
            .add_wire(Wire::new(source, "output", info, "geometry"))
            .unwrap();
        let err = graph
            .add_wire(Wire::new(source, "output", info, "geometry"))
            .unwrap_err();
        assert!(matches!(err, GraphError::InputAlreadyConnected { .. }));
    }

    #[test]
    fn wire_types_must_match() {
        let mut graph = Graph::new();
        let number = graph.add_block(float_input(1.5)).unwrap();
        let info = graph
            .add_block(Block::new(BlockKind::Info(info::BlockKind::Info(
                InfoBlock::default(),
            ))))
            .unwrap();

        let err = graph
            .add_wire(Wire::new(number, "output", info, "geometry"))
            .unwrap_err();
        match err {
            GraphError::TypeMismatch {
                expected, found, ..
            } => {
                assert_eq!(expected, PointType::Geometry);
                assert_eq!(found, PointType::Float);
            }
            other => panic!("onverwachte fout: {other}"),
        }
    }

    #[test]
    fn float_and_int_are_interchangeable_on_wires() {
        let mut graph = Graph::new();
        let number = graph.add_block(float_input(12.0)).unwrap();
        let sphere = graph
            .add_block(Block::new(BlockKind::Source(sources::BlockKind::Sphere(
                sources::SphereBlock::default(),
            ))))
            .unwrap();
        // Float-output op een Int-pin moet gewoon verbinden.
        graph
            .add_wire(Wire::new(number, "output", sphere, "segments"))
            .unwrap();
    }

    #[test]
    fn elbow_output_follows_first_connected_input() {
        let mut graph = Graph::new();
        let number = graph.add_block(float_input(3.0)).unwrap();
        let pass_a = graph.add_block(elbow()).unwrap();
        let pass_b = graph.add_block(elbow()).unwrap();

        assert_eq!(
            graph.resolved_output_type(pass_a, "output"),
            Some(PointType::AutoDetect)
        );

        graph
            .add_wire(Wire::new(number, "output", pass_a, "input"))
            .unwrap();
        graph
            .add_wire(Wire::new(pass_a, "output", pass_b, "input"))
            .unwrap();

        assert_eq!(
            graph.resolved_output_type(pass_a, "output"),
            Some(PointType::Float)
        );
        assert_eq!(
            graph.resolved_output_type(pass_b, "output"),
            Some(PointType::Float)
        );
    }
}
