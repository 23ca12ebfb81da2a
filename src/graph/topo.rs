//! Topologische utilities.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use super::{Graph, block::BlockId};

/// Resultaat van een topologische sortering.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Topology {
    pub order: Vec<BlockId>,
}

/// Fouttype voor topologische sortering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// De graph bevat een cyclus. Bevat een pad dat de cyclus illustreert.
    Cycle { cycle: Vec<BlockId> },
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cycle { cycle } => {
                if cycle.is_empty() {
                    f.write_str("graph bevat een cyclus")
                } else {
                    let chain = cycle
                        .iter()
                        .map(|BlockId(id)| id.to_string())
                        .collect::<Vec<_>>()
                        .join(" -> ");
                    write!(f, "graph bevat een cyclus: {chain}")
                }
            }
        }
    }
}

impl std::error::Error for TopologyError {}

impl Topology {
    /// Construeert een lege topologie.
    #[must_use]
    pub fn empty() -> Self {
        Self { order: Vec::new() }
    }

    /// Voert een topologische sortering uit met behulp van het Kahn algoritme.
    pub fn sort(graph: &Graph) -> Result<Self, TopologyError> {
        if graph.block_count() == 0 {
            return Ok(Self::empty());
        }

        let mut indegree: HashMap<BlockId, usize> = HashMap::new();
        let mut adjacency: HashMap<BlockId, Vec<BlockId>> = HashMap::new();

        for block in graph.blocks() {
            indegree.entry(block.id).or_insert(0);
            adjacency.entry(block.id).or_default();
        }

        for wire in graph.wires() {
            adjacency
                .entry(wire.from_block)
                .or_default()
                .push(wire.to_block);
            *indegree.entry(wire.to_block).or_insert(0) += 1;
        }

        for neighbours in adjacency.values_mut() {
            neighbours.sort();
        }

        let mut zero_indegree: Vec<BlockId> = indegree
            .iter()
            .filter_map(|(block, &count)| (count == 0).then_some(*block))
            .collect();
        zero_indegree.sort();

        let mut queue: VecDeque<BlockId> = zero_indegree.into();
        let mut order = Vec::with_capacity(graph.block_count());

        while let Some(block) = queue.pop_front() {
            order.push(block);
            if let Some(neighbours) = adjacency.get(&block) {
                for neighbour in neighbours {
                    if let Some(count) = indegree.get_mut(neighbour) {
                        *count -= 1;
                        if *count == 0 {
                            queue.push_back(*neighbour);
                        }
                    }
                }
            }
        }

        if order.len() == graph.block_count() {
            return Ok(Self { order });
        }

        let cycle = find_cycle(&adjacency).unwrap_or_default();
        Err(TopologyError::Cycle { cycle })
    }
}

fn find_cycle(adjacency: &HashMap<BlockId, Vec<BlockId>>) -> Option<Vec<BlockId>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum VisitState {
        Unvisited,
        Visiting,
        Visited,
    }

    fn dfs(
        block: BlockId,
        adjacency: &HashMap<BlockId, Vec<BlockId>>,
        state: &mut HashMap<BlockId, VisitState>,
        stack: &mut Vec<BlockId>,
    ) -> Option<Vec<BlockId>> {
        state.insert(block, VisitState::Visiting);
        stack.push(block);

        if let Some(neighbours) = adjacency.get(&block) {
            for neighbour in neighbours {
                match state
                    .get(neighbour)
                    .copied()
                    .unwrap_or(VisitState::Unvisited)
                {
                    VisitState::Unvisited => {
                        if let Some(cycle) = dfs(*neighbour, adjacency, state, stack) {
                            return Some(cycle);
                        }
                    }
                    VisitState::Visiting => {
                        if let Some(position) = stack.iter().position(|&n| n == *neighbour) {
                            let mut cycle = stack[position..].to_vec();
                            cycle.push(*neighbour);
                            return Some(cycle);
                        }
                    }
                    VisitState::Visited => {}
                }
            }
        }

        stack.pop();
        state.insert(block, VisitState::Visited);
        None
    }

    let mut state: HashMap<BlockId, VisitState> = HashMap::new();
    for block in adjacency.keys() {
        if state.get(block).copied().unwrap_or(VisitState::Unvisited) == VisitState::Unvisited {
            let mut stack = Vec::new();
            if let Some(cycle) = dfs(*block, adjacency, &mut state, &mut stack) {
                return Some(cycle);
            }
        }
    }

    None
}
