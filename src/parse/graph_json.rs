//! Parser en writer voor graph-documenten in JSON.
//!
//! Een document bestaat uit een `blocks`-lijst en een `connections`-lijst.
//! Het `type`-veld van een blok is de geregistreerde klassenaam; `properties`
//! bevat de property-struct van het blok en `defaults` alleen de pin-defaults
//! die afwijken van de geregistreerde waarde.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blocks::BlockRegistry;
use crate::graph::block::{Block, BlockId};
use crate::graph::value::Value;
use crate::graph::wire::Wire;
use crate::graph::{Graph, GraphError};

/// Result type voor het lezen en schrijven van graph-documenten.
pub type ParseResult<T> = Result<T, ParseError>;

/// Beschrijft fouten tijdens het parsen.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Het JSON-document kon niet gede-serialiseerd worden.
    #[error("JSON parsefout: {0}")]
    Json(#[from] serde_json::Error),
    /// De graph wees een blok, pin of verbinding af.
    #[error("ongeldige graph: {0}")]
    Graph(#[from] GraphError),
    /// Het document noemt een klassenaam die niet geregistreerd is.
    #[error("onbekende blokklasse `{0}`")]
    UnknownClass(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct GraphDocument {
    blocks: Vec<BlockRecord>,
    connections: Vec<ConnectionRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BlockRecord {
    id: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(rename = "type")]
    class: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    properties: serde_json::Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    defaults: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionRecord {
    from_block: usize,
    from_pin: String,
    to_block: usize,
    to_pin: String,
}

/// Leest een JSON-document en bouwt er een [`Graph`] uit op. Blokken worden
/// via de registry aangemaakt; onbekende klassen en pins zijn een fout.
pub fn parse_str(input: &str, registry: &BlockRegistry) -> ParseResult<Graph> {
    let document: GraphDocument = serde_json::from_str(input)?;
    log::debug!(
        "graph-document: {} blokken, {} verbindingen",
        document.blocks.len(),
        document.connections.len()
    );

    let mut graph = Graph::new();
    for record in document.blocks {
        let Some(mut kind) = registry.create(&record.class) else {
            return Err(ParseError::UnknownClass(record.class));
        };
        if !record.properties.is_null() {
            kind.apply_properties(&record.properties)?;
        }

        let mut block = Block::with_id(BlockId::new(record.id), kind);
        if let Some(name) = record.name {
            block = block.named(name);
        }
        for (pin, value) in record.defaults {
            block.set_default(&pin, value)?;
        }
        graph.add_block(block)?;
    }

    for record in document.connections {
        graph.add_wire(Wire::new(
            BlockId::new(record.from_block),
            record.from_pin,
            BlockId::new(record.to_block),
            record.to_pin,
        ))?;
    }

    Ok(graph)
}

/// Serialiseert een [`Graph`] naar JSON. De uitvoer is deterministisch:
/// blokken in graph-volgorde, defaults op pin-naam gesorteerd en
/// verbindingen in wire-volgorde.
pub fn to_string(graph: &Graph) -> ParseResult<String> {
    let mut blocks = Vec::with_capacity(graph.block_count());
    for block in graph.blocks() {
        blocks.push(BlockRecord {
            id: block.id.0,
            name: block.name.clone(),
            class: block.kind().class_name().to_owned(),
            properties: block.kind().serialize_properties()?,
            defaults: changed_defaults(block),
        });
    }

    let connections = graph
        .wires()
        .iter()
        .map(|wire| ConnectionRecord {
            from_block: wire.from_block.0,
            from_pin: wire.from_pin.as_str().to_owned(),
            to_block: wire.to_block.0,
            to_pin: wire.to_pin.as_str().to_owned(),
        })
        .collect();

    let document = GraphDocument {
        blocks,
        connections,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Alleen defaults die afwijken van de pin zoals het blok die registreert
/// komen in het document terecht.
fn changed_defaults(block: &Block) -> BTreeMap<String, Value> {
    let registered = block.kind().input_pins();
    let mut defaults = BTreeMap::new();
    for pin in block.inputs() {
        let original = registered
            .iter()
            .find(|p| p.name == pin.name)
            .map(|p| &p.default);
        if original != Some(&pin.default) {
            defaults.insert(pin.name.to_owned(), pin.default.clone());
        }
    }
    defaults
}
