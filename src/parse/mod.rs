//! Lezen en schrijven van graph-documenten.

pub mod graph_json;

pub use graph_json::{ParseError, ParseResult, parse_str, to_string};
