//! Diagram technical-detail aggregation.
//!
//! Derives read-only views from a diagram's `data` payload: node and
//! connection lists, the nodes carrying technical details, per-category
//! counts and a technical-detail search predicate. Everything here is pure
//! and synchronous; the only fallible step is parsing the opaque JSON
//! document into [`DiagramData`].

pub mod document;
pub mod search;
pub mod stats;

use thiserror::Error;

pub use document::{
    Connection, DetailItem, DiagramData, Lenient, Node, NodeId, PayloadDirection, PayloadItem,
    TechnicalDetails,
};
pub use search::{MatchPolicy, matches_technical_detail, search_by_technical_detail};
pub use stats::{
    TechnicalStats, extract_connections, extract_nodes, has_technical_details,
    nodes_with_technical_details, technical_items_count, technical_stats,
};

/// Errors raised at the aggregator's entry boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    /// The `data` root is not an object, or `nodes`/`connections` is not an array.
    #[error("Malformed diagram document: {0}")]
    MalformedDocument(String),
}
