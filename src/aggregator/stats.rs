//! Node views and technical-detail statistics.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::document::{Connection, DiagramData, Node, PayloadDirection};

/// Technical-detail statistics of one diagram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TechnicalStats {
    pub total_nodes: usize,
    pub nodes_with_details: usize,
    pub total_variables: usize,
    pub total_parameters: usize,
    pub total_arguments: usize,
    pub total_payloads: usize,
    pub incoming_payloads: usize,
    pub outgoing_payloads: usize,
}

pub fn extract_nodes(data: &DiagramData) -> &[Node] {
    data.nodes()
}

pub fn extract_connections(data: &DiagramData) -> &[Connection] {
    data.connections()
}

fn node_item_count(node: &Node) -> usize {
    let details = node.details();
    details.variables().len()
        + details.parameters().len()
        + details.arguments().len()
        + details.payloads().len()
}

/// True when any of variables, parameters, arguments or payloads is non-empty.
pub fn has_technical_details(node: &Node) -> bool {
    node_item_count(node) > 0
}

/// Nodes carrying technical details, in document order.
pub fn nodes_with_technical_details(data: &DiagramData) -> Vec<&Node> {
    data.nodes()
        .iter()
        .filter(|node| has_technical_details(node))
        .collect()
}

/// Total number of variables, parameters, arguments and payloads across all nodes.
pub fn technical_items_count(data: &DiagramData) -> usize {
    data.nodes().iter().map(node_item_count).sum()
}

/// Compute [`TechnicalStats`] in a single pass over the nodes.
pub fn technical_stats(data: &DiagramData) -> TechnicalStats {
    let nodes = data.nodes();
    let mut stats = TechnicalStats {
        total_nodes: nodes.len(),
        ..TechnicalStats::default()
    };

    for node in nodes {
        if has_technical_details(node) {
            stats.nodes_with_details += 1;
        }

        stats.total_variables += node.variables().len();
        stats.total_parameters += node.parameters().len();
        stats.total_arguments += node.arguments().len();
        stats.total_payloads += node.payloads().len();

        for payload in node.payloads() {
            match payload.direction() {
                PayloadDirection::Incoming => stats.incoming_payloads += 1,
                PayloadDirection::Outgoing => stats.outgoing_payloads += 1,
                PayloadDirection::Other => {}
            }
        }
    }

    stats
}
