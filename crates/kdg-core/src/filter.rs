//! Node filtering with an explicit options structure.
//!
//! Every recognized filter is a named field with a documented default;
//! there is no open-ended options bag.

use crate::graph::{ConceptGraph, ConceptNode, NodeKind};

/// Filter options for node selection. Default passes everything and caps
/// the result at 50 nodes.
#[derive(Debug, Clone)]
pub struct NodeFilter {
    /// Keep nodes tagged with at least one of these domains. Empty = any.
    pub domains: Vec<String>,
    /// Keep nodes carrying at least one of these tags. Empty = any.
    pub tags: Vec<String>,
    /// Keep nodes of these kinds. Empty = any.
    pub kinds: Vec<NodeKind>,
    /// Inclusive complexity lower bound.
    pub min_complexity: f64,
    /// Inclusive complexity upper bound.
    pub max_complexity: f64,
    /// Maximum number of nodes returned.
    pub limit: usize,
}

impl Default for NodeFilter {
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            tags: Vec::new(),
            kinds: Vec::new(),
            min_complexity: 0.0,
            max_complexity: 10.0,
            limit: 50,
        }
    }
}

/// Select nodes matching every populated filter field, in node-key order.
pub fn filter_nodes<'a>(graph: &'a ConceptGraph, filter: &NodeFilter) -> Vec<&'a ConceptNode> {
    graph
        .nodes
        .values()
        .filter(|node| matches(node, filter))
        .take(filter.limit)
        .collect()
}

fn matches(node: &ConceptNode, filter: &NodeFilter) -> bool {
    if !filter.kinds.is_empty() && !filter.kinds.contains(&node.kind) {
        return false;
    }
    if node.complexity < filter.min_complexity || node.complexity > filter.max_complexity {
        return false;
    }
    if !filter.domains.is_empty() && !filter.domains.iter().any(|d| node.domains.contains(d)) {
        return false;
    }
    if !filter.tags.is_empty() && !filter.tags.iter().any(|t| node.tags.contains(t)) {
        return false;
    }
    true
}
