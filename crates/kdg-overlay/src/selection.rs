//! Shared selection pattern for curriculum and exam overlays.
//!
//! Both overlays resolve a concept set the same way: start from the
//! explicit selection, extend it with the transitive prerequisite closure
//! of every selected concept, then remove anything excluded. The underlying
//! graph is never mutated.

use kdg_core::graph::ConceptGraph;
use std::collections::{BTreeSet, HashSet};

/// Expand `selected` with all transitive prerequisites, then subtract
/// `excluded`.
pub fn expand_selection(
    graph: &ConceptGraph,
    selected: impl IntoIterator<Item = String>,
    excluded: &BTreeSet<String>,
) -> HashSet<String> {
    let mut result: HashSet<String> = HashSet::new();
    for id in selected {
        for prereq in graph.all_prerequisites(&id) {
            result.insert(prereq.id.clone());
        }
        result.insert(id);
    }
    for id in excluded {
        result.remove(id);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kdg_core::graph::{ConceptNode, DependencyEdge, EdgeKind, NodeKind};

    fn make_node(id: &str) -> ConceptNode {
        let now = Utc::now();
        ConceptNode {
            id: id.to_string(),
            kind: NodeKind::Concept,
            title: id.to_string(),
            description: String::new(),
            complexity: 1.0,
            domains: vec![],
            tags: vec![],
            requires: vec![],
            generalizes: vec![],
            special_cases: vec![],
            used_in: vec![],
            exam_appearances: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_expansion_pulls_in_closure_and_drops_excluded() {
        // A -> B -> C, selecting C alone.
        let mut graph = ConceptGraph::new();
        for id in ["A", "B", "C"] {
            graph.insert_node(make_node(id));
        }
        for (from, to) in [("A", "B"), ("B", "C")] {
            graph.insert_edge(DependencyEdge {
                from: from.to_string(),
                to: to.to_string(),
                kind: EdgeKind::Requires,
                weight: 1.0,
                metadata: None,
            });
        }

        let excluded: BTreeSet<String> = ["A".to_string()].into_iter().collect();
        let result = expand_selection(&graph, ["C".to_string()], &excluded);
        assert!(result.contains("B"));
        assert!(result.contains("C"));
        assert!(!result.contains("A"), "excluded wins over closure");
    }
}
