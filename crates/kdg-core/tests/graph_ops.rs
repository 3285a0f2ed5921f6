use chrono::Utc;
use kdg_core::graph::*;

fn make_node(id: &str) -> ConceptNode {
    let now = Utc::now();
    ConceptNode {
        id: id.to_string(),
        kind: NodeKind::Concept,
        title: id.to_uppercase(),
        description: format!("the {id} concept"),
        complexity: 3.0,
        domains: vec!["algebra".to_string()],
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

fn requires(from: &str, to: &str) -> DependencyEdge {
    DependencyEdge {
        from: from.to_string(),
        to: to.to_string(),
        kind: EdgeKind::Requires,
        weight: 1.0,
        metadata: None,
    }
}

/// Nodes A (no prerequisites), B requires A, C requires B.
fn chain_graph() -> ConceptGraph {
    let mut graph = ConceptGraph::new();
    graph.insert_node(make_node("A"));
    graph.insert_node(make_node("B"));
    graph.insert_node(make_node("C"));
    graph.insert_edge(requires("A", "B"));
    graph.insert_edge(requires("B", "C"));
    graph
}

#[test]
fn test_insert_node_creates_adjacency_entries() {
    let mut graph = ConceptGraph::new();
    graph.insert_node(make_node("A"));
    assert!(graph.forward.contains_key("A"));
    assert!(graph.reverse.contains_key("A"));
    assert!(graph.forward["A"].is_empty());
}

#[test]
fn test_insert_node_replaces_by_id() {
    let mut graph = ConceptGraph::new();
    graph.insert_node(make_node("A"));
    let mut updated = make_node("A");
    updated.title = "replaced".to_string();
    graph.insert_node(updated);
    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.nodes["A"].title, "replaced");
}

#[test]
fn test_direct_prerequisites() {
    let graph = chain_graph();
    let prereqs = graph.prerequisites("C");
    assert_eq!(prereqs.len(), 1);
    assert_eq!(prereqs[0].id, "B");
}

#[test]
fn test_prerequisites_unknown_id_is_empty() {
    let graph = chain_graph();
    assert!(graph.prerequisites("nonexistent").is_empty());
    assert!(graph.all_prerequisites("nonexistent").is_empty());
    assert!(graph.dependents("nonexistent").is_empty());
}

#[test]
fn test_prerequisites_ignore_non_requires_edges() {
    let mut graph = chain_graph();
    graph.insert_edge(DependencyEdge {
        from: "A".to_string(),
        to: "C".to_string(),
        kind: EdgeKind::UsedIn,
        weight: 1.0,
        metadata: None,
    });
    let prereqs = graph.prerequisites("C");
    assert_eq!(prereqs.len(), 1);
    assert_eq!(prereqs[0].id, "B");
}

#[test]
fn test_transitive_closure_chain() {
    let graph = chain_graph();
    let mut ids: Vec<&str> = graph
        .all_prerequisites("C")
        .iter()
        .map(|n| n.id.as_str())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["A", "B"]);
}

#[test]
fn test_closure_excludes_self_in_acyclic_graph() {
    let graph = chain_graph();
    for id in ["A", "B", "C"] {
        assert!(
            !graph.all_prerequisites(id).iter().any(|n| n.id == id),
            "{id} must not appear in its own closure"
        );
    }
}

#[test]
fn test_closure_excludes_self_under_cycle() {
    let mut graph = ConceptGraph::new();
    graph.insert_node(make_node("A"));
    graph.insert_node(make_node("B"));
    graph.insert_edge(requires("A", "B"));
    graph.insert_edge(requires("B", "A"));

    let closure = graph.all_prerequisites("A");
    assert_eq!(closure.len(), 1);
    assert_eq!(closure[0].id, "B");
}

#[test]
fn test_dependents() {
    let graph = chain_graph();
    let deps = graph.dependents("A");
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].id, "B");
}

#[test]
fn test_topological_sort_chain() {
    let graph = chain_graph();
    let subset: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
    assert_eq!(graph.topological_sort(&subset), vec!["A", "B", "C"]);
}

#[test]
fn test_topological_sort_respects_edges() {
    // Diamond: A -> B, A -> C, B -> D, C -> D.
    let mut graph = ConceptGraph::new();
    for id in ["A", "B", "C", "D"] {
        graph.insert_node(make_node(id));
    }
    graph.insert_edge(requires("A", "B"));
    graph.insert_edge(requires("A", "C"));
    graph.insert_edge(requires("B", "D"));
    graph.insert_edge(requires("C", "D"));

    let subset: Vec<String> = ["D", "C", "B", "A"].iter().map(|s| s.to_string()).collect();
    let order = graph.topological_sort(&subset);
    assert_eq!(order.len(), 4);

    let pos = |id: &str| order.iter().position(|x| x == id).unwrap();
    assert!(pos("A") < pos("B"));
    assert!(pos("A") < pos("C"));
    assert!(pos("B") < pos("D"));
    assert!(pos("C") < pos("D"));
}

#[test]
fn test_topological_sort_ignores_out_of_subset_prerequisites() {
    // B requires A, but only B and C are in the subset: A's edge must not
    // count toward B's in-degree.
    let graph = chain_graph();
    let subset: Vec<String> = ["B", "C"].iter().map(|s| s.to_string()).collect();
    assert_eq!(graph.topological_sort(&subset), vec!["B", "C"]);
}

#[test]
fn test_topological_sort_omits_cycle_members() {
    let mut graph = ConceptGraph::new();
    graph.insert_node(make_node("A"));
    graph.insert_node(make_node("B"));
    graph.insert_edge(requires("A", "B"));
    graph.insert_edge(requires("B", "A"));

    let subset: Vec<String> = ["A", "B"].iter().map(|s| s.to_string()).collect();
    let order = graph.topological_sort(&subset);
    assert!(order.len() < 2, "neither cycle member reaches in-degree zero");
}

#[test]
fn test_detect_cycles_empty_on_acyclic() {
    let graph = chain_graph();
    assert!(graph.detect_cycles().is_empty());
}

#[test]
fn test_detect_cycles_two_node_cycle() {
    let mut graph = ConceptGraph::new();
    graph.insert_node(make_node("A"));
    graph.insert_node(make_node("B"));
    graph.insert_edge(requires("A", "B"));
    graph.insert_edge(requires("B", "A"));

    let cycles = graph.detect_cycles();
    assert_eq!(cycles.len(), 1);
    assert!(cycles[0].contains(&"A".to_string()));
    assert!(cycles[0].contains(&"B".to_string()));
}

#[test]
fn test_detect_cycles_canonical_and_deduplicated() {
    // Triangle: A -> B -> C -> A. The same rotation must come back no
    // matter which node the traversal starts from.
    let mut graph = ConceptGraph::new();
    for id in ["A", "B", "C"] {
        graph.insert_node(make_node(id));
    }
    graph.insert_edge(requires("A", "B"));
    graph.insert_edge(requires("B", "C"));
    graph.insert_edge(requires("C", "A"));

    let cycles = graph.detect_cycles();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0][0], "A", "cycle rotated to smallest member");
    assert_eq!(cycles[0].len(), 3);
}

#[test]
fn test_detect_cycles_ignores_non_requires() {
    let mut graph = ConceptGraph::new();
    graph.insert_node(make_node("A"));
    graph.insert_node(make_node("B"));
    graph.insert_edge(DependencyEdge {
        from: "A".to_string(),
        to: "B".to_string(),
        kind: EdgeKind::AppearsWith,
        weight: 1.0,
        metadata: None,
    });
    graph.insert_edge(DependencyEdge {
        from: "B".to_string(),
        to: "A".to_string(),
        kind: EdgeKind::AppearsWith,
        weight: 1.0,
        metadata: None,
    });
    assert!(graph.detect_cycles().is_empty());
}

#[test]
fn test_duplicate_edge_counts_twice() {
    let mut graph = ConceptGraph::new();
    graph.insert_node(make_node("A"));
    graph.insert_node(make_node("B"));
    graph.insert_edge(requires("A", "B"));
    graph.insert_edge(requires("A", "B"));

    assert_eq!(graph.prerequisites("B").len(), 2);
    assert_eq!(graph.to_snapshot().edges.len(), 2);
}

#[test]
fn test_subgraph_is_induced() {
    let mut graph = chain_graph();
    graph.insert_node(make_node("D"));
    graph.insert_edge(requires("C", "D"));

    let ids: std::collections::HashSet<String> =
        ["A", "B", "D"].iter().map(|s| s.to_string()).collect();
    let sub = graph.subgraph(&ids);

    assert_eq!(sub.nodes.len(), 3);
    // Only A -> B survives: B -> C and C -> D each have an endpoint outside.
    let total_edges: usize = sub.forward.values().map(Vec::len).sum();
    assert_eq!(total_edges, 1);
    assert_eq!(sub.forward["A"][0].to, "B");
}

#[test]
fn test_subgraph_ignores_unknown_ids() {
    let graph = chain_graph();
    let ids: std::collections::HashSet<String> =
        ["A", "ghost"].iter().map(|s| s.to_string()).collect();
    let sub = graph.subgraph(&ids);
    assert_eq!(sub.nodes.len(), 1);
}

#[test]
fn test_refresh_metadata_counts() {
    let mut graph = chain_graph();
    graph.insert_edge(DependencyEdge {
        from: "A".to_string(),
        to: "C".to_string(),
        kind: EdgeKind::UsedIn,
        weight: 1.0,
        metadata: None,
    });
    graph.refresh_metadata();
    assert_eq!(graph.metadata.total_nodes, 3);
    assert_eq!(graph.metadata.total_edges, 3);
    assert_eq!(graph.metadata.requires_edges, 2);
    assert_eq!(graph.metadata.nodes_by_kind["concept"], 3);
}
