use chrono::Utc;
use kdg_core::graph::*;
use kdg_core::schema;

fn make_node(id: &str, kind: NodeKind) -> ConceptNode {
    let now = Utc::now();
    ConceptNode {
        id: id.to_string(),
        kind,
        title: id.to_string(),
        description: String::new(),
        complexity: 2.5,
        domains: vec!["calculus".to_string()],
        tags: vec!["core".to_string()],
        requires: vec![],
        generalizes: vec![],
        special_cases: vec![],
        used_in: vec![],
        exam_appearances: vec![ExamAppearance {
            exam_id: "a_level_2024".to_string(),
            year: 2024,
        }],
        created_at: now,
        updated_at: now,
    }
}

fn edge(from: &str, to: &str, kind: EdgeKind) -> DependencyEdge {
    DependencyEdge {
        from: from.to_string(),
        to: to.to_string(),
        kind,
        weight: 1.0,
        metadata: None,
    }
}

fn build_graph() -> ConceptGraph {
    let mut graph = ConceptGraph::new();
    graph.insert_node(make_node("limit", NodeKind::Definition));
    graph.insert_node(make_node("derivative", NodeKind::Definition));
    graph.insert_node(make_node("chain_rule", NodeKind::Theorem));
    graph.insert_edge(edge("limit", "derivative", EdgeKind::Requires));
    graph.insert_edge(edge("derivative", "chain_rule", EdgeKind::Requires));
    graph.insert_edge(edge("chain_rule", "derivative", EdgeKind::UsedIn));
    // Duplicate on purpose: the multiset must survive the round trip.
    graph.insert_edge(edge("limit", "derivative", EdgeKind::Requires));
    graph.refresh_metadata();
    graph
}

/// Order-independent edge multiset key.
fn edge_multiset(snapshot: &GraphSnapshot) -> Vec<(String, String, String)> {
    let mut keys: Vec<(String, String, String)> = snapshot
        .edges
        .iter()
        .map(|e| (e.from.clone(), e.to.clone(), format!("{:?}", e.kind)))
        .collect();
    keys.sort();
    keys
}

#[test]
fn test_roundtrip_preserves_nodes_and_edge_multiset() {
    let graph = build_graph();
    let first = graph.to_snapshot();

    let rebuilt = ConceptGraph::from_snapshot(first.clone());
    let second = rebuilt.to_snapshot();

    let node_ids = |s: &GraphSnapshot| {
        let mut ids: Vec<String> = s.nodes.iter().map(|n| n.id.clone()).collect();
        ids.sort();
        ids
    };
    assert_eq!(node_ids(&first), node_ids(&second));
    assert_eq!(edge_multiset(&first), edge_multiset(&second));
}

#[test]
fn test_roundtrip_preserves_traversal_results() {
    let graph = build_graph();
    let rebuilt = ConceptGraph::from_snapshot(graph.to_snapshot());

    let closure = |g: &ConceptGraph, id: &str| {
        let mut ids: Vec<String> = g.all_prerequisites(id).iter().map(|n| n.id.clone()).collect();
        ids.sort();
        ids
    };
    assert_eq!(closure(&graph, "chain_rule"), closure(&rebuilt, "chain_rule"));
}

#[test]
fn test_json_roundtrip() {
    let graph = build_graph();
    let json = schema::to_json(&graph).unwrap();
    assert!(!json.contains('\n'), "snapshot JSON must be newline-free");

    let rebuilt = schema::from_json(&json).unwrap();
    assert_eq!(rebuilt.nodes.len(), 3);
    assert_eq!(edge_multiset(&rebuilt.to_snapshot()), edge_multiset(&graph.to_snapshot()));
}

#[test]
fn test_version_mismatch_rejected() {
    let graph = build_graph();
    let mut snapshot = graph.to_snapshot();
    snapshot.version = "0.0.1".to_string();
    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(schema::from_json(&json).is_err());
}

#[test]
fn test_snapshot_keeps_edges_from_unknown_sources() {
    // Edges can reference IDs that were never inserted as nodes; the
    // snapshot still carries them.
    let mut graph = ConceptGraph::new();
    graph.insert_node(make_node("known", NodeKind::Concept));
    graph.insert_edge(edge("ghost", "known", EdgeKind::Requires));

    let snapshot = graph.to_snapshot();
    assert_eq!(snapshot.edges.len(), 1);
    assert_eq!(snapshot.edges[0].from, "ghost");
}
