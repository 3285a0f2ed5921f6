//! Graph data model for the knowledge dependency graph (KDG).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// The complete concept graph: nodes plus forward/reverse adjacency indexes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptGraph {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub metadata: GraphMetadata,
    /// All concept nodes, keyed by ID.
    pub nodes: BTreeMap<String, ConceptNode>,
    /// Outgoing edges per node ID. Owns the authoritative edge list:
    /// snapshots flatten these lists, the reverse index is derived.
    #[serde(skip)]
    pub forward: HashMap<String, Vec<DependencyEdge>>,
    /// Incoming edges per node ID. Rebuilt from `forward` on load.
    #[serde(skip)]
    pub reverse: HashMap<String, Vec<DependencyEdge>>,
}

/// Aggregate statistics for the graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub requires_edges: usize,
    /// Node counts per kind, keyed by the snake_case kind name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nodes_by_kind: BTreeMap<String, usize>,
}

/// A single mathematical concept: theorem, formula, definition, etc.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptNode {
    pub id: String,
    pub kind: NodeKind,
    pub title: String,
    pub description: String,
    /// Difficulty estimate in [0, 10]. Bounds are enforced at ingestion and
    /// by the validation pass, not here.
    pub complexity: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Related concept IDs by relationship role.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generalizes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub special_cases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub used_in: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exam_appearances: Vec<ExamAppearance>,
    // Authored ingest records may omit timestamps.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// A recorded appearance of a concept in a past exam paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamAppearance {
    pub exam_id: String,
    pub year: i32,
}

/// A directed, typed edge between two concepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

fn default_weight() -> f64 {
    1.0
}

/// The kind of relationship between two concepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// `from` must be understood before `to`.
    Requires,
    /// `from` is a generalization of `to`.
    Generalizes,
    /// `from` is a special case of `to`.
    SpecialCaseOf,
    /// `from` is used in the derivation or statement of `to`.
    UsedIn,
    /// `from` and `to` commonly appear together in exam questions.
    AppearsWith,
}

/// The kind of concept node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Concept,
    Formula,
    Theorem,
    Definition,
    Identity,
    Proof,
    Symbol,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Formula => "formula",
            Self::Theorem => "theorem",
            Self::Definition => "definition",
            Self::Identity => "identity",
            Self::Proof => "proof",
            Self::Symbol => "symbol",
        }
    }
}

impl ConceptGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            version: crate::schema::CURRENT_VERSION.to_string(),
            created_at: now,
            updated_at: now,
            metadata: GraphMetadata::default(),
            nodes: BTreeMap::new(),
            forward: HashMap::new(),
            reverse: HashMap::new(),
        }
    }

    /// Insert or replace a node by ID, ensuring adjacency entries exist on
    /// both indexes so later edge appends never miss a key.
    pub fn insert_node(&mut self, node: ConceptNode) {
        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        self.forward.entry(id.clone()).or_default();
        self.reverse.entry(id).or_default();
    }

    /// Append an edge to the forward list of `from` and the reverse list of
    /// `to`. O(1) and never fails; endpoints need not exist yet.
    ///
    /// No de-duplication: inserting the same edge twice doubles its
    /// contribution to every traversal and snapshot.
    pub fn insert_edge(&mut self, edge: DependencyEdge) {
        self.reverse
            .entry(edge.to.clone())
            .or_default()
            .push(edge.clone());
        self.forward.entry(edge.from.clone()).or_default().push(edge);
    }

    pub fn node(&self, id: &str) -> Option<&ConceptNode> {
        self.nodes.get(id)
    }

    /// Direct prerequisites of `id`: the source node of every incoming
    /// Requires edge. Unknown IDs yield an empty list.
    pub fn prerequisites(&self, id: &str) -> Vec<&ConceptNode> {
        self.reverse
            .get(id)
            .into_iter()
            .flatten()
            .filter(|e| e.kind == EdgeKind::Requires)
            .filter_map(|e| self.nodes.get(&e.from))
            .collect()
    }

    /// Transitive prerequisite closure of `id`, breadth-first with a
    /// visited set. Terminates under cycles; the queried node itself is
    /// excluded even when reachable from itself.
    pub fn all_prerequisites(&self, id: &str) -> Vec<&ConceptNode> {
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(id);
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(id);
        let mut result = Vec::new();

        while let Some(current) = queue.pop_front() {
            for prereq in self.prerequisites(current) {
                if visited.insert(prereq.id.as_str()) {
                    result.push(prereq);
                    queue.push_back(prereq.id.as_str());
                }
            }
        }
        result
    }

    /// Direct dependents of `id`: the target node of every outgoing
    /// Requires edge (what requires this concept).
    pub fn dependents(&self, id: &str) -> Vec<&ConceptNode> {
        self.forward
            .get(id)
            .into_iter()
            .flatten()
            .filter(|e| e.kind == EdgeKind::Requires)
            .filter_map(|e| self.nodes.get(&e.to))
            .collect()
    }

    /// Kahn's algorithm restricted to `subset`. In-degree and adjacency are
    /// computed only from Requires edges whose both endpoints lie in the
    /// subset; prerequisites outside it are ignored, so callers wanting a
    /// full ordering must pre-expand the closure themselves. Ties are broken
    /// by subset iteration order. Members of a cycle inside the induced
    /// subgraph never reach in-degree zero and are omitted, so the output
    /// can be shorter than the input.
    pub fn topological_sort(&self, subset: &[String]) -> Vec<String> {
        let members: HashSet<&str> = subset.iter().map(String::as_str).collect();

        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for id in subset {
            in_degree.entry(id.as_str()).or_insert(0);
            adjacency.entry(id.as_str()).or_default();
        }

        for id in subset {
            for edge in self.forward.get(id.as_str()).into_iter().flatten() {
                if edge.kind == EdgeKind::Requires && members.contains(edge.to.as_str()) {
                    adjacency
                        .entry(id.as_str())
                        .or_default()
                        .push(edge.to.as_str());
                    *in_degree.entry(edge.to.as_str()).or_insert(0) += 1;
                }
            }
        }

        let mut queue: VecDeque<&str> = subset
            .iter()
            .map(String::as_str)
            .filter(|id| in_degree.get(id) == Some(&0))
            .collect();

        let mut order = Vec::with_capacity(subset.len());
        let mut seen: HashSet<&str> = queue.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            order.push(id.to_string());
            for &next in adjacency.get(id).into_iter().flatten() {
                if let Some(deg) = in_degree.get_mut(next) {
                    *deg = deg.saturating_sub(1);
                    if *deg == 0 && seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }
        order
    }

    /// Detect cycles along Requires edges.
    ///
    /// Iterative depth-first traversal with an explicit frame stack (no
    /// recursion, so deep graphs cannot overflow the call stack). When an
    /// edge reaches a node already on the current path, the path slice from
    /// that node's first occurrence to the current node is recorded. Each
    /// cycle is canonicalized by rotating its lexicographically smallest
    /// member to the front, and duplicates found from different start nodes
    /// are dropped.
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = Vec::new();
        let mut seen_cycles: HashSet<Vec<String>> = HashSet::new();
        let mut visited: HashSet<&str> = HashSet::new();

        for start in self.nodes.keys() {
            if visited.contains(start.as_str()) {
                continue;
            }

            // Frame: (node, index of the next outgoing Requires edge to try).
            let mut frames: Vec<(&str, usize)> = vec![(start.as_str(), 0)];
            let mut path: Vec<&str> = vec![start.as_str()];
            let mut on_path: HashSet<&str> = HashSet::new();
            on_path.insert(start.as_str());
            visited.insert(start.as_str());

            while let Some(frame) = frames.last_mut() {
                let (current, next_index) = *frame;
                let next = self
                    .forward
                    .get(current)
                    .into_iter()
                    .flatten()
                    .filter(|e| e.kind == EdgeKind::Requires)
                    .nth(next_index);

                match next {
                    Some(edge) => {
                        frame.1 += 1;
                        let target = edge.to.as_str();
                        if on_path.contains(target) {
                            let pos = path.iter().position(|&n| n == target).unwrap_or(0);
                            let cycle: Vec<String> =
                                path[pos..].iter().map(|s| (*s).to_string()).collect();
                            let canonical = canonicalize_cycle(&cycle);
                            if seen_cycles.insert(canonical.clone()) {
                                cycles.push(canonical);
                            }
                        } else if !visited.contains(target) {
                            visited.insert(target);
                            on_path.insert(target);
                            path.push(target);
                            frames.push((target, 0));
                        }
                    }
                    None => {
                        frames.pop();
                        if let Some(done) = path.pop() {
                            on_path.remove(done);
                        }
                    }
                }
            }
        }
        cycles
    }

    /// Induced subgraph: nodes whose ID is in `ids`, plus only the edges
    /// with both endpoints inside the set.
    pub fn subgraph(&self, ids: &HashSet<String>) -> ConceptGraph {
        let mut sub = ConceptGraph::new();
        for id in ids {
            if let Some(node) = self.nodes.get(id) {
                sub.insert_node(node.clone());
            }
        }
        for id in ids {
            for edge in self.forward.get(id.as_str()).into_iter().flatten() {
                if ids.contains(&edge.to) {
                    sub.insert_edge(edge.clone());
                }
            }
        }
        sub.refresh_metadata();
        sub
    }

    /// Flatten the graph into its snapshot form: full node list plus the
    /// union of every node's outgoing edge list.
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let mut edges: Vec<DependencyEdge> = Vec::new();
        // Deterministic edge order: iterate sources in node-key order.
        for id in self.nodes.keys() {
            if let Some(out) = self.forward.get(id.as_str()) {
                edges.extend(out.iter().cloned());
            }
        }
        // Edges whose source was never inserted as a node still belong to
        // the snapshot.
        let mut extra: Vec<&String> = self
            .forward
            .keys()
            .filter(|k| !self.nodes.contains_key(*k))
            .collect();
        extra.sort();
        for id in extra {
            edges.extend(self.forward[id].iter().cloned());
        }
        GraphSnapshot {
            version: self.version.clone(),
            nodes: self.nodes.values().cloned().collect(),
            edges,
        }
    }

    /// Rebuild a graph from a snapshot. Round-tripping reproduces the same
    /// node set and edge multiset; adjacency index order may differ.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let mut graph = ConceptGraph::new();
        graph.version = snapshot.version;
        for node in snapshot.nodes {
            graph.insert_node(node);
        }
        for edge in snapshot.edges {
            graph.insert_edge(edge);
        }
        graph.refresh_metadata();
        graph
    }

    /// Recompute aggregate metadata from the current state.
    pub fn refresh_metadata(&mut self) {
        self.metadata.total_nodes = self.nodes.len();
        self.metadata.total_edges = self.forward.values().map(Vec::len).sum();
        self.metadata.requires_edges = self
            .forward
            .values()
            .flatten()
            .filter(|e| e.kind == EdgeKind::Requires)
            .count();
        let mut by_kind: BTreeMap<String, usize> = BTreeMap::new();
        for node in self.nodes.values() {
            *by_kind.entry(node.kind.as_str().to_string()).or_insert(0) += 1;
        }
        self.metadata.nodes_by_kind = by_kind;
        self.updated_at = Utc::now();
    }
}

impl Default for ConceptGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Rotate a cycle so its lexicographically smallest member comes first.
fn canonicalize_cycle(cycle: &[String]) -> Vec<String> {
    if cycle.is_empty() {
        return Vec::new();
    }
    let min_pos = cycle
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map_or(0, |(i, _)| i);
    let mut rotated = Vec::with_capacity(cycle.len());
    rotated.extend_from_slice(&cycle[min_pos..]);
    rotated.extend_from_slice(&cycle[..min_pos]);
    rotated
}

/// Wire format for graph export/import: `{ nodes, edges }` as compact JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default = "snapshot_version")]
    pub version: String,
    pub nodes: Vec<ConceptNode>,
    pub edges: Vec<DependencyEdge>,
}

fn snapshot_version() -> String {
    crate::schema::CURRENT_VERSION.to_string()
}
