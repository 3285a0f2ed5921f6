//! Read/write graph snapshot files from disk.

use crate::config::StorageConfig;
use crate::graph::{ConceptGraph, GraphSnapshot};
use crate::schema;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const KDG_DIR: &str = ".kdg";
const GRAPH_FILE: &str = "graph.json";

/// Path to the KDG data directory for a given root.
pub fn data_dir(root: &Path) -> PathBuf {
    root.join(KDG_DIR)
}

/// Data directory honoring a configured directory name.
pub fn data_dir_with_config(root: &Path, config: &StorageConfig) -> PathBuf {
    root.join(&config.data_dir)
}

/// Path to the graph snapshot file for a given root.
pub fn graph_file(root: &Path) -> PathBuf {
    data_dir(root).join(GRAPH_FILE)
}

/// Check whether a graph snapshot exists under the given root.
pub fn graph_exists(root: &Path) -> bool {
    graph_file(root).exists()
}

pub fn graph_exists_with_config(root: &Path, config: &StorageConfig) -> bool {
    data_dir_with_config(root, config).join(GRAPH_FILE).exists()
}

/// Load a graph from disk.
pub fn load(root: &Path) -> Result<ConceptGraph> {
    load_from(&graph_file(root))
}

pub fn load_with_config(root: &Path, config: &StorageConfig) -> Result<ConceptGraph> {
    load_from(&data_dir_with_config(root, config).join(GRAPH_FILE))
}

/// Load the raw snapshot without rebuilding the graph, keeping the flat
/// node list intact for duplicate-ID detection.
pub fn load_snapshot_with_config(root: &Path, config: &StorageConfig) -> Result<GraphSnapshot> {
    let path = data_dir_with_config(root, config).join(GRAPH_FILE);
    let json = fs::read_to_string(&path)
        .with_context(|| format!("failed to read graph from {}", path.display()))?;
    schema::snapshot_from_json(&json)
}

fn load_from(path: &Path) -> Result<ConceptGraph> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph from {}", path.display()))?;
    let graph = schema::from_json(&json)?;
    tracing::debug!(path = %path.display(), nodes = graph.nodes.len(), "loaded graph snapshot");
    Ok(graph)
}

/// Save a graph to disk, creating the .kdg directory if needed.
pub fn save(root: &Path, graph: &ConceptGraph) -> Result<()> {
    save_to(&data_dir(root), graph)
}

pub fn save_with_config(root: &Path, graph: &ConceptGraph, config: &StorageConfig) -> Result<()> {
    save_to(&data_dir_with_config(root, config), graph)
}

fn save_to(dir: &Path, graph: &ConceptGraph) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create data directory {}", dir.display()))?;

    let path = dir.join(GRAPH_FILE);
    let json = schema::to_json(graph)?;
    fs::write(&path, json)
        .with_context(|| format!("failed to write graph to {}", path.display()))?;
    tracing::debug!(path = %path.display(), nodes = graph.nodes.len(), "wrote graph snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ConceptNode, NodeKind};
    use chrono::Utc;

    fn make_node(id: &str) -> ConceptNode {
        let now = Utc::now();
        ConceptNode {
            id: id.to_string(),
            kind: NodeKind::Concept,
            title: id.to_uppercase(),
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
    fn test_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let mut graph = ConceptGraph::new();
        graph.insert_node(make_node("limits"));
        graph.refresh_metadata();

        save(tmp.path(), &graph).unwrap();
        assert!(graph_exists(tmp.path()));

        let loaded = load(tmp.path()).unwrap();
        assert_eq!(loaded.nodes.len(), 1);
        assert!(loaded.nodes.contains_key("limits"));
    }

    #[test]
    fn test_custom_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_dir: "graphdata".to_string(),
        };
        let mut graph = ConceptGraph::new();
        graph.insert_node(make_node("limits"));

        save_with_config(tmp.path(), &graph, &config).unwrap();
        assert!(graph_exists_with_config(tmp.path(), &config));
        assert!(!graph_exists(tmp.path()));

        let loaded = load_with_config(tmp.path(), &config).unwrap();
        assert!(loaded.nodes.contains_key("limits"));
    }

    #[test]
    fn test_load_missing() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!graph_exists(tmp.path()));
        assert!(load(tmp.path()).is_err());
    }

    #[test]
    fn test_snapshot_is_newline_free() {
        let tmp = tempfile::tempdir().unwrap();
        let mut graph = ConceptGraph::new();
        graph.insert_node(make_node("limits"));
        save(tmp.path(), &graph).unwrap();

        let raw = std::fs::read_to_string(graph_file(tmp.path())).unwrap();
        assert!(!raw.contains('\n'));
    }
}
