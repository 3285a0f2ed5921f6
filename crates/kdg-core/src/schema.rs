//! Snapshot JSON serialization and version handling.

use crate::graph::{ConceptGraph, GraphSnapshot};
use anyhow::{Context, Result};

pub const CURRENT_VERSION: &str = "1.2.0";

/// Validate a snapshot's schema version.
pub fn validate_version(snapshot: &GraphSnapshot) -> Result<()> {
    if snapshot.version != CURRENT_VERSION {
        anyhow::bail!(
            "snapshot version mismatch: expected {}, found {}",
            CURRENT_VERSION,
            snapshot.version
        );
    }
    Ok(())
}

/// Serialize a graph to its compact (newline-free) snapshot JSON.
pub fn to_json(graph: &ConceptGraph) -> Result<String> {
    serde_json::to_string(&graph.to_snapshot()).context("failed to serialize graph snapshot")
}

/// Deserialize snapshot JSON without rebuilding the graph. Callers that
/// need to inspect the flat node list (duplicate-ID detection, for one)
/// go through this before [`ConceptGraph::from_snapshot`] collapses it
/// into the keyed map.
pub fn snapshot_from_json(json: &str) -> Result<GraphSnapshot> {
    let snapshot: GraphSnapshot =
        serde_json::from_str(json).context("failed to deserialize graph snapshot")?;
    validate_version(&snapshot)?;
    Ok(snapshot)
}

/// Deserialize a graph from snapshot JSON, rebuilding both adjacency indexes.
pub fn from_json(json: &str) -> Result<ConceptGraph> {
    Ok(ConceptGraph::from_snapshot(snapshot_from_json(json)?))
}
