//! Offline graph validation: the one place that raises structured findings
//! instead of the core's silent-miss policy.
//!
//! Errors mark the graph invalid for study-path generation; warnings do
//! not block usage.

use kdg_core::graph::{ConceptGraph, GraphSnapshot};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "issue")]
pub enum ValidationIssue {
    /// A Requires cycle; the graph cannot be topologically ordered in full.
    CycleDetected { cycle: Vec<String> },
    /// A node's requires list references an ID with no node.
    MissingPrerequisite { concept_id: String, missing_id: String },
    /// An edge endpoint references an ID with no node.
    DanglingEdge { from: String, to: String },
    /// Complexity outside [0, 10].
    ComplexityOutOfRange { concept_id: String, complexity: f64 },
    EmptyTitle { concept_id: String },
    /// A node ID appearing more than once in a snapshot's node list.
    DuplicateNodeId { concept_id: String, occurrences: usize },
    EmptyDescription { concept_id: String },
    NoDomains { concept_id: String },
    /// No edges at all, in either direction, of any kind.
    OrphanNode { concept_id: String },
}

/// Structured validation result.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    /// True when no errors were found; warnings alone never block usage.
    pub valid: bool,
}

/// Validate a live graph. Duplicate IDs cannot exist in the node map;
/// snapshot-level duplicates are caught by [`validate_snapshot`].
pub fn validate_graph(graph: &ConceptGraph) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for cycle in graph.detect_cycles() {
        errors.push(ValidationIssue::CycleDetected { cycle });
    }

    for (id, node) in &graph.nodes {
        for required in &node.requires {
            if !graph.nodes.contains_key(required) {
                errors.push(ValidationIssue::MissingPrerequisite {
                    concept_id: id.clone(),
                    missing_id: required.clone(),
                });
            }
        }
        if !(0.0..=10.0).contains(&node.complexity) {
            errors.push(ValidationIssue::ComplexityOutOfRange {
                concept_id: id.clone(),
                complexity: node.complexity,
            });
        }
        if node.title.trim().is_empty() {
            errors.push(ValidationIssue::EmptyTitle {
                concept_id: id.clone(),
            });
        }
        if node.description.trim().is_empty() {
            warnings.push(ValidationIssue::EmptyDescription {
                concept_id: id.clone(),
            });
        }
        if node.domains.is_empty() {
            warnings.push(ValidationIssue::NoDomains {
                concept_id: id.clone(),
            });
        }
        let no_outgoing = graph.forward.get(id.as_str()).is_none_or(Vec::is_empty);
        let no_incoming = graph.reverse.get(id.as_str()).is_none_or(Vec::is_empty);
        if no_outgoing && no_incoming {
            warnings.push(ValidationIssue::OrphanNode {
                concept_id: id.clone(),
            });
        }
    }

    let mut dangling: HashSet<(String, String)> = HashSet::new();
    for edge in graph.forward.values().flatten() {
        if !graph.nodes.contains_key(&edge.from) || !graph.nodes.contains_key(&edge.to) {
            dangling.insert((edge.from.clone(), edge.to.clone()));
        }
    }
    let mut dangling: Vec<(String, String)> = dangling.into_iter().collect();
    dangling.sort();
    for (from, to) in dangling {
        errors.push(ValidationIssue::DanglingEdge { from, to });
    }

    let valid = errors.is_empty();
    ValidationReport {
        errors,
        warnings,
        valid,
    }
}

/// Validate a snapshot before loading: duplicate-ID detection on the flat
/// node list, then the full graph checks on the rebuilt graph.
pub fn validate_snapshot(snapshot: &GraphSnapshot) -> ValidationReport {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for node in &snapshot.nodes {
        *counts.entry(node.id.as_str()).or_insert(0) += 1;
    }
    let mut duplicate_ids: Vec<(&str, usize)> =
        counts.into_iter().filter(|(_, n)| *n > 1).collect();
    duplicate_ids.sort();
    let duplicates: Vec<ValidationIssue> = duplicate_ids
        .into_iter()
        .map(|(id, occurrences)| ValidationIssue::DuplicateNodeId {
            concept_id: id.to_string(),
            occurrences,
        })
        .collect();

    let mut report = validate_graph(&ConceptGraph::from_snapshot(snapshot.clone()));
    report.errors.extend(duplicates);
    report.valid = report.errors.is_empty();
    report
}
