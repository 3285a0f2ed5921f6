//! Exam overlay: per-exam concept selections with required mastery depth,
//! profile comparison, and coverage scoring.

use crate::selection::expand_selection;
use kdg_core::graph::ConceptGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Required mastery tier for a concept within a specific exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthLevel {
    Intro,
    Core,
    Advanced,
    Olympiad,
}

/// Concept requirements for one exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamProfile {
    pub exam_id: String,
    #[serde(default)]
    pub required: BTreeSet<String>,
    #[serde(default)]
    pub optional: BTreeSet<String>,
    #[serde(default)]
    pub excluded: BTreeSet<String>,
    /// Required depth per concept; concepts without an entry default to
    /// whatever the caller treats as baseline.
    #[serde(default)]
    pub depth: BTreeMap<String, DepthLevel>,
    pub time_limit_minutes: u32,
}

/// Result of comparing two exam profiles.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileComparison {
    pub shared: Vec<String>,
    pub only_in_left: Vec<String>,
    pub only_in_right: Vec<String>,
    /// Shared concepts whose required depth differs between the profiles.
    pub depth_mismatches: Vec<DepthMismatch>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepthMismatch {
    pub concept_id: String,
    pub left: Option<DepthLevel>,
    pub right: Option<DepthLevel>,
}

/// Coverage of an exam's concept sets by a known-concept set. Percentages
/// are rounded to one decimal; an empty set counts as fully covered.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub exam_id: String,
    pub required_total: usize,
    pub required_known: usize,
    pub required_pct: f64,
    pub optional_total: usize,
    pub optional_known: usize,
    pub optional_pct: f64,
}

/// In-memory exam profile store keyed by exam ID.
#[derive(Debug, Clone, Default)]
pub struct ExamOverlay {
    profiles: HashMap<String, ExamProfile>,
}

impl ExamOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the store wholesale with the given profiles.
    pub fn load_profiles(&mut self, profiles: Vec<ExamProfile>) {
        self.profiles = profiles
            .into_iter()
            .map(|p| (p.exam_id.clone(), p))
            .collect();
        tracing::debug!(profiles = self.profiles.len(), "loaded exam profiles");
    }

    pub fn profile(&self, exam_id: &str) -> Option<&ExamProfile> {
        self.profiles.get(exam_id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn is_required(&self, exam_id: &str, concept_id: &str) -> bool {
        self.profile(exam_id)
            .is_some_and(|p| p.required.contains(concept_id))
    }

    pub fn is_optional(&self, exam_id: &str, concept_id: &str) -> bool {
        self.profile(exam_id)
            .is_some_and(|p| p.optional.contains(concept_id))
    }

    pub fn is_excluded(&self, exam_id: &str, concept_id: &str) -> bool {
        self.profile(exam_id)
            .is_some_and(|p| p.excluded.contains(concept_id))
    }

    /// Required depth for a concept in an exam. Unknown exam or concept
    /// without a depth entry both yield None.
    pub fn required_depth(&self, exam_id: &str, concept_id: &str) -> Option<DepthLevel> {
        self.profile(exam_id)
            .and_then(|p| p.depth.get(concept_id).copied())
    }

    /// Resolve the concept-ID selection for an exam: required (optionally
    /// plus optional) concepts, expanded with transitive prerequisites,
    /// minus the excluded set. Unknown exam IDs yield an empty set.
    pub fn selection(
        &self,
        graph: &ConceptGraph,
        exam_id: &str,
        include_optional: bool,
    ) -> HashSet<String> {
        let Some(profile) = self.profile(exam_id) else {
            return HashSet::new();
        };
        let mut selected: Vec<String> = profile.required.iter().cloned().collect();
        if include_optional {
            selected.extend(profile.optional.iter().cloned());
        }
        expand_selection(graph, selected, &profile.excluded)
    }

    /// The induced subgraph for an exam selection.
    pub fn exam_subgraph(
        &self,
        graph: &ConceptGraph,
        exam_id: &str,
        include_optional: bool,
    ) -> ConceptGraph {
        let ids = self.selection(graph, exam_id, include_optional);
        graph.subgraph(&ids)
    }

    /// Compare two profiles over their required sets. None when either exam
    /// is unknown.
    pub fn compare(&self, left_id: &str, right_id: &str) -> Option<ProfileComparison> {
        let left = self.profile(left_id)?;
        let right = self.profile(right_id)?;

        let shared: Vec<String> = left.required.intersection(&right.required).cloned().collect();
        let only_in_left: Vec<String> =
            left.required.difference(&right.required).cloned().collect();
        let only_in_right: Vec<String> =
            right.required.difference(&left.required).cloned().collect();

        let depth_mismatches: Vec<DepthMismatch> = shared
            .iter()
            .filter_map(|id| {
                let l = left.depth.get(id).copied();
                let r = right.depth.get(id).copied();
                (l != r).then(|| DepthMismatch {
                    concept_id: id.clone(),
                    left: l,
                    right: r,
                })
            })
            .collect();

        Some(ProfileComparison {
            shared,
            only_in_left,
            only_in_right,
            depth_mismatches,
        })
    }

    /// Estimate how much of an exam's required and optional sets a known
    /// concept set covers. None when the exam is unknown.
    pub fn coverage(&self, exam_id: &str, known: &HashSet<String>) -> Option<CoverageReport> {
        let profile = self.profile(exam_id)?;

        let required_known = profile.required.iter().filter(|id| known.contains(*id)).count();
        let optional_known = profile.optional.iter().filter(|id| known.contains(*id)).count();

        Some(CoverageReport {
            exam_id: exam_id.to_string(),
            required_total: profile.required.len(),
            required_known,
            required_pct: percentage(required_known, profile.required.len()),
            optional_total: profile.optional.len(),
            optional_known,
            optional_pct: percentage(optional_known, profile.optional.len()),
        })
    }
}

/// Percentage rounded to one decimal; empty denominators count as covered.
fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (part as f64 / total as f64 * 1000.0).round() / 10.0
}
