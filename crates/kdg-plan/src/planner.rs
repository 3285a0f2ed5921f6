//! Study planning: exam- and curriculum-scoped paths, confidence-biased
//! ordering, critical-path depth, daily load, and review scheduling.
//!
//! Pure composition over GraphCore traversal, overlay selections, and the
//! diagnostics engine. Holds no state of its own.

use crate::diagnostics::{DiagnosticsEngine, StudyPath};
use kdg_core::graph::{ConceptGraph, EdgeKind};
use kdg_overlay::curriculum::{CurriculumOverlay, EducationSystem};
use kdg_overlay::exam::ExamOverlay;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

/// Per-target prerequisite depth: the number of breadth-first expansion
/// waves needed to exhaust the direct-prerequisite chain. A breadth
/// metric, not true DAG longest-path depth.
#[derive(Debug, Clone, Serialize)]
pub struct CriticalPathEntry {
    pub concept_id: String,
    pub depth: usize,
}

/// Daily study load for a path.
#[derive(Debug, Clone, Serialize)]
pub struct DailyLoad {
    pub total_hours: f64,
    pub days_remaining: u32,
    pub daily_hours: f64,
    pub feasible: bool,
}

/// One day's worth of concepts in a review schedule.
#[derive(Debug, Clone, Serialize)]
pub struct DaySlot {
    /// 1-based day index counting from today.
    pub day: u32,
    pub concept_ids: Vec<String>,
}

/// Plan a study path for an exam: the profile's selection (required plus
/// optionally optional concepts) minus what the user already knows, ordered
/// and time-estimated by the diagnostics engine. Unknown exam IDs produce
/// an empty path.
pub fn plan_for_exam(
    graph: &ConceptGraph,
    exams: &ExamOverlay,
    exam_id: &str,
    diagnostics: &DiagnosticsEngine,
    user_id: &str,
    include_optional: bool,
) -> StudyPath {
    let selection = exams.selection(graph, exam_id, include_optional);
    plan_for_targets(graph, selection, diagnostics, user_id)
}

/// Plan a study path for a curriculum (system, year level) pair.
pub fn plan_for_curriculum(
    graph: &ConceptGraph,
    curricula: &CurriculumOverlay,
    system: EducationSystem,
    year_level: u8,
    diagnostics: &DiagnosticsEngine,
    user_id: &str,
    include_optional: bool,
) -> StudyPath {
    let selection = curricula.selection(graph, system, year_level, include_optional);
    plan_for_targets(graph, selection, diagnostics, user_id)
}

fn plan_for_targets(
    graph: &ConceptGraph,
    selection: HashSet<String>,
    diagnostics: &DiagnosticsEngine,
    user_id: &str,
) -> StudyPath {
    let mut targets: Vec<String> = selection
        .into_iter()
        .filter(|id| !diagnostics.is_known(user_id, id))
        .collect();
    targets.sort();
    diagnostics.generate_study_path(user_id, graph, &targets)
}

/// Re-sort a topological order so weaker-confidence concepts come earlier,
/// without breaking topological validity. Only adjacent swaps are taken,
/// and only when no Requires edge runs between the pair; in a topological
/// order any transitive dependency between adjacent elements must be a
/// direct edge, so the check is sufficient.
pub fn optimize_order(
    graph: &ConceptGraph,
    order: &[String],
    diagnostics: &DiagnosticsEngine,
    user_id: &str,
) -> Vec<String> {
    let mut result: Vec<String> = order.to_vec();
    if result.len() < 2 {
        return result;
    }

    loop {
        let mut swapped = false;
        for i in 0..result.len() - 1 {
            let (a, b) = (&result[i], &result[i + 1]);
            let bias = diagnostics.confidence(user_id, a) > diagnostics.confidence(user_id, b);
            if bias && !has_requires_edge(graph, a, b) {
                result.swap(i, i + 1);
                swapped = true;
            }
        }
        if !swapped {
            break;
        }
    }
    result
}

fn has_requires_edge(graph: &ConceptGraph, from: &str, to: &str) -> bool {
    graph
        .forward
        .get(from)
        .into_iter()
        .flatten()
        .any(|e| e.kind == EdgeKind::Requires && e.to == to)
}

/// Prerequisite depth per target, deepest first. Depth counts BFS waves
/// over direct prerequisites until the chain is exhausted.
pub fn critical_path(graph: &ConceptGraph, targets: &[String]) -> Vec<CriticalPathEntry> {
    let mut entries: Vec<CriticalPathEntry> = targets
        .iter()
        .map(|id| CriticalPathEntry {
            concept_id: id.clone(),
            depth: prerequisite_depth(graph, id),
        })
        .collect();
    entries.sort_by(|a, b| b.depth.cmp(&a.depth).then_with(|| a.concept_id.cmp(&b.concept_id)));
    entries
}

fn prerequisite_depth(graph: &ConceptGraph, id: &str) -> usize {
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(id.to_string());
    let mut frontier: VecDeque<String> = VecDeque::new();
    frontier.push_back(id.to_string());

    let mut depth = 0;
    while !frontier.is_empty() {
        let mut next: VecDeque<String> = VecDeque::new();
        for current in frontier.drain(..) {
            for prereq in graph.prerequisites(&current) {
                if visited.insert(prereq.id.clone()) {
                    next.push_back(prereq.id.clone());
                }
            }
        }
        if next.is_empty() {
            break;
        }
        depth += 1;
        frontier = next;
    }
    depth
}

/// Spread total hours over the remaining days and flag infeasibility
/// against the caller's daily ceiling. Zero days remaining is always
/// infeasible when any hours remain.
pub fn daily_load(total_hours: f64, days_remaining: u32, max_daily_hours: f64) -> DailyLoad {
    let daily_hours = if days_remaining == 0 {
        total_hours
    } else {
        total_hours / f64::from(days_remaining)
    };
    let feasible = if days_remaining == 0 {
        total_hours <= 0.0
    } else {
        daily_hours <= max_daily_hours
    };
    DailyLoad {
        total_hours,
        days_remaining,
        daily_hours,
        feasible,
    }
}

/// Evenly chunk an ordered concept list across the remaining days
/// (ceiling division for the chunk size). Days that would receive zero
/// concepts are skipped.
pub fn review_schedule(ordered: &[String], days_remaining: u32) -> Vec<DaySlot> {
    if ordered.is_empty() || days_remaining == 0 {
        return Vec::new();
    }
    let days = days_remaining as usize;
    let chunk = ordered.len().div_ceil(days);

    ordered
        .chunks(chunk)
        .enumerate()
        .map(|(i, ids)| DaySlot {
            day: (i + 1) as u32,
            concept_ids: ids.to_vec(),
        })
        .collect()
}
