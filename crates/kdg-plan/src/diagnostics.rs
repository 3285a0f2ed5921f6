//! Per-user confidence state and gap analysis.
//!
//! Confidence lives in [0, 1] and starts undefined (read as 0, "not
//! started"). There is no separate mastered state: confidence at or above
//! the engine's threshold is the operational definition of "known".

use chrono::{DateTime, Utc};
use kdg_core::config::PlannerConfig;
use kdg_core::graph::ConceptGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Per-(user, concept) progress record. Created lazily on first update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptProgress {
    pub concept_id: String,
    pub confidence: f64,
    pub last_reviewed: DateTime<Utc>,
    pub review_count: u32,
    pub time_spent_minutes: f64,
}

/// One progress mutation. Absent fields leave the stored value unchanged
/// (except `reviewed_at`, which defaults to now).
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    pub confidence: Option<f64>,
    pub time_spent_minutes: Option<f64>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Gap classification for a target concept set and its prerequisite
/// closure. The four classes partition the closure exactly: a concept is
/// missing, weak, a strong prerequisite, or a known target (which appears
/// in none of the lists).
#[derive(Debug, Clone, Serialize)]
pub struct GapReport {
    pub targets: Vec<String>,
    /// Confidence 0: never started.
    pub missing: Vec<String>,
    /// Confidence in (0, threshold).
    pub weak: Vec<WeakConcept>,
    /// Known supporting concepts: at or above threshold and not themselves
    /// targets.
    pub strong_prereqs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeakConcept {
    pub concept_id: String,
    pub confidence: f64,
}

/// One ordered step in a study path.
#[derive(Debug, Clone, Serialize)]
pub struct StudyStep {
    pub concept_id: String,
    pub title: String,
    pub complexity: f64,
    pub confidence: f64,
    pub estimated_hours: f64,
}

/// A computed study sequence for one (user, target set) pair at one point
/// in time. Derived, not persisted authoritatively.
#[derive(Debug, Clone, Serialize)]
pub struct StudyPath {
    pub user_id: String,
    pub generated_at: DateTime<Utc>,
    pub sequence: Vec<StudyStep>,
    pub gaps: GapReport,
    /// Confidence snapshot over the sequence at generation time.
    pub confidence: BTreeMap<String, f64>,
    /// Sum of per-step estimates, rounded up to whole hours.
    pub total_hours: f64,
}

/// A next-concept recommendation: unknown, with all direct prerequisites
/// known, scored by how far confidence is from mastery.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub concept_id: String,
    pub title: String,
    pub confidence: f64,
    pub score: f64,
}

/// A concept due for review.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewItem {
    pub concept_id: String,
    pub confidence: f64,
    pub days_since_review: i64,
}

/// Owns all per-user progress state, keyed first by user then by concept.
#[derive(Debug, Clone)]
pub struct DiagnosticsEngine {
    progress: HashMap<String, HashMap<String, ConceptProgress>>,
    pub mastery_threshold: f64,
    pub base_hours: f64,
    pub review_interval_days: i64,
}

impl DiagnosticsEngine {
    pub fn new() -> Self {
        Self::from_config(&PlannerConfig::default())
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            progress: HashMap::new(),
            mastery_threshold: config.mastery_threshold,
            base_hours: config.base_hours,
            review_interval_days: config.review_interval_days,
        }
    }

    /// Apply one progress update. An explicit confidence wins (clamped to
    /// [0, 1]), otherwise the stored value is unchanged; review count
    /// increments and time spent accumulates rather than overwriting.
    pub fn update_progress(&mut self, user_id: &str, concept_id: &str, update: ProgressUpdate) {
        let now = Utc::now();
        let record = self
            .progress
            .entry(user_id.to_string())
            .or_default()
            .entry(concept_id.to_string())
            .or_insert_with(|| ConceptProgress {
                concept_id: concept_id.to_string(),
                confidence: 0.0,
                last_reviewed: now,
                review_count: 0,
                time_spent_minutes: 0.0,
            });

        if let Some(confidence) = update.confidence {
            // Out-of-range confidence would push hour estimates negative.
            record.confidence = confidence.clamp(0.0, 1.0);
        }
        record.review_count += 1;
        record.time_spent_minutes += update.time_spent_minutes.unwrap_or(0.0);
        record.last_reviewed = update.reviewed_at.unwrap_or(now);
    }

    pub fn record(&self, user_id: &str, concept_id: &str) -> Option<&ConceptProgress> {
        self.progress.get(user_id).and_then(|m| m.get(concept_id))
    }

    /// Confidence for a (user, concept) pair; 0 when never updated.
    pub fn confidence(&self, user_id: &str, concept_id: &str) -> f64 {
        self.record(user_id, concept_id).map_or(0.0, |r| r.confidence)
    }

    pub fn is_known(&self, user_id: &str, concept_id: &str) -> bool {
        self.confidence(user_id, concept_id) >= self.mastery_threshold
    }

    /// All concept IDs the user knows at or above the mastery threshold.
    pub fn known_concepts(&self, user_id: &str) -> HashSet<String> {
        self.progress
            .get(user_id)
            .into_iter()
            .flatten()
            .filter(|(_, r)| r.confidence >= self.mastery_threshold)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Classify the prerequisite closure of `targets` (plus the targets
    /// themselves) by the user's confidence.
    pub fn detect_gaps(&self, user_id: &str, graph: &ConceptGraph, targets: &[String]) -> GapReport {
        let target_set: HashSet<&str> = targets.iter().map(String::as_str).collect();

        let mut scope: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for target in targets {
            for prereq in graph.all_prerequisites(target) {
                if seen.insert(prereq.id.clone()) {
                    scope.push(prereq.id.clone());
                }
            }
            if seen.insert(target.clone()) {
                scope.push(target.clone());
            }
        }
        scope.sort();

        let mut missing = Vec::new();
        let mut weak = Vec::new();
        let mut strong_prereqs = Vec::new();
        for id in &scope {
            let confidence = self.confidence(user_id, id);
            if confidence == 0.0 {
                missing.push(id.clone());
            } else if confidence < self.mastery_threshold {
                weak.push(WeakConcept {
                    concept_id: id.clone(),
                    confidence,
                });
            } else if !target_set.contains(id.as_str()) {
                strong_prereqs.push(id.clone());
            }
            // Known targets land in no list.
        }

        GapReport {
            targets: targets.to_vec(),
            missing,
            weak,
            strong_prereqs,
        }
    }

    /// Generate the ordered, time-estimated study sequence for a target
    /// set: missing ∪ weak concepts in topological order. Confidence
    /// discounts the per-concept estimate but never below 50% of nominal.
    pub fn generate_study_path(
        &self,
        user_id: &str,
        graph: &ConceptGraph,
        targets: &[String],
    ) -> StudyPath {
        let gaps = self.detect_gaps(user_id, graph, targets);

        let mut study_set: Vec<String> = gaps.missing.clone();
        study_set.extend(gaps.weak.iter().map(|w| w.concept_id.clone()));
        study_set.sort();

        let order = graph.topological_sort(&study_set);

        let mut sequence = Vec::with_capacity(order.len());
        let mut confidence_snapshot = BTreeMap::new();
        let mut exact_hours = 0.0_f64;
        for id in &order {
            // IDs absent from the graph carry no complexity or title; they
            // stay visible in the gap report but get no study step.
            let Some(node) = graph.node(id) else {
                continue;
            };
            let confidence = self.confidence(user_id, id);
            let hours = self.estimate_hours(node.complexity, confidence);
            exact_hours += hours;
            confidence_snapshot.insert(id.clone(), confidence);
            sequence.push(StudyStep {
                concept_id: id.clone(),
                title: node.title.clone(),
                complexity: node.complexity,
                confidence,
                estimated_hours: hours,
            });
        }

        let total_hours = exact_hours.ceil();
        tracing::debug!(
            user = user_id,
            steps = sequence.len(),
            total_hours,
            "generated study path"
        );
        StudyPath {
            user_id: user_id.to_string(),
            generated_at: Utc::now(),
            sequence,
            gaps,
            confidence: confidence_snapshot,
            total_hours,
        }
    }

    /// Nominal hours scaled by complexity, discounted by confidence with a
    /// floor at half the nominal time.
    fn estimate_hours(&self, complexity: f64, confidence: f64) -> f64 {
        self.base_hours * (1.0 + complexity / 10.0) * (1.0 - confidence * 0.5)
    }

    /// From the study path, the unknown concepts whose direct prerequisites
    /// are all known, scored by (1 − confidence) × 10, best first.
    pub fn recommend_next(
        &self,
        user_id: &str,
        graph: &ConceptGraph,
        targets: &[String],
        limit: usize,
    ) -> Vec<Recommendation> {
        let path = self.generate_study_path(user_id, graph, targets);

        let mut candidates: Vec<Recommendation> = path
            .sequence
            .iter()
            .filter(|step| !self.is_known(user_id, &step.concept_id))
            .filter(|step| {
                graph
                    .prerequisites(&step.concept_id)
                    .iter()
                    .all(|p| self.is_known(user_id, &p.id))
            })
            .map(|step| Recommendation {
                concept_id: step.concept_id.clone(),
                title: step.title.clone(),
                confidence: step.confidence,
                score: (1.0 - step.confidence) * 10.0,
            })
            .collect();

        // Stable sort keeps topological order among equal scores.
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(limit);
        candidates
    }

    /// Concepts due for review: confidence above zero and last reviewed at
    /// least `days_threshold` days ago. Never-started concepts are never
    /// flagged.
    pub fn needs_review(&self, user_id: &str, days_threshold: i64) -> Vec<ReviewItem> {
        let now = Utc::now();
        let mut due: Vec<ReviewItem> = self
            .progress
            .get(user_id)
            .into_iter()
            .flatten()
            .filter(|(_, r)| r.confidence > 0.0)
            .filter_map(|(id, r)| {
                let days = (now - r.last_reviewed).num_days();
                (days >= days_threshold).then(|| ReviewItem {
                    concept_id: id.clone(),
                    confidence: r.confidence,
                    days_since_review: days,
                })
            })
            .collect();
        due.sort_by(|a, b| {
            b.days_since_review
                .cmp(&a.days_since_review)
                .then_with(|| a.concept_id.cmp(&b.concept_id))
        });
        due
    }

    /// Export one user's progress records, sorted by concept ID.
    pub fn export_progress(&self, user_id: &str) -> Vec<ConceptProgress> {
        let mut records: Vec<ConceptProgress> = self
            .progress
            .get(user_id)
            .into_iter()
            .flatten()
            .map(|(_, r)| r.clone())
            .collect();
        records.sort_by(|a, b| a.concept_id.cmp(&b.concept_id));
        records
    }

    /// Import progress records for a user. Overwrites per concept ID; no
    /// count merging. Confidence is clamped to [0, 1] like every other
    /// mutation path.
    pub fn import_progress(&mut self, user_id: &str, records: Vec<ConceptProgress>) {
        let user = self.progress.entry(user_id.to_string()).or_default();
        for mut record in records {
            record.confidence = record.confidence.clamp(0.0, 1.0);
            user.insert(record.concept_id.clone(), record);
        }
    }
}

impl Default for DiagnosticsEngine {
    fn default() -> Self {
        Self::new()
    }
}
