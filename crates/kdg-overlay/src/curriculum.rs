//! Curriculum overlay: maps (education system, year level) to a concept
//! selection over the graph. Pure filtering plus prerequisite closure; the
//! graph itself is never mutated.

use crate::selection::expand_selection;
use kdg_core::graph::ConceptGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// The education systems the overlay recognizes. Closed set: new systems
/// are added here, not smuggled in as free-form strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationSystem {
    Gcse,
    ALevel,
    Ib,
    Ap,
    National,
}

impl FromStr for EducationSystem {
    type Err = UnknownSystem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gcse" => Ok(Self::Gcse),
            "a_level" | "alevel" | "a-level" => Ok(Self::ALevel),
            "ib" => Ok(Self::Ib),
            "ap" => Ok(Self::Ap),
            "national" => Ok(Self::National),
            other => Err(UnknownSystem(other.to_string())),
        }
    }
}

impl fmt::Display for EducationSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Gcse => "gcse",
            Self::ALevel => "a_level",
            Self::Ib => "ib",
            Self::Ap => "ap",
            Self::National => "national",
        };
        f.write_str(s)
    }
}

/// Error for an education-system string outside the closed set. Raised at
/// the ingestion boundary, never trusted at use sites.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown education system: {0}")]
pub struct UnknownSystem(pub String);

/// One curriculum entry: the concepts a given system expects at a given
/// year level. `required` and `excluded` are logically disjoint; the
/// validation pass flags overlaps, the overlay does not enforce it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumMapping {
    pub system: EducationSystem,
    pub year_level: u8,
    #[serde(default)]
    pub required: BTreeSet<String>,
    #[serde(default)]
    pub optional: BTreeSet<String>,
    #[serde(default)]
    pub excluded: BTreeSet<String>,
    #[serde(default)]
    pub estimated_hours: f64,
}

/// In-memory curriculum store keyed by (system, year level).
#[derive(Debug, Clone, Default)]
pub struct CurriculumOverlay {
    mappings: HashMap<(EducationSystem, u8), CurriculumMapping>,
}

impl CurriculumOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the store wholesale with the given mappings.
    pub fn load_mappings(&mut self, mappings: Vec<CurriculumMapping>) {
        self.mappings = mappings
            .into_iter()
            .map(|m| ((m.system, m.year_level), m))
            .collect();
        tracing::debug!(mappings = self.mappings.len(), "loaded curriculum mappings");
    }

    pub fn mapping(&self, system: EducationSystem, year_level: u8) -> Option<&CurriculumMapping> {
        self.mappings.get(&(system, year_level))
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Resolve the concept-ID selection for a curriculum: required
    /// (optionally plus optional) concepts, expanded with their transitive
    /// prerequisites, minus the excluded set. Unknown (system, year) pairs
    /// yield an empty set.
    pub fn selection(
        &self,
        graph: &ConceptGraph,
        system: EducationSystem,
        year_level: u8,
        include_optional: bool,
    ) -> HashSet<String> {
        let Some(mapping) = self.mapping(system, year_level) else {
            return HashSet::new();
        };
        let mut selected: Vec<String> = mapping.required.iter().cloned().collect();
        if include_optional {
            selected.extend(mapping.optional.iter().cloned());
        }
        expand_selection(graph, selected, &mapping.excluded)
    }

    /// The induced subgraph for a curriculum selection.
    pub fn curriculum_subgraph(
        &self,
        graph: &ConceptGraph,
        system: EducationSystem,
        year_level: u8,
        include_optional: bool,
    ) -> ConceptGraph {
        let ids = self.selection(graph, system, year_level, include_optional);
        graph.subgraph(&ids)
    }
}
