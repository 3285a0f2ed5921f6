//! Curriculum and exam overlays for the knowledge dependency graph.
//!
//! Overlays select concept subsets (required/optional/excluded, plus
//! per-exam depth annotations) without altering the underlying graph.

pub mod curriculum;
pub mod exam;
pub mod selection;
