//! Diagnostics and planning over the knowledge dependency graph.
//!
//! [`diagnostics::DiagnosticsEngine`] owns per-user confidence state and
//! turns graph structure into gap reports and ordered study paths;
//! [`planner`] composes overlays, diagnostics, and graph traversal into
//! exam- and curriculum-scoped plans; [`validate`] is the offline
//! integrity pass that gates study-path generation.

pub mod diagnostics;
pub mod planner;
pub mod validate;
