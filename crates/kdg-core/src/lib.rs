//! Core types and storage for the knowledge dependency graph (KDG).
//!
//! Provides the graph data model ([`graph::ConceptGraph`]), concept nodes,
//! typed dependency edges, traversal primitives (prerequisite closure,
//! topological sort, cycle detection, induced subgraphs), JSON snapshot
//! persistence, and configuration.

pub mod config;
pub mod filter;
pub mod graph;
pub mod schema;
pub mod storage;
