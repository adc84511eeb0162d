//! Graph-level construction stages.
//!
//! # Overview
//!
//! Candidate edges from `chronicle-core` are loaded into a petgraph arena
//! and pushed through the acyclic-reduction stages in a fixed order. Every
//! stage runs sequentially on the calling thread.
//!
//! ## Pipeline
//!
//! ```text
//! Vec<Edge> candidates
//!        ↓  build::RelationGraph::from_parts()
//! RelationGraph (DiGraph, possibly cyclic)
//!        ↓  cycles::resolve_cycles()      weakest edge per cycle removed
//!        ↓  reduce::transitive_reduction() implied edges removed
//!        ↓  topology::analyze()            levels, depth, slack, critical path
//!        ↓  stats::graph_stats()
//! TimelineGraph
//! ```
//!
//! [`verify::verify`] re-checks a finished graph against the same
//! guarantees without rebuilding it.

pub mod build;
pub mod cycles;
pub mod reduce;
pub mod stats;
pub mod topology;
pub mod verify;

pub use build::RelationGraph;
pub use cycles::{BrokenCycle, CycleResolution, find_cycle, is_acyclic, resolve_cycles};
pub use reduce::transitive_reduction;
pub use stats::{EdgeSummary, edge_summary, graph_stats};
pub use topology::{NodeSchedule, Topology, analyze};
pub use verify::{Violation, verify};
