#![forbid(unsafe_code)]
//! chronicle-core library.
//!
//! Event model, heuristic relation scoring, and windowed candidate
//! generation. Graph-level stages live in `chronicle-graph`.
//!
//! # Conventions
//!
//! - **Errors**: Domain failures are [`error::EngineError`]; file and
//!   configuration plumbing uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod candidates;
pub mod config;
pub mod error;
pub mod heuristics;
pub mod model;
pub mod score;

pub use candidates::CandidateGenerator;
pub use config::{EngineConfig, HeuristicsConfig};
pub use error::{EngineError, EngineResult, ErrorCode, Stage};
pub use heuristics::Heuristics;
pub use model::{Edge, Event, GraphStats, Node, RelationType, TimelineGraph};
pub use score::{RelationScorer, SourceContext};
