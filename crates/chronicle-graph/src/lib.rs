#![forbid(unsafe_code)]
//! chronicle-graph library.
//!
//! Turns scored candidate edges into an acyclic, transitively reduced
//! relation graph and answers structural queries over the result.
//!
//! # Conventions
//!
//! - **Errors**: Stages return [`chronicle_core::EngineResult`]; query-time
//!   "not found" is an empty answer, never an error.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod graph;
pub mod pipeline;
pub mod query;

pub use graph::{Topology, Violation, verify};
pub use pipeline::{Construction, ConstructionReport, GraphBuilder};
pub use query::{QueryEngine, QueryRequest, QueryResponse, QueryResult, QueryType};
