//! Engine data model: input events, nodes, edges, and the finished graph.

pub mod date;
pub mod edge;
pub mod event;
pub mod graph;
pub mod node;
pub mod relation;

pub use date::{DatePrecision, ResolvedDate};
pub use edge::Edge;
pub use event::{Event, EventBatch};
pub use graph::{GRAPH_VERSION, GraphStats, TimelineGraph};
pub use node::{Node, NodeKind};
pub use relation::{RelationType, UnknownRelationType};
