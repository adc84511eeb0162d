//! The finished graph artifact handed to the serving layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::edge::Edge;
use crate::model::node::Node;

pub const GRAPH_VERSION: &str = "2.0";

/// Summary statistics attached to every finished graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    /// Average out-degree, `edge_count / node_count`, rounded to 3 decimals.
    pub avg_degree: f64,
    /// Critical-path length in edges.
    pub max_path_length: usize,
    /// Cycles broken during construction. Diagnostic only.
    pub cyclic_count: usize,
}

/// An immutable causal-relation graph over one event list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineGraph {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub total_events: usize,
    pub generated_at: DateTime<Utc>,
    pub version: String,
    pub stats: GraphStats,
}

impl TimelineGraph {
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    #[must_use]
    pub fn edge(&self, source_id: &str, target_id: &str) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|e| e.source_id == source_id && e.target_id == target_id)
    }
}
