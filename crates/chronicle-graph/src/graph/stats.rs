//! Graph statistics and per-edge summaries.
//!
//! - **avg_degree**: average out-degree `edge_count / node_count`, rounded to
//!   3 decimals; 0.0 for an empty node set.
//! - **max_path_length**: critical-path length in edges.
//! - **cyclic_count**: cycles broken during construction.

use std::collections::BTreeMap;

use serde::Serialize;

use chronicle_core::model::{Edge, GraphStats, RelationType};
use chronicle_core::score::round3;

/// Statistics block for a finished graph.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn graph_stats(
    node_count: usize,
    edge_count: usize,
    max_path_length: usize,
    cyclic_count: usize,
) -> GraphStats {
    let avg_degree = if node_count == 0 {
        0.0
    } else {
        round3(edge_count as f64 / node_count as f64)
    };

    GraphStats {
        node_count,
        edge_count,
        avg_degree,
        max_path_length,
        cyclic_count,
    }
}

/// Aggregate figures over an edge list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EdgeSummary {
    pub count: usize,
    pub by_type: BTreeMap<RelationType, usize>,
    pub min_strength: f64,
    pub mean_strength: f64,
    pub max_strength: f64,
    /// Mean `|time_gap_days|` over edges with both dates known.
    pub mean_abs_gap_days: Option<f64>,
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn edge_summary(edges: &[Edge]) -> EdgeSummary {
    if edges.is_empty() {
        return EdgeSummary::default();
    }

    let mut by_type: BTreeMap<RelationType, usize> = BTreeMap::new();
    for edge in edges {
        *by_type.entry(edge.relation_type).or_insert(0) += 1;
    }

    let strengths = edges.iter().map(|e| e.relation_strength);
    let min_strength = strengths.clone().fold(f64::INFINITY, f64::min);
    let max_strength = strengths.clone().fold(f64::NEG_INFINITY, f64::max);
    let mean_strength = strengths.sum::<f64>() / edges.len() as f64;

    let gaps: Vec<f64> = edges
        .iter()
        .filter_map(|e| e.time_gap_days)
        .map(|g| g.unsigned_abs() as f64)
        .collect();
    let mean_abs_gap_days =
        (!gaps.is_empty()).then(|| round3(gaps.iter().sum::<f64>() / gaps.len() as f64));

    EdgeSummary {
        count: edges.len(),
        by_type,
        min_strength,
        mean_strength: round3(mean_strength),
        max_strength,
        mean_abs_gap_days,
    }
}
