//! Transitive reduction of the acyclic relation graph.
//!
//! An edge `u -> v` is redundant when `v` is still reachable from `u`
//! through another successor `w != v`. Descendant sets are computed once,
//! sinks first, on the pre-reduction graph; all redundant edges are then
//! removed together. On a DAG this leaves exactly the edges whose endpoints
//! have no other connecting path.

use fixedbitset::FixedBitSet;
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use tracing::{debug, info, instrument};

use chronicle_core::error::{EngineError, EngineResult, Stage};
use chronicle_core::model::Edge;

use crate::graph::build::RelationGraph;

/// Descendant set (excluding the node itself) of every node.
///
/// # Errors
///
/// Returns [`EngineError::InternalInvariant`] if the graph has a cycle.
pub fn descendants(rg: &RelationGraph) -> EngineResult<Vec<FixedBitSet>> {
    let g = &rg.graph;
    let n = g.node_count();
    let topo = toposort(g, None).map_err(|cycle| EngineError::InternalInvariant {
        stage: Stage::Reduction,
        detail: format!(
            "graph still contains a cycle through '{}'",
            rg.node_id(cycle.node_id())
        ),
    })?;

    let mut reach: Vec<FixedBitSet> = vec![FixedBitSet::with_capacity(n); n];
    for &u in topo.iter().rev() {
        let mut reach_u = FixedBitSet::with_capacity(n);
        for w in g.neighbors_directed(u, Direction::Outgoing) {
            reach_u.insert(w.index());
            reach_u.union_with(&reach[w.index()]);
        }
        reach[u.index()] = reach_u;
    }
    Ok(reach)
}

/// Remove every edge implied by a longer path. Returns the removed edges
/// in candidate order.
///
/// # Errors
///
/// Returns [`EngineError::InternalInvariant`] if the graph has a cycle.
#[instrument(skip(rg), fields(nodes = rg.node_count(), edges = rg.edge_count()))]
pub fn transitive_reduction(rg: &mut RelationGraph) -> EngineResult<Vec<Edge>> {
    let reach = descendants(rg)?;
    let g = &rg.graph;

    let mut redundant: Vec<(usize, NodeIndex, NodeIndex)> = g
        .edge_references()
        .filter(|e| {
            let (u, v) = (e.source(), e.target());
            g.neighbors_directed(u, Direction::Outgoing)
                .filter(|&w| w != v)
                .any(|w| reach[w.index()].contains(v.index()))
        })
        .map(|e| (e.weight().seq, e.source(), e.target()))
        .collect();
    redundant.sort_unstable_by_key(|&(seq, ..)| seq);

    let mut removed = Vec::with_capacity(redundant.len());
    for (_, u, v) in redundant {
        if let Some(edge) = rg.remove_pair(u, v) {
            debug!(
                source = %edge.source_id,
                target = %edge.target_id,
                strength = edge.relation_strength,
                "removed transitive edge"
            );
            removed.push(edge);
        }
    }

    info!(removed = removed.len(), "transitive reduction complete");
    Ok(removed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
