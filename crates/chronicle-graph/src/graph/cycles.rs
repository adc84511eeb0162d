//! Cycle detection and resolution.
//!
//! The resolver repeatedly finds one cycle with a depth-first search and
//! removes its weakest edge until the graph is acyclic.
//!
//! # Determinism
//!
//! Roots are tried in node-index (input) order and neighbours in candidate
//! order. Among the edges of a found cycle, the lowest strength is removed;
//! equal strengths go to the edge met first walking the cycle from the node
//! where the search entered it. A different scan order could pick a
//! different edge on ties, so the outcome is deterministic, not canonical.

use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::Serialize;
use tracing::{debug, info, instrument};

use chronicle_core::model::Edge;

use crate::graph::build::RelationGraph;

/// One cycle that was broken and the edge removed to break it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrokenCycle {
    /// Node ids around the cycle, starting where the search entered it.
    pub cycle: Vec<String>,
    pub removed: Edge,
}

/// Outcome of [`resolve_cycles`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleResolution {
    pub broken: Vec<BrokenCycle>,
}

impl CycleResolution {
    #[must_use]
    pub fn cycles_broken(&self) -> usize {
        self.broken.len()
    }
}

/// Find one cycle, returned as its edges in cycle order.
#[must_use]
pub fn find_cycle(rg: &RelationGraph) -> Option<Vec<EdgeIndex>> {
    let n = rg.node_count();
    let mut visited = vec![false; n];
    let mut on_stack = vec![false; n];

    for root in rg.graph.node_indices() {
        if visited[root.index()] {
            continue;
        }

        // Frames: (node, outgoing edges, next position). `path` holds the
        // edge used to enter each frame after the root.
        let mut frames: Vec<(NodeIndex, Vec<(EdgeIndex, NodeIndex)>, usize)> =
            vec![(root, rg.outgoing(root), 0)];
        let mut path: Vec<EdgeIndex> = Vec::new();
        visited[root.index()] = true;
        on_stack[root.index()] = true;

        while let Some(frame) = frames.last_mut() {
            let current = frame.0;
            if frame.2 < frame.1.len() {
                let (edge, next) = frame.1[frame.2];
                frame.2 += 1;

                if on_stack[next.index()] {
                    let start = frames
                        .iter()
                        .position(|(node, ..)| *node == next)
                        .unwrap_or(0);
                    let mut cycle: Vec<EdgeIndex> = path[start..].to_vec();
                    cycle.push(edge);
                    return Some(cycle);
                }
                if !visited[next.index()] {
                    visited[next.index()] = true;
                    on_stack[next.index()] = true;
                    path.push(edge);
                    frames.push((next, rg.outgoing(next), 0));
                }
            } else {
                on_stack[current.index()] = false;
                frames.pop();
                path.pop();
            }
        }
    }

    None
}

#[must_use]
pub fn is_acyclic(rg: &RelationGraph) -> bool {
    !petgraph::algo::is_cyclic_directed(&rg.graph)
}

/// Break every cycle by removing the weakest edge of each cycle found.
#[instrument(skip(rg), fields(nodes = rg.node_count(), edges = rg.edge_count()))]
pub fn resolve_cycles(rg: &mut RelationGraph) -> CycleResolution {
    let mut resolution = CycleResolution::default();

    while let Some(cycle_edges) = find_cycle(rg) {
        let Some(weakest) = weakest_edge(rg, &cycle_edges) else {
            break;
        };
        let cycle: Vec<String> = cycle_edges
            .iter()
            .filter_map(|&e| rg.graph.edge_endpoints(e))
            .map(|(source, _)| rg.node_id(source).to_string())
            .collect();
        let Some(removed) = rg.graph.remove_edge(weakest).map(|slot| slot.edge) else {
            break;
        };

        debug!(
            source = %removed.source_id,
            target = %removed.target_id,
            strength = removed.relation_strength,
            cycle_len = cycle.len(),
            "removed weakest cycle edge"
        );
        resolution.broken.push(BrokenCycle { cycle, removed });
    }

    info!(
        cycles_broken = resolution.cycles_broken(),
        "cycle resolution complete"
    );
    resolution
}

fn weakest_edge(rg: &RelationGraph, cycle: &[EdgeIndex]) -> Option<EdgeIndex> {
    let mut best: Option<(EdgeIndex, f64)> = None;
    for &idx in cycle {
        let Some(edge) = rg.edge(idx) else {
            continue;
        };
        if best.is_none_or(|(_, s)| edge.relation_strength < s) {
            best = Some((idx, edge.relation_strength));
        }
    }
    best.map(|(idx, _)| idx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
