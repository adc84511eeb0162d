//! Level ordering and critical-path analysis.
//!
//! # Algorithm
//!
//! 1. **Levels**: Kahn's algorithm in batches. Every node whose in-degree is
//!    zero when a batch starts forms one level. Inside a level, nodes sort by
//!    date ascending, undated last, ties by input order. Successors reaching
//!    in-degree zero join the *next* level only.
//! 2. **Forward pass** over the level order: `depth[v] = max(depth[u] + 1)`
//!    over incoming edges, 0 for sources. The first-processed predecessor
//!    achieving the maximum is recorded.
//! 3. **Backward pass** in reverse order: `latest[v] = min(latest[s] - 1)`
//!    over successors, the critical length for sinks. `slack = latest -
//!    depth`; critical-path nodes have zero slack.
//! 4. **Critical path**: walk recorded predecessors back from the first node
//!    in level order with maximal depth.

use std::cmp::Ordering;

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use tracing::{info, instrument};

use chronicle_core::error::{EngineError, EngineResult, Stage};

use crate::graph::build::RelationGraph;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Per-node scheduling figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSchedule {
    pub id: String,
    /// Index of the Kahn batch holding the node.
    pub level: usize,
    /// Longest path, in edges, ending at the node.
    pub depth: usize,
    /// Latest depth the node could sit at without lengthening the
    /// critical path.
    pub latest: usize,
    pub slack: usize,
}

/// Result of [`analyze`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Topology {
    pub levels: Vec<Vec<String>>,
    /// Levels flattened, first level first.
    pub order: Vec<String>,
    /// Schedule for each node, in `order`.
    pub schedule: Vec<NodeSchedule>,
    pub critical_path: Vec<String>,
    /// Critical-path length in edges.
    pub max_path_length: usize,
}

impl Topology {
    #[must_use]
    pub fn schedule_of(&self, id: &str) -> Option<&NodeSchedule> {
        self.schedule.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn level_of(&self, id: &str) -> Option<usize> {
        self.schedule_of(id).map(|s| s.level)
    }
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Order `rg` into levels and compute its critical path.
///
/// # Errors
///
/// Returns [`EngineError::InternalInvariant`] when the batches cannot
/// consume every node, which only happens if a cycle survived resolution.
#[instrument(skip(rg), fields(nodes = rg.node_count(), edges = rg.edge_count()))]
pub fn analyze(rg: &RelationGraph) -> EngineResult<Topology> {
    let g = &rg.graph;
    let n = g.node_count();

    // --- Levels ---
    let mut indegree: Vec<usize> = g
        .node_indices()
        .map(|v| g.neighbors_directed(v, Direction::Incoming).count())
        .collect();
    let mut ready: Vec<NodeIndex> = g.node_indices().filter(|v| indegree[v.index()] == 0).collect();
    let mut levels: Vec<Vec<NodeIndex>> = Vec::new();
    let mut level_of = vec![0_usize; n];

    while !ready.is_empty() {
        ready.sort_by(|&a, &b| level_cmp(rg, a, b));
        let mut next: Vec<NodeIndex> = Vec::new();
        for &v in &ready {
            level_of[v.index()] = levels.len();
            for s in g.neighbors_directed(v, Direction::Outgoing) {
                let d = &mut indegree[s.index()];
                *d -= 1;
                if *d == 0 {
                    next.push(s);
                }
            }
        }
        levels.push(std::mem::replace(&mut ready, next));
    }

    let order: Vec<NodeIndex> = levels.iter().flatten().copied().collect();
    if order.len() != n {
        return Err(EngineError::InternalInvariant {
            stage: Stage::Topology,
            detail: format!("{} of {n} nodes ordered; residual cycle", order.len()),
        });
    }

    // --- Forward pass ---
    let mut depth = vec![0_usize; n];
    let mut pred: Vec<Option<NodeIndex>> = vec![None; n];
    for &u in &order {
        for (_, v) in rg.outgoing(u) {
            if depth[u.index()] + 1 > depth[v.index()] {
                depth[v.index()] = depth[u.index()] + 1;
                pred[v.index()] = Some(u);
            }
        }
    }
    let max_path_length = depth.iter().copied().max().unwrap_or(0);

    // --- Backward pass ---
    let mut latest = vec![max_path_length; n];
    for &v in order.iter().rev() {
        if let Some(min_succ) = g
            .neighbors_directed(v, Direction::Outgoing)
            .map(|s| latest[s.index()])
            .min()
        {
            latest[v.index()] = min_succ.saturating_sub(1);
        }
    }

    // --- Critical path ---
    let mut critical_path = Vec::new();
    let mut cursor = order
        .iter()
        .copied()
        .find(|v| n > 0 && depth[v.index()] == max_path_length);
    while let Some(v) = cursor {
        critical_path.push(rg.node_id(v).to_string());
        cursor = pred[v.index()];
    }
    critical_path.reverse();

    let schedule = order
        .iter()
        .map(|&v| {
            let i = v.index();
            NodeSchedule {
                id: rg.node_id(v).to_string(),
                level: level_of[i],
                depth: depth[i],
                latest: latest[i],
                slack: latest[i].saturating_sub(depth[i]),
            }
        })
        .collect();

    let ids = |vs: &[NodeIndex]| -> Vec<String> {
        vs.iter().map(|&v| rg.node_id(v).to_string()).collect()
    };
    let topology = Topology {
        levels: levels.iter().map(|l| ids(l)).collect(),
        order: ids(&order),
        schedule,
        critical_path,
        max_path_length,
    };

    info!(
        levels = topology.levels.len(),
        max_path_length, "topological analysis complete"
    );
    Ok(topology)
}

/// Date ascending, undated last, then input order.
fn level_cmp(rg: &RelationGraph, a: NodeIndex, b: NodeIndex) -> Ordering {
    let da = rg.graph[a].date;
    let db = rg.graph[b].date;
    let by_date = match (da, db) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date.then_with(|| a.index().cmp(&b.index()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_core::model::{Edge, Event, Node, RelationType};

    fn graph(events: &[Event], edges: &[(&str, &str)]) -> RelationGraph {
        let nodes: Vec<Node> = events.iter().map(|e| Node::from_event(e).unwrap()).collect();
        let edges = edges
            .iter()
            .map(|&(s, t)| Edge::new(s, t, RelationType::Causal, 0.8))
            .collect();
        RelationGraph::from_parts(&nodes, edges).unwrap()
    }

    fn undated(ids: &[&str]) -> Vec<Event> {
        ids.iter().map(|id| Event::new(*id, *id)).collect()
    }

    #[test]
    fn chain_levels_and_critical_path() {
        let rg = graph(&undated(&["a", "b", "c"]), &[("a", "b"), ("b", "c")]);
        let topo = analyze(&rg).unwrap();
        assert_eq!(topo.levels, vec![vec!["a"], vec!["b"], vec!["c"]]);
        assert_eq!(topo.critical_path, ["a", "b", "c"]);
        assert_eq!(topo.max_path_length, 2);
        assert!(topo.schedule.iter().all(|s| s.slack == 0));
    }

    #[test]
    fn level_sorts_by_date_then_undated_then_input_order() {
        let events = vec![
            Event::new("undated", "u"),
            Event::new("late", "l").with_date("2021-06-01"),
            Event::new("early", "e").with_date("2020-01-01"),
            Event::new("undated2", "u2"),
        ];
        let rg = graph(&events, &[]);
        let topo = analyze(&rg).unwrap();
        assert_eq!(topo.levels, vec![vec!["early", "late", "undated", "undated2"]]);
        assert_eq!(topo.max_path_length, 0);
        assert_eq!(topo.critical_path, ["early"]);
    }

    #[test]
    fn successors_wait_for_the_next_level() {
        // a -> c, b -> c, b -> d: c needs both a and b.
        let rg = graph(&undated(&["a", "b", "c", "d"]), &[("a", "c"), ("b", "c"), ("b", "d")]);
        let topo = analyze(&rg).unwrap();
        assert_eq!(topo.levels, vec![vec!["a", "b"], vec!["c", "d"]]);
        assert_eq!(topo.order, ["a", "b", "c", "d"]);
        assert_eq!(topo.level_of("d"), Some(1));
    }

    #[test]
    fn slack_marks_off_critical_nodes() {
        // a -> b -> c -> d and a -> x -> d
        let rg = graph(
            &undated(&["a", "b", "c", "x", "d"]),
            &[("a", "b"), ("b", "c"), ("c", "d"), ("a", "x"), ("x", "d")],
        );
        let topo = analyze(&rg).unwrap();
        assert_eq!(topo.critical_path, ["a", "b", "c", "d"]);
        assert_eq!(topo.max_path_length, 3);
        let x = topo.schedule_of("x").unwrap();
        assert_eq!((x.depth, x.latest, x.slack), (1, 2, 1));
        assert_eq!(topo.schedule_of("c").unwrap().slack, 0);
    }

    #[test]
    fn first_processed_predecessor_wins_ties() {
        // b and c both reach d at depth 1; b comes first.
        let rg = graph(
            &undated(&["a", "b", "c", "d"]),
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        );
        let topo = analyze(&rg).unwrap();
        assert_eq!(topo.critical_path, ["a", "b", "d"]);
    }

    #[test]
    fn empty_graph_is_empty_topology() {
        let rg = graph(&[], &[]);
        let topo = analyze(&rg).unwrap();
        assert!(topo.levels.is_empty());
        assert!(topo.critical_path.is_empty());
        assert_eq!(topo.max_path_length, 0);
    }

    #[test]
    fn residual_cycle_is_an_invariant_error() {
        let rg = graph(&undated(&["a", "b", "c"]), &[("a", "b"), ("b", "c"), ("c", "b")]);
        let err = analyze(&rg).unwrap_err();
        assert_eq!(err.stage(), Stage::Topology);
        assert!(err.to_string().contains("1 of 3 nodes ordered"));
    }
}
