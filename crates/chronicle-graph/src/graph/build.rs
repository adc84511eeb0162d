//! Arena graph over node indices.
//!
//! Nodes are added once, in input order, and never removed, so a
//! `NodeIndex` doubles as the node's chronological position. Edges carry a
//! sequence number from candidate generation; petgraph reshuffles edge
//! indices on removal, so output order always comes from `seq`.

use std::collections::HashMap;

use chrono::NaiveDate;
use chronicle_core::error::{EngineError, EngineResult};
use chronicle_core::model::{Edge, Node, TimelineGraph};
use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// Node weight: identifier plus the date used for level ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeKey {
    pub id: String,
    pub date: Option<NaiveDate>,
}

/// Edge weight: the relation plus its position in the candidate list.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSlot {
    pub seq: usize,
    pub edge: Edge,
}

// ---------------------------------------------------------------------------
// RelationGraph
// ---------------------------------------------------------------------------

/// Directed relation graph used by the construction stages.
#[derive(Debug, Clone)]
pub struct RelationGraph {
    pub graph: DiGraph<NodeKey, EdgeSlot>,
    pub node_map: HashMap<String, NodeIndex>,
}

impl RelationGraph {
    /// Build from nodes and candidate edges.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateEventId`] for a repeated node id and
    /// [`EngineError::InvalidCandidate`] for a self-loop, an unknown
    /// endpoint, or a repeated `(source, target)` pair.
    pub fn from_parts(nodes: &[Node], candidates: Vec<Edge>) -> EngineResult<Self> {
        let mut rg = Self::with_nodes(nodes.iter().map(|n| NodeKey {
            id: n.id.clone(),
            date: n.resolved_date().map(|d| d.date),
        }))?;
        for edge in candidates {
            rg.add_candidate(edge)?;
        }
        Ok(rg)
    }

    /// Rebuild the arena view of a finished graph.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_parts`].
    pub fn from_timeline(graph: &TimelineGraph) -> EngineResult<Self> {
        Self::from_parts(&graph.nodes, graph.edges.clone())
    }

    fn with_nodes(keys: impl Iterator<Item = NodeKey>) -> EngineResult<Self> {
        let mut graph = DiGraph::<NodeKey, EdgeSlot>::new();
        let mut node_map = HashMap::new();
        for key in keys {
            if node_map.contains_key(&key.id) {
                return Err(EngineError::DuplicateEventId { id: key.id });
            }
            let id = key.id.clone();
            let idx = graph.add_node(key);
            node_map.insert(id, idx);
        }
        Ok(Self { graph, node_map })
    }

    fn add_candidate(&mut self, edge: Edge) -> EngineResult<()> {
        let invalid = |edge: &Edge, reason: &str| EngineError::InvalidCandidate {
            source_id: edge.source_id.clone(),
            target_id: edge.target_id.clone(),
            reason: reason.to_string(),
        };

        if edge.source_id == edge.target_id {
            return Err(invalid(&edge, "self-loop"));
        }
        let (Some(from), Some(to)) = (
            self.node_index(&edge.source_id),
            self.node_index(&edge.target_id),
        ) else {
            return Err(invalid(&edge, "unknown endpoint"));
        };
        if self.graph.contains_edge(from, to) {
            return Err(invalid(&edge, "duplicate pair"));
        }

        let seq = self.graph.edge_count();
        self.graph.add_edge(from, to, EdgeSlot { seq, edge });
        Ok(())
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    #[must_use]
    pub fn node_id(&self, idx: NodeIndex) -> &str {
        self.graph.node_weight(idx).map_or("", |k| k.id.as_str())
    }

    #[must_use]
    pub fn edge(&self, idx: EdgeIndex) -> Option<&Edge> {
        self.graph.edge_weight(idx).map(|slot| &slot.edge)
    }

    /// Outgoing edges of `node`, in candidate order.
    #[must_use]
    pub fn outgoing(&self, node: NodeIndex) -> Vec<(EdgeIndex, NodeIndex)> {
        let mut out: Vec<(usize, EdgeIndex, NodeIndex)> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.weight().seq, e.id(), e.target()))
            .collect();
        out.sort_unstable_by_key(|&(seq, ..)| seq);
        out.into_iter().map(|(_, e, t)| (e, t)).collect()
    }

    /// Remove the edge `from -> to`, returning its relation.
    pub fn remove_pair(&mut self, from: NodeIndex, to: NodeIndex) -> Option<Edge> {
        let idx = self.graph.find_edge(from, to)?;
        self.graph.remove_edge(idx).map(|slot| slot.edge)
    }

    /// Surviving edges, in candidate order.
    #[must_use]
    pub fn edges_in_order(&self) -> Vec<&Edge> {
        let mut slots: Vec<&EdgeSlot> = self.graph.edge_weights().collect();
        slots.sort_unstable_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| &slot.edge).collect()
    }

    /// Consume the graph, yielding surviving edges in candidate order.
    #[must_use]
    pub fn into_edges(self) -> Vec<Edge> {
        let (_, edges) = self.graph.into_nodes_edges();
        let mut slots: Vec<EdgeSlot> = edges.into_iter().map(|e| e.weight).collect();
        slots.sort_unstable_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| slot.edge).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
