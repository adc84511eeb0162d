//! Read-only structural queries over a finished graph.
//!
//! A [`QueryEngine`] borrows a [`TimelineGraph`] and indexes its edges once.
//! It holds no interior mutability, so one engine can serve any number of
//! reader threads.
//!
//! Unknown node identifiers never raise errors: they produce the same empty
//! or negative answer as "no relation". Path enumeration stops at the
//! configured depth without reporting the pruned branches.

pub mod request;

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, instrument};

use chronicle_core::config::EngineConfig;
use chronicle_core::error::{EngineError, EngineResult};
use chronicle_core::model::{Edge, RelationType, TimelineGraph};

pub use request::{QueryRequest, QueryResponse, QueryResult, QueryType};

/// Query evaluator bound to one graph.
#[derive(Debug, Clone)]
pub struct QueryEngine<'g> {
    graph: &'g TimelineGraph,
    index: HashMap<&'g str, usize>,
    /// Edge positions leaving each node, in edge-list order.
    outgoing: Vec<Vec<usize>>,
    /// Edge positions entering each node, in edge-list order.
    incoming: Vec<Vec<usize>>,
    max_depth: usize,
}

impl<'g> QueryEngine<'g> {
    #[must_use]
    pub fn new(graph: &'g TimelineGraph) -> Self {
        let mut index: HashMap<&'g str, usize> = HashMap::with_capacity(graph.nodes.len());
        for (i, node) in graph.nodes.iter().enumerate() {
            index.entry(node.id.as_str()).or_insert(i);
        }

        let n = graph.nodes.len();
        let mut outgoing = vec![Vec::new(); n];
        let mut incoming = vec![Vec::new(); n];
        for (pos, edge) in graph.edges.iter().enumerate() {
            let (Some(&s), Some(&t)) = (
                index.get(edge.source_id.as_str()),
                index.get(edge.target_id.as_str()),
            ) else {
                continue;
            };
            outgoing[s].push(pos);
            incoming[t].push(pos);
        }

        Self {
            graph,
            index,
            outgoing,
            incoming,
            max_depth: EngineConfig::default().max_path_depth,
        }
    }

    /// Default edge bound for path queries that do not carry one.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub const fn graph(&self) -> &'g TimelineGraph {
        self.graph
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Evaluate a request.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidQuery`] when a parameter required by the
    /// query type is missing.
    #[instrument(skip_all, fields(query_type = %request.query_type))]
    pub fn execute(&self, request: &QueryRequest) -> EngineResult<QueryResponse> {
        let limit = request.max_results.unwrap_or(usize::MAX);
        let node_ids = |mut ids: Vec<String>| {
            ids.truncate(limit);
            QueryResult::NodeIds { node_ids: ids }
        };

        let result = match request.query_type {
            QueryType::Path => {
                let start = required(request, "start_node_id", request.start_node_id.as_ref())?;
                let end = required(request, "end_node_id", request.end_node_id.as_ref())?;
                let depth = request.max_depth.unwrap_or(self.max_depth);
                QueryResult::Paths {
                    paths: self.paths(start, end, depth, limit),
                }
            }
            QueryType::CausalChain => {
                let start = required(
                    request,
                    "start_node_id",
                    request.start_node_id.as_ref().or(request.node_id.as_ref()),
                )?;
                node_ids(self.causal_chain(start, &request.relation_types))
            }
            QueryType::Influence => {
                let start = required(request, "start_node_id", request.start_node_id.as_ref())?;
                let end = required(request, "end_node_id", request.end_node_id.as_ref())?;
                let (influenced, confidence) = self.influence(start, end);
                QueryResult::Influence {
                    influenced,
                    confidence,
                }
            }
            QueryType::Prerequisite => {
                let node = required(request, "node_id", request.node_id.as_ref())?;
                node_ids(self.prerequisites(node))
            }
            QueryType::Parallel => {
                let node = required(request, "node_id", request.node_id.as_ref())?;
                node_ids(self.parallel(node))
            }
            QueryType::Impact => {
                let node = required(
                    request,
                    "node_id",
                    request.node_id.as_ref().or(request.start_node_id.as_ref()),
                )?;
                node_ids(self.impact(node))
            }
        };

        debug!(results = result.len(), "query evaluated");
        Ok(QueryResponse {
            query_type: request.query_type,
            result,
        })
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Simple paths from `start` to `end` using at most `max_depth` edges,
    /// at most `max_results` of them, in depth-first discovery order.
    #[must_use]
    pub fn paths(
        &self,
        start: &str,
        end: &str,
        max_depth: usize,
        max_results: usize,
    ) -> Vec<Vec<String>> {
        let (Some(s), Some(t)) = (self.position(start), self.position(end)) else {
            return Vec::new();
        };
        if max_results == 0 {
            return Vec::new();
        }
        if s == t {
            return vec![vec![start.to_string()]];
        }

        let mut search = PathSearch {
            engine: self,
            target: t,
            max_depth,
            max_results,
            path: vec![s],
            on_path: vec![false; self.graph.nodes.len()],
            found: Vec::new(),
        };
        search.on_path[s] = true;
        search.descend(s);
        search.found
    }

    /// Nodes reachable from `start` over edges of the given types
    /// (`causal` when empty), in breadth-first order, `start` excluded.
    #[must_use]
    pub fn causal_chain(&self, start: &str, types: &[RelationType]) -> Vec<String> {
        let types: &[RelationType] = if types.is_empty() {
            &[RelationType::Causal]
        } else {
            types
        };
        self.reachable(start, |e| types.contains(&e.relation_type))
    }

    /// Nodes reachable from `node` over `causal` or `derived` edges.
    #[must_use]
    pub fn impact(&self, node: &str) -> Vec<String> {
        self.reachable(node, |e| e.relation_type.is_lineage())
    }

    /// Whether any directed path leads from `start` to `end`, and the
    /// strength of the direct edge between them (0.0 without one).
    #[must_use]
    pub fn influence(&self, start: &str, end: &str) -> (bool, f64) {
        let (Some(s), Some(t)) = (self.position(start), self.position(end)) else {
            return (false, 0.0);
        };
        if s == t {
            return (true, 0.0);
        }
        if !self.reachable_positions(s, |_| true).contains(&t) {
            return (false, 0.0);
        }
        let confidence = self.outgoing[s]
            .iter()
            .map(|&pos| &self.graph.edges[pos])
            .find(|e| e.target_id == end)
            .map_or(0.0, |e| e.relation_strength);
        (true, confidence)
    }

    /// Direct predecessors over `prerequisite` or `dependency` edges.
    #[must_use]
    pub fn prerequisites(&self, node: &str) -> Vec<String> {
        let Some(v) = self.position(node) else {
            return Vec::new();
        };
        self.incoming[v]
            .iter()
            .map(|&pos| &self.graph.edges[pos])
            .filter(|e| e.relation_type.is_precondition())
            .map(|e| e.source_id.clone())
            .collect()
    }

    /// Nodes joined to `node` by a `parallel` edge in either direction.
    #[must_use]
    pub fn parallel(&self, node: &str) -> Vec<String> {
        let Some(v) = self.position(node) else {
            return Vec::new();
        };
        let mut positions: Vec<usize> = self.outgoing[v]
            .iter()
            .chain(&self.incoming[v])
            .copied()
            .collect();
        positions.sort_unstable();

        let mut seen: HashSet<&str> = HashSet::new();
        positions
            .into_iter()
            .map(|pos| &self.graph.edges[pos])
            .filter(|e| e.relation_type == RelationType::Parallel)
            .map(|e| {
                if e.source_id == node {
                    e.target_id.as_str()
                } else {
                    e.source_id.as_str()
                }
            })
            .filter(|id| seen.insert(*id))
            .map(ToString::to_string)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Traversal helpers
    // -----------------------------------------------------------------------

    fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    fn target_of(&self, pos: usize) -> Option<usize> {
        self.position(&self.graph.edges[pos].target_id)
    }

    fn reachable(&self, start: &str, admit: impl Fn(&Edge) -> bool) -> Vec<String> {
        let Some(s) = self.position(start) else {
            return Vec::new();
        };
        self.reachable_positions(s, admit)
            .into_iter()
            .map(|v| self.graph.nodes[v].id.clone())
            .collect()
    }

    /// Breadth-first discovery order from `s`, excluding `s`.
    fn reachable_positions(&self, s: usize, admit: impl Fn(&Edge) -> bool) -> Vec<usize> {
        let mut visited = vec![false; self.graph.nodes.len()];
        visited[s] = true;
        let mut queue = VecDeque::from([s]);
        let mut order = Vec::new();

        while let Some(u) = queue.pop_front() {
            for &pos in &self.outgoing[u] {
                if !admit(&self.graph.edges[pos]) {
                    continue;
                }
                let Some(v) = self.target_of(pos) else {
                    continue;
                };
                if !visited[v] {
                    visited[v] = true;
                    order.push(v);
                    queue.push_back(v);
                }
            }
        }
        order
    }
}

fn required<'r>(
    request: &QueryRequest,
    name: &str,
    value: Option<&'r String>,
) -> EngineResult<&'r str> {
    value
        .map(String::as_str)
        .ok_or_else(|| EngineError::InvalidQuery {
            query_type: request.query_type.to_string(),
            reason: format!("missing {name}"),
        })
}

/// Depth-first path enumeration state; `on_path` is rolled back on
/// backtrack so sibling branches may revisit nodes.
struct PathSearch<'e, 'g> {
    engine: &'e QueryEngine<'g>,
    target: usize,
    max_depth: usize,
    max_results: usize,
    path: Vec<usize>,
    on_path: Vec<bool>,
    found: Vec<Vec<String>>,
}

impl PathSearch<'_, '_> {
    fn done(&self) -> bool {
        self.found.len() >= self.max_results
    }

    fn descend(&mut self, u: usize) {
        if self.path.len() > self.max_depth {
            return;
        }
        for &pos in &self.engine.outgoing[u] {
            if self.done() {
                return;
            }
            let Some(v) = self.engine.target_of(pos) else {
                continue;
            };
            if self.on_path[v] {
                continue;
            }
            if v == self.target {
                let mut ids: Vec<String> = self
                    .path
                    .iter()
                    .map(|&p| self.engine.graph.nodes[p].id.clone())
                    .collect();
                ids.push(self.engine.graph.nodes[v].id.clone());
                self.found.push(ids);
                continue;
            }
            self.path.push(v);
            self.on_path[v] = true;
            self.descend(v);
            self.on_path[v] = false;
            self.path.pop();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
