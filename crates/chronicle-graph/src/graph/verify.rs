//! Post-construction checks over a finished graph.
//!
//! [`verify`] re-derives every structural guarantee of a built graph and
//! reports each breach it finds instead of stopping at the first one.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::NaiveDate;
use petgraph::visit::EdgeRef;
use serde::Serialize;

use chronicle_core::model::{Edge, Node, TimelineGraph};

use crate::graph::build::RelationGraph;
use crate::graph::cycles::find_cycle;
use crate::graph::reduce::descendants;
use crate::graph::stats::graph_stats;
use crate::graph::topology::analyze;

/// One broken guarantee.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    DuplicateNode { id: String },
    SelfLoop { id: String },
    DanglingEdge { source_id: String, target_id: String },
    DuplicateEdge { source_id: String, target_id: String },
    BelowThreshold {
        source_id: String,
        target_id: String,
        strength: f64,
        threshold: f64,
    },
    StrengthOutOfRange {
        source_id: String,
        target_id: String,
        strength: f64,
    },
    TemporalRegression { source_id: String, target_id: String },
    Cycle { nodes: Vec<String> },
    RedundantEdge { source_id: String, target_id: String },
    LevelOrder { source_id: String, target_id: String },
    StatsMismatch {
        field: String,
        expected: String,
        actual: String,
    },
    ParentFlag { id: String, expected: bool },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNode { id } => write!(f, "node id '{id}' appears more than once"),
            Self::SelfLoop { id } => write!(f, "self-loop on '{id}'"),
            Self::DanglingEdge {
                source_id,
                target_id,
            } => write!(f, "edge {source_id} -> {target_id} references a missing node"),
            Self::DuplicateEdge {
                source_id,
                target_id,
            } => write!(f, "edge {source_id} -> {target_id} appears more than once"),
            Self::BelowThreshold {
                source_id,
                target_id,
                strength,
                threshold,
            } => write!(
                f,
                "edge {source_id} -> {target_id} strength {strength} is below threshold {threshold}"
            ),
            Self::StrengthOutOfRange {
                source_id,
                target_id,
                strength,
            } => write!(
                f,
                "edge {source_id} -> {target_id} strength {strength} is outside [0, 1]"
            ),
            Self::TemporalRegression {
                source_id,
                target_id,
            } => write!(f, "edge {source_id} -> {target_id} points back in time"),
            Self::Cycle { nodes } => write!(f, "cycle through {}", nodes.join(" -> ")),
            Self::RedundantEdge {
                source_id,
                target_id,
            } => write!(
                f,
                "edge {source_id} -> {target_id} is implied by a longer path"
            ),
            Self::LevelOrder {
                source_id,
                target_id,
            } => write!(
                f,
                "edge {source_id} -> {target_id} does not go to a later level"
            ),
            Self::StatsMismatch {
                field,
                expected,
                actual,
            } => write!(f, "stats.{field} is {actual}, expected {expected}"),
            Self::ParentFlag { id, expected } => {
                write!(f, "node '{id}' is_parent should be {expected}")
            }
        }
    }
}

/// Check `graph` against every construction guarantee for `threshold`.
///
/// Returns an empty list for a well-formed graph.
#[must_use]
pub fn verify(graph: &TimelineGraph, threshold: f64) -> Vec<Violation> {
    let mut violations = Vec::new();

    // --- Nodes ---
    let mut nodes: Vec<Node> = Vec::with_capacity(graph.nodes.len());
    let mut dates: HashMap<&str, Option<NaiveDate>> = HashMap::new();
    for node in &graph.nodes {
        if dates.contains_key(node.id.as_str()) {
            violations.push(Violation::DuplicateNode {
                id: node.id.clone(),
            });
            continue;
        }
        dates.insert(&node.id, node.resolved_date().map(|d| d.date));
        nodes.push(node.clone());
    }

    // --- Edges ---
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut valid: Vec<Edge> = Vec::with_capacity(graph.edges.len());
    for edge in &graph.edges {
        let (s, t) = edge.key();
        let pair = || (s.to_string(), t.to_string());

        if s == t {
            violations.push(Violation::SelfLoop { id: s.to_string() });
            continue;
        }
        let (Some(sd), Some(td)) = (dates.get(s), dates.get(t)) else {
            let (source_id, target_id) = pair();
            violations.push(Violation::DanglingEdge {
                source_id,
                target_id,
            });
            continue;
        };
        if !seen.insert((s, t)) {
            let (source_id, target_id) = pair();
            violations.push(Violation::DuplicateEdge {
                source_id,
                target_id,
            });
            continue;
        }

        let strength = edge.relation_strength;
        if !(0.0..=1.0).contains(&strength) {
            let (source_id, target_id) = pair();
            violations.push(Violation::StrengthOutOfRange {
                source_id,
                target_id,
                strength,
            });
        } else if strength < threshold {
            let (source_id, target_id) = pair();
            violations.push(Violation::BelowThreshold {
                source_id,
                target_id,
                strength,
                threshold,
            });
        }
        if let (Some(a), Some(b)) = (sd, td) {
            if a > b {
                let (source_id, target_id) = pair();
                violations.push(Violation::TemporalRegression {
                    source_id,
                    target_id,
                });
            }
        }
        valid.push(edge.clone());
    }

    // --- Structure ---
    let Ok(rg) = RelationGraph::from_parts(&nodes, valid) else {
        return violations;
    };
    check_structure(&rg, graph, &mut violations);
    violations
}

fn check_structure(rg: &RelationGraph, graph: &TimelineGraph, violations: &mut Vec<Violation>) {
    if let Some(cycle) = find_cycle(rg) {
        let nodes = cycle
            .iter()
            .filter_map(|&e| rg.graph.edge_endpoints(e))
            .map(|(s, _)| rg.node_id(s).to_string())
            .collect();
        violations.push(Violation::Cycle { nodes });
        return;
    }

    if let Ok(reach) = descendants(rg) {
        for e in rg.graph.edge_references() {
            let (u, v) = (e.source(), e.target());
            let redundant = rg
                .graph
                .neighbors(u)
                .filter(|&w| w != v)
                .any(|w| reach[w.index()].contains(v.index()));
            if redundant {
                violations.push(Violation::RedundantEdge {
                    source_id: rg.node_id(u).to_string(),
                    target_id: rg.node_id(v).to_string(),
                });
            }
        }
    }

    let Ok(topology) = analyze(rg) else {
        return;
    };
    for edge in rg.edges_in_order() {
        let (s, t) = edge.key();
        if topology.level_of(s) >= topology.level_of(t) {
            violations.push(Violation::LevelOrder {
                source_id: s.to_string(),
                target_id: t.to_string(),
            });
        }
    }

    let expected = graph_stats(
        graph.nodes.len(),
        graph.edges.len(),
        topology.max_path_length,
        graph.stats.cyclic_count,
    );
    let mut compare = |field: &str, expected: String, actual: String| {
        if expected != actual {
            violations.push(Violation::StatsMismatch {
                field: field.to_string(),
                expected,
                actual,
            });
        }
    };
    let actual = &graph.stats;
    compare(
        "node_count",
        expected.node_count.to_string(),
        actual.node_count.to_string(),
    );
    compare(
        "edge_count",
        expected.edge_count.to_string(),
        actual.edge_count.to_string(),
    );
    compare(
        "avg_degree",
        format!("{:.3}", expected.avg_degree),
        format!("{:.3}", actual.avg_degree),
    );
    compare(
        "max_path_length",
        expected.max_path_length.to_string(),
        actual.max_path_length.to_string(),
    );

    let parents: HashSet<&str> = graph
        .edges
        .iter()
        .filter(|e| e.relation_type.is_lineage())
        .map(|e| e.source_id.as_str())
        .collect();
    for node in &graph.nodes {
        let expected = parents.contains(node.id.as_str());
        if node.is_parent != expected {
            violations.push(Violation::ParentFlag {
                id: node.id.clone(),
                expected,
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
