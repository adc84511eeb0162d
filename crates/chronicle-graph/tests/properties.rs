//! Property tests over constructed graphs.
//!
//! Random event lists exercise the full builder; random candidate sets,
//! which may contain arbitrary cycles, exercise the graph stages directly.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{TimeZone, Utc};
use chronicle_core::model::{Edge, Event, RelationType, TimelineGraph};
use chronicle_core::EngineConfig;
use chronicle_graph::graph::{RelationGraph, is_acyclic, resolve_cycles};
use chronicle_graph::{GraphBuilder, verify};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

const CATEGORIES: &[&str] = &["politics", "economy", "technology", "general"];
const PHRASES: &[&str] = &[
    "",
    "As a result, ",
    "Meanwhile, ",
    "Based on this, ",
    "その結果、",
    "It depends on ",
    "Subsequently, ",
];
const PEOPLE: &[&str] = &["Sato", "Ito", "Kato"];

fn arb_event(index: usize) -> impl Strategy<Value = Event> {
    (
        0..CATEGORIES.len(),
        0..PHRASES.len(),
        proptest::collection::vec(0..PEOPLE.len(), 0..3),
        proptest::option::of((2000_i32..2002, 1_u32..13, 1_u32..29)),
    )
        .prop_map(move |(cat, phrase, people, date)| {
            let mut event = Event::new(format!("e{index}"), format!("Event {index}"))
                .with_description(format!("{}something happened", PHRASES[phrase]))
                .with_category(CATEGORIES[cat])
                .with_people(people.into_iter().map(|p| PEOPLE[p]));
            if let Some((y, m, d)) = date {
                event = event.with_date(format!("{y:04}-{m:02}-{d:02}"));
            }
            event
        })
}

fn arb_events() -> impl Strategy<Value = Vec<Event>> {
    (1_usize..16).prop_flat_map(|n| (0..n).map(arb_event).collect::<Vec<_>>())
}

/// Undated nodes plus a random, possibly cyclic, candidate set.
fn arb_candidates() -> impl Strategy<Value = (Vec<Event>, Vec<Edge>)> {
    (2_usize..9).prop_flat_map(|n| {
        proptest::collection::vec((0..n, 0..n, 50_u32..=100), 0..(n * 3)).prop_map(move |raw| {
            let events: Vec<Event> = (0..n)
                .map(|i| Event::new(format!("n{i}"), format!("N{i}")))
                .collect();
            let mut seen = HashSet::new();
            let edges = raw
                .into_iter()
                .filter(|&(s, t, _)| s != t && seen.insert((s, t)))
                .map(|(s, t, w)| {
                    Edge::new(
                        format!("n{s}"),
                        format!("n{t}"),
                        RelationType::Causal,
                        f64::from(w) / 100.0,
                    )
                })
                .collect();
            (events, edges)
        })
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `true` if `to` is reachable from `from` without using the direct edge.
fn reachable_without_direct(graph: &TimelineGraph, from: &str, to: &str) -> bool {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &graph.edges {
        if edge.key() != (from, to) {
            adjacency.entry(&edge.source_id).or_default().push(&edge.target_id);
        }
    }
    let mut seen = HashSet::from([from]);
    let mut queue = VecDeque::from([from]);
    while let Some(u) = queue.pop_front() {
        for &v in adjacency.get(u).map_or(&[][..], Vec::as_slice) {
            if v == to {
                return true;
            }
            if seen.insert(v) {
                queue.push_back(v);
            }
        }
    }
    false
}

fn check_graph(graph: &TimelineGraph, threshold: f64) -> Result<(), TestCaseError> {
    let rg = RelationGraph::from_timeline(graph)
        .map_err(|e| TestCaseError::fail(format!("rebuild failed: {e}")))?;
    prop_assert!(is_acyclic(&rg));
    for edge in &graph.edges {
        prop_assert!(edge.relation_strength >= threshold);
        prop_assert!(!reachable_without_direct(graph, &edge.source_id, &edge.target_id));
    }
    let violations = verify(graph, threshold);
    prop_assert!(violations.is_empty(), "violations: {violations:?}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn built_graphs_hold_every_invariant(events in arb_events(), window in 1_usize..6) {
        let config = EngineConfig::default().with_window(window);
        let construction = GraphBuilder::new(config).build(&events).unwrap();
        let graph = &construction.graph;

        check_graph(graph, 0.5)?;

        // Temporal non-regression.
        for edge in &graph.edges {
            let source = graph.node(&edge.source_id).and_then(|n| n.resolved_date());
            let target = graph.node(&edge.target_id).and_then(|n| n.resolved_date());
            if let (Some(s), Some(t)) = (source, target) {
                prop_assert!(s.date <= t.date);
            }
        }

        // Topological consistency.
        for edge in &graph.edges {
            let a = construction.topology.level_of(&edge.source_id);
            let b = construction.topology.level_of(&edge.target_id);
            prop_assert!(a < b, "{} -> {}", edge.source_id, edge.target_id);
        }
    }

    #[test]
    fn arbitrary_candidates_become_a_reduced_dag((events, edges) in arb_candidates()) {
        let candidates = edges.len();
        let construction = GraphBuilder::default()
            .finish_from_candidates(&events, edges)
            .unwrap();
        let graph = &construction.graph;

        check_graph(graph, 0.5)?;
        prop_assert_eq!(
            construction.report.candidate_count,
            graph.edges.len()
                + construction.report.cycles_broken.len()
                + construction.report.transitive_removed.len()
        );
        prop_assert_eq!(construction.report.candidate_count, candidates);
        prop_assert_eq!(graph.stats.cyclic_count, construction.report.cycles_broken.len());
    }

    #[test]
    fn resolving_twice_changes_nothing((events, edges) in arb_candidates()) {
        let nodes: Vec<_> = events
            .iter()
            .map(|e| chronicle_core::Node::from_event(e).unwrap())
            .collect();
        let mut rg = RelationGraph::from_parts(&nodes, edges).unwrap();
        resolve_cycles(&mut rg);
        let before: Vec<Edge> = rg.edges_in_order().into_iter().cloned().collect();

        let second = resolve_cycles(&mut rg);
        prop_assert_eq!(second.cycles_broken(), 0);
        let after: Vec<Edge> = rg.edges_in_order().into_iter().cloned().collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn sequential_and_parallel_builds_agree(events in arb_events()) {
        let at = Utc.timestamp_opt(0, 0).unwrap();
        let sequential = GraphBuilder::default()
            .with_generated_at(at)
            .build(&events)
            .unwrap();
        let parallel = GraphBuilder::new(EngineConfig::default().with_workers(3))
            .with_generated_at(at)
            .build(&events)
            .unwrap();
        prop_assert_eq!(sequential.graph, parallel.graph);
    }
}
