//! Relation scoring and candidate generation properties.
//!
//! Every admitted candidate must clear the threshold, keep dated endpoints
//! in chronological order, and stay inside the look-ahead window.

use chronicle_core::candidates::window_pairs;
use chronicle_core::score::PreparedEvent;
use chronicle_core::{
    CandidateGenerator, EngineConfig, Event, Heuristics, RelationScorer, RelationType,
    SourceContext,
};
use proptest::prelude::*;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const CATEGORIES: &[&str] = &["politics", "economy", "technology", "general", "sports"];
const PHRASES: &[&str] = &[
    "",
    "As a result, ",
    "Meanwhile, ",
    "Based on this, ",
    "その後、",
    "Similarly, ",
    "It depends on ",
];
const PEOPLE: &[&str] = &["Sato", "Ito", "Kato", "Mori"];

fn arb_event(index: usize) -> impl Strategy<Value = Event> {
    (
        0..CATEGORIES.len(),
        0..PHRASES.len(),
        proptest::collection::vec(0..PEOPLE.len(), 0..3),
        proptest::option::of((2000_i32..2003, 1_u32..13, 1_u32..29)),
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
    (1_usize..12).prop_flat_map(|n| (0..n).map(arb_event).collect::<Vec<_>>())
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn candidates_respect_threshold_order_and_window(
        events in arb_events(),
        threshold in 0.0_f64..=1.0,
        window in 1_usize..5,
    ) {
        let heuristics = Heuristics::default();
        let context = SourceContext::default();
        let config = EngineConfig::default()
            .with_threshold(threshold)
            .with_window(window);
        let edges = CandidateGenerator::new(&heuristics, &context, &config)
            .generate(&events)
            .unwrap();

        let position: HashMap<&str, usize> = events
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.as_str(), i))
            .collect();

        for edge in &edges {
            prop_assert!(edge.relation_strength >= threshold);
            prop_assert!((0.0..=1.0).contains(&edge.relation_strength));

            let s = position[edge.source_id.as_str()];
            let t = position[edge.target_id.as_str()];
            prop_assert!(s < t && t <= s + window);

            let sd = events[s].resolved_date().unwrap();
            let td = events[t].resolved_date().unwrap();
            if let (Some(a), Some(b)) = (sd, td) {
                prop_assert!(a.date <= b.date);
                prop_assert_eq!(edge.time_gap_days, Some(a.days_until(&b)));
            } else {
                prop_assert_eq!(edge.time_gap_days, None);
            }
        }
    }

    #[test]
    fn scoring_is_deterministic(a in arb_event(0), b in arb_event(1)) {
        let heuristics = Heuristics::default();
        let scorer = RelationScorer::new(&heuristics, 0.0);
        let pa = PreparedEvent::new(&a).unwrap();
        let pb = PreparedEvent::new(&b).unwrap();
        prop_assert_eq!(scorer.assess(&pa, &pb), scorer.assess(&pa, &pb));
    }

    #[test]
    fn affinity_lookup_is_symmetric(a in 0..CATEGORIES.len(), b in 0..CATEGORIES.len()) {
        let heuristics = Heuristics::default();
        let forward = heuristics.affinity.lookup(CATEGORIES[a], CATEGORIES[b]);
        let backward = heuristics.affinity.lookup(CATEGORIES[b], CATEGORIES[a]);
        prop_assert!((forward - backward).abs() < f64::EPSILON);
    }
}

// ---------------------------------------------------------------------------
// Regressions
// ---------------------------------------------------------------------------

#[test]
fn japanese_causal_marker_yields_strong_causal_candidate() {
    let events = vec![
        Event::new("a", "日銀が利上げを決定")
            .with_date("2024-03-19")
            .with_category("economy")
            .with_people(["植田"]),
        Event::new("b", "円相場が上昇")
            .with_description("その結果、円高が進んだ。")
            .with_date("2024-03-20")
            .with_category("economy")
            .with_people(["植田"]),
    ];
    let heuristics = Heuristics::default();
    let context = SourceContext::new("日銀が利上げを決定した。その結果、円相場が上昇した。");
    let edges = CandidateGenerator::new(&heuristics, &context, &EngineConfig::default())
        .generate(&events)
        .unwrap();

    assert_eq!(edges.len(), 1);
    let edge = &edges[0];
    assert_eq!(edge.relation_type, RelationType::Causal);
    assert!(edge.relation_strength >= 0.85);
    assert_eq!(edge.time_gap_days, Some(1));
    assert_eq!(edge.evidence_sentences, ["その結果、円相場が上昇した"]);
}

#[test]
fn full_window_equals_all_pairs() {
    let n = 7;
    assert_eq!(window_pairs(n, n).len(), n * (n - 1) / 2);
}
