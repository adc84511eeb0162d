#![no_main]

use std::sync::LazyLock;

use chronicle_core::model::{Edge, Event, RelationType, TimelineGraph};
use chronicle_graph::{GraphBuilder, QueryEngine, QueryRequest};
use libfuzzer_sys::fuzz_target;

static GRAPH: LazyLock<TimelineGraph> = LazyLock::new(|| {
    let events: Vec<Event> = ["a", "b", "c", "d", "e"]
        .into_iter()
        .map(|id| Event::new(id, id))
        .collect();
    let candidates = vec![
        Edge::new("a", "b", RelationType::Causal, 0.9),
        Edge::new("b", "c", RelationType::Prerequisite, 0.7),
        Edge::new("a", "d", RelationType::Derived, 0.6),
        Edge::new("d", "c", RelationType::Dependency, 0.8),
        Edge::new("c", "e", RelationType::Parallel, 0.55),
    ];
    GraphBuilder::default()
        .finish_from_candidates(&events, candidates)
        .unwrap()
        .graph
});

fuzz_target!(|data: &[u8]| {
    let Ok(request) = serde_json::from_slice::<QueryRequest>(data) else {
        return;
    };
    let engine = QueryEngine::new(&GRAPH);
    if let Ok(response) = engine.execute(&request) {
        if let Some(max) = request.max_results {
            assert!(response.result.len() <= max.max(1));
        }
    }
});
