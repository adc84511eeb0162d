#![no_main]

use chronicle_core::EngineConfig;
use chronicle_core::model::EventBatch;
use chronicle_graph::{GraphBuilder, verify};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(batch) = serde_json::from_slice::<EventBatch>(data) else {
        return;
    };
    let (title, text, events) = batch.into_parts();
    let config = EngineConfig::default().with_max_events(64).with_window(8);
    let threshold = config.relation_threshold;
    let builder = GraphBuilder::new(config)
        .with_title(title.unwrap_or_default())
        .with_text(text.unwrap_or_default());

    // Invalid input must surface as an error, never a panic.
    if let Ok(construction) = builder.build(&events) {
        let violations = verify(&construction.graph, threshold);
        assert!(violations.is_empty(), "{violations:?}");
    }
});
