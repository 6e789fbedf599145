#![no_main]

use libfuzzer_sys::fuzz_target;
use outline_sync::core::mark::Document;
use outline_sync::doc::BoundaryRule;
use outline_sync::sync::expected_blocks;

// Documents arrive from peers, so any decodable payload must be handled.
fuzz_target!(|data: &[u8]| {
    let Ok(document) = serde_json::from_slice::<Document>(data) else {
        return;
    };
    let _ = document.violations();
    for block in expected_blocks(&document, BoundaryRule::Nesting) {
        assert!(block.level >= 1);
        assert!(block.start <= block.end);
    }
});
