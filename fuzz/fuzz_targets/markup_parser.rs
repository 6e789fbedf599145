#![no_main]

use libfuzzer_sys::fuzz_target;
use outline_sync::doc::{BoundaryRule, parse, serialize_with_rule};

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    let parsed = parse(&input);
    let len = parsed.char_len();
    for annotation in &parsed.annotations {
        assert!(annotation.start <= annotation.end && annotation.end <= len);
    }
    let _ = serialize_with_rule(&parsed.content, &parsed.annotations, BoundaryRule::Nesting);
    let _ = serialize_with_rule(&parsed.content, &parsed.annotations, BoundaryRule::Legacy);
});
