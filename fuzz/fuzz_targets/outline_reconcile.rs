#![no_main]

use libfuzzer_sys::fuzz_target;
use outline_sync::config::SyncConfig;
use outline_sync::core::{OutlineNode, OutlineTree, ViewType, flatten};
use outline_sync::sync::{MemoryHost, apply_document, to_document};

/// Builds an outline from byte pairs: the first byte picks a depth relative to
/// the previous node, the second a short text.
fn outline(data: &[u8]) -> Vec<OutlineNode> {
    let mut roots: Vec<OutlineNode> = Vec::new();
    let mut depth = 0usize;
    for (i, pair) in data.chunks(2).enumerate() {
        depth = match pair[0] % 3 {
            0 => 0,
            1 => depth.saturating_sub(1),
            _ => depth + 1,
        };
        let text = format!("{}", pair.get(1).copied().unwrap_or(0) % 16);
        push_at_depth(&mut roots, depth, OutlineNode::new(format!("n{i}"), text));
        depth = depth.min(rightmost_depth(&roots));
    }
    roots
}

fn push_at_depth(nodes: &mut Vec<OutlineNode>, depth: usize, node: OutlineNode) {
    match nodes.last_mut() {
        Some(last) if depth > 0 => push_at_depth(&mut last.children, depth - 1, node),
        _ => nodes.push(node),
    }
}

fn rightmost_depth(nodes: &[OutlineNode]) -> usize {
    match nodes.last() {
        Some(last) if !last.children.is_empty() => 1 + rightmost_depth(&last.children),
        _ => 0,
    }
}

fn shape(nodes: &[OutlineNode]) -> Vec<(String, usize)> {
    flatten(nodes).into_iter().map(|e| (e.text, e.level)).collect()
}

fuzz_target!(|data: &[u8]| {
    let split = data.len() / 2;
    let source = outline(&data[..split]);
    let target = outline(&data[split..]);

    let document = to_document(&source, ViewType::Bullet);
    let host = MemoryHost::with_tree("page", OutlineTree::new("root").with_children(target));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let config = SyncConfig::default();

    // One pass converges on the source shape and a second pass touches nothing.
    runtime
        .block_on(apply_document(&host, "page", &document, &config))
        .unwrap();
    let tree = host.tree("page").unwrap();
    assert_eq!(shape(&tree.children), shape(&source));

    host.clear_mutations().unwrap();
    runtime
        .block_on(apply_document(&host, "page", &document, &config))
        .unwrap();
    assert!(host.mutations().unwrap().is_empty());
});
