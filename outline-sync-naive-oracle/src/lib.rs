//! A naive, simple oracle implementation for differential testing.
//!
//! Everything here walks trees with an explicit stack and recomputes offsets
//! from the accumulated content instead of tracking them incrementally.
use outline_sync::core::mark::{Annotation, Document};
use outline_sync::core::{FlatEntry, OutlineNode, ViewType};
use outline_sync::doc::parse;

/// Pre-order flattening with an explicit stack.
pub fn flatten(nodes: &[OutlineNode]) -> Vec<FlatEntry> {
    let mut out = Vec::new();
    let mut stack: Vec<(&OutlineNode, usize)> = nodes.iter().rev().map(|n| (n, 1)).collect();
    while let Some((node, level)) = stack.pop() {
        out.push(FlatEntry {
            id: node.id.clone(),
            text: node.text.clone(),
            level,
        });
        for child in node.children.iter().rev() {
            stack.push((child, level + 1));
        }
    }
    out
}

/// Forward conversion. Offsets are recounted from the content built so far.
pub fn to_document(nodes: &[OutlineNode], view_type: ViewType) -> Document {
    let mut content = String::new();
    let mut annotations = Vec::new();
    let mut stack: Vec<(&OutlineNode, usize, ViewType)> =
        nodes.iter().rev().map(|n| (n, 1, view_type)).collect();

    while let Some((node, level, view)) = stack.pop() {
        let parsed = parse(&node.text);
        let start = content.chars().count();
        content.push_str(&parsed.content);
        let end = content.chars().count();

        annotations.push(Annotation::block(start, end, level, view));
        for annotation in parsed.annotations {
            let mut global = annotation.clone();
            global.start = annotation.start + start;
            global.end = annotation.end + start;
            annotations.push(global);
        }

        let child_view = node.view_type.unwrap_or(view);
        for child in node.children.iter().rev() {
            stack.push((child, level + 1, child_view));
        }
    }

    Document {
        content,
        annotations,
    }
}

/// Builds the tree a host ends up with when `(text, level)` blocks are
/// created in order, each under the nearest earlier block of smaller level.
/// Node ids are `n0`, `n1`, ... in block order.
pub fn build_tree(blocks: &[(String, usize)]) -> Vec<OutlineNode> {
    let mut roots: Vec<OutlineNode> = Vec::new();
    // Levels of the open ancestors; they always lie on the rightmost path.
    let mut open: Vec<usize> = Vec::new();

    for (i, (text, level)) in blocks.iter().enumerate() {
        while open.last().is_some_and(|l| l >= level) {
            open.pop();
        }
        push_at_depth(
            &mut roots,
            open.len(),
            OutlineNode::new(format!("n{i}"), text.clone()),
        );
        open.push(*level);
    }
    roots
}

fn push_at_depth(nodes: &mut Vec<OutlineNode>, depth: usize, node: OutlineNode) {
    if depth == 0 {
        nodes.push(node);
        return;
    }
    match nodes.last_mut() {
        Some(last) => push_at_depth(&mut last.children, depth - 1, node),
        None => nodes.push(node),
    }
}
