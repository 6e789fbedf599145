//! Conversion between outline trees and annotated documents.
//!
//! Forward: every node contributes its own parsed text to the document,
//! covered by exactly one `block` annotation, followed by its descendants.
//! Reverse: [`expected_blocks`] turns a document back into the ordered list
//! of blocks a tree must converge to, and [`reconcile`] drives a host there.

use crate::core::mark::{Annotation, AnnotationType, Document};
use crate::core::{OutlineNode, OutlineTree, ROOT_CHILD_LEVEL, ViewType};
use crate::doc::mark_ops::{clamp_to, containing_block, to_block_local, to_global};
use crate::doc::{self, BoundaryRule};
use tracing::{debug, warn};

pub mod host;
pub mod reconcile;

pub use host::{HostError, MemoryHost, MutationRecord, OutlineHost};
pub use reconcile::{
    Mutation, ParentRef, ReconcileError, ReconcileReport, Stage, apply_document, apply_plan, plan,
};

/// Converts root children into a document. `view_type` is the page's view
/// type, inherited by every block that has no closer ancestor overriding it.
pub fn to_document(nodes: &[OutlineNode], view_type: ViewType) -> Document {
    convert_nodes(nodes, ROOT_CHILD_LEVEL, view_type, 0)
}

/// Converts a whole tree snapshot, falling back to `default_view_type` when
/// the page sets none.
pub fn tree_to_document(tree: &OutlineTree, default_view_type: ViewType) -> Document {
    to_document(&tree.children, tree.view_type.unwrap_or(default_view_type))
}

/// Converts `nodes` sitting at `level`, placing their content at
/// `start_offset` in the enclosing document.
pub fn convert_nodes(
    nodes: &[OutlineNode],
    level: usize,
    view_type: ViewType,
    start_offset: usize,
) -> Document {
    let mut builder = DocumentBuilder {
        content: String::new(),
        offset: start_offset,
        annotations: Vec::new(),
    };
    builder.append(nodes, level, view_type);
    Document {
        content: builder.content,
        annotations: builder.annotations,
    }
}

struct DocumentBuilder {
    content: String,
    offset: usize,
    annotations: Vec<Annotation>,
}

impl DocumentBuilder {
    fn append(&mut self, nodes: &[OutlineNode], level: usize, view_type: ViewType) {
        for node in nodes {
            let parsed = doc::parse(&node.text);
            let start = self.offset;
            let end = start + parsed.char_len();
            self.annotations
                .push(Annotation::block(start, end, level, view_type));
            self.annotations
                .extend(to_global(parsed.annotations, start));
            self.content.push_str(&parsed.content);
            self.offset = end;

            let child_view = node.view_type.unwrap_or(view_type);
            self.append(&node.children, level + 1, child_view);
        }
    }
}

/// One block a tree should contain after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedBlock {
    /// Rendered markup text for the node.
    pub text: String,
    pub level: usize,
    /// Block range in document coordinates.
    pub start: usize,
    pub end: usize,
    /// Inline annotations attached to this block, in document coordinates.
    pub annotations: Vec<Annotation>,
}

impl ExpectedBlock {
    /// A block with rendered `text` at `level` and no source range.
    pub fn new(text: impl Into<String>, level: usize) -> Self {
        Self {
            text: text.into(),
            level,
            start: 0,
            end: 0,
            annotations: Vec::new(),
        }
    }
}

/// Reconstructs the blocks a document describes, in document order, with
/// their inline annotations rendered back into markup.
pub fn expected_blocks(document: &Document, rule: BoundaryRule) -> Vec<ExpectedBlock> {
    let mut blocks = reconstruct_blocks(document);
    for block in &mut blocks {
        let local = to_block_local(&block.annotations, block.start);
        block.text = doc::serialize_with_rule(&block.text, &local, rule);
    }
    blocks
}

/// Stage one of the reverse direction: block texts are plain content slices
/// and inline annotations are attached to the first block containing them.
pub fn reconstruct_blocks(document: &Document) -> Vec<ExpectedBlock> {
    let len = document.char_len();
    let mut blocks: Vec<ExpectedBlock> = document
        .blocks()
        .map(|annotation| {
            let bounds = clamp_to(annotation, len);
            ExpectedBlock {
                text: document.slice(bounds.start, bounds.end),
                level: annotation
                    .attributes
                    .level
                    .unwrap_or(ROOT_CHILD_LEVEL)
                    .max(ROOT_CHILD_LEVEL),
                start: bounds.start,
                end: bounds.end,
                annotations: Vec::new(),
            }
        })
        .collect();

    let ranges: Vec<(usize, usize)> = blocks.iter().map(|b| (b.start, b.end)).collect();
    let (mut dropped, mut unknown) = (0usize, 0usize);
    for annotation in document.inline_annotations() {
        if annotation.kind == AnnotationType::Unknown {
            unknown += 1;
            continue;
        }
        match containing_block(&ranges, annotation) {
            Some(index) => blocks[index].annotations.push(annotation.clone()),
            None => dropped += 1,
        }
    }
    if unknown > 0 {
        warn!(unknown, "ignored annotations of unrecognised type");
    }
    if dropped > 0 {
        warn!(dropped, "discarded annotations outside every block");
    }
    debug!(blocks = blocks.len(), "reconstructed expected blocks");
    blocks
}
