//! Offset operations on annotations.
//!
//! This module provides the arithmetic the codec and the reconciler share:
//! shifting annotation bounds around inserted markers, and moving annotations
//! between block-local and document coordinates.

use crate::core::mark::{Annotation, AnnotationType};
use serde::{Deserialize, Serialize};

/// How a later annotation's bounds move when markers are inserted around an
/// earlier one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryRule {
    /// Ties at a shared boundary are broken by nesting: an annotation inside
    /// the applied one stays inside its markers, one enclosing it stays outside.
    #[default]
    Nesting,
    /// Historic rule: starts shift by the prefix at `>= start` and by the
    /// suffix at `>= end`; ends shift by the prefix at `>= start` and by the
    /// suffix at `> end`.
    Legacy,
}

/// Markup inserted before and after an annotated range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub prefix: String,
    pub suffix: String,
}

impl Markers {
    pub fn for_annotation(annotation: &Annotation) -> Self {
        let (prefix, suffix) = match annotation.kind {
            AnnotationType::Bold => ("**".to_string(), "**".to_string()),
            AnnotationType::Italics => ("__".to_string(), "__".to_string()),
            AnnotationType::Highlighting => ("^^".to_string(), "^^".to_string()),
            AnnotationType::Strikethrough => ("~~".to_string(), "~~".to_string()),
            AnnotationType::Link => {
                let href = annotation.attributes.href.as_deref().unwrap_or_default();
                ("[".to_string(), format!("]({href})"))
            }
            AnnotationType::Block | AnnotationType::Unknown => (String::new(), String::new()),
        };
        Self { prefix, suffix }
    }

    pub fn prefix_len(&self) -> usize {
        self.prefix.chars().count()
    }

    pub fn suffix_len(&self) -> usize {
        self.suffix.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_empty()
    }
}

/// Moves `target`'s bounds past the markers just inserted around `applied`.
///
/// `applied` is in the coordinates before insertion; `target` is updated in
/// place into the coordinates after insertion.
pub fn shift_for_markers(
    target: &mut Annotation,
    applied: &Annotation,
    prefix_len: usize,
    suffix_len: usize,
    rule: BoundaryRule,
) {
    let (start, end) = (target.start, target.end);
    let (start_delta, end_delta) = match rule {
        BoundaryRule::Legacy => (
            gain(start >= applied.start, prefix_len) + gain(start >= applied.end, suffix_len),
            gain(end >= applied.start, prefix_len) + gain(end > applied.end, suffix_len),
        ),
        BoundaryRule::Nesting => {
            let nested = end <= applied.end;
            let encloses = start < applied.start;
            (
                gain(
                    start > applied.start || (start == applied.start && nested),
                    prefix_len,
                ) + gain(start >= applied.end, suffix_len),
                gain(end > applied.start, prefix_len)
                    + gain(end > applied.end || (end == applied.end && encloses), suffix_len),
            )
        }
    };
    target.start = start + start_delta;
    target.end = end + end_delta;
}

fn gain(condition: bool, len: usize) -> usize {
    if condition { len } else { 0 }
}

/// Re-expresses document-level annotations relative to a block starting at
/// `block_start`.
pub fn to_block_local(annotations: &[Annotation], block_start: usize) -> Vec<Annotation> {
    let delta = -(block_start as isize);
    annotations.iter().map(|a| a.offset_by(delta)).collect()
}

/// Re-expresses block-local annotations in document coordinates.
pub fn to_global(annotations: Vec<Annotation>, block_start: usize) -> Vec<Annotation> {
    annotations
        .into_iter()
        .map(|mut a| {
            a.start += block_start;
            a.end += block_start;
            a
        })
        .collect()
}

/// Clamps bounds into `0..=len` and orders them.
pub fn clamp_to(annotation: &Annotation, len: usize) -> Annotation {
    let mut clamped = annotation.clone();
    clamped.end = annotation.end.min(len);
    clamped.start = annotation.start.min(clamped.end);
    clamped
}

/// Index of the first range in `blocks` that fully contains `annotation`.
pub fn containing_block(blocks: &[(usize, usize)], annotation: &Annotation) -> Option<usize> {
    blocks
        .iter()
        .position(|&(start, end)| start <= annotation.start && annotation.end <= end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold(start: usize, end: usize) -> Annotation {
        Annotation::new(AnnotationType::Bold, start, end)
    }

    fn shifted(target: (usize, usize), applied: (usize, usize), rule: BoundaryRule) -> (usize, usize) {
        let mut t = bold(target.0, target.1);
        shift_for_markers(&mut t, &bold(applied.0, applied.1), 2, 2, rule);
        (t.start, t.end)
    }

    #[test]
    fn test_markers_for_link_include_href() {
        let markers = Markers::for_annotation(&Annotation::link(0, 1, "x"));
        assert_eq!(markers.prefix, "[");
        assert_eq!(markers.suffix, "](x)");
        assert_eq!(markers.suffix_len(), 4);
    }

    #[test]
    fn test_block_and_unknown_markers_are_empty() {
        let block = Annotation::new(AnnotationType::Block, 0, 3);
        assert!(Markers::for_annotation(&block).is_empty());
        let unknown = Annotation::new(AnnotationType::Unknown, 0, 3);
        assert!(Markers::for_annotation(&unknown).is_empty());
    }

    #[test]
    fn test_shift_after_applied() {
        for rule in [BoundaryRule::Nesting, BoundaryRule::Legacy] {
            assert_eq!(shifted((6, 11), (0, 5), rule), (10, 15));
            assert_eq!(shifted((5, 8), (0, 5), rule), (9, 12));
        }
    }

    #[test]
    fn test_shift_before_applied() {
        assert_eq!(shifted((0, 2), (4, 6), BoundaryRule::Nesting), (0, 2));
        assert_eq!(shifted((0, 2), (4, 6), BoundaryRule::Legacy), (0, 2));
    }

    #[test]
    fn test_nested_target_stays_inside_markers() {
        // target [1,3) inside applied [0,3): "abc" -> "**abc**", target "bc" at [3,5)
        assert_eq!(shifted((1, 3), (0, 3), BoundaryRule::Nesting), (3, 5));
        assert_eq!(shifted((1, 3), (0, 3), BoundaryRule::Legacy), (3, 5));
        // identical range nests inside
        assert_eq!(shifted((0, 3), (0, 3), BoundaryRule::Nesting), (2, 5));
    }

    #[test]
    fn test_enclosing_target_stays_outside_markers() {
        // target [0,4) encloses applied [0,2): "abcd" -> "**ab**cd"
        assert_eq!(shifted((0, 4), (0, 2), BoundaryRule::Nesting), (0, 8));
        // target [0,4) encloses applied [2,4): "abcd" -> "ab**cd**"
        assert_eq!(shifted((0, 4), (2, 4), BoundaryRule::Nesting), (0, 8));
    }

    #[test]
    fn test_legacy_rule_differs_at_shared_boundaries() {
        assert_eq!(shifted((0, 4), (0, 2), BoundaryRule::Legacy), (2, 8));
        assert_eq!(shifted((0, 4), (2, 4), BoundaryRule::Legacy), (0, 6));
        // target ending where applied starts is pulled over the prefix
        assert_eq!(shifted((0, 2), (2, 4), BoundaryRule::Legacy), (0, 4));
        assert_eq!(shifted((0, 2), (2, 4), BoundaryRule::Nesting), (0, 2));
    }

    #[test]
    fn test_local_and_global_coordinates() {
        let local = to_block_local(&[bold(12, 15)], 10);
        assert_eq!((local[0].start, local[0].end), (2, 5));
        let global = to_global(local, 10);
        assert_eq!((global[0].start, global[0].end), (12, 15));
    }

    #[test]
    fn test_containing_block_first_match_wins() {
        let blocks = [(0, 5), (0, 10), (5, 10)];
        assert_eq!(containing_block(&blocks, &bold(1, 3)), Some(0));
        assert_eq!(containing_block(&blocks, &bold(4, 7)), Some(1));
        assert_eq!(containing_block(&blocks, &bold(9, 12)), None);
    }

    #[test]
    fn test_clamp_to() {
        let clamped = clamp_to(&bold(4, 9), 6);
        assert_eq!((clamped.start, clamped.end), (4, 6));
        let clamped = clamp_to(&bold(8, 9), 6);
        assert_eq!((clamped.start, clamped.end), (6, 6));
    }
}
