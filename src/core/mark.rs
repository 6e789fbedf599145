//! Annotated document model.
//!
//! A [`Document`] is one content string plus an ordered list of typed,
//! half-open [`Annotation`] ranges over it. Offsets count `char`s.

use super::ViewType;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    Block,
    Bold,
    Italics,
    Strikethrough,
    Highlighting,
    Link,
    /// Any type a peer sends that this crate does not render. It decodes so
    /// the rest of the document still loads, and carries no markup.
    #[serde(other)]
    Unknown,
}

impl AnnotationType {
    pub fn is_block(self) -> bool {
        matches!(self, AnnotationType::Block)
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnnotationType::Block => "block",
            AnnotationType::Bold => "bold",
            AnnotationType::Italics => "italics",
            AnnotationType::Strikethrough => "strikethrough",
            AnnotationType::Highlighting => "highlighting",
            AnnotationType::Link => "link",
            AnnotationType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Type-specific attributes. Blocks carry `level` and `viewType`, links carry
/// `href`; everything else carries nothing.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_type: Option<ViewType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl Attributes {
    pub fn is_empty(&self) -> bool {
        self.level.is_none() && self.view_type.is_none() && self.href.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: AnnotationType,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl Annotation {
    pub fn new(kind: AnnotationType, start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            kind,
            attributes: Attributes::default(),
        }
    }

    pub fn block(start: usize, end: usize, level: usize, view_type: ViewType) -> Self {
        Self {
            start,
            end,
            kind: AnnotationType::Block,
            attributes: Attributes {
                level: Some(level),
                view_type: Some(view_type),
                href: None,
            },
        }
    }

    pub fn link(start: usize, end: usize, href: impl Into<String>) -> Self {
        Self {
            start,
            end,
            kind: AnnotationType::Link,
            attributes: Attributes {
                href: Some(href.into()),
                ..Attributes::default()
            },
        }
    }

    pub fn is_block(&self) -> bool {
        self.kind.is_block()
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether `other` lies entirely within this annotation's range.
    pub fn contains(&self, other: &Annotation) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Same annotation moved by `delta` characters (may be negative).
    pub fn offset_by(&self, delta: isize) -> Self {
        let mut moved = self.clone();
        moved.start = self.start.saturating_add_signed(delta);
        moved.end = self.end.saturating_add_signed(delta);
        moved
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Violation {
    /// `start > end` or `end` past the content.
    OutOfBounds { index: usize, start: usize, end: usize },
    /// Two block annotations overlap or appear out of document order.
    BlocksOverlap { index: usize, previous_end: usize },
    /// Content between `start` and `end` is covered by no block.
    Uncovered { start: usize, end: usize },
    /// A non-block annotation that fits in no block.
    Uncontained { index: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::OutOfBounds { index, start, end } => {
                write!(f, "annotation {index} [{start}, {end}) is out of bounds")
            }
            Violation::BlocksOverlap {
                index,
                previous_end,
            } => write!(
                f,
                "block {index} starts before the previous block ends at {previous_end}"
            ),
            Violation::Uncovered { start, end } => {
                write!(f, "content [{start}, {end}) is not covered by any block")
            }
            Violation::Uncontained { index } => {
                write!(f, "annotation {index} is not contained in any block")
            }
        }
    }
}

impl Document {
    pub fn new(content: impl Into<String>, annotations: Vec<Annotation>) -> Self {
        Self {
            content: content.into(),
            annotations,
        }
    }

    /// Content length in characters, the unit every offset uses.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Returns an iterator over block annotations in order (lazy, no allocation).
    pub fn blocks(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(|a| a.is_block())
    }

    pub fn inline_annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(|a| !a.is_block())
    }

    /// Slices `content` by character offsets, clamping to the content.
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.content
            .chars()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect()
    }

    /// Every breach of the document invariants: bounds, block partitioning
    /// and inline containment.
    pub fn violations(&self) -> Vec<Violation> {
        let len = self.char_len();
        let mut violations = Vec::new();

        for (index, annotation) in self.annotations.iter().enumerate() {
            if annotation.start > annotation.end || annotation.end > len {
                violations.push(Violation::OutOfBounds {
                    index,
                    start: annotation.start,
                    end: annotation.end,
                });
            }
        }

        let mut cursor = 0usize;
        for (index, block) in self.annotations.iter().enumerate() {
            if !block.is_block() {
                continue;
            }
            if block.start < cursor {
                violations.push(Violation::BlocksOverlap {
                    index,
                    previous_end: cursor,
                });
            } else if block.start > cursor {
                violations.push(Violation::Uncovered {
                    start: cursor,
                    end: block.start,
                });
            }
            cursor = cursor.max(block.end);
        }
        if cursor < len {
            violations.push(Violation::Uncovered {
                start: cursor,
                end: len,
            });
        }

        for (index, annotation) in self.annotations.iter().enumerate() {
            if annotation.is_block() {
                continue;
            }
            if !self.blocks().any(|block| block.contains(annotation)) {
                violations.push(Violation::Uncontained { index });
            }
        }

        violations
    }

    pub fn is_valid(&self) -> bool {
        self.violations().is_empty()
    }
}
