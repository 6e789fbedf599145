//! Inline markup codec.
//!
//! Converts raw node text written in the outline markup dialect
//! (`**bold**`, `__italics__`, `^^highlight^^`, `~~strikethrough~~`,
//! `[text](href)`) into plain content with block-local annotations, and back.
//! Parsing never fails: anything that does not form a complete token is kept
//! as literal content.

use crate::core::mark::{Annotation, AnnotationType};
use serde::{Deserialize, Serialize};

pub mod mark_ops;

pub use mark_ops::BoundaryRule;
use mark_ops::{Markers, clamp_to, shift_for_markers};

/// Plain content of one block plus annotations relative to its first character.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parsed {
    pub content: String,
    pub annotations: Vec<Annotation>,
}

impl Parsed {
    /// Content length in characters.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Parses raw markup into content and block-local annotations.
///
/// Outer annotations precede the annotations nested inside them.
pub fn parse(text: &str) -> Parsed {
    let chars: Vec<char> = text.chars().collect();
    let mut builder = ParseBuilder::default();
    parse_span(&chars, &mut builder);
    Parsed {
        content: builder.content,
        annotations: builder.annotations,
    }
}

/// Renders `annotations` over `text` as markup using [`BoundaryRule::Nesting`].
pub fn serialize(text: &str, annotations: &[Annotation]) -> String {
    serialize_with_rule(text, annotations, BoundaryRule::Nesting)
}

/// Renders `annotations` over `text` as markup.
///
/// Annotations are applied in the given order. After each one is wrapped in
/// its markers, every later annotation is shifted by `rule` so that its
/// bounds keep pointing at the same characters.
pub fn serialize_with_rule(text: &str, annotations: &[Annotation], rule: BoundaryRule) -> String {
    let mut buffer: Vec<char> = text.chars().collect();
    let original_len = buffer.len();
    let mut pending: Vec<Annotation> = annotations
        .iter()
        .map(|a| clamp_to(a, original_len))
        .collect();

    for index in 0..pending.len() {
        let applied = clamp_to(&pending[index], buffer.len());
        let markers = Markers::for_annotation(&applied);
        if applied.is_empty() || markers.is_empty() {
            continue;
        }
        let (prefix_len, suffix_len) = (markers.prefix_len(), markers.suffix_len());
        for later in pending.iter_mut().skip(index + 1) {
            shift_for_markers(later, &applied, prefix_len, suffix_len, rule);
        }
        buffer.splice(applied.end..applied.end, markers.suffix.chars());
        buffer.splice(applied.start..applied.start, markers.prefix.chars());
    }

    buffer.into_iter().collect()
}

#[derive(Default)]
struct ParseBuilder {
    content: String,
    len: usize,
    annotations: Vec<Annotation>,
}

impl ParseBuilder {
    fn push(&mut self, c: char) {
        self.content.push(c);
        self.len += 1;
    }

    /// Reserves a slot so the outer annotation lands before nested ones.
    fn open(&mut self, annotation: Annotation) -> usize {
        self.annotations.push(annotation);
        self.annotations.len() - 1
    }

    fn close(&mut self, slot: usize) {
        self.annotations[slot].end = self.len;
    }
}

fn parse_span(input: &[char], out: &mut ParseBuilder) {
    let mut index = 0;
    while index < input.len() {
        if let Some(kind) = delimiter_at(input, index)
            && let Some(close) = find_closing(input, index + 2, input[index])
        {
            let slot = out.open(Annotation::new(kind, out.len, out.len));
            parse_span(&input[index + 2..close], out);
            out.close(slot);
            index = close + 2;
            continue;
        }

        if input[index] == '['
            && let Some(link) = find_link(input, index)
        {
            let href: String = input[link.href_start..link.href_end].iter().collect();
            let slot = out.open(Annotation::link(out.len, out.len, href));
            parse_span(&input[index + 1..link.text_end], out);
            out.close(slot);
            index = link.href_end + 1;
            continue;
        }

        out.push(input[index]);
        index += 1;
    }
}

fn delimiter_kind(c: char) -> Option<AnnotationType> {
    match c {
        '*' => Some(AnnotationType::Bold),
        '_' => Some(AnnotationType::Italics),
        '^' => Some(AnnotationType::Highlighting),
        '~' => Some(AnnotationType::Strikethrough),
        _ => None,
    }
}

fn delimiter_at(input: &[char], index: usize) -> Option<AnnotationType> {
    let c = *input.get(index)?;
    if input.get(index + 1) == Some(&c) {
        delimiter_kind(c)
    } else {
        None
    }
}

/// First closing pair after at least one character of content.
fn find_closing(input: &[char], content_start: usize, c: char) -> Option<usize> {
    (content_start + 1..input.len().saturating_sub(1))
        .find(|&j| input[j] == c && input[j + 1] == c)
}

struct LinkSpan {
    text_end: usize,
    href_start: usize,
    href_end: usize,
}

fn find_link(input: &[char], open: usize) -> Option<LinkSpan> {
    let mut depth = 0usize;
    let mut text_end = None;
    for (j, &c) in input.iter().enumerate().skip(open) {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    text_end = Some(j);
                    break;
                }
            }
            _ => {}
        }
    }
    let text_end = text_end?;
    if text_end == open + 1 || input.get(text_end + 1) != Some(&'(') {
        return None;
    }
    let href_start = text_end + 2;
    let href_end = href_start + input.get(href_start..)?.iter().position(|&c| c == ')')?;
    Some(LinkSpan {
        text_end,
        href_start,
        href_end,
    })
}
