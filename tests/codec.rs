use outline_sync::core::mark::{Annotation, AnnotationType};
use outline_sync::doc::{BoundaryRule, parse, serialize, serialize_with_rule};
use proptest::prelude::*;

#[test]
fn test_bold_and_link_round_trip() {
    let annotations = vec![
        Annotation::new(AnnotationType::Bold, 0, 5),
        Annotation::link(6, 11, "x"),
    ];
    let markup = serialize("hello world", &annotations);
    let parsed = parse(&markup);
    assert_eq!(parsed.content, "hello world");
    assert_eq!(parsed.annotations, annotations);
}

#[test]
fn test_link_text_with_brackets_inside() {
    let parsed = parse("[a [b] c](u)");
    assert_eq!(parsed.content, "a [b] c");
    assert_eq!(parsed.annotations, vec![Annotation::link(0, 7, "u")]);
}

#[test]
fn test_broken_link_stays_literal_but_inner_tokens_parse() {
    let parsed = parse("[**x**] (u)");
    assert_eq!(parsed.content, "[x] (u)");
    assert_eq!(
        parsed.annotations,
        vec![Annotation::new(AnnotationType::Bold, 1, 2)]
    );
}

#[test]
fn test_single_delimiters_are_literal() {
    let parsed = parse("a*b_c^d~e");
    assert_eq!(parsed.content, "a*b_c^d~e");
    assert!(parsed.annotations.is_empty());
}

#[test]
fn test_rules_agree_on_strict_nesting() {
    let annotations = vec![
        Annotation::new(AnnotationType::Bold, 0, 4),
        Annotation::new(AnnotationType::Italics, 1, 3),
    ];
    for rule in [BoundaryRule::Nesting, BoundaryRule::Legacy] {
        assert_eq!(
            serialize_with_rule("abcd", &annotations, rule),
            "**a__bc__d**"
        );
    }
}

#[test]
fn test_multibyte_content_offsets() {
    let annotations = vec![Annotation::new(AnnotationType::Highlighting, 1, 3)];
    let markup = serialize("日本語です", &annotations);
    assert_eq!(markup, "日^^本語^^です");
    assert_eq!(parse(&markup).annotations, annotations);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(proptest_config::cases()))]
    #[test]
    fn canonical_markup_survives_parse_and_serialize(markup in strategies::canonical_markup()) {
        let parsed = parse(&markup);
        prop_assert_eq!(serialize(&parsed.content, &parsed.annotations), markup);
    }

    #[test]
    fn parse_never_panics_and_stays_in_bounds(text in strategies::any_text()) {
        let parsed = parse(&text);
        let len = parsed.char_len();
        for annotation in &parsed.annotations {
            prop_assert!(annotation.start <= annotation.end);
            prop_assert!(annotation.end <= len);
        }
    }
}
