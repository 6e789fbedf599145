use outline_sync::core::mark::{Annotation, AnnotationType, Document};
use outline_sync::core::{OutlineNode, OutlineTree, ViewType};
use outline_sync::sync::{to_document, tree_to_document};

#[test]
fn test_page_document_shape() {
    let tree = OutlineTree::new("page").with_children(vec![
        OutlineNode::new("a", "Groceries")
            .with_view_type(ViewType::Numbered)
            .with_children(vec![
                OutlineNode::new("b", "**milk**"),
                OutlineNode::new("c", "[eggs](https://shop)"),
            ]),
        OutlineNode::new("d", "Done"),
    ]);
    let document = tree_to_document(&tree, ViewType::Bullet);

    assert_eq!(document.content, "GroceriesmilkeggsDone");
    assert_eq!(
        document.annotations,
        vec![
            Annotation::block(0, 9, 1, ViewType::Bullet),
            Annotation::block(9, 13, 2, ViewType::Numbered),
            Annotation::new(AnnotationType::Bold, 9, 13),
            Annotation::block(13, 17, 2, ViewType::Numbered),
            Annotation::link(13, 17, "https://shop"),
            Annotation::block(17, 21, 1, ViewType::Bullet),
        ]
    );
    assert!(document.is_valid());
}

#[test]
fn test_page_view_type_wins_over_default() {
    let mut tree = OutlineTree::new("page").with_children(vec![OutlineNode::new("a", "x")]);
    tree.view_type = Some(ViewType::Document);
    let document = tree_to_document(&tree, ViewType::Bullet);
    assert_eq!(
        document.blocks().next().and_then(|b| b.attributes.view_type),
        Some(ViewType::Document)
    );
}

#[test]
fn test_empty_node_yields_empty_block() {
    let document = to_document(
        &[OutlineNode::new("a", ""), OutlineNode::new("b", "x")],
        ViewType::Bullet,
    );
    assert_eq!(document.content, "x");
    assert_eq!(document.annotations[0], Annotation::block(0, 0, 1, ViewType::Bullet));
    assert!(document.is_valid());
}

#[test]
fn test_empty_tree_yields_empty_document() {
    assert_eq!(to_document(&[], ViewType::Bullet), Document::default());
}

#[test]
fn test_document_wire_format() {
    let document = to_document(&[OutlineNode::new("a", "**hi**")], ViewType::Bullet);
    assert_eq!(
        serde_json::to_value(&document).unwrap(),
        serde_json::json!({
            "content": "hi",
            "annotations": [
                {"start": 0, "end": 2, "type": "block", "attributes": {"level": 1, "viewType": "bullet"}},
                {"start": 0, "end": 2, "type": "bold"}
            ]
        })
    );
    let back: Document = serde_json::from_value(serde_json::to_value(&document).unwrap()).unwrap();
    assert_eq!(back, document);
}

#[test]
fn test_invalid_document_reports_violations() {
    let document = Document::new(
        "abcdef",
        vec![
            Annotation::block(0, 2, 1, ViewType::Bullet),
            Annotation::block(3, 9, 1, ViewType::Bullet),
            Annotation::new(AnnotationType::Italics, 1, 4),
        ],
    );
    let messages: Vec<_> = document.violations().iter().map(ToString::to_string).collect();
    assert_eq!(
        messages,
        vec![
            "annotation 1 [3, 9) is out of bounds",
            "content [2, 3) is not covered by any block",
            "annotation 2 is not contained in any block",
        ]
    );
}
