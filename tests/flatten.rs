use outline_sync::core::{OutlineNode, OutlineTree, flatten};

fn outline() -> OutlineTree {
    OutlineTree::new("page").with_children(vec![
        OutlineNode::new("a", "A").with_children(vec![
            OutlineNode::new("b", "B").with_children(vec![OutlineNode::new("c", "C")]),
            OutlineNode::new("d", "D"),
        ]),
        OutlineNode::new("e", "E"),
    ])
}

#[test]
fn test_preorder_with_levels() {
    let entries: Vec<_> = outline()
        .flatten()
        .into_iter()
        .map(|e| (e.id.to_string(), e.text, e.level))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("a".into(), "A".into(), 1),
            ("b".into(), "B".into(), 2),
            ("c".into(), "C".into(), 3),
            ("d".into(), "D".into(), 2),
            ("e".into(), "E".into(), 1),
        ]
    );
}

#[test]
fn test_empty_outline() {
    let tree = OutlineTree::new("page");
    assert!(tree.is_empty());
    assert!(tree.flatten().is_empty());
    assert_eq!(tree.len(), 0);
}

#[test]
fn test_len_counts_every_node() {
    assert_eq!(outline().len(), 5);
}

#[test]
fn test_tree_json_shape() {
    let json = r#"{
        "root": "page",
        "viewType": "numbered",
        "children": [
            {"id": "a", "text": "A", "children": [{"id": "b", "text": "B"}]},
            {"id": "c", "text": "C", "viewType": "document"}
        ]
    }"#;
    let tree: OutlineTree = serde_json::from_str(json).unwrap();
    assert_eq!(tree.len(), 3);
    let levels: Vec<_> = flatten(&tree.children).iter().map(|e| e.level).collect();
    assert_eq!(levels, vec![1, 2, 1]);
}
