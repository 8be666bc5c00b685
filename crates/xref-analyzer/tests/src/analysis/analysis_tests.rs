use tower_lsp::lsp_types::SymbolKind;

use super::*;

#[test]
fn span_bounds() {
    let span = TextSpan::new(10, 5);
    assert_eq!(span.end(), 15);
    assert!(span.contains(10));
    assert!(span.contains(14));
    assert!(!span.contains(15));
    assert!(span.intersects(&TextSpan::new(15, 2)));
    assert!(span.intersects(&TextSpan::new(0, 10)));
    assert!(!span.intersects(&TextSpan::new(16, 2)));
}

#[test]
fn navigation_tree_deserializes_host_shape() {
    let tree: NavigationTree = serde_json::from_value(serde_json::json!({
        "text": "\"d\"",
        "kind": "module",
        "kindModifiers": "declare",
        "spans": [{"start": 0, "length": 52}],
        "nameSpan": {"start": 15, "length": 3},
        "childItems": [
            {"text": "I", "kind": "interface", "spans": [{"start": 25, "length": 25}], "nameSpan": {"start": 35, "length": 1}}
        ]
    }))
    .unwrap();

    assert_eq!(tree.text, "\"d\"");
    assert_eq!(tree.name_offset(), Some(15));
    assert_eq!(tree.child_items.len(), 1);
    assert!(tree.child_items[0].child_items.is_empty());
    assert_eq!(tree.child_items[0].kind_modifiers, "");
}

#[test]
fn structural_nodes_are_not_reportable() {
    let node = |text: &str, kind: &str| NavigationTree {
        text: text.to_string(),
        kind: kind.to_string(),
        ..NavigationTree::default()
    };

    assert!(!node("\"/ws/a\"", "script").is_reportable());
    assert!(!node("<function>", "function").is_reportable());
    assert!(!node("<class>", "class").is_reportable());
    assert!(!node("  ", "var").is_reportable());
    assert!(node("Foo", "class").is_reportable());
    assert!(node("\"d\"", "module").is_reportable());
}

#[test]
fn name_offset_falls_back_to_first_span() {
    let tree = NavigationTree {
        text: "x".to_string(),
        kind: "var".to_string(),
        spans: vec![TextSpan::new(4, 1), TextSpan::new(20, 1)],
        ..NavigationTree::default()
    };
    assert_eq!(tree.name_offset(), Some(4));
    assert_eq!(NavigationTree::default().name_offset(), None);
}

#[test]
fn kind_names_map_to_symbol_kinds() {
    let cases = [
        ("module", SymbolKind::MODULE),
        ("class", SymbolKind::CLASS),
        ("interface", SymbolKind::INTERFACE),
        ("enum", SymbolKind::ENUM),
        ("var", SymbolKind::VARIABLE),
        ("let", SymbolKind::VARIABLE),
        ("function", SymbolKind::FUNCTION),
        ("method", SymbolKind::METHOD),
        ("getter", SymbolKind::METHOD),
        ("setter", SymbolKind::METHOD),
        ("property", SymbolKind::PROPERTY),
        ("constructor", SymbolKind::CONSTRUCTOR),
        ("const", SymbolKind::CONSTANT),
        ("alias", SymbolKind::VARIABLE),
        ("", SymbolKind::VARIABLE),
    ];
    for (kind, expected) in cases {
        assert_eq!(symbol_kind(kind), expected, "{kind}");
    }
}

#[test]
fn host_errors_render_context() {
    let timeout = HostError::Timeout {
        command: "definition-full".to_string(),
        after_ms: 250,
    };
    assert_eq!(timeout.to_string(), "definition-full timed out after 250ms");
    assert_eq!(HostError::Closed.to_string(), "analysis host is not running");
}
