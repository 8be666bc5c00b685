use expect_test::expect;
use serde_json::json;
use tower_lsp::lsp_types::{Position, Range, Url};

use super::*;

fn sample_location() -> Location {
    Location {
        uri: Url::parse("file:///ws/d.ts").expect("valid uri"),
        range: Range::new(Position::new(0, 17), Position::new(0, 18)),
    }
}

#[test]
fn reference_category_serializes_as_integer() {
    assert_eq!(serde_json::to_value(ReferenceCategory::Uncategorized).unwrap(), json!(0));
    assert_eq!(serde_json::to_value(ReferenceCategory::Implement).unwrap(), json!(4));
    let parsed: ReferenceCategory = serde_json::from_value(json!(3)).unwrap();
    assert_eq!(parsed, ReferenceCategory::Inherit);
    assert!(serde_json::from_value::<ReferenceCategory>(json!(9)).is_err());
}

#[test]
fn full_distinguishes_null_from_empty() {
    let not_computed = Full {
        symbols: Some(Vec::new()),
        references: None,
    };
    let computed_empty = Full {
        symbols: Some(Vec::new()),
        references: Some(Vec::new()),
    };
    assert_eq!(serde_json::to_value(&not_computed).unwrap(), json!({"symbols": [], "references": null}));
    assert_eq!(serde_json::to_value(&computed_empty).unwrap(), json!({"symbols": [], "references": []}));
}

#[test]
fn symbol_locator_omits_absent_fields() {
    let locator = SymbolLocator {
        qname: Some("d.I".to_string()),
        symbol_kind: Some(SymbolKind::INTERFACE),
        path: Some("d.ts".to_string()),
        location: Some(sample_location()),
        package: None,
    };
    let value = serde_json::to_value(&locator).unwrap();
    assert_eq!(value["qname"], json!("d.I"));
    assert_eq!(value["symbolKind"], json!(11));
    assert!(value.get("package").is_none());
}

#[test]
fn full_params_reference_flag_defaults_to_false() {
    let params: FullParams = serde_json::from_value(json!({
        "textDocument": { "uri": "file:///ws/a.ts" }
    }))
    .unwrap();
    assert!(!params.wants_references());
    assert!(params.partial_result_token().is_none());

    let params: FullParams = serde_json::from_value(json!({
        "textDocument": { "uri": "file:///ws/a.ts" },
        "reference": true,
        "partialResultToken": "tok-1"
    }))
    .unwrap();
    assert!(params.wants_references());
    assert!(params.partial_result_token().is_some());
}

#[test]
fn patch_stream_reduces_placeholder_and_append() {
    let mut stream = PatchStream::new();
    assert!(stream.apply(&PatchOperation::initialize_empty()));
    assert!(stream.apply(&PatchOperation::append(json!({"symbols": [], "references": null}))));
    assert_eq!(stream.applied(), 2);
    assert_eq!(stream.into_value(), json!([{"symbols": [], "references": null}]));
}

#[test]
fn patch_stream_ignores_append_before_initialize() {
    let mut stream = PatchStream::new();
    assert!(!stream.apply(&PatchOperation::append(json!(1))));
    assert_eq!(stream.into_value(), serde_json::Value::Null);
}

#[test]
fn patch_stream_appends_into_nested_arrays() {
    let mut stream = PatchStream::new();
    stream.apply(&PatchOperation::initialize_empty());
    stream.apply(&PatchOperation::append(json!({"symbols": [], "references": []})));
    assert!(stream.apply(&PatchOperation::add("/0/symbols/-", json!("a"))));
    assert!(!stream.apply(&PatchOperation::add("/3/symbols/-", json!("b"))));
    assert!(!stream.apply(&PatchOperation {
        op: "remove".to_string(),
        path: "/0".to_string(),
        value: json!(null),
    }));
    assert_eq!(stream.into_value(), json!([{"symbols": ["a"], "references": []}]));
}

#[test]
fn reference_wire_format() {
    let reference = Reference {
        category: ReferenceCategory::Read,
        location: sample_location(),
        target: SymbolLocator {
            qname: Some("d.I".to_string()),
            symbol_kind: Some(SymbolKind::INTERFACE),
            path: Some("d.ts".to_string()),
            location: None,
            package: Some(PackageLocator {
                name: Some("d".to_string()),
                version: Some("1.0.0".to_string()),
                repo_uri: Some("github.com/acme/d".to_string()),
            }),
        },
    };

    let actual = serde_json::to_string_pretty(&reference).unwrap();
    expect![[r#"
        {
          "category": 1,
          "location": {
            "uri": "file:///ws/d.ts",
            "range": {
              "start": {
                "line": 0,
                "character": 17
              },
              "end": {
                "line": 0,
                "character": 18
              }
            }
          },
          "target": {
            "qname": "d.I",
            "symbolKind": 11,
            "path": "d.ts",
            "package": {
              "name": "d",
              "version": "1.0.0",
              "repoUri": "github.com/acme/d"
            }
          }
        }"#]]
    .assert_eq(&actual);
}
