use std::{collections::HashMap, path::Path};

use tower_lsp::lsp_types::{Position, Range, SymbolKind, Url};

use super::*;
use crate::{
    analysis::{DefinitionInfo, HostError, ReferenceEntry},
    lsp_ext::PackageLocator,
    walker::FileContext,
};

const SOURCE: &str = "declare module \"d\" {\n  interface I { target: string }\n}\n";

fn node(
    text: &str,
    kind: &str,
    span: (usize, usize),
    name: Option<(usize, usize)>,
    children: Vec<NavigationTree>,
) -> NavigationTree {
    NavigationTree {
        text: text.to_string(),
        kind: kind.to_string(),
        kind_modifiers: String::new(),
        spans: vec![TextSpan::new(span.0, span.1)],
        name_span: name.map(|(start, length)| TextSpan::new(start, length)),
        child_items: children,
    }
}

fn outline() -> NavigationTree {
    let target = node("target", "property", (37, 14), Some((37, 6)), Vec::new());
    let interface = node("I", "interface", (23, 30), Some((33, 1)), vec![target]);
    let module = node("\"d\"", "module", (0, 55), Some((15, 3)), vec![interface]);
    node("<global>", "script", (0, 56), None, vec![module])
}

#[derive(Default)]
struct OutlineHost {
    tree: Option<NavigationTree>,
    info: HashMap<usize, QuickInfo>,
    failing_offsets: Vec<usize>,
    fail_tree: bool,
}

#[tower_lsp::async_trait]
impl AnalysisHost for OutlineHost {
    async fn ensure_loaded(
        &self,
        _path: &Path,
        _text: &str,
    ) -> Result<(), HostError> {
        Ok(())
    }

    async fn declaration_tree(
        &self,
        _path: &Path,
    ) -> Result<Option<NavigationTree>, HostError> {
        if self.fail_tree {
            return Err(HostError::Closed);
        }
        Ok(self.tree.clone())
    }

    async fn quick_info_at(
        &self,
        _path: &Path,
        offset: usize,
    ) -> Result<Option<QuickInfo>, HostError> {
        if self.failing_offsets.contains(&offset) {
            return Err(HostError::Protocol("no quick info".to_string()));
        }
        Ok(self.info.get(&offset).cloned())
    }

    async fn definition_at(
        &self,
        _path: &Path,
        _offset: usize,
    ) -> Result<Vec<DefinitionInfo>, HostError> {
        Ok(Vec::new())
    }

    async fn references_at(
        &self,
        _path: &Path,
        _offset: usize,
    ) -> Result<Vec<ReferenceEntry>, HostError> {
        Ok(Vec::new())
    }

    async fn reload_projects(&self) -> Result<(), HostError> {
        Ok(())
    }

    fn compiler_version(&self) -> Option<String> {
        None
    }

    async fn shutdown(&self) {}
}

fn target_info() -> QuickInfo {
    QuickInfo {
        kind: "property".to_string(),
        kind_modifiers: String::new(),
        display: "(property) I.target: string".to_string(),
        documentation: String::new(),
    }
}

fn range(
    start: (u32, u32),
    end: (u32, u32),
) -> Range {
    Range::new(Position::new(start.0, start.1), Position::new(end.0, end.1))
}

#[test]
fn declaration_nodes_are_pre_order_with_reportable_containers() {
    let tree = outline();
    let nodes = declaration_nodes(&tree);
    let flat = nodes.iter().map(|node| (node.node.text.as_str(), node.container)).collect::<Vec<_>>();
    assert_eq!(flat, vec![("\"d\"", None), ("I", Some("\"d\"")), ("target", Some("I"))]);
}

#[test]
fn anonymous_nodes_are_skipped_but_their_children_are_not() {
    let inner = node("inner", "function", (20, 5), None, Vec::new());
    let anonymous = node("<function>", "function", (10, 20), None, vec![inner]);
    let tree = node("<global>", "script", (0, 40), None, vec![anonymous]);
    let nodes = declaration_nodes(&tree);
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].node.text, "inner");
    assert_eq!(nodes[0].container, None);
}

#[tokio::test]
async fn symbols_carry_qnames_ranges_and_hover() {
    let host = OutlineHost {
        tree: Some(outline()),
        info: HashMap::from([(37, target_info())]),
        ..OutlineHost::default()
    };
    let uri = Url::parse("file:///ws/d.ts").unwrap();
    let lines = LineIndex::new(SOURCE);
    let file = FileContext {
        path: Path::new("/ws/d.ts"),
        uri: &uri,
        lines: &lines,
        relative_path: "d.ts",
        module_name: Some("\"d\""),
        package: None,
    };

    let symbols = collect_symbols(&host, &file, true, 4).await;
    let qnames = symbols.iter().map(|symbol| symbol.qname.as_deref().unwrap()).collect::<Vec<_>>();
    assert_eq!(qnames, vec!["\"d\"", "d.I", "I.target"]);

    assert_eq!(symbols[0].symbol_information.kind, SymbolKind::MODULE);
    assert_eq!(symbols[0].symbol_information.location.range, range((0, 0), (2, 1)));
    assert_eq!(symbols[0].contents, Some(empty_contents()));

    assert_eq!(symbols[1].symbol_information.kind, SymbolKind::INTERFACE);
    assert_eq!(symbols[1].symbol_information.container_name.as_deref(), Some("\"d\""));

    let target = &symbols[2];
    assert_eq!(target.symbol_information.kind, SymbolKind::PROPERTY);
    assert_eq!(target.symbol_information.location.range, range((1, 16), (1, 30)));
    assert_eq!(
        target.contents,
        Some(HoverContents::Array(vec![
            MarkedString::LanguageString(LanguageString {
                language: "typescript".to_string(),
                value: "I.target: string".to_string(),
            }),
            MarkedString::String("**property**".to_string()),
        ]))
    );
}

#[tokio::test]
async fn file_module_members_are_qualified_by_module_path() {
    let source = "// b\nexport class Foo {\n  bar() {}\n}\n";
    let bar = node("bar", "method", (27, 8), Some((27, 3)), Vec::new());
    let class = node("Foo", "class", (5, 32), Some((18, 3)), vec![bar]);
    let host = OutlineHost {
        tree: Some(node("\"b\"", "module", (0, source.len()), None, vec![class])),
        ..OutlineHost::default()
    };
    let uri = Url::parse("file:///ws/foo/b.ts").unwrap();
    let lines = LineIndex::new(source);
    let file = FileContext {
        path: Path::new("/ws/foo/b.ts"),
        uri: &uri,
        lines: &lines,
        relative_path: "foo/b.ts",
        module_name: Some("\"foo/b\""),
        package: None,
    };

    let symbols = collect_symbols(&host, &file, false, 2).await;
    let qnames = symbols.iter().map(|symbol| symbol.qname.as_deref().unwrap()).collect::<Vec<_>>();
    assert_eq!(qnames, vec!["\"b\"", "foo.b.Foo", "Foo.bar"]);
    assert_eq!(symbols[1].symbol_information.container_name.as_deref(), Some("\"b\""));
}

#[test]
fn declared_modules_are_not_file_modules() {
    let tree = outline();
    assert!(declaration_nodes(&tree).iter().all(|node| !node.in_file_module));

    let file_module = node("\"b\"", "module", (0, 30), None, vec![node("Foo", "class", (5, 19), None, Vec::new())]);
    let nodes = declaration_nodes(&file_module);
    assert!(!nodes[0].in_file_module);
    assert!(nodes[1].in_file_module);
}

#[tokio::test]
async fn hover_failures_blank_contents_only() {
    let host = OutlineHost {
        tree: Some(outline()),
        failing_offsets: vec![33, 37],
        ..OutlineHost::default()
    };
    let uri = Url::parse("file:///ws/d.ts").unwrap();
    let lines = LineIndex::new(SOURCE);
    let package = PackageLocator {
        name: Some("d".to_string()),
        version: Some("1.0.0".to_string()),
        repo_uri: None,
    };
    let file = FileContext {
        path: Path::new("/ws/d.ts"),
        uri: &uri,
        lines: &lines,
        relative_path: "d.ts",
        module_name: Some("\"d\""),
        package: Some(&package),
    };

    let symbols = collect_symbols(&host, &file, true, 1).await;
    assert_eq!(symbols.len(), 3);
    assert!(symbols.iter().all(|symbol| symbol.contents == Some(empty_contents())));
    assert!(symbols.iter().all(|symbol| symbol.package.as_ref() == Some(&package)));
}

#[tokio::test]
async fn hover_disabled_omits_contents() {
    let host = OutlineHost {
        tree: Some(outline()),
        ..OutlineHost::default()
    };
    let uri = Url::parse("file:///ws/d.ts").unwrap();
    let lines = LineIndex::new(SOURCE);
    let file = FileContext {
        path: Path::new("/ws/d.ts"),
        uri: &uri,
        lines: &lines,
        relative_path: "d.ts",
        module_name: Some("\"d\""),
        package: None,
    };

    let symbols = collect_symbols(&host, &file, false, 8).await;
    assert!(symbols.iter().all(|symbol| symbol.contents.is_none()));
}

#[tokio::test]
async fn missing_or_failed_tree_yields_no_symbols() {
    let uri = Url::parse("file:///ws/d.ts").unwrap();
    let lines = LineIndex::new(SOURCE);
    let file = FileContext {
        path: Path::new("/ws/d.ts"),
        uri: &uri,
        lines: &lines,
        relative_path: "d.ts",
        module_name: Some("\"d\""),
        package: None,
    };

    assert!(collect_symbols(&OutlineHost::default(), &file, true, 8).await.is_empty());
    let failing = OutlineHost {
        tree: Some(outline()),
        fail_tree: true,
        ..OutlineHost::default()
    };
    assert!(collect_symbols(&failing, &file, true, 8).await.is_empty());
}

#[test]
fn quick_info_contents_shapes() {
    assert_eq!(quick_info_contents(&QuickInfo::default()), empty_contents());

    let documented = QuickInfo {
        kind: "function".to_string(),
        kind_modifiers: "export".to_string(),
        display: "function map(xs: number[]): number[]".to_string(),
        documentation: "Maps numbers.".to_string(),
    };
    let HoverContents::Array(parts) = quick_info_contents(&documented) else {
        panic!("expected an array of marked strings");
    };
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[2], MarkedString::String("Maps numbers.".to_string()));
}

#[test]
fn document_symbols_nest_by_extent() {
    let lines = LineIndex::new(SOURCE);
    let symbols = document_symbols(&outline(), &lines);
    assert_eq!(symbols.len(), 1);

    let module = &symbols[0];
    assert_eq!(module.name, "\"d\"");
    assert_eq!(module.range, range((0, 0), (2, 1)));
    assert_eq!(module.detail.as_deref(), Some(""));

    let interface = &module.children.as_ref().unwrap()[0];
    assert_eq!(interface.name, "I");
    assert_eq!(interface.selection_range, range((1, 12), (1, 13)));

    let target = &interface.children.as_ref().unwrap()[0];
    assert_eq!(target.name, "target");
    assert_eq!(target.children.as_deref(), Some(&[][..]));
}

#[test]
fn document_symbols_keep_anonymous_parents_of_named_children() {
    let source = "export default function () {\n  const inner = 1;\n}\n";
    let lines = LineIndex::new(source);
    let inner = node("inner", "const", (37, 9), Some((37, 5)), Vec::new());
    let anonymous = node("<function>", "function", (0, 49), None, vec![inner]);
    let empty = node("<class>", "class", (49, 0), None, Vec::new());
    let tree = node("<global>", "script", (0, 50), None, vec![anonymous, empty]);

    let symbols = document_symbols(&tree, &lines);
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].name, "<function>");
    assert_eq!(symbols[0].children.as_ref().unwrap()[0].name, "inner");
}
