use futures::{FutureExt, StreamExt, future::BoxFuture, stream};
use tower_lsp::lsp_types::{
    DocumentSymbol, HoverContents, LanguageString, Location, MarkedString, SymbolInformation,
};
use tracing::{debug, warn};

use super::FileContext;
use crate::{
    analysis::{AnalysisHost, NavigationTree, QuickInfo, TextSpan, symbol_kind},
    lsp_ext::DetailSymbolInformation,
    qname::{SymbolDescriptor, qname},
    text_pos::LineIndex,
};

/// A reportable declaration node together with the text of its reportable
/// parent, in pre-order.
#[derive(Debug, Clone, Copy)]
pub struct DeclarationNode<'t> {
    pub node: &'t NavigationTree,
    pub container: Option<&'t str>,
    /// The container is the file's own module, which the host names by file
    /// stem only (`"b"` for `foo/b.ts`).
    pub in_file_module: bool,
}

pub fn declaration_nodes(root: &NavigationTree) -> Vec<DeclarationNode<'_>> {
    let root_is_file_module = root.kind == "module" && root.text.starts_with('"');
    let mut nodes = Vec::new();
    let mut stack = vec![(root, None::<&NavigationTree>)];
    while let Some((node, parent)) = stack.pop() {
        if node.is_reportable() {
            nodes.push(DeclarationNode {
                node,
                container: parent.filter(|parent| parent.is_reportable()).map(|parent| parent.text.as_str()),
                in_file_module: root_is_file_module && parent.is_some_and(|parent| std::ptr::eq(parent, root)),
            });
        }
        stack.extend(node.child_items.iter().rev().map(|child| (child, Some(node))));
    }
    nodes
}

pub fn descriptor(
    file: &FileContext<'_>,
    declaration: &DeclarationNode<'_>,
) -> SymbolDescriptor {
    let container_name = match (declaration.in_file_module, file.module_name) {
        (true, Some(module)) => module.to_string(),
        _ => declaration.container.unwrap_or_default().to_string(),
    };
    SymbolDescriptor {
        name: declaration.node.text.clone(),
        kind: symbol_kind(&declaration.node.kind),
        container_name,
        file_path: file.relative_path.to_string(),
        package: file.package.cloned(),
    }
}

/// Symbols declared by `file`. A missing or failed declaration tree yields an
/// empty list; hover failures only blank the symbol's `contents`.
pub async fn collect_symbols(
    host: &dyn AnalysisHost,
    file: &FileContext<'_>,
    hover: bool,
    concurrency: usize,
) -> Vec<DetailSymbolInformation> {
    let tree = match host.declaration_tree(file.path).await {
        Ok(Some(tree)) => tree,
        Ok(None) => return Vec::new(),
        Err(error) => {
            warn!("Declaration tree for {} unavailable: {error}", file.path.display());
            return Vec::new();
        },
    };

    let nodes = declaration_nodes(&tree);
    debug!("{} declares {} symbols", file.path.display(), nodes.len());

    let futures: Vec<BoxFuture<'_, DetailSymbolInformation>> = nodes
        .into_iter()
        .map(|declaration| {
            async move {
                let contents = if hover {
                    Some(hover_contents(host, file, declaration.node).await)
                } else {
                    None
                };
                symbol_information(file, &declaration, contents)
            }
            .boxed()
        })
        .collect();
    stream::iter(futures)
        .buffered(concurrency.max(1))
        .collect()
        .await
}

fn symbol_information(
    file: &FileContext<'_>,
    declaration: &DeclarationNode<'_>,
    contents: Option<HoverContents>,
) -> DetailSymbolInformation {
    let descriptor = descriptor(file, declaration);
    let range = declaration.node.spans.first().map(|span| file.lines.range(*span)).unwrap_or_default();

    #[allow(deprecated)]
    let symbol_information = SymbolInformation {
        name: descriptor.name.clone(),
        kind: descriptor.kind,
        tags: None,
        deprecated: None,
        location: Location::new(file.uri.clone(), range),
        container_name: declaration.container.map(str::to_string),
    };

    DetailSymbolInformation {
        symbol_information,
        qname: Some(qname(&descriptor)),
        contents,
        package: descriptor.package,
    }
}

async fn hover_contents(
    host: &dyn AnalysisHost,
    file: &FileContext<'_>,
    node: &NavigationTree,
) -> HoverContents {
    let Some(offset) = node.name_offset() else {
        return empty_contents();
    };
    match host.quick_info_at(file.path, offset).await {
        Ok(Some(info)) => quick_info_contents(&info),
        Ok(None) => empty_contents(),
        Err(error) => {
            debug!("Quick info for {} at {offset} failed: {error}", file.path.display());
            empty_contents()
        },
    }
}

/// Hover contents in the `[signature, **kind**, documentation]` shape.
pub fn quick_info_contents(info: &QuickInfo) -> HoverContents {
    let signature = strip_kind_prefix(&info.display);
    if signature.is_empty() {
        return empty_contents();
    }

    let mut parts = vec![MarkedString::LanguageString(LanguageString {
        language: "typescript".to_string(),
        value: signature.to_string(),
    })];
    if !info.kind.is_empty() {
        parts.push(MarkedString::String(format!("**{}**", info.kind)));
    }
    if !info.documentation.is_empty() {
        parts.push(MarkedString::String(info.documentation.clone()));
    }
    HoverContents::Array(parts)
}

/// `(property) I.target: string` becomes `I.target: string`.
fn strip_kind_prefix(display: &str) -> &str {
    let display = display.trim();
    if display.starts_with('(')
        && let Some(close) = display.find(") ")
    {
        return display[close + 2..].trim_start();
    }
    display
}

pub fn empty_contents() -> HoverContents {
    HoverContents::Scalar(MarkedString::String(String::new()))
}

/// Hierarchical outline for `textDocument/documentSymbol`. Each top-level
/// item is searched within its own extent; a node is kept when it is
/// reportable or has a kept descendant.
pub fn document_symbols(
    tree: &NavigationTree,
    lines: &LineIndex,
) -> Vec<DocumentSymbol> {
    let mut symbols = Vec::new();
    for item in &tree.child_items {
        let (Some(first), Some(last)) = (item.spans.first(), item.spans.last()) else {
            continue;
        };
        let extent = TextSpan::new(first.start, last.end().saturating_sub(first.start));
        collect_in_extent(item, extent, lines, &mut symbols);
    }
    symbols
}

fn collect_in_extent(
    node: &NavigationTree,
    extent: TextSpan,
    lines: &LineIndex,
    out: &mut Vec<DocumentSymbol>,
) -> bool {
    let mut included = node.is_reportable();
    let mut children = Vec::new();
    for child in &node.child_items {
        if child.spans.iter().any(|span| span.intersects(&extent)) {
            included |= collect_in_extent(child, extent, lines, &mut children);
        }
    }
    if !included {
        return false;
    }

    let Some(span) = node.spans.iter().find(|span| span.intersects(&extent)) else {
        out.extend(children);
        return true;
    };
    let selection = node.name_span.filter(|name| name.intersects(&extent)).unwrap_or(*span);

    #[allow(deprecated)]
    out.push(DocumentSymbol {
        name: node.text.clone(),
        detail: Some(String::new()),
        kind: symbol_kind(&node.kind),
        tags: None,
        deprecated: None,
        range: lines.range(*span),
        selection_range: lines.range(selection),
        children: Some(children),
    });
    true
}

#[cfg(test)]
#[path = "../../tests/src/walker/symbols_tests.rs"]
mod tests;
