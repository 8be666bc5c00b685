//! Qualified-name synthesis.
//!
//! A qname is the container chain of a declaration followed by its own name,
//! e.g. `foo.b.Foo` for `Foo` declared in module `"foo/b"`. Package identity
//! is carried separately on every response entry and never encoded here.

use std::path::Path;

use tower_lsp::lsp_types::SymbolKind;

use crate::lsp_ext::PackageLocator;

/// Raw declaration info, before canonicalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDescriptor {
    pub name: String,
    pub kind: SymbolKind,
    pub container_name: String,
    /// Path of the declaring file, relative to its workspace or repository root.
    pub file_path: String,
    pub package: Option<PackageLocator>,
}

/// Build the qualified name for `descriptor`.
///
/// Pure: the result depends only on the descriptor's name, container name
/// and file path.
pub fn qname(descriptor: &SymbolDescriptor) -> String {
    let mut qualified = String::new();

    let container = descriptor.container_name.as_str();
    if !container.is_empty() && !container_mentions_file(container, &descriptor.file_path) {
        qualified.push_str(&clean_container_name(container));
        qualified.push('.');
    }

    qualified.push_str(&descriptor.name);
    qualified
}

/// Strip quotes and turn path separators into `.`.
pub fn clean_container_name(container: &str) -> String {
    container
        .chars()
        .filter(|c| !matches!(c, '"' | '\''))
        .map(|c| match c {
            '/' | '\\' => '.',
            other => other,
        })
        .collect()
}

fn container_mentions_file(
    container: &str,
    file_path: &str,
) -> bool {
    if file_path.is_empty() {
        return false;
    }
    let normalized = file_path.replace('\\', "/");
    let file_name = Path::new(&normalized).file_name().and_then(|name| name.to_str()).unwrap_or_default();
    !file_name.is_empty() && container.contains(file_name)
}

#[cfg(test)]
#[path = "../tests/src/qname_tests.rs"]
mod tests;
