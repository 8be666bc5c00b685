//! Produces the two raw streams of a file request: declared symbols from the
//! host's navigation tree, and references from per-identifier definition
//! lookups.

mod bundle;
mod lexer;
mod references;
mod symbols;

use std::path::Path;

use tower_lsp::lsp_types::Url;

pub use bundle::BundleFilter;
pub use lexer::{Identifier, identifiers, is_keyword};
pub use references::{DefinitionResolver, LookupOutcome, SkipReason, collect_references, lookup};
pub use symbols::{
    DeclarationNode, collect_symbols, declaration_nodes, descriptor, document_symbols, empty_contents,
    quick_info_contents,
};

use crate::{lsp_ext::PackageLocator, text_pos::LineIndex};

/// The file being walked.
#[derive(Debug, Clone, Copy)]
pub struct FileContext<'a> {
    pub path: &'a Path,
    pub uri: &'a Url,
    pub lines: &'a LineIndex,
    /// Path used for qnames: relative to the workspace root when inside one.
    pub relative_path: &'a str,
    /// Quoted module name of the file, e.g. `"foo/b"`.
    pub module_name: Option<&'a str>,
    /// Package owning the file.
    pub package: Option<&'a PackageLocator>,
}

#[cfg(test)]
#[path = "../../tests/src/walker/walker_tests.rs"]
mod tests;
