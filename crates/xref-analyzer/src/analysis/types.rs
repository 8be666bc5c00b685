use serde::Deserialize;
use tower_lsp::lsp_types::SymbolKind;

/// Span in UTF-16 code units from the start of a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub length: usize,
}

impl TextSpan {
    pub fn new(
        start: usize,
        length: usize,
    ) -> Self {
        Self {
            start,
            length,
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn contains(
        &self,
        offset: usize,
    ) -> bool {
        offset >= self.start && offset < self.end()
    }

    pub fn intersects(
        &self,
        other: &TextSpan,
    ) -> bool {
        self.start <= other.end() && other.start <= self.end()
    }
}

/// A node of the host's per-file declaration outline.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationTree {
    pub text: String,
    pub kind: String,
    #[serde(default)]
    pub kind_modifiers: String,
    #[serde(default)]
    pub spans: Vec<TextSpan>,
    #[serde(default)]
    pub name_span: Option<TextSpan>,
    #[serde(default)]
    pub child_items: Vec<NavigationTree>,
}

impl NavigationTree {
    /// Script roots, anonymous items (`<function>`, `<class>`) and nameless
    /// nodes are structural only.
    pub fn is_reportable(&self) -> bool {
        let text = self.text.trim();
        self.kind != "script" && !text.is_empty() && !(text.starts_with('<') && text.ends_with('>'))
    }

    /// Offset used for quick-info lookups: the name when present, else the
    /// start of the declaration.
    pub fn name_offset(&self) -> Option<usize> {
        self.name_span.or_else(|| self.spans.first().copied()).map(|span| span.start)
    }
}

/// Hover-style summary of the symbol at a position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuickInfo {
    pub kind: String,
    pub kind_modifiers: String,
    /// Declaration signature, e.g. `(property) I.target: string`.
    pub display: String,
    pub documentation: String,
}

/// One definition of the symbol at a position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionInfo {
    pub file_name: String,
    pub text_span: TextSpan,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub container_kind: String,
    #[serde(default)]
    pub container_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceEntry {
    pub file_name: String,
    pub text_span: TextSpan,
    #[serde(default)]
    pub is_write_access: bool,
    #[serde(default)]
    pub is_definition: bool,
}

/// Map the host's element kind names onto LSP symbol kinds.
pub fn symbol_kind(kind: &str) -> SymbolKind {
    match kind {
        "module" => SymbolKind::MODULE,
        "class" | "local class" => SymbolKind::CLASS,
        "interface" => SymbolKind::INTERFACE,
        "enum" => SymbolKind::ENUM,
        "var" | "let" | "local var" => SymbolKind::VARIABLE,
        "function" | "local function" => SymbolKind::FUNCTION,
        "method" | "getter" | "setter" => SymbolKind::METHOD,
        "property" | "JSX attribute" => SymbolKind::PROPERTY,
        "constructor" => SymbolKind::CONSTRUCTOR,
        "const" | "enum member" => SymbolKind::CONSTANT,
        _ => SymbolKind::VARIABLE,
    }
}
