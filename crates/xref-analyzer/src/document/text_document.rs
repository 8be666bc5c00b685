use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent, Url};

use crate::text_pos::LineIndex;

/// Snapshot of a single open text document.
#[derive(Debug, Clone)]
pub struct Document {
    pub uri: Url,
    /// Document version as reported by the client.
    pub version: i32,
    lines: LineIndex,
}

impl Document {
    pub fn new(
        uri: Url,
        text: String,
        version: i32,
    ) -> Self {
        Self {
            uri,
            version,
            lines: LineIndex::new(&text),
        }
    }

    pub fn text(&self) -> &str {
        self.lines.text()
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    /// UTF-16 offset of an LSP position.
    pub fn offset_of(
        &self,
        position: Position,
    ) -> Option<usize> {
        self.lines.offset(position)
    }

    pub fn position_of(
        &self,
        offset: usize,
    ) -> Position {
        self.lines.position(offset)
    }

    /// Replace the full content and bump version.
    pub fn set_content(
        &mut self,
        text: String,
        version: i32,
    ) {
        self.lines = LineIndex::new(&text);
        self.version = version;
    }

    /// Apply a list of incremental or full-content changes and bump version.
    pub fn apply_changes(
        &mut self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) {
        for change in changes {
            match change.range {
                Some(range) => {
                    let (Some(start), Some(end)) = (self.lines.offset(range.start), self.lines.offset(range.end)) else {
                        continue;
                    };
                    let start = self.lines.utf16_to_byte(start);
                    let end = self.lines.utf16_to_byte(end).max(start);
                    let mut text = self.lines.text().to_string();
                    text.replace_range(start..end, &change.text);
                    self.lines = LineIndex::new(&text);
                },
                None => self.lines = LineIndex::new(&change.text),
            }
        }
        self.version = version;
    }
}

#[cfg(test)]
#[path = "../../tests/src/document/text_document_tests.rs"]
mod tests;
