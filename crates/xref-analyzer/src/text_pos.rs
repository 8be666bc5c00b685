use tower_lsp::lsp_types::{Position, Range};

use crate::analysis::TextSpan;

/// Line table for converting between UTF-16 offsets (the analysis host's
/// unit), byte offsets, and LSP positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    text: String,
    /// Byte offset of every line start.
    line_bytes: Vec<usize>,
    /// UTF-16 offset of every line start.
    line_utf16: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_bytes = vec![0];
        let mut line_utf16 = vec![0];
        let mut utf16 = 0;
        for (byte, ch) in text.char_indices() {
            utf16 += ch.len_utf16();
            if ch == '\n' {
                line_bytes.push(byte + 1);
                line_utf16.push(utf16);
            }
        }
        Self {
            text: text.to_string(),
            line_bytes,
            line_utf16,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_bytes.len()
    }

    pub fn len_utf16(&self) -> usize {
        let last = self.line_bytes.len() - 1;
        self.line_utf16[last] + utf16_len(&self.text[self.line_bytes[last]..])
    }

    /// Position of a UTF-16 offset. Offsets past the end clamp to the end.
    pub fn position(
        &self,
        offset: usize,
    ) -> Position {
        let offset = offset.min(self.len_utf16());
        let line = match self.line_utf16.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert.saturating_sub(1),
        };
        Position::new(line as u32, (offset - self.line_utf16[line]) as u32)
    }

    /// UTF-16 offset of a position. Characters past the end of the line clamp
    /// to the line end.
    pub fn offset(
        &self,
        position: Position,
    ) -> Option<usize> {
        let line = position.line as usize;
        let start = *self.line_utf16.get(line)?;
        let line_len = utf16_len(self.line_text(line)?);
        Some(start + (position.character as usize).min(line_len))
    }

    pub fn range(
        &self,
        span: TextSpan,
    ) -> Range {
        Range::new(self.position(span.start), self.position(span.end()))
    }

    pub fn span(
        &self,
        range: Range,
    ) -> Option<TextSpan> {
        let start = self.offset(range.start)?;
        let end = self.offset(range.end)?;
        Some(TextSpan::new(start, end.saturating_sub(start)))
    }

    pub fn byte_to_utf16(
        &self,
        byte: usize,
    ) -> usize {
        let byte = floor_char_boundary(&self.text, byte.min(self.text.len()));
        let line = match self.line_bytes.binary_search(&byte) {
            Ok(exact) => exact,
            Err(insert) => insert.saturating_sub(1),
        };
        self.line_utf16[line] + utf16_len(&self.text[self.line_bytes[line]..byte])
    }

    pub fn utf16_to_byte(
        &self,
        offset: usize,
    ) -> usize {
        let position = self.position(offset);
        let line = position.line as usize;
        let mut byte = self.line_bytes[line];
        let mut remaining = position.character as usize;
        for ch in self.text[byte..].chars() {
            if remaining == 0 || ch == '\n' {
                break;
            }
            remaining = remaining.saturating_sub(ch.len_utf16());
            byte += ch.len_utf8();
        }
        byte
    }

    /// Text of a line without its terminator.
    pub fn line_text(
        &self,
        line: usize,
    ) -> Option<&str> {
        let start = *self.line_bytes.get(line)?;
        let end = self.line_bytes.get(line + 1).copied().unwrap_or(self.text.len());
        Some(self.text[start..end].trim_end_matches('\n').trim_end_matches('\r'))
    }
}

fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

fn floor_char_boundary(
    text: &str,
    mut byte: usize,
) -> usize {
    while byte > 0 && !text.is_char_boundary(byte) {
        byte -= 1;
    }
    byte
}

#[cfg(test)]
#[path = "../tests/src/text_pos_tests.rs"]
mod tests;
