//! Maps between the compiler's character-based positions and LSP
//! positions.
//!
//! The compiler counts columns in characters; LSP counts UTF-16 code
//! units. The two agree for the basic multilingual plane but diverge on
//! astral characters, so every position crossing the protocol boundary
//! goes through this index.

use kieli_base::Position;
use tower_lsp::lsp_types;

#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of each line start; `line_starts[0]` is always 0.
    line_starts: Vec<usize>,
    source: String,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        LineIndex {
            line_starts,
            source: source.to_string(),
        }
    }

    fn line_text(&self, line: usize) -> &str {
        let start = match self.line_starts.get(line) {
            Some(&start) => start,
            None => return "",
        };
        let end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.source.len());
        &self.source[start..end]
    }

    /// Convert a compiler position to an LSP position.
    pub fn to_lsp(&self, position: Position) -> lsp_types::Position {
        let line_text = self.line_text(position.line as usize);
        let character = line_text
            .chars()
            .take(position.column as usize)
            .map(char::len_utf16)
            .sum::<usize>() as u32;
        lsp_types::Position {
            line: position.line,
            character,
        }
    }

    /// Convert an LSP position to a compiler position.
    pub fn from_lsp(&self, position: lsp_types::Position) -> Position {
        let line_text = self.line_text(position.line as usize);
        let mut utf16_offset = 0u32;
        let mut column = 0u32;
        for character in line_text.chars() {
            if utf16_offset >= position.character || character == '\n' {
                break;
            }
            utf16_offset += character.len_utf16() as u32;
            column += 1;
        }
        Position {
            line: position.line,
            column,
        }
    }

    pub fn to_lsp_range(&self, range: kieli_base::Range) -> lsp_types::Range {
        lsp_types::Range {
            start: self.to_lsp(range.start),
            end: self.to_lsp(range.stop),
        }
    }

    pub fn from_lsp_range(&self, range: lsp_types::Range) -> kieli_base::Range {
        let start = self.from_lsp(range.start);
        let stop = self.from_lsp(range.end);
        kieli_base::Range {
            start: start.min(stop),
            stop: stop.max(start),
        }
    }

    /// A range covering the entire document.
    pub fn full_range(&self) -> lsp_types::Range {
        let last_line = self.line_starts.len() - 1;
        let last_text = self.line_text(last_line);
        lsp_types::Range {
            start: lsp_types::Position::new(0, 0),
            end: lsp_types::Position::new(
                last_line as u32,
                last_text.encode_utf16().count() as u32,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_positions_are_unchanged() {
        let index = LineIndex::new("abc\ndef");
        let position = index.to_lsp(Position::new(1, 2));
        assert_eq!(position, lsp_types::Position::new(1, 2));
        assert_eq!(index.from_lsp(position), Position::new(1, 2));
    }

    #[test]
    fn astral_characters_widen_utf16_columns() {
        // '𝕂' is one character but two UTF-16 code units.
        let index = LineIndex::new("𝕂x");
        let position = index.to_lsp(Position::new(0, 1));
        assert_eq!(position.character, 2);
        assert_eq!(index.from_lsp(position), Position::new(0, 1));
    }

    #[test]
    fn multibyte_utf8_stays_one_column() {
        // 'ä' is two bytes, one char, one UTF-16 unit.
        let index = LineIndex::new("äbc");
        let position = index.to_lsp(Position::new(0, 2));
        assert_eq!(position.character, 2);
    }

    #[test]
    fn out_of_bounds_lines_are_clamped() {
        let index = LineIndex::new("abc");
        assert_eq!(index.from_lsp(lsp_types::Position::new(9, 9)), Position::new(9, 0));
    }

    #[test]
    fn full_range_covers_the_document() {
        let index = LineIndex::new("abc\ndef");
        let range = index.full_range();
        assert_eq!(range.end, lsp_types::Position::new(1, 3));
    }

    #[test]
    fn crlf_line_endings_round_trip() {
        let index = LineIndex::new("ab\r\ncd");
        let position = index.to_lsp(Position::new(1, 1));
        assert_eq!(position, lsp_types::Position::new(1, 1));
    }
}
