/// Byte offset to 1-based line/column translation, built once per source
/// text when a report needs rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineNumbers {
    line_starts: Vec<u32>,
    length: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineColumn {
    pub line: u32,
    pub column: u32,
}

impl LineNumbers {
    pub fn new(src: &str) -> Self {
        Self {
            length: src.len() as u32,
            line_starts: std::iter::once(0)
                .chain(src.match_indices('\n').map(|(i, _)| i as u32 + 1))
                .collect(),
        }
    }

    pub fn line_number(&self, byte_index: u32) -> u32 {
        self.line_starts
            .binary_search(&byte_index)
            .unwrap_or_else(|next| next - 1) as u32
            + 1
    }

    pub fn line_and_column_number(&self, byte_index: u32) -> LineColumn {
        let line = self.line_number(byte_index);
        let column = byte_index - self.line_starts[line as usize - 1] + 1;

        LineColumn { line, column }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line() {
        let lines = LineNumbers::new("hello\nworld");

        assert_eq!(lines.line_and_column_number(0), LineColumn { line: 1, column: 1 });
        assert_eq!(lines.line_and_column_number(4), LineColumn { line: 1, column: 5 });
    }

    #[test]
    fn after_newline() {
        let lines = LineNumbers::new("hello\nworld\n");

        assert_eq!(lines.line_and_column_number(6), LineColumn { line: 2, column: 1 });
        assert_eq!(lines.line_and_column_number(10), LineColumn { line: 2, column: 5 });
    }

    #[test]
    fn newline_byte_starts_the_next_line() {
        let lines = LineNumbers::new("ab\ncd");

        assert_eq!(lines.line_number(2), 1);
        assert_eq!(lines.line_number(3), 2);
    }
}
