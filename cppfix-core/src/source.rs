//! Byte-offset helpers over one source buffer.
//!
//! Line starts are computed once; offsets map to 1-based line/column pairs
//! with a binary search. Indentation probing only ever looks at spaces and
//! tabs, so the helpers are safe on non-UTF-8 input.

/// Byte offset of every line start in a buffer.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &[u8]) -> Self {
        let mut starts = Vec::with_capacity(source.len() / 32 + 1);
        starts.push(0);
        for (i, b) in source.iter().enumerate() {
            if *b == b'\n' {
                starts.push(i + 1);
            }
        }
        Self {
            starts,
            len: source.len(),
        }
    }

    /// 1-based `(line, column)` for a byte offset. Offsets past the end clamp.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        let line = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (line + 1, offset - self.starts[line] + 1)
    }

    /// Byte offset where the line containing `offset` begins.
    pub fn line_start(&self, offset: usize) -> usize {
        let (line, _) = self.line_col(offset);
        self.starts[line - 1]
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}

#[inline]
fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Leading whitespace of the line containing `offset`.
pub fn line_indent(source: &[u8], offset: usize) -> &[u8] {
    let start = source[..offset.min(source.len())]
        .iter()
        .rposition(|b| *b == b'\n')
        .map_or(0, |i| i + 1);
    let end = source[start..]
        .iter()
        .position(|b| !is_blank(*b))
        .map_or(source.len(), |i| start + i);
    &source[start..end]
}

/// True when only spaces and tabs precede `offset` on its line.
pub fn starts_line(source: &[u8], offset: usize) -> bool {
    source[..offset.min(source.len())]
        .iter()
        .rev()
        .take_while(|b| **b != b'\n')
        .all(|b| is_blank(*b))
}

/// True when only spaces, tabs or a carriage return follow `offset` on its line.
pub fn ends_line(source: &[u8], offset: usize) -> bool {
    source[offset.min(source.len())..]
        .iter()
        .take_while(|b| **b != b'\n')
        .all(|b| is_blank(*b) || *b == b'\r')
}

/// Line ending used by the buffer: `\r\n` if the first newline is preceded by `\r`.
pub fn line_ending(source: &[u8]) -> &'static str {
    match source.iter().position(|b| *b == b'\n') {
        Some(i) if i > 0 && source[i - 1] == b'\r' => "\r\n",
        _ => "\n",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let idx = LineIndex::new(b"ab\ncd\n\nx");
        assert_eq!(idx.line_col(0), (1, 1));
        assert_eq!(idx.line_col(1), (1, 2));
        assert_eq!(idx.line_col(3), (2, 1));
        assert_eq!(idx.line_col(6), (3, 1));
        assert_eq!(idx.line_col(7), (4, 1));
        assert_eq!(idx.line_col(100), (4, 2));
        assert_eq!(idx.line_count(), 4);
    }

    #[test]
    fn test_line_start() {
        let idx = LineIndex::new(b"one\n  two");
        assert_eq!(idx.line_start(6), 4);
    }

    #[test]
    fn test_line_indent() {
        let src = b"{\n    case A:\n\t}";
        assert_eq!(line_indent(src, 10), b"    ");
        assert_eq!(line_indent(src, src.len() - 1), b"\t");
        assert_eq!(line_indent(src, 0), b"");
    }

    #[test]
    fn test_starts_and_ends_line() {
        let src = b"  }\nx; }";
        assert!(starts_line(src, 2));
        assert!(!starts_line(src, 7));
        assert!(ends_line(src, 3));
        assert!(!ends_line(src, 4));
    }

    #[test]
    fn test_line_ending() {
        assert_eq!(line_ending(b"a\r\nb"), "\r\n");
        assert_eq!(line_ending(b"a\nb"), "\n");
        assert_eq!(line_ending(b"ab"), "\n");
    }
}
