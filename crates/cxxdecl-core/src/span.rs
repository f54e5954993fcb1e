//! Source positions for tokens, declarations and diagnostics.
//!
//! A [`Span`] records where something starts (line and column) and how many
//! bytes it covers. Spans order by position, which the comment tracker relies
//! on when it interleaves comments with declarations.

use std::fmt;

/// A region of header text, identified by its starting position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Span {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, counted in bytes).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// A zero-length span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self { line, col, len: 0 }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Column one past the last byte, assuming the span does not cross a line.
    #[inline]
    pub fn end_col(&self) -> u32 {
        self.col + self.len
    }

    /// Whether this span starts strictly before `other`.
    #[inline]
    pub fn starts_before(&self, other: Span) -> bool {
        (self.line, self.col) < (other.line, other.col)
    }

    /// Extend this span so it reaches the end of `other`.
    ///
    /// Spans on different lines keep the start of `self` and sum the lengths;
    /// only the start position matters for multi-line constructs.
    #[inline]
    pub fn to(self, other: Span) -> Span {
        if self.line == other.line {
            let start = self.col.min(other.col);
            let end = self.end_col().max(other.end_col());
            Span::new(self.line, start, end - start)
        } else {
            Span::new(self.line, self.col, self.len + other.len)
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_line_and_column() {
        assert_eq!(Span::new(12, 4, 3).to_string(), "12:4");
        assert_eq!(format!("{:?}", Span::point(1, 1)), "1:1");
    }

    #[test]
    fn to_on_same_line_covers_both() {
        let a = Span::new(2, 5, 3);
        let b = Span::new(2, 12, 4);
        let joined = a.to(b);
        assert_eq!(joined.col, 5);
        assert_eq!(joined.len, 11);
    }

    #[test]
    fn to_across_lines_keeps_start() {
        let joined = Span::new(1, 3, 2).to(Span::new(4, 1, 1));
        assert_eq!((joined.line, joined.col, joined.len), (1, 3, 3));
    }

    #[test]
    fn ordering_follows_position() {
        let early = Span::new(3, 9, 1);
        let late = Span::new(4, 1, 1);
        assert!(early.starts_before(late));
        assert!(!late.starts_before(early));
        assert!(early < late);
    }

    #[test]
    fn point_is_empty() {
        assert!(Span::point(1, 1).is_empty());
        assert_eq!(Span::new(1, 1, 7).end_col(), 8);
    }
}
