/// A position-tracking cursor over header text.
///
/// Tracks byte offset, line and column as it advances. Columns count bytes.
pub struct Cursor<'src> {
    source: &'src str,
    /// Unconsumed text.
    rest: &'src str,
    offset: u32,
    line: u32,
    column: u32,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// The text not yet consumed.
    #[inline]
    pub fn rest(&self) -> &'src str {
        self.rest
    }

    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    #[inline]
    pub fn peek(&self) -> Option<char> {
        let first = *self.rest.as_bytes().first()?;
        if first < 128 {
            Some(first as char)
        } else {
            self.rest.chars().next()
        }
    }

    /// Peek at the nth character ahead (0 = current).
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    #[inline]
    pub fn check(&self, f: impl Fn(char) -> bool) -> bool {
        self.peek().is_some_and(f)
    }

    #[inline]
    pub fn check_str(&self, s: &str) -> bool {
        self.rest.starts_with(s)
    }

    /// Whether the cursor sits on a backslash that ends the physical line.
    pub fn at_line_continuation(&self) -> bool {
        self.rest.starts_with("\\\n") || self.rest.starts_with("\\\r\n")
    }

    /// Consume one character, updating line and column.
    #[inline]
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        let len = ch.len_utf8();
        self.rest = &self.rest[len..];
        self.offset += len as u32;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += len as u32;
        }
        Some(ch)
    }

    /// Advance by `n` bytes; `n` must land on a character boundary.
    pub fn advance_bytes(&mut self, n: usize) {
        debug_assert!(self.rest.is_char_boundary(n));
        for ch in self.rest[..n].chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += ch.len_utf8() as u32;
            }
        }
        self.rest = &self.rest[n..];
        self.offset += n as u32;
    }

    #[inline]
    pub fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume characters while the predicate matches, returning them.
    pub fn eat_while(&mut self, f: impl Fn(char) -> bool) -> &'src str {
        let start = self.offset as usize;
        while self.check(&f) {
            self.advance();
        }
        &self.source[start..self.offset as usize]
    }

    /// Consume ASCII bytes while the predicate matches. Never crosses a
    /// newline unless the predicate accepts one, in which case line tracking
    /// is wrong; use it for identifiers and numbers only.
    #[inline]
    pub fn eat_while_ascii(&mut self, f: impl Fn(u8) -> bool) -> &'src str {
        let start = self.offset as usize;
        let bytes = self.rest.as_bytes();
        let mut i = 0;
        while i < bytes.len() && bytes[i] < 128 && bytes[i] != b'\n' && f(bytes[i]) {
            i += 1;
        }
        if i > 0 {
            self.rest = &self.rest[i..];
            self.offset += i as u32;
            self.column += i as u32;
        }
        &self.source[start..self.offset as usize]
    }

    /// Consume up to (not including) the next newline.
    pub fn eat_line(&mut self) -> &'src str {
        let end = self.rest.find('\n').unwrap_or(self.rest.len());
        let start = self.offset as usize;
        self.advance_bytes(end);
        &self.source[start..self.offset as usize]
    }

    #[inline]
    pub fn slice_from(&self, start: u32) -> &'src str {
        &self.source[start as usize..self.offset as usize]
    }
}

/// Identifiers may use any alphabetic character outside ASCII.
#[inline]
pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$' || (!c.is_ascii() && c.is_alphabetic())
}

#[inline]
pub fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || (!c.is_ascii() && c.is_alphanumeric())
}

#[inline]
pub fn is_ident_continue_ascii(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_lines_and_columns() {
        let mut cursor = Cursor::new("ab\ncd");
        cursor.advance();
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (1, 3));
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (2, 1));
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (2, 2));
    }

    #[test]
    fn utf8_columns_count_bytes() {
        let mut cursor = Cursor::new("hé!");
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.offset(), 3);
        assert_eq!(cursor.column(), 4);
        assert_eq!(cursor.peek(), Some('!'));
    }

    #[test]
    fn eat_line_stops_before_newline() {
        let mut cursor = Cursor::new("#define X 1\nint");
        assert_eq!(cursor.eat_line(), "#define X 1");
        assert_eq!(cursor.peek(), Some('\n'));
        assert_eq!(cursor.line(), 1);
    }

    #[test]
    fn eat_while_ascii_does_not_cross_lines() {
        let mut cursor = Cursor::new("abc\ndef");
        assert_eq!(cursor.eat_while_ascii(|_| true), "abc");
        assert_eq!(cursor.line(), 1);
    }

    #[test]
    fn line_continuation_detection() {
        assert!(Cursor::new("\\\nnext").at_line_continuation());
        assert!(Cursor::new("\\\r\nnext").at_line_continuation());
        assert!(!Cursor::new("\\n").at_line_continuation());
    }

    #[test]
    fn advance_bytes_counts_newlines() {
        let mut cursor = Cursor::new("a\nb\nc");
        cursor.advance_bytes(4);
        assert_eq!(cursor.line(), 3);
        assert_eq!(cursor.slice_from(0), "a\nb\n");
    }

    #[test]
    fn identifier_classes() {
        assert!(is_ident_start('_'));
        assert!(!is_ident_start('7'));
        assert!(is_ident_continue('7'));
        assert!(is_ident_start('é'));
        assert!(is_ident_continue('ß'));
        assert!(!is_ident_start('€'));
        assert!(is_ident_continue_ascii(b'x'));
        assert!(!is_ident_continue_ascii(b':'));
    }
}
