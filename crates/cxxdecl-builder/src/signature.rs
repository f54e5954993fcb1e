//! Normalized declaration text.
//!
//! [`SignatureBuilder`] re-serializes tokens with fixed spacing so that the
//! same declaration always produces the same string, however it was
//! formatted in the header:
//!
//! ```text
//! int   Bar ( int x ,int y=2 )const;   ->   int Bar(int x, int y)
//! ```
//!
//! Marks let a caller take back what it appended: default arguments are
//! cut out and kept as value text, and a function pointer parameter copies
//! its own sub-signature without disturbing the enclosing one.

use cxxdecl_parser::{Token, TokenKind};

/// A position in the builder's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

/// Incremental buffer for normalized declaration text.
#[derive(Debug, Default)]
pub struct SignatureBuilder {
    text: String,
    /// Nesting depth of `close()` calls; nothing is appended while positive.
    closed: usize,
}

impl SignatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one piece of text, usually a token's lexeme.
    pub fn append(&mut self, piece: &str) {
        if self.closed > 0 || piece.is_empty() {
            return;
        }
        if self.needs_space_before(piece) {
            self.text.push(' ');
        }
        self.text.push_str(piece);
    }

    pub fn append_tokens(&mut self, tokens: &[Token<'_>]) {
        for token in tokens {
            self.append(token.lexeme);
        }
    }

    /// Append an expression as one piece, spaced by [`expression_text`].
    pub fn append_expression(&mut self, tokens: &[Token<'_>]) {
        let text = expression_text(tokens);
        self.append(&text);
    }

    /// Open a parenthesized declarator. It is set apart from a type that
    /// precedes it, as in `void (*callback)(int)`, but not from a pointer
    /// operator or an enclosing parenthesis.
    pub fn open_nested(&mut self) {
        if self.closed > 0 {
            return;
        }
        if self.text.ends_with(|c: char| c.is_alphanumeric() || c == '_' || c == '>') {
            self.text.push(' ');
        }
        self.text.push('(');
    }

    fn needs_space_before(&self, piece: &str) -> bool {
        let Some(last) = self.text.chars().last() else {
            return false;
        };
        if last == ' ' {
            return false;
        }
        const NO_SPACE_BEFORE: &[&str] = &["(", ")", "[", "]", ";", ",", "::", "<", ">", ">>"];
        if NO_SPACE_BEFORE.contains(&piece) {
            return false;
        }
        // `(`, `[`, `::`, `~` and an opening `<` bind to what follows, as do
        // pointer and reference operators
        !(self.text.ends_with(['(', '[', '~', '<', '*', '&']) || self.text.ends_with("::"))
    }

    pub fn mark(&self) -> Mark {
        Mark(self.text.len())
    }

    /// The text appended since `mark`, leaving it in place.
    pub fn copy_since(&self, mark: Mark) -> String {
        self.text.get(mark.0..).unwrap_or_default().trim().to_string()
    }

    /// Remove and return the text appended since `mark`.
    pub fn cut_since(&mut self, mark: Mark) -> String {
        if mark.0 >= self.text.len() {
            return String::new();
        }
        let cut = self.text.split_off(mark.0);
        let trimmed = self.text.trim_end().len();
        self.text.truncate(trimmed);
        cut.trim().to_string()
    }

    /// Stop appending until the matching [`open`](Self::open).
    pub fn close(&mut self) {
        self.closed += 1;
    }

    pub fn open(&mut self) {
        self.closed = self.closed.saturating_sub(1);
    }

    pub fn is_closed(&self) -> bool {
        self.closed > 0
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Take the finished text, leaving the builder empty and open.
    pub fn finish(&mut self) -> String {
        self.closed = 0;
        std::mem::take(&mut self.text)
    }
}

/// Render an expression token run with conventional spacing: binary
/// operators spaced, unary operators and member access tight. Template
/// argument lists are written the way a signature spells them.
///
/// ```text
/// ( N + 1 ) * sizeof ( int )   ->   (N + 1) * sizeof(int)
/// - 1                          ->   -1
/// A < int > ( 3 , 4 )          ->   A<int>(3, 4)
/// ```
pub fn expression_text(tokens: &[Token<'_>]) -> String {
    let mut text = String::new();
    // Whether the previous token ends an operand, so that a following
    // `-`, `*` or `&` is binary.
    let mut after_operand = false;
    let mut tight_next = true;
    // Indices of the `>` closing each open template argument list.
    let mut closers: Vec<usize> = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        let mut opens_template = false;
        if token.kind == TokenKind::Less
            && i > 0
            && tokens[i - 1].kind == TokenKind::Identifier
            && let Some(close) = template_closer(tokens, i)
        {
            closers.push(close);
            opens_template = true;
        }
        // `>>` can close two lists at once.
        let mut closes_template = false;
        while closers.last() == Some(&i) {
            closers.pop();
            closes_template = true;
        }
        let lexeme = token.lexeme;

        let operand_end =
            token.kind.is_word() || token.kind.is_literal() || closes_template || matches!(lexeme, ")" | "]" | "}");
        let tight_before = matches!(lexeme, ")" | "]" | "," | ";" | "::" | "." | "->" | "++" | "--")
            || opens_template
            || closes_template
            || (matches!(lexeme, "(" | "[") && after_operand);
        if !text.is_empty() && !tight_next && !tight_before {
            text.push(' ');
        }
        text.push_str(lexeme);

        let unary = matches!(lexeme, "-" | "+" | "*" | "&" | "!" | "~") && !after_operand;
        tight_next = unary || opens_template || matches!(lexeme, "(" | "[" | "::" | "." | "->");
        after_operand = operand_end;
    }
    text
}

/// The index of the `>` closing a template argument list opened at `open`.
///
/// The list must be balanced and be followed by `(`, `{`, `::` or the end
/// of the operand; otherwise `<` is a comparison.
fn template_closer(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    let mut angles = 0usize;
    let mut groups = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token.kind {
            TokenKind::Less if groups == 0 => angles += 1,
            TokenKind::Greater | TokenKind::GreaterGreater if groups == 0 => {
                let closed = if token.kind == TokenKind::Greater { 1 } else { 2 };
                // the first half of `>>` may close this list alone
                angles = angles.saturating_sub(closed);
                if angles == 0 {
                    let follows_list = tokens.get(i + 1).is_none_or(|next| {
                        matches!(
                            next.kind,
                            TokenKind::LeftParen
                                | TokenKind::LeftBrace
                                | TokenKind::ColonColon
                                | TokenKind::RightParen
                                | TokenKind::Comma
                                | TokenKind::Semicolon
                                | TokenKind::Greater
                                | TokenKind::GreaterGreater
                        )
                    });
                    return follows_list.then_some(i);
                }
            }
            TokenKind::LeftParen | TokenKind::LeftBracket => groups += 1,
            TokenKind::RightParen | TokenKind::RightBracket => groups = groups.checked_sub(1)?,
            TokenKind::Semicolon | TokenKind::LeftBrace | TokenKind::RightBrace => return None,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use cxxdecl_parser::Lexer;

    fn build(source: &str) -> String {
        let arena = Bump::new();
        let mut builder = SignatureBuilder::new();
        for token in Lexer::new(source, &arena) {
            builder.append(token.lexeme);
        }
        builder.finish()
    }

    fn expression(source: &str) -> String {
        let arena = Bump::new();
        let tokens: Vec<_> = Lexer::new(source, &arena).collect();
        expression_text(&tokens)
    }

    #[test]
    fn normalizes_declaration_spacing() {
        assert_eq!(build("int   Bar ( int x ,int y )"), "int Bar(int x, int y)");
        assert_eq!(build("const char * name"), "const char *name");
        assert_eq!(build("const char & c"), "const char &c");
        assert_eq!(build("std :: vector < int > v"), "std::vector<int> v");
        assert_eq!(build("virtual ~ Foo ( )"), "virtual ~Foo()");
        assert_eq!(build("double m [ 4 ] [ 4 ]"), "double m[4][4]");
    }

    #[test]
    fn nested_declarators_are_set_apart_from_types() {
        let mut builder = SignatureBuilder::new();
        builder.append("void");
        builder.open_nested();
        builder.append("*");
        builder.append("callback");
        builder.append(")");
        builder.append("(");
        builder.append("int");
        builder.append(")");
        assert_eq!(builder.finish(), "void (*callback)(int)");

        builder.append("int");
        builder.append("*");
        builder.open_nested();
        builder.append("*");
        builder.append(")");
        assert_eq!(builder.finish(), "int *(*)");

        builder.append("std::vector<int>");
        builder.open_nested();
        builder.append("&");
        builder.append("rows");
        builder.append(")");
        assert_eq!(builder.finish(), "std::vector<int> (&rows)");
    }

    #[test]
    fn cut_removes_default_argument() {
        let arena = Bump::new();
        let tokens: Vec<_> = Lexer::new("int y = 2", &arena).collect();
        let mut builder = SignatureBuilder::new();
        builder.append("void f(");
        builder.append_tokens(&tokens[..2]);
        let before_default = builder.mark();
        builder.append("=");
        let value = builder.mark();
        builder.append_expression(&tokens[3..]);
        assert_eq!(builder.cut_since(value), "2");
        assert_eq!(builder.cut_since(before_default), "=");
        builder.append(")");
        assert_eq!(builder.finish(), "void f(int y)");
    }

    #[test]
    fn copy_leaves_text_in_place() {
        let mut builder = SignatureBuilder::new();
        builder.append("void");
        let mark = builder.mark();
        builder.append("(*cb)");
        assert_eq!(builder.copy_since(mark), "(*cb)");
        assert_eq!(builder.as_str(), "void (*cb)");
    }

    #[test]
    fn closed_builder_ignores_appends() {
        let mut builder = SignatureBuilder::new();
        builder.append("int f()");
        builder.close();
        builder.close();
        builder.append("const");
        builder.open();
        assert!(builder.is_closed());
        builder.append("noexcept");
        builder.open();
        builder.append(";");
        assert_eq!(builder.finish(), "int f();");
    }

    #[test]
    fn expressions_keep_binary_operators_spaced() {
        assert_eq!(expression("( N + 1 ) * sizeof ( int )"), "(N + 1) * sizeof(int)");
        assert_eq!(expression("- 1"), "-1");
        assert_eq!(expression("Green<<1"), "Green << 1");
        assert_eq!(expression("a . b -> c ( 1 , 2 )"), "a.b->c(1, 2)");
        assert_eq!(expression("std :: min ( x , - y )"), "std::min(x, -y)");
    }

    #[test]
    fn template_arguments_are_written_tight() {
        assert_eq!(expression("A < int > ( 3 , 4 )"), "A<int>(3, 4)");
        assert_eq!(expression("f<1,2>(3)"), "f<1, 2>(3)");
        assert_eq!(expression("std::vector<std::pair<int, char *> >()"), "std::vector<std::pair<int, char *>>()");
        assert_eq!(expression("Box<Box<int>>(1)"), "Box<Box<int>>(1)");
        assert_eq!(expression("Limits<int>::max()"), "Limits<int>::max()");
        // comparisons stay spaced
        assert_eq!(expression("a < b"), "a < b");
        assert_eq!(expression("a < b > c"), "a < b > c");
        assert_eq!(expression("(x < y) > z"), "(x < y) > z");
    }
}
