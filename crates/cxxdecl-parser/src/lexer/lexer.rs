//! The header lexer.
//!
//! [`Lexer`] turns header text into [`Token`]s by dispatching on the first
//! character. Besides ordinary tokens it produces three kinds the parser
//! never sees directly:
//!
//! - `Directive`: a whole `#` line, continuations joined and comments removed
//! - `Comment`: the full text of a `//` or `/* */` comment
//! - `BlankLine`: a line with nothing but whitespace
//!
//! The preprocessor consumes directives and forwards comments and blank
//! lines to the comment tracker.
//!
//! Lexemes are copied into the arena so the source text can be dropped once
//! lexing completes.

use bumpalo::Bump;
use cxxdecl_core::{LexError, Span};

use super::cursor::{Cursor, is_ident_continue, is_ident_continue_ascii, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

/// Lexer for C++ header text.
pub struct Lexer<'src, 'ast> {
    cursor: Cursor<'src>,
    arena: &'ast Bump,
    errors: Vec<LexError>,
    /// Recognize `#` at the start of a line as a directive.
    directives: bool,
    /// Nothing but whitespace has been seen on the current line.
    line_blank: bool,
}

impl<'src, 'ast> Lexer<'src, 'ast> {
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self {
            cursor: Cursor::new(source),
            arena,
            errors: Vec::new(),
            directives: true,
            line_blank: true,
        }
    }

    /// A lexer for text that is not a whole file, such as a macro body or a
    /// constant expression. `#` and `##` become ordinary tokens.
    pub fn for_fragment(source: &'src str, arena: &'ast Bump) -> Self {
        Self {
            directives: false,
            line_blank: false,
            ..Self::new(source, arena)
        }
    }

    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn next_token(&mut self) -> Token<'ast> {
        self.scan_token()
    }

    // =========================================
    // Internal: Token scanning
    // =========================================

    fn scan_token(&mut self) -> Token<'ast> {
        if let Some(blank) = self.skip_whitespace() {
            return blank;
        }

        let start_line = self.cursor.line();
        let start_col = self.cursor.column();
        let start_offset = self.cursor.offset();

        let Some(first) = self.cursor.peek() else {
            return self.make_eof();
        };

        let at_line_start = self.line_blank;
        self.line_blank = false;

        match first {
            '#' if self.directives && at_line_start => {
                self.scan_directive(start_line, start_col, start_offset)
            }
            '/' => self.scan_slash(start_line, start_col, start_offset),
            '"' => self.scan_string(start_line, start_col, start_offset),
            '\'' => self.scan_char(start_line, start_col, start_offset),
            c if c.is_ascii_digit() => self.scan_number(start_line, start_col, start_offset),
            '.' if self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.scan_number(start_line, start_col, start_offset)
            }
            c if is_ident_start(c) => self.scan_identifier(start_line, start_col, start_offset),
            _ => self.scan_operator(start_line, start_col, start_offset),
        }
    }

    /// Skip whitespace and line continuations. Returns a `BlankLine` token
    /// when a line holding only whitespace ends.
    fn skip_whitespace(&mut self) -> Option<Token<'ast>> {
        if self.cursor.check_str("\u{FEFF}") {
            self.cursor.advance_bytes(3);
        }

        loop {
            if self.cursor.at_line_continuation() {
                self.cursor.advance();
                self.cursor.eat('\r');
                self.cursor.advance();
                continue;
            }
            match self.cursor.peek() {
                Some('\n') => {
                    let line = self.cursor.line();
                    let col = self.cursor.column();
                    let was_blank = self.line_blank;
                    self.cursor.advance();
                    self.line_blank = true;
                    if was_blank && self.directives {
                        let lexeme = self.arena.alloc_str("");
                        return Some(Token::new(
                            TokenKind::BlankLine,
                            lexeme,
                            Span::point(line, col),
                        ));
                    }
                }
                Some(c) if c.is_ascii_whitespace() => {
                    self.cursor.advance();
                }
                _ => return None,
            }
        }
    }

    fn make_eof(&self) -> Token<'ast> {
        let lexeme = self.arena.alloc_str("");
        Token::new(
            TokenKind::Eof,
            lexeme,
            Span::point(self.cursor.line(), self.cursor.column()),
        )
    }

    /// Token covering `start_offset` up to the cursor, lexeme copied into the
    /// arena.
    fn make_token(
        &self,
        kind: TokenKind,
        start_line: u32,
        start_col: u32,
        start_offset: u32,
    ) -> Token<'ast> {
        let text = self.cursor.slice_from(start_offset);
        let span = Span::new(start_line, start_col, text.len() as u32);
        Token::new(kind, self.arena.alloc_str(text), span)
    }

    fn make_error(&mut self, error: LexError) -> Token<'ast> {
        let span = error.span();
        self.errors.push(error);
        Token::new(TokenKind::Error, self.arena.alloc_str(""), span)
    }

    fn span_from(&self, start_line: u32, start_col: u32, start_offset: u32) -> Span {
        Span::new(start_line, start_col, self.cursor.offset() - start_offset)
    }

    // =========================================
    // Scanning: Directives
    // =========================================

    /// Scan a directive line. Continuations are joined with a space and
    /// comments are replaced by a single space.
    fn scan_directive(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        let mut text = String::new();
        loop {
            if self.cursor.at_line_continuation() {
                self.cursor.advance();
                self.cursor.eat('\r');
                self.cursor.advance();
                text.push(' ');
                continue;
            }
            match self.cursor.peek() {
                None | Some('\n') => break,
                Some('\r') if self.cursor.peek_nth(1) == Some('\n') => {
                    self.cursor.advance();
                }
                Some('/') if self.cursor.check_str("//") => {
                    self.cursor.eat_line();
                    break;
                }
                Some('/') if self.cursor.check_str("/*") => {
                    let comment_line = self.cursor.line();
                    let comment_col = self.cursor.column();
                    let comment_offset = self.cursor.offset();
                    self.cursor.advance_bytes(2);
                    if !self.skip_block_comment_body() {
                        let span = self.span_from(comment_line, comment_col, comment_offset);
                        return self.make_error(LexError::UnterminatedComment { span });
                    }
                    text.push(' ');
                }
                Some(quote @ ('"' | '\'')) => {
                    text.push(quote);
                    self.cursor.advance();
                    while let Some(c) = self.cursor.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.cursor.advance();
                        text.push(c);
                        if c == '\\' {
                            if let Some(escaped) = self.cursor.peek().filter(|&e| e != '\n') {
                                self.cursor.advance();
                                text.push(escaped);
                            }
                        } else if c == quote {
                            break;
                        }
                    }
                }
                Some(c) => {
                    self.cursor.advance();
                    text.push(c);
                }
            }
        }

        let span = self.span_from(start_line, start_col, start_offset);
        let lexeme = self.arena.alloc_str(text.trim_end());
        Token::new(TokenKind::Directive, lexeme, span)
    }

    // =========================================
    // Scanning: Comments and slash
    // =========================================

    fn scan_slash(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        self.cursor.advance();

        match self.cursor.peek() {
            Some('/') => {
                self.cursor.eat_line();
                let mut token = self.make_token(TokenKind::Comment, start_line, start_col, start_offset);
                token.lexeme = token.lexeme.trim_end_matches('\r');
                token
            }
            Some('*') => {
                self.cursor.advance();
                if self.skip_block_comment_body() {
                    self.make_token(TokenKind::Comment, start_line, start_col, start_offset)
                } else {
                    let span = self.span_from(start_line, start_col, start_offset);
                    self.make_error(LexError::UnterminatedComment { span })
                }
            }
            Some('=') => {
                self.cursor.advance();
                self.make_token(TokenKind::SlashEqual, start_line, start_col, start_offset)
            }
            _ => self.make_token(TokenKind::Slash, start_line, start_col, start_offset),
        }
    }

    /// Consume through the closing `*/`. Returns false at end of input.
    fn skip_block_comment_body(&mut self) -> bool {
        match self.cursor.rest().find("*/") {
            Some(end) => {
                self.cursor.advance_bytes(end + 2);
                true
            }
            None => {
                let len = self.cursor.rest().len();
                self.cursor.advance_bytes(len);
                false
            }
        }
    }

    // =========================================
    // Scanning: Strings and characters
    // =========================================

    /// Scan a quoted string. The cursor may sit after an encoding prefix.
    fn scan_string(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        self.cursor.advance();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    let span = self.span_from(start_line, start_col, start_offset);
                    return self.make_error(LexError::UnterminatedString { span });
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                Some('"') => {
                    self.cursor.advance();
                    self.eat_ud_suffix();
                    return self.make_token(TokenKind::StringLiteral, start_line, start_col, start_offset);
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    /// Scan `R"delim(...)delim"`. The cursor sits on the opening quote.
    fn scan_raw_string(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        self.cursor.advance();
        let delimiter = self.cursor.eat_while(|c| c != '(' && c != '\n' && c != '"');
        if !self.cursor.eat('(') {
            let span = self.span_from(start_line, start_col, start_offset);
            return self.make_error(LexError::UnterminatedString { span });
        }
        let closing = format!("){delimiter}\"");
        match self.cursor.rest().find(&closing) {
            Some(end) => {
                self.cursor.advance_bytes(end + closing.len());
                self.make_token(TokenKind::StringLiteral, start_line, start_col, start_offset)
            }
            None => {
                let len = self.cursor.rest().len();
                self.cursor.advance_bytes(len);
                let span = self.span_from(start_line, start_col, start_offset);
                self.make_error(LexError::UnterminatedString { span })
            }
        }
    }

    fn scan_char(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        self.cursor.advance();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    let span = self.span_from(start_line, start_col, start_offset);
                    return self.make_error(LexError::UnterminatedChar { span });
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                Some('\'') => {
                    self.cursor.advance();
                    return self.make_token(TokenKind::CharLiteral, start_line, start_col, start_offset);
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    /// User-defined literal suffix (`"abc"_s`).
    fn eat_ud_suffix(&mut self) {
        if self.cursor.check(|c| c == '_') {
            self.cursor.eat_while_ascii(is_ident_continue_ascii);
        }
    }

    // =========================================
    // Scanning: Numbers
    // =========================================

    /// Scan a preprocessing number and classify it as integer or float.
    fn scan_number(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        let is_hex = self.cursor.check_str("0x") || self.cursor.check_str("0X");
        loop {
            match self.cursor.peek() {
                Some('e' | 'E') if !is_hex => {
                    self.cursor.advance();
                    if matches!(self.cursor.peek(), Some('+' | '-')) {
                        self.cursor.advance();
                    }
                }
                Some('p' | 'P') if is_hex => {
                    self.cursor.advance();
                    if matches!(self.cursor.peek(), Some('+' | '-')) {
                        self.cursor.advance();
                    }
                }
                Some('\'') if self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_alphanumeric()) => {
                    self.cursor.advance();
                }
                Some(c) if c.is_ascii_alphanumeric() || c == '.' || c == '_' => {
                    self.cursor.advance();
                }
                _ => break,
            }
        }

        let text = self.cursor.slice_from(start_offset);
        let body = if is_hex { &text[2..] } else { text };
        if is_hex && !body.starts_with(|c: char| c.is_ascii_hexdigit() || c == '.') {
            let span = self.span_from(start_line, start_col, start_offset);
            return self.make_error(LexError::InvalidNumber {
                span,
                detail: "expected digits after '0x'".into(),
            });
        }

        let is_float = if is_hex {
            body.contains(['.', 'p', 'P'])
        } else {
            body.contains(['.', 'e', 'E'])
        };
        let kind = if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        };
        self.make_token(kind, start_line, start_col, start_offset)
    }

    // =========================================
    // Scanning: Identifiers and keywords
    // =========================================

    fn scan_identifier(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        self.cursor.eat_while_ascii(is_ident_continue_ascii);
        if self.cursor.check(|c| !c.is_ascii() && is_ident_continue(c)) {
            self.cursor.eat_while(is_ident_continue);
        }
        let word = self.cursor.slice_from(start_offset);

        match (word, self.cursor.peek()) {
            ("R" | "LR" | "uR" | "UR" | "u8R", Some('"')) => {
                return self.scan_raw_string(start_line, start_col, start_offset);
            }
            ("L" | "u" | "U" | "u8", Some('"')) => {
                return self.scan_string(start_line, start_col, start_offset);
            }
            ("L" | "u" | "U" | "u8", Some('\'')) => {
                return self.scan_char(start_line, start_col, start_offset);
            }
            _ => {}
        }

        let kind = lookup_keyword(word).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, start_line, start_col, start_offset)
    }

    // =========================================
    // Scanning: Operators
    // =========================================

    /// Scan an operator or punctuation token by matching on
    /// `(first_char, next_char)`.
    fn scan_operator(&mut self, start_line: u32, start_col: u32, start_offset: u32) -> Token<'ast> {
        let Some(c) = self.cursor.advance() else {
            return self.make_eof();
        };
        let next = self.cursor.peek();

        let kind = match (c, next) {
            ('(', _) => TokenKind::LeftParen,
            (')', _) => TokenKind::RightParen,
            ('[', _) => TokenKind::LeftBracket,
            (']', _) => TokenKind::RightBracket,
            ('{', _) => TokenKind::LeftBrace,
            ('}', _) => TokenKind::RightBrace,
            (';', _) => TokenKind::Semicolon,
            (',', _) => TokenKind::Comma,
            ('~', _) => TokenKind::Tilde,
            ('?', _) => TokenKind::Question,

            ('#', Some('#')) => { self.cursor.advance(); TokenKind::HashHash }
            ('#', _) => TokenKind::Hash,

            ('.', Some('*')) => { self.cursor.advance(); TokenKind::DotStar }
            ('.', Some('.')) if self.cursor.peek_nth(1) == Some('.') => {
                self.cursor.advance_bytes(2);
                TokenKind::Ellipsis
            }
            ('.', _) => TokenKind::Dot,

            (':', Some(':')) => { self.cursor.advance(); TokenKind::ColonColon }
            (':', _) => TokenKind::Colon,

            ('+', Some('+')) => { self.cursor.advance(); TokenKind::PlusPlus }
            ('+', Some('=')) => { self.cursor.advance(); TokenKind::PlusEqual }
            ('+', _) => TokenKind::Plus,

            ('-', Some('-')) => { self.cursor.advance(); TokenKind::MinusMinus }
            ('-', Some('=')) => { self.cursor.advance(); TokenKind::MinusEqual }
            ('-', Some('>')) => {
                self.cursor.advance();
                if self.cursor.eat('*') {
                    TokenKind::ArrowStar
                } else {
                    TokenKind::Arrow
                }
            }
            ('-', _) => TokenKind::Minus,

            ('*', Some('=')) => { self.cursor.advance(); TokenKind::StarEqual }
            ('*', _) => TokenKind::Star,

            ('%', Some('=')) => { self.cursor.advance(); TokenKind::PercentEqual }
            ('%', _) => TokenKind::Percent,

            ('=', Some('=')) => { self.cursor.advance(); TokenKind::EqualEqual }
            ('=', _) => TokenKind::Equal,

            ('!', Some('=')) => { self.cursor.advance(); TokenKind::BangEqual }
            ('!', _) => TokenKind::Bang,

            ('<', Some('=')) => {
                self.cursor.advance();
                if self.cursor.eat('>') {
                    TokenKind::Spaceship
                } else {
                    TokenKind::LessEqual
                }
            }
            ('<', Some('<')) => {
                self.cursor.advance();
                if self.cursor.eat('=') {
                    TokenKind::LessLessEqual
                } else {
                    TokenKind::LessLess
                }
            }
            ('<', _) => TokenKind::Less,

            // `>>` stays one token; the parser splits it when closing
            // nested template argument lists.
            ('>', Some('=')) => { self.cursor.advance(); TokenKind::GreaterEqual }
            ('>', Some('>')) => {
                self.cursor.advance();
                if self.cursor.eat('=') {
                    TokenKind::GreaterGreaterEqual
                } else {
                    TokenKind::GreaterGreater
                }
            }
            ('>', _) => TokenKind::Greater,

            ('&', Some('=')) => { self.cursor.advance(); TokenKind::AmpEqual }
            ('&', Some('&')) => { self.cursor.advance(); TokenKind::AmpAmp }
            ('&', _) => TokenKind::Amp,

            ('|', Some('=')) => { self.cursor.advance(); TokenKind::PipeEqual }
            ('|', Some('|')) => { self.cursor.advance(); TokenKind::PipePipe }
            ('|', _) => TokenKind::Pipe,

            ('^', Some('=')) => { self.cursor.advance(); TokenKind::CaretEqual }
            ('^', _) => TokenKind::Caret,

            _ => {
                let span = self.span_from(start_line, start_col, start_offset);
                return self.make_error(LexError::UnexpectedChar { ch: c, span });
            }
        };

        self.make_token(kind, start_line, start_col, start_offset)
    }
}

impl<'ast> Iterator for Lexer<'_, 'ast> {
    type Item = Token<'ast>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        (token.kind != TokenKind::Eof).then_some(token)
    }
}
