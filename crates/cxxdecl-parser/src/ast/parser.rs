//! Parser infrastructure for C++ declarations.
//!
//! Provides the [`Parser`] struct with token navigation, checkpoints for
//! speculative parsing, and the balanced-token capture used for everything
//! the parser does not look inside (initializers, bodies, array sizes).

use bumpalo::Bump;
use cxxdecl_core::{CancellationToken, ParseError, ParseErrorKind, ParseErrors, Span};

use crate::lexer::{Token, TokenKind};

/// How the parser reacts to a syntax error.
#[derive(Debug, Clone, Default)]
pub struct ParserOptions {
    /// Skip the offending declaration and keep going instead of aborting.
    pub recover: bool,
    /// Checked before every top-level declaration.
    pub cancel: Option<CancellationToken>,
}

/// A saved parser position.
///
/// Restoring a checkpoint undoes every token consumed since it was taken,
/// including half of a split `>>`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint<'ast> {
    position: usize,
    split: Option<Token<'ast>>,
}

/// The parser for preprocessed C++ header tokens.
///
/// The parser owns the token buffer produced by the preprocessor and
/// allocates every AST node in the arena. Speculative alternatives rewind
/// with [`Checkpoint`]s; nothing outside the parser is touched while parsing.
pub struct Parser<'ast> {
    /// Buffered tokens, ending with `Eof`.
    pub(super) buffer: Vec<Token<'ast>>,
    /// Current position in the buffer
    pub(super) position: usize,
    /// Errors collected in recovery mode
    pub(super) errors: ParseErrors,
    /// Arena allocator for AST nodes
    pub(super) arena: &'ast Bump,
    /// The second `>` of a `>>` whose first half closed a template list.
    split: Option<Token<'ast>>,
    /// Depth of nested fork alternatives; errors inside one are not recovered.
    pub(super) speculating: usize,
    pub(super) options: ParserOptions,
}

impl<'ast> Parser<'ast> {
    /// Create a parser over a preprocessed token stream.
    ///
    /// An `Eof` token is appended if the stream does not end with one.
    pub fn new(mut tokens: Vec<Token<'ast>>, arena: &'ast Bump) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let span = tokens
                .last()
                .map(|t| Span::point(t.span.line, t.span.end_col()))
                .unwrap_or_else(|| Span::point(1, 1));
            tokens.push(Token::new(TokenKind::Eof, "", span));
        }
        Self {
            buffer: tokens,
            position: 0,
            errors: ParseErrors::new(),
            arena,
            split: None,
            speculating: 0,
            options: ParserOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Take the errors, leaving an empty error collection.
    pub fn take_errors(&mut self) -> ParseErrors {
        std::mem::take(&mut self.errors)
    }

    // ========================================================================
    // Token Navigation
    // ========================================================================

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Token<'ast> {
        match self.split {
            Some(token) => token,
            None => self.token_at(self.position),
        }
    }

    /// Peek ahead n tokens without consuming.
    pub fn peek_nth(&self, n: usize) -> Token<'ast> {
        match (self.split, n) {
            (Some(token), 0) => token,
            (Some(_), n) => self.token_at(self.position + n - 1),
            (None, n) => self.token_at(self.position + n),
        }
    }

    fn token_at(&self, index: usize) -> Token<'ast> {
        let last = self.buffer.len() - 1;
        self.buffer[index.min(last)]
    }

    /// The most recently consumed token.
    pub(super) fn previous(&self) -> Token<'ast> {
        self.buffer[self.position.saturating_sub(1)]
    }

    /// Get the current token and advance to the next.
    pub fn advance(&mut self) -> Token<'ast> {
        if let Some(token) = self.split.take() {
            return token;
        }
        let token = self.token_at(self.position);
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    /// Check if the current token matches the given kind.
    pub fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Check if the current token is EOF.
    pub fn is_eof(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// If the current token matches the given kind, consume it and return Some.
    /// Otherwise, return None without consuming.
    pub fn eat(&mut self, kind: TokenKind) -> Option<Token<'ast>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Expect the current token to be of the given kind.
    /// If it matches, consume and return it. Otherwise, return an error.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token<'ast>, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.description()))
        }
    }

    /// Check if the current token is an identifier with the given name.
    /// This is used for contextual keywords such as `override` and `final`.
    pub fn check_contextual(&self, name: &str) -> bool {
        self.peek().is_ident(name)
    }

    /// Consume an identifier if it matches the given contextual keyword.
    pub fn eat_contextual(&mut self, name: &str) -> Option<Token<'ast>> {
        if self.check_contextual(name) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consume a `>` closing a template list.
    ///
    /// A `>>` is split: its first half is consumed here and the second is
    /// left as the next token.
    pub(super) fn eat_closing_angle(&mut self) -> Option<Token<'ast>> {
        let token = self.peek();
        match token.kind {
            TokenKind::Greater => Some(self.advance()),
            TokenKind::GreaterGreater if self.split.is_none() => {
                self.position += 1;
                let first = Token::new(TokenKind::Greater, ">", Span::new(token.span.line, token.span.col, 1));
                self.split = Some(Token::new(
                    TokenKind::Greater,
                    ">",
                    Span::new(token.span.line, token.span.col + 1, 1),
                ));
                Some(first)
            }
            _ => None,
        }
    }

    pub(super) fn expect_closing_angle(&mut self) -> Result<Token<'ast>, ParseError> {
        self.eat_closing_angle().ok_or_else(|| self.unexpected("'>'"))
    }

    pub(super) fn checkpoint(&self) -> Checkpoint<'ast> {
        Checkpoint {
            position: self.position,
            split: self.split,
        }
    }

    pub(super) fn restore(&mut self, checkpoint: Checkpoint<'ast>) {
        self.position = checkpoint.position;
        self.split = checkpoint.split;
    }

    /// A monotonic measure of how far the parser has read.
    pub(super) fn progress(&self) -> usize {
        self.position * 2 + usize::from(self.split.is_none())
    }

    // ========================================================================
    // Error Handling
    // ========================================================================

    /// An error describing the current token as unexpected.
    pub(super) fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            ParseError::new(
                ParseErrorKind::UnexpectedEof,
                token.span,
                format!("expected {expected}, found end of file"),
            )
        } else {
            ParseError::expected_token(token.span, expected, token.lexeme)
        }
    }

    pub(super) fn error(&self, kind: ParseErrorKind, message: impl Into<String>) -> ParseError {
        ParseError::new(kind, self.peek().span, message)
    }

    /// Fail if the caller asked the parse to stop.
    pub(super) fn check_cancelled(&self) -> Result<(), ParseError> {
        match &self.options.cancel {
            Some(token) if token.is_cancelled() => Err(ParseError::cancelled(self.peek().span)),
            _ => Ok(()),
        }
    }

    /// Skip the rest of a declaration that failed to parse.
    ///
    /// Stops after a `;` or a balanced `{ ... }` (plus an optional `;`) at
    /// the starting depth, or before a `}` that closes the enclosing scope.
    /// Always consumes at least one token unless at such a `}` or EOF.
    pub(super) fn skip_declaration(&mut self) {
        let start = self.position;
        self.split = None;
        while !self.is_eof() {
            match self.peek().kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::LeftBrace => {
                    self.skip_group();
                    self.eat(TokenKind::Semicolon);
                    return;
                }
                TokenKind::RightBrace => {
                    if self.position == start {
                        self.advance();
                    }
                    return;
                }
                TokenKind::LeftParen | TokenKind::LeftBracket => {
                    self.skip_group();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ========================================================================
    // Balanced Token Runs
    // ========================================================================

    /// Skip a bracketed group starting at the current opener, returning the
    /// tokens between the outer brackets.
    ///
    /// Unbalanced input stops at EOF; the caller sees the missing closer.
    pub(super) fn skip_group(&mut self) -> &'ast [Token<'ast>] {
        let Some(outer) = closer_of(self.peek().kind) else {
            return &[];
        };
        self.advance();
        let mut stack = vec![outer];
        let mut inner = Vec::new();
        while !stack.is_empty() {
            let kind = self.peek().kind;
            if kind == TokenKind::Eof {
                break;
            }
            if let Some(closer) = closer_of(kind) {
                stack.push(closer);
            } else if is_closer(kind) && stack.contains(&kind) {
                while stack.pop().is_some_and(|closer| closer != kind) {}
                if stack.is_empty() {
                    self.advance();
                    break;
                }
            }
            inner.push(self.advance());
        }
        self.arena.alloc_slice_copy(&inner)
    }

    /// Consume `open ... close` and return the tokens in between.
    pub(super) fn expect_group(&mut self, open: TokenKind) -> Result<&'ast [Token<'ast>], ParseError> {
        if !self.check(open) {
            return Err(self.unexpected(open.description()));
        }
        let close = match open {
            TokenKind::LeftParen => TokenKind::RightParen,
            TokenKind::LeftBracket => TokenKind::RightBracket,
            _ => TokenKind::RightBrace,
        };
        let inner = self.skip_group();
        if self.previous().kind != close {
            return Err(ParseError::new(
                ParseErrorKind::MismatchedDelimiter,
                self.peek().span,
                format!("expected {} to close group", close.description()),
            ));
        }
        Ok(inner)
    }

    /// Capture an expression up to (not including) a stop token at depth 0.
    ///
    /// Brackets nest; a `<` after a name opens a template argument list when
    /// a matching `>` follows. Stops at `;`, EOF and unbalanced closers
    /// regardless of `stops`.
    pub(super) fn capture_expression(&mut self, stops: &[TokenKind]) -> &'ast [Token<'ast>] {
        let mut captured = Vec::new();
        let mut stack: Vec<TokenKind> = Vec::new();
        loop {
            let token = self.peek();
            let kind = token.kind;
            if stack.is_empty() && (stops.contains(&kind) || is_hard_stop(kind)) {
                break;
            }
            // `>>` closing this list and an enclosing one; the caller splits it.
            if stack.is_empty() && kind == TokenKind::GreaterGreater && stops.contains(&TokenKind::Greater) {
                break;
            }
            if kind == TokenKind::Eof || (stack.is_empty() && is_closer(kind)) {
                break;
            }
            match kind {
                TokenKind::LeftParen => stack.push(TokenKind::RightParen),
                TokenKind::LeftBracket => stack.push(TokenKind::RightBracket),
                TokenKind::LeftBrace => stack.push(TokenKind::RightBrace),
                TokenKind::Less
                    if captured.last().is_some_and(|t: &Token| t.kind == TokenKind::Identifier)
                        && self.looks_like_template_args() =>
                {
                    stack.push(TokenKind::Greater)
                }
                TokenKind::Greater if stack.last() == Some(&TokenKind::Greater) => {
                    stack.pop();
                }
                TokenKind::GreaterGreater if stack.last() == Some(&TokenKind::Greater) => {
                    stack.pop();
                    if stack.last() == Some(&TokenKind::Greater) {
                        stack.pop();
                    } else if stack.is_empty() && stops.contains(&TokenKind::Greater) {
                        // The second half closes an enclosing list.
                        if let Some(first) = self.eat_closing_angle() {
                            captured.push(first);
                        }
                        break;
                    }
                }
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                    while let Some(closer) = stack.pop() {
                        if closer == kind {
                            break;
                        }
                    }
                }
                _ => {}
            }
            captured.push(self.advance());
        }
        self.arena.alloc_slice_copy(&captured)
    }

    /// Whether the `<` at the current position opens a template argument
    /// list: a matching `>` follows before anything that cannot appear in
    /// one.
    pub(super) fn looks_like_template_args(&self) -> bool {
        let mut angles = 0usize;
        let mut brackets = 0usize;
        let mut offset = 0;
        loop {
            let token = self.peek_nth(offset);
            offset += 1;
            match token.kind {
                TokenKind::Less => angles += 1,
                TokenKind::Greater if brackets == 0 => {
                    angles -= 1;
                    if angles == 0 {
                        return true;
                    }
                }
                TokenKind::GreaterGreater if brackets == 0 => {
                    if angles <= 2 {
                        return true;
                    }
                    angles -= 2;
                }
                TokenKind::LeftParen | TokenKind::LeftBracket => brackets += 1,
                TokenKind::RightParen | TokenKind::RightBracket => {
                    if brackets == 0 {
                        return false;
                    }
                    brackets -= 1;
                }
                TokenKind::Semicolon
                | TokenKind::LeftBrace
                | TokenKind::RightBrace
                | TokenKind::AmpAmp
                | TokenKind::PipePipe
                | TokenKind::Eof => return false,
                _ => {}
            }
        }
    }
}

fn is_hard_stop(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Semicolon | TokenKind::Eof)
}

/// The closing bracket for an opening one.
pub(super) fn closer_of(kind: TokenKind) -> Option<TokenKind> {
    match kind {
        TokenKind::LeftParen => Some(TokenKind::RightParen),
        TokenKind::LeftBracket => Some(TokenKind::RightBracket),
        TokenKind::LeftBrace => Some(TokenKind::RightBrace),
        _ => None,
    }
}

fn is_closer(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace)
}
