//! Error types shared by every stage of header processing.
//!
//! ## Error Hierarchy
//!
//! ```text
//! LexError         - tokenization (unterminated literals, stray characters)
//! PreprocessError  - directives, conditionals, constant expressions
//! ParseError       - declaration syntax (with ParseErrorKind), ambiguity
//! TypeError        - base type combination, indirection overflow
//! ```
//!
//! Attribute and hints errors belong to the assembler and live next to it.
//! The `cxxdecl` crate wraps all of them in a single `Error`.

use thiserror::Error;

use crate::Span;
use crate::type_code::BaseType;

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors raised while splitting header text into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    #[error("unterminated string literal at {span}")]
    UnterminatedString { span: Span },

    #[error("unterminated character literal at {span}")]
    UnterminatedChar { span: Span },

    #[error("unterminated comment at {span}")]
    UnterminatedComment { span: Span },

    #[error("invalid number at {span}: {detail}")]
    InvalidNumber { span: Span, detail: String },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
            LexError::UnterminatedString { span } => *span,
            LexError::UnterminatedChar { span } => *span,
            LexError::UnterminatedComment { span } => *span,
            LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

// ============================================================================
// Preprocessor Errors
// ============================================================================

/// Errors raised while interpreting directives and constant expressions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreprocessError {
    #[error("malformed #{directive} directive at {span}: {detail}")]
    MalformedDirective {
        directive: String,
        span: Span,
        detail: String,
    },

    #[error("unknown directive #{name} at {span}")]
    UnknownDirective { name: String, span: Span },

    #[error("#{directive} without matching #if at {span}")]
    UnbalancedConditional { directive: String, span: Span },

    #[error("unterminated conditional opened at {span}")]
    UnterminatedConditional { span: Span },

    #[error("#error at {span}: {message}")]
    ErrorDirective { message: String, span: Span },

    #[error("invalid constant expression '{expression}': {detail}")]
    InvalidExpression { expression: String, detail: String },

    #[error("division by zero in constant expression '{expression}'")]
    DivisionByZero { expression: String },

    #[error("macro '{name}' invoked with {found} argument(s), expected {expected} at {span}")]
    MacroArguments {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("unterminated invocation of macro '{name}' at {span}")]
    UnterminatedInvocation { name: String, span: Span },

    #[error("cannot read include file '{path}': {detail}")]
    IncludeUnreadable { path: String, detail: String },

    #[error(transparent)]
    Lex(#[from] LexError),
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of declaration syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    // Token-level errors
    ExpectedToken,
    UnexpectedToken,
    UnexpectedEof,

    // Type errors
    ExpectedType,
    InvalidType,
    ExpectedTemplateArgs,

    // Declaration errors
    ExpectedDeclaration,
    InvalidDeclaration,
    ExpectedParameters,
    ExpectedClassMember,
    ExpectedIdentifier,

    // Syntax errors
    MismatchedDelimiter,
    MissingSemicolon,
    InvalidSyntax,

    // Modifier errors
    InvalidModifier,
    ConflictingModifiers,

    /// More than one alternative parse survived with the same priority.
    Ambiguous,
    /// Parsing stopped because the caller cancelled it.
    Cancelled,
    InternalError,
}

impl ParseErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of file",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::InvalidType => "invalid type",
            ParseErrorKind::ExpectedTemplateArgs => "expected template arguments",
            ParseErrorKind::ExpectedDeclaration => "expected declaration",
            ParseErrorKind::InvalidDeclaration => "invalid declaration",
            ParseErrorKind::ExpectedParameters => "expected parameters",
            ParseErrorKind::ExpectedClassMember => "expected class member",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::MismatchedDelimiter => "mismatched delimiter",
            ParseErrorKind::MissingSemicolon => "missing semicolon",
            ParseErrorKind::InvalidSyntax => "invalid syntax",
            ParseErrorKind::InvalidModifier => "invalid modifier",
            ParseErrorKind::ConflictingModifiers => "conflicting modifiers",
            ParseErrorKind::Ambiguous => "ambiguous declaration",
            ParseErrorKind::Cancelled => "cancelled",
            ParseErrorKind::InternalError => "internal error",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A syntax error with its location and the offending text.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found '{found}'"),
        )
    }

    pub fn unexpected_token(span: Span, token: &str) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedToken,
            span,
            format!("unexpected token '{token}'"),
        )
    }

    pub fn unexpected_eof(span: Span) -> Self {
        Self::new(ParseErrorKind::UnexpectedEof, span, "unexpected end of file")
    }

    pub fn expected_identifier(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedIdentifier,
            span,
            format!("expected identifier, found '{found}'"),
        )
    }

    pub fn expected_type(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedType,
            span,
            format!("expected type, found '{found}'"),
        )
    }

    pub fn ambiguous(span: Span, first: &str, second: &str) -> Self {
        Self::new(
            ParseErrorKind::Ambiguous,
            span,
            format!("both '{first}' and '{second}' apply"),
        )
    }

    pub fn cancelled(span: Span) -> Self {
        Self::new(ParseErrorKind::Cancelled, span, "parse cancelled by caller")
    }

    /// Render the error with the offending source line and a caret.
    pub fn display_with_source(&self, source: &str) -> String {
        let mut output = String::new();
        let line = self.span.line;
        let column = self.span.col;

        output.push_str(&format!("error at {}:{}: {}\n", line, column, self.kind));
        if !self.message.is_empty() {
            output.push_str(&format!("  {}\n", self.message));
        }

        if let Some(line_text) = source.lines().nth(line.saturating_sub(1) as usize) {
            output.push_str("  |\n");
            output.push_str(&format!("{:>3} | {}\n", line, line_text));
            let indent = " ".repeat(column.saturating_sub(1) as usize);
            let pointer = if self.span.len <= 1 {
                "^".to_string()
            } else {
                "^".to_string() + &"~".repeat((self.span.len - 1) as usize)
            };
            output.push_str(&format!("  | {}{}\n", indent, pointer));
        }

        output
    }
}

/// The errors collected by a lenient parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    pub fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl From<ParseError> for ParseErrors {
    fn from(error: ParseError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl FromIterator<ParseError> for ParseErrors {
    fn from_iter<T: IntoIterator<Item = ParseError>>(iter: T) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.errors.as_slice() {
            [] => write!(f, "no errors"),
            [single] => write!(f, "{single}"),
            errors => {
                writeln!(f, "{} errors:", errors.len())?;
                for (i, error) in errors.iter().enumerate() {
                    writeln!(f, "  {}: {}", i + 1, error)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ParseErrors {}

// ============================================================================
// Type Errors
// ============================================================================

/// Errors raised by the type encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("cannot combine '{first}' with '{second}'")]
    IncompatibleBase { first: BaseType, second: BaseType },

    #[error("too many 'long' specifiers")]
    TooManyLongs,

    #[error("indirection chain exceeds {max} levels")]
    IndirectionOverflow { max: usize },

    #[error("pointer or array of reference")]
    IndirectionThroughReference,

    #[error("reference to reference")]
    InvalidReference,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display_includes_position() {
        let error = ParseError::expected_token(Span::new(3, 7, 1), "';'", "}");
        let text = error.to_string();
        assert!(text.starts_with("expected token at 3:7"));
        assert!(text.contains("expected ';', found '}'"));
    }

    #[test]
    fn display_with_source_points_at_column() {
        let source = "class Foo {\n  int x\n};";
        let error = ParseError::new(
            ParseErrorKind::MissingSemicolon,
            Span::new(2, 8, 1),
            "expected ';' after member",
        );
        let rendered = error.display_with_source(source);
        assert!(rendered.contains("  2 |   int x"));
        assert!(rendered.contains("  |        ^"));
    }

    #[test]
    fn display_with_source_underlines_long_span() {
        let error = ParseError::new(ParseErrorKind::InvalidType, Span::new(1, 1, 4), "");
        let rendered = error.display_with_source("long float x;");
        assert!(rendered.contains("^~~~"));
        assert!(!rendered.contains("\n  \n"));
    }

    #[test]
    fn parse_errors_display_counts() {
        let errors: ParseErrors = vec![
            ParseError::unexpected_token(Span::new(1, 1, 1), "}"),
            ParseError::unexpected_eof(Span::new(9, 1, 0)),
        ]
        .into_iter()
        .collect();
        let text = errors.to_string();
        assert!(text.starts_with("2 errors:"));
        assert!(text.contains("unexpected end of file"));
    }

    #[test]
    fn lex_error_span() {
        let error = LexError::UnterminatedComment {
            span: Span::new(4, 2, 10),
        };
        assert_eq!(error.span(), Span::new(4, 2, 10));
    }

    #[test]
    fn preprocess_error_wraps_lex_error() {
        let lex = LexError::UnexpectedChar {
            ch: '$',
            span: Span::point(1, 1),
        };
        let error: PreprocessError = lex.clone().into();
        assert_eq!(error.to_string(), lex.to_string());
    }

    #[test]
    fn type_error_messages() {
        let error = TypeError::IncompatibleBase {
            first: BaseType::Float,
            second: BaseType::Int,
        };
        assert_eq!(error.to_string(), "cannot combine 'float' with 'int'");
        assert_eq!(
            TypeError::IndirectionOverflow { max: 7 }.to_string(),
            "indirection chain exceeds 7 levels"
        );
    }
}
