use std::path::PathBuf;

use cxxdecl_builder::{AttributeError, BuildError, HintsError};
use cxxdecl_core::{LexError, ParseError, ParseErrorKind, PreprocessError, Span, TypeError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every way parsing a header can fail.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(LexError),

    #[error(transparent)]
    Preprocess(PreprocessError),

    #[error(transparent)]
    Parse(ParseError),

    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error(transparent)]
    Hints(#[from] HintsError),

    #[error("at {span}: {source}")]
    Type { source: TypeError, span: Span },

    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing was cancelled")]
    Cancelled,
}

impl Error {
    /// Source position of the failure, when it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::Lex(error) => Some(error.span()),
            Error::Parse(error) => Some(error.span),
            Error::Attribute(error) => Some(BuildError::from(error.clone()).span()),
            Error::Type { span, .. } => Some(*span),
            Error::Preprocess(_) | Error::Hints(_) | Error::Io { .. } | Error::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<LexError> for Error {
    fn from(error: LexError) -> Self {
        Error::Lex(error)
    }
}

impl From<PreprocessError> for Error {
    fn from(error: PreprocessError) -> Self {
        match error {
            PreprocessError::Lex(error) => Error::Lex(error),
            other => Error::Preprocess(other),
        }
    }
}

impl From<ParseError> for Error {
    fn from(error: ParseError) -> Self {
        match error.kind {
            ParseErrorKind::Cancelled => Error::Cancelled,
            _ => Error::Parse(error),
        }
    }
}

impl From<BuildError> for Error {
    fn from(error: BuildError) -> Self {
        match error {
            BuildError::Attribute(error) => Error::Attribute(error),
            BuildError::Type { source, span } => Error::Type { source, span },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_errors_are_unwrapped_from_the_preprocessor() {
        let lex = LexError::UnterminatedComment { span: Span::point(3, 1) };
        let error = Error::from(PreprocessError::Lex(lex.clone()));
        assert!(matches!(error, Error::Lex(inner) if inner == lex));
    }

    #[test]
    fn cancelled_parse_is_its_own_variant() {
        let error = Error::from(ParseError::cancelled(Span::point(1, 1)));
        assert!(error.is_cancelled());
        assert_eq!(error.span(), None);
    }

    #[test]
    fn type_errors_keep_their_position() {
        let build = BuildError::Type {
            source: TypeError::TooManyLongs,
            span: Span::new(2, 5, 4),
        };
        let error = Error::from(build);
        assert_eq!(error.span(), Some(Span::new(2, 5, 4)));
        assert!(error.to_string().contains("too many 'long'"));
    }
}
