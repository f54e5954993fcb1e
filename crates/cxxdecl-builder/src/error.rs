//! Errors raised while turning a parsed header into a declaration graph.

use cxxdecl_core::{Span, TypeError};
use thiserror::Error;

/// Misuse of an attribute in the reserved namespace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("at {span}: unknown attribute '{namespace}::{name}'")]
    Unknown { namespace: String, name: String, span: Span },

    #[error("at {span}: attribute '{name}' cannot be applied in {role} position")]
    WrongRole { name: String, role: &'static str, span: Span },

    #[error("at {span}: attribute '{name}' applies only to functions")]
    NotAFunction { name: String, span: Span },

    #[error("at {span}: attribute '{name}' takes {expected} argument(s), found {found}")]
    Arguments {
        name: String,
        expected: &'static str,
        found: usize,
        span: Span,
    },

    #[error("at {span}: attribute 'sizehint' names unknown parameter '{parameter}'")]
    UnknownParameter { parameter: String, span: Span },
}

/// A malformed line in a hints file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HintsError {
    #[error("hints line {line}: expected '<class> <function> <hex-type> <size>', found '{text}'")]
    Malformed { line: usize, text: String },

    #[error("hints line {line}: invalid {field} '{value}'")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Errors from declaration assembly.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error("at {span}: {source}")]
    Type { source: TypeError, span: Span },
}

impl BuildError {
    pub fn span(&self) -> Span {
        match self {
            BuildError::Attribute(
                AttributeError::Unknown { span, .. }
                | AttributeError::WrongRole { span, .. }
                | AttributeError::NotAFunction { span, .. }
                | AttributeError::Arguments { span, .. }
                | AttributeError::UnknownParameter { span, .. },
            ) => *span,
            BuildError::Type { span, .. } => *span,
        }
    }
}

/// Attach a source position to a type encoding failure.
pub(crate) trait TypeResultExt<T> {
    fn at(self, span: Span) -> Result<T, BuildError>;
}

impl<T> TypeResultExt<T> for Result<T, TypeError> {
    fn at(self, span: Span) -> Result<T, BuildError> {
        self.map_err(|source| BuildError::Type { source, span })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_location() {
        let error = AttributeError::WrongRole {
            name: "expects".into(),
            role: "declaration",
            span: Span::new(4, 9, 7),
        };
        assert_eq!(
            error.to_string(),
            "at 4:9: attribute 'expects' cannot be applied in declaration position"
        );

        let error = BuildError::Type {
            source: TypeError::TooManyLongs,
            span: Span::new(2, 1, 4),
        };
        assert_eq!(error.span(), Span::new(2, 1, 4));
        assert!(error.to_string().ends_with("too many 'long' specifiers"));
    }

    #[test]
    fn hints_errors_name_the_line() {
        let error = HintsError::Malformed {
            line: 3,
            text: "vtkFoo".into(),
        };
        assert!(error.to_string().starts_with("hints line 3:"));
    }
}
