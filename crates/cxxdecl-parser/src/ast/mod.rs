//! Abstract Syntax Tree for C++ header declarations.
//!
//! This module provides:
//! - AST node definitions for declarations, types and declarators
//! - The [`Parser`], which turns preprocessed tokens into a [`TranslationUnit`]
//! - Forked parsing of ambiguous declarations, ranked by [`Rule`]
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use cxxdecl_parser::{Lexer, Parser};
//!
//! let arena = Bump::new();
//! let tokens: Vec<_> = Lexer::new("class Foo { public: int Bar(int x) const; };", &arena)
//!     .filter(|token| !token.kind.is_trivia())
//!     .collect();
//! let mut parser = Parser::new(tokens, &arena);
//! let unit = parser.parse_translation_unit().unwrap();
//! assert_eq!(unit.items().len(), 1);
//! ```

pub mod decl;
pub mod types;

mod decl_parser;
mod fork;
mod parser;
mod type_parser;

pub use cxxdecl_core::{ParseError, ParseErrorKind, ParseErrors};

pub use decl::*;
pub use fork::Rule;
pub use parser::{Parser, ParserOptions};
pub use types::*;

/// A parsed header.
///
/// All AST nodes are allocated in the arena the parser was given and stay
/// valid for its lifetime.
#[derive(Debug)]
pub struct TranslationUnit<'ast> {
    items: &'ast [Item<'ast>],
    span: cxxdecl_core::Span,
}

impl<'ast> TranslationUnit<'ast> {
    pub(crate) fn new(items: &'ast [Item<'ast>], span: cxxdecl_core::Span) -> Self {
        Self { items, span }
    }

    /// Top-level declarations in source order.
    pub fn items(&self) -> &'ast [Item<'ast>] {
        self.items
    }

    pub fn span(&self) -> cxxdecl_core::Span {
        self.span
    }
}
