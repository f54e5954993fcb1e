//! Lexer, preprocessor and parser for C++ header declarations.
//!
//! This crate includes:
//! - Lexical analysis, with comments and directives kept as tokens
//! - A preprocessor behind the [`PreprocessorService`] trait, with
//!   [`MacroTable`] as the default macro store
//! - The arena-allocated AST and the forking declaration [`Parser`]
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use cxxdecl_parser::{IncludeConfig, MacroTable, Parser, Preprocessor};
//!
//! let arena = Bump::new();
//! let mut macros = MacroTable::new();
//! let source = "#define EXPORT\nclass EXPORT Foo {};\n";
//! let stream = Preprocessor::new(&mut macros, &arena, IncludeConfig::default())
//!     .run(source)
//!     .unwrap();
//! let unit = Parser::new(stream.tokens, &arena).parse_translation_unit().unwrap();
//! assert_eq!(unit.items().len(), 1);
//! ```

pub mod ast;
pub mod lexer;
pub mod preprocessor;

pub use ast::{Parser, ParserOptions, Rule, TranslationUnit};
pub use lexer::{Lexer, Token, TokenKind};
pub use preprocessor::{
    ConstantValue, DefinedMacro, IncludeConfig, MacroDefinition, MacroTable, Preprocessor, PreprocessorService,
    TokenStream,
};
