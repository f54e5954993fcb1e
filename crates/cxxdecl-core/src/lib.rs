//! Core types for the cxxdecl header compiler.
//!
//! This crate holds what every stage shares:
//! - [`Span`] source positions
//! - the error hierarchy ([`LexError`], [`PreprocessError`], [`ParseError`], [`TypeError`])
//! - the type encoder ([`TypeCode`], [`TypeDesc`], [`BaseType`])
//! - the declaration graph ([`FileInfo`] and the records below it)
//! - the [`StringCache`] that interns graph names
//! - [`CancellationToken`] for stopping a parse from another thread

pub mod cancel;
pub mod error;
pub mod graph;
pub mod span;
pub mod strings;
pub mod type_code;

pub use cancel::CancellationToken;
pub use error::{LexError, ParseError, ParseErrorKind, ParseErrors, PreprocessError, TypeError};
pub use graph::{
    parse_integer_literal,
    Access, ClassInfo, ClassKind, Deprecation, Diagnostic, Dimension, EnumInfo, FileInfo,
    FunctionFlags, FunctionInfo, ItemKind, ItemRef, MacroInfo, MarshalHint, Members,
    NamespaceInfo, TemplateInfo, UsingInfo, ValueFlags, ValueInfo,
};
pub use span::Span;
pub use strings::{StringCache, Symbol};
pub use type_code::{
    BaseType, CvQualifiers, Indirection, MAX_INDIRECTION, RefKind, Specifiers, TypeCode, TypeDesc,
    add_indirection, combine_base, merge_base,
};
