//! Declaration graph assembly for cxxdecl.
//!
//! This crate turns the AST produced by `cxxdecl-parser` into the
//! declaration graph defined in `cxxdecl-core`:
//! - [`assemble`] walks a translation unit and builds the [`FileInfo`](cxxdecl_core::FileInfo)
//! - [`SignatureBuilder`] re-serializes declarations with normalized spacing
//! - [`ScopeStacks`] tracks the namespace, class, template and function context
//! - [`CommentTracker`] pairs documentation comments with declarations
//! - [`AttributeValidator`] checks attributes in the reserved namespace
//! - [`Hints`] applies array sizes from a hints file

pub mod assembler;
pub mod attributes;
pub mod comments;
pub mod error;
pub mod hints;
pub mod scope;
pub mod signature;

pub use assembler::{Assembly, AssemblyStats, BuildOptions, SourceInfo, assemble};
pub use attributes::{AttributeValidator, DEFAULT_NAMESPACE, DeclAttributes, SizeHint};
pub use comments::{CommentState, CommentTracker, NamedComment, NamedKind};
pub use error::{AttributeError, BuildError, HintsError};
pub use hints::{Hint, Hints};
pub use scope::{ScopeStacks, ScopeStats};
pub use signature::{SignatureBuilder, expression_text};
