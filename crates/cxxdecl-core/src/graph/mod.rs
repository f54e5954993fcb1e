//! The declaration graph produced by parsing one header.
//!
//! The graph is a plain tree of owned records rooted at [`FileInfo`]:
//!
//! ```text
//! FileInfo
//! └── NamespaceInfo (global)
//!     ├── NamespaceInfo ...
//!     ├── ClassInfo ── Members (classes, functions, variables, ...)
//!     ├── FunctionInfo ── ValueInfo (return, parameters)
//!     ├── EnumInfo ── ValueInfo (enumerators)
//!     └── ValueInfo (variables, constants, typedefs)
//! ```
//!
//! Each scope keeps an `items` index recording the order its members were
//! declared in, regardless of their category.

mod function;
mod scope;
mod value;

use std::fmt;

pub use function::{FunctionFlags, FunctionInfo};
pub use scope::{ClassInfo, ClassKind, EnumInfo, MarshalHint, Members, NamespaceInfo, UsingInfo};
pub use value::{Dimension, TemplateInfo, ValueFlags, ValueInfo, parse_integer_literal};

use crate::Span;
use crate::strings::{StringCache, Symbol};

/// Member access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Access::Public => "public",
            Access::Protected => "protected",
            Access::Private => "private",
        })
    }
}

/// Category of an entry in a scope's declaration-order index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Namespace,
    Class,
    Function,
    Variable,
    Constant,
    Enum,
    Typedef,
    Using,
}

/// Position of a declaration within its scope: category plus index into
/// that category's collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemRef {
    pub kind: ItemKind,
    pub index: usize,
}

/// Deprecation metadata attached through attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Deprecation {
    pub reason: Option<String>,
    pub version: Option<String>,
}

/// A macro defined by the parsed header itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroInfo {
    pub name: Symbol,
    /// Parameter names for function-like macros.
    pub parameters: Option<Vec<Symbol>>,
    pub is_variadic: bool,
    pub definition: String,
    pub comment: Option<String>,
}

impl MacroInfo {
    pub fn is_function_like(&self) -> bool {
        self.parameters.is_some()
    }
}

/// A condition worth reporting that did not stop the parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A free function whose parameter base types match an earlier overload
    /// was left out of the graph.
    DuplicateOverload {
        name: Symbol,
        signature: String,
        span: Span,
    },
    /// A documentation comment named a declaration that does not exist.
    UnresolvedComment { target: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DuplicateOverload {
                name,
                signature,
                span,
            } => write!(
                f,
                "{span}: overload '{signature}' of '{name}' duplicates the parameter types of an earlier declaration and was dropped"
            ),
            Diagnostic::UnresolvedComment { target } => {
                write!(f, "comment refers to unknown declaration '{target}'")
            }
        }
    }
}

/// The root of a declaration graph.
#[derive(Debug, Clone, Default)]
pub struct FileInfo {
    pub file_name: Option<String>,
    /// Text of the header's file-level documentation comment.
    pub description: Option<String>,
    /// The global namespace.
    pub contents: NamespaceInfo,
    /// Headers named by `#include` directives in active code.
    pub includes: Vec<String>,
    /// Macros defined by this header.
    pub macros: Vec<MacroInfo>,
    pub diagnostics: Vec<Diagnostic>,
    pub strings: StringCache,
}

impl FileInfo {
    pub fn new(file_name: Option<String>) -> Self {
        Self {
            file_name,
            ..Self::default()
        }
    }

    /// Look up a class by its `::`-separated path from the global namespace.
    pub fn find_class(&self, path: &str) -> Option<&ClassInfo> {
        let mut segments: Vec<&str> = path.split("::").collect();
        let class_name = segments.pop()?;
        let mut namespace = &self.contents;
        let mut class: Option<&ClassInfo> = None;
        for segment in segments {
            match class {
                Some(outer) => class = Some(outer.members.class(segment)?),
                None => match namespace.namespace(segment) {
                    Some(inner) => namespace = inner,
                    None => class = Some(namespace.members.class(segment)?),
                },
            }
        }
        match class {
            Some(outer) => outer.members.class(class_name),
            None => namespace.members.class(class_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(cache: &mut StringCache, name: &str) -> ClassInfo {
        ClassInfo::new(cache.intern(name), ClassKind::Class)
    }

    #[test]
    fn find_class_through_namespaces_and_classes() {
        let mut file = FileInfo::new(Some("demo.h".into()));
        let mut outer = class(&mut file.strings, "Outer");
        outer.members.add_class(class(&mut file.strings, "Inner"));
        let mut ns = NamespaceInfo::new(Some(file.strings.intern("geo")));
        ns.members.add_class(outer);
        file.contents.add_namespace(ns);

        assert!(file.find_class("geo::Outer").is_some());
        assert_eq!(
            file.find_class("geo::Outer::Inner").map(|c| c.name.as_ref()),
            Some("Inner")
        );
        assert!(file.find_class("Outer").is_none());
        assert!(file.find_class("geo::Missing").is_none());
    }

    #[test]
    fn diagnostic_display() {
        let diag = Diagnostic::DuplicateOverload {
            name: "Scale".into(),
            signature: "void Scale(float s)".into(),
            span: Span::new(12, 1, 5),
        };
        let text = diag.to_string();
        assert!(text.starts_with("12:1"));
        assert!(text.contains("void Scale(float s)"));
    }
}
