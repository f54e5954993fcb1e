//! # cxxdecl
//!
//! Reads a C++ header and builds a graph of its declarations: namespaces,
//! classes, functions with parameter and return types, variables,
//! constants, enums, typedefs and using-declarations, each with its
//! documentation comment.
//!
//! The work happens in four stages, each in its own crate:
//! - [`cxxdecl_parser::Lexer`] and [`cxxdecl_parser::Preprocessor`] turn
//!   text into active tokens, expanding macros and evaluating `#if`
//! - [`cxxdecl_parser::Parser`] builds an arena-allocated AST
//! - [`cxxdecl_builder::assemble`] walks the AST into a [`FileInfo`]
//! - [`Hints`] fill in array sizes the header cannot express
//!
//! # Example
//!
//! ```
//! use cxxdecl::{ParseOptions, parse_header};
//!
//! let source = r#"
//! /// A point in the plane.
//! struct Point {
//!     double x, y;
//!     double Length() const;
//! };
//! "#;
//! let parsed = parse_header(source, &ParseOptions::new()).unwrap();
//! let point = parsed.file.find_class("Point").unwrap();
//! assert_eq!(point.members.variables.len(), 2);
//! assert_eq!(point.comment.as_deref(), Some("A point in the plane."));
//! ```

use std::path::Path;

use bumpalo::Bump;

pub mod dump;
pub mod error;
pub mod options;

pub use cxxdecl_builder::{Assembly, AssemblyStats, BuildOptions, Hint, Hints, SourceInfo, assemble};
pub use cxxdecl_core::{
    Access, BaseType, CancellationToken, ClassInfo, ClassKind, Diagnostic, Dimension, EnumInfo, FileInfo,
    FunctionFlags, FunctionInfo, ItemKind, MacroInfo, Members, NamespaceInfo, ParseErrors, Span, TemplateInfo,
    TypeCode, TypeDesc, UsingInfo, ValueFlags, ValueInfo,
};
pub use dump::{Dump, dump};
pub use error::{Error, Result};
pub use options::ParseOptions;

use cxxdecl_core::Symbol;
use cxxdecl_parser::{DefinedMacro, MacroDefinition, MacroTable, Parser, ParserOptions, Preprocessor};

/// A parsed header.
#[derive(Debug)]
pub struct ParsedHeader {
    pub file: FileInfo,
    pub stats: AssemblyStats,
    /// Declarations skipped in lenient mode. Always empty otherwise.
    pub errors: ParseErrors,
}

/// Parse the text of a header.
///
/// `#include "..."` targets are looked up in the working directory and
/// the include directories.
pub fn parse_header(source: &str, options: &ParseOptions) -> Result<ParsedHeader> {
    parse_source(source, None, options)
}

/// Read and parse a header file.
pub fn parse_file(path: impl AsRef<Path>, options: &ParseOptions) -> Result<ParsedHeader> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(&source, Some(path), options)
}

#[cfg_attr(feature = "profiling", profiling::function)]
fn parse_source(source: &str, path: Option<&Path>, options: &ParseOptions) -> Result<ParsedHeader> {
    if options.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
        return Err(Error::Cancelled);
    }
    let file_name = path.map(|path| path.display().to_string());
    let arena = Bump::new();

    let mut table = MacroTable::new();
    options.apply_macros(&mut table)?;
    let mut preprocessor = Preprocessor::new(&mut table, &arena, options.include_config(path));
    for imacros in &options.imacros {
        preprocessor.load_macros(imacros)?;
    }
    let stream = preprocessor.run(source)?;

    let mut parser = Parser::new(stream.tokens, &arena).with_options(ParserOptions {
        recover: options.recover,
        cancel: options.cancel.clone(),
    });
    let unit = parser.parse_translation_unit()?;
    let errors = parser.take_errors();

    let macros = if options.dump_macros {
        table.definitions().into_iter().map(macro_info).collect()
    } else {
        stream.macros.iter().map(|DefinedMacro { definition, .. }| macro_info(definition)).collect()
    };
    let info = SourceInfo {
        trivia: stream.trivia,
        includes: stream.includes,
        macros,
    };
    let build = BuildOptions {
        attribute_namespace: options.attribute_namespace.clone(),
        file_name: file_name.clone(),
    };
    let Assembly { mut file, stats } = assemble(&unit, info, &build)?;

    if let Some(hints_path) = &options.hints {
        let text = std::fs::read_to_string(hints_path).map_err(|source| Error::Io {
            path: hints_path.clone(),
            source,
        })?;
        Hints::parse(&text)?.apply(&mut file);
    }

    tracing::info!(
        file = file_name.as_deref().unwrap_or("<input>"),
        classes = stats.classes,
        functions = stats.functions,
        skipped = errors.len(),
        "parsed header"
    );
    Ok(ParsedHeader { file, stats, errors })
}

fn macro_info(definition: &MacroDefinition) -> MacroInfo {
    MacroInfo {
        name: Symbol::from(definition.name.as_str()),
        parameters: definition
            .parameters
            .as_ref()
            .map(|params| params.iter().map(|p| Symbol::from(p.as_str())).collect()),
        is_variadic: definition.variadic,
        definition: definition.body.clone(),
        comment: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_macros_select_branches() {
        let source = "
#if defined(WITH_EXTRAS) && LEVEL > 2
void Extra();
#else
void Basic();
#endif
";
        let options = ParseOptions::new().define("WITH_EXTRAS").define("LEVEL=3");
        let parsed = parse_header(source, &options).unwrap();
        let members = &parsed.file.contents.members;
        assert!(members.function("Extra").is_some());
        assert!(members.function("Basic").is_none());

        let parsed = parse_header(source, &ParseOptions::new().define("LEVEL=3")).unwrap();
        assert!(parsed.file.contents.members.function("Basic").is_some());
    }

    #[test]
    fn header_macros_are_reported() {
        let source = "#define VERSION 3\n#define MAX(a, b) ((a) > (b) ? (a) : (b))\nint x;\n";
        let parsed = parse_header(source, &ParseOptions::new().define("UNUSED")).unwrap();
        let names: Vec<&str> = parsed.file.macros.iter().map(|m| m.name.as_ref()).collect();
        assert_eq!(names, ["VERSION", "MAX"]);
        assert!(parsed.file.macros[1].is_function_like());

        let options = ParseOptions::new().define("UNUSED").dump_macros(true);
        let parsed = parse_header(source, &options).unwrap();
        assert!(parsed.file.macros.iter().any(|m| m.name.as_ref() == "UNUSED"));
    }

    #[test]
    fn lenient_mode_keeps_going() {
        let source = "int ok1; int = 5; int ok2;";
        assert!(matches!(parse_header(source, &ParseOptions::new()), Err(Error::Parse(_))));

        let parsed = parse_header(source, &ParseOptions::new().recover(true)).unwrap();
        let members = &parsed.file.contents.members;
        assert!(members.variable("ok1").is_some());
        assert!(members.variable("ok2").is_some());
        assert_eq!(parsed.errors.len(), 1);
    }

    #[test]
    fn cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let options = ParseOptions::new().cancel_token(token);
        assert!(parse_header("int x;", &options).unwrap_err().is_cancelled());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let error = parse_file("/nonexistent/widgets.h", &ParseOptions::new()).unwrap_err();
        assert!(matches!(error, Error::Io { .. }));
        assert!(error.to_string().contains("widgets.h"));
    }
}
