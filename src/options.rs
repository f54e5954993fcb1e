use std::path::{Path, PathBuf};

use cxxdecl_builder::DEFAULT_NAMESPACE;
use cxxdecl_core::{CancellationToken, PreprocessError, Span};
use cxxdecl_parser::{IncludeConfig, MacroDefinition, PreprocessorService};

/// Settings for parsing one header.
///
/// ```
/// use cxxdecl::ParseOptions;
///
/// let options = ParseOptions::new()
///     .include_dir("include")
///     .define("VTK_LEGACY_REMOVE")
///     .define("VERSION=3")
///     .recover(true);
/// assert_eq!(options.defines.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Searched for `#include` targets, in order.
    pub include_dirs: Vec<PathBuf>,
    /// `NAME`, `NAME=value` or `NAME(args)=body`, as given to `-D`.
    pub defines: Vec<String>,
    pub undefines: Vec<String>,
    /// Files read for their macros before the header (`-imacros`).
    pub imacros: Vec<PathBuf>,
    /// Report every macro known after preprocessing, not only the header's own.
    pub dump_macros: bool,
    /// Read included files for their macro definitions.
    pub follow_includes: bool,
    /// Skip declarations with syntax errors instead of failing.
    pub recover: bool,
    pub attribute_namespace: String,
    pub hints: Option<PathBuf>,
    pub cancel: Option<CancellationToken>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            include_dirs: Vec::new(),
            defines: Vec::new(),
            undefines: Vec::new(),
            imacros: Vec::new(),
            dump_macros: false,
            follow_includes: false,
            recover: false,
            attribute_namespace: DEFAULT_NAMESPACE.to_string(),
            hints: None,
            cancel: None,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    pub fn define(mut self, definition: impl Into<String>) -> Self {
        self.defines.push(definition.into());
        self
    }

    pub fn undefine(mut self, name: impl Into<String>) -> Self {
        self.undefines.push(name.into());
        self
    }

    pub fn imacros(mut self, path: impl Into<PathBuf>) -> Self {
        self.imacros.push(path.into());
        self
    }

    pub fn dump_macros(mut self, enabled: bool) -> Self {
        self.dump_macros = enabled;
        self
    }

    pub fn follow_includes(mut self, enabled: bool) -> Self {
        self.follow_includes = enabled;
        self
    }

    pub fn recover(mut self, enabled: bool) -> Self {
        self.recover = enabled;
        self
    }

    pub fn attribute_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.attribute_namespace = namespace.into();
        self
    }

    pub fn hints(mut self, path: impl Into<PathBuf>) -> Self {
        self.hints = Some(path.into());
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn include_config(&self, header: Option<&Path>) -> IncludeConfig {
        IncludeConfig {
            include_dirs: self.include_dirs.clone(),
            follow_includes: self.follow_includes,
            current_dir: header.and_then(Path::parent).map(Path::to_path_buf),
        }
    }

    /// Apply the `-D` and `-U` options to a macro store, definitions first.
    pub(crate) fn apply_macros<S>(&self, service: &mut S) -> Result<(), PreprocessError>
    where
        S: PreprocessorService + ?Sized,
    {
        for text in &self.defines {
            let definition = command_line_macro(text)?;
            tracing::trace!(name = %definition.name, "predefined macro");
            service.define(definition);
        }
        for name in &self.undefines {
            service.undefine(name);
        }
        Ok(())
    }
}

/// `NAME` defines `NAME` as `1`, like a compiler's `-D`.
fn command_line_macro(text: &str) -> Result<MacroDefinition, PreprocessError> {
    let (head, body) = text.split_once('=').unwrap_or((text, "1"));
    MacroDefinition::parse(&format!("{head} {body}"), Span::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxxdecl_parser::MacroTable;

    #[test]
    fn defines_then_undefines() {
        let options = ParseOptions::new()
            .define("A")
            .define("B=2")
            .define("MAX(a,b)=((a)>(b)?(a):(b))")
            .undefine("B");
        let mut table = MacroTable::new();
        options.apply_macros(&mut table).unwrap();

        assert_eq!(table.expand_macro("A").unwrap().body, "1");
        assert!(!table.is_defined("B"));
        let max = table.expand_macro("MAX").unwrap();
        assert_eq!(max.parameters.as_deref(), Some(&["a".to_string(), "b".to_string()][..]));
    }

    #[test]
    fn invalid_macro_name_is_rejected() {
        let options = ParseOptions::new().define("1BAD=3");
        let mut table = MacroTable::new();
        assert!(matches!(
            options.apply_macros(&mut table),
            Err(PreprocessError::MalformedDirective { .. })
        ));
    }

    #[test]
    fn include_config_uses_the_header_directory() {
        let options = ParseOptions::new().include_dir("/opt/include").follow_includes(true);
        let config = options.include_config(Some(Path::new("/src/widgets/button.h")));
        assert_eq!(config.current_dir.as_deref(), Some(Path::new("/src/widgets")));
        assert_eq!(config.include_dirs, [PathBuf::from("/opt/include")]);
        assert!(config.follow_includes);
    }
}
