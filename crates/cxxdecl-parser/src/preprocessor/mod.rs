//! Preprocessing: directives, conditional inclusion, and macro expansion.
//!
//! The [`PreprocessorService`] trait is the seam between the parser and the
//! macro machinery. [`MacroTable`] is the default implementation; callers
//! with their own macro store implement the trait instead.
//!
//! [`Preprocessor::run`] lexes a header, interprets its directives, expands
//! macros in active code, and splits the result into the token stream the
//! parser reads and the comment side channel the builder reads.

mod directive;
mod eval;
mod macros;

use bumpalo::Bump;
use cxxdecl_core::{PreprocessError, Span};

pub use directive::{DirectiveEvent, DirectiveProcessor, IncludeConfig};
pub use eval::{ConstantValue, evaluate};
pub use macros::{MacroDefinition, MacroExpander, MacroTable};

use crate::lexer::{Lexer, Token, TokenKind};

/// Macro storage and constant-expression evaluation.
pub trait PreprocessorService {
    /// The definition of `name`, if it is a macro.
    fn expand_macro(&self, name: &str) -> Option<&MacroDefinition>;

    /// Evaluate an `#if` expression against the current definitions.
    fn evaluate_constant_expression(&self, text: &str) -> Result<ConstantValue, PreprocessError>;

    fn is_defined(&self, name: &str) -> bool;

    fn define(&mut self, definition: MacroDefinition);

    fn undefine(&mut self, name: &str);
}

/// A macro defined by the processed header, with where it was defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedMacro {
    pub definition: MacroDefinition,
    pub span: Span,
}

/// Output of preprocessing one header.
#[derive(Debug, Clone)]
pub struct TokenStream<'ast> {
    /// Active tokens after expansion, ending with `Eof`.
    pub tokens: Vec<Token<'ast>>,
    /// Comments and blank lines from active code, in source order.
    pub trivia: Vec<Token<'ast>>,
    pub macros: Vec<DefinedMacro>,
    /// Targets of `#include` directives in active code.
    pub includes: Vec<String>,
}

/// Runs the directive processor and macro expander over one header.
pub struct Preprocessor<'s, 'ast, S: PreprocessorService + ?Sized> {
    directives: DirectiveProcessor<'s, S>,
    arena: &'ast Bump,
}

impl<'s, 'ast, S: PreprocessorService + ?Sized> Preprocessor<'s, 'ast, S> {
    pub fn new(service: &'s mut S, arena: &'ast Bump, config: IncludeConfig) -> Self {
        Self {
            directives: DirectiveProcessor::new(service, config),
            arena,
        }
    }

    /// Read a file for its macros before processing the header.
    pub fn load_macros(&mut self, path: &std::path::Path) -> Result<(), PreprocessError> {
        self.directives.load_macros(path)
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self, source: &str) -> Result<TokenStream<'ast>, PreprocessError> {
        let mut lexer = Lexer::new(source, self.arena);
        let mut stream = TokenStream {
            tokens: Vec::new(),
            trivia: Vec::new(),
            macros: Vec::new(),
            includes: Vec::new(),
        };
        // Tokens since the last directive; expanded together so function-like
        // invocations may span lines.
        let mut pending = Vec::new();

        loop {
            let token = lexer.next_token();
            match token.kind {
                TokenKind::Eof => {
                    self.flush(&mut pending, &mut stream.tokens)?;
                    stream.tokens.push(token);
                    break;
                }
                TokenKind::Directive => {
                    self.flush(&mut pending, &mut stream.tokens)?;
                    match self.directives.process(token.lexeme, token.span)? {
                        DirectiveEvent::Defined(definition) => stream.macros.push(DefinedMacro {
                            definition,
                            span: token.span,
                        }),
                        DirectiveEvent::Included(header) => stream.includes.push(header),
                        DirectiveEvent::Undefined(_) | DirectiveEvent::Ignored => {}
                    }
                }
                _ if !self.directives.is_active() => {
                    lexer.take_errors();
                }
                TokenKind::Error => {
                    if let Some(error) = lexer.take_errors().into_iter().next() {
                        return Err(error.into());
                    }
                }
                kind if kind.is_trivia() => stream.trivia.push(token),
                _ => pending.push(token),
            }
        }

        self.directives.finish()?;
        tracing::debug!(
            tokens = stream.tokens.len(),
            comments = stream.trivia.len(),
            macros = stream.macros.len(),
            "preprocessed"
        );
        Ok(stream)
    }

    fn flush(&self, pending: &mut Vec<Token<'ast>>, out: &mut Vec<Token<'ast>>) -> Result<(), PreprocessError> {
        if pending.is_empty() {
            return Ok(());
        }
        let expanded = MacroExpander::new(self.directives.service(), self.arena).expand(std::mem::take(pending))?;
        out.extend(expanded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preprocess(source: &str, table: &mut MacroTable) -> Result<Vec<String>, PreprocessError> {
        let arena = Bump::new();
        let stream = Preprocessor::new(table, &arena, IncludeConfig::default()).run(source)?;
        Ok(stream
            .tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| t.lexeme.to_string())
            .collect())
    }

    #[test]
    fn conditional_branches_select_tokens() {
        let mut table = MacroTable::new();
        table.define(MacroDefinition::object("A", ""));
        table.define(MacroDefinition::object("B", "3"));
        let source = "#if defined(A) && B > 2\nint yes;\n#else\nint no;\n#endif\n";
        assert_eq!(preprocess(source, &mut table).unwrap(), vec!["int", "yes", ";"]);
    }

    #[test]
    fn macros_expand_in_declarations() {
        let mut table = MacroTable::new();
        let source = "#define EXPORT\n#define SET(name, T) void Set##name(T value);\nclass EXPORT Foo { SET(Size, int) };";
        let tokens = preprocess(source, &mut table).unwrap();
        assert_eq!(
            tokens.join(" "),
            "class Foo { void SetSize ( int value ) ; } ;"
        );
    }

    #[test]
    fn stream_records_side_channels() {
        let mut table = MacroTable::new();
        let arena = Bump::new();
        let source = "#include \"base.h\"\n// doc\n\n#define LIMIT 4\nint x;\n#if 0\n// hidden\n#include \"skip.h\"\n#endif\n";
        let stream = Preprocessor::new(&mut table, &arena, IncludeConfig::default())
            .run(source)
            .unwrap();
        assert_eq!(stream.includes, vec!["base.h".to_string()]);
        assert_eq!(stream.macros.len(), 1);
        assert_eq!(stream.macros[0].definition.name, "LIMIT");
        assert_eq!(stream.macros[0].span.line, 4);
        let trivia: Vec<_> = stream.trivia.iter().map(|t| t.kind).collect();
        assert_eq!(trivia, vec![TokenKind::Comment, TokenKind::BlankLine]);
    }

    #[test]
    fn error_directive_in_active_code_fails() {
        let mut table = MacroTable::new();
        assert!(matches!(
            preprocess("#ifndef X\n#error X required\n#endif", &mut table),
            Err(PreprocessError::ErrorDirective { .. })
        ));
    }

    #[test]
    fn lex_errors_in_inactive_code_are_ignored() {
        let mut table = MacroTable::new();
        let tokens = preprocess("#if 0\nit's fine\n#endif\nint x;", &mut table).unwrap();
        assert_eq!(tokens, vec!["int", "x", ";"]);
    }

    #[test]
    fn lex_errors_in_active_code_fail() {
        let mut table = MacroTable::new();
        assert!(matches!(
            preprocess("int x = 'a;", &mut table),
            Err(PreprocessError::Lex(_))
        ));
    }

    #[test]
    fn undefined_macro_stops_expanding() {
        let mut table = MacroTable::new();
        let tokens = preprocess("#define N 4\nint a[N];\n#undef N\nint b[N];", &mut table).unwrap();
        assert_eq!(tokens.join(" "), "int a [ 4 ] ; int b [ N ] ;");
    }
}
