//! Macro definitions, the default macro table, and token-level expansion.

use std::collections::VecDeque;
use std::rc::Rc;

use bumpalo::Bump;
use cxxdecl_core::{PreprocessError, Span};
use rustc_hash::FxHashMap;

use super::eval::{self, ConstantValue};
use super::PreprocessorService;
use crate::lexer::{Lexer, Token, TokenKind};

/// A `#define`d macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDefinition {
    pub name: String,
    /// Parameter names; `None` for object-like macros.
    pub parameters: Option<Vec<String>>,
    /// The last parameter collects any extra arguments.
    pub variadic: bool,
    pub body: String,
}

impl MacroDefinition {
    /// An object-like macro, as given by `-D name=value`.
    pub fn object(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: None,
            variadic: false,
            body: body.into(),
        }
    }

    pub fn is_function_like(&self) -> bool {
        self.parameters.is_some()
    }

    /// Parse the text following `#define`: `NAME body` or `NAME(params) body`.
    ///
    /// A parameter list only counts when `(` directly follows the name.
    pub fn parse(text: &str, span: Span) -> Result<Self, PreprocessError> {
        let malformed = |detail: &str| PreprocessError::MalformedDirective {
            directive: "define".into(),
            span,
            detail: detail.into(),
        };

        let text = text.trim_start();
        let name_len = text
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
            .unwrap_or(text.len());
        let name = &text[..name_len];
        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(malformed("expected a macro name"));
        }
        let rest = &text[name_len..];

        let Some(after_paren) = rest.strip_prefix('(') else {
            if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                return Err(malformed("expected whitespace after the macro name"));
            }
            return Ok(Self::object(name, rest.trim()));
        };

        let close = after_paren
            .find(')')
            .ok_or_else(|| malformed("missing ')' in parameter list"))?;
        let mut parameters = Vec::new();
        let mut variadic = false;
        for param in after_paren[..close].split(',').map(str::trim) {
            if variadic {
                return Err(malformed("'...' must be the last parameter"));
            }
            if param.is_empty() {
                if after_paren[..close].trim().is_empty() {
                    break;
                }
                return Err(malformed("empty parameter name"));
            }
            if param == "..." {
                variadic = true;
                parameters.push("__VA_ARGS__".to_string());
            } else if let Some(named) = param.strip_suffix("...") {
                variadic = true;
                parameters.push(named.trim().to_string());
            } else if param.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                parameters.push(param.to_string());
            } else {
                return Err(malformed("invalid parameter name"));
            }
        }

        Ok(Self {
            name: name.to_string(),
            parameters: Some(parameters),
            variadic,
            body: after_paren[close + 1..].trim().to_string(),
        })
    }

    fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameters
            .as_ref()?
            .iter()
            .position(|p| p == name)
    }
}

/// The default [`PreprocessorService`]: a map from name to definition.
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    macros: FxHashMap<String, MacroDefinition>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// All definitions, sorted by name.
    pub fn definitions(&self) -> Vec<&MacroDefinition> {
        let mut all: Vec<_> = self.macros.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }
}

impl PreprocessorService for MacroTable {
    fn expand_macro(&self, name: &str) -> Option<&MacroDefinition> {
        self.macros.get(name)
    }

    fn evaluate_constant_expression(&self, text: &str) -> Result<ConstantValue, PreprocessError> {
        eval::evaluate(text, self)
    }

    fn is_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    fn define(&mut self, definition: MacroDefinition) {
        self.macros.insert(definition.name.clone(), definition);
    }

    fn undefine(&mut self, name: &str) {
        self.macros.remove(name);
    }
}

// ============================================================================
// Expansion
// ============================================================================

/// Names that must not expand again while a token is rescanned.
type HideSet<'ast> = Rc<Vec<&'ast str>>;

struct Pending<'ast> {
    token: Token<'ast>,
    hidden: HideSet<'ast>,
}

/// Replaces macro invocations in a token list with their expansions.
///
/// Every token produced by an expansion carries the names of the macros it
/// came from, so a macro never expands inside its own replacement.
pub struct MacroExpander<'a, 'ast, S: PreprocessorService + ?Sized> {
    service: &'a S,
    arena: &'ast Bump,
}

impl<'a, 'ast, S: PreprocessorService + ?Sized> MacroExpander<'a, 'ast, S> {
    pub fn new(service: &'a S, arena: &'ast Bump) -> Self {
        Self { service, arena }
    }

    /// Expand every macro invocation in `tokens`.
    pub fn expand(&self, tokens: Vec<Token<'ast>>) -> Result<Vec<Token<'ast>>, PreprocessError> {
        let empty: HideSet<'ast> = Rc::new(Vec::new());
        let input = tokens
            .into_iter()
            .map(|token| Pending {
                token,
                hidden: empty.clone(),
            })
            .collect();
        self.rescan(input)
    }

    fn rescan(&self, mut input: VecDeque<Pending<'ast>>) -> Result<Vec<Token<'ast>>, PreprocessError> {
        let mut output = Vec::with_capacity(input.len());

        while let Some(pending) = input.pop_front() {
            let token = pending.token;
            let name = token.lexeme;
            if token.kind != TokenKind::Identifier || pending.hidden.contains(&name) {
                output.push(token);
                continue;
            }
            let Some(definition) = self.service.expand_macro(name) else {
                output.push(token);
                continue;
            };

            let replacement = match &definition.parameters {
                None => self.lex_body(&definition.body, token.span)?,
                Some(_) => {
                    if input.front().map(|p| p.token.kind) != Some(TokenKind::LeftParen) {
                        output.push(token);
                        continue;
                    }
                    input.pop_front();
                    let args = self.collect_arguments(&mut input, definition, token.span)?;
                    self.substitute(definition, args, token.span)?
                }
            };

            tracing::trace!(name, tokens = replacement.len(), "expanded macro");

            let mut hidden = (*pending.hidden).clone();
            hidden.push(name);
            let hidden = Rc::new(hidden);
            for token in replacement.into_iter().rev() {
                input.push_front(Pending {
                    token,
                    hidden: hidden.clone(),
                });
            }
        }

        Ok(output)
    }

    /// Lex a macro body, placing every token at the invocation site.
    fn lex_body(&self, body: &str, site: Span) -> Result<Vec<Token<'ast>>, PreprocessError> {
        let mut lexer = Lexer::for_fragment(body, self.arena);
        let mut tokens = Vec::new();
        loop {
            let mut token = lexer.next_token();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Comment | TokenKind::BlankLine => continue,
                TokenKind::Error => {
                    if let Some(error) = lexer.take_errors().into_iter().next() {
                        return Err(error.into());
                    }
                }
                _ => {
                    token.span = site;
                    tokens.push(token);
                }
            }
        }
        Ok(tokens)
    }

    /// Gather the comma-separated arguments following an opening
    /// parenthesis, through the matching close.
    fn collect_arguments(
        &self,
        input: &mut VecDeque<Pending<'ast>>,
        definition: &MacroDefinition,
        site: Span,
    ) -> Result<Vec<Vec<Token<'ast>>>, PreprocessError> {
        let expected = definition.parameters.as_ref().map_or(0, Vec::len);
        let mut args: Vec<Vec<Token<'ast>>> = vec![Vec::new()];
        let mut depth = 0usize;

        loop {
            let Some(Pending { token, .. }) = input.pop_front() else {
                return Err(PreprocessError::UnterminatedInvocation {
                    name: definition.name.clone(),
                    span: site,
                });
            };
            match token.kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen if depth == 0 => break,
                TokenKind::RightParen => depth -= 1,
                // The variadic parameter swallows the remaining commas.
                TokenKind::Comma if depth == 0 && !(definition.variadic && args.len() == expected) => {
                    args.push(Vec::new());
                    continue;
                }
                _ => {}
            }
            if let Some(current) = args.last_mut() {
                current.push(token);
            }
        }

        let found = if args.len() == 1 && args[0].is_empty() && expected == 0 {
            0
        } else {
            args.len()
        };
        let enough = found == expected || (definition.variadic && found + 1 == expected);
        if !enough {
            return Err(PreprocessError::MacroArguments {
                name: definition.name.clone(),
                expected,
                found,
                span: site,
            });
        }
        if found == 0 {
            args.clear();
        }
        while args.len() < expected {
            args.push(Vec::new());
        }
        Ok(args)
    }

    /// Substitute arguments into the body, applying `#` and `##`.
    fn substitute(
        &self,
        definition: &MacroDefinition,
        args: Vec<Vec<Token<'ast>>>,
        site: Span,
    ) -> Result<Vec<Token<'ast>>, PreprocessError> {
        let body = self.lex_body(&definition.body, site)?;
        let mut expanded_args: Vec<Option<Vec<Token<'ast>>>> = vec![None; args.len()];
        let mut output: Vec<Token<'ast>> = Vec::with_capacity(body.len());
        let mut paste_next = false;
        let mut i = 0;

        while i < body.len() {
            let token = body[i];
            let param = (token.kind == TokenKind::Identifier)
                .then(|| definition.parameter_index(token.lexeme))
                .flatten();

            if token.kind == TokenKind::Hash && definition.is_function_like() {
                let target = body
                    .get(i + 1)
                    .and_then(|next| definition.parameter_index(next.lexeme));
                if let Some(index) = target {
                    let text = stringize(&args[index]);
                    let lexeme = self.arena.alloc_str(&text);
                    self.emit(&mut output, Token::new(TokenKind::StringLiteral, lexeme, site), &mut paste_next)?;
                    i += 2;
                    continue;
                }
            }

            if token.kind == TokenKind::HashHash {
                paste_next = !output.is_empty();
                i += 1;
                continue;
            }

            match param {
                Some(index) => {
                    let adjacent_paste = paste_next
                        || body.get(i + 1).is_some_and(|t| t.kind == TokenKind::HashHash);
                    let replacement = if adjacent_paste {
                        args[index].clone()
                    } else {
                        match &expanded_args[index] {
                            Some(done) => done.clone(),
                            None => {
                                let done = self.expand(args[index].clone())?;
                                expanded_args[index] = Some(done.clone());
                                done
                            }
                        }
                    };
                    if replacement.is_empty() {
                        paste_next = false;
                    }
                    for arg_token in replacement {
                        let mut arg_token = arg_token;
                        arg_token.span = site;
                        self.emit(&mut output, arg_token, &mut paste_next)?;
                    }
                }
                None => self.emit(&mut output, token, &mut paste_next)?,
            }
            i += 1;
        }

        Ok(output)
    }

    /// Push a token, pasting it onto the previous one after `##`.
    fn emit(
        &self,
        output: &mut Vec<Token<'ast>>,
        token: Token<'ast>,
        paste_next: &mut bool,
    ) -> Result<(), PreprocessError> {
        if !std::mem::take(paste_next) {
            output.push(token);
            return Ok(());
        }
        let Some(left) = output.pop() else {
            output.push(token);
            return Ok(());
        };
        let joined = format!("{}{}", left.lexeme, token.lexeme);
        let pasted = self.lex_body(&joined, token.span)?;
        output.extend(pasted);
        Ok(())
    }
}

/// The `#param` spelling of an argument: tokens joined by single spaces,
/// quotes and backslashes in literals escaped.
fn stringize(tokens: &[Token<'_>]) -> String {
    let mut text = String::from("\"");
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 && needs_space(tokens[i - 1].kind, token.kind) {
            text.push(' ');
        }
        if matches!(token.kind, TokenKind::StringLiteral | TokenKind::CharLiteral) {
            for c in token.lexeme.chars() {
                if c == '"' || c == '\\' {
                    text.push('\\');
                }
                text.push(c);
            }
        } else {
            text.push_str(token.lexeme);
        }
    }
    text.push('"');
    text
}

fn needs_space(prev: TokenKind, next: TokenKind) -> bool {
    prev.is_word() || prev.is_literal() || next.is_word() || next.is_literal()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(defines: &[&str]) -> MacroTable {
        let mut table = MacroTable::new();
        for text in defines {
            let definition = MacroDefinition::parse(text, Span::default()).expect("valid define");
            table.define(definition);
        }
        table
    }

    fn expand(table: &MacroTable, source: &str) -> Result<String, PreprocessError> {
        let arena = Bump::new();
        let tokens: Vec<_> = Lexer::for_fragment(source, &arena).collect();
        let expanded = MacroExpander::new(table, &arena).expand(tokens)?;
        Ok(expanded
            .iter()
            .map(|t| t.lexeme)
            .collect::<Vec<_>>()
            .join(" "))
    }

    #[test]
    fn parse_object_and_function_macros() {
        let object = MacroDefinition::parse("LIMIT 64", Span::default()).unwrap();
        assert_eq!(object, MacroDefinition::object("LIMIT", "64"));

        let function = MacroDefinition::parse("MAX(a, b) ((a) > (b) ? (a) : (b))", Span::default()).unwrap();
        assert_eq!(function.parameters, Some(vec!["a".into(), "b".into()]));
        assert_eq!(function.body, "((a) > (b) ? (a) : (b))");

        let spaced = MacroDefinition::parse("WRAP (x)", Span::default()).unwrap();
        assert!(!spaced.is_function_like());
        assert_eq!(spaced.body, "(x)");

        let variadic = MacroDefinition::parse("LOG(fmt, ...) printf(fmt, __VA_ARGS__)", Span::default()).unwrap();
        assert!(variadic.variadic);
        assert_eq!(variadic.parameters.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn parse_rejects_bad_names() {
        assert!(MacroDefinition::parse("", Span::default()).is_err());
        assert!(MacroDefinition::parse("9X 1", Span::default()).is_err());
        assert!(MacroDefinition::parse("F(a b) a", Span::default()).is_err());
        assert!(MacroDefinition::parse("F(a", Span::default()).is_err());
    }

    #[test]
    fn object_macro_expansion() {
        let table = table(&["EXPORT", "SIZE 16", "DOUBLE_SIZE (SIZE * 2)"]);
        assert_eq!(expand(&table, "class EXPORT Foo").unwrap(), "class Foo");
        assert_eq!(expand(&table, "int a[DOUBLE_SIZE];").unwrap(), "int a [ ( 16 * 2 ) ] ;");
    }

    #[test]
    fn function_macro_expansion() {
        let table = table(&["GET(T, name) T Get##name() const;"]);
        assert_eq!(
            expand(&table, "GET(int, Size)").unwrap(),
            "int GetSize ( ) const ;"
        );
    }

    #[test]
    fn function_macro_without_parens_is_left_alone() {
        let table = table(&["F(x) x"]);
        assert_eq!(expand(&table, "int F;").unwrap(), "int F ;");
    }

    #[test]
    fn stringizing() {
        let table = table(&["NAME(x) #x"]);
        assert_eq!(expand(&table, "NAME(a + b)").unwrap(), "\"a + b\"");
    }

    #[test]
    fn no_recursive_self_expansion() {
        let table = table(&["loop loop + 1", "A B", "B A"]);
        assert_eq!(expand(&table, "loop").unwrap(), "loop + 1");
        assert_eq!(expand(&table, "A").unwrap(), "A");
    }

    #[test]
    fn arguments_expand_before_substitution() {
        let table = table(&["ID(x) x", "N 3"]);
        assert_eq!(expand(&table, "ID(N)").unwrap(), "3");
    }

    #[test]
    fn variadic_arguments() {
        let table = table(&["CALL(f, ...) f(__VA_ARGS__)"]);
        assert_eq!(expand(&table, "CALL(g, 1, 2)").unwrap(), "g ( 1 , 2 )");
        assert_eq!(expand(&table, "CALL(g)").unwrap(), "g ( )");
    }

    #[test]
    fn argument_count_mismatch() {
        let table = table(&["PAIR(a, b) a b"]);
        assert!(matches!(
            expand(&table, "PAIR(1)"),
            Err(PreprocessError::MacroArguments { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn unterminated_invocation() {
        let table = table(&["F(x) x"]);
        assert!(matches!(
            expand(&table, "F(1, "),
            Err(PreprocessError::UnterminatedInvocation { .. })
        ));
    }

    #[test]
    fn table_define_and_undefine() {
        let mut table = MacroTable::new();
        table.define(MacroDefinition::object("DEBUG", "1"));
        assert!(table.is_defined("DEBUG"));
        table.undefine("DEBUG");
        assert!(!table.is_defined("DEBUG"));
        assert!(table.is_empty());
    }
}
