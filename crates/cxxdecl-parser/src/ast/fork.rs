//! Forked parsing of ambiguous declarations.
//!
//! Where the declaration grammar is ambiguous without knowing which names
//! are types, every applicable alternative is parsed from the same
//! position. Failed alternatives are pruned. Among the survivors, those
//! that read furthest are kept, and the one with the highest [`Rule`]
//! priority wins.
//!
//! ```text
//! Foo bar(baz);   FunctionDeclarator (30) and VariableInitializer (10)
//!                 both reach ';' -> function
//! Foo bar(5);     FunctionDeclarator fails at '5' -> variable
//! ```

use cxxdecl_core::{ParseError, ParseErrorKind};

use crate::ast::Parser;

/// A grammar rule that competes at an ambiguous point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// `Foo(int);` inside `class Foo`
    Constructor,
    /// `Foo bar(baz);` as a function
    FunctionDeclarator,
    /// `void f(int (x))` naming the parameter `x`
    ParenthesizedParameterName,
    /// `void f(int (x))` as an unnamed function taking an `x`
    FunctionTypeParameter,
    /// `Foo bar(baz);` as a variable
    VariableInitializer,
    /// An ordinary declaration competing with a constructor.
    Declaration,
}

impl Rule {
    pub fn priority(self) -> u8 {
        match self {
            Rule::Constructor => 40,
            Rule::FunctionDeclarator => 30,
            Rule::ParenthesizedParameterName => 25,
            Rule::FunctionTypeParameter => 20,
            Rule::VariableInitializer => 10,
            Rule::Declaration => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Rule::Constructor => "constructor",
            Rule::FunctionDeclarator => "function declarator",
            Rule::ParenthesizedParameterName => "parenthesized parameter name",
            Rule::FunctionTypeParameter => "function type parameter",
            Rule::VariableInitializer => "variable initializer",
            Rule::Declaration => "declaration",
        }
    }
}

/// One competing parse: a rule and the function that tries it.
pub(crate) type Alternative<'f, 'ast, T> = (Rule, &'f mut dyn FnMut(&mut Parser<'ast>) -> Result<T, ParseError>);

struct Survivor<'ast, T> {
    rule: Rule,
    end: crate::ast::parser::Checkpoint<'ast>,
    progress: usize,
    value: T,
}

impl<'ast> Parser<'ast> {
    /// Try every alternative from the current position and merge the
    /// results.
    ///
    /// On success the parser is left where the winning alternative stopped.
    /// When every alternative fails, the error that got furthest is
    /// returned.
    pub(crate) fn fork<T>(&mut self, alternatives: &mut [Alternative<'_, 'ast, T>]) -> Result<T, ParseError> {
        let start = self.checkpoint();
        let mut survivors: Vec<Survivor<'ast, T>> = Vec::new();
        let mut furthest: Option<ParseError> = None;

        for (rule, parse) in alternatives.iter_mut() {
            self.restore(start);
            self.speculating += 1;
            let result = parse(self);
            self.speculating -= 1;
            match result {
                Ok(value) => {
                    tracing::trace!(rule = rule.name(), at = %self.peek().span, "alternative survived");
                    survivors.push(Survivor {
                        rule: *rule,
                        end: self.checkpoint(),
                        progress: self.progress(),
                        value,
                    });
                }
                Err(error) if error.kind == ParseErrorKind::Cancelled => return Err(error),
                Err(error) => {
                    tracing::trace!(rule = rule.name(), %error, "alternative pruned");
                    if furthest.as_ref().is_none_or(|best| best.span < error.span) {
                        furthest = Some(error);
                    }
                }
            }
        }

        let Some(reach) = survivors.iter().map(|s| s.progress).max() else {
            self.restore(start);
            return Err(furthest.unwrap_or_else(|| self.error(ParseErrorKind::InternalError, "no alternatives to parse")));
        };
        survivors.retain(|s| s.progress == reach);
        survivors.sort_by_key(|s| std::cmp::Reverse(s.rule.priority()));

        let mut survivors = survivors.into_iter();
        let Some(winner) = survivors.next() else {
            return Err(self.error(ParseErrorKind::InternalError, "lost fork survivors"));
        };
        if let Some(runner_up) = survivors.next()
            && runner_up.rule.priority() == winner.rule.priority()
        {
            self.restore(start);
            return Err(ParseError::ambiguous(self.peek().span, winner.rule.name(), runner_up.rule.name()));
        }
        tracing::trace!(rule = winner.rule.name(), "alternative selected");
        self.restore(winner.end);
        Ok(winner.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{Lexer, TokenKind};
    use bumpalo::Bump;

    fn parser<'ast>(source: &str, arena: &'ast Bump) -> Parser<'ast> {
        let tokens: Vec<_> = Lexer::new(source, arena).collect();
        Parser::new(tokens, arena)
    }

    fn eat_all<'ast>(kinds: &'static [TokenKind]) -> impl FnMut(&mut Parser<'ast>) -> Result<usize, ParseError> {
        move |p: &mut Parser<'ast>| {
            for kind in kinds {
                p.expect(*kind)?;
            }
            Ok(kinds.len())
        }
    }

    #[test]
    fn furthest_survivor_wins_over_priority() {
        let arena = Bump::new();
        let mut p = parser("a b c", &arena);
        let mut short = eat_all(&[TokenKind::Identifier]);
        let mut long = eat_all(&[TokenKind::Identifier, TokenKind::Identifier]);
        let result = p.fork(&mut [
            (Rule::Constructor, &mut short),
            (Rule::VariableInitializer, &mut long),
        ]);
        assert_eq!(result.unwrap(), 2);
        assert_eq!(p.peek().lexeme, "c");
    }

    #[test]
    fn priority_breaks_ties() {
        let arena = Bump::new();
        let mut p = parser("a b", &arena);
        let mut first = |p: &mut Parser<'_>| p.expect(TokenKind::Identifier).map(|_| Rule::VariableInitializer);
        let mut second = |p: &mut Parser<'_>| p.expect(TokenKind::Identifier).map(|_| Rule::FunctionDeclarator);
        let result = p.fork(&mut [
            (Rule::VariableInitializer, &mut first),
            (Rule::FunctionDeclarator, &mut second),
        ]);
        assert_eq!(result.unwrap(), Rule::FunctionDeclarator);
    }

    #[test]
    fn equal_priorities_are_ambiguous() {
        let arena = Bump::new();
        let mut p = parser("a", &arena);
        let mut first = eat_all(&[TokenKind::Identifier]);
        let mut second = eat_all(&[TokenKind::Identifier]);
        let error = p
            .fork(&mut [(Rule::Declaration, &mut first), (Rule::Declaration, &mut second)])
            .unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::Ambiguous);
    }

    #[test]
    fn reports_furthest_error_when_all_fail() {
        let arena = Bump::new();
        let mut p = parser("a b ;", &arena);
        let mut early = eat_all(&[TokenKind::IntLiteral]);
        let mut late = eat_all(&[TokenKind::Identifier, TokenKind::Identifier, TokenKind::Comma]);
        let error = p
            .fork(&mut [(Rule::Constructor, &mut early), (Rule::Declaration, &mut late)])
            .unwrap_err();
        assert_eq!(error.span.col, 5);
        assert_eq!(p.peek().lexeme, "a");
    }
}
