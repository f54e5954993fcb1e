//! Directive interpretation and conditional-inclusion state.

use std::path::{Path, PathBuf};

use bumpalo::Bump;
use cxxdecl_core::{PreprocessError, Span};
use rustc_hash::FxHashSet;

use super::PreprocessorService;
use super::macros::MacroDefinition;
use crate::lexer::{Lexer, TokenKind};

/// Include search configuration.
#[derive(Debug, Clone, Default)]
pub struct IncludeConfig {
    /// Directories searched for `#include` targets, in order.
    pub include_dirs: Vec<PathBuf>,
    /// Read included files for their macro definitions.
    pub follow_includes: bool,
    /// Directory of the file being processed, searched first for `"..."`
    /// includes.
    pub current_dir: Option<PathBuf>,
}

impl IncludeConfig {
    fn resolve(&self, name: &str, angled: bool) -> Option<PathBuf> {
        let local = (!angled)
            .then_some(self.current_dir.as_deref())
            .flatten()
            .map(|dir| dir.join(name))
            .filter(|candidate| candidate.is_file());
        local.or_else(|| {
            self.include_dirs
                .iter()
                .map(|dir| dir.join(name))
                .find(|candidate| candidate.is_file())
        })
    }
}

/// State of one `#if` group.
#[derive(Debug, Clone, Copy)]
struct Conditional {
    span: Span,
    /// The enclosing group is active.
    parent_active: bool,
    /// Some branch of this group has been selected.
    taken: bool,
    seen_else: bool,
    active: bool,
}

/// What a directive did, for the caller to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveEvent {
    Ignored,
    Defined(MacroDefinition),
    Undefined(String),
    Included(String),
}

/// Interprets directive lines against a [`PreprocessorService`].
pub struct DirectiveProcessor<'s, S: PreprocessorService + ?Sized> {
    service: &'s mut S,
    conditions: Vec<Conditional>,
    /// Conditionals below this depth belong to an including file.
    floor: usize,
    config: IncludeConfig,
    visited: FxHashSet<PathBuf>,
}

impl<'s, S: PreprocessorService + ?Sized> DirectiveProcessor<'s, S> {
    pub fn new(service: &'s mut S, config: IncludeConfig) -> Self {
        Self {
            service,
            conditions: Vec::new(),
            floor: 0,
            config,
            visited: FxHashSet::default(),
        }
    }

    pub fn service(&self) -> &S {
        self.service
    }

    /// Whether tokens at the current position are compiled.
    pub fn is_active(&self) -> bool {
        self.conditions.last().is_none_or(|c| c.active)
    }

    /// Fail if a conditional group is still open.
    pub fn finish(&self) -> Result<(), PreprocessError> {
        match self.conditions.last() {
            Some(open) => Err(PreprocessError::UnterminatedConditional { span: open.span }),
            None => Ok(()),
        }
    }

    /// Interpret one directive line (including its leading `#`).
    pub fn process(&mut self, text: &str, span: Span) -> Result<DirectiveEvent, PreprocessError> {
        let (name, rest) = split_directive(text);

        match name {
            "if" => {
                let condition = self.is_active() && self.evaluate(rest, span)?;
                self.open(span, condition);
                return Ok(DirectiveEvent::Ignored);
            }
            "ifdef" | "ifndef" => {
                let condition = self.is_active() && {
                    let macro_name = macro_name(name, rest, span)?;
                    self.service.is_defined(macro_name) == (name == "ifdef")
                };
                self.open(span, condition);
                return Ok(DirectiveEvent::Ignored);
            }
            "elif" | "elifdef" | "elifndef" => {
                let group = self.current_group(name, span)?;
                if group.seen_else {
                    return Err(PreprocessError::UnbalancedConditional {
                        directive: name.into(),
                        span,
                    });
                }
                let condition = if group.parent_active && !group.taken {
                    match name {
                        "elif" => self.evaluate(rest, span)?,
                        _ => {
                            let macro_name = macro_name(name, rest, span)?;
                            self.service.is_defined(macro_name) == (name == "elifdef")
                        }
                    }
                } else {
                    false
                };
                self.switch_branch(condition, false);
                return Ok(DirectiveEvent::Ignored);
            }
            "else" => {
                let group = self.current_group(name, span)?;
                if group.seen_else {
                    return Err(PreprocessError::UnbalancedConditional {
                        directive: name.into(),
                        span,
                    });
                }
                let condition = group.parent_active && !group.taken;
                self.switch_branch(condition, true);
                return Ok(DirectiveEvent::Ignored);
            }
            "endif" => {
                self.current_group(name, span)?;
                self.conditions.pop();
                return Ok(DirectiveEvent::Ignored);
            }
            _ => {}
        }

        if !self.is_active() {
            return Ok(DirectiveEvent::Ignored);
        }

        match name {
            "" => Ok(DirectiveEvent::Ignored),
            // GNU line markers: `# 12 "file.h"`
            n if n.starts_with(|c: char| c.is_ascii_digit()) => Ok(DirectiveEvent::Ignored),
            "define" => {
                let definition = MacroDefinition::parse(rest, span)?;
                tracing::debug!(name = %definition.name, "define");
                self.service.define(definition.clone());
                Ok(DirectiveEvent::Defined(definition))
            }
            "undef" => {
                let macro_name = macro_name(name, rest, span)?.to_string();
                self.service.undefine(&macro_name);
                Ok(DirectiveEvent::Undefined(macro_name))
            }
            "include" | "include_next" | "import" => {
                let (header, angled) = header_name(rest).ok_or_else(|| {
                    PreprocessError::MalformedDirective {
                        directive: name.into(),
                        span,
                        detail: "expected \"file\" or <file>".into(),
                    }
                })?;
                if self.config.follow_includes {
                    self.follow(header, angled)?;
                }
                Ok(DirectiveEvent::Included(header.to_string()))
            }
            "error" => Err(PreprocessError::ErrorDirective {
                message: rest.to_string(),
                span,
            }),
            "warning" => {
                tracing::warn!(at = %span, "#warning {rest}");
                Ok(DirectiveEvent::Ignored)
            }
            "pragma" | "line" | "ident" | "sccs" | "assert" | "unassert" => Ok(DirectiveEvent::Ignored),
            other => Err(PreprocessError::UnknownDirective {
                name: other.to_string(),
                span,
            }),
        }
    }

    /// Read a file for its macro definitions only (`-imacros`).
    pub fn load_macros(&mut self, path: &Path) -> Result<(), PreprocessError> {
        let contents = std::fs::read_to_string(path).map_err(|error| PreprocessError::IncludeUnreadable {
            path: path.display().to_string(),
            detail: error.to_string(),
        })?;
        self.visited.insert(path.to_path_buf());
        self.scan_macros(&contents, path.parent())
    }

    fn evaluate(&self, expression: &str, span: Span) -> Result<bool, PreprocessError> {
        if expression.is_empty() {
            return Err(PreprocessError::MalformedDirective {
                directive: "if".into(),
                span,
                detail: "missing expression".into(),
            });
        }
        Ok(self.service.evaluate_constant_expression(expression)?.is_true())
    }

    fn open(&mut self, span: Span, condition: bool) {
        let parent_active = self.is_active();
        self.conditions.push(Conditional {
            span,
            parent_active,
            taken: condition,
            seen_else: false,
            active: condition,
        });
    }

    fn current_group(&self, directive: &str, span: Span) -> Result<Conditional, PreprocessError> {
        if self.conditions.len() <= self.floor {
            return Err(PreprocessError::UnbalancedConditional {
                directive: directive.into(),
                span,
            });
        }
        self.conditions
            .last()
            .copied()
            .ok_or_else(|| PreprocessError::UnbalancedConditional {
                directive: directive.into(),
                span,
            })
    }

    fn switch_branch(&mut self, condition: bool, is_else: bool) {
        if let Some(group) = self.conditions.last_mut() {
            group.active = condition;
            group.taken |= condition;
            group.seen_else |= is_else;
        }
    }

    fn follow(&mut self, header: &str, angled: bool) -> Result<(), PreprocessError> {
        let Some(path) = self.config.resolve(header, angled) else {
            tracing::debug!(header, "include not found on search path");
            return Ok(());
        };
        if !self.visited.insert(path.clone()) {
            return Ok(());
        }
        tracing::debug!(path = %path.display(), "reading include for macros");
        let contents = std::fs::read_to_string(&path).map_err(|error| PreprocessError::IncludeUnreadable {
            path: path.display().to_string(),
            detail: error.to_string(),
        })?;
        self.scan_macros(&contents, path.parent())
    }

    /// Process only the directives of another file. Its declarations are
    /// not part of the output.
    fn scan_macros(&mut self, contents: &str, dir: Option<&Path>) -> Result<(), PreprocessError> {
        let arena = Bump::new();
        let mut lexer = Lexer::new(contents, &arena);
        let saved_floor = std::mem::replace(&mut self.floor, self.conditions.len());
        let saved_dir = std::mem::replace(&mut self.config.current_dir, dir.map(Path::to_path_buf));

        let result = loop {
            let token = lexer.next_token();
            match token.kind {
                TokenKind::Eof => break self.finish_included(),
                TokenKind::Directive => {
                    if let Err(error) = self.process(token.lexeme, token.span) {
                        break Err(error);
                    }
                }
                _ => {
                    // Stray characters in included headers are not ours to report.
                    lexer.take_errors();
                }
            }
        };

        self.conditions.truncate(self.floor);
        self.floor = saved_floor;
        self.config.current_dir = saved_dir;
        result
    }

    fn finish_included(&self) -> Result<(), PreprocessError> {
        match self.conditions.get(self.floor) {
            Some(open) => Err(PreprocessError::UnterminatedConditional { span: open.span }),
            None => Ok(()),
        }
    }
}

/// Split `#  name rest` into the directive name and its trimmed argument.
fn split_directive(text: &str) -> (&str, &str) {
    let body = text.trim_start().strip_prefix('#').unwrap_or(text).trim_start();
    let end = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(body.len());
    (&body[..end], body[end..].trim())
}

fn macro_name<'t>(directive: &str, rest: &'t str, span: Span) -> Result<&'t str, PreprocessError> {
    let name = rest.split_whitespace().next().unwrap_or_default();
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(PreprocessError::MalformedDirective {
            directive: directive.into(),
            span,
            detail: "expected a macro name".into(),
        })
    }
}

/// `"file.h"` or `<file.h>`, with whether it was angled.
fn header_name(rest: &str) -> Option<(&str, bool)> {
    if let Some(quoted) = rest.strip_prefix('"') {
        return Some((&quoted[..quoted.find('"')?], false));
    }
    let angled = rest.strip_prefix('<')?;
    Some((&angled[..angled.find('>')?], true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessor::MacroTable;

    fn run(table: &mut MacroTable, lines: &[&str]) -> Result<Vec<bool>, PreprocessError> {
        let mut processor = DirectiveProcessor::new(table, IncludeConfig::default());
        let mut states = Vec::new();
        for line in lines {
            processor.process(line, Span::default())?;
            states.push(processor.is_active());
        }
        processor.finish()?;
        Ok(states)
    }

    #[test]
    fn split_names() {
        assert_eq!(split_directive("#define X 1"), ("define", "X 1"));
        assert_eq!(split_directive("  #  endif // done"), ("endif", "// done"));
        assert_eq!(split_directive("#"), ("", ""));
    }

    #[test]
    fn if_elif_else_selects_one_branch() {
        let mut table = MacroTable::new();
        table.define(MacroDefinition::object("LEVEL", "2"));
        let states = run(
            &mut table,
            &["#if LEVEL == 1", "#elif LEVEL == 2", "#elif LEVEL >= 2", "#else", "#endif"],
        )
        .unwrap();
        assert_eq!(states, vec![false, true, false, false, true]);
    }

    #[test]
    fn nested_inactive_groups_stay_inactive() {
        let mut table = MacroTable::new();
        let states = run(
            &mut table,
            &["#if 0", "#ifdef NOTHING", "#else", "#endif", "#else", "#endif"],
        )
        .unwrap();
        assert_eq!(states, vec![false, false, false, false, true, true]);
    }

    #[test]
    fn ifdef_and_ifndef() {
        let mut table = MacroTable::new();
        let states = run(
            &mut table,
            &["#ifndef GUARD_H", "#define GUARD_H", "#ifdef GUARD_H", "#endif", "#endif"],
        )
        .unwrap();
        assert_eq!(states, vec![true, true, true, true, true]);
        assert!(table.is_defined("GUARD_H"));
    }

    #[test]
    fn inactive_defines_are_skipped() {
        let mut table = MacroTable::new();
        run(&mut table, &["#if 0", "#define HIDDEN", "#error never", "#endif"]).unwrap();
        assert!(!table.is_defined("HIDDEN"));
    }

    #[test]
    fn unbalanced_conditionals() {
        let mut table = MacroTable::new();
        assert!(matches!(
            run(&mut table, &["#endif"]),
            Err(PreprocessError::UnbalancedConditional { .. })
        ));
        assert!(matches!(
            run(&mut table, &["#if 1", "#else", "#else"]),
            Err(PreprocessError::UnbalancedConditional { .. })
        ));
        assert!(matches!(
            run(&mut table, &["#if 1"]),
            Err(PreprocessError::UnterminatedConditional { .. })
        ));
    }

    #[test]
    fn error_and_unknown_directives() {
        let mut table = MacroTable::new();
        assert!(matches!(
            run(&mut table, &["#error unsupported platform"]),
            Err(PreprocessError::ErrorDirective { message, .. }) if message == "unsupported platform"
        ));
        assert!(matches!(
            run(&mut table, &["#frobnicate"]),
            Err(PreprocessError::UnknownDirective { .. })
        ));
        assert!(run(&mut table, &["#pragma once", "#line 10", "# 1 \"x.h\""]).is_ok());
    }

    #[test]
    fn include_is_reported() {
        let mut table = MacroTable::new();
        let mut processor = DirectiveProcessor::new(&mut table, IncludeConfig::default());
        assert_eq!(
            processor.process("#include \"vtkObject.h\"", Span::default()).unwrap(),
            DirectiveEvent::Included("vtkObject.h".into())
        );
        assert_eq!(
            processor.process("#include <vector>", Span::default()).unwrap(),
            DirectiveEvent::Included("vector".into())
        );
        assert!(processor.process("#include vector", Span::default()).is_err());
    }

    #[test]
    fn undef_removes_macro() {
        let mut table = MacroTable::new();
        run(&mut table, &["#define A 1", "#undef A"]).unwrap();
        assert!(!table.is_defined("A"));
    }
}
