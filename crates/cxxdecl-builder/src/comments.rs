//! Documentation comments.
//!
//! The preprocessor hands comments and blank lines over on a side channel,
//! in source order. [`CommentTracker`] walks that channel in step with the
//! assembler, which asks for the comment leading up to each declaration and
//! for comments trailing the one it just finished.
//!
//! ```text
//! /// Leading comment for Foo.      Sticky, attaches to Foo
//! class Foo {
//!   int x; ///< Trailing, for x     same line as the end of `x`
//!   //@{
//!   /// Shared by a and b           member group: stays sticky
//!   int a;
//!   int b;
//!   //@}
//! };
//! /** \class Foo ... */              Named, resolved by a post-pass
//! ```

use cxxdecl_core::{ClassInfo, Diagnostic, FileInfo, Members, NamespaceInfo, Span, Symbol};
use cxxdecl_parser::{Token, TokenKind};

/// Where the tracker stands after the comments it has read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentState {
    #[default]
    None,
    /// A comment is waiting for the next declaration.
    Sticky,
    /// A blank line ended the last comment.
    Closed,
    /// The last comment named its target explicitly.
    Named,
    /// The last comment belonged to the previous declaration.
    Trailing,
}

/// What a named comment documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedKind {
    Class,
    Struct,
    Union,
    Enum,
    Function,
    Variable,
    Macro,
    Typedef,
    Namespace,
    File,
}

impl NamedKind {
    fn from_command(command: &str) -> Option<NamedKind> {
        Some(match command {
            "class" => NamedKind::Class,
            "struct" => NamedKind::Struct,
            "union" => NamedKind::Union,
            "enum" => NamedKind::Enum,
            "fn" => NamedKind::Function,
            "var" => NamedKind::Variable,
            "def" => NamedKind::Macro,
            "typedef" => NamedKind::Typedef,
            "namespace" => NamedKind::Namespace,
            "file" => NamedKind::File,
            _ => return None,
        })
    }
}

/// A comment that names the declaration it documents, as in `\class Foo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedComment {
    pub kind: NamedKind,
    /// The target, possibly qualified; empty for `\file` without a name.
    pub target: String,
    /// The comment text after the command line.
    pub text: String,
}

/// Comments collected before a declaration.
#[derive(Debug, Default)]
pub struct Leading {
    /// Documentation for the coming declaration.
    pub comment: Option<String>,
    /// `///<` comments for the declaration before it.
    pub trailing: Vec<String>,
}

/// Pairs comments with declarations as the assembler walks the header.
#[derive(Debug)]
pub struct CommentTracker<'ast> {
    trivia: Vec<Token<'ast>>,
    next: usize,
    state: CommentState,
    sticky: Vec<String>,
    /// Line on which the last sticky comment ended.
    last_line: u32,
    in_group: bool,
    named: Vec<NamedComment>,
}

impl<'ast> CommentTracker<'ast> {
    pub fn new(trivia: Vec<Token<'ast>>) -> Self {
        Self {
            trivia,
            next: 0,
            state: CommentState::None,
            sticky: Vec::new(),
            last_line: 0,
            in_group: false,
            named: Vec::new(),
        }
    }

    pub fn state(&self) -> CommentState {
        self.state
    }

    /// Read the comments before `start` and return the one that documents
    /// the declaration beginning there.
    pub fn leading(&mut self, start: Span) -> Leading {
        let mut leading = Leading::default();
        while let Some(token) = self.trivia.get(self.next).copied() {
            if !token.span.starts_before(start) {
                break;
            }
            self.next += 1;
            self.feed(token, &mut leading.trailing);
        }
        if self.state == CommentState::Sticky && !self.sticky.is_empty() {
            leading.comment = Some(self.sticky.join("\n"));
            if !self.in_group {
                self.sticky.clear();
                self.state = CommentState::None;
            }
        }
        leading
    }

    /// Comments on the line where a declaration ended, after its end.
    pub fn trailing(&mut self, end: Span) -> Option<String> {
        let mut lines = Vec::new();
        while let Some(token) = self.trivia.get(self.next).copied() {
            if token.kind != TokenKind::Comment || token.span.line != end.line || !end.starts_before(token.span) {
                break;
            }
            self.next += 1;
            let (_, text) = clean(token.lexeme);
            if !text.is_empty() {
                lines.push(text);
            }
            self.state = CommentState::Trailing;
        }
        (!lines.is_empty()).then(|| lines.join("\n"))
    }

    /// Read the comments before the closing brace of a scope. A sticky
    /// comment left at that point has nothing to attach to.
    pub fn close_scope(&mut self, end: Span) -> Vec<String> {
        let mut trailing = Vec::new();
        while let Some(token) = self.trivia.get(self.next).copied() {
            if !token.span.starts_before(end) {
                break;
            }
            self.next += 1;
            self.feed(token, &mut trailing);
        }
        if self.state == CommentState::Sticky && !self.in_group {
            self.sticky.clear();
            self.state = CommentState::Closed;
        }
        trailing
    }

    /// Read whatever is left and hand back the named comments.
    pub fn finish(&mut self) -> (Vec<NamedComment>, Vec<String>) {
        let mut trailing = Vec::new();
        while let Some(token) = self.trivia.get(self.next).copied() {
            self.next += 1;
            self.feed(token, &mut trailing);
        }
        (std::mem::take(&mut self.named), trailing)
    }

    fn feed(&mut self, token: Token<'ast>, trailing: &mut Vec<String>) {
        match token.kind {
            TokenKind::BlankLine => {
                if self.state == CommentState::Sticky && !self.in_group {
                    self.sticky.clear();
                    self.state = CommentState::Closed;
                }
            }
            TokenKind::Comment => self.feed_comment(token, trailing),
            _ => {}
        }
    }

    fn feed_comment(&mut self, token: Token<'ast>, trailing: &mut Vec<String>) {
        let (is_trailing, text) = clean(token.lexeme);
        let end_line = token.span.line + token.lexeme.matches('\n').count() as u32;

        if is_trailing {
            if !text.is_empty() {
                trailing.push(text);
            }
            self.state = CommentState::Trailing;
            return;
        }

        if let Some(named) = named_comment(&text) {
            self.named.push(named);
            self.state = CommentState::Named;
            return;
        }

        if let Some(rest) = strip_group_marker(&text, "@{") {
            self.in_group = true;
            if !rest.is_empty() {
                self.sticky = vec![rest];
            }
            self.state = CommentState::Sticky;
            self.last_line = end_line;
            return;
        }
        if strip_group_marker(&text, "@}").is_some() {
            self.in_group = false;
            self.sticky.clear();
            self.state = CommentState::Closed;
            return;
        }

        let continues = self.state == CommentState::Sticky && token.span.line == self.last_line + 1;
        if !continues {
            self.sticky.clear();
        }
        if !text.is_empty() {
            self.sticky.push(text);
        }
        self.state = CommentState::Sticky;
        self.last_line = end_line;
    }
}

/// Strip comment delimiters and decoration. Returns whether the comment
/// was marked as trailing (`//<`, `///<`, `//!<`, `/**<`, `/*!<`).
fn clean(lexeme: &str) -> (bool, String) {
    let (body, is_trailing) = if let Some(rest) = lexeme.strip_prefix("//") {
        let rest = rest.trim_start_matches(['/', '!']);
        match rest.strip_prefix('<') {
            Some(rest) => (rest, true),
            None => (rest, false),
        }
    } else {
        let inner = lexeme.strip_prefix("/*").unwrap_or(lexeme);
        let inner = inner.strip_suffix("*/").unwrap_or(inner);
        let inner = inner.trim_start_matches(['*', '!']);
        match inner.strip_prefix('<') {
            Some(rest) => (rest, true),
            None => (inner, false),
        }
    };

    let lines: Vec<&str> = body
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').map_or(line, str::trim_start)
        })
        .collect();
    let start = lines.iter().position(|line| !line.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|line| !line.is_empty()).map_or(start, |i| i + 1);
    (is_trailing, lines[start..end].join("\n"))
}

/// `@{` or `\{` at the start of the comment; the rest of the text.
fn strip_group_marker(text: &str, marker: &str) -> Option<String> {
    let backslash = marker.replace('@', "\\");
    let rest = text.strip_prefix(marker).or_else(|| text.strip_prefix(backslash.as_str()))?;
    Some(rest.trim().to_string())
}

/// Parse `\class Foo`, `@fn Bar` and the like at the start of a comment.
fn named_comment(text: &str) -> Option<NamedComment> {
    let rest = text.strip_prefix('\\').or_else(|| text.strip_prefix('@'))?;
    let (first_line, body) = rest.split_once('\n').unwrap_or((rest, ""));
    let mut words = first_line.split_whitespace();
    let kind = NamedKind::from_command(words.next()?)?;
    let target = match kind {
        // `\fn int Foo::Bar(int x)`: the name is the word before `(`
        NamedKind::Function => {
            let head = first_line.split('(').next().unwrap_or("");
            head.split_whitespace().last().unwrap_or("").to_string()
        }
        _ => words.next().unwrap_or("").to_string(),
    };
    let remainder: Vec<&str> = words.collect();
    let mut text = String::new();
    if kind == NamedKind::File && !remainder.is_empty() {
        text.push_str(&remainder.join(" "));
    }
    if !body.trim().is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(body.trim());
    }
    Some(NamedComment { kind, target, text })
}

// ============================================================================
// Named comment resolution
// ============================================================================

/// Attach named comments to the declarations they name, anywhere in the
/// graph. Targets that cannot be found are reported as diagnostics.
pub fn resolve_named(file: &mut FileInfo, named: Vec<NamedComment>) {
    for comment in named {
        if comment.kind == NamedKind::File {
            file.description = Some(comment.text);
            continue;
        }
        let simple = comment.target.rsplit("::").next().unwrap_or(&comment.target).to_string();
        let slot = match comment.kind {
            NamedKind::Macro => file
                .macros
                .iter_mut()
                .find(|m| m.name.as_ref() == simple)
                .map(|m| &mut m.comment),
            _ => find_in_namespace(&mut file.contents, comment.kind, &simple),
        };
        match slot {
            Some(slot) => *slot = Some(comment.text),
            None => {
                tracing::warn!(target = %comment.target, "comment names an unknown declaration");
                file.diagnostics.push(Diagnostic::UnresolvedComment { target: comment.target });
            }
        }
    }
}

fn find_in_namespace<'a>(namespace: &'a mut NamespaceInfo, kind: NamedKind, name: &str) -> Option<&'a mut Option<String>> {
    if kind == NamedKind::Namespace && namespace.name.as_deref() == Some(name) {
        return Some(&mut namespace.comment);
    }
    if declares(&namespace.members, kind, name) {
        return find_in_members(&mut namespace.members, kind, name);
    }
    let index = namespace
        .namespaces
        .iter()
        .position(|inner| namespace_declares(inner, kind, name))?;
    find_in_namespace(&mut namespace.namespaces[index], kind, name)
}

fn namespace_declares(namespace: &NamespaceInfo, kind: NamedKind, name: &str) -> bool {
    (kind == NamedKind::Namespace && namespace.name.as_deref() == Some(name))
        || declares(&namespace.members, kind, name)
        || namespace.namespaces.iter().any(|inner| namespace_declares(inner, kind, name))
}

/// Index of the directly declared member `name` of the given kind.
fn position(members: &Members, kind: NamedKind, name: &str) -> Option<usize> {
    let is = |symbol: &Option<Symbol>| symbol.as_deref() == Some(name);
    match kind {
        NamedKind::Class | NamedKind::Struct | NamedKind::Union => {
            members.classes.iter().position(|c| c.name.as_ref() == name)
        }
        NamedKind::Function => members.functions.iter().position(|f| f.name.as_ref() == name),
        NamedKind::Enum => members.enums.iter().position(|e| is(&e.name)),
        NamedKind::Typedef => members.typedefs.iter().position(|t| is(&t.name)),
        // variables first, then constants offset past them
        NamedKind::Variable => members
            .variables
            .iter()
            .position(|v| is(&v.name))
            .or_else(|| {
                let i = members.constants.iter().position(|v| is(&v.name))?;
                Some(members.variables.len() + i)
            }),
        _ => None,
    }
}

fn declares(members: &Members, kind: NamedKind, name: &str) -> bool {
    position(members, kind, name).is_some()
        || members.classes.iter().any(|class| declares(&class.members, kind, name))
}

fn find_in_members<'a>(members: &'a mut Members, kind: NamedKind, name: &str) -> Option<&'a mut Option<String>> {
    if let Some(index) = position(members, kind, name) {
        return Some(match kind {
            NamedKind::Class | NamedKind::Struct | NamedKind::Union => &mut members.classes[index].comment,
            NamedKind::Function => &mut members.functions[index].comment,
            NamedKind::Enum => &mut members.enums[index].comment,
            NamedKind::Typedef => &mut members.typedefs[index].comment,
            _ if index < members.variables.len() => &mut members.variables[index].comment,
            _ => &mut members.constants[index - members.variables.len()].comment,
        });
    }
    let index = members
        .classes
        .iter()
        .position(|class: &ClassInfo| declares(&class.members, kind, name))?;
    find_in_members(&mut members.classes[index].members, kind, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use cxxdecl_core::{ClassKind, FunctionInfo};
    use cxxdecl_parser::Lexer;

    fn trivia<'ast>(source: &str, arena: &'ast Bump) -> Vec<Token<'ast>> {
        Lexer::new(source, arena).filter(|t| t.kind.is_trivia()).collect()
    }

    #[test]
    fn cleans_comment_decoration() {
        assert_eq!(clean("/// Leading text"), (false, "Leading text".into()));
        assert_eq!(clean("///< the x"), (true, "the x".into()));
        assert_eq!(clean("/**\n * First\n * Second\n */"), (false, "First\nSecond".into()));
        assert_eq!(clean("/*!< trailing */"), (true, "trailing".into()));
    }

    #[test]
    fn consecutive_lines_accumulate() {
        let arena = Bump::new();
        let mut tracker = CommentTracker::new(trivia("// one\n// two\nint x;", &arena));
        let leading = tracker.leading(Span::new(3, 1, 3));
        assert_eq!(leading.comment.as_deref(), Some("one\ntwo"));
        assert_eq!(tracker.state(), CommentState::None);
    }

    #[test]
    fn blank_line_closes_comment() {
        let arena = Bump::new();
        let mut tracker = CommentTracker::new(trivia("// license\n\nint x;", &arena));
        let leading = tracker.leading(Span::new(3, 1, 3));
        assert!(leading.comment.is_none());
        assert_eq!(tracker.state(), CommentState::Closed);
    }

    #[test]
    fn member_group_comment_stays_sticky() {
        let arena = Bump::new();
        let source = "//@{\n// shared\nint a;\n\nint b;\n//@}\nint c;";
        let mut tracker = CommentTracker::new(trivia(source, &arena));
        assert_eq!(tracker.leading(Span::new(3, 1, 3)).comment.as_deref(), Some("shared"));
        assert_eq!(tracker.leading(Span::new(5, 1, 3)).comment.as_deref(), Some("shared"));
        assert!(tracker.leading(Span::new(7, 1, 3)).comment.is_none());
    }

    #[test]
    fn same_line_comment_trails() {
        let arena = Bump::new();
        let mut tracker = CommentTracker::new(trivia("int x; // the x\n// next\nint y;", &arena));
        assert!(tracker.leading(Span::new(1, 1, 3)).comment.is_none());
        assert_eq!(tracker.trailing(Span::new(1, 6, 1)).as_deref(), Some("the x"));
        assert_eq!(tracker.state(), CommentState::Trailing);
        assert_eq!(tracker.leading(Span::new(3, 1, 3)).comment.as_deref(), Some("next"));
    }

    #[test]
    fn comment_at_end_of_scope_is_dropped() {
        let arena = Bump::new();
        let source = "struct A {\n  int x;\n  // stray\n};\nint y;";
        let mut tracker = CommentTracker::new(trivia(source, &arena));
        assert!(tracker.leading(Span::new(2, 3, 3)).comment.is_none());
        assert!(tracker.close_scope(Span::new(4, 1, 1)).is_empty());
        assert!(tracker.leading(Span::new(5, 1, 3)).comment.is_none());
    }

    #[test]
    fn marked_trailing_comment_on_own_line() {
        let arena = Bump::new();
        let mut tracker = CommentTracker::new(trivia("int x;\n///< about x\nint y;", &arena));
        let leading = tracker.leading(Span::new(3, 1, 3));
        assert!(leading.comment.is_none());
        assert_eq!(leading.trailing, vec!["about x".to_string()]);
    }

    #[test]
    fn parses_named_comments() {
        let named = named_comment("\\class Foo\nDoes foo things.").unwrap();
        assert_eq!(named.kind, NamedKind::Class);
        assert_eq!(named.target, "Foo");
        assert_eq!(named.text, "Does foo things.");

        let named = named_comment("@fn int Foo::Bar(int x)\nBars.").unwrap();
        assert_eq!(named.kind, NamedKind::Function);
        assert_eq!(named.target, "Foo::Bar");

        assert!(named_comment("\\brief not a target").is_none());
    }

    #[test]
    fn resolves_named_comments_in_post_pass() {
        let mut file = FileInfo::new(None);
        let mut class = ClassInfo::new("Foo".into(), ClassKind::Class);
        class.members.add_function(FunctionInfo::new("Bar".into()));
        file.contents.members.add_class(class);

        resolve_named(
            &mut file,
            vec![
                named_comment("\\class Foo\nA foo.").unwrap(),
                named_comment("\\fn void Foo::Bar()\nA bar.").unwrap(),
                named_comment("\\file demo.h The demo header.").unwrap(),
                named_comment("\\enum Missing\n").unwrap(),
            ],
        );

        let foo = &file.contents.members.classes[0];
        assert_eq!(foo.comment.as_deref(), Some("A foo."));
        assert_eq!(foo.members.functions[0].comment.as_deref(), Some("A bar."));
        assert_eq!(file.description.as_deref(), Some("The demo header."));
        assert_eq!(file.diagnostics.len(), 1);
    }
}
