//! Declaration assembly.
//!
//! Walks a parsed [`TranslationUnit`] in source order and turns every
//! declaration into a record of the graph, inserted into the innermost
//! namespace or class. All mutable state lives in one [`AssemblyContext`]:
//!
//! ```text
//! TranslationUnit ──► AssemblyContext ──► FileInfo
//!                      ├─ ScopeStacks       where records go
//!                      ├─ SignatureBuilder  normalized declaration text
//!                      ├─ CommentTracker    documentation for each record
//!                      └─ known types       classes, enums and typedefs seen so far
//! ```
//!
//! The walk is deterministic: the same tree always yields the same graph.

mod classes;
mod declarations;
mod enums;
mod types;

use cxxdecl_core::{
    BaseType, Diagnostic, FileInfo, MacroInfo, NamespaceInfo, StringCache, Symbol, TypeCode, UsingInfo, ValueInfo,
};
use cxxdecl_parser::ast::{Item, NamespaceDecl, TemplateDecl, TemplateParam};
use cxxdecl_parser::{Token, TranslationUnit};
use rustc_hash::FxHashMap;

use crate::attributes::{AttributeValidator, DEFAULT_NAMESPACE, DeclAttributes};
use crate::comments::{CommentTracker, resolve_named};
use crate::error::BuildError;
use crate::scope::{ScopeStacks, ScopeStats};
use crate::signature::SignatureBuilder;

/// Settings for one assembly.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Namespace of the attributes that are validated and applied.
    pub attribute_namespace: String,
    pub file_name: Option<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            attribute_namespace: DEFAULT_NAMESPACE.to_string(),
            file_name: None,
        }
    }
}

/// What the preprocessor reported besides the tokens.
#[derive(Debug, Default)]
pub struct SourceInfo<'ast> {
    /// Comments and blank lines in source order.
    pub trivia: Vec<Token<'ast>>,
    pub includes: Vec<String>,
    pub macros: Vec<MacroInfo>,
}

/// Record counts for one assembly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    pub namespaces: usize,
    pub classes: usize,
    pub functions: usize,
    pub variables: usize,
    pub constants: usize,
    pub enums: usize,
    pub typedefs: usize,
    pub usings: usize,
    pub dropped_overloads: usize,
    pub scopes: ScopeStats,
}

/// The result of assembly.
#[derive(Debug)]
pub struct Assembly {
    pub file: FileInfo,
    pub stats: AssemblyStats,
}

/// Build the declaration graph of a parsed header.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn assemble<'ast>(
    unit: &TranslationUnit<'ast>,
    source: SourceInfo<'ast>,
    options: &BuildOptions,
) -> Result<Assembly, BuildError> {
    let mut context = AssemblyContext::new(source.trivia, options);
    context.visit_items(unit.items())?;
    Ok(context.finish(source.includes, source.macros, options.file_name.clone()))
}

/// Mutable state of one assembly.
pub struct AssemblyContext<'ast> {
    scopes: ScopeStacks,
    signature: SignatureBuilder,
    comments: CommentTracker<'ast>,
    attributes: AttributeValidator,
    strings: StringCache,
    /// Classes, enums and typedefs declared so far, by qualified name.
    known_types: FxHashMap<String, BaseType>,
    /// Names of the enclosing named namespaces and classes.
    path: Vec<String>,
    /// Documentation for the declaration being visited.
    pending_comment: Option<String>,
    /// Declaration-level attributes waiting for an in-place class or enum.
    pending_attributes: Option<DeclAttributes>,
    diagnostics: Vec<Diagnostic>,
    stats: AssemblyStats,
}

impl<'ast> AssemblyContext<'ast> {
    pub fn new(trivia: Vec<Token<'ast>>, options: &BuildOptions) -> Self {
        Self {
            scopes: ScopeStacks::new(),
            signature: SignatureBuilder::new(),
            comments: CommentTracker::new(trivia),
            attributes: AttributeValidator::new(options.attribute_namespace.clone()),
            strings: StringCache::new(),
            known_types: FxHashMap::default(),
            path: Vec::new(),
            pending_comment: None,
            pending_attributes: None,
            diagnostics: Vec::new(),
            stats: AssemblyStats::default(),
        }
    }

    fn finish(mut self, includes: Vec<String>, macros: Vec<MacroInfo>, file_name: Option<String>) -> Assembly {
        let (named, trailing) = self.comments.finish();
        self.attach_trailing(trailing);

        let mut file = FileInfo::new(file_name);
        file.includes = includes;
        file.macros = macros
            .into_iter()
            .map(|mut info| {
                info.name = self.strings.intern(&info.name);
                info.parameters = info
                    .parameters
                    .map(|params| params.iter().map(|p| self.strings.intern(p)).collect());
                info
            })
            .collect();
        file.diagnostics = std::mem::take(&mut self.diagnostics);

        let mut stats = self.stats;
        stats.scopes = self.scopes.stats();
        file.contents = self.scopes.into_global();
        file.strings = self.strings;
        resolve_named(&mut file, named);

        tracing::debug!(
            classes = stats.classes,
            functions = stats.functions,
            variables = stats.variables,
            "assembled declaration graph"
        );
        Assembly { file, stats }
    }

    fn intern(&mut self, text: &str) -> Symbol {
        self.strings.intern(text)
    }

    fn take_comment(&mut self) -> Option<String> {
        self.pending_comment.take()
    }

    // ==========================================================================
    // Items
    // ==========================================================================

    /// Visit declarations in order, pairing each with its comments.
    fn visit_items(&mut self, items: &'ast [Item<'ast>]) -> Result<(), BuildError> {
        for item in items {
            let extent = item.extent();
            let leading = self.comments.leading(extent.start);
            self.attach_trailing(leading.trailing);
            self.pending_comment = leading.comment;

            self.visit_item(item)?;

            self.pending_comment = None;
            if let Some(text) = self.comments.trailing(extent.end) {
                self.attach_trailing(vec![text]);
            }
        }
        Ok(())
    }

    fn visit_item(&mut self, item: &'ast Item<'ast>) -> Result<(), BuildError> {
        match item {
            Item::Namespace(decl) => self.visit_namespace(decl),
            Item::NamespaceAlias(alias) => {
                let name = self.intern(alias.name.lexeme);
                let scope = types::name_text(&alias.target);
                let using = UsingInfo {
                    name: Some(name),
                    scope: self.intern(&scope),
                    is_namespace: true,
                    access: self.scopes.access(),
                    comment: self.take_comment(),
                };
                self.add_using(using);
                Ok(())
            }
            Item::Linkage(linkage) => self.visit_items(linkage.items),
            Item::Simple(decl) => self.visit_simple(decl),
            Item::Alias(alias) => self.visit_alias(alias),
            Item::Using(using) => {
                let name = self.intern(using.name.simple_name());
                let qualifier: Vec<&str> = using.name.qualifier().iter().map(|segment| segment.name).collect();
                let using = UsingInfo {
                    name: Some(name),
                    scope: self.intern(&qualifier.join("::")),
                    is_namespace: false,
                    access: self.scopes.access(),
                    comment: self.take_comment(),
                };
                self.add_using(using);
                Ok(())
            }
            Item::UsingDirective(directive) => {
                let scope = types::name_text(&directive.name);
                let using = UsingInfo {
                    name: None,
                    scope: self.intern(&scope),
                    is_namespace: true,
                    access: self.scopes.access(),
                    comment: self.take_comment(),
                };
                self.add_using(using);
                Ok(())
            }
            Item::Template(decl) => self.visit_template(decl),
            Item::ExplicitInstantiation(_) => {
                tracing::trace!("ignoring explicit instantiation");
                Ok(())
            }
            Item::AccessLabel(label) => {
                self.scopes.set_access(label.access);
                Ok(())
            }
            Item::StaticAssert(_) | Item::Empty(_) => Ok(()),
        }
    }

    fn add_using(&mut self, using: UsingInfo) {
        tracing::debug!(scope = %using.scope, "recorded using");
        self.scopes.members_mut().add_using(using);
        self.stats.usings += 1;
    }

    // ==========================================================================
    // Namespaces
    // ==========================================================================

    fn visit_namespace(&mut self, decl: &'ast NamespaceDecl<'ast>) -> Result<(), BuildError> {
        let comment = self.take_comment();
        let names: Vec<Option<Symbol>> = if decl.names.is_empty() {
            vec![None]
        } else {
            decl.names.iter().map(|name| Some(self.strings.intern(name.lexeme))).collect()
        };

        let innermost = names.len() - 1;
        for (i, name) in names.iter().enumerate() {
            let mut namespace = NamespaceInfo::new(name.clone());
            if i == innermost {
                namespace.is_inline = decl.is_inline;
                namespace.comment = comment.clone();
            }
            if let Some(name) = name {
                self.path.push(name.to_string());
            }
            self.scopes.push_namespace(namespace);
            self.stats.namespaces += 1;
        }

        let result = self.visit_items(decl.items);
        let stray = self.comments.close_scope(decl.extent.end);
        self.attach_trailing(stray);

        for name in names.iter().rev() {
            self.scopes.pop_namespace();
            if name.is_some() {
                self.path.pop();
            }
        }
        tracing::debug!(names = names.len(), "recorded namespace");
        result
    }

    // ==========================================================================
    // Templates
    // ==========================================================================

    fn visit_template(&mut self, decl: &'ast TemplateDecl<'ast>) -> Result<(), BuildError> {
        self.scopes.push_template();
        let result = self.template_body(decl);
        if self.scopes.pop_template().is_some() {
            tracing::trace!("template parameters not claimed by a declaration");
        }
        result
    }

    fn template_body(&mut self, decl: &'ast TemplateDecl<'ast>) -> Result<(), BuildError> {
        for param in decl.params {
            let value = self.template_parameter(param)?;
            if let Some(template) = self.scopes.template_mut() {
                template.parameters.push(value);
            }
        }
        self.visit_item(decl.item)
    }

    fn template_parameter(&mut self, param: &'ast TemplateParam<'ast>) -> Result<ValueInfo, BuildError> {
        match param {
            TemplateParam::Type {
                key,
                is_pack,
                name,
                default,
                ..
            } => {
                let mut value = ValueInfo::new(TypeCode::from_base(BaseType::TypeName));
                value.name = name.map(|name| self.strings.intern(name.lexeme));
                value.class_name = Some(self.intern(key.lexeme));
                value.is_pack = *is_pack;
                value.value = default.map(crate::signature::expression_text);
                Ok(value)
            }
            TemplateParam::NonType(param) => {
                let mark = self.signature.mark();
                let value = self.parameter(param);
                self.signature.cut_since(mark);
                value
            }
            TemplateParam::Template {
                params,
                key,
                is_pack,
                name,
                default,
                ..
            } => {
                self.scopes.push_template();
                let mut nested = Ok(());
                for inner in *params {
                    match self.template_parameter(inner) {
                        Ok(value) => {
                            if let Some(template) = self.scopes.template_mut() {
                                template.parameters.push(value);
                            }
                        }
                        Err(error) => {
                            nested = Err(error);
                            break;
                        }
                    }
                }
                let template = self.scopes.pop_template();
                nested?;

                let mut value = ValueInfo::new(TypeCode::from_base(BaseType::TypeName));
                value.name = name.map(|name| self.strings.intern(name.lexeme));
                value.class_name = Some(self.intern(key.lexeme));
                value.is_pack = *is_pack;
                value.value = default.map(crate::signature::expression_text);
                value.template = template.map(Box::new);
                Ok(value)
            }
        }
    }

    // ==========================================================================
    // Comments
    // ==========================================================================

    /// Attach trailing comments to the most recent record of the active
    /// scope.
    fn attach_trailing(&mut self, texts: Vec<String>) {
        if texts.is_empty() {
            return;
        }
        let text = texts.join("\n");
        let slot = if self.scopes.in_class() {
            self.scopes.class_mut().and_then(|class| {
                let item = class.members.last_item()?;
                class.members.comment_mut(item)
            })
        } else {
            let namespace = self.scopes.namespace_mut();
            let item = namespace.members.last_item();
            item.and_then(|item| namespace.comment_mut(item))
        };
        match slot {
            Some(Some(existing)) => {
                existing.push('\n');
                existing.push_str(&text);
            }
            Some(slot) => *slot = Some(text),
            None => tracing::trace!("trailing comment with no declaration before it"),
        }
    }

    // ==========================================================================
    // Known types
    // ==========================================================================

    /// Remember a type name declared in the current scope.
    fn register_type(&mut self, name: &str, base: BaseType) {
        if name.is_empty() {
            return;
        }
        let key = if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}::{}", self.path.join("::"), name)
        };
        self.known_types.insert(key, base);
    }

    /// Look a name up from the innermost scope outwards.
    fn lookup_type(&self, name: &str) -> Option<BaseType> {
        (0..=self.path.len()).rev().find_map(|depth| {
            let key = if depth == 0 {
                name.to_string()
            } else {
                format!("{}::{}", self.path[..depth].join("::"), name)
            };
            self.known_types.get(&key).copied()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AttributeError;
    use bumpalo::Bump;
    use cxxdecl_core::{Access, ClassInfo, Dimension, FunctionFlags, Specifiers, ValueFlags};
    use cxxdecl_parser::{Lexer, Parser};

    fn build(source: &str) -> Result<Assembly, BuildError> {
        let arena = Bump::new();
        let (tokens, trivia): (Vec<_>, Vec<_>) = Lexer::new(source, &arena).partition(|t| !t.kind.is_trivia());
        let unit = Parser::new(tokens, &arena)
            .parse_translation_unit()
            .unwrap_or_else(|error| panic!("parse failed: {}", error.display_with_source(source)));
        let source = SourceInfo {
            trivia,
            ..SourceInfo::default()
        };
        assemble(&unit, source, &BuildOptions::default())
    }

    fn assembled(source: &str) -> FileInfo {
        build(source).unwrap().file
    }

    fn class<'a>(file: &'a FileInfo, name: &str) -> &'a ClassInfo {
        file.contents.members.class(name).unwrap()
    }

    #[test]
    fn method_with_default_argument() {
        let file = assembled("class Foo { public: int Bar(int x, int y = 2) const; };");
        let foo = class(&file, "Foo");
        let bar = foo.members.function("Bar").unwrap();

        assert_eq!(bar.access, Access::Public);
        assert_eq!(bar.class_name.as_deref(), Some("Foo"));
        assert_eq!(bar.return_value.as_ref().unwrap().ty.base(), BaseType::Int);
        assert_eq!(bar.parameters.len(), 2);
        assert!(bar.parameters.iter().all(|p| p.ty.base() == BaseType::Int));
        assert_eq!(bar.parameters[0].value, None);
        assert_eq!(bar.parameters[1].value.as_deref(), Some("2"));
        assert!(bar.has(FunctionFlags::CONST));
        assert_eq!(bar.signature, "int Bar(int x, int y)");
    }

    #[test]
    fn signatures_are_deterministic() {
        let source = "namespace n { struct S { virtual const char *Name(int index = 0) const noexcept = 0; }; }";
        let first = assembled(source);
        let second = assembled(source);
        let signature = |file: &FileInfo| {
            file.contents.namespaces[0].members.classes[0].members.functions[0]
                .signature
                .clone()
        };
        assert_eq!(signature(&first), signature(&second));
        assert_eq!(signature(&first), "virtual const char *Name(int index)");
    }

    #[test]
    fn implicit_special_members() {
        let file = assembled("class Foo { public: int Bar(); };");
        let foo = class(&file, "Foo");
        let implicit: Vec<_> = foo
            .members
            .functions
            .iter()
            .filter(|f| f.has(FunctionFlags::IMPLICIT))
            .collect();
        assert_eq!(implicit.len(), 3);
        assert_eq!(implicit[0].signature, "Foo()");
        assert!(implicit[1].is_copy_constructor("Foo"));
        assert!(implicit[1].parameters[0].ty.is_const());
        assert_eq!(implicit[1].signature, "Foo(const Foo &)");
        assert!(implicit[2].is_destructor());
        assert_eq!(implicit[2].name.as_ref(), "~Foo");
        assert!(implicit.iter().all(|f| f.return_value.is_none()));
    }

    #[test]
    fn declared_special_members_are_not_synthesized() {
        let file = assembled("class Foo { public: Foo(int); ~Foo(); };");
        let foo = class(&file, "Foo");
        let constructor = foo.members.function("Foo").unwrap();
        assert!(constructor.is_constructor());
        assert!(constructor.return_value.is_none());

        let implicit: Vec<_> = foo
            .members
            .functions
            .iter()
            .filter(|f| f.has(FunctionFlags::IMPLICIT))
            .collect();
        assert_eq!(implicit.len(), 1);
        assert!(implicit[0].is_copy_constructor("Foo"));
    }

    #[test]
    fn pure_virtual_makes_class_abstract() {
        let file = assembled("struct Shape { virtual double Area() const = 0; void Delete(); };");
        let shape = class(&file, "Shape");
        assert!(shape.is_abstract);
        assert!(shape.has_delete);
        assert_eq!(shape.access, Access::Public);
    }

    #[test]
    fn enum_values_are_inferred() {
        let file = assembled("enum E { A, B, C = 10, D };");
        let members = &file.contents.members;
        let values: Vec<_> = members.enums[0]
            .constants
            .iter()
            .map(|c| c.value.clone().unwrap())
            .collect();
        assert_eq!(values, ["0", "1", "10", "11"]);
        assert!(members.enums[0].constants[0].flags.contains(ValueFlags::ENUM_CONSTANT));
        assert_eq!(members.constants.len(), 4);
    }

    #[test]
    fn scoped_enum_keeps_its_constants() {
        let file = assembled("enum class Mode : unsigned char { Off, On = Off + 2, Auto };");
        let mode = file.contents.members.enumeration("Mode").unwrap();
        assert!(mode.is_scoped);
        assert_eq!(mode.underlying.as_deref(), Some("unsigned char"));
        assert_eq!(mode.underlying_type.base(), BaseType::UnsignedChar);
        assert_eq!(mode.constant("Auto").unwrap().value.as_deref(), Some("Off + 3"));
        assert!(file.contents.members.constants.is_empty());
    }

    #[test]
    fn void_parameter_list_is_empty() {
        let file = assembled("void f(void); void g();");
        let members = &file.contents.members;
        assert!(members.function("f").unwrap().parameters.is_empty());
        assert!(members.function("g").unwrap().parameters.is_empty());
        assert_eq!(members.function("f").unwrap().signature, "void f(void)");
    }

    #[test]
    fn constants_and_variables_are_classified() {
        let file = assembled("const int N = 5; constexpr long M = 1; int x; const int *p = &x; int &r = x;");
        let members = &file.contents.members;
        assert!(members.constant("N").is_some());
        assert!(members.constant("M").is_some());
        assert_eq!(members.constant("N").unwrap().value.as_deref(), Some("5"));
        assert!(members.variable("x").is_some());
        assert!(members.variable("p").unwrap().ty.is_pointer());
        assert!(members.variable("r").is_some());
        assert_eq!(members.constants.len(), 2);
    }

    #[test]
    fn paren_initializer_versus_function_declarator() {
        let file = assembled("class Foo; Foo bar(baz); Foo qux(5);");
        let members = &file.contents.members;
        let bar = members.function("bar").unwrap();
        assert_eq!(bar.parameters.len(), 1);
        assert_eq!(bar.parameters[0].class_name.as_deref(), Some("baz"));
        assert_eq!(bar.return_value.as_ref().unwrap().class_name.as_deref(), Some("Foo"));

        let qux = members.variable("qux").unwrap();
        assert_eq!(qux.ty.base(), BaseType::Object);
        assert_eq!(qux.value.as_deref(), Some("(5)"));
    }

    #[test]
    fn comments_attach_to_declarations() {
        let source = "\
/// Leading for a
int a;
int b; ///< Trailing for b

// Closed by the blank line

int c;
/*! \\class Widget
 *  Named documentation.
 */
class Widget {};
";
        let file = assembled(source);
        let members = &file.contents.members;
        assert_eq!(members.variable("a").unwrap().comment.as_deref(), Some("Leading for a"));
        assert_eq!(members.variable("b").unwrap().comment.as_deref(), Some("Trailing for b"));
        assert_eq!(members.variable("c").unwrap().comment, None);
        assert!(members.class("Widget").unwrap().comment.as_deref().unwrap().contains("Named documentation."));
        assert!(file.diagnostics.is_empty());
    }

    #[test]
    fn duplicate_free_overloads_are_dropped() {
        let assembly = build("void f(int); void f(int *); class C { void g(int); void g(int *); };").unwrap();
        let members = &assembly.file.contents.members;
        assert_eq!(members.functions_named("f").count(), 1);
        assert_eq!(assembly.stats.dropped_overloads, 1);
        assert!(matches!(
            &assembly.file.diagnostics[..],
            [Diagnostic::DuplicateOverload { name, .. }] if name.as_ref() == "f"
        ));
        assert_eq!(members.class("C").unwrap().members.functions_named("g").count(), 2);
    }

    #[test]
    fn typedef_names_anonymous_struct() {
        let file = assembled("typedef struct { int x; int y; } Point; Point origin();");
        let members = &file.contents.members;
        assert!(members.typedefs.is_empty());
        let point = members.class("Point").unwrap();
        assert_eq!(point.members.variables.len(), 2);

        let ret = members.function("origin").unwrap().return_value.as_ref().unwrap();
        assert_eq!(ret.ty.base(), BaseType::Object);
        assert_eq!(ret.class_name.as_deref(), Some("Point"));
    }

    #[test]
    fn typedef_and_alias_register_names() {
        let file = assembled(
            "namespace n { class Widget {}; typedef Widget Alias; using Handle = Widget *; Alias make(Handle h); }",
        );
        let members = &file.contents.namespaces[0].members;
        let alias = members.typedef("Alias").unwrap();
        assert!(alias.ty.specifiers().contains(Specifiers::TYPEDEF));
        assert_eq!(alias.ty.base(), BaseType::Object);
        assert_eq!(alias.class_name.as_deref(), Some("Widget"));
        assert!(members.typedef("Handle").unwrap().ty.is_pointer());

        let make = members.function("make").unwrap();
        assert_eq!(make.return_value.as_ref().unwrap().ty.base(), BaseType::Typedef);
        assert_eq!(make.parameters[0].ty.base(), BaseType::Typedef);
    }

    #[test]
    fn template_parameters_are_recorded() {
        let file = assembled("template <typename T, int N = 4> class Array { public: T get(int i) const; };");
        let array = class(&file, "Array");
        let template = array.template.as_ref().unwrap();
        assert_eq!(template.parameters.len(), 2);
        assert_eq!(template.parameters[0].ty.base(), BaseType::TypeName);
        assert_eq!(template.parameters[0].class_name.as_deref(), Some("typename"));
        assert_eq!(template.parameters[1].ty.base(), BaseType::Int);
        assert_eq!(template.parameters[1].value.as_deref(), Some("4"));

        let get = array.members.function("get").unwrap();
        let ret = get.return_value.as_ref().unwrap();
        assert_eq!(ret.ty.base(), BaseType::TypeName);
        assert_eq!(ret.class_name.as_deref(), Some("T"));
        assert!(get.template.is_none());
    }

    #[test]
    fn function_pointer_parameter() {
        let file = assembled("void set(void (*callback)(int, double));");
        let set = file.contents.members.function("set").unwrap();
        let callback = &set.parameters[0];
        assert_eq!(callback.ty.base(), BaseType::Function);
        assert!(callback.ty.is_pointer());
        let function = callback.function.as_ref().unwrap();
        assert_eq!(function.parameters.len(), 2);
        assert_eq!(function.return_value.as_ref().unwrap().ty.base(), BaseType::Void);
        assert_eq!(function.signature, "void (*callback)(int, double)");
    }

    #[test]
    fn template_ids_in_values_match_signatures() {
        let file = assembled(
            "template <class T> struct Box; Box<int> origin = Box<int>(3, 4); void place(Box<int> at = Box<int>(1, 2));",
        );
        let members = &file.contents.members;
        assert_eq!(members.variable("origin").unwrap().value.as_deref(), Some("Box<int>(3, 4)"));
        let place = members.function("place").unwrap();
        assert_eq!(place.signature, "void place(Box<int> at)");
        assert_eq!(place.parameters[0].value.as_deref(), Some("Box<int>(1, 2)"));
    }

    #[test]
    fn array_dimensions() {
        let file = assembled("int grid[3][4]; extern char name[];");
        let members = &file.contents.members;
        let grid = members.variable("grid").unwrap();
        assert_eq!(grid.dimensions, [Dimension::Literal(3), Dimension::Literal(4)]);
        assert_eq!(grid.count, 12);
        assert_eq!(members.variable("name").unwrap().count, 0);
    }

    #[test]
    fn namespaces_and_usings() {
        let file = assembled(
            "namespace a::b { class C {}; } namespace { int hidden; } using namespace std; using std::string; namespace fs = std::filesystem;",
        );
        let a = file.contents.namespace("a").unwrap();
        let b = a.namespace("b").unwrap();
        assert!(b.members.class("C").is_some());
        assert!(file.contents.namespaces[1].name.is_none());

        let usings = &file.contents.members.usings;
        assert_eq!(usings.len(), 3);
        assert!(usings[0].is_namespace && usings[0].name.is_none());
        assert_eq!(usings[1].scope.as_ref(), "std");
        assert_eq!(usings[2].scope.as_ref(), "std::filesystem");
    }

    #[test]
    fn scope_stacks_balance() {
        let assembly = build(
            "namespace n { template <class T> struct Box { struct Inner { void f(int (*g)(char)); }; T value; }; }",
        )
        .unwrap();
        assert!(assembly.stats.scopes.is_balanced());
        assert_eq!(assembly.stats.classes, 2);
        assert_eq!(assembly.stats.namespaces, 1);
    }

    #[test]
    fn reserved_attributes_are_applied_and_checked() {
        let file = assembled("struct S { [[wrap::newinstance]] S *Clone(); int f(int x) [[wrap::expects(x > 0)]]; };");
        let s = class(&file, "S");
        assert!(s.members.function("Clone").unwrap().has(FunctionFlags::NEW_INSTANCE));
        assert_eq!(s.members.function("f").unwrap().preconditions, ["x > 0"]);

        let error = build("struct S { [[wrap::newinstance]] int count; };").unwrap_err();
        assert!(matches!(error, BuildError::Attribute(AttributeError::NotAFunction { .. })));
    }
}
