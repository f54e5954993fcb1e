//! Declaration AST nodes.
//!
//! Items are what appear at namespace or class scope. Each records the
//! span of its first token and of the token that ended it, which the
//! comment tracker uses to tell leading comments from trailing ones.

use cxxdecl_core::{Access, ClassKind, Span};

use crate::ast::{Attribute, DeclSpecs, Declarator, FunctionBody, Initializer, Param, QualifiedName, Tokens, TypeId};
use crate::lexer::Token;

/// A top-level or member declaration.
#[derive(Debug, Clone, Copy)]
pub enum Item<'ast> {
    Namespace(NamespaceDecl<'ast>),
    /// `namespace fs = std::filesystem;`
    NamespaceAlias(NamespaceAlias<'ast>),
    /// `extern "C" { ... }` or `extern "C" decl`
    Linkage(LinkageSpec<'ast>),
    /// Variables, functions, typedefs, class and enum definitions.
    Simple(SimpleDecl<'ast>),
    /// `using Name = type;`
    Alias(AliasDecl<'ast>),
    /// `using std::swap;`
    Using(UsingDecl<'ast>),
    /// `using namespace std;`
    UsingDirective(UsingDirective<'ast>),
    Template(TemplateDecl<'ast>),
    /// `template class Foo<int>;`, `extern template ...;`
    ExplicitInstantiation(ExplicitInstantiation<'ast>),
    AccessLabel(AccessLabel),
    StaticAssert(Extent),
    /// A stray `;`.
    Empty(Extent),
}

impl Item<'_> {
    /// Where the item starts and ends.
    pub fn extent(&self) -> Extent {
        match self {
            Item::Namespace(decl) => decl.extent,
            Item::NamespaceAlias(decl) => decl.extent,
            Item::Linkage(decl) => decl.extent,
            Item::Simple(decl) => decl.extent,
            Item::Alias(decl) => decl.extent,
            Item::Using(decl) => decl.extent,
            Item::UsingDirective(decl) => decl.extent,
            Item::Template(decl) => decl.extent,
            Item::ExplicitInstantiation(decl) => decl.extent,
            Item::AccessLabel(label) => label.extent,
            Item::StaticAssert(extent) | Item::Empty(extent) => *extent,
        }
    }
}

/// First and last token of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    pub start: Span,
    pub end: Span,
}

impl Extent {
    pub fn new(start: Span, end: Span) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NamespaceDecl<'ast> {
    /// `a::b` for nested definitions; empty for an anonymous namespace.
    pub names: &'ast [Token<'ast>],
    pub is_inline: bool,
    pub attributes: &'ast [Attribute<'ast>],
    pub items: &'ast [Item<'ast>],
    pub extent: Extent,
}

#[derive(Debug, Clone, Copy)]
pub struct NamespaceAlias<'ast> {
    pub name: Token<'ast>,
    pub target: QualifiedName<'ast>,
    pub extent: Extent,
}

#[derive(Debug, Clone, Copy)]
pub struct LinkageSpec<'ast> {
    /// The string literal, quotes included.
    pub language: Token<'ast>,
    pub items: &'ast [Item<'ast>],
    pub braced: bool,
    pub extent: Extent,
}

/// One declarator with what follows it.
#[derive(Debug, Clone, Copy)]
pub struct InitDeclarator<'ast> {
    pub declarator: Declarator<'ast>,
    /// `: 3` on a bit field.
    pub bit_width: Option<Tokens<'ast>>,
    pub init: Option<Initializer<'ast>>,
    pub body: FunctionBody,
    pub end: Span,
}

/// decl-specifiers followed by zero or more declarators.
#[derive(Debug, Clone, Copy)]
pub struct SimpleDecl<'ast> {
    pub specs: DeclSpecs<'ast>,
    pub declarators: &'ast [InitDeclarator<'ast>],
    pub extent: Extent,
}

#[derive(Debug, Clone, Copy)]
pub struct BaseSpecifier<'ast> {
    pub access: Option<Access>,
    pub is_virtual: bool,
    pub name: QualifiedName<'ast>,
    /// `Bases...`
    pub is_pack: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ClassDecl<'ast> {
    pub kind: ClassKind,
    pub attributes: &'ast [Attribute<'ast>],
    /// None for an anonymous class.
    pub name: Option<QualifiedName<'ast>>,
    pub is_final: bool,
    pub bases: &'ast [BaseSpecifier<'ast>],
    /// None for a forward declaration.
    pub members: Option<&'ast [Item<'ast>]>,
    pub extent: Extent,
}

#[derive(Debug, Clone, Copy)]
pub struct Enumerator<'ast> {
    pub name: Token<'ast>,
    pub attributes: &'ast [Attribute<'ast>],
    pub value: Option<Tokens<'ast>>,
    pub extent: Extent,
}

#[derive(Debug, Clone, Copy)]
pub struct EnumDecl<'ast> {
    /// `enum class` or `enum struct`.
    pub is_scoped: bool,
    pub attributes: &'ast [Attribute<'ast>],
    pub name: Option<QualifiedName<'ast>>,
    pub underlying: Option<&'ast TypeId<'ast>>,
    /// None for an opaque declaration.
    pub enumerators: Option<&'ast [Enumerator<'ast>]>,
    pub extent: Extent,
}

#[derive(Debug, Clone, Copy)]
pub struct AliasDecl<'ast> {
    pub name: Token<'ast>,
    pub attributes: &'ast [Attribute<'ast>],
    pub target: TypeId<'ast>,
    pub extent: Extent,
}

#[derive(Debug, Clone, Copy)]
pub struct UsingDecl<'ast> {
    pub name: QualifiedName<'ast>,
    pub is_typename: bool,
    pub extent: Extent,
}

#[derive(Debug, Clone, Copy)]
pub struct UsingDirective<'ast> {
    pub name: QualifiedName<'ast>,
    pub extent: Extent,
}

/// One template parameter.
#[derive(Debug, Clone, Copy)]
pub enum TemplateParam<'ast> {
    /// `typename T = int`, `class... Ts`
    Type {
        key: Token<'ast>,
        is_pack: bool,
        name: Option<Token<'ast>>,
        default: Option<Tokens<'ast>>,
        span: Span,
    },
    /// `int N = 4`
    NonType(Param<'ast>),
    /// `template <typename> class C = std::vector`
    Template {
        params: &'ast [TemplateParam<'ast>],
        key: Token<'ast>,
        is_pack: bool,
        name: Option<Token<'ast>>,
        default: Option<Tokens<'ast>>,
        span: Span,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct TemplateDecl<'ast> {
    /// Empty for an explicit specialization (`template <>`).
    pub params: &'ast [TemplateParam<'ast>],
    pub item: &'ast Item<'ast>,
    pub extent: Extent,
}

impl TemplateDecl<'_> {
    pub fn is_specialization(&self) -> bool {
        self.params.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExplicitInstantiation<'ast> {
    pub is_extern: bool,
    pub item: &'ast Item<'ast>,
    pub extent: Extent,
}

#[derive(Debug, Clone, Copy)]
pub struct AccessLabel {
    pub access: Access,
    pub extent: Extent,
}
