//! Type and declarator AST nodes.
//!
//! A C++ declaration splits into decl-specifiers (storage class, cv, one
//! type specifier) and one or more declarators (pointer operators, a name,
//! array and function suffixes). Both halves keep the tokens they were
//! spelled with so the signature builder can re-serialize them.
//!
//! ```text
//! static const char *names[4];
//! ^^^^^^^^^^^^^^^^^ ^^^^^^^^^
//! DeclSpecs         Declarator { ptr_ops: [*], core: Name(names), suffixes: [Array(4)] }
//! ```
//!
//! Expressions (initializers, array sizes, default arguments) are not
//! parsed; they are kept as balanced token runs.

use cxxdecl_core::{ClassKind, CvQualifiers, RefKind, Span, Specifiers};

use crate::ast::{ClassDecl, EnumDecl};
use crate::lexer::Token;

/// A run of tokens kept verbatim, e.g. an initializer expression.
pub type Tokens<'ast> = &'ast [Token<'ast>];

// ============================================================================
// Names
// ============================================================================

/// What kind of name a segment spells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Identifier,
    /// `~Foo`
    Destructor,
    /// `operator+`, `operator()`, `operator new[]`
    Operator,
    /// `operator int*`
    Conversion,
}

/// One `::`-separated part of a name.
#[derive(Debug, Clone, Copy)]
pub struct NameSegment<'ast> {
    /// The spelled name: `Foo`, `~Foo`, `operator[]`, `operator const char *`.
    pub name: &'ast str,
    pub kind: NameKind,
    /// Tokens between the angle brackets, if the segment is a template-id.
    pub template_args: Option<Tokens<'ast>>,
    /// Target type of a conversion operator.
    pub conversion: Option<&'ast TypeId<'ast>>,
    pub span: Span,
}

impl NameSegment<'_> {
    pub fn is_template_id(&self) -> bool {
        self.template_args.is_some()
    }
}

/// A possibly qualified name such as `::std::vector<int>::iterator`.
#[derive(Debug, Clone, Copy)]
pub struct QualifiedName<'ast> {
    /// Written with a leading `::`.
    pub global: bool,
    pub segments: &'ast [NameSegment<'ast>],
    pub span: Span,
}

impl<'ast> QualifiedName<'ast> {
    /// The final segment.
    pub fn last(&self) -> &NameSegment<'ast> {
        // The parser never builds an empty name.
        &self.segments[self.segments.len() - 1]
    }

    /// The segments before the final one.
    pub fn qualifier(&self) -> &'ast [NameSegment<'ast>] {
        &self.segments[..self.segments.len() - 1]
    }

    pub fn is_qualified(&self) -> bool {
        self.global || self.segments.len() > 1
    }

    /// The last segment's identifier, without template arguments.
    pub fn simple_name(&self) -> &'ast str {
        self.segments[self.segments.len() - 1].name
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// The syntactic position an attribute list was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeRole {
    /// Before the decl-specifiers.
    Declaration,
    /// After a declarator-id.
    Id,
    /// After `*`, `&` or `&&`.
    Reference,
    /// After a parameter list.
    Function,
    /// After `]`.
    Array,
    /// After a class key.
    Class,
}

impl AttributeRole {
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeRole::Declaration => "declaration",
            AttributeRole::Id => "declarator-id",
            AttributeRole::Reference => "reference",
            AttributeRole::Function => "function",
            AttributeRole::Array => "array",
            AttributeRole::Class => "class",
        }
    }
}

/// One `[[ns::name(args)]]` entry.
#[derive(Debug, Clone, Copy)]
pub struct Attribute<'ast> {
    pub namespace: Option<&'ast str>,
    pub name: &'ast str,
    /// Tokens between the parentheses, if an argument clause was written.
    pub args: Option<Tokens<'ast>>,
    pub role: AttributeRole,
    pub span: Span,
}

// ============================================================================
// Decl-specifiers
// ============================================================================

/// The type part of the decl-specifiers.
#[derive(Debug, Clone, Copy)]
pub enum TypeSpec<'ast> {
    /// No type: constructors, destructors, conversion operators.
    None,
    /// Fundamental type keywords in the order written: `unsigned long int`.
    Builtin(Tokens<'ast>),
    /// A named type, possibly prefixed by `typename`.
    Named(QualifiedName<'ast>),
    /// `class Foo`, `enum Bar` without a body.
    Elaborated { key: ElaboratedKey, name: QualifiedName<'ast> },
    /// A class defined in place, as in `typedef struct { ... } Foo;`.
    Class(&'ast ClassDecl<'ast>),
    /// An enum defined in place.
    Enum(&'ast EnumDecl<'ast>),
    /// `decltype(expr)`, with the tokens between the parentheses.
    Decltype(Tokens<'ast>),
}

impl TypeSpec<'_> {
    pub fn is_none(&self) -> bool {
        matches!(self, TypeSpec::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElaboratedKey {
    Class(ClassKind),
    Enum,
}

/// Everything written before the first declarator.
#[derive(Debug, Clone, Copy)]
pub struct DeclSpecs<'ast> {
    pub specifiers: Specifiers,
    pub cv: CvQualifiers,
    pub type_spec: TypeSpec<'ast>,
    pub attributes: &'ast [Attribute<'ast>],
    /// Spelled tokens, without attributes and without in-place bodies.
    pub tokens: Tokens<'ast>,
    pub span: Span,
}

impl DeclSpecs<'_> {
    pub fn has(&self, specifier: Specifiers) -> bool {
        self.specifiers.contains(specifier)
    }
}

// ============================================================================
// Declarators
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum PtrOpKind<'ast> {
    Pointer,
    LValueRef,
    RValueRef,
    /// `Class::*`
    MemberPointer(QualifiedName<'ast>),
}

/// One pointer operator with the qualifiers written after it.
#[derive(Debug, Clone, Copy)]
pub struct PtrOp<'ast> {
    pub kind: PtrOpKind<'ast>,
    pub cv: CvQualifiers,
    pub attributes: &'ast [Attribute<'ast>],
    pub span: Span,
}

impl PtrOp<'_> {
    pub fn is_reference(&self) -> bool {
        matches!(self.kind, PtrOpKind::LValueRef | PtrOpKind::RValueRef)
    }

    pub fn ref_kind(&self) -> RefKind {
        match self.kind {
            PtrOpKind::LValueRef => RefKind::LValue,
            PtrOpKind::RValueRef => RefKind::RValue,
            _ => RefKind::None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum DeclaratorCore<'ast> {
    /// No name: parameters, type-ids.
    Abstract,
    Name(QualifiedName<'ast>),
    /// A parenthesized declarator, as in `(*callback)`.
    Nested(&'ast Declarator<'ast>),
}

#[derive(Debug, Clone, Copy)]
pub enum DeclSuffix<'ast> {
    Array {
        size: Option<Tokens<'ast>>,
        attributes: &'ast [Attribute<'ast>],
        span: Span,
    },
    Function(&'ast FunctionSuffix<'ast>),
}

/// `override` and `final` after a member function declarator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VirtSpecifiers {
    pub is_override: bool,
    pub is_final: bool,
}

/// A parameter list and what may follow it.
#[derive(Debug, Clone, Copy)]
pub struct FunctionSuffix<'ast> {
    pub params: &'ast [Param<'ast>],
    /// A trailing `...` (C varargs).
    pub variadic: bool,
    pub cv: CvQualifiers,
    pub ref_qualifier: RefKind,
    /// `noexcept`, `noexcept(true)` or `throw()`.
    pub noexcept: bool,
    pub attributes: &'ast [Attribute<'ast>],
    pub trailing_return: Option<&'ast TypeId<'ast>>,
    pub virt: VirtSpecifiers,
    pub span: Span,
}

#[derive(Debug, Clone, Copy)]
pub struct Declarator<'ast> {
    pub ptr_ops: &'ast [PtrOp<'ast>],
    /// `...` written before the name: a parameter pack.
    pub pack: bool,
    pub core: DeclaratorCore<'ast>,
    /// Attributes after the declarator-id.
    pub attributes: &'ast [Attribute<'ast>],
    pub suffixes: &'ast [DeclSuffix<'ast>],
    pub span: Span,
}

impl<'ast> Declarator<'ast> {
    /// The declared name, looking through parentheses.
    pub fn name(&self) -> Option<&QualifiedName<'ast>> {
        match &self.core {
            DeclaratorCore::Name(name) => Some(name),
            DeclaratorCore::Nested(inner) => inner.name(),
            DeclaratorCore::Abstract => None,
        }
    }

    /// Whether this declares a function rather than an object.
    ///
    /// `int f(int)` and `int (f)(int)` are functions; `int (*f)(int)` is a
    /// pointer variable.
    pub fn is_function(&self) -> bool {
        self.declared_function().is_some()
    }

    /// The first suffix, if it is a parameter list.
    pub fn function(&self) -> Option<&'ast FunctionSuffix<'ast>> {
        match self.suffixes.first() {
            Some(DeclSuffix::Function(function)) => Some(function),
            _ => None,
        }
    }

    /// The parameter list that applies directly to the declared name.
    pub fn declared_function(&self) -> Option<&'ast FunctionSuffix<'ast>> {
        match self.innermost() {
            Some(Derivation::Function(function)) => Some(function),
            _ => None,
        }
    }

    // Suffixes bind tighter than pointer operators, and a parenthesized
    // declarator binds tighter than both.
    fn innermost(&self) -> Option<Derivation<'ast>> {
        if let DeclaratorCore::Nested(inner) = &self.core
            && let Some(derivation) = inner.innermost()
        {
            return Some(derivation);
        }
        match self.suffixes.first() {
            Some(DeclSuffix::Function(function)) => Some(Derivation::Function(function)),
            Some(DeclSuffix::Array { .. }) => Some(Derivation::Array),
            None if !self.ptr_ops.is_empty() => Some(Derivation::Pointer),
            None => None,
        }
    }
}

#[derive(Clone, Copy)]
enum Derivation<'ast> {
    Function(&'ast FunctionSuffix<'ast>),
    Array,
    Pointer,
}

/// A type without a name: `const char *`, `int (*)(int)`.
#[derive(Debug, Clone, Copy)]
pub struct TypeId<'ast> {
    pub specs: DeclSpecs<'ast>,
    pub declarator: Declarator<'ast>,
}

/// A function parameter.
#[derive(Debug, Clone, Copy)]
pub struct Param<'ast> {
    pub specs: DeclSpecs<'ast>,
    pub declarator: Declarator<'ast>,
    /// Default argument tokens after `=`.
    pub default: Option<Tokens<'ast>>,
    pub span: Span,
}

// ============================================================================
// Initializers
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum Initializer<'ast> {
    /// `= expr`
    Equals(Tokens<'ast>),
    /// `{ ... }`, tokens inside the braces
    Braced(Tokens<'ast>),
    /// `( ... )`, tokens inside the parentheses
    Paren(Tokens<'ast>),
}

impl<'ast> Initializer<'ast> {
    pub fn tokens(&self) -> Tokens<'ast> {
        match *self {
            Initializer::Equals(tokens) | Initializer::Braced(tokens) | Initializer::Paren(tokens) => tokens,
        }
    }
}

/// What follows a function declarator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FunctionBody {
    /// Declaration only.
    #[default]
    None,
    /// `{ ... }`, skipped.
    Defined,
    /// `= 0`
    Pure,
    /// `= delete`
    Deleted,
    /// `= default`
    Defaulted,
}
