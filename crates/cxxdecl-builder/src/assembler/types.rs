//! Type resolution and declarator derivation.
//!
//! A declaration's type is built in two steps. The decl-specifiers give the
//! base ([`AssemblyContext::resolve_specs`]); the declarator then wraps it
//! from the inside out. Within one declarator level, pointer operators bind
//! loosest to the name, suffixes tighter, and a parenthesized declarator
//! tightest of all:
//!
//! ```text
//! int *(*table[4])(char);
//!
//! int            base
//! int *          ptr_ops of the outer level
//! fn(char)       outer suffix, the pointer becomes the return type
//! * fn           ptr_ops of the nested level
//! [4] * fn       suffixes of the nested level
//! ```
//!
//! The declarator is also rendered into the signature builder, in source
//! order, which is where parameter lists are read.

use std::ptr;

use cxxdecl_core::{
    BaseType, CvQualifiers, Dimension, FunctionFlags, FunctionInfo, Indirection, RefKind, Symbol, TypeCode,
    ValueInfo, add_indirection, combine_base,
};
use cxxdecl_parser::Token;
use cxxdecl_parser::ast::{
    Attribute, DeclSpecs, DeclSuffix, Declarator, DeclaratorCore, FunctionSuffix, Param, PtrOp, PtrOpKind,
    QualifiedName, TypeId, TypeSpec,
};

use super::AssemblyContext;
use crate::error::{BuildError, TypeResultExt};
use crate::signature::{SignatureBuilder, expression_text};

/// A type under construction.
#[derive(Debug, Clone, Default)]
pub(super) struct Derived {
    pub ty: TypeCode,
    pub class_name: Option<Symbol>,
    pub dimensions: Vec<Dimension>,
    pub function: Option<Box<FunctionInfo>>,
    pub is_pack: bool,
}

impl Derived {
    fn of(ty: TypeCode, class_name: Option<Symbol>) -> Self {
        Self {
            ty,
            class_name,
            ..Self::default()
        }
    }

    pub fn into_value(self, name: Option<Symbol>) -> ValueInfo {
        let mut value = ValueInfo::new(self.ty);
        value.name = name;
        if self.ty.base().needs_class_name() {
            value.class_name = self.class_name;
        }
        value.set_dimensions(self.dimensions);
        value.function = self.function;
        value.is_pack = self.is_pack;
        value
    }
}

/// Parameter lists read while rendering a declarator, by suffix.
type ParamLists<'ast> = Vec<(&'ast FunctionSuffix<'ast>, Vec<ValueInfo>)>;

fn take_params<'ast>(lists: &mut ParamLists<'ast>, suffix: &'ast FunctionSuffix<'ast>) -> Vec<ValueInfo> {
    match lists.iter().position(|(s, _)| ptr::eq(*s, suffix)) {
        Some(index) => lists.swap_remove(index).1,
        None => Vec::new(),
    }
}

// ============================================================================
// Names
// ============================================================================

/// The spelled text of a name, template arguments included.
pub(crate) fn name_text(name: &QualifiedName<'_>) -> String {
    let mut text = String::new();
    if name.global {
        text.push_str("::");
    }
    for (i, segment) in name.segments.iter().enumerate() {
        if i > 0 {
            text.push_str("::");
        }
        text.push_str(segment.name);
        if let Some(args) = segment.template_args {
            text.push('<');
            text.push_str(&token_text(args));
            text.push('>');
        }
    }
    text
}

/// A name with template arguments dropped, as types are registered.
pub(super) fn lookup_key(name: &QualifiedName<'_>) -> String {
    let names: Vec<&str> = name.segments.iter().map(|segment| segment.name).collect();
    names.join("::")
}

/// Tokens joined with signature spacing.
pub(super) fn token_text(tokens: &[Token<'_>]) -> String {
    let mut builder = SignatureBuilder::new();
    builder.append_tokens(tokens);
    builder.finish()
}

// ============================================================================
// Attributes and flags
// ============================================================================

/// Every attribute list written on a declaration.
pub(super) fn attribute_lists<'ast>(
    specs: &DeclSpecs<'ast>,
    declarator: &Declarator<'ast>,
) -> Vec<&'ast [Attribute<'ast>]> {
    let mut lists = vec![specs.attributes];
    collect_attributes(declarator, &mut lists);
    lists
}

fn collect_attributes<'ast>(declarator: &Declarator<'ast>, lists: &mut Vec<&'ast [Attribute<'ast>]>) {
    lists.extend(declarator.ptr_ops.iter().map(|op| op.attributes));
    lists.push(declarator.attributes);
    for suffix in declarator.suffixes {
        match suffix {
            DeclSuffix::Array { attributes, .. } => lists.push(attributes),
            DeclSuffix::Function(function) => lists.push(function.attributes),
        }
    }
    if let DeclaratorCore::Nested(inner) = &declarator.core {
        collect_attributes(inner, lists);
    }
}

/// Flags written after a parameter list.
pub(super) fn suffix_flags(suffix: &FunctionSuffix<'_>) -> FunctionFlags {
    let mut flags = FunctionFlags::empty();
    flags.set(FunctionFlags::CONST, suffix.cv.contains(CvQualifiers::CONST));
    flags.set(FunctionFlags::VOLATILE, suffix.cv.contains(CvQualifiers::VOLATILE));
    flags.set(FunctionFlags::NOEXCEPT, suffix.noexcept);
    flags.set(FunctionFlags::OVERRIDE, suffix.virt.is_override);
    flags.set(FunctionFlags::FINAL, suffix.virt.is_final);
    flags.set(FunctionFlags::VARIADIC, suffix.variadic);
    flags
}

/// `(void)`: a parameter list with no parameters.
fn is_lone_void(param: &Param<'_>) -> bool {
    let declarator = &param.declarator;
    matches!(param.specs.type_spec, TypeSpec::Builtin([token]) if token.lexeme == "void")
        && param.specs.cv.is_empty()
        && declarator.ptr_ops.is_empty()
        && declarator.suffixes.is_empty()
        && matches!(declarator.core, DeclaratorCore::Abstract)
}

impl<'ast> AssemblyContext<'ast> {
    // ==========================================================================
    // Decl-specifiers
    // ==========================================================================

    /// The type named by decl-specifiers. Classes and enums defined in
    /// place are recorded on the way.
    pub(super) fn resolve_specs(&mut self, specs: &DeclSpecs<'ast>) -> Result<Derived, BuildError> {
        let mut derived = match specs.type_spec {
            TypeSpec::None => Derived::default(),
            TypeSpec::Builtin(tokens) => Derived::of(resolve_builtin(tokens)?, None),
            TypeSpec::Named(name) => self.resolve_name(&name),
            TypeSpec::Elaborated { name, .. } => {
                let text = name_text(&name);
                Derived::of(TypeCode::from_base(BaseType::Object), Some(self.intern(&text)))
            }
            TypeSpec::Class(decl) => {
                let name = self.visit_class(decl)?;
                Derived::of(TypeCode::from_base(BaseType::Object), Some(name))
            }
            TypeSpec::Enum(decl) => {
                let name = self.visit_enum(decl)?;
                Derived::of(TypeCode::from_base(BaseType::Object), Some(name))
            }
            TypeSpec::Decltype(tokens) => {
                let text = format!("decltype({})", expression_text(tokens));
                Derived::of(TypeCode::from_base(BaseType::Unknown), Some(self.intern(&text)))
            }
        };
        derived.ty = derived.ty.with_cv(specs.cv).with_specifiers(specs.specifiers);
        Ok(derived)
    }

    fn resolve_name(&mut self, name: &QualifiedName<'ast>) -> Derived {
        let key = lookup_key(name);
        if let Some(base) = BaseType::from_library_name(&key) {
            return Derived::of(TypeCode::from_base(base), None);
        }
        let base = if !name.is_qualified() && self.scopes.is_template_parameter(&key) {
            BaseType::TypeName
        } else {
            self.lookup_type(&key).unwrap_or(BaseType::Unknown)
        };
        let text = name_text(name);
        Derived::of(TypeCode::from_base(base), Some(self.intern(&text)))
    }

    // ==========================================================================
    // Declarators
    // ==========================================================================

    /// Render a declarator after its decl-specifiers and derive its type.
    ///
    /// `declared` is the parameter list that makes this a function
    /// declaration; it is left out of the derived type, so the result is
    /// the return type, and its parameters are returned separately.
    pub(super) fn declare(
        &mut self,
        base: &Derived,
        declarator: &Declarator<'ast>,
        declared: Option<&'ast FunctionSuffix<'ast>>,
    ) -> Result<(Derived, Option<Vec<ValueInfo>>), BuildError> {
        let name = declarator.name().map(|name| self.strings.intern(name.simple_name()));
        self.scopes.decl_mut().name = name;

        let mut lists = ParamLists::new();
        self.render_declarator(declarator, declared, &mut lists)?;

        let mut derived = base.clone();
        self.derive(&mut derived, declarator, declared, &mut lists)?;
        self.scopes.decl_mut().ty = derived.ty;

        let params = declared.map(|suffix| take_params(&mut lists, suffix));
        Ok((derived, params))
    }

    /// Resolve a type-id, returning its type and normalized text.
    pub(super) fn type_id(&mut self, type_id: &TypeId<'ast>) -> Result<(Derived, String), BuildError> {
        let mark = self.signature.mark();
        self.signature.append_tokens(type_id.specs.tokens);
        let base = self.resolve_specs(&type_id.specs)?;
        let (derived, _) = self.declare(&base, &type_id.declarator, None)?;
        let text = self.signature.cut_since(mark);
        Ok((derived, text))
    }

    fn render_declarator(
        &mut self,
        declarator: &Declarator<'ast>,
        declared: Option<&'ast FunctionSuffix<'ast>>,
        lists: &mut ParamLists<'ast>,
    ) -> Result<(), BuildError> {
        for op in declarator.ptr_ops {
            self.render_ptr_op(op);
        }
        if declarator.pack {
            self.signature.append("...");
        }
        match &declarator.core {
            DeclaratorCore::Abstract => {}
            DeclaratorCore::Name(name) => self.signature.append(&name_text(name)),
            DeclaratorCore::Nested(inner) => {
                self.signature.open_nested();
                self.render_declarator(inner, declared, lists)?;
                self.signature.append(")");
            }
        }
        for suffix in declarator.suffixes {
            match suffix {
                DeclSuffix::Array { size, .. } => {
                    self.signature.append("[");
                    if let Some(size) = size {
                        self.signature.append_expression(size);
                    }
                    self.signature.append("]");
                }
                DeclSuffix::Function(function) => {
                    let params = self.parameters(function)?;
                    lists.push((*function, params));
                    let is_declared = declared.is_some_and(|d| ptr::eq(d, *function));
                    // qualifiers of the declared function are not part of
                    // its signature
                    if is_declared {
                        self.signature.close();
                    }
                    self.render_qualifiers(function);
                    if is_declared {
                        self.signature.open();
                    }
                }
            }
        }
        Ok(())
    }

    fn render_ptr_op(&mut self, op: &PtrOp<'ast>) {
        match &op.kind {
            PtrOpKind::Pointer => self.signature.append("*"),
            PtrOpKind::LValueRef => self.signature.append("&"),
            PtrOpKind::RValueRef => self.signature.append("&&"),
            PtrOpKind::MemberPointer(class) => {
                let text = format!("{}::*", name_text(class));
                self.signature.append(&text);
            }
        }
        if op.cv.contains(CvQualifiers::CONST) {
            self.signature.append("const");
        }
        if op.cv.contains(CvQualifiers::VOLATILE) {
            self.signature.append("volatile");
        }
    }

    fn render_qualifiers(&mut self, suffix: &FunctionSuffix<'ast>) {
        if suffix.cv.contains(CvQualifiers::CONST) {
            self.signature.append("const");
        }
        if suffix.cv.contains(CvQualifiers::VOLATILE) {
            self.signature.append("volatile");
        }
        match suffix.ref_qualifier {
            RefKind::LValue => self.signature.append("&"),
            RefKind::RValue => self.signature.append("&&"),
            RefKind::None => {}
        }
        if suffix.noexcept {
            self.signature.append("noexcept");
        }
        if suffix.virt.is_override {
            self.signature.append("override");
        }
        if suffix.virt.is_final {
            self.signature.append("final");
        }
    }

    /// Wrap `derived` in the levels of `declarator`, innermost first.
    fn derive(
        &mut self,
        derived: &mut Derived,
        declarator: &Declarator<'ast>,
        declared: Option<&'ast FunctionSuffix<'ast>>,
        lists: &mut ParamLists<'ast>,
    ) -> Result<(), BuildError> {
        for op in declarator.ptr_ops {
            let outer = match op.kind {
                PtrOpKind::Pointer | PtrOpKind::MemberPointer(_) if op.cv.contains(CvQualifiers::CONST) => {
                    TypeCode::from_indirection(Indirection::ConstPointer)
                }
                PtrOpKind::Pointer | PtrOpKind::MemberPointer(_) => TypeCode::from_indirection(Indirection::Pointer),
                PtrOpKind::LValueRef | PtrOpKind::RValueRef => TypeCode::from_reference(op.ref_kind()),
            };
            derived.ty = add_indirection(derived.ty, outer).at(op.span)?;
        }

        for suffix in declarator.suffixes.iter().rev() {
            match suffix {
                DeclSuffix::Array { size, span, .. } => {
                    derived.ty = add_indirection(derived.ty, TypeCode::from_indirection(Indirection::Array)).at(*span)?;
                    let dimension = match size {
                        Some(size) => Dimension::parse(&expression_text(size)),
                        None => Dimension::Expr(String::new()),
                    };
                    derived.dimensions.insert(0, dimension);
                }
                DeclSuffix::Function(function) if declared.is_some_and(|d| ptr::eq(d, *function)) => {}
                DeclSuffix::Function(function) => self.derive_function_type(derived, *function, lists)?,
            }
        }

        if let DeclaratorCore::Nested(inner) = &declarator.core {
            self.derive(derived, inner, declared, lists)?;
        }
        derived.is_pack |= declarator.pack;
        Ok(())
    }

    /// Replace `derived` by a function type returning it.
    fn derive_function_type(
        &mut self,
        derived: &mut Derived,
        suffix: &'ast FunctionSuffix<'ast>,
        lists: &mut ParamLists<'ast>,
    ) -> Result<(), BuildError> {
        let name = match self.scopes.decl().name.clone() {
            Some(name) => name,
            None => self.intern(""),
        };
        let specifiers = derived.ty.specifiers();
        let is_pack = derived.is_pack;

        let mut function = FunctionInfo::new(name);
        let mut returned = std::mem::take(derived);
        returned.ty = returned.ty.without_specifiers();
        returned.is_pack = false;
        function.return_value = Some(match suffix.trailing_return {
            Some(trailing) => self.type_id(trailing)?.0.into_value(None),
            None => returned.into_value(None),
        });
        function.parameters = take_params(lists, suffix);
        function.flags = suffix_flags(suffix);

        *derived = Derived {
            ty: TypeCode::from_base(BaseType::Function).with_specifiers(specifiers),
            function: Some(Box::new(function)),
            is_pack,
            ..Derived::default()
        };
        Ok(())
    }

    // ==========================================================================
    // Parameters
    // ==========================================================================

    /// Render a parameter list and read its parameters, each in its own
    /// function scope.
    fn parameters(&mut self, suffix: &'ast FunctionSuffix<'ast>) -> Result<Vec<ValueInfo>, BuildError> {
        self.signature.append("(");
        self.scopes.push_function();
        let result = self.parameter_list(suffix);
        self.scopes.pop_function();
        self.signature.append(")");
        result
    }

    fn parameter_list(&mut self, suffix: &'ast FunctionSuffix<'ast>) -> Result<Vec<ValueInfo>, BuildError> {
        let mut values = Vec::with_capacity(suffix.params.len());
        for (i, param) in suffix.params.iter().enumerate() {
            if i > 0 {
                self.signature.append(",");
            }
            values.push(self.parameter(param)?);
        }
        if suffix.variadic {
            if !suffix.params.is_empty() {
                self.signature.append(",");
            }
            self.signature.append("...");
        }
        if matches!(suffix.params, [param] if is_lone_void(param)) {
            values.clear();
        }
        Ok(values)
    }

    /// Read one parameter. A default argument is cut from the signature
    /// and kept as the value text.
    pub(super) fn parameter(&mut self, param: &Param<'ast>) -> Result<ValueInfo, BuildError> {
        let mark = self.signature.mark();
        self.signature.append_tokens(param.specs.tokens);
        let base = self.resolve_specs(&param.specs)?;
        let (derived, _) = self.declare(&base, &param.declarator, None)?;

        let name = param
            .declarator
            .name()
            .map(|name| self.strings.intern(name.simple_name()));
        let mut value = derived.into_value(name);
        if let Some(function) = value.function.as_mut() {
            function.signature = self.signature.copy_since(mark);
        }

        if let Some(default) = param.default {
            let before_default = self.signature.mark();
            self.signature.append("=");
            let value_start = self.signature.mark();
            self.signature.append_expression(default);
            value.value = Some(self.signature.cut_since(value_start));
            self.signature.cut_since(before_default);
        }

        let lists = attribute_lists(&param.specs, &param.declarator);
        let attributes = self.attributes.validate_all(lists, false)?;
        attributes.apply_to_value(&mut value)?;
        Ok(value)
    }
}

/// Fold built-in type keywords into one base type.
fn resolve_builtin(tokens: &[Token<'_>]) -> Result<TypeCode, BuildError> {
    let mut ty = TypeCode::NONE;
    for token in tokens {
        if let Some(base) = BaseType::from_keyword(token.lexeme) {
            ty = combine_base(ty, TypeCode::from_base(base)).at(token.span)?;
        }
    }
    Ok(ty.with_base(ty.base().resolved()))
}
