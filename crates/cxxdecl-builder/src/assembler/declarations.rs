//! Simple declarations: functions, variables, constants and typedefs.

use cxxdecl_core::{BaseType, Diagnostic, FunctionFlags, FunctionInfo, Specifiers, ValueInfo};
use cxxdecl_parser::ast::{
    AliasDecl, DeclSpecs, Declarator, DeclaratorCore, FunctionBody, FunctionSuffix, InitDeclarator, Initializer,
    NameKind, QualifiedName, SimpleDecl, TypeSpec,
};

use super::AssemblyContext;
use super::types::{Derived, attribute_lists, suffix_flags};
use crate::error::BuildError;
use crate::signature::expression_text;

const SPECIFIER_FLAGS: [(Specifiers, FunctionFlags); 6] = [
    (Specifiers::STATIC, FunctionFlags::STATIC),
    (Specifiers::VIRTUAL, FunctionFlags::VIRTUAL),
    (Specifiers::INLINE, FunctionFlags::INLINE),
    (Specifiers::EXPLICIT, FunctionFlags::EXPLICIT),
    (Specifiers::CONSTEXPR, FunctionFlags::CONSTEXPR),
    (Specifiers::FRIEND, FunctionFlags::FRIEND),
];

fn specifier_flags(specifiers: Specifiers) -> FunctionFlags {
    let mut flags = FunctionFlags::empty();
    for (specifier, flag) in SPECIFIER_FLAGS {
        flags.set(flag, specifiers.contains(specifier));
    }
    flags
}

fn body_flags(body: FunctionBody) -> FunctionFlags {
    match body {
        FunctionBody::Pure => FunctionFlags::PURE | FunctionFlags::VIRTUAL,
        FunctionBody::Deleted => FunctionFlags::DELETED,
        FunctionBody::Defaulted => FunctionFlags::DEFAULTED,
        FunctionBody::None | FunctionBody::Defined => FunctionFlags::empty(),
    }
}

fn initializer_text(init: Initializer<'_>) -> String {
    match init {
        Initializer::Equals(tokens) => expression_text(tokens),
        Initializer::Braced(tokens) => format!("{{{}}}", expression_text(tokens)),
        Initializer::Paren(tokens) => format!("({})", expression_text(tokens)),
    }
}

/// A declarator that is just a name.
fn is_plain_name(declarator: &Declarator<'_>) -> bool {
    declarator.ptr_ops.is_empty() && declarator.suffixes.is_empty() && matches!(declarator.core, DeclaratorCore::Name(_))
}

/// The name a constructor of `class` is declared with.
pub(super) fn constructor_name(class: &str) -> &str {
    class.split('<').next().unwrap_or(class)
}

impl<'ast> AssemblyContext<'ast> {
    pub(super) fn visit_simple(&mut self, decl: &'ast SimpleDecl<'ast>) -> Result<(), BuildError> {
        let specs = &decl.specs;
        if decl.declarators.is_empty() {
            if specs.has(Specifiers::FRIEND) {
                tracing::trace!("ignoring friend type declaration");
                return Ok(());
            }
            if matches!(specs.type_spec, TypeSpec::Class(_) | TypeSpec::Enum(_)) && !specs.attributes.is_empty() {
                self.pending_attributes = Some(self.attributes.validate(specs.attributes, false)?);
            }
            let result = self.resolve_specs(specs);
            self.pending_attributes = None;
            return result.map(|_| ());
        }

        let base = self.resolve_specs(specs)?;
        for init in decl.declarators {
            self.visit_declarator(specs, &base, init)?;
        }
        Ok(())
    }

    fn visit_declarator(
        &mut self,
        specs: &DeclSpecs<'ast>,
        base: &Derived,
        init: &'ast InitDeclarator<'ast>,
    ) -> Result<(), BuildError> {
        let declarator = &init.declarator;
        let Some(name) = declarator.name() else {
            tracing::trace!("skipping declarator without a name");
            return Ok(());
        };
        if name.is_qualified() {
            tracing::trace!(name = name.simple_name(), "skipping out-of-line definition");
            return Ok(());
        }

        let is_typedef = specs.has(Specifiers::TYPEDEF);
        let declared = if is_typedef {
            None
        } else {
            declarator.declared_function()
        };
        if declared.is_some() && name.last().is_template_id() {
            tracing::trace!(name = name.simple_name(), "skipping function specialization");
            return Ok(());
        }

        if is_typedef && is_plain_name(declarator) && self.name_anonymous_record(specs, name.simple_name()) {
            return Ok(());
        }

        self.signature.finish();
        self.signature.append_tokens(specs.tokens);
        let (derived, params) = self.declare(base, declarator, declared)?;

        match (declared, params) {
            _ if is_typedef => self.record_typedef(specs, declarator, derived, name),
            (Some(suffix), Some(params)) => self.record_function(specs, init, suffix, derived, params, name),
            _ => self.record_value(specs, init, derived, name),
        }
    }

    // ==========================================================================
    // Typedefs
    // ==========================================================================

    /// `typedef struct { ... } Name;` names the anonymous record instead of
    /// adding a typedef.
    fn name_anonymous_record(&mut self, specs: &DeclSpecs<'ast>, name: &str) -> bool {
        let symbol = self.intern(name);
        let named = match specs.type_spec {
            TypeSpec::Class(decl) if decl.name.is_none() => {
                match self.scopes.members_mut().classes.last_mut() {
                    Some(class) if class.name.is_empty() => {
                        class.name = symbol;
                        true
                    }
                    _ => false,
                }
            }
            TypeSpec::Enum(decl) if decl.name.is_none() => match self.scopes.members_mut().enums.last_mut() {
                Some(enumeration) if enumeration.name.is_none() => {
                    enumeration.name = Some(symbol);
                    true
                }
                _ => false,
            },
            _ => false,
        };
        if named {
            self.register_type(name, BaseType::Object);
            self.signature.finish();
            tracing::debug!(name, "named anonymous record");
        }
        named
    }

    fn record_typedef(
        &mut self,
        specs: &DeclSpecs<'ast>,
        declarator: &Declarator<'ast>,
        derived: Derived,
        name: &QualifiedName<'ast>,
    ) -> Result<(), BuildError> {
        let signature = self.signature.finish();
        let symbol = self.intern(name.simple_name());
        let mut value = derived.into_value(Some(symbol));
        if let Some(function) = value.function.as_mut() {
            function.signature = signature;
        }
        value.access = self.scopes.access();
        value.comment = self.take_comment();
        value.template = self.scopes.take_template().map(Box::new);

        let attributes = self.attributes.validate_all(attribute_lists(specs, declarator), false)?;
        attributes.apply_to_value(&mut value)?;

        self.register_type(name.simple_name(), BaseType::Typedef);
        tracing::debug!(name = name.simple_name(), "recorded typedef");
        self.scopes.members_mut().add_typedef(value);
        self.stats.typedefs += 1;
        Ok(())
    }

    /// `using Name = type;`
    pub(super) fn visit_alias(&mut self, alias: &'ast AliasDecl<'ast>) -> Result<(), BuildError> {
        self.signature.finish();
        let comment = self.take_comment();
        let template = self.scopes.take_template();
        let (derived, text) = self.type_id(&alias.target)?;

        let name = self.intern(alias.name.lexeme);
        let mut value = derived.into_value(Some(name));
        value.ty = value.ty.with_specifiers(Specifiers::TYPEDEF);
        if let Some(function) = value.function.as_mut() {
            function.signature = text.clone();
        }
        value.access = self.scopes.access();
        value.comment = comment;
        value.template = template.map(Box::new);

        let attributes = self.attributes.validate(alias.attributes, false)?;
        attributes.apply_to_value(&mut value)?;

        self.register_type(alias.name.lexeme, BaseType::Typedef);
        tracing::debug!(name = alias.name.lexeme, target = %text, "recorded alias");
        self.scopes.members_mut().add_typedef(value);
        self.stats.typedefs += 1;
        Ok(())
    }

    // ==========================================================================
    // Functions
    // ==========================================================================

    fn record_function(
        &mut self,
        specs: &DeclSpecs<'ast>,
        init: &'ast InitDeclarator<'ast>,
        suffix: &'ast FunctionSuffix<'ast>,
        derived: Derived,
        parameters: Vec<ValueInfo>,
        name: &QualifiedName<'ast>,
    ) -> Result<(), BuildError> {
        // the signature must be taken before any type-id is rendered
        let signature = self.signature.finish();
        let segment = name.last();

        let mut function = FunctionInfo::new(self.intern(segment.name));
        function.signature = signature;
        function.parameters = parameters;
        function.flags = suffix_flags(suffix) | specifier_flags(specs.specifiers) | body_flags(init.body);

        let class_name = self.scopes.class().map(|class| class.name.clone());
        let is_constructor = specs.type_spec.is_none()
            && segment.kind == NameKind::Identifier
            && class_name
                .as_deref()
                .is_some_and(|class| constructor_name(class) == segment.name);
        match segment.kind {
            NameKind::Operator | NameKind::Conversion => function.flags |= FunctionFlags::OPERATOR,
            NameKind::Destructor => function.flags |= FunctionFlags::DESTRUCTOR,
            NameKind::Identifier if is_constructor => function.flags |= FunctionFlags::CONSTRUCTOR,
            NameKind::Identifier => {}
        }

        function.return_value = if function.is_constructor() || function.is_destructor() {
            None
        } else if let Some(target) = segment.conversion {
            Some(self.type_id(target)?.0.into_value(None))
        } else if let Some(trailing) = suffix.trailing_return {
            Some(self.type_id(trailing)?.0.into_value(None))
        } else {
            Some(derived.into_value(None))
        };

        function.template = self.scopes.take_template();
        function.access = self.scopes.access();
        function.class_name = class_name;
        function.comment = self.take_comment();

        let attributes = self.attributes.validate_all(attribute_lists(specs, &init.declarator), true)?;
        attributes.apply_to_function(&mut function)?;

        if !self.scopes.in_class() && self.is_duplicate_overload(&function) {
            tracing::warn!(
                name = %function.name,
                signature = %function.signature,
                "dropping overload with the parameter types of an earlier declaration"
            );
            self.diagnostics.push(Diagnostic::DuplicateOverload {
                name: function.name,
                signature: function.signature,
                span: name.span,
            });
            self.stats.dropped_overloads += 1;
            return Ok(());
        }

        tracing::debug!(name = %function.name, signature = %function.signature, "recorded function");
        self.scopes.members_mut().add_function(function);
        self.stats.functions += 1;
        Ok(())
    }

    /// Whether a free function's parameter base types match an earlier
    /// overload in the same scope.
    fn is_duplicate_overload(&self, function: &FunctionInfo) -> bool {
        let bases = |f: &FunctionInfo| f.parameters.iter().map(|param| param.ty.base()).collect::<Vec<_>>();
        let key = bases(function);
        self.scopes
            .members()
            .functions_named(function.name.as_ref())
            .any(|existing| bases(existing) == key)
    }

    // ==========================================================================
    // Variables and constants
    // ==========================================================================

    fn record_value(
        &mut self,
        specs: &DeclSpecs<'ast>,
        init: &'ast InitDeclarator<'ast>,
        derived: Derived,
        name: &QualifiedName<'ast>,
    ) -> Result<(), BuildError> {
        let signature = self.signature.finish();
        let symbol = self.intern(name.simple_name());
        let mut value = derived.into_value(Some(symbol));
        if let Some(function) = value.function.as_mut() {
            function.signature = signature;
        }
        value.value = init.init.map(initializer_text);
        value.bit_width = init.bit_width.map(expression_text);
        value.access = self.scopes.access();
        value.comment = self.take_comment();
        value.template = self.scopes.take_template().map(Box::new);

        let attributes = self.attributes.validate_all(attribute_lists(specs, &init.declarator), false)?;
        attributes.apply_to_value(&mut value)?;

        let ty = value.ty;
        let is_constant = (ty.is_const() || specs.has(Specifiers::CONSTEXPR))
            && !ty.is_indirect()
            && !ty.is_reference()
            && matches!(init.init, Some(Initializer::Equals(_)));

        let members = self.scopes.members_mut();
        if is_constant {
            tracing::debug!(name = name.simple_name(), "recorded constant");
            members.add_constant(value);
            self.stats.constants += 1;
        } else {
            tracing::debug!(name = name.simple_name(), "recorded variable");
            members.add_variable(value);
            self.stats.variables += 1;
        }
        Ok(())
    }
}
