//! Reserved-namespace attribute validation.
//!
//! Attributes in the reserved namespace (`wrap` unless configured
//! otherwise) annotate declarations for binding generators. Each one is
//! allowed only in certain syntactic positions and takes a fixed number of
//! arguments. Everything outside the reserved namespace is discarded.

use cxxdecl_core::{
    ClassInfo, Deprecation, EnumInfo, FunctionFlags, FunctionInfo, MarshalHint, Span, ValueFlags, ValueInfo,
};
use cxxdecl_parser::ast::{Attribute, AttributeRole};
use cxxdecl_parser::{Token, TokenKind};

use crate::error::AttributeError;
use crate::signature::expression_text;

/// The default reserved namespace.
pub const DEFAULT_NAMESPACE: &str = "wrap";

/// Argument count an attribute accepts.
#[derive(Debug, Clone, Copy)]
enum Arity {
    None,
    Exactly(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    fn accepts(self, found: usize) -> bool {
        match self {
            Arity::None => found == 0,
            Arity::Exactly(n) => found == n,
            Arity::Range(min, max) => (min..=max).contains(&found),
            Arity::AtLeast(n) => found >= n,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Arity::None => "no",
            Arity::Exactly(1) => "1",
            Arity::Exactly(_) => "2",
            Arity::Range(..) => "0 to 2",
            Arity::AtLeast(_) => "at least 1",
        }
    }
}

struct Rule {
    name: &'static str,
    roles: &'static [AttributeRole],
    arity: Arity,
    function_only: bool,
}

use AttributeRole::{Class, Declaration, Function, Id};

const RULES: &[Rule] = &[
    Rule { name: "exclude", roles: &[Declaration, Class], arity: Arity::None, function_only: false },
    Rule { name: "newinstance", roles: &[Declaration], arity: Arity::None, function_only: true },
    Rule { name: "zerocopy", roles: &[Declaration], arity: Arity::None, function_only: false },
    Rule { name: "filepath", roles: &[Declaration], arity: Arity::None, function_only: false },
    Rule { name: "deprecated", roles: &[Declaration, Class, Id], arity: Arity::Range(0, 2), function_only: false },
    Rule { name: "expects", roles: &[Function], arity: Arity::AtLeast(1), function_only: true },
    Rule { name: "sizehint", roles: &[Declaration], arity: Arity::Exactly(2), function_only: false },
    Rule { name: "unblockthreads", roles: &[Declaration], arity: Arity::None, function_only: true },
    Rule { name: "propexclude", roles: &[Declaration], arity: Arity::None, function_only: false },
    Rule { name: "marshalauto", roles: &[Class], arity: Arity::None, function_only: false },
    Rule { name: "marshalexclude", roles: &[Declaration, Class], arity: Arity::Exactly(1), function_only: false },
];

/// `sizehint(name, expr)`: how many elements a pointer refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeHint {
    /// A parameter name, or None for `_` (the return value).
    pub target: Option<String>,
    pub size: String,
    pub span: Span,
}

/// Everything the reserved attributes of one declaration ask for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclAttributes {
    pub is_excluded: bool,
    pub new_instance: bool,
    pub zero_copy: bool,
    pub file_path: bool,
    pub deprecation: Option<Deprecation>,
    pub preconditions: Vec<String>,
    pub size_hints: Vec<SizeHint>,
    pub unblock_threads: bool,
    pub property_exclude: bool,
    pub marshal: MarshalHint,
}

impl DeclAttributes {
    pub fn is_empty(&self) -> bool {
        *self == DeclAttributes::default()
    }

    /// Combine with the attributes of another list on the same declaration.
    pub fn merge(&mut self, other: DeclAttributes) {
        self.is_excluded |= other.is_excluded;
        self.new_instance |= other.new_instance;
        self.zero_copy |= other.zero_copy;
        self.file_path |= other.file_path;
        if other.deprecation.is_some() {
            self.deprecation = other.deprecation;
        }
        self.preconditions.extend(other.preconditions);
        self.size_hints.extend(other.size_hints);
        self.unblock_threads |= other.unblock_threads;
        self.property_exclude |= other.property_exclude;
        if other.marshal != MarshalHint::None {
            self.marshal = other.marshal;
        }
    }

    fn value_flags(&self) -> ValueFlags {
        let mut flags = ValueFlags::empty();
        flags.set(ValueFlags::ZERO_COPY, self.zero_copy);
        flags.set(ValueFlags::FILE_PATH, self.file_path);
        flags.set(ValueFlags::PROPERTY_EXCLUDE, self.property_exclude);
        flags
    }

    pub fn apply_to_function(&self, function: &mut FunctionInfo) -> Result<(), AttributeError> {
        function.is_excluded |= self.is_excluded;
        if self.deprecation.is_some() {
            function.deprecation = self.deprecation.clone();
        }
        function.preconditions.extend(self.preconditions.iter().cloned());
        function.flags.set(FunctionFlags::NEW_INSTANCE, self.new_instance);
        function.flags.set(FunctionFlags::UNBLOCK_THREADS, self.unblock_threads);
        function.flags.set(FunctionFlags::PROPERTY_EXCLUDE, self.property_exclude);
        if let Some(value) = &mut function.return_value {
            value.flags |= self.value_flags();
        }

        for hint in &self.size_hints {
            let value = match &hint.target {
                None => function.return_value.as_mut(),
                Some(name) => function
                    .parameters
                    .iter_mut()
                    .find(|param| param.name.as_deref() == Some(name.as_str())),
            };
            let Some(value) = value else {
                return Err(AttributeError::UnknownParameter {
                    parameter: hint.target.clone().unwrap_or_else(|| "_".into()),
                    span: hint.span,
                });
            };
            value.count_hint = Some(hint.size.clone());
        }
        Ok(())
    }

    pub fn apply_to_value(&self, value: &mut ValueInfo) -> Result<(), AttributeError> {
        value.is_excluded |= self.is_excluded;
        if self.deprecation.is_some() {
            value.deprecation = self.deprecation.clone();
        }
        value.flags |= self.value_flags();
        for hint in &self.size_hints {
            let names_value = match &hint.target {
                None => true,
                Some(name) => value.name.as_deref() == Some(name.as_str()),
            };
            if !names_value {
                return Err(AttributeError::UnknownParameter {
                    parameter: hint.target.clone().unwrap_or_default(),
                    span: hint.span,
                });
            }
            value.count_hint = Some(hint.size.clone());
        }
        Ok(())
    }

    pub fn apply_to_class(&self, class: &mut ClassInfo) {
        class.is_excluded |= self.is_excluded;
        if self.deprecation.is_some() {
            class.deprecation = self.deprecation.clone();
        }
        if self.marshal != MarshalHint::None {
            class.marshal = self.marshal.clone();
        }
    }

    pub fn apply_to_enum(&self, enumeration: &mut EnumInfo) {
        enumeration.is_excluded |= self.is_excluded;
        if self.deprecation.is_some() {
            enumeration.deprecation = self.deprecation.clone();
        }
    }
}

/// Checks attribute lists against the reserved-namespace rules.
#[derive(Debug, Clone)]
pub struct AttributeValidator {
    namespace: String,
}

impl Default for AttributeValidator {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl AttributeValidator {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into() }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Validate one attribute list. `is_function` says whether the
    /// declaration it belongs to declares a function.
    pub fn validate(&self, attributes: &[Attribute<'_>], is_function: bool) -> Result<DeclAttributes, AttributeError> {
        let mut result = DeclAttributes::default();
        for attribute in attributes {
            if attribute.namespace != Some(self.namespace.as_str()) {
                if attribute.namespace.is_some() {
                    tracing::trace!(name = attribute.name, "discarding foreign attribute");
                }
                continue;
            }
            self.apply(attribute, is_function, &mut result)?;
        }
        Ok(result)
    }

    /// Validate several lists belonging to the same declaration.
    pub fn validate_all<'a, 'ast: 'a>(
        &self,
        lists: impl IntoIterator<Item = &'a [Attribute<'ast>]>,
        is_function: bool,
    ) -> Result<DeclAttributes, AttributeError> {
        let mut result = DeclAttributes::default();
        for list in lists {
            result.merge(self.validate(list, is_function)?);
        }
        Ok(result)
    }

    fn apply(&self, attribute: &Attribute<'_>, is_function: bool, out: &mut DeclAttributes) -> Result<(), AttributeError> {
        let Some(rule) = RULES.iter().find(|rule| rule.name == attribute.name) else {
            return Err(AttributeError::Unknown {
                namespace: self.namespace.clone(),
                name: attribute.name.to_string(),
                span: attribute.span,
            });
        };
        if !rule.roles.contains(&attribute.role) {
            return Err(AttributeError::WrongRole {
                name: rule.name.to_string(),
                role: attribute.role.as_str(),
                span: attribute.span,
            });
        }
        if rule.function_only && !is_function {
            return Err(AttributeError::NotAFunction {
                name: rule.name.to_string(),
                span: attribute.span,
            });
        }

        let args = split_arguments(attribute.args.unwrap_or_default());
        if !rule.arity.accepts(args.len()) {
            return Err(AttributeError::Arguments {
                name: rule.name.to_string(),
                expected: rule.arity.describe(),
                found: args.len(),
                span: attribute.span,
            });
        }

        match rule.name {
            "exclude" => out.is_excluded = true,
            "newinstance" => out.new_instance = true,
            "zerocopy" => out.zero_copy = true,
            "filepath" => out.file_path = true,
            "unblockthreads" => out.unblock_threads = true,
            "propexclude" => out.property_exclude = true,
            "marshalauto" => out.marshal = MarshalHint::Auto,
            "marshalexclude" => out.marshal = MarshalHint::Exclude(argument_text(args[0])),
            "deprecated" => {
                out.deprecation = Some(Deprecation {
                    reason: args.first().map(|arg| argument_text(arg)),
                    version: args.get(1).map(|arg| argument_text(arg)),
                })
            }
            "expects" => out.preconditions.push(expression_text(attribute.args.unwrap_or_default())),
            "sizehint" => {
                let target = expression_text(args[0]);
                out.size_hints.push(SizeHint {
                    target: (target != "_").then_some(target),
                    size: expression_text(args[1]),
                    span: attribute.span,
                });
            }
            _ => {}
        }
        Ok(())
    }
}

/// Split an argument clause at top-level commas.
fn split_arguments<'t, 'ast>(tokens: &'t [Token<'ast>]) -> Vec<&'t [Token<'ast>]> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => depth += 1,
            TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => depth = depth.saturating_sub(1),
            TokenKind::Comma if depth == 0 => {
                args.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(&tokens[start..]);
    args
}

/// A string literal argument without its quotes, or the expression text.
fn argument_text(tokens: &[Token<'_>]) -> String {
    match tokens {
        [token] if token.kind == TokenKind::StringLiteral => {
            let lexeme = token.lexeme;
            lexeme
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .unwrap_or(lexeme)
                .to_string()
        }
        _ => expression_text(tokens),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use cxxdecl_core::{BaseType, TypeCode};
    use cxxdecl_parser::Lexer;

    fn attribute<'ast>(arena: &'ast Bump, name: &'ast str, args: Option<&'ast str>, role: AttributeRole) -> Attribute<'ast> {
        let args = args.map(|text| &*arena.alloc_slice_copy(&Lexer::new(text, arena).collect::<Vec<_>>()));
        Attribute {
            namespace: Some("wrap"),
            name,
            args,
            role,
            span: Span::new(1, 1, name.len() as u32),
        }
    }

    #[test]
    fn function_role_attribute_rejected_on_field() {
        let arena = Bump::new();
        let validator = AttributeValidator::default();
        let expects = attribute(&arena, "expects", Some("x > 0"), AttributeRole::Id);
        assert!(matches!(
            validator.validate(&[expects], false),
            Err(AttributeError::WrongRole { role: "declarator-id", .. })
        ));

        let expects = attribute(&arena, "expects", Some("x > 0"), AttributeRole::Function);
        let result = validator.validate(&[expects], true).unwrap();
        assert_eq!(result.preconditions, vec!["x > 0".to_string()]);
    }

    #[test]
    fn function_only_attribute_rejected_on_variable() {
        let arena = Bump::new();
        let validator = AttributeValidator::default();
        let attr = attribute(&arena, "newinstance", None, AttributeRole::Declaration);
        assert!(matches!(validator.validate(&[attr], false), Err(AttributeError::NotAFunction { .. })));
        assert!(validator.validate(&[attr], true).unwrap().new_instance);
    }

    #[test]
    fn unknown_reserved_attribute_is_an_error() {
        let arena = Bump::new();
        let attr = attribute(&arena, "frobnicate", None, AttributeRole::Declaration);
        assert!(matches!(
            AttributeValidator::default().validate(&[attr], false),
            Err(AttributeError::Unknown { .. })
        ));
    }

    #[test]
    fn foreign_attributes_are_discarded() {
        let arena = Bump::new();
        let mut attr = attribute(&arena, "nodiscard", None, AttributeRole::Declaration);
        attr.namespace = None;
        let mut gnu = attribute(&arena, "frobnicate", Some("1, 2, 3"), AttributeRole::Id);
        gnu.namespace = Some("gnu");
        assert!(AttributeValidator::default().validate(&[attr, gnu], false).unwrap().is_empty());
    }

    #[test]
    fn checks_argument_counts() {
        let arena = Bump::new();
        let validator = AttributeValidator::default();
        let attr = attribute(&arena, "exclude", Some("1"), AttributeRole::Declaration);
        assert!(matches!(
            validator.validate(&[attr], false),
            Err(AttributeError::Arguments { found: 1, .. })
        ));
        let attr = attribute(&arena, "sizehint", Some("buffer"), AttributeRole::Declaration);
        assert!(matches!(
            validator.validate(&[attr], true),
            Err(AttributeError::Arguments { expected: "2", .. })
        ));
    }

    #[test]
    fn deprecated_strips_quotes() {
        let arena = Bump::new();
        let attr = attribute(&arena, "deprecated", Some(r#""use Bar", "2.1""#), AttributeRole::Class);
        let result = AttributeValidator::default().validate(&[attr], false).unwrap();
        assert_eq!(
            result.deprecation,
            Some(Deprecation {
                reason: Some("use Bar".into()),
                version: Some("2.1".into())
            })
        );
    }

    #[test]
    fn custom_namespace() {
        let arena = Bump::new();
        let mut attr = attribute(&arena, "exclude", None, AttributeRole::Class);
        attr.namespace = Some("bind");
        let validator = AttributeValidator::new("bind");
        assert!(validator.validate(&[attr], false).unwrap().is_excluded);
        assert!(AttributeValidator::default().validate(&[attr], false).unwrap().is_empty());
    }

    #[test]
    fn size_hints_target_parameters_and_return_value() {
        let arena = Bump::new();
        let validator = AttributeValidator::default();
        let to_param = attribute(&arena, "sizehint", Some("data, count * 2"), AttributeRole::Declaration);
        let to_return = attribute(&arena, "sizehint", Some("_, 16"), AttributeRole::Declaration);
        let attrs = validator.validate(&[to_param, to_return], true).unwrap();

        let mut function = FunctionInfo::new("Fill".into());
        function.return_value = Some(ValueInfo::new(TypeCode::from_base(BaseType::Int)));
        function
            .parameters
            .push(ValueInfo::named("data".into(), TypeCode::from_base(BaseType::Float)));
        attrs.apply_to_function(&mut function).unwrap();

        assert_eq!(function.parameters[0].count_hint.as_deref(), Some("count * 2"));
        assert_eq!(
            function.return_value.as_ref().and_then(|v| v.count_hint.as_deref()),
            Some("16")
        );

        let missing = attribute(&arena, "sizehint", Some("nothing, 1"), AttributeRole::Declaration);
        let attrs = validator.validate(&[missing], true).unwrap();
        assert!(matches!(
            attrs.apply_to_function(&mut function),
            Err(AttributeError::UnknownParameter { .. })
        ));
    }
}
