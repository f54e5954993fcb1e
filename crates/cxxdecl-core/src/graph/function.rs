use bitflags::bitflags;

use crate::strings::Symbol;

use super::{Access, Deprecation, TemplateInfo, ValueInfo};

bitflags! {
    /// Qualifiers and properties of a function or method.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FunctionFlags: u32 {
        const CONST = 1 << 0;
        const STATIC = 1 << 1;
        const VIRTUAL = 1 << 2;
        /// Declared `= 0`.
        const PURE = 1 << 3;
        const FINAL = 1 << 4;
        const OVERRIDE = 1 << 5;
        /// Declared `= delete`.
        const DELETED = 1 << 6;
        /// Declared `= default`.
        const DEFAULTED = 1 << 7;
        const EXPLICIT = 1 << 8;
        const OPERATOR = 1 << 9;
        /// Takes `...` after its named parameters.
        const VARIADIC = 1 << 10;
        const INLINE = 1 << 11;
        const CONSTEXPR = 1 << 12;
        const NOEXCEPT = 1 << 13;
        const FRIEND = 1 << 14;
        const VOLATILE = 1 << 15;
        /// Special member generated because the class did not declare it.
        const IMPLICIT = 1 << 16;
        const NEW_INSTANCE = 1 << 17;
        const UNBLOCK_THREADS = 1 << 18;
        const PROPERTY_EXCLUDE = 1 << 19;
        const CONSTRUCTOR = 1 << 20;
        const DESTRUCTOR = 1 << 21;
    }
}

/// A function, method, constructor or destructor.
#[derive(Debug, Clone, Default)]
pub struct FunctionInfo {
    pub name: Symbol,
    /// Owning class, for methods.
    pub class_name: Option<Symbol>,
    pub access: Access,
    /// `None` for constructors and destructors.
    pub return_value: Option<ValueInfo>,
    pub parameters: Vec<ValueInfo>,
    pub flags: FunctionFlags,
    pub template: Option<TemplateInfo>,
    /// Normalized declaration text, without default arguments.
    pub signature: String,
    pub deprecation: Option<Deprecation>,
    /// Preconditions from `expects` attributes.
    pub preconditions: Vec<String>,
    pub is_excluded: bool,
    pub comment: Option<String>,
}

impl FunctionInfo {
    pub fn new(name: Symbol) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    #[inline]
    pub fn has(&self, flags: FunctionFlags) -> bool {
        self.flags.contains(flags)
    }

    pub fn is_constructor(&self) -> bool {
        self.has(FunctionFlags::CONSTRUCTOR)
    }

    pub fn is_destructor(&self) -> bool {
        self.has(FunctionFlags::DESTRUCTOR)
    }

    /// Whether this is a copy constructor of `class_name`.
    pub fn is_copy_constructor(&self, class_name: &str) -> bool {
        self.is_constructor()
            && self.parameters.len() == 1
            && self.parameters[0].ty.is_reference()
            && self.parameters[0].class_name.as_deref() == Some(class_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_code::{BaseType, RefKind, TypeCode};

    #[test]
    fn copy_constructor_detection() {
        let mut ctor = FunctionInfo::new("Point".into());
        ctor.flags |= FunctionFlags::CONSTRUCTOR;
        let mut param = ValueInfo::new(
            TypeCode::from_base(BaseType::Object).with_reference(RefKind::LValue),
        );
        param.class_name = Some("Point".into());
        ctor.parameters.push(param);

        assert!(ctor.is_copy_constructor("Point"));
        assert!(!ctor.is_copy_constructor("Line"));

        ctor.parameters[0].ty = TypeCode::from_base(BaseType::Object);
        assert!(!ctor.is_copy_constructor("Point"));
    }
}
