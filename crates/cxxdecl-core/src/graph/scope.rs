use crate::strings::Symbol;
use crate::type_code::TypeCode;

use super::{Access, Deprecation, FunctionInfo, ItemKind, ItemRef, TemplateInfo, ValueInfo};

/// The declarations a namespace or class body contains.
#[derive(Debug, Clone, Default)]
pub struct Members {
    pub classes: Vec<ClassInfo>,
    pub functions: Vec<FunctionInfo>,
    pub variables: Vec<ValueInfo>,
    pub constants: Vec<ValueInfo>,
    pub enums: Vec<EnumInfo>,
    pub typedefs: Vec<ValueInfo>,
    pub usings: Vec<UsingInfo>,
    /// Declaration order across all categories.
    pub items: Vec<ItemRef>,
}

macro_rules! adder {
    ($(#[$doc:meta])* $fn_name:ident, $field:ident, $ty:ty, $kind:expr) => {
        $(#[$doc])*
        pub fn $fn_name(&mut self, value: $ty) -> ItemRef {
            let item = ItemRef {
                kind: $kind,
                index: self.$field.len(),
            };
            self.$field.push(value);
            self.items.push(item);
            item
        }
    };
}

impl Members {
    adder!(add_class, classes, ClassInfo, ItemKind::Class);
    adder!(add_function, functions, FunctionInfo, ItemKind::Function);
    adder!(add_variable, variables, ValueInfo, ItemKind::Variable);
    adder!(add_constant, constants, ValueInfo, ItemKind::Constant);
    adder!(add_enum, enums, EnumInfo, ItemKind::Enum);
    adder!(add_typedef, typedefs, ValueInfo, ItemKind::Typedef);
    adder!(add_using, usings, UsingInfo, ItemKind::Using);

    /// The most recently completed declaration.
    pub fn last_item(&self) -> Option<ItemRef> {
        self.items.last().copied()
    }

    /// The comment slot of a declaration in this scope.
    pub fn comment_mut(&mut self, item: ItemRef) -> Option<&mut Option<String>> {
        let i = item.index;
        match item.kind {
            ItemKind::Class => self.classes.get_mut(i).map(|c| &mut c.comment),
            ItemKind::Function => self.functions.get_mut(i).map(|f| &mut f.comment),
            ItemKind::Variable => self.variables.get_mut(i).map(|v| &mut v.comment),
            ItemKind::Constant => self.constants.get_mut(i).map(|v| &mut v.comment),
            ItemKind::Enum => self.enums.get_mut(i).map(|e| &mut e.comment),
            ItemKind::Typedef => self.typedefs.get_mut(i).map(|v| &mut v.comment),
            ItemKind::Using => self.usings.get_mut(i).map(|u| &mut u.comment),
            ItemKind::Namespace => None,
        }
    }

    pub fn class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.iter().find(|c| c.name.as_ref() == name)
    }

    pub fn class_mut(&mut self, name: &str) -> Option<&mut ClassInfo> {
        self.classes.iter_mut().find(|c| c.name.as_ref() == name)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.iter().find(|f| f.name.as_ref() == name)
    }

    pub fn functions_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FunctionInfo> {
        self.functions.iter().filter(move |f| f.name.as_ref() == name)
    }

    pub fn variable(&self, name: &str) -> Option<&ValueInfo> {
        self.variables.iter().find(|v| v.name.as_deref() == Some(name))
    }

    pub fn constant(&self, name: &str) -> Option<&ValueInfo> {
        self.constants.iter().find(|v| v.name.as_deref() == Some(name))
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumInfo> {
        self.enums.iter().find(|e| e.name.as_deref() == Some(name))
    }

    pub fn typedef(&self, name: &str) -> Option<&ValueInfo> {
        self.typedefs.iter().find(|v| v.name.as_deref() == Some(name))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A namespace body. The global namespace has no name.
#[derive(Debug, Clone, Default)]
pub struct NamespaceInfo {
    pub name: Option<Symbol>,
    pub is_inline: bool,
    pub comment: Option<String>,
    pub namespaces: Vec<NamespaceInfo>,
    pub members: Members,
}

impl NamespaceInfo {
    pub fn new(name: Option<Symbol>) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn add_namespace(&mut self, namespace: NamespaceInfo) -> ItemRef {
        let item = ItemRef {
            kind: ItemKind::Namespace,
            index: self.namespaces.len(),
        };
        self.namespaces.push(namespace);
        self.members.items.push(item);
        item
    }

    /// First namespace with the given name (namespaces may be reopened).
    pub fn namespace(&self, name: &str) -> Option<&NamespaceInfo> {
        self.namespaces
            .iter()
            .find(|ns| ns.name.as_deref() == Some(name))
    }

    pub fn comment_mut(&mut self, item: ItemRef) -> Option<&mut Option<String>> {
        match item.kind {
            ItemKind::Namespace => self.namespaces.get_mut(item.index).map(|ns| &mut ns.comment),
            _ => self.members.comment_mut(item),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClassKind {
    #[default]
    Class,
    Struct,
    Union,
}

impl ClassKind {
    /// Access level a body starts with.
    pub fn default_access(self) -> Access {
        match self {
            ClassKind::Class => Access::Private,
            ClassKind::Struct | ClassKind::Union => Access::Public,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Struct => "struct",
            ClassKind::Union => "union",
        }
    }
}

/// How a binding generator should marshal a class.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MarshalHint {
    #[default]
    None,
    Auto,
    Exclude(String),
}

/// A class, struct or union definition.
#[derive(Debug, Clone, Default)]
pub struct ClassInfo {
    pub name: Symbol,
    pub kind: ClassKind,
    /// Access inside the enclosing class; public at namespace scope.
    pub access: Access,
    /// Public, non-virtual base classes.
    pub super_classes: Vec<Symbol>,
    pub is_abstract: bool,
    pub is_final: bool,
    /// The class declares a method named `Delete`.
    pub has_delete: bool,
    pub template: Option<TemplateInfo>,
    pub comment: Option<String>,
    pub deprecation: Option<Deprecation>,
    pub is_excluded: bool,
    pub marshal: MarshalHint,
    pub members: Members,
}

impl ClassInfo {
    pub fn new(name: Symbol, kind: ClassKind) -> Self {
        Self {
            name,
            kind,
            ..Self::default()
        }
    }
}

/// An enumeration and its enumerators.
#[derive(Debug, Clone, Default)]
pub struct EnumInfo {
    pub name: Option<Symbol>,
    pub is_scoped: bool,
    /// Spelling of the underlying type, when one is given.
    pub underlying: Option<Symbol>,
    pub underlying_type: TypeCode,
    pub constants: Vec<ValueInfo>,
    pub access: Access,
    pub comment: Option<String>,
    pub deprecation: Option<Deprecation>,
    pub is_excluded: bool,
}

impl EnumInfo {
    pub fn constant(&self, name: &str) -> Option<&ValueInfo> {
        self.constants.iter().find(|c| c.name.as_deref() == Some(name))
    }
}

/// A using-declaration (`using A::b;`) or directive (`using namespace A;`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsingInfo {
    /// Introduced name; `None` for a using-directive.
    pub name: Option<Symbol>,
    pub scope: Symbol,
    pub is_namespace: bool,
    pub access: Access,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_record_declaration_order() {
        let mut members = Members::default();
        members.add_variable(ValueInfo::named("a".into(), TypeCode::NONE));
        members.add_class(ClassInfo::new("B".into(), ClassKind::Struct));
        let last = members.add_variable(ValueInfo::named("c".into(), TypeCode::NONE));

        assert_eq!(
            members.items.iter().map(|i| i.kind).collect::<Vec<_>>(),
            vec![ItemKind::Variable, ItemKind::Class, ItemKind::Variable]
        );
        assert_eq!(last.index, 1);
        assert_eq!(members.last_item(), Some(last));
    }

    #[test]
    fn comment_slot_follows_item() {
        let mut ns = NamespaceInfo::new(None);
        let item = ns.members.add_constant(ValueInfo::named("N".into(), TypeCode::NONE));
        *ns.comment_mut(item).unwrap() = Some("the count".into());
        assert_eq!(ns.members.constants[0].comment.as_deref(), Some("the count"));

        let inner = ns.add_namespace(NamespaceInfo::new(Some("detail".into())));
        *ns.comment_mut(inner).unwrap() = Some("internals".into());
        assert_eq!(ns.namespaces[0].comment.as_deref(), Some("internals"));
    }

    #[test]
    fn default_access_by_kind() {
        assert_eq!(ClassKind::Class.default_access(), Access::Private);
        assert_eq!(ClassKind::Struct.default_access(), Access::Public);
        assert_eq!(ClassKind::Union.default_access(), Access::Public);
    }
}
