//! Scope stacks for declaration assembly.
//!
//! The assembler keeps four independent stacks:
//! - namespaces being filled
//! - classes being filled, each with its current access level
//! - templates whose parameter lists are being collected
//! - functions whose parameters are being read, with the declaration state
//!   they interrupted
//!
//! Pushing saves the active value and installs a fresh one; popping hands
//! back the finished value and restores the saved one. The stacks grow as
//! needed and never truncate.

use cxxdecl_core::{Access, ClassInfo, Members, NamespaceInfo, Symbol, TemplateInfo, TypeCode};

// ============================================================================
// Types
// ============================================================================

/// Push and pop counts for each stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeStats {
    pub namespace_pushes: usize,
    pub namespace_pops: usize,
    pub class_pushes: usize,
    pub class_pops: usize,
    pub template_pushes: usize,
    pub template_pops: usize,
    pub function_pushes: usize,
    pub function_pops: usize,
}

impl ScopeStats {
    /// Every stack was popped as often as it was pushed.
    pub fn is_balanced(&self) -> bool {
        self.namespace_pushes == self.namespace_pops
            && self.class_pushes == self.class_pops
            && self.template_pushes == self.template_pops
            && self.function_pushes == self.function_pops
    }
}

/// A class being filled, with the access level its body is currently at.
#[derive(Debug)]
struct ClassFrame {
    class: ClassInfo,
    access: Access,
}

/// A template parameter list and whether a declaration has claimed it.
#[derive(Debug)]
struct TemplateFrame {
    info: TemplateInfo,
    taken: bool,
}

/// The declaration being read when a function scope was entered.
#[derive(Debug, Clone, Default)]
pub struct DeclState {
    pub ty: TypeCode,
    pub name: Option<Symbol>,
}

// ============================================================================
// ScopeStacks
// ============================================================================

#[derive(Debug)]
pub struct ScopeStacks {
    namespace: NamespaceInfo,
    namespaces: Vec<NamespaceInfo>,
    class: Option<ClassFrame>,
    classes: Vec<Option<ClassFrame>>,
    template: Option<TemplateFrame>,
    templates: Vec<Option<TemplateFrame>>,
    /// The declaration under construction in the innermost function scope.
    decl: DeclState,
    functions: Vec<DeclState>,
    stats: ScopeStats,
}

impl ScopeStacks {
    /// Start at the global namespace.
    pub fn new() -> Self {
        Self {
            namespace: NamespaceInfo::new(None),
            namespaces: Vec::new(),
            class: None,
            classes: Vec::new(),
            template: None,
            templates: Vec::new(),
            decl: DeclState::default(),
            functions: Vec::new(),
            stats: ScopeStats::default(),
        }
    }

    pub fn stats(&self) -> ScopeStats {
        self.stats
    }

    // ==========================================================================
    // Namespaces
    // ==========================================================================

    pub fn push_namespace(&mut self, namespace: NamespaceInfo) {
        self.stats.namespace_pushes += 1;
        let outer = std::mem::replace(&mut self.namespace, namespace);
        self.namespaces.push(outer);
    }

    /// Finish the active namespace and add it to the one it was opened in.
    pub fn pop_namespace(&mut self) {
        let Some(outer) = self.namespaces.pop() else {
            return;
        };
        self.stats.namespace_pops += 1;
        let inner = std::mem::replace(&mut self.namespace, outer);
        self.namespace.add_namespace(inner);
    }

    pub fn namespace(&self) -> &NamespaceInfo {
        &self.namespace
    }

    pub fn namespace_mut(&mut self) -> &mut NamespaceInfo {
        &mut self.namespace
    }

    /// Hand back the global namespace once every scope is closed.
    pub fn into_global(mut self) -> NamespaceInfo {
        while !self.namespaces.is_empty() {
            self.pop_namespace();
        }
        self.namespace
    }

    // ==========================================================================
    // Classes
    // ==========================================================================

    pub fn push_class(&mut self, class: ClassInfo) {
        self.stats.class_pushes += 1;
        let access = class.kind.default_access();
        let outer = self.class.replace(ClassFrame { class, access });
        self.classes.push(outer);
    }

    /// Finish the active class and restore the enclosing one.
    pub fn pop_class(&mut self) -> Option<ClassInfo> {
        let outer = self.classes.pop()?;
        self.stats.class_pops += 1;
        std::mem::replace(&mut self.class, outer).map(|frame| frame.class)
    }

    pub fn in_class(&self) -> bool {
        self.class.is_some()
    }

    pub fn class(&self) -> Option<&ClassInfo> {
        self.class.as_ref().map(|frame| &frame.class)
    }

    pub fn class_mut(&mut self) -> Option<&mut ClassInfo> {
        self.class.as_mut().map(|frame| &mut frame.class)
    }

    /// Access level for a member declared now: the class body's current
    /// level, or public outside classes.
    pub fn access(&self) -> Access {
        self.class.as_ref().map_or(Access::Public, |frame| frame.access)
    }

    pub fn set_access(&mut self, access: Access) {
        if let Some(frame) = &mut self.class {
            frame.access = access;
        }
    }

    /// The members of the innermost class, or of the active namespace.
    pub fn members_mut(&mut self) -> &mut Members {
        match &mut self.class {
            Some(frame) => &mut frame.class.members,
            None => &mut self.namespace.members,
        }
    }

    pub fn members(&self) -> &Members {
        match &self.class {
            Some(frame) => &frame.class.members,
            None => &self.namespace.members,
        }
    }

    // ==========================================================================
    // Templates
    // ==========================================================================

    pub fn push_template(&mut self) {
        self.stats.template_pushes += 1;
        let frame = TemplateFrame {
            info: TemplateInfo::default(),
            taken: false,
        };
        let outer = self.template.replace(frame);
        self.templates.push(outer);
    }

    /// Close the active template, returning it unless a declaration already
    /// took it.
    pub fn pop_template(&mut self) -> Option<TemplateInfo> {
        let outer = self.templates.pop()?;
        self.stats.template_pops += 1;
        std::mem::replace(&mut self.template, outer)
            .filter(|frame| !frame.taken)
            .map(|frame| frame.info)
    }

    pub fn template_mut(&mut self) -> Option<&mut TemplateInfo> {
        self.template.as_mut().map(|frame| &mut frame.info)
    }

    /// Hand the template under construction to the declaration it belongs
    /// to. Only the first caller gets it; its parameters stay visible until
    /// the template is popped.
    pub fn take_template(&mut self) -> Option<TemplateInfo> {
        let frame = self.template.as_mut().filter(|frame| !frame.taken)?;
        frame.taken = true;
        Some(frame.info.clone())
    }

    /// Whether `name` is a parameter of any enclosing template.
    pub fn is_template_parameter(&self, name: &str) -> bool {
        self.template
            .iter()
            .chain(self.templates.iter().flatten())
            .any(|frame| frame.info.parameter(name).is_some())
    }

    // ==========================================================================
    // Functions
    // ==========================================================================

    /// Enter a parameter list: save and clear the declaration state.
    pub fn push_function(&mut self) {
        self.stats.function_pushes += 1;
        let outer = std::mem::take(&mut self.decl);
        self.functions.push(outer);
    }

    pub fn pop_function(&mut self) {
        if let Some(outer) = self.functions.pop() {
            self.stats.function_pops += 1;
            self.decl = outer;
        }
    }

    pub fn decl(&self) -> &DeclState {
        &self.decl
    }

    pub fn decl_mut(&mut self) -> &mut DeclState {
        &mut self.decl
    }

    pub fn function_depth(&self) -> usize {
        self.functions.len()
    }
}

impl Default for ScopeStacks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxxdecl_core::{BaseType, ClassKind, ValueInfo};

    #[test]
    fn namespaces_nest_into_parent() {
        let mut scopes = ScopeStacks::new();
        scopes.push_namespace(NamespaceInfo::new(Some("outer".into())));
        scopes.push_namespace(NamespaceInfo::new(Some("inner".into())));
        scopes.pop_namespace();
        scopes.pop_namespace();

        let global = scopes.into_global();
        assert_eq!(global.namespaces.len(), 1);
        assert_eq!(global.namespaces[0].namespaces[0].name.as_deref(), Some("inner"));
    }

    #[test]
    fn class_access_is_restored_on_pop() {
        let mut scopes = ScopeStacks::new();
        scopes.push_class(ClassInfo::new("Outer".into(), ClassKind::Class));
        assert_eq!(scopes.access(), Access::Private);
        scopes.set_access(Access::Protected);

        scopes.push_class(ClassInfo::new("Inner".into(), ClassKind::Struct));
        assert_eq!(scopes.access(), Access::Public);
        let inner = scopes.pop_class().unwrap();
        assert_eq!(inner.name.as_ref(), "Inner");

        assert_eq!(scopes.access(), Access::Protected);
        scopes.pop_class();
        assert_eq!(scopes.access(), Access::Public);
        assert!(scopes.stats().is_balanced());
    }

    #[test]
    fn members_follow_innermost_scope() {
        let mut scopes = ScopeStacks::new();
        scopes.push_class(ClassInfo::new("Point".into(), ClassKind::Struct));
        scopes
            .members_mut()
            .add_variable(ValueInfo::named("x".into(), TypeCode::from_base(BaseType::Double)));
        let point = scopes.pop_class().unwrap();
        assert_eq!(point.members.variables.len(), 1);
        assert!(scopes.members().is_empty());
    }

    #[test]
    fn template_parameters_visible_from_nested_templates() {
        let mut scopes = ScopeStacks::new();
        scopes.push_template();
        if let Some(template) = scopes.template_mut() {
            template
                .parameters
                .push(ValueInfo::named("T".into(), TypeCode::from_base(BaseType::TypeName)));
        }
        scopes.push_template();
        assert!(scopes.is_template_parameter("T"));
        assert!(scopes.pop_template().is_some());
        let outer = scopes.take_template();
        assert_eq!(outer.map(|t| t.parameters.len()), Some(1));
        assert!(scopes.take_template().is_none());
        assert!(scopes.is_template_parameter("T"));
        assert!(scopes.pop_template().is_none());
        assert!(!scopes.is_template_parameter("T"));
    }

    #[test]
    fn function_scope_saves_declaration_state() {
        let mut scopes = ScopeStacks::new();
        scopes.decl_mut().name = Some("callback".into());
        scopes.decl_mut().ty = TypeCode::from_base(BaseType::Function);

        scopes.push_function();
        assert!(scopes.decl().name.is_none());
        assert_eq!(scopes.decl().ty, TypeCode::NONE);
        scopes.decl_mut().name = Some("x".into());
        scopes.pop_function();

        assert_eq!(scopes.decl().name.as_deref(), Some("callback"));
        assert_eq!(scopes.function_depth(), 0);
    }

    #[test]
    fn unbalanced_pops_are_ignored() {
        let mut scopes = ScopeStacks::new();
        scopes.pop_namespace();
        assert!(scopes.pop_class().is_none());
        scopes.pop_function();
        assert_eq!(scopes.stats(), ScopeStats::default());
    }
}
