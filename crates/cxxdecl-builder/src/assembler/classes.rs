use cxxdecl_core::{
    Access, BaseType, ClassInfo, CvQualifiers, FunctionFlags, FunctionInfo, RefKind, Symbol, TypeCode, ValueInfo,
};
use cxxdecl_parser::ast::ClassDecl;

use super::AssemblyContext;
use super::declarations::constructor_name;
use super::types::{name_text, token_text};
use crate::error::BuildError;

impl<'ast> AssemblyContext<'ast> {
    /// Record a class, struct or union and return its name. Anonymous
    /// records are named `""`; forward declarations only register the name.
    pub(super) fn visit_class(&mut self, decl: &'ast ClassDecl<'ast>) -> Result<Symbol, BuildError> {
        let (text, simple) = match &decl.name {
            Some(name) => {
                let last = name.last();
                let text = match last.template_args {
                    Some(args) => format!("{}<{}>", last.name, token_text(args)),
                    None => last.name.to_string(),
                };
                (text, last.name)
            }
            None => (String::new(), ""),
        };
        let name = self.intern(&text);
        self.register_type(simple, BaseType::Object);

        let Some(items) = decl.members else {
            tracing::trace!(name = %name, "forward declaration");
            return Ok(name);
        };

        let mut attributes = self.attributes.validate(decl.attributes, false)?;
        if let Some(pending) = self.pending_attributes.take() {
            attributes.merge(pending);
        }

        let mut class = ClassInfo::new(name.clone(), decl.kind);
        class.access = self.scopes.access();
        class.is_final = decl.is_final;
        class.template = self.scopes.take_template();
        class.comment = self.take_comment();
        let default_access = decl.kind.default_access();
        for base in decl.bases {
            if base.is_virtual || base.is_pack || base.access.unwrap_or(default_access) != Access::Public {
                continue;
            }
            let base_name = name_text(&base.name);
            class.super_classes.push(self.intern(&base_name));
        }
        attributes.apply_to_class(&mut class);

        let named = !simple.is_empty();
        if named {
            self.path.push(simple.to_string());
        }
        self.scopes.push_class(class);
        let result = self.visit_items(items);
        let stray = self.comments.close_scope(decl.extent.end);
        self.attach_trailing(stray);
        let class = self.scopes.pop_class();
        if named {
            self.path.pop();
        }
        result?;

        if let Some(mut class) = class {
            self.finish_class(&mut class);
            tracing::debug!(
                name = %class.name,
                functions = class.members.functions.len(),
                "recorded class"
            );
            self.scopes.members_mut().add_class(class);
            self.stats.classes += 1;
        }
        Ok(name)
    }

    /// Close a class body: add the special members the class does not
    /// declare and derive the summary flags.
    fn finish_class(&mut self, class: &mut ClassInfo) {
        let functions = &class.members.functions;
        class.is_abstract = functions.iter().any(|f| f.has(FunctionFlags::PURE));
        class.has_delete = functions.iter().any(|f| f.name.as_ref() == "Delete");
        if class.name.is_empty() {
            return;
        }

        let has_constructor = functions.iter().any(FunctionInfo::is_constructor);
        let has_copy = functions.iter().any(|f| f.is_copy_constructor(&class.name));
        let has_destructor = functions.iter().any(FunctionInfo::is_destructor);

        let short = constructor_name(&class.name).to_string();
        let mut implicit = Vec::new();
        if !has_constructor {
            let mut function = self.special_member(class, &short, FunctionFlags::CONSTRUCTOR);
            function.signature = format!("{short}()");
            implicit.push(function);
        }
        if !has_copy {
            let mut function = self.special_member(class, &short, FunctionFlags::CONSTRUCTOR);
            let mut source = ValueInfo::new(
                TypeCode::from_base(BaseType::Object)
                    .with_cv(CvQualifiers::CONST)
                    .with_reference(RefKind::LValue),
            );
            source.class_name = Some(class.name.clone());
            function.parameters.push(source);
            function.signature = format!("{short}(const {} &)", class.name);
            implicit.push(function);
        }
        if !has_destructor {
            let destructor = format!("~{short}");
            let mut function = self.special_member(class, &destructor, FunctionFlags::DESTRUCTOR);
            function.signature = format!("{destructor}()");
            implicit.push(function);
        }

        for function in implicit {
            tracing::trace!(signature = %function.signature, "synthesized special member");
            class.members.add_function(function);
        }
    }

    fn special_member(&mut self, class: &ClassInfo, name: &str, kind: FunctionFlags) -> FunctionInfo {
        let mut function = FunctionInfo::new(self.intern(name));
        function.flags = kind | FunctionFlags::IMPLICIT;
        function.access = Access::Public;
        function.class_name = Some(class.name.clone());
        function
    }
}
