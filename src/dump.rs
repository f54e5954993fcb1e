//! Indented text rendering of a declaration graph.
//!
//! ```text
//! file widgets.h
//!   include base.h
//!   namespace ui
//!     class Button : Widget
//!       public Button(const char *label)
//!         param label: const char *
//!       public void Press() [virtual]
//! ```

use std::fmt;

use cxxdecl_core::{
    ClassInfo, EnumInfo, FileInfo, FunctionFlags, FunctionInfo, ItemKind, Members, NamespaceInfo, TemplateInfo,
    UsingInfo, ValueInfo,
};

const FLAG_NAMES: [(FunctionFlags, &str); 13] = [
    (FunctionFlags::STATIC, "static"),
    (FunctionFlags::VIRTUAL, "virtual"),
    (FunctionFlags::PURE, "pure"),
    (FunctionFlags::CONST, "const"),
    (FunctionFlags::OVERRIDE, "override"),
    (FunctionFlags::FINAL, "final"),
    (FunctionFlags::DELETED, "deleted"),
    (FunctionFlags::DEFAULTED, "defaulted"),
    (FunctionFlags::EXPLICIT, "explicit"),
    (FunctionFlags::NOEXCEPT, "noexcept"),
    (FunctionFlags::IMPLICIT, "implicit"),
    (FunctionFlags::NEW_INSTANCE, "newinstance"),
    (FunctionFlags::UNBLOCK_THREADS, "unblockthreads"),
];

/// Displays a [`FileInfo`] as an indented tree.
pub struct Dump<'a> {
    file: &'a FileInfo,
}

impl<'a> Dump<'a> {
    pub fn new(file: &'a FileInfo) -> Self {
        Self { file }
    }
}

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer { f, depth: 0 }.file(self.file)
    }
}

/// Render a declaration graph as indented text.
pub fn dump(file: &FileInfo) -> String {
    Dump::new(file).to_string()
}

/// A value's type, with the class name in place of its base type.
fn type_text(value: &ValueInfo) -> String {
    if let Some(function) = &value.function
        && !function.signature.is_empty()
    {
        return function.signature.clone();
    }
    let text = value.ty.to_string();
    match &value.class_name {
        Some(class) => text.replacen(value.ty.base().name(), class, 1),
        None => text,
    }
}

struct Printer<'a, 'f> {
    f: &'a mut fmt::Formatter<'f>,
    depth: usize,
}

impl Printer<'_, '_> {
    fn line(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        for _ in 0..self.depth {
            self.f.write_str("  ")?;
        }
        self.f.write_fmt(args)?;
        self.f.write_str("\n")
    }

    fn nested(&mut self, body: impl FnOnce(&mut Self) -> fmt::Result) -> fmt::Result {
        self.depth += 1;
        let result = body(self);
        self.depth -= 1;
        result
    }

    fn comment(&mut self, comment: &Option<String>) -> fmt::Result {
        match comment {
            Some(text) => {
                for line in text.lines() {
                    self.line(format_args!("// {line}"))?;
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn file(&mut self, file: &FileInfo) -> fmt::Result {
        self.line(format_args!("file {}", file.file_name.as_deref().unwrap_or("<input>")))?;
        self.nested(|p| {
            p.comment(&file.description)?;
            for include in &file.includes {
                p.line(format_args!("include {include}"))?;
            }
            for info in &file.macros {
                p.comment(&info.comment)?;
                match &info.parameters {
                    Some(params) => {
                        let params: Vec<&str> = params.iter().map(|p| p.as_ref()).collect();
                        p.line(format_args!("macro {}({}) {}", info.name, params.join(", "), info.definition))?;
                    }
                    None => p.line(format_args!("macro {} {}", info.name, info.definition))?,
                }
            }
            p.members(&file.contents.members, &file.contents.namespaces)?;
            for diagnostic in &file.diagnostics {
                p.line(format_args!("diagnostic: {diagnostic}"))?;
            }
            Ok(())
        })
    }

    fn namespace(&mut self, namespace: &NamespaceInfo) -> fmt::Result {
        self.comment(&namespace.comment)?;
        let inline = if namespace.is_inline { "inline " } else { "" };
        let name = namespace.name.as_deref().unwrap_or("<anonymous>");
        self.line(format_args!("{inline}namespace {name}"))?;
        self.nested(|p| p.members(&namespace.members, &namespace.namespaces))
    }

    fn members(&mut self, members: &Members, namespaces: &[NamespaceInfo]) -> fmt::Result {
        for item in &members.items {
            let i = item.index;
            match item.kind {
                ItemKind::Namespace => namespaces.get(i).map_or(Ok(()), |ns| self.namespace(ns))?,
                ItemKind::Class => members.classes.get(i).map_or(Ok(()), |class| self.class(class))?,
                ItemKind::Function => members.functions.get(i).map_or(Ok(()), |function| self.function(function))?,
                ItemKind::Variable => members.variables.get(i).map_or(Ok(()), |value| self.value("variable", value))?,
                ItemKind::Constant => members.constants.get(i).map_or(Ok(()), |value| self.value("constant", value))?,
                ItemKind::Enum => members.enums.get(i).map_or(Ok(()), |enumeration| self.enumeration(enumeration))?,
                ItemKind::Typedef => members.typedefs.get(i).map_or(Ok(()), |value| self.value("typedef", value))?,
                ItemKind::Using => members.usings.get(i).map_or(Ok(()), |using| self.using(using))?,
            }
        }
        Ok(())
    }

    fn template(&mut self, template: &Option<TemplateInfo>) -> fmt::Result {
        let Some(template) = template else {
            return Ok(());
        };
        let params: Vec<String> = template
            .parameters
            .iter()
            .map(|param| {
                let name = param.name.as_deref().unwrap_or("");
                match &param.value {
                    Some(default) => format!("{} {name} = {default}", type_text(param)),
                    None => format!("{} {name}", type_text(param)),
                }
            })
            .collect();
        self.line(format_args!("template <{}>", params.join(", ")))
    }

    fn class(&mut self, class: &ClassInfo) -> fmt::Result {
        self.comment(&class.comment)?;
        self.template(&class.template)?;
        let mut head = format!("{} {} {}", class.access, class.kind.keyword(), class.name);
        if !class.super_classes.is_empty() {
            let bases: Vec<&str> = class.super_classes.iter().map(|b| b.as_ref()).collect();
            head.push_str(" : ");
            head.push_str(&bases.join(", "));
        }
        for (set, label) in [
            (class.is_final, " final"),
            (class.is_abstract, " abstract"),
            (class.is_excluded, " excluded"),
        ] {
            if set {
                head.push_str(label);
            }
        }
        self.line(format_args!("{head}"))?;
        self.nested(|p| p.members(&class.members, &[]))
    }

    fn function(&mut self, function: &FunctionInfo) -> fmt::Result {
        self.comment(&function.comment)?;
        self.template(&function.template)?;
        let flags: Vec<&str> = FLAG_NAMES
            .iter()
            .filter(|(flag, _)| function.has(*flag))
            .map(|(_, name)| *name)
            .collect();
        if flags.is_empty() {
            self.line(format_args!("{} {}", function.access, function.signature))?;
        } else {
            self.line(format_args!("{} {} [{}]", function.access, function.signature, flags.join(", ")))?;
        }
        self.nested(|p| {
            for param in &function.parameters {
                let name = param.name.as_deref().unwrap_or("_");
                match &param.value {
                    Some(default) => p.line(format_args!("param {name}: {} = {default}", type_text(param)))?,
                    None => p.line(format_args!("param {name}: {}", type_text(param)))?,
                }
            }
            if let Some(value) = &function.return_value {
                p.line(format_args!("returns {}", type_text(value)))?;
            }
            for condition in &function.preconditions {
                p.line(format_args!("expects {condition}"))?;
            }
            Ok(())
        })
    }

    fn value(&mut self, kind: &str, value: &ValueInfo) -> fmt::Result {
        self.comment(&value.comment)?;
        let name = value.name.as_deref().unwrap_or("_");
        let mut text = format!("{} {kind} {name}: {}", value.access, type_text(value));
        for dimension in &value.dimensions {
            text.push_str(&format!("[{dimension}]"));
        }
        if let Some(width) = &value.bit_width {
            text.push_str(&format!(" : {width}"));
        }
        if let Some(initial) = &value.value {
            text.push_str(&format!(" = {initial}"));
        }
        self.line(format_args!("{text}"))
    }

    fn enumeration(&mut self, enumeration: &EnumInfo) -> fmt::Result {
        self.comment(&enumeration.comment)?;
        let keyword = if enumeration.is_scoped { "enum class" } else { "enum" };
        let name = enumeration.name.as_deref().unwrap_or("<anonymous>");
        match &enumeration.underlying {
            Some(underlying) => self.line(format_args!("{} {keyword} {name} : {underlying}", enumeration.access))?,
            None => self.line(format_args!("{} {keyword} {name}", enumeration.access))?,
        }
        self.nested(|p| {
            for constant in &enumeration.constants {
                p.comment(&constant.comment)?;
                let name = constant.name.as_deref().unwrap_or("_");
                p.line(format_args!("{name} = {}", constant.value.as_deref().unwrap_or("")))?;
            }
            Ok(())
        })
    }

    fn using(&mut self, using: &UsingInfo) -> fmt::Result {
        self.comment(&using.comment)?;
        match (&using.name, using.is_namespace) {
            (None, _) => self.line(format_args!("using namespace {}", using.scope)),
            (Some(name), true) => self.line(format_args!("namespace {name} = {}", using.scope)),
            (Some(name), false) => self.line(format_args!("using {}::{name}", using.scope)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxxdecl_core::{Access, BaseType, ClassKind, Indirection, TypeCode, add_indirection};

    #[test]
    fn renders_nested_scopes_in_declaration_order() {
        let mut method = FunctionInfo::new("Press".into());
        method.signature = "void Press()".into();
        method.access = Access::Public;
        method.flags = FunctionFlags::VIRTUAL;
        method.return_value = Some(ValueInfo::new(TypeCode::from_base(BaseType::Void)));

        let mut class = ClassInfo::new("Button".into(), ClassKind::Class);
        class.super_classes.push("Widget".into());
        class.members.add_function(method);

        let mut namespace = NamespaceInfo::new(Some("ui".into()));
        namespace.members.add_class(class);
        let mut file = FileInfo::new(Some("widgets.h".into()));
        file.includes.push("base.h".into());
        file.contents.add_namespace(namespace);

        let expected = "\
file widgets.h
  include base.h
  namespace ui
    public class Button : Widget
      public void Press() [virtual]
        returns void
";
        assert_eq!(dump(&file), expected);
    }

    #[test]
    fn class_names_replace_base_types() {
        let ty = add_indirection(
            TypeCode::from_base(BaseType::Object),
            TypeCode::from_indirection(Indirection::Pointer),
        )
        .unwrap();
        let mut value = ValueInfo::named("widget".into(), ty);
        value.class_name = Some("Widget".into());
        assert_eq!(type_text(&value), "Widget *");
    }
}
