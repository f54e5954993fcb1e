//! Hints files.
//!
//! A hints file supplies array sizes the header cannot express, for
//! functions that return pointers to a fixed number of elements:
//!
//! ```text
//! # class     function     type    size
//! vtkCamera   GetPosition  0x315   3
//! ```
//!
//! The type is the return value's type code, with specifiers masked, in
//! hexadecimal.

use cxxdecl_core::{ClassInfo, FileInfo, Members, NamespaceInfo};

use crate::error::HintsError;

/// One line of a hints file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub class_name: String,
    pub function_name: String,
    pub type_bits: u64,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hints {
    entries: Vec<Hint>,
}

impl Hints {
    pub fn parse(text: &str) -> Result<Hints, HintsError> {
        let mut entries = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let content = raw.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }
            let fields: Vec<&str> = content.split_whitespace().collect();
            let [class_name, function_name, tag, size] = fields[..] else {
                return Err(HintsError::Malformed {
                    line,
                    text: raw.trim().to_string(),
                });
            };
            let digits = tag.strip_prefix("0x").or_else(|| tag.strip_prefix("0X")).unwrap_or(tag);
            let type_bits = u64::from_str_radix(digits, 16).map_err(|_| HintsError::InvalidNumber {
                line,
                field: "type",
                value: tag.to_string(),
            })?;
            let size = size.parse().map_err(|_| HintsError::InvalidNumber {
                line,
                field: "size",
                value: size.to_string(),
            })?;
            entries.push(Hint {
                class_name: class_name.to_string(),
                function_name: function_name.to_string(),
                type_bits,
                size,
            });
        }
        Ok(Hints { entries })
    }

    pub fn entries(&self) -> &[Hint] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Set return value counts on every method a hint matches. Returns how
    /// many functions were updated.
    pub fn apply(&self, file: &mut FileInfo) -> usize {
        if self.entries.is_empty() {
            return 0;
        }
        let applied = self.apply_namespace(&mut file.contents);
        tracing::debug!(applied, "applied hints");
        applied
    }

    fn apply_namespace(&self, namespace: &mut NamespaceInfo) -> usize {
        let mut applied = self.apply_members(&mut namespace.members);
        for inner in &mut namespace.namespaces {
            applied += self.apply_namespace(inner);
        }
        applied
    }

    fn apply_members(&self, members: &mut Members) -> usize {
        members.classes.iter_mut().map(|class| self.apply_class(class)).sum()
    }

    fn apply_class(&self, class: &mut ClassInfo) -> usize {
        let mut applied = 0;
        for hint in self.entries.iter().filter(|hint| hint.class_name == class.name.as_ref()) {
            for function in &mut class.members.functions {
                if function.name.as_ref() != hint.function_name {
                    continue;
                }
                let Some(value) = &mut function.return_value else {
                    continue;
                };
                if value.ty.without_specifiers().bits() == hint.type_bits {
                    value.count = hint.size;
                    value.count_hint = Some(hint.size.to_string());
                    applied += 1;
                }
            }
        }
        applied + self.apply_members(&mut class.members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxxdecl_core::{
        BaseType, ClassKind, FunctionInfo, Indirection, Specifiers, TypeCode, ValueInfo, add_indirection,
    };

    fn double_pointer() -> TypeCode {
        add_indirection(
            TypeCode::from_base(BaseType::Double),
            TypeCode::from_indirection(Indirection::Pointer),
        )
        .unwrap()
    }

    fn camera_file(return_type: TypeCode) -> FileInfo {
        let mut method = FunctionInfo::new("GetPosition".into());
        method.return_value = Some(ValueInfo::new(return_type));
        let mut class = ClassInfo::new("Camera".into(), ClassKind::Class);
        class.members.add_function(method);
        let mut namespace = NamespaceInfo::new(Some("scene".into()));
        namespace.members.add_class(class);
        let mut file = FileInfo::new(None);
        file.contents.add_namespace(namespace);
        file
    }

    #[test]
    fn parses_entries_and_skips_comments() {
        let text = format!(
            "# sizes\n\nCamera GetPosition {:#x} 3  # xyz\nCamera GetFocalPoint 0x{:X} 3\n",
            double_pointer().bits(),
            double_pointer().bits()
        );
        let hints = Hints::parse(&text).unwrap();
        assert_eq!(hints.entries().len(), 2);
        assert_eq!(hints.entries()[0].type_bits, double_pointer().bits());
        assert_eq!(hints.entries()[1].size, 3);
    }

    #[test]
    fn matching_hint_sets_return_count() {
        let static_return = double_pointer().with_specifiers(Specifiers::STATIC);
        let mut file = camera_file(static_return);
        let hints = Hints::parse(&format!("Camera GetPosition {:#x} 3", double_pointer().bits())).unwrap();
        assert_eq!(hints.apply(&mut file), 1);

        let camera = &file.contents.namespaces[0].members.classes[0];
        let value = camera.members.functions[0].return_value.as_ref().unwrap();
        assert_eq!(value.count, 3);
        assert_eq!(value.count_hint.as_deref(), Some("3"));
    }

    #[test]
    fn type_mismatch_is_ignored() {
        let mut file = camera_file(TypeCode::from_base(BaseType::Int));
        let hints = Hints::parse(&format!("Camera GetPosition {:#x} 3", double_pointer().bits())).unwrap();
        assert_eq!(hints.apply(&mut file), 0);
    }

    #[test]
    fn malformed_lines_fail_with_line_number() {
        assert_eq!(
            Hints::parse("Camera GetPosition 0x10 3\nCamera GetPosition\n"),
            Err(HintsError::Malformed {
                line: 2,
                text: "Camera GetPosition".into()
            })
        );
        assert!(matches!(
            Hints::parse("Camera GetPosition zz 3"),
            Err(HintsError::InvalidNumber { line: 1, field: "type", .. })
        ));
        assert!(matches!(
            Hints::parse("Camera GetPosition 0x10 three"),
            Err(HintsError::InvalidNumber { field: "size", .. })
        ));
    }
}
