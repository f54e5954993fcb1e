use cxxdecl_core::{BaseType, EnumInfo, Symbol, TypeCode, ValueFlags, ValueInfo, parse_integer_literal};
use cxxdecl_parser::ast::EnumDecl;

use super::AssemblyContext;
use crate::error::BuildError;
use crate::signature::expression_text;

const OPERATOR_CHARS: &[char] = &['+', '-', '*', '/', '%', '<', '>', '&', '|', '^', '~', '!', '?', ':'];

/// A signed integer literal, as enumerator values may be written.
fn signed_literal(text: &str) -> Option<i128> {
    match text.strip_prefix('-') {
        Some(rest) => parse_integer_literal(rest).map(|n| -i128::from(n)),
        None => parse_integer_literal(text).map(i128::from),
    }
}

/// The implicit value of an enumerator following one valued `previous`.
///
/// Literal values are incremented (`10` gives `11`, `B + 2` gives
/// `B + 3`); anything else becomes a deferred `previous + 1`.
pub(super) fn next_enum_value(previous: Option<&str>) -> String {
    let Some(previous) = previous else {
        return "0".to_string();
    };
    if let Some(n) = signed_literal(previous) {
        return (n + 1).to_string();
    }
    if let Some((head, tail)) = previous.rsplit_once(" + ")
        && !head.is_empty()
        && let Some(n) = parse_integer_literal(tail)
    {
        return format!("{head} + {}", u128::from(n) + 1);
    }
    if previous.contains(OPERATOR_CHARS) {
        format!("({previous}) + 1")
    } else {
        format!("{previous} + 1")
    }
}

fn append_comment(slot: &mut Option<String>, text: String) {
    match slot {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(&text);
        }
        None => *slot = Some(text),
    }
}

impl<'ast> AssemblyContext<'ast> {
    /// Record an enum and return its name, `""` when anonymous.
    pub(super) fn visit_enum(&mut self, decl: &'ast EnumDecl<'ast>) -> Result<Symbol, BuildError> {
        let simple = decl.name.map_or("", |name| name.simple_name());
        let name = self.intern(simple);
        self.register_type(simple, BaseType::Object);

        let Some(enumerators) = decl.enumerators else {
            tracing::trace!(name = simple, "opaque enum declaration");
            return Ok(name);
        };

        let mut attributes = self.attributes.validate(decl.attributes, false)?;
        if let Some(pending) = self.pending_attributes.take() {
            attributes.merge(pending);
        }

        let mut info = EnumInfo {
            name: (!simple.is_empty()).then(|| name.clone()),
            is_scoped: decl.is_scoped,
            access: self.scopes.access(),
            comment: self.take_comment(),
            ..EnumInfo::default()
        };
        if let Some(underlying) = decl.underlying {
            let (derived, text) = self.type_id(underlying)?;
            info.underlying = Some(self.intern(&text));
            info.underlying_type = derived.ty;
        }
        attributes.apply_to_enum(&mut info);

        let mut previous: Option<String> = None;
        for enumerator in enumerators {
            let leading = self.comments.leading(enumerator.extent.start);
            if !leading.trailing.is_empty()
                && let Some(last) = info.constants.last_mut()
            {
                append_comment(&mut last.comment, leading.trailing.join("\n"));
            }

            let text = match enumerator.value {
                Some(tokens) => expression_text(tokens),
                None => next_enum_value(previous.as_deref()),
            };
            let mut constant = ValueInfo::named(
                self.intern(enumerator.name.lexeme),
                TypeCode::from_base(BaseType::Int),
            );
            constant.value = Some(text.clone());
            constant.flags |= ValueFlags::ENUM_CONSTANT;
            constant.access = info.access;
            constant.comment = leading.comment;
            self.attributes
                .validate(enumerator.attributes, false)?
                .apply_to_value(&mut constant)?;
            if let Some(trailing) = self.comments.trailing(enumerator.extent.end) {
                append_comment(&mut constant.comment, trailing);
            }

            previous = Some(text);
            info.constants.push(constant);
        }

        let stray = self.comments.close_scope(decl.extent.end);
        if !stray.is_empty()
            && let Some(last) = info.constants.last_mut()
        {
            append_comment(&mut last.comment, stray.join("\n"));
        }

        let members = self.scopes.members_mut();
        if !info.is_scoped {
            for constant in &info.constants {
                members.add_constant(constant.clone());
            }
        }
        tracing::debug!(name = simple, constants = info.constants.len(), "recorded enum");
        members.add_enum(info);
        self.stats.enums += 1;
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implicit_values_follow_literals() {
        assert_eq!(next_enum_value(None), "0");
        assert_eq!(next_enum_value(Some("0")), "1");
        assert_eq!(next_enum_value(Some("10")), "11");
        assert_eq!(next_enum_value(Some("0x10")), "17");
        assert_eq!(next_enum_value(Some("-1")), "0");
    }

    #[test]
    fn implicit_values_after_expressions_are_deferred() {
        assert_eq!(next_enum_value(Some("B")), "B + 1");
        assert_eq!(next_enum_value(Some("B + 1")), "B + 2");
        assert_eq!(next_enum_value(Some("A | B")), "(A | B) + 1");
        assert_eq!(next_enum_value(Some("(A | B) + 1")), "(A | B) + 2");
    }
}
