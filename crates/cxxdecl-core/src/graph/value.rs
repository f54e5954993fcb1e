use std::fmt;

use bitflags::bitflags;

use crate::strings::Symbol;
use crate::type_code::TypeCode;

use super::{Access, Deprecation, FunctionInfo};

/// One array dimension: a known size, or an expression to evaluate later.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dimension {
    Literal(u64),
    Expr(String),
}

impl Dimension {
    /// Classify dimension text, reading integer literals with their
    /// prefixes and suffixes.
    pub fn parse(text: &str) -> Dimension {
        match parse_integer_literal(text) {
            Some(value) => Dimension::Literal(value),
            None => Dimension::Expr(text.to_string()),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Literal(n) => write!(f, "{n}"),
            Dimension::Expr(text) => f.write_str(text),
        }
    }
}

/// Read a C++ integer literal (`42`, `0x1F`, `017`, `0b101`, `10u`, `1'000`).
pub fn parse_integer_literal(text: &str) -> Option<u64> {
    let text = text.trim();
    let digits = text.trim_end_matches(['u', 'U', 'l', 'L', 'z', 'Z']);
    let digits: String = digits.chars().filter(|&c| c != '\'').collect();
    if digits.is_empty() || !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let (radix, body) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if let Some(bin) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        (2, bin)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits.as_str())
    };
    u64::from_str_radix(body, radix).ok()
}

bitflags! {
    /// Annotations on a value that binding generators act on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ValueFlags: u16 {
        /// The buffer may be passed without copying.
        const ZERO_COPY = 1 << 0;
        /// The string is a filesystem path.
        const FILE_PATH = 1 << 1;
        /// The returned object is owned by the caller.
        const NEW_INSTANCE = 1 << 2;
        /// Not exposed as a property.
        const PROPERTY_EXCLUDE = 1 << 3;
        const ENUM_CONSTANT = 1 << 4;
    }
}

/// A typed value: parameter, return value, variable, constant, typedef,
/// enumerator or template parameter.
#[derive(Debug, Clone, Default)]
pub struct ValueInfo {
    pub name: Option<Symbol>,
    pub ty: TypeCode,
    /// Name of the class, alias or template parameter the base type refers
    /// to; set exactly when the base type needs one.
    pub class_name: Option<Symbol>,
    pub dimensions: Vec<Dimension>,
    /// Default value or initializer text.
    pub value: Option<String>,
    /// Number of elements: product of the literal dimensions, 0 when there
    /// are none or any dimension is an expression.
    pub count: u64,
    pub count_hint: Option<String>,
    pub is_pack: bool,
    /// Signature of the pointed-to function for function pointer types.
    pub function: Option<Box<FunctionInfo>>,
    /// Parameters of a template template parameter.
    pub template: Option<Box<TemplateInfo>>,
    pub flags: ValueFlags,
    pub access: Access,
    pub bit_width: Option<String>,
    pub deprecation: Option<Deprecation>,
    pub comment: Option<String>,
    pub is_excluded: bool,
}

impl ValueInfo {
    pub fn new(ty: TypeCode) -> Self {
        Self {
            ty,
            ..Self::default()
        }
    }

    pub fn named(name: Symbol, ty: TypeCode) -> Self {
        Self {
            name: Some(name),
            ty,
            ..Self::default()
        }
    }

    /// Replace the dimensions and recompute `count`.
    pub fn set_dimensions(&mut self, dimensions: Vec<Dimension>) {
        self.count = element_count(&dimensions);
        self.dimensions = dimensions;
    }
}

fn element_count(dimensions: &[Dimension]) -> u64 {
    if dimensions.is_empty() {
        return 0;
    }
    dimensions.iter().try_fold(1u64, |acc, dim| match dim {
        Dimension::Literal(n) => acc.checked_mul(*n),
        Dimension::Expr(_) => None,
    })
    .unwrap_or(0)
}

/// The parameter list of a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateInfo {
    pub parameters: Vec<ValueInfo>,
}

impl TemplateInfo {
    pub fn parameter(&self, name: &str) -> Option<&ValueInfo> {
        self.parameters
            .iter()
            .find(|p| p.name.as_deref() == Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_is_product_of_literals() {
        let mut value = ValueInfo::default();
        value.set_dimensions(vec![Dimension::Literal(3), Dimension::Literal(4)]);
        assert_eq!(value.count, 12);

        value.set_dimensions(vec![Dimension::Literal(3), Dimension::Expr("N".into())]);
        assert_eq!(value.count, 0);

        value.set_dimensions(Vec::new());
        assert_eq!(value.count, 0);
    }

    #[test]
    fn dimension_parse_reads_literals() {
        assert_eq!(Dimension::parse("16"), Dimension::Literal(16));
        assert_eq!(Dimension::parse("0x10"), Dimension::Literal(16));
        assert_eq!(Dimension::parse("020"), Dimension::Literal(16));
        assert_eq!(Dimension::parse("16u"), Dimension::Literal(16));
        assert_eq!(Dimension::parse("1'024"), Dimension::Literal(1024));
        assert_eq!(Dimension::parse("N + 1"), Dimension::Expr("N + 1".into()));
        assert_eq!(Dimension::parse("0"), Dimension::Literal(0));
    }

    #[test]
    fn integer_literal_rejects_names() {
        assert_eq!(parse_integer_literal("MAX"), None);
        assert_eq!(parse_integer_literal(""), None);
        assert_eq!(parse_integer_literal("1.5"), None);
    }
}
