//! Compact type encoding for declared values.
//!
//! A [`TypeCode`] packs everything a binding generator needs to know about a
//! declared type into one `u64`:
//!
//! ```text
//!  bits  0..=7   base type (BaseType)
//!  bits  8..=9   reference kind (none, &, &&)
//!  bits 10..=23  indirection chain, 7 levels x 2 bits, outermost level first
//!  bit  25       const
//!  bit  26       volatile
//!  bits 32..=47  storage and function specifiers (Specifiers)
//! ```
//!
//! The chain never wraps: composing past [`MAX_INDIRECTION`] levels is an
//! error. [`TypeDesc`] is the equivalent tagged view, and
//! [`TypeCode::encode`] / [`TypeCode::decode`] convert between the two.

use std::fmt;

use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::TypeError;

/// Number of indirection levels a [`TypeCode`] can hold.
pub const MAX_INDIRECTION: usize = 7;

const BASE_MASK: u64 = 0xFF;
const REF_SHIFT: u32 = 8;
const REF_MASK: u64 = 0b11 << REF_SHIFT;
const CHAIN_SHIFT: u32 = 10;
const CHAIN_MASK: u64 = 0x3FFF << CHAIN_SHIFT;
const CONST_BIT: u64 = 1 << 25;
const VOLATILE_BIT: u64 = 1 << 26;
const SPECIFIER_SHIFT: u32 = 32;
const SPECIFIER_MASK: u64 = 0xFFFF << SPECIFIER_SHIFT;

// ============================================================================
// Base types
// ============================================================================

/// The fundamental type at the bottom of an indirection chain.
///
/// `Signed` and `Unsigned` are fragments: they exist only while specifiers
/// are being combined and are resolved with [`BaseType::resolved`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum BaseType {
    #[default]
    None = 0,
    Void,
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    WChar,
    Char8,
    Char16,
    Char32,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Int64,
    UnsignedInt64,
    Float,
    Double,
    LongDouble,
    SizeT,
    SSizeT,
    String,
    Nullptr,
    Object,
    Typedef,
    Function,
    Auto,
    TypeName,
    Unknown,
    Signed = 0xF0,
    Unsigned = 0xF1,
}

impl BaseType {
    /// Every base type a finished declaration can carry.
    pub const ALL: [BaseType; 32] = [
        BaseType::Void,
        BaseType::Bool,
        BaseType::Char,
        BaseType::SignedChar,
        BaseType::UnsignedChar,
        BaseType::WChar,
        BaseType::Char8,
        BaseType::Char16,
        BaseType::Char32,
        BaseType::Short,
        BaseType::UnsignedShort,
        BaseType::Int,
        BaseType::UnsignedInt,
        BaseType::Long,
        BaseType::UnsignedLong,
        BaseType::LongLong,
        BaseType::UnsignedLongLong,
        BaseType::Int64,
        BaseType::UnsignedInt64,
        BaseType::Float,
        BaseType::Double,
        BaseType::LongDouble,
        BaseType::SizeT,
        BaseType::SSizeT,
        BaseType::String,
        BaseType::Nullptr,
        BaseType::Object,
        BaseType::Typedef,
        BaseType::Function,
        BaseType::Auto,
        BaseType::TypeName,
        BaseType::Unknown,
    ];

    /// Map a built-in type keyword to its base type fragment.
    pub fn from_keyword(keyword: &str) -> Option<BaseType> {
        Some(match keyword {
            "void" => BaseType::Void,
            "bool" => BaseType::Bool,
            "char" => BaseType::Char,
            "wchar_t" => BaseType::WChar,
            "char8_t" => BaseType::Char8,
            "char16_t" => BaseType::Char16,
            "char32_t" => BaseType::Char32,
            "short" => BaseType::Short,
            "int" => BaseType::Int,
            "long" => BaseType::Long,
            "__int64" => BaseType::Int64,
            "float" => BaseType::Float,
            "double" => BaseType::Double,
            "signed" => BaseType::Signed,
            "unsigned" => BaseType::Unsigned,
            "auto" => BaseType::Auto,
            _ => return None,
        })
    }

    /// Map a well-known library type name to a dedicated base type.
    pub fn from_library_name(name: &str) -> Option<BaseType> {
        Some(match name {
            "size_t" | "std::size_t" => BaseType::SizeT,
            "ssize_t" => BaseType::SSizeT,
            "std::string" => BaseType::String,
            "std::nullptr_t" | "nullptr_t" => BaseType::Nullptr,
            _ => return None,
        })
    }

    /// Resolve a lone sign fragment to the integer type it implies.
    pub fn resolved(self) -> BaseType {
        match self {
            BaseType::Signed => BaseType::Int,
            BaseType::Unsigned => BaseType::UnsignedInt,
            other => other,
        }
    }

    /// Whether a value of this type records the name of its class or alias.
    pub fn needs_class_name(self) -> bool {
        matches!(
            self,
            BaseType::Object | BaseType::Typedef | BaseType::Unknown | BaseType::TypeName
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            BaseType::None => "",
            BaseType::Void => "void",
            BaseType::Bool => "bool",
            BaseType::Char => "char",
            BaseType::SignedChar => "signed char",
            BaseType::UnsignedChar => "unsigned char",
            BaseType::WChar => "wchar_t",
            BaseType::Char8 => "char8_t",
            BaseType::Char16 => "char16_t",
            BaseType::Char32 => "char32_t",
            BaseType::Short => "short",
            BaseType::UnsignedShort => "unsigned short",
            BaseType::Int => "int",
            BaseType::UnsignedInt => "unsigned int",
            BaseType::Long => "long",
            BaseType::UnsignedLong => "unsigned long",
            BaseType::LongLong => "long long",
            BaseType::UnsignedLongLong => "unsigned long long",
            BaseType::Int64 => "__int64",
            BaseType::UnsignedInt64 => "unsigned __int64",
            BaseType::Float => "float",
            BaseType::Double => "double",
            BaseType::LongDouble => "long double",
            BaseType::SizeT => "size_t",
            BaseType::SSizeT => "ssize_t",
            BaseType::String => "std::string",
            BaseType::Nullptr => "std::nullptr_t",
            BaseType::Object => "object",
            BaseType::Typedef => "typedef",
            BaseType::Function => "function",
            BaseType::Auto => "auto",
            BaseType::TypeName => "typename",
            BaseType::Unknown => "unknown",
            BaseType::Signed => "signed",
            BaseType::Unsigned => "unsigned",
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Sign {
    #[default]
    Unspecified,
    Signed,
    Unsigned,
}

/// A base type split into the keywords that make it up.
#[derive(Debug, Clone, Copy, Default)]
struct BaseParts {
    sign: Sign,
    short: bool,
    longs: u8,
    core: Option<BaseType>,
}

impl BaseParts {
    fn of(base: BaseType) -> BaseParts {
        let parts = |sign, short, longs, core| BaseParts {
            sign,
            short,
            longs,
            core,
        };
        match base {
            BaseType::None => BaseParts::default(),
            BaseType::Signed => parts(Sign::Signed, false, 0, None),
            BaseType::Unsigned => parts(Sign::Unsigned, false, 0, None),
            BaseType::Short => parts(Sign::Unspecified, true, 0, None),
            BaseType::UnsignedShort => parts(Sign::Unsigned, true, 0, None),
            BaseType::Int => parts(Sign::Unspecified, false, 0, Some(BaseType::Int)),
            BaseType::UnsignedInt => parts(Sign::Unsigned, false, 0, Some(BaseType::Int)),
            BaseType::Long => parts(Sign::Unspecified, false, 1, None),
            BaseType::UnsignedLong => parts(Sign::Unsigned, false, 1, None),
            BaseType::LongLong => parts(Sign::Unspecified, false, 2, None),
            BaseType::UnsignedLongLong => parts(Sign::Unsigned, false, 2, None),
            BaseType::SignedChar => parts(Sign::Signed, false, 0, Some(BaseType::Char)),
            BaseType::UnsignedChar => parts(Sign::Unsigned, false, 0, Some(BaseType::Char)),
            BaseType::LongDouble => parts(Sign::Unspecified, false, 1, Some(BaseType::Double)),
            BaseType::UnsignedInt64 => parts(Sign::Unsigned, false, 0, Some(BaseType::Int64)),
            other => parts(Sign::Unspecified, false, 0, Some(other)),
        }
    }

    fn merge(self, other: BaseParts) -> Option<BaseParts> {
        let sign = match (self.sign, other.sign) {
            (Sign::Unspecified, sign) | (sign, Sign::Unspecified) => sign,
            _ => return None,
        };
        if self.short && other.short {
            return None;
        }
        let core = match (self.core, other.core) {
            (Some(_), Some(_)) => return None,
            (core, None) | (None, core) => core,
        };
        Some(BaseParts {
            sign,
            short: self.short || other.short,
            longs: self.longs + other.longs,
            core,
        })
    }

    /// Rebuild a base type; `None` when the keywords do not form one.
    fn compose(self) -> Result<Option<BaseType>, TypeError> {
        let modified = self.sign != Sign::Unspecified || self.short || self.longs > 0;
        let unsigned = self.sign == Sign::Unsigned;
        let base = match self.core {
            None | Some(BaseType::Int) => {
                if self.short && self.longs > 0 {
                    return Ok(None);
                }
                match (self.short, self.longs) {
                    (true, _) if unsigned => BaseType::UnsignedShort,
                    (true, _) => BaseType::Short,
                    (false, 1) if unsigned => BaseType::UnsignedLong,
                    (false, 1) => BaseType::Long,
                    (false, 2) if unsigned => BaseType::UnsignedLongLong,
                    (false, 2) => BaseType::LongLong,
                    (false, 0) => match (self.core, self.sign) {
                        (Some(_), Sign::Unsigned) => BaseType::UnsignedInt,
                        (Some(_), _) => BaseType::Int,
                        (None, Sign::Unsigned) => BaseType::Unsigned,
                        (None, Sign::Signed) => BaseType::Signed,
                        (None, Sign::Unspecified) => BaseType::None,
                    },
                    _ => return Err(TypeError::TooManyLongs),
                }
            }
            Some(BaseType::Char) => {
                if self.short || self.longs > 0 {
                    return Ok(None);
                }
                match self.sign {
                    Sign::Unspecified => BaseType::Char,
                    Sign::Signed => BaseType::SignedChar,
                    Sign::Unsigned => BaseType::UnsignedChar,
                }
            }
            Some(BaseType::Double) => match (self.sign, self.short, self.longs) {
                (Sign::Unspecified, false, 0) => BaseType::Double,
                (Sign::Unspecified, false, 1) => BaseType::LongDouble,
                _ => return Ok(None),
            },
            Some(BaseType::Int64) => {
                if self.short || self.longs > 0 {
                    return Ok(None);
                }
                if unsigned {
                    BaseType::UnsignedInt64
                } else {
                    BaseType::Int64
                }
            }
            Some(other) => {
                if modified {
                    return Ok(None);
                }
                other
            }
        };
        Ok(Some(base))
    }
}

/// Merge two base type fragments the way C++ combines type keywords.
///
/// The result does not depend on the order the keywords were written in.
pub fn merge_base(first: BaseType, second: BaseType) -> Result<BaseType, TypeError> {
    let incompatible = TypeError::IncompatibleBase { first, second };
    let merged = BaseParts::of(first)
        .merge(BaseParts::of(second))
        .ok_or(incompatible)?;
    merged.compose()?.ok_or(incompatible)
}

// ============================================================================
// Qualifiers and specifiers
// ============================================================================

bitflags! {
    /// cv-qualifiers applied to the base type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CvQualifiers: u8 {
        const CONST = 1 << 0;
        const VOLATILE = 1 << 1;
    }
}

bitflags! {
    /// Storage-class and function specifiers written before a declarator.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Specifiers: u16 {
        const STATIC = 1 << 0;
        const EXTERN = 1 << 1;
        const MUTABLE = 1 << 2;
        const THREAD_LOCAL = 1 << 3;
        const REGISTER = 1 << 4;
        const TYPEDEF = 1 << 5;
        const INLINE = 1 << 6;
        const VIRTUAL = 1 << 7;
        const EXPLICIT = 1 << 8;
        const CONSTEXPR = 1 << 9;
        const FRIEND = 1 << 10;
    }
}

impl Specifiers {
    pub fn from_keyword(keyword: &str) -> Option<Specifiers> {
        Some(match keyword {
            "static" => Specifiers::STATIC,
            "extern" => Specifiers::EXTERN,
            "mutable" => Specifiers::MUTABLE,
            "thread_local" => Specifiers::THREAD_LOCAL,
            "register" => Specifiers::REGISTER,
            "typedef" => Specifiers::TYPEDEF,
            "inline" => Specifiers::INLINE,
            "virtual" => Specifiers::VIRTUAL,
            "explicit" => Specifiers::EXPLICIT,
            "constexpr" | "consteval" | "constinit" => Specifiers::CONSTEXPR,
            "friend" => Specifiers::FRIEND,
            _ => return None,
        })
    }
}

/// One level of an indirection chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Indirection {
    Pointer = 1,
    ConstPointer = 2,
    Array = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RefKind {
    #[default]
    None,
    LValue,
    RValue,
}

// ============================================================================
// TypeCode
// ============================================================================

/// The packed encoding of a declared type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeCode(u64);

impl TypeCode {
    pub const NONE: TypeCode = TypeCode(0);

    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        TypeCode(bits)
    }

    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    pub fn from_base(base: BaseType) -> Self {
        TypeCode(u8::from(base) as u64)
    }

    /// A code holding only the given cv-qualifiers.
    pub fn from_cv(cv: CvQualifiers) -> Self {
        TypeCode::NONE.with_cv(cv)
    }

    /// A code holding only the given specifiers.
    pub fn from_specifiers(specifiers: Specifiers) -> Self {
        TypeCode::NONE.with_specifiers(specifiers)
    }

    /// A one-level chain, used as the right operand of [`add_indirection`].
    pub fn from_indirection(level: Indirection) -> Self {
        TypeCode((u8::from(level) as u64) << CHAIN_SHIFT)
    }

    /// A bare reference, used as the right operand of [`add_indirection`].
    pub fn from_reference(kind: RefKind) -> Self {
        TypeCode::NONE.with_reference(kind)
    }

    pub fn base(self) -> BaseType {
        BaseType::try_from((self.0 & BASE_MASK) as u8).unwrap_or(BaseType::Unknown)
    }

    pub fn with_base(self, base: BaseType) -> Self {
        TypeCode((self.0 & !BASE_MASK) | u8::from(base) as u64)
    }

    pub fn cv(self) -> CvQualifiers {
        let mut cv = CvQualifiers::empty();
        cv.set(CvQualifiers::CONST, self.0 & CONST_BIT != 0);
        cv.set(CvQualifiers::VOLATILE, self.0 & VOLATILE_BIT != 0);
        cv
    }

    /// Add cv-qualifiers to the base type.
    pub fn with_cv(self, cv: CvQualifiers) -> Self {
        let mut bits = self.0;
        if cv.contains(CvQualifiers::CONST) {
            bits |= CONST_BIT;
        }
        if cv.contains(CvQualifiers::VOLATILE) {
            bits |= VOLATILE_BIT;
        }
        TypeCode(bits)
    }

    #[inline]
    pub fn is_const(self) -> bool {
        self.0 & CONST_BIT != 0
    }

    #[inline]
    pub fn is_volatile(self) -> bool {
        self.0 & VOLATILE_BIT != 0
    }

    pub fn reference(self) -> RefKind {
        match (self.0 & REF_MASK) >> REF_SHIFT {
            1 => RefKind::LValue,
            2 => RefKind::RValue,
            _ => RefKind::None,
        }
    }

    pub fn with_reference(self, kind: RefKind) -> Self {
        let field = match kind {
            RefKind::None => 0,
            RefKind::LValue => 1,
            RefKind::RValue => 2,
        };
        TypeCode((self.0 & !REF_MASK) | (field << REF_SHIFT))
    }

    #[inline]
    pub fn is_reference(self) -> bool {
        self.reference() != RefKind::None
    }

    /// The indirection chain, outermost level first.
    pub fn indirections(self) -> impl Iterator<Item = Indirection> {
        let chain = (self.0 & CHAIN_MASK) >> CHAIN_SHIFT;
        (0..MAX_INDIRECTION)
            .map(move |level| ((chain >> (2 * level)) & 0b11) as u8)
            .map_while(|field| Indirection::try_from(field).ok())
    }

    pub fn depth(self) -> usize {
        self.indirections().count()
    }

    pub fn outermost(self) -> Option<Indirection> {
        self.indirections().next()
    }

    pub fn is_pointer(self) -> bool {
        matches!(
            self.outermost(),
            Some(Indirection::Pointer | Indirection::ConstPointer)
        )
    }

    pub fn is_array(self) -> bool {
        self.outermost() == Some(Indirection::Array)
    }

    /// Whether the chain contains any pointer or array level.
    pub fn is_indirect(self) -> bool {
        self.depth() > 0
    }

    pub fn specifiers(self) -> Specifiers {
        Specifiers::from_bits_truncate(((self.0 & SPECIFIER_MASK) >> SPECIFIER_SHIFT) as u16)
    }

    pub fn with_specifiers(self, specifiers: Specifiers) -> Self {
        TypeCode(self.0 | ((specifiers.bits() as u64) << SPECIFIER_SHIFT))
    }

    /// The type proper, with storage and function specifiers cleared.
    pub fn without_specifiers(self) -> Self {
        TypeCode(self.0 & !SPECIFIER_MASK)
    }

    /// Drop the outermost chain level (element type of an array, pointee
    /// of a pointer). References are kept.
    pub fn strip_outermost(self) -> Self {
        let levels: Vec<Indirection> = self.indirections().skip(1).collect();
        self.with_chain(&levels)
    }

    fn with_chain(self, levels: &[Indirection]) -> Self {
        debug_assert!(levels.len() <= MAX_INDIRECTION);
        let chain = levels
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, level)| {
                acc | ((u8::from(*level) as u64) << (2 * i))
            });
        TypeCode((self.0 & !CHAIN_MASK) | (chain << CHAIN_SHIFT))
    }

    /// Convert to the tagged representation. Specifiers are not part of it.
    pub fn decode(self) -> TypeDesc {
        let levels: Vec<Indirection> = self.indirections().collect();
        let mut desc = TypeDesc::Base {
            base: self.base(),
            cv: self.cv(),
        };
        for level in levels.iter().rev() {
            desc = match level {
                Indirection::Pointer => TypeDesc::Pointer {
                    pointee: Box::new(desc),
                    is_const: false,
                },
                Indirection::ConstPointer => TypeDesc::Pointer {
                    pointee: Box::new(desc),
                    is_const: true,
                },
                Indirection::Array => TypeDesc::Array {
                    element: Box::new(desc),
                },
            };
        }
        match self.reference() {
            RefKind::None => desc,
            kind => TypeDesc::Reference {
                referent: Box::new(desc),
                rvalue: kind == RefKind::RValue,
            },
        }
    }

    /// Build a code from its tagged representation.
    pub fn encode(desc: &TypeDesc) -> Result<TypeCode, TypeError> {
        let (reference, mut current) = match desc {
            TypeDesc::Reference { referent, rvalue } => {
                let kind = if *rvalue {
                    RefKind::RValue
                } else {
                    RefKind::LValue
                };
                (kind, referent.as_ref())
            }
            other => (RefKind::None, other),
        };

        let mut levels = Vec::new();
        loop {
            match current {
                TypeDesc::Base { base, cv } => {
                    if levels.len() > MAX_INDIRECTION {
                        return Err(TypeError::IndirectionOverflow {
                            max: MAX_INDIRECTION,
                        });
                    }
                    return Ok(TypeCode::from_base(*base)
                        .with_cv(*cv)
                        .with_reference(reference)
                        .with_chain(&levels));
                }
                TypeDesc::Pointer { pointee, is_const } => {
                    levels.push(if *is_const {
                        Indirection::ConstPointer
                    } else {
                        Indirection::Pointer
                    });
                    current = pointee;
                }
                TypeDesc::Array { element } => {
                    levels.push(Indirection::Array);
                    current = element;
                }
                TypeDesc::Reference { .. } => return Err(TypeError::IndirectionThroughReference),
            }
        }
    }
}

impl fmt::Debug for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeCode({:#x}: {})", self.0, self)
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.decode())
    }
}

/// Combine the specifier fields of two codes, merging their base types.
///
/// cv-qualifiers and specifiers are unioned. The indirection chain and
/// reference kind come from whichever operand carries them.
pub fn combine_base(a: TypeCode, b: TypeCode) -> Result<TypeCode, TypeError> {
    let base = merge_base(a.base(), b.base())?;
    let layout_mask = CHAIN_MASK | REF_MASK;
    let layout = if a.0 & layout_mask != 0 { a.0 } else { b.0 } & layout_mask;
    let qualifiers = (a.0 | b.0) & (CONST_BIT | VOLATILE_BIT | SPECIFIER_MASK);
    Ok(TypeCode(layout | qualifiers).with_base(base))
}

/// Apply the chain of `outer` outside the chain of `inner`.
///
/// Two lvalue references combine into an rvalue reference. A chain longer
/// than [`MAX_INDIRECTION`] levels is an error, never a truncated code.
pub fn add_indirection(inner: TypeCode, outer: TypeCode) -> Result<TypeCode, TypeError> {
    if inner.is_reference() && outer.is_indirect() {
        return Err(TypeError::IndirectionThroughReference);
    }
    let reference = match (inner.reference(), outer.reference()) {
        (RefKind::None, kind) | (kind, RefKind::None) => kind,
        (RefKind::LValue, RefKind::LValue) => RefKind::RValue,
        _ => return Err(TypeError::InvalidReference),
    };

    let levels: Vec<Indirection> = outer.indirections().chain(inner.indirections()).collect();
    if levels.len() > MAX_INDIRECTION {
        return Err(TypeError::IndirectionOverflow {
            max: MAX_INDIRECTION,
        });
    }

    let base = if inner.base() == BaseType::None {
        outer.base()
    } else {
        inner.base()
    };
    let qualifiers = (inner.0 | outer.0) & (CONST_BIT | VOLATILE_BIT | SPECIFIER_MASK);
    Ok(TypeCode(qualifiers)
        .with_base(base)
        .with_reference(reference)
        .with_chain(&levels))
}

// ============================================================================
// TypeDesc
// ============================================================================

/// Tagged view of a type, equivalent to a [`TypeCode`] without specifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    Base { base: BaseType, cv: CvQualifiers },
    Pointer { pointee: Box<TypeDesc>, is_const: bool },
    Array { element: Box<TypeDesc> },
    Reference { referent: Box<TypeDesc>, rvalue: bool },
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Base { base, cv } => {
                if cv.contains(CvQualifiers::CONST) {
                    f.write_str("const ")?;
                }
                if cv.contains(CvQualifiers::VOLATILE) {
                    f.write_str("volatile ")?;
                }
                write!(f, "{base}")
            }
            TypeDesc::Pointer { pointee, is_const } => {
                write!(f, "{pointee} *")?;
                if *is_const {
                    f.write_str("const")?;
                }
                Ok(())
            }
            TypeDesc::Array { element } => write!(f, "{element}[]"),
            TypeDesc::Reference { referent, rvalue } => {
                write!(f, "{referent} {}", if *rvalue { "&&" } else { "&" })
            }
        }
    }
}
