//! Constant-expression evaluation for `#if` and `#elif`.
//!
//! The text is lexed, `defined` operators are resolved, macros are expanded,
//! and the remaining tokens are parsed by precedence climbing into a small
//! expression tree. Evaluation is typed: integers carry signedness and
//! floating values keep their precision, following the usual arithmetic
//! conversions.

use std::fmt;

use bumpalo::Bump;
use cxxdecl_core::{PreprocessError, parse_integer_literal};
use ordered_float::OrderedFloat;

use super::PreprocessorService;
use super::macros::MacroExpander;
use crate::lexer::{Lexer, Token, TokenKind};

/// The value of a constant expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstantValue {
    Int { value: i64, is_unsigned: bool },
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    String(String),
}

impl ConstantValue {
    pub fn int(value: i64) -> Self {
        ConstantValue::Int {
            value,
            is_unsigned: false,
        }
    }

    pub fn unsigned(value: u64) -> Self {
        ConstantValue::Int {
            value: value as i64,
            is_unsigned: true,
        }
    }

    fn boolean(value: bool) -> Self {
        Self::int(value as i64)
    }

    /// Truth value as used by `#if`.
    pub fn is_true(&self) -> bool {
        match self {
            ConstantValue::Int { value, .. } => *value != 0,
            ConstantValue::Float(v) => v.0 != 0.0,
            ConstantValue::Double(v) => v.0 != 0.0,
            ConstantValue::String(_) => true,
        }
    }

    fn as_f64(&self) -> f64 {
        match self {
            ConstantValue::Int {
                value,
                is_unsigned: true,
            } => *value as u64 as f64,
            ConstantValue::Int { value, .. } => *value as f64,
            ConstantValue::Float(v) => v.0 as f64,
            ConstantValue::Double(v) => v.0,
            ConstantValue::String(_) => 0.0,
        }
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Int {
                value,
                is_unsigned: true,
            } => write!(f, "{}u", *value as u64),
            ConstantValue::Int { value, .. } => write!(f, "{value}"),
            ConstantValue::Float(v) => write!(f, "{}f", v.0),
            ConstantValue::Double(v) => write!(f, "{}", v.0),
            ConstantValue::String(s) => write!(f, "\"{s}\""),
        }
    }
}

/// Evaluate `text` against the macros known to `service`.
pub fn evaluate<S: PreprocessorService + ?Sized>(
    text: &str,
    service: &S,
) -> Result<ConstantValue, PreprocessError> {
    let arena = Bump::new();
    let invalid = |detail: &str| PreprocessError::InvalidExpression {
        expression: text.to_string(),
        detail: detail.to_string(),
    };

    let mut raw = Vec::new();
    let mut lexer = Lexer::for_fragment(text, &arena);
    loop {
        let token = lexer.next_token();
        match token.kind {
            TokenKind::Eof => break,
            TokenKind::Comment => {}
            TokenKind::Error => {
                if let Some(error) = lexer.take_errors().into_iter().next() {
                    return Err(error.into());
                }
            }
            _ => raw.push(token),
        }
    }

    let resolved = resolve_defined(&raw, service, &arena).ok_or_else(|| invalid("malformed 'defined'"))?;
    let expanded = MacroExpander::new(service, &arena).expand(resolved)?;
    // `defined` can also appear after expansion.
    let tokens = resolve_defined(&expanded, service, &arena).ok_or_else(|| invalid("malformed 'defined'"))?;

    if tokens.is_empty() {
        return Err(invalid("empty expression"));
    }

    let mut parser = ExprParser {
        tokens: &tokens,
        position: 0,
        expression: text,
    };
    let expr = parser.parse_conditional()?;
    if let Some(extra) = parser.tokens.get(parser.position) {
        return Err(invalid(&format!("unexpected '{}'", extra.lexeme)));
    }
    expr.evaluate(text)
}

/// Replace `defined X` and `defined(X)` with `1` or `0`.
fn resolve_defined<'ast, S: PreprocessorService + ?Sized>(
    tokens: &[Token<'ast>],
    service: &S,
    arena: &'ast Bump,
) -> Option<Vec<Token<'ast>>> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        if !token.is_ident("defined") {
            output.push(token);
            i += 1;
            continue;
        }
        let (name, consumed) = match tokens.get(i + 1) {
            Some(open) if open.kind == TokenKind::LeftParen => {
                let name = tokens.get(i + 2).filter(|t| t.kind.is_word())?;
                tokens.get(i + 3).filter(|t| t.kind == TokenKind::RightParen)?;
                (name.lexeme, 4)
            }
            Some(name) if name.kind.is_word() => (name.lexeme, 2),
            _ => return None,
        };
        let value = if service.is_defined(name) { "1" } else { "0" };
        output.push(Token::new(TokenKind::IntLiteral, arena.alloc_str(value), token.span));
        i += consumed;
    }
    Some(output)
}

// ============================================================================
// Expression tree
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnaryOp {
    Plus,
    Negate,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    BitAnd,
    BitXor,
    BitOr,
    LogicAnd,
    LogicOr,
}

#[derive(Debug)]
enum ConstExpr {
    Value(ConstantValue),
    Unary(UnaryOp, Box<ConstExpr>),
    Binary(BinaryOp, Box<ConstExpr>, Box<ConstExpr>),
    Conditional(Box<ConstExpr>, Box<ConstExpr>, Box<ConstExpr>),
}

impl ConstExpr {
    fn evaluate(&self, expression: &str) -> Result<ConstantValue, PreprocessError> {
        match self {
            ConstExpr::Value(value) => Ok(value.clone()),
            ConstExpr::Conditional(cond, then, otherwise) => {
                if cond.evaluate(expression)?.is_true() {
                    then.evaluate(expression)
                } else {
                    otherwise.evaluate(expression)
                }
            }
            ConstExpr::Unary(op, operand) => {
                let value = operand.evaluate(expression)?;
                apply_unary(*op, value, expression)
            }
            ConstExpr::Binary(BinaryOp::LogicAnd, left, right) => {
                if !left.evaluate(expression)?.is_true() {
                    return Ok(ConstantValue::boolean(false));
                }
                Ok(ConstantValue::boolean(right.evaluate(expression)?.is_true()))
            }
            ConstExpr::Binary(BinaryOp::LogicOr, left, right) => {
                if left.evaluate(expression)?.is_true() {
                    return Ok(ConstantValue::boolean(true));
                }
                Ok(ConstantValue::boolean(right.evaluate(expression)?.is_true()))
            }
            ConstExpr::Binary(op, left, right) => {
                let l = left.evaluate(expression)?;
                let r = right.evaluate(expression)?;
                apply_binary(*op, l, r, expression)
            }
        }
    }
}

fn not_numeric(expression: &str) -> PreprocessError {
    PreprocessError::InvalidExpression {
        expression: expression.to_string(),
        detail: "string operand in arithmetic".into(),
    }
}

fn apply_unary(op: UnaryOp, value: ConstantValue, expression: &str) -> Result<ConstantValue, PreprocessError> {
    if matches!(value, ConstantValue::String(_)) {
        return Err(not_numeric(expression));
    }
    Ok(match (op, value) {
        (UnaryOp::Not, value) => ConstantValue::boolean(!value.is_true()),
        (UnaryOp::Plus, value) => value,
        (UnaryOp::Negate, ConstantValue::Int { value, is_unsigned }) => ConstantValue::Int {
            value: value.wrapping_neg(),
            is_unsigned,
        },
        (UnaryOp::Negate, ConstantValue::Float(v)) => ConstantValue::Float(OrderedFloat(-v.0)),
        (UnaryOp::Negate, ConstantValue::Double(v)) => ConstantValue::Double(OrderedFloat(-v.0)),
        (UnaryOp::BitNot, ConstantValue::Int { value, is_unsigned }) => ConstantValue::Int {
            value: !value,
            is_unsigned,
        },
        (UnaryOp::BitNot, _) => {
            return Err(PreprocessError::InvalidExpression {
                expression: expression.to_string(),
                detail: "'~' applied to a floating value".into(),
            });
        }
        (_, ConstantValue::String(_)) => return Err(not_numeric(expression)),
    })
}

/// Common type of two operands under the usual arithmetic conversions.
enum Promoted {
    Signed(i64, i64),
    Unsigned(u64, u64),
    Float(f32, f32),
    Double(f64, f64),
}

fn promote(l: &ConstantValue, r: &ConstantValue) -> Promoted {
    use ConstantValue as V;
    match (l, r) {
        (V::Double(_), _) | (_, V::Double(_)) => Promoted::Double(l.as_f64(), r.as_f64()),
        (V::Float(_), _) | (_, V::Float(_)) => Promoted::Float(l.as_f64() as f32, r.as_f64() as f32),
        (
            V::Int { value: a, is_unsigned: ua },
            V::Int { value: b, is_unsigned: ub },
        ) if *ua || *ub => Promoted::Unsigned(*a as u64, *b as u64),
        (V::Int { value: a, .. }, V::Int { value: b, .. }) => Promoted::Signed(*a, *b),
        _ => Promoted::Signed(0, 0),
    }
}

fn apply_binary(
    op: BinaryOp,
    l: ConstantValue,
    r: ConstantValue,
    expression: &str,
) -> Result<ConstantValue, PreprocessError> {
    if matches!(l, ConstantValue::String(_)) || matches!(r, ConstantValue::String(_)) {
        return Err(not_numeric(expression));
    }
    let division_by_zero = || PreprocessError::DivisionByZero {
        expression: expression.to_string(),
    };
    let integer_only = || PreprocessError::InvalidExpression {
        expression: expression.to_string(),
        detail: "integer operator applied to a floating value".into(),
    };

    // Shifts take the type of the left operand.
    if matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
        let (ConstantValue::Int { value, is_unsigned }, ConstantValue::Int { value: amount, .. }) = (&l, &r) else {
            return Err(integer_only());
        };
        let amount = (*amount & 63) as u32;
        let value = match (op, is_unsigned) {
            (BinaryOp::Shl, _) => value.wrapping_shl(amount),
            (_, true) => ((*value as u64) >> amount) as i64,
            _ => value >> amount,
        };
        return Ok(ConstantValue::Int {
            value,
            is_unsigned: *is_unsigned,
        });
    }

    Ok(match promote(&l, &r) {
        Promoted::Signed(a, b) => match op {
            BinaryOp::Mul => ConstantValue::int(a.wrapping_mul(b)),
            BinaryOp::Div if b == 0 => return Err(division_by_zero()),
            BinaryOp::Div => ConstantValue::int(a.wrapping_div(b)),
            BinaryOp::Rem if b == 0 => return Err(division_by_zero()),
            BinaryOp::Rem => ConstantValue::int(a.wrapping_rem(b)),
            BinaryOp::Add => ConstantValue::int(a.wrapping_add(b)),
            BinaryOp::Sub => ConstantValue::int(a.wrapping_sub(b)),
            BinaryOp::BitAnd => ConstantValue::int(a & b),
            BinaryOp::BitXor => ConstantValue::int(a ^ b),
            BinaryOp::BitOr => ConstantValue::int(a | b),
            _ => ConstantValue::boolean(compare(op, a.cmp(&b))),
        },
        Promoted::Unsigned(a, b) => match op {
            BinaryOp::Mul => ConstantValue::unsigned(a.wrapping_mul(b)),
            BinaryOp::Div if b == 0 => return Err(division_by_zero()),
            BinaryOp::Div => ConstantValue::unsigned(a / b),
            BinaryOp::Rem if b == 0 => return Err(division_by_zero()),
            BinaryOp::Rem => ConstantValue::unsigned(a % b),
            BinaryOp::Add => ConstantValue::unsigned(a.wrapping_add(b)),
            BinaryOp::Sub => ConstantValue::unsigned(a.wrapping_sub(b)),
            BinaryOp::BitAnd => ConstantValue::unsigned(a & b),
            BinaryOp::BitXor => ConstantValue::unsigned(a ^ b),
            BinaryOp::BitOr => ConstantValue::unsigned(a | b),
            _ => ConstantValue::boolean(compare(op, a.cmp(&b))),
        },
        Promoted::Float(a, b) => match op {
            BinaryOp::Mul => ConstantValue::Float(OrderedFloat(a * b)),
            BinaryOp::Div if b == 0.0 => return Err(division_by_zero()),
            BinaryOp::Div => ConstantValue::Float(OrderedFloat(a / b)),
            BinaryOp::Add => ConstantValue::Float(OrderedFloat(a + b)),
            BinaryOp::Sub => ConstantValue::Float(OrderedFloat(a - b)),
            BinaryOp::Rem | BinaryOp::BitAnd | BinaryOp::BitXor | BinaryOp::BitOr => {
                return Err(integer_only());
            }
            _ => ConstantValue::boolean(compare(op, OrderedFloat(a).cmp(&OrderedFloat(b)))),
        },
        Promoted::Double(a, b) => match op {
            BinaryOp::Mul => ConstantValue::Double(OrderedFloat(a * b)),
            BinaryOp::Div if b == 0.0 => return Err(division_by_zero()),
            BinaryOp::Div => ConstantValue::Double(OrderedFloat(a / b)),
            BinaryOp::Add => ConstantValue::Double(OrderedFloat(a + b)),
            BinaryOp::Sub => ConstantValue::Double(OrderedFloat(a - b)),
            BinaryOp::Rem | BinaryOp::BitAnd | BinaryOp::BitXor | BinaryOp::BitOr => {
                return Err(integer_only());
            }
            _ => ConstantValue::boolean(compare(op, OrderedFloat(a).cmp(&OrderedFloat(b)))),
        },
    })
}

fn compare(op: BinaryOp, ordering: std::cmp::Ordering) -> bool {
    use std::cmp::Ordering::*;
    match op {
        BinaryOp::Less => ordering == Less,
        BinaryOp::LessEqual => ordering != Greater,
        BinaryOp::Greater => ordering == Greater,
        BinaryOp::GreaterEqual => ordering != Less,
        BinaryOp::Equal => ordering == Equal,
        BinaryOp::NotEqual => ordering != Equal,
        _ => false,
    }
}

// ============================================================================
// Parser
// ============================================================================

struct ExprParser<'t, 'ast> {
    tokens: &'t [Token<'ast>],
    position: usize,
    expression: &'t str,
}

impl ExprParser<'_, '_> {
    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.position).map(|t| t.kind)
    }

    fn error(&self, detail: impl Into<String>) -> PreprocessError {
        PreprocessError::InvalidExpression {
            expression: self.expression.to_string(),
            detail: detail.into(),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), PreprocessError> {
        if self.peek() == Some(kind) {
            self.position += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected {kind}")))
        }
    }

    /// Parse one level of left-associative binary operators.
    fn binary_level(
        &mut self,
        operators: &[(TokenKind, BinaryOp)],
        next: fn(&mut Self) -> Result<ConstExpr, PreprocessError>,
    ) -> Result<ConstExpr, PreprocessError> {
        let mut left = next(self)?;
        while let Some(&(_, op)) = self
            .peek()
            .and_then(|kind| operators.iter().find(|(k, _)| *k == kind))
        {
            self.position += 1;
            let right = next(self)?;
            left = ConstExpr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_conditional(&mut self) -> Result<ConstExpr, PreprocessError> {
        let condition = self.parse_or()?;
        if self.peek() != Some(TokenKind::Question) {
            return Ok(condition);
        }
        self.position += 1;
        let then = self.parse_conditional()?;
        self.expect(TokenKind::Colon)?;
        let otherwise = self.parse_conditional()?;
        Ok(ConstExpr::Conditional(
            Box::new(condition),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    fn parse_or(&mut self) -> Result<ConstExpr, PreprocessError> {
        self.binary_level(&[(TokenKind::PipePipe, BinaryOp::LogicOr)], Self::parse_and)
    }

    fn parse_and(&mut self) -> Result<ConstExpr, PreprocessError> {
        self.binary_level(&[(TokenKind::AmpAmp, BinaryOp::LogicAnd)], Self::parse_bitwise_or)
    }

    fn parse_bitwise_or(&mut self) -> Result<ConstExpr, PreprocessError> {
        self.binary_level(&[(TokenKind::Pipe, BinaryOp::BitOr)], Self::parse_bitwise_xor)
    }

    fn parse_bitwise_xor(&mut self) -> Result<ConstExpr, PreprocessError> {
        self.binary_level(&[(TokenKind::Caret, BinaryOp::BitXor)], Self::parse_bitwise_and)
    }

    fn parse_bitwise_and(&mut self) -> Result<ConstExpr, PreprocessError> {
        self.binary_level(&[(TokenKind::Amp, BinaryOp::BitAnd)], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Result<ConstExpr, PreprocessError> {
        self.binary_level(
            &[
                (TokenKind::EqualEqual, BinaryOp::Equal),
                (TokenKind::BangEqual, BinaryOp::NotEqual),
            ],
            Self::parse_relational,
        )
    }

    fn parse_relational(&mut self) -> Result<ConstExpr, PreprocessError> {
        self.binary_level(
            &[
                (TokenKind::Less, BinaryOp::Less),
                (TokenKind::LessEqual, BinaryOp::LessEqual),
                (TokenKind::Greater, BinaryOp::Greater),
                (TokenKind::GreaterEqual, BinaryOp::GreaterEqual),
            ],
            Self::parse_shift,
        )
    }

    fn parse_shift(&mut self) -> Result<ConstExpr, PreprocessError> {
        self.binary_level(
            &[
                (TokenKind::LessLess, BinaryOp::Shl),
                (TokenKind::GreaterGreater, BinaryOp::Shr),
            ],
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> Result<ConstExpr, PreprocessError> {
        self.binary_level(
            &[
                (TokenKind::Plus, BinaryOp::Add),
                (TokenKind::Minus, BinaryOp::Sub),
            ],
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> Result<ConstExpr, PreprocessError> {
        self.binary_level(
            &[
                (TokenKind::Star, BinaryOp::Mul),
                (TokenKind::Slash, BinaryOp::Div),
                (TokenKind::Percent, BinaryOp::Rem),
            ],
            Self::parse_unary,
        )
    }

    fn parse_unary(&mut self) -> Result<ConstExpr, PreprocessError> {
        let op = match self.peek() {
            Some(TokenKind::Plus) => UnaryOp::Plus,
            Some(TokenKind::Minus) => UnaryOp::Negate,
            Some(TokenKind::Bang) => UnaryOp::Not,
            Some(TokenKind::Tilde) => UnaryOp::BitNot,
            _ => return self.parse_primary(),
        };
        self.position += 1;
        let operand = self.parse_unary()?;
        Ok(ConstExpr::Unary(op, Box::new(operand)))
    }

    fn parse_primary(&mut self) -> Result<ConstExpr, PreprocessError> {
        let Some(token) = self.tokens.get(self.position).copied() else {
            return Err(self.error("unexpected end of expression"));
        };
        self.position += 1;

        let value = match token.kind {
            TokenKind::LeftParen => {
                let inner = self.parse_conditional()?;
                self.expect(TokenKind::RightParen)?;
                return Ok(inner);
            }
            TokenKind::IntLiteral => integer_value(token.lexeme)
                .ok_or_else(|| self.error(format!("invalid integer '{}'", token.lexeme)))?,
            TokenKind::FloatLiteral => float_value(token.lexeme)
                .ok_or_else(|| self.error(format!("invalid number '{}'", token.lexeme)))?,
            TokenKind::CharLiteral => char_value(token.lexeme)
                .ok_or_else(|| self.error(format!("invalid character '{}'", token.lexeme)))?,
            TokenKind::StringLiteral => ConstantValue::String(string_value(token.lexeme)),
            TokenKind::True => ConstantValue::boolean(true),
            TokenKind::False | TokenKind::Nullptr => ConstantValue::int(0),
            // Names left after expansion are undefined macros.
            kind if kind.is_word() => ConstantValue::int(0),
            _ => return Err(self.error(format!("unexpected '{}'", token.lexeme))),
        };
        Ok(ConstExpr::Value(value))
    }
}

fn integer_value(lexeme: &str) -> Option<ConstantValue> {
    let value = parse_integer_literal(lexeme)?;
    let suffix_start = lexeme
        .trim_end_matches(['u', 'U', 'l', 'L', 'z', 'Z'])
        .len();
    let explicit_unsigned = lexeme[suffix_start..].contains(['u', 'U']);
    if explicit_unsigned || value > i64::MAX as u64 {
        Some(ConstantValue::unsigned(value))
    } else {
        Some(ConstantValue::int(value as i64))
    }
}

fn float_value(lexeme: &str) -> Option<ConstantValue> {
    let digits: String = lexeme.chars().filter(|&c| c != '\'').collect();
    let is_float = digits.ends_with(['f', 'F']) && !digits.starts_with("0x") && !digits.starts_with("0X");
    let body = digits.trim_end_matches(['f', 'F', 'l', 'L']);
    let value: f64 = body.parse().ok()?;
    Some(if is_float {
        ConstantValue::Float(OrderedFloat(value as f32))
    } else {
        ConstantValue::Double(OrderedFloat(value))
    })
}

fn char_value(lexeme: &str) -> Option<ConstantValue> {
    let start = lexeme.find('\'')?;
    let inner = lexeme[start + 1..].strip_suffix('\'')?;
    let mut chars = inner.chars();
    let value = match chars.next()? {
        '\\' => match chars.next()? {
            'n' => 10,
            't' => 9,
            'r' => 13,
            '0'..='7' => {
                let octal: String = inner[1..].chars().take_while(|c| c.is_digit(8)).collect();
                return u32::from_str_radix(&octal, 8).ok().map(|v| ConstantValue::int(v as i64));
            }
            'x' => {
                let hex: String = chars.take_while(|c| c.is_ascii_hexdigit()).collect();
                return u32::from_str_radix(&hex, 16).ok().map(|v| ConstantValue::int(v as i64));
            }
            'a' => 7,
            'b' => 8,
            'f' => 12,
            'v' => 11,
            other => other as u32,
        },
        c => c as u32,
    };
    Some(ConstantValue::int(value as i64))
}

fn string_value(lexeme: &str) -> String {
    let start = lexeme.find('"').map_or(0, |i| i + 1);
    let end = lexeme.rfind('"').unwrap_or(lexeme.len());
    lexeme.get(start..end).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessor::{MacroDefinition, MacroTable};

    fn eval_with(text: &str, defines: &[(&str, &str)]) -> Result<ConstantValue, PreprocessError> {
        let mut table = MacroTable::new();
        for (name, body) in defines {
            table.define(MacroDefinition::object(*name, *body));
        }
        evaluate(text, &table)
    }

    fn eval(text: &str) -> ConstantValue {
        eval_with(text, &[]).expect("expression evaluates")
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(eval("1 + 2 * 3"), ConstantValue::int(7));
        assert_eq!(eval("(1 + 2) * 3"), ConstantValue::int(9));
        assert_eq!(eval("10 - 4 - 3"), ConstantValue::int(3));
        assert_eq!(eval("-3 % 2"), ConstantValue::int(-1));
        assert_eq!(eval("1 << 4 | 1"), ConstantValue::int(17));
    }

    #[test]
    fn defined_and_macros() {
        let defines = [("A", ""), ("B", "3")];
        assert!(eval_with("defined(A) && B > 2", &defines).unwrap().is_true());
        assert!(!eval_with("defined(A) && B > 3", &defines).unwrap().is_true());
        assert!(eval_with("defined A || defined C", &defines).unwrap().is_true());
        assert!(!eval_with("defined C", &defines).unwrap().is_true());
    }

    #[test]
    fn unknown_identifiers_are_zero() {
        assert_eq!(eval("UNDEFINED_THING"), ConstantValue::int(0));
        assert_eq!(eval("UNDEFINED_THING + 2"), ConstantValue::int(2));
    }

    #[test]
    fn typed_results() {
        assert_eq!(eval("1u + 1"), ConstantValue::unsigned(2));
        assert_eq!(eval("0xFFFFFFFFFFFFFFFF"), ConstantValue::unsigned(u64::MAX));
        assert!(eval("-1 < 0u") == ConstantValue::int(0));
        assert_eq!(eval("1.5f * 2"), ConstantValue::Float(OrderedFloat(3.0)));
        assert_eq!(eval("1.5 * 2"), ConstantValue::Double(OrderedFloat(3.0)));
        assert_eq!(eval("'A'"), ConstantValue::int(65));
        assert_eq!(eval("'\\n'"), ConstantValue::int(10));
        assert_eq!(eval("\"text\""), ConstantValue::String("text".into()));
    }

    #[test]
    fn logic_short_circuits() {
        assert_eq!(eval("0 && 1 / 0"), ConstantValue::int(0));
        assert_eq!(eval("1 || 1 / 0"), ConstantValue::int(1));
        assert_eq!(eval("1 ? 2 : 1 / 0"), ConstantValue::int(2));
    }

    #[test]
    fn division_by_zero_is_error() {
        assert!(matches!(
            eval_with("4 / (2 - 2)", &[]),
            Err(PreprocessError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn malformed_expressions() {
        assert!(eval_with("", &[]).is_err());
        assert!(eval_with("1 +", &[]).is_err());
        assert!(eval_with("(1", &[]).is_err());
        assert!(eval_with("1 2", &[]).is_err());
        assert!(eval_with("defined(", &[]).is_err());
        assert!(eval_with("\"a\" + 1", &[]).is_err());
    }

    #[test]
    fn version_checks() {
        let defines = [("VTK_MAJOR", "9"), ("VTK_MINOR", "3")];
        assert!(
            eval_with("VTK_MAJOR > 9 || (VTK_MAJOR == 9 && VTK_MINOR >= 2)", &defines)
                .unwrap()
                .is_true()
        );
    }
}
