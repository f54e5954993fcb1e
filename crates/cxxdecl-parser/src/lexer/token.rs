//! Token types for the C++ header lexer.

use cxxdecl_core::Span;
use std::fmt;

/// A token from header text.
///
/// The lexeme lives in the parse arena, so tokens produced by macro
/// expansion and tokens read from the file look the same to the parser.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'ast> {
    pub kind: TokenKind,
    pub lexeme: &'ast str,
    pub span: Span,
}

impl<'ast> Token<'ast> {
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'ast str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }

    /// Whether this is an identifier spelled `name`.
    #[inline]
    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == TokenKind::Identifier && self.lexeme == name
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// Every token kind the header lexer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals
    // =========================================
    /// `42`, `0x1F`, `10ul`, `1'000`
    IntLiteral,
    /// `3.14`, `1e10`, `2.5f`
    FloatLiteral,
    /// `'a'`, `L'x'`
    CharLiteral,
    /// `"text"`, `u8"text"`, `R"(raw)"`
    StringLiteral,

    // =========================================
    // Identifiers
    // =========================================
    Identifier,

    // =========================================
    // Keywords - Types
    // =========================================
    Void,
    Bool,
    Char,
    WChar,
    Char8,
    Char16,
    Char32,
    Short,
    Int,
    Long,
    /// `__int64`
    Int64,
    Float,
    Double,
    Signed,
    Unsigned,
    Auto,

    // =========================================
    // Keywords - Qualifiers and specifiers
    // =========================================
    Const,
    Volatile,
    Mutable,
    Static,
    Extern,
    Register,
    ThreadLocal,
    Inline,
    Virtual,
    Explicit,
    /// `constexpr`, `consteval`, `constinit`
    Constexpr,
    Friend,
    Typedef,

    // =========================================
    // Keywords - Declarations
    // =========================================
    Class,
    Struct,
    Union,
    Enum,
    Namespace,
    Template,
    Typename,
    Using,
    Operator,
    Public,
    Protected,
    Private,
    StaticAssert,
    Decltype,
    Noexcept,
    Throw,
    Alignas,
    Sizeof,
    New,
    Delete,
    Default,

    // =========================================
    // Keywords - Values
    // =========================================
    True,
    False,
    Nullptr,
    This,

    // =========================================
    // Operators - Arithmetic
    // =========================================
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,

    // =========================================
    // Operators - Assignment
    // =========================================
    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    AmpEqual,
    PipeEqual,
    CaretEqual,
    LessLessEqual,
    GreaterGreaterEqual,

    // =========================================
    // Operators - Bitwise and logical
    // =========================================
    Amp,
    Pipe,
    Caret,
    Tilde,
    Bang,
    AmpAmp,
    PipePipe,
    LessLess,
    GreaterGreater,

    // =========================================
    // Operators - Comparison
    // =========================================
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    /// `<=>`
    Spaceship,

    // =========================================
    // Operators - Member access and scope
    // =========================================
    Dot,
    DotStar,
    Arrow,
    ArrowStar,
    ColonColon,
    Ellipsis,
    Question,
    Colon,

    // =========================================
    // Delimiters
    // =========================================
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Semicolon,
    Comma,

    // =========================================
    // Preprocessor
    // =========================================
    /// `#` inside a macro body (stringizing).
    Hash,
    /// `##` inside a macro body (token pasting).
    HashHash,
    /// A whole directive line, continuations joined.
    Directive,

    // =========================================
    // Trivia (reported on the side channel)
    // =========================================
    Comment,
    /// A line holding nothing but whitespace.
    BlankLine,

    // =========================================
    // Special
    // =========================================
    Eof,
    Error,
}

impl TokenKind {
    /// Keywords that name a fundamental type.
    pub fn is_builtin_type(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Void | Bool
                | Char
                | WChar
                | Char8
                | Char16
                | Char32
                | Short
                | Int
                | Long
                | Int64
                | Float
                | Double
                | Signed
                | Unsigned
                | Auto
        )
    }

    /// Storage-class and function specifier keywords.
    pub fn is_specifier(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Mutable
                | Static
                | Extern
                | Register
                | ThreadLocal
                | Inline
                | Virtual
                | Explicit
                | Constexpr
                | Friend
                | Typedef
        )
    }

    pub fn is_cv(self) -> bool {
        matches!(self, TokenKind::Const | TokenKind::Volatile)
    }

    pub fn is_class_key(self) -> bool {
        matches!(
            self,
            TokenKind::Class | TokenKind::Struct | TokenKind::Union
        )
    }

    pub fn is_literal(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            IntLiteral | FloatLiteral | CharLiteral | StringLiteral | True | False | Nullptr
        )
    }

    /// Tokens that are words: identifiers and every keyword.
    pub fn is_word(self) -> bool {
        self == TokenKind::Identifier || self.is_keyword()
    }

    pub fn is_keyword(self) -> bool {
        self.is_builtin_type()
            || self.is_specifier()
            || self.is_cv()
            || matches!(
                self,
                TokenKind::Class
                    | TokenKind::Struct
                    | TokenKind::Union
                    | TokenKind::Enum
                    | TokenKind::Namespace
                    | TokenKind::Template
                    | TokenKind::Typename
                    | TokenKind::Using
                    | TokenKind::Operator
                    | TokenKind::Public
                    | TokenKind::Protected
                    | TokenKind::Private
                    | TokenKind::StaticAssert
                    | TokenKind::Decltype
                    | TokenKind::Noexcept
                    | TokenKind::Throw
                    | TokenKind::Alignas
                    | TokenKind::Sizeof
                    | TokenKind::New
                    | TokenKind::Delete
                    | TokenKind::Default
                    | TokenKind::True
                    | TokenKind::False
                    | TokenKind::Nullptr
                    | TokenKind::This
            )
    }

    /// Whether the token is reported on the side channel instead of the
    /// parser's stream.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Comment | TokenKind::BlankLine)
    }

    /// Operators that may follow the `operator` keyword.
    pub fn is_overloadable_operator(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Plus | Minus
                | Star
                | Slash
                | Percent
                | PlusPlus
                | MinusMinus
                | Equal
                | PlusEqual
                | MinusEqual
                | StarEqual
                | SlashEqual
                | PercentEqual
                | AmpEqual
                | PipeEqual
                | CaretEqual
                | LessLessEqual
                | GreaterGreaterEqual
                | Amp
                | Pipe
                | Caret
                | Tilde
                | Bang
                | AmpAmp
                | PipePipe
                | LessLess
                | GreaterGreater
                | EqualEqual
                | BangEqual
                | Less
                | LessEqual
                | Greater
                | GreaterEqual
                | Spaceship
                | Arrow
                | ArrowStar
                | Comma
        )
    }

    pub fn description(self) -> &'static str {
        use TokenKind::*;
        match self {
            IntLiteral => "integer literal",
            FloatLiteral => "floating-point literal",
            CharLiteral => "character literal",
            StringLiteral => "string literal",
            Identifier => "identifier",
            Void => "'void'",
            Bool => "'bool'",
            Char => "'char'",
            WChar => "'wchar_t'",
            Char8 => "'char8_t'",
            Char16 => "'char16_t'",
            Char32 => "'char32_t'",
            Short => "'short'",
            Int => "'int'",
            Long => "'long'",
            Int64 => "'__int64'",
            Float => "'float'",
            Double => "'double'",
            Signed => "'signed'",
            Unsigned => "'unsigned'",
            Auto => "'auto'",
            Const => "'const'",
            Volatile => "'volatile'",
            Mutable => "'mutable'",
            Static => "'static'",
            Extern => "'extern'",
            Register => "'register'",
            ThreadLocal => "'thread_local'",
            Inline => "'inline'",
            Virtual => "'virtual'",
            Explicit => "'explicit'",
            Constexpr => "'constexpr'",
            Friend => "'friend'",
            Typedef => "'typedef'",
            Class => "'class'",
            Struct => "'struct'",
            Union => "'union'",
            Enum => "'enum'",
            Namespace => "'namespace'",
            Template => "'template'",
            Typename => "'typename'",
            Using => "'using'",
            Operator => "'operator'",
            Public => "'public'",
            Protected => "'protected'",
            Private => "'private'",
            StaticAssert => "'static_assert'",
            Decltype => "'decltype'",
            Noexcept => "'noexcept'",
            Throw => "'throw'",
            Alignas => "'alignas'",
            Sizeof => "'sizeof'",
            New => "'new'",
            Delete => "'delete'",
            Default => "'default'",
            True => "'true'",
            False => "'false'",
            Nullptr => "'nullptr'",
            This => "'this'",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            PlusPlus => "'++'",
            MinusMinus => "'--'",
            Equal => "'='",
            PlusEqual => "'+='",
            MinusEqual => "'-='",
            StarEqual => "'*='",
            SlashEqual => "'/='",
            PercentEqual => "'%='",
            AmpEqual => "'&='",
            PipeEqual => "'|='",
            CaretEqual => "'^='",
            LessLessEqual => "'<<='",
            GreaterGreaterEqual => "'>>='",
            Amp => "'&'",
            Pipe => "'|'",
            Caret => "'^'",
            Tilde => "'~'",
            Bang => "'!'",
            AmpAmp => "'&&'",
            PipePipe => "'||'",
            LessLess => "'<<'",
            GreaterGreater => "'>>'",
            EqualEqual => "'=='",
            BangEqual => "'!='",
            Less => "'<'",
            LessEqual => "'<='",
            Greater => "'>'",
            GreaterEqual => "'>='",
            Spaceship => "'<=>'",
            Dot => "'.'",
            DotStar => "'.*'",
            Arrow => "'->'",
            ArrowStar => "'->*'",
            ColonColon => "'::'",
            Ellipsis => "'...'",
            Question => "'?'",
            Colon => "':'",
            LeftParen => "'('",
            RightParen => "')'",
            LeftBracket => "'['",
            RightBracket => "']'",
            LeftBrace => "'{'",
            RightBrace => "'}'",
            Semicolon => "';'",
            Comma => "','",
            Hash => "'#'",
            HashHash => "'##'",
            Directive => "preprocessor directive",
            Comment => "comment",
            BlankLine => "blank line",
            Eof => "end of file",
            Error => "invalid token",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Look up the keyword kind for an identifier, if it is one.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        // Types
        "void" => Void,
        "bool" => Bool,
        "char" => Char,
        "wchar_t" => WChar,
        "char8_t" => Char8,
        "char16_t" => Char16,
        "char32_t" => Char32,
        "short" => Short,
        "int" => Int,
        "long" => Long,
        "__int64" => Int64,
        "float" => Float,
        "double" => Double,
        "signed" | "__signed__" => Signed,
        "unsigned" => Unsigned,
        "auto" => Auto,

        // Qualifiers and specifiers
        "const" => Const,
        "volatile" => Volatile,
        "mutable" => Mutable,
        "static" => Static,
        "extern" => Extern,
        "register" => Register,
        "thread_local" => ThreadLocal,
        "inline" | "__inline" | "__forceinline" => Inline,
        "virtual" => Virtual,
        "explicit" => Explicit,
        "constexpr" | "consteval" | "constinit" => Constexpr,
        "friend" => Friend,
        "typedef" => Typedef,

        // Declarations
        "class" => Class,
        "struct" => Struct,
        "union" => Union,
        "enum" => Enum,
        "namespace" => Namespace,
        "template" => Template,
        "typename" => Typename,
        "using" => Using,
        "operator" => Operator,
        "public" => Public,
        "protected" => Protected,
        "private" => Private,
        "static_assert" => StaticAssert,
        "decltype" => Decltype,
        "noexcept" => Noexcept,
        "throw" => Throw,
        "alignas" => Alignas,
        "sizeof" => Sizeof,
        "new" => New,
        "delete" => Delete,
        "default" => Default,

        // Values
        "true" => True,
        "false" => False,
        "nullptr" => Nullptr,
        "this" => This,

        _ => return None,
    })
}
