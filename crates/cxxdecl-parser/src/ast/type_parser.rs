//! Parsing of decl-specifiers, declarators and names.
//!
//! ```text
//! decl-specifiers  ::= (attribute-list | specifier | cv | type-specifier)*
//! declarator       ::= ptr-op* '...'? (name | '(' declarator ')')? suffix*
//! ptr-op           ::= ('*' | '&' | '&&' | name '::' '*') attribute-list? cv*
//! suffix           ::= '[' expr? ']' attribute-list?
//!                    | '(' params ')' cv* ref? noexcept? attribute-list?
//!                      ('->' type-id)? ('override' | 'final')*
//! ```

use cxxdecl_core::{ClassKind, CvQualifiers, ParseError, RefKind, Span, Specifiers};

use crate::ast::fork::Rule;
use crate::ast::{
    Attribute, AttributeRole, DeclSpecs, DeclSuffix, Declarator, DeclaratorCore, ElaboratedKey, FunctionSuffix,
    NameKind, NameSegment, Param, Parser, PtrOp, PtrOpKind, QualifiedName, TypeId, TypeSpec, VirtSpecifiers,
};
use crate::lexer::{Token, TokenKind};

/// Whether a declarator must, may, or must not name something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclaratorKind {
    /// Variables, functions, typedefs.
    Named,
    /// Function and template parameters.
    Parameter,
    /// Type-ids.
    Abstract,
}

impl<'ast> Parser<'ast> {
    // ========================================================================
    // Attributes
    // ========================================================================

    /// Parse a run of `[[...]]` lists. GNU `__attribute__((...))`, MSVC
    /// `__declspec(...)` and `alignas(...)` are skipped.
    pub(crate) fn parse_attributes(&mut self, role: AttributeRole) -> Result<&'ast [Attribute<'ast>], ParseError> {
        let mut attributes = Vec::new();
        loop {
            if self.check(TokenKind::LeftBracket) && self.peek_nth(1).kind == TokenKind::LeftBracket {
                self.parse_attribute_list(role, &mut attributes)?;
            } else if self.at_vendor_attribute() {
                self.advance();
                self.expect_group(TokenKind::LeftParen)?;
            } else if self.check_contextual("__extension__") {
                self.advance();
            } else {
                break;
            }
        }
        Ok(self.arena.alloc_slice_copy(&attributes))
    }

    pub(crate) fn at_vendor_attribute(&self) -> bool {
        let token = self.peek();
        let named = token.kind == TokenKind::Alignas || token.is_ident("__attribute__") || token.is_ident("__declspec");
        named && self.peek_nth(1).kind == TokenKind::LeftParen
    }

    fn parse_attribute_list(&mut self, role: AttributeRole, out: &mut Vec<Attribute<'ast>>) -> Result<(), ParseError> {
        self.advance();
        self.advance();
        let mut using = None;
        if self.eat(TokenKind::Using).is_some() {
            using = Some(self.expect_word()?.lexeme);
            self.expect(TokenKind::Colon)?;
        }
        loop {
            while self.eat(TokenKind::Comma).is_some() {}
            if self.check(TokenKind::RightBracket) {
                break;
            }
            let first = self.expect_word()?;
            let (namespace, name) = if self.eat(TokenKind::ColonColon).is_some() {
                (Some(first.lexeme), self.expect_word()?)
            } else {
                (using, first)
            };
            let args = if self.check(TokenKind::LeftParen) {
                Some(self.expect_group(TokenKind::LeftParen)?)
            } else {
                None
            };
            self.eat(TokenKind::Ellipsis);
            out.push(Attribute {
                namespace,
                name: name.lexeme,
                args,
                role,
                span: first.span.to(self.previous().span),
            });
            if !self.check(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightBracket)?;
        self.expect(TokenKind::RightBracket)?;
        Ok(())
    }

    fn expect_word(&mut self) -> Result<Token<'ast>, ParseError> {
        if self.peek().kind.is_word() {
            Ok(self.advance())
        } else {
            Err(ParseError::expected_identifier(self.peek().span, self.peek().lexeme))
        }
    }

    // ========================================================================
    // Names
    // ========================================================================

    /// Parse a possibly qualified name.
    ///
    /// With `special`, the final segment may be a destructor or operator
    /// name, as in a declarator-id.
    pub(crate) fn parse_qualified_name(&mut self, special: bool) -> Result<QualifiedName<'ast>, ParseError> {
        let start = self.peek().span;
        let global = self.eat(TokenKind::ColonColon).is_some();
        let mut segments = Vec::new();
        loop {
            self.eat(TokenKind::Template);
            let segment = self.parse_name_segment(special)?;
            let last = segment.kind != NameKind::Identifier;
            segments.push(segment);
            if last || !self.check(TokenKind::ColonColon) {
                break;
            }
            let continues = match self.peek_nth(1).kind {
                TokenKind::Identifier | TokenKind::Template => true,
                TokenKind::Tilde | TokenKind::Operator => special,
                _ => false,
            };
            if !continues {
                break;
            }
            self.advance();
        }
        Ok(QualifiedName {
            global,
            segments: self.arena.alloc_slice_copy(&segments),
            span: start.to(self.previous().span),
        })
    }

    fn parse_name_segment(&mut self, special: bool) -> Result<NameSegment<'ast>, ParseError> {
        let token = self.peek();
        match token.kind {
            TokenKind::Identifier => {
                self.advance();
                let template_args = if self.check(TokenKind::Less) {
                    Some(self.parse_template_args()?)
                } else {
                    None
                };
                Ok(NameSegment {
                    name: token.lexeme,
                    kind: NameKind::Identifier,
                    template_args,
                    conversion: None,
                    span: token.span.to(self.previous().span),
                })
            }
            TokenKind::Tilde if special => {
                self.advance();
                let class = self.expect(TokenKind::Identifier)?;
                Ok(NameSegment {
                    name: self.arena.alloc_str(&format!("~{}", class.lexeme)),
                    kind: NameKind::Destructor,
                    template_args: None,
                    conversion: None,
                    span: token.span.to(class.span),
                })
            }
            TokenKind::Operator if special => self.parse_operator_name(),
            _ => Err(ParseError::expected_identifier(token.span, token.lexeme)),
        }
    }

    /// Parse `<args>` after a template name, returning the tokens between
    /// the brackets.
    pub(crate) fn parse_template_args(&mut self) -> Result<&'ast [Token<'ast>], ParseError> {
        self.expect(TokenKind::Less)?;
        if self.eat_closing_angle().is_some() {
            return Ok(&[]);
        }
        let args = self.capture_expression(&[TokenKind::Greater]);
        self.expect_closing_angle()?;
        Ok(args)
    }

    fn parse_operator_name(&mut self) -> Result<NameSegment<'ast>, ParseError> {
        let keyword = self.advance();
        let token = self.peek();
        let spelled = match token.kind {
            TokenKind::LeftParen if self.peek_nth(1).kind == TokenKind::RightParen => {
                self.advance();
                self.advance();
                "()".to_string()
            }
            TokenKind::LeftBracket if self.peek_nth(1).kind == TokenKind::RightBracket => {
                self.advance();
                self.advance();
                "[]".to_string()
            }
            TokenKind::New | TokenKind::Delete => {
                self.advance();
                if self.check(TokenKind::LeftBracket) && self.peek_nth(1).kind == TokenKind::RightBracket {
                    self.advance();
                    self.advance();
                    format!(" {}[]", token.lexeme)
                } else {
                    format!(" {}", token.lexeme)
                }
            }
            TokenKind::StringLiteral => {
                self.advance();
                let suffix = self.expect(TokenKind::Identifier)?;
                format!("\"\" {}", suffix.lexeme)
            }
            kind if kind.is_overloadable_operator() => {
                self.advance();
                token.lexeme.to_string()
            }
            _ => return self.parse_conversion_name(keyword),
        };
        Ok(NameSegment {
            name: self.arena.alloc_str(&format!("operator{spelled}")),
            kind: NameKind::Operator,
            template_args: None,
            conversion: None,
            span: keyword.span.to(self.previous().span),
        })
    }

    fn parse_conversion_name(&mut self, keyword: Token<'ast>) -> Result<NameSegment<'ast>, ParseError> {
        let specs = self.parse_decl_specs(true)?;
        if specs.type_spec.is_none() {
            return Err(ParseError::expected_type(self.peek().span, self.peek().lexeme));
        }
        let start = self.peek().span;
        let ptr_ops = self.parse_ptr_ops()?;
        let mut text = String::from("operator");
        for token in specs.tokens {
            text.push(' ');
            text.push_str(token.lexeme);
        }
        for op in ptr_ops {
            text.push_str(match op.kind {
                PtrOpKind::Pointer => " *",
                PtrOpKind::LValueRef => " &",
                PtrOpKind::RValueRef => " &&",
                PtrOpKind::MemberPointer(_) => " ::*",
            });
            if op.cv.contains(CvQualifiers::CONST) {
                text.push_str(" const");
            }
        }
        let declarator = Declarator {
            ptr_ops,
            pack: false,
            core: DeclaratorCore::Abstract,
            attributes: &[],
            suffixes: &[],
            span: start,
        };
        Ok(NameSegment {
            name: self.arena.alloc_str(&text),
            kind: NameKind::Conversion,
            template_args: None,
            conversion: Some(self.arena.alloc(TypeId { specs, declarator })),
            span: keyword.span.to(self.previous().span),
        })
    }

    // ========================================================================
    // Lookahead
    // ========================================================================

    /// The offset just past a qualified name starting `offset` tokens
    /// ahead, with the identifiers it contains.
    pub(crate) fn scan_name(&self, mut offset: usize) -> Option<(usize, Vec<&'ast str>)> {
        let mut names = Vec::new();
        if self.peek_nth(offset).kind == TokenKind::ColonColon {
            offset += 1;
        }
        loop {
            if self.peek_nth(offset).kind == TokenKind::Template {
                offset += 1;
            }
            let token = self.peek_nth(offset);
            if token.kind != TokenKind::Identifier {
                return None;
            }
            names.push(token.lexeme);
            offset += 1;
            if self.peek_nth(offset).kind == TokenKind::Less {
                offset = self.scan_angles(offset)?;
            }
            let next = self.peek_nth(offset + 1).kind;
            if self.peek_nth(offset).kind == TokenKind::ColonColon
                && matches!(next, TokenKind::Identifier | TokenKind::Template)
            {
                offset += 1;
                continue;
            }
            return Some((offset, names));
        }
    }

    /// The offset just past the `>` matching the `<` at `offset`.
    fn scan_angles(&self, mut offset: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut parens = 0usize;
        loop {
            let kind = self.peek_nth(offset).kind;
            offset += 1;
            match kind {
                TokenKind::Less if parens == 0 => depth += 1,
                TokenKind::Greater if parens == 0 => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(offset);
                    }
                }
                TokenKind::GreaterGreater if parens == 0 => {
                    if depth <= 2 {
                        return Some(offset);
                    }
                    depth -= 2;
                }
                TokenKind::LeftParen | TokenKind::LeftBracket => parens += 1,
                TokenKind::RightParen | TokenKind::RightBracket => parens = parens.checked_sub(1)?,
                TokenKind::Semicolon | TokenKind::LeftBrace | TokenKind::RightBrace | TokenKind::Eof => return None,
                _ => {}
            }
        }
    }

    /// The offset past a bracketed group opened at `offset`.
    pub(crate) fn scan_group(&self, mut offset: usize) -> usize {
        let mut depth = 0usize;
        loop {
            let kind = self.peek_nth(offset).kind;
            offset += 1;
            match kind {
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => depth += 1,
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return offset;
                    }
                }
                TokenKind::Eof => return offset - 1,
                _ => {}
            }
        }
    }

    /// Whether a name at the current position ends in `::~X` or
    /// `::operator`, so it names a member rather than a type.
    fn at_special_member_name(&self) -> bool {
        match self.scan_name(0) {
            Some((end, _)) => {
                self.peek_nth(end).kind == TokenKind::ColonColon
                    && matches!(self.peek_nth(end + 1).kind, TokenKind::Tilde | TokenKind::Operator)
            }
            None => false,
        }
    }

    fn at_member_pointer(&self) -> bool {
        match self.scan_name(0) {
            Some((end, _)) => {
                self.peek_nth(end).kind == TokenKind::ColonColon && self.peek_nth(end + 1).kind == TokenKind::Star
            }
            None => false,
        }
    }

    // ========================================================================
    // Decl-specifiers
    // ========================================================================

    /// Parse decl-specifiers. Without `allow_type`, only storage classes,
    /// function specifiers, cv-qualifiers and attributes are accepted.
    pub(crate) fn parse_decl_specs(&mut self, allow_type: bool) -> Result<DeclSpecs<'ast>, ParseError> {
        let start = self.peek().span;
        let consumed_before = self.progress();
        let mut specifiers = Specifiers::empty();
        let mut cv = CvQualifiers::empty();
        let mut type_spec = TypeSpec::None;
        let mut builtin: Vec<Token<'ast>> = Vec::new();
        let mut attributes: Vec<Attribute<'ast>> = Vec::new();
        let mut tokens: Vec<Token<'ast>> = Vec::new();

        loop {
            let token = self.peek();
            let untyped = type_spec.is_none() && builtin.is_empty();
            match token.kind {
                TokenKind::LeftBracket if self.peek_nth(1).kind == TokenKind::LeftBracket => {
                    attributes.extend_from_slice(self.parse_attributes(AttributeRole::Declaration)?);
                }
                TokenKind::Alignas | TokenKind::Identifier
                    if self.at_vendor_attribute() || token.is_ident("__extension__") =>
                {
                    self.parse_attributes(AttributeRole::Declaration)?;
                }
                kind if kind.is_specifier() => {
                    tokens.push(self.advance());
                    specifiers |= specifier_for(kind);
                    if kind == TokenKind::Explicit && self.check(TokenKind::LeftParen) {
                        self.skip_group();
                    }
                }
                TokenKind::Const => {
                    tokens.push(self.advance());
                    cv |= CvQualifiers::CONST;
                }
                TokenKind::Volatile => {
                    tokens.push(self.advance());
                    cv |= CvQualifiers::VOLATILE;
                }
                kind if allow_type && kind.is_builtin_type() && type_spec.is_none() => {
                    let keyword = self.advance();
                    builtin.push(keyword);
                    tokens.push(keyword);
                }
                kind if allow_type && untyped && (kind.is_class_key() || kind == TokenKind::Enum) => {
                    let (spec, head) = if kind == TokenKind::Enum {
                        self.parse_enum_specifier()?
                    } else {
                        self.parse_class_specifier()?
                    };
                    type_spec = spec;
                    tokens.extend_from_slice(head);
                }
                TokenKind::Typename if allow_type && untyped => {
                    tokens.push(self.advance());
                    let name_start = self.position;
                    type_spec = TypeSpec::Named(self.parse_qualified_name(false)?);
                    tokens.extend_from_slice(&self.buffer[name_start..self.position]);
                }
                TokenKind::Decltype if allow_type && untyped => {
                    let name_start = self.position;
                    self.advance();
                    type_spec = TypeSpec::Decltype(self.expect_group(TokenKind::LeftParen)?);
                    tokens.extend_from_slice(&self.buffer[name_start..self.position]);
                }
                TokenKind::Identifier | TokenKind::ColonColon
                    if allow_type && untyped && !self.at_special_member_name() && !self.at_member_pointer() =>
                {
                    let name_start = self.position;
                    type_spec = TypeSpec::Named(self.parse_qualified_name(false)?);
                    tokens.extend_from_slice(&self.buffer[name_start..self.position]);
                }
                _ => break,
            }
        }

        if !builtin.is_empty() {
            type_spec = TypeSpec::Builtin(self.arena.alloc_slice_copy(&builtin));
        }
        let span = if self.progress() == consumed_before {
            Span::point(start.line, start.col)
        } else {
            start.to(self.previous().span)
        };
        Ok(DeclSpecs {
            specifiers,
            cv,
            type_spec,
            attributes: self.arena.alloc_slice_copy(&attributes),
            tokens: self.arena.alloc_slice_copy(&tokens),
            span,
        })
    }

    /// Parse a type-id: decl-specifiers and an abstract declarator.
    pub(crate) fn parse_type_id(&mut self) -> Result<TypeId<'ast>, ParseError> {
        let specs = self.parse_decl_specs(true)?;
        if specs.type_spec.is_none() {
            return Err(ParseError::expected_type(self.peek().span, self.peek().lexeme));
        }
        let declarator = self.parse_declarator(DeclaratorKind::Abstract, false)?;
        Ok(TypeId { specs, declarator })
    }

    // ========================================================================
    // Declarators
    // ========================================================================

    /// Parse a declarator.
    ///
    /// With `paren_init`, a parameter list directly after the name is left
    /// unparsed so the caller can read it as an initializer.
    pub(crate) fn parse_declarator(
        &mut self,
        kind: DeclaratorKind,
        paren_init: bool,
    ) -> Result<Declarator<'ast>, ParseError> {
        let start = self.peek().span;
        let ptr_ops = self.parse_ptr_ops()?;
        let pack = self.eat(TokenKind::Ellipsis).is_some();

        let core = match self.peek().kind {
            TokenKind::LeftParen => {
                let next = self.peek_nth(1).kind;
                let pointer_inside =
                    matches!(next, TokenKind::Star | TokenKind::Amp | TokenKind::AmpAmp | TokenKind::Caret)
                        || (matches!(next, TokenKind::Identifier | TokenKind::ColonColon)
                            && self.member_pointer_at(1));
                match kind {
                    DeclaratorKind::Named => self.parse_nested_declarator(kind)?,
                    _ if pointer_inside => self.parse_nested_declarator(kind)?,
                    DeclaratorKind::Parameter if next == TokenKind::Identifier => {
                        // `int (x)`: a parameter named `x`, or an unnamed
                        // function taking an `x`.
                        let mut named = move |p: &mut Parser<'ast>| {
                            let core = p.parse_nested_declarator(DeclaratorKind::Parameter)?;
                            p.finish_declarator(start, ptr_ops, pack, core, false)
                        };
                        let mut function_type = move |p: &mut Parser<'ast>| {
                            p.finish_declarator(start, ptr_ops, pack, DeclaratorCore::Abstract, false)
                        };
                        return self.fork(&mut [
                            (Rule::ParenthesizedParameterName, &mut named),
                            (Rule::FunctionTypeParameter, &mut function_type),
                        ]);
                    }
                    _ => DeclaratorCore::Abstract,
                }
            }
            TokenKind::Identifier | TokenKind::ColonColon | TokenKind::Tilde | TokenKind::Operator
                if kind != DeclaratorKind::Abstract =>
            {
                DeclaratorCore::Name(self.parse_qualified_name(true)?)
            }
            _ if kind == DeclaratorKind::Named => {
                return Err(ParseError::expected_identifier(self.peek().span, self.peek().lexeme));
            }
            _ => DeclaratorCore::Abstract,
        };

        self.finish_declarator(start, ptr_ops, pack, core, paren_init)
    }

    /// Parse the attributes and suffixes after a declarator's core.
    fn finish_declarator(
        &mut self,
        start: Span,
        ptr_ops: &'ast [PtrOp<'ast>],
        pack: bool,
        core: DeclaratorCore<'ast>,
        paren_init: bool,
    ) -> Result<Declarator<'ast>, ParseError> {
        let attributes = match core {
            DeclaratorCore::Name(_) => self.parse_attributes(AttributeRole::Id)?,
            _ => &[],
        };

        let mut suffixes = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::LeftBracket if self.peek_nth(1).kind != TokenKind::LeftBracket => {
                    let open = self.advance();
                    let size = self.capture_expression(&[TokenKind::RightBracket]);
                    self.expect(TokenKind::RightBracket)?;
                    let attributes = self.parse_attributes(AttributeRole::Array)?;
                    suffixes.push(DeclSuffix::Array {
                        size: (!size.is_empty()).then_some(size),
                        attributes,
                        span: open.span.to(self.previous().span),
                    });
                }
                TokenKind::LeftParen => {
                    if paren_init && suffixes.is_empty() {
                        break;
                    }
                    let function = self.parse_function_suffix()?;
                    suffixes.push(DeclSuffix::Function(self.arena.alloc(function)));
                }
                _ => break,
            }
        }

        Ok(Declarator {
            ptr_ops,
            pack,
            core,
            attributes,
            suffixes: self.arena.alloc_slice_copy(&suffixes),
            span: start.to(self.previous().span),
        })
    }

    fn parse_nested_declarator(&mut self, kind: DeclaratorKind) -> Result<DeclaratorCore<'ast>, ParseError> {
        self.expect(TokenKind::LeftParen)?;
        let inner = self.parse_declarator(kind, false)?;
        self.expect(TokenKind::RightParen)?;
        Ok(DeclaratorCore::Nested(self.arena.alloc(inner)))
    }

    fn member_pointer_at(&self, offset: usize) -> bool {
        match self.scan_name(offset) {
            Some((end, _)) => {
                self.peek_nth(end).kind == TokenKind::ColonColon && self.peek_nth(end + 1).kind == TokenKind::Star
            }
            None => false,
        }
    }

    pub(crate) fn parse_ptr_ops(&mut self) -> Result<&'ast [PtrOp<'ast>], ParseError> {
        let mut ops = Vec::new();
        loop {
            let start = self.peek().span;
            let kind = match self.peek().kind {
                TokenKind::Star => {
                    self.advance();
                    PtrOpKind::Pointer
                }
                TokenKind::Amp => {
                    self.advance();
                    PtrOpKind::LValueRef
                }
                TokenKind::AmpAmp => {
                    self.advance();
                    PtrOpKind::RValueRef
                }
                TokenKind::Identifier | TokenKind::ColonColon if self.at_member_pointer() => {
                    let class = self.parse_qualified_name(false)?;
                    self.expect(TokenKind::ColonColon)?;
                    self.expect(TokenKind::Star)?;
                    PtrOpKind::MemberPointer(class)
                }
                _ => break,
            };
            let attributes = self.parse_attributes(AttributeRole::Reference)?;
            let mut cv = CvQualifiers::empty();
            loop {
                let token = self.peek();
                match token.kind {
                    TokenKind::Const => cv |= CvQualifiers::CONST,
                    TokenKind::Volatile => cv |= CvQualifiers::VOLATILE,
                    TokenKind::Identifier if is_restrict(token.lexeme) => {}
                    _ => break,
                }
                self.advance();
            }
            ops.push(PtrOp {
                kind,
                cv,
                attributes,
                span: start.to(self.previous().span),
            });
        }
        Ok(self.arena.alloc_slice_copy(&ops))
    }

    /// Parse `( params ) cv ref noexcept attributes -> trailing virt`.
    pub(crate) fn parse_function_suffix(&mut self) -> Result<FunctionSuffix<'ast>, ParseError> {
        let open = self.expect(TokenKind::LeftParen)?;
        let mut params = Vec::new();
        let mut variadic = false;
        if !self.check(TokenKind::RightParen) {
            loop {
                if self.eat(TokenKind::Ellipsis).is_some() {
                    variadic = true;
                    break;
                }
                params.push(self.parse_parameter(&[TokenKind::Comma, TokenKind::RightParen])?);
                if self.eat(TokenKind::Comma).is_none() {
                    variadic = self.eat(TokenKind::Ellipsis).is_some();
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;

        let mut cv = CvQualifiers::empty();
        let mut ref_qualifier = RefKind::None;
        let mut noexcept = false;
        loop {
            match self.peek().kind {
                TokenKind::Const => cv |= CvQualifiers::CONST,
                TokenKind::Volatile => cv |= CvQualifiers::VOLATILE,
                TokenKind::Amp => ref_qualifier = RefKind::LValue,
                TokenKind::AmpAmp => ref_qualifier = RefKind::RValue,
                TokenKind::Noexcept => {
                    self.advance();
                    noexcept = true;
                    if self.check(TokenKind::LeftParen) {
                        let condition = self.expect_group(TokenKind::LeftParen)?;
                        noexcept = !matches!(condition, [token] if token.kind == TokenKind::False);
                    }
                    continue;
                }
                TokenKind::Throw => {
                    self.advance();
                    noexcept = self.expect_group(TokenKind::LeftParen)?.is_empty();
                    continue;
                }
                _ => break,
            }
            self.advance();
        }

        let attributes = self.parse_attributes(AttributeRole::Function)?;
        let trailing_return = if self.eat(TokenKind::Arrow).is_some() {
            let target = self.parse_type_id()?;
            Some(&*self.arena.alloc(target))
        } else {
            None
        };
        let mut virt = VirtSpecifiers::default();
        loop {
            if self.eat_contextual("override").is_some() {
                virt.is_override = true;
            } else if self.eat_contextual("final").is_some() {
                virt.is_final = true;
            } else {
                break;
            }
        }

        Ok(FunctionSuffix {
            params: self.arena.alloc_slice_copy(&params),
            variadic,
            cv,
            ref_qualifier,
            noexcept,
            attributes,
            trailing_return,
            virt,
            span: open.span.to(self.previous().span),
        })
    }

    /// Parse one parameter. A default argument runs until a `stops` token
    /// at depth 0.
    pub(crate) fn parse_parameter(&mut self, stops: &[TokenKind]) -> Result<Param<'ast>, ParseError> {
        let start = self.peek().span;
        let specs = self.parse_decl_specs(true)?;
        if specs.type_spec.is_none() {
            return Err(ParseError::expected_type(self.peek().span, self.peek().lexeme));
        }
        let declarator = self.parse_declarator(DeclaratorKind::Parameter, false)?;
        let default = if self.eat(TokenKind::Equal).is_some() {
            Some(self.capture_expression(stops))
        } else {
            None
        };
        Ok(Param {
            specs,
            declarator,
            default,
            span: start.to(self.previous().span),
        })
    }
}

fn specifier_for(kind: TokenKind) -> Specifiers {
    match kind {
        TokenKind::Static => Specifiers::STATIC,
        TokenKind::Extern => Specifiers::EXTERN,
        TokenKind::Mutable => Specifiers::MUTABLE,
        TokenKind::ThreadLocal => Specifiers::THREAD_LOCAL,
        TokenKind::Register => Specifiers::REGISTER,
        TokenKind::Typedef => Specifiers::TYPEDEF,
        TokenKind::Inline => Specifiers::INLINE,
        TokenKind::Virtual => Specifiers::VIRTUAL,
        TokenKind::Explicit => Specifiers::EXPLICIT,
        TokenKind::Constexpr => Specifiers::CONSTEXPR,
        TokenKind::Friend => Specifiers::FRIEND,
        _ => Specifiers::empty(),
    }
}

fn is_restrict(word: &str) -> bool {
    matches!(word, "restrict" | "__restrict" | "__restrict__")
}

/// The class key for an elaborated or defined class.
pub(crate) fn class_kind(kind: TokenKind) -> ClassKind {
    match kind {
        TokenKind::Struct => ClassKind::Struct,
        TokenKind::Union => ClassKind::Union,
        _ => ClassKind::Class,
    }
}

pub(crate) fn elaborated_key(kind: TokenKind) -> ElaboratedKey {
    match kind {
        TokenKind::Enum => ElaboratedKey::Enum,
        other => ElaboratedKey::Class(class_kind(other)),
    }
}
