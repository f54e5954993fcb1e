//! Declaration parsing.
//!
//! Handles everything that can appear at namespace or class scope:
//! namespaces, linkage blocks, templates, using-declarations, access labels,
//! class and enum specifiers, and simple declarations.

use cxxdecl_core::{Access, ParseError, ParseErrorKind};

use crate::ast::fork::Rule;
use crate::ast::type_parser::{DeclaratorKind, class_kind, elaborated_key};
use crate::ast::{
    AccessLabel, AliasDecl, AttributeRole, BaseSpecifier, ClassDecl, DeclSpecs, Declarator, DeclaratorCore, EnumDecl,
    Enumerator, ExplicitInstantiation, Extent, FunctionBody, InitDeclarator, Initializer, Item, LinkageSpec, NameKind,
    NamespaceAlias, NamespaceDecl, Parser, QualifiedName, SimpleDecl, TemplateDecl, TemplateParam, TranslationUnit,
    TypeId, TypeSpec, UsingDecl, UsingDirective,
};
use crate::lexer::{Token, TokenKind};

/// Where a declaration appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope<'ast> {
    Namespace,
    /// Inside the body of the named class; empty for anonymous classes.
    Class(&'ast str),
}

/// How a simple declaration is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclMode {
    Ordinary,
    /// No type; the declarator names the enclosing class.
    Constructor,
}

impl<'ast> Parser<'ast> {
    /// Parse a complete translation unit.
    ///
    /// Without recovery the first syntax error aborts the parse. With
    /// recovery each failed declaration is skipped and its error is kept;
    /// read them with [`Parser::take_errors`].
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse_translation_unit(&mut self) -> Result<TranslationUnit<'ast>, ParseError> {
        let start = self.peek().span;
        let items = self.parse_items(Scope::Namespace, TokenKind::Eof)?;
        let span = start.to(self.peek().span);
        tracing::debug!(items = items.len(), errors = self.errors.len(), "parsed translation unit");
        Ok(TranslationUnit::new(items, span))
    }

    /// Parse items until `terminator` (not consumed).
    fn parse_items(&mut self, scope: Scope<'ast>, terminator: TokenKind) -> Result<&'ast [Item<'ast>], ParseError> {
        let mut items = Vec::new();
        while !self.check(terminator) {
            if self.is_eof() {
                return Err(self.unexpected(terminator.description()));
            }
            if scope == Scope::Namespace {
                self.check_cancelled()?;
            }
            let checkpoint = self.checkpoint();
            match self.parse_item(scope) {
                Ok(item) => items.push(item),
                Err(error) if !self.recovering() || error.kind == ParseErrorKind::Cancelled => return Err(error),
                Err(error) => {
                    tracing::debug!(%error, "skipping declaration");
                    self.errors.push(error);
                    self.restore(checkpoint);
                    self.skip_declaration();
                }
            }
        }
        Ok(self.arena.alloc_slice_copy(&items))
    }

    fn recovering(&self) -> bool {
        self.options.recover && self.speculating == 0
    }

    pub(crate) fn parse_item(&mut self, scope: Scope<'ast>) -> Result<Item<'ast>, ParseError> {
        let token = self.peek();
        match token.kind {
            TokenKind::Semicolon => {
                self.advance();
                Ok(Item::Empty(Extent::new(token.span, token.span)))
            }
            TokenKind::Namespace => self.parse_namespace(None),
            TokenKind::Inline if self.peek_nth(1).kind == TokenKind::Namespace => {
                let inline = self.advance();
                self.parse_namespace(Some(inline))
            }
            TokenKind::Extern if self.peek_nth(1).kind == TokenKind::StringLiteral => self.parse_linkage(scope),
            TokenKind::Extern if self.peek_nth(1).kind == TokenKind::Template => {
                self.advance();
                self.parse_template(scope, Some(token))
            }
            TokenKind::Template => self.parse_template(scope, None),
            TokenKind::Using => self.parse_using(),
            TokenKind::StaticAssert => {
                self.advance();
                self.expect_group(TokenKind::LeftParen)?;
                let end = self.expect(TokenKind::Semicolon)?;
                Ok(Item::StaticAssert(Extent::new(token.span, end.span)))
            }
            TokenKind::Public | TokenKind::Protected | TokenKind::Private
                if self.peek_nth(1).kind == TokenKind::Colon =>
            {
                self.advance();
                let colon = self.advance();
                let access = match token.kind {
                    TokenKind::Public => Access::Public,
                    TokenKind::Protected => Access::Protected,
                    _ => Access::Private,
                };
                Ok(Item::AccessLabel(AccessLabel {
                    access,
                    extent: Extent::new(token.span, colon.span),
                }))
            }
            _ => self.parse_declaration(scope),
        }
    }

    // ========================================================================
    // Namespaces and linkage
    // ========================================================================

    fn parse_namespace(&mut self, inline: Option<Token<'ast>>) -> Result<Item<'ast>, ParseError> {
        let keyword = self.expect(TokenKind::Namespace)?;
        let start = inline.map_or(keyword.span, |token| token.span);
        let mut attributes = self.parse_attributes(AttributeRole::Declaration)?.to_vec();

        let mut names = Vec::new();
        if self.check(TokenKind::Identifier) {
            names.push(self.advance());
            while self.eat(TokenKind::ColonColon).is_some() {
                self.eat(TokenKind::Inline);
                names.push(self.expect(TokenKind::Identifier)?);
            }
        }
        attributes.extend_from_slice(self.parse_attributes(AttributeRole::Declaration)?);

        if names.len() == 1 && self.eat(TokenKind::Equal).is_some() {
            let target = self.parse_qualified_name(false)?;
            let end = self.expect(TokenKind::Semicolon)?;
            return Ok(Item::NamespaceAlias(NamespaceAlias {
                name: names[0],
                target,
                extent: Extent::new(start, end.span),
            }));
        }

        self.expect(TokenKind::LeftBrace)?;
        let items = self.parse_items(Scope::Namespace, TokenKind::RightBrace)?;
        let end = self.expect(TokenKind::RightBrace)?;
        Ok(Item::Namespace(NamespaceDecl {
            names: self.arena.alloc_slice_copy(&names),
            is_inline: inline.is_some(),
            attributes: self.arena.alloc_slice_copy(&attributes),
            items,
            extent: Extent::new(start, end.span),
        }))
    }

    fn parse_linkage(&mut self, scope: Scope<'ast>) -> Result<Item<'ast>, ParseError> {
        let keyword = self.advance();
        let language = self.advance();
        if self.eat(TokenKind::LeftBrace).is_some() {
            let items = self.parse_items(scope, TokenKind::RightBrace)?;
            let end = self.expect(TokenKind::RightBrace)?;
            return Ok(Item::Linkage(LinkageSpec {
                language,
                items,
                braced: true,
                extent: Extent::new(keyword.span, end.span),
            }));
        }
        let item = self.parse_item(scope)?;
        Ok(Item::Linkage(LinkageSpec {
            language,
            items: self.arena.alloc_slice_copy(&[item]),
            braced: false,
            extent: Extent::new(keyword.span, item.extent().end),
        }))
    }

    // ========================================================================
    // Templates
    // ========================================================================

    fn parse_template(&mut self, scope: Scope<'ast>, extern_keyword: Option<Token<'ast>>) -> Result<Item<'ast>, ParseError> {
        let keyword = self.expect(TokenKind::Template)?;
        let start = extern_keyword.map_or(keyword.span, |token| token.span);

        if !self.check(TokenKind::Less) {
            let item = self.parse_item(scope)?;
            return Ok(Item::ExplicitInstantiation(ExplicitInstantiation {
                is_extern: extern_keyword.is_some(),
                item: self.arena.alloc(item),
                extent: Extent::new(start, item.extent().end),
            }));
        }

        self.advance();
        let params: &'ast [TemplateParam<'ast>] = if self.eat_closing_angle().is_some() {
            &[]
        } else {
            self.parse_template_params()?
        };
        let item = self.parse_item(scope)?;
        Ok(Item::Template(TemplateDecl {
            params,
            item: self.arena.alloc(item),
            extent: Extent::new(start, item.extent().end),
        }))
    }

    /// Parse template parameters after `<`, through the closing `>`.
    fn parse_template_params(&mut self) -> Result<&'ast [TemplateParam<'ast>], ParseError> {
        let mut params = Vec::new();
        loop {
            params.push(self.parse_template_param()?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect_closing_angle()?;
        Ok(self.arena.alloc_slice_copy(&params))
    }

    fn parse_template_param(&mut self) -> Result<TemplateParam<'ast>, ParseError> {
        const STOPS: &[TokenKind] = &[TokenKind::Comma, TokenKind::Greater];
        let start = self.peek().span;
        match self.peek().kind {
            TokenKind::Template => {
                self.advance();
                self.expect(TokenKind::Less)?;
                let params: &'ast [TemplateParam<'ast>] = if self.eat_closing_angle().is_some() {
                    &[]
                } else {
                    self.parse_template_params()?
                };
                if !matches!(self.peek().kind, TokenKind::Class | TokenKind::Typename) {
                    return Err(self.unexpected("'class' or 'typename'"));
                }
                let key = self.advance();
                let is_pack = self.eat(TokenKind::Ellipsis).is_some();
                let name = self.eat(TokenKind::Identifier);
                let default = match self.eat(TokenKind::Equal) {
                    Some(_) => Some(self.capture_expression(STOPS)),
                    None => None,
                };
                Ok(TemplateParam::Template {
                    params,
                    key,
                    is_pack,
                    name,
                    default,
                    span: start.to(self.previous().span),
                })
            }
            TokenKind::Class | TokenKind::Typename if self.at_type_parameter() => {
                let key = self.advance();
                let is_pack = self.eat(TokenKind::Ellipsis).is_some();
                let name = self.eat(TokenKind::Identifier);
                let default = match self.eat(TokenKind::Equal) {
                    Some(_) => Some(self.capture_expression(STOPS)),
                    None => None,
                };
                Ok(TemplateParam::Type {
                    key,
                    is_pack,
                    name,
                    default,
                    span: start.to(self.previous().span),
                })
            }
            _ => Ok(TemplateParam::NonType(self.parse_parameter(STOPS)?)),
        }
    }

    /// `typename T`, as opposed to `typename T::size_type N`.
    fn at_type_parameter(&self) -> bool {
        let ends = |kind: TokenKind| {
            matches!(
                kind,
                TokenKind::Comma | TokenKind::Greater | TokenKind::GreaterGreater | TokenKind::Equal
            )
        };
        match self.peek_nth(1).kind {
            TokenKind::Ellipsis => true,
            TokenKind::Identifier => ends(self.peek_nth(2).kind),
            kind => ends(kind),
        }
    }

    // ========================================================================
    // Using
    // ========================================================================

    fn parse_using(&mut self) -> Result<Item<'ast>, ParseError> {
        let keyword = self.expect(TokenKind::Using)?;

        if self.eat(TokenKind::Namespace).is_some() {
            let name = self.parse_qualified_name(false)?;
            let end = self.expect(TokenKind::Semicolon)?;
            return Ok(Item::UsingDirective(UsingDirective {
                name,
                extent: Extent::new(keyword.span, end.span),
            }));
        }

        let alias_follows = matches!(self.peek_nth(1).kind, TokenKind::Equal | TokenKind::LeftBracket);
        if self.check(TokenKind::Identifier) && alias_follows {
            let name = self.advance();
            let attributes = self.parse_attributes(AttributeRole::Id)?;
            self.expect(TokenKind::Equal)?;
            let target = self.parse_type_id()?;
            let end = self.expect(TokenKind::Semicolon)?;
            return Ok(Item::Alias(AliasDecl {
                name,
                attributes,
                target,
                extent: Extent::new(keyword.span, end.span),
            }));
        }

        let is_typename = self.eat(TokenKind::Typename).is_some();
        let name = self.parse_qualified_name(true)?;
        let end = self.expect(TokenKind::Semicolon)?;
        Ok(Item::Using(UsingDecl {
            name,
            is_typename,
            extent: Extent::new(keyword.span, end.span),
        }))
    }

    // ========================================================================
    // Class and enum specifiers
    // ========================================================================

    /// Parse a class specifier starting at its key. Returns the type and
    /// the head tokens (key and name) for the signature.
    pub(crate) fn parse_class_specifier(&mut self) -> Result<(TypeSpec<'ast>, &'ast [Token<'ast>]), ParseError> {
        let key = self.advance();
        let kind = class_kind(key.kind);
        let mut attributes = self.parse_attributes(AttributeRole::Class)?.to_vec();
        let mut head = vec![key];

        let mut name = None;
        while self.at_class_name() {
            let name_start = self.position;
            let parsed = self.parse_qualified_name(false)?;
            attributes.extend_from_slice(self.parse_attributes(AttributeRole::Class)?);
            // `class EXPORT_MACRO Foo {`: an unexpanded macro before the name
            if self.at_class_name() && self.at_defined_class_name() {
                continue;
            }
            head.extend_from_slice(&self.buffer[name_start..self.position]);
            name = Some(parsed);
        }

        let is_final = if self.check_contextual("final")
            && matches!(self.peek_nth(1).kind, TokenKind::LeftBrace | TokenKind::Colon)
        {
            self.advance();
            true
        } else {
            false
        };
        attributes.extend_from_slice(self.parse_attributes(AttributeRole::Class)?);
        let attributes = self.arena.alloc_slice_copy(&attributes);
        let head = self.arena.alloc_slice_copy(&head);

        let defines = self.check(TokenKind::LeftBrace) || self.check(TokenKind::Colon);
        if !defines {
            let name = name.ok_or_else(|| self.unexpected("class name or '{'"))?;
            if self.check(TokenKind::Semicolon) {
                let decl = ClassDecl {
                    kind,
                    attributes,
                    name: Some(name),
                    is_final,
                    bases: &[],
                    members: None,
                    extent: Extent::new(key.span, self.previous().span),
                };
                return Ok((TypeSpec::Class(self.arena.alloc(decl)), head));
            }
            return Ok((
                TypeSpec::Elaborated {
                    key: elaborated_key(key.kind),
                    name,
                },
                head,
            ));
        }

        let bases: &'ast [BaseSpecifier<'ast>] = if self.eat(TokenKind::Colon).is_some() {
            self.parse_base_clause()?
        } else {
            &[]
        };
        self.expect(TokenKind::LeftBrace)?;
        let class_name = name.map_or("", |name| name.simple_name());
        let members = self.parse_items(Scope::Class(class_name), TokenKind::RightBrace)?;
        let end = self.expect(TokenKind::RightBrace)?;
        let decl = ClassDecl {
            kind,
            attributes,
            name,
            is_final,
            bases,
            members: Some(members),
            extent: Extent::new(key.span, end.span),
        };
        Ok((TypeSpec::Class(self.arena.alloc(decl)), head))
    }

    /// An identifier that can name a class here, not `final` introducing a
    /// base clause or body.
    fn at_class_name(&self) -> bool {
        match self.peek().kind {
            TokenKind::ColonColon => true,
            TokenKind::Identifier => {
                !(self.check_contextual("final")
                    && matches!(self.peek_nth(1).kind, TokenKind::LeftBrace | TokenKind::Colon))
                    && !self.at_vendor_attribute()
            }
            _ => false,
        }
    }

    /// A name followed by a base clause, body or `final`, so that
    /// `struct stat buf;` is not read as a macro before `buf`.
    fn at_defined_class_name(&self) -> bool {
        let Some((end, _)) = self.scan_name(0) else {
            return false;
        };
        let next = self.peek_nth(end);
        matches!(next.kind, TokenKind::LeftBrace | TokenKind::Colon) || next.is_ident("final")
    }

    fn parse_base_clause(&mut self) -> Result<&'ast [BaseSpecifier<'ast>], ParseError> {
        let mut bases = Vec::new();
        loop {
            let mut access = None;
            let mut is_virtual = false;
            loop {
                match self.peek().kind {
                    TokenKind::Public => access = Some(Access::Public),
                    TokenKind::Protected => access = Some(Access::Protected),
                    TokenKind::Private => access = Some(Access::Private),
                    TokenKind::Virtual => is_virtual = true,
                    _ => break,
                }
                self.advance();
            }
            self.parse_attributes(AttributeRole::Class)?;
            let name = self.parse_qualified_name(false)?;
            let is_pack = self.eat(TokenKind::Ellipsis).is_some();
            bases.push(BaseSpecifier {
                access,
                is_virtual,
                name,
                is_pack,
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        Ok(self.arena.alloc_slice_copy(&bases))
    }

    /// Parse an enum specifier starting at `enum`.
    pub(crate) fn parse_enum_specifier(&mut self) -> Result<(TypeSpec<'ast>, &'ast [Token<'ast>]), ParseError> {
        let key = self.advance();
        let mut head = vec![key];
        let is_scoped = matches!(self.peek().kind, TokenKind::Class | TokenKind::Struct);
        if is_scoped {
            head.push(self.advance());
        }
        let mut attributes = self.parse_attributes(AttributeRole::Class)?.to_vec();
        let name = if matches!(self.peek().kind, TokenKind::Identifier | TokenKind::ColonColon) {
            let name_start = self.position;
            let name = self.parse_qualified_name(false)?;
            head.extend_from_slice(&self.buffer[name_start..self.position]);
            Some(name)
        } else {
            None
        };
        attributes.extend_from_slice(self.parse_attributes(AttributeRole::Class)?);
        let attributes = self.arena.alloc_slice_copy(&attributes);
        let head = self.arena.alloc_slice_copy(&head);

        let underlying = if self.eat(TokenKind::Colon).is_some() {
            let specs = self.parse_decl_specs(true)?;
            if specs.type_spec.is_none() {
                return Err(ParseError::expected_type(self.peek().span, self.peek().lexeme));
            }
            let declarator = Declarator {
                ptr_ops: &[],
                pack: false,
                core: DeclaratorCore::Abstract,
                attributes: &[],
                suffixes: &[],
                span: specs.span,
            };
            Some(&*self.arena.alloc(TypeId { specs, declarator }))
        } else {
            None
        };

        if !self.check(TokenKind::LeftBrace) {
            let name = name.ok_or_else(|| self.unexpected("enum name or '{'"))?;
            if self.check(TokenKind::Semicolon) && (is_scoped || underlying.is_some()) {
                let decl = EnumDecl {
                    is_scoped,
                    attributes,
                    name: Some(name),
                    underlying,
                    enumerators: None,
                    extent: Extent::new(key.span, self.previous().span),
                };
                return Ok((TypeSpec::Enum(self.arena.alloc(decl)), head));
            }
            return Ok((
                TypeSpec::Elaborated {
                    key: elaborated_key(key.kind),
                    name,
                },
                head,
            ));
        }

        self.advance();
        let mut enumerators = Vec::new();
        while !self.check(TokenKind::RightBrace) {
            let name = self.expect(TokenKind::Identifier)?;
            let attributes = self.parse_attributes(AttributeRole::Id)?;
            let value = match self.eat(TokenKind::Equal) {
                Some(_) => Some(self.capture_expression(&[TokenKind::Comma])),
                None => None,
            };
            let end = self.previous().span;
            let comma = self.eat(TokenKind::Comma);
            enumerators.push(Enumerator {
                name,
                attributes,
                value,
                extent: Extent::new(name.span, comma.map_or(end, |comma| comma.span)),
            });
            if comma.is_none() {
                break;
            }
        }
        let end = self.expect(TokenKind::RightBrace)?;
        let decl = EnumDecl {
            is_scoped,
            attributes,
            name,
            underlying,
            enumerators: Some(self.arena.alloc_slice_copy(&enumerators)),
            extent: Extent::new(key.span, end.span),
        };
        Ok((TypeSpec::Enum(self.arena.alloc(decl)), head))
    }

    // ========================================================================
    // Simple declarations
    // ========================================================================

    fn parse_declaration(&mut self, scope: Scope<'ast>) -> Result<Item<'ast>, ParseError> {
        if self.at_constructor(scope) {
            let mut constructor = |p: &mut Parser<'ast>| p.parse_simple_declaration(scope, DeclMode::Constructor);
            let mut ordinary = |p: &mut Parser<'ast>| p.parse_simple_declaration(scope, DeclMode::Ordinary);
            let decl = self.fork(&mut [
                (Rule::Constructor, &mut constructor),
                (Rule::Declaration, &mut ordinary),
            ])?;
            return Ok(Item::Simple(decl));
        }
        Ok(Item::Simple(self.parse_simple_declaration(scope, DeclMode::Ordinary)?))
    }

    /// Whether the tokens ahead could start a constructor: the enclosing
    /// class's name in class scope, or `X::X` at namespace scope, followed
    /// by `(`.
    fn at_constructor(&self, scope: Scope<'ast>) -> bool {
        let mut offset = 0;
        loop {
            let token = self.peek_nth(offset);
            match token.kind {
                TokenKind::Inline | TokenKind::Constexpr | TokenKind::Explicit | TokenKind::Friend => {
                    offset += 1;
                    if token.kind == TokenKind::Explicit && self.peek_nth(offset).kind == TokenKind::LeftParen {
                        offset = self.scan_group(offset);
                    }
                }
                TokenKind::LeftBracket if self.peek_nth(offset + 1).kind == TokenKind::LeftBracket => {
                    offset = self.scan_group(offset);
                }
                TokenKind::Alignas | TokenKind::Identifier
                    if (token.is_ident("__attribute__") || token.is_ident("__declspec") || token.kind == TokenKind::Alignas)
                        && self.peek_nth(offset + 1).kind == TokenKind::LeftParen =>
                {
                    offset = self.scan_group(offset + 1);
                }
                _ => break,
            }
        }

        let Some((end, names)) = self.scan_name(offset) else {
            return false;
        };
        if self.peek_nth(end).kind != TokenKind::LeftParen {
            return false;
        }
        match scope {
            Scope::Class(class) => names.len() == 1 && !class.is_empty() && names[0] == class,
            Scope::Namespace => names.len() >= 2 && names[names.len() - 1] == names[names.len() - 2],
        }
    }

    fn parse_simple_declaration(&mut self, scope: Scope<'ast>, mode: DeclMode) -> Result<SimpleDecl<'ast>, ParseError> {
        let start = self.peek().span;
        let specs = self.parse_decl_specs(mode == DeclMode::Ordinary)?;
        if mode == DeclMode::Constructor && !specs.type_spec.is_none() {
            return Err(self.error(ParseErrorKind::InvalidDeclaration, "constructor with a return type"));
        }

        let mut declarators = Vec::new();
        let mut defined = false;
        if !self.check(TokenKind::Semicolon) {
            loop {
                let init = match mode {
                    DeclMode::Constructor => self.parse_constructor_declarator(scope)?,
                    DeclMode::Ordinary if specs.type_spec.is_none() => self.parse_untyped_declarator(&specs)?,
                    DeclMode::Ordinary => self.parse_init_declarator()?,
                };
                declarators.push(init);
                if init.body == FunctionBody::Defined {
                    defined = true;
                    break;
                }
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        } else if specs.type_spec.is_none() {
            return Err(ParseError::expected_type(self.peek().span, self.peek().lexeme));
        }

        let end = if defined {
            self.previous().span
        } else {
            self.expect(TokenKind::Semicolon)
                .map_err(|error| ParseError::new(ParseErrorKind::MissingSemicolon, error.span, error.message))?
                .span
        };
        Ok(SimpleDecl {
            specs,
            declarators: self.arena.alloc_slice_copy(&declarators),
            extent: Extent::new(start, end),
        })
    }

    /// A declarator after typed decl-specifiers, resolving `Foo bar(baz)`
    /// between a function and a variable with a parenthesized initializer.
    fn parse_init_declarator(&mut self) -> Result<InitDeclarator<'ast>, ParseError> {
        let mut function = |p: &mut Parser<'ast>| {
            let declarator = p.parse_declarator(DeclaratorKind::Named, false)?;
            p.parse_declarator_tail(declarator)
        };
        let mut variable = |p: &mut Parser<'ast>| {
            let declarator = p.parse_declarator(DeclaratorKind::Named, true)?;
            let args = p.expect_group(TokenKind::LeftParen)?;
            Ok(InitDeclarator {
                declarator,
                bit_width: None,
                init: Some(Initializer::Paren(args)),
                body: FunctionBody::None,
                end: p.previous().span,
            })
        };
        self.fork(&mut [
            (Rule::FunctionDeclarator, &mut function),
            (Rule::VariableInitializer, &mut variable),
        ])
    }

    fn parse_constructor_declarator(&mut self, scope: Scope<'ast>) -> Result<InitDeclarator<'ast>, ParseError> {
        let declarator = self.parse_declarator(DeclaratorKind::Named, false)?;
        let names_class = match (declarator.name(), scope) {
            (Some(name), Scope::Class(class)) => !name.is_qualified() && name.simple_name() == class,
            (Some(name), Scope::Namespace) => {
                let segments = name.segments;
                segments.len() >= 2 && segments[segments.len() - 1].name == segments[segments.len() - 2].name
            }
            (None, _) => false,
        };
        if !names_class || !declarator.ptr_ops.is_empty() || !declarator.is_function() {
            return Err(ParseError::new(
                ParseErrorKind::InvalidDeclaration,
                declarator.span,
                "not a constructor declarator",
            ));
        }
        self.parse_declarator_tail(declarator)
    }

    /// Destructors and conversion operators are the only declarations
    /// without a type.
    fn parse_untyped_declarator(&mut self, specs: &DeclSpecs<'ast>) -> Result<InitDeclarator<'ast>, ParseError> {
        let declarator = self.parse_declarator(DeclaratorKind::Named, false)?;
        let untyped = declarator.name().is_some_and(|name: &QualifiedName<'ast>| {
            matches!(name.last().kind, NameKind::Destructor | NameKind::Conversion)
        });
        if !untyped {
            return Err(ParseError::expected_type(specs.span, specs.tokens.first().map_or("", |t| t.lexeme)));
        }
        self.parse_declarator_tail(declarator)
    }

    /// Parse what follows a declarator: a function's `= 0` or body, or a
    /// variable's bit width and initializer.
    fn parse_declarator_tail(&mut self, declarator: Declarator<'ast>) -> Result<InitDeclarator<'ast>, ParseError> {
        if declarator.is_function() {
            let body = match self.peek().kind {
                TokenKind::Equal => {
                    self.advance();
                    let token = self.advance();
                    match token.kind {
                        TokenKind::IntLiteral if token.lexeme == "0" => FunctionBody::Pure,
                        TokenKind::Delete => FunctionBody::Deleted,
                        TokenKind::Default => FunctionBody::Defaulted,
                        _ => {
                            return Err(ParseError::expected_token(
                                token.span,
                                "'0', 'delete' or 'default'",
                                token.lexeme,
                            ));
                        }
                    }
                }
                TokenKind::Colon => {
                    self.skip_member_initializers()?;
                    self.expect_group(TokenKind::LeftBrace)?;
                    FunctionBody::Defined
                }
                TokenKind::LeftBrace => {
                    self.expect_group(TokenKind::LeftBrace)?;
                    FunctionBody::Defined
                }
                TokenKind::Identifier if self.check_contextual("try") => {
                    self.advance();
                    if self.check(TokenKind::Colon) {
                        self.skip_member_initializers()?;
                    }
                    self.expect_group(TokenKind::LeftBrace)?;
                    while self.eat_contextual("catch").is_some() {
                        self.expect_group(TokenKind::LeftParen)?;
                        self.expect_group(TokenKind::LeftBrace)?;
                    }
                    FunctionBody::Defined
                }
                _ => FunctionBody::None,
            };
            return Ok(InitDeclarator {
                declarator,
                bit_width: None,
                init: None,
                body,
                end: self.previous().span,
            });
        }

        let bit_width = if self.eat(TokenKind::Colon).is_some() {
            Some(self.capture_expression(&[TokenKind::Comma, TokenKind::Equal, TokenKind::LeftBrace]))
        } else {
            None
        };
        let init = match self.peek().kind {
            TokenKind::Equal => {
                self.advance();
                Some(Initializer::Equals(self.capture_expression(&[TokenKind::Comma])))
            }
            TokenKind::LeftBrace => Some(Initializer::Braced(self.expect_group(TokenKind::LeftBrace)?)),
            _ => None,
        };
        Ok(InitDeclarator {
            declarator,
            bit_width,
            init,
            body: FunctionBody::None,
            end: self.previous().span,
        })
    }

    /// Skip `: member(args), base{args}` before a constructor body.
    fn skip_member_initializers(&mut self) -> Result<(), ParseError> {
        self.expect(TokenKind::Colon)?;
        loop {
            self.parse_qualified_name(false)?;
            match self.peek().kind {
                TokenKind::LeftParen | TokenKind::LeftBrace => {
                    self.skip_group();
                }
                _ => return Err(self.unexpected("'(' or '{'")),
            }
            self.eat(TokenKind::Ellipsis);
            if self.eat(TokenKind::Comma).is_none() {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DeclSuffix, ParserOptions};
    use crate::lexer::Lexer;
    use bumpalo::Bump;
    use cxxdecl_core::{ClassKind, Specifiers};

    fn parse<'ast>(source: &str, arena: &'ast Bump) -> TranslationUnit<'ast> {
        let tokens: Vec<_> = Lexer::new(source, arena).filter(|t| !t.kind.is_trivia()).collect();
        let mut parser = Parser::new(tokens, arena);
        match parser.parse_translation_unit() {
            Ok(unit) => unit,
            Err(error) => panic!("parse failed: {}", error.display_with_source(source)),
        }
    }

    fn simple<'a, 'ast>(item: &'a Item<'ast>) -> &'a SimpleDecl<'ast> {
        match item {
            Item::Simple(decl) => decl,
            other => panic!("expected simple declaration, got {other:?}"),
        }
    }

    fn class<'ast>(item: &Item<'ast>) -> &'ast ClassDecl<'ast> {
        match simple(item).specs.type_spec {
            TypeSpec::Class(decl) => decl,
            other => panic!("expected class, got {other:?}"),
        }
    }

    #[test]
    fn function_declarator_wins_over_paren_initializer() {
        let arena = Bump::new();
        let unit = parse("Foo bar(baz);", &arena);
        let decl = simple(&unit.items()[0]);
        assert!(decl.declarators[0].declarator.is_function());
        assert!(decl.declarators[0].init.is_none());
    }

    #[test]
    fn literal_argument_makes_a_variable() {
        let arena = Bump::new();
        let unit = parse("Foo bar(5);", &arena);
        let init = &simple(&unit.items()[0]).declarators[0];
        assert!(!init.declarator.is_function());
        assert!(matches!(init.init, Some(Initializer::Paren(tokens)) if tokens[0].lexeme == "5"));
    }

    #[test]
    fn class_members_and_constructors() {
        let arena = Bump::new();
        let unit = parse(
            "class Foo : public Base, private virtual Other {
             public:
               Foo(int x);
               explicit Foo(const Foo &) = delete;
               virtual ~Foo();
               virtual int Get() const = 0;
               operator bool() const;
             protected:
               int Value : 4;
             };",
            &arena,
        );
        let decl = class(&unit.items()[0]);
        assert_eq!(decl.kind, ClassKind::Class);
        assert_eq!(decl.bases.len(), 2);
        assert_eq!(decl.bases[1].access, Some(Access::Private));
        assert!(decl.bases[1].is_virtual);

        let members = decl.members.unwrap_or_default();
        assert!(matches!(members[0], Item::AccessLabel(AccessLabel { access: Access::Public, .. })));
        let ctor = simple(&members[1]);
        assert!(ctor.specs.type_spec.is_none());
        assert_eq!(ctor.declarators[0].declarator.name().unwrap().simple_name(), "Foo");
        let deleted = simple(&members[2]);
        assert!(deleted.specs.has(Specifiers::EXPLICIT));
        assert_eq!(deleted.declarators[0].body, FunctionBody::Deleted);
        let dtor = simple(&members[3]);
        assert_eq!(dtor.declarators[0].declarator.name().unwrap().simple_name(), "~Foo");
        assert_eq!(simple(&members[4]).declarators[0].body, FunctionBody::Pure);
        let conversion = simple(&members[5]).declarators[0].declarator.name().unwrap();
        assert_eq!(conversion.last().kind, NameKind::Conversion);
        let field = &simple(&members[7]).declarators[0];
        assert_eq!(field.bit_width.map(|t| t[0].lexeme), Some("4"));
    }

    #[test]
    fn out_of_line_constructor_definition() {
        let arena = Bump::new();
        let unit = parse("Foo::Foo(int x) : Base(x), value{x} { init(); }", &arena);
        let decl = simple(&unit.items()[0]);
        let init = &decl.declarators[0];
        assert!(decl.specs.type_spec.is_none());
        assert_eq!(init.body, FunctionBody::Defined);
        assert_eq!(init.declarator.name().unwrap().segments.len(), 2);
    }

    #[test]
    fn namespaces_linkage_and_aliases() {
        let arena = Bump::new();
        let unit = parse(
            r#"namespace a::b { int x; }
               inline namespace v1 {}
               namespace fs = std::filesystem;
               extern "C" { void f(); }
               extern "C" int g;"#,
            &arena,
        );
        let items = unit.items();
        let Item::Namespace(ns) = items[0] else { panic!("expected namespace") };
        assert_eq!(ns.names.len(), 2);
        assert_eq!(ns.items.len(), 1);
        assert!(matches!(items[1], Item::Namespace(NamespaceDecl { is_inline: true, .. })));
        assert!(matches!(items[2], Item::NamespaceAlias(alias) if alias.name.lexeme == "fs"));
        assert!(matches!(items[3], Item::Linkage(LinkageSpec { braced: true, .. })));
        assert!(matches!(items[4], Item::Linkage(LinkageSpec { braced: false, .. })));
    }

    #[test]
    fn templates() {
        let arena = Bump::new();
        let unit = parse(
            "template <typename T, int N = 4, template <class> class C, typename... Rest>
             class Array;
             template <> struct Traits<int> {};
             template class Array<int, 2>;
             template <typename T> std::vector<std::vector<T>> nest(T);",
            &arena,
        );
        let items = unit.items();
        let Item::Template(template) = items[0] else { panic!("expected template") };
        assert_eq!(template.params.len(), 4);
        assert!(matches!(template.params[0], TemplateParam::Type { name: Some(n), .. } if n.lexeme == "T"));
        assert!(matches!(template.params[1], TemplateParam::NonType(p) if p.default.is_some()));
        assert!(matches!(template.params[2], TemplateParam::Template { .. }));
        assert!(matches!(template.params[3], TemplateParam::Type { is_pack: true, .. }));
        let Item::Template(specialization) = items[1] else { panic!("expected template") };
        assert!(specialization.is_specialization());
        assert!(matches!(items[2], Item::ExplicitInstantiation(ExplicitInstantiation { is_extern: false, .. })));
        let Item::Template(nest) = items[3] else { panic!("expected template") };
        assert!(simple(nest.item).declarators[0].declarator.is_function());
    }

    #[test]
    fn using_forms() {
        let arena = Bump::new();
        let unit = parse(
            "using namespace std; using Int = int; using Base::Base; using typename T::type;",
            &arena,
        );
        let items = unit.items();
        assert!(matches!(items[0], Item::UsingDirective(_)));
        assert!(matches!(items[1], Item::Alias(alias) if alias.name.lexeme == "Int"));
        assert!(matches!(items[2], Item::Using(UsingDecl { is_typename: false, .. })));
        assert!(matches!(items[3], Item::Using(UsingDecl { is_typename: true, .. })));
    }

    #[test]
    fn enums() {
        let arena = Bump::new();
        let unit = parse(
            "enum Color { Red, Green = 2, Blue = Green << 1, };
             enum class Mode : unsigned char;
             typedef enum { A, B } Letters;",
            &arena,
        );
        let items = unit.items();
        let TypeSpec::Enum(color) = simple(&items[0]).specs.type_spec else { panic!("expected enum") };
        let enumerators = color.enumerators.unwrap_or_default();
        assert_eq!(enumerators.len(), 3);
        assert_eq!(enumerators[2].value.map(|t| t.len()), Some(3));
        let TypeSpec::Enum(mode) = simple(&items[1]).specs.type_spec else { panic!("expected enum") };
        assert!(mode.is_scoped && mode.enumerators.is_none() && mode.underlying.is_some());
        let letters = simple(&items[2]);
        assert!(letters.specs.has(Specifiers::TYPEDEF));
        assert!(matches!(letters.specs.type_spec, TypeSpec::Enum(e) if e.name.is_none()));
    }

    #[test]
    fn export_macro_before_class_name() {
        let arena = Bump::new();
        let unit = parse("class COMMON_EXPORT Widget final : public Base {};", &arena);
        let decl = class(&unit.items()[0]);
        assert_eq!(decl.name.map(|n| n.simple_name()), Some("Widget"));
        assert!(decl.is_final);
    }

    #[test]
    fn function_pointer_member_is_a_variable() {
        let arena = Bump::new();
        let unit = parse("struct S { void (*callback)(int, void *); int (&arr)[3]; };", &arena);
        let members = class(&unit.items()[0]).members.unwrap_or_default();
        let callback = simple(&members[0]).declarators[0].declarator;
        assert!(!callback.is_function());
        assert!(matches!(callback.core, DeclaratorCore::Nested(_)));
        assert!(matches!(callback.suffixes[0], DeclSuffix::Function(_)));
    }

    #[test]
    fn strict_mode_stops_at_first_error() {
        let arena = Bump::new();
        let tokens: Vec<_> = Lexer::new("int x = ; }", &arena).collect();
        let tokens: Vec<_> = tokens.into_iter().filter(|t| !t.kind.is_trivia()).collect();
        let mut parser = Parser::new(tokens, &arena);
        assert!(parser.parse_translation_unit().is_err());
    }

    #[test]
    fn recovery_skips_bad_declarations() {
        let arena = Bump::new();
        let tokens: Vec<_> = Lexer::new("int ok1; int = 5; struct { } }; int ok2;", &arena).collect();
        let mut parser = Parser::new(tokens, &arena).with_options(ParserOptions {
            recover: true,
            cancel: None,
        });
        let unit = parser.parse_translation_unit().unwrap();
        let names: Vec<_> = unit
            .items()
            .iter()
            .filter_map(|item| match item {
                Item::Simple(decl) => decl.declarators.first()?.declarator.name().map(|n| n.simple_name()),
                _ => None,
            })
            .collect();
        assert_eq!(names.first(), Some(&"ok1"));
        assert_eq!(names.last(), Some(&"ok2"));
        assert!(parser.has_errors());
    }

    fn recovered_names(source: &str) -> (Vec<String>, usize) {
        let arena = Bump::new();
        let tokens: Vec<_> = Lexer::new(source, &arena).collect();
        let mut parser = Parser::new(tokens, &arena).with_options(ParserOptions {
            recover: true,
            cancel: None,
        });
        let unit = parser.parse_translation_unit().unwrap();
        let mut names = Vec::new();
        for item in unit.items() {
            let Item::Simple(decl) = item else { continue };
            if let TypeSpec::Class(class) = decl.specs.type_spec {
                for member in class.members.unwrap_or_default() {
                    if let Item::Simple(member) = member
                        && let Some(name) = member.declarators.first().and_then(|d| d.declarator.name())
                    {
                        names.push(name.simple_name().to_string());
                    }
                }
            }
            if let Some(name) = decl.declarators.first().and_then(|d| d.declarator.name()) {
                names.push(name.simple_name().to_string());
            }
        }
        (names, parser.take_errors().len())
    }

    #[test]
    fn recovery_skips_parenthesized_groups() {
        let (names, errors) = recovered_names("int f(int = ; ) ; int ok;");
        assert_eq!(names, ["ok"]);
        assert_eq!(errors, 1);
    }

    #[test]
    fn recovery_inside_class_bodies_and_stray_braces() {
        let (names, errors) = recovered_names("int a; } int b; class X { int = ; int ok; }; int c;");
        assert_eq!(names, ["a", "b", "ok", "c"]);
        assert_eq!(errors, 2);
    }

    #[test]
    fn cancellation_aborts_even_when_recovering() {
        let arena = Bump::new();
        let cancel = cxxdecl_core::CancellationToken::new();
        cancel.cancel();
        let tokens: Vec<_> = Lexer::new("int x;", &arena).collect();
        let mut parser = Parser::new(tokens, &arena).with_options(ParserOptions {
            recover: true,
            cancel: Some(cancel),
        });
        let error = parser.parse_translation_unit().unwrap_err();
        assert_eq!(error.kind, ParseErrorKind::Cancelled);
    }
}
