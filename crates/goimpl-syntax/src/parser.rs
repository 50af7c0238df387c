// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Recursive-descent parser for Go declarations.
//!
//! The parser works over the full token vector so it can back up. Two Go
//! ambiguities need it:
//!
//! - In a parameter list or struct field, `name [N]T` (a name followed by an
//!   array type) against `Name[T]` (a generic instantiation). The generic
//!   reading is tried first and kept only if the entry ends right after it.
//! - In a type declaration, `type A[T any] ...` (type parameters) against
//!   `type A [N]T` (an array). Decided by the token after the first name.

use goimpl_core::patch::Span;

use crate::ast::{
    ChanDir, Decl, Field, FuncDecl, FuncType, ImportDecl, ImportSpec, InterfaceElem,
    InterfaceType, MethodSpec, Param, Receiver, SourceFile, StructType, TypeDecl, TypeExpr,
    TypeParam, TypeSpec, UnionTerm,
};
use crate::error::SyntaxError;
use crate::lexer::{tokenize, Tok, Token};

type PResult<T> = Result<T, SyntaxError>;

/// Parse a complete Go source file.
pub fn parse_file(source: &str) -> Result<SourceFile, SyntaxError> {
    let tokens = tokenize(source)?;
    Parser::new(source, tokens).parse_file()
}

/// Parse a single standalone type expression.
pub fn parse_type_expr(source: &str) -> Result<TypeExpr, SyntaxError> {
    let tokens = tokenize(source)?;
    let mut p = Parser::new(source, tokens);
    let ty = p.parse_type()?;
    p.eat(Tok::Semi);
    if !p.at_eof() {
        return Err(p.error_here("unexpected tokens after type"));
    }
    Ok(ty)
}

/// Types that cannot also be read as an operand of a length expression.
fn is_type_literal(ty: &TypeExpr) -> bool {
    match ty {
        TypeExpr::Paren(inner) => is_type_literal(inner),
        TypeExpr::Name(_)
        | TypeExpr::Qualified { .. }
        | TypeExpr::Generic { .. }
        | TypeExpr::Pointer(_)
        | TypeExpr::Ellipsis(_) => false,
        _ => true,
    }
}

/// An entry of a parameter list before names and types are grouped.
enum ParamEntry {
    /// A lone identifier: a name or a type, decided by its neighbors.
    Bare(String),
    Named(String, TypeExpr),
    Type(TypeExpr),
}

struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str, tokens: Vec<Token>) -> Self {
        Parser {
            source,
            tokens,
            pos: 0,
        }
    }

    // ------------------------------------------------------------------------
    // Token cursor
    // ------------------------------------------------------------------------

    fn peek(&self) -> Option<Tok> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<Tok> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn at(&self, kind: Tok) -> bool {
        self.peek() == Some(kind)
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).copied();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, kind: Tok) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: Tok, what: &str) -> PResult<Token> {
        if self.at(kind) {
            if let Some(tok) = self.bump() {
                return Ok(tok);
            }
        }
        Err(self.error_here(&format!("expected {}", what)))
    }

    fn expect_ident(&mut self) -> PResult<String> {
        let tok = self.expect(Tok::Ident, "identifier")?;
        Ok(self.text(tok).to_string())
    }

    fn text(&self, tok: Token) -> &'src str {
        tok.text(self.source)
    }

    /// End offset of the most recently consumed token.
    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |t| t.span.end)
    }

    fn cur_start(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |t| t.span.start)
    }

    fn error_here(&self, message: &str) -> SyntaxError {
        let span = match self.tokens.get(self.pos) {
            Some(tok) => tok.span,
            None => Span::empty_at(self.source.len()),
        };
        let found = match self.tokens.get(self.pos) {
            Some(tok) if tok.kind == Tok::Semi && tok.span.is_empty() => "newline".to_string(),
            Some(tok) => format!("'{}'", self.text(*tok)),
            None => "EOF".to_string(),
        };
        SyntaxError::at(self.source, span, format!("{}, found {}", message, found))
    }

    /// A statement terminator, which may be omitted before `)` or `}`.
    fn expect_semi_or_close(&mut self, close: Tok) -> PResult<()> {
        if self.eat(Tok::Semi) || self.at(close) {
            Ok(())
        } else {
            Err(self.error_here("expected ';'"))
        }
    }

    // ------------------------------------------------------------------------
    // File
    // ------------------------------------------------------------------------

    fn parse_file(&mut self) -> PResult<SourceFile> {
        let start = self.cur_start();
        self.expect(Tok::KwPackage, "'package'")?;
        let package = self.expect_ident()?;
        let package_span = Span::new(start, self.prev_end());
        self.expect_top_level_semi()?;

        let mut imports = Vec::new();
        while self.at(Tok::KwImport) {
            imports.push(self.parse_import_decl()?);
            self.expect_top_level_semi()?;
        }

        let mut decls = Vec::new();
        while let Some(kind) = self.peek() {
            match kind {
                Tok::KwType => decls.push(Decl::Type(self.parse_type_decl()?)),
                Tok::KwFunc => decls.push(Decl::Func(self.parse_func_decl()?)),
                Tok::KwVar | Tok::KwConst => decls.push(Decl::Value(self.skip_value_decl()?)),
                Tok::KwImport => {
                    return Err(self.error_here("imports must appear before other declarations"))
                }
                Tok::Semi => {
                    self.bump();
                    continue;
                }
                _ => return Err(self.error_here("expected declaration")),
            }
            self.expect_top_level_semi()?;
        }

        Ok(SourceFile {
            package,
            package_span,
            imports,
            decls,
        })
    }

    fn expect_top_level_semi(&mut self) -> PResult<()> {
        if self.eat(Tok::Semi) || self.at_eof() {
            Ok(())
        } else {
            Err(self.error_here("expected ';' after top level declaration"))
        }
    }

    fn parse_import_decl(&mut self) -> PResult<ImportDecl> {
        let start = self.cur_start();
        self.expect(Tok::KwImport, "'import'")?;
        let mut specs = Vec::new();
        let (lparen, rparen) = if self.at(Tok::LParen) {
            let lparen = self.bump().map(|t| t.span);
            while !self.at(Tok::RParen) {
                specs.push(self.parse_import_spec()?);
                self.expect_semi_or_close(Tok::RParen)?;
            }
            let rparen = self.expect(Tok::RParen, "')'")?.span;
            (lparen, Some(rparen))
        } else {
            specs.push(self.parse_import_spec()?);
            (None, None)
        };
        Ok(ImportDecl {
            span: Span::new(start, self.prev_end()),
            lparen,
            rparen,
            specs,
        })
    }

    fn parse_import_spec(&mut self) -> PResult<ImportSpec> {
        let start = self.cur_start();
        let name = match self.peek() {
            Some(Tok::Ident) => Some(self.expect_ident()?),
            Some(Tok::Dot) => {
                self.bump();
                Some(".".to_string())
            }
            _ => None,
        };
        let path = match self.peek() {
            Some(Tok::StringLit) | Some(Tok::RawStringLit) => {
                let tok = self.bump().ok_or_else(|| self.error_here("expected import path"))?;
                unquote(self.text(tok))
            }
            _ => return Err(self.error_here("expected import path")),
        };
        Ok(ImportSpec {
            name,
            path,
            span: Span::new(start, self.prev_end()),
        })
    }

    // ------------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------------

    fn parse_type_decl(&mut self) -> PResult<TypeDecl> {
        let start = self.cur_start();
        self.expect(Tok::KwType, "'type'")?;
        let mut specs = Vec::new();
        if self.eat(Tok::LParen) {
            while !self.at(Tok::RParen) {
                specs.push(self.parse_type_spec()?);
                self.expect_semi_or_close(Tok::RParen)?;
            }
            self.expect(Tok::RParen, "')'")?;
        } else {
            specs.push(self.parse_type_spec()?);
        }
        Ok(TypeDecl {
            span: Span::new(start, self.prev_end()),
            specs,
        })
    }

    fn parse_type_spec(&mut self) -> PResult<TypeSpec> {
        let start = self.cur_start();
        let name = self.expect_ident()?;
        let type_params = if self.at(Tok::LBrack) && self.looks_like_type_params() {
            self.parse_type_params_or_array_len()?
        } else {
            Vec::new()
        };
        let alias = self.eat(Tok::Assign);
        let ty = self.parse_type()?;
        Ok(TypeSpec {
            name,
            span: Span::new(start, self.prev_end()),
            type_params,
            alias,
            ty,
        })
    }

    /// At `[` after a type name: `[T any]` rather than `[N]T`.
    fn looks_like_type_params(&self) -> bool {
        self.peek_at(1) == Some(Tok::Ident)
            && matches!(
                self.peek_at(2),
                Some(
                    Tok::Ident
                        | Tok::Comma
                        | Tok::Star
                        | Tok::Tilde
                        | Tok::LBrack
                        | Tok::Arrow
                        | Tok::KwInterface
                        | Tok::KwMap
                        | Tok::KwChan
                        | Tok::KwFunc
                        | Tok::KwStruct
                )
            )
    }

    /// `[N *M]` reads as an array length unless the operand after `*` is a
    /// type literal or the list has a trailing comma (`[P *C,]`).
    fn parse_type_params_or_array_len(&mut self) -> PResult<Vec<TypeParam>> {
        let save = self.pos;
        let starred = self.peek_at(2) == Some(Tok::Star);
        match self.parse_type_params() {
            Ok(params) if starred && self.is_array_len_shape(&params) => {
                self.pos = save;
                Ok(Vec::new())
            }
            Ok(params) => Ok(params),
            Err(_) if starred => {
                self.pos = save;
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Called just past the `]` of a parsed type parameter list.
    fn is_array_len_shape(&self, params: &[TypeParam]) -> bool {
        let trailing_comma = self
            .pos
            .checked_sub(2)
            .and_then(|i| self.tokens.get(i))
            .is_some_and(|t| t.kind == Tok::Comma);
        match params {
            [param] if param.names.len() == 1 && !trailing_comma => {
                matches!(&param.constraint, TypeExpr::Pointer(operand) if !is_type_literal(operand))
            }
            _ => false,
        }
    }

    fn parse_type_params(&mut self) -> PResult<Vec<TypeParam>> {
        self.expect(Tok::LBrack, "'['")?;
        let mut params = Vec::new();
        let mut names = Vec::new();
        while !self.at(Tok::RBrack) {
            names.push(self.expect_ident()?);
            if self.eat(Tok::Comma) {
                continue;
            }
            let constraint = self.parse_constraint()?;
            params.push(TypeParam {
                names: std::mem::take(&mut names),
                constraint,
            });
            if !self.eat(Tok::Comma) {
                break;
            }
        }
        if !names.is_empty() {
            return Err(self.error_here("type parameter is missing a constraint"));
        }
        self.expect(Tok::RBrack, "']'")?;
        Ok(params)
    }

    /// A type or a union of (possibly `~`) terms.
    fn parse_constraint(&mut self) -> PResult<TypeExpr> {
        let mut terms = Vec::new();
        loop {
            let tilde = self.eat(Tok::Tilde);
            let ty = self.parse_type()?;
            terms.push(UnionTerm { tilde, ty });
            if !self.eat(Tok::Pipe) {
                break;
            }
        }
        if terms.len() == 1 && !terms[0].tilde {
            if let Some(term) = terms.pop() {
                return Ok(term.ty);
            }
        }
        Ok(TypeExpr::Union(terms))
    }

    fn parse_func_decl(&mut self) -> PResult<FuncDecl> {
        let start = self.cur_start();
        self.expect(Tok::KwFunc, "'func'")?;
        let recv = if self.at(Tok::LParen) {
            Some(self.parse_receiver()?)
        } else {
            None
        };
        let name = self.expect_ident()?;
        let type_params = if self.at(Tok::LBrack) {
            self.parse_type_params()?
        } else {
            Vec::new()
        };
        let sig = self.parse_signature()?;
        let body = if self.at(Tok::LBrace) {
            Some(self.skip_balanced(Tok::LBrace, Tok::RBrace)?)
        } else {
            None
        };
        Ok(FuncDecl {
            recv,
            name,
            type_params,
            sig,
            body,
            span: Span::new(start, self.prev_end()),
        })
    }

    fn parse_receiver(&mut self) -> PResult<Receiver> {
        let open = self.cur_start();
        let mut params = self.parse_params()?;
        let bad = || SyntaxError::at(self.source, Span::empty_at(open), "invalid receiver");
        if params.len() != 1 || params[0].names.len() > 1 {
            return Err(bad());
        }
        let param = params.remove(0);
        let name = param.names.into_iter().next();
        let (pointer, base) = match param.ty.unparen() {
            TypeExpr::Pointer(inner) => (true, inner.unparen().clone()),
            other => (false, other.clone()),
        };
        let (base, type_args) = match base {
            TypeExpr::Name(n) => (n, Vec::new()),
            TypeExpr::Generic { base, args } => match *base {
                TypeExpr::Name(n) => {
                    let args = args
                        .into_iter()
                        .map(|a| match a {
                            TypeExpr::Name(n) => Ok(n),
                            _ => Err(bad()),
                        })
                        .collect::<PResult<Vec<_>>>()?;
                    (n, args)
                }
                _ => return Err(bad()),
            },
            _ => return Err(bad()),
        };
        Ok(Receiver {
            name,
            pointer,
            base,
            type_args,
        })
    }

    /// Skip a `var` or `const` declaration up to its terminating `;`.
    fn skip_value_decl(&mut self) -> PResult<Span> {
        let start = self.cur_start();
        self.bump();
        let mut depth = 0usize;
        while let Some(kind) = self.peek() {
            match kind {
                Tok::LParen | Tok::LBrace | Tok::LBrack => depth += 1,
                Tok::RParen | Tok::RBrace | Tok::RBrack => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| self.error_here("unbalanced delimiter"))?;
                }
                Tok::Semi if depth == 0 => break,
                _ => {}
            }
            self.bump();
        }
        if depth != 0 {
            return Err(self.error_here("unterminated declaration"));
        }
        Ok(Span::new(start, self.prev_end()))
    }

    /// Skip from `open` to its matching `close`, returning the covered span.
    fn skip_balanced(&mut self, open: Tok, close: Tok) -> PResult<Span> {
        let start = self.expect(open, "opening delimiter")?.span.start;
        let mut depth = 1usize;
        while depth > 0 {
            match self.bump() {
                Some(t) if t.kind == open => depth += 1,
                Some(t) if t.kind == close => depth -= 1,
                Some(_) => {}
                None => {
                    return Err(SyntaxError::at(
                        self.source,
                        Span::empty_at(start),
                        "unclosed delimiter",
                    ))
                }
            }
        }
        Ok(Span::new(start, self.prev_end()))
    }

    // ------------------------------------------------------------------------
    // Signatures
    // ------------------------------------------------------------------------

    fn parse_signature(&mut self) -> PResult<FuncType> {
        let params = self.parse_params()?;
        let results = match self.peek() {
            Some(Tok::LParen) => self.parse_params()?,
            Some(kind) if kind.starts_type() => vec![Param::unnamed(self.parse_type()?)],
            _ => Vec::new(),
        };
        Ok(FuncType { params, results })
    }

    fn parse_params(&mut self) -> PResult<Vec<Param>> {
        let open = self.expect(Tok::LParen, "'('")?.span;
        let mut entries = Vec::new();
        while !self.at(Tok::RParen) {
            entries.push(self.parse_param_entry()?);
            if !self.eat(Tok::Comma) {
                break;
            }
        }
        self.expect(Tok::RParen, "')'")?;
        group_params(entries)
            .ok_or_else(|| SyntaxError::at(self.source, open, "mixed named and unnamed parameters"))
    }

    fn parse_param_entry(&mut self) -> PResult<ParamEntry> {
        if !self.at(Tok::Ident) {
            return Ok(ParamEntry::Type(self.parse_param_type()?));
        }
        match self.peek_at(1) {
            Some(Tok::Comma) | Some(Tok::RParen) => {
                let name = self.expect_ident()?;
                Ok(ParamEntry::Bare(name))
            }
            Some(Tok::Dot) => Ok(ParamEntry::Type(self.parse_type()?)),
            Some(Tok::LBrack) => {
                let save = self.pos;
                if let Ok(ty) = self.parse_type() {
                    if matches!(self.peek(), Some(Tok::Comma) | Some(Tok::RParen)) {
                        return Ok(ParamEntry::Type(ty));
                    }
                }
                self.pos = save;
                let name = self.expect_ident()?;
                Ok(ParamEntry::Named(name, self.parse_param_type()?))
            }
            Some(kind) if kind == Tok::Ellipsis || kind.starts_type() => {
                let name = self.expect_ident()?;
                Ok(ParamEntry::Named(name, self.parse_param_type()?))
            }
            _ => {
                self.bump();
                Err(self.error_here("expected ',' or ')' in parameter list"))
            }
        }
    }

    fn parse_param_type(&mut self) -> PResult<TypeExpr> {
        if self.eat(Tok::Ellipsis) {
            Ok(TypeExpr::Ellipsis(Box::new(self.parse_type()?)))
        } else {
            self.parse_type()
        }
    }

    // ------------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------------

    fn parse_type(&mut self) -> PResult<TypeExpr> {
        match self.peek() {
            Some(Tok::Ident) => self.parse_type_name(),
            Some(Tok::Star) => {
                self.bump();
                Ok(TypeExpr::Pointer(Box::new(self.parse_type()?)))
            }
            Some(Tok::LBrack) => {
                self.bump();
                if self.eat(Tok::RBrack) {
                    return Ok(TypeExpr::Slice(Box::new(self.parse_type()?)));
                }
                let len = self.array_len()?;
                Ok(TypeExpr::Array {
                    len,
                    elem: Box::new(self.parse_type()?),
                })
            }
            Some(Tok::LParen) => {
                self.bump();
                let inner = self.parse_type()?;
                self.expect(Tok::RParen, "')'")?;
                Ok(TypeExpr::Paren(Box::new(inner)))
            }
            Some(Tok::KwFunc) => {
                self.bump();
                Ok(TypeExpr::Func(self.parse_signature()?))
            }
            Some(Tok::KwMap) => {
                self.bump();
                self.expect(Tok::LBrack, "'['")?;
                let key = self.parse_type()?;
                self.expect(Tok::RBrack, "']'")?;
                let value = self.parse_type()?;
                Ok(TypeExpr::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            Some(Tok::KwChan) => {
                self.bump();
                let dir = if self.eat(Tok::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                Ok(TypeExpr::Chan {
                    dir,
                    elem: Box::new(self.parse_type()?),
                })
            }
            Some(Tok::Arrow) => {
                self.bump();
                self.expect(Tok::KwChan, "'chan'")?;
                Ok(TypeExpr::Chan {
                    dir: ChanDir::Recv,
                    elem: Box::new(self.parse_type()?),
                })
            }
            Some(Tok::KwInterface) => Ok(TypeExpr::Interface(self.parse_interface()?)),
            Some(Tok::KwStruct) => Ok(TypeExpr::Struct(self.parse_struct()?)),
            _ => Err(self.error_here("expected type")),
        }
    }

    /// `Name`, `pkg.Name`, either optionally instantiated with `[args]`.
    fn parse_type_name(&mut self) -> PResult<TypeExpr> {
        let first = self.expect_ident()?;
        let base = if self.eat(Tok::Dot) {
            TypeExpr::Qualified {
                package: first,
                name: self.expect_ident()?,
            }
        } else {
            TypeExpr::Name(first)
        };
        if !self.at(Tok::LBrack) {
            return Ok(base);
        }
        self.bump();
        let mut args = Vec::new();
        while !self.at(Tok::RBrack) {
            args.push(self.parse_type()?);
            if !self.eat(Tok::Comma) {
                break;
            }
        }
        self.expect(Tok::RBrack, "']'")?;
        if args.is_empty() {
            return Err(self.error_here("expected type argument"));
        }
        Ok(TypeExpr::Generic {
            base: Box::new(base),
            args,
        })
    }

    /// Array length tokens up to the matching `]`, as written.
    fn array_len(&mut self) -> PResult<String> {
        let start = self.cur_start();
        let mut depth = 0usize;
        loop {
            match self.peek() {
                Some(Tok::RBrack) if depth == 0 => break,
                Some(Tok::LBrack) | Some(Tok::LParen) => depth += 1,
                Some(Tok::RBrack) | Some(Tok::RParen) => depth = depth.saturating_sub(1),
                Some(Tok::Semi) | None => return Err(self.error_here("expected ']'")),
                Some(_) => {}
            }
            self.bump();
        }
        let len = self.source[start..self.prev_end()].trim().to_string();
        self.expect(Tok::RBrack, "']'")?;
        Ok(len)
    }

    fn parse_interface(&mut self) -> PResult<InterfaceType> {
        self.expect(Tok::KwInterface, "'interface'")?;
        self.expect(Tok::LBrace, "'{'")?;
        let mut elems = Vec::new();
        while !self.at(Tok::RBrace) {
            if self.eat(Tok::Semi) {
                continue;
            }
            if self.at(Tok::Ident) && self.peek_at(1) == Some(Tok::LParen) {
                let name = self.expect_ident()?;
                let sig = self.parse_signature()?;
                elems.push(InterfaceElem::Method(MethodSpec { name, sig }));
            } else {
                elems.push(InterfaceElem::Embed(self.parse_constraint()?));
            }
            self.expect_semi_or_close(Tok::RBrace)?;
        }
        self.expect(Tok::RBrace, "'}'")?;
        Ok(InterfaceType { elems })
    }

    fn parse_struct(&mut self) -> PResult<StructType> {
        self.expect(Tok::KwStruct, "'struct'")?;
        self.expect(Tok::LBrace, "'{'")?;
        let mut fields = Vec::new();
        while !self.at(Tok::RBrace) {
            if self.eat(Tok::Semi) {
                continue;
            }
            fields.push(self.parse_field()?);
            self.expect_semi_or_close(Tok::RBrace)?;
        }
        self.expect(Tok::RBrace, "'}'")?;
        Ok(StructType { fields })
    }

    fn parse_field(&mut self) -> PResult<Field> {
        let (names, ty) = if self.at(Tok::Star) {
            (Vec::new(), self.parse_type()?)
        } else if self.at(Tok::Ident) {
            match self.peek_at(1) {
                Some(Tok::Comma) => {
                    let mut names = vec![self.expect_ident()?];
                    while self.eat(Tok::Comma) {
                        names.push(self.expect_ident()?);
                    }
                    (names, self.parse_type()?)
                }
                Some(Tok::Dot)
                | Some(Tok::Semi)
                | Some(Tok::RBrace)
                | Some(Tok::StringLit)
                | Some(Tok::RawStringLit) => (Vec::new(), self.parse_type()?),
                Some(Tok::LBrack) => {
                    let save = self.pos;
                    match self.parse_type() {
                        Ok(ty) if self.field_ends_here() => (Vec::new(), ty),
                        _ => {
                            self.pos = save;
                            let name = self.expect_ident()?;
                            (vec![name], self.parse_type()?)
                        }
                    }
                }
                _ => {
                    let name = self.expect_ident()?;
                    (vec![name], self.parse_type()?)
                }
            }
        } else {
            return Err(self.error_here("expected field name or embedded type"));
        };
        let tag = match self.peek() {
            Some(Tok::StringLit) | Some(Tok::RawStringLit) => self
                .bump()
                .map(|t| self.text(t).to_string()),
            _ => None,
        };
        Ok(Field { names, ty, tag })
    }

    fn field_ends_here(&self) -> bool {
        matches!(
            self.peek(),
            Some(Tok::Semi) | Some(Tok::RBrace) | Some(Tok::StringLit) | Some(Tok::RawStringLit)
        )
    }
}

/// Apply Go's rule: either every parameter is named or none is.
fn group_params(entries: Vec<ParamEntry>) -> Option<Vec<Param>> {
    let any_named = entries.iter().any(|e| matches!(e, ParamEntry::Named(..)));
    let mut params = Vec::new();
    if !any_named {
        for entry in entries {
            let ty = match entry {
                ParamEntry::Bare(name) => TypeExpr::Name(name),
                ParamEntry::Type(ty) => ty,
                ParamEntry::Named(..) => return None,
            };
            params.push(Param::unnamed(ty));
        }
        return Some(params);
    }

    let mut pending = Vec::new();
    for entry in entries {
        match entry {
            ParamEntry::Bare(name) => pending.push(name),
            ParamEntry::Named(name, ty) => {
                pending.push(name);
                params.push(Param {
                    names: std::mem::take(&mut pending),
                    ty,
                });
            }
            ParamEntry::Type(_) => return None,
        }
    }
    if pending.is_empty() {
        Some(params)
    } else {
        None
    }
}

/// Strip the quotes from an import path literal.
fn unquote(lit: &str) -> String {
    let inner = lit
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| lit.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
        .unwrap_or(lit);
    inner.replace("\\\\", "\\").replace("\\\"", "\"")
}

// ============================================================================
// Tests
// ============================================================================
