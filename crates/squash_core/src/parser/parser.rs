//! Recursive-descent JavaScript parser.
//!
//! [`parse`] turns one input unit into a [`Program`].  Binary operators are
//! parsed by precedence climbing; arrow-function heads and destructuring
//! assignment targets are parsed as ordinary expressions first and converted
//! to patterns once the following token shows what they were.
//!
//! Parsing never recovers: the first unexpected token aborts the unit with a
//! [`SquashError::Syntax`] carrying its position.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SquashError, SquashResult};
use crate::parser::ast::*;
use crate::parser::scanner::{Comment, Position, Scanner, Span, Token, TokenKind, TokenValue};

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    /// Parse with the module goal: strict, `import`/`export` and top-level
    /// `await` allowed.
    pub module: bool,
    /// Allow `return` outside of any function.
    pub bare_returns: bool,
    /// Accept a leading `#!` line.
    pub shebang: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            module: false,
            bare_returns: false,
            shebang: true,
        }
    }
}

/// Parse `source` as input unit `0`.
///
/// # Errors
///
/// Returns the first lexical or syntax error in the source.
///
/// # Example
///
/// ```
/// use squash_core::parser::parser::{parse, ParseOptions};
///
/// let program = parse("let x = 1 + 2;", &ParseOptions::default()).unwrap();
/// assert_eq!(program.body.len(), 1);
/// ```
pub fn parse(source: &str, options: &ParseOptions) -> SquashResult<Program> {
    parse_with_file(source, 0, options)
}

/// Parse `source`, stamping every span with the input-unit index `file`.
pub fn parse_with_file(source: &str, file: u32, options: &ParseOptions) -> SquashResult<Program> {
    let mut parser = Parser::new(source, file, options)?;
    let program = parser.parse_program()?;
    debug!(file, statements = program.body.len(), "parsed input unit");
    Ok(program)
}

// ─────────────────────────────────────────────────────────────────────────────
// Parser state
// ─────────────────────────────────────────────────────────────────────────────

/// An entry on the label stack.
#[derive(Debug, Clone)]
struct Label {
    name: String,
    is_loop: bool,
}

/// Grammar context; saved and replaced on entering a function body.
#[derive(Debug, Clone, Default)]
struct Context {
    in_function: bool,
    is_async: bool,
    is_generator: bool,
    strict: bool,
    loop_depth: u32,
    switch_depth: u32,
    labels: Vec<Label>,
}

/// Either operator family handled by the precedence climber.
#[derive(Debug, Clone, Copy)]
enum InfixOp {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

impl InfixOp {
    fn precedence(self) -> u8 {
        match self {
            InfixOp::Binary(op) => op.precedence(),
            InfixOp::Logical(op) => op.precedence(),
        }
    }
}

struct Parser<'src> {
    scanner: Scanner<'src>,
    /// The current (not yet consumed) token.
    tok: Token,
    /// Kind of the last consumed token.
    prev_kind: Option<TokenKind>,
    /// End of the last consumed token.
    prev_end: Position,
    file: u32,
    module: bool,
    bare_returns: bool,
    comments: Vec<Comment>,
    ctx: Context,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str, file: u32, options: &ParseOptions) -> SquashResult<Self> {
        let origin = Position {
            offset: 0,
            line: 1,
            column: 0,
        };
        if !options.shebang && source.starts_with("#!") {
            return Err(SquashError::syntax("Unexpected token #", origin));
        }
        let mut scanner = Scanner::with_file(source, file);
        scanner.set_strict(options.module);
        let tok = scanner.next_token()?;
        let comments = tok.comments_before.clone();
        Ok(Parser {
            scanner,
            tok,
            prev_kind: None,
            prev_end: origin,
            file,
            module: options.module,
            bare_returns: options.bare_returns,
            comments,
            ctx: Context {
                strict: options.module,
                is_async: options.module,
                ..Context::default()
            },
        })
    }

    // ── Token plumbing ──────────────────────────────────────────────────────

    /// Consume the current token and return it.
    fn bump(&mut self) -> SquashResult<Token> {
        let next = self.scanner.next_token()?;
        self.comments.extend(next.comments_before.iter().cloned());
        let prev = std::mem::replace(&mut self.tok, next);
        self.prev_end = prev.span.end;
        self.prev_kind = Some(prev.kind);
        Ok(prev)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.tok.kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> SquashResult<bool> {
        if self.at(kind) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind) -> SquashResult<Token> {
        if self.at(kind) {
            self.bump()
        } else {
            Err(self.unexpected())
        }
    }

    /// The token after the current one, scanned on a throwaway copy.
    fn peek(&self) -> Option<Token> {
        self.scanner.clone().next_token().ok()
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    /// The two tokens after the current one.
    fn peek2(&self) -> Option<(Token, Token)> {
        let mut sc = self.scanner.clone();
        let a = sc.next_token().ok()?;
        let b = sc.next_token().ok()?;
        Some((a, b))
    }

    fn start(&self) -> Position {
        self.tok.span.start
    }

    /// Span from `start` to the end of the last consumed token.
    fn span(&self, start: Position) -> Span {
        Span {
            start,
            end: self.prev_end,
            file: self.file,
        }
    }

    fn unexpected(&self) -> SquashError {
        let message = match self.tok.kind {
            TokenKind::Eof => "Unexpected end of input".to_string(),
            TokenKind::Identifier | TokenKind::StringLiteral | TokenKind::PrivateIdentifier => {
                format!("Unexpected {} {}", self.tok.kind.as_str(), self.tok.text())
            }
            TokenKind::NumericLiteral
            | TokenKind::BigIntLiteral
            | TokenKind::RegExpLiteral
            | TokenKind::NoSubstitutionTemplate
            | TokenKind::TemplateHead
            | TokenKind::TemplateMiddle
            | TokenKind::TemplateTail => format!("Unexpected {}", self.tok.kind.as_str()),
            kind => format!("Unexpected token {}", kind.as_str()),
        };
        SquashError::syntax(message, self.tok.span.start)
    }

    fn error_at(&self, pos: Position, message: impl Into<String>) -> SquashError {
        SquashError::syntax(message, pos)
    }

    /// Automatic semicolon insertion.
    fn consume_semicolon(&mut self) -> SquashResult<()> {
        if self.eat(TokenKind::Semicolon)? {
            return Ok(());
        }
        if self.at(TokenKind::RightBrace)
            || self.at(TokenKind::Eof)
            || self.tok.had_line_terminator_before
        {
            return Ok(());
        }
        Err(self.unexpected())
    }

    /// Switch strictness, re-reading the lookahead token under the new rules.
    fn set_strict(&mut self, strict: bool) -> SquashResult<()> {
        self.ctx.strict = strict;
        if self.scanner.is_strict() != strict {
            self.scanner.set_strict(strict);
            self.tok = self.scanner.rescan(&self.tok, self.prev_kind)?;
        }
        Ok(())
    }

    /// Run `f` inside a fresh function context.
    fn with_function<T>(
        &mut self,
        is_async: bool,
        is_generator: bool,
        f: impl FnOnce(&mut Self) -> SquashResult<T>,
    ) -> SquashResult<T> {
        let fresh = Context {
            in_function: true,
            is_async,
            is_generator,
            strict: self.ctx.strict,
            ..Context::default()
        };
        let outer = std::mem::replace(&mut self.ctx, fresh);
        let result = f(self);
        let strict = outer.strict;
        self.ctx = outer;
        let value = result?;
        self.set_strict(strict)?;
        Ok(value)
    }

    // ── Identifiers ─────────────────────────────────────────────────────────

    /// `true` when the current token can be used as an identifier reference
    /// or binding in the current context.
    fn is_identifier_token(&self) -> bool {
        match self.tok.kind {
            TokenKind::Identifier
            | TokenKind::Async
            | TokenKind::From
            | TokenKind::As
            | TokenKind::Get
            | TokenKind::Set
            | TokenKind::Target
            | TokenKind::Meta
            | TokenKind::Of => true,
            TokenKind::Let | TokenKind::Static => !self.ctx.strict,
            TokenKind::Yield => !self.ctx.is_generator && !self.ctx.strict,
            TokenKind::Await => !self.ctx.is_async && !self.module,
            _ => false,
        }
    }

    fn parse_ident(&mut self) -> SquashResult<Ident> {
        if !self.is_identifier_token() {
            return Err(self.unexpected());
        }
        let tok = self.bump()?;
        Ok(Ident::new(tok.text(), tok.span))
    }

    fn parse_binding_ident(&mut self) -> SquashResult<Ident> {
        let id = self.parse_ident()?;
        if self.ctx.strict && matches!(id.name.as_str(), "eval" | "arguments") {
            return Err(self.error_at(
                id.loc.start,
                format!("Unexpected {} in strict mode", id.name),
            ));
        }
        Ok(id)
    }

    /// Any identifier name, reserved words included (property names).
    fn parse_ident_name(&mut self) -> SquashResult<Ident> {
        if self.tok.kind == TokenKind::Identifier || self.tok.kind.is_keyword() {
            let tok = self.bump()?;
            return Ok(Ident::new(tok.text(), tok.span));
        }
        Err(self.unexpected())
    }

    // ── Program and statement lists ────────────────────────────────────────

    fn parse_program(&mut self) -> SquashResult<Program> {
        let body = self.parse_statement_list(TokenKind::Eof, true)?;
        let end = self.tok.span.end;
        let shebang = self.scanner.take_shebang();
        Ok(Program {
            loc: Span {
                start: Position {
                    offset: 0,
                    line: 1,
                    column: 0,
                },
                end,
                file: self.file,
            },
            source_type: if self.module {
                SourceType::Module
            } else {
                SourceType::Script
            },
            body,
            comments: std::mem::take(&mut self.comments),
            shebang,
            files: Vec::new(),
        })
    }

    /// Statements up to (not including) `end`, with a directive prologue.
    fn parse_statement_list(&mut self, end: TokenKind, top_level: bool) -> SquashResult<Vec<Stmt>> {
        let mut body = Vec::new();
        let mut in_directives = true;
        while !self.at(end) {
            if self.at(TokenKind::Eof) {
                return Err(self.unexpected());
            }
            if in_directives && self.at(TokenKind::StringLiteral) {
                let tok_span = self.tok.span;
                let stmt = self.parse_item(top_level)?;
                if let Some(raw) = self.directive_text(&stmt, tok_span) {
                    if raw.get(1..raw.len() - 1) == Some("use strict") {
                        self.set_strict(true)?;
                    }
                    body.push(Stmt::Directive(Directive {
                        loc: stmt.loc(),
                        raw,
                    }));
                    continue;
                }
                in_directives = false;
                body.push(stmt);
                continue;
            }
            in_directives = false;
            body.push(self.parse_item(top_level)?);
        }
        Ok(body)
    }

    /// Source text of `stmt` if it is exactly the string token at `tok_span`.
    fn directive_text(&self, stmt: &Stmt, tok_span: Span) -> Option<String> {
        let Stmt::Expr(ExprStmt { loc, expr }) = stmt else {
            return None;
        };
        let Expr::Str(s) = &**expr else {
            return None;
        };
        if s.loc != tok_span || loc.start != tok_span.start {
            return None;
        }
        self.scanner
            .source()
            .get(tok_span.start.offset..tok_span.end.offset)
            .map(str::to_string)
    }

    fn parse_item(&mut self, top_level: bool) -> SquashResult<Stmt> {
        if top_level && self.module {
            match self.tok.kind {
                TokenKind::Import
                    if !matches!(self.peek_kind(), TokenKind::LeftParen | TokenKind::Dot) =>
                {
                    return self.parse_import_decl();
                }
                TokenKind::Export => return self.parse_export_decl(),
                _ => {}
            }
        }
        self.parse_statement_list_item()
    }

    fn parse_statement_list_item(&mut self) -> SquashResult<Stmt> {
        match self.tok.kind {
            TokenKind::Function => {
                let f = self.parse_function_decl(false, false)?;
                Ok(Stmt::FnDecl(Box::new(f)))
            }
            TokenKind::Async if self.async_function_follows() => {
                let f = self.parse_function_decl(true, false)?;
                Ok(Stmt::FnDecl(Box::new(f)))
            }
            TokenKind::Class => {
                let start = self.start();
                let c = self.parse_class(start, true)?;
                Ok(Stmt::ClassDecl(Box::new(c)))
            }
            TokenKind::Const => self.parse_var_statement(VarKind::Const),
            TokenKind::Let if self.let_starts_declaration() => {
                self.parse_var_statement(VarKind::Let)
            }
            TokenKind::Export | TokenKind::Import
                if !matches!(self.peek_kind(), TokenKind::LeftParen | TokenKind::Dot) =>
            {
                Err(self.error_at(
                    self.start(),
                    "'import' and 'export' may only appear at the top level of a module",
                ))
            }
            _ => self.parse_statement(),
        }
    }

    fn async_function_follows(&self) -> bool {
        matches!(self.peek(), Some(t) if t.kind == TokenKind::Function && !t.had_line_terminator_before)
    }

    fn let_starts_declaration(&self) -> bool {
        match self.peek() {
            Some(t) => {
                matches!(t.kind, TokenKind::LeftBracket | TokenKind::LeftBrace | TokenKind::Identifier)
                    || t.kind.is_contextual()
            }
            None => false,
        }
    }

    // ── Statements ──────────────────────────────────────────────────────────

    fn parse_statement(&mut self) -> SquashResult<Stmt> {
        let start = self.start();
        match self.tok.kind {
            TokenKind::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Var => self.parse_var_statement(VarKind::Var),
            TokenKind::Semicolon => {
                self.bump()?;
                Ok(Stmt::Empty(EmptyStmt {
                    loc: self.span(start),
                }))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::Continue => self.parse_continue(),
            TokenKind::Break => self.parse_break(),
            TokenKind::Return => self.parse_return(),
            TokenKind::With => self.parse_with(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Throw => self.parse_throw(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Debugger => {
                self.bump()?;
                self.consume_semicolon()?;
                Ok(Stmt::Debugger(DebuggerStmt {
                    loc: self.span(start),
                }))
            }
            TokenKind::Function if !self.ctx.strict => {
                let f = self.parse_function_decl(false, false)?;
                Ok(Stmt::FnDecl(Box::new(f)))
            }
            TokenKind::Function | TokenKind::Class => Err(self.unexpected()),
            _ if self.is_identifier_token() && self.peek_kind() == TokenKind::Colon => {
                self.parse_labeled()
            }
            _ => {
                let expr = self.parse_expression(false)?;
                self.consume_semicolon()?;
                Ok(Stmt::Expr(ExprStmt {
                    loc: self.span(start),
                    expr: Box::new(expr),
                }))
            }
        }
    }

    fn parse_block(&mut self) -> SquashResult<BlockStmt> {
        let start = self.start();
        self.expect(TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        while !self.at(TokenKind::RightBrace) {
            if self.at(TokenKind::Eof) {
                return Err(self.unexpected());
            }
            body.push(self.parse_statement_list_item()?);
        }
        self.bump()?;
        Ok(BlockStmt {
            loc: self.span(start),
            body,
        })
    }

    fn parse_var_statement(&mut self, kind: VarKind) -> SquashResult<Stmt> {
        let start = self.start();
        let mut decl = self.parse_var_decl(kind, false)?;
        self.check_declarator_inits(&decl)?;
        self.consume_semicolon()?;
        decl.loc = self.span(start);
        Ok(Stmt::VarDecl(decl))
    }

    fn parse_var_decl(&mut self, kind: VarKind, no_in: bool) -> SquashResult<VarDecl> {
        let start = self.start();
        self.bump()?;
        let mut declarators = Vec::new();
        loop {
            let dstart = self.start();
            let id = self.parse_binding_target()?;
            if kind != VarKind::Var
                && let Pat::Ident(i) = &id
                && i.name == "let"
            {
                return Err(self.error_at(dstart, "let is disallowed as a lexically bound name"));
            }
            let init = if self.eat(TokenKind::Equal)? {
                Some(Box::new(self.parse_assign(no_in)?))
            } else {
                None
            };
            declarators.push(VarDeclarator {
                loc: self.span(dstart),
                id,
                init,
            });
            if !self.eat(TokenKind::Comma)? {
                break;
            }
        }
        Ok(VarDecl {
            loc: self.span(start),
            kind,
            declarators,
        })
    }

    fn check_declarator_inits(&self, decl: &VarDecl) -> SquashResult<()> {
        for d in &decl.declarators {
            if d.init.is_some() {
                continue;
            }
            if decl.kind == VarKind::Const {
                return Err(self.error_at(d.loc.start, "Missing initializer in const declaration"));
            }
            if !matches!(d.id, Pat::Ident(_)) {
                return Err(self.error_at(
                    d.loc.start,
                    "Missing initializer in destructuring declaration",
                ));
            }
        }
        Ok(())
    }

    fn parse_paren_expression(&mut self) -> SquashResult<Expr> {
        self.expect(TokenKind::LeftParen)?;
        let expr = self.parse_expression(false)?;
        self.expect(TokenKind::RightParen)?;
        Ok(expr)
    }

    fn parse_loop_body(&mut self) -> SquashResult<Stmt> {
        self.ctx.loop_depth += 1;
        let body = self.parse_statement();
        self.ctx.loop_depth -= 1;
        body
    }

    fn parse_if(&mut self) -> SquashResult<Stmt> {
        let start = self.start();
        self.bump()?;
        let test = self.parse_paren_expression()?;
        let consequent = self.parse_statement()?;
        let alternate = if self.eat(TokenKind::Else)? {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If(IfStmt {
            loc: self.span(start),
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate,
        }))
    }

    fn parse_for(&mut self) -> SquashResult<Stmt> {
        let start = self.start();
        self.bump()?;
        let is_await = if self.at(TokenKind::Await) && self.ctx.is_async {
            self.bump()?;
            true
        } else {
            false
        };
        self.expect(TokenKind::LeftParen)?;

        if self.eat(TokenKind::Semicolon)? {
            if is_await {
                return Err(self.unexpected());
            }
            return self.parse_for_rest(start, None);
        }

        let decl_kind = match self.tok.kind {
            TokenKind::Var => Some(VarKind::Var),
            TokenKind::Const => Some(VarKind::Const),
            TokenKind::Let if self.let_starts_declaration() => Some(VarKind::Let),
            _ => None,
        };

        if let Some(kind) = decl_kind {
            let decl = self.parse_var_decl(kind, true)?;
            let single = decl.declarators.len() == 1;
            if single && (self.at(TokenKind::Of) || self.at(TokenKind::In)) {
                let legacy_init = self.at(TokenKind::In)
                    && kind == VarKind::Var
                    && !self.ctx.strict
                    && matches!(decl.declarators[0].id, Pat::Ident(_));
                if decl.declarators[0].init.is_some() && !legacy_init {
                    return Err(self.error_at(
                        decl.loc.start,
                        "for-in/of loop variable declaration may not have an initializer",
                    ));
                }
                return self.parse_for_in_of(start, is_await, ForInOfLeft::VarDecl(decl));
            }
            if is_await {
                return Err(self.unexpected());
            }
            self.check_declarator_inits(&decl)?;
            self.expect(TokenKind::Semicolon)?;
            return self.parse_for_rest(start, Some(ForInit::VarDecl(decl)));
        }

        let init_start = self.start();
        let expr = self.parse_expression(true)?;
        if self.at(TokenKind::Of) || self.at(TokenKind::In) {
            let pat = self.expr_to_pat(expr, false).map_err(|_| {
                self.error_at(init_start, "Invalid left-hand side in for-loop")
            })?;
            return self.parse_for_in_of(start, is_await, ForInOfLeft::Pat(pat));
        }
        if is_await {
            return Err(self.unexpected());
        }
        self.expect(TokenKind::Semicolon)?;
        self.parse_for_rest(start, Some(ForInit::Expr(Box::new(expr))))
    }

    /// `test; update) body` of a C-style `for`.
    fn parse_for_rest(&mut self, start: Position, init: Option<ForInit>) -> SquashResult<Stmt> {
        let test = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression(false)?))
        };
        self.expect(TokenKind::Semicolon)?;
        let update = if self.at(TokenKind::RightParen) {
            None
        } else {
            Some(Box::new(self.parse_expression(false)?))
        };
        self.expect(TokenKind::RightParen)?;
        let body = self.parse_loop_body()?;
        Ok(Stmt::For(ForStmt {
            loc: self.span(start),
            init,
            test,
            update,
            body: Box::new(body),
        }))
    }

    fn parse_for_in_of(
        &mut self,
        start: Position,
        is_await: bool,
        left: ForInOfLeft,
    ) -> SquashResult<Stmt> {
        let is_of = self.bump()?.kind == TokenKind::Of;
        if is_await && !is_of {
            return Err(self.error_at(start, "for await requires an of clause"));
        }
        let right = if is_of {
            self.parse_assign(false)?
        } else {
            self.parse_expression(false)?
        };
        self.expect(TokenKind::RightParen)?;
        let body = Box::new(self.parse_loop_body()?);
        let loc = self.span(start);
        let right = Box::new(right);
        Ok(if is_of {
            Stmt::ForOf(ForOfStmt {
                loc,
                is_await,
                left,
                right,
                body,
            })
        } else {
            Stmt::ForIn(ForInStmt {
                loc,
                left,
                right,
                body,
            })
        })
    }

    fn parse_while(&mut self) -> SquashResult<Stmt> {
        let start = self.start();
        self.bump()?;
        let test = self.parse_paren_expression()?;
        let body = self.parse_loop_body()?;
        Ok(Stmt::While(WhileStmt {
            loc: self.span(start),
            test: Box::new(test),
            body: Box::new(body),
        }))
    }

    fn parse_do_while(&mut self) -> SquashResult<Stmt> {
        let start = self.start();
        self.bump()?;
        let body = self.parse_loop_body()?;
        self.expect(TokenKind::While)?;
        let test = self.parse_paren_expression()?;
        // A semicolon is always inserted after `do … while (…)`.
        self.eat(TokenKind::Semicolon)?;
        Ok(Stmt::DoWhile(DoWhileStmt {
            loc: self.span(start),
            body: Box::new(body),
            test: Box::new(test),
        }))
    }

    /// Optional label after `break` / `continue`.
    fn parse_jump_label(&mut self) -> SquashResult<Option<Ident>> {
        if self.is_identifier_token() && !self.tok.had_line_terminator_before {
            Ok(Some(self.parse_ident()?))
        } else {
            Ok(None)
        }
    }

    fn parse_continue(&mut self) -> SquashResult<Stmt> {
        let start = self.start();
        self.bump()?;
        let label = self.parse_jump_label()?;
        match &label {
            Some(l) => {
                let found = self.ctx.labels.iter().rev().find(|x| x.name == l.name);
                match found {
                    Some(x) if x.is_loop => {}
                    Some(_) => {
                        return Err(self.error_at(
                            l.loc.start,
                            format!("Illegal continue statement: '{}' does not denote an iteration statement", l.name),
                        ));
                    }
                    None => {
                        return Err(self.error_at(l.loc.start, format!("Undefined label '{}'", l.name)));
                    }
                }
            }
            None if self.ctx.loop_depth == 0 => {
                return Err(self.error_at(start, "Illegal continue statement"));
            }
            None => {}
        }
        self.consume_semicolon()?;
        Ok(Stmt::Continue(ContinueStmt {
            loc: self.span(start),
            label,
        }))
    }

    fn parse_break(&mut self) -> SquashResult<Stmt> {
        let start = self.start();
        self.bump()?;
        let label = self.parse_jump_label()?;
        match &label {
            Some(l) => {
                if !self.ctx.labels.iter().any(|x| x.name == l.name) {
                    return Err(self.error_at(l.loc.start, format!("Undefined label '{}'", l.name)));
                }
            }
            None if self.ctx.loop_depth == 0 && self.ctx.switch_depth == 0 => {
                return Err(self.error_at(start, "Illegal break statement"));
            }
            None => {}
        }
        self.consume_semicolon()?;
        Ok(Stmt::Break(BreakStmt {
            loc: self.span(start),
            label,
        }))
    }

    fn parse_return(&mut self) -> SquashResult<Stmt> {
        let start = self.start();
        if !self.ctx.in_function && !self.bare_returns {
            return Err(self.error_at(start, "'return' outside of function"));
        }
        self.bump()?;
        let argument = if self.at(TokenKind::Semicolon)
            || self.at(TokenKind::RightBrace)
            || self.at(TokenKind::Eof)
            || self.tok.had_line_terminator_before
        {
            None
        } else {
            Some(Box::new(self.parse_expression(false)?))
        };
        self.consume_semicolon()?;
        Ok(Stmt::Return(ReturnStmt {
            loc: self.span(start),
            argument,
        }))
    }

    fn parse_with(&mut self) -> SquashResult<Stmt> {
        let start = self.start();
        if self.ctx.strict {
            return Err(self.error_at(start, "Strict mode code may not include a with statement"));
        }
        self.bump()?;
        let object = self.parse_paren_expression()?;
        let body = self.parse_statement()?;
        Ok(Stmt::With(WithStmt {
            loc: self.span(start),
            object: Box::new(object),
            body: Box::new(body),
        }))
    }

    fn parse_switch(&mut self) -> SquashResult<Stmt> {
        let start = self.start();
        self.bump()?;
        let discriminant = self.parse_paren_expression()?;
        self.expect(TokenKind::LeftBrace)?;
        self.ctx.switch_depth += 1;
        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.at(TokenKind::RightBrace) {
            let cstart = self.start();
            let test = match self.tok.kind {
                TokenKind::Case => {
                    self.bump()?;
                    Some(self.parse_expression(false)?)
                }
                TokenKind::Default => {
                    if seen_default {
                        return Err(self.error_at(
                            cstart,
                            "More than one default clause in switch statement",
                        ));
                    }
                    seen_default = true;
                    self.bump()?;
                    None
                }
                _ => return Err(self.unexpected()),
            };
            self.expect(TokenKind::Colon)?;
            let mut consequent = Vec::new();
            while !matches!(
                self.tok.kind,
                TokenKind::Case | TokenKind::Default | TokenKind::RightBrace | TokenKind::Eof
            ) {
                consequent.push(self.parse_statement_list_item()?);
            }
            cases.push(SwitchCase {
                loc: self.span(cstart),
                test,
                consequent,
            });
        }
        self.bump()?;
        self.ctx.switch_depth -= 1;
        Ok(Stmt::Switch(SwitchStmt {
            loc: self.span(start),
            discriminant: Box::new(discriminant),
            cases,
        }))
    }

    fn parse_throw(&mut self) -> SquashResult<Stmt> {
        let start = self.start();
        self.bump()?;
        if self.tok.had_line_terminator_before {
            return Err(self.error_at(self.start(), "Illegal newline after throw"));
        }
        let argument = self.parse_expression(false)?;
        self.consume_semicolon()?;
        Ok(Stmt::Throw(ThrowStmt {
            loc: self.span(start),
            argument: Box::new(argument),
        }))
    }

    fn parse_try(&mut self) -> SquashResult<Stmt> {
        let start = self.start();
        self.bump()?;
        let block = self.parse_block()?;
        let handler = if self.at(TokenKind::Catch) {
            let cstart = self.start();
            self.bump()?;
            let param = if self.eat(TokenKind::LeftParen)? {
                let p = self.parse_binding_target()?;
                self.expect(TokenKind::RightParen)?;
                Some(p)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause {
                loc: self.span(cstart),
                param,
                body,
            })
        } else {
            None
        };
        let finalizer = if self.eat(TokenKind::Finally)? {
            Some(self.parse_block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error_at(self.start(), "Missing catch or finally after try"));
        }
        Ok(Stmt::Try(Box::new(TryStmt {
            loc: self.span(start),
            block,
            handler,
            finalizer,
        })))
    }

    fn parse_labeled(&mut self) -> SquashResult<Stmt> {
        let start = self.start();
        let label = self.parse_ident()?;
        self.expect(TokenKind::Colon)?;
        if self.ctx.labels.iter().any(|l| l.name == label.name) {
            return Err(self.error_at(
                label.loc.start,
                format!("Label '{}' has already been declared", label.name),
            ));
        }
        let is_loop = matches!(self.tok.kind, TokenKind::For | TokenKind::While | TokenKind::Do);
        self.ctx.labels.push(Label {
            name: label.name.clone(),
            is_loop,
        });
        let body = self.parse_statement();
        self.ctx.labels.pop();
        Ok(Stmt::Labeled(LabeledStmt {
            loc: self.span(start),
            label,
            body: Box::new(body?),
        }))
    }

    // ── Modules ─────────────────────────────────────────────────────────────

    fn parse_string_lit(&mut self) -> SquashResult<StringLit> {
        if !self.at(TokenKind::StringLiteral) {
            return Err(self.unexpected());
        }
        let tok = self.bump()?;
        Ok(string_lit(tok))
    }

    fn parse_module_export_name(&mut self) -> SquashResult<ModuleExportName> {
        if self.at(TokenKind::StringLiteral) {
            return Ok(ModuleExportName::Str(self.parse_string_lit()?));
        }
        Ok(ModuleExportName::Ident(self.parse_ident_name()?))
    }

    fn parse_import_decl(&mut self) -> SquashResult<Stmt> {
        let start = self.start();
        self.bump()?;
        let mut specifiers = Vec::new();
        if !self.at(TokenKind::StringLiteral) {
            if self.is_identifier_token() {
                specifiers.push(ImportSpecifier::Default(self.parse_binding_ident()?));
                if !self.eat(TokenKind::Comma)? {
                    return self.finish_import(start, specifiers);
                }
            }
            if self.eat(TokenKind::Star)? {
                self.expect(TokenKind::As)?;
                specifiers.push(ImportSpecifier::Namespace(self.parse_binding_ident()?));
            } else if self.eat(TokenKind::LeftBrace)? {
                while !self.at(TokenKind::RightBrace) {
                    let imported = self.parse_module_export_name()?;
                    let local = if self.eat(TokenKind::As)? {
                        self.parse_binding_ident()?
                    } else {
                        match &imported {
                            ModuleExportName::Ident(i) if !i.name.is_empty() => {
                                if crate::parser::scanner::is_reserved_word(&i.name) {
                                    return Err(self.error_at(
                                        i.loc.start,
                                        format!("Unexpected reserved word {}", i.name),
                                    ));
                                }
                                Ident::new(i.name.clone(), i.loc)
                            }
                            _ => return Err(self.unexpected()),
                        }
                    };
                    specifiers.push(ImportSpecifier::Named { imported, local });
                    if !self.eat(TokenKind::Comma)? {
                        break;
                    }
                }
                self.expect(TokenKind::RightBrace)?;
            }
        }
        self.finish_import(start, specifiers)
    }

    fn finish_import(
        &mut self,
        start: Position,
        specifiers: Vec<ImportSpecifier>,
    ) -> SquashResult<Stmt> {
        if !specifiers.is_empty() {
            self.expect(TokenKind::From)?;
        }
        let source = self.parse_string_lit()?;
        self.consume_semicolon()?;
        Ok(Stmt::Module(Box::new(ModuleDecl::Import(ImportDecl {
            loc: self.span(start),
            specifiers,
            source,
        }))))
    }

    fn parse_export_decl(&mut self) -> SquashResult<Stmt> {
        let start = self.start();
        self.bump()?;
        let decl = match self.tok.kind {
            TokenKind::Default => {
                self.bump()?;
                let declaration = match self.tok.kind {
                    TokenKind::Function => {
                        ExportDefaultExpr::Fn(Box::new(self.parse_function_decl(false, true)?))
                    }
                    TokenKind::Async if self.async_function_follows() => {
                        ExportDefaultExpr::Fn(Box::new(self.parse_function_decl(true, true)?))
                    }
                    TokenKind::Class => {
                        let cstart = self.start();
                        ExportDefaultExpr::Class(Box::new(self.parse_class(cstart, false)?))
                    }
                    _ => {
                        let expr = self.parse_assign(false)?;
                        self.consume_semicolon()?;
                        ExportDefaultExpr::Expr(Box::new(expr))
                    }
                };
                ModuleDecl::ExportDefault(ExportDefaultDecl {
                    loc: self.span(start),
                    declaration,
                })
            }
            TokenKind::Star => {
                self.bump()?;
                let exported = if self.eat(TokenKind::As)? {
                    Some(self.parse_module_export_name()?)
                } else {
                    None
                };
                self.expect(TokenKind::From)?;
                let source = self.parse_string_lit()?;
                self.consume_semicolon()?;
                ModuleDecl::ExportAll(ExportAllDecl {
                    loc: self.span(start),
                    exported,
                    source,
                })
            }
            TokenKind::LeftBrace => {
                self.bump()?;
                let mut specifiers = Vec::new();
                while !self.at(TokenKind::RightBrace) {
                    let local = self.parse_module_export_name()?;
                    let exported = if self.eat(TokenKind::As)? {
                        self.parse_module_export_name()?
                    } else {
                        local.clone()
                    };
                    specifiers.push(ExportSpecifier { local, exported });
                    if !self.eat(TokenKind::Comma)? {
                        break;
                    }
                }
                self.expect(TokenKind::RightBrace)?;
                let source = if self.eat(TokenKind::From)? {
                    Some(self.parse_string_lit()?)
                } else {
                    None
                };
                self.consume_semicolon()?;
                ModuleDecl::ExportNamed(ExportNamedDecl {
                    loc: self.span(start),
                    specifiers,
                    source,
                    declaration: None,
                })
            }
            TokenKind::Var | TokenKind::Let | TokenKind::Const | TokenKind::Function
            | TokenKind::Class => {
                let declaration = self.parse_statement_list_item()?;
                ModuleDecl::ExportNamed(ExportNamedDecl {
                    loc: self.span(start),
                    specifiers: Vec::new(),
                    source: None,
                    declaration: Some(Box::new(declaration)),
                })
            }
            TokenKind::Async if self.async_function_follows() => {
                let declaration = self.parse_statement_list_item()?;
                ModuleDecl::ExportNamed(ExportNamedDecl {
                    loc: self.span(start),
                    specifiers: Vec::new(),
                    source: None,
                    declaration: Some(Box::new(declaration)),
                })
            }
            _ => return Err(self.unexpected()),
        };
        Ok(Stmt::Module(Box::new(decl)))
    }

    // ── Functions and classes ───────────────────────────────────────────────

    /// `[async] function[*] name(…) {…}`; the name is optional only for
    /// `export default`.
    fn parse_function_decl(&mut self, is_async: bool, optional_name: bool) -> SquashResult<Function> {
        let start = self.start();
        if is_async {
            self.bump()?;
        }
        self.expect(TokenKind::Function)?;
        let is_generator = self.eat(TokenKind::Star)?;
        let id = if optional_name && self.at(TokenKind::LeftParen) {
            None
        } else {
            Some(self.parse_binding_ident()?)
        };
        self.parse_function_rest(start, id, is_async, is_generator)
    }

    fn parse_function_expr(&mut self, is_async: bool) -> SquashResult<Expr> {
        let start = self.start();
        if is_async {
            self.bump()?;
        }
        self.expect(TokenKind::Function)?;
        let is_generator = self.eat(TokenKind::Star)?;
        let id = if self.at(TokenKind::LeftParen) {
            None
        } else {
            // The name of a function expression lives in its own context.
            let outer = (self.ctx.is_async, self.ctx.is_generator);
            self.ctx.is_async = is_async;
            self.ctx.is_generator = is_generator;
            let id = self.parse_binding_ident();
            (self.ctx.is_async, self.ctx.is_generator) = outer;
            Some(id?)
        };
        let f = self.parse_function_rest(start, id, is_async, is_generator)?;
        Ok(Expr::Fn(Box::new(f)))
    }

    /// Parameters and body, from the opening `(`.
    fn parse_function_rest(
        &mut self,
        start: Position,
        id: Option<Ident>,
        is_async: bool,
        is_generator: bool,
    ) -> SquashResult<Function> {
        let (params, body) = self.with_function(is_async, is_generator, |p| {
            let params = p.parse_params()?;
            let body = p.parse_function_body()?;
            Ok((params, body))
        })?;
        Ok(Function {
            loc: self.span(start),
            id,
            is_async,
            is_generator,
            params,
            body,
        })
    }

    fn parse_params(&mut self) -> SquashResult<Vec<Pat>> {
        self.expect(TokenKind::LeftParen)?;
        let mut params = Vec::new();
        while !self.at(TokenKind::RightParen) {
            if self.at(TokenKind::DotDotDot) {
                params.push(self.parse_rest_pattern()?);
                if !self.at(TokenKind::RightParen) {
                    return Err(self.error_at(self.start(), "Rest parameter must be last formal parameter"));
                }
                break;
            }
            params.push(self.parse_binding_element()?);
            if !self.at(TokenKind::RightParen) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.bump()?;
        Ok(params)
    }

    fn parse_function_body(&mut self) -> SquashResult<BlockStmt> {
        let start = self.start();
        self.expect(TokenKind::LeftBrace)?;
        let body = self.parse_statement_list(TokenKind::RightBrace, false)?;
        self.bump()?;
        Ok(BlockStmt {
            loc: self.span(start),
            body,
        })
    }

    fn parse_class(&mut self, start: Position, id_required: bool) -> SquashResult<Class> {
        let outer_strict = self.ctx.strict;
        self.bump()?;
        self.set_strict(true)?;
        let result = self.parse_class_tail(start, id_required);
        self.set_strict(outer_strict)?;
        result
    }

    fn parse_class_tail(&mut self, start: Position, id_required: bool) -> SquashResult<Class> {
        let id = if self.is_identifier_token() {
            Some(self.parse_binding_ident()?)
        } else if id_required {
            return Err(self.unexpected());
        } else {
            None
        };
        let super_class = if self.eat(TokenKind::Extends)? {
            Some(Box::new(self.parse_lhs()?))
        } else {
            None
        };
        self.expect(TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        while !self.at(TokenKind::RightBrace) {
            if self.eat(TokenKind::Semicolon)? {
                continue;
            }
            body.push(self.parse_class_member()?);
        }
        self.bump()?;
        Ok(Class {
            loc: self.span(start),
            id,
            super_class,
            body,
        })
    }

    /// `true` when the current modifier-like word is really a property name.
    fn modifier_is_name(&self) -> bool {
        match self.peek() {
            Some(t) => matches!(
                t.kind,
                TokenKind::LeftParen
                    | TokenKind::Equal
                    | TokenKind::Semicolon
                    | TokenKind::RightBrace
                    | TokenKind::Comma
                    | TokenKind::Colon
                    | TokenKind::Eof
            ),
            None => true,
        }
    }

    fn parse_class_member(&mut self) -> SquashResult<ClassMember> {
        let start = self.start();
        let is_static = if self.at(TokenKind::Static) && !self.modifier_is_name() {
            self.bump()?;
            true
        } else {
            false
        };
        if is_static && self.at(TokenKind::LeftBrace) {
            let body = self.with_function(false, false, |p| {
                p.ctx.in_function = false;
                let block = p.parse_block()?;
                Ok(block.body)
            })?;
            return Ok(ClassMember::StaticBlock(StaticBlock {
                loc: self.span(start),
                body,
            }));
        }
        let is_async = if self.at(TokenKind::Async)
            && !self.modifier_is_name()
            && !self.peek().is_some_and(|t| t.had_line_terminator_before)
        {
            self.bump()?;
            true
        } else {
            false
        };
        let is_generator = self.eat(TokenKind::Star)?;
        let mut kind = MethodKind::Method;
        if !is_async && !is_generator && (self.at(TokenKind::Get) || self.at(TokenKind::Set)) && !self.modifier_is_name() {
            kind = if self.bump()?.kind == TokenKind::Get {
                MethodKind::Get
            } else {
                MethodKind::Set
            };
        }
        let key = self.parse_prop_key()?;
        if self.at(TokenKind::LeftParen) {
            let is_ctor_name = matches!(&key, PropKey::Ident(i) if i.name == "constructor")
                || matches!(&key, PropKey::Str(s) if s.value == "constructor");
            if is_ctor_name && !is_static {
                if kind != MethodKind::Method || is_async || is_generator {
                    return Err(self.error_at(start, "Class constructor may not be a special method"));
                }
                kind = MethodKind::Constructor;
            }
            let fstart = self.start();
            let value = self.parse_function_rest(fstart, None, is_async, is_generator)?;
            return Ok(ClassMember::Method(MethodDef {
                loc: self.span(start),
                is_static,
                kind,
                key,
                value: Box::new(value),
            }));
        }
        if kind != MethodKind::Method || is_async || is_generator {
            return Err(self.unexpected());
        }
        let value = if self.eat(TokenKind::Equal)? {
            let expr = self.with_function(false, false, |p| p.parse_assign(false))?;
            Some(Box::new(expr))
        } else {
            None
        };
        self.consume_semicolon()?;
        Ok(ClassMember::Property(PropertyDef {
            loc: self.span(start),
            is_static,
            key,
            value,
        }))
    }

    fn parse_prop_key(&mut self) -> SquashResult<PropKey> {
        match self.tok.kind {
            TokenKind::StringLiteral => Ok(PropKey::Str(self.parse_string_lit()?)),
            TokenKind::NumericLiteral => {
                let tok = self.bump()?;
                let value = match tok.value {
                    TokenValue::Number(n) => n,
                    _ => 0.0,
                };
                Ok(PropKey::Num(NumLit {
                    loc: tok.span,
                    value,
                }))
            }
            TokenKind::BigIntLiteral => {
                let tok = self.bump()?;
                let digits = match tok.value {
                    TokenValue::BigInt(d) => d,
                    _ => String::new(),
                };
                Ok(PropKey::Str(StringLit::new(bigint_key(&digits), tok.span)))
            }
            TokenKind::LeftBracket => {
                self.bump()?;
                let expr = self.parse_assign(false)?;
                self.expect(TokenKind::RightBracket)?;
                Ok(PropKey::Computed(Box::new(expr)))
            }
            TokenKind::PrivateIdentifier => {
                let tok = self.bump()?;
                Ok(PropKey::Private(PrivateIdent {
                    loc: tok.span,
                    name: tok.text().to_string(),
                }))
            }
            _ => Ok(PropKey::Ident(self.parse_ident_name()?)),
        }
    }

    // ── Patterns ────────────────────────────────────────────────────────────

    fn parse_binding_target(&mut self) -> SquashResult<Pat> {
        match self.tok.kind {
            TokenKind::LeftBracket => self.parse_array_binding(),
            TokenKind::LeftBrace => self.parse_object_binding(),
            _ => Ok(Pat::Ident(self.parse_binding_ident()?)),
        }
    }

    fn parse_binding_element(&mut self) -> SquashResult<Pat> {
        let start = self.start();
        let target = self.parse_binding_target()?;
        self.parse_binding_default(start, target)
    }

    fn parse_binding_default(&mut self, start: Position, target: Pat) -> SquashResult<Pat> {
        if !self.eat(TokenKind::Equal)? {
            return Ok(target);
        }
        let right = self.parse_assign(false)?;
        Ok(Pat::Assign(Box::new(AssignPat {
            loc: self.span(start),
            left: Box::new(target),
            right: Box::new(right),
        })))
    }

    fn parse_rest_pattern(&mut self) -> SquashResult<Pat> {
        let start = self.start();
        self.expect(TokenKind::DotDotDot)?;
        let argument = self.parse_binding_target()?;
        Ok(Pat::Rest(Box::new(RestElement {
            loc: self.span(start),
            argument: Box::new(argument),
        })))
    }

    fn parse_array_binding(&mut self) -> SquashResult<Pat> {
        let start = self.start();
        self.bump()?;
        let mut elements = Vec::new();
        while !self.at(TokenKind::RightBracket) {
            if self.eat(TokenKind::Comma)? {
                elements.push(None);
                continue;
            }
            if self.at(TokenKind::DotDotDot) {
                elements.push(Some(self.parse_rest_pattern()?));
                break;
            }
            elements.push(Some(self.parse_binding_element()?));
            if !self.at(TokenKind::RightBracket) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(TokenKind::RightBracket)?;
        Ok(Pat::Array(Box::new(ArrayPat {
            loc: self.span(start),
            elements,
        })))
    }

    fn parse_object_binding(&mut self) -> SquashResult<Pat> {
        let start = self.start();
        self.bump()?;
        let mut properties = Vec::new();
        while !self.at(TokenKind::RightBrace) {
            let pstart = self.start();
            if self.eat(TokenKind::DotDotDot)? {
                let argument = Pat::Ident(self.parse_binding_ident()?);
                properties.push(ObjectPatProp::Rest(RestElement {
                    loc: self.span(pstart),
                    argument: Box::new(argument),
                }));
                break;
            }
            let shorthand_ok = self.is_identifier_token();
            let key = self.parse_prop_key()?;
            let value = if self.eat(TokenKind::Colon)? {
                self.parse_binding_element()?
            } else {
                let PropKey::Ident(name) = &key else {
                    return Err(self.unexpected());
                };
                if !shorthand_ok {
                    return Err(self.error_at(pstart, format!("Unexpected keyword {}", name.name)));
                }
                let id = Ident::new(name.name.clone(), name.loc);
                self.parse_binding_default(pstart, Pat::Ident(id))?
            };
            properties.push(ObjectPatProp::KeyValue(KeyValuePatProp {
                loc: self.span(pstart),
                key,
                value,
            }));
            if !self.at(TokenKind::RightBrace) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.bump()?;
        Ok(Pat::Object(Box::new(ObjectPat {
            loc: self.span(start),
            properties,
        })))
    }

    /// Reinterpret an already-parsed expression as a pattern.  `binding`
    /// patterns (parameters) only allow identifiers as leaves; assignment
    /// patterns also allow member expressions.
    fn expr_to_pat(&self, expr: Expr, binding: bool) -> SquashResult<Pat> {
        let loc = expr.loc();
        let invalid = || self.error_at(loc.start, "Invalid destructuring assignment target");
        match expr {
            Expr::Ident(i) => {
                if self.ctx.strict && matches!(i.name.as_str(), "eval" | "arguments") {
                    return Err(invalid());
                }
                Ok(Pat::Ident(i))
            }
            Expr::Member(m) if !binding && !m.optional => {
                Ok(Pat::Expr(Box::new(Expr::Member(m))))
            }
            Expr::Array(a) => {
                let count = a.elements.len();
                let mut elements = Vec::with_capacity(count);
                for (i, el) in a.elements.into_iter().enumerate() {
                    let pat = match el {
                        None => None,
                        Some(Expr::Spread(s)) => {
                            if i + 1 != count {
                                return Err(self.error_at(s.loc.start, "Rest element must be last element"));
                            }
                            Some(Pat::Rest(Box::new(RestElement {
                                loc: s.loc,
                                argument: Box::new(self.expr_to_pat(*s.argument, binding)?),
                            })))
                        }
                        Some(e) => Some(self.expr_to_pat(e, binding)?),
                    };
                    elements.push(pat);
                }
                Ok(Pat::Array(Box::new(ArrayPat { loc, elements })))
            }
            Expr::Object(o) => {
                let count = o.properties.len();
                let mut properties = Vec::with_capacity(count);
                for (i, prop) in o.properties.into_iter().enumerate() {
                    match prop {
                        ObjectProp::Spread(s) => {
                            if i + 1 != count {
                                return Err(self.error_at(s.loc.start, "Rest element must be last element"));
                            }
                            properties.push(ObjectPatProp::Rest(RestElement {
                                loc: s.loc,
                                argument: Box::new(self.expr_to_pat(*s.argument, binding)?),
                            }));
                        }
                        ObjectProp::Prop(p) => {
                            let Prop { loc, key, value } = *p;
                            let PropValue::Value(v) = value else {
                                return Err(invalid());
                            };
                            properties.push(ObjectPatProp::KeyValue(KeyValuePatProp {
                                loc,
                                key,
                                value: self.expr_to_pat(*v, binding)?,
                            }));
                        }
                    }
                }
                Ok(Pat::Object(Box::new(ObjectPat { loc, properties })))
            }
            Expr::Assign(a) if a.op == AssignOp::Assign => {
                let left = match a.left {
                    AssignTarget::Expr(e) => self.expr_to_pat(*e, binding)?,
                    AssignTarget::Pat(p) => p,
                };
                Ok(Pat::Assign(Box::new(AssignPat {
                    loc: a.loc,
                    left: Box::new(left),
                    right: a.right,
                })))
            }
            _ => Err(invalid()),
        }
    }

    // ── Expressions ─────────────────────────────────────────────────────────

    fn parse_expression(&mut self, no_in: bool) -> SquashResult<Expr> {
        let first = self.parse_assign(no_in)?;
        if !self.at(TokenKind::Comma) {
            return Ok(first);
        }
        let mut exprs = vec![first];
        while self.eat(TokenKind::Comma)? {
            exprs.push(self.parse_assign(no_in)?);
        }
        Ok(Expr::sequence(exprs))
    }

    fn assign_op(&self) -> Option<AssignOp> {
        Some(match self.tok.kind {
            TokenKind::Equal => AssignOp::Assign,
            TokenKind::PlusEqual => AssignOp::AddAssign,
            TokenKind::MinusEqual => AssignOp::SubAssign,
            TokenKind::StarEqual => AssignOp::MulAssign,
            TokenKind::SlashEqual => AssignOp::DivAssign,
            TokenKind::PercentEqual => AssignOp::RemAssign,
            TokenKind::StarStarEqual => AssignOp::ExpAssign,
            TokenKind::LessLessEqual => AssignOp::ShlAssign,
            TokenKind::GreaterGreaterEqual => AssignOp::ShrAssign,
            TokenKind::GreaterGreaterGreaterEqual => AssignOp::UShrAssign,
            TokenKind::PipeEqual => AssignOp::BitOrAssign,
            TokenKind::CaretEqual => AssignOp::BitXorAssign,
            TokenKind::AmpersandEqual => AssignOp::BitAndAssign,
            TokenKind::AmpersandAmpersandEqual => AssignOp::LogicalAndAssign,
            TokenKind::PipePipeEqual => AssignOp::LogicalOrAssign,
            TokenKind::QuestionQuestionEqual => AssignOp::NullishAssign,
            _ => return None,
        })
    }

    fn parse_assign(&mut self, no_in: bool) -> SquashResult<Expr> {
        let start = self.start();
        if self.at(TokenKind::Yield) && self.ctx.is_generator {
            return self.parse_yield(no_in);
        }
        // `x => …`
        if self.is_identifier_token()
            && let Some(next) = self.peek()
            && next.kind == TokenKind::Arrow
            && !next.had_line_terminator_before
        {
            let param = Pat::Ident(self.parse_binding_ident()?);
            return self.parse_arrow_rest(start, false, vec![param], no_in);
        }
        // `async x => …`
        if self.at(TokenKind::Async)
            && let Some((a, b)) = self.peek2()
            && !a.had_line_terminator_before
            && (a.kind == TokenKind::Identifier || (a.kind.is_contextual() && a.kind != TokenKind::Await))
            && b.kind == TokenKind::Arrow
            && !b.had_line_terminator_before
        {
            self.bump()?;
            let outer = self.ctx.is_async;
            self.ctx.is_async = true;
            let param = self.parse_binding_ident();
            self.ctx.is_async = outer;
            let param = Pat::Ident(param?);
            return self.parse_arrow_rest(start, true, vec![param], no_in);
        }

        let left = self.parse_conditional(no_in)?;
        if matches!(left, Expr::Arrow(_)) {
            return Ok(left);
        }
        let Some(op) = self.assign_op() else {
            return Ok(left);
        };
        let target = match left {
            Expr::Array(_) | Expr::Object(_) if op == AssignOp::Assign => {
                AssignTarget::Pat(self.expr_to_pat(left, false)?)
            }
            Expr::Ident(ref i) => {
                if self.ctx.strict && matches!(i.name.as_str(), "eval" | "arguments") {
                    return Err(self.error_at(start, "Invalid left-hand side in assignment"));
                }
                AssignTarget::Expr(Box::new(left))
            }
            Expr::Member(ref m) if !m.optional => AssignTarget::Expr(Box::new(left)),
            _ => return Err(self.error_at(start, "Invalid left-hand side in assignment")),
        };
        self.bump()?;
        let right = self.parse_assign(no_in)?;
        Ok(Expr::Assign(Box::new(AssignExpr {
            loc: self.span(start),
            op,
            left: target,
            right: Box::new(right),
        })))
    }

    fn parse_yield(&mut self, no_in: bool) -> SquashResult<Expr> {
        let start = self.start();
        self.bump()?;
        let ends_here = self.tok.had_line_terminator_before
            || matches!(
                self.tok.kind,
                TokenKind::RightParen
                    | TokenKind::RightBracket
                    | TokenKind::RightBrace
                    | TokenKind::Comma
                    | TokenKind::Semicolon
                    | TokenKind::Colon
                    | TokenKind::Eof
                    | TokenKind::TemplateMiddle
                    | TokenKind::TemplateTail
            )
            || (no_in && self.at(TokenKind::In));
        let (delegate, argument) = if ends_here {
            (false, None)
        } else {
            let delegate = self.eat(TokenKind::Star)?;
            if !delegate && self.at(TokenKind::Question) {
                (false, None)
            } else {
                (delegate, Some(Box::new(self.parse_assign(no_in)?)))
            }
        };
        Ok(Expr::Yield(Box::new(YieldExpr {
            loc: self.span(start),
            delegate,
            argument,
        })))
    }

    fn parse_arrow_rest(
        &mut self,
        start: Position,
        is_async: bool,
        params: Vec<Pat>,
        no_in: bool,
    ) -> SquashResult<Expr> {
        if self.tok.had_line_terminator_before {
            return Err(self.unexpected());
        }
        self.expect(TokenKind::Arrow)?;
        let body = self.with_function(is_async, false, |p| {
            if p.at(TokenKind::LeftBrace) {
                Ok(ArrowBody::Block(p.parse_function_body()?))
            } else {
                Ok(ArrowBody::Expr(Box::new(p.parse_assign(no_in)?)))
            }
        })?;
        Ok(Expr::Arrow(Box::new(ArrowExpr {
            loc: self.span(start),
            is_async,
            params,
            body,
        })))
    }

    fn parse_conditional(&mut self, no_in: bool) -> SquashResult<Expr> {
        let start = self.start();
        let test = self.parse_binary(0, no_in)?;
        if !self.at(TokenKind::Question) || matches!(test, Expr::Arrow(_)) {
            return Ok(test);
        }
        self.bump()?;
        let consequent = self.parse_assign(false)?;
        self.expect(TokenKind::Colon)?;
        let alternate = self.parse_assign(no_in)?;
        Ok(Expr::Conditional(Box::new(ConditionalExpr {
            loc: self.span(start),
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })))
    }

    fn infix_op(&self, no_in: bool) -> Option<InfixOp> {
        use BinaryOp as B;
        Some(InfixOp::Binary(match self.tok.kind {
            TokenKind::AmpersandAmpersand => return Some(InfixOp::Logical(LogicalOp::And)),
            TokenKind::PipePipe => return Some(InfixOp::Logical(LogicalOp::Or)),
            TokenKind::QuestionQuestion => {
                return Some(InfixOp::Logical(LogicalOp::NullishCoalesce));
            }
            TokenKind::EqualEqual => B::Eq,
            TokenKind::BangEqual => B::NotEq,
            TokenKind::EqualEqualEqual => B::StrictEq,
            TokenKind::BangEqualEqual => B::StrictNotEq,
            TokenKind::Less => B::Lt,
            TokenKind::LessEqual => B::LtEq,
            TokenKind::Greater => B::Gt,
            TokenKind::GreaterEqual => B::GtEq,
            TokenKind::LessLess => B::Shl,
            TokenKind::GreaterGreater => B::Shr,
            TokenKind::GreaterGreaterGreater => B::UShr,
            TokenKind::Plus => B::Add,
            TokenKind::Minus => B::Sub,
            TokenKind::Star => B::Mul,
            TokenKind::Slash => B::Div,
            TokenKind::Percent => B::Rem,
            TokenKind::StarStar => B::Exp,
            TokenKind::Pipe => B::BitOr,
            TokenKind::Caret => B::BitXor,
            TokenKind::Ampersand => B::BitAnd,
            TokenKind::In if !no_in => B::In,
            TokenKind::Instanceof => B::Instanceof,
            _ => return None,
        }))
    }

    /// Precedence climbing over binary and logical operators.  `**` is the
    /// only right-associative tier.
    fn parse_binary(&mut self, min_prec: u8, no_in: bool) -> SquashResult<Expr> {
        let start = self.start();
        let mut left = self.parse_unary()?;
        if matches!(left, Expr::Arrow(_)) {
            return Ok(left);
        }
        loop {
            if self.at(TokenKind::RegExpLiteral) {
                self.tok = self.scanner.rescan_as_division(&self.tok);
            }
            let Some(op) = self.infix_op(no_in) else {
                break;
            };
            let prec = op.precedence();
            if prec <= min_prec {
                break;
            }
            self.bump()?;
            let right = match op {
                InfixOp::Binary(BinaryOp::Exp) => self.parse_binary(prec - 1, no_in)?,
                _ => self.parse_binary(prec, no_in)?,
            };
            let loc = self.span(start);
            left = match op {
                InfixOp::Binary(op) => Expr::Binary(Box::new(BinaryExpr {
                    loc,
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                })),
                InfixOp::Logical(op) => Expr::Logical(Box::new(LogicalExpr {
                    loc,
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                })),
            };
        }
        Ok(left)
    }

    fn check_simple_target(&self, expr: &Expr, pos: Position) -> SquashResult<()> {
        match expr {
            Expr::Ident(i) => {
                if self.ctx.strict && matches!(i.name.as_str(), "eval" | "arguments") {
                    return Err(self.error_at(pos, "Invalid left-hand side expression in update operation"));
                }
                Ok(())
            }
            Expr::Member(m) if !m.optional => Ok(()),
            _ => Err(self.error_at(pos, "Invalid left-hand side expression in update operation")),
        }
    }

    fn parse_unary(&mut self) -> SquashResult<Expr> {
        let start = self.start();
        let op = match self.tok.kind {
            TokenKind::Delete => Some(UnaryOp::Delete),
            TokenKind::Void => Some(UnaryOp::Void),
            TokenKind::Typeof => Some(UnaryOp::Typeof),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            self.bump()?;
            let argument = self.parse_unary()?;
            if op == UnaryOp::Delete && self.ctx.strict && matches!(argument, Expr::Ident(_)) {
                return Err(self.error_at(start, "Delete of an unqualified identifier in strict mode."));
            }
            if self.at(TokenKind::StarStar) {
                return Err(self.error_at(
                    self.start(),
                    "Unary operator used immediately before exponentiation expression",
                ));
            }
            return Ok(Expr::Unary(Box::new(UnaryExpr {
                loc: self.span(start),
                op,
                argument: Box::new(argument),
            })));
        }
        if matches!(self.tok.kind, TokenKind::PlusPlus | TokenKind::MinusMinus) {
            let op = if self.bump()?.kind == TokenKind::PlusPlus {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            let arg_start = self.start();
            let argument = self.parse_unary()?;
            self.check_simple_target(&argument, arg_start)?;
            return Ok(Expr::Update(Box::new(UpdateExpr {
                loc: self.span(start),
                op,
                prefix: true,
                argument: Box::new(argument),
            })));
        }
        if self.at(TokenKind::Await) && self.ctx.is_async {
            self.bump()?;
            let argument = self.parse_unary()?;
            return Ok(Expr::Await(Box::new(AwaitExpr {
                loc: self.span(start),
                argument: Box::new(argument),
            })));
        }
        let expr = self.parse_lhs()?;
        if matches!(self.tok.kind, TokenKind::PlusPlus | TokenKind::MinusMinus)
            && !self.tok.had_line_terminator_before
            && !matches!(expr, Expr::Arrow(_))
        {
            self.check_simple_target(&expr, start)?;
            let op = if self.bump()?.kind == TokenKind::PlusPlus {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            return Ok(Expr::Update(Box::new(UpdateExpr {
                loc: self.span(start),
                op,
                prefix: false,
                argument: Box::new(expr),
            })));
        }
        Ok(expr)
    }

    /// Left-hand-side expression: `new`, member access, calls.
    fn parse_lhs(&mut self) -> SquashResult<Expr> {
        let start = self.start();
        let pure = self.tok.comments_before.iter().any(Comment::is_pure_annotation);
        let expr = match self.tok.kind {
            TokenKind::New => self.parse_new(pure)?,
            TokenKind::Super => {
                let tok = self.bump()?;
                if !matches!(
                    self.tok.kind,
                    TokenKind::LeftParen | TokenKind::Dot | TokenKind::LeftBracket
                ) {
                    return Err(self.error_at(tok.span.start, "'super' keyword unexpected here"));
                }
                Expr::Super(SuperExpr { loc: tok.span })
            }
            TokenKind::Import => self.parse_import_expr()?,
            _ => self.parse_primary()?,
        };
        if matches!(expr, Expr::Arrow(_)) {
            return Ok(expr);
        }
        let tail_pure = pure && !matches!(expr, Expr::New(_));
        self.parse_call_tail(start, expr, true, tail_pure)
    }

    fn parse_import_expr(&mut self) -> SquashResult<Expr> {
        let start = self.start();
        self.bump()?;
        if self.eat(TokenKind::Dot)? {
            if !self.at(TokenKind::Meta) {
                return Err(self.unexpected());
            }
            self.bump()?;
            if !self.module {
                return Err(self.error_at(start, "Cannot use 'import.meta' outside a module"));
            }
            return Ok(Expr::MetaProp(MetaPropExpr {
                loc: self.span(start),
                kind: MetaPropKind::ImportMeta,
            }));
        }
        self.expect(TokenKind::LeftParen)?;
        let source = self.parse_assign(false)?;
        let options = if self.eat(TokenKind::Comma)? && !self.at(TokenKind::RightParen) {
            let o = self.parse_assign(false)?;
            self.eat(TokenKind::Comma)?;
            Some(Box::new(o))
        } else {
            None
        };
        self.expect(TokenKind::RightParen)?;
        Ok(Expr::Import(Box::new(ImportExpr {
            loc: self.span(start),
            source: Box::new(source),
            options,
        })))
    }

    fn parse_new(&mut self, pure: bool) -> SquashResult<Expr> {
        let start = self.start();
        self.bump()?;
        if self.eat(TokenKind::Dot)? {
            if !self.at(TokenKind::Target) {
                return Err(self.unexpected());
            }
            self.bump()?;
            return Ok(Expr::MetaProp(MetaPropExpr {
                loc: self.span(start),
                kind: MetaPropKind::NewTarget,
            }));
        }
        let callee_start = self.start();
        let callee = match self.tok.kind {
            TokenKind::New => self.parse_new(false)?,
            TokenKind::Import => return Err(self.error_at(callee_start, "Cannot use new with import")),
            _ => self.parse_primary()?,
        };
        if matches!(callee, Expr::Arrow(_)) {
            return Err(self.error_at(callee_start, "Invalid new target"));
        }
        let callee = self.parse_call_tail(callee_start, callee, false, false)?;
        // A parenthesized chain is a plain callee; `new a?.b` is not.
        if self.at(TokenKind::QuestionDot) {
            return Err(self.error_at(callee_start, "Invalid optional chain from new expression"));
        }
        let arguments = if self.at(TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expr::New(Box::new(NewExpr {
            loc: self.span(start),
            callee: Box::new(callee),
            arguments,
            pure,
        })))
    }

    fn parse_arguments(&mut self) -> SquashResult<Vec<Expr>> {
        self.expect(TokenKind::LeftParen)?;
        let mut args = Vec::new();
        while !self.at(TokenKind::RightParen) {
            if self.at(TokenKind::DotDotDot) {
                let start = self.start();
                self.bump()?;
                let argument = self.parse_assign(false)?;
                args.push(Expr::Spread(Box::new(SpreadElement {
                    loc: self.span(start),
                    argument: Box::new(argument),
                })));
            } else {
                args.push(self.parse_assign(false)?);
            }
            if !self.at(TokenKind::RightParen) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.bump()?;
        Ok(args)
    }

    fn parse_member_name(&mut self) -> SquashResult<MemberProp> {
        if self.at(TokenKind::PrivateIdentifier) {
            let tok = self.bump()?;
            return Ok(MemberProp::Private(PrivateIdent {
                loc: tok.span,
                name: tok.text().to_string(),
            }));
        }
        Ok(MemberProp::Ident(self.parse_ident_name()?))
    }

    /// Member accesses, calls, optional links and tagged templates following
    /// `expr`.  The first call created takes the `pure` annotation.
    fn parse_call_tail(
        &mut self,
        start: Position,
        mut expr: Expr,
        allow_call: bool,
        mut pure: bool,
    ) -> SquashResult<Expr> {
        let mut in_chain = false;
        loop {
            match self.tok.kind {
                TokenKind::Dot => {
                    self.bump()?;
                    let property = self.parse_member_name()?;
                    expr = Expr::Member(Box::new(MemberExpr {
                        loc: self.span(start),
                        object: Box::new(expr),
                        property,
                        optional: false,
                    }));
                }
                TokenKind::QuestionDot if allow_call => {
                    self.bump()?;
                    in_chain = true;
                    match self.tok.kind {
                        TokenKind::LeftParen => {
                            let arguments = self.parse_arguments()?;
                            expr = Expr::Call(Box::new(CallExpr {
                                loc: self.span(start),
                                callee: Box::new(expr),
                                arguments,
                                optional: true,
                                pure: std::mem::take(&mut pure),
                            }));
                        }
                        TokenKind::LeftBracket => {
                            self.bump()?;
                            let prop = self.parse_expression(false)?;
                            self.expect(TokenKind::RightBracket)?;
                            expr = Expr::Member(Box::new(MemberExpr {
                                loc: self.span(start),
                                object: Box::new(expr),
                                property: MemberProp::Computed(Box::new(prop)),
                                optional: true,
                            }));
                        }
                        _ => {
                            let property = self.parse_member_name()?;
                            expr = Expr::Member(Box::new(MemberExpr {
                                loc: self.span(start),
                                object: Box::new(expr),
                                property,
                                optional: true,
                            }));
                        }
                    }
                }
                TokenKind::LeftBracket => {
                    self.bump()?;
                    let prop = self.parse_expression(false)?;
                    self.expect(TokenKind::RightBracket)?;
                    expr = Expr::Member(Box::new(MemberExpr {
                        loc: self.span(start),
                        object: Box::new(expr),
                        property: MemberProp::Computed(Box::new(prop)),
                        optional: false,
                    }));
                }
                TokenKind::LeftParen if allow_call => {
                    let arguments = self.parse_arguments()?;
                    expr = Expr::Call(Box::new(CallExpr {
                        loc: self.span(start),
                        callee: Box::new(expr),
                        arguments,
                        optional: false,
                        pure: std::mem::take(&mut pure),
                    }));
                }
                TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead => {
                    if in_chain {
                        return Err(self.error_at(
                            self.start(),
                            "Invalid tagged template on optional chain",
                        ));
                    }
                    let quasi = self.parse_template(true)?;
                    expr = Expr::TaggedTemplate(Box::new(TaggedTemplateExpr {
                        loc: self.span(start),
                        tag: Box::new(expr),
                        quasi,
                    }));
                }
                _ => break,
            }
        }
        if in_chain {
            expr = Expr::Chain(Box::new(ChainExpr {
                loc: self.span(start),
                expr: Box::new(expr),
            }));
        }
        Ok(expr)
    }

    fn parse_template(&mut self, tagged: bool) -> SquashResult<TemplateLit> {
        let start = self.start();
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        loop {
            if !matches!(
                self.tok.kind,
                TokenKind::NoSubstitutionTemplate
                    | TokenKind::TemplateHead
                    | TokenKind::TemplateMiddle
                    | TokenKind::TemplateTail
            ) {
                return Err(self.unexpected());
            }
            let tok = self.bump()?;
            let tail = matches!(tok.kind, TokenKind::NoSubstitutionTemplate | TokenKind::TemplateTail);
            let (cooked, raw) = match tok.value {
                TokenValue::Template { cooked, raw } => (cooked, raw),
                _ => (None, String::new()),
            };
            if !tagged && cooked.is_none() {
                return Err(self.error_at(tok.span.start, "Invalid escape sequence in template"));
            }
            quasis.push(TemplateElement {
                loc: tok.span,
                raw,
                cooked,
            });
            if tail {
                break;
            }
            expressions.push(self.parse_expression(false)?);
        }
        Ok(TemplateLit {
            loc: self.span(start),
            quasis,
            expressions,
        })
    }

    fn parse_primary(&mut self) -> SquashResult<Expr> {
        let start = self.start();
        if matches!(self.tok.kind, TokenKind::Slash | TokenKind::SlashEqual) {
            self.tok = self.scanner.rescan_as_regexp(&self.tok)?;
        }
        match self.tok.kind {
            TokenKind::This => {
                let tok = self.bump()?;
                Ok(Expr::This(ThisExpr { loc: tok.span }))
            }
            TokenKind::Null => {
                let tok = self.bump()?;
                Ok(Expr::Null(NullLit { loc: tok.span }))
            }
            TokenKind::True | TokenKind::False => {
                let tok = self.bump()?;
                Ok(Expr::Bool(BoolLit {
                    loc: tok.span,
                    value: tok.kind == TokenKind::True,
                }))
            }
            TokenKind::NumericLiteral => {
                let tok = self.bump()?;
                let value = match tok.value {
                    TokenValue::Number(n) => n,
                    _ => 0.0,
                };
                Ok(Expr::Num(NumLit {
                    loc: tok.span,
                    value,
                }))
            }
            TokenKind::BigIntLiteral => {
                let tok = self.bump()?;
                let value = match tok.value {
                    TokenValue::BigInt(d) => d,
                    _ => String::new(),
                };
                Ok(Expr::BigInt(BigIntLit {
                    loc: tok.span,
                    value,
                }))
            }
            TokenKind::StringLiteral => {
                let tok = self.bump()?;
                Ok(Expr::Str(string_lit(tok)))
            }
            TokenKind::RegExpLiteral => {
                let tok = self.bump()?;
                let (pattern, flags) = match tok.value {
                    TokenValue::Regex { pattern, flags } => (pattern, flags),
                    _ => (String::new(), String::new()),
                };
                Ok(Expr::Regexp(RegExpLit {
                    loc: tok.span,
                    pattern,
                    flags,
                }))
            }
            TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead => {
                Ok(Expr::Template(Box::new(self.parse_template(false)?)))
            }
            TokenKind::LeftParen => self.parse_paren_or_arrow(),
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::LeftBrace => self.parse_object_literal(),
            TokenKind::Function => self.parse_function_expr(false),
            TokenKind::Class => {
                let c = self.parse_class(start, false)?;
                Ok(Expr::Class(Box::new(c)))
            }
            TokenKind::Async if self.async_function_follows() => self.parse_function_expr(true),
            TokenKind::Async
                if matches!(self.peek(), Some(t) if t.kind == TokenKind::LeftParen && !t.had_line_terminator_before) =>
            {
                self.parse_async_call_or_arrow()
            }
            _ if self.is_identifier_token() => Ok(Expr::Ident(self.parse_ident()?)),
            _ => Err(self.unexpected()),
        }
    }

    /// `async(…)` is a call unless an arrow follows.
    fn parse_async_call_or_arrow(&mut self) -> SquashResult<Expr> {
        let start = self.start();
        let callee = self.parse_ident()?;
        let args = self.parse_arguments()?;
        if self.at(TokenKind::Arrow) && !self.tok.had_line_terminator_before {
            let params = self.args_to_params(args)?;
            return self.parse_arrow_rest(start, true, params, false);
        }
        Ok(Expr::Call(Box::new(CallExpr {
            loc: self.span(start),
            callee: Box::new(Expr::Ident(callee)),
            arguments: args,
            optional: false,
            pure: false,
        })))
    }

    fn args_to_params(&self, args: Vec<Expr>) -> SquashResult<Vec<Pat>> {
        let count = args.len();
        let mut params = Vec::with_capacity(count);
        for (i, arg) in args.into_iter().enumerate() {
            match arg {
                Expr::Spread(s) => {
                    if i + 1 != count {
                        return Err(self.error_at(s.loc.start, "Rest parameter must be last formal parameter"));
                    }
                    params.push(Pat::Rest(Box::new(RestElement {
                        loc: s.loc,
                        argument: Box::new(self.expr_to_pat(*s.argument, true)?),
                    })));
                }
                other => params.push(self.expr_to_pat(other, true)?),
            }
        }
        Ok(params)
    }

    /// A parenthesised expression, or the head of an arrow function.
    fn parse_paren_or_arrow(&mut self) -> SquashResult<Expr> {
        let start = self.start();
        self.bump()?;
        let mut items = Vec::new();
        let mut rest = None;
        let mut trailing_comma = None;
        while !self.at(TokenKind::RightParen) {
            if self.at(TokenKind::DotDotDot) {
                rest = Some(self.parse_rest_pattern()?);
                break;
            }
            items.push(self.parse_assign(false)?);
            if !self.at(TokenKind::RightParen) {
                let comma = self.expect(TokenKind::Comma)?;
                if self.at(TokenKind::RightParen) {
                    trailing_comma = Some(comma.span.start);
                }
            }
        }
        let close = self.expect(TokenKind::RightParen)?;
        if self.at(TokenKind::Arrow) && !self.tok.had_line_terminator_before {
            let mut params = self.args_to_params(items)?;
            params.extend(rest);
            return self.parse_arrow_rest(start, false, params, false);
        }
        if items.is_empty() {
            return Err(self.error_at(close.span.start, "Unexpected token )"));
        }
        if let Some(r) = rest {
            return Err(self.error_at(r.loc().start, "Unexpected token ..."));
        }
        if let Some(pos) = trailing_comma {
            return Err(self.error_at(pos, "Unexpected token ,"));
        }
        Ok(Expr::sequence(items))
    }

    fn parse_array_literal(&mut self) -> SquashResult<Expr> {
        let start = self.start();
        self.bump()?;
        let mut elements = Vec::new();
        while !self.at(TokenKind::RightBracket) {
            if self.eat(TokenKind::Comma)? {
                elements.push(None);
                continue;
            }
            let el = if self.at(TokenKind::DotDotDot) {
                let sstart = self.start();
                self.bump()?;
                let argument = self.parse_assign(false)?;
                Expr::Spread(Box::new(SpreadElement {
                    loc: self.span(sstart),
                    argument: Box::new(argument),
                }))
            } else {
                self.parse_assign(false)?
            };
            elements.push(Some(el));
            if !self.at(TokenKind::RightBracket) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.bump()?;
        Ok(Expr::Array(Box::new(ArrayExpr {
            loc: self.span(start),
            elements,
        })))
    }

    fn parse_object_literal(&mut self) -> SquashResult<Expr> {
        let start = self.start();
        self.bump()?;
        let mut properties = Vec::new();
        while !self.at(TokenKind::RightBrace) {
            properties.push(self.parse_object_member()?);
            if !self.at(TokenKind::RightBrace) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.bump()?;
        Ok(Expr::Object(Box::new(ObjectExpr {
            loc: self.span(start),
            properties,
        })))
    }

    fn parse_object_member(&mut self) -> SquashResult<ObjectProp> {
        let start = self.start();
        if self.eat(TokenKind::DotDotDot)? {
            let argument = self.parse_assign(false)?;
            return Ok(ObjectProp::Spread(SpreadElement {
                loc: self.span(start),
                argument: Box::new(argument),
            }));
        }
        let is_async = self.at(TokenKind::Async)
            && !self.modifier_is_name()
            && !self.peek().is_some_and(|t| t.had_line_terminator_before);
        if is_async {
            self.bump()?;
        }
        let is_generator = self.eat(TokenKind::Star)?;
        let accessor = if !is_async
            && !is_generator
            && (self.at(TokenKind::Get) || self.at(TokenKind::Set))
            && !self.modifier_is_name()
        {
            Some(self.bump()?.kind)
        } else {
            None
        };
        let shorthand_ok = self.is_identifier_token();
        let key = self.parse_prop_key()?;
        if let PropKey::Private(p) = &key {
            return Err(self.error_at(p.loc.start, "Unexpected private name"));
        }

        let value = if let Some(kind) = accessor {
            let fstart = self.start();
            let f = Box::new(self.parse_function_rest(fstart, None, false, false)?);
            if kind == TokenKind::Get {
                PropValue::Get(f)
            } else {
                PropValue::Set(f)
            }
        } else if is_async || is_generator || self.at(TokenKind::LeftParen) {
            let fstart = self.start();
            PropValue::Method(Box::new(self.parse_function_rest(fstart, None, is_async, is_generator)?))
        } else if self.eat(TokenKind::Colon)? {
            PropValue::Value(Box::new(self.parse_assign(false)?))
        } else {
            let PropKey::Ident(name) = &key else {
                return Err(self.unexpected());
            };
            if !shorthand_ok {
                return Err(self.error_at(name.loc.start, format!("Unexpected token {}", name.name)));
            }
            let reference = Expr::Ident(Ident::new(name.name.clone(), name.loc));
            if self.at(TokenKind::Equal) {
                // Only valid once the literal is reinterpreted as a pattern.
                self.bump()?;
                let default = self.parse_assign(false)?;
                PropValue::Value(Box::new(Expr::Assign(Box::new(AssignExpr {
                    loc: self.span(start),
                    op: AssignOp::Assign,
                    left: AssignTarget::Expr(Box::new(reference)),
                    right: Box::new(default),
                }))))
            } else {
                PropValue::Value(Box::new(reference))
            }
        };
        Ok(ObjectProp::Prop(Box::new(Prop {
            loc: self.span(start),
            key,
            value,
        })))
    }
}

fn string_lit(tok: Token) -> StringLit {
    match tok.value {
        TokenValue::Str(value) => StringLit {
            loc: tok.span,
            value,
            raw: None,
        },
        TokenValue::LossyStr { cooked, raw } => StringLit {
            loc: tok.span,
            value: cooked,
            raw: Some(raw),
        },
        _ => StringLit::new(String::new(), tok.span),
    }
}

/// Property name of a BigInt key: its decimal digits.
fn bigint_key(digits: &str) -> String {
    let (radix, body) = match digits.get(..2) {
        Some("0x") | Some("0X") => (16, &digits[2..]),
        Some("0o") | Some("0O") => (8, &digits[2..]),
        Some("0b") | Some("0B") => (2, &digits[2..]),
        _ => return digits.to_string(),
    };
    match u128::from_str_radix(body, radix) {
        Ok(v) => v.to_string(),
        Err(_) => digits.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_script(src: &str) -> Program {
        parse(src, &ParseOptions::default()).unwrap()
    }

    fn parse_module(src: &str) -> Program {
        let opts = ParseOptions {
            module: true,
            ..ParseOptions::default()
        };
        parse(src, &opts).unwrap()
    }

    fn parse_err(src: &str) -> SquashError {
        parse(src, &ParseOptions::default()).unwrap_err()
    }

    fn first_expr(p: &Program) -> &Expr {
        match &p.body[0] {
            Stmt::Expr(e) => &e.expr,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    // ── Statements ────────────────────────────────────────────────────────

    #[test]
    fn test_parse_var_declaration() {
        let p = parse_script("var a = 1, b;");
        match &p.body[0] {
            Stmt::VarDecl(v) => {
                assert_eq!(v.kind, VarKind::Var);
                assert_eq!(v.declarators.len(), 2);
                assert!(v.declarators[1].init.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_syntax_error_points_at_token() {
        let err = parse_err("var = ;");
        assert_eq!(err.position(), Some((1, 4)));
        assert!(matches!(err, SquashError::Syntax { .. }));
    }

    #[test]
    fn test_asi_between_lines() {
        let p = parse_script("a = 1\nb = 2\n");
        assert_eq!(p.body.len(), 2);
    }

    #[test]
    fn test_missing_semicolon_on_one_line_is_error() {
        let err = parse_err("a = 1 b = 2");
        assert!(err.message().contains("Unexpected"));
    }

    #[test]
    fn test_return_newline_restricted() {
        let p = parse_script("function f(){ return\n1 }");
        let Stmt::FnDecl(f) = &p.body[0] else { panic!() };
        assert!(matches!(&f.body.body[0], Stmt::Return(r) if r.argument.is_none()));
        assert_eq!(f.body.body.len(), 2);
    }

    #[test]
    fn test_return_outside_function() {
        assert!(parse_err("return 1;").message().contains("outside of function"));
        let opts = ParseOptions {
            bare_returns: true,
            ..ParseOptions::default()
        };
        assert!(parse("return 1;", &opts).is_ok());
    }

    #[test]
    fn test_directive_prologue() {
        let p = parse_script("'use strict'; 'other'; a; 'not directive';");
        assert!(matches!(&p.body[0], Stmt::Directive(d) if d.value() == "use strict"));
        assert!(matches!(&p.body[1], Stmt::Directive(_)));
        assert!(matches!(&p.body[3], Stmt::Expr(_)));
    }

    #[test]
    fn test_parenthesized_string_is_not_directive() {
        let p = parse_script("('use strict'); with (a) {}");
        assert!(matches!(&p.body[0], Stmt::Expr(_)));
    }

    #[test]
    fn test_use_strict_rejects_with_and_octal() {
        assert!(parse_err("'use strict'; with (a) {}").message().contains("with"));
        assert!(matches!(parse_err("'use strict'; 010"), SquashError::Lexical { .. }));
        assert!(parse("010", &ParseOptions::default()).is_ok());
    }

    #[test]
    fn test_function_strictness_is_scoped() {
        assert!(parse("function f(){'use strict'} with (a) {}", &ParseOptions::default()).is_ok());
    }

    #[test]
    fn test_for_variants() {
        let p = parse_script(
            "for (var i = 0; i < 3; i++) {} for (k in o) {} for (const [a, b] of c) {} for (;;) break;",
        );
        assert!(matches!(&p.body[0], Stmt::For(_)));
        assert!(matches!(&p.body[1], Stmt::ForIn(f) if matches!(f.left, ForInOfLeft::Pat(Pat::Ident(_)))));
        assert!(matches!(&p.body[2], Stmt::ForOf(_)));
        assert!(matches!(&p.body[3], Stmt::For(f) if f.init.is_none() && f.test.is_none()));
    }

    #[test]
    fn test_in_operator_inside_for_init_parens() {
        let p = parse_script("for (var x = (a in b); x;) {}");
        assert!(matches!(&p.body[0], Stmt::For(_)));
    }

    #[test]
    fn test_labels_and_jumps() {
        assert!(parse("a: for (;;) { continue a; }", &ParseOptions::default()).is_ok());
        assert!(parse_err("a: { continue a; }").message().contains("continue"));
        assert!(parse_err("break;").message().contains("Illegal break"));
        assert!(parse_err("for(;;) break b;").message().contains("Undefined label"));
        assert!(parse_err("a: a: ;").message().contains("already been declared"));
    }

    #[test]
    fn test_switch_and_try() {
        let p = parse_script(
            "switch (x) { case 1: a(); break; default: b(); } try { f() } catch { g() } finally { h() }",
        );
        let Stmt::Switch(s) = &p.body[0] else { panic!() };
        assert_eq!(s.cases.len(), 2);
        let Stmt::Try(t) = &p.body[1] else { panic!() };
        assert!(t.handler.as_ref().is_some_and(|h| h.param.is_none()));
        assert!(t.finalizer.is_some());
    }

    #[test]
    fn test_throw_newline_is_error() {
        assert!(parse_err("throw\nx").message().contains("newline"));
    }

    // ── Expressions ───────────────────────────────────────────────────────

    #[test]
    fn test_precedence_climbing() {
        let p = parse_script("a + b * c;");
        let Expr::Binary(b) = first_expr(&p) else { panic!() };
        assert_eq!(b.op, BinaryOp::Add);
        assert!(matches!(&*b.right, Expr::Binary(r) if r.op == BinaryOp::Mul));
    }

    #[test]
    fn test_exponent_is_right_associative() {
        let p = parse_script("a ** b ** c;");
        let Expr::Binary(b) = first_expr(&p) else { panic!() };
        assert!(matches!(&*b.left, Expr::Ident(_)));
        assert!(matches!(&*b.right, Expr::Binary(_)));
        assert!(parse("-a ** 2", &ParseOptions::default()).is_err());
    }

    #[test]
    fn test_logical_and_nullish() {
        let p = parse_script("a || b && c;");
        let Expr::Logical(l) = first_expr(&p) else { panic!() };
        assert_eq!(l.op, LogicalOp::Or);
        assert!(matches!(&*l.right, Expr::Logical(r) if r.op == LogicalOp::And));
        let p = parse_script("a ?? b;");
        assert!(matches!(first_expr(&p), Expr::Logical(l) if l.op == LogicalOp::NullishCoalesce));
    }

    #[test]
    fn test_arrow_functions() {
        let p = parse_script("x => x; (a, {b}, [c] = d, ...e) => a; async y => y; async (z) => { await z };");
        assert!(matches!(first_expr(&p), Expr::Arrow(a) if a.params.len() == 1));
        let Stmt::Expr(e) = &p.body[1] else { panic!() };
        let Expr::Arrow(a) = &*e.expr else { panic!() };
        assert_eq!(a.params.len(), 4);
        assert!(matches!(a.params[3], Pat::Rest(_)));
        let Stmt::Expr(e) = &p.body[3] else { panic!() };
        assert!(matches!(&*e.expr, Expr::Arrow(a) if a.is_async));
    }

    #[test]
    fn test_async_call_is_not_arrow() {
        let p = parse_script("async(a, b);");
        assert!(matches!(first_expr(&p), Expr::Call(_)));
    }

    #[test]
    fn test_destructuring_assignment() {
        let p = parse_script("[a, b.c, ...d] = e; ({x, y: z = 1} = w);");
        let Expr::Assign(a) = first_expr(&p) else { panic!() };
        let AssignTarget::Pat(Pat::Array(arr)) = &a.left else { panic!() };
        assert!(matches!(arr.elements[1], Some(Pat::Expr(_))));
        assert!(matches!(arr.elements[2], Some(Pat::Rest(_))));
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert!(parse_err("a + b = 1").message().contains("left-hand side"));
        assert!(parse_err("++f()").message().contains("left-hand side"));
    }

    #[test]
    fn test_object_literal_forms() {
        let p = parse_script("({ a, b: 1, [c]: 2, 'd': 3, 4: 5, get e() {}, set e(v) {}, f() {}, async *g() {}, ...h });");
        let Expr::Object(o) = first_expr(&p) else { panic!() };
        assert_eq!(o.properties.len(), 10);
        let ObjectProp::Prop(a) = &o.properties[0] else { panic!() };
        assert!(matches!(&a.value, PropValue::Value(v) if matches!(&**v, Expr::Ident(i) if i.name == "a")));
        assert!(matches!(&o.properties[9], ObjectProp::Spread(_)));
    }

    #[test]
    fn test_keywords_as_property_names() {
        let p = parse_script("a.default; a.if; ({ class: 1, new: 2 });");
        assert_eq!(p.body.len(), 3);
    }

    #[test]
    fn test_optional_chain_wraps_chain_node() {
        let p = parse_script("a?.b.c(); a?.[0]; f?.();");
        assert!(matches!(first_expr(&p), Expr::Chain(_)));
        assert!(parse("a?.b = 1", &ParseOptions::default()).is_err());
    }

    #[test]
    fn test_new_and_meta_properties() {
        let p = parse_script("new a.b(c); new X; function f(){ new.target }");
        let Expr::New(n) = first_expr(&p) else { panic!() };
        assert!(matches!(&*n.callee, Expr::Member(_)));
        assert_eq!(n.arguments.len(), 1);
        let Stmt::Expr(e) = &p.body[1] else { panic!() };
        assert!(matches!(&*e.expr, Expr::New(n) if n.arguments.is_empty()));
    }

    #[test]
    fn test_new_with_parenthesized_chain() {
        let p = parse_script("new (a?.b)();");
        let Expr::New(n) = first_expr(&p) else { panic!() };
        assert!(matches!(&*n.callee, Expr::Chain(_)));
        assert!(parse("new a?.b();", &ParseOptions::default()).is_err());
        assert!(parse("new a()?.b;", &ParseOptions::default()).is_ok());
    }

    #[test]
    fn test_pure_annotation() {
        let p = parse_script("/*@__PURE__*/ foo(); /*#__PURE__*/ new Bar(); baz();");
        assert!(matches!(first_expr(&p), Expr::Call(c) if c.pure));
        let Stmt::Expr(e) = &p.body[1] else { panic!() };
        assert!(matches!(&*e.expr, Expr::New(n) if n.pure));
        let Stmt::Expr(e) = &p.body[2] else { panic!() };
        assert!(matches!(&*e.expr, Expr::Call(c) if !c.pure));
    }

    #[test]
    fn test_regex_vs_division() {
        let p = parse_script("a = b / c / d; e = /re/g.test(x); f = (1) / 2;");
        assert_eq!(p.body.len(), 3);
        let Stmt::Expr(e) = &p.body[1] else { panic!() };
        let Expr::Assign(a) = &*e.expr else { panic!() };
        assert!(matches!(&*a.right, Expr::Call(_)));
    }

    #[test]
    fn test_regex_after_brace_statement() {
        let p = parse_script("{}\n/foo/.test(x)");
        assert_eq!(p.body.len(), 2);
    }

    #[test]
    fn test_templates() {
        let p = parse_script("`a${b}c${d}e`; tag`x\\u{` ;");
        let Expr::Template(t) = first_expr(&p) else { panic!() };
        assert_eq!(t.quasis.len(), 3);
        assert_eq!(t.expressions.len(), 2);
        let Stmt::Expr(e) = &p.body[1] else { panic!() };
        let Expr::TaggedTemplate(tt) = &*e.expr else { panic!() };
        assert!(tt.quasi.quasis[0].cooked.is_none());
        assert!(parse("`\\u{`", &ParseOptions::default()).is_err());
    }

    #[test]
    fn test_generators_and_yield() {
        let p = parse_script("function* g(){ yield; yield* a; yield b }");
        let Stmt::FnDecl(f) = &p.body[0] else { panic!() };
        assert!(f.is_generator);
        assert_eq!(f.body.body.len(), 3);
        assert!(parse("var yield = 1;", &ParseOptions::default()).is_ok());
    }

    #[test]
    fn test_await_only_in_async() {
        assert!(parse("async function f(){ await x }", &ParseOptions::default()).is_ok());
        assert!(parse("function f(){ await x }", &ParseOptions::default()).is_err());
        assert!(parse("var await = 1;", &ParseOptions::default()).is_ok());
    }

    #[test]
    fn test_classes() {
        let p = parse_script(
            "class A extends B { constructor(){ super() } static x = 1; #y; get z(){ return this.#y } static { init() } *gen(){} }",
        );
        let Stmt::ClassDecl(c) = &p.body[0] else { panic!() };
        assert!(c.super_class.is_some());
        assert_eq!(c.body.len(), 6);
        assert!(matches!(&c.body[0], ClassMember::Method(m) if m.kind == MethodKind::Constructor));
        assert!(matches!(&c.body[4], ClassMember::StaticBlock(_)));
    }

    #[test]
    fn test_class_body_is_strict() {
        assert!(parse("class A { m(){ with (a) {} } }", &ParseOptions::default()).is_err());
    }

    // ── Modules ───────────────────────────────────────────────────────────

    #[test]
    fn test_module_imports_and_exports() {
        let p = parse_module(
            "import a, { b as c, d } from 'm'; import * as ns from 'n'; import 'side';\
             export const x = 1; export default function () {} export { x as y }; export * from 'o';",
        );
        assert_eq!(p.source_type, SourceType::Module);
        assert_eq!(p.body.len(), 7);
        let Stmt::Module(m) = &p.body[0] else { panic!() };
        let ModuleDecl::Import(i) = &**m else { panic!() };
        assert_eq!(i.specifiers.len(), 3);
    }

    #[test]
    fn test_import_rejected_in_script() {
        assert!(parse("import a from 'b';", &ParseOptions::default()).is_err());
        assert!(parse("import('b');", &ParseOptions::default()).is_ok());
    }

    #[test]
    fn test_module_top_level_await() {
        let p = parse_module("await x;");
        assert!(matches!(first_expr(&p), Expr::Await(_)));
    }

    #[test]
    fn test_comments_collected_once() {
        let p = parse_script("/*! keep */ a(); // tail\n b(/* inner */);");
        assert_eq!(p.comments.len(), 3);
        assert!(p.comments[0].is_license());
    }

    #[test]
    fn test_shebang_kept() {
        let p = parse_script("#!/usr/bin/env node\nfoo();");
        assert_eq!(p.shebang.as_deref(), Some("/usr/bin/env node"));
        let opts = ParseOptions {
            shebang: false,
            ..ParseOptions::default()
        };
        assert!(parse("#!x\nfoo();", &opts).is_err());
    }

    #[test]
    fn test_spans_cover_statement() {
        let p = parse_script("  foo(1);\nbar();");
        let loc = p.body[0].loc();
        assert_eq!(loc.start.column, 2);
        assert_eq!(loc.end.offset, 9);
        assert_eq!(p.body[1].loc().start.line, 2);
    }

    #[test]
    fn test_file_index_in_spans() {
        let p = parse_with_file("a;", 3, &ParseOptions::default()).unwrap();
        assert_eq!(p.body[0].loc().file, 3);
    }

    #[test]
    fn test_bigint_key_decimal() {
        assert_eq!(bigint_key("0x10"), "16");
        assert_eq!(bigint_key("12"), "12");
    }
}
