//! AST → JavaScript text.
//!
//! The printer emits the shortest text it knows for each node: minimal
//! parentheses derived from operator precedence, the shorter quote for
//! each string, the shortest spelling of each number, and no whitespace
//! beyond what separates two tokens.  `beautify` switches to an indented
//! one-statement-per-line layout.
//!
//! Output columns are counted in UTF-16 code units, matching what source
//! maps expect.

pub mod sourcemap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compress::evaluate::number_to_string;
use crate::parser::ast::*;
use crate::parser::scanner::{Comment, CommentKind, Span, is_id_continue, is_identifier_name};

pub use sourcemap::{InputSourceMap, OriginalPosition, OxcSourceMap, SourceMapSink};

/// Which comments survive into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentsOption {
    /// Drop every comment.
    None,
    /// Keep license-style comments (`/*!`, `@license`, `@preserve`).
    #[default]
    Some,
    /// Keep every comment.
    All,
}

/// Output formatting options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputOptions {
    /// Indented, one statement per line.
    pub beautify: bool,
    /// Spaces per indentation level when beautifying.
    pub indent_level: usize,
    pub comments: CommentsOption,
    /// Highest ECMAScript edition the output may use; `2015` and up enable
    /// shorthand properties.
    pub ecma: u32,
    /// Break lines after a statement once a line grows past this many
    /// columns.  `0` disables.
    pub max_line_len: usize,
    /// Escape every non-ASCII character in strings, regexps and identifiers.
    pub ascii_only: bool,
    /// Escape `</script` and HTML comment openers so the output can be
    /// inlined in a `<script>` element.
    pub inline_script: bool,
    /// Quote every property key.
    pub quote_keys: bool,
    /// Use `;` as statement separator; otherwise newlines where safe.
    pub semicolons: bool,
    /// Text written verbatim before the code.
    pub preamble: Option<String>,
    /// Keep a leading `#!` line.
    pub shebang: bool,
    /// Parenthesize immediately invoked function expressions.
    pub wrap_iife: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        OutputOptions {
            beautify: false,
            indent_level: 4,
            comments: CommentsOption::Some,
            ecma: 5,
            max_line_len: 0,
            ascii_only: false,
            inline_script: true,
            quote_keys: false,
            semicolons: true,
            preamble: None,
            shebang: true,
            wrap_iife: false,
        }
    }
}

/// Print `program`, reporting mappings to `sink` when one is given.
pub fn print(program: &Program, options: &OutputOptions, sink: Option<&mut dyn SourceMapSink>) -> String {
    let mut p = Printer::new(options, &program.files, &program.comments, sink);
    if options.shebang
        && let Some(shebang) = &program.shebang
    {
        p.raw("#!");
        p.raw(shebang);
        p.raw("\n");
    }
    if let Some(preamble) = &options.preamble {
        p.raw(preamble);
        p.raw("\n");
    }
    p.statements(&program.body);
    p.trailing_comments();
    if options.semicolons || options.beautify {
        p.flush_semi();
    }
    debug!(bytes = p.out.len(), lines = p.line, "printed program");
    p.out
}

/// Compact text of a single expression.
pub fn expr_to_string(expr: &Expr) -> String {
    let options = OutputOptions::default();
    let mut p = Printer::new(&options, &[], &[], None);
    p.expr(expr, SEQ);
    p.out
}

// ─────────────────────────────────────────────────────────────────────────────
// Precedence levels
// ─────────────────────────────────────────────────────────────────────────────

const SEQ: u8 = 0;
/// Assignment, arrow functions, `yield`, spread.
const ASSIGN: u8 = 1;
const COND: u8 = 2;
// Logical and binary operators sit at `BINARY + op.precedence()`.
const BINARY: u8 = 10;
const UNARY: u8 = 23;
const POSTFIX: u8 = 24;
/// `new X` without an argument list; also optional chains.
const NEW: u8 = 25;
const CALL: u8 = 26;
const PRIMARY: u8 = 30;

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Sequence(_) => SEQ,
        Expr::Assign(_) | Expr::Arrow(_) | Expr::Yield(_) | Expr::Spread(_) => ASSIGN,
        Expr::Conditional(_) => COND,
        Expr::Logical(l) => BINARY + l.op.precedence(),
        Expr::Binary(b) => BINARY + b.op.precedence(),
        Expr::Unary(_) | Expr::Await(_) => UNARY,
        Expr::Update(u) => {
            if u.prefix {
                UNARY
            } else {
                POSTFIX
            }
        }
        Expr::Chain(_) => NEW,
        Expr::New(_) | Expr::Call(_) | Expr::Member(_) | Expr::TaggedTemplate(_) | Expr::Import(_) => CALL,
        Expr::Num(n) if n.value.is_infinite() => BINARY + BinaryOp::Div.precedence(),
        Expr::Num(n) if n.value.is_sign_negative() && !n.value.is_nan() => UNARY,
        _ => PRIMARY,
    }
}

/// `true` when the callee chain of a `new` holds a call, which would
/// otherwise claim the `new`'s argument list.
fn contains_call(expr: &Expr) -> bool {
    match expr {
        Expr::Call(_) => true,
        Expr::Member(m) => contains_call(&m.object),
        Expr::TaggedTemplate(t) => contains_call(&t.tag),
        _ => false,
    }
}

/// A `then` branch that would capture a following `else`.
fn dangles(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::If(s) => s.alternate.as_deref().is_none_or(dangles),
        Stmt::For(s) => dangles(&s.body),
        Stmt::ForIn(s) => dangles(&s.body),
        Stmt::ForOf(s) => dangles(&s.body),
        Stmt::While(s) => dangles(&s.body),
        Stmt::Labeled(s) => dangles(&s.body),
        Stmt::With(s) => dangles(&s.body),
        _ => false,
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '\\' || (!c.is_ascii() && is_id_continue(c))
}

/// Whether `prev` and `next` would fuse into a different token.
fn needs_space(prev: char, next: char) -> bool {
    (is_word_char(prev) && is_word_char(next))
        || (prev == '+' && next == '+')
        || (prev == '-' && next == '-')
        || (prev == '/' && (next == '/' || next == '*'))
        || (prev == '<' && next == '!')
}

// ─────────────────────────────────────────────────────────────────────────────
// Literal text
// ─────────────────────────────────────────────────────────────────────────────

/// Shortest spelling of a finite, non-negative number.
fn number_text(n: f64) -> String {
    let text = number_to_string(n);
    let mut best = text.clone();
    let mut consider = |candidate: String| {
        if candidate.len() < best.len() {
            best = candidate;
        }
    };
    if let Some(rest) = text.strip_prefix("0.") {
        consider(format!(".{rest}"));
        let digits = rest.trim_start_matches('0');
        if !digits.contains('e') {
            let zeros = rest.len() - digits.len();
            consider(format!("{digits}e-{}", zeros + digits.len()));
        }
    }
    if text.contains("e+") {
        consider(text.replace("e+", "e"));
    }
    if n.fract() == 0.0 && n < 9_007_199_254_740_992.0 {
        let int = n as u64;
        consider(format!("0x{int:x}"));
        let digits = int.to_string();
        let trimmed = digits.trim_end_matches('0');
        let zeros = digits.len() - trimmed.len();
        if zeros > 2 {
            consider(format!("{trimmed}e{zeros}"));
        }
    }
    best
}

fn push_hex_escape(out: &mut String, c: char) {
    let code = c as u32;
    if code <= 0xff {
        out.push_str(&format!("\\x{code:02x}"));
    } else {
        let mut units = [0u16; 2];
        for unit in c.encode_utf16(&mut units) {
            out.push_str(&format!("\\u{unit:04x}"));
        }
    }
}

/// Replace the sequences that would end an inline `<script>` element.
fn escape_inline_script(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        if bytes[i] == b'<' && rest.len() >= 8 && rest.as_bytes()[1..8].eq_ignore_ascii_case(b"/script") {
            out.push_str("<\\/");
            i += 2;
        } else if rest.starts_with("<!--") {
            out.push_str("\\x3c!--");
            i += 4;
        } else if rest.starts_with("-->") {
            out.push_str("--\\x3e");
            i += 3;
        } else {
            let c = rest.chars().next().unwrap_or('\0');
            out.push(c);
            i += c.len_utf8();
        }
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Printer
// ─────────────────────────────────────────────────────────────────────────────

struct Printer<'a, 's> {
    options: &'a OutputOptions,
    out: String,
    /// 1-based.
    line: u32,
    /// 0-based, UTF-16 units.
    col: u32,
    last: char,
    pending_semi: bool,
    indent: usize,
    /// Inside a `for` initializer: a bare `in` would end it.
    no_in: bool,
    sink: Option<&'s mut dyn SourceMapSink>,
    pending_map: Option<(Span, Option<String>)>,
    files: &'a [String],
    comments: Vec<&'a Comment>,
    next_comment: usize,
}

impl<'a, 's> Printer<'a, 's> {
    fn new(
        options: &'a OutputOptions,
        files: &'a [String],
        comments: &'a [Comment],
        sink: Option<&'s mut dyn SourceMapSink>,
    ) -> Self {
        let mut comments: Vec<&Comment> = comments
            .iter()
            .filter(|c| match options.comments {
                CommentsOption::None => false,
                CommentsOption::Some => c.is_license(),
                CommentsOption::All => true,
            })
            .collect();
        comments.sort_by_key(|c| (c.span.file, c.span.start.offset));
        Printer {
            options,
            out: String::new(),
            line: 1,
            col: 0,
            last: '\0',
            pending_semi: false,
            indent: 0,
            no_in: false,
            sink,
            pending_map: None,
            files,
            comments,
            next_comment: 0,
        }
    }

    // ── Output primitives ────────────────────────────────────────────────

    fn raw(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += c.len_utf16() as u32;
            }
            self.last = c;
        }
        self.out.push_str(text);
    }

    fn flush_semi(&mut self) {
        if !self.pending_semi {
            return;
        }
        self.pending_semi = false;
        self.raw(";");
        if self.options.max_line_len > 0 && self.col as usize > self.options.max_line_len {
            self.raw("\n");
        }
    }

    fn token(&mut self, text: &str) {
        if self.pending_semi {
            let compact = !self.options.beautify;
            if compact && text == "}" {
                self.pending_semi = false;
            } else if compact && !self.options.semicolons && !text.starts_with(['(', '[', '+', '-', '/', '`']) {
                self.pending_semi = false;
                self.raw("\n");
            } else {
                self.flush_semi();
            }
        }
        if let Some(first) = text.chars().next()
            && needs_space(self.last, first)
        {
            self.raw(" ");
        }
        if let Some((loc, name)) = self.pending_map.take() {
            self.emit_mapping(loc, name.as_deref());
        }
        self.raw(text);
    }

    fn semi(&mut self) {
        self.pending_semi = true;
    }

    fn space(&mut self) {
        if self.options.beautify {
            self.raw(" ");
        }
    }

    fn newline(&mut self) {
        if !self.options.beautify {
            return;
        }
        self.flush_semi();
        self.raw("\n");
        let indent = " ".repeat(self.indent * self.options.indent_level);
        self.raw(&indent);
    }

    fn comma(&mut self) {
        self.token(",");
        self.space();
    }

    /// An infix operator, spaced when beautifying.
    fn operator(&mut self, op: &str) {
        self.space();
        self.token(op);
        self.space();
    }

    // ── Source maps and comments ─────────────────────────────────────────

    fn map(&mut self, loc: Span, name: Option<&str>) {
        if self.sink.is_some() && !loc.is_dummy() {
            self.pending_map = Some((loc, name.map(str::to_string)));
        }
    }

    fn emit_mapping(&mut self, loc: Span, name: Option<&str>) {
        let source = self.files.get(loc.file as usize).map(String::as_str).unwrap_or("0");
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.add(source, self.line, self.col, loc.start.line, loc.start.column, name);
        }
    }

    /// Emit the kept comments that precede `loc`.
    fn comments_before(&mut self, loc: Span) {
        if loc.is_dummy() {
            return;
        }
        while let Some(comment) = self.comments.get(self.next_comment).copied() {
            if (comment.span.file, comment.span.end.offset) > (loc.file, loc.start.offset) {
                break;
            }
            self.next_comment += 1;
            self.comment(comment);
        }
    }

    fn trailing_comments(&mut self) {
        while let Some(comment) = self.comments.get(self.next_comment).copied() {
            self.next_comment += 1;
            self.comment(comment);
        }
    }

    fn comment(&mut self, comment: &Comment) {
        let text = if self.options.inline_script {
            escape_inline_script(&comment.text)
        } else {
            comment.text.clone()
        };
        match comment.kind {
            CommentKind::Block => {
                self.token(&format!("/*{text}*/"));
                self.newline();
            }
            CommentKind::Line => {
                self.token(&format!("//{text}"));
                self.raw("\n");
                if self.options.beautify {
                    let indent = " ".repeat(self.indent * self.options.indent_level);
                    self.raw(&indent);
                }
            }
        }
    }

    // ── Statements ───────────────────────────────────────────────────────

    fn statements(&mut self, stmts: &[Stmt]) {
        for (i, stmt) in stmts.iter().enumerate() {
            if i > 0 {
                self.newline();
            }
            self.stmt(stmt);
        }
    }

    fn block(&mut self, stmts: &[Stmt]) {
        self.token("{");
        self.indent += 1;
        for stmt in stmts {
            self.newline();
            self.stmt(stmt);
        }
        self.indent -= 1;
        if !stmts.is_empty() {
            self.newline();
        }
        self.token("}");
    }

    /// Body of a loop, `if`, `with` or label.
    fn body(&mut self, stmt: &Stmt) {
        if matches!(stmt, Stmt::Block(_)) || !self.options.beautify {
            self.space();
            self.stmt(stmt);
            return;
        }
        self.indent += 1;
        self.newline();
        self.stmt(stmt);
        self.indent -= 1;
    }

    fn stmt(&mut self, stmt: &Stmt) {
        self.comments_before(stmt.loc());
        self.map(stmt.loc(), None);
        match stmt {
            Stmt::Block(b) => self.block(&b.body),
            Stmt::VarDecl(d) => {
                self.var_decl(d);
                self.semi();
            }
            Stmt::FnDecl(f) => self.function(f),
            Stmt::ClassDecl(c) => self.class(c),
            Stmt::Expr(s) => {
                self.statement_expr(&s.expr);
                self.semi();
            }
            Stmt::If(s) => self.if_stmt(s),
            Stmt::For(s) => {
                self.token("for");
                self.space();
                self.token("(");
                if let Some(init) = &s.init {
                    self.no_in = true;
                    match init {
                        ForInit::VarDecl(d) => self.var_decl(d),
                        ForInit::Expr(e) => self.expr(e, SEQ),
                    }
                    self.no_in = false;
                }
                self.token(";");
                if let Some(test) = &s.test {
                    self.space();
                    self.expr(test, SEQ);
                }
                self.token(";");
                if let Some(update) = &s.update {
                    self.space();
                    self.expr(update, SEQ);
                }
                self.token(")");
                self.body(&s.body);
            }
            Stmt::ForIn(s) => {
                self.token("for");
                self.space();
                self.token("(");
                self.for_left(&s.left);
                self.token("in");
                self.expr(&s.right, SEQ);
                self.token(")");
                self.body(&s.body);
            }
            Stmt::ForOf(s) => {
                self.token("for");
                if s.is_await {
                    self.token("await");
                }
                self.space();
                self.token("(");
                self.for_left(&s.left);
                self.token("of");
                self.expr(&s.right, ASSIGN);
                self.token(")");
                self.body(&s.body);
            }
            Stmt::While(s) => {
                self.token("while");
                self.space();
                self.token("(");
                self.expr(&s.test, SEQ);
                self.token(")");
                self.body(&s.body);
            }
            Stmt::DoWhile(s) => {
                self.token("do");
                self.body(&s.body);
                self.space();
                self.token("while");
                self.space();
                self.token("(");
                self.expr(&s.test, SEQ);
                self.token(")");
                self.semi();
            }
            Stmt::Switch(s) => {
                self.token("switch");
                self.space();
                self.token("(");
                self.expr(&s.discriminant, SEQ);
                self.token(")");
                self.space();
                self.token("{");
                for case in &s.cases {
                    self.newline();
                    match &case.test {
                        Some(test) => {
                            self.token("case");
                            self.space();
                            self.expr(test, SEQ);
                        }
                        None => self.token("default"),
                    }
                    self.token(":");
                    self.indent += 1;
                    for stmt in &case.consequent {
                        self.newline();
                        self.stmt(stmt);
                    }
                    self.indent -= 1;
                }
                if !s.cases.is_empty() {
                    self.newline();
                }
                self.token("}");
            }
            Stmt::Try(t) => {
                self.token("try");
                self.space();
                self.block(&t.block.body);
                if let Some(handler) = &t.handler {
                    self.space();
                    self.token("catch");
                    if let Some(param) = &handler.param {
                        self.space();
                        self.token("(");
                        self.pat(param);
                        self.token(")");
                    }
                    self.space();
                    self.block(&handler.body.body);
                }
                if let Some(finalizer) = &t.finalizer {
                    self.space();
                    self.token("finally");
                    self.space();
                    self.block(&finalizer.body);
                }
            }
            Stmt::Return(s) => {
                self.token("return");
                if let Some(arg) = &s.argument {
                    self.space();
                    self.expr(arg, SEQ);
                }
                self.semi();
            }
            Stmt::Throw(s) => {
                self.token("throw");
                self.space();
                self.expr(&s.argument, SEQ);
                self.semi();
            }
            Stmt::Break(s) => {
                self.token("break");
                if let Some(label) = &s.label {
                    self.space();
                    self.ident(label);
                }
                self.semi();
            }
            Stmt::Continue(s) => {
                self.token("continue");
                if let Some(label) = &s.label {
                    self.space();
                    self.ident(label);
                }
                self.semi();
            }
            Stmt::Labeled(s) => {
                self.ident(&s.label);
                self.token(":");
                self.body(&s.body);
            }
            Stmt::Debugger(_) => {
                self.token("debugger");
                self.semi();
            }
            Stmt::With(s) => {
                self.token("with");
                self.space();
                self.token("(");
                self.expr(&s.object, SEQ);
                self.token(")");
                self.body(&s.body);
            }
            Stmt::Empty(_) => self.token(";"),
            Stmt::Directive(d) => {
                let value = d.value();
                if value.contains(['"', '\\', '\n', '\r']) {
                    self.token(&d.raw);
                } else {
                    self.token(&format!("\"{value}\""));
                }
                self.semi();
            }
            Stmt::Module(m) => self.module_decl(m),
        }
    }

    fn if_stmt(&mut self, s: &IfStmt) {
        self.token("if");
        self.space();
        self.token("(");
        self.expr(&s.test, SEQ);
        self.token(")");
        let Some(alternate) = &s.alternate else {
            self.body(&s.consequent);
            return;
        };
        if dangles(&s.consequent) {
            self.space();
            self.token("{");
            self.indent += 1;
            self.newline();
            self.stmt(&s.consequent);
            self.indent -= 1;
            self.newline();
            self.token("}");
        } else {
            self.body(&s.consequent);
        }
        if matches!(&*s.consequent, Stmt::Block(_)) || dangles(&s.consequent) {
            self.space();
        } else {
            self.newline();
        }
        self.token("else");
        if matches!(&**alternate, Stmt::If(_)) {
            self.space();
            self.stmt(alternate);
        } else {
            self.body(alternate);
        }
    }

    fn for_left(&mut self, left: &ForInOfLeft) {
        match left {
            ForInOfLeft::VarDecl(d) => self.var_decl(d),
            ForInOfLeft::Pat(p) => self.pat(p),
        }
    }

    fn var_decl(&mut self, decl: &VarDecl) {
        self.token(decl.kind.as_str());
        self.space();
        for (i, d) in decl.declarators.iter().enumerate() {
            if i > 0 {
                self.comma();
            }
            self.pat(&d.id);
            if let Some(init) = &d.init {
                self.operator("=");
                self.expr(init, ASSIGN);
            }
        }
    }

    /// Expression in statement position: parenthesized when it would
    /// otherwise read as a block, declaration or directive.
    fn statement_expr(&mut self, expr: &Expr) {
        if matches!(expr, Expr::Str(_)) || self.starts_with_keyword(expr) {
            self.parenthesized(expr);
        } else {
            self.expr(expr, SEQ);
        }
    }

    /// `true` when `expr` begins with `{`, `function`, `class` or `let [`.
    fn starts_with_keyword(&self, expr: &Expr) -> bool {
        let leftmost = |child: &Expr, min: u8| precedence(child) >= min && self.starts_with_keyword(child);
        match expr {
            Expr::Object(_) | Expr::Fn(_) | Expr::Class(_) => true,
            Expr::Member(m) => {
                let let_bracket = matches!(m.property, MemberProp::Computed(_))
                    && matches!(&*m.object, Expr::Ident(i) if i.name == "let");
                let_bracket || leftmost(&m.object, CALL)
            }
            Expr::Call(c) => {
                if self.options.wrap_iife && matches!(&*c.callee, Expr::Fn(_)) {
                    return false;
                }
                leftmost(&c.callee, CALL)
            }
            Expr::TaggedTemplate(t) => leftmost(&t.tag, CALL),
            Expr::Binary(b) => {
                let min = BINARY + b.op.precedence() + u8::from(b.op == BinaryOp::Exp);
                leftmost(&b.left, min)
            }
            Expr::Logical(l) => leftmost(&l.left, BINARY + l.op.precedence()),
            Expr::Conditional(c) => leftmost(&c.test, COND + 1),
            Expr::Sequence(s) => s.expressions.first().is_some_and(|e| leftmost(e, ASSIGN)),
            Expr::Assign(a) => match &a.left {
                AssignTarget::Expr(e) => leftmost(e, CALL),
                AssignTarget::Pat(Pat::Object(_)) => true,
                AssignTarget::Pat(_) => false,
            },
            Expr::Update(u) if !u.prefix => leftmost(&u.argument, CALL),
            Expr::Chain(c) => self.starts_with_keyword(&c.expr),
            _ => false,
        }
    }

    fn module_decl(&mut self, decl: &ModuleDecl) {
        match decl {
            ModuleDecl::Import(d) => {
                self.token("import");
                let mut named = Vec::new();
                let mut first = true;
                for spec in &d.specifiers {
                    match spec {
                        ImportSpecifier::Default(local) => {
                            self.space();
                            self.ident(local);
                            first = false;
                        }
                        ImportSpecifier::Namespace(local) => {
                            if !first {
                                self.comma();
                            }
                            self.space();
                            self.token("*");
                            self.operator("as");
                            self.ident(local);
                            first = false;
                        }
                        ImportSpecifier::Named { imported, local } => named.push((imported, local)),
                    }
                }
                if !named.is_empty() {
                    if !first {
                        self.comma();
                    }
                    self.token("{");
                    for (i, (imported, local)) in named.into_iter().enumerate() {
                        if i > 0 {
                            self.comma();
                        }
                        if imported.name() != local.name {
                            self.export_name(imported);
                            self.token("as");
                        }
                        self.ident(local);
                    }
                    self.token("}");
                    first = false;
                }
                if !first {
                    self.space();
                    self.token("from");
                }
                self.space();
                self.string(&d.source);
                self.semi();
            }
            ModuleDecl::ExportNamed(d) => {
                self.token("export");
                if let Some(declaration) = &d.declaration {
                    self.space();
                    self.stmt(declaration);
                    return;
                }
                self.space();
                self.token("{");
                for (i, spec) in d.specifiers.iter().enumerate() {
                    if i > 0 {
                        self.comma();
                    }
                    self.export_name(&spec.local);
                    if spec.local.name() != spec.exported.name() {
                        self.token("as");
                        self.export_name(&spec.exported);
                    }
                }
                self.token("}");
                if let Some(source) = &d.source {
                    self.space();
                    self.token("from");
                    self.space();
                    self.string(source);
                }
                self.semi();
            }
            ModuleDecl::ExportDefault(d) => {
                self.token("export");
                self.token("default");
                self.space();
                match &d.declaration {
                    ExportDefaultExpr::Fn(f) => self.function(f),
                    ExportDefaultExpr::Class(c) => self.class(c),
                    ExportDefaultExpr::Expr(e) => {
                        if self.starts_with_keyword(e) {
                            self.parenthesized(e);
                        } else {
                            self.expr(e, ASSIGN);
                        }
                        self.semi();
                    }
                }
            }
            ModuleDecl::ExportAll(d) => {
                self.token("export");
                self.space();
                self.token("*");
                if let Some(exported) = &d.exported {
                    self.operator("as");
                    self.export_name(exported);
                }
                self.space();
                self.token("from");
                self.space();
                self.string(&d.source);
                self.semi();
            }
        }
    }

    fn export_name(&mut self, name: &ModuleExportName) {
        match name {
            ModuleExportName::Ident(i) => self.ident(i),
            ModuleExportName::Str(s) => self.string(s),
        }
    }

    // ── Functions and classes ────────────────────────────────────────────

    fn function(&mut self, f: &Function) {
        if f.is_async {
            self.token("async");
        }
        self.token("function");
        if f.is_generator {
            self.token("*");
        }
        if let Some(id) = &f.id {
            self.space();
            self.ident(id);
        }
        self.params(&f.params);
        self.space();
        self.function_body(&f.body.body);
    }

    fn params(&mut self, params: &[Pat]) {
        self.token("(");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.comma();
            }
            self.pat(param);
        }
        self.token(")");
    }

    fn function_body(&mut self, stmts: &[Stmt]) {
        let no_in = std::mem::replace(&mut self.no_in, false);
        self.block(stmts);
        self.no_in = no_in;
    }

    fn arrow(&mut self, a: &ArrowExpr) {
        if a.is_async {
            self.token("async");
        }
        match a.params.as_slice() {
            [Pat::Ident(param)] => {
                self.space();
                self.ident(param);
            }
            params => self.params(params),
        }
        self.operator("=>");
        match &a.body {
            ArrowBody::Block(b) => self.function_body(&b.body),
            ArrowBody::Expr(e) => {
                if self.starts_with_keyword(e) {
                    self.parenthesized(e);
                } else {
                    self.expr(e, ASSIGN);
                }
            }
        }
    }

    fn class(&mut self, c: &Class) {
        self.token("class");
        if let Some(id) = &c.id {
            self.space();
            self.ident(id);
        }
        if let Some(super_class) = &c.super_class {
            self.space();
            self.token("extends");
            self.space();
            self.expr(super_class, CALL);
        }
        self.space();
        self.token("{");
        self.indent += 1;
        for member in &c.body {
            self.newline();
            match member {
                ClassMember::Method(m) => {
                    if m.is_static {
                        self.token("static");
                        self.space();
                    }
                    self.method(m.kind, &m.key, &m.value);
                }
                ClassMember::Property(p) => {
                    if p.is_static {
                        self.token("static");
                        self.space();
                    }
                    self.prop_key(&p.key);
                    if let Some(value) = &p.value {
                        self.operator("=");
                        self.expr(value, ASSIGN);
                    }
                    self.semi();
                }
                ClassMember::StaticBlock(b) => {
                    self.token("static");
                    self.space();
                    self.block(&b.body);
                }
            }
        }
        self.indent -= 1;
        if !c.body.is_empty() {
            self.newline();
        }
        self.token("}");
    }

    /// Method syntax shared by classes and object literals.
    fn method(&mut self, kind: MethodKind, key: &PropKey, f: &Function) {
        match kind {
            MethodKind::Get => {
                self.token("get");
                self.space();
            }
            MethodKind::Set => {
                self.token("set");
                self.space();
            }
            MethodKind::Constructor | MethodKind::Method => {
                if f.is_async {
                    self.token("async");
                    self.space();
                }
                if f.is_generator {
                    self.token("*");
                }
            }
        }
        self.prop_key(key);
        self.params(&f.params);
        self.space();
        self.function_body(&f.body.body);
    }

    fn prop_key(&mut self, key: &PropKey) {
        match key {
            PropKey::Ident(i) => {
                if self.options.quote_keys {
                    self.token(&self.quote(&i.name));
                } else {
                    self.map(i.loc, None);
                    self.token(&self.identifier_text(&i.name));
                }
            }
            PropKey::Private(p) => self.token(&format!("#{}", self.identifier_text(&p.name))),
            PropKey::Str(s) => {
                if !self.options.quote_keys && s.raw.is_none() && is_identifier_name(&s.value) {
                    self.token(&self.identifier_text(&s.value));
                } else {
                    self.string(s);
                }
            }
            PropKey::Num(n) => {
                if self.options.quote_keys {
                    self.token(&self.quote(&number_to_string(n.value)));
                } else {
                    self.number(n.value);
                }
            }
            PropKey::Computed(e) => {
                self.token("[");
                self.expr(e, ASSIGN);
                self.token("]");
            }
        }
    }

    // ── Patterns ─────────────────────────────────────────────────────────

    fn pat(&mut self, pat: &Pat) {
        match pat {
            Pat::Ident(i) => self.ident(i),
            Pat::Array(a) => {
                self.token("[");
                for (i, element) in a.elements.iter().enumerate() {
                    if i > 0 {
                        self.comma();
                    }
                    if let Some(element) = element {
                        self.pat(element);
                    }
                }
                if matches!(a.elements.last(), Some(None)) {
                    self.token(",");
                }
                self.token("]");
            }
            Pat::Object(o) => {
                self.token("{");
                for (i, prop) in o.properties.iter().enumerate() {
                    if i > 0 {
                        self.comma();
                    }
                    match prop {
                        ObjectPatProp::KeyValue(kv) => {
                            let shorthand = match (&kv.key, &kv.value) {
                                (PropKey::Ident(key), Pat::Ident(value)) => key.name == value.name,
                                (PropKey::Ident(key), Pat::Assign(a)) => {
                                    matches!(&*a.left, Pat::Ident(value) if key.name == value.name)
                                }
                                _ => false,
                            };
                            if !shorthand || self.options.quote_keys {
                                self.prop_key(&kv.key);
                                self.token(":");
                                self.space();
                            }
                            self.pat(&kv.value);
                        }
                        ObjectPatProp::Rest(r) => {
                            self.token("...");
                            self.pat(&r.argument);
                        }
                    }
                }
                self.token("}");
            }
            Pat::Rest(r) => {
                self.token("...");
                self.pat(&r.argument);
            }
            Pat::Assign(a) => {
                self.pat(&a.left);
                self.operator("=");
                self.expr(&a.right, ASSIGN);
            }
            Pat::Expr(e) => self.expr(e, CALL),
        }
    }

    // ── Expressions ──────────────────────────────────────────────────────

    fn parenthesized(&mut self, expr: &Expr) {
        self.token("(");
        let no_in = std::mem::replace(&mut self.no_in, false);
        self.expr_inner(expr, SEQ);
        self.no_in = no_in;
        self.token(")");
    }

    /// Print `expr` where an expression of at least precedence `min` is
    /// expected.
    fn expr(&mut self, expr: &Expr, min: u8) {
        let needs_parens = precedence(expr) < min
            || (self.no_in && matches!(expr, Expr::Binary(b) if b.op == BinaryOp::In));
        if needs_parens {
            self.parenthesized(expr);
        } else {
            self.expr_inner(expr, min);
        }
    }

    fn expr_inner(&mut self, expr: &Expr, min: u8) {
        if !matches!(expr, Expr::Ident(_)) {
            self.map(expr.loc(), None);
        }
        match expr {
            Expr::Null(_) => self.token("null"),
            Expr::Bool(b) => self.token(if b.value { "true" } else { "false" }),
            Expr::Num(n) => self.number(n.value),
            Expr::Str(s) => self.string(s),
            Expr::BigInt(b) => self.token(&format!("{}n", b.value)),
            Expr::Regexp(r) => {
                let mut text = format!("/{}/{}", r.pattern, r.flags);
                if self.options.ascii_only {
                    text = self.ascii_escape(&text);
                }
                if self.options.inline_script {
                    text = escape_inline_script(&text);
                }
                self.token(&text);
            }
            Expr::Template(t) => self.template(t),
            Expr::Ident(i) => self.ident(i),
            Expr::This(_) => self.token("this"),
            Expr::Super(_) => self.token("super"),
            Expr::Array(a) => {
                self.token("[");
                for (i, element) in a.elements.iter().enumerate() {
                    if i > 0 {
                        self.comma();
                    }
                    if let Some(element) = element {
                        self.expr(element, ASSIGN);
                    }
                }
                if matches!(a.elements.last(), Some(None)) {
                    self.token(",");
                }
                self.token("]");
            }
            Expr::Object(o) => self.object(o),
            Expr::Fn(f) => self.function(f),
            Expr::Arrow(a) => self.arrow(a),
            Expr::Class(c) => self.class(c),
            Expr::Unary(u) => {
                self.token(u.op.as_str());
                if u.op.as_str().starts_with(|c: char| c.is_ascii_alphabetic()) {
                    self.space();
                }
                self.expr(&u.argument, UNARY);
            }
            Expr::Update(u) => {
                if u.prefix {
                    self.token(u.op.as_str());
                    self.expr(&u.argument, CALL);
                } else {
                    self.expr(&u.argument, CALL);
                    self.token(u.op.as_str());
                }
            }
            Expr::Binary(b) => {
                let level = BINARY + b.op.precedence();
                let (left, right) = if b.op == BinaryOp::Exp {
                    // `-a ** b` is a syntax error; the left side must be postfix or tighter.
                    (level.max(POSTFIX), level)
                } else {
                    (level, level + 1)
                };
                self.expr(&b.left, left);
                self.operator(b.op.as_str());
                self.expr(&b.right, right);
            }
            Expr::Logical(l) => {
                let level = BINARY + l.op.precedence();
                let mixes = |child: &Expr| {
                    l.op == LogicalOp::NullishCoalesce
                        && matches!(child, Expr::Logical(c) if c.op != LogicalOp::NullishCoalesce)
                };
                if mixes(&l.left) {
                    self.parenthesized(&l.left);
                } else {
                    self.expr(&l.left, level);
                }
                self.operator(l.op.as_str());
                let associative = matches!(&*l.right, Expr::Logical(r) if r.op == l.op && l.op != LogicalOp::NullishCoalesce);
                if mixes(&l.right) {
                    self.parenthesized(&l.right);
                } else {
                    self.expr(&l.right, if associative { level } else { level + 1 });
                }
            }
            Expr::Conditional(c) => {
                self.expr(&c.test, COND + 1);
                self.operator("?");
                let no_in = std::mem::replace(&mut self.no_in, false);
                self.expr(&c.consequent, ASSIGN);
                self.no_in = no_in;
                self.operator(":");
                self.expr(&c.alternate, ASSIGN);
            }
            Expr::Assign(a) => {
                match &a.left {
                    AssignTarget::Expr(e) => self.expr(e, CALL),
                    AssignTarget::Pat(p) => self.pat(p),
                }
                self.operator(a.op.as_str());
                self.expr(&a.right, ASSIGN);
            }
            Expr::Sequence(s) => {
                for (i, e) in s.expressions.iter().enumerate() {
                    if i > 0 {
                        self.comma();
                    }
                    self.expr(e, ASSIGN);
                }
            }
            Expr::Member(m) => self.member(m),
            Expr::Call(c) => {
                if self.options.wrap_iife && matches!(&*c.callee, Expr::Fn(_)) {
                    self.parenthesized(&c.callee);
                } else {
                    self.expr(&c.callee, CALL);
                }
                if c.optional {
                    self.token("?.");
                }
                self.arguments(&c.arguments);
            }
            Expr::New(n) => {
                self.token("new");
                self.space();
                if contains_call(&n.callee) {
                    self.parenthesized(&n.callee);
                } else {
                    self.expr(&n.callee, CALL);
                }
                if !n.arguments.is_empty() || min > NEW {
                    self.arguments(&n.arguments);
                }
            }
            Expr::Chain(c) => self.expr_inner(&c.expr, min),
            Expr::TaggedTemplate(t) => {
                self.expr(&t.tag, CALL);
                self.template(&t.quasi);
            }
            Expr::Spread(s) => {
                self.token("...");
                self.expr(&s.argument, ASSIGN);
            }
            Expr::Yield(y) => {
                self.token("yield");
                if y.delegate {
                    self.token("*");
                }
                if let Some(arg) = &y.argument {
                    self.space();
                    self.expr(arg, ASSIGN);
                }
            }
            Expr::Await(a) => {
                self.token("await");
                self.space();
                self.expr(&a.argument, UNARY);
            }
            Expr::Import(i) => {
                self.token("import");
                self.token("(");
                self.expr(&i.source, ASSIGN);
                if let Some(options) = &i.options {
                    self.comma();
                    self.expr(options, ASSIGN);
                }
                self.token(")");
            }
            Expr::MetaProp(m) => self.token(match m.kind {
                MetaPropKind::NewTarget => "new.target",
                MetaPropKind::ImportMeta => "import.meta",
            }),
        }
    }

    fn arguments(&mut self, args: &[Expr]) {
        self.token("(");
        let no_in = std::mem::replace(&mut self.no_in, false);
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.comma();
            }
            self.expr(arg, ASSIGN);
        }
        self.no_in = no_in;
        self.token(")");
    }

    fn member(&mut self, m: &MemberExpr) {
        let bare_integer = matches!(
            &*m.object,
            Expr::Num(n) if n.value.is_finite() && n.value >= 0.0
                && !n.value.is_sign_negative()
                && number_text(n.value).bytes().all(|b| b.is_ascii_digit())
        );
        self.expr(&m.object, CALL);
        match &m.property {
            MemberProp::Ident(p) => {
                if m.optional {
                    self.token("?.");
                } else {
                    if bare_integer {
                        self.raw(".");
                    }
                    self.token(".");
                }
                self.ident(p);
            }
            MemberProp::Private(p) => {
                self.token(if m.optional { "?." } else { "." });
                self.token(&format!("#{}", self.identifier_text(&p.name)));
            }
            MemberProp::Computed(e) => {
                if m.optional {
                    self.token("?.");
                }
                self.token("[");
                let no_in = std::mem::replace(&mut self.no_in, false);
                self.expr(e, SEQ);
                self.no_in = no_in;
                self.token("]");
            }
        }
    }

    fn object(&mut self, o: &ObjectExpr) {
        self.token("{");
        for (i, prop) in o.properties.iter().enumerate() {
            if i > 0 {
                self.comma();
            }
            match prop {
                ObjectProp::Spread(s) => {
                    self.token("...");
                    self.expr(&s.argument, ASSIGN);
                }
                ObjectProp::Prop(p) => match &p.value {
                    PropValue::Value(value) => {
                        let shorthand = self.options.ecma >= 2015
                            && !self.options.quote_keys
                            && matches!((&p.key, &**value), (PropKey::Ident(k), Expr::Ident(v)) if k.name == v.name);
                        if shorthand {
                            self.expr(value, ASSIGN);
                        } else {
                            self.prop_key(&p.key);
                            self.token(":");
                            self.space();
                            self.expr(value, ASSIGN);
                        }
                    }
                    PropValue::Get(f) => self.method(MethodKind::Get, &p.key, f),
                    PropValue::Set(f) => self.method(MethodKind::Set, &p.key, f),
                    PropValue::Method(f) => self.method(MethodKind::Method, &p.key, f),
                },
            }
        }
        self.token("}");
    }

    fn template(&mut self, t: &TemplateLit) {
        self.token("`");
        for (i, quasi) in t.quasis.iter().enumerate() {
            let raw = if self.options.inline_script {
                escape_inline_script(&quasi.raw)
            } else {
                quasi.raw.clone()
            };
            let raw = if self.options.ascii_only { self.ascii_escape(&raw) } else { raw };
            self.raw(&raw);
            if let Some(e) = t.expressions.get(i) {
                self.raw("${");
                let no_in = std::mem::replace(&mut self.no_in, false);
                self.expr(e, SEQ);
                self.no_in = no_in;
                self.raw("}");
            }
        }
        self.raw("`");
    }

    // ── Leaves ───────────────────────────────────────────────────────────

    fn ident(&mut self, ident: &Ident) {
        self.map(ident.loc, Some(&ident.name));
        let text = self.identifier_text(&ident.name);
        self.token(&text);
    }

    fn identifier_text(&self, name: &str) -> String {
        if !self.options.ascii_only || name.is_ascii() {
            return name.to_string();
        }
        let mut out = String::with_capacity(name.len() + 8);
        for c in name.chars() {
            if c.is_ascii() {
                out.push(c);
            } else if (c as u32) <= 0xffff {
                out.push_str(&format!("\\u{:04x}", c as u32));
            } else {
                out.push_str(&format!("\\u{{{:x}}}", c as u32));
            }
        }
        out
    }

    /// Escape every non-ASCII character of already escaped source text.
    fn ascii_escape(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if c.is_ascii() {
                out.push(c);
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{unit:04x}"));
                }
            }
        }
        out
    }

    fn number(&mut self, n: f64) {
        if n.is_nan() {
            self.token("NaN");
        } else if n.is_infinite() {
            self.token(if n > 0.0 { "1" } else { "-1" });
            self.token("/");
            self.token("0");
        } else if n.is_sign_negative() {
            self.token("-");
            self.token(&number_text(-n));
        } else {
            self.token(&number_text(n));
        }
    }

    fn string(&mut self, s: &StringLit) {
        match &s.raw {
            Some(raw) => self.token(raw),
            None => {
                let text = self.quote(&s.value);
                self.token(&text);
            }
        }
    }

    /// `value` as a string literal, in whichever quote needs fewer escapes.
    fn quote(&self, value: &str) -> String {
        let doubles = value.matches('"').count();
        let singles = value.matches('\'').count();
        let quote = if doubles > singles { '\'' } else { '"' };
        let mut out = String::with_capacity(value.len() + 2);
        out.push(quote);
        let mut chars = value.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\u{8}' => out.push_str("\\b"),
                '\u{c}' => out.push_str("\\f"),
                '\u{b}' => out.push_str("\\v"),
                '\u{2028}' => out.push_str("\\u2028"),
                '\u{2029}' => out.push_str("\\u2029"),
                '\u{feff}' => out.push_str("\\ufeff"),
                '\0' => {
                    if chars.peek().is_some_and(char::is_ascii_digit) {
                        out.push_str("\\x00");
                    } else {
                        out.push_str("\\0");
                    }
                }
                '\t' => out.push('\t'),
                c if c == quote => {
                    out.push('\\');
                    out.push(c);
                }
                c if c.is_ascii_control() => push_hex_escape(&mut out, c),
                c if self.options.ascii_only && !c.is_ascii() => push_hex_escape(&mut out, c),
                c => out.push(c),
            }
        }
        out.push(quote);
        if self.options.inline_script {
            escape_inline_script(&out)
        } else {
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser::{ParseOptions, parse};

    fn reprint_with(src: &str, options: &OutputOptions) -> String {
        let program = parse(src, &ParseOptions::default()).unwrap();
        print(&program, options, None)
    }

    fn reprint(src: &str) -> String {
        reprint_with(src, &OutputOptions::default())
    }

    #[test]
    fn test_compact_declarations() {
        assert_eq!(reprint("var a = 1, b;\nlet c = a + b;"), "var a=1,b;let c=a+b;");
    }

    #[test]
    fn test_minimal_parentheses() {
        assert_eq!(reprint("x = (a + b) * c;"), "x=(a+b)*c;");
        assert_eq!(reprint("x = a + (b + c);"), "x=a+(b+c);");
        assert_eq!(reprint("x = a - (b - c);"), "x=a-(b-c);");
        assert_eq!(reprint("x = (a * b) + c;"), "x=a*b+c;");
        assert_eq!(reprint("f((a, b), c);"), "f((a,b),c);");
        assert_eq!(reprint("x = (-a) ** b;"), "x=(-a)**b;");
        assert_eq!(reprint("x = a ** b ** c;"), "x=a**b**c;");
        assert_eq!(reprint("x = (a ? b : c) ? d : e;"), "x=(a?b:c)?d:e;");
    }

    #[test]
    fn test_logical_grouping() {
        assert_eq!(reprint("x = a && (b && c);"), "x=a&&b&&c;");
        assert_eq!(reprint("x = a || (b && c);"), "x=a||b&&c;");
        assert_eq!(reprint("x = (a || b) && c;"), "x=(a||b)&&c;");
        assert_eq!(reprint("x = a ?? (b || c);"), "x=a??(b||c);");
    }

    #[test]
    fn test_statement_start_wrapped() {
        assert_eq!(reprint("({a: 1}).a;"), "({a:1}.a);");
        assert_eq!(reprint("(function(){})();"), "(function(){}());");
        assert_eq!(reprint("!function(){}();"), "!function(){}();");
        assert_eq!(reprint("f = () => ({});"), "f=()=>({});");
    }

    #[test]
    fn test_let_bracket_statement_wrapped() {
        assert_eq!(reprint("(let[0] = 1);"), "(let[0]=1);");
        assert_eq!(reprint("(let[0]).x;"), "(let[0].x);");
        assert_eq!(reprint("x = let[0];"), "x=let[0];");
    }

    #[test]
    fn test_wrap_iife() {
        let options = OutputOptions { wrap_iife: true, ..OutputOptions::default() };
        assert_eq!(reprint_with("(function(){ g(); })();", &options), "(function(){g()})();");
    }

    #[test]
    fn test_numbers_shortest() {
        assert_eq!(
            reprint("x = 1000; y = 0.5; z = 1e21; w = 0.0001; v = 255; u = 100;"),
            "x=1e3;y=.5;z=1e21;w=1e-4;v=255;u=100;"
        );
        assert_eq!(reprint("x = 0xffffffffff;"), "x=0xffffffffff;");
    }

    #[test]
    fn test_integer_member_access() {
        assert_eq!(reprint("x = (1).toString();"), "x=1..toString();");
        assert_eq!(reprint("x = 1.5.toFixed();"), "x=1.5.toFixed();");
    }

    #[test]
    fn test_string_quotes() {
        assert_eq!(reprint(r#"x = "a\"b";"#), r#"x='a"b';"#);
        assert_eq!(reprint(r#"x = 'a\'b"c';"#), r#"x="a'b\"c";"#);
        assert_eq!(reprint("x = '\\n\u{2028}';"), r#"x="\n\u2028";"#);
        assert_eq!(reprint(r#"x = "\0" + "\x001";"#), r#"x="\0"+"\x001";"#);
    }

    #[test]
    fn test_ascii_only() {
        let options = OutputOptions { ascii_only: true, ..OutputOptions::default() };
        assert_eq!(reprint_with("x = \"é😀\";", &options), r#"x="\xe9\ud83d\ude00";"#);
    }

    #[test]
    fn test_inline_script_escape() {
        assert_eq!(reprint(r#"x = "</script>";"#), r#"x="<\/script>";"#);
        let options = OutputOptions { inline_script: false, ..OutputOptions::default() };
        assert_eq!(reprint_with(r#"x = "</script>";"#, &options), r#"x="</script>";"#);
    }

    #[test]
    fn test_dangling_else_braced() {
        let mut program = parse("if (a) { if (b) c(); } else d();", &ParseOptions::default()).unwrap();
        if let Stmt::If(outer) = &mut program.body[0]
            && let Stmt::Block(block) = &mut *outer.consequent
        {
            let inner = block.body.remove(0);
            *outer.consequent = inner;
        }
        assert_eq!(print(&program, &OutputOptions::default(), None), "if(a){if(b)c()}else d();");
    }

    #[test]
    fn test_loops() {
        assert_eq!(reprint("do x(); while (c)"), "do x();while(c);");
        assert_eq!(reprint("for (var i = (\"a\" in o); ;) ;"), "for(var i=(\"a\"in o);;);");
        assert_eq!(reprint("for (const k in o) g(k);"), "for(const k in o)g(k);");
        assert_eq!(reprint("for (x of [1, , 2, ,]) ;"), "for(x of[1,,2,,]);");
    }

    #[test]
    fn test_new_and_chains() {
        assert_eq!(reprint("x = new Foo;"), "x=new Foo;");
        assert_eq!(reprint("x = new Foo().bar;"), "x=new Foo().bar;");
        assert_eq!(reprint("x = new (foo())();"), "x=new(foo());");
        assert_eq!(reprint("a?.b.c; (a?.b).c;"), "a?.b.c;(a?.b).c;");
    }

    #[test]
    fn test_template_literal() {
        assert_eq!(reprint("x = `a${b + 1}c`;"), "x=`a${b+1}c`;");
    }

    #[test]
    fn test_shorthand_needs_es2015() {
        assert_eq!(reprint("x = {a: a, b: c};"), "x={a:a,b:c};");
        let options = OutputOptions { ecma: 2015, ..OutputOptions::default() };
        assert_eq!(reprint_with("x = {a: a, b: c};", &options), "x={a,b:c};");
    }

    #[test]
    fn test_quote_keys() {
        let options = OutputOptions { quote_keys: true, ..OutputOptions::default() };
        assert_eq!(reprint_with("x = {a: 1, 2: 3};", &options), r#"x={"a":1,"2":3};"#);
    }

    #[test]
    fn test_beautify() {
        let options = OutputOptions { beautify: true, ..OutputOptions::default() };
        assert_eq!(
            reprint_with("function f(a){return a+1}", &options),
            "function f(a) {\n    return a + 1;\n}"
        );
    }

    #[test]
    fn test_license_comments_kept() {
        assert_eq!(reprint("/*! keep */ a(); /* drop */ b();"), "/*! keep */a();b();");
        let options = OutputOptions { comments: CommentsOption::None, ..OutputOptions::default() };
        assert_eq!(reprint_with("/*! keep */ a();", &options), "a();");
    }

    #[test]
    fn test_without_semicolons() {
        let options = OutputOptions { semicolons: false, ..OutputOptions::default() };
        assert_eq!(reprint_with("a(); b(); [c].d();", &options), "a()\nb();[c].d()");
    }

    #[test]
    fn test_preamble_and_shebang() {
        let options = OutputOptions { preamble: Some("/* hi */".into()), ..OutputOptions::default() };
        let program = parse("#!/usr/bin/env node\nf();", &ParseOptions { shebang: true, ..ParseOptions::default() }).unwrap();
        assert_eq!(print(&program, &options, None), "#!/usr/bin/env node\n/* hi */\nf();");
    }

    #[test]
    fn test_module_syntax() {
        let options = ParseOptions { module: true, ..ParseOptions::default() };
        let program = parse(
            "import a, {b as c, d} from \"m\"; export {c as e}; export * from \"n\"; export default function(){}",
            &options,
        )
        .unwrap();
        assert_eq!(
            print(&program, &OutputOptions::default(), None),
            "import a,{b as c,d}from\"m\";export{c as e};export*from\"n\";export default function(){}"
        );
    }

    #[test]
    fn test_classes() {
        assert_eq!(
            reprint("class A extends B { static x = 1; get y() { return 2 } *g() {} }"),
            "class A extends B{static x=1;get y(){return 2}*g(){}}"
        );
    }

    #[test]
    fn test_source_map_mappings() {
        let mut program = parse("var a = 1;\nfoo(a);", &ParseOptions::default()).unwrap();
        program.files = vec!["in.js".to_string()];
        let mut sink = OxcSourceMap::new(Some("out.js"));
        let code = print(&program, &OutputOptions::default(), Some(&mut sink));
        assert_eq!(code, "var a=1;foo(a);");
        let map: serde_json::Value = serde_json::from_str(&sink.get()).unwrap();
        assert_eq!(map["sources"][0], "in.js");
        assert!(map["names"].as_array().unwrap().iter().any(|n| n == "foo"));
    }

    #[test]
    fn test_expr_to_string() {
        let program = parse("x = a.b(1, 'c')", &ParseOptions::default()).unwrap();
        let Stmt::Expr(s) = &program.body[0] else { panic!("expected expression") };
        assert_eq!(expr_to_string(&s.expr), "x=a.b(1,\"c\")");
    }
}
