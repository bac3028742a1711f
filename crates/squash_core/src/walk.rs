//! Generic traversal over the AST.
//!
//! Two primitives are provided:
//!
//! - [`Visit`]: a read-only visitor whose default methods recurse into every
//!   child.  Override a method and call the matching `walk_*` function to keep
//!   descending.
//! - [`Rewriter`]: a mutating traversal.  `before_*` hooks run top-down and
//!   may replace a node before its children are visited; `after_*` hooks run
//!   bottom-up once the children are done.  Both return a [`RewriteAction`].
//!
//! Statement lists accept every action.  A single-statement slot (the body of
//! an `if`, a loop, a label) turns `Remove` into `;` and `SpliceMany` into a
//! block; a single-expression slot turns `Remove` into `void 0` and
//! `SpliceMany` into a comma sequence.

use crate::parser::ast::*;

// ─────────────────────────────────────────────────────────────────────────────
// RewriteAction
// ─────────────────────────────────────────────────────────────────────────────

/// What a rewrite hook wants done with the node it was handed.
#[derive(Debug, Clone)]
pub enum RewriteAction<T> {
    /// Leave the node in place.
    Keep,
    /// Put this node in its place.  Returned from a `before_*` hook, the new
    /// node's children are visited next.
    Replace(T),
    /// Drop the node.
    Remove,
    /// Replace the node with several.
    SpliceMany(Vec<T>),
    /// Keep the node and skip its children (and its `after_*` hook).
    StopDescent,
}

/// The kind of statement list handed to [`Rewriter::after_stmts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Top level of the program.
    Program,
    /// Body of a function or arrow.
    Function,
    /// A `{}` block, `try`/`catch`/`finally` block or the like.
    Block,
    /// The statements of a `case` / `default` clause.
    Case,
    /// A class `static {}` block.
    StaticBlock,
}

// ─────────────────────────────────────────────────────────────────────────────
// Read-only visitor
// ─────────────────────────────────────────────────────────────────────────────

/// Read-only AST visitor.  Every method defaults to full recursion.
pub trait Visit {
    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_pat(&mut self, pat: &Pat) {
        walk_pat(self, pat);
    }

    fn visit_function(&mut self, function: &Function) {
        walk_function(self, function);
    }

    fn visit_arrow(&mut self, arrow: &ArrowExpr) {
        walk_arrow(self, arrow);
    }

    fn visit_class(&mut self, class: &Class) {
        walk_class(self, class);
    }

    fn visit_prop_key(&mut self, key: &PropKey) {
        walk_prop_key(self, key);
    }

    /// Every identifier: references, bindings and import/export locals.
    /// Property names and labels are not identifiers here.
    fn visit_ident(&mut self, _ident: &Ident) {}
}

pub fn walk_program<V: Visit + ?Sized>(v: &mut V, program: &Program) {
    for stmt in &program.body {
        v.visit_stmt(stmt);
    }
}

fn walk_var_decl<V: Visit + ?Sized>(v: &mut V, decl: &VarDecl) {
    for d in &decl.declarators {
        v.visit_pat(&d.id);
        if let Some(init) = &d.init {
            v.visit_expr(init);
        }
    }
}

fn walk_for_left<V: Visit + ?Sized>(v: &mut V, left: &ForInOfLeft) {
    match left {
        ForInOfLeft::VarDecl(d) => walk_var_decl(v, d),
        ForInOfLeft::Pat(p) => v.visit_pat(p),
    }
}

pub fn walk_stmt<V: Visit + ?Sized>(v: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Block(b) => {
            for s in &b.body {
                v.visit_stmt(s);
            }
        }
        Stmt::VarDecl(d) => walk_var_decl(v, d),
        Stmt::FnDecl(f) => v.visit_function(f),
        Stmt::ClassDecl(c) => v.visit_class(c),
        Stmt::Expr(e) => v.visit_expr(&e.expr),
        Stmt::If(s) => {
            v.visit_expr(&s.test);
            v.visit_stmt(&s.consequent);
            if let Some(alt) = &s.alternate {
                v.visit_stmt(alt);
            }
        }
        Stmt::For(s) => {
            match &s.init {
                Some(ForInit::VarDecl(d)) => walk_var_decl(v, d),
                Some(ForInit::Expr(e)) => v.visit_expr(e),
                None => {}
            }
            if let Some(test) = &s.test {
                v.visit_expr(test);
            }
            if let Some(update) = &s.update {
                v.visit_expr(update);
            }
            v.visit_stmt(&s.body);
        }
        Stmt::ForIn(s) => {
            walk_for_left(v, &s.left);
            v.visit_expr(&s.right);
            v.visit_stmt(&s.body);
        }
        Stmt::ForOf(s) => {
            walk_for_left(v, &s.left);
            v.visit_expr(&s.right);
            v.visit_stmt(&s.body);
        }
        Stmt::While(s) => {
            v.visit_expr(&s.test);
            v.visit_stmt(&s.body);
        }
        Stmt::DoWhile(s) => {
            v.visit_stmt(&s.body);
            v.visit_expr(&s.test);
        }
        Stmt::Switch(s) => {
            v.visit_expr(&s.discriminant);
            for case in &s.cases {
                if let Some(test) = &case.test {
                    v.visit_expr(test);
                }
                for c in &case.consequent {
                    v.visit_stmt(c);
                }
            }
        }
        Stmt::Try(s) => {
            for b in &s.block.body {
                v.visit_stmt(b);
            }
            if let Some(h) = &s.handler {
                if let Some(p) = &h.param {
                    v.visit_pat(p);
                }
                for b in &h.body.body {
                    v.visit_stmt(b);
                }
            }
            if let Some(f) = &s.finalizer {
                for b in &f.body {
                    v.visit_stmt(b);
                }
            }
        }
        Stmt::Return(s) => {
            if let Some(arg) = &s.argument {
                v.visit_expr(arg);
            }
        }
        Stmt::Throw(s) => v.visit_expr(&s.argument),
        Stmt::Labeled(s) => v.visit_stmt(&s.body),
        Stmt::With(s) => {
            v.visit_expr(&s.object);
            v.visit_stmt(&s.body);
        }
        Stmt::Module(m) => walk_module_decl(v, m),
        Stmt::Break(_)
        | Stmt::Continue(_)
        | Stmt::Debugger(_)
        | Stmt::Empty(_)
        | Stmt::Directive(_) => {}
    }
}

fn walk_module_decl<V: Visit + ?Sized>(v: &mut V, decl: &ModuleDecl) {
    match decl {
        ModuleDecl::Import(i) => {
            for spec in &i.specifiers {
                match spec {
                    ImportSpecifier::Named { local, .. }
                    | ImportSpecifier::Default(local)
                    | ImportSpecifier::Namespace(local) => v.visit_ident(local),
                }
            }
        }
        ModuleDecl::ExportNamed(e) => {
            if let Some(d) = &e.declaration {
                v.visit_stmt(d);
            }
            if e.source.is_none() {
                for spec in &e.specifiers {
                    if let ModuleExportName::Ident(id) = &spec.local {
                        v.visit_ident(id);
                    }
                }
            }
        }
        ModuleDecl::ExportDefault(e) => match &e.declaration {
            ExportDefaultExpr::Fn(f) => v.visit_function(f),
            ExportDefaultExpr::Class(c) => v.visit_class(c),
            ExportDefaultExpr::Expr(x) => v.visit_expr(x),
        },
        ModuleDecl::ExportAll(_) => {}
    }
}

pub fn walk_function<V: Visit + ?Sized>(v: &mut V, function: &Function) {
    if let Some(id) = &function.id {
        v.visit_ident(id);
    }
    for p in &function.params {
        v.visit_pat(p);
    }
    for s in &function.body.body {
        v.visit_stmt(s);
    }
}

pub fn walk_arrow<V: Visit + ?Sized>(v: &mut V, arrow: &ArrowExpr) {
    for p in &arrow.params {
        v.visit_pat(p);
    }
    match &arrow.body {
        ArrowBody::Block(b) => {
            for s in &b.body {
                v.visit_stmt(s);
            }
        }
        ArrowBody::Expr(e) => v.visit_expr(e),
    }
}

pub fn walk_class<V: Visit + ?Sized>(v: &mut V, class: &Class) {
    if let Some(id) = &class.id {
        v.visit_ident(id);
    }
    if let Some(sup) = &class.super_class {
        v.visit_expr(sup);
    }
    for member in &class.body {
        match member {
            ClassMember::Method(m) => {
                v.visit_prop_key(&m.key);
                v.visit_function(&m.value);
            }
            ClassMember::Property(p) => {
                v.visit_prop_key(&p.key);
                if let Some(value) = &p.value {
                    v.visit_expr(value);
                }
            }
            ClassMember::StaticBlock(b) => {
                for s in &b.body {
                    v.visit_stmt(s);
                }
            }
        }
    }
}

pub fn walk_prop_key<V: Visit + ?Sized>(v: &mut V, key: &PropKey) {
    if let PropKey::Computed(e) = key {
        v.visit_expr(e);
    }
}

pub fn walk_pat<V: Visit + ?Sized>(v: &mut V, pat: &Pat) {
    match pat {
        Pat::Ident(i) => v.visit_ident(i),
        Pat::Array(a) => {
            for el in a.elements.iter().flatten() {
                v.visit_pat(el);
            }
        }
        Pat::Object(o) => {
            for prop in &o.properties {
                match prop {
                    ObjectPatProp::KeyValue(kv) => {
                        v.visit_prop_key(&kv.key);
                        v.visit_pat(&kv.value);
                    }
                    ObjectPatProp::Rest(r) => v.visit_pat(&r.argument),
                }
            }
        }
        Pat::Rest(r) => v.visit_pat(&r.argument),
        Pat::Assign(a) => {
            v.visit_pat(&a.left);
            v.visit_expr(&a.right);
        }
        Pat::Expr(e) => v.visit_expr(e),
    }
}

pub fn walk_expr<V: Visit + ?Sized>(v: &mut V, expr: &Expr) {
    match expr {
        Expr::Null(_)
        | Expr::Bool(_)
        | Expr::Num(_)
        | Expr::Str(_)
        | Expr::BigInt(_)
        | Expr::Regexp(_)
        | Expr::This(_)
        | Expr::Super(_)
        | Expr::MetaProp(_) => {}
        Expr::Ident(i) => v.visit_ident(i),
        Expr::Template(t) => {
            for e in &t.expressions {
                v.visit_expr(e);
            }
        }
        Expr::Array(a) => {
            for el in a.elements.iter().flatten() {
                v.visit_expr(el);
            }
        }
        Expr::Object(o) => {
            for prop in &o.properties {
                match prop {
                    ObjectProp::Prop(p) => {
                        v.visit_prop_key(&p.key);
                        match &p.value {
                            PropValue::Value(e) => v.visit_expr(e),
                            PropValue::Get(f) | PropValue::Set(f) | PropValue::Method(f) => {
                                v.visit_function(f)
                            }
                        }
                    }
                    ObjectProp::Spread(s) => v.visit_expr(&s.argument),
                }
            }
        }
        Expr::Fn(f) => v.visit_function(f),
        Expr::Arrow(a) => v.visit_arrow(a),
        Expr::Class(c) => v.visit_class(c),
        Expr::Unary(u) => v.visit_expr(&u.argument),
        Expr::Update(u) => v.visit_expr(&u.argument),
        Expr::Binary(b) => {
            v.visit_expr(&b.left);
            v.visit_expr(&b.right);
        }
        Expr::Logical(l) => {
            v.visit_expr(&l.left);
            v.visit_expr(&l.right);
        }
        Expr::Conditional(c) => {
            v.visit_expr(&c.test);
            v.visit_expr(&c.consequent);
            v.visit_expr(&c.alternate);
        }
        Expr::Assign(a) => {
            match &a.left {
                AssignTarget::Expr(e) => v.visit_expr(e),
                AssignTarget::Pat(p) => v.visit_pat(p),
            }
            v.visit_expr(&a.right);
        }
        Expr::Sequence(s) => {
            for e in &s.expressions {
                v.visit_expr(e);
            }
        }
        Expr::Member(m) => {
            v.visit_expr(&m.object);
            if let MemberProp::Computed(p) = &m.property {
                v.visit_expr(p);
            }
        }
        Expr::Call(c) => {
            v.visit_expr(&c.callee);
            for a in &c.arguments {
                v.visit_expr(a);
            }
        }
        Expr::New(n) => {
            v.visit_expr(&n.callee);
            for a in &n.arguments {
                v.visit_expr(a);
            }
        }
        Expr::Chain(c) => v.visit_expr(&c.expr),
        Expr::TaggedTemplate(t) => {
            v.visit_expr(&t.tag);
            for e in &t.quasi.expressions {
                v.visit_expr(e);
            }
        }
        Expr::Spread(s) => v.visit_expr(&s.argument),
        Expr::Yield(y) => {
            if let Some(arg) = &y.argument {
                v.visit_expr(arg);
            }
        }
        Expr::Await(a) => v.visit_expr(&a.argument),
        Expr::Import(i) => {
            v.visit_expr(&i.source);
            if let Some(o) = &i.options {
                v.visit_expr(o);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node counting
// ─────────────────────────────────────────────────────────────────────────────

struct NodeCounter {
    count: usize,
}

impl Visit for NodeCounter {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        self.count += 1;
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        self.count += 1;
        walk_expr(self, expr);
    }

    fn visit_pat(&mut self, pat: &Pat) {
        self.count += 1;
        walk_pat(self, pat);
    }

    fn visit_function(&mut self, function: &Function) {
        self.count += 1;
        walk_function(self, function);
    }

    fn visit_class(&mut self, class: &Class) {
        self.count += 1;
        walk_class(self, class);
    }
}

/// Number of statement, expression, pattern, function and class nodes in
/// `program`.  The compressor stops once a pass no longer lowers it.
pub fn count_nodes(program: &Program) -> usize {
    let mut counter = NodeCounter { count: 0 };
    counter.visit_program(program);
    counter.count
}

// ─────────────────────────────────────────────────────────────────────────────
// Rewriter
// ─────────────────────────────────────────────────────────────────────────────

/// Mutating traversal with pre- and post-order replacement hooks.
pub trait Rewriter {
    fn before_stmt(&mut self, _stmt: &mut Stmt) -> RewriteAction<Stmt> {
        RewriteAction::Keep
    }

    fn after_stmt(&mut self, _stmt: &mut Stmt) -> RewriteAction<Stmt> {
        RewriteAction::Keep
    }

    fn before_expr(&mut self, _expr: &mut Expr) -> RewriteAction<Expr> {
        RewriteAction::Keep
    }

    fn after_expr(&mut self, _expr: &mut Expr) -> RewriteAction<Expr> {
        RewriteAction::Keep
    }

    /// Runs once every statement of a list has been rewritten.
    fn after_stmts(&mut self, _stmts: &mut Vec<Stmt>, _kind: BodyKind) {}

    /// Called before descending into a function; returning `false` leaves
    /// the whole function untouched.
    fn enter_function(&mut self, _function: &mut Function) -> bool {
        true
    }

    fn leave_function(&mut self, _function: &mut Function) {}

    fn enter_arrow(&mut self, _arrow: &mut ArrowExpr) -> bool {
        true
    }

    fn leave_arrow(&mut self, _arrow: &mut ArrowExpr) {}
}

/// The result of rewriting one node.
enum Outcome<T> {
    One,
    Gone,
    Many(Vec<T>),
}

/// Rewrite every statement of `program`.
pub fn rewrite_program<R: Rewriter + ?Sized>(r: &mut R, program: &mut Program) {
    rewrite_stmts(r, &mut program.body, BodyKind::Program);
}

/// Rewrite a statement list in place, splicing removals and expansions.
pub fn rewrite_stmts<R: Rewriter + ?Sized>(r: &mut R, stmts: &mut Vec<Stmt>, kind: BodyKind) {
    let old = std::mem::take(stmts);
    for mut stmt in old {
        match process_stmt(r, &mut stmt) {
            Outcome::One => stmts.push(stmt),
            Outcome::Gone => {}
            Outcome::Many(many) => stmts.extend(many),
        }
    }
    r.after_stmts(stmts, kind);
}

/// Rewrite a single-statement slot.
pub fn rewrite_stmt<R: Rewriter + ?Sized>(r: &mut R, slot: &mut Stmt) {
    let loc = slot.loc();
    match process_stmt(r, slot) {
        Outcome::One => {}
        Outcome::Gone => *slot = Stmt::empty(loc),
        Outcome::Many(body) => *slot = Stmt::Block(BlockStmt { loc, body }),
    }
}

/// Rewrite a single-expression slot.
pub fn rewrite_expr<R: Rewriter + ?Sized>(r: &mut R, slot: &mut Expr) {
    let loc = slot.loc();
    match process_expr(r, slot) {
        Outcome::One => {}
        Outcome::Gone => *slot = Expr::undefined(loc),
        Outcome::Many(exprs) if exprs.is_empty() => *slot = Expr::undefined(loc),
        Outcome::Many(exprs) => *slot = Expr::sequence(exprs),
    }
}

fn process_stmt<R: Rewriter + ?Sized>(r: &mut R, stmt: &mut Stmt) -> Outcome<Stmt> {
    match r.before_stmt(stmt) {
        RewriteAction::Keep => {}
        RewriteAction::Replace(new) => *stmt = new,
        RewriteAction::Remove => return Outcome::Gone,
        RewriteAction::StopDescent => return Outcome::One,
        RewriteAction::SpliceMany(many) => {
            let mut out = Vec::with_capacity(many.len());
            for mut s in many {
                match finish_stmt(r, &mut s) {
                    Outcome::One => out.push(s),
                    Outcome::Gone => {}
                    Outcome::Many(more) => out.extend(more),
                }
            }
            return Outcome::Many(out);
        }
    }
    finish_stmt(r, stmt)
}

/// Children then the `after_stmt` hook.
fn finish_stmt<R: Rewriter + ?Sized>(r: &mut R, stmt: &mut Stmt) -> Outcome<Stmt> {
    rewrite_stmt_children(r, stmt);
    match r.after_stmt(stmt) {
        RewriteAction::Keep | RewriteAction::StopDescent => Outcome::One,
        RewriteAction::Replace(new) => {
            *stmt = new;
            Outcome::One
        }
        RewriteAction::Remove => Outcome::Gone,
        RewriteAction::SpliceMany(many) => Outcome::Many(many),
    }
}

fn process_expr<R: Rewriter + ?Sized>(r: &mut R, expr: &mut Expr) -> Outcome<Expr> {
    match r.before_expr(expr) {
        RewriteAction::Keep => {}
        RewriteAction::Replace(new) => *expr = new,
        RewriteAction::Remove => return Outcome::Gone,
        RewriteAction::StopDescent => return Outcome::One,
        RewriteAction::SpliceMany(many) => {
            let mut out = Vec::with_capacity(many.len());
            for mut e in many {
                match finish_expr(r, &mut e) {
                    Outcome::One => out.push(e),
                    Outcome::Gone => {}
                    Outcome::Many(more) => out.extend(more),
                }
            }
            return Outcome::Many(out);
        }
    }
    finish_expr(r, expr)
}

fn finish_expr<R: Rewriter + ?Sized>(r: &mut R, expr: &mut Expr) -> Outcome<Expr> {
    rewrite_expr_children(r, expr);
    match r.after_expr(expr) {
        RewriteAction::Keep | RewriteAction::StopDescent => Outcome::One,
        RewriteAction::Replace(new) => {
            *expr = new;
            Outcome::One
        }
        RewriteAction::Remove => Outcome::Gone,
        RewriteAction::SpliceMany(many) => Outcome::Many(many),
    }
}

fn rewrite_var_decl<R: Rewriter + ?Sized>(r: &mut R, decl: &mut VarDecl) {
    for d in &mut decl.declarators {
        rewrite_pat(r, &mut d.id);
        if let Some(init) = &mut d.init {
            rewrite_expr(r, init);
        }
    }
}

fn rewrite_for_left<R: Rewriter + ?Sized>(r: &mut R, left: &mut ForInOfLeft) {
    match left {
        ForInOfLeft::VarDecl(d) => rewrite_var_decl(r, d),
        ForInOfLeft::Pat(p) => rewrite_pat(r, p),
    }
}

fn rewrite_stmt_children<R: Rewriter + ?Sized>(r: &mut R, stmt: &mut Stmt) {
    match stmt {
        Stmt::Block(b) => rewrite_stmts(r, &mut b.body, BodyKind::Block),
        Stmt::VarDecl(d) => rewrite_var_decl(r, d),
        Stmt::FnDecl(f) => rewrite_function(r, f),
        Stmt::ClassDecl(c) => rewrite_class(r, c),
        Stmt::Expr(e) => rewrite_expr(r, &mut e.expr),
        Stmt::If(s) => {
            rewrite_expr(r, &mut s.test);
            rewrite_stmt(r, &mut s.consequent);
            if let Some(alt) = &mut s.alternate {
                rewrite_stmt(r, alt);
            }
        }
        Stmt::For(s) => {
            match &mut s.init {
                Some(ForInit::VarDecl(d)) => rewrite_var_decl(r, d),
                Some(ForInit::Expr(e)) => rewrite_expr(r, e),
                None => {}
            }
            if let Some(test) = &mut s.test {
                rewrite_expr(r, test);
            }
            if let Some(update) = &mut s.update {
                rewrite_expr(r, update);
            }
            rewrite_stmt(r, &mut s.body);
        }
        Stmt::ForIn(s) => {
            rewrite_for_left(r, &mut s.left);
            rewrite_expr(r, &mut s.right);
            rewrite_stmt(r, &mut s.body);
        }
        Stmt::ForOf(s) => {
            rewrite_for_left(r, &mut s.left);
            rewrite_expr(r, &mut s.right);
            rewrite_stmt(r, &mut s.body);
        }
        Stmt::While(s) => {
            rewrite_expr(r, &mut s.test);
            rewrite_stmt(r, &mut s.body);
        }
        Stmt::DoWhile(s) => {
            rewrite_stmt(r, &mut s.body);
            rewrite_expr(r, &mut s.test);
        }
        Stmt::Switch(s) => {
            rewrite_expr(r, &mut s.discriminant);
            for case in &mut s.cases {
                if let Some(test) = &mut case.test {
                    rewrite_expr(r, test);
                }
                rewrite_stmts(r, &mut case.consequent, BodyKind::Case);
            }
        }
        Stmt::Try(s) => {
            rewrite_stmts(r, &mut s.block.body, BodyKind::Block);
            if let Some(h) = &mut s.handler {
                if let Some(p) = &mut h.param {
                    rewrite_pat(r, p);
                }
                rewrite_stmts(r, &mut h.body.body, BodyKind::Block);
            }
            if let Some(f) = &mut s.finalizer {
                rewrite_stmts(r, &mut f.body, BodyKind::Block);
            }
        }
        Stmt::Return(s) => {
            if let Some(arg) = &mut s.argument {
                rewrite_expr(r, arg);
            }
        }
        Stmt::Throw(s) => rewrite_expr(r, &mut s.argument),
        Stmt::Labeled(s) => rewrite_stmt(r, &mut s.body),
        Stmt::With(s) => {
            rewrite_expr(r, &mut s.object);
            rewrite_stmt(r, &mut s.body);
        }
        Stmt::Module(m) => match &mut **m {
            ModuleDecl::ExportNamed(e) => {
                if let Some(d) = &mut e.declaration {
                    rewrite_stmt(r, d);
                }
            }
            ModuleDecl::ExportDefault(e) => match &mut e.declaration {
                ExportDefaultExpr::Fn(f) => rewrite_function(r, f),
                ExportDefaultExpr::Class(c) => rewrite_class(r, c),
                ExportDefaultExpr::Expr(x) => rewrite_expr(r, x),
            },
            ModuleDecl::Import(_) | ModuleDecl::ExportAll(_) => {}
        },
        Stmt::Break(_)
        | Stmt::Continue(_)
        | Stmt::Debugger(_)
        | Stmt::Empty(_)
        | Stmt::Directive(_) => {}
    }
}

/// Rewrite a function's parameter defaults and body.
pub fn rewrite_function<R: Rewriter + ?Sized>(r: &mut R, function: &mut Function) {
    if !r.enter_function(function) {
        return;
    }
    for p in &mut function.params {
        rewrite_pat(r, p);
    }
    rewrite_stmts(r, &mut function.body.body, BodyKind::Function);
    r.leave_function(function);
}

fn rewrite_arrow<R: Rewriter + ?Sized>(r: &mut R, arrow: &mut ArrowExpr) {
    if !r.enter_arrow(arrow) {
        return;
    }
    for p in &mut arrow.params {
        rewrite_pat(r, p);
    }
    match &mut arrow.body {
        ArrowBody::Block(b) => rewrite_stmts(r, &mut b.body, BodyKind::Function),
        ArrowBody::Expr(e) => rewrite_expr(r, e),
    }
    r.leave_arrow(arrow);
}

fn rewrite_class<R: Rewriter + ?Sized>(r: &mut R, class: &mut Class) {
    if let Some(sup) = &mut class.super_class {
        rewrite_expr(r, sup);
    }
    for member in &mut class.body {
        match member {
            ClassMember::Method(m) => {
                rewrite_prop_key(r, &mut m.key);
                rewrite_function(r, &mut m.value);
            }
            ClassMember::Property(p) => {
                rewrite_prop_key(r, &mut p.key);
                if let Some(value) = &mut p.value {
                    rewrite_expr(r, value);
                }
            }
            ClassMember::StaticBlock(b) => rewrite_stmts(r, &mut b.body, BodyKind::StaticBlock),
        }
    }
}

fn rewrite_prop_key<R: Rewriter + ?Sized>(r: &mut R, key: &mut PropKey) {
    if let PropKey::Computed(e) = key {
        rewrite_expr(r, e);
    }
}

/// Patterns are not replaced themselves; their default values, computed
/// keys and member targets are.
fn rewrite_pat<R: Rewriter + ?Sized>(r: &mut R, pat: &mut Pat) {
    match pat {
        Pat::Ident(_) => {}
        Pat::Array(a) => {
            for el in a.elements.iter_mut().flatten() {
                rewrite_pat(r, el);
            }
        }
        Pat::Object(o) => {
            for prop in &mut o.properties {
                match prop {
                    ObjectPatProp::KeyValue(kv) => {
                        rewrite_prop_key(r, &mut kv.key);
                        rewrite_pat(r, &mut kv.value);
                    }
                    ObjectPatProp::Rest(rest) => rewrite_pat(r, &mut rest.argument),
                }
            }
        }
        Pat::Rest(rest) => rewrite_pat(r, &mut rest.argument),
        Pat::Assign(a) => {
            rewrite_pat(r, &mut a.left);
            rewrite_expr(r, &mut a.right);
        }
        Pat::Expr(e) => {
            if let Expr::Member(m) = &mut **e {
                rewrite_expr(r, &mut m.object);
                if let MemberProp::Computed(p) = &mut m.property {
                    rewrite_expr(r, p);
                }
            }
        }
    }
}

fn rewrite_expr_children<R: Rewriter + ?Sized>(r: &mut R, expr: &mut Expr) {
    match expr {
        Expr::Null(_)
        | Expr::Bool(_)
        | Expr::Num(_)
        | Expr::Str(_)
        | Expr::BigInt(_)
        | Expr::Regexp(_)
        | Expr::Ident(_)
        | Expr::This(_)
        | Expr::Super(_)
        | Expr::MetaProp(_) => {}
        Expr::Template(t) => {
            for e in &mut t.expressions {
                rewrite_expr(r, e);
            }
        }
        Expr::Array(a) => {
            for el in a.elements.iter_mut().flatten() {
                rewrite_expr(r, el);
            }
        }
        Expr::Object(o) => {
            for prop in &mut o.properties {
                match prop {
                    ObjectProp::Prop(p) => {
                        rewrite_prop_key(r, &mut p.key);
                        match &mut p.value {
                            PropValue::Value(e) => rewrite_expr(r, e),
                            PropValue::Get(f) | PropValue::Set(f) | PropValue::Method(f) => {
                                rewrite_function(r, f)
                            }
                        }
                    }
                    ObjectProp::Spread(s) => rewrite_expr(r, &mut s.argument),
                }
            }
        }
        Expr::Fn(f) => rewrite_function(r, f),
        Expr::Arrow(a) => rewrite_arrow(r, a),
        Expr::Class(c) => rewrite_class(r, c),
        Expr::Unary(u) => rewrite_expr(r, &mut u.argument),
        // The operand of `++`/`--` is a target, not a value.
        Expr::Update(u) => {
            if let Expr::Member(m) = &mut *u.argument {
                rewrite_expr(r, &mut m.object);
                if let MemberProp::Computed(p) = &mut m.property {
                    rewrite_expr(r, p);
                }
            }
        }
        Expr::Binary(b) => {
            rewrite_expr(r, &mut b.left);
            rewrite_expr(r, &mut b.right);
        }
        Expr::Logical(l) => {
            rewrite_expr(r, &mut l.left);
            rewrite_expr(r, &mut l.right);
        }
        Expr::Conditional(c) => {
            rewrite_expr(r, &mut c.test);
            rewrite_expr(r, &mut c.consequent);
            rewrite_expr(r, &mut c.alternate);
        }
        Expr::Assign(a) => {
            match &mut a.left {
                AssignTarget::Expr(e) => {
                    if let Expr::Member(m) = &mut **e {
                        rewrite_expr(r, &mut m.object);
                        if let MemberProp::Computed(p) = &mut m.property {
                            rewrite_expr(r, p);
                        }
                    }
                }
                AssignTarget::Pat(p) => rewrite_pat(r, p),
            }
            rewrite_expr(r, &mut a.right);
        }
        Expr::Sequence(s) => {
            for e in &mut s.expressions {
                rewrite_expr(r, e);
            }
        }
        Expr::Member(m) => {
            rewrite_expr(r, &mut m.object);
            if let MemberProp::Computed(p) = &mut m.property {
                rewrite_expr(r, p);
            }
        }
        Expr::Call(c) => {
            rewrite_expr(r, &mut c.callee);
            for a in &mut c.arguments {
                rewrite_expr(r, a);
            }
        }
        Expr::New(n) => {
            rewrite_expr(r, &mut n.callee);
            for a in &mut n.arguments {
                rewrite_expr(r, a);
            }
        }
        Expr::Chain(c) => rewrite_expr(r, &mut c.expr),
        Expr::TaggedTemplate(t) => {
            rewrite_expr(r, &mut t.tag);
            for e in &mut t.quasi.expressions {
                rewrite_expr(r, e);
            }
        }
        Expr::Spread(s) => rewrite_expr(r, &mut s.argument),
        Expr::Yield(y) => {
            if let Some(arg) = &mut y.argument {
                rewrite_expr(r, arg);
            }
        }
        Expr::Await(a) => rewrite_expr(r, &mut a.argument),
        Expr::Import(i) => {
            rewrite_expr(r, &mut i.source);
            if let Some(o) = &mut i.options {
                rewrite_expr(r, o);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser::{parse, ParseOptions};

    fn program(src: &str) -> Program {
        parse(src, &ParseOptions::default()).unwrap()
    }

    struct IdentCollector(Vec<String>);

    impl Visit for IdentCollector {
        fn visit_ident(&mut self, ident: &Ident) {
            self.0.push(ident.name.clone());
        }
    }

    #[test]
    fn test_visit_reaches_nested_identifiers() {
        let p = program("function f(a, {b = c}) { return a + b; } x.y = [z, ...w];");
        let mut c = IdentCollector(Vec::new());
        c.visit_program(&p);
        assert_eq!(c.0, ["f", "a", "b", "c", "a", "b", "x", "z", "w"]);
    }

    #[test]
    fn test_visit_skips_property_names_and_labels() {
        let p = program("l: for (;;) { o.p; ({ q: 1 }); break l; }");
        let mut c = IdentCollector(Vec::new());
        c.visit_program(&p);
        assert_eq!(c.0, ["o"]);
    }

    #[test]
    fn test_count_nodes() {
        // ExprStmt, Binary, Num, Num
        assert_eq!(count_nodes(&program("1 + 2;")), 4);
        assert!(count_nodes(&program("a; b;")) < count_nodes(&program("a; b; c;")));
    }

    struct DropDebugger;

    impl Rewriter for DropDebugger {
        fn before_stmt(&mut self, stmt: &mut Stmt) -> RewriteAction<Stmt> {
            match stmt {
                Stmt::Debugger(_) => RewriteAction::Remove,
                _ => RewriteAction::Keep,
            }
        }
    }

    #[test]
    fn test_remove_in_list_and_slot() {
        let mut p = program("a(); debugger; if (x) debugger;");
        rewrite_program(&mut DropDebugger, &mut p);
        assert_eq!(p.body.len(), 2);
        let Stmt::If(i) = &p.body[1] else { panic!() };
        assert!(i.consequent.is_empty());
    }

    struct FoldOnePlusOne;

    impl Rewriter for FoldOnePlusOne {
        fn after_expr(&mut self, expr: &mut Expr) -> RewriteAction<Expr> {
            if let Expr::Binary(b) = expr
                && let (Expr::Num(l), Expr::Num(r)) = (&*b.left, &*b.right)
            {
                return RewriteAction::Replace(Expr::num(l.value + r.value, b.loc));
            }
            RewriteAction::Keep
        }
    }

    #[test]
    fn test_after_hook_runs_bottom_up() {
        let mut p = program("x = 1 + 2 + 3;");
        rewrite_program(&mut FoldOnePlusOne, &mut p);
        let Stmt::Expr(e) = &p.body[0] else { panic!() };
        let Expr::Assign(a) = &*e.expr else { panic!() };
        assert!(matches!(&*a.right, Expr::Num(n) if n.value == 6.0));
    }

    struct SplitSequences;

    impl Rewriter for SplitSequences {
        fn before_stmt(&mut self, stmt: &mut Stmt) -> RewriteAction<Stmt> {
            if let Stmt::Expr(e) = stmt
                && let Expr::Sequence(s) = &*e.expr
            {
                return RewriteAction::SpliceMany(
                    s.expressions.iter().cloned().map(Stmt::expr).collect(),
                );
            }
            RewriteAction::Keep
        }
    }

    #[test]
    fn test_splice_many_in_list_and_slot() {
        let mut p = program("a, b, c; if (x) d, e;");
        rewrite_program(&mut SplitSequences, &mut p);
        assert_eq!(p.body.len(), 4);
        let Stmt::If(i) = &p.body[3] else { panic!() };
        assert!(matches!(&*i.consequent, Stmt::Block(b) if b.body.len() == 2));
    }

    struct SkipFunctions(usize);

    impl Rewriter for SkipFunctions {
        fn enter_function(&mut self, _function: &mut Function) -> bool {
            false
        }

        fn before_stmt(&mut self, _stmt: &mut Stmt) -> RewriteAction<Stmt> {
            self.0 += 1;
            RewriteAction::Keep
        }
    }

    #[test]
    fn test_enter_function_false_skips_body() {
        let mut p = program("function f() { a; b; } c;");
        let mut r = SkipFunctions(0);
        rewrite_program(&mut r, &mut p);
        assert_eq!(r.0, 2);
    }

    struct StopAtBlocks(usize);

    impl Rewriter for StopAtBlocks {
        fn before_stmt(&mut self, stmt: &mut Stmt) -> RewriteAction<Stmt> {
            self.0 += 1;
            match stmt {
                Stmt::Block(_) => RewriteAction::StopDescent,
                _ => RewriteAction::Keep,
            }
        }
    }

    #[test]
    fn test_stop_descent_skips_children() {
        let mut p = program("{ a; b; } c;");
        let mut r = StopAtBlocks(0);
        rewrite_program(&mut r, &mut p);
        assert_eq!(r.0, 2);
        assert_eq!(p.body.len(), 2);
    }
}
