//! Function inlining and variable collapsing.
//!
//! Two substitutions that move code to its single use site:
//!
//! - [`inline_call`] replaces `f()` by the body of `f` when `f` is a
//!   parameterless function called exactly once whose body is a run of
//!   expression statements optionally ending in `return`.
//! - [`collapse_vars`] moves the initializer of `var x = E` into the next
//!   statement when that statement reads `x` exactly once and nothing
//!   evaluated before the read could observe the reordering.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::compress::effects::{Purity, callee_name};
use crate::parser::ast::*;
use crate::parser::scanner::Span;
use crate::parser::scope::{ScopeKind, ScopeTree, SymbolId};
use crate::walk::{self, Visit};

// ─────────────────────────────────────────────────────────────────────────────
// Call inlining
// ─────────────────────────────────────────────────────────────────────────────

/// The expression `call` can be replaced by, together with the symbol of
/// the inlined function.
///
/// `declared` counts declarations per name across the program and
/// `inlining` lists the functions currently being expanded.
pub(super) fn inline_call(
    call: &CallExpr,
    tree: &ScopeTree,
    declared: &FxHashMap<&str, usize>,
    inlining: &[SymbolId],
) -> Option<(SymbolId, Expr)> {
    if call.optional || !call.arguments.is_empty() {
        return None;
    }
    let Expr::Ident(callee) = &*call.callee else { return None };
    let id = callee.symbol?;
    if inlining.contains(&id) {
        return None;
    }
    let def = tree.symbol(id);
    if def.references.len() != 1 {
        return None;
    }
    let Some(Expr::Fn(f)) = &def.fixed else { return None };
    if f.id.is_some()
        || f.is_async
        || f.is_generator
        || !f.params.is_empty()
        || f.body.body.iter().any(|s| matches!(s, Stmt::Directive(_)))
        || contains(f.loc, call.loc)
    {
        return None;
    }
    let scope = tree
        .scopes
        .iter()
        .find(|s| s.kind == ScopeKind::Function && s.loc == f.loc)?;
    if scope.uses_this || scope.uses_arguments || scope.pinned {
        return None;
    }
    let mut free = FreeNames {
        tree,
        within: f.loc,
        ok: true,
        declared,
    };
    free.visit_function(f);
    if !free.ok {
        return None;
    }
    let value = body_value(&f.body.body, call.loc)?;
    trace!(name = %callee.name, "inline call");
    Some((id, value))
}

/// `inner` lies within `outer`.
fn contains(outer: Span, inner: Span) -> bool {
    outer.file == inner.file
        && outer.start.offset <= inner.start.offset
        && inner.end.offset <= outer.end.offset
}

/// The body of a parameterless function as a single expression.
fn body_value(body: &[Stmt], loc: Span) -> Option<Expr> {
    let mut parts = Vec::new();
    let mut result = None;
    for (i, stmt) in body.iter().enumerate() {
        match stmt {
            Stmt::Empty(_) => {}
            Stmt::Expr(e) => parts.push((*e.expr).clone()),
            Stmt::Return(r) if i + 1 == body.len() => {
                result = r.argument.as_deref().cloned();
            }
            _ => return None,
        }
    }
    parts.push(result.unwrap_or_else(|| Expr::undefined(loc)));
    Some(Expr::sequence(parts))
}

/// Checks that every name the function reads from outside resolves to the
/// same binding wherever the body is moved: the name is declared at most
/// once in the whole program, or never when it is a global.
struct FreeNames<'a> {
    tree: &'a ScopeTree,
    within: Span,
    ok: bool,
    declared: &'a FxHashMap<&'a str, usize>,
}

impl Visit for FreeNames<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::MetaProp(_) = expr {
            self.ok = false;
        }
        walk::walk_expr(self, expr);
    }

    fn visit_ident(&mut self, ident: &Ident) {
        let Some(def) = self.tree.symbol_of(ident) else {
            self.ok = false;
            return;
        };
        if !def.undeclared && contains(self.within, self.tree.scope(def.scope).loc) {
            return;
        }
        let count = self.declared.get(ident.name.as_str()).copied().unwrap_or(0);
        let expected = if def.undeclared { 0 } else { 1 };
        if count != expected {
            self.ok = false;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// collapse_vars
// ─────────────────────────────────────────────────────────────────────────────

/// Fold `var x = E; use(x)` into `use(E)` throughout `stmts`.
pub(super) fn collapse_vars(stmts: &mut Vec<Stmt>, tree: &ScopeTree, purity: Purity<'_>, toplevel: bool) {
    let mut i = 0;
    while i + 1 < stmts.len() {
        if collapse_at(stmts, i, tree, purity, toplevel) {
            if matches!(&stmts[i], Stmt::VarDecl(d) if d.declarators.is_empty()) {
                stmts.remove(i);
                i = i.saturating_sub(1);
            }
            continue;
        }
        i += 1;
    }
}

/// Try to move the last initializer of the declaration at `i` into the
/// statement after it.
fn collapse_at(stmts: &mut [Stmt], i: usize, tree: &ScopeTree, purity: Purity<'_>, toplevel: bool) -> bool {
    let (head, tail) = stmts.split_at_mut(i + 1);
    let Stmt::VarDecl(decl) = &mut head[i] else { return false };
    let Some(last) = decl.declarators.last() else { return false };
    let Pat::Ident(name) = &last.id else { return false };
    let Some(init) = last.init.as_deref() else { return false };
    let Some(id) = name.symbol else { return false };
    let def = tree.symbol(id);
    if def.references.len() != 1
        || def.assignments != 0
        || def.declarations.len() != 1
        || def.escaped
        || def.exported
        || def.undeclared
        || tree.is_pinned(id)
        || (!toplevel && tree.is_toplevel(id))
    {
        return false;
    }
    let search = Collapse {
        purity,
        target: id,
        value_pure: !purity.has_side_effects(init),
        value_is_member: matches!(init, Expr::Member(_)),
    };
    let Some(root) = head_expr(&mut tail[0]) else { return false };
    let Ok(Some(slot)) = search.slot(root) else { return false };
    let Some(declarator) = decl.declarators.pop() else { return false };
    let Some(value) = declarator.init else { return false };
    trace!(name = %def.name, "collapse variable");
    *slot = *value;
    true
}

/// The first expression a statement evaluates.
fn head_expr(stmt: &mut Stmt) -> Option<&mut Expr> {
    match stmt {
        Stmt::Expr(e) => Some(&mut *e.expr),
        Stmt::Return(r) => r.argument.as_deref_mut(),
        Stmt::Throw(t) => Some(&mut *t.argument),
        Stmt::If(s) => Some(&mut *s.test),
        Stmt::Switch(s) => Some(&mut *s.discriminant),
        Stmt::VarDecl(d) => d.declarators.first_mut().and_then(|d| d.init.as_deref_mut()),
        Stmt::For(f) => match &mut f.init {
            Some(ForInit::Expr(e)) => Some(&mut **e),
            Some(ForInit::VarDecl(d)) => d.declarators.first_mut().and_then(|d| d.init.as_deref_mut()),
            None => None,
        },
        _ => None,
    }
}

struct Collapse<'a> {
    purity: Purity<'a>,
    target: SymbolId,
    value_pure: bool,
    value_is_member: bool,
}

/// The reordering cannot be proven safe.
struct Abort;

impl Collapse<'_> {
    /// An operand that runs before the substituted value.
    fn safe_before(&self, expr: &Expr) -> bool {
        expr.is_constant_literal() || (self.value_pure && !self.purity.has_side_effects(expr))
    }

    fn mentions(&self, expr: &Expr) -> bool {
        let mut scan = Mentions {
            target: self.target,
            found: false,
        };
        scan.visit_expr(expr);
        scan.found
    }

    /// Locate the read of the target along the evaluation order of `expr`.
    ///
    /// `Ok(None)`: `expr` does not read the target and may run first.
    fn slot<'e>(&self, expr: &'e mut Expr) -> Result<Option<&'e mut Expr>, Abort> {
        if matches!(&*expr, Expr::Ident(i) if i.symbol == Some(self.target)) {
            return Ok(Some(expr));
        }
        if !self.mentions(expr) {
            return if self.safe_before(expr) { Ok(None) } else { Err(Abort) };
        }
        match expr {
            Expr::Unary(u) if !matches!(u.op, UnaryOp::Delete) => self.slot(&mut u.argument),
            Expr::Binary(b) => {
                if let Some(s) = self.slot(&mut b.left)? {
                    return Ok(Some(s));
                }
                self.slot(&mut b.right)
            }
            Expr::Logical(l) => self.slot(&mut l.left)?.map(Some).ok_or(Abort),
            Expr::Conditional(c) => self.slot(&mut c.test)?.map(Some).ok_or(Abort),
            Expr::Sequence(s) => self.first_of(s.expressions.iter_mut()),
            Expr::Member(m) if !m.optional => {
                if let Some(s) = self.slot(&mut m.object)? {
                    return Ok(Some(s));
                }
                match &mut m.property {
                    MemberProp::Computed(p) => self.slot(p),
                    _ => Err(Abort),
                }
            }
            Expr::Call(c) if !c.optional => {
                if let Some(s) = self.callee(&mut c.callee)? {
                    return Ok(Some(s));
                }
                self.args(&mut c.arguments)
            }
            Expr::New(n) => {
                if let Some(s) = self.callee(&mut n.callee)? {
                    return Ok(Some(s));
                }
                self.args(&mut n.arguments)
            }
            Expr::Assign(a) => match &mut a.left {
                AssignTarget::Expr(left) if matches!(**left, Expr::Ident(_)) && a.op == AssignOp::Assign => {
                    if self.mentions(&**left) {
                        return Err(Abort);
                    }
                    self.slot(&mut a.right)
                }
                _ => Err(Abort),
            },
            Expr::Array(a) if a.elements.iter().flatten().all(|e| !matches!(e, Expr::Spread(_))) => {
                self.first_of(a.elements.iter_mut().flatten())
            }
            Expr::Template(t) => self.first_of(t.expressions.iter_mut()),
            _ => Err(Abort),
        }
    }

    fn first_of<'e>(&self, exprs: impl Iterator<Item = &'e mut Expr>) -> Result<Option<&'e mut Expr>, Abort> {
        for e in exprs {
            if let Some(s) = self.slot(e)? {
                return Ok(Some(s));
            }
        }
        Ok(None)
    }

    fn args<'e>(&self, args: &'e mut [Expr]) -> Result<Option<&'e mut Expr>, Abort> {
        if args.iter().any(|a| matches!(a, Expr::Spread(_))) {
            return Err(Abort);
        }
        self.first_of(args.iter_mut())
    }

    /// Callees named by a dotted path are trusted to run first.
    fn callee<'e>(&self, callee: &'e mut Expr) -> Result<Option<&'e mut Expr>, Abort> {
        if matches!(&*callee, Expr::Ident(i) if i.symbol == Some(self.target)) {
            return if self.value_is_member { Err(Abort) } else { Ok(Some(callee)) };
        }
        if !self.mentions(callee) && callee_name(callee).is_some() {
            return Ok(None);
        }
        self.slot(callee)
    }
}

struct Mentions {
    target: SymbolId,
    found: bool,
}

impl Visit for Mentions {
    fn visit_ident(&mut self, ident: &Ident) {
        self.found |= ident.symbol == Some(self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::options::CompressOptions;
    use crate::compress::reduce_vars::mark_fixed;
    use crate::parser::parser::{parse, ParseOptions};
    use crate::parser::scope::{resolve, ResolveOptions};
    use crate::printer::{expr_to_string, print, OutputOptions};

    fn collapse(src: &str) -> String {
        let mut program = parse(src, &ParseOptions::default()).unwrap();
        let tree = resolve(&mut program, &ResolveOptions::default()).unwrap();
        let options = CompressOptions::default();
        let purity = Purity::new(&options, &tree);
        let Some(Stmt::FnDecl(f)) = program.body.first_mut() else { panic!("expected function") };
        collapse_vars(&mut f.body.body, &tree, purity, false);
        print(&program, &OutputOptions::default(), None)
    }

    fn declared(tree: &ScopeTree) -> FxHashMap<&str, usize> {
        let mut names = FxHashMap::default();
        for def in tree.symbols.iter().filter(|d| !d.undeclared) {
            *names.entry(def.name.as_str()).or_insert(0) += 1;
        }
        names
    }

    fn inline_last(src: &str) -> Option<String> {
        let mut program = parse(src, &ParseOptions::default()).unwrap();
        let mut tree = resolve(&mut program, &ResolveOptions::default()).unwrap();
        mark_fixed(&program, &mut tree, true);
        let names = declared(&tree);
        let Some(Stmt::Expr(e)) = program.body.last() else { panic!("expected call") };
        let Expr::Call(call) = &*e.expr else { panic!("expected call") };
        inline_call(call, &tree, &names, &[]).map(|(_, e)| expr_to_string(&e))
    }

    #[test]
    fn test_collapse_into_call_argument() {
        assert_eq!(collapse("function f(){ var a = g(); h(a); }"), "function f(){h(g())}");
    }

    #[test]
    fn test_collapse_chain_of_declarations() {
        assert_eq!(
            collapse("function f(){ var a = 1; var b = a + 2; return b; }"),
            "function f(){return 1+2}"
        );
    }

    #[test]
    fn test_collapse_blocked_by_earlier_effects() {
        assert_eq!(
            collapse("function f(){ var a = g(); h(k(), a); }"),
            "function f(){var a=g();h(k(),a)}"
        );
    }

    #[test]
    fn test_collapse_skips_conditional_branch() {
        assert_eq!(
            collapse("function f(){ var a = g(); return x && a; }"),
            "function f(){var a=g();return x&&a}"
        );
    }

    #[test]
    fn test_collapse_keeps_multiply_read() {
        assert_eq!(
            collapse("function f(){ var a = g(); return a + a; }"),
            "function f(){var a=g();return a+a}"
        );
    }

    #[test]
    fn test_member_not_collapsed_into_callee() {
        assert_eq!(
            collapse("function f(){ var m = o.m; m(); }"),
            "function f(){var m=o.m;m()}"
        );
    }

    #[test]
    fn test_inline_single_use_function() {
        assert_eq!(inline_last("function g(){ return 1 + x; } g();").as_deref(), Some("1+x"));
        assert_eq!(inline_last("function g(){ a(); b(); } g();").as_deref(), Some("a(),b(),void 0"));
    }

    #[test]
    fn test_inline_rejections() {
        assert!(inline_last("function g(){ return this; } g();").is_none());
        assert!(inline_last("function g(){ var t = 1; return t; } g();").is_none());
        assert!(inline_last("function g(){ return 1; } g(); g();").is_none());
        assert!(inline_last("function g(a){ return a; } g();").is_none());
    }

    #[test]
    fn test_inline_rejects_shadowed_free_name() {
        let src = "var x = 1; function g(){ return x; } function h(){ var x = 2; } g();";
        assert!(inline_last(src).is_none());
    }
}
