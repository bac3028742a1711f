//! Fixed-value analysis.
//!
//! A symbol is *fixed* when it is bound exactly once to a constant literal
//! or a function and every read is guaranteed to observe that binding.
//! [`mark_fixed`] records the value in [`SymbolDef::fixed`]; the compressor
//! then substitutes constants into references and inlines single-use
//! functions.
//!
//! Straight-line order is the whole data-flow model: the declaration must be
//! a direct child of the statement list that owns its scope, plain reads
//! must come after it in the text, and reads from nested functions are only
//! trusted when nothing before the declaration can call them.

use tracing::trace;

use crate::parser::ast::*;
use crate::parser::scope::{BindingKind, ScopeTree, SymbolDef};
use crate::walk::{self, BodyKind, Visit};

/// Recompute [`SymbolDef::fixed`] for every symbol of `tree`.
///
/// `toplevel` allows top-level bindings to be fixed.
pub fn mark_fixed(program: &Program, tree: &mut ScopeTree, toplevel: bool) {
    for def in &mut tree.symbols {
        def.fixed = None;
    }
    let mut scan = FixedScan { tree, toplevel };
    scan.scan_list(&program.body, BodyKind::Program);
}

struct FixedScan<'t> {
    tree: &'t mut ScopeTree,
    toplevel: bool,
}

impl FixedScan<'_> {
    fn scan_list(&mut self, stmts: &[Stmt], kind: BodyKind) {
        let mut inert_prefix = true;
        for stmt in stmts {
            match stmt {
                Stmt::VarDecl(d) => {
                    for decl in &d.declarators {
                        self.consider_declarator(d.kind, decl, kind, inert_prefix);
                        inert_prefix &= decl.init.as_deref().is_none_or(is_inert_value);
                    }
                }
                Stmt::FnDecl(f) => self.consider_function(f, kind),
                _ => {}
            }
            inert_prefix &= is_inert(stmt);
            self.visit_stmt(stmt);
        }
    }

    /// Symbol behind a binding identifier, if it may be fixed at all.
    fn candidate(&self, ident: &Ident, kind: BindingKind) -> Option<usize> {
        let id = ident.symbol?;
        let def: &SymbolDef = self.tree.symbol(id);
        let eligible = def.kind == kind
            && def.declarations.len() == 1
            && def.assignments == 0
            && !def.exported
            && !def.undeclared
            && !self.tree.is_pinned(id)
            && (self.toplevel || !self.tree.is_toplevel(id));
        eligible.then_some(id)
    }

    fn consider_declarator(
        &mut self,
        kind: VarKind,
        decl: &VarDeclarator,
        body: BodyKind,
        inert_prefix: bool,
    ) {
        let Pat::Ident(ident) = &decl.id else { return };
        let Some(init) = decl.init.as_deref() else { return };
        if !(init.is_constant_literal() || matches!(init, Expr::Fn(_) | Expr::Arrow(_))) {
            return;
        }
        let (binding, owns_scope) = match kind {
            VarKind::Var => (
                BindingKind::Var,
                matches!(body, BodyKind::Program | BodyKind::Function | BodyKind::StaticBlock),
            ),
            VarKind::Let => (BindingKind::Let, body != BodyKind::Case),
            VarKind::Const => (BindingKind::Const, body != BodyKind::Case),
        };
        if !owns_scope {
            return;
        }
        let Some(id) = self.candidate(ident, binding) else { return };
        let def = self.tree.symbol(id);
        let ordered = if def.escaped {
            inert_prefix
        } else {
            let end = decl.loc.end.offset;
            def.references
                .iter()
                .all(|r| r.file == decl.loc.file && r.start.offset >= end)
        };
        if ordered {
            trace!(name = %ident.name, "fixed value");
            self.tree.symbol_mut(id).fixed = Some(init.clone());
        }
    }

    fn consider_function(&mut self, f: &Function, body: BodyKind) {
        if !matches!(body, BodyKind::Program | BodyKind::Function | BodyKind::StaticBlock) {
            return;
        }
        let Some(ident) = &f.id else { return };
        let Some(id) = self.candidate(ident, BindingKind::Function) else { return };
        let mut value = f.clone();
        value.id = None;
        trace!(name = %ident.name, "fixed function");
        self.tree.symbol_mut(id).fixed = Some(Expr::Fn(Box::new(value)));
    }
}

impl Visit for FixedScan<'_> {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(b) => self.scan_list(&b.body, BodyKind::Block),
            Stmt::Switch(s) => {
                self.visit_expr(&s.discriminant);
                for case in &s.cases {
                    if let Some(test) = &case.test {
                        self.visit_expr(test);
                    }
                    self.scan_list(&case.consequent, BodyKind::Case);
                }
            }
            Stmt::Try(t) => {
                self.scan_list(&t.block.body, BodyKind::Block);
                if let Some(h) = &t.handler {
                    if let Some(p) = &h.param {
                        self.visit_pat(p);
                    }
                    self.scan_list(&h.body.body, BodyKind::Block);
                }
                if let Some(f) = &t.finalizer {
                    self.scan_list(&f.body, BodyKind::Block);
                }
            }
            _ => walk::walk_stmt(self, stmt),
        }
    }

    fn visit_function(&mut self, function: &Function) {
        for p in &function.params {
            self.visit_pat(p);
        }
        self.scan_list(&function.body.body, BodyKind::Function);
    }

    fn visit_arrow(&mut self, arrow: &ArrowExpr) {
        for p in &arrow.params {
            self.visit_pat(p);
        }
        match &arrow.body {
            ArrowBody::Block(b) => self.scan_list(&b.body, BodyKind::Function),
            ArrowBody::Expr(e) => self.visit_expr(e),
        }
    }

    fn visit_class(&mut self, class: &Class) {
        if let Some(sup) = &class.super_class {
            self.visit_expr(sup);
        }
        for member in &class.body {
            match member {
                ClassMember::Method(m) => {
                    self.visit_prop_key(&m.key);
                    self.visit_function(&m.value);
                }
                ClassMember::Property(p) => {
                    self.visit_prop_key(&p.key);
                    if let Some(v) = &p.value {
                        self.visit_expr(v);
                    }
                }
                ClassMember::StaticBlock(b) => self.scan_list(&b.body, BodyKind::StaticBlock),
            }
        }
    }
}

/// A value whose evaluation cannot call back into user code.
fn is_inert_value(expr: &Expr) -> bool {
    expr.is_constant_literal() || matches!(expr, Expr::Fn(_) | Expr::Arrow(_))
}

/// Statements that run no user code when executed.
fn is_inert(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::FnDecl(_) | Stmt::Directive(_) | Stmt::Empty(_) => true,
        Stmt::VarDecl(d) => d
            .declarators
            .iter()
            .all(|decl| matches!(decl.id, Pat::Ident(_)) && decl.init.as_deref().is_none_or(is_inert_value)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser::{parse, ParseOptions};
    use crate::parser::scope::{resolve, ResolveOptions};

    fn analyze(src: &str, toplevel: bool) -> (Program, ScopeTree) {
        let mut program = parse(src, &ParseOptions::default()).unwrap();
        let mut tree = resolve(&mut program, &ResolveOptions::default()).unwrap();
        mark_fixed(&program, &mut tree, toplevel);
        (program, tree)
    }

    fn fixed<'t>(tree: &'t ScopeTree, name: &str) -> Option<&'t Expr> {
        tree.symbols
            .iter()
            .find(|d| d.name == name && !d.undeclared)
            .and_then(|d| d.fixed.as_ref())
    }

    #[test]
    fn test_constant_var_is_fixed() {
        let (_, tree) = analyze("function f(){ var a = 1; return a + a; }", false);
        assert!(matches!(fixed(&tree, "a"), Some(Expr::Num(_))));
    }

    #[test]
    fn test_toplevel_requires_option() {
        let (_, tree) = analyze("var a = 1; a;", false);
        assert!(fixed(&tree, "a").is_none());
        let (_, tree) = analyze("var a = 1; a;", true);
        assert!(fixed(&tree, "a").is_some());
    }

    #[test]
    fn test_reassigned_or_redeclared_not_fixed() {
        let (_, tree) = analyze("function f(){ var a = 1; a = 2; return a; }", false);
        assert!(fixed(&tree, "a").is_none());
        let (_, tree) = analyze("function f(){ var a = 1; var a = 2; return a; }", false);
        assert!(fixed(&tree, "a").is_none());
    }

    #[test]
    fn test_read_before_declaration_not_fixed() {
        let (_, tree) = analyze("function f(){ g(a); var a = 1; return a; }", false);
        assert!(fixed(&tree, "a").is_none());
    }

    #[test]
    fn test_escaped_read_needs_inert_prefix() {
        let (_, tree) = analyze("function f(){ function g(){ return a; } var a = 1; return g(); }", false);
        assert!(fixed(&tree, "a").is_some());
        let (_, tree) = analyze("function f(){ g(); var a = 1; function g(){ return a; } }", false);
        assert!(fixed(&tree, "a").is_none());
    }

    #[test]
    fn test_nested_block_var_not_fixed() {
        let (_, tree) = analyze("function f(){ if (x) { var a = 1; } return a; }", false);
        assert!(fixed(&tree, "a").is_none());
        let (_, tree) = analyze("function f(){ if (x) { let b = 2; g(b); } }", false);
        assert!(fixed(&tree, "b").is_some());
    }

    #[test]
    fn test_function_declaration_fixed_without_name() {
        let (_, tree) = analyze("var r = (function(){ function g(){ return 1; } return g(); })();", false);
        match fixed(&tree, "g") {
            Some(Expr::Fn(f)) => assert!(f.id.is_none()),
            other => panic!("expected fixed function, got {other:?}"),
        }
    }

    #[test]
    fn test_eval_blocks_fixing() {
        let (_, tree) = analyze("function f(){ var a = 1; eval('a = 2'); return a; }", false);
        assert!(fixed(&tree, "a").is_none());
    }

    #[test]
    fn test_rerun_clears_stale_values() {
        let (mut program, mut tree) = analyze("function f(){ var a = 1; return a; }", false);
        assert!(fixed(&tree, "a").is_some());
        program.body.clear();
        mark_fixed(&program, &mut tree, false);
        assert!(fixed(&tree, "a").is_none());
    }
}
