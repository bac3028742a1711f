//! Removal of unreferenced bindings.
//!
//! Runs on a freshly resolved tree at the end of every pass.  A binding is
//! dropped when nothing reads it, it is not part of the module interface,
//! no `eval`/`with` can reach it and (at the top level) the caller allowed
//! top-level removal.  Initializers with side effects survive as expression
//! statements; plain assignments to a dropped binding keep their right-hand
//! side.

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::compress::Diagnostics;
use crate::compress::effects::Purity;
use crate::compress::options::CompressOptions;
use crate::parser::ast::*;
use crate::parser::scope::{BindingKind, ScopeTree, SymbolId};
use crate::walk::{self, RewriteAction, Rewriter, Visit};

/// Drop the unreferenced bindings of `program`.
pub(super) fn drop_unused(
    program: &mut Program,
    tree: &ScopeTree,
    options: &CompressOptions,
    toplevel: bool,
    diag: &mut Diagnostics,
) {
    let mut writes = WriteScan::default();
    writes.visit_program(program);
    let mut pass = Unused {
        tree,
        options,
        purity: Purity::new(options, tree),
        toplevel,
        complex_writes: writes.complex,
        diag,
    };
    walk::rewrite_program(&mut pass, program);
}

/// Symbols written by anything other than a plain `name = value`.
#[derive(Default)]
struct WriteScan {
    complex: FxHashSet<SymbolId>,
}

impl WriteScan {
    fn add_pat(&mut self, pat: &Pat) {
        let mut names = Vec::new();
        pat.bound_names(&mut names);
        self.complex.extend(names.into_iter().filter_map(|i| i.symbol));
    }
}

impl Visit for WriteScan {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::ForIn(ForInStmt { left, .. }) | Stmt::ForOf(ForOfStmt { left, .. }) => match left {
                ForInOfLeft::Pat(p) => self.add_pat(p),
                ForInOfLeft::VarDecl(d) => {
                    for decl in &d.declarators {
                        self.add_pat(&decl.id);
                    }
                }
            },
            _ => {}
        }
        walk::walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Update(u) => {
                if let Expr::Ident(i) = &*u.argument {
                    self.complex.extend(i.symbol);
                }
            }
            Expr::Assign(a) => match &a.left {
                AssignTarget::Pat(p) => self.add_pat(p),
                AssignTarget::Expr(e) => {
                    if a.op != AssignOp::Assign
                        && let Expr::Ident(i) = &**e
                    {
                        self.complex.extend(i.symbol);
                    }
                }
            },
            _ => {}
        }
        walk::walk_expr(self, expr);
    }
}

struct Unused<'a> {
    tree: &'a ScopeTree,
    options: &'a CompressOptions,
    purity: Purity<'a>,
    toplevel: bool,
    complex_writes: FxHashSet<SymbolId>,
    diag: &'a mut Diagnostics,
}

impl Unused<'_> {
    /// `true` when the binding behind `ident` can be removed.
    fn droppable(&self, ident: &Ident) -> bool {
        let Some(id) = ident.symbol else { return false };
        let def = self.tree.symbol(id);
        !def.is_referenced()
            && !def.exported
            && !def.undeclared
            && def.kind != BindingKind::Arguments
            && !self.tree.is_pinned(id)
            && !self.complex_writes.contains(&id)
            && (self.toplevel || !self.tree.is_toplevel(id))
    }

    fn drop_declarators(&mut self, decl: &mut VarDecl) -> Option<Vec<Stmt>> {
        let droppable: Vec<bool> = decl
            .declarators
            .iter()
            .map(|d| matches!(&d.id, Pat::Ident(i) if self.droppable(i)))
            .collect();
        if !droppable.contains(&true) {
            return None;
        }
        let mut out = Vec::new();
        let mut group: Vec<VarDeclarator> = Vec::new();
        for (d, drop) in std::mem::take(&mut decl.declarators).into_iter().zip(droppable) {
            if !drop {
                group.push(d);
                continue;
            }
            if let Pat::Ident(i) = &d.id {
                trace!(name = %i.name, "unused variable");
                self.diag.warn(format!("Dropping unused variable {}", i.name), i.loc);
            }
            if let Some(effects) = d.init.and_then(|init| self.purity.drop_unused(*init)) {
                if !group.is_empty() {
                    out.push(Stmt::VarDecl(VarDecl {
                        loc: decl.loc,
                        kind: decl.kind,
                        declarators: std::mem::take(&mut group),
                    }));
                }
                out.push(Stmt::expr(effects));
            }
        }
        if !group.is_empty() {
            out.push(Stmt::VarDecl(VarDecl {
                loc: decl.loc,
                kind: decl.kind,
                declarators: group,
            }));
        }
        Some(out)
    }

    /// Pop trailing parameters nothing reads.
    fn drop_params(&self, params: &mut Vec<Pat>) {
        if self.options.keep_fargs {
            return;
        }
        while let Some(Pat::Ident(p)) = params.last() {
            let Some(id) = p.symbol else { break };
            let def = self.tree.symbol(id);
            let scope = self.tree.scope(def.scope);
            if def.is_referenced() || def.assignments > 0 || scope.uses_arguments || scope.pinned {
                break;
            }
            params.pop();
        }
    }
}

impl Rewriter for Unused<'_> {
    fn after_stmt(&mut self, stmt: &mut Stmt) -> RewriteAction<Stmt> {
        match stmt {
            Stmt::VarDecl(d) => match self.drop_declarators(d) {
                None => RewriteAction::Keep,
                Some(out) if out.is_empty() => RewriteAction::Remove,
                Some(out) => RewriteAction::SpliceMany(out),
            },
            Stmt::FnDecl(f) => {
                if let Some(id) = &f.id
                    && self.droppable(id)
                {
                    self.diag.warn(format!("Dropping unused function {}", id.name), id.loc);
                    return RewriteAction::Remove;
                }
                self.drop_params(&mut f.params);
                RewriteAction::Keep
            }
            Stmt::ClassDecl(c) => {
                if let Some(id) = &c.id
                    && self.droppable(id)
                    && !self.purity.class_has_side_effects(c)
                {
                    self.diag.warn(format!("Dropping unused class {}", id.name), id.loc);
                    return RewriteAction::Remove;
                }
                RewriteAction::Keep
            }
            _ => RewriteAction::Keep,
        }
    }

    fn after_expr(&mut self, expr: &mut Expr) -> RewriteAction<Expr> {
        match expr {
            Expr::Assign(a) if a.op == AssignOp::Assign => {
                if let Some(target) = a.left.as_ident()
                    && self.droppable(target)
                {
                    return RewriteAction::Replace(crate::compress::take(&mut a.right));
                }
            }
            Expr::Fn(f) => {
                if !self.options.keep_fnames && f.id.as_ref().is_some_and(|id| self.droppable(id)) {
                    f.id = None;
                }
                self.drop_params(&mut f.params);
            }
            Expr::Arrow(a) => self.drop_params(&mut a.params),
            Expr::Class(c) => {
                if !self.options.keep_classnames && c.id.as_ref().is_some_and(|id| self.droppable(id)) {
                    c.id = None;
                }
            }
            _ => {}
        }
        RewriteAction::Keep
    }

    fn enter_function(&mut self, function: &mut Function) -> bool {
        !function.has_directive("use asm")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser::{parse, ParseOptions};
    use crate::parser::scope::{resolve, ResolveOptions};
    use crate::printer::{print, OutputOptions};

    fn run(src: &str, options: &CompressOptions, toplevel: bool) -> (String, Vec<String>) {
        let mut program = parse(src, &ParseOptions::default()).unwrap();
        let tree = resolve(&mut program, &ResolveOptions::default()).unwrap();
        let mut diag = Diagnostics::new(vec!["in.js".into()]);
        drop_unused(&mut program, &tree, options, toplevel, &mut diag);
        let code = print(&program, &OutputOptions::default(), None);
        (code, diag.warnings.into_iter().map(|w| w.message).collect())
    }

    #[test]
    fn test_unused_local_dropped_with_warning() {
        let (code, warnings) = run("function f(){ var a = 1, b = 2; return b; }", &CompressOptions::default(), false);
        assert_eq!(code, "function f(){var b=2;return b}");
        assert_eq!(warnings, vec!["Dropping unused variable a".to_string()]);
    }

    #[test]
    fn test_initializer_effects_kept() {
        let (code, _) = run("function f(){ var a = g(), b = 1; return b; }", &CompressOptions::default(), false);
        assert_eq!(code, "function f(){g();var b=1;return b}");
    }

    #[test]
    fn test_toplevel_kept_without_option() {
        let (code, _) = run("var a = 1; function f(){}", &CompressOptions::default(), false);
        assert_eq!(code, "var a=1;function f(){}");
        let (code, warnings) = run("var a = 1; function f(){}", &CompressOptions::default(), true);
        assert_eq!(code, "");
        assert!(warnings.contains(&"Dropping unused function f".to_string()));
    }

    #[test]
    fn test_assignment_to_unread_local_keeps_value() {
        let (code, _) = run("function f(){ var a; a = g(); }", &CompressOptions::default(), false);
        assert_eq!(code, "function f(){g()}");
    }

    #[test]
    fn test_compound_write_keeps_binding() {
        let (code, _) = run("function f(){ var a = 0; a += 1; }", &CompressOptions::default(), false);
        assert_eq!(code, "function f(){var a=0;a+=1}");
    }

    #[test]
    fn test_fn_expression_name_and_params() {
        let opts = CompressOptions {
            keep_fargs: false,
            ..CompressOptions::default()
        };
        let (code, _) = run("x = function g(a, b){ return a; };", &opts, false);
        assert_eq!(code, "x=function(a){return a};");
        let keep = CompressOptions {
            keep_fnames: true,
            ..CompressOptions::default()
        };
        let (code, _) = run("x = function g(a, b){ return a; };", &keep, false);
        assert_eq!(code, "x=function g(a,b){return a};");
    }

    #[test]
    fn test_exports_and_eval_retained() {
        let (code, _) = run("function f(){ var a = 1; eval(''); }", &CompressOptions::default(), false);
        assert_eq!(code, "function f(){var a=1;eval(\"\")}");
    }
}
