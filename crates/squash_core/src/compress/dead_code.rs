//! Removal of code that can never run.
//!
//! Dropped statements still contribute their hoisted declarations: a `var`
//! keeps its names (without initializer) and a function declaration stays
//! whole wherever the language would have hoisted it.

use tracing::trace;

use crate::compress::evaluate::{evaluate, strict_equals, truthiness};
use crate::compress::{Compressor, take};
use crate::parser::ast::*;
use crate::parser::scanner::Span;

impl Compressor<'_> {
    /// Collect the declarations of `stmt` that outlive its removal.
    ///
    /// `direct` is set when `stmt` sits in the statement list that owns its
    /// block-scoped declarations.
    pub(super) fn hoist_declarations(&self, stmt: &Stmt, direct: bool, out: &mut Vec<Stmt>) {
        match stmt {
            Stmt::VarDecl(d) => {
                if d.kind == VarKind::Var {
                    push_names(VarKind::Var, d, out);
                } else if direct {
                    push_names(VarKind::Let, d, out);
                }
            }
            Stmt::FnDecl(f) => {
                if direct || !self.in_strict() {
                    out.push(stmt.clone());
                } else if let Some(id) = &f.id {
                    trace!(name = %id.name, "dropping block function");
                }
            }
            Stmt::ClassDecl(c) => {
                if direct && let Some(id) = &c.id {
                    out.push(declaration(VarKind::Let, vec![id.clone()], c.loc));
                }
            }
            Stmt::Block(b) => {
                for s in &b.body {
                    self.hoist_declarations(s, false, out);
                }
            }
            Stmt::If(s) => {
                self.hoist_declarations(&s.consequent, false, out);
                if let Some(alt) = &s.alternate {
                    self.hoist_declarations(alt, false, out);
                }
            }
            Stmt::For(s) => {
                if let Some(ForInit::VarDecl(d)) = &s.init
                    && d.kind == VarKind::Var
                {
                    push_names(VarKind::Var, d, out);
                }
                self.hoist_declarations(&s.body, false, out);
            }
            Stmt::ForIn(ForInStmt { left, body, .. }) | Stmt::ForOf(ForOfStmt { left, body, .. }) => {
                if let ForInOfLeft::VarDecl(d) = left
                    && d.kind == VarKind::Var
                {
                    push_names(VarKind::Var, d, out);
                }
                self.hoist_declarations(body, false, out);
            }
            Stmt::While(s) => self.hoist_declarations(&s.body, false, out),
            Stmt::DoWhile(s) => self.hoist_declarations(&s.body, false, out),
            Stmt::Labeled(s) => self.hoist_declarations(&s.body, false, out),
            Stmt::With(s) => self.hoist_declarations(&s.body, false, out),
            Stmt::Switch(s) => {
                for case in &s.cases {
                    for c in &case.consequent {
                        self.hoist_declarations(c, false, out);
                    }
                }
            }
            Stmt::Try(t) => {
                for s in &t.block.body {
                    self.hoist_declarations(s, false, out);
                }
                if let Some(h) = &t.handler {
                    for s in &h.body.body {
                        self.hoist_declarations(s, false, out);
                    }
                }
                if let Some(f) = &t.finalizer {
                    for s in &f.body {
                        self.hoist_declarations(s, false, out);
                    }
                }
            }
            _ => {}
        }
    }

    /// Replace everything after the first unconditional jump of `stmts` by
    /// the declarations it hoists.
    pub(super) fn drop_unreachable(&mut self, stmts: &mut Vec<Stmt>) {
        let Some(jump) = stmts.iter().position(Stmt::is_jump) else { return };
        if jump + 1 >= stmts.len() {
            return;
        }
        let tail = stmts.split_off(jump + 1);
        for stmt in tail {
            match stmt {
                Stmt::FnDecl(_) => stmts.push(stmt),
                Stmt::Empty(_) => {}
                other => {
                    if !is_bare_declaration(&other) {
                        self.diag.warn("Dropping unreachable code", other.loc());
                    }
                    self.hoist_declarations(&other, true, stmts);
                }
            }
        }
    }

    /// `if` with a condition of known truthiness: the taken branch plus the
    /// hoisted declarations of the other one.  `None` when the condition is
    /// not constant.
    pub(super) fn prune_if(&mut self, stmt: &mut IfStmt) -> Option<Vec<Stmt>> {
        let taken = truthiness(&stmt.test, &self.eval_env())?;
        let mut out = Vec::new();
        let test = take(&mut stmt.test);
        if let Some(effects) = self.purity.drop_unused(test) {
            out.push(Stmt::expr(effects));
        }
        let (kept, dropped) = if taken {
            (Some(std::mem::replace(&mut *stmt.consequent, Stmt::empty(stmt.loc))), stmt.alternate.take())
        } else {
            let dropped = std::mem::replace(&mut stmt.consequent, Box::new(Stmt::empty(stmt.loc)));
            (stmt.alternate.take().map(|b| *b), Some(dropped))
        };
        if let Some(dropped) = dropped
            && !dropped.is_empty()
        {
            self.diag.warn("Dropping unreachable code", dropped.loc());
            self.hoist_declarations(&dropped, false, &mut out);
        }
        out.extend(kept);
        Some(out)
    }

    /// `for`/`while` whose condition is known false: only the initializer
    /// and the hoisted declarations of the body survive.
    pub(super) fn prune_loop(&mut self, stmt: &mut ForStmt) -> Option<Vec<Stmt>> {
        let test = stmt.test.as_deref()?;
        if truthiness(test, &self.eval_env())? {
            return None;
        }
        let mut out = Vec::new();
        match stmt.init.take() {
            None => {}
            Some(ForInit::Expr(e)) => out.extend(self.purity.drop_unused(*e).map(Stmt::expr)),
            Some(ForInit::VarDecl(d)) if d.kind == VarKind::Var => out.push(Stmt::VarDecl(d)),
            Some(other) => {
                stmt.init = Some(other);
                return None;
            }
        }
        if let Some(effects) = stmt.test.take().and_then(|t| self.purity.drop_unused(*t)) {
            out.push(Stmt::expr(effects));
        }
        if !stmt.body.is_empty() {
            self.diag.warn("Dropping unreachable code", stmt.body.loc());
        }
        self.hoist_declarations(&stmt.body, false, &mut out);
        Some(out)
    }

    /// `switch` on a constant with constant case labels: the statements
    /// from the matching case up to the first `break`.
    pub(super) fn prune_switch(&mut self, stmt: &mut SwitchStmt) -> Option<Vec<Stmt>> {
        let env = self.eval_env();
        let discriminant = evaluate(&stmt.discriminant, &env).ok()??;
        let mut matched = None;
        let mut default = None;
        for (i, case) in stmt.cases.iter().enumerate() {
            match &case.test {
                None => default = Some(i),
                Some(test) => {
                    let value = evaluate(test, &env).ok()??;
                    if matched.is_none() && strict_equals(&discriminant, &value) {
                        matched = Some(i);
                    }
                }
            }
        }
        let start = matched.or(default);
        let mut taken = Vec::new();
        let mut out = Vec::new();
        let mut taking = false;
        let mut done = false;
        for (i, case) in stmt.cases.iter().enumerate() {
            if start == Some(i) && !done {
                taking = true;
            }
            for s in &case.consequent {
                if !taking {
                    self.hoist_declarations(s, false, &mut out);
                    continue;
                }
                match s {
                    Stmt::Break(b) if b.label.is_none() => {
                        taking = false;
                        done = true;
                    }
                    other if contains_break(other) => return None,
                    other => taken.push(other.clone()),
                }
            }
        }
        if taken.iter().any(Stmt::is_lexical_declaration) {
            out.push(Stmt::Block(BlockStmt { loc: stmt.loc, body: taken }));
        } else {
            out.extend(taken);
        }
        trace!("switch pruned");
        Some(out)
    }
}

/// `var a, b;` and friends: no initializer, nothing that runs.
fn is_bare_declaration(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::VarDecl(d) => d.declarators.iter().all(|d| d.init.is_none()),
        _ => false,
    }
}

fn push_names(kind: VarKind, decl: &VarDecl, out: &mut Vec<Stmt>) {
    let mut names = Vec::new();
    for d in &decl.declarators {
        d.id.bound_names(&mut names);
    }
    if names.is_empty() {
        return;
    }
    let names = names.into_iter().cloned().collect();
    out.push(declaration(kind, names, decl.loc));
}

fn declaration(kind: VarKind, names: Vec<Ident>, loc: Span) -> Stmt {
    Stmt::VarDecl(VarDecl {
        loc,
        kind,
        declarators: names
            .into_iter()
            .map(|id| VarDeclarator {
                loc: id.loc,
                id: Pat::Ident(id),
                init: None,
            })
            .collect(),
    })
}

/// `true` when `stmt` contains an unlabelled `break` that targets the
/// enclosing `switch`.
fn contains_break(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Break(b) => b.label.is_none(),
        Stmt::Block(b) => b.body.iter().any(contains_break),
        Stmt::If(s) => contains_break(&s.consequent) || s.alternate.as_deref().is_some_and(contains_break),
        Stmt::Labeled(s) => contains_break(&s.body),
        Stmt::With(s) => contains_break(&s.body),
        Stmt::Try(t) => {
            t.block.body.iter().any(contains_break)
                || t.handler.as_ref().is_some_and(|h| h.body.body.iter().any(contains_break))
                || t.finalizer.as_ref().is_some_and(|f| f.body.iter().any(contains_break))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::compress::compress;
    use crate::compress::options::CompressOptions;
    use crate::parser::parser::{parse, ParseOptions};
    use crate::parser::scope::ResolveOptions;
    use crate::printer::{print, OutputOptions};

    fn minify(src: &str) -> (String, Vec<String>) {
        let mut program = parse(src, &ParseOptions::default()).unwrap();
        let warnings = compress(&mut program, &CompressOptions::default(), &ResolveOptions::default()).unwrap();
        let code = print(&program, &OutputOptions::default(), None);
        (code, warnings.into_iter().map(|w| w.message).collect())
    }

    #[test]
    fn test_code_after_return_dropped() {
        let (code, warnings) = minify("function f(){ return g(x, k); h(); var x = 1; function k(){} }");
        assert_eq!(code, "function f(){return g(x,k);var x;function k(){}}");
        assert!(warnings.contains(&"Dropping unreachable code".to_string()));
    }

    #[test]
    fn test_constant_if_pruned() {
        let (code, _) = minify("if (true) { console.log(1); } else { console.log(2); }");
        assert_eq!(code, "console.log(1);");
    }

    #[test]
    fn test_false_branch_keeps_var() {
        let (code, _) = minify("if (0) { var a = g(); } h(a);");
        assert_eq!(code, "var a;h(a);");
    }

    #[test]
    fn test_false_loop_removed() {
        let (code, _) = minify("while (false) { g(); } for (x(); false;) { h(); }");
        assert_eq!(code, "x();");
    }

    #[test]
    fn test_switch_pruned_to_matching_case() {
        let (code, _) = minify("switch (2) { case 1: a(); break; case 2: b(); case 3: c(); break; default: d(); }");
        assert_eq!(code, "b(),c();");
    }

    #[test]
    fn test_switch_with_nested_break_kept() {
        let (code, _) = minify("switch (1) { case 1: if (x) break; a(); }");
        assert!(code.starts_with("switch(1)"));
    }
}
