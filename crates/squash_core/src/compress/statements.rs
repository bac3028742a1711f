//! Statement-level rewrites.
//!
//! [`Compressor::optimize_stmt`] runs on each statement after its children;
//! [`Compressor::optimize_body`] runs on each statement list once all of its
//! statements are done.

use tracing::trace;

use crate::compress::evaluate::truthiness;
use crate::compress::{inline, take, Compressor};
use crate::parser::ast::*;
use crate::walk::{BodyKind, RewriteAction};

impl Compressor<'_> {
    pub(super) fn optimize_stmt(&mut self, stmt: &mut Stmt) -> RewriteAction<Stmt> {
        match stmt {
            Stmt::Expr(e) => {
                if self.options.side_effects {
                    match self.purity.drop_unused(take(&mut e.expr)) {
                        None => return RewriteAction::Remove,
                        Some(kept) => *e.expr = kept,
                    }
                }
                if self.options.negate_iife
                    && let Expr::Call(c) = &*e.expr
                    && matches!(*c.callee, Expr::Fn(_))
                {
                    let call = take(&mut e.expr);
                    *e.expr = Expr::not(call);
                }
                RewriteAction::Keep
            }
            Stmt::Debugger(_) if self.options.drop_debugger => RewriteAction::Remove,
            Stmt::Block(b) => {
                if b.body.is_empty() {
                    RewriteAction::Remove
                } else if b.body.len() == 1 && !b.body[0].is_lexical_declaration() {
                    b.body.pop().map_or(RewriteAction::Keep, RewriteAction::Replace)
                } else {
                    RewriteAction::Keep
                }
            }
            Stmt::If(s) => self.optimize_if(s),
            Stmt::While(w) if self.options.loops => {
                let mut f = ForStmt {
                    loc: w.loc,
                    init: None,
                    test: Some(std::mem::replace(&mut w.test, Box::new(Expr::num(0.0, w.loc)))),
                    update: None,
                    body: std::mem::replace(&mut w.body, Box::new(Stmt::empty(w.loc))),
                };
                match self.optimize_for(&mut f) {
                    RewriteAction::Keep | RewriteAction::StopDescent => RewriteAction::Replace(Stmt::For(f)),
                    other => other,
                }
            }
            Stmt::For(f) => self.optimize_for(f),
            Stmt::Switch(s) => self.optimize_switch(s),
            Stmt::Return(r) => {
                if r.argument.as_deref().is_some_and(Expr::is_undefined) {
                    r.argument = None;
                }
                RewriteAction::Keep
            }
            Stmt::Try(t) if t.block.body.is_empty() => match t.finalizer.take() {
                Some(finalizer) => RewriteAction::Replace(Stmt::Block(finalizer)),
                None => RewriteAction::Remove,
            },
            Stmt::Labeled(l) if is_empty_stmt(&l.body) => RewriteAction::Remove,
            _ => RewriteAction::Keep,
        }
    }

    // ── if ───────────────────────────────────────────────────────────────

    fn optimize_if(&mut self, s: &mut IfStmt) -> RewriteAction<Stmt> {
        self.optimize_bool(&mut s.test);
        if self.options.dead_code
            && let Some(out) = self.prune_if(s)
        {
            return splice(out);
        }
        if s.alternate.as_deref().is_some_and(is_empty_stmt) {
            s.alternate = None;
        }
        if !self.options.conditionals {
            return RewriteAction::Keep;
        }
        if is_empty_stmt(&s.consequent) {
            match s.alternate.take() {
                None => {
                    return match self.purity.drop_unused(take(&mut s.test)) {
                        None => RewriteAction::Remove,
                        Some(effects) => RewriteAction::Replace(Stmt::expr(effects)),
                    };
                }
                Some(alt) => {
                    *s.test = self.negate(take(&mut s.test));
                    s.consequent = alt;
                }
            }
        }
        if s.alternate.is_some() && is_not(&s.test) {
            *s.test = self.negate(take(&mut s.test));
            if let Some(alt) = s.alternate.as_mut() {
                std::mem::swap(&mut s.consequent, alt);
            }
        }

        let Some(alt) = s.alternate.as_deref_mut() else {
            // `if (a) if (b) x;` → `if (a && b) x;`
            if let Stmt::If(inner) = &mut *s.consequent
                && inner.alternate.is_none()
            {
                let inner_test = take(&mut inner.test);
                let body = std::mem::replace(&mut inner.consequent, Box::new(Stmt::empty(inner.loc)));
                *s.test = Expr::logical(LogicalOp::And, take(&mut s.test), inner_test);
                s.consequent = body;
                return self.optimize_if(s);
            }
            if let Stmt::Expr(body) = &mut *s.consequent {
                let body = take(&mut body.expr);
                let test = take(&mut s.test);
                trace!("if → logical");
                let expr = if is_not(&test) {
                    Expr::logical(LogicalOp::Or, self.negate(test), body)
                } else {
                    Expr::logical(LogicalOp::And, test, body)
                };
                return RewriteAction::Replace(Stmt::expr(expr));
            }
            return RewriteAction::Keep;
        };

        match (&mut *s.consequent, alt) {
            (Stmt::Expr(a), Stmt::Expr(b)) => {
                let expr = Expr::conditional(take(&mut s.test), take(&mut a.expr), take(&mut b.expr));
                trace!("if/else → conditional");
                RewriteAction::Replace(Stmt::expr(expr))
            }
            (Stmt::Return(a), Stmt::Return(b)) if a.argument.is_some() && b.argument.is_some() => {
                let (Some(x), Some(y)) = (a.argument.take(), b.argument.take()) else {
                    return RewriteAction::Keep;
                };
                let expr = Expr::conditional(take(&mut s.test), *x, *y);
                RewriteAction::Replace(Stmt::Return(ReturnStmt {
                    loc: s.loc,
                    argument: Some(Box::new(expr)),
                }))
            }
            _ => RewriteAction::Keep,
        }
    }

    // ── loops and switch ─────────────────────────────────────────────────

    fn optimize_for(&mut self, f: &mut ForStmt) -> RewriteAction<Stmt> {
        if let Some(test) = f.test.as_deref_mut() {
            self.optimize_bool(test);
        }
        if self.options.dead_code
            && let Some(out) = self.prune_loop(f)
        {
            return splice(out);
        }
        if !self.options.loops {
            return RewriteAction::Keep;
        }
        if let Some(test) = f.test.as_deref()
            && truthiness(test, &self.eval_env()) == Some(true)
            && !self.purity.has_side_effects(test)
        {
            f.test = None;
        }
        if let Some(cond) = take_leading_break(&mut f.body) {
            let stop = self.negate(cond);
            let test = match f.test.take() {
                None => stop,
                Some(test) => Expr::logical(LogicalOp::And, *test, stop),
            };
            f.test = Some(Box::new(test));
        }
        RewriteAction::Keep
    }

    fn optimize_switch(&mut self, s: &mut SwitchStmt) -> RewriteAction<Stmt> {
        if !self.options.switches {
            return RewriteAction::Keep;
        }
        if self.options.dead_code
            && let Some(out) = self.prune_switch(s)
        {
            return splice(out);
        }
        let bodies_empty = s.cases.iter().all(|c| c.consequent.is_empty());
        let tests_pure = s
            .cases
            .iter()
            .all(|c| c.test.as_ref().is_none_or(|t| !self.purity.has_side_effects(t)));
        if bodies_empty && tests_pure {
            return match self.purity.drop_unused(take(&mut s.discriminant)) {
                None => RewriteAction::Remove,
                Some(effects) => RewriteAction::Replace(Stmt::expr(effects)),
            };
        }
        if let Some(last) = s.cases.last_mut()
            && matches!(last.consequent.last(), Some(Stmt::Break(b)) if b.label.is_none())
        {
            last.consequent.pop();
        }
        RewriteAction::Keep
    }

    // ── statement lists ──────────────────────────────────────────────────

    pub(super) fn optimize_body(&mut self, stmts: &mut Vec<Stmt>, kind: BodyKind) {
        flatten(stmts);
        if self.options.dead_code {
            self.drop_unreachable(stmts);
        }
        if self.options.if_return {
            self.if_return(stmts, kind);
        }
        if self.options.collapse_vars {
            inline::collapse_vars(stmts, self.tree, self.purity, self.toplevel);
        }
        if self.options.sequences {
            self.sequences(stmts);
        }
        if self.options.join_vars {
            join_vars(stmts);
        }
    }

    fn if_return(&mut self, stmts: &mut Vec<Stmt>, kind: BodyKind) {
        // `if (a) return; else b;` → `if (a) return; b;`
        let mut i = 0;
        while i < stmts.len() {
            if let Stmt::If(s) = &mut stmts[i]
                && ends_in_jump(&s.consequent)
                && let Some(alt) = s.alternate.take()
            {
                let tail = match *alt {
                    Stmt::Block(b) if !b.body.iter().any(Stmt::is_lexical_declaration) => b.body,
                    other => vec![other],
                };
                stmts.splice(i + 1..i + 1, tail);
            }
            i += 1;
        }

        // `if (a) return b; return c;` → `return a ? b : c;`
        let mut i = 0;
        while i + 1 < stmts.len() {
            if let Some(value) = if_return_value(&stmts[i])
                && let Stmt::Return(next) = &stmts[i + 1]
                && let Some(other) = next.argument.as_deref()
                && let Stmt::If(s) = &stmts[i]
            {
                let loc = s.loc;
                let expr = Expr::conditional((*s.test).clone(), value.clone(), other.clone());
                stmts.splice(
                    i..i + 2,
                    [Stmt::Return(ReturnStmt {
                        loc,
                        argument: Some(Box::new(expr)),
                    })],
                );
                continue;
            }
            i += 1;
        }

        if kind != BodyKind::Function {
            return;
        }

        // A bare `return` at the end of a function body.
        if let Some(last) = stmts.iter().rposition(|s| !matches!(s, Stmt::FnDecl(_)))
            && is_bare_return(&stmts[last])
        {
            stmts.remove(last);
        }

        // `if (a) return; rest` → `if (!a) { rest }`
        let mut i = stmts.len();
        while i > 0 {
            i -= 1;
            let Stmt::If(s) = &stmts[i] else { continue };
            if s.alternate.is_some() || !is_bare_return(&s.consequent) {
                continue;
            }
            if stmts[i + 1..].iter().any(|s| s.is_lexical_declaration()) {
                continue;
            }
            let mut rest = stmts.split_off(i + 1);
            let Some(Stmt::If(mut s)) = stmts.pop() else { break };
            if rest.is_empty() {
                stmts.extend(self.purity.drop_unused(*s.test).map(Stmt::expr));
                continue;
            }
            if self.options.sequences {
                self.sequences(&mut rest);
            }
            *s.test = self.negate(take(&mut s.test));
            s.consequent = Box::new(Stmt::block_or_single(s.loc, rest));
            let replaced = match self.optimize_if(&mut s) {
                RewriteAction::Keep | RewriteAction::StopDescent => vec![Stmt::If(s)],
                RewriteAction::Replace(stmt) => vec![stmt],
                RewriteAction::Remove => Vec::new(),
                RewriteAction::SpliceMany(many) => many,
            };
            trace!("if return → negated if");
            stmts.extend(replaced);
        }
    }

    /// Join consecutive expression statements, and fold a leading one into
    /// the statement that follows.
    fn sequences(&self, stmts: &mut Vec<Stmt>) {
        let limit = self.options.sequences_limit.max(2);
        let old = std::mem::take(stmts);
        for mut stmt in old {
            let Some(Stmt::Expr(prev)) = stmts.last_mut() else {
                stmts.push(stmt);
                continue;
            };
            let prev_len = match &*prev.expr {
                Expr::Sequence(s) => s.expressions.len(),
                _ => 1,
            };
            let slot: Option<&mut Box<Expr>> = match &mut stmt {
                Stmt::Expr(e) if prev_len < limit => Some(&mut e.expr),
                Stmt::Return(r) => r.argument.as_mut(),
                Stmt::Throw(t) => Some(&mut t.argument),
                Stmt::If(s) => Some(&mut s.test),
                Stmt::Switch(s) => Some(&mut s.discriminant),
                Stmt::For(f) => match &mut f.init {
                    Some(ForInit::Expr(e)) => Some(e),
                    None => {
                        let head = take(&mut prev.expr);
                        f.init = Some(ForInit::Expr(Box::new(head)));
                        stmts.pop();
                        stmts.push(stmt);
                        continue;
                    }
                    _ => None,
                },
                _ => None,
            };
            let Some(slot) = slot else {
                stmts.push(stmt);
                continue;
            };
            let head = take(&mut prev.expr);
            let tail = take(slot);
            **slot = Expr::sequence(vec![head, tail]);
            stmts.pop();
            stmts.push(stmt);
        }
    }
}

/// Merge adjacent declarations of one kind, and move a `var` into the
/// `for` head that follows it.
fn join_vars(stmts: &mut Vec<Stmt>) {
    let old = std::mem::take(stmts);
    for stmt in old {
        let stmt = match (stmts.last_mut(), stmt) {
            (Some(Stmt::VarDecl(prev)), Stmt::VarDecl(next)) if prev.kind == next.kind => {
                prev.declarators.extend(next.declarators);
                continue;
            }
            (_, stmt) => stmt,
        };
        if let Stmt::For(mut f) = stmt {
            let head_takes_var = match &f.init {
                None => true,
                Some(ForInit::VarDecl(d)) => d.kind == VarKind::Var,
                Some(ForInit::Expr(_)) => false,
            };
            if head_takes_var
                && matches!(stmts.last(), Some(Stmt::VarDecl(d)) if d.kind == VarKind::Var)
                && let Some(Stmt::VarDecl(mut prev)) = stmts.pop()
            {
                if let Some(ForInit::VarDecl(d)) = f.init.take() {
                    prev.declarators.extend(d.declarators);
                }
                f.init = Some(ForInit::VarDecl(prev));
            }
            stmts.push(Stmt::For(f));
            continue;
        }
        stmts.push(stmt);
    }
}

/// Inline non-lexical blocks and drop empty statements.
fn flatten(stmts: &mut Vec<Stmt>) {
    let old = std::mem::take(stmts);
    for stmt in old {
        match stmt {
            Stmt::Block(b) if !b.body.iter().any(Stmt::is_lexical_declaration) => {
                let mut inner = b.body;
                flatten(&mut inner);
                stmts.extend(inner);
            }
            Stmt::Empty(_) => {}
            other => stmts.push(other),
        }
    }
}

fn splice(out: Vec<Stmt>) -> RewriteAction<Stmt> {
    if out.is_empty() {
        RewriteAction::Remove
    } else {
        RewriteAction::SpliceMany(out)
    }
}

fn is_empty_stmt(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Empty(_) => true,
        Stmt::Block(b) => b.body.iter().all(is_empty_stmt),
        _ => false,
    }
}

fn is_not(expr: &Expr) -> bool {
    matches!(expr, Expr::Unary(u) if u.op == UnaryOp::Not)
}

fn ends_in_jump(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Block(b) => b.body.last().is_some_and(Stmt::is_jump),
        other => other.is_jump(),
    }
}

/// `return;`, possibly wrapped in a block.
fn is_bare_return(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return(r) => r.argument.is_none(),
        Stmt::Block(b) => b.body.len() == 1 && is_bare_return(&b.body[0]),
        _ => false,
    }
}

/// The value of `if (c) return value;` without an `else`.
fn if_return_value(stmt: &Stmt) -> Option<&Expr> {
    let Stmt::If(s) = stmt else { return None };
    if s.alternate.is_some() {
        return None;
    }
    let ret = match &*s.consequent {
        Stmt::Block(b) if b.body.len() == 1 => &b.body[0],
        other => other,
    };
    match ret {
        Stmt::Return(r) => r.argument.as_deref(),
        _ => None,
    }
}

/// Remove a leading `if (c) break;` from a loop body and return `c`.
fn take_leading_break(body: &mut Box<Stmt>) -> Option<Expr> {
    fn is_break_if(stmt: &Stmt) -> bool {
        let Stmt::If(s) = stmt else { return false };
        let unlabeled = |s: &Stmt| matches!(s, Stmt::Break(b) if b.label.is_none());
        s.alternate.is_none()
            && match &*s.consequent {
                Stmt::Block(b) => b.body.len() == 1 && unlabeled(&b.body[0]),
                other => unlabeled(other),
            }
    }
    let loc = body.loc();
    let stmt = match &mut **body {
        single if is_break_if(single) => std::mem::replace(single, Stmt::empty(loc)),
        Stmt::Block(b) if b.body.first().is_some_and(is_break_if) => {
            let first = b.body.remove(0);
            let rest = std::mem::take(&mut b.body);
            **body = if rest.is_empty() {
                Stmt::empty(loc)
            } else {
                Stmt::block_or_single(loc, rest)
            };
            first
        }
        _ => return None,
    };
    match stmt {
        Stmt::If(s) => Some(*s.test),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::compress::compress;
    use crate::compress::options::CompressOptions;
    use crate::parser::parser::{parse, ParseOptions};
    use crate::parser::scope::ResolveOptions;
    use crate::printer::{print, OutputOptions};

    fn squash(src: &str) -> String {
        let mut program = parse(src, &ParseOptions::default()).unwrap();
        compress(&mut program, &CompressOptions::default(), &ResolveOptions::default()).unwrap();
        print(&program, &OutputOptions::default(), None)
    }

    #[test]
    fn test_if_to_logical() {
        assert_eq!(squash("function f(a){ if (a) { g(); } }"), "function f(a){a&&g()}");
        assert_eq!(squash("function f(a){ if (!a) g(); }"), "function f(a){a||g()}");
        assert_eq!(squash("function f(a, b){ if (a) { if (b) g(); } }"), "function f(a,b){a&&b&&g()}");
    }

    #[test]
    fn test_if_else_to_conditional() {
        assert_eq!(squash("function f(a){ if (!a) g(); else h(); }"), "function f(a){a?h():g()}");
    }

    #[test]
    fn test_empty_branches() {
        assert_eq!(squash("if (a()) {}"), "a();");
        assert_eq!(squash("if (a) {} else { b(); }"), "a||b();");
    }

    #[test]
    fn test_if_return_merged() {
        assert_eq!(squash("function f(a){ if (a) return 1; return 2; }"), "function f(a){return a?1:2}");
        assert_eq!(
            squash("function f(a){ if (a) { return 1; } else { return 2; } }"),
            "function f(a){return a?1:2}"
        );
    }

    #[test]
    fn test_early_return_negated() {
        assert_eq!(squash("function f(a){ if (a) return; g(); h(); }"), "function f(a){a||(g(),h())}");
    }

    #[test]
    fn test_trailing_return_dropped() {
        assert_eq!(squash("function f(){ g(); return; }"), "function f(){g()}");
    }

    #[test]
    fn test_else_after_jump_removed() {
        assert_eq!(
            squash("function f(a){ if (a) { g(); return; } else { h(); } k(); }"),
            "function f(a){if(a){g();return}h(),k()}"
        );
    }

    #[test]
    fn test_sequences_into_return() {
        assert_eq!(squash("function f(){ a(); b(); return c; }"), "function f(){return a(),b(),c}");
    }

    #[test]
    fn test_loop_rules() {
        assert_eq!(squash("while (true) { if (x) break; g(); }"), "for(;!x;)g();");
        assert_eq!(squash("while (x) g();"), "for(;x;)g();");
    }

    #[test]
    fn test_join_vars_into_for() {
        assert_eq!(
            squash("var a = 1; var b = 2; for (var i = 0; i < n; i++) g(i);"),
            "for(var a=1,b=2,i=0;i<n;i++)g(i);"
        );
    }

    #[test]
    fn test_switch_trailing_break() {
        assert_eq!(
            squash("switch (x) { case 1: a(); break; default: b(); break; }"),
            "switch(x){case 1:a();break;default:b()}"
        );
    }

    #[test]
    fn test_empty_try_and_debugger() {
        assert_eq!(squash("try {} finally { g(); } debugger;"), "g();");
    }
}
