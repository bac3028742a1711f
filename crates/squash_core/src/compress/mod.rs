//! The optimizing compressor.
//!
//! [`compress`] runs up to [`CompressOptions::passes`] rounds over the
//! program.  Each round re-resolves scopes, recomputes fixed values, applies
//! every enabled rewrite bottom-up through a [`Rewriter`] and finally drops
//! unreferenced bindings.  The loop stops early once a round no longer
//! lowers the node count.
//!
//! Rules that fire on expressions live here; statement rules are in
//! `statements`, dead-code pruning in `dead_code`, substitution of
//! single-use bindings in `inline` and removal of unused bindings in
//! `unused`.

pub mod effects;
pub mod evaluate;
pub mod options;

mod dead_code;
mod inline;
mod reduce_vars;
mod statements;
mod unused;

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::error::{SquashResult, Warning};
use crate::parser::ast::*;
use crate::parser::scanner::{is_identifier_name, is_reserved_word, Span};
use crate::parser::scope::{resolve, ResolveOptions, ScopeTree, SymbolId};
use crate::walk::{self, BodyKind, RewriteAction, Rewriter};

use effects::{callee_name, Purity};
use evaluate::{evaluate, number_expr, number_to_string, truthiness, EvalEnv, Value};
use options::CompressOptions;

pub use reduce_vars::mark_fixed;

// ─────────────────────────────────────────────────────────────────────────────
// Diagnostics
// ─────────────────────────────────────────────────────────────────────────────

/// Collects compressor warnings, resolving spans to file positions.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    files: Vec<String>,
    pub warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new(files: Vec<String>) -> Self {
        Diagnostics {
            files,
            warnings: Vec::new(),
        }
    }

    /// Record a warning about the node at `loc`.
    pub fn warn(&mut self, message: impl Into<String>, loc: Span) {
        let warning = Warning {
            message: message.into(),
            file: self.files.get(loc.file as usize).cloned().unwrap_or_default(),
            line: loc.start.line,
            col: loc.start.column,
        };
        warn!("{warning}");
        self.warnings.push(warning);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry point
// ─────────────────────────────────────────────────────────────────────────────

/// Compress `program` in place and return the warnings collected.
///
/// A program whose prologue holds `"use asm"` is left untouched.
///
/// # Errors
///
/// Only resolution errors surface here (a redeclaration the parser let
/// through); the rewrites themselves never fail.
///
/// # Example
///
/// ```
/// use squash_core::compress::{compress, options::CompressOptions};
/// use squash_core::parser::parser::{parse, ParseOptions};
/// use squash_core::parser::scope::ResolveOptions;
///
/// let mut program = parse("if (true) { a(); } else { b(); }", &ParseOptions::default()).unwrap();
/// compress(&mut program, &CompressOptions::default(), &ResolveOptions::default()).unwrap();
/// assert_eq!(program.body.len(), 1);
/// ```
pub fn compress(
    program: &mut Program,
    options: &CompressOptions,
    resolve_options: &ResolveOptions,
) -> SquashResult<Vec<Warning>> {
    let mut diag = Diagnostics::new(program.files.clone());
    if has_directive(&program.body, "use asm") {
        return Ok(diag.warnings);
    }
    let toplevel = options.toplevel || program.source_type == SourceType::Module;
    let strict = program.source_type == SourceType::Module || has_directive(&program.body, "use strict");
    let mut last = walk::count_nodes(program);
    for pass in 1..=options.passes.max(1) {
        let mut tree = resolve(program, resolve_options)?;
        if options.reduce_vars {
            mark_fixed(program, &mut tree, toplevel);
        }
        let mut compressor = Compressor::new(options, &tree, toplevel, resolve_options.ie8, strict, &mut diag);
        walk::rewrite_program(&mut compressor, program);
        if options.unused {
            let tree = resolve(program, resolve_options)?;
            unused::drop_unused(program, &tree, options, toplevel, &mut diag);
        }
        let nodes = walk::count_nodes(program);
        debug!(pass, nodes, "compress pass");
        if nodes >= last {
            break;
        }
        last = nodes;
    }
    Ok(diag.warnings)
}

/// Move the expression out of `slot`, leaving `void 0` behind.
pub(crate) fn take(slot: &mut Expr) -> Expr {
    let loc = slot.loc();
    std::mem::replace(slot, Expr::undefined(loc))
}

/// A literal expression for a `global_defs` value.
pub(crate) fn json_to_expr(value: &serde_json::Value, loc: Span) -> Expr {
    match value {
        serde_json::Value::Null => Expr::Null(NullLit { loc }),
        serde_json::Value::Bool(b) => Expr::bool(*b, loc),
        serde_json::Value::Number(n) => number_expr(n.as_f64().unwrap_or(f64::NAN), loc),
        serde_json::Value::String(s) => Expr::str(s.clone(), loc),
        serde_json::Value::Array(items) => Expr::Array(Box::new(ArrayExpr {
            loc,
            elements: items.iter().map(|v| Some(json_to_expr(v, loc))).collect(),
        })),
        serde_json::Value::Object(map) => Expr::Object(Box::new(ObjectExpr {
            loc,
            properties: map
                .iter()
                .map(|(k, v)| {
                    let key = if is_identifier_name(k) {
                        PropKey::Ident(Ident::new(k.clone(), loc))
                    } else {
                        PropKey::Str(StringLit::new(k.clone(), loc))
                    };
                    ObjectProp::Prop(Box::new(Prop {
                        loc,
                        key,
                        value: PropValue::Value(Box::new(json_to_expr(v, loc))),
                    }))
                })
                .collect(),
        })),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Compressor
// ─────────────────────────────────────────────────────────────────────────────

/// State of one rewrite round.
pub(crate) struct Compressor<'a> {
    options: &'a CompressOptions,
    tree: &'a ScopeTree,
    purity: Purity<'a>,
    toplevel: bool,
    ie8: bool,
    diag: &'a mut Diagnostics,
    /// Strictness of each enclosing function, innermost last.
    strict: Vec<bool>,
    /// Number of declared symbols per name.
    declared: FxHashMap<&'a str, usize>,
    /// Functions whose bodies are being expanded at a call site.
    inlining: Vec<SymbolId>,
}

impl<'a> Compressor<'a> {
    fn new(
        options: &'a CompressOptions,
        tree: &'a ScopeTree,
        toplevel: bool,
        ie8: bool,
        strict: bool,
        diag: &'a mut Diagnostics,
    ) -> Self {
        let mut declared = FxHashMap::default();
        for def in tree.symbols.iter().filter(|d| !d.undeclared) {
            *declared.entry(def.name.as_str()).or_insert(0) += 1;
        }
        Compressor {
            options,
            tree,
            purity: Purity::new(options, tree),
            toplevel,
            ie8,
            diag,
            strict: vec![strict],
            declared,
            inlining: Vec::new(),
        }
    }

    fn in_strict(&self) -> bool {
        self.strict.last().copied().unwrap_or(false)
    }

    fn eval_env(&self) -> EvalEnv<'a> {
        EvalEnv {
            tree: Some(self.tree),
            unsafe_: self.options.unsafe_,
        }
    }

    fn is_undeclared(&self, ident: &Ident) -> bool {
        self.tree.symbol_of(ident).is_none_or(|d| d.undeclared)
    }

    // ── Boolean context ──────────────────────────────────────────────────

    /// Simplify an expression whose value is only tested for truthiness.
    fn optimize_bool(&self, expr: &mut Expr) {
        if !self.options.booleans {
            return;
        }
        match expr {
            Expr::Unary(u) if u.op == UnaryOp::Not => {
                if let Expr::Unary(inner) = &mut *u.argument
                    && inner.op == UnaryOp::Not
                {
                    let mut value = take(&mut inner.argument);
                    self.optimize_bool(&mut value);
                    *expr = value;
                }
            }
            Expr::Logical(l) if l.op != LogicalOp::NullishCoalesce => {
                self.optimize_bool(&mut l.left);
                self.optimize_bool(&mut l.right);
            }
            Expr::Conditional(c) => {
                self.optimize_bool(&mut c.consequent);
                self.optimize_bool(&mut c.alternate);
            }
            Expr::Sequence(s) => {
                if let Some(last) = s.expressions.last_mut() {
                    self.optimize_bool(last);
                }
            }
            _ => {}
        }
    }

    /// `!expr` in boolean context, folded where an operator can absorb the
    /// negation.
    fn negate(&self, expr: Expr) -> Expr {
        match expr {
            Expr::Unary(u) if u.op == UnaryOp::Not => *u.argument,
            Expr::Binary(mut b) if self.options.comparisons && b.op.negated().is_some() => {
                if let Some(op) = b.op.negated() {
                    b.op = op;
                }
                Expr::Binary(b)
            }
            other => Expr::not(other),
        }
    }

    // ── Expressions ──────────────────────────────────────────────────────

    /// The replacement for `expr`, if any rule fires.
    fn optimize_expr(&mut self, expr: &mut Expr) -> Option<Expr> {
        let replacement = match expr {
            Expr::Bool(b) if self.options.booleans => {
                Some(Expr::not(Expr::num(if b.value { 0.0 } else { 1.0 }, b.loc)))
            }
            Expr::Ident(i) => self.optimize_ident(i),
            Expr::Member(m) => self.optimize_member(m),
            Expr::Object(o) => {
                if self.options.properties {
                    self.unquote_keys(o);
                }
                None
            }
            Expr::Unary(u) => self.optimize_unary(u),
            Expr::Binary(b) => self.optimize_binary(b),
            Expr::Logical(l) => self.optimize_logical(l),
            Expr::Conditional(c) => self.optimize_conditional(c),
            Expr::Call(c) => self.optimize_call(c),
            Expr::Sequence(s) => self.optimize_sequence(s),
            _ => None,
        };
        if replacement.is_some() {
            return replacement;
        }
        if self.options.evaluate {
            return self.try_evaluate(expr);
        }
        None
    }

    fn optimize_ident(&self, ident: &Ident) -> Option<Expr> {
        let def = self.tree.symbol_of(ident)?;
        if def.undeclared {
            if let Some(value) = self.options.global_defs.get(&ident.name) {
                return Some(json_to_expr(value, ident.loc));
            }
            return match ident.name.as_str() {
                "undefined" if def.assignments == 0 => Some(Expr::undefined(ident.loc)),
                "Infinity" if def.assignments == 0 => Some(number_expr(f64::INFINITY, ident.loc)),
                _ => None,
            };
        }
        if !self.options.reduce_vars {
            return None;
        }
        let fixed = def.fixed.as_ref()?;
        if !fixed.is_constant_literal() {
            return None;
        }
        let text = crate::printer::expr_to_string(fixed);
        if text.len() <= self.options.reduce_vars_inline_max_len || def.references.len() == 1 {
            trace!(name = %ident.name, value = %text, "propagate constant");
            let mut value = fixed.clone();
            relocate(&mut value, ident.loc);
            return Some(value);
        }
        None
    }

    fn optimize_member(&mut self, m: &mut MemberExpr) -> Option<Expr> {
        if !self.options.global_defs.is_empty()
            && let Some(name) = callee_name(&Expr::Member(Box::new(m.clone())))
            && let Some(value) = self.options.global_defs.get(&name)
            && root_ident(&m.object).is_some_and(|i| self.is_undeclared(i))
        {
            return Some(json_to_expr(value, m.loc));
        }
        self.unquote_member(m);
        None
    }

    /// `a["b"]` → `a.b`, `a["0"]` → `a[0]`.
    fn unquote_member(&self, m: &mut MemberExpr) {
        if !self.options.properties {
            return;
        }
        let MemberProp::Computed(prop) = &m.property else { return };
        let Expr::Str(s) = &**prop else { return };
        if s.raw.is_some() {
            return;
        }
        if is_identifier_name(&s.value) && !(self.ie8 && is_reserved_word(&s.value)) {
            m.property = MemberProp::Ident(Ident::new(s.value.clone(), s.loc));
        } else if let Some(n) = canonical_index(&s.value) {
            m.property = MemberProp::Computed(Box::new(Expr::num(n, s.loc)));
        }
    }

    fn unquote_keys(&self, object: &mut ObjectExpr) {
        for prop in &mut object.properties {
            let ObjectProp::Prop(p) = prop else { continue };
            let (name, loc) = match &p.key {
                PropKey::Str(s) if s.raw.is_none() => (s.value.clone(), s.loc),
                PropKey::Computed(e) => match &**e {
                    Expr::Str(s) if s.raw.is_none() && s.value != "__proto__" => (s.value.clone(), s.loc),
                    _ => continue,
                },
                _ => continue,
            };
            if is_identifier_name(&name) && !(self.ie8 && is_reserved_word(&name)) {
                p.key = PropKey::Ident(Ident::new(name, loc));
            } else if let Some(n) = canonical_index(&name) {
                p.key = PropKey::Num(NumLit { loc, value: n });
            }
        }
    }

    fn optimize_unary(&mut self, u: &mut UnaryExpr) -> Option<Expr> {
        match u.op {
            UnaryOp::Not => {
                if self.options.comparisons
                    && let Expr::Binary(b) = &mut *u.argument
                    && let Some(op) = b.op.negated()
                {
                    b.op = op;
                    return Some(take(&mut u.argument));
                }
                self.optimize_bool(&mut u.argument);
                None
            }
            UnaryOp::Void if self.options.side_effects && !u.argument.is_constant_literal() => {
                match self.purity.drop_unused(take(&mut u.argument)) {
                    None => Some(Expr::undefined(u.loc)),
                    Some(kept) => {
                        *u.argument = kept;
                        None
                    }
                }
            }
            _ => None,
        }
    }

    fn optimize_binary(&mut self, b: &mut BinaryExpr) -> Option<Expr> {
        if self.options.typeofs
            && let Some(shorter) = self.typeof_undefined(b)
        {
            return Some(shorter);
        }
        if self.options.comparisons && matches!(b.op, BinaryOp::StrictEq | BinaryOp::StrictNotEq) {
            let (l, r) = (static_type(&b.left), static_type(&b.right));
            if l.is_some() && l == r {
                b.op = if b.op == BinaryOp::StrictEq {
                    BinaryOp::Eq
                } else {
                    BinaryOp::NotEq
                };
            }
        }
        None
    }

    /// `typeof x == "undefined"` → `x === void 0` for declared `x`, or
    /// `typeof x > "u"` for globals that may be missing.
    fn typeof_undefined(&self, b: &mut BinaryExpr) -> Option<Expr> {
        if !b.op.is_equality() {
            return None;
        }
        let (typeof_side, other) = if is_typeof(&b.left) {
            (&mut b.left, &b.right)
        } else if is_typeof(&b.right) {
            (&mut b.right, &b.left)
        } else {
            return None;
        };
        if !matches!(&**other, Expr::Str(s) if s.value == "undefined") {
            return None;
        }
        let equal = matches!(b.op, BinaryOp::Eq | BinaryOp::StrictEq);
        let Expr::Unary(u) = &mut **typeof_side else { return None };
        let Expr::Ident(ident) = &*u.argument else { return None };
        if self.is_undeclared(ident) {
            let op = if equal { BinaryOp::Gt } else { BinaryOp::Lt };
            let operand = take(typeof_side);
            return Some(Expr::binary(op, operand, Expr::str("u", b.loc)));
        }
        let op = if equal {
            BinaryOp::StrictEq
        } else {
            BinaryOp::StrictNotEq
        };
        let ident = Expr::Ident(ident.clone());
        Some(Expr::binary(op, ident, Expr::undefined(b.loc)))
    }

    fn optimize_logical(&mut self, l: &mut LogicalExpr) -> Option<Expr> {
        if !self.options.conditionals && !self.options.evaluate {
            return None;
        }
        let env = self.eval_env();
        let short_circuits = match l.op {
            LogicalOp::And => !truthiness(&l.left, &env)?,
            LogicalOp::Or => truthiness(&l.left, &env)?,
            LogicalOp::NullishCoalesce => match evaluate(&l.left, &env).ok()?? {
                Value::Null | Value::Undefined => false,
                _ => true,
            },
        };
        if short_circuits {
            return Some(take(&mut l.left));
        }
        if self.purity.has_side_effects(&l.left) {
            return None;
        }
        Some(take(&mut l.right))
    }

    fn optimize_conditional(&mut self, c: &mut ConditionalExpr) -> Option<Expr> {
        if !self.options.conditionals {
            return None;
        }
        self.optimize_bool(&mut c.test);
        if let Some(t) = truthiness(&c.test, &self.eval_env())
            && !self.purity.has_side_effects(&c.test)
        {
            return Some(if t { take(&mut c.consequent) } else { take(&mut c.alternate) });
        }
        if let Expr::Unary(u) = &mut *c.test
            && u.op == UnaryOp::Not
        {
            let inner = take(&mut u.argument);
            *c.test = inner;
            std::mem::swap(&mut c.consequent, &mut c.alternate);
        }
        if self.options.booleans {
            match (as_bool(&c.consequent), as_bool(&c.alternate)) {
                (Some(true), Some(false)) => return Some(Expr::not(Expr::not(take(&mut c.test)))),
                (Some(false), Some(true)) => return Some(Expr::not(take(&mut c.test))),
                _ => {}
            }
        }
        None
    }

    fn optimize_call(&mut self, c: &mut CallExpr) -> Option<Expr> {
        if self.options.drop_console && callee_name(&c.callee).is_some_and(|n| n.starts_with("console.")) {
            trace!("drop console call");
            return Some(Expr::undefined(c.loc));
        }
        if self.options.inline >= 1
            && self.options.reduce_vars
            && let Some((id, mut value)) = inline::inline_call(c, self.tree, &self.declared, &self.inlining)
        {
            self.inlining.push(id);
            walk::rewrite_expr(self, &mut value);
            self.inlining.pop();
            return Some(value);
        }
        None
    }

    fn optimize_sequence(&mut self, s: &mut SequenceExpr) -> Option<Expr> {
        if !self.options.side_effects || s.expressions.len() < 2 {
            return None;
        }
        let Some(last) = s.expressions.pop() else { return None };
        let mut kept: Vec<Expr> = std::mem::take(&mut s.expressions)
            .into_iter()
            .filter_map(|e| self.purity.drop_unused(e))
            .collect();
        if kept.is_empty() && keeps_this_detached(&last) {
            kept.push(Expr::num(0.0, s.loc));
        }
        kept.push(last);
        Some(Expr::sequence(kept))
    }

    /// Fold `expr` to a literal when that does not make the output longer.
    fn try_evaluate(&mut self, expr: &Expr) -> Option<Expr> {
        if expr.is_constant_literal() || matches!(expr, Expr::Ident(_) | Expr::Str(_) | Expr::Num(_)) {
            return None;
        }
        match evaluate(expr, &self.eval_env()) {
            Ok(Some(value)) => {
                let folded = value.to_expr(expr.loc(), self.options.booleans);
                let before = crate::printer::expr_to_string(expr);
                let after = crate::printer::expr_to_string(&folded);
                if after.len() <= before.len() && after != before {
                    trace!(%before, %after, "fold constant");
                    return Some(folded);
                }
                None
            }
            Ok(None) => None,
            Err(err) => {
                let text = crate::printer::expr_to_string(expr);
                self.diag
                    .warn(format!("Error evaluating {text}: {}", err.0), expr.loc());
                None
            }
        }
    }
}

impl Rewriter for Compressor<'_> {
    fn before_expr(&mut self, expr: &mut Expr) -> RewriteAction<Expr> {
        match expr {
            // Write targets keep their spelling.
            Expr::Assign(a) if matches!(&a.left, AssignTarget::Expr(t) if matches!(**t, Expr::Ident(_))) => {
                walk::rewrite_expr(self, &mut a.right);
                RewriteAction::StopDescent
            }
            Expr::Update(u) if matches!(*u.argument, Expr::Ident(_)) => RewriteAction::StopDescent,
            Expr::Unary(u) if u.op == UnaryOp::Delete && matches!(*u.argument, Expr::Ident(_)) => {
                RewriteAction::StopDescent
            }
            _ => RewriteAction::Keep,
        }
    }

    fn after_expr(&mut self, expr: &mut Expr) -> RewriteAction<Expr> {
        if let Expr::Assign(a) = expr
            && let AssignTarget::Expr(target) = &mut a.left
            && let Expr::Member(m) = &mut **target
        {
            self.unquote_member(m);
        }
        match self.optimize_expr(expr) {
            Some(new) => RewriteAction::Replace(new),
            None => RewriteAction::Keep,
        }
    }

    fn after_stmt(&mut self, stmt: &mut Stmt) -> RewriteAction<Stmt> {
        self.optimize_stmt(stmt)
    }

    fn after_stmts(&mut self, stmts: &mut Vec<Stmt>, kind: BodyKind) {
        self.optimize_body(stmts, kind);
    }

    fn enter_function(&mut self, function: &mut Function) -> bool {
        if function.has_directive("use asm") {
            return false;
        }
        let strict = self.in_strict() || function.has_directive("use strict");
        self.strict.push(strict);
        true
    }

    fn leave_function(&mut self, _function: &mut Function) {
        self.strict.pop();
    }

    fn enter_arrow(&mut self, _arrow: &mut ArrowExpr) -> bool {
        let strict = self.in_strict();
        self.strict.push(strict);
        true
    }

    fn leave_arrow(&mut self, _arrow: &mut ArrowExpr) {
        self.strict.pop();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn is_typeof(expr: &Expr) -> bool {
    matches!(expr, Expr::Unary(u) if u.op == UnaryOp::Typeof)
}

/// `true`/`false` written either way.
fn as_bool(expr: &Expr) -> Option<bool> {
    match expr {
        Expr::Bool(b) => Some(b.value),
        Expr::Unary(u) if u.op == UnaryOp::Not => match &*u.argument {
            Expr::Num(n) => Some(n.value == 0.0),
            _ => None,
        },
        _ => None,
    }
}

/// The `typeof` an expression always produces, when known statically.
fn static_type(expr: &Expr) -> Option<&'static str> {
    match expr {
        Expr::Str(_) | Expr::Template(_) => Some("string"),
        Expr::Num(_) => Some("number"),
        Expr::Bool(_) => Some("boolean"),
        Expr::Unary(u) => match u.op {
            UnaryOp::Typeof => Some("string"),
            UnaryOp::Not | UnaryOp::Delete => Some("boolean"),
            UnaryOp::Void => Some("undefined"),
            UnaryOp::Minus | UnaryOp::Plus | UnaryOp::BitNot => {
                matches!(&*u.argument, Expr::Num(_)).then_some("number")
            }
        },
        Expr::Binary(b) if b.op.is_boolean() => Some("boolean"),
        _ => None,
    }
}

/// The identifier at the root of a member chain.
fn root_ident(expr: &Expr) -> Option<&Ident> {
    match expr {
        Expr::Ident(i) => Some(i),
        Expr::Member(m) => root_ident(&m.object),
        _ => None,
    }
}

/// `"12"` → `12`: strings that spell an array index exactly.
fn canonical_index(s: &str) -> Option<f64> {
    if s.is_empty() || s.len() > 15 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: f64 = s.parse().ok()?;
    (number_to_string(n) == s).then_some(n)
}

/// The last operand of `(0, x)` whose removal would change `this` or
/// turn an indirect `eval` direct.
fn keeps_this_detached(last: &Expr) -> bool {
    matches!(last, Expr::Member(_)) || matches!(last, Expr::Ident(i) if i.name == "eval")
}

/// Point every location of a copied literal at its new home.
fn relocate(expr: &mut Expr, loc: Span) {
    match expr {
        Expr::Null(n) => n.loc = loc,
        Expr::Bool(b) => b.loc = loc,
        Expr::Num(n) => n.loc = loc,
        Expr::Str(s) => s.loc = loc,
        Expr::BigInt(b) => b.loc = loc,
        Expr::Unary(u) => {
            u.loc = loc;
            relocate(&mut u.argument, loc);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser::{parse, ParseOptions};
    use crate::printer::{print, OutputOptions};

    fn compress_with(src: &str, options: &CompressOptions) -> String {
        let mut program = parse(src, &ParseOptions::default()).unwrap();
        compress(&mut program, options, &ResolveOptions::default()).unwrap();
        print(&program, &OutputOptions::default(), None)
    }

    fn squash(src: &str) -> String {
        compress_with(src, &CompressOptions::default())
    }

    fn toplevel() -> CompressOptions {
        CompressOptions {
            toplevel: true,
            ..CompressOptions::default()
        }
    }

    #[test]
    fn test_inline_and_drop_everything() {
        let src = "var a = 1; var b = 2; function f(){ return a + b; } f();";
        assert_eq!(compress_with(src, &toplevel()), "");
    }

    #[test]
    fn test_constant_condition() {
        assert_eq!(
            squash("if (true) { console.log(1); } else { console.log(2); }"),
            "console.log(1);"
        );
    }

    #[test]
    fn test_booleans_and_undefined() {
        assert_eq!(squash("x = true; y = false; z = undefined;"), "x=!0,y=!1,z=void 0;");
    }

    #[test]
    fn test_fold_constants() {
        assert_eq!(squash("x = 1 + 2 * 3; y = 'a' + 'b';"), "x=7,y=\"ab\";");
        assert_eq!(squash("x = 1 / 3;"), "x=1/3;");
    }

    #[test]
    fn test_property_access() {
        assert_eq!(squash("a['b'] = a['0'] + a['c d'];"), "a.b=a[0]+a[\"c d\"];");
        assert_eq!(squash("x = {'a': 1, 'b c': 2, '1': 3};"), "x={a:1,\"b c\":2,1:3};");
    }

    #[test]
    fn test_assignment_target_unquoted() {
        assert_eq!(squash("o['b'] = 1; o['c'] += 2; o['0'] = 3;"), "o.b=1,o.c+=2,o[0]=3;");
    }

    #[test]
    fn test_typeof_comparisons() {
        assert_eq!(squash("x = typeof y == 'undefined';"), "x=typeof y>\"u\";");
        assert_eq!(squash("x = typeof y !== 'undefined';"), "x=typeof y<\"u\";");
        assert_eq!(
            squash("function f(a){ return typeof a === 'undefined'; }"),
            "function f(a){return a===void 0}"
        );
        assert_eq!(squash("x = typeof y === 'string';"), "x=typeof y==\"string\";");
    }

    #[test]
    fn test_negated_comparison() {
        assert_eq!(squash("x = !(a === b);"), "x=a!==b;");
    }

    #[test]
    fn test_conditional_rules() {
        assert_eq!(squash("x = a ? true : false;"), "x=!!a;");
        assert_eq!(squash("x = !a ? b : c;"), "x=a?c:b;");
    }

    #[test]
    fn test_global_defs() {
        let options: CompressOptions =
            serde_json::from_str(r#"{"global_defs": {"DEBUG": false, "process.env.MODE": "prod"}}"#).unwrap();
        assert_eq!(
            compress_with("if (DEBUG) { log(); } x = process.env.MODE;", &options),
            "x=\"prod\";"
        );
    }

    #[test]
    fn test_drop_console_and_debugger() {
        let options = CompressOptions {
            drop_console: true,
            ..CompressOptions::default()
        };
        assert_eq!(compress_with("console.log(1); debugger; f();", &options), "f();");
    }

    #[test]
    fn test_pure_funcs_dropped_when_unused() {
        let options = CompressOptions {
            pure_funcs: vec!["Math.floor".into()],
            ..CompressOptions::default()
        };
        assert_eq!(compress_with("Math.floor(1); Math.floor(a); g();", &options), "a,g();");
    }

    #[test]
    fn test_unsafe_builtin_error_warns() {
        let options = CompressOptions {
            unsafe_: true,
            ..CompressOptions::default()
        };
        let mut program = parse("x = 'a'.repeat(-1);", &ParseOptions::default()).unwrap();
        let warnings = compress(&mut program, &options, &ResolveOptions::default()).unwrap();
        assert!(warnings.iter().any(|w| w.message.starts_with("Error evaluating")));
        assert_eq!(print(&program, &OutputOptions::default(), None), "x=\"a\".repeat(-1);");
    }

    #[test]
    fn test_use_asm_left_alone() {
        let src = "function f(){ 'use asm'; var a = 1 + 2; return a; }";
        assert_eq!(squash(src), "function f(){\"use asm\";var a=1+2;return a}");
    }

    #[test]
    fn test_iife_negated() {
        assert_eq!(squash("(function(){ g(); })();"), "!function(){g()}();");
    }

    #[test]
    fn test_sequence_keeps_detached_this() {
        assert_eq!(squash("(0, a.b)(); (1, 2, f)();"), "(0,a.b)(),f();");
    }

    #[test]
    fn test_passes_bounded() {
        let options = CompressOptions {
            passes: 1,
            ..CompressOptions::default()
        };
        assert_eq!(compress_with("var x = 1;", &options), "var x=1;");
    }

    #[test]
    fn test_recompress_is_stable() {
        let src = "function f(a){ if (a) { return 1; } else { return 2; } } f(x);";
        let once = squash(src);
        assert_eq!(squash(&once), once);
    }
}
