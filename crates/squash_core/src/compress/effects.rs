//! Side-effect analysis.
//!
//! [`Purity::has_side_effects`] answers whether evaluating an expression can
//! be observed (a call, an assignment, a throwing global read, a getter);
//! [`Purity::drop_unused`] shrinks an expression whose value is discarded to
//! the parts that still have to run.

use crate::compress::options::CompressOptions;
use crate::parser::ast::*;
use crate::parser::scope::ScopeTree;

/// Globals that are always defined, so reading them cannot throw.
const KNOWN_GLOBALS: &[&str] = &[
    "Array", "ArrayBuffer", "BigInt", "Boolean", "DataView", "Date", "Error", "EvalError",
    "Float32Array", "Float64Array", "Function", "Infinity", "Int8Array", "Int16Array",
    "Int32Array", "JSON", "Map", "Math", "NaN", "Number", "Object", "Promise", "Proxy",
    "RangeError", "ReferenceError", "Reflect", "RegExp", "Set", "String", "Symbol",
    "SyntaxError", "TypeError", "URIError", "Uint8Array", "Uint8ClampedArray", "Uint16Array",
    "Uint32Array", "WeakMap", "WeakSet", "decodeURI", "decodeURIComponent", "encodeURI",
    "encodeURIComponent", "escape", "eval", "globalThis", "isFinite", "isNaN", "parseFloat",
    "parseInt", "undefined", "unescape",
];

/// Purity oracle for one compressor pass.
#[derive(Clone, Copy)]
pub struct Purity<'a> {
    tree: &'a ScopeTree,
    pure_getters: bool,
    pure_funcs: &'a [String],
}

impl<'a> Purity<'a> {
    pub fn new(options: &'a CompressOptions, tree: &'a ScopeTree) -> Self {
        Purity {
            tree,
            pure_getters: options.pure_getters,
            pure_funcs: &options.pure_funcs,
        }
    }

    /// `true` when reading `ident` may throw or run user code.
    fn ident_has_effects(&self, ident: &Ident) -> bool {
        match self.tree.symbol_of(ident) {
            Some(def) if !def.undeclared => false,
            _ => !KNOWN_GLOBALS.contains(&ident.name.as_str()),
        }
    }

    /// `true` for calls known to have no effects besides their arguments.
    pub fn is_pure_call(&self, callee: &Expr, annotated: bool) -> bool {
        if annotated {
            return true;
        }
        match callee_name(callee) {
            Some(name) => self.pure_funcs.iter().any(|f| *f == name),
            None => false,
        }
    }

    fn any_effects<'e>(&self, mut exprs: impl Iterator<Item = &'e Expr>) -> bool {
        exprs.any(|e| self.has_side_effects(e))
    }

    fn key_has_effects(&self, key: &PropKey) -> bool {
        matches!(key, PropKey::Computed(e) if self.has_side_effects(e))
    }

    /// `true` when evaluating `expr` can be observed.
    pub fn has_side_effects(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Null(_)
            | Expr::Bool(_)
            | Expr::Num(_)
            | Expr::Str(_)
            | Expr::BigInt(_)
            | Expr::Regexp(_)
            | Expr::This(_)
            | Expr::MetaProp(_)
            | Expr::Fn(_)
            | Expr::Arrow(_) => false,
            Expr::Ident(i) => self.ident_has_effects(i),
            Expr::Template(t) => self.any_effects(t.expressions.iter()),
            Expr::Array(a) => a.elements.iter().flatten().any(|e| self.has_side_effects(e)),
            Expr::Object(o) => o.properties.iter().any(|p| match p {
                ObjectProp::Prop(p) => {
                    self.key_has_effects(&p.key)
                        || matches!(&p.value, PropValue::Value(v) if self.has_side_effects(v))
                }
                ObjectProp::Spread(_) => true,
            }),
            Expr::Class(c) => self.class_has_side_effects(c),
            Expr::Unary(u) => match (u.op, &*u.argument) {
                (UnaryOp::Delete, _) => true,
                (UnaryOp::Typeof, Expr::Ident(_)) => false,
                _ => self.has_side_effects(&u.argument),
            },
            Expr::Binary(b) => {
                matches!(b.op, BinaryOp::In | BinaryOp::Instanceof)
                    || self.has_side_effects(&b.left)
                    || self.has_side_effects(&b.right)
            }
            Expr::Logical(l) => self.has_side_effects(&l.left) || self.has_side_effects(&l.right),
            Expr::Conditional(c) => {
                self.has_side_effects(&c.test)
                    || self.has_side_effects(&c.consequent)
                    || self.has_side_effects(&c.alternate)
            }
            Expr::Sequence(s) => self.any_effects(s.expressions.iter()),
            Expr::Member(m) => {
                if !self.pure_getters && !is_safe_member(m) {
                    return true;
                }
                self.has_side_effects(&m.object)
                    || matches!(&m.property, MemberProp::Computed(p) if self.has_side_effects(p))
            }
            Expr::Call(c) => {
                !self.is_pure_call(&c.callee, c.pure)
                    || c.arguments.iter().any(|a| matches!(a, Expr::Spread(_)) || self.has_side_effects(a))
                    || callee_object_has_effects(self, &c.callee)
            }
            Expr::New(n) => {
                !self.is_pure_call(&n.callee, n.pure)
                    || n.arguments.iter().any(|a| matches!(a, Expr::Spread(_)) || self.has_side_effects(a))
            }
            Expr::Chain(c) => self.has_side_effects(&c.expr),
            Expr::Super(_)
            | Expr::Update(_)
            | Expr::Assign(_)
            | Expr::TaggedTemplate(_)
            | Expr::Spread(_)
            | Expr::Yield(_)
            | Expr::Await(_)
            | Expr::Import(_) => true,
        }
    }

    /// `true` when defining `class` runs code: an effectful heritage,
    /// computed key, static initializer or static block.
    pub fn class_has_side_effects(&self, class: &Class) -> bool {
        class.super_class.as_ref().is_some_and(|s| self.has_side_effects(s))
            || class.body.iter().any(|m| match m {
                ClassMember::Method(m) => self.key_has_effects(&m.key),
                ClassMember::Property(p) => {
                    self.key_has_effects(&p.key)
                        || (p.is_static && p.value.as_ref().is_some_and(|v| self.has_side_effects(v)))
                }
                ClassMember::StaticBlock(_) => true,
            })
    }

    /// Reduce `expr`, whose value is unused, to what must still be
    /// evaluated; `None` when nothing is left.
    pub fn drop_unused(&self, expr: Expr) -> Option<Expr> {
        if !self.has_side_effects(&expr) {
            return None;
        }
        match expr {
            Expr::Sequence(s) => {
                let rest: Vec<Expr> = s
                    .expressions
                    .into_iter()
                    .filter_map(|e| self.drop_unused(e))
                    .collect();
                if rest.is_empty() { None } else { Some(Expr::sequence(rest)) }
            }
            Expr::Binary(b) if !matches!(b.op, BinaryOp::In | BinaryOp::Instanceof) => {
                let b = *b;
                self.join(vec![*b.left, *b.right])
            }
            Expr::Logical(l) => {
                let l = *l;
                match self.drop_unused(*l.right) {
                    None => self.drop_unused(*l.left),
                    Some(right) => Some(Expr::logical(l.op, *l.left, right)),
                }
            }
            Expr::Conditional(c) => {
                let c = *c;
                let cons = self.drop_unused(*c.consequent);
                let alt = self.drop_unused(*c.alternate);
                match (cons, alt) {
                    (None, None) => self.drop_unused(*c.test),
                    (Some(cons), None) => Some(Expr::logical(LogicalOp::And, *c.test, cons)),
                    (None, Some(alt)) => Some(Expr::logical(LogicalOp::Or, *c.test, alt)),
                    (Some(cons), Some(alt)) => Some(Expr::conditional(*c.test, cons, alt)),
                }
            }
            Expr::Unary(u) if !matches!(u.op, UnaryOp::Delete) => self.drop_unused(*u.argument),
            Expr::Call(c)
                if self.is_pure_call(&c.callee, c.pure)
                    && !c.arguments.iter().any(|a| matches!(a, Expr::Spread(_))) =>
            {
                let c = *c;
                let mut parts = Vec::new();
                if callee_object_has_effects(self, &c.callee)
                    && let Expr::Member(m) = *c.callee
                {
                    parts.push(*m.object);
                }
                parts.extend(c.arguments);
                self.join(parts)
            }
            Expr::Array(a) if a.elements.iter().flatten().all(|e| !matches!(e, Expr::Spread(_))) => {
                self.join(a.elements.into_iter().flatten().collect())
            }
            Expr::Template(t) => {
                let t = *t;
                self.join(t.expressions)
            }
            Expr::Member(m) if self.pure_getters => {
                let m = *m;
                let mut parts = vec![*m.object];
                if let MemberProp::Computed(p) = m.property {
                    parts.push(*p);
                }
                self.join(parts)
            }
            other => Some(other),
        }
    }

    fn join(&self, parts: Vec<Expr>) -> Option<Expr> {
        let rest: Vec<Expr> = parts.into_iter().filter_map(|e| self.drop_unused(e)).collect();
        if rest.is_empty() { None } else { Some(Expr::sequence(rest)) }
    }
}

/// Member reads that cannot run a getter: `"str".length` and the like.
fn is_safe_member(m: &MemberExpr) -> bool {
    matches!(
        (&*m.object, &m.property),
        (Expr::Str(_) | Expr::Template(_), MemberProp::Ident(p)) if p.name == "length"
    )
}

/// Evaluating `a.b` to find the callee of `a.b()` may itself have effects.
/// Named callees are trusted as far as their dotted path goes.
fn callee_object_has_effects(purity: &Purity<'_>, callee: &Expr) -> bool {
    match callee {
        Expr::Ident(_) | Expr::This(_) => false,
        Expr::Member(m) => {
            callee_object_has_effects(purity, &m.object)
                || matches!(&m.property, MemberProp::Computed(p) if purity.has_side_effects(p))
        }
        other => purity.has_side_effects(other),
    }
}

/// Dotted name of a callee, e.g. `Math.floor` or `console.log`.
pub fn callee_name(callee: &Expr) -> Option<String> {
    match callee {
        Expr::Ident(i) => Some(i.name.clone()),
        Expr::Member(m) => match &m.property {
            MemberProp::Ident(p) => callee_name(&m.object).map(|o| format!("{o}.{}", p.name)),
            _ => None,
        },
        Expr::This(_) => Some("this".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser::{parse, ParseOptions};
    use crate::parser::scope::{resolve, ResolveOptions};

    fn with_last_expr<R>(src: &str, options: &CompressOptions, f: impl FnOnce(&Purity<'_>, Expr) -> R) -> R {
        let mut program = parse(src, &ParseOptions::default()).unwrap();
        let tree = resolve(&mut program, &ResolveOptions::default()).unwrap();
        let Some(Stmt::Expr(e)) = program.body.pop() else { panic!("expected expression") };
        let purity = Purity::new(options, &tree);
        f(&purity, *e.expr)
    }

    fn effects(src: &str) -> bool {
        with_last_expr(src, &CompressOptions::default(), |p, e| p.has_side_effects(&e))
    }

    #[test]
    fn test_literals_are_pure() {
        assert!(!effects("1 + 'a'"));
        assert!(!effects("[1, 2, {a: 3}]"));
        assert!(!effects("(function(){ sideEffect(); })"));
        assert!(!effects("var x; x"));
        assert!(!effects("typeof undeclared"));
    }

    #[test]
    fn test_effectful_forms() {
        assert!(effects("f()"));
        assert!(effects("undeclared"));
        assert!(effects("a.b"));
        assert!(effects("x = 1"));
        assert!(effects("delete a.b"));
        assert!(effects("'a' in o"));
        assert!(!effects("Math"));
    }

    #[test]
    fn test_pure_getters_and_pure_funcs() {
        let opts = CompressOptions {
            pure_getters: true,
            pure_funcs: vec!["Math.floor".into()],
            ..CompressOptions::default()
        };
        assert!(!with_last_expr("var o; o.p", &opts, |p, e| p.has_side_effects(&e)));
        assert!(!with_last_expr("Math.floor(1)", &opts, |p, e| p.has_side_effects(&e)));
        assert!(with_last_expr("Math.floor(f())", &opts, |p, e| p.has_side_effects(&e)));
    }

    #[test]
    fn test_pure_annotation() {
        assert!(!effects("/*@__PURE__*/ make()"));
        assert!(effects("/*@__PURE__*/ make(g())"));
    }

    #[test]
    fn test_drop_unused_keeps_effects() {
        let opts = CompressOptions::default();
        let left = with_last_expr("1 + f()", &opts, |p, e| p.drop_unused(e));
        assert!(matches!(left, Some(Expr::Call(_))));
        let gone = with_last_expr("var a; a, 1, 'x'", &opts, |p, e| p.drop_unused(e));
        assert!(gone.is_none());
        let cond = with_last_expr("var a; a ? f() : 1", &opts, |p, e| p.drop_unused(e));
        assert!(matches!(cond, Some(Expr::Logical(l)) if l.op == LogicalOp::And));
        let pure = with_last_expr("/*#__PURE__*/ make(g(), 1)", &opts, |p, e| p.drop_unused(e));
        assert!(matches!(pure, Some(Expr::Call(c)) if callee_name(&c.callee).as_deref() == Some("g")));
    }

    #[test]
    fn test_callee_name() {
        with_last_expr("console.log.bind(x)", &CompressOptions::default(), |_, e| {
            let Expr::Call(c) = e else { panic!() };
            assert_eq!(callee_name(&c.callee).as_deref(), Some("console.log.bind"));
        });
    }
}
