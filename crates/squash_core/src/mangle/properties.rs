//! Property-name mangling.
//!
//! Properties have no scope: every occurrence of a name anywhere in the
//! program becomes the same short name.  That is only sound for names the
//! program owns, so candidates are filtered by `regex`, the `reserved` list,
//! quoted occurrences (with `keep_quoted`) and, unless `builtins` is set, a
//! list of well-known platform property names.

use indexmap::IndexSet;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SquashError, SquashResult};
use crate::mangle::{Alphabet, NameCache};
use crate::parser::ast::*;
use crate::parser::scanner::is_reserved_word;
use crate::walk::{RewriteAction, Rewriter, Visit, rewrite_program, walk_expr, walk_prop_key};

/// Property mangler configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PropertyMangleOptions {
    /// Only names matching this pattern are renamed.
    pub regex: Option<String>,
    /// Names never renamed.
    pub reserved: Vec<String>,
    /// Never rename a name that appears quoted anywhere (`o["x"]`, `{"x": 1}`).
    pub keep_quoted: bool,
    /// Rename well-known builtin property names too.
    pub builtins: bool,
}

/// Properties of the JavaScript and DOM standard libraries.
const BUILTINS: &[&str] = &[
    "__proto__", "add", "addEventListener", "all", "appendChild", "apply", "arguments", "assign", "bind",
    "call", "callee", "caller", "catch", "ceil", "charAt", "charCodeAt", "clear", "concat", "configurable",
    "console", "constructor", "create", "createElement", "default", "defineProperty", "delete", "document",
    "done", "endsWith", "entries", "enumerable", "error", "every", "exec", "exports", "fill", "filter",
    "finally", "find", "findIndex", "floor", "forEach", "freeze", "from", "get", "getAttribute",
    "getElementById", "getPrototypeOf", "getTime", "has", "hasOwnProperty", "includes", "indexOf",
    "innerHTML", "isArray", "iterator", "join", "keys", "length", "log", "map", "match", "max", "message",
    "min", "name", "next", "now", "of", "padStart", "parse", "pop", "prototype", "push", "querySelector",
    "querySelectorAll", "race", "random", "reduce", "reject", "removeEventListener", "repeat", "replace",
    "resolve", "reverse", "round", "set", "setAttribute", "shift", "size", "slice", "some", "sort",
    "splice", "split", "stack", "startsWith", "stringify", "style", "substring", "test", "textContent",
    "then", "toFixed", "toLowerCase", "toString", "toUpperCase", "trim", "unshift", "value", "valueOf",
    "values", "warn", "window", "writable",
];

/// Rename object properties across the whole program.
///
/// Assignments are recorded in (and, when present, taken from)
/// `cache.props`.
///
/// # Errors
///
/// Returns [`SquashError::Options`] when `regex` does not compile.
pub fn mangle_properties(
    program: &mut Program,
    options: &PropertyMangleOptions,
    cache: &mut NameCache,
) -> SquashResult<()> {
    let regex = options
        .regex
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|e| SquashError::Options(format!("invalid properties regex: {e}")))?;

    let mut seen = Collector::default();
    seen.visit_program(program);

    let mut reserved: FxHashSet<&str> = options.reserved.iter().map(String::as_str).collect();
    if !options.builtins {
        reserved.extend(BUILTINS.iter().copied());
    }
    if options.keep_quoted {
        reserved.extend(seen.quoted.iter().map(String::as_str));
    }
    let mangle = |name: &str| !reserved.contains(name) && regex.as_ref().is_none_or(|re| re.is_match(name));

    let mut taken: FxHashSet<String> = seen.names.iter().filter(|n| !mangle(n.as_str())).cloned().collect();
    taken.extend(cache.props.values().cloned());
    let alphabet = Alphabet::default();
    let mut counter = 0usize;
    let mut renames: FxHashMap<String, String> = FxHashMap::default();
    for name in seen.names.iter().filter(|n| mangle(n.as_str())) {
        let mangled = match cache.props.get(name) {
            Some(cached) => cached.clone(),
            None => loop {
                let candidate = alphabet.name(counter);
                counter += 1;
                if !is_reserved_word(&candidate) && !taken.contains(&candidate) {
                    break candidate;
                }
            },
        };
        taken.insert(mangled.clone());
        cache.props.insert(name.clone(), mangled.clone());
        renames.insert(name.clone(), mangled);
    }

    debug!(renamed = renames.len(), kept = seen.names.len() - renames.len(), "mangled properties");
    if !renames.is_empty() {
        rewrite_program(&mut Renamer { renames }, program);
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Collection
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Collector {
    names: IndexSet<String>,
    quoted: FxHashSet<String>,
}

impl Collector {
    fn add(&mut self, name: &str, quoted: bool) {
        self.names.insert(name.to_string());
        if quoted {
            self.quoted.insert(name.to_string());
        }
    }
}

impl Visit for Collector {
    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::Member(m) = expr {
            match &m.property {
                MemberProp::Ident(p) => self.add(&p.name, false),
                MemberProp::Computed(p) => {
                    if let Expr::Str(s) = &**p {
                        self.add(&s.value, true);
                    }
                }
                MemberProp::Private(_) => {}
            }
        }
        walk_expr(self, expr);
    }

    fn visit_prop_key(&mut self, key: &PropKey) {
        match key {
            PropKey::Ident(i) => self.add(&i.name, false),
            PropKey::Str(s) => self.add(&s.value, true),
            _ => {}
        }
        walk_prop_key(self, key);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Renaming
// ─────────────────────────────────────────────────────────────────────────────

struct Renamer {
    renames: FxHashMap<String, String>,
}

impl Renamer {
    fn key(&self, key: &mut PropKey) {
        match key {
            PropKey::Ident(i) => {
                if let Some(new) = self.renames.get(&i.name) {
                    i.name.clone_from(new);
                }
            }
            PropKey::Str(s) => {
                if let Some(new) = self.renames.get(&s.value) {
                    *s = StringLit::new(new.clone(), s.loc);
                }
            }
            _ => {}
        }
    }

    fn member(&self, m: &mut MemberExpr) {
        match &mut m.property {
            MemberProp::Ident(p) => {
                if let Some(new) = self.renames.get(&p.name) {
                    p.name.clone_from(new);
                }
            }
            MemberProp::Computed(p) => {
                if let Expr::Str(s) = &mut **p
                    && let Some(new) = self.renames.get(&s.value)
                {
                    *s = StringLit::new(new.clone(), s.loc);
                }
            }
            MemberProp::Private(_) => {}
        }
    }

    fn class(&self, class: &mut Class) {
        for member in &mut class.body {
            match member {
                ClassMember::Method(m) => self.key(&mut m.key),
                ClassMember::Property(p) => self.key(&mut p.key),
                ClassMember::StaticBlock(_) => {}
            }
        }
    }

    /// Keys of destructuring patterns, which the rewriter does not hand out.
    fn pat(&self, pat: &mut Pat) {
        match pat {
            Pat::Ident(_) => {}
            Pat::Array(a) => {
                for el in a.elements.iter_mut().flatten() {
                    self.pat(el);
                }
            }
            Pat::Object(o) => {
                for prop in &mut o.properties {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => {
                            self.key(&mut kv.key);
                            self.pat(&mut kv.value);
                        }
                        ObjectPatProp::Rest(r) => self.pat(&mut r.argument),
                    }
                }
            }
            Pat::Rest(r) => self.pat(&mut r.argument),
            Pat::Assign(a) => self.pat(&mut a.left),
            Pat::Expr(e) => {
                if let Expr::Member(m) = &mut **e {
                    self.member(m);
                }
            }
        }
    }

    fn var_decl(&self, decl: &mut VarDecl) {
        for d in &mut decl.declarators {
            self.pat(&mut d.id);
        }
    }
}

impl Rewriter for Renamer {
    fn before_stmt(&mut self, stmt: &mut Stmt) -> RewriteAction<Stmt> {
        match stmt {
            Stmt::VarDecl(d) => self.var_decl(d),
            Stmt::For(s) => {
                if let Some(ForInit::VarDecl(d)) = &mut s.init {
                    self.var_decl(d);
                }
            }
            Stmt::ForIn(ForInStmt { left, .. }) | Stmt::ForOf(ForOfStmt { left, .. }) => match left {
                ForInOfLeft::VarDecl(d) => self.var_decl(d),
                ForInOfLeft::Pat(p) => self.pat(p),
            },
            Stmt::Try(t) => {
                if let Some(param) = t.handler.as_mut().and_then(|h| h.param.as_mut()) {
                    self.pat(param);
                }
            }
            Stmt::ClassDecl(c) => self.class(c),
            Stmt::Module(m) => {
                if let ModuleDecl::ExportDefault(d) = &mut **m
                    && let ExportDefaultExpr::Class(c) = &mut d.declaration
                {
                    self.class(c);
                }
            }
            _ => {}
        }
        RewriteAction::Keep
    }

    fn before_expr(&mut self, expr: &mut Expr) -> RewriteAction<Expr> {
        match expr {
            Expr::Member(m) => self.member(m),
            Expr::Object(o) => {
                for prop in &mut o.properties {
                    if let ObjectProp::Prop(p) = prop {
                        self.key(&mut p.key);
                    }
                }
            }
            Expr::Class(c) => self.class(c),
            Expr::Assign(a) => match &mut a.left {
                AssignTarget::Pat(p) => self.pat(p),
                AssignTarget::Expr(target) => {
                    if let Expr::Member(m) = &mut **target {
                        self.member(m);
                    }
                }
            },
            _ => {}
        }
        RewriteAction::Keep
    }

    fn enter_function(&mut self, function: &mut Function) -> bool {
        for p in &mut function.params {
            self.pat(p);
        }
        true
    }

    fn enter_arrow(&mut self, arrow: &mut ArrowExpr) -> bool {
        for p in &mut arrow.params {
            self.pat(p);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser::{ParseOptions, parse};
    use crate::printer::{OutputOptions, print};

    fn mangle_with(src: &str, options: &PropertyMangleOptions, cache: &mut NameCache) -> String {
        let mut program = parse(src, &ParseOptions::default()).unwrap();
        mangle_properties(&mut program, options, cache).unwrap();
        print(&program, &OutputOptions::default(), None)
    }

    fn mangle(src: &str) -> String {
        mangle_with(src, &PropertyMangleOptions::default(), &mut NameCache::default())
    }

    #[test]
    fn test_all_occurrences_renamed_alike() {
        assert_eq!(
            mangle("var o = {alpha: 1, beta: 2}; o.alpha = o.beta; o['alpha'];"),
            "var o={a:1,b:2};o.a=o.b;o[\"a\"];"
        );
    }

    #[test]
    fn test_assignment_targets_renamed() {
        assert_eq!(
            mangle("var o = {secret: 1}; o.secret = 2; o.secret += 3; print(o.secret);"),
            "var o={a:1};o.a=2;o.a+=3;print(o.a);"
        );
    }

    #[test]
    fn test_builtins_kept() {
        assert_eq!(mangle("x.length = y.push(z.custom);"), "x.length=y.push(z.a);");
        let options = PropertyMangleOptions { builtins: true, ..PropertyMangleOptions::default() };
        assert_eq!(mangle_with("x.length;", &options, &mut NameCache::default()), "x.a;");
    }

    #[test]
    fn test_keep_quoted() {
        let options = PropertyMangleOptions { keep_quoted: true, ..PropertyMangleOptions::default() };
        assert_eq!(
            mangle_with("o.alpha; o['beta']; o.beta;", &options, &mut NameCache::default()),
            "o.a;o[\"beta\"];o.beta;"
        );
    }

    #[test]
    fn test_regex_filter() {
        let options = PropertyMangleOptions { regex: Some("^_".into()), ..PropertyMangleOptions::default() };
        assert_eq!(mangle_with("o._private; o.public;", &options, &mut NameCache::default()), "o.a;o.public;");
    }

    #[test]
    fn test_bad_regex_rejected() {
        let mut program = parse("o.x;", &ParseOptions::default()).unwrap();
        let options = PropertyMangleOptions { regex: Some("(".into()), ..PropertyMangleOptions::default() };
        assert!(matches!(
            mangle_properties(&mut program, &options, &mut NameCache::default()),
            Err(SquashError::Options(_))
        ));
    }

    #[test]
    fn test_kept_names_not_reused() {
        let options = PropertyMangleOptions { reserved: vec!["a".into()], ..PropertyMangleOptions::default() };
        assert_eq!(mangle_with("o.a; o.other;", &options, &mut NameCache::default()), "o.a;o.b;");
    }

    #[test]
    fn test_patterns_and_classes() {
        assert_eq!(
            mangle("class K { field = 1; method() {} } var {field, method: m} = k;"),
            "class K{a=1;b(){}}var{a:field,b:m}=k;"
        );
    }

    #[test]
    fn test_cache_reused() {
        let mut cache = NameCache::default();
        cache.props.insert("gamma".into(), "zz".into());
        assert_eq!(mangle_with("o.gamma; o.delta;", &PropertyMangleOptions::default(), &mut cache), "o.zz;o.a;");
        assert_eq!(cache.props["delta"], "a");
    }
}
