//! Identifier mangling.
//!
//! Every symbol that may be renamed gets the shortest name that neither
//! collides with a binding visible in its scope nor captures a reference
//! made from a nested scope.  Scopes are visited in pre-order, so by the
//! time a scope is named every outer name it can see is final; its
//! `enclosed` set lists exactly the outer symbols referenced from inside.
//!
//! Names are drawn from a mixed-radix counter over an alphabet sorted by
//! how often each character already occurs in the output, which helps the
//! gzip stage downstream.
//!
//! [`properties`] renames object properties, which have no scope at all.

pub mod properties;

use std::cmp::Reverse;
use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::compress::options::Toggle;
use crate::error::SquashResult;
use crate::parser::ast::Program;
use crate::parser::scanner::is_reserved_word;
use crate::parser::scope::{BindingKind, ResolveOptions, ScopeTree, SymbolDef, apply_mangled_names};
use crate::printer::{CommentsOption, OutputOptions, print};

pub use properties::{PropertyMangleOptions, mangle_properties};

/// Names assigned by earlier runs, keyed by original name.
///
/// Feeding the cache of one run into the next keeps top-level and property
/// names stable across separately minified files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameCache {
    /// Top-level variables.
    pub vars: BTreeMap<String, String>,
    /// Object properties.
    pub props: BTreeMap<String, String>,
}

/// Mangler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MangleOptions {
    /// Names never used for, nor taken from, a symbol.
    pub reserved: Vec<String>,
    /// Rename top-level bindings too.
    pub toplevel: bool,
    /// Rename inside scopes that call `eval` or use `with`.
    pub eval: bool,
    pub keep_fnames: bool,
    pub keep_classnames: bool,
    pub ie8: bool,
    /// Never reuse a name of the enclosing function inside its blocks;
    /// Safari 10 mishandles the shadowing.
    pub safari10: bool,
    /// Property mangling, off unless configured.
    pub properties: Toggle<PropertyMangleOptions>,
}

impl Default for MangleOptions {
    fn default() -> Self {
        MangleOptions {
            reserved: Vec::new(),
            toplevel: false,
            eval: false,
            keep_fnames: false,
            keep_classnames: false,
            ie8: false,
            safari10: false,
            properties: Toggle::Enabled(false),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Alphabet
// ─────────────────────────────────────────────────────────────────────────────

const LEADING: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ$_";
const DIGITS: &str = "0123456789";

/// The characters names are built from, most frequent first.
#[derive(Debug, Clone)]
pub(crate) struct Alphabet {
    leading: Vec<char>,
    trailing: Vec<char>,
}

impl Default for Alphabet {
    fn default() -> Self {
        Alphabet::from_frequency(&FxHashMap::default())
    }
}

impl Alphabet {
    fn from_frequency(frequency: &FxHashMap<char, i64>) -> Self {
        Alphabet {
            leading: by_frequency(LEADING.chars(), frequency),
            trailing: by_frequency(LEADING.chars().chain(DIGITS.chars()), frequency),
        }
    }

    /// Character frequencies of the printed program, minus the names about
    /// to be replaced.
    fn for_program(program: &Program, tree: &ScopeTree, eligible: &[bool]) -> Self {
        let options = OutputOptions {
            comments: CommentsOption::None,
            ..OutputOptions::default()
        };
        let mut frequency: FxHashMap<char, i64> = FxHashMap::default();
        for c in print(program, &options, None).chars() {
            if c.is_ascii_alphanumeric() || c == '$' || c == '_' {
                *frequency.entry(c).or_default() += 1;
            }
        }
        for def in tree.symbols.iter().filter(|def| eligible[def.id]) {
            let uses = (def.declarations.len() + def.references.len()) as i64 + i64::from(def.assignments);
            for c in def.name.chars() {
                *frequency.entry(c).or_default() -= uses;
            }
        }
        Alphabet::from_frequency(&frequency)
    }

    /// The `n`th name: radix 54 for the first character, 64 afterwards.
    pub(crate) fn name(&self, n: usize) -> String {
        let mut out = String::new();
        let mut chars = &self.leading;
        let mut n = n + 1;
        loop {
            n -= 1;
            out.push(chars[n % chars.len()]);
            n /= chars.len();
            chars = &self.trailing;
            if n == 0 {
                break;
            }
        }
        out
    }
}

/// Stable sort, so ties keep the default order.
fn by_frequency(chars: impl Iterator<Item = char>, frequency: &FxHashMap<char, i64>) -> Vec<char> {
    let mut chars: Vec<char> = chars.collect();
    chars.sort_by_key(|c| Reverse(frequency.get(c).copied().unwrap_or(0)));
    chars
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry point
// ─────────────────────────────────────────────────────────────────────────────

fn is_mangleable(tree: &ScopeTree, def: &SymbolDef, options: &MangleOptions, reserved: &FxHashSet<&str>) -> bool {
    if def.undeclared || def.exported || matches!(def.kind, BindingKind::Global | BindingKind::Arguments) {
        return false;
    }
    if reserved.contains(def.name.as_str()) {
        return false;
    }
    if def.scope == tree.root() && !options.toplevel {
        return false;
    }
    if tree.is_pinned(def.id) && !options.eval {
        return false;
    }
    match def.kind {
        BindingKind::Function | BindingKind::FnExprName => !options.keep_fnames,
        BindingKind::Class | BindingKind::ClassExprName => !options.keep_classnames,
        _ => true,
    }
}

/// Assign short names to every eligible symbol of `tree` and rename their
/// identifiers in `program`.
///
/// `tree` must be the result of resolving `program` with `ie8` matching
/// `options.ie8`.  Top-level names are recorded in (and, when present,
/// taken from) `cache.vars`.
///
/// # Errors
///
/// Propagates a failure of the renaming walk.
pub fn mangle_names(
    program: &mut Program,
    tree: &mut ScopeTree,
    options: &MangleOptions,
    cache: &mut NameCache,
) -> SquashResult<()> {
    let reserved: FxHashSet<&str> = options.reserved.iter().map(String::as_str).collect();
    let eligible: Vec<bool> = tree
        .symbols
        .iter()
        .map(|def| is_mangleable(tree, def, options, &reserved))
        .collect();
    let alphabet = Alphabet::for_program(program, tree, &eligible);
    for def in &mut tree.symbols {
        def.mangled_name = None;
    }

    let root = tree.root();
    let mut renamed = 0usize;
    for scope in 0..tree.scopes.len() {
        let mut taken: FxHashSet<String> = FxHashSet::default();
        for &sym in &tree.scopes[scope].enclosed {
            let def = &tree.symbols[sym];
            if def.undeclared || def.scope != scope {
                taken.insert(def.output_name().to_string());
            }
        }
        let own: Vec<usize> = tree.scopes[scope].names.values().copied().collect();
        for &sym in &own {
            if !eligible[sym] {
                taken.insert(tree.symbols[sym].name.clone());
            }
        }
        if options.safari10 && !tree.scopes[scope].kind.is_var_scope() {
            let function = tree.var_scope(scope);
            for outer in tree.ancestors(scope).skip(1) {
                for &sym in tree.scopes[outer].names.values() {
                    taken.insert(tree.symbols[sym].output_name().to_string());
                }
                if outer == function {
                    break;
                }
            }
        }
        if scope == root {
            taken.extend(cache.vars.values().cloned());
            for &sym in own.iter().filter(|&&sym| eligible[sym]) {
                if let Some(cached) = cache.vars.get(&tree.symbols[sym].name) {
                    tree.symbols[sym].mangled_name = Some(cached.clone());
                }
            }
        }

        let mut counter = 0usize;
        for sym in own {
            if !eligible[sym] || tree.symbols[sym].mangled_name.is_some() {
                continue;
            }
            let name = loop {
                let candidate = alphabet.name(counter);
                counter += 1;
                if !is_reserved_word(&candidate)
                    && !reserved.contains(candidate.as_str())
                    && !taken.contains(&candidate)
                {
                    break candidate;
                }
            };
            trace!(from = %tree.symbols[sym].name, to = %name, "mangled");
            taken.insert(name.clone());
            tree.symbols[sym].mangled_name = Some(name);
            renamed += 1;
        }
    }

    for &sym in tree.scopes[root].names.values() {
        let def = &tree.symbols[sym];
        if let Some(mangled) = &def.mangled_name {
            cache.vars.insert(def.name.clone(), mangled.clone());
        }
    }

    let resolve_options = ResolveOptions { ie8: options.ie8 };
    *tree = apply_mangled_names(program, std::mem::take(tree), &resolve_options)?;
    debug!(renamed, "mangled names");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{Ident, Stmt};
    use crate::parser::parser::{ParseOptions, parse};
    use crate::parser::scope::{SymbolId, resolve};
    use crate::walk::Visit;
    use proptest::prelude::*;

    fn mangle_with(src: &str, options: &MangleOptions, cache: &mut NameCache) -> String {
        let mut program = parse(src, &ParseOptions::default()).unwrap();
        let resolve_options = ResolveOptions { ie8: options.ie8 };
        let mut tree = resolve(&mut program, &resolve_options).unwrap();
        mangle_names(&mut program, &mut tree, options, cache).unwrap();
        print(&program, &OutputOptions::default(), None)
    }

    fn mangle(src: &str) -> String {
        mangle_with(src, &MangleOptions::default(), &mut NameCache::default())
    }

    #[test]
    fn test_alphabet_sequence() {
        let alphabet = Alphabet::default();
        assert_eq!(alphabet.name(0), "a");
        assert_eq!(alphabet.name(25), "z");
        assert_eq!(alphabet.name(53), "_");
        assert_eq!(alphabet.name(54), "aa");
        assert_eq!(alphabet.name(55), "ba");
        let names: FxHashSet<String> = (0..10_000).map(|n| alphabet.name(n)).collect();
        assert_eq!(names.len(), 10_000);
    }

    #[test]
    fn test_alphabet_follows_frequency() {
        let mut frequency = FxHashMap::default();
        frequency.insert('z', 10);
        frequency.insert('q', 5);
        let alphabet = Alphabet::from_frequency(&frequency);
        assert_eq!(alphabet.name(0), "z");
        assert_eq!(alphabet.name(1), "q");
        assert_eq!(alphabet.name(2), "a");
    }

    #[test]
    fn test_locals_renamed() {
        let code = mangle("function outer(){ var longName = 1; return longName; }");
        assert!(code.starts_with("function outer(){var "), "{code}");
        assert!(!code.contains("longName"));
        let name = code["function outer(){var ".len()..].split('=').next().unwrap();
        assert_eq!(name.len(), 1);
        assert!(code.ends_with(&format!("return {name}}}")));
    }

    #[test]
    fn test_toplevel_kept_by_default() {
        let code = mangle("var foo = 1; function bar(x){ return foo + x; }");
        assert!(code.starts_with("var foo=1;function bar("), "{code}");
        assert!(!code.contains('x'));
    }

    #[test]
    fn test_outer_reference_not_captured() {
        let code = mangle("var a = 1; function f(x){ return a + x; }");
        assert!(code.contains("return a+"));
        assert!(!code.contains("f(a)"));
    }

    #[test]
    fn test_toplevel_and_cache() {
        let options = MangleOptions { toplevel: true, ..MangleOptions::default() };
        let mut cache = NameCache::default();
        let first = mangle_with("var first = 1; var second = first; g(second);", &options, &mut cache);
        assert!(!first.contains("first") && !first.contains("second"));
        assert_eq!(cache.vars.len(), 2);
        let mut again = cache.clone();
        let second = mangle_with("var second = 2; g(second);", &options, &mut again);
        assert_eq!(second, format!("var {}=2;g({});", cache.vars["second"], cache.vars["second"]));
    }

    #[test]
    fn test_reserved_names_kept() {
        let options = MangleOptions { reserved: vec!["keep".into()], ..MangleOptions::default() };
        let code = mangle_with("function f(keep, other){ return keep + other; }", &options, &mut NameCache::default());
        assert!(code.contains("keep"));
        assert!(!code.contains("other"));
    }

    #[test]
    fn test_eval_scope_left_alone() {
        let src = "function f(longName){ eval('longName'); }";
        assert!(mangle(src).contains("longName"));
        let options = MangleOptions { eval: true, ..MangleOptions::default() };
        let code = mangle_with(src, &options, &mut NameCache::default());
        assert!(!code.starts_with("function f(longName)"), "{code}");
        assert_eq!(code.matches("longName").count(), 1, "{code}");
    }

    #[test]
    fn test_keep_fnames() {
        let src = "(function(){ var g = function inner(){ return inner; }; return g; })();";
        assert!(!mangle(src).contains("inner"));
        let options = MangleOptions { keep_fnames: true, ..MangleOptions::default() };
        assert!(mangle_with(src, &options, &mut NameCache::default()).contains("inner"));
    }

    #[test]
    fn test_toplevel_avoids_global_names() {
        let options = MangleOptions { toplevel: true, ..MangleOptions::default() };
        let code = mangle_with(
            "var one = 1, two = 2, three = 3; console.log(one, two, three, a, b, c);",
            &options,
            &mut NameCache::default(),
        );
        assert!(code.ends_with("a,b,c);"), "{code}");
        let mut reparsed = parse(&code, &ParseOptions::default()).unwrap();
        let tree = resolve(&mut reparsed, &ResolveOptions::default()).unwrap();
        let mut globals: Vec<&str> = tree.globals.keys().map(String::as_str).collect();
        globals.sort_unstable();
        assert_eq!(globals, ["a", "b", "c", "console"], "{code}");
    }

    #[test]
    fn test_globals_untouched() {
        assert_eq!(mangle("function f(){ return window.document; }"), "function f(){return window.document}");
    }

    // ── Collision property ───────────────────────────────────────────────

    #[derive(Default)]
    struct Bindings(Vec<Option<SymbolId>>);

    impl Visit for Bindings {
        fn visit_ident(&mut self, ident: &Ident) {
            self.0.push(ident.symbol);
        }
    }

    fn bindings(program: &crate::parser::ast::Program) -> Vec<Option<SymbolId>> {
        let mut b = Bindings::default();
        b.visit_program(program);
        b.0
    }

    /// Nested functions over a small pool of names, so that shadowing and
    /// outer references are common.
    fn nested_functions() -> impl Strategy<Value = String> {
        let name = prop::sample::select(vec!["a", "b", "c", "foo", "bar", "x1"]);
        prop::collection::vec((name.clone(), name.clone(), name, any::<bool>()), 1..8).prop_map(|levels| {
            let mut src = String::new();
            let mut open = Vec::new();
            for (i, (param, local, used, close)) in levels.iter().enumerate() {
                src.push_str(&format!("function f{i}({param}){{var {local}={param}+{used};"));
                open.push(*local);
                if *close && let Some(local) = open.pop() {
                    src.push_str(&format!("return {local}}}"));
                }
            }
            while let Some(local) = open.pop() {
                src.push_str(&format!("return {local}}}"));
            }
            src
        })
    }

    proptest! {
        #[test]
        fn prop_mangling_preserves_bindings(src in nested_functions(), toplevel in any::<bool>()) {
            let mut program = parse(&src, &ParseOptions::default()).unwrap();
            let mut tree = resolve(&mut program, &ResolveOptions::default()).unwrap();
            let before = bindings(&program);
            let options = MangleOptions { toplevel, ..MangleOptions::default() };
            mangle_names(&mut program, &mut tree, &options, &mut NameCache::default()).unwrap();
            let printed = print(&program, &OutputOptions::default(), None);
            let mut reparsed = parse(&printed, &ParseOptions::default()).unwrap();
            resolve(&mut reparsed, &ResolveOptions::default()).unwrap();
            let after = bindings(&reparsed);
            prop_assert_eq!(before.len(), after.len());
            let mut forward: FxHashMap<Option<SymbolId>, Option<SymbolId>> = FxHashMap::default();
            let mut backward: FxHashMap<Option<SymbolId>, Option<SymbolId>> = FxHashMap::default();
            for (b, a) in before.iter().zip(&after) {
                prop_assert_eq!(*forward.entry(*b).or_insert(*a), *a, "{}", printed);
                prop_assert_eq!(*backward.entry(*a).or_insert(*b), *b, "{}", printed);
            }
        }
    }

    #[test]
    fn test_declaration_statement_shape_kept() {
        let mut program = parse("function f(){ let x = 1; { let y = x; g(y); } }", &ParseOptions::default()).unwrap();
        let mut tree = resolve(&mut program, &ResolveOptions::default()).unwrap();
        mangle_names(&mut program, &mut tree, &MangleOptions::default(), &mut NameCache::default()).unwrap();
        assert!(matches!(program.body[0], Stmt::FnDecl(_)));
        let code = print(&program, &OutputOptions::default(), None);
        assert!(!code.contains('x') && !code.contains('y'), "{code}");
    }
}
