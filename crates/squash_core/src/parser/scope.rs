//! Scope analysis and symbol resolution.
//!
//! # Overview
//!
//! Call [`resolve`] to build a [`ScopeTree`] for a parsed [`Program`].  The
//! tree is an arena: [`Scope`]s and [`SymbolDef`]s are addressed by
//! [`ScopeId`] / [`SymbolId`] indices and parent links are plain indices, so
//! the whole structure is owned by the tree and is only valid for the
//! program it was built from.
//!
//! Resolution makes two walks over the same tree in the same order:
//!
//! 1. **Declare**: creates a scope for each scope-introducing node and binds
//!    every declaration.  `var` (and sloppy-mode block `function`) bindings
//!    are hoisted to the nearest function or program scope; `let`, `const`,
//!    `class`, imports and catch parameters bind in the current scope.
//!    Conflicting redeclarations are fatal.
//! 2. **Resolve**: binds every identifier reference by walking the scope
//!    chain outward.  Unbound names become shared *undeclared* symbols.  The
//!    symbol is added to the `enclosed` set of every scope from the reference
//!    up to its declaring scope.
//!
//! Each identifier in the program gets its [`Ident::symbol`] filled in.  The
//! pass is idempotent and must be re-run after any rewrite that adds, drops or
//! renames bindings.
//!
//! # Usage flags
//!
//! Each [`Scope`] records whether its code references:
//! - `uses_arguments`: the implicit `arguments` object.
//! - `uses_eval`: the global `eval`.
//! - `uses_this`: a `this` expression.
//! - `uses_with`: the scope is the body of a `with` statement.
//!
//! A scope is `pinned` when it or any descendant uses `eval` or `with`; names
//! declared in a pinned scope must keep their spelling and their bindings.

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashSet;
use smallvec::{SmallVec, smallvec};
use tracing::debug;

use crate::error::{SquashError, SquashResult};
use crate::parser::ast::*;
use crate::parser::scanner::Span;

// ─────────────────────────────────────────────────────────────────────────────
// Public identifier types
// ─────────────────────────────────────────────────────────────────────────────

/// Index of a [`Scope`] in [`ScopeTree::scopes`].
pub type ScopeId = usize;

/// Index of a [`SymbolDef`] in [`ScopeTree::symbols`].
pub type SymbolId = usize;

// ─────────────────────────────────────────────────────────────────────────────
// Scope kind
// ─────────────────────────────────────────────────────────────────────────────

/// The kind of a lexical scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The outermost scope of a classic script.
    Global,
    /// The outermost scope of an ES module.
    Module,
    /// A function body together with its parameters, or a class static block.
    Function,
    /// An arrow function: a `var` scope without its own `this`/`arguments`.
    Arrow,
    /// A `{ … }` block, a `for` head with lexical bindings or a `switch` body.
    Block,
    /// A `catch (param) { … }` clause.
    Catch,
    /// A class body; class expressions bind their own name here.
    Class,
    /// The body of a `with (obj) …` statement.
    With,
}

impl ScopeKind {
    /// `true` for scopes that receive hoisted `var` declarations.
    pub fn is_var_scope(self) -> bool {
        matches!(
            self,
            ScopeKind::Global | ScopeKind::Module | ScopeKind::Function | ScopeKind::Arrow
        )
    }

    /// `true` for function and arrow scopes.
    pub fn is_function(self) -> bool {
        matches!(self, ScopeKind::Function | ScopeKind::Arrow)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Binding kind
// ─────────────────────────────────────────────────────────────────────────────

/// The syntactic origin of a [`SymbolDef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// `var` declaration.
    Var,
    /// `let` declaration.
    Let,
    /// `const` declaration.
    Const,
    /// `function` declaration.
    Function,
    /// `class` declaration.
    Class,
    /// Formal parameter.
    Param,
    /// Local name of an `import`.
    Import,
    /// `catch` clause parameter.
    CatchParam,
    /// Own name of a named function expression.
    FnExprName,
    /// Own name of a named class expression.
    ClassExprName,
    /// The implicit `arguments` object of a function.
    Arguments,
    /// A name referenced but never declared.
    Global,
}

impl BindingKind {
    /// `true` for block-scoped bindings that conflict with any redeclaration.
    pub fn is_lexical(self) -> bool {
        matches!(
            self,
            BindingKind::Let | BindingKind::Const | BindingKind::Class | BindingKind::Import
        )
    }

    /// `true` for implicit names that a real declaration silently shadows.
    fn is_shadowable(self) -> bool {
        matches!(
            self,
            BindingKind::FnExprName | BindingKind::ClassExprName | BindingKind::Arguments
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SymbolDef
// ─────────────────────────────────────────────────────────────────────────────

/// One distinct binding.
#[derive(Debug, Clone)]
pub struct SymbolDef {
    /// Index in [`ScopeTree::symbols`].
    pub id: SymbolId,
    /// Name as written in the source.
    pub name: String,
    /// Declaring scope; the root scope for undeclared globals.
    pub scope: ScopeId,
    /// Syntactic origin of the binding.
    pub kind: BindingKind,
    /// Locations of every declaration of this name.
    pub declarations: SmallVec<[Span; 1]>,
    /// Locations of every read.
    pub references: Vec<Span>,
    /// Number of writes other than declaration initializers.
    pub assignments: u32,
    /// Part of the module's export list.
    pub exported: bool,
    /// Never declared: a global provided by the environment.
    pub undeclared: bool,
    /// Referenced from inside a function nested below the declaring scope.
    pub escaped: bool,
    /// The single constant value the compressor proved this symbol holds.
    pub fixed: Option<Expr>,
    /// Name assigned by the mangler.
    pub mangled_name: Option<String>,
}

impl SymbolDef {
    /// `true` when the symbol is read at least once.
    pub fn is_referenced(&self) -> bool {
        !self.references.is_empty()
    }

    /// The name to print: the mangled name when one was assigned.
    pub fn output_name(&self) -> &str {
        self.mangled_name.as_deref().unwrap_or(&self.name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scope
// ─────────────────────────────────────────────────────────────────────────────

/// A single scope node in the [`ScopeTree`].
#[derive(Debug, Clone)]
pub struct Scope {
    /// Index in [`ScopeTree::scopes`].
    pub id: ScopeId,
    /// The kind of this scope.
    pub kind: ScopeKind,
    /// The enclosing scope, or `None` for the root.
    pub parent: Option<ScopeId>,
    /// Direct child scopes in source order.
    pub children: Vec<ScopeId>,
    /// Names declared directly in this scope, in declaration order.
    pub names: IndexMap<String, SymbolId>,
    /// Symbols referenced in this scope or any descendant and declared here
    /// or further out.
    pub enclosed: IndexSet<SymbolId>,
    /// The scope references the global `eval`.
    pub uses_eval: bool,
    /// The scope is the body of a `with` statement.
    pub uses_with: bool,
    /// The function references its implicit `arguments`.
    pub uses_arguments: bool,
    /// The function (or class body) references `this`.
    pub uses_this: bool,
    /// Strict-mode code.
    pub strict: bool,
    /// This scope or a descendant uses `eval` or `with`.
    pub pinned: bool,
    /// Location of the node that introduced the scope.
    pub loc: Span,
}

impl Scope {
    fn new(id: ScopeId, kind: ScopeKind, parent: Option<ScopeId>, strict: bool, loc: Span) -> Self {
        Self {
            id,
            kind,
            parent,
            children: Vec::new(),
            names: IndexMap::new(),
            enclosed: IndexSet::new(),
            uses_eval: false,
            uses_with: false,
            uses_arguments: false,
            uses_this: false,
            strict,
            pinned: false,
            loc,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ScopeTree
// ─────────────────────────────────────────────────────────────────────────────

/// The result of resolving a [`Program`].
#[derive(Debug, Clone, Default)]
pub struct ScopeTree {
    /// All scopes in pre-order; index 0 is the root.
    pub scopes: Vec<Scope>,
    /// All symbols, declared and undeclared.
    pub symbols: Vec<SymbolDef>,
    /// Undeclared names, by name.
    pub globals: IndexMap<String, SymbolId>,
}

impl ScopeTree {
    /// The root (program) scope.
    pub fn root(&self) -> ScopeId {
        0
    }

    /// Returns the scope with the given `id`.
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    /// Returns the symbol with the given `id`.
    pub fn symbol(&self, id: SymbolId) -> &SymbolDef {
        &self.symbols[id]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut SymbolDef {
        &mut self.symbols[id]
    }

    /// The symbol an identifier was bound to by the last [`resolve`].
    pub fn symbol_of(&self, ident: &Ident) -> Option<&SymbolDef> {
        ident.symbol.and_then(|id| self.symbols.get(id))
    }

    /// Look `name` up from `scope` outward through declared names only.
    pub fn lookup(&self, mut scope: ScopeId, name: &str) -> Option<SymbolId> {
        loop {
            let s = &self.scopes[scope];
            if let Some(&id) = s.names.get(name) {
                return Some(id);
            }
            scope = s.parent?;
        }
    }

    /// The nearest enclosing scope that receives `var` declarations.
    pub fn var_scope(&self, mut scope: ScopeId) -> ScopeId {
        while !self.scopes[scope].kind.is_var_scope() {
            match self.scopes[scope].parent {
                Some(p) => scope = p,
                None => break,
            }
        }
        scope
    }

    /// `true` when `symbol` is declared at the top level or is a global.
    pub fn is_toplevel(&self, symbol: SymbolId) -> bool {
        let def = &self.symbols[symbol];
        def.undeclared || def.scope == self.root()
    }

    /// `true` when `symbol` lives in a scope affected by `eval` or `with`.
    pub fn is_pinned(&self, symbol: SymbolId) -> bool {
        self.scopes[self.symbols[symbol].scope].pinned
    }

    /// Ancestors of `scope`, nearest first, `scope` included.
    pub fn ancestors(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(scope), move |&s| self.scopes[s].parent)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Options and entry point
// ─────────────────────────────────────────────────────────────────────────────

/// Resolver configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Old IE leaks the names of function expressions and catch parameters
    /// into the enclosing function scope; bind them there.
    pub ie8: bool,
}

/// Resolve `program`, annotating every [`Ident::symbol`].
///
/// # Errors
///
/// Returns [`SquashError::Syntax`] for a conflicting redeclaration such as
/// `let a; var a;`.
///
/// # Example
///
/// ```
/// use squash_core::parser::parser::{parse, ParseOptions};
/// use squash_core::parser::scope::{resolve, ResolveOptions};
///
/// let mut program = parse("var a = 1; a + b;", &ParseOptions::default()).unwrap();
/// let tree = resolve(&mut program, &ResolveOptions::default()).unwrap();
/// assert!(tree.globals.contains_key("b"));
/// ```
pub fn resolve(program: &mut Program, options: &ResolveOptions) -> SquashResult<ScopeTree> {
    let mut resolver = Resolver {
        tree: ScopeTree::default(),
        pass: Pass::Declare,
        stack: Vec::new(),
        next_scope: 0,
        hoisted_through: Vec::new(),
        files: program.files.clone(),
        options: options.clone(),
    };
    resolver.program(program)?;
    resolver.pass = Pass::Resolve;
    resolver.next_scope = 0;
    resolver.program(program)?;
    resolver.propagate_pinned();
    let tree = resolver.tree;
    debug!(
        scopes = tree.scopes.len(),
        symbols = tree.symbols.len(),
        globals = tree.globals.len(),
        "resolved scopes"
    );
    Ok(tree)
}

/// Rename every identifier bound to a symbol of `tree` that carries a
/// [`SymbolDef::mangled_name`].
///
/// `tree` must come from the last [`resolve`] of `program` with the same
/// `options`.  The renamed program needs a fresh [`resolve`] before further
/// analysis.
pub fn apply_mangled_names(program: &mut Program, tree: ScopeTree, options: &ResolveOptions) -> SquashResult<ScopeTree> {
    let mut renamer = Resolver {
        tree,
        pass: Pass::Rename,
        stack: Vec::new(),
        next_scope: 0,
        hoisted_through: Vec::new(),
        files: program.files.clone(),
        options: options.clone(),
    };
    renamer.program(program)?;
    Ok(renamer.tree)
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal resolver
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Declare,
    Resolve,
    /// Copy each symbol's mangled name onto its identifiers.
    Rename,
}

/// Where the name of a function node is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FnName {
    /// Bound by the caller (declarations) or absent (methods).
    Outer,
    /// A function expression's name, visible only inside it.
    Inner,
    /// A function expression's name hoisted to the enclosing function.
    Leaked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
    ReadWrite,
}

struct Resolver {
    tree: ScopeTree,
    pass: Pass,
    /// Active scopes, innermost last.
    stack: Vec<ScopeId>,
    /// Pre-order counter used by the resolve pass to re-enter the scopes the
    /// declare pass created.
    next_scope: usize,
    /// Per scope, the `var` names hoisted through it to an outer var scope.
    hoisted_through: Vec<FxHashSet<String>>,
    files: Vec<String>,
    options: ResolveOptions,
}

impl Resolver {
    // ── Scope management ─────────────────────────────────────────────────────

    fn current(&self) -> ScopeId {
        self.stack.last().copied().unwrap_or(0)
    }

    fn enter_scope(&mut self, kind: ScopeKind, loc: Span, strict: bool) -> ScopeId {
        let id = match self.pass {
            Pass::Declare => {
                let parent = self.stack.last().copied();
                let id = self.tree.scopes.len();
                let strict = strict || parent.is_some_and(|p| self.tree.scopes[p].strict);
                self.tree.scopes.push(Scope::new(id, kind, parent, strict, loc));
                self.hoisted_through.push(FxHashSet::default());
                if let Some(p) = parent {
                    self.tree.scopes[p].children.push(id);
                }
                id
            }
            Pass::Resolve | Pass::Rename => {
                let id = self.next_scope;
                self.next_scope += 1;
                id
            }
        };
        self.stack.push(id);
        id
    }

    fn exit_scope(&mut self) {
        self.stack.pop();
    }

    fn redeclared(&self, name: &str, loc: Span) -> SquashError {
        let file = self.files.get(loc.file as usize).map(String::as_str).unwrap_or("");
        SquashError::syntax(format!("Identifier '{name}' has already been declared"), loc.start)
            .in_file(file)
    }

    fn new_symbol(&mut self, name: &str, scope: ScopeId, kind: BindingKind, loc: Span) -> SymbolId {
        let id = self.tree.symbols.len();
        self.tree.symbols.push(SymbolDef {
            id,
            name: name.to_string(),
            scope,
            kind,
            declarations: if loc.is_dummy() { SmallVec::new() } else { smallvec![loc] },
            references: Vec::new(),
            assignments: 0,
            exported: false,
            undeclared: kind == BindingKind::Global,
            escaped: false,
            fixed: None,
            mangled_name: None,
        });
        if kind != BindingKind::Global {
            self.tree.scopes[scope].names.insert(name.to_string(), id);
        }
        id
    }

    // ── Declarations ─────────────────────────────────────────────────────────

    /// Bind `ident` as a `kind` declaration.  No-op in the resolve pass.
    fn declare(&mut self, ident: &mut Ident, kind: BindingKind) -> SquashResult<()> {
        match self.pass {
            Pass::Declare => {}
            Pass::Resolve => return Ok(()),
            Pass::Rename => {
                self.rename(ident);
                return Ok(());
            }
        }
        let current = self.current();
        let var_like = match kind {
            BindingKind::Var => true,
            BindingKind::Function => {
                !self.tree.scopes[current].strict || self.tree.scopes[current].kind.is_var_scope()
            }
            _ => false,
        };
        let sym = if var_like {
            self.declare_var(&ident.name, kind, ident.loc, current)?
        } else {
            self.declare_lexical(&ident.name, kind, ident.loc, current)?
        };
        ident.symbol = Some(sym);
        Ok(())
    }

    fn declare_var(
        &mut self,
        name: &str,
        kind: BindingKind,
        loc: Span,
        current: ScopeId,
    ) -> SquashResult<SymbolId> {
        let target = self.tree.var_scope(current);
        let mut scope = current;
        while scope != target {
            if let Some(&existing) = self.tree.scopes[scope].names.get(name) {
                let k = self.tree.symbols[existing].kind;
                if k.is_lexical() || k == BindingKind::Function {
                    return Err(self.redeclared(name, loc));
                }
            }
            self.hoisted_through[scope].insert(name.to_string());
            match self.tree.scopes[scope].parent {
                Some(p) => scope = p,
                None => break,
            }
        }
        if let Some(&existing) = self.tree.scopes[target].names.get(name) {
            let def = &mut self.tree.symbols[existing];
            if def.kind.is_lexical() {
                return Err(self.redeclared(name, loc));
            }
            if !def.kind.is_shadowable() {
                def.declarations.push(loc);
                if kind == BindingKind::Function && def.kind == BindingKind::Var {
                    def.kind = BindingKind::Function;
                }
                return Ok(existing);
            }
        }
        Ok(self.new_symbol(name, target, kind, loc))
    }

    fn declare_lexical(
        &mut self,
        name: &str,
        kind: BindingKind,
        loc: Span,
        scope: ScopeId,
    ) -> SquashResult<SymbolId> {
        if kind.is_lexical() && self.hoisted_through[scope].contains(name) {
            return Err(self.redeclared(name, loc));
        }
        if let Some(&existing) = self.tree.scopes[scope].names.get(name) {
            let def = &mut self.tree.symbols[existing];
            let compatible = def.kind.is_shadowable()
                || (kind == BindingKind::Param && def.kind == BindingKind::Param)
                || (!kind.is_lexical() && !def.kind.is_lexical() && kind == def.kind);
            if !compatible {
                return Err(self.redeclared(name, loc));
            }
            if !def.kind.is_shadowable() {
                def.declarations.push(loc);
                return Ok(existing);
            }
        }
        Ok(self.new_symbol(name, scope, kind, loc))
    }

    /// Declare every name bound by `pat` and resolve its defaults and
    /// computed keys.
    fn binding_pat(&mut self, pat: &mut Pat, kind: BindingKind) -> SquashResult<()> {
        match pat {
            Pat::Ident(i) => self.declare(i, kind)?,
            Pat::Array(a) => {
                for el in a.elements.iter_mut().flatten() {
                    self.binding_pat(el, kind)?;
                }
            }
            Pat::Object(o) => {
                for prop in &mut o.properties {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => {
                            self.prop_key(&mut kv.key)?;
                            self.binding_pat(&mut kv.value, kind)?;
                        }
                        ObjectPatProp::Rest(r) => self.binding_pat(&mut r.argument, kind)?,
                    }
                }
            }
            Pat::Rest(r) => self.binding_pat(&mut r.argument, kind)?,
            Pat::Assign(a) => {
                self.binding_pat(&mut a.left, kind)?;
                self.expr(&mut a.right)?;
            }
            Pat::Expr(e) => self.expr(e)?,
        }
        Ok(())
    }

    /// Mark every name bound by `pat` as written once more (loop heads).
    fn count_loop_writes(&mut self, pat: &Pat) {
        if self.pass != Pass::Resolve {
            return;
        }
        let mut names = Vec::new();
        pat.bound_names(&mut names);
        for ident in names {
            if let Some(sym) = ident.symbol {
                self.tree.symbols[sym].assignments += 1;
            }
        }
    }

    fn mark_exported(&mut self, ident: &Ident) {
        if let Some(sym) = ident.symbol {
            self.tree.symbols[sym].exported = true;
        }
    }

    // ── References ───────────────────────────────────────────────────────────

    /// Bind a reference.  No-op in the declare pass.
    fn reference(&mut self, ident: &mut Ident, access: Access) {
        match self.pass {
            Pass::Declare => return,
            Pass::Rename => return self.rename(ident),
            Pass::Resolve => {}
        }
        let start = self.current();
        let mut crossed_function = false;
        let mut found = None;
        let mut scope = Some(start);
        while let Some(s) = scope {
            if let Some(&sym) = self.tree.scopes[s].names.get(&ident.name) {
                found = Some(sym);
                break;
            }
            let kind = self.tree.scopes[s].kind;
            if ident.name == "arguments" && kind == ScopeKind::Function {
                self.tree.scopes[s].uses_arguments = true;
                found = Some(self.new_symbol("arguments", s, BindingKind::Arguments, Span::dummy()));
                break;
            }
            if kind.is_function() {
                crossed_function = true;
            }
            scope = self.tree.scopes[s].parent;
        }
        let sym = match found {
            Some(sym) => sym,
            None => self.global(&ident.name),
        };

        let decl_scope = self.tree.symbols[sym].scope;
        let mut s = Some(start);
        while let Some(id) = s {
            self.tree.scopes[id].enclosed.insert(sym);
            if id == decl_scope {
                break;
            }
            s = self.tree.scopes[id].parent;
        }

        let def = &mut self.tree.symbols[sym];
        if matches!(access, Access::Read | Access::ReadWrite) {
            def.references.push(ident.loc);
        }
        if matches!(access, Access::Write | Access::ReadWrite) {
            def.assignments += 1;
        }
        if crossed_function {
            def.escaped = true;
        }
        if def.undeclared && def.name == "eval" {
            self.tree.scopes[start].uses_eval = true;
        }
        ident.symbol = Some(sym);
    }

    fn rename(&self, ident: &mut Ident) {
        if let Some(name) = ident.symbol.and_then(|sym| self.tree.symbols.get(sym)?.mangled_name.as_ref()) {
            ident.name.clone_from(name);
        }
    }

    fn global(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.tree.globals.get(name) {
            return id;
        }
        let id = self.new_symbol(name, 0, BindingKind::Global, Span::dummy());
        self.tree.globals.insert(name.to_string(), id);
        id
    }

    fn mark_this(&mut self) {
        if self.pass != Pass::Resolve {
            return;
        }
        for s in self.stack.iter().rev() {
            let scope = &mut self.tree.scopes[*s];
            if matches!(scope.kind, ScopeKind::Function | ScopeKind::Class) || scope.parent.is_none() {
                scope.uses_this = true;
                return;
            }
        }
    }

    fn propagate_pinned(&mut self) {
        for id in 0..self.tree.scopes.len() {
            if self.tree.scopes[id].uses_eval || self.tree.scopes[id].uses_with {
                let mut s = Some(id);
                while let Some(cur) = s {
                    self.tree.scopes[cur].pinned = true;
                    s = self.tree.scopes[cur].parent;
                }
            }
        }
    }

    /// Resolve the leaves of an assignment-target pattern as writes.
    fn target_pat(&mut self, pat: &mut Pat) -> SquashResult<()> {
        match pat {
            Pat::Ident(i) => self.reference(i, Access::Write),
            Pat::Array(a) => {
                for el in a.elements.iter_mut().flatten() {
                    self.target_pat(el)?;
                }
            }
            Pat::Object(o) => {
                for prop in &mut o.properties {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => {
                            self.prop_key(&mut kv.key)?;
                            self.target_pat(&mut kv.value)?;
                        }
                        ObjectPatProp::Rest(r) => self.target_pat(&mut r.argument)?,
                    }
                }
            }
            Pat::Rest(r) => self.target_pat(&mut r.argument)?,
            Pat::Assign(a) => {
                self.target_pat(&mut a.left)?;
                self.expr(&mut a.right)?;
            }
            Pat::Expr(e) => self.expr(e)?,
        }
        Ok(())
    }

    // ── Program ──────────────────────────────────────────────────────────────

    fn program(&mut self, program: &mut Program) -> SquashResult<()> {
        let (kind, module) = match program.source_type {
            SourceType::Module => (ScopeKind::Module, true),
            SourceType::Script => (ScopeKind::Global, false),
        };
        let strict = module || has_directive(&program.body, "use strict");
        self.enter_scope(kind, program.loc, strict);
        self.stmts(&mut program.body)?;
        self.exit_scope();
        Ok(())
    }

    fn stmts(&mut self, stmts: &mut [Stmt]) -> SquashResult<()> {
        for stmt in stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn var_decl(&mut self, decl: &mut VarDecl) -> SquashResult<()> {
        let kind = match decl.kind {
            VarKind::Var => BindingKind::Var,
            VarKind::Let => BindingKind::Let,
            VarKind::Const => BindingKind::Const,
        };
        for d in &mut decl.declarators {
            self.binding_pat(&mut d.id, kind)?;
            if let Some(init) = &mut d.init {
                self.expr(init)?;
            }
        }
        Ok(())
    }

    fn for_left(&mut self, left: &mut ForInOfLeft) -> SquashResult<()> {
        match left {
            ForInOfLeft::VarDecl(d) => {
                self.var_decl(d)?;
                for decl in &d.declarators {
                    self.count_loop_writes(&decl.id);
                }
                Ok(())
            }
            ForInOfLeft::Pat(p) => self.target_pat(p),
        }
    }

    fn stmt(&mut self, stmt: &mut Stmt) -> SquashResult<()> {
        match stmt {
            Stmt::Block(b) => {
                self.enter_scope(ScopeKind::Block, b.loc, false);
                self.stmts(&mut b.body)?;
                self.exit_scope();
            }
            Stmt::VarDecl(d) => self.var_decl(d)?,
            Stmt::FnDecl(f) => {
                if let Some(id) = &mut f.id {
                    self.declare(id, BindingKind::Function)?;
                }
                self.function(f, FnName::Outer)?;
            }
            Stmt::ClassDecl(c) => {
                if let Some(id) = &mut c.id {
                    self.declare(id, BindingKind::Class)?;
                }
                self.class(c, false)?;
            }
            Stmt::Expr(e) => self.expr(&mut e.expr)?,
            Stmt::If(s) => {
                self.expr(&mut s.test)?;
                self.stmt(&mut s.consequent)?;
                if let Some(alt) = &mut s.alternate {
                    self.stmt(alt)?;
                }
            }
            Stmt::For(s) => {
                let lexical = matches!(&s.init, Some(ForInit::VarDecl(v)) if v.kind != VarKind::Var);
                if lexical {
                    self.enter_scope(ScopeKind::Block, s.loc, false);
                }
                match &mut s.init {
                    Some(ForInit::VarDecl(d)) => self.var_decl(d)?,
                    Some(ForInit::Expr(e)) => self.expr(e)?,
                    None => {}
                }
                if let Some(test) = &mut s.test {
                    self.expr(test)?;
                }
                if let Some(update) = &mut s.update {
                    self.expr(update)?;
                }
                self.stmt(&mut s.body)?;
                if lexical {
                    self.exit_scope();
                }
            }
            Stmt::ForIn(s) => {
                self.for_in_of(&mut s.left, &mut s.right, &mut s.body, s.loc)?;
            }
            Stmt::ForOf(s) => {
                self.for_in_of(&mut s.left, &mut s.right, &mut s.body, s.loc)?;
            }
            Stmt::While(s) => {
                self.expr(&mut s.test)?;
                self.stmt(&mut s.body)?;
            }
            Stmt::DoWhile(s) => {
                self.stmt(&mut s.body)?;
                self.expr(&mut s.test)?;
            }
            Stmt::Switch(s) => {
                self.expr(&mut s.discriminant)?;
                self.enter_scope(ScopeKind::Block, s.loc, false);
                for case in &mut s.cases {
                    if let Some(test) = &mut case.test {
                        self.expr(test)?;
                    }
                    self.stmts(&mut case.consequent)?;
                }
                self.exit_scope();
            }
            Stmt::Try(s) => {
                self.enter_scope(ScopeKind::Block, s.block.loc, false);
                self.stmts(&mut s.block.body)?;
                self.exit_scope();
                if let Some(h) = &mut s.handler {
                    self.enter_scope(ScopeKind::Catch, h.loc, false);
                    if let Some(p) = &mut h.param {
                        let kind = if self.options.ie8 {
                            BindingKind::Var
                        } else {
                            BindingKind::CatchParam
                        };
                        self.binding_pat(p, kind)?;
                    }
                    self.stmts(&mut h.body.body)?;
                    self.exit_scope();
                }
                if let Some(f) = &mut s.finalizer {
                    self.enter_scope(ScopeKind::Block, f.loc, false);
                    self.stmts(&mut f.body)?;
                    self.exit_scope();
                }
            }
            Stmt::Return(s) => {
                if let Some(arg) = &mut s.argument {
                    self.expr(arg)?;
                }
            }
            Stmt::Throw(s) => self.expr(&mut s.argument)?,
            Stmt::Labeled(s) => self.stmt(&mut s.body)?,
            Stmt::With(s) => {
                self.expr(&mut s.object)?;
                let id = self.enter_scope(ScopeKind::With, s.loc, false);
                self.tree.scopes[id].uses_with = true;
                self.stmt(&mut s.body)?;
                self.exit_scope();
            }
            Stmt::Module(m) => self.module_decl(m)?,
            Stmt::Break(_)
            | Stmt::Continue(_)
            | Stmt::Debugger(_)
            | Stmt::Empty(_)
            | Stmt::Directive(_) => {}
        }
        Ok(())
    }

    fn for_in_of(
        &mut self,
        left: &mut ForInOfLeft,
        right: &mut Expr,
        body: &mut Stmt,
        loc: Span,
    ) -> SquashResult<()> {
        let lexical = matches!(left, ForInOfLeft::VarDecl(v) if v.kind != VarKind::Var);
        if lexical {
            self.enter_scope(ScopeKind::Block, loc, false);
        }
        self.for_left(left)?;
        self.expr(right)?;
        self.stmt(body)?;
        if lexical {
            self.exit_scope();
        }
        Ok(())
    }

    fn module_decl(&mut self, decl: &mut ModuleDecl) -> SquashResult<()> {
        match decl {
            ModuleDecl::Import(i) => {
                for spec in &mut i.specifiers {
                    match spec {
                        ImportSpecifier::Named { local, .. }
                        | ImportSpecifier::Default(local)
                        | ImportSpecifier::Namespace(local) => {
                            self.declare(local, BindingKind::Import)?
                        }
                    }
                }
            }
            ModuleDecl::ExportNamed(e) => {
                if let Some(d) = &mut e.declaration {
                    self.stmt(d)?;
                    if self.pass == Pass::Declare {
                        let mut names = Vec::new();
                        declared_names(d, &mut names);
                        for ident in names {
                            self.mark_exported(ident);
                        }
                    }
                }
                if e.source.is_none() {
                    for spec in &mut e.specifiers {
                        if let ModuleExportName::Ident(id) = &mut spec.local {
                            self.reference(id, Access::Read);
                            if self.pass == Pass::Resolve {
                                self.mark_exported(id);
                            }
                        }
                    }
                }
            }
            ModuleDecl::ExportDefault(e) => match &mut e.declaration {
                ExportDefaultExpr::Fn(f) => {
                    if let Some(id) = &mut f.id {
                        self.declare(id, BindingKind::Function)?;
                        self.mark_exported(id);
                    }
                    self.function(f, FnName::Outer)?;
                }
                ExportDefaultExpr::Class(c) => {
                    if let Some(id) = &mut c.id {
                        self.declare(id, BindingKind::Class)?;
                        self.mark_exported(id);
                    }
                    self.class(c, false)?;
                }
                ExportDefaultExpr::Expr(x) => self.expr(x)?,
            },
            ModuleDecl::ExportAll(_) => {}
        }
        Ok(())
    }

    // ── Functions and classes ────────────────────────────────────────────────

    /// Enter the function's own scope and resolve its parameters and body.
    fn function(&mut self, f: &mut Function, name: FnName) -> SquashResult<()> {
        if name == FnName::Leaked && let Some(id) = &mut f.id {
            self.declare(id, BindingKind::Var)?;
        }
        self.enter_scope(ScopeKind::Function, f.loc, f.has_directive("use strict"));
        if name == FnName::Inner && let Some(id) = &mut f.id {
            self.declare(id, BindingKind::FnExprName)?;
        }
        for p in &mut f.params {
            self.binding_pat(p, BindingKind::Param)?;
        }
        self.stmts(&mut f.body.body)?;
        self.exit_scope();
        Ok(())
    }

    /// A function in expression position: its name is visible only inside
    /// (or, under `ie8`, in the enclosing function scope).
    fn function_expr(&mut self, f: &mut Function) -> SquashResult<()> {
        let name = if self.options.ie8 {
            FnName::Leaked
        } else {
            FnName::Inner
        };
        self.function(f, name)
    }

    fn arrow(&mut self, a: &mut ArrowExpr) -> SquashResult<()> {
        self.enter_scope(ScopeKind::Arrow, a.loc, false);
        for p in &mut a.params {
            self.binding_pat(p, BindingKind::Param)?;
        }
        match &mut a.body {
            ArrowBody::Block(b) => self.stmts(&mut b.body)?,
            ArrowBody::Expr(e) => self.expr(e)?,
        }
        self.exit_scope();
        Ok(())
    }

    fn class(&mut self, c: &mut Class, is_expr: bool) -> SquashResult<()> {
        self.enter_scope(ScopeKind::Class, c.loc, true);
        if is_expr && let Some(id) = &mut c.id {
            self.declare(id, BindingKind::ClassExprName)?;
        }
        if let Some(sup) = &mut c.super_class {
            self.expr(sup)?;
        }
        for member in &mut c.body {
            match member {
                ClassMember::Method(m) => {
                    self.prop_key(&mut m.key)?;
                    self.function(&mut m.value, FnName::Outer)?;
                }
                ClassMember::Property(p) => {
                    self.prop_key(&mut p.key)?;
                    if let Some(value) = &mut p.value {
                        self.expr(value)?;
                    }
                }
                ClassMember::StaticBlock(b) => {
                    self.enter_scope(ScopeKind::Function, b.loc, true);
                    self.stmts(&mut b.body)?;
                    self.exit_scope();
                }
            }
        }
        self.exit_scope();
        Ok(())
    }

    fn prop_key(&mut self, key: &mut PropKey) -> SquashResult<()> {
        if let PropKey::Computed(e) = key {
            self.expr(e)?;
        }
        Ok(())
    }

    // ── Expressions ──────────────────────────────────────────────────────────

    fn expr(&mut self, expr: &mut Expr) -> SquashResult<()> {
        match expr {
            Expr::Null(_)
            | Expr::Bool(_)
            | Expr::Num(_)
            | Expr::Str(_)
            | Expr::BigInt(_)
            | Expr::Regexp(_)
            | Expr::Super(_)
            | Expr::MetaProp(_) => {}
            Expr::This(_) => self.mark_this(),
            Expr::Ident(i) => self.reference(i, Access::Read),
            Expr::Template(t) => {
                for e in &mut t.expressions {
                    self.expr(e)?;
                }
            }
            Expr::Array(a) => {
                for el in a.elements.iter_mut().flatten() {
                    self.expr(el)?;
                }
            }
            Expr::Object(o) => {
                for prop in &mut o.properties {
                    match prop {
                        ObjectProp::Prop(p) => {
                            self.prop_key(&mut p.key)?;
                            match &mut p.value {
                                PropValue::Value(e) => self.expr(e)?,
                                PropValue::Get(f) | PropValue::Set(f) | PropValue::Method(f) => {
                                    self.function(f, FnName::Outer)?
                                }
                            }
                        }
                        ObjectProp::Spread(s) => self.expr(&mut s.argument)?,
                    }
                }
            }
            Expr::Fn(f) => self.function_expr(f)?,
            Expr::Arrow(a) => self.arrow(a)?,
            Expr::Class(c) => self.class(c, true)?,
            Expr::Unary(u) => self.expr(&mut u.argument)?,
            Expr::Update(u) => match &mut *u.argument {
                Expr::Ident(i) => self.reference(i, Access::ReadWrite),
                other => self.expr(other)?,
            },
            Expr::Binary(b) => {
                self.expr(&mut b.left)?;
                self.expr(&mut b.right)?;
            }
            Expr::Logical(l) => {
                self.expr(&mut l.left)?;
                self.expr(&mut l.right)?;
            }
            Expr::Conditional(c) => {
                self.expr(&mut c.test)?;
                self.expr(&mut c.consequent)?;
                self.expr(&mut c.alternate)?;
            }
            Expr::Assign(a) => {
                let access = if a.op == AssignOp::Assign {
                    Access::Write
                } else {
                    Access::ReadWrite
                };
                match &mut a.left {
                    AssignTarget::Expr(e) => match &mut **e {
                        Expr::Ident(i) => self.reference(i, access),
                        other => self.expr(other)?,
                    },
                    AssignTarget::Pat(p) => self.target_pat(p)?,
                }
                self.expr(&mut a.right)?;
            }
            Expr::Sequence(s) => {
                for e in &mut s.expressions {
                    self.expr(e)?;
                }
            }
            Expr::Member(m) => {
                self.expr(&mut m.object)?;
                if let MemberProp::Computed(p) = &mut m.property {
                    self.expr(p)?;
                }
            }
            Expr::Call(c) => {
                self.expr(&mut c.callee)?;
                for a in &mut c.arguments {
                    self.expr(a)?;
                }
            }
            Expr::New(n) => {
                self.expr(&mut n.callee)?;
                for a in &mut n.arguments {
                    self.expr(a)?;
                }
            }
            Expr::Chain(c) => self.expr(&mut c.expr)?,
            Expr::TaggedTemplate(t) => {
                self.expr(&mut t.tag)?;
                for e in &mut t.quasi.expressions {
                    self.expr(e)?;
                }
            }
            Expr::Spread(s) => self.expr(&mut s.argument)?,
            Expr::Yield(y) => {
                if let Some(arg) = &mut y.argument {
                    self.expr(arg)?;
                }
            }
            Expr::Await(a) => self.expr(&mut a.argument)?,
            Expr::Import(i) => {
                self.expr(&mut i.source)?;
                if let Some(o) = &mut i.options {
                    self.expr(o)?;
                }
            }
        }
        Ok(())
    }
}

/// Identifiers bound by a declaration statement.
pub fn declared_names<'a>(stmt: &'a Stmt, out: &mut Vec<&'a Ident>) {
    match stmt {
        Stmt::VarDecl(v) => {
            for d in &v.declarators {
                d.id.bound_names(out);
            }
        }
        Stmt::FnDecl(f) => out.extend(f.id.as_ref()),
        Stmt::ClassDecl(c) => out.extend(c.id.as_ref()),
        _ => {}
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser::{parse, ParseOptions};

    fn analyze(src: &str) -> (Program, ScopeTree) {
        let mut program = parse(src, &ParseOptions::default()).unwrap();
        let tree = resolve(&mut program, &ResolveOptions::default()).unwrap();
        (program, tree)
    }

    fn analyze_module(src: &str) -> (Program, ScopeTree) {
        let opts = ParseOptions {
            module: true,
            ..ParseOptions::default()
        };
        let mut program = parse(src, &opts).unwrap();
        let tree = resolve(&mut program, &ResolveOptions::default()).unwrap();
        (program, tree)
    }

    fn resolve_err(src: &str) -> SquashError {
        let mut program = parse(src, &ParseOptions::default()).unwrap();
        resolve(&mut program, &ResolveOptions::default()).unwrap_err()
    }

    fn symbols_named<'a>(tree: &'a ScopeTree, name: &str) -> Vec<&'a SymbolDef> {
        tree.symbols.iter().filter(|s| s.name == name).collect()
    }

    #[test]
    fn test_var_hoists_to_function_scope() {
        let (_, tree) = analyze("function f() { { var x = 1; } return x; }");
        let x = symbols_named(&tree, "x");
        assert_eq!(x.len(), 1);
        assert_eq!(tree.scope(x[0].scope).kind, ScopeKind::Function);
        assert_eq!(x[0].references.len(), 1);
        assert!(tree.globals.is_empty());
    }

    #[test]
    fn test_let_stays_in_block() {
        let (_, tree) = analyze("{ let x = 1; } x;");
        let x = symbols_named(&tree, "x");
        assert_eq!(x.len(), 2);
        assert_eq!(tree.scope(x[0].scope).kind, ScopeKind::Block);
        assert!(x[1].undeclared);
    }

    #[test]
    fn test_redeclaration_is_syntax_error() {
        let err = resolve_err("let a = 1;\nlet a = 2;");
        assert!(err.message().contains("'a' has already been declared"));
        assert_eq!(err.position(), Some((2, 4)));
        assert!(resolve_err("let b; var b;").message().contains("already been declared"));
        assert!(resolve_err("{ let c; { var c; } }").message().contains("already"));
        assert!(resolve_err("function f(a) { let a; }").message().contains("already"));
    }

    #[test]
    fn test_compatible_redeclarations() {
        let (_, tree) = analyze("var a; var a = 1; function f(){} function f(){} try {} catch (e) { var e; }");
        let a = symbols_named(&tree, "a");
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].declarations.len(), 2);
        assert_eq!(symbols_named(&tree, "f").len(), 1);
    }

    #[test]
    fn test_every_reference_is_bound() {
        let (program, tree) = analyze("var a = b; a(c);");
        let Stmt::Expr(e) = &program.body[1] else { panic!() };
        let Expr::Call(call) = &*e.expr else { panic!() };
        let callee = call.callee.as_ident().unwrap();
        assert_eq!(tree.symbol_of(callee).unwrap().name, "a");
        assert!(tree.globals.contains_key("b"));
        assert!(tree.globals.contains_key("c"));
    }

    #[test]
    fn test_enclosed_and_escaped() {
        let (_, tree) = analyze("function f() { var x; return function g() { return x; }; }");
        let x = symbols_named(&tree, "x")[0];
        assert!(x.escaped);
        let f_scope = x.scope;
        let g_scope = tree.scope(f_scope).children[0];
        assert!(tree.scope(g_scope).enclosed.contains(&x.id));
        assert!(tree.scope(f_scope).enclosed.contains(&x.id));
        assert!(!tree.scope(tree.root()).enclosed.contains(&x.id));
    }

    #[test]
    fn test_reads_and_writes_counted() {
        let (_, tree) = analyze("var a = 1; a = 2; a++; b(a); for (var k in o) k;");
        let a = symbols_named(&tree, "a")[0];
        assert_eq!(a.references.len(), 2);
        assert_eq!(a.assignments, 2);
        let k = symbols_named(&tree, "k")[0];
        assert_eq!(k.assignments, 1);
    }

    #[test]
    fn test_eval_pins_scope_chain() {
        let (_, tree) = analyze("function f() { var a; function g() { eval('a'); } } function h() {}");
        let a = symbols_named(&tree, "a")[0];
        assert!(tree.is_pinned(a.id));
        assert!(tree.scope(tree.root()).pinned);
        let h = tree.scope(tree.root()).children[1];
        assert!(!tree.scope(h).pinned);
    }

    #[test]
    fn test_with_pins_scope() {
        let (_, tree) = analyze("function f(o) { var x; with (o) { x; } }");
        let x = symbols_named(&tree, "x")[0];
        assert!(tree.is_pinned(x.id));
    }

    #[test]
    fn test_arguments_and_this() {
        let (_, tree) = analyze("function f() { return () => arguments[0] + this.x; }");
        let f = tree.scope(tree.root()).children[0];
        assert!(tree.scope(f).uses_arguments);
        assert!(tree.scope(f).uses_this);
        let args = symbols_named(&tree, "arguments")[0];
        assert_eq!(args.kind, BindingKind::Arguments);
        assert!(!args.undeclared);
    }

    #[test]
    fn test_function_expression_name_is_inner() {
        let (_, tree) = analyze("var g = function f() { return f; }; f;");
        let f = symbols_named(&tree, "f");
        assert_eq!(f.len(), 2);
        assert_eq!(f[0].kind, BindingKind::FnExprName);
        assert_eq!(f[0].references.len(), 1);
        assert!(f[1].undeclared);
    }

    #[test]
    fn test_ie8_leaks_function_expression_name() {
        let mut program = parse("var g = function f() {}; f;", &ParseOptions::default()).unwrap();
        let tree = resolve(&mut program, &ResolveOptions { ie8: true }).unwrap();
        let f = symbols_named(&tree, "f");
        assert_eq!(f.len(), 1);
        assert!(!f[0].undeclared);
        assert_eq!(f[0].scope, tree.root());
    }

    #[test]
    fn test_catch_param_scope() {
        let (_, tree) = analyze("try {} catch (e) { e; } e;");
        let e = symbols_named(&tree, "e");
        assert_eq!(e.len(), 2);
        assert_eq!(e[0].kind, BindingKind::CatchParam);
        assert_eq!(tree.scope(e[0].scope).kind, ScopeKind::Catch);
    }

    #[test]
    fn test_exports_marked() {
        let (_, tree) = analyze_module("var a = 1; let b = 2; export { a }; export function f() {} export default class C {}");
        assert!(symbols_named(&tree, "a")[0].exported);
        assert!(!symbols_named(&tree, "b")[0].exported);
        assert!(symbols_named(&tree, "f")[0].exported);
        assert!(symbols_named(&tree, "C")[0].exported);
        assert_eq!(tree.scope(tree.root()).kind, ScopeKind::Module);
        assert!(tree.scope(tree.root()).strict);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut program = parse("var a = 1; function f(b) { return a + b; } f(a);", &ParseOptions::default()).unwrap();
        let first = resolve(&mut program, &ResolveOptions::default()).unwrap();
        let second = resolve(&mut program, &ResolveOptions::default()).unwrap();
        assert_eq!(first.symbols.len(), second.symbols.len());
        for (a, b) in first.symbols.iter().zip(&second.symbols) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.references.len(), b.references.len());
        }
    }

    #[test]
    fn test_strictness_inherited() {
        let (_, tree) = analyze("function f() { 'use strict'; function g() {} } function h() {}");
        let root = tree.root();
        let f = tree.scope(root).children[0];
        let g = tree.scope(f).children[0];
        let h = tree.scope(root).children[1];
        assert!(tree.scope(g).strict);
        assert!(!tree.scope(h).strict);
    }

    #[test]
    fn test_lookup_and_var_scope() {
        let (_, tree) = analyze("var a; { let b; }");
        let block = tree.scope(tree.root()).children[0];
        assert!(tree.lookup(block, "a").is_some());
        assert!(tree.lookup(tree.root(), "b").is_none());
        assert_eq!(tree.var_scope(block), tree.root());
        assert_eq!(tree.ancestors(block).count(), 2);
    }

    #[test]
    fn test_apply_mangled_names() {
        let options = ResolveOptions::default();
        let mut program = parse("function f(long) { var other = long; return other; }", &ParseOptions::default()).unwrap();
        let mut tree = resolve(&mut program, &options).unwrap();
        for def in &mut tree.symbols {
            match def.name.as_str() {
                "long" => def.mangled_name = Some("a".into()),
                "other" => def.mangled_name = Some("b".into()),
                _ => {}
            }
        }
        apply_mangled_names(&mut program, tree, &options).unwrap();
        let Stmt::FnDecl(f) = &program.body[0] else { panic!("expected function") };
        assert_eq!(f.id.as_ref().unwrap().name, "f");
        let Pat::Ident(param) = &f.params[0] else { panic!("expected identifier") };
        assert_eq!(param.name, "a");
        let Stmt::Return(ret) = &f.body.body[1] else { panic!("expected return") };
        assert!(matches!(ret.argument.as_deref(), Some(Expr::Ident(i)) if i.name == "b"));
    }
}
