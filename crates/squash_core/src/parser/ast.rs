//! JavaScript Abstract Syntax Tree node definitions.
//!
//! Every node struct carries a [`SourceLocation`] field (`loc`) that pinpoints
//! its position in the source text.  [`SourceLocation`] is a type alias for
//! [`crate::parser::scanner::Span`] so it is [`Copy`].  Nodes own their
//! children exclusively; rewrites replace whole subtrees.
//!
//! # Structure
//!
//! - [`Program`] — root node.
//! - [`Stmt`] — statement nodes.
//! - [`Expr`] — expression nodes.
//! - [`Pat`] — binding/assignment pattern nodes.
//! - [`ModuleDecl`] — `import`/`export` module declarations.
//! - [`Function`] and [`Class`] — shared by declarations and expressions.
//! - Literal types: [`NullLit`], [`BoolLit`], [`NumLit`], [`BigIntLit`],
//!   [`StringLit`], [`RegExpLit`], [`TemplateLit`].

use crate::parser::scanner::{Comment, Span};
use crate::parser::scope::SymbolId;

// ─────────────────────────────────────────────────────────────────────────────
// Source location
// ─────────────────────────────────────────────────────────────────────────────

/// Source location attached to every AST node — a half-open `[start, end)`
/// span in one input unit.
pub type SourceLocation = Span;

// ─────────────────────────────────────────────────────────────────────────────
// Program
// ─────────────────────────────────────────────────────────────────────────────

/// Whether the source file is a classic script or an ES module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    /// A classic `<script>` — top-level `import`/`export` are not allowed.
    Script,
    /// An ES module — top-level `import`/`export` statements are allowed.
    Module,
}

/// The root node: one or more input units concatenated in order.
#[derive(Debug, Clone)]
pub struct Program {
    /// Source location of the entire program.
    pub loc: SourceLocation,
    /// Whether the file is a script or a module.
    pub source_type: SourceType,
    /// Top-level statements, module declarations included.
    pub body: Vec<Stmt>,
    /// Every comment seen while parsing, in source order per unit.
    pub comments: Vec<Comment>,
    /// `#!` line of the first unit, without the `#!`.
    pub shebang: Option<String>,
    /// Input unit names; [`Span::file`] indexes this list.
    pub files: Vec<String>,
}

impl Program {
    /// An empty script program.
    pub fn empty() -> Self {
        Program {
            loc: Span::dummy(),
            source_type: SourceType::Script,
            body: Vec::new(),
            comments: Vec::new(),
            shebang: None,
            files: Vec::new(),
        }
    }

    /// Name of the input unit a span belongs to.
    pub fn file_name(&self, loc: SourceLocation) -> &str {
        self.files.get(loc.file as usize).map(String::as_str).unwrap_or("")
    }

    /// Append the statements, comments and file names of `other`.
    ///
    /// Span file indices of `other` must already be offset by the caller.
    pub fn append(&mut self, other: Program) {
        if self.body.is_empty() && self.files.is_empty() {
            self.loc = other.loc;
            self.shebang = other.shebang;
        } else {
            self.loc = self.loc.to(other.loc);
        }
        if other.source_type == SourceType::Module {
            self.source_type = SourceType::Module;
        }
        self.body.extend(other.body);
        self.comments.extend(other.comments);
        self.files.extend(other.files);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Common helpers
// ─────────────────────────────────────────────────────────────────────────────

/// A JavaScript identifier (reference, binding, or property name).
#[derive(Debug, Clone)]
pub struct Ident {
    /// Source location.
    pub loc: SourceLocation,
    /// The identifier text (escapes decoded).
    pub name: String,
    /// Symbol this identifier binds to; filled in by the resolver for
    /// references and bindings, `None` for property names.
    pub symbol: Option<SymbolId>,
}

impl Ident {
    /// A fresh, unresolved identifier.
    pub fn new(name: impl Into<String>, loc: SourceLocation) -> Self {
        Ident {
            loc,
            name: name.into(),
            symbol: None,
        }
    }
}

/// A private identifier beginning with `#` (class fields/methods).
#[derive(Debug, Clone)]
pub struct PrivateIdent {
    /// Source location.
    pub loc: SourceLocation,
    /// The identifier text, **without** the leading `#`.
    pub name: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Statements
// ─────────────────────────────────────────────────────────────────────────────

/// A JavaScript statement.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// `{ … }` block statement.
    Block(BlockStmt),
    /// `var / let / const` variable declaration.
    VarDecl(VarDecl),
    /// `function` declaration.
    FnDecl(Box<Function>),
    /// `class` declaration.
    ClassDecl(Box<Class>),
    /// Expression statement (`expr ;`).
    Expr(ExprStmt),
    /// `if (test) consequent else alternate`
    If(IfStmt),
    /// `for (init; test; update) body`
    For(ForStmt),
    /// `for (left in right) body`
    ForIn(ForInStmt),
    /// `for [await] (left of right) body`
    ForOf(ForOfStmt),
    /// `while (test) body`
    While(WhileStmt),
    /// `do body while (test);`
    DoWhile(DoWhileStmt),
    /// `switch (discriminant) { cases }`
    Switch(SwitchStmt),
    /// `try { … } catch (…) { … } finally { … }`
    Try(Box<TryStmt>),
    /// `return argument?;`
    Return(ReturnStmt),
    /// `throw argument;`
    Throw(ThrowStmt),
    /// `break label?;`
    Break(BreakStmt),
    /// `continue label?;`
    Continue(ContinueStmt),
    /// `label: body`
    Labeled(LabeledStmt),
    /// `debugger;`
    Debugger(DebuggerStmt),
    /// `with (object) body`
    With(WithStmt),
    /// Empty statement `;`.
    Empty(EmptyStmt),
    /// A directive-prologue string such as `"use strict"`.
    Directive(Directive),
    /// `import` / `export` declaration (module goal only).
    Module(Box<ModuleDecl>),
}

impl Stmt {
    /// Returns the source location of this statement.
    pub fn loc(&self) -> SourceLocation {
        match self {
            Stmt::Block(s) => s.loc,
            Stmt::VarDecl(s) => s.loc,
            Stmt::FnDecl(s) => s.loc,
            Stmt::ClassDecl(s) => s.loc,
            Stmt::Expr(s) => s.loc,
            Stmt::If(s) => s.loc,
            Stmt::For(s) => s.loc,
            Stmt::ForIn(s) => s.loc,
            Stmt::ForOf(s) => s.loc,
            Stmt::While(s) => s.loc,
            Stmt::DoWhile(s) => s.loc,
            Stmt::Switch(s) => s.loc,
            Stmt::Try(s) => s.loc,
            Stmt::Return(s) => s.loc,
            Stmt::Throw(s) => s.loc,
            Stmt::Break(s) => s.loc,
            Stmt::Continue(s) => s.loc,
            Stmt::Labeled(s) => s.loc,
            Stmt::Debugger(s) => s.loc,
            Stmt::With(s) => s.loc,
            Stmt::Empty(s) => s.loc,
            Stmt::Directive(s) => s.loc,
            Stmt::Module(s) => s.loc(),
        }
    }

    /// An empty statement at `loc`.
    pub fn empty(loc: SourceLocation) -> Stmt {
        Stmt::Empty(EmptyStmt { loc })
    }

    /// Wrap an expression in an expression statement.
    pub fn expr(expr: Expr) -> Stmt {
        Stmt::Expr(ExprStmt {
            loc: expr.loc(),
            expr: Box::new(expr),
        })
    }

    /// A block holding `body`, or the single statement itself.
    pub fn block_or_single(loc: SourceLocation, mut body: Vec<Stmt>) -> Stmt {
        if body.len() == 1 && !body[0].is_lexical_declaration() {
            return body.remove(0);
        }
        Stmt::Block(BlockStmt { loc, body })
    }

    /// `true` for `;`.
    pub fn is_empty(&self) -> bool {
        matches!(self, Stmt::Empty(_))
    }

    /// `true` for statements that declare block-scoped bindings and so
    /// cannot be hoisted out of a `{}` without changing scoping.
    pub fn is_lexical_declaration(&self) -> bool {
        match self {
            Stmt::VarDecl(v) => v.kind != VarKind::Var,
            Stmt::ClassDecl(_) | Stmt::FnDecl(_) => true,
            _ => false,
        }
    }

    /// `true` for `return`, `throw`, `break` and `continue`.
    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            Stmt::Return(_) | Stmt::Throw(_) | Stmt::Break(_) | Stmt::Continue(_)
        )
    }
}

/// `{ statements }` block statement.
#[derive(Debug, Clone)]
pub struct BlockStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Statements in the block.
    pub body: Vec<Stmt>,
}

/// Expression statement: `expr ;`
#[derive(Debug, Clone)]
pub struct ExprStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// The expression.
    pub expr: Box<Expr>,
}

/// `if (test) consequent [else alternate]`
#[derive(Debug, Clone)]
pub struct IfStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// The condition.
    pub test: Box<Expr>,
    /// Taken branch.
    pub consequent: Box<Stmt>,
    /// Not-taken branch, if present.
    pub alternate: Option<Box<Stmt>>,
}

/// `for (init; test; update) body`
#[derive(Debug, Clone)]
pub struct ForStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Optional initializer.
    pub init: Option<ForInit>,
    /// Optional loop condition.
    pub test: Option<Box<Expr>>,
    /// Optional update expression.
    pub update: Option<Box<Expr>>,
    /// Loop body.
    pub body: Box<Stmt>,
}

/// The initializer slot in a C-style `for` statement.
#[derive(Debug, Clone)]
pub enum ForInit {
    /// `var / let / const` declaration.
    VarDecl(VarDecl),
    /// Plain expression.
    Expr(Box<Expr>),
}

/// `for (left in right) body`
#[derive(Debug, Clone)]
pub struct ForInStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Left-hand side binding.
    pub left: ForInOfLeft,
    /// The object being iterated.
    pub right: Box<Expr>,
    /// Loop body.
    pub body: Box<Stmt>,
}

/// `for [await] (left of right) body`
#[derive(Debug, Clone)]
pub struct ForOfStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// `true` for `for await (…)`.
    pub is_await: bool,
    /// Left-hand side binding.
    pub left: ForInOfLeft,
    /// The iterable.
    pub right: Box<Expr>,
    /// Loop body.
    pub body: Box<Stmt>,
}

/// The left-hand side of a `for-in` or `for-of` statement.
#[derive(Debug, Clone)]
pub enum ForInOfLeft {
    /// `var / let / const` declaration.
    VarDecl(VarDecl),
    /// An assignment target (identifier, member, or destructuring).
    Pat(Pat),
}

/// `while (test) body`
#[derive(Debug, Clone)]
pub struct WhileStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Loop condition.
    pub test: Box<Expr>,
    /// Loop body.
    pub body: Box<Stmt>,
}

/// `do body while (test);`
#[derive(Debug, Clone)]
pub struct DoWhileStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Loop body.
    pub body: Box<Stmt>,
    /// Loop condition.
    pub test: Box<Expr>,
}

/// `switch (discriminant) { cases }`
#[derive(Debug, Clone)]
pub struct SwitchStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// The value being switched on.
    pub discriminant: Box<Expr>,
    /// The `case` / `default` clauses.
    pub cases: Vec<SwitchCase>,
}

/// A single `case expr:` or `default:` clause in a `switch` statement.
#[derive(Debug, Clone)]
pub struct SwitchCase {
    /// Source location.
    pub loc: SourceLocation,
    /// `None` for the `default:` clause; `Some(expr)` for `case expr:`.
    pub test: Option<Expr>,
    /// Body statements for this clause.
    pub consequent: Vec<Stmt>,
}

/// `try { block } catch (param) { handler } finally { finalizer }`
#[derive(Debug, Clone)]
pub struct TryStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// The `try` block.
    pub block: BlockStmt,
    /// Optional `catch` clause.
    pub handler: Option<CatchClause>,
    /// Optional `finally` block.
    pub finalizer: Option<BlockStmt>,
}

/// `catch (param) body`
#[derive(Debug, Clone)]
pub struct CatchClause {
    /// Source location.
    pub loc: SourceLocation,
    /// Binding parameter; `None` for optional-catch `catch { … }`.
    pub param: Option<Pat>,
    /// The catch block.
    pub body: BlockStmt,
}

/// `return argument?;`
#[derive(Debug, Clone)]
pub struct ReturnStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Optional return value.
    pub argument: Option<Box<Expr>>,
}

/// `throw argument;`
#[derive(Debug, Clone)]
pub struct ThrowStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// The thrown value.
    pub argument: Box<Expr>,
}

/// `break label?;`
#[derive(Debug, Clone)]
pub struct BreakStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Optional target label.
    pub label: Option<Ident>,
}

/// `continue label?;`
#[derive(Debug, Clone)]
pub struct ContinueStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// Optional target label.
    pub label: Option<Ident>,
}

/// `label: body`
#[derive(Debug, Clone)]
pub struct LabeledStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// The label identifier.
    pub label: Ident,
    /// The labeled statement.
    pub body: Box<Stmt>,
}

/// `debugger;`
#[derive(Debug, Clone)]
pub struct DebuggerStmt {
    /// Source location.
    pub loc: SourceLocation,
}

/// `with (object) body`
#[derive(Debug, Clone)]
pub struct WithStmt {
    /// Source location.
    pub loc: SourceLocation,
    /// The scope object.
    pub object: Box<Expr>,
    /// The body statement.
    pub body: Box<Stmt>,
}

/// Empty statement `;`.
#[derive(Debug, Clone)]
pub struct EmptyStmt {
    /// Source location.
    pub loc: SourceLocation,
}

/// A string-literal statement in a directive prologue.
#[derive(Debug, Clone)]
pub struct Directive {
    /// Source location.
    pub loc: SourceLocation,
    /// The literal exactly as written, quotes included.
    pub raw: String,
}

impl Directive {
    /// The directive text without quotes.
    pub fn value(&self) -> &str {
        self.raw
            .get(1..self.raw.len().saturating_sub(1))
            .unwrap_or("")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Variable declarations
// ─────────────────────────────────────────────────────────────────────────────

/// `var / let / const declarators`
#[derive(Debug, Clone)]
pub struct VarDecl {
    /// Source location.
    pub loc: SourceLocation,
    /// Declaration keyword.
    pub kind: VarKind,
    /// One or more declarators.
    pub declarators: Vec<VarDeclarator>,
}

/// Whether a variable declaration uses `var`, `let`, or `const`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    /// `var` — function-scoped.
    Var,
    /// `let` — block-scoped, reassignable.
    Let,
    /// `const` — block-scoped, non-reassignable.
    Const,
}

impl VarKind {
    /// The declaration keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            VarKind::Var => "var",
            VarKind::Let => "let",
            VarKind::Const => "const",
        }
    }
}

/// A single `pattern [= initializer]` in a variable declaration.
#[derive(Debug, Clone)]
pub struct VarDeclarator {
    /// Source location.
    pub loc: SourceLocation,
    /// The binding pattern.
    pub id: Pat,
    /// Optional initializer expression.
    pub init: Option<Box<Expr>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Functions
// ─────────────────────────────────────────────────────────────────────────────

/// `[async] function[*] [id] (params) { body }`, used for declarations,
/// expressions, methods and accessors.
#[derive(Debug, Clone)]
pub struct Function {
    /// Source location.
    pub loc: SourceLocation,
    /// Function name; always `Some` for declarations except
    /// `export default function () {}`.
    pub id: Option<Ident>,
    /// `true` for `async function`.
    pub is_async: bool,
    /// `true` for generator functions (`function*`).
    pub is_generator: bool,
    /// Parameter patterns; defaults are [`Pat::Assign`], rest is [`Pat::Rest`].
    pub params: Vec<Pat>,
    /// Function body, directive prologue included.
    pub body: BlockStmt,
}

impl Function {
    /// `true` when the body starts with a `"use strict"` directive.
    pub fn has_directive(&self, name: &str) -> bool {
        has_directive(&self.body.body, name)
    }

    /// `true` when every parameter is a plain identifier.
    pub fn has_simple_params(&self) -> bool {
        self.params.iter().all(|p| matches!(p, Pat::Ident(_)))
    }
}

/// `true` when the directive prologue of `body` contains `name`.
pub fn has_directive(body: &[Stmt], name: &str) -> bool {
    body.iter()
        .map_while(|s| match s {
            Stmt::Directive(d) => Some(d),
            _ => None,
        })
        .any(|d| d.value() == name)
}

/// `[async] (params) => body`
#[derive(Debug, Clone)]
pub struct ArrowExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// `true` for `async (…) => …`.
    pub is_async: bool,
    /// Parameter patterns.
    pub params: Vec<Pat>,
    /// Either a block body `{ … }` or a concise expression body.
    pub body: ArrowBody,
}

/// The body of an arrow function.
#[derive(Debug, Clone)]
pub enum ArrowBody {
    /// `{ statements }` block body.
    Block(BlockStmt),
    /// Concise expression body.
    Expr(Box<Expr>),
}

// ─────────────────────────────────────────────────────────────────────────────
// Classes
// ─────────────────────────────────────────────────────────────────────────────

/// `class [id] [extends superClass] { body }`, declaration or expression.
#[derive(Debug, Clone)]
pub struct Class {
    /// Source location.
    pub loc: SourceLocation,
    /// Class name; always `Some` for declarations except
    /// `export default class {}`.
    pub id: Option<Ident>,
    /// Optional super-class expression.
    pub super_class: Option<Box<Expr>>,
    /// Members: methods, fields, and static blocks.
    pub body: Vec<ClassMember>,
}

/// A member inside a class body.
#[derive(Debug, Clone)]
pub enum ClassMember {
    /// A method definition (`constructor`, regular, getter, or setter).
    Method(MethodDef),
    /// A class field (public or private).
    Property(PropertyDef),
    /// A `static { … }` initialization block.
    StaticBlock(StaticBlock),
}

/// `[static] [get|set] key(params) { body }`
#[derive(Debug, Clone)]
pub struct MethodDef {
    /// Source location.
    pub loc: SourceLocation,
    /// `true` for `static` methods.
    pub is_static: bool,
    /// `constructor`, `method`, `get`, or `set`.
    pub kind: MethodKind,
    /// The property key.
    pub key: PropKey,
    /// The method's function value.
    pub value: Box<Function>,
}

/// The variant of a class method definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// `constructor`.
    Constructor,
    /// Regular method.
    Method,
    /// Getter (`get key() { … }`).
    Get,
    /// Setter (`set key(v) { … }`).
    Set,
}

/// `[static] key [= value]` — class field definition.
#[derive(Debug, Clone)]
pub struct PropertyDef {
    /// Source location.
    pub loc: SourceLocation,
    /// `true` for static fields.
    pub is_static: bool,
    /// The field key.
    pub key: PropKey,
    /// Optional field initializer.
    pub value: Option<Box<Expr>>,
}

/// `static { … }` initialization block inside a class body.
#[derive(Debug, Clone)]
pub struct StaticBlock {
    /// Source location.
    pub loc: SourceLocation,
    /// Body statements.
    pub body: Vec<Stmt>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Module declarations
// ─────────────────────────────────────────────────────────────────────────────

/// A top-level module declaration (`import` or `export`).
#[derive(Debug, Clone)]
pub enum ModuleDecl {
    /// `import … from "source"`
    Import(ImportDecl),
    /// `export { … } [from "source"]` or `export declaration`
    ExportNamed(ExportNamedDecl),
    /// `export default …`
    ExportDefault(ExportDefaultDecl),
    /// `export * [as name] from "source"`
    ExportAll(ExportAllDecl),
}

impl ModuleDecl {
    /// Returns the source location of this declaration.
    pub fn loc(&self) -> SourceLocation {
        match self {
            ModuleDecl::Import(d) => d.loc,
            ModuleDecl::ExportNamed(d) => d.loc,
            ModuleDecl::ExportDefault(d) => d.loc,
            ModuleDecl::ExportAll(d) => d.loc,
        }
    }
}

/// `import specifiers from "source"`
#[derive(Debug, Clone)]
pub struct ImportDecl {
    /// Source location.
    pub loc: SourceLocation,
    /// The imported bindings.
    pub specifiers: Vec<ImportSpecifier>,
    /// The module specifier string.
    pub source: StringLit,
}

/// A single binding inside an `import` declaration.
#[derive(Debug, Clone)]
pub enum ImportSpecifier {
    /// `{ imported as local }` or `{ local }`.
    Named {
        /// The name as exported from the module.
        imported: ModuleExportName,
        /// The local binding.
        local: Ident,
    },
    /// Default import: `defaultExport`.
    Default(Ident),
    /// Namespace import: `* as ns`.
    Namespace(Ident),
}

/// `export { specifiers } [from "source"]` or `export declaration`
#[derive(Debug, Clone)]
pub struct ExportNamedDecl {
    /// Source location.
    pub loc: SourceLocation,
    /// Named export specifiers.
    pub specifiers: Vec<ExportSpecifier>,
    /// Re-export source, if present.
    pub source: Option<StringLit>,
    /// Inline declaration (`export function f() { … }`, etc.).
    pub declaration: Option<Box<Stmt>>,
}

/// `{ local as exported }` — named export specifier.
#[derive(Debug, Clone)]
pub struct ExportSpecifier {
    /// The local (or re-exported) name.
    pub local: ModuleExportName,
    /// The exported name.
    pub exported: ModuleExportName,
}

/// `export default expression | function | class`
#[derive(Debug, Clone)]
pub struct ExportDefaultDecl {
    /// Source location.
    pub loc: SourceLocation,
    /// The exported default value.
    pub declaration: ExportDefaultExpr,
}

/// The exported item in an `export default …` declaration.
#[derive(Debug, Clone)]
pub enum ExportDefaultExpr {
    /// `export default function [id] (…) { … }`
    Fn(Box<Function>),
    /// `export default class [id] { … }`
    Class(Box<Class>),
    /// `export default expr`
    Expr(Box<Expr>),
}

/// `export * [as name] from "source"`
#[derive(Debug, Clone)]
pub struct ExportAllDecl {
    /// Source location.
    pub loc: SourceLocation,
    /// Optional re-export alias (`as name`).
    pub exported: Option<ModuleExportName>,
    /// The source module specifier.
    pub source: StringLit,
}

/// An identifier or string literal used as a module export/import name.
#[derive(Debug, Clone)]
pub enum ModuleExportName {
    /// Plain identifier.
    Ident(Ident),
    /// String literal (allows non-identifier export names).
    Str(StringLit),
}

impl ModuleExportName {
    /// The exported name as a string.
    pub fn name(&self) -> &str {
        match self {
            ModuleExportName::Ident(i) => &i.name,
            ModuleExportName::Str(s) => &s.value,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Literals
// ─────────────────────────────────────────────────────────────────────────────

/// `null` literal.
#[derive(Debug, Clone)]
pub struct NullLit {
    /// Source location.
    pub loc: SourceLocation,
}

/// `true` or `false` literal.
#[derive(Debug, Clone)]
pub struct BoolLit {
    /// Source location.
    pub loc: SourceLocation,
    /// The boolean value.
    pub value: bool,
}

/// Numeric literal.  Always non-negative as parsed; negative values are
/// produced as unary minus.
#[derive(Debug, Clone)]
pub struct NumLit {
    /// Source location.
    pub loc: SourceLocation,
    /// The numeric value.
    pub value: f64,
}

/// BigInt literal (e.g. `42n`).
#[derive(Debug, Clone)]
pub struct BigIntLit {
    /// Source location.
    pub loc: SourceLocation,
    /// The digits, radix prefix kept, no trailing `n`.
    pub value: String,
}

/// String literal.
#[derive(Debug, Clone)]
pub struct StringLit {
    /// Source location.
    pub loc: SourceLocation,
    /// The decoded string value.
    pub value: String,
    /// Literal as written, kept only when `value` could not represent it
    /// (lone surrogates).
    pub raw: Option<String>,
}

impl StringLit {
    /// A synthesized string literal.
    pub fn new(value: impl Into<String>, loc: SourceLocation) -> Self {
        StringLit {
            loc,
            value: value.into(),
            raw: None,
        }
    }
}

/// Regular-expression literal `/pattern/flags`.
#[derive(Debug, Clone)]
pub struct RegExpLit {
    /// Source location.
    pub loc: SourceLocation,
    /// The pattern string (between the slashes).
    pub pattern: String,
    /// The flag characters (after the closing slash).
    pub flags: String,
}

/// `` `quasis ${expressions} quasis` `` — template literal.
#[derive(Debug, Clone)]
pub struct TemplateLit {
    /// Source location.
    pub loc: SourceLocation,
    /// The string parts (one more than `expressions`).
    pub quasis: Vec<TemplateElement>,
    /// The interpolated expressions.
    pub expressions: Vec<Expr>,
}

/// A static string fragment inside a template literal.
#[derive(Debug, Clone)]
pub struct TemplateElement {
    /// Source location.
    pub loc: SourceLocation,
    /// Raw source text of this fragment (backslashes not interpreted).
    pub raw: String,
    /// Cooked (decoded) value; `None` if the fragment has an invalid escape.
    pub cooked: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────────────

/// A JavaScript expression.
#[derive(Debug, Clone)]
pub enum Expr {
    // ── Literals ──────────────────────────────────────────────────────────
    /// `null`
    Null(NullLit),
    /// `true` / `false`
    Bool(BoolLit),
    /// Numeric literal.
    Num(NumLit),
    /// String literal.
    Str(StringLit),
    /// BigInt literal (`42n`).
    BigInt(BigIntLit),
    /// Regular-expression literal.
    Regexp(RegExpLit),
    /// Template literal.
    Template(Box<TemplateLit>),

    // ── Primary ───────────────────────────────────────────────────────────
    /// Plain identifier.
    Ident(Ident),
    /// `this`
    This(ThisExpr),
    /// `super` (only as a callee or member object).
    Super(SuperExpr),
    /// Array literal `[elements]`.
    Array(Box<ArrayExpr>),
    /// Object literal `{ properties }`.
    Object(Box<ObjectExpr>),

    // ── Function-like ─────────────────────────────────────────────────────
    /// Function expression.
    Fn(Box<Function>),
    /// Arrow function expression.
    Arrow(Box<ArrowExpr>),
    /// Class expression.
    Class(Box<Class>),

    // ── Operators ─────────────────────────────────────────────────────────
    /// Unary prefix operator.
    Unary(Box<UnaryExpr>),
    /// `++` / `--` update expression.
    Update(Box<UpdateExpr>),
    /// Binary infix operator.
    Binary(Box<BinaryExpr>),
    /// Logical `&&` / `||` / `??` operator.
    Logical(Box<LogicalExpr>),
    /// `test ? consequent : alternate`
    Conditional(Box<ConditionalExpr>),
    /// Assignment expression (`=`, `+=`, …).
    Assign(Box<AssignExpr>),
    /// Comma-separated sequence `(a, b, c)`.
    Sequence(Box<SequenceExpr>),

    // ── Member / call ─────────────────────────────────────────────────────
    /// `object.property` / `object[expr]` / `object?.property`
    Member(Box<MemberExpr>),
    /// `callee(args)` / `callee?.(args)`
    Call(Box<CallExpr>),
    /// `new callee(args)`
    New(Box<NewExpr>),
    /// The extent of an optional chain: everything a `?.` short-circuits.
    Chain(Box<ChainExpr>),

    // ── Template ──────────────────────────────────────────────────────────
    /// `` tag`template` ``
    TaggedTemplate(Box<TaggedTemplateExpr>),

    // ── Spread ────────────────────────────────────────────────────────────
    /// `...argument` inside an array literal or function call.
    Spread(Box<SpreadElement>),

    // ── Async / generator ─────────────────────────────────────────────────
    /// `yield [*] [argument]`
    Yield(Box<YieldExpr>),
    /// `await argument`
    Await(Box<AwaitExpr>),

    // ── Dynamic import / meta ─────────────────────────────────────────────
    /// `import(source)`
    Import(Box<ImportExpr>),
    /// `import.meta` or `new.target`
    MetaProp(MetaPropExpr),
}

impl Expr {
    /// Returns the source location of this expression.
    pub fn loc(&self) -> SourceLocation {
        match self {
            Expr::Null(e) => e.loc,
            Expr::Bool(e) => e.loc,
            Expr::Num(e) => e.loc,
            Expr::Str(e) => e.loc,
            Expr::BigInt(e) => e.loc,
            Expr::Regexp(e) => e.loc,
            Expr::Template(e) => e.loc,
            Expr::Ident(e) => e.loc,
            Expr::This(e) => e.loc,
            Expr::Super(e) => e.loc,
            Expr::Array(e) => e.loc,
            Expr::Object(e) => e.loc,
            Expr::Fn(e) => e.loc,
            Expr::Arrow(e) => e.loc,
            Expr::Class(e) => e.loc,
            Expr::Unary(e) => e.loc,
            Expr::Update(e) => e.loc,
            Expr::Binary(e) => e.loc,
            Expr::Logical(e) => e.loc,
            Expr::Conditional(e) => e.loc,
            Expr::Assign(e) => e.loc,
            Expr::Sequence(e) => e.loc,
            Expr::Member(e) => e.loc,
            Expr::Call(e) => e.loc,
            Expr::New(e) => e.loc,
            Expr::Chain(e) => e.loc,
            Expr::TaggedTemplate(e) => e.loc,
            Expr::Spread(e) => e.loc,
            Expr::Yield(e) => e.loc,
            Expr::Await(e) => e.loc,
            Expr::Import(e) => e.loc,
            Expr::MetaProp(e) => e.loc,
        }
    }

    // ── Constructors for synthesized nodes ────────────────────────────────

    /// A numeric literal.
    pub fn num(value: f64, loc: SourceLocation) -> Expr {
        Expr::Num(NumLit { loc, value })
    }

    /// A string literal.
    pub fn str(value: impl Into<String>, loc: SourceLocation) -> Expr {
        Expr::Str(StringLit::new(value, loc))
    }

    /// A boolean literal.
    pub fn bool(value: bool, loc: SourceLocation) -> Expr {
        Expr::Bool(BoolLit { loc, value })
    }

    /// An unresolved identifier reference.
    pub fn ident(name: impl Into<String>, loc: SourceLocation) -> Expr {
        Expr::Ident(Ident::new(name, loc))
    }

    /// `void 0`, the canonical `undefined`.
    pub fn undefined(loc: SourceLocation) -> Expr {
        Expr::unary(UnaryOp::Void, Expr::num(0.0, loc), loc)
    }

    /// `op argument`.
    pub fn unary(op: UnaryOp, argument: Expr, loc: SourceLocation) -> Expr {
        Expr::Unary(Box::new(UnaryExpr {
            loc,
            op,
            argument: Box::new(argument),
        }))
    }

    /// `!argument`.
    pub fn not(argument: Expr) -> Expr {
        let loc = argument.loc();
        Expr::unary(UnaryOp::Not, argument, loc)
    }

    /// `left op right` for a binary operator.
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        let loc = left.loc().to(right.loc());
        Expr::Binary(Box::new(BinaryExpr {
            loc,
            op,
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    /// `left op right` for a short-circuit operator.
    pub fn logical(op: LogicalOp, left: Expr, right: Expr) -> Expr {
        let loc = left.loc().to(right.loc());
        Expr::Logical(Box::new(LogicalExpr {
            loc,
            op,
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    /// `test ? consequent : alternate`.
    pub fn conditional(test: Expr, consequent: Expr, alternate: Expr) -> Expr {
        let loc = test.loc().to(alternate.loc());
        Expr::Conditional(Box::new(ConditionalExpr {
            loc,
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }))
    }

    /// A comma sequence, flattened; a single expression is returned as is.
    pub fn sequence(exprs: Vec<Expr>) -> Expr {
        let mut flat = Vec::with_capacity(exprs.len());
        for e in exprs {
            match e {
                Expr::Sequence(s) => flat.extend(s.expressions),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            return flat.remove(0);
        }
        let loc = match (flat.first(), flat.last()) {
            (Some(a), Some(b)) => a.loc().to(b.loc()),
            _ => Span::dummy(),
        };
        Expr::Sequence(Box::new(SequenceExpr {
            loc,
            expressions: flat,
        }))
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// `true` for `null`, booleans, numbers, strings, BigInts and `void 0`.
    pub fn is_constant_literal(&self) -> bool {
        match self {
            Expr::Null(_) | Expr::Bool(_) | Expr::Num(_) | Expr::Str(_) | Expr::BigInt(_) => true,
            Expr::Unary(u) => {
                matches!(u.op, UnaryOp::Void | UnaryOp::Not | UnaryOp::Minus)
                    && u.argument.is_constant_literal()
            }
            _ => false,
        }
    }

    /// `true` for the `void <literal>` idiom.
    pub fn is_undefined(&self) -> bool {
        match self {
            Expr::Unary(u) => u.op == UnaryOp::Void && u.argument.is_constant_literal(),
            _ => false,
        }
    }

    /// Identifier name, if this is a plain reference.
    pub fn as_ident(&self) -> Option<&Ident> {
        match self {
            Expr::Ident(i) => Some(i),
            _ => None,
        }
    }

    /// `true` for function, arrow and class expressions.
    pub fn is_function_like(&self) -> bool {
        matches!(self, Expr::Fn(_) | Expr::Arrow(_) | Expr::Class(_))
    }
}

/// `this`
#[derive(Debug, Clone)]
pub struct ThisExpr {
    /// Source location.
    pub loc: SourceLocation,
}

/// `super`
#[derive(Debug, Clone)]
pub struct SuperExpr {
    /// Source location.
    pub loc: SourceLocation,
}

/// Array literal: `[elements]`.
#[derive(Debug, Clone)]
pub struct ArrayExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Elements, where `None` represents an elision (`,`).
    pub elements: Vec<Option<Expr>>,
}

/// Object literal: `{ properties }`.
#[derive(Debug, Clone)]
pub struct ObjectExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Property list.
    pub properties: Vec<ObjectProp>,
}

/// A single property (or spread) in an object literal.
#[derive(Debug, Clone)]
pub enum ObjectProp {
    /// `key: value`, shorthand, getter/setter, or method.
    Prop(Box<Prop>),
    /// `...expr` spread property.
    Spread(SpreadElement),
}

/// A concrete property in an object literal.  Shorthand `{ a }` is stored
/// as `{ a: a }`; the printer shortens it again.
#[derive(Debug, Clone)]
pub struct Prop {
    /// Source location.
    pub loc: SourceLocation,
    /// The property key.
    pub key: PropKey,
    /// The value/kind of this property.
    pub value: PropValue,
}

/// The key in an object property or class member.
#[derive(Debug, Clone)]
pub enum PropKey {
    /// Identifier key (keywords allowed).
    Ident(Ident),
    /// Private identifier key (`#name`).
    Private(PrivateIdent),
    /// String literal key.
    Str(StringLit),
    /// Numeric literal key.
    Num(NumLit),
    /// Computed key `[expr]`.
    Computed(Box<Expr>),
}

impl PropKey {
    /// The static key name, if the key is not computed.
    pub fn static_name(&self) -> Option<String> {
        match self {
            PropKey::Ident(i) => Some(i.name.clone()),
            PropKey::Str(s) => Some(s.value.clone()),
            PropKey::Num(n) => Some(crate::compress::evaluate::number_to_string(n.value)),
            PropKey::Private(_) | PropKey::Computed(_) => None,
        }
    }
}

/// The value of a property in an object literal.
#[derive(Debug, Clone)]
pub enum PropValue {
    /// `key: value` — standard property (also shorthand `{ key }`).
    Value(Box<Expr>),
    /// `get key() { … }` — getter.
    Get(Box<Function>),
    /// `set key(v) { … }` — setter.
    Set(Box<Function>),
    /// `key(params) { … }` — method.
    Method(Box<Function>),
}

/// `...argument` — spread element in array literals or function calls.
#[derive(Debug, Clone)]
pub struct SpreadElement {
    /// Source location.
    pub loc: SourceLocation,
    /// The spread argument.
    pub argument: Box<Expr>,
}

/// Unary prefix expression: `op argument`.
#[derive(Debug, Clone)]
pub struct UnaryExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The unary operator.
    pub op: UnaryOp,
    /// The operand.
    pub argument: Box<Expr>,
}

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `!`
    Not,
    /// `~`
    BitNot,
    /// `typeof`
    Typeof,
    /// `void`
    Void,
    /// `delete`
    Delete,
}

impl UnaryOp {
    /// Operator spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Minus => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Typeof => "typeof",
            UnaryOp::Void => "void",
            UnaryOp::Delete => "delete",
        }
    }
}

/// `++` / `--` update expression.
#[derive(Debug, Clone)]
pub struct UpdateExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// `++` or `--`.
    pub op: UpdateOp,
    /// `true` for prefix, `false` for postfix.
    pub prefix: bool,
    /// The operand (an identifier or member expression).
    pub argument: Box<Expr>,
}

/// The increment / decrement operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    /// `++`
    Increment,
    /// `--`
    Decrement,
}

impl UpdateOp {
    /// Operator spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateOp::Increment => "++",
            UpdateOp::Decrement => "--",
        }
    }
}

/// Binary infix expression: `left op right`.
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The binary operator.
    pub op: BinaryOp,
    /// Left operand.
    pub left: Box<Expr>,
    /// Right operand.
    pub right: Box<Expr>,
}

/// A binary (non-assignment, non-logical) infix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `>>>`
    UShr,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `**`
    Exp,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `&`
    BitAnd,
    /// `in`
    In,
    /// `instanceof`
    Instanceof,
}

impl BinaryOp {
    /// Operator spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Exp => "**",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::In => "in",
            BinaryOp::Instanceof => "instanceof",
        }
    }

    /// Binding power; higher binds tighter.  Logical operators sit below
    /// (see [`LogicalOp::precedence`]).
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::BitOr => 4,
            BinaryOp::BitXor => 5,
            BinaryOp::BitAnd => 6,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::StrictEq | BinaryOp::StrictNotEq => 7,
            BinaryOp::Lt
            | BinaryOp::LtEq
            | BinaryOp::Gt
            | BinaryOp::GtEq
            | BinaryOp::In
            | BinaryOp::Instanceof => 8,
            BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => 9,
            BinaryOp::Add | BinaryOp::Sub => 10,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 11,
            BinaryOp::Exp => 12,
        }
    }

    /// `true` for `==`, `!=`, `===`, `!==`.
    pub fn is_equality(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::StrictEq | BinaryOp::StrictNotEq
        )
    }

    /// `true` for operators whose result is always a boolean.
    pub fn is_boolean(self) -> bool {
        self.is_equality()
            || matches!(
                self,
                BinaryOp::Lt
                    | BinaryOp::LtEq
                    | BinaryOp::Gt
                    | BinaryOp::GtEq
                    | BinaryOp::In
                    | BinaryOp::Instanceof
            )
    }

    /// The operator `!(a op b)` can be rewritten to, if any.
    pub fn negated(self) -> Option<BinaryOp> {
        match self {
            BinaryOp::Eq => Some(BinaryOp::NotEq),
            BinaryOp::NotEq => Some(BinaryOp::Eq),
            BinaryOp::StrictEq => Some(BinaryOp::StrictNotEq),
            BinaryOp::StrictNotEq => Some(BinaryOp::StrictEq),
            _ => None,
        }
    }
}

/// Logical short-circuit expression: `left op right`.
#[derive(Debug, Clone)]
pub struct LogicalExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The logical operator.
    pub op: LogicalOp,
    /// Left operand.
    pub left: Box<Expr>,
    /// Right operand.
    pub right: Box<Expr>,
}

/// A logical (short-circuit) operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `??`
    NullishCoalesce,
}

impl LogicalOp {
    /// Operator spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
            LogicalOp::NullishCoalesce => "??",
        }
    }

    /// Binding power on the same scale as [`BinaryOp::precedence`].
    pub fn precedence(self) -> u8 {
        match self {
            LogicalOp::NullishCoalesce => 1,
            LogicalOp::Or => 2,
            LogicalOp::And => 3,
        }
    }
}

/// `test ? consequent : alternate`
#[derive(Debug, Clone)]
pub struct ConditionalExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The condition.
    pub test: Box<Expr>,
    /// Taken branch.
    pub consequent: Box<Expr>,
    /// Not-taken branch.
    pub alternate: Box<Expr>,
}

/// Assignment expression: `left op right`.
#[derive(Debug, Clone)]
pub struct AssignExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The assignment operator.
    pub op: AssignOp,
    /// Left-hand side (binding pattern or l-value expression).
    pub left: AssignTarget,
    /// Right-hand side.
    pub right: Box<Expr>,
}

/// The left-hand side of an assignment expression.
#[derive(Debug, Clone)]
pub enum AssignTarget {
    /// Identifier or member expression.
    Expr(Box<Expr>),
    /// Array or object destructuring pattern.
    Pat(Pat),
}

impl AssignTarget {
    /// The assigned identifier, for simple `name = …` targets.
    pub fn as_ident(&self) -> Option<&Ident> {
        match self {
            AssignTarget::Expr(e) => e.as_ident(),
            AssignTarget::Pat(_) => None,
        }
    }
}

/// An assignment operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
    /// `%=`
    RemAssign,
    /// `**=`
    ExpAssign,
    /// `<<=`
    ShlAssign,
    /// `>>=`
    ShrAssign,
    /// `>>>=`
    UShrAssign,
    /// `|=`
    BitOrAssign,
    /// `^=`
    BitXorAssign,
    /// `&=`
    BitAndAssign,
    /// `&&=`
    LogicalAndAssign,
    /// `||=`
    LogicalOrAssign,
    /// `??=`
    NullishAssign,
}

impl AssignOp {
    /// Operator spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::RemAssign => "%=",
            AssignOp::ExpAssign => "**=",
            AssignOp::ShlAssign => "<<=",
            AssignOp::ShrAssign => ">>=",
            AssignOp::UShrAssign => ">>>=",
            AssignOp::BitOrAssign => "|=",
            AssignOp::BitXorAssign => "^=",
            AssignOp::BitAndAssign => "&=",
            AssignOp::LogicalAndAssign => "&&=",
            AssignOp::LogicalOrAssign => "||=",
            AssignOp::NullishAssign => "??=",
        }
    }

    /// The compound form of a binary operator (`a = a + b` → `a += b`).
    pub fn from_binary(op: BinaryOp) -> Option<AssignOp> {
        Some(match op {
            BinaryOp::Add => AssignOp::AddAssign,
            BinaryOp::Sub => AssignOp::SubAssign,
            BinaryOp::Mul => AssignOp::MulAssign,
            BinaryOp::Div => AssignOp::DivAssign,
            BinaryOp::Rem => AssignOp::RemAssign,
            BinaryOp::Exp => AssignOp::ExpAssign,
            BinaryOp::Shl => AssignOp::ShlAssign,
            BinaryOp::Shr => AssignOp::ShrAssign,
            BinaryOp::UShr => AssignOp::UShrAssign,
            BinaryOp::BitOr => AssignOp::BitOrAssign,
            BinaryOp::BitXor => AssignOp::BitXorAssign,
            BinaryOp::BitAnd => AssignOp::BitAndAssign,
            _ => return None,
        })
    }
}

/// Comma-separated sequence expression: `(a, b, c)`.
#[derive(Debug, Clone)]
pub struct SequenceExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The expressions in order.
    pub expressions: Vec<Expr>,
}

/// `object.property`, `object[expr]`, or their `?.` forms.
#[derive(Debug, Clone)]
pub struct MemberExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The object.
    pub object: Box<Expr>,
    /// The property key.
    pub property: MemberProp,
    /// `true` when written with `?.`.
    pub optional: bool,
}

/// The property part of a member expression.
#[derive(Debug, Clone)]
pub enum MemberProp {
    /// Static identifier (`.name`).
    Ident(Ident),
    /// Private identifier (`#name`).
    Private(PrivateIdent),
    /// Computed expression (`[expr]`).
    Computed(Box<Expr>),
}

/// `callee(arguments)` or `callee?.(arguments)`
#[derive(Debug, Clone)]
pub struct CallExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The function being called.
    pub callee: Box<Expr>,
    /// Argument list.
    pub arguments: Vec<Expr>,
    /// `true` when written with `?.`.
    pub optional: bool,
    /// Marked with a `/*@__PURE__*/` annotation.
    pub pure: bool,
}

/// `new callee(arguments)`
#[derive(Debug, Clone)]
pub struct NewExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The constructor.
    pub callee: Box<Expr>,
    /// Argument list.
    pub arguments: Vec<Expr>,
    /// Marked with a `/*@__PURE__*/` annotation.
    pub pure: bool,
}

/// The outermost node of an optional chain such as `a?.b.c()`.
#[derive(Debug, Clone)]
pub struct ChainExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The member/call expression containing at least one optional link.
    pub expr: Box<Expr>,
}

/// `` tag`template` `` — tagged template expression.
#[derive(Debug, Clone)]
pub struct TaggedTemplateExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The tag function.
    pub tag: Box<Expr>,
    /// The template literal.
    pub quasi: TemplateLit,
}

/// `yield [*] [argument]` — yield expression.
#[derive(Debug, Clone)]
pub struct YieldExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// `true` for `yield*` (delegating yield).
    pub delegate: bool,
    /// Optional value to yield.
    pub argument: Option<Box<Expr>>,
}

/// `await argument` — await expression.
#[derive(Debug, Clone)]
pub struct AwaitExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The awaited value.
    pub argument: Box<Expr>,
}

/// `import(source)` — dynamic import expression.
#[derive(Debug, Clone)]
pub struct ImportExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// The module specifier.
    pub source: Box<Expr>,
    /// Optional second argument (`with { … }` options).
    pub options: Option<Box<Expr>>,
}

/// `import.meta` or `new.target` — meta property expression.
#[derive(Debug, Clone)]
pub struct MetaPropExpr {
    /// Source location.
    pub loc: SourceLocation,
    /// Which meta property.
    pub kind: MetaPropKind,
}

/// The two meta properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaPropKind {
    /// `new.target`
    NewTarget,
    /// `import.meta`
    ImportMeta,
}

// ─────────────────────────────────────────────────────────────────────────────
// Patterns
// ─────────────────────────────────────────────────────────────────────────────

/// A binding or assignment pattern.
#[derive(Debug, Clone)]
pub enum Pat {
    /// Simple identifier binding (or assigned reference in assignment
    /// patterns).
    Ident(Ident),
    /// Array destructuring `[a, b, ...rest]`.
    Array(Box<ArrayPat>),
    /// Object destructuring `{ a, b: c, ...rest }`.
    Object(Box<ObjectPat>),
    /// Rest element `...pattern`.
    Rest(Box<RestElement>),
    /// Default-value binding `pattern = default`.
    Assign(Box<AssignPat>),
    /// Member-expression target, only inside assignment patterns
    /// (`[a.b] = c`).
    Expr(Box<Expr>),
}

impl Pat {
    /// Returns the source location of this pattern.
    pub fn loc(&self) -> SourceLocation {
        match self {
            Pat::Ident(p) => p.loc,
            Pat::Array(p) => p.loc,
            Pat::Object(p) => p.loc,
            Pat::Rest(p) => p.loc,
            Pat::Assign(p) => p.loc,
            Pat::Expr(e) => e.loc(),
        }
    }

    /// Collect every identifier bound by this pattern, in source order.
    pub fn bound_names<'a>(&'a self, out: &mut Vec<&'a Ident>) {
        match self {
            Pat::Ident(i) => out.push(i),
            Pat::Array(a) => {
                for p in a.elements.iter().flatten() {
                    p.bound_names(out);
                }
            }
            Pat::Object(o) => {
                for prop in &o.properties {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => kv.value.bound_names(out),
                        ObjectPatProp::Rest(r) => r.argument.bound_names(out),
                    }
                }
            }
            Pat::Rest(r) => r.argument.bound_names(out),
            Pat::Assign(a) => a.left.bound_names(out),
            Pat::Expr(_) => {}
        }
    }
}

/// Array destructuring pattern: `[a, , b, ...rest]`.
#[derive(Debug, Clone)]
pub struct ArrayPat {
    /// Source location.
    pub loc: SourceLocation,
    /// Elements, where `None` represents an elision.
    pub elements: Vec<Option<Pat>>,
}

/// Object destructuring pattern: `{ a, b: c, ...rest }`.
#[derive(Debug, Clone)]
pub struct ObjectPat {
    /// Source location.
    pub loc: SourceLocation,
    /// Property patterns.
    pub properties: Vec<ObjectPatProp>,
}

/// A single property inside an object destructuring pattern.  Shorthand
/// `{ a = 1 }` is stored as `{ a: a = 1 }`.
#[derive(Debug, Clone)]
pub enum ObjectPatProp {
    /// `key: pat [= default]` — key-value property.
    KeyValue(KeyValuePatProp),
    /// `...rest` — rest property.
    Rest(RestElement),
}

/// `key: pattern [= default]` in an object pattern.
#[derive(Debug, Clone)]
pub struct KeyValuePatProp {
    /// Source location.
    pub loc: SourceLocation,
    /// The property key.
    pub key: PropKey,
    /// The value pattern.
    pub value: Pat,
}

/// `...pattern` — rest element in array/object patterns or parameter lists.
#[derive(Debug, Clone)]
pub struct RestElement {
    /// Source location.
    pub loc: SourceLocation,
    /// The rest binding target.
    pub argument: Box<Pat>,
}

/// `pattern = default` — default-value pattern.
#[derive(Debug, Clone)]
pub struct AssignPat {
    /// Source location.
    pub loc: SourceLocation,
    /// The binding pattern.
    pub left: Box<Pat>,
    /// The default expression.
    pub right: Box<Expr>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::scanner::Position;

    fn dummy_loc() -> SourceLocation {
        let p = Position {
            offset: 0,
            line: 1,
            column: 0,
        };
        Span {
            start: p,
            end: p,
            file: 0,
        }
    }

    #[test]
    fn test_source_type_variants() {
        assert_ne!(SourceType::Script, SourceType::Module);
    }

    #[test]
    fn test_program_append_merges_units() {
        let mut a = Program::empty();
        a.files.push("a.js".into());
        a.body.push(Stmt::empty(dummy_loc()));
        let mut b = Program::empty();
        b.files.push("b.js".into());
        b.source_type = SourceType::Module;
        b.body.push(Stmt::empty(dummy_loc()));
        a.append(b);
        assert_eq!(a.body.len(), 2);
        assert_eq!(a.files, vec!["a.js".to_string(), "b.js".to_string()]);
        assert_eq!(a.source_type, SourceType::Module);
    }

    #[test]
    fn test_file_name_lookup() {
        let mut p = Program::empty();
        p.files.push("x.js".into());
        assert_eq!(p.file_name(dummy_loc()), "x.js");
        let mut loc = dummy_loc();
        loc.file = 9;
        assert_eq!(p.file_name(loc), "");
    }

    #[test]
    fn test_sequence_flattens_and_unwraps() {
        let loc = dummy_loc();
        let inner = Expr::sequence(vec![Expr::num(1.0, loc), Expr::num(2.0, loc)]);
        let outer = Expr::sequence(vec![inner, Expr::num(3.0, loc)]);
        match outer {
            Expr::Sequence(s) => assert_eq!(s.expressions.len(), 3),
            other => panic!("expected sequence, got {other:?}"),
        }
        assert!(matches!(Expr::sequence(vec![Expr::num(1.0, loc)]), Expr::Num(_)));
    }

    #[test]
    fn test_undefined_is_void_zero() {
        let u = Expr::undefined(dummy_loc());
        assert!(u.is_undefined());
        assert!(u.is_constant_literal());
    }

    #[test]
    fn test_bound_names_walks_nested_patterns() {
        let loc = dummy_loc();
        let pat = Pat::Array(Box::new(ArrayPat {
            loc,
            elements: vec![
                Some(Pat::Ident(Ident::new("a", loc))),
                None,
                Some(Pat::Object(Box::new(ObjectPat {
                    loc,
                    properties: vec![ObjectPatProp::KeyValue(KeyValuePatProp {
                        loc,
                        key: PropKey::Ident(Ident::new("k", loc)),
                        value: Pat::Assign(Box::new(AssignPat {
                            loc,
                            left: Box::new(Pat::Ident(Ident::new("b", loc))),
                            right: Box::new(Expr::num(1.0, loc)),
                        })),
                    })],
                }))),
                Some(Pat::Rest(Box::new(RestElement {
                    loc,
                    argument: Box::new(Pat::Ident(Ident::new("c", loc))),
                }))),
            ],
        }));
        let mut names = Vec::new();
        pat.bound_names(&mut names);
        let names: Vec<&str> = names.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_directive_value_and_lookup() {
        let d = Directive {
            loc: dummy_loc(),
            raw: "'use strict'".into(),
        };
        assert_eq!(d.value(), "use strict");
        let body = vec![Stmt::Directive(d), Stmt::empty(dummy_loc())];
        assert!(has_directive(&body, "use strict"));
        assert!(!has_directive(&body, "use asm"));
    }

    #[test]
    fn test_operator_tables() {
        assert!(BinaryOp::Mul.precedence() > BinaryOp::Add.precedence());
        assert!(BinaryOp::BitOr.precedence() > LogicalOp::And.precedence());
        assert_eq!(BinaryOp::StrictEq.negated(), Some(BinaryOp::StrictNotEq));
        assert_eq!(AssignOp::from_binary(BinaryOp::Add), Some(AssignOp::AddAssign));
        assert_eq!(AssignOp::from_binary(BinaryOp::In), None);
    }

    #[test]
    fn test_block_or_single_keeps_lexical_block() {
        let loc = dummy_loc();
        let single = Stmt::block_or_single(loc, vec![Stmt::expr(Expr::num(1.0, loc))]);
        assert!(matches!(single, Stmt::Expr(_)));
        let decl = Stmt::VarDecl(VarDecl {
            loc,
            kind: VarKind::Let,
            declarators: vec![],
        });
        assert!(matches!(Stmt::block_or_single(loc, vec![decl]), Stmt::Block(_)));
    }

    #[test]
    fn test_stmt_loc_all_variants() {
        let loc = dummy_loc();
        let stmts = vec![
            Stmt::Block(BlockStmt { loc, body: vec![] }),
            Stmt::Debugger(DebuggerStmt { loc }),
            Stmt::Return(ReturnStmt {
                loc,
                argument: None,
            }),
            Stmt::Directive(Directive {
                loc,
                raw: "\"x\"".into(),
            }),
            Stmt::Module(Box::new(ModuleDecl::ExportAll(ExportAllDecl {
                loc,
                exported: None,
                source: StringLit::new("m", loc),
            }))),
        ];
        for s in &stmts {
            assert_eq!(s.loc(), loc);
        }
        assert!(stmts[2].is_jump());
    }
}
