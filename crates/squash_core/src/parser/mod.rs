//! JavaScript front end.
//!
//! - [`scanner`]: lexer that converts raw source text into a stream of
//!   [`scanner::Token`]s, comments attached.
//! - [`parser`]: recursive-descent parser producing a [`ast::Program`].
//! - [`ast`]: Abstract Syntax Tree node definitions.
//! - [`scope`]: scope analysis and symbol resolution.

/// Abstract Syntax Tree node types.
pub mod ast;
/// Recursive-descent JavaScript parser.
#[allow(clippy::module_inception)]
pub mod parser;
/// JavaScript lexer.
pub mod scanner;
/// Scope analysis and symbol resolution.
pub mod scope;
