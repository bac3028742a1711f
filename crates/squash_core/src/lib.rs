//! `squash_core`: a JavaScript minifier library.
//!
//! # Crate layout
//!
//! - [`parser`]: lexer, parser, AST and scope resolution.
//! - [`walk`]: read-only visitors and the rewriting traversal.
//! - [`compress`]: the optimizing compressor.
//! - [`mangle`]: identifier and property renaming.
//! - [`printer`]: code generation and source maps.
//! - [`minify`]: the parse → compress → mangle → print pipeline.
//!
//! ```
//! use squash_core::{MinifyOptions, minify};
//!
//! let out = minify(&[("a.js".into(), "var x = 1 + 2;".into())], &MinifyOptions::default());
//! assert_eq!(out.code, "var x=3;");
//! ```

/// Optimizing compressor.
pub mod compress;
/// Fatal errors and compressor warnings.
pub mod error;
/// Identifier and property mangling.
pub mod mangle;
/// The end-to-end pipeline.
pub mod minify;
/// JavaScript front end.
pub mod parser;
/// Code generation.
pub mod printer;
/// AST traversal.
pub mod walk;

pub use error::{SquashError, SquashResult, Warning};
pub use minify::{MinifyOptions, MinifyOutput, SourceMapOptions, minify};
