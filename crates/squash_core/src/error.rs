//! Error and diagnostic types for the squash minifier.
//!
//! Fatal problems (malformed input, bad options) are reported as
//! [`SquashError`]; non-fatal compressor diagnostics are collected as
//! [`Warning`]s and returned alongside the output.

use serde::Serialize;
use thiserror::Error;

use crate::parser::scanner::Position;

/// All fatal errors that can be produced by the minifier.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SquashError {
    /// A malformed literal or an unterminated construct.
    #[error("LexicalError: {message} ({file}:{line}:{col})")]
    Lexical {
        /// Human-readable description.
        message: String,
        /// Name of the input unit the error occurred in.
        file: String,
        /// 1-based line.
        line: u32,
        /// 0-based column.
        col: u32,
        /// Byte offset into the unit's text.
        offset: usize,
    },

    /// An unexpected token, an illegal grammar position or a conflicting
    /// redeclaration.
    #[error("SyntaxError: {message} ({file}:{line}:{col})")]
    Syntax {
        /// Human-readable description.
        message: String,
        /// Name of the input unit the error occurred in.
        file: String,
        /// 1-based line.
        line: u32,
        /// 0-based column.
        col: u32,
        /// Byte offset into the unit's text.
        offset: usize,
    },

    /// An option value that cannot be honoured.
    #[error("invalid option: {0}")]
    Options(String),

    /// The source-map collaborator rejected its input.
    #[error("source map error: {0}")]
    SourceMap(String),
}

impl SquashError {
    /// Build a [`SquashError::Lexical`] located at `pos`.
    pub fn lexical(message: impl Into<String>, pos: Position) -> Self {
        SquashError::Lexical {
            message: message.into(),
            file: String::new(),
            line: pos.line,
            col: pos.column,
            offset: pos.offset,
        }
    }

    /// Build a [`SquashError::Syntax`] located at `pos`.
    pub fn syntax(message: impl Into<String>, pos: Position) -> Self {
        SquashError::Syntax {
            message: message.into(),
            file: String::new(),
            line: pos.line,
            col: pos.column,
            offset: pos.offset,
        }
    }

    /// Attach the input unit name to a positioned error that does not carry
    /// one yet.
    pub fn in_file(mut self, name: &str) -> Self {
        if let SquashError::Lexical { file, .. } | SquashError::Syntax { file, .. } = &mut self
            && file.is_empty()
        {
            *file = name.to_string();
        }
        self
    }

    /// `(line, col)` of a positioned error.
    pub fn position(&self) -> Option<(u32, u32)> {
        match self {
            SquashError::Lexical { line, col, .. } | SquashError::Syntax { line, col, .. } => {
                Some((*line, *col))
            }
            _ => None,
        }
    }

    /// The bare message without the position suffix.
    pub fn message(&self) -> String {
        match self {
            SquashError::Lexical { message, .. } | SquashError::Syntax { message, .. } => {
                message.clone()
            }
            SquashError::Options(m) | SquashError::SourceMap(m) => m.clone(),
        }
    }
}

/// Convenient `Result` alias for fallible minifier operations.
pub type SquashResult<T> = Result<T, SquashError>;

/// A non-fatal compressor diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// Human-readable description, e.g. `Dropping unused variable a`.
    pub message: String,
    /// Name of the input unit the offending node came from.
    pub file: String,
    /// 1-based line of the offending node.
    pub line: u32,
    /// 0-based column of the offending node.
    pub col: u32,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WARN: {} [{}:{},{}]", self.message, self.file, self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(offset: usize, line: u32, column: u32) -> Position {
        Position {
            offset,
            line,
            column,
        }
    }

    #[test]
    fn test_syntax_error_display() {
        let err = SquashError::syntax("Unexpected token =", pos(4, 1, 4)).in_file("input.js");
        assert_eq!(err.to_string(), "SyntaxError: Unexpected token = (input.js:1:4)");
        assert_eq!(err.position(), Some((1, 4)));
    }

    #[test]
    fn test_in_file_keeps_existing_name() {
        let err = SquashError::lexical("Unterminated string", pos(0, 2, 0))
            .in_file("a.js")
            .in_file("b.js");
        match err {
            SquashError::Lexical { file, .. } => assert_eq!(file, "a.js"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_options_error_has_no_position() {
        let err = SquashError::Options("bad regex".into());
        assert_eq!(err.position(), None);
        assert_eq!(err.message(), "bad regex");
    }

    #[test]
    fn test_warning_display() {
        let w = Warning {
            message: "Dropping unused variable a".into(),
            file: "0".into(),
            line: 3,
            col: 4,
        };
        assert_eq!(w.to_string(), "WARN: Dropping unused variable a [0:3,4]");
    }
}
