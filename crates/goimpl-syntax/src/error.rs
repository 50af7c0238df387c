// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Error types for lexing, parsing and formatting Go source.

use goimpl_core::patch::Span;
use goimpl_core::text::byte_offset_to_position;
use thiserror::Error;

/// Classification of a lexical failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Error)]
pub enum LexErrorKind {
    /// A byte sequence that starts no Go token.
    #[default]
    #[error("invalid token")]
    InvalidToken,
    /// A `/*` comment with no closing `*/`.
    #[error("unterminated comment")]
    UnterminatedComment,
    /// A byte-order mark anywhere but the start of the file.
    #[error("misplaced byte order mark")]
    MisplacedBom,
}

/// A lexical or syntactic failure, located in the source it came from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{col}: {message}")]
pub struct SyntaxError {
    /// Human-readable description.
    pub message: String,
    /// Offending byte range.
    pub span: Span,
    /// 1-indexed line of `span.start`.
    pub line: u32,
    /// 1-indexed column of `span.start`.
    pub col: u32,
}

impl SyntaxError {
    /// Build an error for `span`, computing its line and column in `source`.
    pub fn at(source: &str, span: Span, message: impl Into<String>) -> Self {
        let (line, col) = byte_offset_to_position(source.as_bytes(), span.start);
        SyntaxError {
            message: message.into(),
            span,
            line,
            col,
        }
    }
}

/// The canonical format pass rejected its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{col}: {message}")]
pub struct FormatError {
    /// Human-readable description.
    pub message: String,
    /// 1-indexed line.
    pub line: u32,
    /// 1-indexed column.
    pub col: u32,
}

impl From<SyntaxError> for FormatError {
    fn from(err: SyntaxError) -> Self {
        FormatError {
            message: err.message,
            line: err.line,
            col: err.col,
        }
    }
}
