//! Error types surfaced by the tokenizer, parser, and emitter.

use std::path::PathBuf;

/// The closed set of ways reading, parsing, or writing a Zinc grid can fail.
///
/// Mirrors the kinds named in the format's specification: a failed read of
/// the underlying stream, a token the scanner could not form, a token
/// stream that describes no legal grid, an in-band server error grid, or a
/// construct this crate does not yet support.
#[derive(Debug, thiserror::Error)]
pub enum ZincError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    IoAnonymous(#[source] std::io::Error),

    #[error("scan error at line {line}: {message} (near {lexeme:?})")]
    Scan {
        line: usize,
        message: String,
        lexeme: String,
    },

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("grid reports an error: {message}")]
    ErrorGrid { message: String },

    #[error("unsupported construct: {0}")]
    Unsupported(String),
}

impl ZincError {
    pub(crate) fn scan(line: usize, message: impl Into<String>, lexeme: impl Into<String>) -> Self {
        ZincError::Scan {
            line,
            message: message.into(),
            lexeme: lexeme.into(),
        }
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        ZincError::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ZincError>;
