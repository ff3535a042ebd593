//! Error types for lexcore.
//!
//! Library crates use [`LexCoreError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all lexcore operations.
#[derive(Debug, thiserror::Error)]
pub enum LexCoreError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A corpus line, tree document, or persisted file failed to parse.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Lexical knowledge base could not be loaded or queried.
    #[error("lexicon error: {message}")]
    Lexicon { message: String },

    /// External definition provider failure (request, status, or response body).
    #[error("definition provider error: {0}")]
    Definition(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (unusable input source, bad argument, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LexCoreError>;

impl LexCoreError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a lexicon error from any displayable message.
    pub fn lexicon(msg: impl Into<String>) -> Self {
        Self::Lexicon {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = LexCoreError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = LexCoreError::parse("line 12: expected object or array");
        assert!(err.to_string().contains("line 12"));

        let err = LexCoreError::Definition("HTTP 503".into());
        assert_eq!(err.to_string(), "definition provider error: HTTP 503");
    }

    #[test]
    fn io_error_keeps_path() {
        let err = LexCoreError::io(
            "/tmp/words/a.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("a.json"));
    }
}
