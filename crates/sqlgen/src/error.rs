//! Error types for sqlgen

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for generator operations
pub type GenResult<T> = Result<T, GenError>;

/// Errors that abort a generation run.
///
/// Every stage stops at the first error it meets; nothing is aggregated and no
/// output is written once one of these is returned.
#[derive(Debug, Error)]
pub enum GenError {
    /// Required execution context is missing or disagrees with the scanned package
    #[error("Environment error: {0}")]
    Environment(String),

    /// A directive sits on a declaration that cannot carry it, or the package
    /// as a whole has no usable declarations
    #[error("Invalid file: {decl}: {reason}")]
    InvalidFile { decl: String, reason: String },

    /// An annotation breaks the grammar or references something that does not exist
    #[error("Invalid model: {decl}.{field}: {reason}")]
    InvalidModel {
        decl: String,
        field: String,
        reason: String,
    },

    /// Reading or parsing the package sources failed
    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl GenError {
    /// Create an environment error
    pub fn environment(message: impl Into<String>) -> Self {
        Self::Environment(message.into())
    }

    /// Create an invalid-file error for a declaration
    pub fn invalid_file(decl: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFile {
            decl: decl.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid-model error for a field of a declaration
    pub fn invalid_model(
        decl: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidModel {
            decl: decl.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is an environment error
    pub fn is_environment(&self) -> bool {
        matches!(self, Self::Environment(_))
    }

    /// Check if this is an invalid-file error
    pub fn is_invalid_file(&self) -> bool {
        matches!(self, Self::InvalidFile { .. })
    }

    /// Check if this is an invalid-model error
    pub fn is_invalid_model(&self) -> bool {
        matches!(self, Self::InvalidModel { .. })
    }
}

/// Errors raised while reading declarations from source files.
#[derive(Debug, Error)]
pub enum ScanError {
    /// IO error reading a source file or listing the package directory
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source file is not valid Rust
    #[error("failed to parse {}:{line}:{column}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// Invalid glob pattern built from the package directory
    #[error("invalid source pattern {pattern}: {message}")]
    Pattern { pattern: String, message: String },
}

impl ScanError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, err: &syn::Error) -> Self {
        let start = err.span().start();
        Self::Parse {
            path: path.into(),
            line: start.line,
            column: start.column + 1,
            message: err.to_string(),
        }
    }
}
