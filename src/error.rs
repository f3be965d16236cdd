//! Error types for the flowgraph crate.
//!
//! Graph construction itself never fails: malformed syntax degrades to
//! partial graphs and resource exhaustion degrades to a truncation
//! marker. Errors only arise at the generator boundary, when reading
//! files, parsing, or locating the requested function.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for flowchart generation.
#[derive(Error, Debug)]
pub enum FlowError {
    /// I/O failure while reading a source file.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The language could not be detected or is not registered.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The grammar rejected the input outright (no tree produced).
    #[error("parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// tree-sitter runtime failure (grammar version mismatch, bad query).
    #[error("tree-sitter error: {0}")]
    TreeSitter(String),

    /// The requested function does not exist in the file.
    #[error("function '{name}' not found in {file}")]
    FunctionNotFound { name: String, file: String },

    /// The node handed to the engine is not a function definition.
    #[error("node kind '{0}' is not a function definition")]
    NotAFunction(String),
}

impl FlowError {
    /// Wrap an I/O error together with the offending path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FlowError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
