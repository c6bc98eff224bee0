//! Error types for tabulog.
//!
//! This module defines the error hierarchy shared by the whole crate:
//!
//! - [`ParseError`] - Malformed expression text
//! - [`EvalError`] - Per-row expression evaluation failures
//! - [`ReadError`] - Log file decoding and reading errors
//! - [`WriteError`] - Output serialization errors
//! - [`ConfigError`] - Computed column definition errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Expression Parse Errors
// =============================================================================

/// A malformed expression.
///
/// `position` is the byte offset into the expression source where parsing
/// stopped, and `fragment` is the remaining input from that point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error at position {position}: {message} (near '{fragment}')")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
    pub fragment: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>, source: &str, position: usize) -> Self {
        let position = position.min(source.len());
        let fragment: String = source
            .get(position..)
            .unwrap_or("")
            .chars()
            .take(20)
            .collect();
        Self {
            message: message.into(),
            position,
            fragment,
        }
    }
}

// =============================================================================
// Expression Evaluation Errors
// =============================================================================

/// Errors raised while evaluating an expression against a row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The name is neither a stored field nor a computed column.
    #[error("Unresolved reference: no column named '{0}'")]
    UnresolvedReference(String),

    /// A numeric-only operator received a string operand.
    #[error("Type mismatch: cannot apply '{operator}' to '{operand}'")]
    TypeMismatch { operator: String, operand: String },

    /// A computed column re-entered itself while resolving.
    #[error("Circular reference: {}", .chain.join(" -> "))]
    CircularReference { chain: Vec<String> },
}

// =============================================================================
// Reader Errors
// =============================================================================

/// Errors while reading a log file into a data set.
#[derive(Debug, Error)]
pub enum ReadError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode the byte content.
    #[error("Failed to decode content: {0}")]
    Encoding(String),

    /// The file matches none of the supported formats.
    #[error("Unknown file format: {0}")]
    UnknownFormat(String),

    /// An E-Prime log file whose frame structure is broken.
    #[error("Corrupt log file at line {line}: {message}")]
    CorruptLog { line: usize, message: String },

    /// A tab-separated file whose rows do not fit its header.
    #[error("Malformed table at line {line}: {message}")]
    MalformedTable { line: usize, message: String },

    /// Underlying TSV reader failure.
    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file.
    #[error("File is empty")]
    EmptyFile,
}

// =============================================================================
// Writer Errors
// =============================================================================

/// Errors while writing a data set out.
#[derive(Debug, Error)]
pub enum WriteError {
    /// IO error.
    #[error("Write failed: {0}")]
    Io(#[from] std::io::Error),

    /// TSV serialization error.
    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A computed column failed on a specific row.
    #[error("Row {row}, column '{column}': {source}")]
    Eval {
        row: usize,
        column: String,
        #[source]
        source: EvalError,
    },
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors while loading computed column definitions.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error.
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A definition that is not `name=expression`, or has an empty name.
    #[error("Invalid computed column definition: {0}")]
    InvalidDefinition(String),

    /// The expression of a definition does not parse.
    #[error("Computed column '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: ParseError,
    },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::pipeline::convert_file`].
/// It wraps all lower-level errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reader error.
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// Writer error.
    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    /// Config error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The file was read but produced no rows.
    #[error("No rows found in input")]
    EmptyInput,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for expression parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for expression evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// Result type for reader operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// Result type for writer operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
