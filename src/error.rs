//! Error types for MCF
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using McfError
pub type Result<T> = std::result::Result<T, McfError>;

/// Unified error type for MCF operations
#[derive(Debug, Error)]
pub enum McfError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Binary Format Errors
    // -------------------------------------------------------------------------
    /// Magic mismatch, malformed header, bad block layout, bad string offsets
    #[error("Format error: {0}")]
    Format(String),

    /// A block failed to inflate or inflated to the wrong length
    #[error("Integrity error: {0}")]
    Integrity(String),

    // -------------------------------------------------------------------------
    // Encoding Errors
    // -------------------------------------------------------------------------
    /// A value cannot be represented in the column's committed type
    #[error("Encoding error in column '{column}' at row {row}: {reason}")]
    Encoding {
        column: String,
        row: usize,
        reason: String,
    },

    #[error("Invalid table: {0}")]
    InvalidTable(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    // -------------------------------------------------------------------------
    // Text Collaborator Errors
    // -------------------------------------------------------------------------
    #[error("Text parse error at line {line}: {message}")]
    Text { line: usize, message: String },

    // -------------------------------------------------------------------------
    // Usage / Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Worker failed: {0}")]
    Worker(String),
}

impl McfError {
    /// Shorthand for building an encoding error
    pub(crate) fn encoding(column: &str, row: usize, reason: impl Into<String>) -> Self {
        McfError::Encoding {
            column: column.to_string(),
            row,
            reason: reason.into(),
        }
    }
}
