//! Error types for the pagination core.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CursorError`] - Cursor token decoding failures (strict decoding only)
//! - [`StorageError`] - Data source errors surfaced by adapters
//! - [`PaginationError`] - Top-level resolution errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Cursor Errors
// =============================================================================

/// Reasons a cursor token could not be decoded.
///
/// These are only reported by strict decoding. The lenient decoding path used
/// by the resolver turns every one of them into an empty cursor position.
#[derive(Debug, Error)]
pub enum CursorError {
    /// The token was empty or whitespace.
    #[error("cursor token is empty")]
    Empty,

    /// The token exceeds the accepted length.
    #[error("cursor token exceeds max length: {len} chars (max {max})")]
    TooLong { len: usize, max: usize },

    /// The token is not valid base64.
    #[error("cursor token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes are not valid UTF-8.
    #[error("cursor payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The decoded payload is not JSON.
    #[error("cursor payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The decoded JSON is not an object.
    #[error("cursor payload is not an object")]
    NotAnObject,

    /// A date cursor carried a value that is not a timestamp.
    #[error("cursor field is not a timestamp: {0}")]
    InvalidTimestamp(String),
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Data source errors.
///
/// These errors originate from the backing store behind a
/// [`DataSource`](crate::ports::DataSource): connection failures, query
/// failures, and document (de)serialization problems.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to establish a database connection.
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// Query execution failed.
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// Database migration failed.
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// Transaction commit/rollback failed.
    #[error("Transaction error: {0}")]
    TransactionError(String),

    /// Document serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// =============================================================================
// Pagination Errors
// =============================================================================

/// Errors returned by [`resolve`](crate::services::resolve).
#[derive(Debug, Error)]
pub enum PaginationError {
    /// `first` or `last` was negative.
    ///
    /// Reported before the data source is touched.
    #[error("Invalid argument: {argument}({value}) could not be negative")]
    InvalidArgument {
        /// Name of the offending argument (`first` or `last`).
        argument: &'static str,
        /// Value supplied by the caller.
        value: i32,
    },

    /// The data source failed one of its reads.
    #[error("Backend failure: {0}")]
    Backend(#[from] StorageError),
}

impl PaginationError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PaginationError::InvalidArgument { .. } => "invalid_argument",
            PaginationError::Backend(_) => "backend",
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for resolution.
pub type PaginationResult<T> = Result<T, PaginationError>;

/// Result type for data source operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for strict cursor decoding.
pub type CursorResult<T> = Result<T, CursorError>;
