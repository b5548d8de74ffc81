//! Error types for the contexture crate.
//!
//! This module provides a unified error type for all fallible operations,
//! using the `thiserror` crate for ergonomic error handling. The crossing
//! engine itself has no recoverable-error states (it performs pure in-memory
//! mutations); errors arise only from configuration validation and config
//! file I/O.

use thiserror::Error;

/// The main error type for contexture operations.
#[derive(Error, Debug)]
pub enum ContextureError {
    /// Invalid configuration parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// I/O error while reading or writing a config file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A specialized `Result` type for contexture operations.
///
/// This is a type alias for `Result<T, ContextureError>` and is used
/// throughout the crate for consistency.
pub type Result<T> = std::result::Result<T, ContextureError>;
