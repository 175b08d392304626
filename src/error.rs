//! Error types for the credit ledger.

use crate::store::StoreError;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur during ledger operation.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Malformed input: empty required field, non-positive amount, etc.
    /// Surfaced directly to the caller; never retried automatically.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// An operation referenced a client id that does not exist.
    #[error("Client {client_id} not found")]
    NotFound { client_id: String },

    /// The underlying persistence call failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Failed to open or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Missing input file argument
    #[error("Missing input file argument. Usage: credit-ledger <operations.csv>")]
    MissingArgument,
}

impl LedgerError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(client_id: impl Into<String>) -> Self {
        LedgerError::NotFound {
            client_id: client_id.into(),
        }
    }
}
