//! Error types for reconciliation.

use thiserror::Error;

/// Errors surfaced by the reconcilers and their device collaborators.
///
/// Anything not listed here resolves to a boolean `changed` result instead
/// of an error.
#[derive(Debug, Error)]
pub enum Error {
    /// A symbolic route-domain reference that does not resolve on the device
    #[error("Route domain '{name}' does not exist on the device")]
    InvalidReference { name: String },

    /// A remote create/update/delete/fetch call failed
    #[error("Remote {operation} failed: {message}")]
    RemoteOperationFailed { operation: String, message: String },

    /// Requested archive is missing on the device and fail_on_missing is set
    #[error("Archive '{name}' does not exist on the device")]
    SourceNotFound { name: String },

    /// Caller input rejected before any remote mutation
    #[error("{0}")]
    Validation(String),

    /// Local filesystem failure during archive handling
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand used by device implementations for failed remote calls
    pub fn remote(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::RemoteOperationFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;
