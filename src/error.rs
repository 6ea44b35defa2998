//! Error types for console operations.

use thiserror::Error;

/// Errors surfaced by session operations.
///
/// User aborts and confirmation timeouts are distinct variants so callers can
/// stop quietly on the former while reporting the latter.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// A request to the controller failed.
    #[error("Controller request {service}.{method} failed: {message}")]
    Rpc {
        service: String,
        method: String,
        message: String,
    },

    /// The user backed out of the operation.
    #[error("Operation cancelled")]
    Aborted,

    /// Nobody answered the unsaved-changes prompt in time.
    #[error("Confirmation was not resolved within {0:?}")]
    ConfirmationTimedOut(std::time::Duration),

    /// Another confirmation is already outstanding.
    #[error("A confirmation is already pending")]
    ConfirmationBusy,

    /// Local file access failed.
    #[error("File access failed: {0}")]
    Io(#[from] std::io::Error),

    /// Copying code to or from the controller failed.
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// Settings could not be loaded.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ConsoleError {
    /// Build an RPC failure.
    pub fn rpc(service: &str, method: &str, message: impl Into<String>) -> Self {
        ConsoleError::Rpc {
            service: service.to_string(),
            method: method.to_string(),
            message: message.into(),
        }
    }

    /// Returns true if the user chose to abort; callers stop without reporting.
    pub fn is_user_abort(&self) -> bool {
        matches!(self, ConsoleError::Aborted)
    }
}

impl From<config::ConfigError> for ConsoleError {
    fn from(err: config::ConfigError) -> Self {
        ConsoleError::Config(err.to_string())
    }
}

/// Result alias for console operations.
pub type Result<T> = std::result::Result<T, ConsoleError>;
