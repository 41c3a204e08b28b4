//! Domain error types for authorization operations.

use thiserror::Error;

/// Domain-specific errors for authorization operations.
///
/// The type is `Clone` so that a failure armed on the fake engine can be
/// returned from every subsequent call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Failure deliberately armed on a fake client.
    #[error("injected failure: {message}")]
    InjectedFailure { message: String },

    /// Error reported by an authorization client.
    #[error("authorization client error: {message}")]
    ClientError { message: String },

    /// Operation not supported by the client.
    #[error("operation not supported: {operation}")]
    Unsupported { operation: String },
}

impl DomainError {
    /// The error returned by an armed fake when no specific error was supplied.
    pub fn injected() -> Self {
        Self::InjectedFailure {
            message: "fake authorization client armed to fail".to_string(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
