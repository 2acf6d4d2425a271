//! Commerce error types.

use thiserror::Error;

/// Errors that can occur in order engine operations.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// Missing required fields, unparseable dates, malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown order or cart id.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// An operation's precondition does not hold (e.g. no tracking id).
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// An outbound collaborator (notification service) failed.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Analytics could not be computed.
    #[error("Computation failed: {0}")]
    Computation(String),

    /// Arithmetic overflow in money calculation.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Backing store error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CommerceError {
    pub fn order_not_found(id: impl Into<String>) -> Self {
        CommerceError::NotFound {
            kind: "Order",
            id: id.into(),
        }
    }

    pub fn cart_not_found(id: impl Into<String>) -> Self {
        CommerceError::NotFound {
            kind: "Abandoned cart",
            id: id.into(),
        }
    }

    /// Whether the error should be shown to the caller as their own mistake.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CommerceError::Validation(_)
                | CommerceError::NotFound { .. }
                | CommerceError::PreconditionFailed(_)
        )
    }
}

impl From<turbo_store::StoreError> for CommerceError {
    fn from(e: turbo_store::StoreError) -> Self {
        CommerceError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::Serialization(e.to_string())
    }
}
