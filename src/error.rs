//! Unified error handling for garrisond.
//!
//! Every command operation on the portal returns one of these errors to its
//! immediate caller. Errors are synchronous and final: nothing is retried,
//! and a failed operation leaves no partial mutation behind.

use thiserror::Error;

/// Errors that can occur during portal operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortalError {
    /// The caller's role or identity lacks the right for this operation.
    #[error("unauthorized")]
    Unauthorized,

    #[error("nickname already registered: {0}")]
    DuplicateIdentity(String),

    #[error("recipient already holds this award")]
    AlreadyAwarded,

    #[error("recipient does not hold this award")]
    NotAwarded,

    #[error("no pending avatar request")]
    NoPendingRequest,

    #[error("no such entity: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl PortalError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::DuplicateIdentity(_) => "duplicate_identity",
            Self::AlreadyAwarded => "already_awarded",
            Self::NotAwarded => "not_awarded",
            Self::NoPendingRequest => "no_pending_request",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
        }
    }
}

/// Result type for portal operations.
pub type PortalResult<T> = Result<T, PortalError>;
