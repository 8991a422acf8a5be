//! Error types for mediary.
//!
//! There are two distinct levels of failure:
//!
//! - [`MediatorError`] - programmer errors in how the mediator is wired or
//!   called (missing handler, conflicting registrations). These propagate as
//!   `Err` from [`send`](crate::Mediator::send) and are never converted into
//!   a result envelope.
//! - [`DispatchError`] - conditions raised inside the behavior chain
//!   (validation failures, domain rejections, cancellation, unexpected
//!   faults). These are captured by the dispatcher and normalized into an
//!   [`Outcome`](crate::Outcome), so transport adapters never need to catch
//!   faults for business-level failures.

use thiserror::Error;

use crate::response::ErrorsResponse;

/// Configuration and call-shape errors surfaced as faults from `send`.
///
/// These indicate startup wiring bugs or misuse of the dispatch API and are
/// deliberately not representable as result envelopes.
#[derive(Debug, Error)]
pub enum MediatorError {
    /// No handler is registered for the request type.
    #[error("no handler registered for request type `{0}`")]
    HandlerNotFound(String),

    /// More than one handler is registered for the request type.
    ///
    /// Exactly one handler is required; duplicates are rejected at
    /// resolution time rather than silently picking the first.
    #[error("{count} handlers registered for request type `{request_type}`, exactly one is required")]
    AmbiguousHandler {
        /// The request type with conflicting handlers.
        request_type: String,
        /// How many handlers were registered.
        count: usize,
    },

    /// The request type was registered under conflicting request shapes
    /// (typed-response and void at once).
    #[error("request type `{0}` is registered under conflicting request shapes")]
    ShapeConflict(String),

    /// The boxed request value does not match the type its entry was
    /// registered under.
    #[error("request value does not match registered request type `{0}`")]
    InvalidRequest(String),
}

/// Failure raised inside the behavior chain.
///
/// Every variant is captured by the dispatcher and translated into an error
/// payload; see [`Outcome`](crate::Outcome).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// One or more validators rejected the request.
    ///
    /// Carries the aggregated classification code and message list. An
    /// expected, recoverable outcome - never logged at error severity.
    #[error("request validation failed")]
    Validation(ErrorsResponse),

    /// A domain-declared rejection (e.g. resource not found) with an
    /// explicit classification chosen by the raiser.
    #[error("request rejected with status {}", .0.status_code)]
    Rejected(ErrorsResponse),

    /// Cooperative cancellation was observed.
    ///
    /// Only treated as an expected cancellation when the call's cancellation
    /// token is actually in the requested state; otherwise it falls through
    /// to the unexpected-failure path.
    #[error("request cancelled")]
    Cancelled,

    /// Anything else. Logged with full detail, then masked to a fixed
    /// generic payload before reaching the caller.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl DispatchError {
    /// A not-found rejection (classification 404) with a single message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Rejected(ErrorsResponse::not_found(message))
    }

    /// A bad-request rejection (classification 400) with a single message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Rejected(ErrorsResponse::bad_request(vec![message.into()]))
    }
}

/// Result type alias for fault-level mediator operations.
pub type Result<T> = std::result::Result<T, MediatorError>;

/// Result type alias used throughout the behavior chain.
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_carries_classification() {
        let err = DispatchError::not_found("order 42 does not exist");
        match err {
            DispatchError::Rejected(payload) => {
                assert_eq!(payload.status_code, 404);
                assert_eq!(payload.errors, vec!["order 42 does not exist"]);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_handler_not_found_display() {
        let err = MediatorError::HandlerNotFound("my::Command".to_string());
        assert_eq!(
            err.to_string(),
            "no handler registered for request type `my::Command`"
        );
    }
}
