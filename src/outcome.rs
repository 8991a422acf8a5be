//! The three-way result envelope returned by dispatch.
//!
//! Every successful `send` resolves to exactly one of:
//!
//! - [`Outcome::Response`] - the handler's typed response value,
//! - [`Outcome::Errors`] - an aggregated error payload,
//! - [`Outcome::Completed`] - the absence marker for void requests.
//!
//! The variants are mutually exclusive and exhaustive; a transport adapter
//! matching on all three handles every business-level result.

use std::any::Any;
use std::fmt;

use crate::response::ErrorsResponse;

/// Polymorphic dispatch result.
pub enum Outcome {
    /// The handler's typed response, erased for the caller.
    ///
    /// Use [`Outcome::response`] to recover the concrete type.
    Response(Box<dyn Any + Send>),
    /// Validation failure, domain rejection, cancellation, or masked
    /// unexpected failure.
    Errors(ErrorsResponse),
    /// A void request completed.
    Completed,
}

impl Outcome {
    /// Recover the typed response value.
    ///
    /// Returns `None` when the outcome is not a response or when `T` does
    /// not match the handler's declared response type.
    pub fn response<T: 'static>(self) -> Option<T> {
        match self {
            Self::Response(boxed) => boxed.downcast::<T>().ok().map(|value| *value),
            _ => None,
        }
    }

    /// The error payload, if the dispatch failed.
    pub fn errors(&self) -> Option<&ErrorsResponse> {
        match self {
            Self::Errors(payload) => Some(payload),
            _ => None,
        }
    }

    /// Whether this is the absence marker for a void request.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Whether this is a typed response.
    pub fn is_response(&self) -> bool {
        matches!(self, Self::Response(_))
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Response(_) => f.write_str("Outcome::Response(..)"),
            Self::Errors(payload) => f.debug_tuple("Outcome::Errors").field(payload).finish(),
            Self::Completed => f.write_str("Outcome::Completed"),
        }
    }
}
