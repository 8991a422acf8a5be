//! Response wrappers shared between handlers and transport adapters.
//!
//! Handlers return their payloads wrapped in [`SingleResponse`] or
//! [`MultiResponse`]; failed dispatches surface as [`ErrorsResponse`]. All
//! three serialize directly, so a transport adapter can hand them to its
//! serializer without remapping.
//!
//! Status and message fields default at construction time (`200` / `"ok"`),
//! so handlers never have to set boilerplate metadata and the dispatcher
//! never has to backfill it after the fact.

use serde::{Deserialize, Serialize};

/// Classification code for validation failures and bad requests.
pub const STATUS_BAD_REQUEST: u16 = 400;

/// Classification code for domain not-found rejections.
pub const STATUS_NOT_FOUND: u16 = 404;

/// Classification code for cooperative cancellation.
pub const STATUS_CANCELLED: u16 = 499;

/// Classification code for masked unexpected failures.
pub const STATUS_UNEXPECTED: u16 = 500;

/// Default success status code.
pub const STATUS_OK: u16 = 200;

/// Default success message.
pub const MESSAGE_OK: &str = "ok";

/// Fixed caller-visible message for masked unexpected failures.
pub const MESSAGE_UNEXPECTED: &str = "an unexpected error occurred";

/// Fixed caller-visible message for cancelled dispatches.
pub const MESSAGE_CANCELLED: &str = "request cancelled";

/// Response wrapper carrying a single result item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleResponse<T> {
    /// HTTP-like status classification (defaults to 200).
    pub status_code: u16,
    /// Human-readable status message (defaults to "ok").
    pub message: String,
    /// The result payload.
    pub result: Option<T>,
}

impl<T> SingleResponse<T> {
    /// Wrap a result with default success metadata.
    pub fn new(result: T) -> Self {
        Self {
            status_code: STATUS_OK,
            message: MESSAGE_OK.to_string(),
            result: Some(result),
        }
    }

    /// Override the status classification and message.
    pub fn with_status(mut self, status_code: u16, message: impl Into<String>) -> Self {
        self.status_code = status_code;
        self.message = message.into();
        self
    }
}

/// Response wrapper carrying one page of a multi-item result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiResponse<T> {
    /// HTTP-like status classification (defaults to 200).
    pub status_code: u16,
    /// Human-readable status message (defaults to "ok").
    pub message: String,
    /// The page of items.
    pub data: Vec<T>,
    /// Total number of pages available.
    pub pages_count: u32,
    /// Total number of items across all pages.
    pub total_count: u64,
}

impl<T> MultiResponse<T> {
    /// Wrap a page of items with default success metadata.
    pub fn new(data: Vec<T>, pages_count: u32, total_count: u64) -> Self {
        Self {
            status_code: STATUS_OK,
            message: MESSAGE_OK.to_string(),
            data,
            pages_count,
            total_count,
        }
    }
}

/// Aggregated error payload: a classification code plus an ordered list of
/// human-readable messages.
///
/// This is the only failure shape that ever crosses the dispatch boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorsResponse {
    /// HTTP-like classification telling the transport how to treat the error.
    pub status_code: u16,
    /// Failure messages in the order they were produced.
    pub errors: Vec<String>,
}

impl ErrorsResponse {
    /// Build an error payload with an explicit classification.
    pub fn new(status_code: u16, errors: Vec<String>) -> Self {
        Self {
            status_code,
            errors,
        }
    }

    /// A bad-request payload (classification 400).
    pub fn bad_request(errors: Vec<String>) -> Self {
        Self::new(STATUS_BAD_REQUEST, errors)
    }

    /// A not-found payload (classification 404) with a single message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(STATUS_NOT_FOUND, vec![message.into()])
    }

    /// The fixed payload standing in for any unexpected failure.
    ///
    /// The original failure detail is logged, never exposed here.
    pub fn unexpected() -> Self {
        Self::new(STATUS_UNEXPECTED, vec![MESSAGE_UNEXPECTED.to_string()])
    }

    /// The fixed payload returned for a cancelled dispatch.
    pub fn cancelled() -> Self {
        Self::new(STATUS_CANCELLED, vec![MESSAGE_CANCELLED.to_string()])
    }
}
