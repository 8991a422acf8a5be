//! Request taxonomy - the marker traits every other component depends on.
//!
//! A request either declares an associated response type ([`Request`]) or
//! declares that it completes without one ([`VoidRequest`]). The declared
//! shape is what the dispatcher uses to classify a call; it never has to
//! execute a handler to find out.
//!
//! # Example
//!
//! ```ignore
//! use mediary::{Request, SingleResponse, VoidRequest};
//!
//! struct CreateOrder { sku: String }
//!
//! impl Request for CreateOrder {
//!     type Response = SingleResponse<u64>;
//! }
//!
//! struct FlushCache;
//!
//! impl VoidRequest for FlushCache {}
//! ```

use crate::response::{MultiResponse, SingleResponse};

/// A request expecting a typed response.
///
/// The associated `Response` type is fixed at the declaration site, so a
/// handler for this request is bound to exactly one response type.
pub trait Request: Send + Sync + 'static {
    /// The response type the handler must produce.
    type Response: Send + 'static;
}

/// A request expecting no response.
///
/// Dispatching a void request yields the absence marker
/// ([`Outcome::Completed`](crate::Outcome::Completed)) once the handler
/// completes.
pub trait VoidRequest: Send + Sync + 'static {}

/// Convenience marker for requests that resolve to a single item wrapped in
/// [`SingleResponse`].
pub trait SingleRequest: Request<Response = SingleResponse<<Self as SingleRequest>::Item>> {
    /// The item carried by the response.
    type Item: Send + 'static;
}

/// A paged query resolving to a [`MultiResponse`] page of items.
pub trait PagedRequest: Request<Response = MultiResponse<<Self as PagedRequest>::Item>> {
    /// The item type of one page entry.
    type Item: Send + 'static;

    /// One-based page number.
    fn page_num(&self) -> u32;

    /// Requested page size.
    fn page_size(&self) -> u32;

    /// Optional free-text filter.
    fn query(&self) -> Option<&str> {
        None
    }
}

/// Declared shape of a registered request type.
///
/// Recorded by the registration call that created the dispatch entry, so
/// classification is available before any handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// The request declares an associated response type.
    Typed,
    /// The request completes without a response.
    Void,
}
