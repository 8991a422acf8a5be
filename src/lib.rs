//! # mediary
//!
//! In-process request/response mediator: callers submit a typed request and
//! receive a typed response (or an absence marker) without depending on the
//! concrete handler. One dispatch entry point resolves the handler at
//! runtime, routes the call through an ordered chain of cross-cutting
//! behaviors, and normalizes the result into a single three-way envelope.
//!
//! ## Architecture
//!
//! - **Request taxonomy** ([`Request`], [`VoidRequest`]) - declares whether
//!   a request carries a response type
//! - **Registry** - one handler per request type, resolved in O(1) from a
//!   frozen map
//! - **Behavior chain** ([`Behavior`], [`Next`]) - interceptors folded
//!   around the handler, first-registered outermost
//! - **Validation** ([`Validator`]) - all validators run, failures
//!   aggregate, the chain short-circuits
//! - **Outcome** ([`Outcome`]) - response value, error payload, or absence
//!   marker
//!
//! Failures inside the chain come back as data (an error payload with a
//! classification code); only wiring bugs - no handler, ambiguous
//! registration - surface as `Err` from [`Mediator::send`].
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use mediary::{Mediator, Request, SingleResponse};
//! use tokio_util::sync::CancellationToken;
//!
//! struct TestCommand { test: String }
//!
//! impl Request for TestCommand {
//!     type Response = SingleResponse<String>;
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mediator = Mediator::builder()
//!         .handle(|request: Arc<TestCommand>, _token| async move {
//!             Ok(SingleResponse::new(format!("Received: {}", request.test)))
//!         })
//!         .validator(|request: Arc<TestCommand>, _token| async move {
//!             let mut errors = Vec::new();
//!             if request.test.is_empty() {
//!                 errors.push("Test property must not be empty".to_string());
//!             }
//!             Ok(errors)
//!         })
//!         .build()?;
//!
//!     let outcome = mediator
//!         .send(TestCommand { test: "abc".into() }, CancellationToken::new())
//!         .await?;
//!     let response = outcome.response::<SingleResponse<String>>().unwrap();
//!     assert_eq!(response.result.as_deref(), Some("Received: abc"));
//!     Ok(())
//! }
//! ```

pub mod behavior;
pub mod error;
pub mod outcome;
pub mod request;
pub mod response;

mod handler;
mod mediator;
mod registry;

pub use behavior::{
    Behavior, Next, TraceBehavior, ValidationBehavior, Validator, ORDER_DEFAULT, ORDER_TRACE,
    ORDER_VALIDATION,
};
pub use error::{DispatchError, DispatchResult, MediatorError, Result};
pub use handler::{BoxFuture, Handler};
pub use mediator::{Mediator, MediatorBuilder};
pub use outcome::Outcome;
pub use request::{PagedRequest, Request, RequestKind, SingleRequest, VoidRequest};
pub use response::{ErrorsResponse, MultiResponse, SingleResponse};
