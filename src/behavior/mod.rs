//! Behavior pipeline - ordered interceptors wrapping handler invocation.
//!
//! Provides:
//! - [`Behavior`] - a polymorphic interceptor for one request type
//! - [`Next`] - the continuation handed to each behavior
//! - the chain composition fold used by the dispatcher
//!
//! # Ordering
//!
//! Behaviors carry an explicit order value; the chain is a stable sort by
//! `(order, registration sequence)` with lower values running outermost.
//! For sorted behaviors `[B1..BN]` and handler invocation `H`, the effective
//! call is `B1(B2(...BN(H)...))`: the first behavior executes first and
//! observes outermost timing, the last runs closest to the handler.
//! Identical registrations always produce identical nesting.
//!
//! # Example
//!
//! ```ignore
//! use mediary::{Behavior, BoxFuture, DispatchResult, Next, ORDER_DEFAULT};
//!
//! struct Timing;
//!
//! impl<R, T> Behavior<R, T> for Timing
//! where
//!     R: Send + Sync + 'static,
//!     T: Send + 'static,
//! {
//!     fn handle(
//!         &self,
//!         _request: std::sync::Arc<R>,
//!         _token: tokio_util::sync::CancellationToken,
//!         next: Next<T>,
//!     ) -> BoxFuture<'static, DispatchResult<T>> {
//!         Box::pin(async move {
//!             let started = std::time::Instant::now();
//!             let result = next.run().await;
//!             tracing::debug!(elapsed = ?started.elapsed(), "timed");
//!             result
//!         })
//!     }
//! }
//! ```

mod trace;
mod validation;

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::DispatchResult;
use crate::handler::{BoxFuture, Handler};

pub use trace::TraceBehavior;
pub use validation::{ValidationBehavior, Validator};

/// Order of the built-in observability behavior (outermost).
pub const ORDER_TRACE: i32 = -1000;

/// Default order for application behaviors.
pub const ORDER_DEFAULT: i32 = 0;

/// Order of the built-in validation behavior.
///
/// Innermost among business behaviors by convention; registering a behavior
/// with a larger order places it between validation and the handler.
pub const ORDER_VALIDATION: i32 = 1000;

/// The rest of the chain, invokable exactly once.
pub struct Next<T> {
    run: Box<dyn FnOnce() -> BoxFuture<'static, DispatchResult<T>> + Send>,
}

impl<T: Send + 'static> Next<T> {
    /// Wrap a continuation closure.
    pub fn new<F>(run: F) -> Self
    where
        F: FnOnce() -> BoxFuture<'static, DispatchResult<T>> + Send + 'static,
    {
        Self { run: Box::new(run) }
    }

    /// Invoke the rest of the chain.
    pub fn run(self) -> BoxFuture<'static, DispatchResult<T>> {
        (self.run)()
    }
}

/// A cross-cutting interceptor wrapping handler invocation.
///
/// Receives the request, the call's cancellation token, and the continuation
/// for everything registered after it. Not calling [`Next::run`]
/// short-circuits the chain.
pub trait Behavior<R, T>: Send + Sync + 'static
where
    R: Send + Sync + 'static,
    T: Send + 'static,
{
    /// Wrap the rest of the chain.
    fn handle(
        &self,
        request: Arc<R>,
        token: CancellationToken,
        next: Next<T>,
    ) -> BoxFuture<'static, DispatchResult<T>>;
}

impl<R, T, F, Fut> Behavior<R, T> for F
where
    R: Send + Sync + 'static,
    T: Send + 'static,
    F: Fn(Arc<R>, CancellationToken, Next<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DispatchResult<T>> + Send + 'static,
{
    fn handle(
        &self,
        request: Arc<R>,
        token: CancellationToken,
        next: Next<T>,
    ) -> BoxFuture<'static, DispatchResult<T>> {
        Box::pin(self(request, token, next))
    }
}

/// Fold the sorted behavior list around the handler invocation.
///
/// Walks the list from last to first, each step wrapping the continuation
/// built so far, so the first behavior in the list ends up outermost. The
/// innermost continuation invokes the handler directly.
pub(crate) fn compose<R, T>(
    request: Arc<R>,
    token: CancellationToken,
    behaviors: Arc<[Arc<dyn Behavior<R, T>>]>,
    handler: Arc<dyn Handler<R, T>>,
) -> Next<T>
where
    R: Send + Sync + 'static,
    T: Send + 'static,
{
    let mut next = {
        let request = request.clone();
        let token = token.clone();
        Next::new(move || handler.call(request, token))
    };

    for behavior in behaviors.iter().rev() {
        let behavior = behavior.clone();
        let request = request.clone();
        let token = token.clone();
        let inner = next;
        next = Next::new(move || behavior.handle(request, token, inner));
    }

    next
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    type Trace = Arc<Mutex<Vec<&'static str>>>;

    fn tracing_behavior(trace: Trace, enter: &'static str, exit: &'static str) -> Arc<dyn Behavior<u32, u32>> {
        Arc::new(
            move |_request: Arc<u32>, _token: CancellationToken, next: Next<u32>| {
                let trace = trace.clone();
                async move {
                    trace.lock().unwrap().push(enter);
                    let result = next.run().await;
                    trace.lock().unwrap().push(exit);
                    result
                }
            },
        )
    }

    #[tokio::test]
    async fn test_compose_nests_first_behavior_outermost() {
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));

        let behaviors: Arc<[Arc<dyn Behavior<u32, u32>>]> = vec![
            tracing_behavior(trace.clone(), "b1-enter", "b1-exit"),
            tracing_behavior(trace.clone(), "b2-enter", "b2-exit"),
        ]
        .into();

        let handler: Arc<dyn Handler<u32, u32>> = Arc::new({
            let trace = trace.clone();
            move |request: Arc<u32>, _token: CancellationToken| {
                let trace = trace.clone();
                async move {
                    trace.lock().unwrap().push("handler");
                    Ok(*request * 2)
                }
            }
        });

        let next = compose(Arc::new(21), CancellationToken::new(), behaviors, handler);
        let result = next.run().await.unwrap();

        assert_eq!(result, 42);
        assert_eq!(
            *trace.lock().unwrap(),
            vec!["b1-enter", "b2-enter", "handler", "b2-exit", "b1-exit"]
        );
    }

    #[tokio::test]
    async fn test_compose_with_no_behaviors_calls_handler() {
        let behaviors: Arc<[Arc<dyn Behavior<u32, u32>>]> = Vec::new().into();
        let handler: Arc<dyn Handler<u32, u32>> =
            Arc::new(|request: Arc<u32>, _token: CancellationToken| async move { Ok(*request) });

        let next = compose(Arc::new(7), CancellationToken::new(), behaviors, handler);
        assert_eq!(next.run().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_behavior_can_short_circuit() {
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));

        let gate: Arc<dyn Behavior<u32, u32>> = Arc::new(
            |_request: Arc<u32>, _token: CancellationToken, _next: Next<u32>| async move {
                Err(crate::DispatchError::bad_request("rejected"))
            },
        );

        let handler: Arc<dyn Handler<u32, u32>> = Arc::new({
            let trace = trace.clone();
            move |_request: Arc<u32>, _token: CancellationToken| {
                let trace = trace.clone();
                async move {
                    trace.lock().unwrap().push("handler");
                    Ok(0)
                }
            }
        });

        let next = compose(
            Arc::new(1),
            CancellationToken::new(),
            vec![gate].into(),
            handler,
        );
        assert!(next.run().await.is_err());
        assert!(trace.lock().unwrap().is_empty());
    }
}
