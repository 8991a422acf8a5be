//! Handler trait - the unit of business logic bound to one request type.
//!
//! Handlers are registered through the
//! [`MediatorBuilder`](crate::MediatorBuilder) and invoked as the innermost
//! continuation of the behavior chain. Plain async closures implement
//! [`Handler`] through a blanket impl, so most registrations look like:
//!
//! ```ignore
//! builder.handle(|request: Arc<CreateOrder>, _token| async move {
//!     Ok(SingleResponse::new(place_order(&request).await?))
//! })
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::DispatchResult;

/// Boxed future returned by handlers, behaviors, and validators.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A unit of business logic servicing one request type.
///
/// `T` is the response type: the request's declared response for typed
/// requests, `()` for void requests. The request arrives behind an `Arc`
/// because behaviors and validators observe the same instance.
pub trait Handler<R, T>: Send + Sync + 'static
where
    R: Send + Sync + 'static,
    T: Send + 'static,
{
    /// Service the request, producing the response or a chain error.
    fn call(&self, request: Arc<R>, token: CancellationToken) -> BoxFuture<'static, DispatchResult<T>>;
}

impl<R, T, F, Fut> Handler<R, T> for F
where
    R: Send + Sync + 'static,
    T: Send + 'static,
    F: Fn(Arc<R>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DispatchResult<T>> + Send + 'static,
{
    fn call(&self, request: Arc<R>, token: CancellationToken) -> BoxFuture<'static, DispatchResult<T>> {
        Box::pin(self(request, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closure_implements_handler() {
        let handler = |request: Arc<u32>, _token: CancellationToken| async move {
            Ok::<_, crate::DispatchError>(*request + 1)
        };

        let result = handler
            .call(Arc::new(41), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result, 42);
    }
}
