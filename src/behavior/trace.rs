//! Observability behavior - start/stop events around every dispatch.
//!
//! Emits `tracing` events keyed by the request type name. Without a
//! subscriber installed every event is a no-op, so absent observability
//! degrades silently rather than faulting.
//!
//! Cancellation observed while the call's token is in the requested state is
//! reported at debug level, distinct from failures, so cancellations never
//! show up as errors in external reporting.

use std::any::type_name;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::error::{DispatchError, DispatchResult};
use crate::handler::BoxFuture;

use super::{Behavior, Next};

/// Built-in outermost behavior timing the rest of the chain.
///
/// Inserted automatically at [`ORDER_TRACE`](super::ORDER_TRACE) unless the
/// builder disables tracing.
pub struct TraceBehavior;

impl<R, T> Behavior<R, T> for TraceBehavior
where
    R: Send + Sync + 'static,
    T: Send + 'static,
{
    fn handle(
        &self,
        _request: Arc<R>,
        token: CancellationToken,
        next: Next<T>,
    ) -> BoxFuture<'static, DispatchResult<T>> {
        Box::pin(async move {
            let request_type = type_name::<R>();
            let started = Instant::now();
            tracing::debug!(request_type, "dispatch started");

            let result = next.run().await;
            let elapsed = started.elapsed();

            match &result {
                Ok(_) => {
                    tracing::debug!(request_type, ?elapsed, "dispatch completed");
                }
                Err(DispatchError::Validation(payload)) => {
                    tracing::debug!(
                        request_type,
                        status = payload.status_code,
                        "dispatch rejected by validation"
                    );
                }
                Err(DispatchError::Rejected(payload)) => {
                    tracing::debug!(
                        request_type,
                        status = payload.status_code,
                        "dispatch rejected"
                    );
                }
                Err(DispatchError::Cancelled) if token.is_cancelled() => {
                    tracing::debug!(request_type, ?elapsed, "dispatch cancelled");
                }
                Err(error) => {
                    tracing::error!(request_type, %error, ?elapsed, "dispatch failed");
                }
            }

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Req;

    #[tokio::test]
    async fn test_trace_is_transparent() {
        let next = Next::new(|| Box::pin(async move { Ok(5u32) }));
        let result =
            Behavior::<Req, u32>::handle(&TraceBehavior, Arc::new(Req), CancellationToken::new(), next)
                .await;
        assert_eq!(result.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_trace_passes_errors_through() {
        let next: Next<u32> = Next::new(|| {
            Box::pin(async move { Err(DispatchError::Unexpected(anyhow::anyhow!("boom"))) })
        });
        let result =
            Behavior::<Req, u32>::handle(&TraceBehavior, Arc::new(Req), CancellationToken::new(), next)
                .await;
        assert!(matches!(result, Err(DispatchError::Unexpected(_))));
    }
}
