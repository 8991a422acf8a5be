//! Handler registry - maps a request type to its dispatch pipeline.
//!
//! Registration is typed: every call on the builder lands in a
//! [`PipelineSlot`] parameterized by the concrete request and response
//! types. At build time each slot is folded into a [`DispatchEntry`] holding
//! a single type-erased invocation closure, so dispatch is one `HashMap`
//! lookup plus one call - no scanning, no per-call allocation of the
//! pipeline configuration.
//!
//! The registry is populated single-threaded during startup and frozen
//! inside the [`Mediator`](crate::Mediator); afterwards it is read
//! concurrently without synchronization.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::behavior::{
    compose, Behavior, TraceBehavior, ValidationBehavior, Validator, ORDER_TRACE, ORDER_VALIDATION,
};
use crate::error::{DispatchError, DispatchResult, MediatorError, Result};
use crate::handler::{BoxFuture, Handler};
use crate::outcome::Outcome;
use crate::request::RequestKind;
use crate::response::ErrorsResponse;

type InvokeFn = Box<
    dyn Fn(Box<dyn Any + Send>, CancellationToken) -> BoxFuture<'static, Result<Outcome>>
        + Send
        + Sync,
>;

/// One resolvable request type: the erased invocation closure built from its
/// pipeline slot.
pub(crate) struct DispatchEntry {
    invoke: InvokeFn,
}

impl DispatchEntry {
    /// Run the full pipeline for a boxed request.
    pub(crate) fn invoke(
        &self,
        request: Box<dyn Any + Send>,
        token: CancellationToken,
    ) -> BoxFuture<'static, Result<Outcome>> {
        (self.invoke)(request, token)
    }
}

/// Type-erased view of a pipeline slot, so the builder can keep slots for
/// heterogeneous request types in one map.
pub(crate) trait ErasedSlot: Send + Sync {
    /// The request shape this slot was created under.
    fn kind(&self) -> RequestKind;

    /// Downcast access for typed registration calls.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Fold the slot into its erased dispatch entry.
    fn finish(self: Box<Self>, tracing_enabled: bool) -> DispatchEntry;
}

/// Everything registered for one request type, still fully typed.
pub(crate) struct PipelineSlot<R, T> {
    kind: RequestKind,
    handlers: Vec<Arc<dyn Handler<R, T>>>,
    behaviors: Vec<(i32, u32, Arc<dyn Behavior<R, T>>)>,
    validators: Vec<Arc<dyn Validator<R>>>,
}

impl<R, T> PipelineSlot<R, T>
where
    R: Send + Sync + 'static,
    T: Send + 'static,
{
    pub(crate) fn new(kind: RequestKind) -> Self {
        Self {
            kind,
            handlers: Vec::new(),
            behaviors: Vec::new(),
            validators: Vec::new(),
        }
    }

    pub(crate) fn push_handler(&mut self, handler: Arc<dyn Handler<R, T>>) {
        self.handlers.push(handler);
    }

    pub(crate) fn push_behavior(&mut self, order: i32, seq: u32, behavior: Arc<dyn Behavior<R, T>>) {
        self.behaviors.push((order, seq, behavior));
    }

    pub(crate) fn push_validator(&mut self, validator: Arc<dyn Validator<R>>) {
        self.validators.push(validator);
    }
}

impl<R, T> ErasedSlot for PipelineSlot<R, T>
where
    R: Send + Sync + 'static,
    T: Send + 'static,
{
    fn kind(&self) -> RequestKind {
        self.kind
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn finish(self: Box<Self>, tracing_enabled: bool) -> DispatchEntry {
        let Self {
            kind,
            handlers,
            mut behaviors,
            validators,
        } = *self;
        let request_type = type_name::<R>();

        // Built-in behaviors: observability outermost, validation innermost
        // among business behaviors. Explicit orders keep the sort stable.
        if tracing_enabled {
            behaviors.push((ORDER_TRACE, 0, Arc::new(TraceBehavior)));
        }
        behaviors.push((ORDER_VALIDATION, 0, Arc::new(ValidationBehavior::new(validators))));
        behaviors.sort_by_key(|(order, seq, _)| (*order, *seq));

        let behaviors: Arc<[Arc<dyn Behavior<R, T>>]> =
            behaviors.into_iter().map(|(_, _, behavior)| behavior).collect();
        let handlers: Arc<[Arc<dyn Handler<R, T>>]> = handlers.into();

        let invoke: InvokeFn = Box::new(move |boxed, token| {
            // Exactly-one-handler is checked here, at resolution time, so a
            // duplicated registration surfaces as a configuration fault
            // instead of silently picking a winner.
            let handler = match handlers.len() {
                1 => handlers[0].clone(),
                0 => {
                    let error = MediatorError::HandlerNotFound(request_type.to_string());
                    return Box::pin(async move { Err(error) });
                }
                count => {
                    let error = MediatorError::AmbiguousHandler {
                        request_type: request_type.to_string(),
                        count,
                    };
                    return Box::pin(async move { Err(error) });
                }
            };

            let request: Arc<R> = match boxed.downcast::<R>() {
                Ok(request) => Arc::from(request),
                Err(_) => {
                    let error = MediatorError::InvalidRequest(request_type.to_string());
                    return Box::pin(async move { Err(error) });
                }
            };

            let behaviors = behaviors.clone();
            Box::pin(async move {
                let chain = compose(request, token.clone(), behaviors, handler);
                let result = chain.run().await;
                Ok(translate(kind, request_type, &token, result))
            })
        });

        DispatchEntry { invoke }
    }
}

/// Normalize a chain result into the three-way envelope.
///
/// This is the single place where in-chain failures become caller-visible
/// payloads; unexpected failure detail stops here.
fn translate<T: Send + 'static>(
    kind: RequestKind,
    request_type: &'static str,
    token: &CancellationToken,
    result: DispatchResult<T>,
) -> Outcome {
    match result {
        Ok(value) => match kind {
            RequestKind::Typed => Outcome::Response(Box::new(value)),
            RequestKind::Void => Outcome::Completed,
        },
        Err(DispatchError::Validation(payload)) => {
            tracing::debug!(request_type, status = payload.status_code, "validation failure");
            Outcome::Errors(payload)
        }
        Err(DispatchError::Rejected(payload)) => {
            tracing::debug!(request_type, status = payload.status_code, "request rejected");
            Outcome::Errors(payload)
        }
        Err(DispatchError::Cancelled) if token.is_cancelled() => {
            tracing::debug!(request_type, "request cancelled");
            Outcome::Errors(ErrorsResponse::cancelled())
        }
        Err(error) => {
            tracing::error!(request_type, error = ?error, "unexpected dispatch failure");
            Outcome::Errors(ErrorsResponse::unexpected())
        }
    }
}

/// Immutable request-type-to-pipeline mapping.
pub(crate) struct Registry {
    entries: HashMap<TypeId, DispatchEntry>,
}

impl Registry {
    pub(crate) fn new(entries: HashMap<TypeId, DispatchEntry>) -> Self {
        Self { entries }
    }

    /// O(1) lookup of the dispatch entry for a request type.
    ///
    /// An unknown type is a [`MediatorError::HandlerNotFound`] fault; no
    /// behavior or validator runs for it.
    pub(crate) fn resolve(&self, type_id: TypeId, request_type: &str) -> Result<&DispatchEntry> {
        self.entries
            .get(&type_id)
            .ok_or_else(|| MediatorError::HandlerNotFound(request_type.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping;

    fn typed_slot() -> PipelineSlot<Ping, u32> {
        PipelineSlot::new(RequestKind::Typed)
    }

    #[tokio::test]
    async fn test_empty_slot_resolves_to_handler_not_found() {
        let entry = Box::new(typed_slot()).finish(false);
        let error = entry
            .invoke(Box::new(Ping), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(error, MediatorError::HandlerNotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_handlers_are_ambiguous() {
        let mut slot = typed_slot();
        let handler = |_request: std::sync::Arc<Ping>, _token: CancellationToken| async move {
            Ok::<u32, DispatchError>(1)
        };
        slot.push_handler(Arc::new(handler));
        slot.push_handler(Arc::new(handler));

        let entry = Box::new(slot).finish(false);
        let error = entry
            .invoke(Box::new(Ping), CancellationToken::new())
            .await
            .unwrap_err();
        match error {
            MediatorError::AmbiguousHandler { count, .. } => assert_eq!(count, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_mismatched_request_value_is_invalid() {
        let mut slot = typed_slot();
        slot.push_handler(Arc::new(
            |_request: std::sync::Arc<Ping>, _token: CancellationToken| async move {
                Ok::<u32, DispatchError>(1)
            },
        ));

        let entry = Box::new(slot).finish(false);
        let error = entry
            .invoke(Box::new("not a ping"), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(error, MediatorError::InvalidRequest(_)));
    }

    #[test]
    fn test_registry_resolve_unknown_type() {
        let registry = Registry::new(HashMap::new());
        let error = registry
            .resolve(TypeId::of::<Ping>(), "Ping")
            .err()
            .unwrap();
        assert_eq!(error.to_string(), "no handler registered for request type `Ping`");
    }

    #[test]
    fn test_translate_masks_unexpected_detail() {
        let outcome = translate::<u32>(
            RequestKind::Typed,
            "Ping",
            &CancellationToken::new(),
            Err(DispatchError::Unexpected(anyhow::anyhow!("secret detail"))),
        );
        let payload = outcome.errors().unwrap();
        assert_eq!(payload.status_code, 500);
        assert!(payload.errors.iter().all(|m| !m.contains("secret")));
    }

    #[test]
    fn test_translate_cancelled_requires_requested_token() {
        // Cancelled without a requested token is an unexpected failure.
        let outcome = translate::<u32>(
            RequestKind::Typed,
            "Ping",
            &CancellationToken::new(),
            Err(DispatchError::Cancelled),
        );
        assert_eq!(outcome.errors().unwrap().status_code, 500);

        let token = CancellationToken::new();
        token.cancel();
        let outcome = translate::<u32>(RequestKind::Typed, "Ping", &token, Err(DispatchError::Cancelled));
        assert_eq!(outcome.errors().unwrap().status_code, 499);
    }

    #[test]
    fn test_translate_void_success_is_completed() {
        let outcome = translate::<()>(
            RequestKind::Void,
            "Ping",
            &CancellationToken::new(),
            Ok(()),
        );
        assert!(outcome.is_completed());
    }
}
