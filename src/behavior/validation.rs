//! Validation behavior - runs every validator for a request type and
//! aggregates failures.
//!
//! All validators run to completion before the validation decision is made;
//! there is no short-circuit on the first failing validator. A non-empty
//! aggregate stops the chain with a
//! [`DispatchError::Validation`](crate::DispatchError::Validation) carrying
//! the classification code and every message in validator-registration
//! order.
//!
//! Two validator mechanisms coexist behind one trait: async closures get a
//! blanket impl with the default bad-request classification, while trait
//! impls may declare their own [`error_code`](Validator::error_code).

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::{DispatchError, DispatchResult};
use crate::handler::BoxFuture;
use crate::response::{ErrorsResponse, STATUS_BAD_REQUEST};

use super::{Behavior, Next};

/// Produces failure messages for a request instance.
///
/// An empty message list means the request is valid. A returned `Err` is an
/// unexpected validator fault and propagates upward unchanged, where the
/// dispatcher treats it like any other unexpected failure.
pub trait Validator<R>: Send + Sync + 'static {
    /// Classification code reported when this validator rejects a request.
    ///
    /// The validation behavior picks the first non-default code across all
    /// registered validators; if none declares one, the default bad-request
    /// classification is used.
    fn error_code(&self) -> u16 {
        STATUS_BAD_REQUEST
    }

    /// Validate the request, returning failure messages (empty = valid).
    fn validate(
        &self,
        request: Arc<R>,
        token: CancellationToken,
    ) -> BoxFuture<'static, DispatchResult<Vec<String>>>;
}

impl<R, F, Fut> Validator<R> for F
where
    R: Send + Sync + 'static,
    F: Fn(Arc<R>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = DispatchResult<Vec<String>>> + Send + 'static,
{
    fn validate(
        &self,
        request: Arc<R>,
        token: CancellationToken,
    ) -> BoxFuture<'static, DispatchResult<Vec<String>>> {
        Box::pin(self(request, token))
    }
}

/// Behavior running all validators registered for one request type.
///
/// Inserted automatically for every dispatch entry at
/// [`ORDER_VALIDATION`](super::ORDER_VALIDATION); with no validators it is a
/// pass-through.
pub struct ValidationBehavior<R> {
    validators: Arc<[Arc<dyn Validator<R>>]>,
}

impl<R> ValidationBehavior<R> {
    /// Build the behavior over validators in registration order.
    pub fn new(validators: Vec<Arc<dyn Validator<R>>>) -> Self {
        Self {
            validators: validators.into(),
        }
    }
}

impl<R, T> Behavior<R, T> for ValidationBehavior<R>
where
    R: Send + Sync + 'static,
    T: Send + 'static,
{
    fn handle(
        &self,
        request: Arc<R>,
        token: CancellationToken,
        next: Next<T>,
    ) -> BoxFuture<'static, DispatchResult<T>> {
        let validators = self.validators.clone();
        Box::pin(async move {
            let mut errors: Vec<String> = Vec::new();
            let mut code: Option<u16> = None;

            for validator in validators.iter() {
                let messages = validator.validate(request.clone(), token.clone()).await?;
                if code.is_none() && validator.error_code() != STATUS_BAD_REQUEST {
                    code = Some(validator.error_code());
                }
                errors.extend(messages);
            }

            if !errors.is_empty() {
                return Err(DispatchError::Validation(ErrorsResponse::new(
                    code.unwrap_or(STATUS_BAD_REQUEST),
                    errors,
                )));
            }

            next.run().await
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Req;

    fn failing(message: &'static str) -> Arc<dyn Validator<Req>> {
        Arc::new(move |_request: Arc<Req>, _token: CancellationToken| async move {
            Ok(vec![message.to_string()])
        })
    }

    fn passing() -> Arc<dyn Validator<Req>> {
        Arc::new(|_request: Arc<Req>, _token: CancellationToken| async move { Ok(Vec::new()) })
    }

    struct ConflictValidator;

    impl Validator<Req> for ConflictValidator {
        fn error_code(&self) -> u16 {
            409
        }

        fn validate(
            &self,
            _request: Arc<Req>,
            _token: CancellationToken,
        ) -> BoxFuture<'static, DispatchResult<Vec<String>>> {
            Box::pin(async move { Ok(vec!["already exists".to_string()]) })
        }
    }

    async fn run(behavior: ValidationBehavior<Req>, next_called: Arc<AtomicUsize>) -> DispatchResult<u32> {
        let next = Next::new(move || {
            next_called.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(1u32) })
        });
        Behavior::<Req, u32>::handle(&behavior, Arc::new(Req), CancellationToken::new(), next).await
    }

    #[tokio::test]
    async fn test_all_validators_run_and_messages_aggregate_in_order() {
        let behavior =
            ValidationBehavior::new(vec![failing("x required"), passing(), failing("y required")]);
        let next_called = Arc::new(AtomicUsize::new(0));

        let err = run(behavior, next_called.clone()).await.unwrap_err();
        match err {
            DispatchError::Validation(payload) => {
                assert_eq!(payload.status_code, STATUS_BAD_REQUEST);
                assert_eq!(payload.errors, vec!["x required", "y required"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(next_called.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_first_non_default_code_wins() {
        let behavior = ValidationBehavior::new(vec![failing("x required"), Arc::new(ConflictValidator)]);
        let next_called = Arc::new(AtomicUsize::new(0));

        let err = run(behavior, next_called).await.unwrap_err();
        match err {
            DispatchError::Validation(payload) => {
                assert_eq!(payload.status_code, 409);
                assert_eq!(payload.errors, vec!["x required", "already exists"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_valid_request_calls_continuation() {
        let behavior = ValidationBehavior::new(vec![passing(), passing()]);
        let next_called = Arc::new(AtomicUsize::new(0));

        let result = run(behavior, next_called.clone()).await.unwrap();
        assert_eq!(result, 1);
        assert_eq!(next_called.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_validators_is_pass_through() {
        let behavior = ValidationBehavior::new(Vec::new());
        let next_called = Arc::new(AtomicUsize::new(0));

        assert!(run(behavior, next_called.clone()).await.is_ok());
        assert_eq!(next_called.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_validator_fault_propagates_unchanged() {
        let faulty: Arc<dyn Validator<Req>> =
            Arc::new(|_request: Arc<Req>, _token: CancellationToken| async move {
                Err(DispatchError::Unexpected(anyhow::anyhow!("rules engine down")))
            });
        let behavior = ValidationBehavior::new(vec![faulty]);
        let next_called = Arc::new(AtomicUsize::new(0));

        let err = run(behavior, next_called.clone()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Unexpected(_)));
        assert_eq!(next_called.load(Ordering::SeqCst), 0);
    }
}
