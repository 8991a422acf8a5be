//! Dispatcher and registration builder.
//!
//! [`MediatorBuilder`] provides the startup-time registration API; the
//! [`Mediator`] it builds is the single runtime entry point. Registration is
//! startup-only - there is no hot reload - and the built mediator is cheap
//! to clone and safe to share across any number of concurrent calls.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use mediary::{Mediator, Request, SingleResponse};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Greet { name: String }
//!
//! impl Request for Greet {
//!     type Response = SingleResponse<String>;
//! }
//!
//! let mediator = Mediator::builder()
//!     .handle(|request: Arc<Greet>, _token| async move {
//!         Ok(SingleResponse::new(format!("hello {}", request.name)))
//!     })
//!     .validator(|request: Arc<Greet>, _token| async move {
//!         let mut errors = Vec::new();
//!         if request.name.is_empty() {
//!             errors.push("name must not be empty".to_string());
//!         }
//!         Ok(errors)
//!     })
//!     .build()?;
//!
//! let outcome = mediator
//!     .send(Greet { name: "ada".into() }, CancellationToken::new())
//!     .await?;
//! ```

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::behavior::{Behavior, Validator};
use crate::error::{MediatorError, Result};
use crate::handler::Handler;
use crate::outcome::Outcome;
use crate::registry::{DispatchEntry, ErasedSlot, PipelineSlot, Registry};
use crate::request::{Request, RequestKind, VoidRequest};

/// The dispatch entry point.
///
/// Holds the frozen registry; every call resolves its pipeline with one
/// lookup and runs on the caller's task. There is no shared mutable state
/// between calls.
#[derive(Clone)]
pub struct Mediator {
    registry: Arc<Registry>,
}

impl Mediator {
    /// Start a registration builder.
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    /// Dispatch a request and normalize the outcome into the three-way
    /// envelope.
    ///
    /// Returns `Err` only for programmer faults (no handler registered,
    /// ambiguous registration, mismatched request value); every
    /// business-level failure comes back as data inside the [`Outcome`].
    ///
    /// The cancellation token is threaded unchanged through every behavior,
    /// every validator, and the handler. Cancellation is cooperative: a
    /// stage that never checks the token runs to completion.
    pub async fn send<R>(&self, request: R, token: CancellationToken) -> Result<Outcome>
    where
        R: Any + Send,
    {
        self.dispatch(TypeId::of::<R>(), type_name::<R>(), Box::new(request), token)
            .await
    }

    /// Dispatch an already-erased request.
    ///
    /// For transport adapters that deserialize into boxed values and never
    /// see concrete request types.
    pub async fn send_boxed(
        &self,
        request: Box<dyn Any + Send>,
        token: CancellationToken,
    ) -> Result<Outcome> {
        let type_id = request.as_ref().type_id();
        self.dispatch(type_id, "<erased request>", request, token).await
    }

    async fn dispatch(
        &self,
        type_id: TypeId,
        request_type: &str,
        request: Box<dyn Any + Send>,
        token: CancellationToken,
    ) -> Result<Outcome> {
        let entry = self.registry.resolve(type_id, request_type)?;
        entry.invoke(request, token).await
    }
}

/// Startup-time registration API.
///
/// All registration happens through this builder, single-threaded, before
/// any dispatch; `build` freezes the registry. Registration errors (such as
/// a request type registered under conflicting shapes) are deferred and
/// surfaced by `build`, keeping the fluent chain uninterrupted.
pub struct MediatorBuilder {
    slots: HashMap<TypeId, Box<dyn ErasedSlot>>,
    errors: Vec<MediatorError>,
    tracing_enabled: bool,
    next_seq: u32,
}

impl MediatorBuilder {
    /// Create an empty builder with tracing enabled.
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            errors: Vec::new(),
            tracing_enabled: true,
            next_seq: 1,
        }
    }

    /// Enable or disable the built-in observability behavior.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.tracing_enabled = enabled;
        self
    }

    /// Register the handler for a typed-response request.
    ///
    /// Exactly one handler per request type is allowed; a second
    /// registration is rejected when the type is first dispatched.
    pub fn handle<R, H>(mut self, handler: H) -> Self
    where
        R: Request,
        H: Handler<R, R::Response>,
    {
        self.with_slot::<R, R::Response>(RequestKind::Typed, |slot| {
            slot.push_handler(Arc::new(handler));
        });
        self
    }

    /// Register the handler for a void request.
    pub fn handle_void<R, H>(mut self, handler: H) -> Self
    where
        R: VoidRequest,
        H: Handler<R, ()>,
    {
        self.with_slot::<R, ()>(RequestKind::Void, |slot| {
            slot.push_handler(Arc::new(handler));
        });
        self
    }

    /// Register a behavior for a typed-response request.
    ///
    /// `order` places the behavior in the chain (lower = outermost); ties
    /// preserve registration order. See the order constants in
    /// [`behavior`](crate::behavior).
    pub fn behavior<R, B>(mut self, order: i32, behavior: B) -> Self
    where
        R: Request,
        B: Behavior<R, R::Response>,
    {
        let seq = self.next_seq();
        self.with_slot::<R, R::Response>(RequestKind::Typed, |slot| {
            slot.push_behavior(order, seq, Arc::new(behavior));
        });
        self
    }

    /// Register a behavior for a void request.
    pub fn void_behavior<R, B>(mut self, order: i32, behavior: B) -> Self
    where
        R: VoidRequest,
        B: Behavior<R, ()>,
    {
        let seq = self.next_seq();
        self.with_slot::<R, ()>(RequestKind::Void, |slot| {
            slot.push_behavior(order, seq, Arc::new(behavior));
        });
        self
    }

    /// Register a validator for a typed-response request.
    ///
    /// Validators run in registration order; all of them run before the
    /// validation decision is made.
    pub fn validator<R, V>(mut self, validator: V) -> Self
    where
        R: Request,
        V: Validator<R>,
    {
        self.with_slot::<R, R::Response>(RequestKind::Typed, |slot| {
            slot.push_validator(Arc::new(validator));
        });
        self
    }

    /// Register a validator for a void request.
    pub fn void_validator<R, V>(mut self, validator: V) -> Self
    where
        R: VoidRequest,
        V: Validator<R>,
    {
        self.with_slot::<R, ()>(RequestKind::Void, |slot| {
            slot.push_validator(Arc::new(validator));
        });
        self
    }

    /// Freeze the registry and produce the mediator.
    ///
    /// Surfaces any deferred registration error.
    pub fn build(self) -> Result<Mediator> {
        let Self {
            slots,
            mut errors,
            tracing_enabled,
            ..
        } = self;

        if !errors.is_empty() {
            return Err(errors.remove(0));
        }

        let entries: HashMap<TypeId, DispatchEntry> = slots
            .into_iter()
            .map(|(type_id, slot)| (type_id, slot.finish(tracing_enabled)))
            .collect();

        Ok(Mediator {
            registry: Arc::new(Registry::new(entries)),
        })
    }

    fn next_seq(&mut self) -> u32 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Apply a registration to the slot for `R`, creating it on first use.
    ///
    /// A kind or response-type mismatch with an existing slot means the
    /// request type is being registered under conflicting shapes; the error
    /// is deferred so the fluent chain stays uninterrupted.
    fn with_slot<R, T>(
        &mut self,
        kind: RequestKind,
        register: impl FnOnce(&mut PipelineSlot<R, T>),
    ) where
        R: Send + Sync + 'static,
        T: Send + 'static,
    {
        let slot = self
            .slots
            .entry(TypeId::of::<R>())
            .or_insert_with(|| Box::new(PipelineSlot::<R, T>::new(kind)));

        if slot.kind() == kind {
            if let Some(slot) = slot.as_any_mut().downcast_mut::<PipelineSlot<R, T>>() {
                register(slot);
                return;
            }
        }

        self.errors
            .push(MediatorError::ShapeConflict(type_name::<R>().to_string()));
    }
}

impl Default for MediatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
