//! Handler module - delivery targets and dispatch.
//!
//! Provides:
//! - [`Handler`] - synchronous per-message callback
//! - [`TypedHandler`] - downcasts the payload before calling a typed closure
//! - [`RoutingQueue`] - enqueue contract for external work queues
//! - [`Delivery`] - the delivery target attached to one message id
//! - [`Dispatcher`] - resolves router / handler / queue for an envelope
//!
//! # Example
//!
//! ```
//! use leafwire::handler::Delivery;
//!
//! #[derive(Debug)]
//! struct Chat {
//!     text: String,
//! }
//!
//! let delivery: Delivery<u64> = Delivery::typed(|chat: Chat, session: u64| {
//!     println!("session {} says {}", session, chat.text);
//!     Ok(())
//! });
//! assert!(delivery.is_handler());
//! ```

mod dispatcher;
mod queue;

use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{ProcessorError, Result};
use crate::message::{Message, Payload};

pub use dispatcher::Dispatcher;
pub use queue::{Routed, RoutingQueue};

/// Result type for handler functions.
pub type HandlerResult = Result<()>;

/// Trait for synchronous message handlers.
///
/// Handlers run on the calling thread, inside `Processor::route`.
pub trait Handler<C>: Send + Sync + 'static {
    /// Handle one message.
    fn call(&self, id: u16, payload: Option<Payload>, ctx: C) -> HandlerResult;
}

/// Handler over the erased payload.
pub struct FnHandler<F> {
    handler: F,
}

impl<F> FnHandler<F> {
    /// Wrap a closure.
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

impl<C, F> Handler<C> for FnHandler<F>
where
    F: Fn(Option<Payload>, C) -> HandlerResult + Send + Sync + 'static,
{
    fn call(&self, _id: u16, payload: Option<Payload>, ctx: C) -> HandlerResult {
        (self.handler)(payload, ctx)
    }
}

/// Wrapper that downcasts the payload before calling the handler.
pub struct TypedHandler<F, T> {
    handler: F,
    _phantom: PhantomData<fn(T)>,
}

impl<F, T> TypedHandler<F, T> {
    /// Create a new typed handler.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<C, F, T> Handler<C> for TypedHandler<F, T>
where
    F: Fn(T, C) -> HandlerResult + Send + Sync + 'static,
    T: Message,
{
    fn call(&self, id: u16, payload: Option<Payload>, ctx: C) -> HandlerResult {
        let payload = payload.ok_or_else(|| ProcessorError::Handler {
            id,
            reason: "no payload".to_string(),
        })?;
        let typed = payload
            .downcast::<T>()
            .map_err(|_| ProcessorError::PayloadMismatch {
                id,
                expected: std::any::type_name::<T>(),
            })?;
        (self.handler)(*typed, ctx)
    }
}

/// Delivery target attached to one message id.
///
/// A descriptor carries at most one target.
pub enum Delivery<C> {
    /// Call synchronously on the decoding thread.
    Handler(Arc<dyn Handler<C>>),
    /// Enqueue for asynchronous processing.
    Queue(Arc<dyn RoutingQueue<C>>),
    /// Only reachable through a global router.
    None,
}

impl<C: 'static> Delivery<C> {
    /// Handler receiving the erased payload.
    pub fn handler<F>(handler: F) -> Self
    where
        F: Fn(Option<Payload>, C) -> HandlerResult + Send + Sync + 'static,
    {
        Delivery::Handler(Arc::new(FnHandler::new(handler)))
    }

    /// Handler receiving the payload as a `T`.
    pub fn typed<T, F>(handler: F) -> Self
    where
        T: Message,
        F: Fn(T, C) -> HandlerResult + Send + Sync + 'static,
    {
        Delivery::Handler(Arc::new(TypedHandler::new(handler)))
    }

    /// Routing queue.
    pub fn queue<Q: RoutingQueue<C>>(queue: Q) -> Self {
        Delivery::Queue(Arc::new(queue))
    }
}

impl<C> Delivery<C> {
    /// Whether this is a handler target.
    pub fn is_handler(&self) -> bool {
        matches!(self, Delivery::Handler(_))
    }

    /// Whether this is a queue target.
    pub fn is_queue(&self) -> bool {
        matches!(self, Delivery::Queue(_))
    }

    /// Whether there is no per-message target.
    pub fn is_none(&self) -> bool {
        matches!(self, Delivery::None)
    }
}

impl<C> Clone for Delivery<C> {
    fn clone(&self) -> Self {
        match self {
            Delivery::Handler(h) => Delivery::Handler(Arc::clone(h)),
            Delivery::Queue(q) => Delivery::Queue(Arc::clone(q)),
            Delivery::None => Delivery::None,
        }
    }
}

impl<C> std::fmt::Debug for Delivery<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Delivery::Handler(_) => f.write_str("Delivery::Handler"),
            Delivery::Queue(_) => f.write_str("Delivery::Queue"),
            Delivery::None => f.write_str("Delivery::None"),
        }
    }
}
