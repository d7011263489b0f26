//! Delivery resolution for decoded envelopes.
//!
//! Priority, first match wins:
//! 1. global router (every id, overrides per-message handlers)
//! 2. per-message handler, called on the current thread
//! 3. per-message routing queue
//! 4. otherwise `Unroutable`

use std::sync::Arc;

use super::{Delivery, Routed, RoutingQueue};
use crate::error::{ProcessorError, Result};
use crate::message::Envelope;
use crate::registry::MessageRegistry;

/// Resolves and performs delivery for one envelope at a time.
pub struct Dispatcher<C> {
    router: Option<Arc<dyn RoutingQueue<C>>>,
}

impl<C> Dispatcher<C> {
    /// Dispatcher using per-message targets only.
    pub fn new() -> Self {
        Self { router: None }
    }

    /// Dispatcher sending every message to `router`.
    pub fn with_router(router: Arc<dyn RoutingQueue<C>>) -> Self {
        Self {
            router: Some(router),
        }
    }

    /// Whether a global router is configured.
    #[inline]
    pub fn has_router(&self) -> bool {
        self.router.is_some()
    }

    /// Deliver `envelope` with `ctx`.
    ///
    /// Exactly one target receives the message; the handler or enqueue runs
    /// at most once.
    pub fn route(&self, registry: &MessageRegistry<C>, envelope: Envelope, ctx: C) -> Result<()>
    where
        C: 'static,
    {
        let Envelope {
            id,
            correlation_id,
            payload,
        } = envelope;
        let descriptor = registry.lookup(id)?;

        if let Some(router) = &self.router {
            tracing::trace!(id, "routing to global router");
            return router.enqueue(Routed {
                id,
                correlation_id,
                payload,
                context: ctx,
            });
        }

        match descriptor.delivery() {
            Delivery::Handler(handler) => {
                tracing::trace!(id, "calling handler");
                handler.call(id, payload, ctx)
            }
            Delivery::Queue(queue) => {
                tracing::trace!(id, "routing to message queue");
                queue.enqueue(Routed {
                    id,
                    correlation_id,
                    payload,
                    context: ctx,
                })
            }
            Delivery::None => Err(ProcessorError::Unroutable(id)),
        }
    }
}

impl<C> Default for Dispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MsgPackCodec;
    use crate::registry::MessageDescriptor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Shout {
        text: String,
    }

    fn counting_handler(counter: &Arc<AtomicUsize>) -> Delivery<u8> {
        let counter = Arc::clone(counter);
        Delivery::typed(move |_: Shout, _ctx: u8| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn shout() -> Envelope {
        Envelope::new(
            1,
            Shout {
                text: "hey".to_string(),
            },
        )
    }

    #[test]
    fn test_handler_called_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = MessageRegistry::new();
        registry
            .register(MessageDescriptor::typed::<Shout, MsgPackCodec>(
                1,
                counting_handler(&calls),
            ))
            .unwrap();

        Dispatcher::new().route(&registry, shout(), 0).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_router_wins_over_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = MessageRegistry::new();
        registry
            .register(MessageDescriptor::typed::<Shout, MsgPackCodec>(
                1,
                counting_handler(&calls),
            ))
            .unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel::<Routed<u8>>();
        let dispatcher = Dispatcher::<u8>::with_router(Arc::new(tx));
        assert!(dispatcher.has_router());

        dispatcher
            .route(&registry, shout().with_correlation_id(4), 9)
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let routed = rx.try_recv().unwrap();
        assert_eq!(routed.id, 1);
        assert_eq!(routed.correlation_id, Some(4));
        assert_eq!(routed.context, 9);
        assert_eq!(
            routed.payload_ref::<Shout>(),
            Some(&Shout {
                text: "hey".to_string()
            })
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_queue_delivery() {
        let (tx, mut rx) = mpsc::channel::<Routed<u8>>(8);
        let mut registry = MessageRegistry::new();
        registry
            .register(MessageDescriptor::marker(2, Delivery::queue(tx)))
            .unwrap();

        Dispatcher::new()
            .route(&registry, Envelope::marker(2), 3)
            .unwrap();

        let routed = rx.try_recv().unwrap();
        assert_eq!(routed.id, 2);
        assert!(routed.payload.is_none());
        assert_eq!(routed.context, 3);
    }

    #[test]
    fn test_unroutable_and_unknown() {
        let mut registry: MessageRegistry<u8> = MessageRegistry::new();
        registry
            .register(MessageDescriptor::marker(5, Delivery::None))
            .unwrap();

        let dispatcher = Dispatcher::new();
        assert!(matches!(
            dispatcher.route(&registry, Envelope::marker(5), 0),
            Err(ProcessorError::Unroutable(5))
        ));
        assert!(matches!(
            dispatcher.route(&registry, Envelope::marker(6), 0),
            Err(ProcessorError::UnknownMessage(6))
        ));
    }

    #[test]
    fn test_router_still_rejects_unknown_id() {
        let registry: MessageRegistry<u8> = MessageRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel::<Routed<u8>>();
        let dispatcher = Dispatcher::<u8>::with_router(Arc::new(tx));

        assert!(matches!(
            dispatcher.route(&registry, Envelope::marker(1), 0),
            Err(ProcessorError::UnknownMessage(1))
        ));
        assert!(rx.try_recv().is_err());
    }
}
