//! Routing queue contract.
//!
//! A routing queue accepts a decoded message for later, asynchronous
//! processing, or refuses it synchronously. Enqueue never blocks: bounded
//! tokio channels use `try_send`, so a full queue is reported to the caller
//! instead of stalling the network thread.
//!
//! ```text
//! Connection 1 ─┐
//! Connection 2 ─┼─► RoutingQueue::enqueue ─► worker task
//! Connection N ─┘
//! ```

use tokio::sync::mpsc;

use crate::error::{ProcessorError, Result};
use crate::message::{Message, Payload};

/// A message handed to a routing queue.
#[derive(Debug)]
pub struct Routed<C> {
    /// Wire message id.
    pub id: u16,
    /// Correlation id, if the processor uses the correlated shape.
    pub correlation_id: Option<u16>,
    /// Decoded payload, `None` for marker messages.
    pub payload: Option<Payload>,
    /// Caller-supplied context (typically the connection).
    pub context: C,
}

impl<C> Routed<C> {
    /// Borrow the payload as a `T`.
    pub fn payload_ref<T: Message>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref::<T>())
    }
}

/// Enqueue contract for external work queues.
pub trait RoutingQueue<C>: Send + Sync + 'static {
    /// Accept `item` for asynchronous processing, or fail immediately.
    fn enqueue(&self, item: Routed<C>) -> Result<()>;
}

impl<C: Send + 'static> RoutingQueue<C> for mpsc::Sender<Routed<C>> {
    fn enqueue(&self, item: Routed<C>) -> Result<()> {
        let id = item.id;
        self.try_send(item).map_err(|e| ProcessorError::Enqueue {
            id,
            reason: match e {
                mpsc::error::TrySendError::Full(_) => "queue full",
                mpsc::error::TrySendError::Closed(_) => "queue closed",
            },
        })
    }
}

impl<C: Send + 'static> RoutingQueue<C> for mpsc::UnboundedSender<Routed<C>> {
    fn enqueue(&self, item: Routed<C>) -> Result<()> {
        let id = item.id;
        self.send(item).map_err(|_| ProcessorError::Enqueue {
            id,
            reason: "queue closed",
        })
    }
}
