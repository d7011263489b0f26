//! Processor builder and steady-state façade.
//!
//! The [`ProcessorBuilder`] is the bootstrap phase: it owns the registry and
//! accepts registrations. [`ProcessorBuilder::build`] freezes it into a
//! [`Processor`], which has no registration methods and can be shared across
//! connection tasks behind an `Arc`:
//! 1. Configure byte order, header shape and optional global router
//! 2. Register every message id
//! 3. Build, then decode / encode / route from any thread
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use leafwire::{Envelope, ProcessorBuilder};
//!
//! #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
//! struct Chat {
//!     text: String,
//! }
//!
//! let mut builder = ProcessorBuilder::<u32>::new();
//! builder
//!     .register(1, |chat: Chat, session: u32| {
//!         println!("{}: {}", session, chat.text);
//!         Ok(())
//!     })
//!     .unwrap();
//! let processor = Arc::new(builder.build());
//!
//! let frame = processor
//!     .encode(&Envelope::new(1, Chat { text: "hi".to_string() }))
//!     .unwrap();
//! let envelope = processor.decode(&frame.to_vec()).unwrap();
//! processor.route(envelope, 42).unwrap();
//! ```

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{BodyCodec, MsgPackCodec};
use crate::config::ProcessorConfig;
use crate::error::{ProcessorError, Result};
use crate::handler::{Delivery, Dispatcher, HandlerResult, RoutingQueue};
use crate::message::{Envelope, Message, MessageType};
use crate::protocol::{ByteOrder, EncodedFrame, Header, HeaderShape};
use crate::registry::{MessageDescriptor, MessageRegistry, MARKER_TYPE_NAME};

/// Bootstrap-phase builder for a [`Processor`].
pub struct ProcessorBuilder<C = ()> {
    config: ProcessorConfig,
    registry: MessageRegistry<C>,
    router: Option<Arc<dyn RoutingQueue<C>>>,
}

impl<C: 'static> ProcessorBuilder<C> {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self::from_config(ProcessorConfig::default())
    }

    /// Create a builder from a configuration.
    pub fn from_config(config: ProcessorConfig) -> Self {
        Self {
            config,
            registry: MessageRegistry::new(),
            router: None,
        }
    }

    /// Set the header byte order.
    pub fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.config.byte_order = byte_order;
        self
    }

    /// Set the header byte order from a `little_endian` flag.
    pub fn little_endian(self, little_endian: bool) -> Self {
        self.byte_order(ByteOrder::from_little_endian(little_endian))
    }

    /// Set the header shape.
    pub fn header_shape(mut self, header_shape: HeaderShape) -> Self {
        self.config.header_shape = header_shape;
        self
    }

    /// Send every message to `router`, overriding per-message handlers.
    pub fn with_router<Q: RoutingQueue<C>>(mut self, router: Q) -> Self {
        self.router = Some(Arc::new(router));
        self
    }

    /// Register a typed message with a synchronous handler.
    pub fn register<T, F>(&mut self, id: u16, handler: F) -> Result<()>
    where
        T: Message + Serialize + DeserializeOwned,
        F: Fn(T, C) -> HandlerResult + Send + Sync + 'static,
    {
        self.register_with_codec::<T, MsgPackCodec>(id, Delivery::typed(handler))
    }

    /// Register a typed message delivered to a routing queue.
    pub fn register_with_queue<T, Q>(&mut self, id: u16, queue: Q) -> Result<()>
    where
        T: Message + Serialize + DeserializeOwned,
        Q: RoutingQueue<C>,
    {
        self.register_with_codec::<T, MsgPackCodec>(id, Delivery::queue(queue))
    }

    /// Register a typed message with no per-message target.
    ///
    /// Such messages are only routable through a global router.
    pub fn register_type<T>(&mut self, id: u16) -> Result<()>
    where
        T: Message + Serialize + DeserializeOwned,
    {
        self.register_with_codec::<T, MsgPackCodec>(id, Delivery::None)
    }

    /// Register a typed message with an explicit body codec and target.
    pub fn register_with_codec<T, K>(&mut self, id: u16, delivery: Delivery<C>) -> Result<()>
    where
        T: Message + Serialize + DeserializeOwned,
        K: BodyCodec,
    {
        self.registry
            .register(MessageDescriptor::typed::<T, K>(id, delivery))
    }

    /// Register a body-less marker message.
    pub fn register_marker(&mut self, id: u16, delivery: Delivery<C>) -> Result<()> {
        self.registry.register(MessageDescriptor::marker(id, delivery))
    }

    /// Freeze the registry.
    pub fn build(self) -> Processor<C> {
        let dispatcher = match self.router {
            Some(router) => Dispatcher::with_router(router),
            None => Dispatcher::new(),
        };
        tracing::debug!(
            messages = self.registry.len(),
            byte_order = ?self.config.byte_order,
            header_shape = ?self.config.header_shape,
            global_router = dispatcher.has_router(),
            "processor ready"
        );
        Processor {
            config: self.config,
            registry: self.registry,
            dispatcher,
        }
    }
}

impl<C: 'static> Default for ProcessorBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Message registry, wire codec and dispatcher for one protocol endpoint.
///
/// # Thread Safety
///
/// `Processor` is `Send + Sync`. Decode, encode and route take `&self` and
/// share no mutable state, so many connection tasks can call them at once.
/// The only mutation, [`Processor::set_byte_order`], needs `&mut self`.
pub struct Processor<C = ()> {
    config: ProcessorConfig,
    registry: MessageRegistry<C>,
    dispatcher: Dispatcher<C>,
}

impl<C: 'static> Processor<C> {
    /// Start a builder.
    pub fn builder() -> ProcessorBuilder<C> {
        ProcessorBuilder::new()
    }
}

impl<C> Processor<C> {
    /// Current configuration.
    #[inline]
    pub fn config(&self) -> ProcessorConfig {
        self.config
    }

    /// Header byte order.
    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.config.byte_order
    }

    /// Header shape.
    #[inline]
    pub fn header_shape(&self) -> HeaderShape {
        self.config.header_shape
    }

    /// Header size in bytes.
    #[inline]
    pub fn header_size(&self) -> usize {
        self.config.header_size()
    }

    /// Switch the header byte order.
    pub fn set_byte_order(&mut self, little_endian: bool) {
        self.config.byte_order = ByteOrder::from_little_endian(little_endian);
    }

    /// Whether a global router is configured.
    #[inline]
    pub fn has_router(&self) -> bool {
        self.dispatcher.has_router()
    }

    /// Registered descriptors.
    #[inline]
    pub fn registry(&self) -> &MessageRegistry<C> {
        &self.registry
    }

    /// Look up the descriptor for `id`.
    pub fn lookup(&self, id: u16) -> Result<&MessageDescriptor<C>> {
        self.registry.lookup(id)
    }

    /// Visit every registered `(id, type)` pair.
    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(u16, Option<MessageType>),
    {
        self.registry.for_each(f)
    }

    /// Decode one delimited frame.
    ///
    /// # Errors
    ///
    /// - `ShortFrame` if `data` is shorter than the header
    /// - `UnknownMessage` if the id is not registered
    /// - `MissingBody` for a correlated frame of a typed message with no body;
    ///   the error carries the decoded envelope
    /// - `MalformedBody` if the body does not deserialize
    pub fn decode(&self, data: &[u8]) -> Result<Envelope> {
        let shape = self.config.header_shape;
        let header = Header::decode(data, shape, self.config.byte_order).ok_or(
            ProcessorError::ShortFrame {
                expected: shape.size(),
                actual: data.len(),
            },
        )?;
        let descriptor = self.registry.lookup(header.id)?;

        let mut envelope = Envelope {
            id: header.id,
            correlation_id: header.correlation_id,
            payload: None,
        };

        // Markers ignore any trailing bytes
        let Some(format) = descriptor.body() else {
            return Ok(envelope);
        };

        let body = &data[shape.size()..];
        if shape.is_correlated() && body.is_empty() {
            return Err(ProcessorError::MissingBody {
                envelope: Box::new(envelope),
            });
        }

        let payload = format
            .decode(body)
            .map_err(|source| ProcessorError::MalformedBody {
                id: header.id,
                source,
            })?;
        envelope.payload = Some(payload);
        Ok(envelope)
    }

    /// Encode an envelope into header and body chunks.
    ///
    /// # Errors
    ///
    /// - `UnknownMessage` if the id is not registered
    /// - `PayloadMismatch` if the payload is not the registered type, a
    ///   marker id carries a payload, or a typed id carries none
    /// - `Serialization` if the body codec fails
    pub fn encode(&self, envelope: &Envelope) -> Result<EncodedFrame> {
        let id = envelope.id;
        let descriptor = self.registry.lookup(id)?;
        let shape = self.config.header_shape;

        if !shape.is_correlated() && envelope.correlation_id.is_some() {
            tracing::warn!(id, "correlation id dropped by minimal header");
        }
        let header = Header {
            id,
            correlation_id: envelope.correlation_id,
        }
        .encode(shape, self.config.byte_order);

        let (format, payload) = match (descriptor.body(), envelope.payload.as_deref()) {
            (None, None) => return Ok(EncodedFrame::empty(header)),
            (Some(format), Some(payload)) => (format, payload),
            (None, Some(_)) => {
                return Err(ProcessorError::PayloadMismatch {
                    id,
                    expected: MARKER_TYPE_NAME,
                })
            }
            // A typed frame without a body would not decode
            (Some(format), None) => {
                return Err(ProcessorError::PayloadMismatch {
                    id,
                    expected: format.message_type().name(),
                })
            }
        };

        let body = format
            .encode(payload)
            .ok_or(ProcessorError::PayloadMismatch {
                id,
                expected: format.message_type().name(),
            })?
            .map_err(|source| ProcessorError::Serialization { id, source })?;

        Ok(EncodedFrame::new(header, Bytes::from(body)))
    }

    /// Deliver an envelope to its target.
    ///
    /// See [`Dispatcher::route`] for the delivery priority.
    pub fn route(&self, envelope: Envelope, ctx: C) -> Result<()>
    where
        C: 'static,
    {
        self.dispatcher.route(&self.registry, envelope, ctx)
    }

    /// Decode a frame and route it.
    ///
    /// Frames that fail to decode are not routed, including `MissingBody`.
    pub fn process(&self, data: &[u8], ctx: C) -> Result<()>
    where
        C: 'static,
    {
        let envelope = self.decode(data)?;
        self.route(envelope, ctx)
    }
}

impl<C> std::fmt::Debug for Processor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("config", &self.config)
            .field("messages", &self.registry.len())
            .field("global_router", &self.dispatcher.has_router())
            .finish()
    }
}
