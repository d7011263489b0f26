//! Message registry mapping wire ids to message types and delivery targets.
//!
//! The registry is filled during bootstrap (`&mut self`) and only read
//! afterwards. Every typed entry stores a decode factory and an encoder that
//! close over the concrete type and its body codec, so no reflection is
//! needed at decode time.
//!
//! # Example
//!
//! ```
//! use leafwire::codec::MsgPackCodec;
//! use leafwire::handler::Delivery;
//! use leafwire::registry::{MessageDescriptor, MessageRegistry};
//!
//! #[derive(Debug, serde::Serialize, serde::Deserialize)]
//! struct Ping {
//!     seq: u32,
//! }
//!
//! let mut registry: MessageRegistry<()> = MessageRegistry::new();
//! registry
//!     .register(MessageDescriptor::typed::<Ping, MsgPackCodec>(1, Delivery::None))
//!     .unwrap();
//! registry.register(MessageDescriptor::marker(2, Delivery::None)).unwrap();
//!
//! assert!(registry.lookup(1).unwrap().message_type().is_some());
//! assert!(registry.lookup(2).unwrap().is_marker());
//! assert!(registry.lookup(3).is_err());
//! ```

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{BodyCodec, CodecError};
use crate::error::{ProcessorError, Result};
use crate::handler::Delivery;
use crate::message::{Message, MessageType, Payload};
use crate::protocol::RESERVED_MESSAGE_ID;

/// Type name reported for marker messages.
pub const MARKER_TYPE_NAME: &str = "<marker>";

type DecodeFn = Box<dyn Fn(&[u8]) -> std::result::Result<Payload, CodecError> + Send + Sync>;

/// Returns `None` when the payload is not of the registered type.
type EncodeFn =
    Box<dyn Fn(&dyn Message) -> Option<std::result::Result<Vec<u8>, CodecError>> + Send + Sync>;

/// How the body of a typed message is produced and consumed.
pub struct BodyFormat {
    message_type: MessageType,
    codec: &'static str,
    decode: DecodeFn,
    encode: EncodeFn,
}

impl BodyFormat {
    fn new<T, K>() -> Self
    where
        T: Message + Serialize + DeserializeOwned,
        K: BodyCodec,
    {
        Self {
            message_type: MessageType::of::<T>(),
            codec: K::NAME,
            decode: Box::new(
                |bytes: &[u8]| -> std::result::Result<Payload, CodecError> {
                    let value: T = K::decode(bytes)?;
                    Ok(Box::new(value))
                },
            ),
            encode: Box::new(|payload: &dyn Message| {
                payload.downcast_ref::<T>().map(|value| K::encode(value))
            }),
        }
    }

    /// Registered message type.
    #[inline]
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Name of the body codec.
    #[inline]
    pub fn codec(&self) -> &'static str {
        self.codec
    }

    /// Deserialize `bytes` into a fresh instance of the registered type.
    pub fn decode(&self, bytes: &[u8]) -> std::result::Result<Payload, CodecError> {
        (self.decode)(bytes)
    }

    /// Serialize `payload`; `None` if it is not of the registered type.
    pub fn encode(&self, payload: &dyn Message) -> Option<std::result::Result<Vec<u8>, CodecError>> {
        (self.encode)(payload)
    }
}

/// Registry entry for one message id.
pub struct MessageDescriptor<C> {
    id: u16,
    body: Option<BodyFormat>,
    delivery: Delivery<C>,
}

impl<C> MessageDescriptor<C> {
    /// Typed message whose body is encoded with codec `K`.
    pub fn typed<T, K>(id: u16, delivery: Delivery<C>) -> Self
    where
        T: Message + Serialize + DeserializeOwned,
        K: BodyCodec,
    {
        Self {
            id,
            body: Some(BodyFormat::new::<T, K>()),
            delivery,
        }
    }

    /// Marker message (no body).
    pub fn marker(id: u16, delivery: Delivery<C>) -> Self {
        Self {
            id,
            body: None,
            delivery,
        }
    }

    /// Wire id.
    #[inline]
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Registered type, `None` for markers.
    #[inline]
    pub fn message_type(&self) -> Option<MessageType> {
        self.body.as_ref().map(|b| b.message_type)
    }

    /// Body format, `None` for markers.
    #[inline]
    pub fn body(&self) -> Option<&BodyFormat> {
        self.body.as_ref()
    }

    /// Whether this is a marker message.
    #[inline]
    pub fn is_marker(&self) -> bool {
        self.body.is_none()
    }

    /// Per-message delivery target.
    #[inline]
    pub fn delivery(&self) -> &Delivery<C> {
        &self.delivery
    }

    /// Type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.body
            .as_ref()
            .map_or(MARKER_TYPE_NAME, |b| b.message_type.name())
    }
}

impl<C> std::fmt::Debug for MessageDescriptor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageDescriptor")
            .field("id", &self.id)
            .field("type", &self.type_name())
            .field("codec", &self.body.as_ref().map(|b| b.codec))
            .field("delivery", &self.delivery)
            .finish()
    }
}

/// Registry mapping message ids to descriptors.
pub struct MessageRegistry<C> {
    descriptors: HashMap<u16, MessageDescriptor<C>>,
}

impl<C> MessageRegistry<C> {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            descriptors: HashMap::new(),
        }
    }

    /// Add a descriptor.
    ///
    /// # Errors
    ///
    /// `Configuration` if the id is reserved or already registered. The
    /// registry is left unchanged.
    pub fn register(&mut self, descriptor: MessageDescriptor<C>) -> Result<()> {
        let id = descriptor.id;
        if id == RESERVED_MESSAGE_ID {
            return Err(ProcessorError::Configuration {
                id,
                type_name: descriptor.type_name(),
                reason: format!("id {:#06x} is reserved", RESERVED_MESSAGE_ID),
            });
        }
        if let Some(existing) = self.descriptors.get(&id) {
            return Err(ProcessorError::Configuration {
                id,
                type_name: descriptor.type_name(),
                reason: format!("id already registered to {}", existing.type_name()),
            });
        }

        tracing::debug!(
            id,
            message_type = descriptor.type_name(),
            delivery = ?descriptor.delivery,
            "registered message"
        );
        self.descriptors.insert(id, descriptor);
        Ok(())
    }

    /// Look up the descriptor for `id`.
    pub fn lookup(&self, id: u16) -> Result<&MessageDescriptor<C>> {
        self.descriptors
            .get(&id)
            .ok_or(ProcessorError::UnknownMessage(id))
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: u16) -> bool {
        self.descriptors.contains_key(&id)
    }

    /// Visit every `(id, type)` pair, in no particular order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(u16, Option<MessageType>),
    {
        for (&id, descriptor) in &self.descriptors {
            f(id, descriptor.message_type());
        }
    }

    /// Iterate over all descriptors.
    pub fn iter(&self) -> impl Iterator<Item = &MessageDescriptor<C>> {
        self.descriptors.values()
    }

    /// Number of registered ids.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl<C> Default for MessageRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
