//! Type-erased message payloads and the envelope that carries them.
//!
//! Registered message types are arbitrary Rust values; once decoded they
//! travel as a [`Payload`] (`Box<dyn Message>`) and are recovered with a
//! checked downcast.
//!
//! # Example
//!
//! ```
//! use leafwire::Envelope;
//!
//! #[derive(Debug, PartialEq)]
//! struct Ping(u32);
//!
//! let envelope = Envelope::new(1, Ping(7)).with_correlation_id(3);
//! assert_eq!(envelope.payload_ref::<Ping>(), Some(&Ping(7)));
//! assert_eq!(envelope.into_payload::<Ping>(), Some(Ping(7)));
//! ```

use std::any::{Any, TypeId};
use std::fmt;

/// A value that can travel as a message payload.
///
/// Implemented for every `Debug + Send + Sync + 'static` type.
pub trait Message: Any + Send + Sync + fmt::Debug {
    /// Borrow as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Convert into a boxed `Any` for owned downcasting.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;

    /// Name of the concrete type.
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync + fmt::Debug> Message for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }

    #[inline]
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl dyn Message {
    /// Whether the payload is a `T`.
    #[inline]
    pub fn is<T: Message>(&self) -> bool {
        Message::as_any(self).is::<T>()
    }

    /// Borrow the payload as a `T`.
    #[inline]
    pub fn downcast_ref<T: Message>(&self) -> Option<&T> {
        Message::as_any(self).downcast_ref::<T>()
    }

    /// Take the payload as a `T`, handing it back unchanged on mismatch.
    pub fn downcast<T: Message>(self: Box<Self>) -> Result<Box<T>, Box<dyn Message>> {
        if !self.is::<T>() {
            return Err(self);
        }
        // `Box<dyn Any + Send + Sync>` is itself a `Message`
        Message::into_any(self)
            .downcast::<T>()
            .map_err(|other| Box::new(other) as Box<dyn Message>)
    }
}

/// Owned, type-erased payload.
pub type Payload = Box<dyn Message>;

/// Runtime handle for a registered message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageType {
    type_id: TypeId,
    name: &'static str,
}

impl MessageType {
    /// Handle for `T`.
    pub fn of<T: Message>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// `TypeId` of the type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether `payload` is an instance of this type.
    #[inline]
    pub fn matches(&self, payload: &dyn Message) -> bool {
        Message::as_any(payload).type_id() == self.type_id
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A decoded or to-be-encoded message.
///
/// The codec never keeps envelopes: decode hands ownership to the caller and
/// encode only borrows.
#[derive(Debug)]
pub struct Envelope {
    /// Wire message id.
    pub id: u16,
    /// Correlation id (correlated header shape only).
    pub correlation_id: Option<u16>,
    /// Payload, `None` for marker messages.
    pub payload: Option<Payload>,
}

impl Envelope {
    /// Create an envelope carrying `payload`.
    pub fn new<T: Message>(id: u16, payload: T) -> Self {
        Self {
            id,
            correlation_id: None,
            payload: Some(Box::new(payload)),
        }
    }

    /// Create a body-less envelope.
    pub fn marker(id: u16) -> Self {
        Self {
            id,
            correlation_id: None,
            payload: None,
        }
    }

    /// Set the correlation id.
    pub fn with_correlation_id(mut self, correlation_id: u16) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Whether the envelope has no payload.
    #[inline]
    pub fn is_marker(&self) -> bool {
        self.payload.is_none()
    }

    /// Borrow the payload as a `T`.
    pub fn payload_ref<T: Message>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref::<T>())
    }

    /// Take the payload as a `T`.
    ///
    /// Returns `None` if there is no payload or it is not a `T`.
    pub fn into_payload<T: Message>(self) -> Option<T> {
        self.payload.and_then(|p| p.downcast::<T>().ok()).map(|b| *b)
    }
}
