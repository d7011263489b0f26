//! Error types for leafwire.

use thiserror::Error;

use crate::codec::CodecError;
use crate::message::Envelope;

/// Main error type for registry, codec and dispatch operations.
///
/// Only [`ProcessorError::Configuration`] is a boot-time error; every other
/// variant is scoped to a single message and must not take the process down.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Invalid registration (duplicate or reserved id).
    #[error("invalid registration of {type_name} with message id {id}: {reason}")]
    Configuration {
        /// Declared message id.
        id: u16,
        /// Name of the registered type (`"<marker>"` for marker messages).
        type_name: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// Buffer is shorter than the configured header.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    ShortFrame {
        /// Header size for the configured shape.
        expected: usize,
        /// Bytes received.
        actual: usize,
    },

    /// Message id is not registered.
    #[error("message id {0} not registered")]
    UnknownMessage(u16),

    /// Correlated frame for a typed message arrived without a body.
    ///
    /// The decoded envelope (id, correlation id, no payload) travels with the
    /// error; see [`ProcessorError::into_partial_envelope`].
    #[error("message id {} arrived without a body", envelope.id)]
    MissingBody {
        /// Partially decoded envelope.
        envelope: Box<Envelope>,
    },

    /// Body bytes could not be deserialized.
    #[error("malformed body for message id {id}: {source}")]
    MalformedBody {
        /// Message id.
        id: u16,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },

    /// Payload could not be serialized.
    #[error("failed to serialize message id {id}: {source}")]
    Serialization {
        /// Message id.
        id: u16,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },

    /// Payload type does not match the type registered for the id.
    #[error("payload for message id {id} is not a {expected}")]
    PayloadMismatch {
        /// Message id.
        id: u16,
        /// Registered type name (`"<marker>"` when no payload is allowed).
        expected: &'static str,
    },

    /// No router, handler or queue accepts the id.
    #[error("no delivery target for message id {0}")]
    Unroutable(u16),

    /// Routing queue refused the message.
    #[error("failed to enqueue message id {id}: {reason}")]
    Enqueue {
        /// Message id.
        id: u16,
        /// Reason reported by the queue.
        reason: &'static str,
    },

    /// Handler reported a failure.
    #[error("handler for message id {id} failed: {reason}")]
    Handler {
        /// Message id.
        id: u16,
        /// Failure description.
        reason: String,
    },
}

impl ProcessorError {
    /// Whether the error is scoped to one message or connection.
    ///
    /// Configuration errors are the only kind a caller must treat as fatal.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ProcessorError::Configuration { .. })
    }

    /// Recover the envelope carried by a `MissingBody` error.
    ///
    /// Returns `None` for every other kind.
    pub fn into_partial_envelope(self) -> Option<Envelope> {
        match self {
            ProcessorError::MissingBody { envelope } => Some(*envelope),
            _ => None,
        }
    }

    /// Message id the error refers to, when there is one.
    pub fn message_id(&self) -> Option<u16> {
        match self {
            ProcessorError::Configuration { id, .. }
            | ProcessorError::MalformedBody { id, .. }
            | ProcessorError::Serialization { id, .. }
            | ProcessorError::PayloadMismatch { id, .. }
            | ProcessorError::Enqueue { id, .. }
            | ProcessorError::Handler { id, .. } => Some(*id),
            ProcessorError::UnknownMessage(id) | ProcessorError::Unroutable(id) => Some(*id),
            ProcessorError::MissingBody { envelope } => Some(envelope.id),
            ProcessorError::ShortFrame { .. } => None,
        }
    }
}

/// Result type alias using ProcessorError.
pub type Result<T> = std::result::Result<T, ProcessorError>;
