//! Codec module - pluggable serialization for message bodies.
//!
//! The wire header is handled by [`crate::protocol`]; everything after it is
//! produced and consumed by a [`BodyCodec`]:
//!
//! - [`MsgPackCodec`] - MessagePack using `rmp-serde` (struct-as-map, the default)
//! - [`JsonCodec`] - JSON using `serde_json`
//!
//! # Design
//!
//! Codecs are marker structs implementing a trait of static methods rather than
//! trait objects. The registry captures the codec as a type parameter when a
//! message is registered, so the choice is made at compile time per message.
//!
//! # Example
//!
//! ```
//! use leafwire::codec::{BodyCodec, JsonCodec, MsgPackCodec};
//!
//! let encoded = MsgPackCodec::encode(&"hello").unwrap();
//! let decoded: String = MsgPackCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, "hello");
//!
//! let encoded = JsonCodec::encode(&[1, 2, 3]).unwrap();
//! assert_eq!(encoded, b"[1,2,3]");
//! ```

mod json;
mod msgpack;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub use json::JsonCodec;
pub use msgpack::MsgPackCodec;

/// Failure reported by a body codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A serializer for message bodies.
pub trait BodyCodec: Send + Sync + 'static {
    /// Short name used in diagnostics.
    const NAME: &'static str;

    /// Serialize a value into body bytes.
    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError>;

    /// Deserialize body bytes into a fresh value.
    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError>;
}
