//! JSON codec using `serde_json`.
//!
//! Useful for debugging tools and for peers that cannot speak MessagePack.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{BodyCodec, CodecError};

/// JSON codec for structured data.
pub struct JsonCodec;

impl BodyCodec for JsonCodec {
    const NAME: &'static str = "json";

    #[inline]
    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }

    #[inline]
    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
