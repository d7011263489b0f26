//! MsgPack codec using `rmp-serde`.
//!
//! Structs are written with `to_vec_named` (struct-as-map) so that field
//! order changes between peer builds do not silently shift values.
//!
//! # Example
//!
//! ```
//! use leafwire::codec::{BodyCodec, MsgPackCodec};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Chat {
//!     room: u32,
//!     text: String,
//! }
//!
//! let msg = Chat { room: 3, text: "hi".to_string() };
//! let encoded = MsgPackCodec::encode(&msg).unwrap();
//! let decoded: Chat = MsgPackCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, msg);
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{BodyCodec, CodecError};

/// MessagePack codec for structured data (default body codec).
pub struct MsgPackCodec;

impl BodyCodec for MsgPackCodec {
    const NAME: &'static str = "msgpack";

    /// Encode a value to MsgPack bytes in struct-as-map format.
    #[inline]
    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    /// Decode MsgPack bytes to a value.
    #[inline]
    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}
