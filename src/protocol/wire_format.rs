//! Wire format encoding and decoding.
//!
//! Two header shapes are supported, fixed per processor:
//! ```text
//! Minimal                    Correlated
//! ┌──────────┬──────────┐    ┌──────────┬──────────┬──────────┐
//! │ Msg ID   │ Body     │    │ Msg ID   │ Corr ID  │ Body     │
//! │ 2 bytes  │ N bytes  │    │ 2 bytes  │ 2 bytes  │ N bytes  │
//! └──────────┴──────────┘    └──────────┴──────────┴──────────┘
//! ```
//!
//! Multi-byte integers use the processor's [`ByteOrder`] (Big Endian by default).

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// Header size of the minimal shape.
pub const MINIMAL_HEADER_SIZE: usize = 2;

/// Header size of the correlated shape.
pub const CORRELATED_HEADER_SIZE: usize = 4;

/// Largest header of any shape.
pub const MAX_HEADER_SIZE: usize = CORRELATED_HEADER_SIZE;

/// Reserved message id (never registrable).
pub const RESERVED_MESSAGE_ID: u16 = 0xFFFF;

/// Byte order of the numeric header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Network byte order.
    #[default]
    Big,
    /// Little Endian.
    Little,
}

impl ByteOrder {
    /// Map the classic `little_endian` switch to a byte order.
    #[inline]
    pub fn from_little_endian(little_endian: bool) -> Self {
        if little_endian {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        }
    }

    #[inline]
    fn write_u16(self, value: u16) -> [u8; 2] {
        match self {
            ByteOrder::Big => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        }
    }

    #[inline]
    fn read_u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            ByteOrder::Big => u16::from_be_bytes(bytes),
            ByteOrder::Little => u16::from_le_bytes(bytes),
        }
    }
}

/// Header layout variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderShape {
    /// `[id][body]` - fire-and-forget.
    #[default]
    Minimal,
    /// `[id][correlation id][body]` - request/response.
    Correlated,
}

impl HeaderShape {
    /// Header size in bytes for this shape.
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            HeaderShape::Minimal => MINIMAL_HEADER_SIZE,
            HeaderShape::Correlated => CORRELATED_HEADER_SIZE,
        }
    }

    /// Whether frames of this shape carry a correlation id.
    #[inline]
    pub const fn is_correlated(self) -> bool {
        matches!(self, HeaderShape::Correlated)
    }
}

/// Decoded header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Message identifier.
    pub id: u16,
    /// Correlation identifier (correlated shape only).
    pub correlation_id: Option<u16>,
}

impl Header {
    /// Create a header for the minimal shape.
    pub fn new(id: u16) -> Self {
        Self {
            id,
            correlation_id: None,
        }
    }

    /// Create a header for the correlated shape.
    pub fn correlated(id: u16, correlation_id: u16) -> Self {
        Self {
            id,
            correlation_id: Some(correlation_id),
        }
    }

    /// Encode the header for the given shape and byte order.
    ///
    /// A missing correlation id is written as 0 in the correlated shape; a
    /// present one is not written in the minimal shape.
    ///
    /// # Example
    ///
    /// ```
    /// use leafwire::protocol::{ByteOrder, Header, HeaderShape};
    ///
    /// let bytes = Header::correlated(0x0102, 7).encode(HeaderShape::Correlated, ByteOrder::Big);
    /// assert_eq!(&bytes[..], &[0x01, 0x02, 0x00, 0x07]);
    /// ```
    pub fn encode(&self, shape: HeaderShape, order: ByteOrder) -> HeaderBytes {
        let mut bytes = HeaderBytes {
            buf: [0u8; MAX_HEADER_SIZE],
            len: shape.size() as u8,
        };
        self.encode_into(&mut bytes.buf, shape, order);
        bytes
    }

    /// Encode the header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if buffer is smaller than `shape.size()`.
    pub fn encode_into(&self, buf: &mut [u8], shape: HeaderShape, order: ByteOrder) {
        debug_assert!(buf.len() >= shape.size());
        buf[0..2].copy_from_slice(&order.write_u16(self.id));
        if shape.is_correlated() {
            let correlation_id = self.correlation_id.unwrap_or(0);
            buf[2..4].copy_from_slice(&order.write_u16(correlation_id));
        }
    }

    /// Decode a header from the front of `buf`.
    ///
    /// Returns `None` if buffer is too short for the shape.
    ///
    /// # Example
    ///
    /// ```
    /// use leafwire::protocol::{ByteOrder, Header, HeaderShape};
    ///
    /// let header = Header::decode(&[0x2A, 0x00], HeaderShape::Minimal, ByteOrder::Little).unwrap();
    /// assert_eq!(header.id, 42);
    /// assert_eq!(header.correlation_id, None);
    /// ```
    pub fn decode(buf: &[u8], shape: HeaderShape, order: ByteOrder) -> Option<Self> {
        if buf.len() < shape.size() {
            return None;
        }
        let id = order.read_u16([buf[0], buf[1]]);
        let correlation_id = if shape.is_correlated() {
            Some(order.read_u16([buf[2], buf[3]]))
        } else {
            None
        };
        Some(Self { id, correlation_id })
    }
}

/// Stack-allocated encoded header (2 or 4 bytes).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct HeaderBytes {
    buf: [u8; MAX_HEADER_SIZE],
    len: u8,
}

impl Deref for HeaderBytes {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }
}

impl AsRef<[u8]> for HeaderBytes {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl fmt::Debug for HeaderBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HeaderBytes").field(&&self[..]).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_sizes() {
        assert_eq!(HeaderShape::Minimal.size(), 2);
        assert_eq!(HeaderShape::Correlated.size(), 4);
        assert_eq!(HeaderShape::default(), HeaderShape::Minimal);
        assert_eq!(ByteOrder::default(), ByteOrder::Big);
    }

    #[test]
    fn test_minimal_big_endian_layout() {
        let bytes = Header::new(0x0102).encode(HeaderShape::Minimal, ByteOrder::Big);
        assert_eq!(&bytes[..], &[0x01, 0x02]);
    }

    #[test]
    fn test_correlated_little_endian_layout() {
        let bytes =
            Header::correlated(0x0102, 0x0304).encode(HeaderShape::Correlated, ByteOrder::Little);
        assert_eq!(&bytes[..], &[0x02, 0x01, 0x04, 0x03]);
    }

    #[test]
    fn test_missing_correlation_written_as_zero() {
        let bytes = Header::new(9).encode(HeaderShape::Correlated, ByteOrder::Big);
        assert_eq!(&bytes[..], &[0x00, 0x09, 0x00, 0x00]);
    }

    #[test]
    fn test_correlation_dropped_in_minimal_shape() {
        let bytes = Header::correlated(9, 5).encode(HeaderShape::Minimal, ByteOrder::Big);
        assert_eq!(bytes.len(), 2);
    }

    #[test]
    fn test_decode_too_short() {
        assert!(Header::decode(&[0x01], HeaderShape::Minimal, ByteOrder::Big).is_none());
        assert!(Header::decode(&[0, 1, 0], HeaderShape::Correlated, ByteOrder::Big).is_none());
        assert!(Header::decode(&[], HeaderShape::Minimal, ByteOrder::Little).is_none());
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let header =
            Header::decode(&[0, 5, 0, 42, 0xAA, 0xBB], HeaderShape::Correlated, ByteOrder::Big)
                .unwrap();
        assert_eq!(header, Header::correlated(5, 42));
    }

    #[test]
    fn test_mismatched_byte_order_swaps_id() {
        let bytes = Header::new(0x0102).encode(HeaderShape::Minimal, ByteOrder::Big);
        let header = Header::decode(&bytes, HeaderShape::Minimal, ByteOrder::Little).unwrap();
        assert_eq!(header.id, 0x0201);
    }

    #[test]
    fn test_byte_order_from_flag() {
        assert_eq!(ByteOrder::from_little_endian(true), ByteOrder::Little);
        assert_eq!(ByteOrder::from_little_endian(false), ByteOrder::Big);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&ByteOrder::Little).unwrap(), "\"little\"");
        assert_eq!(
            serde_json::from_str::<HeaderShape>("\"correlated\"").unwrap(),
            HeaderShape::Correlated
        );
    }
}
