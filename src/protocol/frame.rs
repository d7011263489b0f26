//! Encoded outbound frame.
//!
//! An encoded message is kept as two chunks, header and body, so a transport
//! can hand both to a vectored write without first concatenating them.
//!
//! # Example
//!
//! ```
//! use leafwire::protocol::{ByteOrder, EncodedFrame, Header, HeaderShape};
//! use bytes::Bytes;
//!
//! let header = Header::new(3).encode(HeaderShape::Minimal, ByteOrder::Big);
//! let frame = EncodedFrame::new(header, Bytes::from_static(b"body"));
//!
//! assert_eq!(frame.header(), &[0x00, 0x03]);
//! assert_eq!(frame.len(), 6);
//! ```

use std::io::IoSlice;

use bytes::Bytes;

use super::wire_format::HeaderBytes;

/// A message ready to be written to a transport.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Encoded header (2 or 4 bytes).
    pub header: HeaderBytes,
    /// Serialized body (empty for marker messages).
    pub body: Bytes,
}

impl EncodedFrame {
    /// Create a frame from an encoded header and body.
    #[inline]
    pub fn new(header: HeaderBytes, body: Bytes) -> Self {
        Self { header, body }
    }

    /// Create a frame with no body.
    #[inline]
    pub fn empty(header: HeaderBytes) -> Self {
        Self {
            header,
            body: Bytes::new(),
        }
    }

    /// Header chunk.
    #[inline]
    pub fn header(&self) -> &[u8] {
        &self.header
    }

    /// Body chunk.
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether the frame has no body.
    #[inline]
    pub fn is_bodyless(&self) -> bool {
        self.body.is_empty()
    }

    /// Total size of this frame (header + body).
    #[inline]
    pub fn len(&self) -> usize {
        self.header.len() + self.body.len()
    }

    /// Always false: a frame carries at least a header.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Both chunks as slices, in wire order.
    #[inline]
    pub fn chunks(&self) -> [&[u8]; 2] {
        [self.header(), self.body()]
    }

    /// Both chunks as `IoSlice`s for `write_vectored`.
    ///
    /// The body slice is omitted when empty.
    pub fn io_slices(&self) -> Vec<IoSlice<'_>> {
        let mut slices = Vec::with_capacity(2);
        slices.push(IoSlice::new(&self.header));
        if !self.body.is_empty() {
            slices.push(IoSlice::new(&self.body));
        }
        slices
    }

    /// Concatenate both chunks into one contiguous buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.len());
        buf.extend_from_slice(&self.header);
        buf.extend_from_slice(&self.body);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ByteOrder, Header, HeaderShape};

    fn header(id: u16) -> HeaderBytes {
        Header::correlated(id, 1).encode(HeaderShape::Correlated, ByteOrder::Big)
    }

    #[test]
    fn test_frame_chunks() {
        let frame = EncodedFrame::new(header(2), Bytes::from_static(b"abc"));

        assert_eq!(frame.header(), &[0, 2, 0, 1]);
        assert_eq!(frame.body(), b"abc");
        assert_eq!(frame.chunks(), [&[0u8, 2, 0, 1][..], &b"abc"[..]]);
        assert_eq!(frame.len(), 7);
        assert!(!frame.is_bodyless());
    }

    #[test]
    fn test_empty_frame_has_single_slice() {
        let frame = EncodedFrame::empty(header(1));

        assert!(frame.is_bodyless());
        assert_eq!(frame.io_slices().len(), 1);
        assert_eq!(frame.to_vec(), vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_to_vec_concatenates() {
        let frame = EncodedFrame::new(header(0x0A0B), Bytes::from_static(&[9, 9]));
        assert_eq!(frame.to_vec(), vec![0x0A, 0x0B, 0, 1, 9, 9]);
        assert_eq!(frame.io_slices().len(), 2);
    }
}
