//! Protocol module - wire header and encoded frames.
//!
//! This module implements the framing used on already-delimited buffers:
//! - 2-byte (minimal) or 4-byte (correlated) header encoding/decoding
//! - Configurable byte order for the numeric header fields
//! - Two-chunk encoded frames for vectored writes

mod frame;
mod wire_format;

pub use frame::EncodedFrame;
pub use wire_format::{
    ByteOrder, Header, HeaderBytes, HeaderShape, CORRELATED_HEADER_SIZE, MAX_HEADER_SIZE,
    MINIMAL_HEADER_SIZE, RESERVED_MESSAGE_ID,
};
