//! Processor configuration.
//!
//! Byte order and header shape are fixed before the processor goes live.
//! They can be set in code or loaded from a JSON document:
//!
//! ```
//! use leafwire::config::ProcessorConfig;
//! use leafwire::protocol::{ByteOrder, HeaderShape};
//!
//! let config = ProcessorConfig::from_json(r#"{"byte_order": "little"}"#).unwrap();
//! assert_eq!(config.byte_order, ByteOrder::Little);
//! assert_eq!(config.header_shape, HeaderShape::Minimal);
//! ```

use serde::{Deserialize, Serialize};

use crate::protocol::{ByteOrder, HeaderShape};

/// Wire configuration of a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Byte order of the header fields (default big endian).
    pub byte_order: ByteOrder,
    /// Header layout (default minimal).
    pub header_shape: HeaderShape,
}

impl ProcessorConfig {
    /// Minimal header, big endian.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Correlated header, big endian.
    pub fn correlated() -> Self {
        Self {
            header_shape: HeaderShape::Correlated,
            ..Self::default()
        }
    }

    /// Parse a JSON configuration document. Missing fields take defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Header size for the configured shape.
    #[inline]
    pub fn header_size(&self) -> usize {
        self.header_shape.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProcessorConfig::default();
        assert_eq!(config.byte_order, ByteOrder::Big);
        assert_eq!(config.header_shape, HeaderShape::Minimal);
        assert_eq!(config.header_size(), 2);
        assert_eq!(ProcessorConfig::correlated().header_size(), 4);
    }

    #[test]
    fn test_from_json() {
        let config =
            ProcessorConfig::from_json(r#"{"byte_order":"little","header_shape":"correlated"}"#)
                .unwrap();
        assert_eq!(config.byte_order, ByteOrder::Little);
        assert_eq!(config.header_shape, HeaderShape::Correlated);

        assert_eq!(
            ProcessorConfig::from_json("{}").unwrap(),
            ProcessorConfig::minimal()
        );
    }

    #[test]
    fn test_from_json_rejects_unknown_shape() {
        assert!(ProcessorConfig::from_json(r#"{"header_shape":"huge"}"#).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let json = serde_json::to_string(&ProcessorConfig::correlated()).unwrap();
        assert_eq!(json, r#"{"byte_order":"big","header_shape":"correlated"}"#);
    }
}
