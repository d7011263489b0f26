//! Protocol map for diagnostics.
//!
//! Lists every registered id with its message type, as seen through
//! [`Processor::for_each`]. Serializes to JSON so it can be dumped to a
//! console or compared against a peer's map.
//!
//! # Example
//!
//! ```
//! use leafwire::handler::Delivery;
//! use leafwire::schema::ProtocolMap;
//! use leafwire::ProcessorBuilder;
//!
//! let mut builder = ProcessorBuilder::<()>::new();
//! builder.register_marker(1, Delivery::None).unwrap();
//! let processor = builder.build();
//!
//! let map = ProtocolMap::from_processor(&processor);
//! assert!(map.to_json().unwrap().contains("\"1\""));
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use crate::processor::Processor;
use crate::protocol::{ByteOrder, HeaderShape};

/// One registered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageEntry {
    /// Type name, `None` for marker messages.
    #[serde(rename = "type")]
    pub type_name: Option<&'static str>,
}

/// Snapshot of a processor's wire configuration and message ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolMap {
    /// Header byte order.
    pub byte_order: ByteOrder,
    /// Header shape.
    pub header_shape: HeaderShape,
    /// Messages ordered by id.
    pub messages: BTreeMap<u16, MessageEntry>,
}

impl ProtocolMap {
    /// Build the map of a processor.
    pub fn from_processor<C>(processor: &Processor<C>) -> Self {
        let mut messages = BTreeMap::new();
        processor.for_each(|id, message_type| {
            messages.insert(
                id,
                MessageEntry {
                    type_name: message_type.map(|t| t.name()),
                },
            );
        });

        Self {
            byte_order: processor.byte_order(),
            header_shape: processor.header_shape(),
            messages,
        }
    }

    /// Entry for `id`.
    pub fn get(&self, id: u16) -> Option<&MessageEntry> {
        self.messages.get(&id)
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether no message is registered.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Serialize to a single-line JSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
