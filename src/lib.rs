//! # leafwire
//!
//! Message registry, wire codec and dispatcher for id-framed server
//! protocols.
//!
//! Every frame on the wire is a small header carrying a 16-bit message id
//! (and optionally a 16-bit correlation id), followed by a serialized body.
//! A [`Processor`] maps ids to message types, turns raw frames into typed
//! [`Envelope`]s and back, and delivers each envelope to exactly one target.
//!
//! ## Architecture
//!
//! - **Bootstrap** ([`ProcessorBuilder`]): configure byte order and header
//!   shape, register every message id with its handler or queue
//! - **Steady state** ([`Processor`]): immutable, shared across connection
//!   tasks; decode, encode and route only
//!
//! ## Wire format
//!
//! ```text
//! minimal:    ┌──────────┬──────────────┐
//!             │ id (u16) │ body         │
//!             └──────────┴──────────────┘
//! correlated: ┌──────────┬───────────────┬──────────────┐
//!             │ id (u16) │ corr id (u16) │ body         │
//!             └──────────┴───────────────┴──────────────┘
//! ```
//!
//! Header fields are big endian unless configured otherwise. Bodies are
//! MsgPack by default, JSON per message on request.
//!
//! ## Example
//!
//! ```
//! use leafwire::handler::Delivery;
//! use leafwire::{Envelope, ProcessorBuilder};
//!
//! #[derive(Debug, serde::Serialize, serde::Deserialize)]
//! struct Move {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let mut builder = ProcessorBuilder::<u64>::new();
//! builder
//!     .register(10, |m: Move, session: u64| {
//!         println!("session {} moves to {},{}", session, m.x, m.y);
//!         Ok(())
//!     })
//!     .unwrap();
//! builder.register_marker(11, Delivery::None).unwrap();
//! let processor = builder.build();
//!
//! let frame = processor.encode(&Envelope::new(10, Move { x: 1, y: 2 })).unwrap();
//! processor.process(&frame.to_vec(), 7).unwrap();
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod processor;
pub mod protocol;
pub mod registry;
pub mod schema;
pub mod tables;

pub use config::ProcessorConfig;
pub use error::{ProcessorError, Result};
pub use message::{Envelope, Message, Payload};
pub use processor::{Processor, ProcessorBuilder};
