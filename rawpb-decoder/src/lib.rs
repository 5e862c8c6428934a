//! Raw Protobuf Decoder Library
//!
//! A schema-less, streaming decoder for the protocol buffer wire format.
//! Callers register a typed callback per field number and the decoder hands
//! each field's value to its callback as the buffer is scanned.
//!
//! # Architecture
//!
//! - [`Registry`] maps field numbers to [`Entry`] callbacks, checks that the
//!   wire type seen on the stream matches the registration, and routes
//!   unregistered fields to per-category fallbacks
//! - [`WireReader`] decodes tags, varints, fixed-width integers and
//!   length-delimited payloads
//! - [`Decoder`] walks a buffer with a `WireReader`, dispatching every field
//!   into a registry and descending into nested message registries
//!
//! The library does NOT:
//! - Validate against `.proto` schemas
//! - Guess the type of unregistered fields
//! - Encode messages
//!
//! # Example Usage
//!
//! ```
//! use rawpb_decoder::{Registry, Error};
//! use std::cell::RefCell;
//!
//! let name = RefCell::new(String::new());
//! let tags = RefCell::new(Vec::new());
//!
//! let mut tag: Registry<'_> = Registry::new();
//! tag.set_bytes(1, |v| {
//!     tags.borrow_mut().push(String::from_utf8_lossy(v).into_owned());
//!     Ok(())
//! });
//!
//! let mut person: Registry<'_> = Registry::new();
//! person.set_bytes(1, |v| {
//!     *name.borrow_mut() = std::str::from_utf8(v).map_err(Error::handler)?.to_string();
//!     Ok(())
//! });
//! person.set_message(2, &tag);
//!
//! // { 1: "Ann", 2: { 1: "x" } }
//! let buf = [0x0A, 0x03, b'A', b'n', b'n', 0x12, 0x03, 0x0A, 0x01, b'x'];
//! person.decode(&buf).unwrap();
//!
//! assert_eq!(*name.borrow(), "Ann");
//! assert_eq!(*tags.borrow(), vec!["x".to_string()]);
//! ```

// Public modules
pub mod config;
pub mod decoder;
pub mod entry;
pub mod reader;
pub mod registry;
pub mod types;

// Re-export main types for convenience
pub use config::DecoderConfig;
pub use decoder::Decoder;
pub use entry::{BytesHandler, Entry, ScalarHandler};
pub use reader::WireReader;
pub use registry::{Registry, UnknownHandlers, MAX_DENSE_FIELD};
pub use types::{
    Category, Error, FieldNumber, Result, WireType, WireTypeMismatch, MAX_FIELD_NUMBER,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
