//! Core types for the raw protobuf decoder library
//!
//! This module defines the vocabulary shared by the registry, the wire reader
//! and the decode loop: field numbers, wire types, callback categories and the
//! errors raised while dispatching or decoding.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Field number as carried in a field tag.
///
/// Signed so that lookups stay total over the whole integer domain; only
/// numbers `>= 1` can be registered.
pub type FieldNumber = i32;

/// Largest field number the wire format allows (2^29 - 1)
pub const MAX_FIELD_NUMBER: FieldNumber = (1 << 29) - 1;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wire type as encoded in the low three bits of a field tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WireType {
    /// Variable-length integer (tag 0)
    Varint,
    /// 8-byte little-endian integer (tag 1)
    Fixed64,
    /// Length-prefixed payload (tag 2)
    LengthDelimited,
    /// Deprecated group start (tag 3)
    StartGroup,
    /// Deprecated group end (tag 4)
    EndGroup,
    /// 4-byte little-endian integer (tag 5)
    Fixed32,
}

impl WireType {
    /// Decode the wire type from the low bits of a tag
    ///
    /// Returns `None` for the unassigned tags 6 and 7.
    pub fn from_tag_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            3 => Some(WireType::StartGroup),
            4 => Some(WireType::EndGroup),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }

    /// Numeric tag value of this wire type
    pub fn tag_bits(self) -> u8 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::StartGroup => 3,
            WireType::EndGroup => 4,
            WireType::Fixed32 => 5,
        }
    }

    /// Label used in diagnostics and dump output
    pub fn name(self) -> &'static str {
        match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "fixed64",
            WireType::LengthDelimited => "length-delimited",
            WireType::StartGroup => "start-group",
            WireType::EndGroup => "end-group",
            WireType::Fixed32 => "fixed32",
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Callback category stored in a registry entry
///
/// `Bytes` and `Message` share the length-delimited encoding and differ only
/// in what the application does with the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// No callback registered
    None,
    /// Variable-length integer
    Varint,
    /// 8-byte fixed integer
    Fixed64,
    /// 4-byte fixed integer
    Fixed32,
    /// Raw length-delimited payload
    Bytes,
    /// Length-delimited payload decoded by a nested registry
    Message,
}

impl Category {
    /// Wire-type label of this category as seen on the stream
    pub fn wire_type_name(self) -> &'static str {
        match self {
            Category::None => "none",
            Category::Varint => "varint",
            Category::Fixed64 => "fixed64",
            Category::Fixed32 => "fixed32",
            Category::Bytes | Category::Message => "length-delimited",
        }
    }

    /// Wire type that carries values of this category
    pub fn wire_type(self) -> Option<WireType> {
        match self {
            Category::None => None,
            Category::Varint => Some(WireType::Varint),
            Category::Fixed64 => Some(WireType::Fixed64),
            Category::Fixed32 => Some(WireType::Fixed32),
            Category::Bytes | Category::Message => Some(WireType::LengthDelimited),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.wire_type_name())
    }
}

/// A field arrived with a wire type its registration does not accept
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("field {field_number}: {received} received, but {expected} expected")]
pub struct WireTypeMismatch {
    /// Field number of the offending field
    pub field_number: FieldNumber,
    /// Category the dispatch entry point handles
    pub received: Category,
    /// Category the field was registered with
    pub expected: Category,
}

/// Errors that can occur during dispatch and decoding
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    WireTypeMismatch(#[from] WireTypeMismatch),

    #[error("Truncated input: {needed} bytes needed, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("Varint exceeds 10 bytes")]
    VarintOverflow,

    #[error("Invalid field number on the wire: {0}")]
    InvalidFieldNumber(u64),

    #[error("field {field_number}: unsupported wire type {wire_type}")]
    UnsupportedWireType { field_number: FieldNumber, wire_type: u8 },

    #[error("Message nesting exceeds limit of {limit}")]
    NestingTooDeep { limit: usize },

    #[error("Handler failed: {0}")]
    Handler(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap a caller failure so a handler can return it as an [`Error`]
    pub fn handler(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Handler(err.into())
    }
}
