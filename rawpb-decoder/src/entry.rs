//! Callback entries
//!
//! An [`Entry`] records what to do when a given field arrives. The variant is
//! the category and the payload is the handler, so a handler can never be
//! stored under the wrong category.

use crate::registry::Registry;
use crate::types::Category;
use std::fmt;

/// Handler for a scalar field value
pub type ScalarHandler<'a, T, E> = Box<dyn Fn(T) -> Result<(), E> + 'a>;

/// Handler for a raw length-delimited payload
pub type BytesHandler<'a, E> = Box<dyn Fn(&[u8]) -> Result<(), E> + 'a>;

/// Registered callback for one field number
///
/// A `None` payload inside a categorised variant is legal: the field is
/// claimed for that category but arriving values are ignored.
pub enum Entry<'a, E> {
    /// Nothing registered
    None,
    /// Varint field
    Varint(Option<ScalarHandler<'a, u64, E>>),
    /// 8-byte fixed field
    Fixed64(Option<ScalarHandler<'a, u64, E>>),
    /// 4-byte fixed field
    Fixed32(Option<ScalarHandler<'a, u32, E>>),
    /// Raw length-delimited field
    Bytes(Option<BytesHandler<'a, E>>),
    /// Nested message decoded by a borrowed registry
    Message(Option<&'a Registry<'a, E>>),
}

impl<'a, E> Entry<'a, E> {
    /// Create a varint entry
    pub fn varint(f: impl Fn(u64) -> Result<(), E> + 'a) -> Self {
        Entry::Varint(Some(Box::new(f)))
    }

    /// Create a fixed64 entry
    pub fn fixed64(f: impl Fn(u64) -> Result<(), E> + 'a) -> Self {
        Entry::Fixed64(Some(Box::new(f)))
    }

    /// Create a fixed32 entry
    pub fn fixed32(f: impl Fn(u32) -> Result<(), E> + 'a) -> Self {
        Entry::Fixed32(Some(Box::new(f)))
    }

    /// Create a raw bytes entry
    pub fn bytes(f: impl Fn(&[u8]) -> Result<(), E> + 'a) -> Self {
        Entry::Bytes(Some(Box::new(f)))
    }

    /// Create a nested message entry
    pub fn message(registry: &'a Registry<'a, E>) -> Self {
        Entry::Message(Some(registry))
    }

    /// Category of this entry
    pub fn category(&self) -> Category {
        match self {
            Entry::None => Category::None,
            Entry::Varint(_) => Category::Varint,
            Entry::Fixed64(_) => Category::Fixed64,
            Entry::Fixed32(_) => Category::Fixed32,
            Entry::Bytes(_) => Category::Bytes,
            Entry::Message(_) => Category::Message,
        }
    }

    /// True if this is the zero entry
    pub fn is_none(&self) -> bool {
        matches!(self, Entry::None)
    }

    /// True if a handler (or nested registry) is attached
    pub fn has_handler(&self) -> bool {
        match self {
            Entry::None => false,
            Entry::Varint(h) | Entry::Fixed64(h) => h.is_some(),
            Entry::Fixed32(h) => h.is_some(),
            Entry::Bytes(h) => h.is_some(),
            Entry::Message(r) => r.is_some(),
        }
    }
}

impl<E> Default for Entry<'_, E> {
    fn default() -> Self {
        Entry::None
    }
}

impl<E> fmt::Debug for Entry<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("category", &self.category())
            .field("has_handler", &self.has_handler())
            .finish()
    }
}
