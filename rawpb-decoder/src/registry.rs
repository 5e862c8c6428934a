//! Field-dispatch registry
//!
//! Maps field numbers to [`Entry`] callbacks and routes decoded values to
//! them. Small field numbers live in a vector indexed by `field_number - 1`;
//! anything above [`MAX_DENSE_FIELD`] goes to a lazily allocated map, so a
//! single huge field number never costs memory proportional to its value.
//!
//! A registry is configured once through the `set*` methods and then only
//! read by the dispatch methods, which take `&self`.

use crate::decoder::Decoder;
use crate::entry::Entry;
use crate::types::{Category, Error, FieldNumber, WireTypeMismatch};
use std::collections::HashMap;
use std::fmt;

/// Largest field number kept in dense storage
pub const MAX_DENSE_FIELD: FieldNumber = 128;

/// Fallback for a scalar field with no registration
pub type UnknownScalarHandler<'a, T, E> = Box<dyn Fn(FieldNumber, T) -> Result<(), E> + 'a>;

/// Fallback for a length-delimited field with no registration
pub type UnknownBytesHandler<'a, E> = Box<dyn Fn(FieldNumber, &[u8]) -> Result<(), E> + 'a>;

/// Per-category fallbacks invoked for unregistered fields
///
/// `bytes` serves both raw and nested-message payloads, since an unregistered
/// length-delimited field cannot be told apart on the wire.
pub struct UnknownHandlers<'a, E> {
    pub varint: Option<UnknownScalarHandler<'a, u64, E>>,
    pub fixed64: Option<UnknownScalarHandler<'a, u64, E>>,
    pub fixed32: Option<UnknownScalarHandler<'a, u32, E>>,
    pub bytes: Option<UnknownBytesHandler<'a, E>>,
}

impl<E> Default for UnknownHandlers<'_, E> {
    fn default() -> Self {
        Self {
            varint: None,
            fixed64: None,
            fixed32: None,
            bytes: None,
        }
    }
}

/// Field number to callback registry
///
/// `E` is the error type handlers return. Dispatch hands a handler's error
/// back unchanged and converts wire-type mismatches into `E`.
pub struct Registry<'a, E = Error> {
    /// Entries for fields 1..=MAX_DENSE_FIELD
    dense: Vec<Entry<'a, E>>,
    /// Entries for fields above MAX_DENSE_FIELD
    sparse: Option<HashMap<FieldNumber, Entry<'a, E>>>,
    /// Fallbacks for unregistered fields
    pub unknown: UnknownHandlers<'a, E>,
    /// Zero entry handed out by `get` for unset fields
    vacant: Entry<'a, E>,
}

impl<'a, E> Registry<'a, E> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            sparse: None,
            unknown: UnknownHandlers::default(),
            vacant: Entry::None,
        }
    }

    /// Store `entry` under `field_number`, replacing any previous entry
    ///
    /// # Panics
    /// If `field_number < 1`. Field numbers passed here come from the
    /// registry's owner, never from decoded input.
    pub fn set(&mut self, field_number: FieldNumber, entry: Entry<'a, E>) {
        if field_number < 1 {
            panic!(
                "field number should be natural number, invalid value: {}",
                field_number
            );
        }

        if field_number > MAX_DENSE_FIELD {
            log::debug!(
                "Registering field {} as {:?} in sparse storage",
                field_number,
                entry.category()
            );
            self.sparse
                .get_or_insert_with(HashMap::new)
                .insert(field_number, entry);
            return;
        }

        let index = (field_number - 1) as usize;
        if self.dense.len() <= index {
            self.dense.resize_with(index + 1, Entry::default);
        }
        self.dense[index] = entry;
    }

    /// Register a varint handler
    pub fn set_varint(
        &mut self,
        field_number: FieldNumber,
        f: impl Fn(u64) -> Result<(), E> + 'a,
    ) {
        self.set(field_number, Entry::varint(f));
    }

    /// Register a fixed64 handler
    pub fn set_fixed64(
        &mut self,
        field_number: FieldNumber,
        f: impl Fn(u64) -> Result<(), E> + 'a,
    ) {
        self.set(field_number, Entry::fixed64(f));
    }

    /// Register a fixed32 handler
    pub fn set_fixed32(
        &mut self,
        field_number: FieldNumber,
        f: impl Fn(u32) -> Result<(), E> + 'a,
    ) {
        self.set(field_number, Entry::fixed32(f));
    }

    /// Register a raw bytes handler
    pub fn set_bytes(
        &mut self,
        field_number: FieldNumber,
        f: impl Fn(&[u8]) -> Result<(), E> + 'a,
    ) {
        self.set(field_number, Entry::bytes(f));
    }

    /// Register a nested message decoded by `registry`
    pub fn set_message(&mut self, field_number: FieldNumber, registry: &'a Registry<'a, E>) {
        self.set(field_number, Entry::message(registry));
    }

    /// Install the fallback for unregistered varint fields
    pub fn on_unknown_varint(&mut self, f: impl Fn(FieldNumber, u64) -> Result<(), E> + 'a) {
        self.unknown.varint = Some(Box::new(f));
    }

    /// Install the fallback for unregistered fixed64 fields
    pub fn on_unknown_fixed64(&mut self, f: impl Fn(FieldNumber, u64) -> Result<(), E> + 'a) {
        self.unknown.fixed64 = Some(Box::new(f));
    }

    /// Install the fallback for unregistered fixed32 fields
    pub fn on_unknown_fixed32(&mut self, f: impl Fn(FieldNumber, u32) -> Result<(), E> + 'a) {
        self.unknown.fixed32 = Some(Box::new(f));
    }

    /// Install the fallback for unregistered length-delimited fields
    pub fn on_unknown_bytes(&mut self, f: impl Fn(FieldNumber, &[u8]) -> Result<(), E> + 'a) {
        self.unknown.bytes = Some(Box::new(f));
    }

    /// Look up the entry for `field_number`
    ///
    /// Total over all integers: unset, non-positive and out-of-range numbers
    /// yield the zero entry.
    pub fn get(&self, field_number: FieldNumber) -> &Entry<'a, E> {
        self.lookup(field_number).unwrap_or(&self.vacant)
    }

    fn lookup(&self, field_number: FieldNumber) -> Option<&Entry<'a, E>> {
        if field_number <= 0 {
            return None;
        }
        if field_number > MAX_DENSE_FIELD {
            return self.sparse.as_ref()?.get(&field_number);
        }
        self.dense.get((field_number - 1) as usize)
    }

    /// Number of registered fields
    pub fn len(&self) -> usize {
        let dense = self.dense.iter().filter(|e| !e.is_none()).count();
        let sparse = self
            .sparse
            .as_ref()
            .map_or(0, |m| m.values().filter(|e| !e.is_none()).count());
        dense + sparse
    }

    /// True if no field is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a, E> Registry<'a, E>
where
    E: From<WireTypeMismatch>,
{
    /// Dispatch a varint value
    pub fn varint(&self, field_number: FieldNumber, value: u64) -> Result<(), E> {
        match self.get(field_number) {
            Entry::None => match &self.unknown.varint {
                Some(f) => f(field_number, value),
                None => Ok(()),
            },
            Entry::Varint(handler) => handler.as_ref().map_or(Ok(()), |f| f(value)),
            other => Err(mismatch(field_number, Category::Varint, other)),
        }
    }

    /// Dispatch a fixed64 value
    pub fn fixed64(&self, field_number: FieldNumber, value: u64) -> Result<(), E> {
        match self.get(field_number) {
            Entry::None => match &self.unknown.fixed64 {
                Some(f) => f(field_number, value),
                None => Ok(()),
            },
            Entry::Fixed64(handler) => handler.as_ref().map_or(Ok(()), |f| f(value)),
            other => Err(mismatch(field_number, Category::Fixed64, other)),
        }
    }

    /// Dispatch a fixed32 value
    pub fn fixed32(&self, field_number: FieldNumber, value: u32) -> Result<(), E> {
        match self.get(field_number) {
            Entry::None => match &self.unknown.fixed32 {
                Some(f) => f(field_number, value),
                None => Ok(()),
            },
            Entry::Fixed32(handler) => handler.as_ref().map_or(Ok(()), |f| f(value)),
            other => Err(mismatch(field_number, Category::Fixed32, other)),
        }
    }

    /// Dispatch a raw length-delimited payload to a `Bytes` entry
    ///
    /// On a `Message` entry the error text reads "length-delimited received,
    /// but length-delimited expected"; the mismatch's `received` and
    /// `expected` categories still tell the two apart.
    pub fn bytes(&self, field_number: FieldNumber, payload: &[u8]) -> Result<(), E> {
        match self.get(field_number) {
            Entry::None => match &self.unknown.bytes {
                Some(f) => f(field_number, payload),
                None => Ok(()),
            },
            Entry::Bytes(handler) => handler.as_ref().map_or(Ok(()), |f| f(payload)),
            other => Err(mismatch(field_number, Category::Bytes, other)),
        }
    }

    /// Dispatch a length-delimited payload to a `Message` entry
    ///
    /// On a `Bytes` entry the mismatch carries `received: Message` and
    /// `expected: Bytes` even though both display as length-delimited.
    ///
    /// Returns the nested registry the payload should be decoded with; the
    /// caller drives the recursion. Unregistered fields go to the bytes
    /// fallback and yield `None`.
    pub fn message(
        &self,
        field_number: FieldNumber,
        payload: &[u8],
    ) -> Result<Option<&'a Registry<'a, E>>, E> {
        match self.get(field_number) {
            Entry::None => {
                if let Some(f) = &self.unknown.bytes {
                    f(field_number, payload)?;
                }
                Ok(None)
            }
            Entry::Message(nested) => Ok(*nested),
            other => Err(mismatch(field_number, Category::Message, other)),
        }
    }

    /// Route a length-delimited payload by the field's registration
    ///
    /// `Message` entries go through [`Registry::message`], everything else
    /// through [`Registry::bytes`].
    pub fn length_delimited(
        &self,
        field_number: FieldNumber,
        payload: &[u8],
    ) -> Result<Option<&'a Registry<'a, E>>, E> {
        match self.get(field_number).category() {
            Category::Message => self.message(field_number, payload),
            _ => self.bytes(field_number, payload).map(|()| None),
        }
    }
}

impl<'a, E> Registry<'a, E>
where
    E: From<WireTypeMismatch> + From<Error>,
{
    /// Decode `buf` with the default decoder configuration
    pub fn decode(&self, buf: &[u8]) -> Result<(), E> {
        Decoder::default().decode(self, buf)
    }
}

impl<E> fmt::Debug for Registry<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("dense_len", &self.dense.len())
            .field("sparse_len", &self.sparse.as_ref().map_or(0, HashMap::len))
            .field("unknown_varint", &self.unknown.varint.is_some())
            .field("unknown_fixed64", &self.unknown.fixed64.is_some())
            .field("unknown_fixed32", &self.unknown.fixed32.is_some())
            .field("unknown_bytes", &self.unknown.bytes.is_some())
            .finish()
    }
}

impl<E> Default for Registry<'_, E> {
    fn default() -> Self {
        Self::new()
    }
}

fn mismatch<E, F>(field_number: FieldNumber, received: Category, registered: &Entry<'_, F>) -> E
where
    E: From<WireTypeMismatch>,
{
    WireTypeMismatch {
        field_number,
        received,
        expected: registered.category(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_set_get_every_category() {
        let nested: Registry<'_> = Registry::new();
        for field_number in [1, 64, 128, 129, 1000, crate::MAX_FIELD_NUMBER] {
            let entries: Vec<(Entry<'_, Error>, Category)> = vec![
                (Entry::varint(|_| Ok(())), Category::Varint),
                (Entry::fixed64(|_| Ok(())), Category::Fixed64),
                (Entry::fixed32(|_| Ok(())), Category::Fixed32),
                (Entry::bytes(|_| Ok(())), Category::Bytes),
                (Entry::message(&nested), Category::Message),
            ];
            for (entry, category) in entries {
                let mut registry = Registry::new();
                registry.set(field_number, entry);
                let stored = registry.get(field_number);
                assert_eq!(stored.category(), category, "field {}", field_number);
                assert!(stored.has_handler());
            }
        }
    }

    #[test]
    fn test_get_non_positive_is_none() {
        let mut registry: Registry<'_> = Registry::new();
        registry.set_varint(1, |_| Ok(()));

        for field_number in [0, -1, -128, i32::MIN] {
            assert!(registry.get(field_number).is_none());
        }
        assert!(registry.sparse.is_none());
        assert_eq!(registry.dense.len(), 1);
    }

    #[test]
    fn test_get_beyond_dense_length() {
        let mut registry: Registry<'_> = Registry::new();
        registry.set_varint(3, |_| Ok(()));

        assert!(registry.get(1).is_none());
        assert!(registry.get(4).is_none());
        assert!(registry.get(128).is_none());
        assert!(registry.get(129).is_none());
        assert!(registry.get(i32::MAX).is_none());
    }

    #[test]
    #[should_panic(expected = "field number should be natural number, invalid value: 0")]
    fn test_set_zero_panics() {
        let mut registry: Registry<'_> = Registry::new();
        registry.set_varint(0, |_| Ok(()));
    }

    #[test]
    #[should_panic(expected = "invalid value: -5")]
    fn test_set_negative_panics() {
        let mut registry: Registry<'_> = Registry::new();
        registry.set(-5, Entry::Bytes(None));
    }

    #[test]
    fn test_last_write_wins() {
        let mut registry: Registry<'_> = Registry::new();
        registry.set_varint(5, |_| Ok(()));
        registry.set_fixed32(5, |_| Ok(()));
        assert_eq!(registry.get(5).category(), Category::Fixed32);

        registry.set_bytes(300, |_| Ok(()));
        registry.set_fixed64(300, |_| Ok(()));
        assert_eq!(registry.get(300).category(), Category::Fixed64);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_dense_sparse_boundary() {
        let mut registry: Registry<'_> = Registry::new();
        registry.set_varint(128, |_| Ok(()));
        assert_eq!(registry.dense.len(), 128);
        assert!(registry.sparse.is_none());

        registry.set_fixed32(129, |_| Ok(()));
        assert_eq!(registry.dense.len(), 128);
        assert_eq!(registry.sparse.as_ref().map(HashMap::len), Some(1));

        assert_eq!(registry.get(128).category(), Category::Varint);
        assert_eq!(registry.get(129).category(), Category::Fixed32);
    }

    #[test]
    fn test_dense_growth_preserves_entries() {
        let mut registry: Registry<'_> = Registry::new();
        registry.set_varint(2, |_| Ok(()));
        registry.set_fixed64(10, |_| Ok(()));
        registry.set_fixed32(1, |_| Ok(()));

        assert_eq!(registry.dense.len(), 10);
        assert_eq!(registry.get(1).category(), Category::Fixed32);
        assert_eq!(registry.get(2).category(), Category::Varint);
        assert_eq!(registry.get(10).category(), Category::Fixed64);
        assert!(registry.get(5).is_none());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_matching_dispatch_invokes_once() {
        let seen = RefCell::new(Vec::new());
        let mut registry: Registry<'_> = Registry::new();
        registry.set_varint(1, |v| {
            seen.borrow_mut().push(v);
            Ok(())
        });

        registry.varint(1, 42).unwrap();
        assert_eq!(*seen.borrow(), vec![42]);
    }

    #[test]
    fn test_each_scalar_category_dispatches() {
        let fixed64 = Cell::new(0u64);
        let fixed32 = Cell::new(0u32);
        let bytes = RefCell::new(Vec::new());
        let mut registry: Registry<'_> = Registry::new();
        registry.set_fixed64(2, |v| {
            fixed64.set(v);
            Ok(())
        });
        registry.set_fixed32(3, |v| {
            fixed32.set(v);
            Ok(())
        });
        registry.set_bytes(4, |v| {
            bytes.borrow_mut().extend_from_slice(v);
            Ok(())
        });

        registry.fixed64(2, u64::MAX).unwrap();
        registry.fixed32(3, 7).unwrap();
        registry.bytes(4, b"abc").unwrap();

        assert_eq!(fixed64.get(), u64::MAX);
        assert_eq!(fixed32.get(), 7);
        assert_eq!(*bytes.borrow(), b"abc".to_vec());
    }

    #[test]
    fn test_handler_error_returned_unchanged() {
        #[derive(Debug, PartialEq)]
        enum AppError {
            OutOfRange(u64),
            Wire(WireTypeMismatch),
        }

        impl From<WireTypeMismatch> for AppError {
            fn from(err: WireTypeMismatch) -> Self {
                AppError::Wire(err)
            }
        }

        let mut registry: Registry<'_, AppError> = Registry::new();
        registry.set_varint(1, |v| {
            if v > 10 {
                Err(AppError::OutOfRange(v))
            } else {
                Ok(())
            }
        });

        assert_eq!(registry.varint(1, 5), Ok(()));
        assert_eq!(registry.varint(1, 11), Err(AppError::OutOfRange(11)));
        assert_eq!(
            registry.fixed64(1, 11),
            Err(AppError::Wire(WireTypeMismatch {
                field_number: 1,
                received: Category::Fixed64,
                expected: Category::Varint,
            }))
        );
    }

    #[test]
    fn test_mismatch_names_field_and_types() {
        let mut registry: Registry<'_> = Registry::new();
        registry.set_varint(3, |_| Ok(()));
        registry.set_bytes(200, |_| Ok(()));

        let err = registry.fixed32(3, 1).unwrap_err();
        assert_eq!(err.to_string(), "field 3: fixed32 received, but varint expected");

        let err = registry.fixed32(200, 7).unwrap_err();
        assert_eq!(
            err.to_string(),
            "field 200: fixed32 received, but length-delimited expected"
        );

        let err = registry.bytes(3, b"").unwrap_err();
        assert_eq!(
            err.to_string(),
            "field 3: length-delimited received, but varint expected"
        );
    }

    #[test]
    fn test_unknown_fallbacks_receive_field_number() {
        let calls = RefCell::new(Vec::new());
        let mut registry: Registry<'_> = Registry::new();
        registry.on_unknown_varint(|n, v| {
            calls.borrow_mut().push(format!("varint {} {}", n, v));
            Ok(())
        });
        registry.on_unknown_fixed64(|n, v| {
            calls.borrow_mut().push(format!("fixed64 {} {}", n, v));
            Ok(())
        });
        registry.on_unknown_fixed32(|n, v| {
            calls.borrow_mut().push(format!("fixed32 {} {}", n, v));
            Ok(())
        });
        registry.on_unknown_bytes(|n, v| {
            calls.borrow_mut().push(format!("bytes {} {:?}", n, v));
            Ok(())
        });

        registry.varint(1, 10).unwrap();
        registry.fixed64(2, 20).unwrap();
        registry.fixed32(500, 30).unwrap();
        registry.bytes(4, &[1, 2]).unwrap();
        assert_eq!(registry.message(5, &[3]).unwrap().map(|_| ()), None);

        assert_eq!(
            *calls.borrow(),
            vec![
                "varint 1 10",
                "fixed64 2 20",
                "fixed32 500 30",
                "bytes 4 [1, 2]",
                "bytes 5 [3]",
            ]
        );
    }

    #[test]
    fn test_unknown_without_fallback_is_noop() {
        let registry: Registry<'_> = Registry::new();
        assert!(registry.varint(1, 1).is_ok());
        assert!(registry.fixed64(2, 1).is_ok());
        assert!(registry.fixed32(3, 1).is_ok());
        assert!(registry.bytes(4, b"x").is_ok());
        assert!(registry.message(5, b"x").unwrap().is_none());
    }

    #[test]
    fn test_absent_handler_is_noop() {
        let mut registry: Registry<'_> = Registry::new();
        registry.set(1, Entry::Varint(None));
        registry.set(2, Entry::Fixed64(None));
        registry.set(3, Entry::Fixed32(None));
        registry.set(4, Entry::Bytes(None));
        registry.set(5, Entry::Message(None));

        assert!(registry.varint(1, 1).is_ok());
        assert!(registry.fixed64(2, 1).is_ok());
        assert!(registry.fixed32(3, 1).is_ok());
        assert!(registry.bytes(4, b"x").is_ok());
        assert!(registry.message(5, b"x").unwrap().is_none());
        assert!(registry.fixed32(1, 1).is_err());
    }

    #[test]
    fn test_length_delimited_routes_by_category() {
        let payloads = RefCell::new(Vec::new());
        let nested: Registry<'_> = Registry::new();
        let mut registry: Registry<'_> = Registry::new();
        registry.set_bytes(1, |v| {
            payloads.borrow_mut().push(v.to_vec());
            Ok(())
        });
        registry.set_message(2, &nested);
        registry.set_varint(3, |_| Ok(()));

        assert!(registry.length_delimited(1, b"raw").unwrap().is_none());
        let found = registry.length_delimited(2, b"").unwrap();
        assert!(found.is_some_and(|r| std::ptr::eq(r, &nested)));
        assert_eq!(*payloads.borrow(), vec![b"raw".to_vec()]);

        let err = registry.length_delimited(3, b"").unwrap_err();
        assert_eq!(
            err.to_string(),
            "field 3: length-delimited received, but varint expected"
        );
    }

    #[test]
    fn test_message_on_scalar_field_is_mismatch() {
        let mut registry: Registry<'_> = Registry::new();
        registry.set_fixed64(7, |_| Ok(()));

        match registry.message(7, b"") {
            Err(Error::WireTypeMismatch(err)) => {
                assert_eq!(err.received, Category::Message);
                assert_eq!(err.expected, Category::Fixed64);
            }
            other => panic!("expected mismatch, got {:?}", other.map(|r| r.is_some())),
        }
    }

    #[test]
    fn test_bytes_and_message_mismatch_keep_categories() {
        let nested: Registry<'_> = Registry::new();
        let mut registry: Registry<'_> = Registry::new();
        registry.set_message(129, &nested);
        registry.set_bytes(2, |_| Ok(()));

        match registry.bytes(129, b"") {
            Err(Error::WireTypeMismatch(err)) => {
                assert_eq!(err.received, Category::Bytes);
                assert_eq!(err.expected, Category::Message);
                assert_eq!(
                    err.to_string(),
                    "field 129: length-delimited received, but length-delimited expected"
                );
            }
            other => panic!("expected mismatch, got {:?}", other),
        }

        let err = registry.message(2, b"").unwrap_err();
        assert!(matches!(
            err,
            Error::WireTypeMismatch(WireTypeMismatch {
                received: Category::Message,
                expected: Category::Bytes,
                ..
            })
        ));
    }

    #[test]
    fn test_out_of_range_lookups_reach_fallback() {
        let hits = Cell::new(0);
        let mut registry: Registry<'_> = Registry::new();
        registry.set_fixed64(1, |_| Ok(()));
        registry.on_unknown_fixed64(|_, v| {
            assert_eq!(v, 9);
            hits.set(hits.get() + 1);
            Ok(())
        });

        registry.fixed64(i32::MAX, 9).unwrap();
        registry.fixed64(-3, 9).unwrap();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_debug_reports_storage() {
        let mut registry: Registry<'_> = Registry::new();
        registry.set_varint(3, |_| Ok(()));
        registry.set_varint(500, |_| Ok(()));
        registry.on_unknown_bytes(|_, _| Ok(()));

        assert_eq!(
            format!("{:?}", registry),
            "Registry { dense_len: 3, sparse_len: 1, unknown_varint: false, \
             unknown_fixed64: false, unknown_fixed32: false, unknown_bytes: true }"
        );
    }
}
