//! Field dumping
//!
//! Builds registries whose unknown-field fallbacks record every field they
//! see, so a message can be inspected without any schema.

use rawpb_decoder::{Decoder, DecoderConfig, FieldNumber, Registry, WireType};
use serde::Serialize;
use std::cell::RefCell;

/// One decoded field, as printed by the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRecord {
    /// Dotted field path, e.g. `2.1` for field 1 inside message field 2
    pub path: String,
    pub wire_type: WireType,
    pub value: FieldValue,
    /// Payload as text, when it is valid UTF-8
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(u64),
    /// Hex-encoded payload
    Bytes(String),
}

impl FieldRecord {
    fn integer(prefix: &str, field_number: FieldNumber, wire_type: WireType, value: u64) -> Self {
        Self {
            path: format!("{}{}", prefix, field_number),
            wire_type,
            value: FieldValue::Integer(value),
            text: None,
        }
    }

    fn bytes(prefix: &str, field_number: FieldNumber, payload: &[u8]) -> Self {
        Self {
            path: format!("{}{}", prefix, field_number),
            wire_type: WireType::LengthDelimited,
            value: FieldValue::Bytes(hex::encode(payload)),
            text: std::str::from_utf8(payload).ok().map(str::to_string),
        }
    }
}

/// Registry that records every field into `records`
fn recording_registry<'a>(records: &'a RefCell<Vec<FieldRecord>>, prefix: &str) -> Registry<'a> {
    let mut registry = Registry::new();

    let p = prefix.to_string();
    registry.on_unknown_varint(move |n, v| {
        records
            .borrow_mut()
            .push(FieldRecord::integer(&p, n, WireType::Varint, v));
        Ok(())
    });
    let p = prefix.to_string();
    registry.on_unknown_fixed64(move |n, v| {
        records
            .borrow_mut()
            .push(FieldRecord::integer(&p, n, WireType::Fixed64, v));
        Ok(())
    });
    let p = prefix.to_string();
    registry.on_unknown_fixed32(move |n, v| {
        records
            .borrow_mut()
            .push(FieldRecord::integer(&p, n, WireType::Fixed32, u64::from(v)));
        Ok(())
    });
    let p = prefix.to_string();
    registry.on_unknown_bytes(move |n, v| {
        records.borrow_mut().push(FieldRecord::bytes(&p, n, v));
        Ok(())
    });

    registry
}

/// Decode `buf` and return every field in stream order
///
/// Top-level fields listed in `messages` are decoded as nested messages and
/// their fields reported under `N.`; all other length-delimited fields are
/// reported as raw bytes. Field numbers in `messages` must be valid.
pub fn dump_message(
    buf: &[u8],
    messages: &[FieldNumber],
    config: &DecoderConfig,
) -> rawpb_decoder::Result<Vec<FieldRecord>> {
    let records = RefCell::new(Vec::new());

    let nested: Vec<(FieldNumber, Registry<'_>)> = messages
        .iter()
        .map(|&n| (n, recording_registry(&records, &format!("{}.", n))))
        .collect();

    let mut root = recording_registry(&records, "");
    for (n, registry) in &nested {
        root.set_message(*n, registry);
    }
    log::debug!("Root registry: {} message fields", root.len());

    let result = Decoder::new(config.clone()).decode(&root, buf);
    drop(root);
    drop(nested);

    result?;
    Ok(records.into_inner())
}
