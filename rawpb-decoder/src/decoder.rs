//! Decode loop
//!
//! Walks a message buffer field by field and hands every value to a
//! [`Registry`]. Length-delimited fields registered as messages are decoded
//! recursively with the nested registry, up to the configured depth.

use crate::config::DecoderConfig;
use crate::reader::WireReader;
use crate::registry::Registry;
use crate::types::{Error, WireType, WireTypeMismatch};

/// Drives a registry over encoded messages
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Create a decoder with the given configuration
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode one complete message from `buf`
    ///
    /// Stops at the first error, which is either a wire-level [`Error`]
    /// converted into `E` or whatever a handler returned.
    ///
    /// # Example
    /// ```
    /// use rawpb_decoder::{Decoder, DecoderConfig, Registry};
    /// use std::cell::Cell;
    ///
    /// let id = Cell::new(0);
    /// let mut registry: Registry<'_> = Registry::new();
    /// registry.set_varint(1, |v| {
    ///     id.set(v);
    ///     Ok(())
    /// });
    ///
    /// let decoder = Decoder::new(DecoderConfig::new());
    /// decoder.decode(&registry, &[0x08, 0x96, 0x01]).unwrap();
    /// assert_eq!(id.get(), 150);
    /// ```
    pub fn decode<E>(&self, registry: &Registry<'_, E>, buf: &[u8]) -> Result<(), E>
    where
        E: From<Error> + From<WireTypeMismatch>,
    {
        self.decode_at_depth(registry, buf, 0)
    }

    fn decode_at_depth<E>(
        &self,
        registry: &Registry<'_, E>,
        buf: &[u8],
        depth: usize,
    ) -> Result<(), E>
    where
        E: From<Error> + From<WireTypeMismatch>,
    {
        let mut reader = WireReader::new(buf);

        while !reader.is_empty() {
            let offset = reader.position();
            let (field_number, wire_type) = reader.read_tag()?;
            log::trace!(
                "depth {} offset {}: field {} ({})",
                depth,
                offset,
                field_number,
                wire_type
            );

            match wire_type {
                WireType::Varint => registry.varint(field_number, reader.read_varint()?)?,
                WireType::Fixed64 => registry.fixed64(field_number, reader.read_fixed64()?)?,
                WireType::Fixed32 => registry.fixed32(field_number, reader.read_fixed32()?)?,
                WireType::LengthDelimited => {
                    let payload = reader.read_length_delimited()?;
                    if let Some(nested) = registry.length_delimited(field_number, payload)? {
                        if depth >= self.config.max_depth {
                            return Err(Error::NestingTooDeep {
                                limit: self.config.max_depth,
                            }
                            .into());
                        }
                        log::debug!(
                            "Entering nested message: field {} ({} bytes, depth {})",
                            field_number,
                            payload.len(),
                            depth + 1
                        );
                        self.decode_at_depth(nested, payload, depth + 1)?;
                        log::debug!("Leaving nested message: field {}", field_number);
                    }
                }
                WireType::StartGroup | WireType::EndGroup => {
                    return Err(Error::UnsupportedWireType {
                        field_number,
                        wire_type: wire_type.tag_bits(),
                    }
                    .into());
                }
            }
        }

        Ok(())
    }
}
