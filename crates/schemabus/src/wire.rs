//! Confluent wire format
//!
//! ```text
//! +------+-------------------------+--------------------+
//! | 0x00 | schema id (i32, BE)     | avro binary datum  |
//! +------+-------------------------+--------------------+
//!   0      1..5                      5..
//! ```

use crate::avro::{AvroType, BinaryWrite};
use crate::error::{CodecError, CodecResult};
use crate::types::SchemaId;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Leading byte of every framed message
pub const MAGIC_BYTE: u8 = 0x00;

/// Magic byte plus schema id
pub const HEADER_LEN: usize = 5;

/// Default size of the first encode buffer
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// A decoded message body
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub value: JsonValue,
    pub schema_id: SchemaId,
}

/// Stateless encoder/decoder for the wire format
#[derive(Debug, Clone, Copy, Default)]
pub struct WireCodec;

impl WireCodec {
    /// Frame `value` encoded with `schema` under `schema_id`.
    ///
    /// Starts with `initial_buffer_size` bytes and grows until the datum fits;
    /// the result is trimmed to exactly the bytes written. The value is
    /// encoded once; growing only reallocates the frame.
    pub fn encode(
        value: &JsonValue,
        schema: &AvroType,
        schema_id: SchemaId,
        initial_buffer_size: usize,
    ) -> CodecResult<Vec<u8>> {
        let datum = schema.encode(value)?;
        Ok(Self::frame(&datum, schema_id, initial_buffer_size))
    }

    /// Frame an already encoded datum, growing from `initial_buffer_size`.
    pub fn frame(datum: &[u8], schema_id: SchemaId, initial_buffer_size: usize) -> Vec<u8> {
        let mut size = initial_buffer_size.max(HEADER_LEN);
        loop {
            let mut buf = vec![0u8; size];
            write_header(&mut buf, schema_id);
            match BinaryWrite::copy(datum, &mut buf[HEADER_LEN..]) {
                BinaryWrite::Written(n) => {
                    buf.truncate(HEADER_LEN + n);
                    return buf;
                }
                BinaryWrite::Insufficient(additional) => {
                    tracing::trace!(size, additional, "Growing wire-format encode buffer");
                    size += additional.max(1);
                }
            }
        }
    }

    /// Frame with [`DEFAULT_BUFFER_SIZE`]
    pub fn encode_default(
        value: &JsonValue,
        schema: &AvroType,
        schema_id: SchemaId,
    ) -> CodecResult<Vec<u8>> {
        Self::encode(value, schema, schema_id, DEFAULT_BUFFER_SIZE)
    }

    /// Read the schema id from a framed message without decoding the body.
    pub fn peek_schema_id(bytes: &[u8]) -> CodecResult<SchemaId> {
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::WireFormat(format!(
                "Message too short: {} bytes, header needs {}",
                bytes.len(),
                HEADER_LEN
            )));
        }
        if bytes[0] != MAGIC_BYTE {
            return Err(CodecError::WireFormat(format!(
                "Invalid magic byte: expected {:#04x}, got {:#04x}",
                MAGIC_BYTE, bytes[0]
            )));
        }
        Ok(SchemaId::new(i32::from_be_bytes([
            bytes[1], bytes[2], bytes[3], bytes[4],
        ])))
    }

    /// Decode a framed message.
    ///
    /// The writer schema comes from `lookup` by the embedded id, else from
    /// `fallback_writer`. With a `reader`, the body is resolved into the
    /// reader schema.
    pub fn decode<F>(
        bytes: &[u8],
        lookup: F,
        fallback_writer: Option<&AvroType>,
        reader: Option<&AvroType>,
    ) -> CodecResult<Decoded>
    where
        F: FnOnce(SchemaId) -> Option<Arc<AvroType>>,
    {
        let schema_id = Self::peek_schema_id(bytes)?;
        let body = &bytes[HEADER_LEN..];

        let value = match lookup(schema_id) {
            Some(writer) => writer.decode(body, reader)?,
            None => fallback_writer
                .ok_or(CodecError::UnknownSchemaId(schema_id))?
                .decode(body, reader)?,
        };

        Ok(Decoded { value, schema_id })
    }
}

fn write_header(buf: &mut [u8], schema_id: SchemaId) {
    buf[0] = MAGIC_BYTE;
    buf[1..HEADER_LEN].copy_from_slice(&schema_id.0.to_be_bytes());
}
