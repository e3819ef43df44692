//! Whole-stream decoding and encoding.
//!
//! A stream is one header record, any number of top-level records, and a
//! MessageEnd record. Bytes after MessageEnd are ignored.

use tracing::debug;

use crate::codec::record::{Decoded, RecordDecoder, RecordEncoder};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_OBJECT_ARRAY_LEN, DEFAULT_MAX_TOTAL_ITEMS};
use crate::model::{Message, RecordType};

/// Resource limits applied while decoding untrusted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum nesting of records written inline inside classes and arrays.
    pub max_depth: usize,

    /// Maximum number of records read, counting null markers and
    /// references. `None` leaves the count unbounded.
    pub max_records: Option<usize>,

    /// Maximum declared length of object and string arrays.
    ///
    /// Primitive arrays are bounded by the remaining input instead.
    pub max_object_array_len: usize,

    /// Maximum object and string array slots summed over the message,
    /// counting every slot a null run expands to.
    pub max_total_items: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_records: None,
            max_object_array_len: DEFAULT_MAX_OBJECT_ARRAY_LEN,
            max_total_items: DEFAULT_MAX_TOTAL_ITEMS,
        }
    }
}

impl DecodeOptions {
    /// Creates default decode options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = Some(max_records);
        self
    }

    pub fn with_max_object_array_len(mut self, max: usize) -> Self {
        self.max_object_array_len = max;
        self
    }

    pub fn with_max_total_items(mut self, max: usize) -> Self {
        self.max_total_items = max;
        self
    }
}

/// Decodes a message from binary data.
///
/// The first record must be the stream header and decoding stops at the
/// first MessageEnd. Running out of input before MessageEnd is an error.
pub fn decode_message(data: &[u8], options: &DecodeOptions) -> Result<Message, DecodeError> {
    let mut decoder = RecordDecoder::new(data, options);

    let header = match decoder.read_record()? {
        Decoded::Header(header) => header,
        other => {
            return Err(DecodeError::MissingHeader {
                found: other.record_type(),
            });
        }
    };
    debug!(root = header.root_id.get(), "decoded header");

    let mut records = Vec::new();
    loop {
        if decoder.is_at_end() {
            return Err(DecodeError::MissingMessageEnd);
        }
        match decoder.read_record()? {
            Decoded::End => break,
            Decoded::Record(record) => records.push(record),
            other => {
                return Err(DecodeError::UnexpectedRecord {
                    record: other.record_type(),
                    context: "message body",
                });
            }
        }
    }

    let records_read = decoder.records_read();
    let map = decoder.into_map();
    debug!(records_read, registered = map.len(), "decoded message");

    Ok(Message::new(header, records, map)?)
}

/// Encodes a message to binary data.
///
/// Untyped class records cannot be written and fail with
/// [`EncodeError::NotSupported`].
pub fn encode_message(message: &Message) -> Result<Vec<u8>, EncodeError> {
    let mut encoder = RecordEncoder::new(message.map());
    encoder.write_header(message.header());
    for record in message.records() {
        encoder.write_record(record)?;
    }
    encoder.write_end();

    let bytes = encoder.into_bytes();
    debug!(bytes = bytes.len(), records = message.records().len(), "encoded message");
    Ok(bytes)
}

/// Returns true if records of this type can be encoded.
pub fn is_writable(record_type: RecordType) -> bool {
    !matches!(
        record_type,
        RecordType::SystemClassWithMembers | RecordType::ClassWithMembers
    )
}
