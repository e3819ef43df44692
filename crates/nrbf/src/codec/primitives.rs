//! Primitive encoding/decoding for the NRBF binary format.
//!
//! Fixed-width scalars are little-endian on the wire. Strings carry a 7-bit
//! encoded length prefix, chars are UTF-8, decimals travel as invariant
//! numerals and date/times as their raw packed 64-bit word.

use crate::error::{DecodeError, EncodeError};
use crate::limits::MAX_LENGTH_PREFIX_BYTES;
use crate::model::{DateTime, Decimal, Id, PrimitiveType, PrimitiveValue, TimeSpan};

// =============================================================================
// DECODING
// =============================================================================

/// Reader for decoding binary data.
///
/// Wraps a byte slice and provides methods for reading primitives
/// with bounds checking and error handling.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of remaining bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        if self.pos >= self.data.len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining_len() {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    #[inline]
    fn read_array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, context)?);
        Ok(out)
    }

    pub fn read_i8(&mut self, context: &'static str) -> Result<i8, DecodeError> {
        Ok(self.read_byte(context)? as i8)
    }

    pub fn read_i16(&mut self, context: &'static str) -> Result<i16, DecodeError> {
        Ok(i16::from_le_bytes(self.read_array(context)?))
    }

    pub fn read_u16(&mut self, context: &'static str) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.read_array(context)?))
    }

    pub fn read_i32(&mut self, context: &'static str) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.read_array(context)?))
    }

    pub fn read_u32(&mut self, context: &'static str) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.read_array(context)?))
    }

    pub fn read_i64(&mut self, context: &'static str) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.read_array(context)?))
    }

    pub fn read_u64(&mut self, context: &'static str) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.read_array(context)?))
    }

    pub fn read_f32(&mut self, context: &'static str) -> Result<f32, DecodeError> {
        Ok(f32::from_le_bytes(self.read_array(context)?))
    }

    pub fn read_f64(&mut self, context: &'static str) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.read_array(context)?))
    }

    /// Reads a bool, rejecting anything but 0x00 and 0x01.
    pub fn read_bool(&mut self, context: &'static str) -> Result<bool, DecodeError> {
        match self.read_byte(context)? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(DecodeError::InvalidBool { value }),
        }
    }

    /// Reads a record identifier.
    #[inline]
    pub fn read_id(&mut self, context: &'static str) -> Result<Id, DecodeError> {
        Ok(Id::new(self.read_i32(context)?))
    }

    /// Reads a non-negative 32-bit count.
    pub fn read_count(&mut self, field: &'static str) -> Result<usize, DecodeError> {
        let value = self.read_i32(field)?;
        usize::try_from(value).map_err(|_| DecodeError::NegativeCount { field, value })
    }

    /// Reads a 7-bit encoded length prefix of at most 31 bits.
    pub fn read_length_prefix(&mut self, field: &'static str) -> Result<usize, DecodeError> {
        let mut result: u32 = 0;
        for i in 0..MAX_LENGTH_PREFIX_BYTES {
            let byte = self.read_byte(field)?;
            if i == MAX_LENGTH_PREFIX_BYTES - 1 {
                // Fifth byte supplies bits 28..31 only.
                if byte > 0x07 {
                    return Err(DecodeError::MalformedLengthPrefix);
                }
                return Ok((result | (byte as u32) << 28) as usize);
            }
            result |= ((byte & 0x7F) as u32) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(result as usize);
            }
        }
        Err(DecodeError::MalformedLengthPrefix)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self, field: &'static str) -> Result<String, DecodeError> {
        let len = self.read_length_prefix(field)?;
        let bytes = self.read_bytes(len, field)?;
        std::str::from_utf8(bytes)
            .map(|s| s.to_string())
            .map_err(|_| DecodeError::InvalidUtf8 { field })
    }

    /// Reads one UTF-8 encoded char.
    pub fn read_char(&mut self, context: &'static str) -> Result<char, DecodeError> {
        let first = self.read_byte(context)?;
        let width = match first {
            0x00..=0x7F => return Ok(first as char),
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return Err(DecodeError::InvalidChar),
        };
        let mut buf = [0u8; 4];
        buf[0] = first;
        buf[1..width].copy_from_slice(self.read_bytes(width - 1, context)?);
        std::str::from_utf8(&buf[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .ok_or(DecodeError::InvalidChar)
    }

    /// Reads a decimal written as its invariant numeral.
    pub fn read_decimal(&mut self, context: &'static str) -> Result<Decimal, DecodeError> {
        let text = self.read_string(context)?;
        Decimal::parse(&text).map_err(|_| DecodeError::InvalidDecimal { text })
    }

    /// Reads a packed date/time, keeping the kind bits verbatim.
    pub fn read_datetime(&mut self, context: &'static str) -> Result<DateTime, DecodeError> {
        let raw = self.read_i64(context)?;
        DateTime::from_raw(raw).map_err(|_| DecodeError::InvalidDateTime { raw })
    }

    /// Reads a primitive type byte.
    pub fn read_primitive_type(&mut self, context: &'static str) -> Result<PrimitiveType, DecodeError> {
        let value = self.read_byte(context)?;
        PrimitiveType::from_u8(value).ok_or(DecodeError::InvalidPrimitiveType { value })
    }

    /// Reads one raw value of the given kind.
    pub fn read_primitive(
        &mut self,
        kind: PrimitiveType,
        context: &'static str,
    ) -> Result<PrimitiveValue, DecodeError> {
        Ok(match kind {
            PrimitiveType::Boolean => PrimitiveValue::Boolean(self.read_bool(context)?),
            PrimitiveType::Byte => PrimitiveValue::Byte(self.read_byte(context)?),
            PrimitiveType::Char => PrimitiveValue::Char(self.read_char(context)?),
            PrimitiveType::Decimal => PrimitiveValue::Decimal(self.read_decimal(context)?),
            PrimitiveType::Double => PrimitiveValue::Double(self.read_f64(context)?),
            PrimitiveType::Int16 => PrimitiveValue::Int16(self.read_i16(context)?),
            PrimitiveType::Int32 => PrimitiveValue::Int32(self.read_i32(context)?),
            PrimitiveType::Int64 => PrimitiveValue::Int64(self.read_i64(context)?),
            PrimitiveType::SByte => PrimitiveValue::SByte(self.read_i8(context)?),
            PrimitiveType::Single => PrimitiveValue::Single(self.read_f32(context)?),
            PrimitiveType::TimeSpan => PrimitiveValue::TimeSpan(TimeSpan(self.read_i64(context)?)),
            PrimitiveType::DateTime => PrimitiveValue::DateTime(self.read_datetime(context)?),
            PrimitiveType::UInt16 => PrimitiveValue::UInt16(self.read_u16(context)?),
            PrimitiveType::UInt32 => PrimitiveValue::UInt32(self.read_u32(context)?),
            PrimitiveType::UInt64 => PrimitiveValue::UInt64(self.read_u64(context)?),
            PrimitiveType::Null | PrimitiveType::String => {
                return Err(DecodeError::InvalidPrimitiveKind { kind, context });
            }
        })
    }

    /// Reads `count` raw values of one kind.
    ///
    /// The remaining input must hold at least `count` times the kind's
    /// minimum wire size before anything is allocated.
    pub fn read_primitive_array(
        &mut self,
        kind: PrimitiveType,
        count: usize,
        field: &'static str,
    ) -> Result<Vec<PrimitiveValue>, DecodeError> {
        let size = kind
            .min_wire_size()
            .ok_or(DecodeError::InvalidPrimitiveKind { kind, context: field })?;
        let max = self.remaining_len() / size;
        if count > max {
            return Err(DecodeError::LengthExceedsLimit {
                field,
                len: count,
                max,
            });
        }
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.read_primitive(kind, field)?);
        }
        Ok(values)
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for encoding binary data.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Returns a reference to the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if no bytes have been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_byte(value as u8);
    }

    /// Writes a record identifier.
    #[inline]
    pub fn write_id(&mut self, id: Id) {
        self.write_i32(id.get());
    }

    /// Writes a count as a 32-bit signed integer.
    pub fn write_count(&mut self, count: usize, field: &'static str) -> Result<(), EncodeError> {
        let value = i32::try_from(count).map_err(|_| EncodeError::LengthExceedsLimit {
            field,
            len: count,
            max: i32::MAX as usize,
        })?;
        self.write_i32(value);
        Ok(())
    }

    /// Writes a 7-bit encoded length prefix.
    pub fn write_length_prefix(&mut self, len: usize, field: &'static str) -> Result<(), EncodeError> {
        if len > i32::MAX as usize {
            return Err(EncodeError::LengthExceedsLimit {
                field,
                len,
                max: i32::MAX as usize,
            });
        }
        let mut value = len as u32;
        while value >= 0x80 {
            self.write_byte((value as u8) | 0x80);
            value >>= 7;
        }
        self.write_byte(value as u8);
        Ok(())
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn write_string(&mut self, s: &str, field: &'static str) -> Result<(), EncodeError> {
        self.write_length_prefix(s.len(), field)?;
        self.write_bytes(s.as_bytes());
        Ok(())
    }

    /// Writes a char as UTF-8.
    pub fn write_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.write_bytes(c.encode_utf8(&mut buf).as_bytes());
    }

    /// Writes one raw primitive value.
    pub fn write_primitive(&mut self, value: &PrimitiveValue) -> Result<(), EncodeError> {
        match value {
            PrimitiveValue::Boolean(v) => self.write_bool(*v),
            PrimitiveValue::Byte(v) => self.write_byte(*v),
            PrimitiveValue::Char(v) => self.write_char(*v),
            PrimitiveValue::Decimal(v) => self.write_string(v.as_str(), "decimal")?,
            PrimitiveValue::Double(v) => self.write_f64(*v),
            PrimitiveValue::Int16(v) => self.write_i16(*v),
            PrimitiveValue::Int32(v) => self.write_i32(*v),
            PrimitiveValue::Int64(v) => self.write_i64(*v),
            PrimitiveValue::SByte(v) => self.write_byte(*v as u8),
            PrimitiveValue::Single(v) => self.write_f32(*v),
            PrimitiveValue::TimeSpan(v) => self.write_i64(v.ticks()),
            PrimitiveValue::DateTime(v) => self.write_i64(v.raw()),
            PrimitiveValue::UInt16(v) => self.write_u16(*v),
            PrimitiveValue::UInt32(v) => self.write_u32(*v),
            PrimitiveValue::UInt64(v) => self.write_u64(*v),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_prefix_examples() {
        let cases: [(usize, &[u8]); 4] = [
            (0, &[0x00]),
            (127, &[0x7F]),
            (128, &[0x80, 0x01]),
            (300, &[0xAC, 0x02]),
        ];
        for (len, bytes) in cases {
            let mut writer = Writer::new();
            writer.write_length_prefix(len, "test").unwrap();
            assert_eq!(writer.as_bytes(), bytes);

            let mut reader = Reader::new(bytes);
            assert_eq!(reader.read_length_prefix("test").unwrap(), len);
        }
    }

    #[test]
    fn test_length_prefix_max() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0x07];
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_length_prefix("test").unwrap(), i32::MAX as usize);
    }

    #[test]
    fn test_length_prefix_too_long() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0x08];
        let mut reader = Reader::new(&bytes);
        assert!(matches!(
            reader.read_length_prefix("test"),
            Err(DecodeError::MalformedLengthPrefix)
        ));
    }

    #[test]
    fn test_string_truncated() {
        let bytes = [0x05, b'a', b'b'];
        let mut reader = Reader::new(&bytes);
        assert!(matches!(
            reader.read_string("name"),
            Err(DecodeError::UnexpectedEof { context: "name" })
        ));
    }

    #[test]
    fn test_invalid_utf8() {
        let bytes = [0x02, 0xC3, 0x28];
        let mut reader = Reader::new(&bytes);
        assert!(matches!(
            reader.read_string("name"),
            Err(DecodeError::InvalidUtf8 { .. })
        ));
    }

    #[test]
    fn test_char_utf8() {
        let mut writer = Writer::new();
        writer.write_char('é');
        writer.write_char('A');
        writer.write_char('€');
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), 2 + 1 + 3);

        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_char("c").unwrap(), 'é');
        assert_eq!(reader.read_char("c").unwrap(), 'A');
        assert_eq!(reader.read_char("c").unwrap(), '€');
        assert!(reader.is_empty());
    }

    #[test]
    fn test_bool_strict() {
        let mut reader = Reader::new(&[0x02]);
        assert!(matches!(
            reader.read_bool("flag"),
            Err(DecodeError::InvalidBool { value: 2 })
        ));
    }

    #[test]
    fn test_little_endian() {
        let mut writer = Writer::new();
        writer.write_i32(1);
        assert_eq!(writer.as_bytes(), &[1, 0, 0, 0]);

        let mut reader = Reader::new(&[0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(reader.read_i32("v").unwrap(), -2);
    }

    #[test]
    fn test_decimal_text() {
        let mut writer = Writer::new();
        writer
            .write_primitive(&PrimitiveValue::Decimal(Decimal::parse("-3.25").unwrap()))
            .unwrap();
        assert_eq!(writer.as_bytes(), b"\x05-3.25");

        let mut reader = Reader::new(writer.as_bytes());
        let value = reader.read_primitive(PrimitiveType::Decimal, "d").unwrap();
        assert_eq!(value.to_string(), "-3.25");
    }

    #[test]
    fn test_decimal_rejects_garbage() {
        let mut reader = Reader::new(b"\x03abc");
        assert!(matches!(
            reader.read_decimal("d"),
            Err(DecodeError::InvalidDecimal { .. })
        ));
    }

    #[test]
    fn test_datetime_rejects_bad_ticks() {
        let raw = (crate::limits::MAX_DATETIME_TICKS + 1) as i64;
        let bytes = raw.to_le_bytes();
        let mut reader = Reader::new(&bytes);
        assert!(matches!(
            reader.read_datetime("dt"),
            Err(DecodeError::InvalidDateTime { .. })
        ));
    }

    #[test]
    fn test_primitive_array_checks_remaining_before_allocating() {
        // Claims a billion doubles with 16 bytes of input.
        let bytes = [0u8; 16];
        let mut reader = Reader::new(&bytes);
        let result = reader.read_primitive_array(PrimitiveType::Double, 1_000_000_000, "items");
        assert!(matches!(
            result,
            Err(DecodeError::LengthExceedsLimit { max: 2, .. })
        ));
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_primitive_array_decimal_minimum() {
        // Two decimals need at least four bytes.
        let mut reader = Reader::new(&[0x01, b'1', 0x01]);
        assert!(matches!(
            reader.read_primitive_array(PrimitiveType::Decimal, 2, "items"),
            Err(DecodeError::LengthExceedsLimit { .. })
        ));
    }

    #[test]
    fn test_string_kind_not_a_raw_value() {
        let mut reader = Reader::new(&[0x00]);
        assert!(matches!(
            reader.read_primitive(PrimitiveType::String, "value"),
            Err(DecodeError::InvalidPrimitiveKind { .. })
        ));
    }

    #[test]
    fn test_negative_count() {
        let mut reader = Reader::new(&[0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(matches!(
            reader.read_count("length"),
            Err(DecodeError::NegativeCount { value: -1, .. })
        ));
    }
}
