//! Scalar values carried inline in member and item lists.

use std::fmt;

use crate::error::ValidationError;
use crate::limits::{
    DATETIME_KIND_SHIFT, DATETIME_TICKS_MASK, MAX_DATETIME_TICKS, MAX_DECIMAL_SCALE,
};
use crate::model::PrimitiveType;
use crate::util::datetime::{format_duration, format_ticks, parse_ticks};

/// Largest 96-bit decimal mantissa.
const MAX_DECIMAL_MANTISSA: u128 = (1u128 << 96) - 1;

/// A scalar value of one [`PrimitiveType`].
///
/// The `Null` and `String` kinds never appear as raw values and have no
/// variant here.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    Boolean(bool),
    Byte(u8),
    Char(char),
    Decimal(Decimal),
    Double(f64),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    SByte(i8),
    Single(f32),
    TimeSpan(TimeSpan),
    DateTime(DateTime),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
}

impl PrimitiveValue {
    /// Returns the scalar kind of this value.
    pub fn kind(&self) -> PrimitiveType {
        match self {
            PrimitiveValue::Boolean(_) => PrimitiveType::Boolean,
            PrimitiveValue::Byte(_) => PrimitiveType::Byte,
            PrimitiveValue::Char(_) => PrimitiveType::Char,
            PrimitiveValue::Decimal(_) => PrimitiveType::Decimal,
            PrimitiveValue::Double(_) => PrimitiveType::Double,
            PrimitiveValue::Int16(_) => PrimitiveType::Int16,
            PrimitiveValue::Int32(_) => PrimitiveType::Int32,
            PrimitiveValue::Int64(_) => PrimitiveType::Int64,
            PrimitiveValue::SByte(_) => PrimitiveType::SByte,
            PrimitiveValue::Single(_) => PrimitiveType::Single,
            PrimitiveValue::TimeSpan(_) => PrimitiveType::TimeSpan,
            PrimitiveValue::DateTime(_) => PrimitiveType::DateTime,
            PrimitiveValue::UInt16(_) => PrimitiveType::UInt16,
            PrimitiveValue::UInt32(_) => PrimitiveType::UInt32,
            PrimitiveValue::UInt64(_) => PrimitiveType::UInt64,
        }
    }

    /// Returns the value as i32 if it is an Int32.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            PrimitiveValue::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as i64 if it is an Int64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PrimitiveValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as u64 if it is a UInt64.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            PrimitiveValue::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as bool if it is a Boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PrimitiveValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::Boolean(v) => write!(f, "{}", v),
            PrimitiveValue::Byte(v) => write!(f, "{}", v),
            PrimitiveValue::Char(v) => write!(f, "{:?}", v),
            PrimitiveValue::Decimal(v) => write!(f, "{}", v),
            PrimitiveValue::Double(v) => write!(f, "{}", v),
            PrimitiveValue::Int16(v) => write!(f, "{}", v),
            PrimitiveValue::Int32(v) => write!(f, "{}", v),
            PrimitiveValue::Int64(v) => write!(f, "{}", v),
            PrimitiveValue::SByte(v) => write!(f, "{}", v),
            PrimitiveValue::Single(v) => write!(f, "{}", v),
            PrimitiveValue::TimeSpan(v) => write!(f, "{}", v),
            PrimitiveValue::DateTime(v) => write!(f, "{}", v),
            PrimitiveValue::UInt16(v) => write!(f, "{}", v),
            PrimitiveValue::UInt32(v) => write!(f, "{}", v),
            PrimitiveValue::UInt64(v) => write!(f, "{}", v),
        }
    }
}

// =============================================================================
// DECIMAL
// =============================================================================

/// A 96-bit scaled decimal kept in its invariant textual form.
///
/// The wire carries decimals as text, so the original numeral is retained
/// verbatim and re-encodes byte for byte. Accepted grammar is surrounding
/// whitespace, an optional sign, digits, and an optional fraction; the
/// mantissa must fit in 96 bits and the scale may not exceed 28.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    text: String,
    mantissa: u128,
    scale: u32,
    negative: bool,
}

impl Decimal {
    /// Parses an invariant decimal numeral such as `-12.50`.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidDecimal {
            text: text.to_string(),
        };

        let trimmed = text.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };
        if int_part.is_empty()
            || (unsigned.contains('.') && frac_part.is_empty())
            || !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let scale = frac_part.len() as u32;
        if scale > MAX_DECIMAL_SCALE {
            return Err(invalid());
        }

        let mut mantissa: u128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add((b - b'0') as u128))
                .filter(|m| *m <= MAX_DECIMAL_MANTISSA)
                .ok_or_else(invalid)?;
        }

        Ok(Self {
            text: text.to_string(),
            mantissa,
            scale,
            negative,
        })
    }

    /// Builds a decimal from its four 32-bit storage words.
    ///
    /// `flags` carries the scale in bits 16..24 and the sign in bit 31.
    pub fn from_parts(lo: i32, mid: i32, hi: i32, flags: i32) -> Result<Self, ValidationError> {
        let scale = ((flags >> 16) & 0xFF) as u32;
        let negative = flags < 0;
        let mantissa =
            ((hi as u32 as u128) << 64) | ((mid as u32 as u128) << 32) | (lo as u32 as u128);
        Self::from_mantissa(mantissa, scale, negative)
    }

    /// Builds a decimal from mantissa, scale and sign.
    pub fn from_mantissa(mantissa: u128, scale: u32, negative: bool) -> Result<Self, ValidationError> {
        if mantissa > MAX_DECIMAL_MANTISSA || scale > MAX_DECIMAL_SCALE {
            return Err(ValidationError::InvalidDecimal {
                text: format!("{}e-{}", mantissa, scale),
            });
        }

        let digits = mantissa.to_string();
        let scale_len = scale as usize;
        let padded = if digits.len() <= scale_len {
            format!("{}{}", "0".repeat(scale_len + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale_len);

        let mut text = String::new();
        if negative {
            text.push('-');
        }
        text.push_str(int_part);
        if !frac_part.is_empty() {
            text.push('.');
            text.push_str(frac_part);
        }

        Ok(Self {
            text,
            mantissa,
            scale,
            negative,
        })
    }

    /// Returns the textual numeral as it travels on the wire.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the unsigned 96-bit mantissa.
    pub fn mantissa(&self) -> u128 {
        self.mantissa
    }

    /// Returns the number of fractional digits.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Returns true if the sign bit is set.
    pub fn is_negative(&self) -> bool {
        self.negative
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// =============================================================================
// DATE/TIME
// =============================================================================

/// The kind tag stored in the two high bits of a packed date/time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTimeKind {
    Unspecified,
    Utc,
    Local,
    /// Local time inside the repeated hour of a daylight-saving transition.
    LocalAmbiguousDst,
}

/// A packed date/time: 62 bits of ticks since 0001-01-01 plus a 2-bit kind.
///
/// The raw 64-bit word is kept verbatim so the kind bits survive a round
/// trip exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTime {
    raw: i64,
}

impl DateTime {
    /// Wraps a raw packed word, rejecting tick counts past 9999-12-31.
    pub fn from_raw(raw: i64) -> Result<Self, ValidationError> {
        let ticks = raw as u64 & DATETIME_TICKS_MASK;
        if ticks > MAX_DATETIME_TICKS {
            return Err(ValidationError::InvalidDateTime { ticks });
        }
        Ok(Self { raw })
    }

    /// Packs ticks and kind.
    pub fn new(ticks: u64, kind: DateTimeKind) -> Result<Self, ValidationError> {
        if ticks > MAX_DATETIME_TICKS {
            return Err(ValidationError::InvalidDateTime { ticks });
        }
        let bits: u64 = match kind {
            DateTimeKind::Unspecified => 0,
            DateTimeKind::Utc => 1,
            DateTimeKind::Local => 2,
            DateTimeKind::LocalAmbiguousDst => 3,
        };
        Ok(Self {
            raw: (ticks | (bits << DATETIME_KIND_SHIFT)) as i64,
        })
    }

    /// Parses `yyyy-MM-ddTHH:mm:ss[.fffffff][Z]`; a trailing `Z` selects Utc.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let (ticks, utc) = parse_ticks(input).map_err(|_| ValidationError::InvalidDateTime {
            ticks: u64::MAX,
        })?;
        let kind = if utc {
            DateTimeKind::Utc
        } else {
            DateTimeKind::Unspecified
        };
        Self::new(ticks, kind)
    }

    /// Returns the raw packed word.
    pub fn raw(&self) -> i64 {
        self.raw
    }

    /// Returns the tick count.
    pub fn ticks(&self) -> u64 {
        self.raw as u64 & DATETIME_TICKS_MASK
    }

    /// Returns the kind tag.
    pub fn kind(&self) -> DateTimeKind {
        match (self.raw as u64) >> DATETIME_KIND_SHIFT {
            0 => DateTimeKind::Unspecified,
            1 => DateTimeKind::Utc,
            2 => DateTimeKind::Local,
            _ => DateTimeKind::LocalAmbiguousDst,
        }
    }
}

/// Formats in round-trip ISO-8601 form; Utc values get a `Z` suffix.
impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_ticks(self.ticks()))?;
        if self.kind() == DateTimeKind::Utc {
            f.write_str("Z")?;
        }
        Ok(())
    }
}

/// A signed duration in 100-nanosecond ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TimeSpan(pub i64);

impl TimeSpan {
    pub const TICKS_PER_SECOND: i64 = 10_000_000;

    /// Returns the tick count.
    pub fn ticks(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration(self.0))
    }
}
