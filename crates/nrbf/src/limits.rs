//! Wire constants and default resource limits.
//!
//! The decoder treats its input as untrusted. Counts read from the wire are
//! checked against the remaining input before they size any allocation; the
//! limits below cover what remaining-byte checks cannot.

/// Header major version written by every known producer.
pub const MAJOR_VERSION: i32 = 1;

/// Header minor version written by every known producer.
pub const MINOR_VERSION: i32 = 0;

/// Header identifier written by the reference producer.
pub const DEFAULT_HEADER_ID: i32 = -1;

/// Maximum bytes in a 7-bit encoded length prefix (covers 31 bits).
pub const MAX_LENGTH_PREFIX_BYTES: usize = 5;

/// Maximum array rank accepted for BinaryArray records.
pub const MAX_ARRAY_RANK: usize = 32;

/// Default bound on nesting of inline records while decoding.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default bound on the length of object and string arrays.
///
/// Null runs let a few bytes declare millions of empty slots, so these arrays
/// cannot be bounded by remaining input alone.
pub const DEFAULT_MAX_OBJECT_ARRAY_LEN: usize = 1 << 24;

/// Default bound on object and string array slots across a whole message.
pub const DEFAULT_MAX_TOTAL_ITEMS: usize = 1 << 24;

/// Default recursion bound during graph reconstruction.
///
/// Identifiers reached deeper than this are queued and materialized later
/// from a flat work loop instead of failing.
pub const DEFAULT_MAX_GRAPH_DEPTH: usize = 64;

/// Largest valid tick count (23:59:59.9999999, December 31, 9999).
pub const MAX_DATETIME_TICKS: u64 = 3_155_378_975_999_999_999;

/// Mask selecting the tick bits of a packed date/time value.
pub const DATETIME_TICKS_MASK: u64 = 0x3FFF_FFFF_FFFF_FFFF;

/// Shift of the two kind bits of a packed date/time value.
pub const DATETIME_KIND_SHIFT: u32 = 62;

/// Maximum decimal scale.
pub const MAX_DECIMAL_SCALE: u32 = 28;
