//! Binary encoding/decoding for NRBF.
//!
//! Decoding never resolves types: every member's type info is enough to
//! read its value, and the result is an inert [`Message`](crate::Message).

pub mod message;
pub mod primitives;
pub(crate) mod record;
pub mod types;

pub use message::{decode_message, encode_message, is_writable, DecodeOptions};
pub use primitives::{Reader, Writer};
