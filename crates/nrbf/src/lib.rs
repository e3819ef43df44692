//! NRBF: safe decoding, encoding and graph reconstruction for the .NET
//! Remoting Binary Format.
//!
//! This crate reads the binary streams written by the legacy .NET
//! serializer into an inert record model, writes that model back
//! byte-for-byte, and optionally rebuilds the object graph the stream
//! describes through an injected type resolver.
//!
//! # Overview
//!
//! Processing happens in two independent stages:
//! - **Decode**: bytes become a [`Message`], a header plus records keyed by
//!   identifier. No type is ever resolved and no user code runs.
//! - **Reconstruct**: a [`Message`] becomes an [`ObjectGraph`]. Only the
//!   types a [`TypeResolver`] explicitly provides are instantiated.
//!
//! # Quick Start
//!
//! ```rust
//! use nrbf::{DecodeOptions, Message};
//! use nrbf::deserialize::{TypeDescriptor, TypeRegistry};
//!
//! // class "Pair" { Int32 X = 1; Int32 Y = 2; }
//! let bytes = [
//!     0x00, 1, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 1, 0, 0, 0, 0, 0, 0, 0,
//!     0x04, 1, 0, 0, 0, 4, b'P', b'a', b'i', b'r', 2, 0, 0, 0, 1, b'X', 1, b'Y',
//!     0x00, 0x00, 0x08, 0x08, 1, 0, 0, 0, 2, 0, 0, 0,
//!     0x0B,
//! ];
//!
//! let message = Message::decode(&bytes, &DecodeOptions::default()).unwrap();
//! let pair = message.root().as_class().unwrap();
//! assert_eq!(pair.name(), "Pair");
//! assert_eq!(message.encode().unwrap(), bytes);
//!
//! let types = TypeRegistry::new().with(TypeDescriptor::new("Pair").fields(["X", "Y"]));
//! let graph = message.reconstruct(&types).unwrap();
//! assert_eq!(graph.field(graph.root(), "X").and_then(|v| v.as_i32()), Some(1));
//! ```
//!
//! # Modules
//!
//! - [`model`]: Record model (classes, arrays, strings, libraries, values)
//! - [`codec`]: Binary encoding/decoding
//! - [`deserialize`]: Object graph reconstruction
//! - [`validate`]: Reference validation
//! - [`error`]: Error types
//! - [`limits`]: Wire constants and default resource limits
//!
//! # Security
//!
//! The decoder is designed to safely handle untrusted input:
//! - Counts and lengths are checked against the remaining input before
//!   anything is allocated
//! - Nesting depth, record count and object array length are bounded by
//!   [`DecodeOptions`]
//! - Reconstruction depth is bounded; deeper objects are materialized from
//!   a work queue instead of the call stack
//! - Only resolver-provided types are ever instantiated

pub mod codec;
pub mod deserialize;
pub mod error;
pub mod limits;
pub mod model;
pub mod util;
pub mod validate;

// Re-export commonly used types at crate root
pub use codec::{decode_message, encode_message, DecodeOptions};
pub use deserialize::{
    DeserializeOptions, Deserializer, NameMatching, ObjectGraph, TypeDescriptor, TypeRegistry,
    TypeResolver, Value,
};
pub use error::{
    DecodeError, DeserializeError, EncodeError, Error, ErrorKind, ReferenceError, ValidationError,
};
pub use model::{
    ArrayRecord, ClassRecord, Id, MemberType, MemberValue, Message, MessageBuilder, PrimitiveType,
    PrimitiveValue, Record, RecordMap, RecordType,
};
pub use validate::validate_message;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
