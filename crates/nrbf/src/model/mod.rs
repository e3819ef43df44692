//! Record model for NRBF messages.
//!
//! Decoding produces these inert values; nothing here instantiates
//! user types.

pub mod array;
pub mod builder;
pub mod class;
pub mod id;
pub mod map;
pub mod message;
pub mod primitive;
pub mod record;
pub mod types;

pub use array::{ArrayItems, ArrayKind, ArrayRecord, BinaryArrayShape};
pub use builder::{ClassBuilder, MessageBuilder};
pub use class::{ClassInfo, ClassRecord, ClassShape};
pub use id::Id;
pub use map::RecordMap;
pub use message::Message;
pub use primitive::{DateTime, DateTimeKind, Decimal, PrimitiveValue, TimeSpan};
pub use record::{LibraryRecord, MemberValue, Record, SerializationHeader, StringRecord};
pub use types::{BinaryArrayType, BinaryType, ClassTypeInfo, MemberType, PrimitiveType, RecordType};
