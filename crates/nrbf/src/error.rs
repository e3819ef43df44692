//! Error types for NRBF decoding, encoding, validation and reconstruction.

use thiserror::Error;

use crate::model::{Id, MemberType, PrimitiveType, RecordType};

/// Boxed error produced by caller-supplied capabilities (activators,
/// population hooks, surrogates).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure categories exposed at the public boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// E001: Truncated or malformed stream
    Format,
    /// E002: Model invariant violated
    Validation,
    /// E003: Dangling identifier or record of the wrong kind
    Reference,
    /// E004: Type name could not be resolved
    TypeResolution,
    /// E005: Resolved type cannot be populated
    ConstructionContract,
    /// E006: Surrogate broke its contract
    SurrogateContract,
    /// E007: Record shape cannot be written
    NotSupported,
}

impl ErrorKind {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Format => "E001",
            ErrorKind::Validation => "E002",
            ErrorKind::Reference => "E003",
            ErrorKind::TypeResolution => "E004",
            ErrorKind::ConstructionContract => "E005",
            ErrorKind::SurrogateContract => "E006",
            ErrorKind::NotSupported => "E007",
        }
    }
}

/// A record model invariant does not hold.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("[E002] array {id} declares {declared} items but holds {actual}")]
    ArrayLengthMismatch {
        id: Id,
        declared: usize,
        actual: usize,
    },

    #[error("[E002] array {id} items do not match its element type")]
    ArrayItemsMismatch { id: Id },

    #[error("[E002] null run of {count} exceeds the {remaining} remaining slots")]
    NullRunOverflow { count: usize, remaining: usize },

    #[error("[E002] member slot holds a run of {count} nulls")]
    MultipleNullsInMember { count: usize },

    #[error("[E002] class {class:?} has {actual} {field} but {expected} members")]
    MemberCountMismatch {
        class: String,
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("[E002] member {member:?} of class {class:?} does not match declared type {expected:?}")]
    MemberTypeMismatch {
        class: String,
        member: String,
        expected: MemberType,
    },

    #[error("[E002] primitive value of kind {found:?} in a {expected:?} slot")]
    PrimitiveKindMismatch {
        expected: PrimitiveType,
        found: PrimitiveType,
    },

    #[error("[E002] identifier {id} registered twice")]
    DuplicateId { id: Id },

    #[error("[E002] null identifier on a {record:?} record")]
    NullId { record: RecordType },

    #[error("[E002] record nesting exceeds maximum depth {max}")]
    DepthLimitExceeded { max: usize },

    #[error("[E002] message exceeds maximum of {max} records")]
    RecordLimitExceeded { max: usize },

    #[error("[E002] invalid decimal numeral {text:?}")]
    InvalidDecimal { text: String },

    #[error("[E002] date/time ticks {ticks} exceed the representable range")]
    InvalidDateTime { ticks: u64 },
}

/// An identifier does not lead where it should.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReferenceError {
    #[error("[E003] identifier {id} does not name any record")]
    UnknownId { id: Id },

    #[error("[E003] identifier {id} names a {found:?} record, expected {expected}")]
    UnexpectedRecord {
        id: Id,
        expected: &'static str,
        found: RecordType,
    },

    #[error("[E003] root identifier {id} does not name any record")]
    MissingRoot { id: Id },

    #[error("[E003] {count} fixups still pending after reconstruction (first target {first})")]
    UnresolvedFixups { count: usize, first: Id },
}

/// Error during binary decoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("[E001] unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("[E001] invalid record type: {tag}")]
    InvalidRecordType { tag: u8 },

    #[error("[E001] invalid binary type: {value}")]
    InvalidBinaryType { value: u8 },

    #[error("[E001] invalid primitive type: {value}")]
    InvalidPrimitiveType { value: u8 },

    #[error("[E001] invalid binary array type: {value}")]
    InvalidBinaryArrayType { value: u8 },

    #[error("[E001] primitive kind {kind:?} is not valid in {context}")]
    InvalidPrimitiveKind {
        kind: PrimitiveType,
        context: &'static str,
    },

    #[error("[E001] stream must start with a header record, found {found:?}")]
    MissingHeader { found: RecordType },

    #[error("[E001] stream ended without a MessageEnd record")]
    MissingMessageEnd,

    #[error("[E001] unsupported format version {major}.{minor}")]
    UnsupportedVersion { major: i32, minor: i32 },

    #[error("[E001] {record:?} record not allowed in {context}")]
    UnexpectedRecord {
        record: RecordType,
        context: &'static str,
    },

    #[error("[E001] invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("[E001] length prefix exceeds 5 bytes or 31 bits")]
    MalformedLengthPrefix,

    #[error("[E001] invalid bool value: {value} (expected 0x00 or 0x01)")]
    InvalidBool { value: u8 },

    #[error("[E001] invalid UTF-8 char")]
    InvalidChar,

    #[error("[E001] invalid date/time value {raw:#018x}")]
    InvalidDateTime { raw: i64 },

    #[error("[E001] invalid decimal numeral {text:?}")]
    InvalidDecimal { text: String },

    #[error("[E001] {field} count {value} is negative")]
    NegativeCount { field: &'static str, value: i32 },

    #[error("[E001] {field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("[E001] array rank {rank} out of range")]
    InvalidRank { rank: i32 },

    #[error("[E001] null identifier on a {record:?} record")]
    NullIdentifier { record: RecordType },

    #[error("[E001] null run with a count of zero")]
    EmptyNullRun,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

impl DecodeError {
    /// Returns the failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::Validation(_) => ErrorKind::Validation,
            DecodeError::Reference(_) => ErrorKind::Reference,
            _ => ErrorKind::Format,
        }
    }
}

/// Error during binary encoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("[E007] {record:?} records cannot be written")]
    NotSupported { record: RecordType },

    #[error("[E002] {found} value does not fit declared type {expected:?}")]
    SlotTypeMismatch {
        expected: MemberType,
        found: &'static str,
    },

    #[error("[E003] library {id} is not present in the record map")]
    UnknownLibrary { id: Id },

    #[error("[E001] {field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl EncodeError {
    /// Returns the failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EncodeError::NotSupported { .. } => ErrorKind::NotSupported,
            EncodeError::SlotTypeMismatch { .. } | EncodeError::Validation(_) => {
                ErrorKind::Validation
            }
            EncodeError::UnknownLibrary { .. } => ErrorKind::Reference,
            EncodeError::LengthExceedsLimit { .. } => ErrorKind::Format,
        }
    }
}

/// Error during graph reconstruction.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error("[E004] type {class:?} from library {library:?} could not be resolved")]
    TypeNotFound { library: String, class: String },

    #[error("[E005] type {type_name:?} has no population contract and no surrogate")]
    MissingPopulation { type_name: String },

    #[error("[E005] type {type_name:?} requires field {field:?} but the stream has no data for it")]
    MissingFieldData { type_name: String, field: String },

    #[error("[E005] activating {type_name:?} failed")]
    Activation {
        type_name: String,
        #[source]
        source: BoxError,
    },

    #[error("[E005] populating {type_name:?} failed")]
    Population {
        type_name: String,
        #[source]
        source: BoxError,
    },

    #[error("[E005] activator produced an array of {actual} slots, expected {expected}")]
    ArrayShapeMismatch { expected: usize, actual: usize },

    #[error("[E001] malformed {type_name:?} value: {reason}")]
    MalformedSystemValue {
        type_name: &'static str,
        reason: &'static str,
    },

    #[error("[E006] surrogate for {type_name:?} failed")]
    Surrogate {
        type_name: String,
        #[source]
        source: BoxError,
    },

    #[error("[E006] surrogate for reference type {type_name:?} returned a different instance")]
    SurrogateReplacedReference { type_name: String },
}

impl DeserializeError {
    /// Returns the failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeserializeError::Reference(_) => ErrorKind::Reference,
            DeserializeError::TypeNotFound { .. } => ErrorKind::TypeResolution,
            DeserializeError::MissingPopulation { .. }
            | DeserializeError::MissingFieldData { .. }
            | DeserializeError::Activation { .. }
            | DeserializeError::Population { .. }
            | DeserializeError::ArrayShapeMismatch { .. } => ErrorKind::ConstructionContract,
            DeserializeError::MalformedSystemValue { .. } => ErrorKind::Format,
            DeserializeError::Surrogate { .. }
            | DeserializeError::SurrogateReplacedReference { .. } => ErrorKind::SurrogateContract,
        }
    }
}

/// Any failure surfaced by the [`Message`](crate::Message) entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Deserialize(#[from] DeserializeError),

    #[error("[E001] reading the stream failed")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Decode(e) => e.kind(),
            Error::Encode(e) => e.kind(),
            Error::Validation(_) => ErrorKind::Validation,
            Error::Reference(_) => ErrorKind::Reference,
            Error::Deserialize(e) => e.kind(),
            Error::Io(_) => ErrorKind::Format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_in_messages() {
        let err = DecodeError::UnexpectedEof { context: "header" };
        assert!(err.to_string().starts_with("[E001]"));
        assert_eq!(err.kind().code(), "E001");

        let err: DecodeError = ValidationError::NullRunOverflow {
            count: 4,
            remaining: 2,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().starts_with("[E002]"));
    }

    #[test]
    fn test_top_level_kind() {
        let err: Error = DeserializeError::MissingPopulation {
            type_name: "Pair".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::ConstructionContract);
        assert!(err.to_string().contains("Pair"));

        let err: Error = EncodeError::NotSupported {
            record: RecordType::ClassWithMembers,
        }
        .into();
        assert_eq!(err.kind().code(), "E007");
    }

    #[test]
    fn test_source_preserved() {
        use std::error::Error as _;

        let err = DeserializeError::Population {
            type_name: "Pair".to_string(),
            source: "boom".into(),
        };
        assert_eq!(err.source().map(|s| s.to_string()), Some("boom".to_string()));
    }
}
