//! The closed set of referenceable records and the slot values that point at them.

use std::sync::Arc;

use crate::model::{ArrayRecord, ClassRecord, Id, PrimitiveValue, RecordType};

/// Payload of the SerializedStreamHeader record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializationHeader {
    /// Identifier of the root object.
    pub root_id: Id,
    /// Header identifier; producers write -1.
    pub header_id: i32,
    pub major_version: i32,
    pub minor_version: i32,
}

impl SerializationHeader {
    /// Creates a version 1.0 header for the given root.
    pub fn new(root_id: Id) -> Self {
        Self {
            root_id,
            header_id: crate::limits::DEFAULT_HEADER_ID,
            major_version: crate::limits::MAJOR_VERSION,
            minor_version: crate::limits::MINOR_VERSION,
        }
    }
}

/// A BinaryObjectString record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringRecord {
    pub object_id: Id,
    pub value: String,
}

/// A BinaryLibrary record naming the assembly that defines later classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRecord {
    pub library_id: Id,
    pub name: String,
}

/// A record that carries an identifier and can be referenced.
///
/// Headers, terminators, null markers, member references and boxed primitives
/// only exist on the wire; after decoding they are folded into
/// [`MemberValue`]s or into the [`Message`](crate::model::Message) itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Class(ClassRecord),
    String(StringRecord),
    Array(ArrayRecord),
    Library(LibraryRecord),
}

impl Record {
    /// Returns the record's identifier.
    pub fn id(&self) -> Id {
        match self {
            Record::Class(c) => c.id(),
            Record::String(s) => s.object_id,
            Record::Array(a) => a.id(),
            Record::Library(l) => l.library_id,
        }
    }

    /// Returns the wire tag this record is written with.
    pub fn record_type(&self) -> RecordType {
        match self {
            Record::Class(c) => c.record_type(),
            Record::String(_) => RecordType::BinaryObjectString,
            Record::Array(a) => a.record_type(),
            Record::Library(_) => RecordType::BinaryLibrary,
        }
    }

    /// Short human name of the variant, used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Record::Class(_) => "class",
            Record::String(_) => "string",
            Record::Array(_) => "array",
            Record::Library(_) => "library",
        }
    }

    pub fn as_class(&self) -> Option<&ClassRecord> {
        match self {
            Record::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRecord> {
        match self {
            Record::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Record::String(s) => Some(&s.value),
            _ => None,
        }
    }

    /// Returns true for object records (classes, strings, arrays).
    pub fn is_object(&self) -> bool {
        !matches!(self, Record::Library(_))
    }
}

/// The value held by one member or array slot.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberValue {
    /// No value.
    Null,
    /// A raw primitive, or a boxed primitive in an object slot.
    Primitive(PrimitiveValue),
    /// A reference to a record defined elsewhere in the message.
    Reference(Id),
    /// A record written inline in this slot. It is also present in the
    /// record map under its own identifier.
    Record(Arc<Record>),
}

impl MemberValue {
    /// Returns true for [`MemberValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, MemberValue::Null)
    }

    /// Returns the inline primitive, if any.
    pub fn as_primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            MemberValue::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// Returns the identifier this slot points at, inline or by reference.
    pub fn target_id(&self) -> Option<Id> {
        match self {
            MemberValue::Reference(id) => Some(*id),
            MemberValue::Record(r) => Some(r.id()),
            _ => None,
        }
    }

    /// Short human name of the variant, used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            MemberValue::Null => "null",
            MemberValue::Primitive(_) => "primitive",
            MemberValue::Reference(_) => "reference",
            MemberValue::Record(r) => r.describe(),
        }
    }
}

impl From<PrimitiveValue> for MemberValue {
    fn from(value: PrimitiveValue) -> Self {
        MemberValue::Primitive(value)
    }
}

impl From<Record> for MemberValue {
    fn from(record: Record) -> Self {
        MemberValue::Record(Arc::new(record))
    }
}
