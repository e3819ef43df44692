//! Wire enumerations and per-member type descriptors.

use crate::model::Id;

/// Record tags (MS-NRBF 2.1.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordType {
    SerializedStreamHeader = 0,
    ClassWithId = 1,
    SystemClassWithMembers = 2,
    ClassWithMembers = 3,
    SystemClassWithMembersAndTypes = 4,
    ClassWithMembersAndTypes = 5,
    BinaryObjectString = 6,
    BinaryArray = 7,
    MemberPrimitiveTyped = 8,
    MemberReference = 9,
    ObjectNull = 10,
    MessageEnd = 11,
    BinaryLibrary = 12,
    ObjectNullMultiple256 = 13,
    ObjectNullMultiple = 14,
    ArraySinglePrimitive = 15,
    ArraySingleObject = 16,
    ArraySingleString = 17,
}

impl RecordType {
    /// Creates a RecordType from its wire representation.
    pub fn from_u8(v: u8) -> Option<RecordType> {
        match v {
            0 => Some(RecordType::SerializedStreamHeader),
            1 => Some(RecordType::ClassWithId),
            2 => Some(RecordType::SystemClassWithMembers),
            3 => Some(RecordType::ClassWithMembers),
            4 => Some(RecordType::SystemClassWithMembersAndTypes),
            5 => Some(RecordType::ClassWithMembersAndTypes),
            6 => Some(RecordType::BinaryObjectString),
            7 => Some(RecordType::BinaryArray),
            8 => Some(RecordType::MemberPrimitiveTyped),
            9 => Some(RecordType::MemberReference),
            10 => Some(RecordType::ObjectNull),
            11 => Some(RecordType::MessageEnd),
            12 => Some(RecordType::BinaryLibrary),
            13 => Some(RecordType::ObjectNullMultiple256),
            14 => Some(RecordType::ObjectNullMultiple),
            15 => Some(RecordType::ArraySinglePrimitive),
            16 => Some(RecordType::ArraySingleObject),
            17 => Some(RecordType::ArraySingleString),
            _ => None,
        }
    }
}

/// Declared shape of a class member or array element (MS-NRBF 2.1.2.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BinaryType {
    Primitive = 0,
    String = 1,
    Object = 2,
    SystemClass = 3,
    Class = 4,
    ObjectArray = 5,
    StringArray = 6,
    PrimitiveArray = 7,
}

impl BinaryType {
    /// Creates a BinaryType from its wire representation.
    pub fn from_u8(v: u8) -> Option<BinaryType> {
        match v {
            0 => Some(BinaryType::Primitive),
            1 => Some(BinaryType::String),
            2 => Some(BinaryType::Object),
            3 => Some(BinaryType::SystemClass),
            4 => Some(BinaryType::Class),
            5 => Some(BinaryType::ObjectArray),
            6 => Some(BinaryType::StringArray),
            7 => Some(BinaryType::PrimitiveArray),
            _ => None,
        }
    }
}

/// Scalar kinds (MS-NRBF 2.1.2.3). Value 4 is unused on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PrimitiveType {
    Boolean = 1,
    Byte = 2,
    Char = 3,
    Decimal = 5,
    Double = 6,
    Int16 = 7,
    Int32 = 8,
    Int64 = 9,
    SByte = 10,
    Single = 11,
    TimeSpan = 12,
    DateTime = 13,
    UInt16 = 14,
    UInt32 = 15,
    UInt64 = 16,
    Null = 17,
    String = 18,
}

impl PrimitiveType {
    /// Creates a PrimitiveType from its wire representation.
    pub fn from_u8(v: u8) -> Option<PrimitiveType> {
        match v {
            1 => Some(PrimitiveType::Boolean),
            2 => Some(PrimitiveType::Byte),
            3 => Some(PrimitiveType::Char),
            5 => Some(PrimitiveType::Decimal),
            6 => Some(PrimitiveType::Double),
            7 => Some(PrimitiveType::Int16),
            8 => Some(PrimitiveType::Int32),
            9 => Some(PrimitiveType::Int64),
            10 => Some(PrimitiveType::SByte),
            11 => Some(PrimitiveType::Single),
            12 => Some(PrimitiveType::TimeSpan),
            13 => Some(PrimitiveType::DateTime),
            14 => Some(PrimitiveType::UInt16),
            15 => Some(PrimitiveType::UInt32),
            16 => Some(PrimitiveType::UInt64),
            17 => Some(PrimitiveType::Null),
            18 => Some(PrimitiveType::String),
            _ => None,
        }
    }

    /// Minimum bytes one value of this kind occupies on the wire.
    ///
    /// Char is UTF-8 (1 to 4 bytes) and Decimal is a length-prefixed numeral,
    /// so both report a conservative lower bound. Returns None for kinds that
    /// never appear as raw values.
    pub fn min_wire_size(self) -> Option<usize> {
        match self {
            PrimitiveType::Boolean | PrimitiveType::Byte | PrimitiveType::SByte => Some(1),
            PrimitiveType::Char => Some(1),
            PrimitiveType::Decimal => Some(2),
            PrimitiveType::Int16 | PrimitiveType::UInt16 => Some(2),
            PrimitiveType::Int32 | PrimitiveType::UInt32 | PrimitiveType::Single => Some(4),
            PrimitiveType::Int64
            | PrimitiveType::UInt64
            | PrimitiveType::Double
            | PrimitiveType::TimeSpan
            | PrimitiveType::DateTime => Some(8),
            PrimitiveType::Null | PrimitiveType::String => None,
        }
    }

    /// Returns the framework type name of this kind (e.g. "System.Int32").
    pub fn system_name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "System.Boolean",
            PrimitiveType::Byte => "System.Byte",
            PrimitiveType::Char => "System.Char",
            PrimitiveType::Decimal => "System.Decimal",
            PrimitiveType::Double => "System.Double",
            PrimitiveType::Int16 => "System.Int16",
            PrimitiveType::Int32 => "System.Int32",
            PrimitiveType::Int64 => "System.Int64",
            PrimitiveType::SByte => "System.SByte",
            PrimitiveType::Single => "System.Single",
            PrimitiveType::TimeSpan => "System.TimeSpan",
            PrimitiveType::DateTime => "System.DateTime",
            PrimitiveType::UInt16 => "System.UInt16",
            PrimitiveType::UInt32 => "System.UInt32",
            PrimitiveType::UInt64 => "System.UInt64",
            PrimitiveType::Null => "System.DBNull",
            PrimitiveType::String => "System.String",
        }
    }
}

/// Layout of a BinaryArray record (MS-NRBF 2.4.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BinaryArrayType {
    Single = 0,
    Jagged = 1,
    Rectangular = 2,
    SingleOffset = 3,
    JaggedOffset = 4,
    RectangularOffset = 5,
}

impl BinaryArrayType {
    /// Creates a BinaryArrayType from its wire representation.
    pub fn from_u8(v: u8) -> Option<BinaryArrayType> {
        match v {
            0 => Some(BinaryArrayType::Single),
            1 => Some(BinaryArrayType::Jagged),
            2 => Some(BinaryArrayType::Rectangular),
            3 => Some(BinaryArrayType::SingleOffset),
            4 => Some(BinaryArrayType::JaggedOffset),
            5 => Some(BinaryArrayType::RectangularOffset),
            _ => None,
        }
    }

    /// Returns true if the record carries per-dimension lower bounds.
    pub fn has_lower_bounds(self) -> bool {
        matches!(
            self,
            BinaryArrayType::SingleOffset
                | BinaryArrayType::JaggedOffset
                | BinaryArrayType::RectangularOffset
        )
    }
}

/// Identifies a user class by name and the library that defines it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassTypeInfo {
    pub type_name: String,
    pub library_id: Id,
}

/// Declared type of one class member or array element.
///
/// Pairs a [`BinaryType`] with its additional info: the scalar kind for
/// primitives and primitive arrays, the literal type name for system classes,
/// and name plus library for user classes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberType {
    Primitive(PrimitiveType),
    String,
    Object,
    SystemClass(String),
    Class(ClassTypeInfo),
    ObjectArray,
    StringArray,
    PrimitiveArray(PrimitiveType),
}

impl MemberType {
    /// Returns the wire BinaryType of this descriptor.
    pub fn binary_type(&self) -> BinaryType {
        match self {
            MemberType::Primitive(_) => BinaryType::Primitive,
            MemberType::String => BinaryType::String,
            MemberType::Object => BinaryType::Object,
            MemberType::SystemClass(_) => BinaryType::SystemClass,
            MemberType::Class(_) => BinaryType::Class,
            MemberType::ObjectArray => BinaryType::ObjectArray,
            MemberType::StringArray => BinaryType::StringArray,
            MemberType::PrimitiveArray(_) => BinaryType::PrimitiveArray,
        }
    }

    /// Returns the scalar kind if values of this type are written raw.
    pub fn inline_primitive(&self) -> Option<PrimitiveType> {
        match self {
            MemberType::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_roundtrip() {
        for v in 0u8..=17 {
            let rt = RecordType::from_u8(v).unwrap();
            assert_eq!(rt as u8, v);
        }
        assert!(RecordType::from_u8(18).is_none());
        assert!(RecordType::from_u8(21).is_none());
    }

    #[test]
    fn test_primitive_type_gap() {
        assert!(PrimitiveType::from_u8(0).is_none());
        assert!(PrimitiveType::from_u8(4).is_none());
        assert!(PrimitiveType::from_u8(19).is_none());
        assert_eq!(PrimitiveType::from_u8(8), Some(PrimitiveType::Int32));
    }

    #[test]
    fn test_min_wire_size() {
        assert_eq!(PrimitiveType::Decimal.min_wire_size(), Some(2));
        assert_eq!(PrimitiveType::DateTime.min_wire_size(), Some(8));
        assert_eq!(PrimitiveType::String.min_wire_size(), None);
    }

    #[test]
    fn test_lower_bounds() {
        assert!(BinaryArrayType::RectangularOffset.has_lower_bounds());
        assert!(!BinaryArrayType::Jagged.has_lower_bounds());
    }
}
