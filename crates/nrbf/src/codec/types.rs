//! Class info and member type info encoding/decoding.
//!
//! Member type info stores every member's BinaryType byte first, then the
//! additional info of each member that has one, in member order.

use crate::codec::primitives::{Reader, Writer};
use crate::error::{DecodeError, EncodeError};
use crate::model::{BinaryType, ClassInfo, ClassTypeInfo, MemberType, PrimitiveType, RecordType};

// =============================================================================
// DECODING
// =============================================================================

/// Reads object identifier, class name and member names.
pub fn decode_class_info(reader: &mut Reader<'_>, record: RecordType) -> Result<ClassInfo, DecodeError> {
    let object_id = reader.read_id("class object id")?;
    if object_id.is_null() {
        return Err(DecodeError::NullIdentifier { record });
    }
    let name = reader.read_string("class name")?;
    let count = reader.read_count("member count")?;

    // Each name takes at least its one-byte length prefix.
    if count > reader.remaining_len() {
        return Err(DecodeError::LengthExceedsLimit {
            field: "member count",
            len: count,
            max: reader.remaining_len(),
        });
    }
    let mut member_names = Vec::with_capacity(count);
    for _ in 0..count {
        member_names.push(reader.read_string("member name")?);
    }

    Ok(ClassInfo {
        object_id,
        name,
        member_names,
    })
}

/// Reads a primitive type that may describe a raw value.
fn decode_value_kind(reader: &mut Reader<'_>, context: &'static str) -> Result<PrimitiveType, DecodeError> {
    let kind = reader.read_primitive_type(context)?;
    match kind {
        PrimitiveType::Null | PrimitiveType::String => {
            Err(DecodeError::InvalidPrimitiveKind { kind, context })
        }
        _ => Ok(kind),
    }
}

/// Reads a BinaryType byte.
pub fn decode_binary_type(reader: &mut Reader<'_>) -> Result<BinaryType, DecodeError> {
    let value = reader.read_byte("binary type")?;
    BinaryType::from_u8(value).ok_or(DecodeError::InvalidBinaryType { value })
}

/// Reads the additional info that completes a BinaryType.
pub fn decode_additional_info(
    reader: &mut Reader<'_>,
    binary_type: BinaryType,
) -> Result<MemberType, DecodeError> {
    Ok(match binary_type {
        BinaryType::Primitive => MemberType::Primitive(decode_value_kind(reader, "member primitive type")?),
        BinaryType::String => MemberType::String,
        BinaryType::Object => MemberType::Object,
        BinaryType::SystemClass => MemberType::SystemClass(reader.read_string("system class name")?),
        BinaryType::Class => {
            let type_name = reader.read_string("class type name")?;
            let library_id = reader.read_id("class type library id")?;
            MemberType::Class(ClassTypeInfo {
                type_name,
                library_id,
            })
        }
        BinaryType::ObjectArray => MemberType::ObjectArray,
        BinaryType::StringArray => MemberType::StringArray,
        BinaryType::PrimitiveArray => {
            MemberType::PrimitiveArray(decode_value_kind(reader, "array primitive type")?)
        }
    })
}

/// Reads member type info for `count` members.
pub fn decode_member_type_info(
    reader: &mut Reader<'_>,
    count: usize,
) -> Result<Vec<MemberType>, DecodeError> {
    // One BinaryType byte per member.
    let binary_types = reader.read_bytes(count, "member binary types")?;
    let mut member_types = Vec::with_capacity(count);
    for &value in binary_types {
        let binary_type = BinaryType::from_u8(value).ok_or(DecodeError::InvalidBinaryType { value })?;
        member_types.push(decode_additional_info(reader, binary_type)?);
    }
    Ok(member_types)
}

// =============================================================================
// ENCODING
// =============================================================================

/// Writes object identifier, class name and member names.
pub fn encode_class_info(writer: &mut Writer, info: &ClassInfo) -> Result<(), EncodeError> {
    writer.write_id(info.object_id);
    writer.write_string(&info.name, "class name")?;
    writer.write_count(info.member_names.len(), "member count")?;
    for name in &info.member_names {
        writer.write_string(name, "member name")?;
    }
    Ok(())
}

/// Writes the additional info of one member type, if it has any.
pub fn encode_additional_info(writer: &mut Writer, ty: &MemberType) -> Result<(), EncodeError> {
    match ty {
        MemberType::Primitive(kind) | MemberType::PrimitiveArray(kind) => {
            writer.write_byte(*kind as u8);
        }
        MemberType::SystemClass(name) => writer.write_string(name, "system class name")?,
        MemberType::Class(info) => {
            writer.write_string(&info.type_name, "class type name")?;
            writer.write_id(info.library_id);
        }
        MemberType::String | MemberType::Object | MemberType::ObjectArray | MemberType::StringArray => {}
    }
    Ok(())
}

/// Writes member type info: all BinaryType bytes, then all additional infos.
pub fn encode_member_type_info(writer: &mut Writer, types: &[MemberType]) -> Result<(), EncodeError> {
    for ty in types {
        writer.write_byte(ty.binary_type() as u8);
    }
    for ty in types {
        encode_additional_info(writer, ty)?;
    }
    Ok(())
}
