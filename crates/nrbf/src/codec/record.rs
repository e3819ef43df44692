//! Record-level decoding and encoding.
//!
//! The decoder reads one tag byte, parses that record's fixed fields, and for
//! classes and arrays re-enters itself once per trailing member or item.
//! The encoder writes the same fields in the same order.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::codec::message::DecodeOptions;
use crate::codec::primitives::{Reader, Writer};
use crate::codec::types::{
    decode_additional_info, decode_binary_type, decode_class_info, decode_member_type_info,
    encode_additional_info, encode_class_info, encode_member_type_info,
};
use crate::error::{DecodeError, EncodeError, ReferenceError, ValidationError};
use crate::limits::{MAJOR_VERSION, MAX_ARRAY_RANK, MINOR_VERSION};
use crate::model::{
    ArrayItems, ArrayKind, ArrayRecord, BinaryArrayShape, BinaryArrayType, ClassRecord,
    ClassShape, Id, LibraryRecord, MemberType, MemberValue, PrimitiveValue, Record,
    RecordMap, RecordType, SerializationHeader, StringRecord,
};

/// What one call to [`RecordDecoder::read_record`] produced.
#[derive(Debug)]
pub(crate) enum Decoded {
    Header(SerializationHeader),
    /// A referenceable record, already registered in the map.
    Record(Arc<Record>),
    /// A boxed primitive (MemberPrimitiveTyped).
    Primitive(PrimitiveValue),
    Reference(Id),
    /// One or more null slots and the tag that declared them.
    Nulls(usize, RecordType),
    End,
}

impl Decoded {
    pub(crate) fn record_type(&self) -> RecordType {
        match self {
            Decoded::Header(_) => RecordType::SerializedStreamHeader,
            Decoded::Record(r) => r.record_type(),
            Decoded::Primitive(_) => RecordType::MemberPrimitiveTyped,
            Decoded::Reference(_) => RecordType::MemberReference,
            Decoded::Nulls(_, tag) => *tag,
            Decoded::End => RecordType::MessageEnd,
        }
    }
}

/// A slot read from a member or item list before null runs are expanded.
enum Slot {
    Value(MemberValue),
    Nulls(usize),
}

// =============================================================================
// DECODING
// =============================================================================

/// Stateful record reader for one message.
pub(crate) struct RecordDecoder<'a, 'o> {
    reader: Reader<'a>,
    options: &'o DecodeOptions,
    map: RecordMap,
    shapes: FxHashMap<Id, Arc<ClassShape>>,
    depth: usize,
    records_read: usize,
    items_read: usize,
}

impl<'a, 'o> RecordDecoder<'a, 'o> {
    pub(crate) fn new(data: &'a [u8], options: &'o DecodeOptions) -> Self {
        Self {
            reader: Reader::new(data),
            options,
            map: RecordMap::new(),
            shapes: FxHashMap::default(),
            depth: 0,
            records_read: 0,
            items_read: 0,
        }
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.reader.is_empty()
    }

    pub(crate) fn records_read(&self) -> usize {
        self.records_read
    }

    pub(crate) fn into_map(self) -> RecordMap {
        self.map
    }

    /// Reads and dispatches one record.
    pub(crate) fn read_record(&mut self) -> Result<Decoded, DecodeError> {
        if let Some(max) = self.options.max_records {
            if self.records_read >= max {
                return Err(ValidationError::RecordLimitExceeded { max }.into());
            }
        }
        self.records_read += 1;

        let position = self.reader.position();
        let tag = self.reader.read_byte("record type")?;
        let record_type = RecordType::from_u8(tag).ok_or(DecodeError::InvalidRecordType { tag })?;
        trace!(?record_type, position, depth = self.depth, "record");

        match record_type {
            RecordType::SerializedStreamHeader => self.read_header().map(Decoded::Header),
            RecordType::ClassWithId => self.read_class_with_id(),
            RecordType::SystemClassWithMembers
            | RecordType::ClassWithMembers
            | RecordType::SystemClassWithMembersAndTypes
            | RecordType::ClassWithMembersAndTypes => self.read_class(record_type),
            RecordType::BinaryObjectString => {
                let object_id = self.read_object_id(record_type)?;
                let value = self.reader.read_string("string value")?;
                self.register(Record::String(StringRecord { object_id, value }))
            }
            RecordType::BinaryArray => self.read_binary_array(),
            RecordType::MemberPrimitiveTyped => {
                let kind = self.reader.read_primitive_type("boxed primitive type")?;
                let value = self.reader.read_primitive(kind, "boxed primitive")?;
                Ok(Decoded::Primitive(value))
            }
            RecordType::MemberReference => {
                let id = self.reader.read_id("reference id")?;
                if id.is_null() {
                    return Err(DecodeError::NullIdentifier { record: record_type });
                }
                Ok(Decoded::Reference(id))
            }
            RecordType::ObjectNull => Ok(Decoded::Nulls(1, record_type)),
            RecordType::MessageEnd => Ok(Decoded::End),
            RecordType::BinaryLibrary => {
                let library_id = self.read_object_id(record_type)?;
                let name = self.reader.read_string("library name")?;
                self.register(Record::Library(LibraryRecord { library_id, name }))
            }
            RecordType::ObjectNullMultiple256 => {
                let count = self.reader.read_byte("null count")? as usize;
                self.null_run(count, record_type)
            }
            RecordType::ObjectNullMultiple => {
                let count = self.reader.read_count("null count")?;
                self.null_run(count, record_type)
            }
            RecordType::ArraySinglePrimitive => {
                let object_id = self.read_object_id(record_type)?;
                let length = self.reader.read_count("array length")?;
                let kind = self.reader.read_primitive_type("array primitive type")?;
                let items = self.reader.read_primitive_array(kind, length, "array items")?;
                let array = ArrayRecord::new(
                    object_id,
                    ArrayKind::SinglePrimitive(kind),
                    length,
                    ArrayItems::Primitive(items),
                )?;
                self.register(Record::Array(array))
            }
            RecordType::ArraySingleObject | RecordType::ArraySingleString => {
                let object_id = self.read_object_id(record_type)?;
                let length = self.reader.read_count("array length")?;
                let (kind, element) = if record_type == RecordType::ArraySingleObject {
                    (ArrayKind::SingleObject, MemberType::Object)
                } else {
                    (ArrayKind::SingleString, MemberType::String)
                };
                let items = self.read_items(length, &element)?;
                let array = ArrayRecord::new(object_id, kind, length, ArrayItems::Values(items))?;
                self.register(Record::Array(array))
            }
        }
    }

    fn read_header(&mut self) -> Result<SerializationHeader, DecodeError> {
        let root_id = self.reader.read_id("root id")?;
        let header_id = self.reader.read_i32("header id")?;
        let major_version = self.reader.read_i32("major version")?;
        let minor_version = self.reader.read_i32("minor version")?;
        if major_version != MAJOR_VERSION || minor_version != MINOR_VERSION {
            return Err(DecodeError::UnsupportedVersion {
                major: major_version,
                minor: minor_version,
            });
        }
        Ok(SerializationHeader {
            root_id,
            header_id,
            major_version,
            minor_version,
        })
    }

    fn read_object_id(&mut self, record: RecordType) -> Result<Id, DecodeError> {
        let id = self.reader.read_id("object id")?;
        if id.is_null() {
            return Err(DecodeError::NullIdentifier { record });
        }
        Ok(id)
    }

    fn register(&mut self, record: Record) -> Result<Decoded, DecodeError> {
        let record = Arc::new(record);
        self.map.insert(Arc::clone(&record))?;
        Ok(Decoded::Record(record))
    }

    fn null_run(&mut self, count: usize, record_type: RecordType) -> Result<Decoded, DecodeError> {
        if count == 0 {
            return Err(DecodeError::EmptyNullRun);
        }
        Ok(Decoded::Nulls(count, record_type))
    }

    fn read_class(&mut self, record_type: RecordType) -> Result<Decoded, DecodeError> {
        let info = decode_class_info(&mut self.reader, record_type)?;
        let typed = matches!(
            record_type,
            RecordType::SystemClassWithMembersAndTypes | RecordType::ClassWithMembersAndTypes
        );
        let member_types = if typed {
            Some(decode_member_type_info(&mut self.reader, info.member_names.len())?)
        } else {
            None
        };
        let library_id = match record_type {
            RecordType::ClassWithMembers | RecordType::ClassWithMembersAndTypes => {
                let id = self.reader.read_id("library id")?;
                self.map.library(id)?;
                Some(id)
            }
            _ => None,
        };

        let object_id = info.object_id;
        let shape = Arc::new(match member_types {
            Some(types) => ClassShape::typed(info, types, library_id)?,
            None => ClassShape::untyped(info, library_id),
        });
        self.shapes.insert(object_id, Arc::clone(&shape));

        let values = self.read_members(&shape)?;
        let record = ClassRecord::new(shape, values)?;
        self.register(Record::Class(record))
    }

    fn read_class_with_id(&mut self) -> Result<Decoded, DecodeError> {
        let object_id = self.read_object_id(RecordType::ClassWithId)?;
        let metadata_id = self.reader.read_id("metadata id")?;
        let shape = match self.shapes.get(&metadata_id) {
            Some(shape) => Arc::clone(shape),
            None => {
                return Err(match self.map.get(metadata_id) {
                    Some(record) => ReferenceError::UnexpectedRecord {
                        id: metadata_id,
                        expected: "class",
                        found: record.record_type(),
                    },
                    None => ReferenceError::UnknownId { id: metadata_id },
                }
                .into());
            }
        };
        self.shapes.insert(object_id, Arc::clone(&shape));

        let values = self.read_members(&shape)?;
        let record = ClassRecord::with_metadata(object_id, shape, values)?;
        self.register(Record::Class(record))
    }

    fn read_binary_array(&mut self) -> Result<Decoded, DecodeError> {
        let object_id = self.read_object_id(RecordType::BinaryArray)?;
        let value = self.reader.read_byte("binary array type")?;
        let array_type =
            BinaryArrayType::from_u8(value).ok_or(DecodeError::InvalidBinaryArrayType { value })?;
        let rank = self.reader.read_i32("array rank")?;
        if rank < 1 || rank as usize > MAX_ARRAY_RANK {
            return Err(DecodeError::InvalidRank { rank });
        }

        let mut lengths = Vec::with_capacity(rank as usize);
        for _ in 0..rank {
            let len = self.reader.read_count("array dimension length")?;
            lengths.push(len as i32);
        }
        let lower_bounds = if array_type.has_lower_bounds() {
            let mut bounds = Vec::with_capacity(rank as usize);
            for _ in 0..rank {
                bounds.push(self.reader.read_i32("array lower bound")?);
            }
            Some(bounds)
        } else {
            None
        };

        let binary_type = decode_binary_type(&mut self.reader)?;
        let element = decode_additional_info(&mut self.reader, binary_type)?;

        let shape = BinaryArrayShape {
            array_type,
            lengths,
            lower_bounds,
            element,
        };
        let total = shape.total_length().ok_or(DecodeError::LengthExceedsLimit {
            field: "array length",
            len: usize::MAX,
            max: i32::MAX as usize,
        })?;

        let items = match shape.element.inline_primitive() {
            Some(kind) => {
                ArrayItems::Primitive(self.reader.read_primitive_array(kind, total, "array items")?)
            }
            None => ArrayItems::Values(self.read_items(total, &shape.element)?),
        };
        let array = ArrayRecord::new(object_id, ArrayKind::Binary(shape), total, items)?;
        self.register(Record::Array(array))
    }

    /// Reads one member or item slot of the declared type.
    ///
    /// Library records may precede the value; they are registered and
    /// skipped.
    fn read_slot(&mut self, ty: &MemberType, context: &'static str) -> Result<Slot, DecodeError> {
        if let Some(kind) = ty.inline_primitive() {
            return Ok(Slot::Value(MemberValue::Primitive(
                self.reader.read_primitive(kind, context)?,
            )));
        }

        loop {
            let slot = match self.read_record()? {
                Decoded::Record(record) if matches!(*record, Record::Library(_)) => continue,
                Decoded::Record(record) => Slot::Value(MemberValue::Record(record)),
                Decoded::Primitive(value) => Slot::Value(MemberValue::Primitive(value)),
                Decoded::Reference(id) => Slot::Value(MemberValue::Reference(id)),
                Decoded::Nulls(count, _) => Slot::Nulls(count),
                other @ (Decoded::Header(_) | Decoded::End) => {
                    return Err(DecodeError::UnexpectedRecord {
                        record: other.record_type(),
                        context,
                    });
                }
            };
            return Ok(slot);
        }
    }

    fn enter(&mut self) -> Result<(), DecodeError> {
        if self.depth >= self.options.max_depth {
            return Err(ValidationError::DepthLimitExceeded {
                max: self.options.max_depth,
            }
            .into());
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn read_members(&mut self, shape: &ClassShape) -> Result<Vec<MemberValue>, DecodeError> {
        self.enter()?;
        let mut values = Vec::with_capacity(shape.member_types().len());
        for ty in shape.member_types() {
            match self.read_slot(ty, "class member")? {
                Slot::Value(value) => values.push(value),
                Slot::Nulls(1) => values.push(MemberValue::Null),
                Slot::Nulls(count) => {
                    return Err(ValidationError::MultipleNullsInMember { count }.into());
                }
            }
        }
        self.leave();
        Ok(values)
    }

    /// Reads `count` item slots, expanding null runs in place.
    fn read_items(&mut self, count: usize, element: &MemberType) -> Result<Vec<MemberValue>, DecodeError> {
        if count > self.options.max_object_array_len {
            return Err(DecodeError::LengthExceedsLimit {
                field: "array length",
                len: count,
                max: self.options.max_object_array_len,
            });
        }

        // A short array fails to decode, so the declared length is charged
        // up front.
        let total = self.items_read.saturating_add(count);
        if total > self.options.max_total_items {
            return Err(DecodeError::LengthExceedsLimit {
                field: "total array items",
                len: total,
                max: self.options.max_total_items,
            });
        }
        self.items_read = total;

        self.enter()?;
        // Null runs can stand for many slots, so the hint is capped by input
        // size rather than trusted.
        let mut items = Vec::with_capacity(count.min(self.reader.remaining_len()));
        while items.len() < count {
            match self.read_slot(element, "array item")? {
                Slot::Value(value) => items.push(value),
                Slot::Nulls(run) => {
                    let remaining = count - items.len();
                    if run > remaining {
                        return Err(ValidationError::NullRunOverflow {
                            count: run,
                            remaining,
                        }
                        .into());
                    }
                    items.resize(items.len() + run, MemberValue::Null);
                }
            }
        }
        self.leave();
        Ok(items)
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Stateful record writer for one message.
///
/// Each library record is written once, just before the first record that
/// needs it.
pub(crate) struct RecordEncoder<'m> {
    writer: Writer,
    map: &'m RecordMap,
    libraries: FxHashSet<Id>,
}

impl<'m> RecordEncoder<'m> {
    pub(crate) fn new(map: &'m RecordMap) -> Self {
        Self {
            writer: Writer::with_capacity(256),
            map,
            libraries: FxHashSet::default(),
        }
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.writer.into_bytes()
    }

    pub(crate) fn write_header(&mut self, header: &SerializationHeader) {
        self.writer.write_byte(RecordType::SerializedStreamHeader as u8);
        self.writer.write_id(header.root_id);
        self.writer.write_i32(header.header_id);
        self.writer.write_i32(header.major_version);
        self.writer.write_i32(header.minor_version);
    }

    pub(crate) fn write_end(&mut self) {
        self.writer.write_byte(RecordType::MessageEnd as u8);
    }

    fn write_library(&mut self, library: &LibraryRecord) -> Result<(), EncodeError> {
        if self.libraries.insert(library.library_id) {
            self.writer.write_byte(RecordType::BinaryLibrary as u8);
            self.writer.write_id(library.library_id);
            self.writer.write_string(&library.name, "library name")?;
        }
        Ok(())
    }

    fn ensure_library(&mut self, id: Id) -> Result<(), EncodeError> {
        if self.libraries.contains(&id) {
            return Ok(());
        }
        match self.map.get(id).map(|r| &**r) {
            Some(Record::Library(library)) => self.write_library(library),
            _ => Err(EncodeError::UnknownLibrary { id }),
        }
    }

    fn ensure_member_libraries(&mut self, types: &[MemberType]) -> Result<(), EncodeError> {
        for ty in types {
            if let MemberType::Class(info) = ty {
                self.ensure_library(info.library_id)?;
            }
        }
        Ok(())
    }

    /// Writes one record and everything written inline beneath it.
    pub(crate) fn write_record(&mut self, record: &Record) -> Result<(), EncodeError> {
        match record {
            Record::Library(library) => self.write_library(library),
            Record::String(s) => {
                self.writer.write_byte(RecordType::BinaryObjectString as u8);
                self.writer.write_id(s.object_id);
                self.writer.write_string(&s.value, "string value")
            }
            Record::Class(class) => self.write_class(class),
            Record::Array(array) => self.write_array(array),
        }
    }

    fn write_class(&mut self, class: &ClassRecord) -> Result<(), EncodeError> {
        let record_type = class.record_type();
        let shape = class.shape();

        if class.metadata_id().is_none() {
            if !shape.is_typed() {
                return Err(EncodeError::NotSupported {
                    record: record_type,
                });
            }
            if let Some(library_id) = shape.library_id() {
                self.ensure_library(library_id)?;
            }
            self.ensure_member_libraries(shape.member_types())?;
        }

        self.writer.write_byte(record_type as u8);
        match class.metadata_id() {
            Some(metadata_id) => {
                self.writer.write_id(class.id());
                self.writer.write_id(metadata_id);
            }
            None => {
                encode_class_info(&mut self.writer, shape.info())?;
                encode_member_type_info(&mut self.writer, shape.member_types())?;
                if let Some(library_id) = shape.library_id() {
                    self.writer.write_id(library_id);
                }
            }
        }

        for (_, ty, value) in class.members() {
            self.write_slot(ty, value)?;
        }
        Ok(())
    }

    fn write_array(&mut self, array: &ArrayRecord) -> Result<(), EncodeError> {
        if let ArrayKind::Binary(shape) = array.kind() {
            self.ensure_member_libraries(std::slice::from_ref(&shape.element))?;
        }

        self.writer.write_byte(array.record_type() as u8);
        self.writer.write_id(array.id());
        match array.kind() {
            ArrayKind::SinglePrimitive(kind) => {
                self.writer.write_count(array.length(), "array length")?;
                self.writer.write_byte(*kind as u8);
            }
            ArrayKind::SingleObject | ArrayKind::SingleString => {
                self.writer.write_count(array.length(), "array length")?;
            }
            ArrayKind::Binary(shape) => {
                self.writer.write_byte(shape.array_type as u8);
                self.writer.write_count(shape.rank(), "array rank")?;
                for &len in &shape.lengths {
                    self.writer.write_i32(len);
                }
                if let Some(bounds) = &shape.lower_bounds {
                    for &bound in bounds {
                        self.writer.write_i32(bound);
                    }
                }
                self.writer.write_byte(shape.element.binary_type() as u8);
                encode_additional_info(&mut self.writer, &shape.element)?;
            }
        }

        match array.items() {
            ArrayItems::Primitive(values) => {
                for value in values {
                    self.writer.write_primitive(value)?;
                }
                Ok(())
            }
            ArrayItems::Values(values) => self.write_items(&array.element_type(), values),
        }
    }

    /// Writes item slots, coalescing consecutive nulls into runs.
    fn write_items(&mut self, element: &MemberType, values: &[MemberValue]) -> Result<(), EncodeError> {
        let mut nulls = 0usize;
        for value in values {
            if value.is_null() {
                nulls += 1;
                continue;
            }
            self.write_null_run(nulls)?;
            nulls = 0;
            self.write_slot(element, value)?;
        }
        self.write_null_run(nulls)
    }

    fn write_null_run(&mut self, count: usize) -> Result<(), EncodeError> {
        match count {
            0 => {}
            1 => self.writer.write_byte(RecordType::ObjectNull as u8),
            2..=255 => {
                self.writer.write_byte(RecordType::ObjectNullMultiple256 as u8);
                self.writer.write_byte(count as u8);
            }
            _ => {
                self.writer.write_byte(RecordType::ObjectNullMultiple as u8);
                self.writer.write_count(count, "null count")?;
            }
        }
        Ok(())
    }

    fn write_slot(&mut self, ty: &MemberType, value: &MemberValue) -> Result<(), EncodeError> {
        if let Some(kind) = ty.inline_primitive() {
            return match value {
                MemberValue::Primitive(p) if p.kind() == kind => self.writer.write_primitive(p),
                other => Err(EncodeError::SlotTypeMismatch {
                    expected: ty.clone(),
                    found: other.describe(),
                }),
            };
        }

        match value {
            MemberValue::Null => {
                self.writer.write_byte(RecordType::ObjectNull as u8);
                Ok(())
            }
            MemberValue::Primitive(p) => {
                self.writer.write_byte(RecordType::MemberPrimitiveTyped as u8);
                self.writer.write_byte(p.kind() as u8);
                self.writer.write_primitive(p)
            }
            MemberValue::Reference(id) => {
                self.writer.write_byte(RecordType::MemberReference as u8);
                self.writer.write_id(*id);
                Ok(())
            }
            MemberValue::Record(record) => match &**record {
                Record::Library(_) => Err(EncodeError::SlotTypeMismatch {
                    expected: ty.clone(),
                    found: "library",
                }),
                record => self.write_record(record),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_one(bytes: &[u8]) -> Result<Decoded, DecodeError> {
        let options = DecodeOptions::default();
        let mut decoder = RecordDecoder::new(bytes, &options);
        decoder.read_record()
    }

    #[test]
    fn test_unknown_tags() {
        for tag in [18u8, 21, 22, 0xFF] {
            assert!(matches!(
                decode_one(&[tag]),
                Err(DecodeError::InvalidRecordType { .. })
            ));
        }
    }

    #[test]
    fn test_empty_null_run() {
        assert!(matches!(
            decode_one(&[RecordType::ObjectNullMultiple256 as u8, 0]),
            Err(DecodeError::EmptyNullRun)
        ));
    }

    #[test]
    fn test_null_reference_rejected() {
        assert!(matches!(
            decode_one(&[RecordType::MemberReference as u8, 0, 0, 0, 0]),
            Err(DecodeError::NullIdentifier { .. })
        ));
    }

    #[test]
    fn test_boxed_primitive() {
        let bytes = [RecordType::MemberPrimitiveTyped as u8, 8, 7, 0, 0, 0];
        assert!(matches!(
            decode_one(&bytes),
            Ok(Decoded::Primitive(PrimitiveValue::Int32(7)))
        ));
    }

    #[test]
    fn test_multiple_nulls_in_member_rejected() {
        // Class "C" with one Object member whose slot is a run of two nulls.
        let mut bytes = vec![RecordType::SystemClassWithMembersAndTypes as u8];
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(b"\x01C");
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(b"\x01m");
        bytes.push(2);
        bytes.extend_from_slice(&[RecordType::ObjectNullMultiple256 as u8, 2]);
        assert!(matches!(
            decode_one(&bytes),
            Err(DecodeError::Validation(ValidationError::MultipleNullsInMember { count: 2 }))
        ));
    }

    #[test]
    fn test_depth_limit() {
        // An object array whose only item is another object array, nested deeply.
        let mut bytes = Vec::new();
        for id in 1..=10i32 {
            bytes.push(RecordType::ArraySingleObject as u8);
            bytes.extend_from_slice(&id.to_le_bytes());
            bytes.extend_from_slice(&1i32.to_le_bytes());
        }
        bytes.push(RecordType::ObjectNull as u8);

        let options = DecodeOptions::new().with_max_depth(4);
        let mut decoder = RecordDecoder::new(&bytes, &options);
        assert!(matches!(
            decoder.read_record(),
            Err(DecodeError::Validation(ValidationError::DepthLimitExceeded { max: 4 }))
        ));

        let options = DecodeOptions::new();
        let mut decoder = RecordDecoder::new(&bytes, &options);
        assert!(decoder.read_record().is_ok());
    }

    #[test]
    fn test_object_array_length_limit() {
        let mut bytes = vec![RecordType::ArraySingleObject as u8];
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&100i32.to_le_bytes());
        bytes.extend_from_slice(&[RecordType::ObjectNullMultiple256 as u8, 100]);

        let options = DecodeOptions::new().with_max_object_array_len(10);
        let mut decoder = RecordDecoder::new(&bytes, &options);
        assert!(matches!(
            decoder.read_record(),
            Err(DecodeError::LengthExceedsLimit { len: 100, max: 10, .. })
        ));
    }

    #[test]
    fn test_total_items_limit() {
        let mut bytes = Vec::new();
        for id in 1..=3i32 {
            bytes.push(RecordType::ArraySingleObject as u8);
            bytes.extend_from_slice(&id.to_le_bytes());
            bytes.extend_from_slice(&8i32.to_le_bytes());
            bytes.extend_from_slice(&[RecordType::ObjectNullMultiple256 as u8, 8]);
        }

        let options = DecodeOptions::new()
            .with_max_object_array_len(8)
            .with_max_total_items(20);
        let mut decoder = RecordDecoder::new(&bytes, &options);
        assert!(decoder.read_record().is_ok());
        assert!(decoder.read_record().is_ok());
        assert!(matches!(
            decoder.read_record(),
            Err(DecodeError::LengthExceedsLimit { len: 24, max: 20, .. })
        ));
    }

    #[test]
    fn test_record_limit() {
        let bytes = [RecordType::ObjectNull as u8, RecordType::ObjectNull as u8];
        let options = DecodeOptions::new().with_max_records(1);
        let mut decoder = RecordDecoder::new(&bytes, &options);
        assert!(decoder.read_record().is_ok());
        assert!(matches!(
            decoder.read_record(),
            Err(DecodeError::Validation(ValidationError::RecordLimitExceeded { max: 1 }))
        ));
    }

    #[test]
    fn test_null_run_coalescing() {
        let map = RecordMap::new();
        let mut encoder = RecordEncoder::new(&map);
        let mut values = vec![MemberValue::Null; 300];
        values.push(MemberValue::Reference(Id::new(4)));
        values.push(MemberValue::Null);
        values.extend(vec![MemberValue::Null; 2]);
        encoder.write_items(&MemberType::Object, &values).unwrap();
        let bytes = encoder.into_bytes();

        let mut expected = vec![RecordType::ObjectNullMultiple as u8];
        expected.extend_from_slice(&300i32.to_le_bytes());
        expected.push(RecordType::MemberReference as u8);
        expected.extend_from_slice(&4i32.to_le_bytes());
        expected.extend_from_slice(&[RecordType::ObjectNullMultiple256 as u8, 3]);
        assert_eq!(bytes, expected);
    }
}
