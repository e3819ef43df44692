//! Builder API for assembling messages by hand.
//!
//! # Example
//!
//! ```rust
//! use nrbf::model::builder::MessageBuilder;
//! use nrbf::Id;
//!
//! let message = MessageBuilder::new(Id::new(1))
//!     .library(Id::new(2), "Geometry, Version=1.0.0.0")
//!     .class(Id::new(1), "Geometry.Pair", |c| c
//!         .library(Id::new(2))
//!         .int32("X", 1)
//!         .int32("Y", 2)
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(message.root().as_class().unwrap().name(), "Geometry.Pair");
//! ```

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{Error, ReferenceError, ValidationError};
use crate::model::{
    ArrayItems, ArrayKind, ArrayRecord, ClassInfo, ClassRecord, ClassShape, Id, LibraryRecord,
    MemberType, MemberValue, Message, PrimitiveType, PrimitiveValue, Record, RecordMap,
    SerializationHeader, StringRecord,
};

/// Builder for a [`Message`] made of top-level records.
///
/// Errors from individual records are held until [`build`](Self::build).
#[derive(Debug)]
pub struct MessageBuilder {
    root_id: Id,
    records: Vec<Arc<Record>>,
    shapes: FxHashMap<Id, Arc<ClassShape>>,
    error: Option<Error>,
}

impl MessageBuilder {
    /// Creates a builder whose header names `root_id` as the root.
    pub fn new(root_id: Id) -> Self {
        Self {
            root_id,
            records: Vec::new(),
            shapes: FxHashMap::default(),
            error: None,
        }
    }

    fn push(mut self, record: Result<Record, Error>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match record {
            Ok(record) => {
                if let Record::Class(class) = &record {
                    if class.metadata_id().is_none() {
                        self.shapes.insert(class.id(), Arc::clone(class.shape()));
                    }
                }
                self.records.push(Arc::new(record));
            }
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Adds a BinaryLibrary record.
    pub fn library(self, id: Id, name: impl Into<String>) -> Self {
        self.push(Ok(Record::Library(LibraryRecord {
            library_id: id,
            name: name.into(),
        })))
    }

    /// Adds a class record built with a [`ClassBuilder`].
    pub fn class<F>(self, id: Id, name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(ClassBuilder) -> ClassBuilder,
    {
        let record = f(ClassBuilder::new(id, name))
            .build()
            .map(Record::Class)
            .map_err(Error::from);
        self.push(record)
    }

    /// Adds a ClassWithId record reusing the shape of an earlier class.
    pub fn class_like(self, id: Id, metadata_id: Id, values: Vec<MemberValue>) -> Self {
        let record = match self.shapes.get(&metadata_id) {
            Some(shape) => ClassRecord::with_metadata(id, Arc::clone(shape), values)
                .map(Record::Class)
                .map_err(Error::from),
            None => Err(ReferenceError::UnknownId { id: metadata_id }.into()),
        };
        self.push(record)
    }

    /// Adds a BinaryObjectString record.
    pub fn string(self, id: Id, value: impl Into<String>) -> Self {
        self.push(Ok(Record::String(StringRecord {
            object_id: id,
            value: value.into(),
        })))
    }

    /// Adds an ArraySinglePrimitive record.
    pub fn primitive_array(self, id: Id, kind: PrimitiveType, values: Vec<PrimitiveValue>) -> Self {
        let len = values.len();
        let record = ArrayRecord::new(
            id,
            ArrayKind::SinglePrimitive(kind),
            len,
            ArrayItems::Primitive(values),
        );
        self.push(record.map(Record::Array).map_err(Error::from))
    }

    /// Adds an ArraySingleObject record.
    pub fn object_array(self, id: Id, values: Vec<MemberValue>) -> Self {
        let len = values.len();
        let record = ArrayRecord::new(id, ArrayKind::SingleObject, len, ArrayItems::Values(values));
        self.push(record.map(Record::Array).map_err(Error::from))
    }

    /// Adds an ArraySingleString record.
    pub fn string_array(self, id: Id, values: Vec<MemberValue>) -> Self {
        let len = values.len();
        let record = ArrayRecord::new(id, ArrayKind::SingleString, len, ArrayItems::Values(values));
        self.push(record.map(Record::Array).map_err(Error::from))
    }

    /// Adds an already constructed record.
    pub fn record(self, record: Record) -> Self {
        self.push(Ok(record))
    }

    /// Returns the number of top-level records added so far.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Registers every record and assembles the message.
    pub fn build(self) -> Result<Message, Error> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let mut map = RecordMap::new();
        for record in &self.records {
            map.insert_tree(record)?;
        }
        Ok(Message::new(
            SerializationHeader::new(self.root_id),
            self.records,
            map,
        )?)
    }
}

/// Builder for one class record with explicit member types.
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    id: Id,
    name: String,
    library: Option<Id>,
    member_names: Vec<String>,
    member_types: Vec<MemberType>,
    values: Vec<MemberValue>,
}

impl ClassBuilder {
    /// Creates a builder for a system class (no library).
    pub fn new(id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            library: None,
            member_names: Vec::new(),
            member_types: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Places the class in a library, making it a user class.
    pub fn library(mut self, library_id: Id) -> Self {
        self.library = Some(library_id);
        self
    }

    /// Adds a member with an explicit type and value.
    pub fn member(mut self, name: impl Into<String>, ty: MemberType, value: MemberValue) -> Self {
        self.member_names.push(name.into());
        self.member_types.push(ty);
        self.values.push(value);
        self
    }

    /// Adds a raw primitive member typed by its value.
    pub fn primitive(self, name: impl Into<String>, value: PrimitiveValue) -> Self {
        let ty = MemberType::Primitive(value.kind());
        self.member(name, ty, MemberValue::Primitive(value))
    }

    pub fn int32(self, name: impl Into<String>, value: i32) -> Self {
        self.primitive(name, PrimitiveValue::Int32(value))
    }

    pub fn int64(self, name: impl Into<String>, value: i64) -> Self {
        self.primitive(name, PrimitiveValue::Int64(value))
    }

    pub fn bool(self, name: impl Into<String>, value: bool) -> Self {
        self.primitive(name, PrimitiveValue::Boolean(value))
    }

    pub fn double(self, name: impl Into<String>, value: f64) -> Self {
        self.primitive(name, PrimitiveValue::Double(value))
    }

    /// Adds a string member written inline as its own record.
    pub fn string(self, name: impl Into<String>, id: Id, value: impl Into<String>) -> Self {
        let record = Record::String(StringRecord {
            object_id: id,
            value: value.into(),
        });
        self.member(name, MemberType::String, record.into())
    }

    /// Adds a member referring to a record defined elsewhere.
    pub fn reference(self, name: impl Into<String>, ty: MemberType, id: Id) -> Self {
        self.member(name, ty, MemberValue::Reference(id))
    }

    /// Adds a null member.
    pub fn null(self, name: impl Into<String>, ty: MemberType) -> Self {
        self.member(name, ty, MemberValue::Null)
    }

    /// Builds the class record.
    pub fn build(self) -> Result<ClassRecord, ValidationError> {
        let shape = ClassShape::typed(
            ClassInfo {
                object_id: self.id,
                name: self.name,
                member_names: self.member_names,
            },
            self.member_types,
            self.library,
        )?;
        ClassRecord::new(Arc::new(shape), self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordType;

    #[test]
    fn test_build_registers_inline_records() {
        let message = MessageBuilder::new(Id::new(1))
            .class(Id::new(1), "Holder", |c| {
                c.string("Name", Id::new(2), "inline")
                    .reference("Other", MemberType::String, Id::new(3))
            })
            .string(Id::new(3), "top")
            .build()
            .unwrap();

        assert_eq!(message.records().len(), 2);
        assert_eq!(message.map().len(), 3);
        assert_eq!(message.map().string(Id::new(2)).unwrap(), "inline");
    }

    #[test]
    fn test_class_like_shares_shape() {
        let message = MessageBuilder::new(Id::new(1))
            .object_array(
                Id::new(1),
                vec![MemberValue::Reference(Id::new(2)), MemberValue::Reference(Id::new(3))],
            )
            .class(Id::new(2), "Point", |c| c.int32("X", 1))
            .class_like(Id::new(3), Id::new(2), vec![PrimitiveValue::Int32(5).into()])
            .build()
            .unwrap();

        let second = message.map().class(Id::new(3)).unwrap();
        assert_eq!(second.record_type(), RecordType::ClassWithId);
        assert_eq!(second.name(), "Point");
    }

    #[test]
    fn test_unknown_metadata() {
        let result = MessageBuilder::new(Id::new(1))
            .class_like(Id::new(1), Id::new(7), Vec::new())
            .build();
        assert!(matches!(
            result,
            Err(Error::Reference(ReferenceError::UnknownId { .. }))
        ));
    }

    #[test]
    fn test_duplicate_ids() {
        let result = MessageBuilder::new(Id::new(1))
            .string(Id::new(1), "a")
            .string(Id::new(1), "b")
            .build();
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::DuplicateId { .. }))
        ));
    }
}
