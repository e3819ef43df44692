//! Identifier-indexed store of every referenceable record in a message.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{ReferenceError, ValidationError};
use crate::model::{ArrayRecord, ClassRecord, Id, LibraryRecord, MemberValue, Record};

/// Maps identifiers to records.
///
/// Append-only while a message is decoded or built; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct RecordMap {
    records: FxHashMap<Id, Arc<Record>>,
}

impl RecordMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a record under its identifier.
    ///
    /// Fails if the identifier is null or already taken.
    pub fn insert(&mut self, record: Arc<Record>) -> Result<(), ValidationError> {
        let id = record.id();
        if id.is_null() {
            return Err(ValidationError::NullId {
                record: record.record_type(),
            });
        }
        if self.records.contains_key(&id) {
            return Err(ValidationError::DuplicateId { id });
        }
        self.records.insert(id, record);
        Ok(())
    }

    /// Registers a record and every record written inline beneath it.
    pub fn insert_tree(&mut self, record: &Arc<Record>) -> Result<(), ValidationError> {
        let mut stack = vec![Arc::clone(record)];
        while let Some(record) = stack.pop() {
            let children: &[MemberValue] = match &*record {
                Record::Class(c) => c.values(),
                Record::Array(a) => a.values().unwrap_or(&[]),
                Record::String(_) | Record::Library(_) => &[],
            };
            stack.extend(children.iter().filter_map(|v| match v {
                MemberValue::Record(r) => Some(Arc::clone(r)),
                _ => None,
            }));
            self.insert(record)?;
        }
        Ok(())
    }

    /// Returns the record with the given identifier.
    pub fn get(&self, id: Id) -> Option<&Arc<Record>> {
        self.records.get(&id)
    }

    /// Returns true if a record is registered under `id`.
    pub fn contains(&self, id: Id) -> bool {
        self.records.contains_key(&id)
    }

    /// Returns the record with the given identifier or a reference error.
    pub fn lookup(&self, id: Id) -> Result<&Record, ReferenceError> {
        self.records
            .get(&id)
            .map(|r| &**r)
            .ok_or(ReferenceError::UnknownId { id })
    }

    /// Follows a slot value to the record it denotes.
    ///
    /// Nulls and primitives denote no record and yield `None`.
    pub fn dereference<'a>(&'a self, value: &'a MemberValue) -> Result<Option<&'a Record>, ReferenceError> {
        match value {
            MemberValue::Null | MemberValue::Primitive(_) => Ok(None),
            MemberValue::Reference(id) => self.lookup(*id).map(Some),
            MemberValue::Record(record) => Ok(Some(&**record)),
        }
    }

    /// Returns the class record with the given identifier.
    pub fn class(&self, id: Id) -> Result<&ClassRecord, ReferenceError> {
        let record = self.lookup(id)?;
        record.as_class().ok_or(ReferenceError::UnexpectedRecord {
            id,
            expected: "class",
            found: record.record_type(),
        })
    }

    /// Returns the array record with the given identifier.
    pub fn array(&self, id: Id) -> Result<&ArrayRecord, ReferenceError> {
        let record = self.lookup(id)?;
        record.as_array().ok_or(ReferenceError::UnexpectedRecord {
            id,
            expected: "array",
            found: record.record_type(),
        })
    }

    /// Returns the string with the given identifier.
    pub fn string(&self, id: Id) -> Result<&str, ReferenceError> {
        let record = self.lookup(id)?;
        record.as_str().ok_or(ReferenceError::UnexpectedRecord {
            id,
            expected: "string",
            found: record.record_type(),
        })
    }

    /// Returns the library with the given identifier.
    pub fn library(&self, id: Id) -> Result<&LibraryRecord, ReferenceError> {
        match self.lookup(id)? {
            Record::Library(library) => Ok(library),
            other => Err(ReferenceError::UnexpectedRecord {
                id,
                expected: "library",
                found: other.record_type(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over all records in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (Id, &Arc<Record>)> {
        self.records.iter().map(|(id, r)| (*id, r))
    }
}
