//! A decoded message: header, top-level records and the record map.

use std::io::Read;
use std::sync::Arc;

use crate::codec::{decode_message, encode_message, DecodeOptions};
use crate::deserialize::{Deserializer, ObjectGraph, TypeResolver};
use crate::error::{Error, ReferenceError};
use crate::model::{Id, Record, RecordMap, SerializationHeader};

/// One decoded NRBF stream.
///
/// Immutable once constructed; safe to share and query from many threads.
#[derive(Debug, Clone)]
pub struct Message {
    header: SerializationHeader,
    root: Arc<Record>,
    records: Vec<Arc<Record>>,
    map: RecordMap,
}

impl Message {
    /// Assembles a message, checking that the header's root is present.
    ///
    /// `records` lists the records written at the top level of the stream in
    /// order; `map` holds those plus every record written inline.
    pub fn new(
        header: SerializationHeader,
        records: Vec<Arc<Record>>,
        map: RecordMap,
    ) -> Result<Self, ReferenceError> {
        let root = map
            .get(header.root_id)
            .cloned()
            .ok_or(ReferenceError::MissingRoot {
                id: header.root_id,
            })?;
        if !root.is_object() {
            return Err(ReferenceError::UnexpectedRecord {
                id: header.root_id,
                expected: "object",
                found: root.record_type(),
            });
        }
        Ok(Self {
            header,
            root,
            records,
            map,
        })
    }

    /// Decodes a message from bytes.
    pub fn decode(data: &[u8], options: &DecodeOptions) -> Result<Self, Error> {
        Ok(decode_message(data, options)?)
    }

    /// Reads a whole stream into memory and decodes it.
    pub fn from_reader<R: Read>(mut reader: R, options: &DecodeOptions) -> Result<Self, Error> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::decode(&data, options)
    }

    /// Encodes the message back to bytes.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        Ok(encode_message(self)?)
    }

    /// Reconstructs the object graph with default activator, surrogates and
    /// options.
    pub fn reconstruct(&self, resolver: &dyn TypeResolver) -> Result<ObjectGraph, Error> {
        Ok(Deserializer::new(self, resolver).deserialize()?)
    }

    pub fn header(&self) -> &SerializationHeader {
        &self.header
    }

    pub fn root_id(&self) -> Id {
        self.header.root_id
    }

    /// Returns the root record.
    pub fn root(&self) -> &Record {
        &self.root
    }

    /// Returns the top-level records in stream order.
    pub fn records(&self) -> &[Arc<Record>] {
        &self.records
    }

    /// Returns the record map.
    pub fn map(&self) -> &RecordMap {
        &self.map
    }

    /// Looks up a record by identifier.
    pub fn lookup(&self, id: Id) -> Result<&Record, ReferenceError> {
        self.map.lookup(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LibraryRecord, StringRecord};

    #[test]
    fn test_root_must_exist() {
        let result = Message::new(
            SerializationHeader::new(Id::new(1)),
            Vec::new(),
            RecordMap::new(),
        );
        assert!(matches!(result, Err(ReferenceError::MissingRoot { .. })));
    }

    #[test]
    fn test_root_must_be_object() {
        let library = Arc::new(Record::Library(LibraryRecord {
            library_id: Id::new(1),
            name: "Lib".to_string(),
        }));
        let mut map = RecordMap::new();
        map.insert(Arc::clone(&library)).unwrap();
        let result = Message::new(SerializationHeader::new(Id::new(1)), vec![library], map);
        assert!(matches!(result, Err(ReferenceError::UnexpectedRecord { .. })));
    }

    #[test]
    fn test_root_lookup() {
        let root = Arc::new(Record::String(StringRecord {
            object_id: Id::new(1),
            value: "hello".to_string(),
        }));
        let mut map = RecordMap::new();
        map.insert(Arc::clone(&root)).unwrap();
        let message = Message::new(SerializationHeader::new(Id::new(1)), vec![root], map).unwrap();
        assert_eq!(message.root().as_str(), Some("hello"));
        assert_eq!(message.root_id(), Id::new(1));
    }
}
