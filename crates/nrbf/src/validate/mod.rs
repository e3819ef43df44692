//! Reference validation for decoded messages.
//!
//! Decoding checks structure only: a member reference may name an id that
//! never appears, or a record of the wrong kind. These checks walk the
//! record map and report the first such problem without reconstructing
//! anything.

use crate::error::ReferenceError;
use crate::model::{ArrayRecord, ClassRecord, Id, MemberType, MemberValue, Message, Record, RecordMap};

/// Validates every reference in a message.
///
/// - Member and item references resolve to object records (class, array or
///   string), never to a library.
/// - Slots declared as strings, including string-array items, hold strings.
/// - Class member types name registered libraries.
///
/// Records are checked in identifier order so the reported error is stable.
pub fn validate_message(message: &Message) -> Result<(), ReferenceError> {
    let map = message.map();
    let mut ids: Vec<Id> = map.iter().map(|(id, _)| id).collect();
    ids.sort_unstable();

    for id in ids {
        match map.lookup(id)? {
            Record::Class(class) => validate_class(class, map)?,
            Record::Array(array) => validate_array(array, map)?,
            Record::String(_) | Record::Library(_) => {}
        }
    }
    Ok(())
}

fn validate_class(class: &ClassRecord, map: &RecordMap) -> Result<(), ReferenceError> {
    for (_, ty, value) in class.members() {
        if let MemberType::Class(info) = ty {
            map.library(info.library_id)?;
        }
        let record = validate_slot(value, map)?;
        if *ty == MemberType::String {
            expect_string(record)?;
        }
    }
    Ok(())
}

fn validate_array(array: &ArrayRecord, map: &RecordMap) -> Result<(), ReferenceError> {
    let Some(values) = array.values() else {
        return Ok(());
    };
    if array.element_type() == MemberType::String {
        array.strings(map)?;
        return Ok(());
    }
    for value in values {
        validate_slot(value, map)?;
    }
    Ok(())
}

/// Returns the object record a slot denotes, if any.
fn validate_slot<'a>(value: &'a MemberValue, map: &'a RecordMap) -> Result<Option<&'a Record>, ReferenceError> {
    let Some(record) = map.dereference(value)? else {
        return Ok(None);
    };
    if !record.is_object() {
        return Err(ReferenceError::UnexpectedRecord {
            id: record.id(),
            expected: "object",
            found: record.record_type(),
        });
    }
    Ok(Some(record))
}

fn expect_string(record: Option<&Record>) -> Result<(), ReferenceError> {
    match record {
        Some(record) if record.as_str().is_none() => Err(ReferenceError::UnexpectedRecord {
            id: record.id(),
            expected: "string",
            found: record.record_type(),
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MessageBuilder, RecordType};

    #[test]
    fn test_valid_message() {
        let message = MessageBuilder::new(Id::new(1))
            .class(Id::new(1), "Node", |c| {
                c.string("Name", Id::new(2), "a")
                    .reference("Next", MemberType::Object, Id::new(3))
            })
            .string_array(Id::new(3), vec![MemberValue::Reference(Id::new(2)), MemberValue::Null])
            .build()
            .unwrap();
        assert!(validate_message(&message).is_ok());
    }

    #[test]
    fn test_dangling_reference() {
        let message = MessageBuilder::new(Id::new(1))
            .class(Id::new(1), "Node", |c| c.reference("Next", MemberType::Object, Id::new(9)))
            .build()
            .unwrap();
        assert!(matches!(
            validate_message(&message),
            Err(ReferenceError::UnknownId { id }) if id == Id::new(9)
        ));
    }

    #[test]
    fn test_reference_to_library() {
        let message = MessageBuilder::new(Id::new(1))
            .library(Id::new(2), "Lib")
            .class(Id::new(1), "Node", |c| c.reference("Next", MemberType::Object, Id::new(2)))
            .build()
            .unwrap();
        assert!(matches!(
            validate_message(&message),
            Err(ReferenceError::UnexpectedRecord {
                expected: "object",
                found: RecordType::BinaryLibrary,
                ..
            })
        ));
    }

    #[test]
    fn test_string_member_must_be_string() {
        let message = MessageBuilder::new(Id::new(1))
            .class(Id::new(1), "Node", |c| c.reference("Name", MemberType::String, Id::new(2)))
            .object_array(Id::new(2), vec![])
            .build()
            .unwrap();
        assert!(matches!(
            validate_message(&message),
            Err(ReferenceError::UnexpectedRecord {
                expected: "string",
                found: RecordType::ArraySingleObject,
                ..
            })
        ));
    }

    #[test]
    fn test_string_array_items() {
        let message = MessageBuilder::new(Id::new(1))
            .string_array(Id::new(1), vec![MemberValue::Reference(Id::new(2))])
            .object_array(Id::new(2), vec![])
            .build()
            .unwrap();
        assert!(validate_message(&message).is_err());
    }
}
