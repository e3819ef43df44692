//! Array records.

use crate::error::{ReferenceError, ValidationError};
use crate::limits::MAX_ARRAY_RANK;
use crate::model::{
    BinaryArrayType, Id, MemberType, MemberValue, PrimitiveType, PrimitiveValue, Record,
    RecordMap, RecordType,
};

/// Rank, bounds and element type of a BinaryArray record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryArrayShape {
    pub array_type: BinaryArrayType,
    /// Length of each dimension.
    pub lengths: Vec<i32>,
    /// Lower bound of each dimension, present for the offset array types.
    pub lower_bounds: Option<Vec<i32>>,
    pub element: MemberType,
}

impl BinaryArrayShape {
    /// Returns the number of dimensions.
    pub fn rank(&self) -> usize {
        self.lengths.len()
    }

    /// Returns the total slot count, the product of all dimension lengths.
    ///
    /// Returns None if a length is negative or the product overflows.
    pub fn total_length(&self) -> Option<usize> {
        self.lengths.iter().try_fold(1usize, |acc, &len| {
            usize::try_from(len).ok().and_then(|len| acc.checked_mul(len))
        })
    }
}

/// Which array record an [`ArrayRecord`] is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayKind {
    /// ArraySinglePrimitive: a one-dimensional array of raw scalars.
    SinglePrimitive(PrimitiveType),
    /// ArraySingleObject: a one-dimensional `object[]`.
    SingleObject,
    /// ArraySingleString: a one-dimensional `string[]`.
    SingleString,
    /// BinaryArray: any rank, any element type, optional lower bounds.
    Binary(BinaryArrayShape),
}

/// Slots of an array, stored raw for primitive element types.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayItems {
    Primitive(Vec<PrimitiveValue>),
    Values(Vec<MemberValue>),
}

impl ArrayItems {
    pub fn len(&self) -> usize {
        match self {
            ArrayItems::Primitive(items) => items.len(),
            ArrayItems::Values(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An array record with its expanded items.
///
/// The declared length always equals the item count; null runs are expanded
/// into individual [`MemberValue::Null`] slots during decode.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayRecord {
    object_id: Id,
    kind: ArrayKind,
    items: ArrayItems,
}

impl ArrayRecord {
    /// Creates an array record, checking items against the declared length
    /// and element type.
    pub fn new(
        object_id: Id,
        kind: ArrayKind,
        length: usize,
        items: ArrayItems,
    ) -> Result<Self, ValidationError> {
        if items.len() != length {
            return Err(ValidationError::ArrayLengthMismatch {
                id: object_id,
                declared: length,
                actual: items.len(),
            });
        }

        if let ArrayKind::Binary(shape) = &kind {
            if shape.rank() == 0 || shape.rank() > MAX_ARRAY_RANK {
                return Err(ValidationError::ArrayItemsMismatch { id: object_id });
            }
            if let Some(bounds) = &shape.lower_bounds {
                if bounds.len() != shape.rank() || !shape.array_type.has_lower_bounds() {
                    return Err(ValidationError::ArrayItemsMismatch { id: object_id });
                }
            } else if shape.array_type.has_lower_bounds() {
                return Err(ValidationError::ArrayItemsMismatch { id: object_id });
            }
            let total = shape
                .total_length()
                .ok_or(ValidationError::ArrayItemsMismatch { id: object_id })?;
            if total != length {
                return Err(ValidationError::ArrayLengthMismatch {
                    id: object_id,
                    declared: total,
                    actual: length,
                });
            }
        }

        let primitive = match &kind {
            ArrayKind::SinglePrimitive(k) => Some(*k),
            ArrayKind::Binary(shape) => shape.element.inline_primitive(),
            ArrayKind::SingleObject | ArrayKind::SingleString => None,
        };
        match (primitive, &items) {
            (Some(expected), ArrayItems::Primitive(values)) => {
                if let Some(found) = values.iter().map(|v| v.kind()).find(|k| *k != expected) {
                    return Err(ValidationError::PrimitiveKindMismatch { expected, found });
                }
            }
            (None, ArrayItems::Values(_)) => {}
            _ => return Err(ValidationError::ArrayItemsMismatch { id: object_id }),
        }

        Ok(Self {
            object_id,
            kind,
            items,
        })
    }

    pub fn id(&self) -> Id {
        self.object_id
    }

    pub fn kind(&self) -> &ArrayKind {
        &self.kind
    }

    pub fn items(&self) -> &ArrayItems {
        &self.items
    }

    /// Returns the total number of slots.
    pub fn length(&self) -> usize {
        self.items.len()
    }

    /// Returns the number of dimensions.
    pub fn rank(&self) -> usize {
        match &self.kind {
            ArrayKind::Binary(shape) => shape.rank(),
            _ => 1,
        }
    }

    /// Returns the declared element type.
    pub fn element_type(&self) -> MemberType {
        match &self.kind {
            ArrayKind::SinglePrimitive(k) => MemberType::Primitive(*k),
            ArrayKind::SingleObject => MemberType::Object,
            ArrayKind::SingleString => MemberType::String,
            ArrayKind::Binary(shape) => shape.element.clone(),
        }
    }

    /// Returns the wire tag this record is written with.
    pub fn record_type(&self) -> RecordType {
        match &self.kind {
            ArrayKind::SinglePrimitive(_) => RecordType::ArraySinglePrimitive,
            ArrayKind::SingleObject => RecordType::ArraySingleObject,
            ArrayKind::SingleString => RecordType::ArraySingleString,
            ArrayKind::Binary(_) => RecordType::BinaryArray,
        }
    }

    /// Returns the item values of a non-primitive array.
    pub fn values(&self) -> Option<&[MemberValue]> {
        match &self.items {
            ArrayItems::Values(values) => Some(values),
            ArrayItems::Primitive(_) => None,
        }
    }

    /// Returns the raw items of a primitive array.
    pub fn primitives(&self) -> Option<&[PrimitiveValue]> {
        match &self.items {
            ArrayItems::Primitive(values) => Some(values),
            ArrayItems::Values(_) => None,
        }
    }

    /// Reads the items as strings, following member references through `map`.
    pub fn strings<'a>(&'a self, map: &'a RecordMap) -> Result<Vec<Option<&'a str>>, ReferenceError> {
        let values = self.values().ok_or(ReferenceError::UnexpectedRecord {
            id: self.object_id,
            expected: "string array",
            found: self.record_type(),
        })?;

        values
            .iter()
            .map(|value| {
                let record: &'a Record = match value {
                    MemberValue::Null => return Ok(None),
                    MemberValue::Record(record) => &**record,
                    MemberValue::Reference(id) => map.lookup(*id)?,
                    MemberValue::Primitive(_) => {
                        return Err(ReferenceError::UnexpectedRecord {
                            id: self.object_id,
                            expected: "string",
                            found: RecordType::MemberPrimitiveTyped,
                        });
                    }
                };
                record
                    .as_str()
                    .map(Some)
                    .ok_or(ReferenceError::UnexpectedRecord {
                        id: record.id(),
                        expected: "string",
                        found: record.record_type(),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StringRecord;
    use std::sync::Arc;

    #[test]
    fn test_length_mismatch() {
        let result = ArrayRecord::new(
            Id::new(1),
            ArrayKind::SingleObject,
            3,
            ArrayItems::Values(vec![MemberValue::Null, MemberValue::Null]),
        );
        assert!(matches!(
            result,
            Err(ValidationError::ArrayLengthMismatch {
                declared: 3,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_primitive_kind_checked() {
        let result = ArrayRecord::new(
            Id::new(1),
            ArrayKind::SinglePrimitive(PrimitiveType::Int32),
            2,
            ArrayItems::Primitive(vec![PrimitiveValue::Int32(1), PrimitiveValue::Byte(2)]),
        );
        assert!(matches!(
            result,
            Err(ValidationError::PrimitiveKindMismatch {
                expected: PrimitiveType::Int32,
                found: PrimitiveType::Byte,
            })
        ));
    }

    #[test]
    fn test_items_representation_checked() {
        let result = ArrayRecord::new(
            Id::new(1),
            ArrayKind::SingleString,
            0,
            ArrayItems::Primitive(Vec::new()),
        );
        assert!(matches!(result, Err(ValidationError::ArrayItemsMismatch { .. })));
    }

    #[test]
    fn test_rectangular_total_length() {
        let shape = BinaryArrayShape {
            array_type: BinaryArrayType::Rectangular,
            lengths: vec![2, 3],
            lower_bounds: None,
            element: MemberType::Primitive(PrimitiveType::Byte),
        };
        let items = ArrayItems::Primitive((0..6).map(PrimitiveValue::Byte).collect());
        let array = ArrayRecord::new(Id::new(4), ArrayKind::Binary(shape.clone()), 6, items).unwrap();
        assert_eq!(array.rank(), 2);
        assert_eq!(array.record_type(), RecordType::BinaryArray);

        let items = ArrayItems::Primitive((0..5).map(PrimitiveValue::Byte).collect());
        assert!(ArrayRecord::new(Id::new(4), ArrayKind::Binary(shape), 5, items).is_err());
    }

    #[test]
    fn test_offset_requires_bounds() {
        let shape = BinaryArrayShape {
            array_type: BinaryArrayType::SingleOffset,
            lengths: vec![1],
            lower_bounds: None,
            element: MemberType::Object,
        };
        let result = ArrayRecord::new(
            Id::new(1),
            ArrayKind::Binary(shape),
            1,
            ArrayItems::Values(vec![MemberValue::Null]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_strings_follow_references() {
        let shared = Arc::new(Record::String(StringRecord {
            object_id: Id::new(5),
            value: "shared".to_string(),
        }));
        let mut map = RecordMap::new();
        map.insert(Arc::clone(&shared)).unwrap();

        let array = ArrayRecord::new(
            Id::new(1),
            ArrayKind::SingleString,
            3,
            ArrayItems::Values(vec![
                MemberValue::Record(Arc::new(Record::String(StringRecord {
                    object_id: Id::new(6),
                    value: "inline".to_string(),
                }))),
                MemberValue::Null,
                MemberValue::Reference(Id::new(5)),
            ]),
        )
        .unwrap();

        let strings = array.strings(&map).unwrap();
        assert_eq!(strings, vec![Some("inline"), None, Some("shared")]);
    }

    #[test]
    fn test_strings_dangling_reference() {
        let map = RecordMap::new();
        let array = ArrayRecord::new(
            Id::new(1),
            ArrayKind::SingleString,
            1,
            ArrayItems::Values(vec![MemberValue::Reference(Id::new(99))]),
        )
        .unwrap();
        assert!(matches!(
            array.strings(&map),
            Err(ReferenceError::UnknownId { .. })
        ));
    }
}
