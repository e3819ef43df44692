//! Class records and the shared shape metadata they carry or reuse.

use std::sync::Arc;

use crate::error::ValidationError;
use crate::model::{Id, MemberType, MemberValue, RecordType};

/// Object identifier, type name and ordered member names of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub object_id: Id,
    pub name: String,
    pub member_names: Vec<String>,
}

/// Everything needed to read a class's member values.
///
/// A shape is created by the first record of a class and shared, not copied,
/// by every later ClassWithId record that names it as metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassShape {
    info: ClassInfo,
    member_types: Vec<MemberType>,
    library_id: Option<Id>,
    typed: bool,
}

impl ClassShape {
    /// Creates a shape with explicit member types.
    ///
    /// `library_id` is `None` for system classes.
    pub fn typed(
        info: ClassInfo,
        member_types: Vec<MemberType>,
        library_id: Option<Id>,
    ) -> Result<Self, ValidationError> {
        if member_types.len() != info.member_names.len() {
            return Err(ValidationError::MemberCountMismatch {
                class: info.name.clone(),
                field: "member types",
                expected: info.member_names.len(),
                actual: member_types.len(),
            });
        }
        Ok(Self {
            info,
            member_types,
            library_id,
            typed: true,
        })
    }

    /// Creates a shape without member type information.
    ///
    /// Every member is read as a self-describing record.
    pub fn untyped(info: ClassInfo, library_id: Option<Id>) -> Self {
        let member_types = vec![MemberType::Object; info.member_names.len()];
        Self {
            info,
            member_types,
            library_id,
            typed: false,
        }
    }

    pub fn info(&self) -> &ClassInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn member_names(&self) -> &[String] {
        &self.info.member_names
    }

    pub fn member_types(&self) -> &[MemberType] {
        &self.member_types
    }

    pub fn library_id(&self) -> Option<Id> {
        self.library_id
    }

    /// Returns true if the shape was declared with member type information.
    pub fn is_typed(&self) -> bool {
        self.typed
    }

    /// Returns the wire tag of a record that declares this shape inline.
    pub fn record_type(&self) -> RecordType {
        match (self.library_id.is_some(), self.typed) {
            (false, false) => RecordType::SystemClassWithMembers,
            (true, false) => RecordType::ClassWithMembers,
            (false, true) => RecordType::SystemClassWithMembersAndTypes,
            (true, true) => RecordType::ClassWithMembersAndTypes,
        }
    }

    /// Returns the index of the member with the given name.
    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.info.member_names.iter().position(|n| n == name)
    }
}

/// A class instance: a shape plus one value per member.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassRecord {
    object_id: Id,
    metadata_id: Option<Id>,
    shape: Arc<ClassShape>,
    values: Vec<MemberValue>,
}

impl ClassRecord {
    /// Creates a record that declares its shape inline.
    ///
    /// The record's identifier is the shape's object identifier.
    pub fn new(shape: Arc<ClassShape>, values: Vec<MemberValue>) -> Result<Self, ValidationError> {
        check_values(&shape, &values)?;
        Ok(Self {
            object_id: shape.info.object_id,
            metadata_id: None,
            shape,
            values,
        })
    }

    /// Creates a ClassWithId record reusing the shape of an earlier record.
    pub fn with_metadata(
        object_id: Id,
        shape: Arc<ClassShape>,
        values: Vec<MemberValue>,
    ) -> Result<Self, ValidationError> {
        check_values(&shape, &values)?;
        Ok(Self {
            object_id,
            metadata_id: Some(shape.info.object_id),
            shape,
            values,
        })
    }

    pub fn id(&self) -> Id {
        self.object_id
    }

    pub fn name(&self) -> &str {
        self.shape.name()
    }

    pub fn shape(&self) -> &Arc<ClassShape> {
        &self.shape
    }

    pub fn member_names(&self) -> &[String] {
        self.shape.member_names()
    }

    pub fn member_types(&self) -> &[MemberType] {
        self.shape.member_types()
    }

    pub fn values(&self) -> &[MemberValue] {
        &self.values
    }

    pub fn library_id(&self) -> Option<Id> {
        self.shape.library_id()
    }

    /// Returns the identifier of the record whose shape this one reuses.
    pub fn metadata_id(&self) -> Option<Id> {
        self.metadata_id
    }

    /// Returns the wire tag this record is written with.
    pub fn record_type(&self) -> RecordType {
        if self.metadata_id.is_some() {
            RecordType::ClassWithId
        } else {
            self.shape.record_type()
        }
    }

    /// Looks up a member value by name.
    pub fn member(&self, name: &str) -> Option<&MemberValue> {
        self.shape.member_index(name).map(|i| &self.values[i])
    }

    /// Iterates over `(name, type, value)` triples in declaration order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &MemberType, &MemberValue)> {
        self.shape
            .member_names()
            .iter()
            .zip(self.shape.member_types())
            .zip(&self.values)
            .map(|((n, t), v)| (n.as_str(), t, v))
    }
}

/// Checks value count and that every primitive-typed slot holds a raw value
/// of the declared kind.
fn check_values(shape: &ClassShape, values: &[MemberValue]) -> Result<(), ValidationError> {
    if values.len() != shape.member_names().len() {
        return Err(ValidationError::MemberCountMismatch {
            class: shape.name().to_string(),
            field: "values",
            expected: shape.member_names().len(),
            actual: values.len(),
        });
    }
    for ((name, ty), value) in shape
        .member_names()
        .iter()
        .zip(shape.member_types())
        .zip(values)
    {
        if let Some(kind) = ty.inline_primitive() {
            let ok = matches!(value, MemberValue::Primitive(p) if p.kind() == kind);
            if !ok {
                return Err(ValidationError::MemberTypeMismatch {
                    class: shape.name().to_string(),
                    member: name.clone(),
                    expected: ty.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PrimitiveType, PrimitiveValue};

    fn pair_shape() -> Arc<ClassShape> {
        Arc::new(
            ClassShape::typed(
                ClassInfo {
                    object_id: Id::new(1),
                    name: "Pair".to_string(),
                    member_names: vec!["X".to_string(), "Y".to_string()],
                },
                vec![
                    MemberType::Primitive(PrimitiveType::Int32),
                    MemberType::Primitive(PrimitiveType::Int32),
                ],
                None,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_member_lookup() {
        let record = ClassRecord::new(
            pair_shape(),
            vec![
                PrimitiveValue::Int32(1).into(),
                PrimitiveValue::Int32(2).into(),
            ],
        )
        .unwrap();
        assert_eq!(record.record_type(), RecordType::SystemClassWithMembersAndTypes);
        assert_eq!(
            record.member("Y"),
            Some(&MemberValue::Primitive(PrimitiveValue::Int32(2)))
        );
        assert!(record.member("Z").is_none());
    }

    #[test]
    fn test_value_count_checked() {
        let result = ClassRecord::new(pair_shape(), vec![PrimitiveValue::Int32(1).into()]);
        assert!(matches!(
            result,
            Err(ValidationError::MemberCountMismatch { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn test_primitive_slot_checked() {
        let result = ClassRecord::new(
            pair_shape(),
            vec![PrimitiveValue::Int32(1).into(), MemberValue::Null],
        );
        assert!(matches!(result, Err(ValidationError::MemberTypeMismatch { .. })));

        let result = ClassRecord::new(
            pair_shape(),
            vec![
                PrimitiveValue::Int32(1).into(),
                PrimitiveValue::Int64(2).into(),
            ],
        );
        assert!(matches!(result, Err(ValidationError::MemberTypeMismatch { .. })));
    }

    #[test]
    fn test_metadata_reuse_shares_shape() {
        let shape = pair_shape();
        let values = vec![
            PrimitiveValue::Int32(3).into(),
            PrimitiveValue::Int32(4).into(),
        ];
        let record = ClassRecord::with_metadata(Id::new(9), Arc::clone(&shape), values).unwrap();
        assert_eq!(record.id(), Id::new(9));
        assert_eq!(record.metadata_id(), Some(Id::new(1)));
        assert_eq!(record.record_type(), RecordType::ClassWithId);
        assert!(Arc::ptr_eq(record.shape(), &shape));
    }

    #[test]
    fn test_untyped_record_type() {
        let shape = ClassShape::untyped(
            ClassInfo {
                object_id: Id::new(1),
                name: "Legacy".to_string(),
                member_names: vec!["a".to_string()],
            },
            Some(Id::new(2)),
        );
        assert_eq!(shape.record_type(), RecordType::ClassWithMembers);
        assert_eq!(shape.member_types(), &[MemberType::Object]);
    }
}
