//! The live object graph produced by reconstruction.
//!
//! Reference-typed objects live in an arena and are shared through
//! [`ObjectHandle`]s, so two slots that point at the same record point at
//! the same handle. Value types are stored inline in the slots holding them.

use std::fmt;

use uuid::Uuid;

use crate::deserialize::resolver::TypeHandle;
use crate::model::{MemberType, PrimitiveValue};

/// Index of an object in an [`ObjectGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(usize);

impl ObjectHandle {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// The contents of one slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Primitive(PrimitiveValue),
    /// A reference-typed object: class instance, array or string.
    Object(ObjectHandle),
    /// A value-type instance, copied into this slot.
    Struct(Box<Instance>),
    Guid(Uuid),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            Value::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<ObjectHandle> {
        match self {
            Value::Object(handle) => Some(*handle),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Instance> {
        match self {
            Value::Struct(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        self.as_primitive().and_then(PrimitiveValue::as_i32)
    }

    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            Value::Guid(guid) => Some(*guid),
            _ => None,
        }
    }
}

impl From<PrimitiveValue> for Value {
    fn from(value: PrimitiveValue) -> Self {
        Value::Primitive(value)
    }
}

impl From<ObjectHandle> for Value {
    fn from(handle: ObjectHandle) -> Self {
        Value::Object(handle)
    }
}

/// An instance of a resolved class type.
///
/// Fields follow the order of the descriptor's field list.
#[derive(Debug, Clone)]
pub struct Instance {
    ty: TypeHandle,
    fields: Vec<Value>,
}

impl Instance {
    /// Creates an instance with every field null.
    pub fn new(ty: TypeHandle) -> Self {
        let fields = vec![Value::Null; ty.field_names().len()];
        Self { ty, fields }
    }

    pub fn type_handle(&self) -> &TypeHandle {
        &self.ty
    }

    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    /// Returns a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.ty.field_index(name).and_then(|i| self.fields.get(i))
    }

    /// Sets a field by name. Returns false if the type has no such field.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.ty.field_index(name).and_then(|i| self.fields.get_mut(i)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    /// Iterates over (field name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.ty
            .field_names()
            .iter()
            .map(String::as_str)
            .zip(self.fields.iter())
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.ty.name() == other.ty.name()
            && self.ty.library_name() == other.ty.library_name()
            && self.fields == other.fields
    }
}

/// An array object, one or more dimensions stored in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayObject {
    pub element: MemberType,
    pub lengths: Vec<usize>,
    /// Lower bound of each dimension, empty when all are zero.
    pub lower_bounds: Vec<i32>,
    pub items: Vec<Value>,
}

impl ArrayObject {
    /// Creates an array with every slot null.
    pub fn new(element: MemberType, lengths: Vec<usize>, lower_bounds: Vec<i32>) -> Self {
        let total = lengths.iter().product();
        Self {
            element,
            lengths,
            lower_bounds,
            items: vec![Value::Null; total],
        }
    }

    pub fn rank(&self) -> usize {
        self.lengths.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A reference-typed object in the arena.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Instance(Instance),
    Array(ArrayObject),
    String(String),
}

/// The reconstructed graph: an arena of objects plus the root value.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectGraph {
    objects: Vec<Object>,
    root: Value,
}

impl ObjectGraph {
    pub(crate) fn new(objects: Vec<Object>, root: Value) -> Self {
        Self { objects, root }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&Object> {
        self.objects.get(handle.0)
    }

    pub fn instance(&self, handle: ObjectHandle) -> Option<&Instance> {
        match self.get(handle)? {
            Object::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn array(&self, handle: ObjectHandle) -> Option<&ArrayObject> {
        match self.get(handle)? {
            Object::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn string(&self, handle: ObjectHandle) -> Option<&str> {
        match self.get(handle)? {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Follows a value to the class instance it denotes, inline or shared.
    pub fn instance_of<'a>(&'a self, value: &'a Value) -> Option<&'a Instance> {
        match value {
            Value::Object(handle) => self.instance(*handle),
            Value::Struct(instance) => Some(instance),
            _ => None,
        }
    }

    /// Returns a field of the instance a value denotes.
    pub fn field<'a>(&'a self, value: &'a Value, name: &str) -> Option<&'a Value> {
        self.instance_of(value)?.get(name)
    }

    /// Follows a value to the string it denotes.
    pub fn str_of<'a>(&'a self, value: &'a Value) -> Option<&'a str> {
        self.string(value.as_handle()?)
    }

    /// Returns the number of arena objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectHandle, &Object)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(i, object)| (ObjectHandle(i), object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deserialize::resolver::TypeDescriptor;
    use std::sync::Arc;

    #[test]
    fn test_instance_fields() {
        let ty = Arc::new(TypeDescriptor::new("Pair").fields(["X", "Y"]));
        let mut instance = Instance::new(ty);
        assert!(instance.set("Y", Value::Primitive(PrimitiveValue::Int32(2))));
        assert!(!instance.set("Z", Value::Null));
        assert!(instance.get("X").is_some_and(Value::is_null));
        assert_eq!(instance.get("Y").and_then(Value::as_i32), Some(2));

        let names: Vec<&str> = instance.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["X", "Y"]);
    }

    #[test]
    fn test_array_shape() {
        let array = ArrayObject::new(MemberType::Object, vec![2, 3], vec![]);
        assert_eq!(array.rank(), 2);
        assert_eq!(array.len(), 6);
    }

    #[test]
    fn test_graph_navigation() {
        let ty = Arc::new(TypeDescriptor::new("Node").field("Name"));
        let mut node = Instance::new(ty);
        node.set("Name", Value::Object(ObjectHandle(1)));
        let graph = ObjectGraph::new(
            vec![Object::Instance(node), Object::String("a".to_string())],
            Value::Object(ObjectHandle(0)),
        );

        let name = graph.field(graph.root(), "Name").unwrap();
        assert_eq!(graph.str_of(name), Some("a"));
        assert!(graph.array(ObjectHandle(0)).is_none());
        assert!(graph.get(ObjectHandle(5)).is_none());
    }
}
