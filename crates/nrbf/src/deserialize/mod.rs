//! Object graph reconstruction.
//!
//! Turns a decoded [`Message`] into live objects, resolving class records
//! through a [`TypeResolver`]. Reconstruction is one-shot: build a
//! [`Deserializer`], configure it, and call [`Deserializer::deserialize`].
//!
//! ```
//! use nrbf::deserialize::{Deserializer, TypeDescriptor, TypeRegistry};
//! use nrbf::model::{Id, MessageBuilder};
//!
//! let message = MessageBuilder::new(Id::new(1))
//!     .class(Id::new(1), "Pair", |c| c.int32("X", 1).int32("Y", 2))
//!     .build()
//!     .unwrap();
//!
//! let types = TypeRegistry::new().with(TypeDescriptor::new("Pair").fields(["X", "Y"]));
//! let graph = Deserializer::new(&message, &types).deserialize().unwrap();
//!
//! assert_eq!(graph.field(graph.root(), "Y").and_then(|v| v.as_i32()), Some(2));
//! ```

pub mod activator;
mod engine;
pub mod graph;
pub mod info;
pub mod resolver;
pub mod surrogate;
pub mod system;

use tracing::{debug, instrument};

use crate::error::DeserializeError;
use crate::limits::DEFAULT_MAX_GRAPH_DEPTH;
use crate::model::Message;

pub use activator::{DefaultActivator, ObjectActivator};
use engine::Engine;
pub use graph::{ArrayObject, Instance, Object, ObjectGraph, ObjectHandle, Value};
pub use info::MemberInfo;
pub use resolver::{
    NameMatching, Population, PopulateObject, TypeDescriptor, TypeHandle, TypeKind, TypeName,
    TypeRegistry, TypeResolver,
};
pub use surrogate::{
    SerializationSurrogate, SurrogateRegistry, SurrogateResult, SurrogateSelector,
    SurrogateTarget,
};

/// Reconstruction settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeserializeOptions {
    /// How library names of class records are matched against descriptors.
    pub name_matching: NameMatching,

    /// Reject records lacking data for a descriptor field instead of leaving
    /// the field null.
    pub require_field_data: bool,

    /// Maximum materialization recursion. Deeper identifiers are deferred to
    /// a work queue.
    pub max_depth: usize,
}

impl Default for DeserializeOptions {
    fn default() -> Self {
        Self {
            name_matching: NameMatching::Exact,
            require_field_data: false,
            max_depth: DEFAULT_MAX_GRAPH_DEPTH,
        }
    }
}

impl DeserializeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name_matching(mut self, name_matching: NameMatching) -> Self {
        self.name_matching = name_matching;
        self
    }

    pub fn with_require_field_data(mut self, require: bool) -> Self {
        self.require_field_data = require;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// One-shot reconstruction of a message into an [`ObjectGraph`].
pub struct Deserializer<'a> {
    message: &'a Message,
    resolver: &'a dyn TypeResolver,
    activator: &'a dyn ObjectActivator,
    surrogates: Option<&'a dyn SurrogateSelector>,
    options: DeserializeOptions,
}

impl<'a> Deserializer<'a> {
    /// Creates a deserializer with the default activator, no surrogates and
    /// default options.
    pub fn new(message: &'a Message, resolver: &'a dyn TypeResolver) -> Self {
        Self {
            message,
            resolver,
            activator: &DefaultActivator,
            surrogates: None,
            options: DeserializeOptions::default(),
        }
    }

    pub fn with_activator(mut self, activator: &'a dyn ObjectActivator) -> Self {
        self.activator = activator;
        self
    }

    pub fn with_surrogates(mut self, surrogates: &'a dyn SurrogateSelector) -> Self {
        self.surrogates = Some(surrogates);
        self
    }

    pub fn with_options(mut self, options: DeserializeOptions) -> Self {
        self.options = options;
        self
    }

    /// Materializes the graph reachable from the message root.
    #[instrument(level = "debug", skip_all)]
    pub fn deserialize(self) -> Result<ObjectGraph, DeserializeError> {
        let root = self.message.root_id();
        debug!(root = root.get(), records = self.message.map().len(), "reconstruction started");

        let engine = Engine::new(
            self.message.map(),
            self.resolver,
            self.activator,
            self.surrogates,
            &self.options,
        );
        let graph = engine.run(root)?;

        debug!(objects = graph.len(), "reconstruction finished");
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ReferenceError};
    use crate::model::{Id, MemberType, MessageBuilder, PrimitiveValue};
    use std::sync::Arc;

    fn node_types() -> TypeRegistry {
        TypeRegistry::new().with(TypeDescriptor::new("Node").fields(["Name", "Next"]))
    }

    #[test]
    fn test_cycle_shares_instances() {
        let message = MessageBuilder::new(Id::new(1))
            .class(Id::new(1), "Node", |c| {
                c.string("Name", Id::new(3), "a")
                    .reference("Next", MemberType::Object, Id::new(2))
            })
            .class(Id::new(2), "Node", |c| {
                c.string("Name", Id::new(4), "b")
                    .reference("Next", MemberType::Object, Id::new(1))
            })
            .build()
            .unwrap();

        let graph = Deserializer::new(&message, &node_types()).deserialize().unwrap();
        let a = graph.root().as_handle().unwrap();
        let next = graph.field(graph.root(), "Next").unwrap();
        assert_eq!(graph.str_of(graph.field(next, "Name").unwrap()), Some("b"));
        assert_eq!(graph.field(next, "Next").unwrap().as_handle(), Some(a));
        assert_eq!(graph.len(), 4);
    }

    #[test]
    fn test_shared_reference_identity() {
        let message = MessageBuilder::new(Id::new(1))
            .object_array(
                Id::new(1),
                vec![
                    crate::model::MemberValue::Reference(Id::new(2)),
                    crate::model::MemberValue::Reference(Id::new(2)),
                ],
            )
            .string(Id::new(2), "shared")
            .build()
            .unwrap();

        let graph = Deserializer::new(&message, &TypeRegistry::new()).deserialize().unwrap();
        let array = graph.array(graph.root().as_handle().unwrap()).unwrap();
        assert_eq!(array.items[0], array.items[1]);
        assert_eq!(graph.str_of(&array.items[0]), Some("shared"));
    }

    #[test]
    fn test_value_type_chain() {
        // W (value) -> O (reference) -> V (value) -> W
        let types = TypeRegistry::new()
            .with(TypeDescriptor::new("W").value_type().fields(["Tag", "O"]))
            .with(TypeDescriptor::new("O").field("V"))
            .with(TypeDescriptor::new("V").value_type().field("W"));
        let message = MessageBuilder::new(Id::new(1))
            .class(Id::new(1), "W", |c| {
                c.int32("Tag", 7).reference("O", MemberType::Object, Id::new(2))
            })
            .class(Id::new(2), "O", |c| c.reference("V", MemberType::Object, Id::new(3)))
            .class(Id::new(3), "V", |c| c.reference("W", MemberType::Object, Id::new(1)))
            .build()
            .unwrap();

        let graph = Deserializer::new(&message, &types).deserialize().unwrap();
        let w = graph.root();
        assert!(w.as_struct().is_some());
        let o = graph.field(w, "O").unwrap();
        let v = graph.field(o, "V").unwrap();
        let inner_w = graph.field(v, "W").unwrap();
        assert_eq!(graph.field(inner_w, "Tag").and_then(Value::as_i32), Some(7));
        assert_eq!(graph.field(inner_w, "O").unwrap().as_handle(), o.as_handle());
    }

    #[test]
    fn test_value_type_cycle_unresolved() {
        let types = TypeRegistry::new()
            .with(TypeDescriptor::new("A").value_type().field("B"))
            .with(TypeDescriptor::new("B").value_type().field("A"));
        let message = MessageBuilder::new(Id::new(1))
            .class(Id::new(1), "A", |c| c.reference("B", MemberType::Object, Id::new(2)))
            .class(Id::new(2), "B", |c| c.reference("A", MemberType::Object, Id::new(1)))
            .build()
            .unwrap();

        let err = Deserializer::new(&message, &types).deserialize().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Reference);
        assert!(matches!(
            err,
            DeserializeError::Reference(ReferenceError::UnresolvedFixups { count: 2, .. })
        ));
    }

    #[test]
    fn test_unknown_reference() {
        let message = MessageBuilder::new(Id::new(1))
            .class(Id::new(1), "Node", |c| {
                c.null("Name", MemberType::String)
                    .reference("Next", MemberType::Object, Id::new(9))
            })
            .build()
            .unwrap();
        assert!(matches!(
            Deserializer::new(&message, &node_types()).deserialize(),
            Err(DeserializeError::Reference(ReferenceError::UnknownId { .. }))
        ));
    }

    #[test]
    fn test_depth_limit_defers_to_queue() {
        let mut builder = MessageBuilder::new(Id::new(1));
        for i in 1..=200 {
            builder = builder.class(Id::new(i), "Node", |c| {
                let c = c.null("Name", MemberType::String);
                if i < 200 {
                    c.reference("Next", MemberType::Object, Id::new(i + 1))
                } else {
                    c.null("Next", MemberType::Object)
                }
            });
        }
        let message = builder.build().unwrap();

        let graph = Deserializer::new(&message, &node_types())
            .with_options(DeserializeOptions::new().with_max_depth(8))
            .deserialize()
            .unwrap();

        let mut current = graph.root().clone();
        let mut count = 1;
        while let Some(next) = graph.field(&current, "Next").filter(|v| !v.is_null()) {
            current = next.clone();
            count += 1;
        }
        assert_eq!(count, 200);
    }

    #[test]
    fn test_primitive_array() {
        let message = MessageBuilder::new(Id::new(1))
            .primitive_array(
                Id::new(1),
                crate::model::PrimitiveType::Int32,
                vec![PrimitiveValue::Int32(4), PrimitiveValue::Int32(5)],
            )
            .build()
            .unwrap();
        let graph = Deserializer::new(&message, &TypeRegistry::new()).deserialize().unwrap();
        let array = graph.array(graph.root().as_handle().unwrap()).unwrap();
        assert_eq!(array.items[1].as_i32(), Some(5));
        assert_eq!(array.lengths, [2]);
    }

    struct ShortActivator;

    impl ObjectActivator for ShortActivator {
        fn create_instance(&self, ty: &TypeHandle) -> Result<Instance, crate::error::BoxError> {
            Ok(Instance::new(Arc::clone(ty)))
        }

        fn create_array(
            &self,
            element: &MemberType,
            _lengths: &[usize],
            _lower_bounds: &[i32],
        ) -> Result<ArrayObject, crate::error::BoxError> {
            Ok(ArrayObject::new(element.clone(), vec![1], Vec::new()))
        }
    }

    #[test]
    fn test_activator_array_shape_checked() {
        let message = MessageBuilder::new(Id::new(1))
            .object_array(Id::new(1), vec![crate::model::MemberValue::Null; 3])
            .build()
            .unwrap();
        assert!(matches!(
            Deserializer::new(&message, &TypeRegistry::new())
                .with_activator(&ShortActivator)
                .deserialize(),
            Err(DeserializeError::ArrayShapeMismatch {
                expected: 3,
                actual: 1
            })
        ));
    }
}
