//! Type descriptors and the resolver boundary.
//!
//! Decoding never needs a type system. Reconstruction maps each class
//! record's (library, class) name pair to a [`TypeDescriptor`] through an
//! injected [`TypeResolver`].

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::deserialize::graph::{Instance, Value};
use crate::deserialize::info::MemberInfo;
use crate::error::BoxError;

/// Shared handle to a resolved type.
pub type TypeHandle = Arc<TypeDescriptor>;

/// Whether instances are aliased or copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Instances live in the graph arena and are shared by reference.
    Reference,
    /// Instances are copied into every slot that holds them.
    Value,
}

/// Constructor-like population contract consuming the named-value view.
pub trait PopulateObject: Send + Sync {
    /// Fills a freshly activated instance from its members. Called once.
    fn populate(&self, instance: &mut Instance, info: &MemberInfo) -> Result<(), BoxError>;

    /// Called when a deferred member value arrives after [`populate`](Self::populate).
    ///
    /// `info` already holds the new value. Only reference types see this;
    /// value types are populated once all their members are known.
    fn member_updated(
        &self,
        instance: &mut Instance,
        name: &str,
        value: &Value,
        info: &MemberInfo,
    ) -> Result<(), BoxError> {
        let _ = (instance, name, value, info);
        Ok(())
    }
}

/// How an activated instance receives its member values.
#[derive(Clone)]
pub enum Population {
    /// Record members are assigned to the descriptor fields of the same name.
    Fields,
    /// A custom contract is invoked with the named-value view.
    Custom(Arc<dyn PopulateObject>),
    /// No contract. The type can only be reconstructed through a surrogate.
    None,
}

impl fmt::Debug for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Population::Fields => f.write_str("Fields"),
            Population::Custom(_) => f.write_str("Custom(..)"),
            Population::None => f.write_str("None"),
        }
    }
}

/// A type the reconstruction engine may instantiate.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    library: Option<String>,
    kind: TypeKind,
    fields: Vec<String>,
    population: Population,
}

impl TypeDescriptor {
    /// Creates a reference type populated field by field, with no fields and
    /// no library (a system type).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            library: None,
            kind: TypeKind::Reference,
            fields: Vec::new(),
            population: Population::Fields,
        }
    }

    /// Sets the library (assembly) the type lives in.
    pub fn library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    /// Marks the type as a value type.
    pub fn value_type(mut self) -> Self {
        self.kind = TypeKind::Value;
        self
    }

    /// Adds a field.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    /// Adds several fields.
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(names.into_iter().map(Into::into));
        self
    }

    /// Uses a custom population contract.
    pub fn populate_with(mut self, populate: Arc<dyn PopulateObject>) -> Self {
        self.population = Population::Custom(populate);
        self
    }

    /// Removes the population contract.
    pub fn without_population(mut self) -> Self {
        self.population = Population::None;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn library_name(&self) -> Option<&str> {
        self.library.as_deref()
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_value_type(&self) -> bool {
        self.kind == TypeKind::Value
    }

    pub fn field_names(&self) -> &[String] {
        &self.fields
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Returns the position of a field.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }
}

/// The name pair a class record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeName<'a> {
    /// Library name, or None for system classes.
    pub library: Option<&'a str>,
    pub class: &'a str,
}

impl fmt::Display for TypeName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.library {
            Some(library) => write!(f, "{}, {}", self.class, library),
            None => f.write_str(self.class),
        }
    }
}

/// Library name matching strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NameMatching {
    /// Library names must be equal.
    #[default]
    Exact,
    /// Only the simple library name (text before the first comma) must match,
    /// ignoring version, culture and key token.
    Simple,
}

impl NameMatching {
    /// Returns true if two library names match under this policy.
    pub fn matches(self, a: &str, b: &str) -> bool {
        match self {
            NameMatching::Exact => a == b,
            NameMatching::Simple => simple_name(a) == simple_name(b),
        }
    }
}

/// Returns the simple name of a full library name.
pub fn simple_name(library: &str) -> &str {
    library.split(',').next().unwrap_or(library).trim()
}

/// Maps class records to instantiable types.
pub trait TypeResolver {
    /// Returns the type for a name pair, or None if it is unknown.
    fn resolve(&self, name: &TypeName<'_>, matching: NameMatching) -> Option<TypeHandle>;
}

/// A [`TypeResolver`] backed by explicitly registered descriptors.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: FxHashMap<String, Vec<TypeHandle>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type and returns its handle.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> TypeHandle {
        let handle = Arc::new(descriptor);
        self.types
            .entry(handle.name.clone())
            .or_default()
            .push(handle.clone());
        handle
    }

    /// Registers a type, builder style.
    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    pub fn len(&self) -> usize {
        self.types.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeResolver for TypeRegistry {
    fn resolve(&self, name: &TypeName<'_>, matching: NameMatching) -> Option<TypeHandle> {
        self.types
            .get(name.class)?
            .iter()
            .find(|ty| match (ty.library.as_deref(), name.library) {
                (None, None) => true,
                (Some(want), Some(have)) => matching.matches(want, have),
                _ => false,
            })
            .cloned()
    }
}
