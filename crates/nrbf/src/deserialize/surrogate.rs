//! Surrogates: external replacements for a type's population step.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::deserialize::graph::{Instance, ObjectHandle, Value};
use crate::deserialize::info::MemberInfo;
use crate::deserialize::resolver::TypeDescriptor;
use crate::error::BoxError;

/// The instance a surrogate populates.
pub struct SurrogateTarget<'a> {
    /// Arena handle for reference types, None for value types.
    pub handle: Option<ObjectHandle>,
    pub instance: &'a mut Instance,
}

/// What a surrogate hands back after populating.
#[derive(Debug, Clone, PartialEq)]
pub enum SurrogateResult {
    /// Keep the instance that was passed in.
    Keep,
    /// Use this value instead. Only value types may be replaced; a reference
    /// type may only "replace" itself with its own handle.
    Replace(Value),
}

/// Populates instances of one type in place of its own contract.
pub trait SerializationSurrogate: Send + Sync {
    fn set_object_data(
        &self,
        target: SurrogateTarget<'_>,
        info: &MemberInfo,
    ) -> Result<SurrogateResult, BoxError>;

    /// Called when a deferred member value arrives after population of a
    /// reference type.
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

/// Picks the surrogate, if any, for a resolved type.
pub trait SurrogateSelector {
    fn surrogate_for(&self, ty: &TypeDescriptor) -> Option<Arc<dyn SerializationSurrogate>>;
}

/// A [`SurrogateSelector`] keyed by type name.
#[derive(Clone, Default)]
pub struct SurrogateRegistry {
    surrogates: FxHashMap<String, Arc<dyn SerializationSurrogate>>,
}

impl SurrogateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a surrogate for every type named `type_name`.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        surrogate: Arc<dyn SerializationSurrogate>,
    ) {
        self.surrogates.insert(type_name.into(), surrogate);
    }

    pub fn with(
        mut self,
        type_name: impl Into<String>,
        surrogate: Arc<dyn SerializationSurrogate>,
    ) -> Self {
        self.register(type_name, surrogate);
        self
    }

    pub fn len(&self) -> usize {
        self.surrogates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surrogates.is_empty()
    }
}

impl fmt::Debug for SurrogateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.surrogates.keys()).finish()
    }
}

impl SurrogateSelector for SurrogateRegistry {
    fn surrogate_for(&self, ty: &TypeDescriptor) -> Option<Arc<dyn SerializationSurrogate>> {
        self.surrogates.get(ty.name()).cloned()
    }
}
