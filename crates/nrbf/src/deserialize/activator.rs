//! Instance and array creation.

use crate::deserialize::graph::{ArrayObject, Instance};
use crate::deserialize::resolver::TypeHandle;
use crate::error::BoxError;
use crate::model::MemberType;

/// Creates bare instances and arrays before they are populated.
pub trait ObjectActivator {
    /// Creates an unpopulated instance of a resolved type.
    fn create_instance(&self, ty: &TypeHandle) -> Result<Instance, BoxError>;

    /// Creates an array of the given element type and dimension lengths.
    ///
    /// The result must hold exactly the product of `lengths` slots.
    fn create_array(
        &self,
        element: &MemberType,
        lengths: &[usize],
        lower_bounds: &[i32],
    ) -> Result<ArrayObject, BoxError>;
}

/// Activator producing null-filled instances and arrays.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultActivator;

impl ObjectActivator for DefaultActivator {
    fn create_instance(&self, ty: &TypeHandle) -> Result<Instance, BoxError> {
        Ok(Instance::new(ty.clone()))
    }

    fn create_array(
        &self,
        element: &MemberType,
        lengths: &[usize],
        lower_bounds: &[i32],
    ) -> Result<ArrayObject, BoxError> {
        Ok(ArrayObject::new(
            element.clone(),
            lengths.to_vec(),
            lower_bounds.to_vec(),
        ))
    }
}
