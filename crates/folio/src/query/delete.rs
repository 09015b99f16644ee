//! Delete query.

use tracing::debug;

use super::binding::Binding;
use crate::catalog::{Library, TypeKey};
use crate::error::{Error, Result};
use crate::object::{InstanceId, Object};

/// Compiled delete of objects of shape `T`.
///
/// Deleting an object removes its satellite rows, clears reference columns
/// that point at it and drops reference array elements that point at it.
pub struct DeleteQuery<'lib, T> {
    binding: Binding<'lib, T>,
}

impl<'lib, T: Object> DeleteQuery<'lib, T> {
    /// Bind `T` to a committed, instantiable type and compile the statements.
    pub fn new(library: &'lib Library, ty: TypeKey) -> Result<Self> {
        Ok(Self {
            binding: Binding::new(library, ty)?,
        })
    }

    /// Delete the object with the given id. Returns whether it existed.
    pub fn delete(&self, id: &InstanceId) -> Result<bool> {
        let id = *id;
        if !id.is_valid() {
            return Err(Error::MissingInstanceId { operation: "delete" });
        }

        let tx = self.binding.connection().unchecked_transaction()?;
        self.binding.delete_satellites(&tx, id)?;
        let removed = self.binding.delete_instance(&tx, id)? > 0;
        tx.commit()?;

        debug!(table = %self.binding.instance_table(), id = %id, removed, "Deleted object");
        Ok(removed)
    }

    /// Delete an object by its own instance id, resetting the id when a
    /// stored object was removed.
    pub fn delete_object(&self, object: &mut T) -> Result<bool> {
        let id = self.binding.id_of(object)?;
        let removed = self.delete(&id)?;
        if removed {
            self.binding.set_id(object, InstanceId::NIL)?;
        }
        Ok(removed)
    }
}
