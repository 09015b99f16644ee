//! Update query.

use tracing::debug;

use super::binding::Binding;
use crate::catalog::{Library, TypeKey};
use crate::error::{Error, Result};
use crate::object::Object;

/// Compiled full-replace update of objects of shape `T`.
pub struct UpdateQuery<'lib, T> {
    binding: Binding<'lib, T>,
}

impl<'lib, T: Object> UpdateQuery<'lib, T> {
    /// Bind `T` to a committed, instantiable type and compile the statements.
    pub fn new(library: &'lib Library, ty: TypeKey) -> Result<Self> {
        Ok(Self {
            binding: Binding::new(library, ty)?,
        })
    }

    /// Replace the stored state of an object with its in-memory state.
    ///
    /// Every array is rewritten. Returns `false`, with nothing changed, when
    /// no object with the instance id is stored.
    pub fn update(&self, object: &T) -> Result<bool> {
        let id = self.binding.id_of(object)?;
        if !id.is_valid() {
            return Err(Error::MissingInstanceId { operation: "update" });
        }

        let tx = self.binding.connection().unchecked_transaction()?;
        self.binding.delete_satellites(&tx, id)?;
        if self.binding.update_instance(&tx, id, object)? == 0 {
            debug!(table = %self.binding.instance_table(), id = %id, "No object to update");
            return Ok(false);
        }
        self.binding.insert_satellites(&tx, id, object)?;
        tx.commit()?;

        debug!(table = %self.binding.instance_table(), id = %id, "Updated object");
        Ok(true)
    }
}
