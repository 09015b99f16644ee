//! Get query.

use tracing::debug;

use super::binding::Binding;
use crate::catalog::{Library, TypeKey};
use crate::error::{Error, Result};
use crate::object::{InstanceId, Object};

/// Compiled read of objects of shape `T` from one type.
pub struct GetQuery<'lib, T> {
    binding: Binding<'lib, T>,
}

impl<'lib, T: Object> GetQuery<'lib, T> {
    /// Bind `T` to a committed, instantiable type and compile the statements.
    pub fn new(library: &'lib Library, ty: TypeKey) -> Result<Self> {
        Ok(Self {
            binding: Binding::new(library, ty)?,
        })
    }

    /// Load the object with the given id.
    pub fn get(&self, id: &InstanceId) -> Result<T>
    where
        T: Default,
    {
        let mut object = T::default();
        self.read(*id, &mut object)?;
        Ok(object)
    }

    /// Reload an object in place from its own instance id. Arrays are
    /// replaced, not appended to.
    pub fn get_into(&self, object: &mut T) -> Result<()> {
        let id = self.binding.id_of(object)?;
        self.read(id, object)
    }

    fn read(&self, id: InstanceId, object: &mut T) -> Result<()> {
        if !id.is_valid() {
            return Err(Error::MissingInstanceId { operation: "get" });
        }

        let tx = self.binding.connection().unchecked_transaction()?;
        let found = self.binding.read(&tx, id, object)?;
        tx.commit()?;

        if !found {
            return Err(Error::NotFound {
                table: self.binding.instance_table().to_string(),
                id,
            });
        }

        debug!(table = %self.binding.instance_table(), id = %id, "Loaded object");
        Ok(())
    }
}
