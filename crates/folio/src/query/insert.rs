//! Insert query.

use tracing::debug;

use super::binding::Binding;
use crate::catalog::{Library, TypeKey};
use crate::error::{Error, Result};
use crate::object::{InstanceId, Object};

/// Compiled insert for objects of shape `T` into one type.
pub struct InsertQuery<'lib, T> {
    binding: Binding<'lib, T>,
}

impl<'lib, T: Object> InsertQuery<'lib, T> {
    /// Bind `T` to a committed, instantiable type and compile the statements.
    pub fn new(library: &'lib Library, ty: TypeKey) -> Result<Self> {
        Ok(Self {
            binding: Binding::new(library, ty)?,
        })
    }

    /// Insert a new object.
    ///
    /// The object must not have an instance id yet. A fresh id is generated,
    /// written into the object and returned. On failure nothing is stored and
    /// the object's id is reset to nil.
    pub fn insert(&self, object: &mut T) -> Result<InstanceId> {
        let current = self.binding.id_of(object)?;
        if current.is_valid() {
            return Err(Error::AlreadyInserted(current));
        }

        let id = InstanceId::generate();
        self.binding.set_id(object, id)?;

        if let Err(e) = self.write(id, object) {
            // Report the write error, not a failed reset.
            let _ = self.binding.set_id(object, InstanceId::NIL);
            debug!(type_name = %self.binding.type_name(), error = %e, "Insert failed");
            return Err(e);
        }

        debug!(type_name = %self.binding.type_name(), id = %id, "Inserted object");
        Ok(id)
    }

    fn write(&self, id: InstanceId, object: &T) -> Result<()> {
        let tx = self.binding.connection().unchecked_transaction()?;
        self.binding.insert_instance(&tx, id, object)?;
        self.binding.insert_satellites(&tx, id, object)?;
        tx.commit()?;
        Ok(())
    }
}
