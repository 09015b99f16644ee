//! Typed references between objects.

use std::fmt;
use std::marker::PhantomData;

use rusqlite::types::Value;

use super::{ColumnValue, InstanceId};
use crate::error::Result;

/// A reference to an object of type `T`, stored as the target's instance id.
///
/// An unset reference (nil id) is stored as NULL. Deleting the target sets
/// reference columns pointing at it back to NULL.
pub struct Reference<T> {
    id: InstanceId,
    _target: PhantomData<fn() -> T>,
}

impl<T> Reference<T> {
    /// Reference the object with the given id.
    pub fn new(id: InstanceId) -> Self {
        Self {
            id,
            _target: PhantomData,
        }
    }

    /// An unset reference.
    pub fn none() -> Self {
        Self::new(InstanceId::NIL)
    }

    /// Target id. Nil when unset.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Check if the reference points at an object.
    pub fn is_set(&self) -> bool {
        self.id.is_valid()
    }

    /// Clear the reference.
    pub fn clear(&mut self) {
        self.id.reset();
    }
}

impl<T> Clone for Reference<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Reference<T> {}

impl<T> Default for Reference<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> PartialEq for Reference<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Reference<T> {}

impl<T> fmt::Debug for Reference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reference").field(&self.id).finish()
    }
}

impl<T> From<InstanceId> for Reference<T> {
    fn from(id: InstanceId) -> Self {
        Self::new(id)
    }
}

impl<T> ColumnValue for Reference<T> {
    fn to_value(&self) -> Value {
        self.id.to_value()
    }

    fn from_value(value: Value) -> Result<Self> {
        InstanceId::from_value(value).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Target;

    #[test]
    fn test_unset_reference_is_null() {
        let reference = Reference::<Target>::default();
        assert!(!reference.is_set());
        assert_eq!(reference.to_value(), Value::Null);
        assert_eq!(Reference::<Target>::from_value(Value::Null).unwrap(), reference);
    }

    #[test]
    fn test_reference_copies_id() {
        let id = InstanceId::generate();
        let mut reference: Reference<Target> = id.into();
        let copy = reference;
        assert_eq!(copy.id(), id);

        reference.clear();
        assert!(!reference.is_set());
        assert!(copy.is_set());
    }
}
