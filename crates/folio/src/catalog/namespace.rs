//! Namespaces.

use super::TypeKey;

/// Handle to a namespace owned by a [`Library`](super::Library).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceKey(pub(crate) usize);

/// A uniquely named container of types. Namespaces are written to the
/// catalog as soon as they are created.
#[derive(Debug, Clone)]
pub struct Namespace {
    pub(crate) key: NamespaceKey,
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) types: Vec<TypeKey>,
}

impl Namespace {
    pub(crate) fn new(key: NamespaceKey, id: i64, name: String) -> Self {
        Self {
            key,
            id,
            name,
            types: Vec::new(),
        }
    }

    /// Handle of this namespace.
    pub fn key(&self) -> NamespaceKey {
        self.key
    }

    /// Catalog id.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Namespace name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Types in creation order.
    pub fn types(&self) -> &[TypeKey] {
        &self.types
    }
}
