//! Type definitions.

use std::fmt;
use std::str::FromStr;

use super::{NamespaceKey, Property};

/// Handle to a type owned by a [`Library`](super::Library).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(pub(crate) usize);

/// Kind of a generated physical table, as stored in the `tables` catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// One row per object.
    Instance,
    /// Elements of a primitive or string array.
    PrimitiveArray,
    /// Elements of a blob array.
    BlobArray,
    /// Elements of a reference array.
    ReferenceArray,
}

impl TableKind {
    /// Catalog spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Instance => "instance",
            TableKind::PrimitiveArray => "primitive_array",
            TableKind::BlobArray => "blob_array",
            TableKind::ReferenceArray => "reference_array",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instance" => Ok(TableKind::Instance),
            "primitive_array" => Ok(TableKind::PrimitiveArray),
            "blob_array" => Ok(TableKind::BlobArray),
            "reference_array" => Ok(TableKind::ReferenceArray),
            other => Err(format!("unknown table kind {other:?}")),
        }
    }
}

/// Physical tables attached to a committed, instantiable type.
///
/// Satellite lists keep generation order, which is the order of the array
/// members in the type's flattened layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedTables {
    /// Instance table.
    pub instance: Option<String>,
    /// Primitive and string array satellites.
    pub primitive_arrays: Vec<String>,
    /// Blob array satellites.
    pub blob_arrays: Vec<String>,
    /// Reference array satellites.
    pub reference_arrays: Vec<String>,
}

impl GeneratedTables {
    /// Record a table under its kind.
    pub(crate) fn attach(&mut self, kind: TableKind, name: String) {
        match kind {
            TableKind::Instance => self.instance = Some(name),
            TableKind::PrimitiveArray => self.primitive_arrays.push(name),
            TableKind::BlobArray => self.blob_arrays.push(name),
            TableKind::ReferenceArray => self.reference_arrays.push(name),
        }
    }

    /// Satellites of one kind.
    pub fn satellites(&self, kind: TableKind) -> &[String] {
        match kind {
            TableKind::Instance => &[],
            TableKind::PrimitiveArray => &self.primitive_arrays,
            TableKind::BlobArray => &self.blob_arrays,
            TableKind::ReferenceArray => &self.reference_arrays,
        }
    }

    /// Every table, instance table first.
    pub fn all(&self) -> impl Iterator<Item = &String> {
        self.instance
            .iter()
            .chain(&self.primitive_arrays)
            .chain(&self.blob_arrays)
            .chain(&self.reference_arrays)
    }
}

/// An ordered, named collection of properties inside a namespace.
#[derive(Debug, Clone)]
pub struct Type {
    pub(crate) key: TypeKey,
    pub(crate) namespace: NamespaceKey,
    pub(crate) qualified_name: String,
    pub(crate) instance_table: String,
    pub(crate) name: String,
    pub(crate) instantiable: bool,
    pub(crate) properties: Vec<Property>,
    pub(crate) id: Option<i64>,
    pub(crate) tables: GeneratedTables,
}

impl Type {
    pub(crate) fn new(
        key: TypeKey,
        namespace: NamespaceKey,
        namespace_name: &str,
        name: String,
        instantiable: bool,
    ) -> Self {
        Self {
            key,
            namespace,
            qualified_name: format!("{namespace_name}::{name}"),
            instance_table: format!("{namespace_name}_{name}"),
            name,
            instantiable,
            properties: Vec::new(),
            id: None,
            tables: GeneratedTables::default(),
        }
    }

    /// Handle of this type.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Owning namespace.
    pub fn namespace(&self) -> NamespaceKey {
        self.namespace
    }

    /// Type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `namespace::name`, used in messages.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Name of the instance table, `<namespace>_<type>`. Only instantiable
    /// types actually get this table.
    pub fn instance_table_name(&self) -> &str {
        &self.instance_table
    }

    /// Check if the type gets an instance table.
    pub fn is_instantiable(&self) -> bool {
        self.instantiable
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Get a property by name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Catalog id, set once committed.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Check if the type has been committed.
    pub fn is_committed(&self) -> bool {
        self.id.is_some()
    }

    /// Generated physical tables. Empty until committed.
    pub fn tables(&self) -> &GeneratedTables {
        &self.tables
    }
}
