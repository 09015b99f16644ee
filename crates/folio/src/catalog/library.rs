//! Library: the catalog root.
//!
//! A library owns the SQLite connection, the namespaces and the types. Schema
//! changes take `&mut Library`; compiled queries borrow it immutably.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{debug, info, instrument, warn};

use super::layout::Layout;
use super::tables::{self, PropertyRow, BOOTSTRAP};
use super::{
    validate_name, DataType, GeneratedTables, Namespace, NamespaceKey, Property, TableKind, Type,
    TypeKey,
};
use crate::config::LibraryConfig;
use crate::error::{Error, Result, SchemaError};

/// Catalog root and owner of the backend connection.
#[derive(Debug)]
pub struct Library {
    conn: Connection,
    config: LibraryConfig,
    namespaces: Vec<Namespace>,
    types: Vec<Type>,
}

impl Library {
    /// Create a new library file. Fails if the file exists.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        Self::create_with(LibraryConfig::new(path))
    }

    /// Open an existing library file. Fails if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with(LibraryConfig::new(path))
    }

    /// Open the library file, creating it first if needed. The flag reports
    /// whether it was created.
    pub fn open_or_create(path: impl Into<PathBuf>) -> Result<(Self, bool)> {
        Self::open_or_create_with(LibraryConfig::new(path))
    }

    /// Create a library that lives in memory.
    pub fn in_memory() -> Result<Self> {
        Self::create_with(LibraryConfig::temporary())
    }

    /// Create a new library with the given configuration.
    #[instrument(skip(config), fields(path = %config.path.display(), temporary = config.temporary))]
    pub fn create_with(config: LibraryConfig) -> Result<Self> {
        if !config.temporary && config.path.exists() {
            return Err(Error::LibraryExists(config.path));
        }

        let conn = create_file(&config, bootstrap)?;

        info!("Created library");
        Ok(Self {
            conn,
            config,
            namespaces: Vec::new(),
            types: Vec::new(),
        })
    }

    /// Open an existing library with the given configuration and read its
    /// catalog back.
    #[instrument(skip(config), fields(path = %config.path.display()))]
    pub fn open_with(config: LibraryConfig) -> Result<Self> {
        if config.temporary || !config.path.exists() {
            return Err(Error::LibraryMissing(config.path));
        }

        let conn = connect(&config)?;
        if !tables::catalog_present(&conn)? {
            return Err(Error::CorruptCatalog(format!(
                "{} does not contain a catalog",
                config.path.display()
            )));
        }

        let mut library = Self {
            conn,
            config,
            namespaces: Vec::new(),
            types: Vec::new(),
        };
        library.read_specification()?;

        info!(
            namespaces = library.namespaces.len(),
            types = library.types.len(),
            "Opened library"
        );
        Ok(library)
    }

    /// Open the library, creating it first if needed.
    pub fn open_or_create_with(config: LibraryConfig) -> Result<(Self, bool)> {
        if config.temporary || !config.path.exists() {
            Ok((Self::create_with(config)?, true))
        } else {
            Ok((Self::open_with(config)?, false))
        }
    }

    /// Close the connection, reporting any error SQLite raises on close.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::Sqlite(e))
    }

    /// Configuration the library was opened with.
    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// Path of the library file. Empty for in-memory libraries.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Raw backend connection.
    ///
    /// Writing to generated or catalog tables through this connection
    /// bypasses every invariant the library keeps.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ---- Namespaces ----

    /// Create a namespace. It is written to the catalog immediately.
    pub fn create_namespace(&mut self, name: &str) -> Result<NamespaceKey> {
        validate_name("namespace", name)?;
        if self.find_namespace(name).is_some() {
            return Err(SchemaError::DuplicateNamespace(name.to_string()).into());
        }

        let id = tables::insert_namespace(&self.conn, name)?;
        let key = NamespaceKey(self.namespaces.len());
        self.namespaces.push(Namespace::new(key, id, name.to_string()));

        debug!(namespace = name, id, "Created namespace");
        Ok(key)
    }

    /// Get a namespace.
    ///
    /// # Panics
    ///
    /// Panics if the key was issued by another library.
    pub fn namespace(&self, key: NamespaceKey) -> &Namespace {
        &self.namespaces[key.0]
    }

    /// All namespaces in creation order.
    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// Find a namespace by name.
    pub fn find_namespace(&self, name: &str) -> Option<NamespaceKey> {
        self.namespaces
            .iter()
            .find(|ns| ns.name == name)
            .map(|ns| ns.key)
    }

    /// Look up a namespace by name.
    pub fn namespace_key(&self, name: &str) -> Result<NamespaceKey> {
        self.find_namespace(name)
            .ok_or_else(|| SchemaError::UnknownNamespace(name.to_string()).into())
    }

    // ---- Types ----

    /// Create an uncommitted type inside a namespace.
    ///
    /// Instantiable types get an instance table when committed and may be
    /// referenced. Non-instantiable types can only be nested.
    ///
    /// # Panics
    ///
    /// Panics if the namespace key was issued by another library.
    pub fn create_type(
        &mut self,
        namespace: NamespaceKey,
        name: &str,
        instantiable: bool,
    ) -> Result<TypeKey> {
        validate_name("type", name)?;
        let ns = &self.namespaces[namespace.0];
        if self.find_type(namespace, name).is_some() {
            return Err(SchemaError::DuplicateType {
                namespace: ns.name.clone(),
                name: name.to_string(),
            }
            .into());
        }

        let key = TypeKey(self.types.len());
        let ty = Type::new(key, namespace, &ns.name, name.to_string(), instantiable);
        self.types.push(ty);
        self.namespaces[namespace.0].types.push(key);

        debug!(namespace = %self.namespaces[namespace.0].name, name, instantiable, "Created type");
        Ok(key)
    }

    /// Get a type.
    ///
    /// # Panics
    ///
    /// Panics if the key was issued by another library.
    pub fn ty(&self, key: TypeKey) -> &Type {
        &self.types[key.0]
    }

    /// All types in creation order.
    pub fn types(&self) -> &[Type] {
        &self.types
    }

    /// Find a type by name inside a namespace.
    ///
    /// # Panics
    ///
    /// Panics if the namespace key was issued by another library.
    pub fn find_type(&self, namespace: NamespaceKey, name: &str) -> Option<TypeKey> {
        self.namespaces[namespace.0]
            .types
            .iter()
            .copied()
            .find(|key| self.types[key.0].name == name)
    }

    /// Look up a type by namespace and type name.
    pub fn type_key(&self, namespace: &str, name: &str) -> Result<TypeKey> {
        let ns = self.namespace_key(namespace)?;
        self.find_type(ns, name).ok_or_else(|| {
            SchemaError::UnknownType {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Add a property to an uncommitted type.
    ///
    /// # Panics
    ///
    /// Panics if the type key was issued by another library.
    pub fn add_property(&mut self, key: TypeKey, mut property: Property) -> Result<()> {
        let owner = &self.types[key.0];
        if owner.is_committed() {
            return Err(SchemaError::AlreadyCommitted(owner.qualified_name().to_string()).into());
        }
        validate_name("property", property.name())?;
        if owner.property(property.name()).is_some() {
            return Err(SchemaError::DuplicateProperty {
                type_name: owner.qualified_name().to_string(),
                name: property.name().to_string(),
            }
            .into());
        }
        property.validate_shape()?;
        if let Some(target) = property.data_type().target() {
            if target.0 >= self.types.len() {
                return Err(SchemaError::UnknownType {
                    namespace: self.namespaces[owner.namespace.0].name.clone(),
                    name: format!("#{}", target.0),
                }
                .into());
            }
        }

        property.id = None;
        self.types[key.0].properties.push(property);
        Ok(())
    }

    /// Physical layout of a committed, instantiable type.
    ///
    /// # Panics
    ///
    /// Panics if the type key was issued by another library.
    pub fn layout(&self, key: TypeKey) -> Result<Layout> {
        let ty = &self.types[key.0];
        if !ty.is_committed() {
            return Err(SchemaError::NotCommitted(ty.qualified_name().to_string()).into());
        }
        if !ty.is_instantiable() {
            return Err(SchemaError::NotInstantiable(ty.qualified_name().to_string()).into());
        }
        Ok(Layout::build(&self.types, key)?)
    }

    /// Commit a type: write it to the catalog and, if instantiable, generate
    /// its physical tables.
    ///
    /// Either everything is written or nothing is. On failure the type and
    /// its properties stay uncommitted and the call can be retried.
    ///
    /// # Panics
    ///
    /// Panics if the type key was issued by another library.
    #[instrument(skip(self), fields(type_name = %self.types[key.0].qualified_name()))]
    pub fn commit(&mut self, key: TypeKey) -> Result<()> {
        self.check_commit(key)?;

        let layout = if self.types[key.0].is_instantiable() {
            Some(Layout::build(&self.types, key)?)
        } else {
            None
        };

        let (type_id, property_ids, generated) = match self.write_type(key, layout.as_ref()) {
            Ok(written) => written,
            Err(e) => {
                warn!(error = %e, "Commit rolled back");
                return Err(e);
            }
        };

        let ty = &mut self.types[key.0];
        ty.id = Some(type_id);
        for (property, id) in ty.properties.iter_mut().zip(property_ids) {
            property.id = Some(id);
        }
        ty.tables = generated;

        info!(type_id, tables = ty.tables.all().count(), "Committed type");
        Ok(())
    }

    fn check_commit(&self, key: TypeKey) -> Result<()> {
        let ty = &self.types[key.0];
        if ty.is_committed() {
            return Err(SchemaError::AlreadyCommitted(ty.qualified_name().to_string()).into());
        }
        if ty.properties.is_empty() {
            return Err(SchemaError::NoProperties(ty.qualified_name().to_string()).into());
        }

        for property in &ty.properties {
            let Some(target) = property.data_type().target() else {
                continue;
            };
            let target = &self.types[target.0];
            if !target.is_committed() {
                return Err(SchemaError::UncommittedReference {
                    type_name: ty.qualified_name().to_string(),
                    property: property.name().to_string(),
                    target: target.qualified_name().to_string(),
                }
                .into());
            }
            if property.data_type().is_reference() && !target.is_instantiable() {
                return Err(SchemaError::NotInstantiable(target.qualified_name().to_string()).into());
            }
        }
        Ok(())
    }

    fn write_type(
        &mut self,
        key: TypeKey,
        layout: Option<&Layout>,
    ) -> Result<(i64, Vec<i64>, GeneratedTables)> {
        let ty = &self.types[key.0];
        let namespace_id = self.namespaces[ty.namespace.0].id;
        let tx = self.conn.transaction()?;

        let type_id = tables::insert_type(&tx, namespace_id, &ty.name, ty.instantiable)?;

        let mut property_ids = Vec::with_capacity(ty.properties.len());
        for property in &ty.properties {
            let row = PropertyRow {
                id: 0,
                type_id,
                name: property.name().to_string(),
                datatype: property.data_type().tag().to_string(),
                reference_type: property
                    .data_type()
                    .target()
                    .and_then(|target| self.types[target.0].id),
                is_array: property.is_array(),
                is_blob: property.is_blob(),
            };
            property_ids.push(tables::insert_property(&tx, &row)?);
        }

        let mut generated = GeneratedTables::default();
        if let Some(layout) = layout {
            for ddl in layout.create_statements() {
                if tables::object_exists(&tx, &ddl.name)? {
                    return Err(SchemaError::NameCollision(ddl.name).into());
                }
                debug!(table = %ddl.name, kind = %ddl.kind, sql = %ddl.sql, "Creating table");
                tx.execute_batch(&ddl.sql)?;
                tables::insert_table(&tx, type_id, &ddl.name, ddl.kind.as_str())?;
                generated.attach(ddl.kind, ddl.name);
            }
        }

        tx.commit()?;
        Ok((type_id, property_ids, generated))
    }

    // ---- Read-back ----

    /// Rebuild the namespace, type and property graph from the catalog.
    fn read_specification(&mut self) -> Result<()> {
        let namespace_rows = tables::read_namespaces(&self.conn)?;
        let type_rows = tables::read_types(&self.conn)?;
        let property_rows = tables::read_properties(&self.conn)?;
        let table_rows = tables::read_tables(&self.conn)?;

        let mut namespace_keys = HashMap::with_capacity(namespace_rows.len());
        for row in namespace_rows {
            let key = NamespaceKey(self.namespaces.len());
            self.namespaces.push(Namespace::new(key, row.id, row.name));
            namespace_keys.insert(row.id, key);
        }

        let mut type_keys: HashMap<i64, TypeKey> = HashMap::with_capacity(type_rows.len());
        for row in type_rows {
            let namespace = *namespace_keys.get(&row.namespace).ok_or_else(|| {
                corrupt(format!(
                    "type {} refers to unknown namespace id {}",
                    row.name, row.namespace
                ))
            })?;
            let key = TypeKey(self.types.len());
            let mut ty = Type::new(
                key,
                namespace,
                &self.namespaces[namespace.0].name,
                row.name,
                row.is_instance,
            );
            ty.id = Some(row.id);
            self.types.push(ty);
            self.namespaces[namespace.0].types.push(key);
            type_keys.insert(row.id, key);
        }

        let lookup = |id: i64, what: &str| {
            type_keys
                .get(&id)
                .copied()
                .ok_or_else(|| corrupt(format!("{what} refers to unknown type id {id}")))
        };

        for row in property_rows {
            let owner = lookup(row.type_id, "property")?;
            let target = row
                .reference_type
                .map(|id| lookup(id, "property target"))
                .transpose()?;
            // Targets are always committed before their owners.
            if target.is_some_and(|target| target >= owner) {
                return Err(corrupt(format!(
                    "property {} targets a type committed after its owner",
                    row.name
                )));
            }

            let data_type = DataType::from_tag(&row.datatype, target).ok_or_else(|| {
                corrupt(format!(
                    "property {} has invalid data type {:?}",
                    row.name, row.datatype
                ))
            })?;
            let property =
                Property::from_catalog(row.id, row.name, data_type, row.is_array, row.is_blob);
            property
                .validate_shape()
                .map_err(|e| corrupt(e.to_string()))?;
            self.types[owner.0].properties.push(property);
        }

        for row in table_rows {
            let owner = lookup(row.type_id, "table")?;
            let kind: TableKind = row.kind.parse().map_err(Error::CorruptCatalog)?;
            self.types[owner.0].tables.attach(kind, row.name);
        }

        for index in 0..self.types.len() {
            self.verify_tables(TypeKey(index))?;
        }
        Ok(())
    }

    /// Check that the recorded tables of a type match its layout.
    fn verify_tables(&self, key: TypeKey) -> Result<()> {
        let ty = &self.types[key.0];
        if !ty.is_instantiable() {
            if ty.tables.all().next().is_some() {
                return Err(corrupt(format!(
                    "non-instantiable type {} has generated tables",
                    ty.qualified_name()
                )));
            }
            return Ok(());
        }

        let layout = Layout::build(&self.types, key).map_err(|e| corrupt(e.to_string()))?;
        let mut matches = ty.tables.instance.as_deref() == Some(layout.instance_table.as_str());
        for kind in [
            TableKind::PrimitiveArray,
            TableKind::BlobArray,
            TableKind::ReferenceArray,
        ] {
            matches &= layout
                .satellites_of(kind)
                .map(|s| s.table.as_str())
                .eq(ty.tables.satellites(kind).iter().map(String::as_str));
        }

        if matches {
            Ok(())
        } else {
            Err(corrupt(format!(
                "recorded tables of {} do not match its properties",
                ty.qualified_name()
            )))
        }
    }
}

fn corrupt(message: String) -> Error {
    Error::CorruptCatalog(message)
}

/// Open the connection and apply the configured pragmas.
fn connect(config: &LibraryConfig) -> Result<Connection> {
    let conn = if config.temporary {
        Connection::open_in_memory()?
    } else {
        Connection::open(&config.path)?
    };

    conn.busy_timeout(config.busy_timeout())?;
    conn.set_prepared_statement_cache_capacity(config.statement_cache_capacity);
    conn.execute_batch(&format!(
        "PRAGMA foreign_keys=ON; PRAGMA synchronous={};",
        config.synchronous.as_str()
    ))?;

    let enabled: bool = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
    if !enabled {
        return Err(Error::ForeignKeysUnavailable);
    }

    if !config.temporary {
        let mode: String = conn.query_row(
            &format!("PRAGMA journal_mode={}", config.journal_mode.as_str()),
            [],
            |row| row.get(0),
        )?;
        debug!(journal_mode = %mode, "Connection configured");
    }

    Ok(conn)
}

/// Connect to a new library file and run `init` on it. On any failure the
/// file is removed again, so create can be retried.
fn create_file<F>(config: &LibraryConfig, init: F) -> Result<Connection>
where
    F: FnOnce(&Connection) -> Result<()>,
{
    let created = connect(config).and_then(|conn| {
        init(&conn)?;
        Ok(conn)
    });

    if let Err(e) = &created {
        warn!(error = %e, "Failed to create library");
        if !config.temporary {
            let _ = std::fs::remove_file(&config.path);
        }
    }
    created
}

fn bootstrap(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(BOOTSTRAP)?;
    tx.commit()?;
    Ok(())
}
