//! Binding of an object shape to the physical tables of a type.
//!
//! A binding checks the shape once, generates the SQL for every table and
//! warms the connection's statement cache. The CRUD queries run their
//! statements through it.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::catalog::{quote, DataType, Library, TableKind, TypeKey};
use crate::error::{write_error, Error, Result};
use crate::object::{storable, Field, InstanceId, Member, MemberGroups, Object};

/// Statements for the instance table.
#[derive(Debug)]
struct InstanceSql {
    table: String,
    select: String,
    insert: String,
    update: String,
    delete: String,
}

/// Statements for one satellite table.
#[derive(Debug)]
struct SatelliteSql {
    member: usize,
    table: String,
    select: String,
    insert: String,
    delete: String,
}

/// An object shape bound to a committed, instantiable type.
pub(crate) struct Binding<'lib, T> {
    library: &'lib Library,
    type_name: String,
    members: Vec<Member<T>>,
    groups: MemberGroups,
    instance: InstanceSql,
    satellites: Vec<SatelliteSql>,
}

/// A shape matched against the layout of a type.
struct MatchedShape {
    groups: MemberGroups,
    instance_table: String,
    columns: Vec<String>,
    /// Member index and table of each satellite, in member order.
    satellites: Vec<(usize, String)>,
}

/// Match `members` against the layout of `key`.
///
/// Scalar members must line up with the instance columns in order, and the
/// k-th array member of each kind with the k-th attached satellite table of
/// that kind. Reference members are checked against the referenced type.
fn match_shape<T>(library: &Library, key: TypeKey, members: &[Member<T>]) -> Result<MatchedShape> {
    let ty = library.ty(key);
    let layout = library.layout(key)?;
    let mismatch = |message: String| Error::ShapeMismatch {
        type_name: ty.qualified_name().to_string(),
        message,
    };
    let check_target = |member: &Member<T>, data_type: DataType| -> Result<()> {
        if let (Some(check), DataType::Reference(target)) = (member.target(), data_type) {
            check(library, target).map_err(|e| {
                mismatch(format!(
                    "member {:?} does not match the referenced type: {e}",
                    member.name()
                ))
            })?;
        }
        Ok(())
    };

    let groups = MemberGroups::extract(members.iter().map(Member::role)).map_err(mismatch)?;

    let columns = groups.columns();
    if columns.len() != layout.columns.len() {
        return Err(mismatch(format!(
            "{} scalar members for {} columns",
            columns.len(),
            layout.columns.len()
        )));
    }
    for (&index, column) in columns.iter().zip(&layout.columns) {
        let member = &members[index];
        if member.name() != column.name || !member.role().accepts_column(column) {
            return Err(mismatch(format!(
                "member {:?} ({}) does not match column {:?} ({}{})",
                member.name(),
                member.role(),
                column.name,
                column.data_type,
                if column.blob { "*" } else { "" }
            )));
        }
        check_target(member, column.data_type)?;
    }

    let instance_table = layout.instance_table.clone();
    let mut satellites = Vec::new();
    for kind in [
        TableKind::PrimitiveArray,
        TableKind::BlobArray,
        TableKind::ReferenceArray,
    ] {
        let arrays = groups.arrays(kind);
        let attached = ty.tables().satellites(kind);
        if arrays.len() != attached.len() {
            return Err(mismatch(format!(
                "{} {kind} members for {} attached tables",
                arrays.len(),
                attached.len()
            )));
        }
        for (&index, table) in arrays.iter().zip(attached) {
            let member = &members[index];
            let expected = format!("{instance_table}_{}", member.name());
            let spec = layout
                .satellite(member.name())
                .filter(|spec| member.role().accepts_satellite(spec));
            let Some(spec) = spec.filter(|_| *table == expected) else {
                return Err(mismatch(format!(
                    "member {:?} ({}) does not match table {table:?}",
                    member.name(),
                    member.role()
                )));
            };
            check_target(member, spec.data_type)?;
            satellites.push((index, table.clone()));
        }
    }
    satellites.sort_by_key(|(index, _)| *index);

    Ok(MatchedShape {
        groups,
        instance_table,
        columns: layout.columns.into_iter().map(|c| c.name).collect(),
        satellites,
    })
}

/// Check that `T` can be bound to `key`, without compiling anything.
pub(crate) fn check_shape<T: Object>(library: &Library, key: TypeKey) -> Result<()> {
    match_shape(library, key, &T::members()).map(|_| ())
}

impl<'lib, T: Object> Binding<'lib, T> {
    /// Validate `T`'s shape against the layout of `key` and compile the
    /// statements.
    pub(crate) fn new(library: &'lib Library, key: TypeKey) -> Result<Self> {
        let members = T::members();
        let shape = match_shape(library, key, &members)?;

        let column_names: Vec<&str> = shape.columns.iter().map(String::as_str).collect();
        let instance = InstanceSql::new(&shape.instance_table, &column_names);
        let satellites = shape
            .satellites
            .iter()
            .map(|(index, table)| SatelliteSql::new(*index, table))
            .collect();

        let binding = Self {
            library,
            type_name: library.ty(key).qualified_name().to_string(),
            members,
            groups: shape.groups,
            instance,
            satellites,
        };
        binding.prepare()?;
        Ok(binding)
    }

    /// Compile every statement into the connection's cache.
    fn prepare(&self) -> Result<()> {
        let conn = self.connection();
        for sql in [
            &self.instance.select,
            &self.instance.insert,
            &self.instance.update,
            &self.instance.delete,
        ] {
            conn.prepare_cached(sql)?;
        }
        for satellite in &self.satellites {
            for sql in [&satellite.select, &satellite.insert, &satellite.delete] {
                conn.prepare_cached(sql)?;
            }
        }
        Ok(())
    }

    pub(crate) fn connection(&self) -> &'lib Connection {
        self.library.connection()
    }

    pub(crate) fn type_name(&self) -> &str {
        &self.type_name
    }

    pub(crate) fn instance_table(&self) -> &str {
        &self.instance.table
    }

    /// The object's instance id.
    pub(crate) fn id_of(&self, object: &T) -> Result<InstanceId> {
        self.members[self.groups.instance_id()].read_id(object)
    }

    /// Overwrite the object's instance id.
    pub(crate) fn set_id(&self, object: &mut T, id: InstanceId) -> Result<()> {
        self.members[self.groups.instance_id()].write_id(object, id)
    }

    fn column_values(&self, object: &T) -> Result<Vec<Value>> {
        self.groups
            .columns()
            .iter()
            .map(|&index| match self.members[index].read(object) {
                Field::Scalar(value) => storable(self.members[index].name(), value),
                Field::Array(_) => Err(Error::Conversion(format!(
                    "member {:?} produced an array for a column",
                    self.members[index].name()
                ))),
            })
            .collect()
    }

    /// Insert the instance row.
    pub(crate) fn insert_instance(&self, conn: &Connection, id: InstanceId, object: &T) -> Result<()> {
        let mut values = vec![Value::Text(id.to_string())];
        values.extend(self.column_values(object)?);

        conn.prepare_cached(&self.instance.insert)?
            .execute(params_from_iter(values))
            .map_err(|e| write_error(&self.instance.table, e))?;
        Ok(())
    }

    /// Update the instance row. Returns the number of rows changed.
    pub(crate) fn update_instance(&self, conn: &Connection, id: InstanceId, object: &T) -> Result<usize> {
        let mut values = vec![Value::Text(id.to_string())];
        values.extend(self.column_values(object)?);

        conn.prepare_cached(&self.instance.update)?
            .execute(params_from_iter(values))
            .map_err(|e| write_error(&self.instance.table, e))
    }

    /// Delete the instance row. Returns the number of rows removed.
    pub(crate) fn delete_instance(&self, conn: &Connection, id: InstanceId) -> Result<usize> {
        conn.prepare_cached(&self.instance.delete)?
            .execute(params![id.to_string()])
            .map_err(|e| write_error(&self.instance.table, e))
    }

    /// Insert one satellite row per array element, in element order.
    pub(crate) fn insert_satellites(&self, conn: &Connection, id: InstanceId, object: &T) -> Result<()> {
        let uuid = id.to_string();
        for satellite in &self.satellites {
            let member = &self.members[satellite.member];
            let Field::Array(values) = member.read(object) else {
                return Err(Error::Conversion(format!(
                    "member {:?} produced a scalar for an array",
                    member.name()
                )));
            };
            let mut stmt = conn.prepare_cached(&satellite.insert)?;
            for value in values {
                let value = storable(member.name(), value)?;
                stmt.execute(params![uuid, value])
                    .map_err(|e| write_error(&satellite.table, e))?;
            }
        }
        Ok(())
    }

    /// Delete every satellite row owned by `id`.
    pub(crate) fn delete_satellites(&self, conn: &Connection, id: InstanceId) -> Result<()> {
        let uuid = id.to_string();
        for satellite in &self.satellites {
            conn.prepare_cached(&satellite.delete)?
                .execute(params![uuid])
                .map_err(|e| write_error(&satellite.table, e))?;
        }
        Ok(())
    }

    /// Read the instance row and every satellite of `id` into `object`.
    ///
    /// Returns `false` when there is no instance row; the object is left
    /// untouched in that case.
    pub(crate) fn read(&self, conn: &Connection, id: InstanceId, object: &mut T) -> Result<bool> {
        let uuid = id.to_string();
        let width = self.groups.columns().len();

        let row = conn
            .prepare_cached(&self.instance.select)?
            .query_row(params![uuid], |row| {
                (1..=width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .optional()?;
        let Some(values) = row else {
            return Ok(false);
        };

        let mut arrays = Vec::with_capacity(self.satellites.len());
        for satellite in &self.satellites {
            let mut stmt = conn.prepare_cached(&satellite.select)?;
            let elements = stmt
                .query_map(params![uuid], |row| row.get::<_, Value>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            arrays.push((satellite.member, elements));
        }

        self.set_id(object, id)?;
        for (&index, value) in self.groups.columns().iter().zip(values) {
            self.members[index].write(object, Field::Scalar(value))?;
        }
        for (index, elements) in arrays {
            self.members[index].write(object, Field::Array(elements))?;
        }
        Ok(true)
    }
}

impl InstanceSql {
    fn new(table: &str, columns: &[&str]) -> Self {
        let quoted: Vec<String> = columns.iter().map(|c| quote(c)).collect();
        let t = quote(table);
        let uuid = quote("uuid");

        let mut selected = vec![quote("id")];
        selected.extend(quoted.iter().cloned());

        let mut inserted = vec![uuid.clone()];
        inserted.extend(quoted.iter().cloned());
        let placeholders: Vec<String> = (1..=inserted.len()).map(|i| format!("?{i}")).collect();

        let assignments = if quoted.is_empty() {
            format!("{uuid} = ?1")
        } else {
            quoted
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{c} = ?{}", i + 2))
                .collect::<Vec<_>>()
                .join(", ")
        };

        Self {
            table: table.to_string(),
            select: format!("SELECT {} FROM {t} WHERE {uuid} = ?1", selected.join(", ")),
            insert: format!(
                "INSERT INTO {t} ({}) VALUES ({})",
                inserted.join(", "),
                placeholders.join(", ")
            ),
            update: format!("UPDATE {t} SET {assignments} WHERE {uuid} = ?1"),
            delete: format!("DELETE FROM {t} WHERE {uuid} = ?1"),
        }
    }
}

impl SatelliteSql {
    fn new(member: usize, table: &str) -> Self {
        let t = quote(table);
        let instance = quote("instance");
        let value = quote("value");
        Self {
            member,
            table: table.to_string(),
            select: format!(
                "SELECT {value} FROM {t} WHERE {instance} = ?1 ORDER BY {}",
                quote("id")
            ),
            insert: format!("INSERT INTO {t} ({instance}, {value}) VALUES (?1, ?2)"),
            delete: format!("DELETE FROM {t} WHERE {instance} = ?1"),
        }
    }
}
