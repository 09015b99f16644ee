//! Fixed catalog tables and their rows.

use rusqlite::{params, Connection, OptionalExtension};

/// Catalog schema created when a library is bootstrapped.
pub(crate) const BOOTSTRAP: &str = r#"
CREATE TABLE namespaces (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE types (
    id INTEGER PRIMARY KEY,
    namespace INTEGER NOT NULL REFERENCES namespaces(id) ON DELETE RESTRICT,
    name TEXT NOT NULL,
    is_instance INTEGER NOT NULL,
    UNIQUE (namespace, name)
);

CREATE TABLE properties (
    id INTEGER PRIMARY KEY,
    type INTEGER NOT NULL REFERENCES types(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    datatype TEXT NOT NULL,
    reference_type INTEGER REFERENCES types(id) ON DELETE RESTRICT,
    is_array INTEGER NOT NULL,
    is_blob INTEGER NOT NULL,
    UNIQUE (type, name)
);

CREATE TABLE tables (
    id INTEGER PRIMARY KEY,
    type INTEGER NOT NULL REFERENCES types(id) ON DELETE CASCADE,
    name TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL
);
"#;

/// Catalog table names, in dependency order.
pub(crate) const CATALOG_TABLES: [&str; 4] = ["namespaces", "types", "properties", "tables"];

#[derive(Debug, Clone)]
pub(crate) struct NamespaceRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub(crate) struct TypeRow {
    pub id: i64,
    pub namespace: i64,
    pub name: String,
    pub is_instance: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct PropertyRow {
    pub id: i64,
    pub type_id: i64,
    pub name: String,
    pub datatype: String,
    pub reference_type: Option<i64>,
    pub is_array: bool,
    pub is_blob: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct TableRow {
    pub type_id: i64,
    pub name: String,
    pub kind: String,
}

pub(crate) fn read_namespaces(conn: &Connection) -> rusqlite::Result<Vec<NamespaceRow>> {
    let mut stmt = conn.prepare("SELECT id, name FROM namespaces ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(NamespaceRow {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    rows.collect()
}

pub(crate) fn read_types(conn: &Connection) -> rusqlite::Result<Vec<TypeRow>> {
    let mut stmt = conn.prepare("SELECT id, namespace, name, is_instance FROM types ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(TypeRow {
            id: row.get(0)?,
            namespace: row.get(1)?,
            name: row.get(2)?,
            is_instance: row.get(3)?,
        })
    })?;
    rows.collect()
}

pub(crate) fn read_properties(conn: &Connection) -> rusqlite::Result<Vec<PropertyRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, type, name, datatype, reference_type, is_array, is_blob \
         FROM properties ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(PropertyRow {
            id: row.get(0)?,
            type_id: row.get(1)?,
            name: row.get(2)?,
            datatype: row.get(3)?,
            reference_type: row.get(4)?,
            is_array: row.get(5)?,
            is_blob: row.get(6)?,
        })
    })?;
    rows.collect()
}

pub(crate) fn read_tables(conn: &Connection) -> rusqlite::Result<Vec<TableRow>> {
    let mut stmt = conn.prepare("SELECT type, name, kind FROM tables ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(TableRow {
            type_id: row.get(0)?,
            name: row.get(1)?,
            kind: row.get(2)?,
        })
    })?;
    rows.collect()
}

pub(crate) fn insert_namespace(conn: &Connection, name: &str) -> rusqlite::Result<i64> {
    conn.prepare_cached("INSERT INTO namespaces (name) VALUES (?1)")?
        .execute(params![name])?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn insert_type(
    conn: &Connection,
    namespace: i64,
    name: &str,
    is_instance: bool,
) -> rusqlite::Result<i64> {
    conn.prepare_cached("INSERT INTO types (namespace, name, is_instance) VALUES (?1, ?2, ?3)")?
        .execute(params![namespace, name, is_instance])?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn insert_property(conn: &Connection, row: &PropertyRow) -> rusqlite::Result<i64> {
    conn.prepare_cached(
        "INSERT INTO properties (type, name, datatype, reference_type, is_array, is_blob) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?
    .execute(params![
        row.type_id,
        row.name,
        row.datatype,
        row.reference_type,
        row.is_array,
        row.is_blob
    ])?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn insert_table(
    conn: &Connection,
    type_id: i64,
    name: &str,
    kind: &str,
) -> rusqlite::Result<i64> {
    conn.prepare_cached("INSERT INTO tables (type, name, kind) VALUES (?1, ?2, ?3)")?
        .execute(params![type_id, name, kind])?;
    Ok(conn.last_insert_rowid())
}

/// Check whether any schema object (table, index, view) carries `name`.
pub(crate) fn object_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    conn.prepare_cached("SELECT 1 FROM sqlite_master WHERE name = ?1 COLLATE NOCASE")?
        .query_row(params![name], |_| Ok(()))
        .optional()
        .map(|found| found.is_some())
}

/// Check whether every catalog table exists.
pub(crate) fn catalog_present(conn: &Connection) -> rusqlite::Result<bool> {
    for table in CATALOG_TABLES {
        if !object_exists(conn, table)? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bootstrapped() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        conn.execute_batch(BOOTSTRAP).unwrap();
        conn
    }

    #[test]
    fn test_bootstrap_creates_catalog() {
        let conn = bootstrapped();
        assert!(catalog_present(&conn).unwrap());
        assert!(!object_exists(&conn, "main_foo").unwrap());
        assert!(object_exists(&conn, "TYPES").unwrap());
    }

    #[test]
    fn test_rows_round_trip_in_id_order() {
        let conn = bootstrapped();
        let main = insert_namespace(&conn, "main").unwrap();
        let other = insert_namespace(&conn, "other").unwrap();
        let ty = insert_type(&conn, other, "foo", true).unwrap();
        insert_property(
            &conn,
            &PropertyRow {
                id: 0,
                type_id: ty,
                name: "bar".into(),
                datatype: "Reference".into(),
                reference_type: Some(ty),
                is_array: true,
                is_blob: false,
            },
        )
        .unwrap();
        insert_table(&conn, ty, "other_foo", "instance").unwrap();

        let namespaces = read_namespaces(&conn).unwrap();
        assert_eq!(namespaces.len(), 2);
        assert_eq!(namespaces[0].id, main);
        assert_eq!(namespaces[1].name, "other");

        let types = read_types(&conn).unwrap();
        assert_eq!(types[0].namespace, other);
        assert!(types[0].is_instance);

        let properties = read_properties(&conn).unwrap();
        assert_eq!(properties[0].reference_type, Some(ty));
        assert!(properties[0].is_array);
        assert!(!properties[0].is_blob);

        let tables = read_tables(&conn).unwrap();
        assert_eq!(tables[0].name, "other_foo");
        assert_eq!(tables[0].kind, "instance");
    }

    #[test]
    fn test_duplicate_namespace_rejected() {
        let conn = bootstrapped();
        insert_namespace(&conn, "main").unwrap();
        assert!(insert_namespace(&conn, "main").is_err());
    }

    #[test]
    fn test_type_requires_namespace() {
        let conn = bootstrapped();
        assert!(insert_type(&conn, 42, "foo", true).is_err());
    }
}
