//! Flattened physical layout of an instantiable type.
//!
//! Nested properties are inlined into the owner's instance table with an
//! accumulating `<name>_` prefix. Arrays become satellite tables named
//! `<instance>_<prefix><name>`.

use std::collections::HashSet;

use super::{quote, ColumnType, DataType, DefaultValue, TableKind, Type, TypeKey};
use crate::error::SchemaError;

/// Columns every instance table carries ahead of the property columns.
pub(crate) const RESERVED_COLUMNS: [&str; 2] = ["id", "uuid"];

/// One property column of an instance table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    /// Column name, including the nested prefix.
    pub name: String,
    /// Data type of the property the column came from.
    pub data_type: DataType,
    /// Packed primitive vector.
    pub blob: bool,
    /// Column default.
    pub default: Option<DefaultValue>,
    /// Instance table of the referenced type, for reference columns.
    pub references: Option<String>,
}

impl ColumnSpec {
    /// Physical column type.
    pub fn column_type(&self) -> ColumnType {
        if self.blob {
            ColumnType::Blob
        } else {
            // Nested properties never produce a column.
            self.data_type.column_type().unwrap_or(ColumnType::Blob)
        }
    }

    fn definition(&self) -> String {
        let mut def = format!("{} {}", quote(&self.name), self.column_type().as_sql());
        if let Some(default) = &self.default {
            def.push_str(" DEFAULT ");
            def.push_str(&default.to_sql_literal());
        }
        if let Some(target) = &self.references {
            def.push_str(&format!(
                " REFERENCES {}({}) ON DELETE SET NULL",
                quote(target),
                quote("uuid")
            ));
        }
        def
    }
}

/// One satellite table holding the elements of an array property.
#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteSpec {
    /// Physical table name.
    pub table: String,
    /// Flattened member name (`<prefix><name>`).
    pub member: String,
    /// Satellite kind.
    pub kind: TableKind,
    /// Element data type.
    pub data_type: DataType,
    /// Instance table of the referenced type, for reference arrays.
    pub references: Option<String>,
}

impl SatelliteSpec {
    /// Physical type of the `value` column.
    pub fn value_type(&self) -> ColumnType {
        self.data_type.column_type().unwrap_or(ColumnType::Blob)
    }
}

/// Physical layout of an instantiable type.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Instance table name.
    pub instance_table: String,
    /// Property columns in order, after `id` and `uuid`.
    pub columns: Vec<ColumnSpec>,
    /// Satellite tables in order of the array members.
    pub satellites: Vec<SatelliteSpec>,
}

/// Generated DDL for one physical table.
#[derive(Debug, Clone)]
pub(crate) struct TableDdl {
    pub name: String,
    pub kind: TableKind,
    pub sql: String,
}

impl Layout {
    /// Flatten `key` against the type arena.
    ///
    /// Nested targets must already be present in `types`. Column names that
    /// collide inside the instance table, and satellite names that collide
    /// with each other, are rejected.
    pub(crate) fn build(types: &[Type], key: TypeKey) -> Result<Self, SchemaError> {
        let ty = &types[key.0];
        let mut layout = Layout {
            instance_table: ty.instance_table_name().to_string(),
            columns: Vec::new(),
            satellites: Vec::new(),
        };
        let mut seen: HashSet<String> = RESERVED_COLUMNS.iter().map(|c| c.to_string()).collect();
        let mut tables: HashSet<String> = HashSet::from([layout.instance_table.clone()]);

        layout.flatten(types, key, "", &mut seen, &mut tables)?;
        Ok(layout)
    }

    fn flatten(
        &mut self,
        types: &[Type],
        key: TypeKey,
        prefix: &str,
        seen: &mut HashSet<String>,
        tables: &mut HashSet<String>,
    ) -> Result<(), SchemaError> {
        for property in types[key.0].properties() {
            let name = format!("{prefix}{}", property.name());
            let data_type = property.data_type();
            let references = match data_type {
                DataType::Reference(target) => {
                    Some(types[target.0].instance_table_name().to_string())
                }
                _ => None,
            };

            if let DataType::Nested(nested) = data_type {
                self.flatten(types, nested, &format!("{name}_"), seen, tables)?;
                continue;
            }

            if property.is_array() {
                let kind = if data_type.is_blob() {
                    TableKind::BlobArray
                } else if data_type.is_reference() {
                    TableKind::ReferenceArray
                } else {
                    TableKind::PrimitiveArray
                };
                let table = format!("{}_{name}", self.instance_table);
                if !tables.insert(table.clone()) {
                    return Err(SchemaError::NameCollision(table));
                }
                self.satellites.push(SatelliteSpec {
                    table,
                    member: name,
                    kind,
                    data_type,
                    references,
                });
            } else {
                if !seen.insert(name.clone()) {
                    return Err(SchemaError::NameCollision(name));
                }
                self.columns.push(ColumnSpec {
                    name,
                    data_type,
                    blob: property.is_blob(),
                    default: property.default_value().cloned(),
                    references,
                });
            }
        }
        Ok(())
    }

    /// Satellites of one kind, in order.
    pub fn satellites_of(&self, kind: TableKind) -> impl Iterator<Item = &SatelliteSpec> {
        self.satellites.iter().filter(move |s| s.kind == kind)
    }

    /// Look up a property column by flattened name.
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a satellite by flattened member name.
    pub fn satellite(&self, member: &str) -> Option<&SatelliteSpec> {
        self.satellites.iter().find(|s| s.member == member)
    }

    /// `CREATE TABLE` statements, instance table first.
    pub(crate) fn create_statements(&self) -> Vec<TableDdl> {
        let mut defs = vec![
            format!("{} INTEGER PRIMARY KEY", quote("id")),
            format!("{} TEXT UNIQUE", quote("uuid")),
        ];
        defs.extend(self.columns.iter().map(ColumnSpec::definition));

        let mut statements = vec![TableDdl {
            name: self.instance_table.clone(),
            kind: TableKind::Instance,
            sql: format!(
                "CREATE TABLE {} ({})",
                quote(&self.instance_table),
                defs.join(", ")
            ),
        }];

        for satellite in &self.satellites {
            let mut value = format!("{} {}", quote("value"), satellite.value_type().as_sql());
            if let Some(target) = &satellite.references {
                value.push_str(&format!(
                    " REFERENCES {}({}) ON DELETE CASCADE",
                    quote(target),
                    quote("uuid")
                ));
            }
            statements.push(TableDdl {
                name: satellite.table.clone(),
                kind: satellite.kind,
                sql: format!(
                    "CREATE TABLE {} ({} INTEGER PRIMARY KEY, {} TEXT NOT NULL REFERENCES {}({}) ON DELETE CASCADE, {})",
                    quote(&satellite.table),
                    quote("id"),
                    quote("instance"),
                    quote(&self.instance_table),
                    quote("uuid"),
                    value
                ),
            });
        }

        statements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NamespaceKey, Property};

    fn arena() -> Vec<Type> {
        let ns = NamespaceKey(0);
        let mut float3 = Type::new(TypeKey(0), ns, "main", "float3".into(), false);
        float3.properties = vec![
            Property::primitive("x", DataType::Float),
            Property::primitive("y", DataType::Float),
            Property::primitive("z", DataType::Float),
        ];

        let mut material = Type::new(TypeKey(1), ns, "main", "material".into(), true);
        material.properties = vec![
            Property::string("name"),
            Property::nested("color", TypeKey(0)),
            Property::primitive("specular", DataType::Float).with_default(DefaultValue::Float(0.5)),
        ];

        let mut mesh = Type::new(TypeKey(2), ns, "main", "mesh".into(), true);
        mesh.properties = vec![
            Property::reference("material", TypeKey(1)),
            Property::primitive_array("indices", DataType::UInt32),
            Property::primitive_blob("normals", DataType::Float),
            Property::blob_array("chunks"),
            Property::reference_array("extra", TypeKey(1)),
            Property::string_array("tags"),
        ];

        vec![float3, material, mesh]
    }

    #[test]
    fn test_nested_columns_are_prefixed() {
        let types = arena();
        let layout = Layout::build(&types, TypeKey(1)).unwrap();
        let names: Vec<_> = layout.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["name", "color_x", "color_y", "color_z", "specular"]);
        assert!(layout.satellites.is_empty());
    }

    #[test]
    fn test_satellites_in_member_order() {
        let types = arena();
        let layout = Layout::build(&types, TypeKey(2)).unwrap();

        let columns: Vec<_> = layout.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(columns, ["material", "normals"]);
        assert_eq!(layout.columns[1].column_type(), ColumnType::Blob);
        assert_eq!(layout.columns[0].references.as_deref(), Some("main_material"));

        let satellites: Vec<_> = layout
            .satellites
            .iter()
            .map(|s| (s.table.as_str(), s.kind))
            .collect();
        assert_eq!(
            satellites,
            [
                ("main_mesh_indices", TableKind::PrimitiveArray),
                ("main_mesh_chunks", TableKind::BlobArray),
                ("main_mesh_extra", TableKind::ReferenceArray),
                ("main_mesh_tags", TableKind::PrimitiveArray),
            ]
        );
        assert_eq!(layout.satellites_of(TableKind::PrimitiveArray).count(), 2);
        assert_eq!(layout.satellite("tags").map(|s| s.value_type()), Some(ColumnType::Text));
    }

    #[test]
    fn test_reserved_column_collision() {
        let mut types = arena();
        types[1].properties.push(Property::string("uuid"));
        match Layout::build(&types, TypeKey(1)) {
            Err(SchemaError::NameCollision(name)) => assert_eq!(name, "uuid"),
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_column_collision() {
        let mut types = arena();
        types[1].properties.push(Property::primitive("color_x", DataType::Double));
        assert!(matches!(
            Layout::build(&types, TypeKey(1)),
            Err(SchemaError::NameCollision(name)) if name == "color_x"
        ));
    }

    #[test]
    fn test_create_statements() {
        let types = arena();
        let statements = Layout::build(&types, TypeKey(1)).unwrap().create_statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].kind, TableKind::Instance);
        assert_eq!(
            statements[0].sql,
            "CREATE TABLE \"main_material\" (\"id\" INTEGER PRIMARY KEY, \"uuid\" TEXT UNIQUE, \
             \"name\" TEXT, \"color_x\" REAL, \"color_y\" REAL, \"color_z\" REAL, \
             \"specular\" REAL DEFAULT 0.5)"
        );

        let statements = Layout::build(&types, TypeKey(2)).unwrap().create_statements();
        assert_eq!(statements.len(), 5);
        assert!(statements[0]
            .sql
            .contains("\"material\" TEXT REFERENCES \"main_material\"(\"uuid\") ON DELETE SET NULL"));
        assert!(statements[3].sql.contains(
            "\"value\" TEXT REFERENCES \"main_material\"(\"uuid\") ON DELETE CASCADE"
        ));
        assert!(statements[1].sql.contains(
            "\"instance\" TEXT NOT NULL REFERENCES \"main_mesh\"(\"uuid\") ON DELETE CASCADE"
        ));
    }
}
