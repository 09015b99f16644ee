//! Search query: instance ids of a type matching simple conditions.

use rusqlite::params_from_iter;
use rusqlite::types::Value;
use tracing::debug;

use crate::catalog::{quote, Layout, Library, TableKind, TypeKey};
use crate::error::{Error, Result, SchemaError};
use crate::object::{storable, ColumnValue, InstanceId};

/// One search condition on a flattened member name.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Column equals the value. A NULL value matches NULL columns.
    Equals {
        /// Column name.
        column: String,
        /// Value to compare with.
        value: Value,
    },
    /// Column differs from the value. A NULL value matches non-NULL columns.
    NotEquals {
        /// Column name.
        column: String,
        /// Value to compare with.
        value: Value,
    },
    /// Column is less than the value.
    Less {
        /// Column name.
        column: String,
        /// Upper bound, exclusive.
        value: Value,
    },
    /// Column is greater than the value.
    Greater {
        /// Column name.
        column: String,
        /// Lower bound, exclusive.
        value: Value,
    },
    /// Column is less than or equal to the value.
    LessEqual {
        /// Column name.
        column: String,
        /// Upper bound, inclusive.
        value: Value,
    },
    /// Column is greater than or equal to the value.
    GreaterEqual {
        /// Column name.
        column: String,
        /// Lower bound, inclusive.
        value: Value,
    },
    /// String column matches an SQL `LIKE` pattern.
    Like {
        /// Column name.
        column: String,
        /// Pattern.
        pattern: String,
    },
    /// Column is NULL.
    IsNull {
        /// Column name.
        column: String,
    },
    /// A primitive or string array holds the value.
    Contains {
        /// Array member name.
        array: String,
        /// Element to look for.
        value: Value,
    },
    /// A reference column or reference array points at the object.
    References {
        /// Reference member name.
        member: String,
        /// Target object.
        target: InstanceId,
    },
}

impl Condition {
    /// `column = value`.
    pub fn equals(column: impl Into<String>, value: impl ColumnValue) -> Self {
        Condition::Equals {
            column: column.into(),
            value: value.to_value(),
        }
    }

    /// `column <> value`.
    pub fn not_equals(column: impl Into<String>, value: impl ColumnValue) -> Self {
        Condition::NotEquals {
            column: column.into(),
            value: value.to_value(),
        }
    }

    /// `column < value`.
    pub fn less(column: impl Into<String>, value: impl ColumnValue) -> Self {
        Condition::Less {
            column: column.into(),
            value: value.to_value(),
        }
    }

    /// `column > value`.
    pub fn greater(column: impl Into<String>, value: impl ColumnValue) -> Self {
        Condition::Greater {
            column: column.into(),
            value: value.to_value(),
        }
    }

    /// `column <= value`.
    pub fn less_equal(column: impl Into<String>, value: impl ColumnValue) -> Self {
        Condition::LessEqual {
            column: column.into(),
            value: value.to_value(),
        }
    }

    /// `column >= value`.
    pub fn greater_equal(column: impl Into<String>, value: impl ColumnValue) -> Self {
        Condition::GreaterEqual {
            column: column.into(),
            value: value.to_value(),
        }
    }

    /// `column LIKE pattern`.
    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Condition::Like {
            column: column.into(),
            pattern: pattern.into(),
        }
    }

    /// `column IS NULL`.
    pub fn is_null(column: impl Into<String>) -> Self {
        Condition::IsNull {
            column: column.into(),
        }
    }

    /// Array membership.
    pub fn contains(array: impl Into<String>, value: impl ColumnValue) -> Self {
        Condition::Contains {
            array: array.into(),
            value: value.to_value(),
        }
    }

    /// Reference to `target`.
    pub fn references(member: impl Into<String>, target: InstanceId) -> Self {
        Condition::References {
            member: member.into(),
            target,
        }
    }
}

/// How conditions combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Match {
    /// Every condition holds.
    #[default]
    All,
    /// At least one condition holds.
    Any,
}

/// Search over the instances of one type.
pub struct SearchQuery<'lib> {
    library: &'lib Library,
    type_name: String,
    layout: Layout,
}

impl<'lib> SearchQuery<'lib> {
    /// Create a search over a committed, instantiable type.
    pub fn new(library: &'lib Library, ty: TypeKey) -> Result<Self> {
        Ok(Self {
            library,
            type_name: library.ty(ty).qualified_name().to_string(),
            layout: library.layout(ty)?,
        })
    }

    /// Number of stored objects.
    pub fn count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote(&self.layout.instance_table));
        let count: i64 = self
            .library
            .connection()
            .prepare_cached(&sql)?
            .query_row([], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Every stored object, in insertion order.
    pub fn all(&self) -> Result<Vec<InstanceId>> {
        self.find(Match::All, &[])
    }

    /// Objects matching the conditions, in insertion order. No conditions
    /// match every object.
    pub fn find(&self, mode: Match, conditions: &[Condition]) -> Result<Vec<InstanceId>> {
        let mut params = Vec::new();
        let mut clauses = Vec::with_capacity(conditions.len());
        for condition in conditions {
            clauses.push(self.clause(condition, &mut params)?);
        }

        let table = quote(&self.layout.instance_table);
        let mut sql = format!("SELECT {} FROM {table}", quote("uuid"));
        if !clauses.is_empty() {
            let separator = match mode {
                Match::All => " AND ",
                Match::Any => " OR ",
            };
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(separator));
        }
        sql.push_str(&format!(" ORDER BY {}", quote("id")));

        let conn = self.library.connection();
        let mut stmt = conn.prepare_cached(&sql)?;
        let ids = stmt
            .query_map(params_from_iter(params), |row| row.get::<_, Value>(0))?
            .map(|value| InstanceId::from_value(value?))
            .collect::<Result<Vec<_>>>()?;

        debug!(type_name = %self.type_name, matched = ids.len(), "Search completed");
        Ok(ids)
    }

    fn clause(&self, condition: &Condition, params: &mut Vec<Value>) -> Result<String> {
        let clause = match condition {
            Condition::Equals { column, value } => {
                if *value == Value::Null {
                    format!("{} IS NULL", self.column(column)?)
                } else {
                    self.compare(column, "=", value, params)?
                }
            }
            Condition::NotEquals { column, value } => {
                if *value == Value::Null {
                    format!("{} IS NOT NULL", self.column(column)?)
                } else {
                    self.compare(column, "<>", value, params)?
                }
            }
            Condition::Less { column, value } => self.compare(column, "<", value, params)?,
            Condition::Greater { column, value } => self.compare(column, ">", value, params)?,
            Condition::LessEqual { column, value } => self.compare(column, "<=", value, params)?,
            Condition::GreaterEqual { column, value } => {
                self.compare(column, ">=", value, params)?
            }
            Condition::Like { column, pattern } => {
                let spec = self.layout.column(column).filter(|c| c.data_type.is_string());
                if spec.is_none() {
                    return Err(self.unknown("string column", column));
                }
                params.push(Value::Text(pattern.clone()));
                format!("{} LIKE ?{}", quote(column), params.len())
            }
            Condition::IsNull { column } => format!("{} IS NULL", self.column(column)?),
            Condition::Contains { array, value } => {
                let satellite = self
                    .layout
                    .satellite(array)
                    .filter(|s| s.kind == TableKind::PrimitiveArray)
                    .ok_or_else(|| self.unknown("primitive array", array))?;
                params.push(storable(array, value.clone())?);
                self.exists(&satellite.table, params.len())
            }
            Condition::References { member, target } => {
                params.push(target.to_value());
                if let Some(column) = self
                    .layout
                    .column(member)
                    .filter(|c| c.data_type.is_reference())
                {
                    format!("{} = ?{}", quote(&column.name), params.len())
                } else if let Some(satellite) = self
                    .layout
                    .satellite(member)
                    .filter(|s| s.kind == TableKind::ReferenceArray)
                {
                    self.exists(&satellite.table, params.len())
                } else {
                    return Err(self.unknown("reference", member));
                }
            }
        };
        Ok(clause)
    }

    /// `column <op> ?n`. A NULL value never matches.
    fn compare(
        &self,
        column: &str,
        op: &str,
        value: &Value,
        params: &mut Vec<Value>,
    ) -> Result<String> {
        let quoted = self.column(column)?;
        params.push(storable(column, value.clone())?);
        Ok(format!("{quoted} {op} ?{}", params.len()))
    }

    /// Quoted name of an instance column. `uuid` is accepted too.
    fn column(&self, name: &str) -> Result<String> {
        if name == "uuid" || self.layout.column(name).is_some() {
            Ok(quote(name))
        } else {
            Err(self.unknown("column", name))
        }
    }

    fn exists(&self, satellite: &str, param: usize) -> String {
        let satellite = quote(satellite);
        format!(
            "EXISTS (SELECT 1 FROM {satellite} WHERE {satellite}.{} = {}.{} AND {satellite}.{} = ?{param})",
            quote("instance"),
            quote(&self.layout.instance_table),
            quote("uuid"),
            quote("value"),
        )
    }

    fn unknown(&self, kind: &'static str, name: &str) -> Error {
        SchemaError::UnknownMember {
            type_name: self.type_name.clone(),
            kind,
            name: name.to_string(),
        }
        .into()
    }
}
