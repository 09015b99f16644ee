//! Schema catalog for folio.
//!
//! The catalog stores namespaces, types and properties in four fixed tables
//! and generates the physical tables that hold objects of committed types.

mod data_type;
mod layout;
mod library;
mod namespace;
mod property;
mod tables;
mod type_def;

pub use data_type::{ColumnType, DataType};
pub use layout::{ColumnSpec, Layout, SatelliteSpec};
pub use library::Library;
pub use namespace::{Namespace, NamespaceKey};
pub use property::{DefaultValue, Property};
pub use type_def::{GeneratedTables, TableKind, Type, TypeKey};

use crate::error::SchemaError;

/// Check a namespace, type or property name against `^[a-z][a-z0-9_]*$`.
pub(crate) fn validate_name(kind: &'static str, name: &str) -> Result<(), SchemaError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some('a'..='z'))
        && chars.all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_'));

    if valid {
        Ok(())
    } else {
        Err(SchemaError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}

/// Quote an identifier for use in generated SQL.
pub(crate) fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        for name in ["main", "float3", "base_color", "a", "x_1_"] {
            assert!(validate_name("type", name).is_ok(), "{name}");
        }
        for name in ["", "Main", "1abc", "_x", "has-dash", "has space", "ünï"] {
            assert!(validate_name("type", name).is_err(), "{name}");
        }
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("main_material"), "\"main_material\"");
        assert_eq!(quote("a\"b"), "\"a\"\"b\"");
    }
}
