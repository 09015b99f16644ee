//! Storable data types and their physical column mapping.

use std::fmt;

use super::TypeKey;

/// Kinds of values a property can hold.
///
/// `Nested` and `Reference` carry the key of the type they point at. Whether a
/// property is an array or a blob is tracked on the property itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 32-bit signed integer.
    Int32,
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit unsigned integer, stored bit-cast as a signed integer.
    UInt64,
    /// 32-bit floating point.
    Float,
    /// 64-bit floating point.
    Double,
    /// UTF-8 string.
    String,
    /// Opaque byte sequence.
    Blob,
    /// Another type whose properties are inlined into the owner's table.
    Nested(TypeKey),
    /// Reference to an instance of another, instantiable type.
    Reference(TypeKey),
}

/// Physical SQLite column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// `INTEGER`
    Integer,
    /// `REAL`
    Real,
    /// `TEXT`
    Text,
    /// `BLOB`
    Blob,
}

impl ColumnType {
    /// SQL spelling.
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Blob => "BLOB",
        }
    }
}

impl DataType {
    /// Numeric kinds.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            DataType::Int32
                | DataType::UInt32
                | DataType::Int64
                | DataType::UInt64
                | DataType::Float
                | DataType::Double
        )
    }

    /// Check if this is the string kind.
    pub fn is_string(&self) -> bool {
        matches!(self, DataType::String)
    }

    /// Check if this is the blob kind.
    pub fn is_blob(&self) -> bool {
        matches!(self, DataType::Blob)
    }

    /// Check if this is a nested type.
    pub fn is_nested(&self) -> bool {
        matches!(self, DataType::Nested(_))
    }

    /// Check if this is a reference.
    pub fn is_reference(&self) -> bool {
        matches!(self, DataType::Reference(_))
    }

    /// Type pointed at by nested and reference kinds.
    pub fn target(&self) -> Option<TypeKey> {
        match self {
            DataType::Nested(key) | DataType::Reference(key) => Some(*key),
            _ => None,
        }
    }

    /// Tag stored in the `datatype` column of the properties catalog.
    pub fn tag(&self) -> &'static str {
        match self {
            DataType::Int32 => "Int32",
            DataType::UInt32 => "Uint32",
            DataType::Int64 => "Int64",
            DataType::UInt64 => "Uint64",
            DataType::Float => "Float",
            DataType::Double => "Double",
            DataType::String => "String",
            DataType::Blob => "Blob",
            DataType::Nested(_) => "Nested",
            DataType::Reference(_) => "Reference",
        }
    }

    /// Rebuild a data type from its catalog tag. Nested and reference tags
    /// need the resolved target.
    pub fn from_tag(tag: &str, target: Option<TypeKey>) -> Option<Self> {
        let data_type = match tag {
            "Int32" => DataType::Int32,
            "Uint32" => DataType::UInt32,
            "Int64" => DataType::Int64,
            "Uint64" => DataType::UInt64,
            "Float" => DataType::Float,
            "Double" => DataType::Double,
            "String" => DataType::String,
            "Blob" => DataType::Blob,
            "Nested" => DataType::Nested(target?),
            "Reference" => DataType::Reference(target?),
            _ => return None,
        };
        Some(data_type)
    }

    /// Column type used for a plain value of this kind. Nested types have no
    /// column of their own.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            DataType::Int32 | DataType::UInt32 | DataType::Int64 | DataType::UInt64 => {
                Some(ColumnType::Integer)
            }
            DataType::Float | DataType::Double => Some(ColumnType::Real),
            DataType::String | DataType::Reference(_) => Some(ColumnType::Text),
            DataType::Blob => Some(ColumnType::Blob),
            DataType::Nested(_) => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_checks() {
        assert!(DataType::Int32.is_primitive());
        assert!(DataType::Double.is_primitive());
        assert!(!DataType::String.is_primitive());
        assert!(!DataType::Blob.is_primitive());
        assert!(DataType::Nested(TypeKey(0)).is_nested());
        assert!(DataType::Reference(TypeKey(3)).is_reference());
        assert_eq!(DataType::Reference(TypeKey(3)).target(), Some(TypeKey(3)));
        assert_eq!(DataType::Float.target(), None);
    }

    #[test]
    fn test_tags() {
        let all = [
            DataType::Int32,
            DataType::UInt32,
            DataType::Int64,
            DataType::UInt64,
            DataType::Float,
            DataType::Double,
            DataType::String,
            DataType::Blob,
            DataType::Nested(TypeKey(1)),
            DataType::Reference(TypeKey(2)),
        ];
        for data_type in all {
            assert_eq!(
                DataType::from_tag(data_type.tag(), data_type.target()),
                Some(data_type)
            );
        }

        assert_eq!(DataType::UInt32.to_string(), "Uint32");
        assert_eq!(DataType::from_tag("Nested", None), None);
        assert_eq!(DataType::from_tag("Bool", None), None);
    }

    #[test]
    fn test_column_types() {
        assert_eq!(DataType::UInt64.column_type(), Some(ColumnType::Integer));
        assert_eq!(DataType::Float.column_type(), Some(ColumnType::Real));
        assert_eq!(DataType::Reference(TypeKey(0)).column_type(), Some(ColumnType::Text));
        assert_eq!(DataType::Blob.column_type().map(|c| c.as_sql()), Some("BLOB"));
        assert_eq!(DataType::Nested(TypeKey(0)).column_type(), None);
    }
}
