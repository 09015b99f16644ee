//! Property definitions for types.

use std::fmt;

use super::{DataType, TypeKey};
use crate::error::SchemaError;

/// A typed, named field of a [`Type`](super::Type).
///
/// Properties are built with the constructors below and attached through
/// [`Library::add_property`](super::Library::add_property), which validates
/// them against their owner. They get a catalog id when the owner commits.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    name: String,
    data_type: DataType,
    array: bool,
    blob: bool,
    default: Option<DefaultValue>,
    pub(crate) id: Option<i64>,
}

/// Column default for scalar primitive and string properties.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// 32-bit signed integer.
    Int32(i32),
    /// 32-bit unsigned integer.
    UInt32(u32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit unsigned integer.
    UInt64(u64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// String.
    String(String),
}

impl DefaultValue {
    /// Data type this default can be attached to.
    pub fn data_type(&self) -> DataType {
        match self {
            DefaultValue::Int32(_) => DataType::Int32,
            DefaultValue::UInt32(_) => DataType::UInt32,
            DefaultValue::Int64(_) => DataType::Int64,
            DefaultValue::UInt64(_) => DataType::UInt64,
            DefaultValue::Float(_) => DataType::Float,
            DefaultValue::Double(_) => DataType::Double,
            DefaultValue::String(_) => DataType::String,
        }
    }

    /// SQL literal for a `DEFAULT` clause.
    pub(crate) fn to_sql_literal(&self) -> String {
        match self {
            DefaultValue::Int32(v) => v.to_string(),
            DefaultValue::UInt32(v) => v.to_string(),
            DefaultValue::Int64(v) => v.to_string(),
            DefaultValue::UInt64(v) => (*v as i64).to_string(),
            DefaultValue::Float(v) => format!("{:?}", f64::from(*v)),
            DefaultValue::Double(v) => format!("{v:?}"),
            DefaultValue::String(v) => format!("'{}'", v.replace('\'', "''")),
        }
    }
}

impl Property {
    fn new(name: impl Into<String>, data_type: DataType, array: bool, blob: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            array,
            blob,
            default: None,
            id: None,
        }
    }

    /// Scalar primitive (`Int32` ... `Double`).
    pub fn primitive(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(name, data_type, false, false)
    }

    /// Array of primitives, stored in a satellite table.
    pub fn primitive_array(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(name, data_type, true, false)
    }

    /// Vector of primitives packed into a single blob column.
    pub fn primitive_blob(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(name, data_type, false, true)
    }

    /// String.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, DataType::String, false, false)
    }

    /// Array of strings, stored in a satellite table.
    pub fn string_array(name: impl Into<String>) -> Self {
        Self::new(name, DataType::String, true, false)
    }

    /// Opaque byte sequence.
    pub fn blob(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Blob, false, false)
    }

    /// Array of byte sequences, stored in a satellite table.
    pub fn blob_array(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Blob, true, false)
    }

    /// Type inlined into the owner's instance table.
    pub fn nested(name: impl Into<String>, nested: TypeKey) -> Self {
        Self::new(name, DataType::Nested(nested), false, false)
    }

    /// Reference to an instance of an instantiable type.
    pub fn reference(name: impl Into<String>, target: TypeKey) -> Self {
        Self::new(name, DataType::Reference(target), false, false)
    }

    /// Array of references, stored in a satellite table.
    pub fn reference_array(name: impl Into<String>, target: TypeKey) -> Self {
        Self::new(name, DataType::Reference(target), true, false)
    }

    /// Set the column default.
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Rebuild a committed property from its catalog row.
    pub(crate) fn from_catalog(
        id: i64,
        name: String,
        data_type: DataType,
        array: bool,
        blob: bool,
    ) -> Self {
        Self {
            id: Some(id),
            ..Self::new(name, data_type, array, blob)
        }
    }

    /// Property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Data type.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Check if the property is stored in a satellite table.
    pub fn is_array(&self) -> bool {
        self.array
    }

    /// Check if the property is a primitive blob.
    pub fn is_blob(&self) -> bool {
        self.blob
    }

    /// Column default, if any.
    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Catalog id, set once the owning type is committed.
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    /// Check if the property has been committed.
    pub fn is_committed(&self) -> bool {
        self.id.is_some()
    }

    /// Check the data type, modifiers and default against each other.
    pub(crate) fn validate_shape(&self) -> Result<(), SchemaError> {
        let data_type = self.data_type;
        let rejected = match (self.array, self.blob) {
            (true, true) => true,
            (false, true) => !data_type.is_primitive(),
            (true, false) => data_type.is_nested(),
            (false, false) => false,
        };
        if rejected {
            return Err(SchemaError::InvalidModifier {
                property: self.name.clone(),
                shape: self.shape_label(),
            });
        }

        if let Some(default) = &self.default {
            let scalar = !self.array
                && !self.blob
                && (data_type.is_primitive() || data_type.is_string());
            if !scalar || default.data_type() != data_type {
                return Err(SchemaError::DefaultTypeMismatch {
                    property: self.name.clone(),
                    data_type: data_type.tag(),
                    value: default.data_type().tag(),
                });
            }
        }

        Ok(())
    }

    fn shape_label(&self) -> String {
        let mut label = self.data_type.tag().to_string();
        if self.blob {
            label.push('*');
        }
        if self.array {
            label.push_str("[]");
        }
        label
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.shape_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let prop = Property::primitive("width", DataType::Float);
        assert_eq!(prop.name(), "width");
        assert_eq!(prop.data_type(), DataType::Float);
        assert!(!prop.is_array());
        assert!(!prop.is_blob());
        assert!(!prop.is_committed());

        let prop = Property::blob_array("chunks");
        assert_eq!(prop.data_type(), DataType::Blob);
        assert!(prop.is_array());
        assert!(!prop.is_blob());

        let prop = Property::primitive_blob("samples", DataType::Int32);
        assert!(prop.is_blob());
        assert_eq!(prop.to_string(), "samples: Int32*");

        let prop = Property::reference_array("parts", TypeKey(4));
        assert_eq!(prop.to_string(), "parts: Reference[]");
    }

    #[test]
    fn test_rejects_invalid_modifiers() {
        assert!(Property::primitive_blob("text", DataType::String)
            .validate_shape()
            .is_err());
        assert!(Property::primitive_blob("raw", DataType::Blob)
            .validate_shape()
            .is_err());
        assert!(Property::primitive_array("nested", DataType::Nested(TypeKey(0)))
            .validate_shape()
            .is_err());
        assert!(Property::primitive_array("values", DataType::Double)
            .validate_shape()
            .is_ok());
        assert!(Property::reference_array("refs", TypeKey(1))
            .validate_shape()
            .is_ok());
    }

    #[test]
    fn test_default_must_match() {
        let ok = Property::primitive("count", DataType::Int32).with_default(DefaultValue::Int32(7));
        assert!(ok.validate_shape().is_ok());

        let wrong = Property::primitive("count", DataType::Int32).with_default(DefaultValue::Int64(7));
        match wrong.validate_shape() {
            Err(SchemaError::DefaultTypeMismatch { data_type, value, .. }) => {
                assert_eq!(data_type, "Int32");
                assert_eq!(value, "Int64");
            }
            other => panic!("expected default mismatch, got {other:?}"),
        }

        let array = Property::string_array("tags").with_default(DefaultValue::String("x".into()));
        assert!(array.validate_shape().is_err());
    }

    #[test]
    fn test_default_literals() {
        assert_eq!(DefaultValue::Int32(-3).to_sql_literal(), "-3");
        assert_eq!(DefaultValue::UInt64(u64::MAX).to_sql_literal(), "-1");
        assert_eq!(DefaultValue::Float(0.5).to_sql_literal(), "0.5");
        assert_eq!(DefaultValue::Double(1.0).to_sql_literal(), "1.0");
        assert_eq!(
            DefaultValue::String("it's".into()).to_sql_literal(),
            "'it''s'"
        );
    }
}
