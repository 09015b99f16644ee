//! Conversions between Rust member values and SQLite values.

use rusqlite::types::Value;

use crate::catalog::DataType;
use crate::error::{Error, Result};

/// A Rust value that is stored in one SQLite column or satellite cell.
///
/// NULL reads back as the type's empty value (zero, empty string, empty
/// byte vector, nil id). SQLite has no NaN, so a NaN float is rejected when
/// it is bound. Infinities are stored as is.
pub trait ColumnValue: Sized {
    /// Convert to a bind value.
    fn to_value(&self) -> Value;

    /// Convert a stored value back.
    fn from_value(value: Value) -> Result<Self>;
}

/// Fixed-size numeric kinds.
///
/// Primitives can be stored as columns, as array elements or packed
/// little-endian into a blob.
pub trait Primitive: ColumnValue + Copy + Send + Sync + 'static {
    /// Catalog data type.
    const DATA_TYPE: DataType;

    /// Width in bytes when packed.
    const SIZE: usize;

    /// Append the little-endian encoding.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decode from exactly [`Self::SIZE`] bytes.
    fn read_le(bytes: &[u8]) -> Option<Self>;
}

fn mismatch(expected: &str, value: &Value) -> Error {
    Error::Conversion(format!(
        "expected {expected}, found {:?}",
        value.data_type()
    ))
}

macro_rules! integer_primitive {
    ($ty:ty, $data_type:ident) => {
        impl ColumnValue for $ty {
            fn to_value(&self) -> Value {
                Value::Integer(i64::from(*self))
            }

            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Null => Ok(0),
                    Value::Integer(v) => <$ty>::try_from(v).map_err(|_| {
                        Error::Conversion(format!(
                            "{v} is out of range for {}",
                            stringify!($ty)
                        ))
                    }),
                    other => Err(mismatch("integer", &other)),
                }
            }
        }

        impl Primitive for $ty {
            const DATA_TYPE: DataType = DataType::$data_type;
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Option<Self> {
                bytes.try_into().ok().map(<$ty>::from_le_bytes)
            }
        }
    };
}

integer_primitive!(i32, Int32);
integer_primitive!(u32, UInt32);
integer_primitive!(i64, Int64);

// Stored bit-cast so the full range survives.
impl ColumnValue for u64 {
    fn to_value(&self) -> Value {
        Value::Integer(*self as i64)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(0),
            Value::Integer(v) => Ok(v as u64),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl Primitive for u64 {
    const DATA_TYPE: DataType = DataType::UInt64;
    const SIZE: usize = 8;

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(u64::from_le_bytes)
    }
}

macro_rules! float_primitive {
    ($ty:ty, $data_type:ident) => {
        impl ColumnValue for $ty {
            fn to_value(&self) -> Value {
                Value::Real(f64::from(*self))
            }

            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Null => Ok(0.0),
                    Value::Real(v) => Ok(v as $ty),
                    Value::Integer(v) => Ok(v as $ty),
                    other => Err(mismatch("real", &other)),
                }
            }
        }

        impl Primitive for $ty {
            const DATA_TYPE: DataType = DataType::$data_type;
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Option<Self> {
                bytes.try_into().ok().map(<$ty>::from_le_bytes)
            }
        }
    };
}

float_primitive!(f32, Float);
float_primitive!(f64, Double);

impl ColumnValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Text(text) => Ok(text),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl ColumnValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Blob(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Blob(bytes) => Ok(bytes),
            other => Err(mismatch("blob", &other)),
        }
    }
}

/// Check a bind value for `member`. SQLite binds NaN as NULL.
pub(crate) fn storable(member: &str, value: Value) -> Result<Value> {
    match value {
        Value::Real(v) if v.is_nan() => Err(Error::Conversion(format!(
            "member {member:?} is NaN, which cannot be stored"
        ))),
        value => Ok(value),
    }
}

/// Pack primitives little-endian into one byte vector.
pub(crate) fn pack<P: Primitive>(values: &[P]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * P::SIZE);
    for value in values {
        value.write_le(&mut out);
    }
    out
}

/// Unpack a byte vector written by [`pack`].
pub(crate) fn unpack<P: Primitive>(bytes: &[u8]) -> Result<Vec<P>> {
    if bytes.len() % P::SIZE != 0 {
        return Err(Error::Conversion(format!(
            "blob of {} bytes is not a whole number of {} values",
            bytes.len(),
            P::DATA_TYPE
        )));
    }
    bytes
        .chunks_exact(P::SIZE)
        .map(|chunk| {
            P::read_le(chunk).ok_or_else(|| Error::Conversion("truncated primitive".into()))
        })
        .collect()
}
