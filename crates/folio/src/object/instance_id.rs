//! Instance identifiers.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::Value;
use uuid::Uuid;

use super::ColumnValue;
use crate::error::Error;

/// Identity of a stored object: a random 128-bit UUID, stored as its
/// hyphenated text form.
///
/// The default id is nil and counts as "not inserted".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct InstanceId(Uuid);

impl InstanceId {
    /// The nil id.
    pub const NIL: InstanceId = InstanceId(Uuid::nil());

    /// Generate a new random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Check if the id refers to an object, i.e. is not nil.
    pub fn is_valid(&self) -> bool {
        !self.0.is_nil()
    }

    /// Reset to nil.
    pub fn reset(&mut self) {
        self.0 = Uuid::nil();
    }

    /// Wrapped UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse the hyphenated text form.
    pub fn parse(text: &str) -> Result<Self, Error> {
        Uuid::parse_str(text)
            .map(Self)
            .map_err(|source| Error::InvalidInstanceId {
                text: text.to_string(),
                source,
            })
    }
}

impl ColumnValue for InstanceId {
    /// The hyphenated text, or NULL when nil.
    fn to_value(&self) -> Value {
        if self.is_valid() {
            Value::Text(self.to_string())
        } else {
            Value::Null
        }
    }

    /// NULL maps to nil.
    fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Null => Ok(Self::NIL),
            Value::Text(text) => Self::parse(&text),
            other => Err(Error::Conversion(format!(
                "expected instance id text, found {:?}",
                other.data_type()
            ))),
        }
    }
}

impl From<Uuid> for InstanceId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for InstanceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
