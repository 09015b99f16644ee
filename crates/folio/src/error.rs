//! Core error types.

use std::path::PathBuf;

use rusqlite::ffi;
use rusqlite::ErrorCode;
use thiserror::Error;

use crate::object::InstanceId;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Core library errors.
#[derive(Debug, Error)]
pub enum Error {
    /// SQLite backend error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Schema violation raised by a schema-building call.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// `create` was called for a library file that already exists.
    #[error("library file already exists: {}", .0.display())]
    LibraryExists(PathBuf),

    /// `open` was called for a library file that does not exist.
    #[error("library file does not exist: {}", .0.display())]
    LibraryMissing(PathBuf),

    /// The connection refused to enable foreign key enforcement.
    #[error("foreign key enforcement could not be enabled on the connection")]
    ForeignKeysUnavailable,

    /// The catalog tables contain rows that cannot be mapped back to a schema.
    #[error("corrupt catalog: {0}")]
    CorruptCatalog(String),

    /// A uniqueness or foreign key constraint failed while writing an object.
    #[error("integrity violation on table {table}: {cause} ({source})")]
    Integrity {
        /// Physical table the failing statement targeted.
        table: String,
        /// Probable cause, derived from the constraint kind.
        cause: &'static str,
        /// The original backend error.
        #[source]
        source: rusqlite::Error,
    },

    /// An operation that needs an identifier was given the nil id.
    #[error("cannot {operation} object: it does not have a valid instance id")]
    MissingInstanceId {
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// No instance row exists for the identifier.
    #[error("no instance {id} in table {table}")]
    NotFound {
        /// Instance table that was searched.
        table: String,
        /// Identifier that was looked up.
        id: InstanceId,
    },

    /// Insert was called on an object that already carries an identifier.
    #[error("cannot insert object: it already has instance id {0}")]
    AlreadyInserted(InstanceId),

    /// Text could not be parsed as an instance id.
    #[error("invalid instance id {text:?}: {source}")]
    InvalidInstanceId {
        /// Offending text.
        text: String,
        /// Parser error.
        #[source]
        source: uuid::Error,
    },

    /// The object's member list does not line up with the type's physical layout.
    #[error("object shape does not match type {type_name}: {message}")]
    ShapeMismatch {
        /// Qualified type name.
        type_name: String,
        /// What did not match.
        message: String,
    },

    /// A stored value could not be converted into the member's Rust type.
    #[error("conversion error: {0}")]
    Conversion(String),
}

/// Schema violations. Always raised synchronously by the offending call and
/// never retried.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Name does not match `^[a-z][a-z0-9_]*$`.
    #[error("invalid {kind} name {name:?}: names must match ^[a-z][a-z0-9_]*$")]
    InvalidName {
        /// What was being named (namespace, type, property).
        kind: &'static str,
        /// Offending name.
        name: String,
    },

    /// A namespace with this name exists.
    #[error("a namespace with name {0:?} already exists")]
    DuplicateNamespace(String),

    /// A type with this name exists in the namespace.
    #[error("a type with name {name:?} already exists in namespace {namespace:?}")]
    DuplicateType {
        /// Namespace name.
        namespace: String,
        /// Type name.
        name: String,
    },

    /// A property with this name exists on the type.
    #[error("type {type_name} already has a property named {name:?}")]
    DuplicateProperty {
        /// Qualified type name.
        type_name: String,
        /// Property name.
        name: String,
    },

    /// The type was committed before.
    #[error("type {0} was already committed")]
    AlreadyCommitted(String),

    /// The type has not been committed yet.
    #[error("type {0} was not yet committed")]
    NotCommitted(String),

    /// Commit of a type without properties.
    #[error("type {0} cannot be committed: it has no properties")]
    NoProperties(String),

    /// A nested or referenced type is not committed.
    #[error("property {type_name}.{property} references uncommitted type {target}")]
    UncommittedReference {
        /// Qualified owner type name.
        type_name: String,
        /// Property name.
        property: String,
        /// Qualified target type name.
        target: String,
    },

    /// A reference targets a type without an instance table.
    #[error("type {0} is not instantiable")]
    NotInstantiable(String),

    /// Invalid combination of data type and array/blob modifiers.
    #[error("property {property:?} cannot be declared as {shape}")]
    InvalidModifier {
        /// Property name.
        property: String,
        /// Human-readable description of the rejected shape.
        shape: String,
    },

    /// Default value does not match the property's data type.
    #[error("cannot set {value} default value on property {property:?} of data type {data_type}")]
    DefaultTypeMismatch {
        /// Property name.
        property: String,
        /// Tag of the property data type.
        data_type: &'static str,
        /// Tag of the default value.
        value: &'static str,
    },

    /// Two generated columns or tables would share one physical name.
    #[error("generated name {0:?} collides with an existing column or table")]
    NameCollision(String),

    /// Namespace lookup failed.
    #[error("namespace {0:?} does not exist")]
    UnknownNamespace(String),

    /// Type lookup failed.
    #[error("type {name:?} does not exist in namespace {namespace:?}")]
    UnknownType {
        /// Namespace name.
        namespace: String,
        /// Type name.
        name: String,
    },

    /// A search referred to a column or array member the type does not have.
    #[error("type {type_name} has no {kind} named {name:?}")]
    UnknownMember {
        /// Qualified type name.
        type_name: String,
        /// Kind of member looked up.
        kind: &'static str,
        /// Member name.
        name: String,
    },
}

impl Error {
    /// True for schema violations.
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, Error::Schema(_))
    }

    /// True for constraint failures raised while writing objects.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, Error::Integrity { .. })
    }

    /// True when an object could not be located, either because no id was
    /// supplied or because no row matched it.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::MissingInstanceId { .. })
    }
}

/// Translate a backend error raised by a write against `table`.
///
/// Constraint failures become [`Error::Integrity`] with a guess at the cause;
/// everything else is wrapped as [`Error::Sqlite`].
pub(crate) fn write_error(table: &str, err: rusqlite::Error) -> Error {
    let cause = match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    "a reference points at an object that does not exist or no longer exists"
                }
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    "an object with the same instance id already exists"
                }
                ffi::SQLITE_CONSTRAINT_NOTNULL => "a required column was left empty",
                _ => "a table constraint was violated",
            }
        }
        _ => return Error::Sqlite(err),
    };

    Error::Integrity {
        table: table.to_string(),
        cause,
        source: err,
    }
}
