//! Typed queries over committed types.
//!
//! Each query binds one Rust object shape to one committed, instantiable
//! type. The shape is checked against the type's physical layout when the
//! query is built, and every call runs as a single transaction.

mod binding;
mod delete;
mod get;
mod insert;
mod search;
mod update;

pub(crate) use binding::check_shape;
pub use delete::DeleteQuery;
pub use get::GetQuery;
pub use insert::InsertQuery;
pub use search::{Condition, Match, SearchQuery};
pub use update::UpdateQuery;
