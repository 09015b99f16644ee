//! Runtime objects: identifiers, references and member role tables.

mod extract;
mod instance_id;
mod member;
mod reference;
mod value;

pub use extract::MemberGroups;
pub use instance_id::InstanceId;
pub use member::{Field, Member, MemberRole, Members, Object};
pub use reference::Reference;
pub use value::{ColumnValue, Primitive};
pub(crate) use value::storable;
