//! Folio - embedded typed object store over SQLite.
//!
//! A [`Library`] holds a catalog of namespaces, types and properties. Types
//! are committed into the catalog, which generates one instance table per
//! instantiable type plus one satellite table per array property. Rust
//! objects describe their members through [`Object`] and are stored with the
//! compiled queries in [`query`].
//!
//! ```
//! use folio::catalog::{DataType, Property};
//! use folio::object::{InstanceId, Member, Members, Object};
//! use folio::query::{DeleteQuery, GetQuery, InsertQuery};
//! use folio::Library;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Note {
//!     id: InstanceId,
//!     title: String,
//!     stars: i32,
//!     tags: Vec<String>,
//! }
//!
//! impl Object for Note {
//!     fn members() -> Vec<Member<Self>> {
//!         Members::<Self>::new()
//!             .instance_id("id", |n| &n.id, |n| &mut n.id)
//!             .string("title", |n| &n.title, |n| &mut n.title)
//!             .primitive("stars", |n| &n.stars, |n| &mut n.stars)
//!             .string_array("tags", |n| &n.tags, |n| &mut n.tags)
//!             .build()
//!     }
//! }
//!
//! # fn main() -> folio::Result<()> {
//! let mut library = Library::in_memory()?;
//! let main = library.create_namespace("main")?;
//! let note = library.create_type(main, "note", true)?;
//! library.add_property(note, Property::string("title"))?;
//! library.add_property(note, Property::primitive("stars", DataType::Int32))?;
//! library.add_property(note, Property::string_array("tags"))?;
//! library.commit(note)?;
//!
//! let mut draft = Note {
//!     title: "groceries".into(),
//!     stars: 3,
//!     tags: vec!["home".into(), "weekly".into()],
//!     ..Default::default()
//! };
//! let id = InsertQuery::new(&library, note)?.insert(&mut draft)?;
//!
//! let stored: Note = GetQuery::new(&library, note)?.get(&id)?;
//! assert_eq!(stored, draft);
//!
//! assert!(DeleteQuery::<Note>::new(&library, note)?.delete(&id)?);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod object;
pub mod query;

pub use catalog::{DataType, Library, NamespaceKey, Property, TypeKey};
pub use config::LibraryConfig;
pub use error::{Error, Result, SchemaError};
pub use object::{InstanceId, Member, Members, Object, Reference};
