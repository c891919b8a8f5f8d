//! # oxide-store
//!
//! An in-memory object store mapped onto SQL tables.
//!
//! This crate provides:
//! - `Persistent` types that expose their fields to visitors, usually derived
//! - `ObjectPtr` and `ObjectRef` handles over shared, counted object proxies
//! - `HasMany` containers whose items live in their own relation table
//! - `ObjectStore`, an id-indexed arena with a prototype registry and a
//!   change journal
//! - `Session`, which writes the journal through a `Connection` and loads
//!   tables back into the store
//!
//! ## Quick Start
//!
//! ```rust
//! use oxide_store::{HasMany, Identifier, ObjectPtr, Persistent, Session, Varchar};
//! use oxide_store::sql::MemoryConnection;
//!
//! #[derive(Debug, Default, Persistent)]
//! struct Author {
//!     id: Identifier,
//!     name: Varchar<64>,
//! }
//!
//! #[derive(Debug, Default, Persistent)]
//! struct Book {
//!     id: Identifier,
//!     title: String,
//!     author: ObjectPtr<Author>,
//!     tags: HasMany<String>,
//! }
//!
//! let mut session = Session::new(MemoryConnection::generic());
//! session.store().attach::<Author>("author")?;
//! session.store().attach::<Book>("book")?;
//! session.create()?;
//!
//! let book = session.insert(Book {
//!     title: String::from("Dune"),
//!     author: ObjectPtr::new(Author {
//!         name: Varchar::new("Frank Herbert"),
//!         ..Author::default()
//!     }),
//!     ..Book::default()
//! })?;
//! book.modify(|b| b.tags.push(String::from("classic")))??;
//!
//! let summary = session.flush()?;
//! assert_eq!(summary.inserted, 1);
//! assert_eq!(session.store().len(), 3);
//! # Ok::<(), oxide_store::StoreError>(())
//! ```
//!
//! ## Removal
//!
//! An object held by a pointer from another stored object cannot be
//! removed. References do not block an explicit removal. Removing an object
//! removes the items of its has-many fields with it, and every object it is
//! the only pointer to. An object taken along that way must not be
//! referenced, or the removal fails and nothing changes.

extern crate self as oxide_store;

mod error;
mod field;
mod graph;
mod holder;
mod prototype;
mod proxy;
pub mod relation;
mod row;
mod session;
mod store;

pub use error::{Result, StoreError};
pub use field::{Attribute, Field, FieldVisitor, Identifier, Persistent, Scalar, Varchar};
pub use holder::{HolderKind, ObjectHolder, ObjectPtr, ObjectRef};
pub use prototype::{owner_column, relation_table, Prototype, ITEM_COLUMN};
pub use proxy::{ErasedProxy, ObjectId, Proxy};
pub use relation::{
    HasMany, HasManyList, ItemProxy, ListPosition, ListStorage, RelationField, RelationItem,
    RelationStorage, VectorStorage,
};
pub use session::{FlushSummary, Session};
pub use store::{Journal, ObjectStore, StoreHandle};

pub use oxide_store_derive::Persistent;

/// The SQL layer sessions write through.
pub use oxide_store_sql as sql;
