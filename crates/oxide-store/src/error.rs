//! Error types for the object store.

use oxide_store_sql::SqlError;
use thiserror::Error;

use crate::proxy::ObjectId;

/// Object store errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// The object's type has no prototype.
    #[error("type `{0}` is not registered")]
    TypeNotRegistered(String),

    /// The object, or an object its removal would take along, is still
    /// held.
    #[error("object {id} is still held by {pointers} pointer(s) and {references} reference(s)")]
    StillReferenced {
        /// Object id.
        id: ObjectId,
        /// Pointer holders.
        pointers: usize,
        /// Reference holders.
        references: usize,
    },

    /// A prototype with this name or type already exists.
    #[error("prototype `{0}` already exists")]
    PrototypeExists(String),

    /// The prototype still has objects or child prototypes.
    #[error("prototype `{0}` is still in use")]
    PrototypeInUse(String),

    /// The prototype is unknown.
    #[error("prototype `{0}` not found")]
    PrototypeNotFound(String),

    /// A persistent type has no identifier field.
    #[error("type `{0}` has no identifier field")]
    MissingIdentifier(String),

    /// No object with this id in the store.
    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),

    /// A relation position is out of range.
    #[error("position {position} out of range for relation of length {len}")]
    InvalidPosition {
        /// Requested position.
        position: String,
        /// Current length.
        len: usize,
    },

    /// The store or an object is already borrowed by an operation in progress.
    #[error("object store is busy")]
    StoreBusy,

    /// SQL building or execution failed.
    #[error(transparent)]
    Sql(#[from] SqlError),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
