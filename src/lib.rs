//! # Objrel - Object Relationships
//!
//! Records undirected relationships between arbitrary typed objects in a
//! dedicated SQLite table, independent of where the objects themselves live.
//!
//! Objrel provides:
//! - A relationship store with bidirectional de-duplication (A→B is B→A)
//! - Find-or-insert creation guarded by a unique index over the unordered pair
//! - Directional lookup of related object IDs
//! - An extensible registry of recognized object types
//! - Synchronous lifecycle hooks, including a metadata cascade on deletion

pub mod object_type;
pub mod validate;
pub mod relationship;
pub mod hooks;
pub mod context;
pub mod storage;
pub mod meta;
pub mod batch;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use context::RelationshipContext;
pub use hooks::{EventKind, HookRegistry, RelationshipEvent, RelationshipHook};
pub use meta::{MetaCascade, MetaStore, SqliteMetaStore};
pub use object_type::TypeRegistry;
pub use relationship::{Endpoint, Orientation, Relationship};
pub use storage::RelationshipStore;
pub use validate::{IdArg, InputKind, Param};

/// Surrogate key of a stored relationship row
pub type RelationshipId = i64;

/// Identifier of an object on either side of a relationship (opaque to objrel)
pub type ObjectId = i64;

/// Result type alias for Objrel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Objrel operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("expects parameter {} ({}) to be a positive integer, {} given", .param.position(), .param, .kind)]
    InvalidObjectId { param: Param, kind: InputKind },

    #[error("expects parameter {} ({}) to be one of {}, {} given", .param.position(), .param, .allowed.join(", "), .given)]
    InvalidObjectType {
        param: Param,
        allowed: Vec<String>,
        given: String,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Metadata error: {0}")]
    Meta(String),
}

impl Error {
    /// True for the two validation kinds, which are raised before any storage access
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidObjectId { .. } | Error::InvalidObjectType { .. })
    }

    /// The parameter a validation error refers to
    pub fn param(&self) -> Option<Param> {
        match self {
            Error::InvalidObjectId { param, .. } | Error::InvalidObjectType { param, .. } => Some(*param),
            _ => None,
        }
    }
}
