//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - object_relationships(relationship_id, left_object_id, left_object_type,
//!   right_object_type, right_object_id, low_object_type, low_object_id,
//!   high_object_type, high_object_id)
//! - relationship_meta(meta_id, relationship_id, meta_key, meta_value)

pub mod schema;
pub mod sqlite;

pub use sqlite::{RelationshipStore, StoreStats};
