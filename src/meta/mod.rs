//! Relationship metadata
//!
//! Arbitrary key/value pairs attached to a relationship id. The store itself
//! never reads metadata; it is an external service reached through
//! [`MetaStore`], and the only coupling is [`MetaCascade`], which removes a
//! relationship's metadata once the relationship row is deleted.

pub mod cascade;
pub mod sqlite;

pub use cascade::MetaCascade;
pub use sqlite::SqliteMetaStore;

use crate::{RelationshipId, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key/value metadata keyed by relationship id.
///
/// A key may hold several values; they are returned in insertion order.
pub trait MetaStore: Send + Sync {
    /// Add a value under `key`. With `unique`, refuses when the key already
    /// has a value and returns `None`; otherwise returns the new entry id.
    fn add(&self, owner: RelationshipId, key: &str, value: &Value, unique: bool) -> Result<Option<i64>>;

    /// Replace the values under `key` (only those equal to `prev_value` when
    /// given). Adds the key when absent. Returns whether anything changed.
    fn update(&self, owner: RelationshipId, key: &str, value: &Value, prev_value: Option<&Value>) -> Result<bool>;

    /// Remove every value under `key`, or only those equal to `value`.
    /// Returns whether anything was removed.
    fn delete(&self, owner: RelationshipId, key: &str, value: Option<&Value>) -> Result<bool>;

    /// All values under `key`
    fn get(&self, owner: RelationshipId, key: &str) -> Result<Vec<Value>>;

    /// First value under `key`
    fn get_single(&self, owner: RelationshipId, key: &str) -> Result<Option<Value>> {
        Ok(self.get(owner, key)?.into_iter().next())
    }

    /// Every key owned by `owner` with its values
    fn get_all(&self, owner: RelationshipId) -> Result<BTreeMap<String, Vec<Value>>>;
}
