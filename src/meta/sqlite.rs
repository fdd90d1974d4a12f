//! SQLite-backed metadata store

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use rusqlite::{Connection, params};
use serde_json::Value;
use super::MetaStore;
use crate::storage::schema;
use crate::{Error, RelationshipId, Result};

/// Metadata in the `relationship_meta` table.
///
/// Values are stored as JSON text; "equal to" comparisons compare that text.
/// The connection sits behind a mutex so the store can be shared with hooks.
pub struct SqliteMetaStore {
    conn: Mutex<Connection>,
}

impl SqliteMetaStore {
    /// Open a database file (creates if doesn't exist). May be the same file
    /// as the relationship store.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        for stmt in schema::meta_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_args(owner: RelationshipId, key: &str) -> Result<()> {
        if owner <= 0 {
            return Err(Error::Meta(format!("invalid relationship id: {}", owner)));
        }
        if key.is_empty() {
            return Err(Error::Meta("meta key must not be empty".to_string()));
        }
        Ok(())
    }

    fn insert(conn: &Connection, owner: RelationshipId, key: &str, value: &str) -> Result<i64> {
        conn.execute(
            "INSERT INTO relationship_meta (relationship_id, meta_key, meta_value) VALUES (?1, ?2, ?3)",
            params![owner, key, value],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn values(conn: &Connection, owner: RelationshipId, key: &str) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT meta_value FROM relationship_meta WHERE relationship_id = ?1 AND meta_key = ?2 ORDER BY meta_id",
        )?;
        let values = stmt
            .query_map(params![owner, key], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(values)
    }

    /// Number of metadata entries owned by a relationship
    pub fn count(&self, owner: RelationshipId) -> Result<usize> {
        let count: i64 = self.lock().query_row(
            "SELECT COUNT(*) FROM relationship_meta WHERE relationship_id = ?1",
            [owner],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl MetaStore for SqliteMetaStore {
    fn add(&self, owner: RelationshipId, key: &str, value: &Value, unique: bool) -> Result<Option<i64>> {
        Self::check_args(owner, key)?;
        let text = serde_json::to_string(value)?;
        let conn = self.lock();

        if unique && !Self::values(&conn, owner, key)?.is_empty() {
            tracing::debug!("Meta key '{}' already set on relationship {}", key, owner);
            return Ok(None);
        }

        Self::insert(&conn, owner, key, &text).map(Some)
    }

    fn update(&self, owner: RelationshipId, key: &str, value: &Value, prev_value: Option<&Value>) -> Result<bool> {
        Self::check_args(owner, key)?;
        let text = serde_json::to_string(value)?;
        let conn = self.lock();

        let existing = Self::values(&conn, owner, key)?;
        if existing.is_empty() {
            Self::insert(&conn, owner, key, &text)?;
            return Ok(true);
        }

        let changed = match prev_value {
            None => {
                if existing.len() == 1 && existing[0] == text {
                    return Ok(false);
                }
                conn.execute(
                    "UPDATE relationship_meta SET meta_value = ?3 WHERE relationship_id = ?1 AND meta_key = ?2",
                    params![owner, key, text],
                )?
            }
            Some(prev) => {
                let prev = serde_json::to_string(prev)?;
                conn.execute(
                    "UPDATE relationship_meta SET meta_value = ?3
                     WHERE relationship_id = ?1 AND meta_key = ?2 AND meta_value = ?4",
                    params![owner, key, text, prev],
                )?
            }
        };

        Ok(changed > 0)
    }

    fn delete(&self, owner: RelationshipId, key: &str, value: Option<&Value>) -> Result<bool> {
        Self::check_args(owner, key)?;
        let conn = self.lock();

        let removed = match value {
            None => conn.execute(
                "DELETE FROM relationship_meta WHERE relationship_id = ?1 AND meta_key = ?2",
                params![owner, key],
            )?,
            Some(value) => conn.execute(
                "DELETE FROM relationship_meta WHERE relationship_id = ?1 AND meta_key = ?2 AND meta_value = ?3",
                params![owner, key, serde_json::to_string(value)?],
            )?,
        };

        Ok(removed > 0)
    }

    fn get(&self, owner: RelationshipId, key: &str) -> Result<Vec<Value>> {
        let conn = self.lock();
        Self::values(&conn, owner, key)?
            .iter()
            .map(|text| serde_json::from_str(text).map_err(Error::from))
            .collect()
    }

    fn get_all(&self, owner: RelationshipId) -> Result<BTreeMap<String, Vec<Value>>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT meta_key, meta_value FROM relationship_meta WHERE relationship_id = ?1 ORDER BY meta_id",
        )?;
        let rows = stmt
            .query_map([owner], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut metas: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for (key, text) in rows {
            metas.entry(key).or_default().push(serde_json::from_str(&text)?);
        }
        Ok(metas)
    }
}
