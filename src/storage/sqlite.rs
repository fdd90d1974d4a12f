//! SQLite storage implementation

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use crate::context::RelationshipContext;
use crate::hooks::{EventKind, RelationshipEvent};
use crate::relationship::{self, Endpoint, Orientation, Relationship};
use crate::validate::{self, IdArg, PairArgs};
use crate::{ObjectId, RelationshipId, Result};
use super::schema;

/// How long a writer waits on another connection's lock before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_RELATIONSHIP: &str = "SELECT relationship_id, left_object_id, left_object_type, right_object_type, right_object_id FROM object_relationships";

/// SQLite-backed store for object relationships.
///
/// Every public operation validates its arguments first; a validation
/// failure returns before the database is touched.
pub struct RelationshipStore {
    conn: Connection,
    ctx: RelationshipContext,
}

impl RelationshipStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path, ctx: RelationshipContext) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, ctx)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory(ctx: RelationshipContext) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, ctx)
    }

    fn with_connection(conn: Connection, ctx: RelationshipContext) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let store = Self { conn, ctx };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::relationship_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// The registries this store validates against and notifies
    pub fn context(&self) -> &RelationshipContext {
        &self.ctx
    }

    /// Validate the four arguments of a pair operation against the current type set
    pub fn validate(
        &self,
        left_id: impl IdArg,
        left_type: &str,
        right_type: &str,
        right_id: impl IdArg,
    ) -> Result<PairArgs> {
        validate::validate_pair(&self.ctx.types, left_id, left_type, right_type, right_id)
    }

    fn notify(&self, kind: EventKind, relationship_id: RelationshipId, args: &PairArgs) {
        let event = RelationshipEvent::new(kind, relationship_id, args);
        self.ctx.hooks.dispatch(&event);
    }

    // ========== Lookup ==========

    fn find_forward(conn: &Connection, args: &PairArgs) -> Result<Option<RelationshipId>> {
        conn.query_row(
            "SELECT relationship_id FROM object_relationships
             WHERE left_object_id = ?1 AND left_object_type = ?2 AND right_object_type = ?3 AND right_object_id = ?4",
            params![args.left_id, args.left_type, args.right_type, args.right_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(Into::into)
    }

    fn find_reverse(conn: &Connection, args: &PairArgs) -> Result<Option<RelationshipId>> {
        conn.query_row(
            "SELECT relationship_id FROM object_relationships
             WHERE right_object_id = ?1 AND right_object_type = ?2 AND left_object_type = ?3 AND left_object_id = ?4",
            params![args.left_id, args.left_type, args.right_type, args.right_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(Into::into)
    }

    /// Forward layout first, then reverse
    fn find(conn: &Connection, args: &PairArgs) -> Result<Option<(RelationshipId, Orientation)>> {
        if let Some(id) = Self::find_forward(conn, args)? {
            return Ok(Some((id, Orientation::Forward)));
        }
        Ok(Self::find_reverse(conn, args)?.map(|id| (id, Orientation::Reverse)))
    }

    /// Look up the relationship between two objects in either orientation.
    ///
    /// Returns `None` when the pair is not related. A match fires the
    /// `existing_object_relationship` event.
    pub fn exists(
        &self,
        left_id: impl IdArg,
        left_type: &str,
        right_type: &str,
        right_id: impl IdArg,
    ) -> Result<Option<RelationshipId>> {
        let args = self.validate(left_id, left_type, right_type, right_id)?;

        let found = Self::find(&self.conn, &args)?;
        if let Some((id, orientation)) = found {
            tracing::debug!("Relationship {} found ({})", id, orientation);
            self.notify(EventKind::Existing, id, &args);
            return Ok(Some(id));
        }
        Ok(None)
    }

    // ========== Mutation ==========

    /// Find-or-insert a relationship and return its id.
    ///
    /// Lookup and insert run inside one IMMEDIATE transaction, and the unique
    /// constraint over the canonical columns backs it up, so concurrent
    /// creators of the same pair all receive the id of the single stored row.
    pub fn create(
        &mut self,
        left_id: impl IdArg,
        left_type: &str,
        right_type: &str,
        right_id: impl IdArg,
    ) -> Result<RelationshipId> {
        self.create_with_outcome(left_id, left_type, right_type, right_id)
            .map(|(id, _)| id)
    }

    /// Like [`create`](Self::create), also reporting the event that fired:
    /// `Added` when this call stored the row, `Existing` otherwise.
    pub fn create_with_outcome(
        &mut self,
        left_id: impl IdArg,
        left_type: &str,
        right_type: &str,
        right_id: impl IdArg,
    ) -> Result<(RelationshipId, EventKind)> {
        let args = self.validate(left_id, left_type, right_type, right_id)?;
        let left = Endpoint::new(args.left_id, args.left_type.as_str());
        let right = Endpoint::new(args.right_id, args.right_type.as_str());
        let (low, high) = relationship::canonical(&left, &right);

        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (id, kind) = match Self::find(&tx, &args)? {
            Some((id, _)) => (id, EventKind::Existing),
            None => {
                let inserted = tx.execute(
                    r#"
                    INSERT INTO object_relationships (
                        left_object_id, left_object_type, right_object_type, right_object_id,
                        low_object_type, low_object_id, high_object_type, high_object_id
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(low_object_type, low_object_id, high_object_type, high_object_id) DO NOTHING
                    "#,
                    params![
                        args.left_id, args.left_type, args.right_type, args.right_id,
                        low.object_type, low.id, high.object_type, high.id
                    ],
                )?;

                if inserted == 1 {
                    (tx.last_insert_rowid(), EventKind::Added)
                } else {
                    let stored = tx.query_row(
                        &format!(
                            "{} WHERE low_object_type = ?1 AND low_object_id = ?2 AND high_object_type = ?3 AND high_object_id = ?4",
                            SELECT_RELATIONSHIP
                        ),
                        params![low.object_type, low.id, high.object_type, high.id],
                        |row| Self::row_to_relationship(row),
                    )?;
                    match stored.matches(&left, &right) {
                        Some(orientation) => {
                            tracing::debug!("Relationship {} stored concurrently ({})", stored.id, orientation)
                        }
                        None => tracing::warn!("Conflicting row {} does not match {} <-> {}", stored, left, right),
                    }
                    (stored.id, EventKind::Existing)
                }
            }
        };

        tx.commit()?;

        if kind == EventKind::Added {
            tracing::info!("Added relationship {}: {} <-> {}", id, left, right);
        } else {
            tracing::debug!("Relationship {} already exists", id);
        }
        self.notify(kind, id, &args);

        Ok((id, kind))
    }

    /// Delete the relationship between two objects, in whichever orientation it is stored.
    ///
    /// Returns the removed id, or `None` when nothing matched. Deleting an
    /// absent relationship is not an error and fires no events.
    pub fn delete(
        &mut self,
        left_id: impl IdArg,
        left_type: &str,
        right_type: &str,
        right_id: impl IdArg,
    ) -> Result<Option<RelationshipId>> {
        let args = self.validate(left_id, left_type, right_type, right_id)?;

        let Some((id, orientation)) = Self::find(&self.conn, &args)? else {
            tracing::debug!(
                "No relationship to delete: {}:{} <-> {}:{}",
                args.left_type, args.left_id, args.right_type, args.right_id
            );
            return Ok(None);
        };

        self.notify(EventKind::PreDelete, id, &args);

        let removed = self.conn.execute(
            "DELETE FROM object_relationships WHERE relationship_id = ?1",
            [id],
        )?;

        if removed == 0 {
            // Another connection removed it between lookup and delete
            tracing::debug!("Relationship {} vanished before delete", id);
            return Ok(None);
        }

        tracing::info!("Deleted relationship {} ({})", id, orientation);
        self.notify(EventKind::Deleted, id, &args);
        Ok(Some(id))
    }

    // ========== Directional Lookup ==========

    /// IDs of the objects related to `object_id`.
    ///
    /// Forward matches (`object_id` stored as a `left_type` on the left) come
    /// first, then reverse matches (stored as a `left_type` on the right),
    /// each in table order. No de-duplication.
    pub fn related_ids(
        &self,
        object_id: impl IdArg,
        left_type: &str,
        right_type: &str,
    ) -> Result<Vec<ObjectId>> {
        let args = validate::validate_lookup(&self.ctx.types, object_id, left_type, right_type)?;

        let mut forward = self.conn.prepare(
            "SELECT right_object_id FROM object_relationships
             WHERE left_object_id = ?1 AND left_object_type = ?2 AND right_object_type = ?3
             ORDER BY relationship_id",
        )?;
        let mut ids = forward
            .query_map(params![args.object_id, args.left_type, args.right_type], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<ObjectId>>>()?;

        let mut reverse = self.conn.prepare(
            "SELECT left_object_id FROM object_relationships
             WHERE right_object_id = ?1 AND right_object_type = ?2 AND left_object_type = ?3
             ORDER BY relationship_id",
        )?;
        let reverse_ids = reverse
            .query_map(params![args.object_id, args.left_type, args.right_type], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<ObjectId>>>()?;

        tracing::debug!(
            "Related {}:{} -> {}: {} forward, {} reverse",
            args.left_type, args.object_id, args.right_type, ids.len(), reverse_ids.len()
        );

        ids.extend(reverse_ids);
        Ok(ids)
    }

    // ========== Reads ==========

    /// Get a relationship by id
    pub fn get(&self, id: RelationshipId) -> Result<Option<Relationship>> {
        self.conn
            .query_row(
                &format!("{} WHERE relationship_id = ?1", SELECT_RELATIONSHIP),
                [id],
                |row| Self::row_to_relationship(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// All relationships in table order
    pub fn list(&self) -> Result<Vec<Relationship>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY relationship_id", SELECT_RELATIONSHIP))?;

        let relationships = stmt
            .query_map([], |row| Self::row_to_relationship(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(relationships)
    }

    /// Count all relationships
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM object_relationships", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        let mut stmt = self.conn.prepare(
            "SELECT object_type, COUNT(*) FROM (
                SELECT left_object_type AS object_type FROM object_relationships
                UNION ALL
                SELECT right_object_type AS object_type FROM object_relationships
             ) GROUP BY object_type ORDER BY object_type",
        )?;

        let endpoints_by_type = stmt
            .query_map([], |row| {
                let object_type: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((object_type, count as usize))
            })?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;

        let last_id: Option<i64> = self
            .conn
            .query_row("SELECT MAX(relationship_id) FROM object_relationships", [], |row| row.get(0))?;

        Ok(StoreStats {
            relationships: self.count()?,
            last_id: last_id.unwrap_or(0),
            endpoints_by_type,
        })
    }

    /// Helper to convert a row to a Relationship
    fn row_to_relationship(row: &rusqlite::Row) -> rusqlite::Result<Relationship> {
        let left_type: String = row.get(2)?;
        let right_type: String = row.get(3)?;
        Ok(Relationship::new(
            row.get(0)?,
            Endpoint::new(row.get(1)?, left_type),
            Endpoint::new(row.get(4)?, right_type),
        ))
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreStats {
    pub relationships: usize,
    /// Highest id handed out among live rows (0 when empty)
    pub last_id: RelationshipId,
    /// How often each object type appears as an endpoint
    pub endpoints_by_type: BTreeMap<String, usize>,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Relationships: {}", self.relationships)?;
        writeln!(f, "  Last id: {}", self.last_id)?;
        for (object_type, count) in &self.endpoints_by_type {
            writeln!(f, "  {}: {}", object_type, count)?;
        }
        Ok(())
    }
}
