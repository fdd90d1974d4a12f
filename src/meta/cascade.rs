//! Metadata cleanup when a relationship is deleted

use super::MetaStore;
use crate::hooks::{EventKind, HookRegistry, RelationshipEvent, RelationshipHook};
use crate::Result;
use std::sync::Arc;

/// Hook that removes every metadata entry of a deleted relationship.
///
/// Runs after the row is gone. If it fails partway the remaining entries
/// stay orphaned; the deletion itself is never rolled back.
pub struct MetaCascade {
    meta: Arc<dyn MetaStore>,
}

impl MetaCascade {
    pub fn new(meta: Arc<dyn MetaStore>) -> Self {
        Self { meta }
    }

    /// Subscribe a cascade for `meta` to the deletion event
    pub fn install(hooks: &HookRegistry, meta: Arc<dyn MetaStore>) {
        hooks.register(EventKind::Deleted, Arc::new(Self::new(meta)));
    }
}

impl RelationshipHook for MetaCascade {
    fn handle(&self, event: &RelationshipEvent) -> Result<()> {
        if event.kind != EventKind::Deleted {
            return Ok(());
        }

        let metas = self.meta.get_all(event.relationship_id)?;
        if metas.is_empty() {
            return Ok(());
        }

        let entries: usize = metas.values().map(Vec::len).sum();
        for key in metas.keys() {
            self.meta.delete(event.relationship_id, key, None)?;
        }

        tracing::debug!(
            "Removed {} metadata entries under {} keys for relationship {}",
            entries,
            metas.len(),
            event.relationship_id
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "meta_cascade"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::SqliteMetaStore;
    use crate::{Error, RelationshipContext, RelationshipId, RelationshipStore};
    use serde_json::{Value, json};
    use std::collections::BTreeMap;

    #[test]
    fn test_cascade_removes_all_entries() {
        let ctx = RelationshipContext::new();
        let meta = Arc::new(SqliteMetaStore::open_in_memory().unwrap());
        MetaCascade::install(&ctx.hooks, meta.clone());

        let mut store = RelationshipStore::open_in_memory(ctx).unwrap();
        let id = store.create(1, "post", "user", 2).unwrap();
        let other = store.create(1, "post", "user", 3).unwrap();

        meta.add(id, "role", &json!("author"), false).unwrap();
        meta.add(id, "role", &json!("editor"), false).unwrap();
        meta.add(id, "since", &json!(2019), false).unwrap();
        meta.add(other, "role", &json!("reader"), false).unwrap();

        store.delete(2, "user", "post", 1).unwrap();

        assert_eq!(meta.count(id).unwrap(), 0);
        assert_eq!(meta.count(other).unwrap(), 1);
    }

    #[test]
    fn test_no_metadata_is_noop() {
        let ctx = RelationshipContext::new();
        let meta = Arc::new(SqliteMetaStore::open_in_memory().unwrap());
        MetaCascade::install(&ctx.hooks, meta.clone());

        let mut store = RelationshipStore::open_in_memory(ctx).unwrap();
        store.create(1, "post", "user", 2).unwrap();
        assert!(store.delete(1, "post", "user", 2).unwrap().is_some());
    }

    struct BrokenMeta;

    impl MetaStore for BrokenMeta {
        fn add(&self, _: RelationshipId, _: &str, _: &Value, _: bool) -> Result<Option<i64>> {
            Ok(None)
        }
        fn update(&self, _: RelationshipId, _: &str, _: &Value, _: Option<&Value>) -> Result<bool> {
            Ok(false)
        }
        fn delete(&self, _: RelationshipId, _: &str, _: Option<&Value>) -> Result<bool> {
            Err(Error::Meta("metadata backend offline".to_string()))
        }
        fn get(&self, _: RelationshipId, _: &str) -> Result<Vec<Value>> {
            Ok(Vec::new())
        }
        fn get_all(&self, _: RelationshipId) -> Result<BTreeMap<String, Vec<Value>>> {
            Ok(BTreeMap::from([("role".to_string(), vec![json!("x")])]))
        }
    }

    #[test]
    fn test_cascade_failure_keeps_deletion() {
        let ctx = RelationshipContext::new();
        MetaCascade::install(&ctx.hooks, Arc::new(BrokenMeta));

        let mut store = RelationshipStore::open_in_memory(ctx).unwrap();
        let id = store.create(1, "post", "user", 2).unwrap();

        assert_eq!(store.delete(1, "post", "user", 2).unwrap(), Some(id));
        assert_eq!(store.exists(1, "post", "user", 2).unwrap(), None);
    }
}
