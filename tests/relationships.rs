//! End-to-end behaviour of the relationship store against a database file

use objrel::{
    Error, EventKind, InputKind, MetaCascade, MetaStore, Param, RelationshipContext,
    RelationshipStore, SqliteMetaStore,
};
use serde_json::json;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

fn file_store(path: &std::path::Path) -> RelationshipStore {
    RelationshipStore::open(path, RelationshipContext::new()).unwrap()
}

#[test]
fn exists_is_symmetric() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = file_store(&dir.path().join("rel.db"));
    store.create(1, "post", "user", 2).unwrap();
    store.create(4, "comment", "taxonomy", 8).unwrap();

    let cases = [
        (1, "post", "user", 2),
        (4, "comment", "taxonomy", 8),
        (1, "post", "comment", 4),
        (2, "post", "user", 1),
    ];
    for (a, ta, tb, b) in cases {
        assert_eq!(store.exists(a, ta, tb, b).unwrap(), store.exists(b, tb, ta, a).unwrap());
    }
}

#[test]
fn reverse_create_returns_original_id() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = file_store(&dir.path().join("rel.db"));

    let id = store.create(1, "post", "user", 2).unwrap();
    assert_eq!(store.create(2, "user", "post", 1).unwrap(), id);
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rel.db");

    let id = file_store(&path).create(1, "post", "user", 2).unwrap();

    let store = file_store(&path);
    assert_eq!(store.exists(2, "user", "post", 1).unwrap(), Some(id));
    assert_eq!(store.related_ids(2, "user", "post").unwrap(), vec![1]);
}

#[test]
fn related_ids_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = file_store(&dir.path().join("rel.db"));
    store.create(1, "post", "user", 2).unwrap();
    store.create(3, "user", "post", 1).unwrap();

    assert_eq!(store.related_ids(1, "post", "user").unwrap(), vec![2, 3]);
    assert_eq!(store.related_ids(3, "user", "post").unwrap(), vec![1]);
}

#[test]
fn validation_errors_identify_parameter() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = file_store(&dir.path().join("rel.db"));

    match store.create(-1, "post", "user", 5) {
        Err(Error::InvalidObjectId { param, kind }) => {
            assert_eq!(param, Param::LeftObjectId);
            assert_eq!(param.position(), 1);
            assert_eq!(kind, InputKind::Negative);
        }
        other => panic!("expected InvalidObjectId, got {:?}", other),
    }

    match store.create(1, "bogus_type", "user", 5) {
        Err(Error::InvalidObjectType { param, allowed, given }) => {
            assert_eq!(param.position(), 2);
            assert_eq!(given, "bogus_type");
            assert_eq!(allowed, vec!["comment", "post", "page", "taxonomy", "user"]);
        }
        other => panic!("expected InvalidObjectType, got {:?}", other),
    }

    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn concurrent_creates_converge_on_one_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rel.db");
    file_store(&path);

    let workers = 8;
    let barrier = Arc::new(Barrier::new(workers));
    let handles: Vec<_> = (0..workers)
        .map(|i| {
            let path = path.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let mut store = file_store(&path);
                barrier.wait();
                // Half the workers use the reverse orientation
                if i % 2 == 0 {
                    store.create(10, "post", "user", 20).unwrap()
                } else {
                    store.create(20, "user", "post", 10).unwrap()
                }
            })
        })
        .collect();

    let ids: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(ids.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(file_store(&path).count().unwrap(), 1);
}

#[test]
fn one_added_event_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rel.db");

    let ctx = RelationshipContext::new();
    let added = Arc::new(Mutex::new(0));
    let counter = added.clone();
    ctx.hooks.on(EventKind::Added, move |_| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    let mut first = RelationshipStore::open(&path, ctx.clone()).unwrap();
    let mut second = RelationshipStore::open(&path, ctx).unwrap();

    let id = first.create(1, "post", "user", 2).unwrap();
    assert_eq!(second.create(2, "user", "post", 1).unwrap(), id);
    assert_eq!(*added.lock().unwrap(), 1);
}

#[test]
fn delete_cascades_metadata_in_shared_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rel.db");

    let ctx = RelationshipContext::new();
    let meta = Arc::new(SqliteMetaStore::open(&path).unwrap());
    MetaCascade::install(&ctx.hooks, meta.clone());
    let mut store = RelationshipStore::open(&path, ctx).unwrap();

    let id = store.create(1, "post", "user", 2).unwrap();
    for n in 0..5 {
        meta.add(id, "note", &json!(n), false).unwrap();
    }
    meta.add(id, "weight", &json!(0.5), true).unwrap();
    assert_eq!(meta.count(id).unwrap(), 6);

    store.delete(1, "post", "user", 2).unwrap();
    assert_eq!(meta.count(id).unwrap(), 0);
    assert!(meta.get_all(id).unwrap().is_empty());
}

#[test]
fn delete_absent_leaves_metadata_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rel.db");

    let ctx = RelationshipContext::new();
    let meta = Arc::new(SqliteMetaStore::open(&path).unwrap());
    MetaCascade::install(&ctx.hooks, meta.clone());
    let mut store = RelationshipStore::open(&path, ctx).unwrap();

    let id = store.create(1, "post", "user", 2).unwrap();
    meta.add(id, "note", &json!("keep"), false).unwrap();

    assert_eq!(store.delete(1, "post", "user", 3).unwrap(), None);
    assert_eq!(meta.count(id).unwrap(), 1);
}
