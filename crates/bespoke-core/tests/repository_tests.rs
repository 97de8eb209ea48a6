mod support;

use bespoke_core::{CoreError, InMemoryStore, KeyValueStore, Status, TaskRepository};
use serde_json::json;
use std::sync::Arc;
use support::{schema, schema_value};

fn repo() -> TaskRepository {
    let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
    TaskRepository::new(store)
}

#[test]
fn create_assigns_sequential_ids_and_default_stages() {
    let repo = repo();
    let a = repo.create(schema()).unwrap();
    let b = repo.create(schema()).unwrap();
    assert_eq!((a.id, b.id), (1, 2));
    let kinds: Vec<_> = a.pending.iter().map(|s| s.kind()).collect();
    assert_eq!(kinds, vec!["fragmentation", "qc-generation", "optimization"]);
    assert_eq!(a.status(), Status::Waiting);
    assert_eq!(repo.pending_ids().unwrap(), vec![1, 2]);
}

#[test]
fn create_rejects_invalid_input() {
    let repo = repo();
    let mut value = schema_value();
    value["stages"][0]["targets"] = json!([]);
    let err = repo.create(serde_json::from_value(value).unwrap()).unwrap_err();
    assert!(matches!(err, CoreError::Domain(_)));
    assert!(repo.pending_ids().unwrap().is_empty());
}

#[test]
fn load_roundtrips_and_missing_is_not_found() {
    let repo = repo();
    let task = repo.create(schema()).unwrap();
    assert_eq!(repo.load(task.id).unwrap(), task);
    assert!(matches!(repo.load(99), Err(CoreError::TaskNotFound(99))));
}

#[test]
fn list_paginates_in_id_order() {
    let repo = repo();
    for _ in 0..5 {
        repo.create(schema()).unwrap();
    }
    let page: Vec<u64> = repo.list(None, 1, 2).unwrap().iter().map(|t| t.id).collect();
    assert_eq!(page, vec![2, 3]);
    assert_eq!(repo.list(Some(Status::Waiting), 0, 100).unwrap().len(), 5);
    assert!(repo.list(Some(Status::Success), 0, 100).unwrap().is_empty());
}

#[test]
fn admit_and_retire_move_ids_between_queues() {
    let repo = repo();
    for _ in 0..3 {
        repo.create(schema()).unwrap();
    }
    assert_eq!(repo.admit(2).unwrap(), vec![1, 2]);
    assert_eq!(repo.running_ids().unwrap(), vec![1, 2]);
    repo.retire(1).unwrap();
    assert_eq!(repo.running_ids().unwrap(), vec![2]);
    assert_eq!(repo.pending_ids().unwrap(), vec![3]);
    // sigue listada aunque ya no esté activa
    assert_eq!(repo.list(None, 0, 10).unwrap().len(), 3);
}
