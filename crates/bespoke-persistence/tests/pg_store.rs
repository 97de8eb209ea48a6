use bespoke_core::{KeyValueStore, ParameterCache, TaskRepository};
use bespoke_domain::BespokeOptimizationSchema;
use bespoke_persistence::{build_pool, DbConfig, PgKeyValueStore};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

fn store() -> Option<PgKeyValueStore<bespoke_persistence::PoolProvider>> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip (no DATABASE_URL)");
        return None;
    }
    let cfg = DbConfig::from_env().expect("config");
    let pool = build_pool(&cfg.url, 1, 2).expect("pool");
    Some(PgKeyValueStore::from_pool(pool))
}

// claves únicas por test para no chocar con ejecuciones previas
fn key(name: &str) -> String {
    format!("test:{}:{name}", Uuid::new_v4())
}

#[test]
fn strings_and_counters() {
    let Some(store) = store() else { return };
    let k = key("s");
    assert_eq!(store.get(&k).unwrap(), None);
    assert!(store.set_if_absent(&k, "a").unwrap());
    assert!(!store.set_if_absent(&k, "b").unwrap());
    store.set(&k, "c").unwrap();
    assert_eq!(store.get(&k).unwrap().as_deref(), Some("c"));

    let c = key("counter");
    assert_eq!(store.incr(&c).unwrap(), 1);
    assert_eq!(store.incr(&c).unwrap(), 2);
}

#[test]
fn hashes_are_merge_only_with_hset_if_absent() {
    let Some(store) = store() else { return };
    let h = key("h");
    assert!(store.hset_if_absent(&h, "f", "1").unwrap());
    assert!(!store.hset_if_absent(&h, "f", "2").unwrap());
    store.hset(&h, "g", "3").unwrap();
    assert_eq!(store.hget(&h, "f").unwrap().as_deref(), Some("1"));
    let all = store.hgetall(&h).unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn lists_are_fifo() {
    let Some(store) = store() else { return };
    let l = key("l");
    for v in ["1", "2", "1", "3"] {
        store.rpush(&l, v).unwrap();
    }
    assert_eq!(store.llen(&l).unwrap(), 4);
    assert_eq!(store.lrem(&l, "1").unwrap(), 2);
    assert_eq!(store.lrange_all(&l).unwrap(), vec!["2", "3"]);
    assert_eq!(store.lpop(&l).unwrap().as_deref(), Some("2"));
    assert_eq!(store.lpop(&l).unwrap().as_deref(), Some("3"));
    assert_eq!(store.lpop(&l).unwrap(), None);
}

#[test]
fn core_components_run_on_postgres() {
    let Some(store) = store() else { return };
    let store: Arc<dyn KeyValueStore> = Arc::new(store);

    let cache = ParameterCache::new(store.clone());
    let fp = key("fp");
    let smirks = "[#6:1]-[#6:2]".to_string();
    cache.merge(&fp, &BTreeMap::from([(smirks.clone(), json!({"k": 1.0}))])).unwrap();
    cache.merge(&fp, &BTreeMap::from([(smirks.clone(), json!({"k": 2.0}))])).unwrap();
    assert_eq!(cache.get_cached_parameters(&fp).unwrap().unwrap()[&smirks], json!({"k": 1.0}));

    let repo = TaskRepository::new(store);
    let input: BespokeOptimizationSchema = serde_json::from_value(json!({
        "smiles": "CCO",
        "initial_force_field": {"name": "openff-2.0.0"},
        "stages": [{
            "optimizer": {"type": "ForceBalance"},
            "parameters": [{"type": "ProperTorsions", "smirks": "[*:1]~[#6:2]-[#8:3]~[*:4]"}],
            "targets": [{"type": "vibration", "reference_data": {"kind": "existing", "records": []}}]
        }]
    })).unwrap();
    let task = repo.create(input).unwrap();
    assert_eq!(repo.load(task.id).unwrap(), task);
    assert!(repo.pending_ids().unwrap().contains(&task.id));
}
