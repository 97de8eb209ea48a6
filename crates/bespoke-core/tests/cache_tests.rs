mod support;

use bespoke_core::{InMemoryStore, KeyValueStore, LocalWorkerClient, ParameterCache, QcComputeCache, Status, WorkerClient,
                   WorkerFamily, WorkerServices};
use bespoke_domain::{QcSpec, QcTask};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use support::{schema, schema_value};

fn store() -> Arc<dyn KeyValueStore> {
    Arc::new(InMemoryStore::new())
}

#[tokio::test]
async fn equivalent_qc_requests_dispatch_once() {
    let store = store();
    let services = Arc::new(WorkerServices::new(store.clone()));
    let client = LocalWorkerClient::new(services.clone());

    let a = json!({
        "type": "torsion1d", "smiles": "CCCC", "central_bond": [1, 2],
        "program": "psi4", "model": {"method": "b3lyp-d3bj", "basis": "dzvp"}
    });
    let b = json!({
        "name": "butane", "type": "torsion1d", "smiles": "CCCC ", "central_bond": [2, 1],
        "scan_range": [-165, 180], "program": "PSI4", "model": {"basis": "DZVP", "method": "B3LYP-D3BJ"}
    });
    let first = client.submit(WorkerFamily::QcCalcs, &a).await.unwrap();
    let second = client.submit(WorkerFamily::QcCalcs, &b).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.kind, "torsion1d");
    assert_eq!(services.qc_calcs.queue().pending_len().unwrap(), 1);
}

#[test]
fn parameter_cache_is_merge_only() {
    let cache = ParameterCache::new(store());
    let fp = "fp-1";
    let p1 = "[#6:1]-[#6:2]".to_string();
    let p2 = "[#6:1]-[#8:2]".to_string();

    assert_eq!(cache.merge(fp, &BTreeMap::from([(p1.clone(), json!({"k": 1.0}))])).unwrap(), 1);
    assert_eq!(cache.merge(fp, &BTreeMap::from([(p2.clone(), json!({"k": 2.0}))])).unwrap(), 1);
    assert_eq!(cache.merge(fp, &BTreeMap::from([(p1.clone(), json!({"k": 9.0}))])).unwrap(), 0);

    let cached = cache.get_cached_parameters(fp).unwrap().unwrap();
    assert_eq!(cached[&p1], json!({"k": 1.0}));
    assert_eq!(cached[&p2], json!({"k": 2.0}));
    assert!(cache.get_cached_parameters("other").unwrap().is_none());
}

#[test]
fn parameter_fingerprint_ignores_targets_and_reference_data() {
    let base = ParameterCache::fingerprint(&schema()).unwrap();

    let mut other_params = schema_value();
    other_params["stages"][0]["parameters"][0]["smirks"] = json!("[#1:1]-[#6:2]");
    let mut other_data = schema_value();
    other_data["stages"][0]["targets"][0]["reference_data"] = json!({"kind": "existing", "records": []});
    let mut other_settings = schema_value();
    other_settings["stages"][0]["optimizer"]["max_iterations"] = json!(50);
    let mut other_ff = schema_value();
    other_ff["initial_force_field"]["name"] = json!("openff-2.1.0");

    let fp = |v| ParameterCache::fingerprint(&serde_json::from_value(v).unwrap()).unwrap();
    assert_eq!(fp(other_params), base);
    assert_eq!(fp(other_data), base);
    assert_ne!(fp(other_settings), base);
    assert_ne!(fp(other_ff), base);
}

#[tokio::test]
async fn seeded_results_are_served_by_the_live_path() {
    let store = store();
    let cache = QcComputeCache::new(store.clone());
    let spec = QcSpec { program: "xtb".into(),
                        method: "gfn2xtb".into(),
                        basis: None };
    let task = QcTask::hessian("CCO", &spec);

    assert!(cache.insert_if_absent(&task, "seed-1", json!({"hessian": [1.0]})).unwrap());
    assert!(!cache.insert_if_absent(&task, "seed-2", json!({"hessian": [2.0]})).unwrap());

    let client = LocalWorkerClient::new(Arc::new(WorkerServices::new(store)));
    let handle = client.submit(WorkerFamily::QcCalcs, &serde_json::to_value(&task).unwrap()).await.unwrap();
    assert_eq!(handle.id, "seed-1");

    let report = client.report(WorkerFamily::QcCalcs, "seed-1").await.unwrap();
    assert_eq!(report.status, Status::Success);
    assert_eq!(report.kind, "hessian");
    assert_eq!(report.result, Some(json!({"hessian": [1.0]})));
}

#[tokio::test]
async fn qc_report_without_recorded_type_is_an_error() {
    let store = store();
    let services = WorkerServices::new(store.clone());
    // job presente en el backend pero sin entrada en el mapa de tipos
    let record = services.qc_calcs.queue().enqueue("torsion1d", json!({})).unwrap();
    let client = LocalWorkerClient::new(Arc::new(services));

    let err = client.report(WorkerFamily::QcCalcs, &record.id).await.unwrap_err();
    assert!(err.to_string().contains("no recorded type"), "unexpected error: {err}");
}
