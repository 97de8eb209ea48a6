use bespoke_domain::QcTask;
use log::{debug, info};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::constants::{QC_TASK_IDS_KEY, QC_TYPES_KEY};
use crate::errors::{CoreError, StoreError};
use crate::hashing::fingerprint;
use crate::store::KeyValueStore;
use crate::wire::{JobHandle, WorkerFamily};
use crate::worker::JobQueue;

/// Campos sin efecto sobre el resultado químico.
const PRESENTATION_FIELDS: [&str; 2] = ["name", "description"];
const DEFAULT_SCAN_RANGE: (i32, i32) = (-165, 180);

/// Memoización de cálculos QC por fingerprint del request canónico.
#[derive(Clone)]
pub struct QcComputeCache {
    store: Arc<dyn KeyValueStore>,
    queue: JobQueue,
}

impl QcComputeCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let queue = JobQueue::new(store.clone(), WorkerFamily::QcCalcs);
        Self { store, queue }
    }

    /// Forma canónica de una tarea QC: sólo lo que afecta a la química.
    pub fn canonicalize(task: &QcTask) -> Result<Value, CoreError> {
        let mut task = task.clone();
        match &mut task {
            QcTask::Torsion1D(t) => {
                t.smiles = t.smiles.trim().to_string();
                t.program = t.program.to_lowercase();
                t.model.method = t.model.method.to_lowercase();
                t.model.basis = t.model.basis.as_ref().map(|b| b.to_lowercase());
                let (a, b) = t.central_bond;
                t.central_bond = (a.min(b), a.max(b));
                t.scan_range.get_or_insert(DEFAULT_SCAN_RANGE);
            }
            QcTask::Optimization(t) => {
                t.smiles = t.smiles.trim().to_string();
                t.program = t.program.to_lowercase();
                t.model.method = t.model.method.to_lowercase();
                t.model.basis = t.model.basis.as_ref().map(|b| b.to_lowercase());
            }
            QcTask::Hessian(t) => {
                t.smiles = t.smiles.trim().to_string();
                t.program = t.program.to_lowercase();
                t.model.method = t.model.method.to_lowercase();
                t.model.basis = t.model.basis.as_ref().map(|b| b.to_lowercase());
            }
        }
        let mut value = serde_json::to_value(&task)?;
        if let Value::Object(map) = &mut value {
            strip_presentation(map);
        }
        Ok(value)
    }

    pub fn fingerprint(task: &QcTask) -> Result<String, CoreError> {
        Ok(fingerprint(&Self::canonicalize(task)?))
    }

    /// Id ya registrado para una tarea equivalente, si existe.
    pub fn lookup(&self, task: &QcTask) -> Result<Option<String>, CoreError> {
        let fp = Self::fingerprint(task)?;
        Ok(self.store.hget(QC_TASK_IDS_KEY, &fp)?)
    }

    pub fn task_type(&self, id: &str) -> Result<Option<String>, StoreError> {
        self.store.hget(QC_TYPES_KEY, id)
    }

    /// Devuelve el job de una tarea equivalente o encola uno nuevo.
    ///
    /// Orden de escritura en un miss: primero `id -> tipo`, después
    /// `fingerprint -> id`. Un id sin fingerprint sólo cuesta un cálculo
    /// duplicado; un fingerprint hacia un id sin tipo no se podría
    /// interpretar.
    pub fn cached_compute(&self, task: &QcTask) -> Result<JobHandle, CoreError> {
        let fp = Self::fingerprint(task)?;
        let declared = task.type_name().to_string();

        if let Some(id) = self.store.hget(QC_TASK_IDS_KEY, &fp)? {
            let kind = self.task_type(&id)?.unwrap_or(declared);
            debug!("qc cache hit fingerprint={} id={}", short(&fp), id);
            return Ok(JobHandle { id, kind });
        }

        let record = self.queue.enqueue(&declared, serde_json::to_value(task)?)?;
        self.store.hset(QC_TYPES_KEY, &record.id, &declared)?;
        self.store.hset(QC_TASK_IDS_KEY, &fp, &record.id)?;
        info!("qc cache miss fingerprint={} id={} type={}", short(&fp), record.id, declared);
        Ok(JobHandle { id: record.id, kind: declared })
    }

    /// Siembra un resultado precalculado sin pasar por la cola.
    ///
    /// Devuelve `false` (sin escribir nada) si ya había una tarea equivalente.
    pub fn insert_if_absent(&self, task: &QcTask, id: &str, result: Value) -> Result<bool, CoreError> {
        let fp = Self::fingerprint(task)?;
        if self.store.hget(QC_TASK_IDS_KEY, &fp)?.is_some() {
            return Ok(false);
        }
        let declared = task.type_name();
        self.queue.insert_completed(id, declared, serde_json::to_value(task)?, result)?;
        self.store.hset(QC_TYPES_KEY, id, declared)?;
        let inserted = self.store.hset_if_absent(QC_TASK_IDS_KEY, &fp, id)?;
        debug!("qc cache seed fingerprint={} id={} inserted={}", short(&fp), id, inserted);
        Ok(inserted)
    }
}

fn strip_presentation(map: &mut Map<String, Value>) {
    for field in PRESENTATION_FIELDS {
        map.remove(field);
    }
}

fn short(fp: &str) -> &str {
    &fp[..fp.len().min(12)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use bespoke_domain::QcSpec;

    fn spec(method: &str) -> QcSpec {
        QcSpec { program: "Psi4".into(),
                 method: method.into(),
                 basis: Some("DZVP".into()) }
    }

    #[test]
    fn equivalent_requests_share_a_fingerprint() {
        let a = QcTask::torsion("CCO", (1, 2), &spec("B3LYP-D3BJ"));
        let mut b = QcTask::torsion("  CCO ", (2, 1), &spec("b3lyp-d3bj"));
        if let QcTask::Torsion1D(t) = &mut b {
            t.name = Some("ethanol scan".into());
            t.scan_range = Some((-165, 180));
        }
        assert_eq!(QcComputeCache::fingerprint(&a).unwrap(), QcComputeCache::fingerprint(&b).unwrap());
    }

    #[test]
    fn different_chemistry_differs() {
        let a = QcTask::torsion("CCO", (1, 2), &spec("b3lyp"));
        let b = QcTask::torsion("CCO", (1, 2), &spec("pbe0"));
        let c = QcTask::hessian("CCO", &spec("b3lyp"));
        let fa = QcComputeCache::fingerprint(&a).unwrap();
        assert_ne!(fa, QcComputeCache::fingerprint(&b).unwrap());
        assert_ne!(fa, QcComputeCache::fingerprint(&c).unwrap());
    }

    #[test]
    fn miss_records_type_and_fingerprint() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
        let cache = QcComputeCache::new(store.clone());
        let task = QcTask::optimization("CCO", &spec("b3lyp"));
        let handle = cache.cached_compute(&task).unwrap();
        assert_eq!(handle.kind, "optimization");
        assert_eq!(cache.task_type(&handle.id).unwrap().as_deref(), Some("optimization"));
        assert_eq!(cache.lookup(&task).unwrap(), Some(handle.id));
    }
}
