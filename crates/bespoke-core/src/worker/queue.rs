use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::constants::{job_key, queue_key};
use crate::errors::{CoreError, StoreError};
use crate::status::Status;
use crate::store::KeyValueStore;
use crate::wire::{JobReport, WorkerFamily};

/// Registro de un job en el backend de resultados de una familia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: Status,
    pub payload: Value,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn report(&self) -> JobReport {
        JobReport { id: self.id.clone(),
                    kind: self.kind.clone(),
                    status: self.status,
                    result: self.result.clone(),
                    error: self.error.clone() }
    }
}

/// Cola FIFO de jobs de una familia worker.
///
/// Los ejecutores externos toman jobs con `claim` y publican el resultado
/// con `complete`.
#[derive(Clone)]
pub struct JobQueue {
    store: Arc<dyn KeyValueStore>,
    family: WorkerFamily,
}

impl JobQueue {
    pub fn new(store: Arc<dyn KeyValueStore>, family: WorkerFamily) -> Self {
        Self { store, family }
    }

    pub fn enqueue(&self, kind: &str, payload: Value) -> Result<JobRecord, StoreError> {
        let now = Utc::now();
        let record = JobRecord { id: Uuid::new_v4().to_string(),
                                 kind: kind.to_string(),
                                 status: Status::Waiting,
                                 payload,
                                 result: None,
                                 error: None,
                                 created_at: now,
                                 updated_at: now };
        self.save(&record)?;
        self.store.rpush(&queue_key(self.family.segment()), &record.id)?;
        debug!("job enqueued family={} id={} type={}", self.family, record.id, kind);
        Ok(record)
    }

    pub fn get(&self, id: &str) -> Result<Option<JobRecord>, StoreError> {
        match self.store.get(&job_key(self.family.segment(), id))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Saca el siguiente job en espera y lo marca `running`.
    pub fn claim(&self) -> Result<Option<JobRecord>, StoreError> {
        let key = queue_key(self.family.segment());
        while let Some(id) = self.store.lpop(&key)? {
            let Some(mut record) = self.get(&id)? else {
                warn!("queued job without record family={} id={}", self.family, id);
                continue;
            };
            if record.status != Status::Waiting {
                continue;
            }
            record.status = Status::Running;
            record.updated_at = Utc::now();
            self.save(&record)?;
            return Ok(Some(record));
        }
        Ok(None)
    }

    /// Publica el resultado de un job. Un job ya terminal no cambia.
    pub fn complete(&self, id: &str, outcome: Result<Value, String>) -> Result<JobRecord, CoreError> {
        let mut record = self.get(id)?.ok_or_else(|| CoreError::JobNotFound(id.to_string()))?;
        if record.status.is_terminal() {
            return Ok(record);
        }
        match outcome {
            Ok(result) => {
                record.status = Status::Success;
                record.result = Some(result);
            }
            Err(error) => {
                record.status = Status::Errored;
                record.error = Some(error);
            }
        }
        record.updated_at = Utc::now();
        self.save(&record)?;
        debug!("job completed family={} id={} status={}", self.family, id, record.status);
        Ok(record)
    }

    /// Registra un job ya resuelto (sembrado de caché), sin encolarlo.
    pub fn insert_completed(&self, id: &str, kind: &str, payload: Value, result: Value) -> Result<JobRecord, StoreError> {
        let now = Utc::now();
        let record = JobRecord { id: id.to_string(),
                                 kind: kind.to_string(),
                                 status: Status::Success,
                                 payload,
                                 result: Some(result),
                                 error: None,
                                 created_at: now,
                                 updated_at: now };
        self.save(&record)?;
        Ok(record)
    }

    pub fn pending_len(&self) -> Result<usize, StoreError> {
        self.store.llen(&queue_key(self.family.segment()))
    }

    fn save(&self, record: &JobRecord) -> Result<(), StoreError> {
        let raw = serde_json::to_string(record)?;
        self.store.set(&job_key(self.family.segment(), &record.id), &raw)
    }
}
