use bespoke_domain::{BespokeOptimizationSchema, FragmentationRequest, QcTask};
use log::debug;
use serde_json::Value;
use std::sync::Arc;

use crate::cache::QcComputeCache;
use crate::errors::CoreError;
use crate::store::KeyValueStore;
use crate::wire::{JobHandle, JobReport, WorkerFamily};

use super::JobQueue;

const FRAGMENTATION_TYPE: &str = "fragmentation";
const OPTIMIZATION_TYPE: &str = "optimization";

/// Servicio de una familia worker: acepta jobs y publica su estado.
#[derive(Clone)]
pub struct WorkerService {
    family: WorkerFamily,
    queue: JobQueue,
    qc_cache: QcComputeCache,
}

impl WorkerService {
    pub fn new(store: Arc<dyn KeyValueStore>, family: WorkerFamily) -> Self {
        Self { family,
               queue: JobQueue::new(store.clone(), family),
               qc_cache: QcComputeCache::new(store) }
    }

    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    pub fn submit(&self, body: &Value) -> Result<JobHandle, CoreError> {
        match self.family {
            WorkerFamily::Fragmentations => {
                let _request: FragmentationRequest = parse(body)?;
                let record = self.queue.enqueue(FRAGMENTATION_TYPE, body.clone())?;
                Ok(JobHandle { id: record.id,
                               kind: record.kind })
            }
            WorkerFamily::Optimizations => {
                let schema: BespokeOptimizationSchema = parse(body)?;
                schema.validate()?;
                let record = self.queue.enqueue(OPTIMIZATION_TYPE, body.clone())?;
                Ok(JobHandle { id: record.id,
                               kind: record.kind })
            }
            WorkerFamily::QcCalcs => {
                let task: QcTask = parse(body)?;
                self.qc_cache.cached_compute(&task)
            }
        }
    }

    pub fn report(&self, id: &str) -> Result<JobReport, CoreError> {
        let record = self.queue.get(id)?.ok_or_else(|| CoreError::JobNotFound(id.to_string()))?;
        let mut report = record.report();
        if self.family == WorkerFamily::QcCalcs {
            // El tipo publicado es el registrado por la caché, no el del job.
            report.kind = self.qc_cache
                              .task_type(id)?
                              .ok_or_else(|| CoreError::UnknownJobType(id.to_string()))?;
        }
        debug!("job report family={} id={} status={}", self.family, id, report.status);
        Ok(report)
    }

    pub fn report_many(&self, ids: &[String]) -> Result<Vec<JobReport>, CoreError> {
        ids.iter().map(|id| self.report(id)).collect()
    }
}

fn parse<T: serde::de::DeserializeOwned>(body: &Value) -> Result<T, CoreError> {
    serde_json::from_value(body.clone()).map_err(|e| CoreError::InvalidRequest(e.to_string()))
}

/// Las tres familias sobre un mismo almacén.
#[derive(Clone)]
pub struct WorkerServices {
    pub fragmentations: WorkerService,
    pub qc_calcs: WorkerService,
    pub optimizations: WorkerService,
}

impl WorkerServices {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { fragmentations: WorkerService::new(store.clone(), WorkerFamily::Fragmentations),
               qc_calcs: WorkerService::new(store.clone(), WorkerFamily::QcCalcs),
               optimizations: WorkerService::new(store, WorkerFamily::Optimizations) }
    }

    pub fn get(&self, family: WorkerFamily) -> &WorkerService {
        match family {
            WorkerFamily::Fragmentations => &self.fragmentations,
            WorkerFamily::QcCalcs => &self.qc_calcs,
            WorkerFamily::Optimizations => &self.optimizations,
        }
    }
}
