use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::errors::{CoreError, TransportError};
use crate::store::blocking;
use crate::wire::{JobHandle, JobReport, WorkerFamily};

use super::WorkerServices;

/// Acceso de los stages a los servicios worker.
///
/// Implementaciones: `LocalWorkerClient` (en proceso) y el cliente HTTP del
/// crate de adapters.
#[async_trait]
pub trait WorkerClient: Send + Sync {
    async fn submit(&self, family: WorkerFamily, body: &Value) -> Result<JobHandle, TransportError>;
    async fn report(&self, family: WorkerFamily, id: &str) -> Result<JobReport, TransportError>;
    async fn report_many(&self, family: WorkerFamily, ids: &[String]) -> Result<Vec<JobReport>, TransportError>;
}

/// Cliente en proceso sobre `WorkerServices`.
///
/// Los errores del servicio se reportan igual que lo haría el gateway HTTP.
#[derive(Clone)]
pub struct LocalWorkerClient {
    services: Arc<WorkerServices>,
}

impl LocalWorkerClient {
    pub fn new(services: Arc<WorkerServices>) -> Self {
        Self { services }
    }
}

fn as_transport(e: CoreError) -> TransportError {
    TransportError::Status { status: e.status_code(),
                             body: e.to_string() }
}

#[async_trait]
impl WorkerClient for LocalWorkerClient {
    async fn submit(&self, family: WorkerFamily, body: &Value) -> Result<JobHandle, TransportError> {
        let services = self.services.clone();
        let body = body.clone();
        blocking(move || services.get(family).submit(&body)).await.map_err(as_transport)
    }

    async fn report(&self, family: WorkerFamily, id: &str) -> Result<JobReport, TransportError> {
        let services = self.services.clone();
        let id = id.to_string();
        blocking(move || services.get(family).report(&id)).await.map_err(as_transport)
    }

    async fn report_many(&self, family: WorkerFamily, ids: &[String]) -> Result<Vec<JobReport>, TransportError> {
        let services = self.services.clone();
        let ids = ids.to_vec();
        blocking(move || services.get(family).report_many(&ids)).await.map_err(as_transport)
    }
}
