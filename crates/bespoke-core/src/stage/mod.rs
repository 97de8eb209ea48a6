//! Protocolo de stages: `enter` envía el trabajo a un servicio worker y
//! `update` consulta su estado.
//!
//! Ningún fallo sale como `Err`: un error de transporte o de cómputo deja el
//! stage en `errored` con el mensaje. `update` sobre un stage terminal no
//! hace nada.
mod fragmentation;
mod optimization;
mod qc_generation;
mod retry;
mod smirks;

pub use fragmentation::FragmentationStage;
pub use optimization::{OptimizationResult, OptimizationStage, Provenance};
pub use qc_generation::{derive_qc_tasks, QcGenerationStage};
pub use retry::{with_retry, RetryPolicy};
pub use smirks::{RetainSmirks, SmirksRegenerator};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::cache::ParameterCache;
use crate::status::Status;
use crate::task::Task;
use crate::worker::WorkerClient;

/// Handles que un stage necesita durante un tick.
#[derive(Clone, Copy)]
pub struct StageContext<'a> {
    pub client: &'a dyn WorkerClient,
    pub parameter_cache: &'a ParameterCache,
    pub smirks: &'a dyn SmirksRegenerator,
    pub retry: &'a RetryPolicy,
}

/// Propietario de los handles compartidos; se construye una vez al arrancar
/// el proceso y presta un `StageContext` por tick.
#[derive(Clone)]
pub struct StageServices {
    pub client: Arc<dyn WorkerClient>,
    pub parameter_cache: ParameterCache,
    pub smirks: Arc<dyn SmirksRegenerator>,
    pub retry: RetryPolicy,
}

impl StageServices {
    pub fn new(client: Arc<dyn WorkerClient>, parameter_cache: ParameterCache) -> Self {
        Self { client,
               parameter_cache,
               smirks: Arc::new(RetainSmirks),
               retry: RetryPolicy::default() }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_smirks_regenerator(mut self, smirks: Arc<dyn SmirksRegenerator>) -> Self {
        self.smirks = smirks;
        self
    }

    pub fn context(&self) -> StageContext<'_> {
        StageContext { client: self.client.as_ref(),
                       parameter_cache: &self.parameter_cache,
                       smirks: self.smirks.as_ref(),
                       retry: &self.retry }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Stage {
    Fragmentation(FragmentationStage),
    QcGeneration(QcGenerationStage),
    Optimization(OptimizationStage),
}

impl Stage {
    /// Secuencia por defecto de una tarea nueva.
    pub fn default_sequence() -> Vec<Stage> {
        vec![Stage::Fragmentation(FragmentationStage::default()),
             Stage::QcGeneration(QcGenerationStage::default()),
             Stage::Optimization(OptimizationStage::default())]
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Stage::Fragmentation(_) => "fragmentation",
            Stage::QcGeneration(_) => "qc-generation",
            Stage::Optimization(_) => "optimization",
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Stage::Fragmentation(s) => s.status,
            Stage::QcGeneration(s) => s.status,
            Stage::Optimization(s) => s.status,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Stage::Fragmentation(s) => s.error.as_deref(),
            Stage::QcGeneration(s) => s.error.as_deref(),
            Stage::Optimization(s) => s.error.as_deref(),
        }
    }

    /// Resultado del stage en forma JSON (para vistas HTTP).
    pub fn results_value(&self) -> Option<Value> {
        let value = match self {
            Stage::Fragmentation(s) => s.result.as_ref().map(serde_json::to_value),
            Stage::QcGeneration(s) => s.results.as_ref().map(serde_json::to_value),
            Stage::Optimization(s) => s.result.as_ref().map(serde_json::to_value),
        };
        value.and_then(Result::ok)
    }

    pub async fn enter(&mut self, task: &Task, ctx: &StageContext<'_>) {
        match self {
            Stage::Fragmentation(s) => s.enter(task, ctx).await,
            Stage::QcGeneration(s) => s.enter(task, ctx).await,
            Stage::Optimization(s) => s.enter(task, ctx).await,
        }
    }

    pub async fn update(&mut self, ctx: &StageContext<'_>) {
        if self.status().is_terminal() {
            return;
        }
        match self {
            Stage::Fragmentation(s) => s.update(ctx).await,
            Stage::QcGeneration(s) => s.update(ctx).await,
            Stage::Optimization(s) => s.update(ctx).await,
        }
    }
}

/// Marca un stage como fallido. Compartido por las tres variantes.
pub(crate) fn fail(status: &mut Status, error: &mut Option<String>, message: impl Into<String>) {
    *status = Status::Errored;
    *error = Some(message.into());
}

/// Aplica un estado no terminal reportado por el worker. Un stage que ya
/// corre no vuelve a `waiting`.
pub(crate) fn advance(status: &mut Status, reported: Status) {
    if *status == Status::Running && reported == Status::Waiting {
        return;
    }
    *status = reported;
}
