//! Modelo persistido de una tarea bespoke y su repositorio.
mod repository;

pub use repository::TaskRepository;

use bespoke_domain::{BespokeOptimizationSchema, ForceField, FragmentationResult, QcRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::stage::Stage;
use crate::status::Status;
use crate::wire::{StageView, TaskView};

/// Una tarea de ajuste bespoke.
///
/// Los stages sólo se mueven entre `pending`, `running` y `completed`; el
/// conjunto total queda fijo al crear la tarea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub input: BespokeOptimizationSchema,
    pub pending: VecDeque<Stage>,
    pub running: Option<Stage>,
    pub completed: Vec<Stage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: u64, input: BespokeOptimizationSchema, stages: Vec<Stage>) -> Self {
        let now = Utc::now();
        Self { id,
               input,
               pending: stages.into(),
               running: None,
               completed: Vec::new(),
               created_at: now,
               updated_at: now }
    }

    pub fn stage_count(&self) -> usize {
        self.pending.len() + usize::from(self.running.is_some()) + self.completed.len()
    }

    /// Estado derivado; nunca se almacena por separado.
    pub fn status(&self) -> Status {
        if self.last_completed_errored() {
            Status::Errored
        } else if self.running.is_some() {
            Status::Running
        } else if !self.pending.is_empty() {
            if self.completed.is_empty() {
                Status::Waiting
            } else {
                Status::Running
            }
        } else {
            self.completed.last().map(Stage::status).unwrap_or(Status::Success)
        }
    }

    /// Sin trabajo posible: último stage fallido o nada pendiente.
    pub fn is_terminal(&self) -> bool {
        self.last_completed_errored() || (self.running.is_none() && self.pending.is_empty())
    }

    fn last_completed_errored(&self) -> bool {
        self.completed.last().is_some_and(|s| s.status() == Status::Errored)
    }

    /// Stages en orden: completados, en curso, pendientes.
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.completed.iter().chain(self.running.iter()).chain(self.pending.iter())
    }

    pub fn fragmentation_result(&self) -> Option<&FragmentationResult> {
        self.completed.iter().find_map(|s| match s {
                                 Stage::Fragmentation(f) if f.status == Status::Success => f.result.as_ref(),
                                 _ => None,
                             })
    }

    pub fn qc_results(&self) -> Option<&BTreeMap<usize, Vec<QcRecord>>> {
        self.completed.iter().find_map(|s| match s {
                                 Stage::QcGeneration(q) if q.status == Status::Success => q.results.as_ref(),
                                 _ => None,
                             })
    }

    pub fn refit_force_field(&self) -> Option<&ForceField> {
        self.completed.iter().find_map(|s| match s {
                                 Stage::Optimization(o) if o.status == Status::Success => {
                                     o.result.as_ref().map(|r| &r.refit_force_field)
                                 }
                                 _ => None,
                             })
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn view(&self, self_link: String) -> TaskView {
        TaskView { id: self.id.to_string(),
                   self_link,
                   smiles: self.input.smiles.smiles().to_string(),
                   status: self.status(),
                   stages: self.stages()
                               .map(|s| StageView { kind: s.kind().to_string(),
                                                    status: s.status(),
                                                    error: s.error().map(str::to_string),
                                                    results: s.results_value() })
                               .collect(),
                   results: self.refit_force_field().and_then(|ff| serde_json::to_value(ff).ok()) }
    }
}
