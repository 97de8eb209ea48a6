use bespoke_domain::BespokeOptimizationSchema;
use log::{info, warn};
use std::sync::Arc;

use super::Task;
use crate::constants::{task_key, COMPLETE_TASKS_KEY, PENDING_TASKS_KEY, RUNNING_TASKS_KEY, TASK_ID_COUNTER_KEY};
use crate::errors::{CoreError, StoreError};
use crate::stage::Stage;
use crate::status::Status;
use crate::store::KeyValueStore;

/// Persistencia de tareas y del registro de tareas activas.
///
/// El registro son tres listas: `pending` (en espera de admisión), `running`
/// (ticks en curso) y `complete` (terminales).
#[derive(Clone)]
pub struct TaskRepository {
    store: Arc<dyn KeyValueStore>,
}

impl TaskRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Crea una tarea con la secuencia de stages por defecto.
    pub fn create(&self, input: BespokeOptimizationSchema) -> Result<Task, CoreError> {
        self.create_with_stages(input, Stage::default_sequence())
    }

    pub fn create_with_stages(&self, input: BespokeOptimizationSchema, stages: Vec<Stage>) -> Result<Task, CoreError> {
        input.validate()?;
        let raw_id = self.store.incr(TASK_ID_COUNTER_KEY)?;
        let id = u64::try_from(raw_id).map_err(|_| StoreError::Codec(format!("invalid task id {raw_id}")))?;
        let task = Task::new(id, input, stages);
        self.save(&task)?;
        self.store.rpush(PENDING_TASKS_KEY, &id.to_string())?;
        info!("task created task_id={} smiles={} stages={}", id, task.input.smiles.smiles(), task.stage_count());
        Ok(task)
    }

    pub fn find(&self, id: u64) -> Result<Option<Task>, StoreError> {
        match self.store.get(&task_key(id))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn load(&self, id: u64) -> Result<Task, CoreError> {
        self.find(id)?.ok_or(CoreError::TaskNotFound(id))
    }

    pub fn save(&self, task: &Task) -> Result<(), StoreError> {
        let raw = serde_json::to_string(task)?;
        self.store.set(&task_key(task.id), &raw)
    }

    /// Tareas registradas ordenadas por id, filtradas por estado derivado.
    pub fn list(&self, status: Option<Status>, skip: usize, limit: usize) -> Result<Vec<Task>, StoreError> {
        let mut ids = Vec::new();
        for key in [COMPLETE_TASKS_KEY, RUNNING_TASKS_KEY, PENDING_TASKS_KEY] {
            ids.extend(parse_ids(self.store.lrange_all(key)?));
        }
        ids.sort_unstable();
        ids.dedup();

        let mut out = Vec::new();
        let mut matched = 0usize;
        for id in ids {
            if out.len() >= limit {
                break;
            }
            let task = match self.find(id) {
                Ok(Some(task)) => task,
                Ok(None) => continue,
                Err(StoreError::Codec(e)) => {
                    warn!("undecodable task skipped in listing task_id={} error={}", id, e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if status.is_some_and(|s| task.status() != s) {
                continue;
            }
            matched += 1;
            if matched > skip {
                out.push(task);
            }
        }
        Ok(out)
    }

    pub fn running_ids(&self) -> Result<Vec<u64>, StoreError> {
        Ok(parse_ids(self.store.lrange_all(RUNNING_TASKS_KEY)?))
    }

    pub fn pending_ids(&self) -> Result<Vec<u64>, StoreError> {
        Ok(parse_ids(self.store.lrange_all(PENDING_TASKS_KEY)?))
    }

    /// Mueve hasta `n` tareas de `pending` a `running`; devuelve sus ids.
    pub fn admit(&self, n: usize) -> Result<Vec<u64>, StoreError> {
        let mut admitted = Vec::new();
        while admitted.len() < n {
            let Some(raw) = self.store.lpop(PENDING_TASKS_KEY)? else {
                break;
            };
            self.store.rpush(RUNNING_TASKS_KEY, &raw)?;
            match raw.parse() {
                Ok(id) => admitted.push(id),
                Err(_) => warn!("non numeric task id in registry value={}", raw),
            }
        }
        Ok(admitted)
    }

    /// Saca una tarea de `running` y la registra como completa.
    pub fn retire(&self, id: u64) -> Result<(), StoreError> {
        let raw = id.to_string();
        self.store.lrem(RUNNING_TASKS_KEY, &raw)?;
        self.store.rpush(COMPLETE_TASKS_KEY, &raw)
    }

    /// Olvida una tarea del registro activo sin marcarla como completa.
    pub fn forget(&self, id: u64) -> Result<(), StoreError> {
        self.store.lrem(RUNNING_TASKS_KEY, &id.to_string()).map(|_| ())
    }
}

fn parse_ids(raw: Vec<String>) -> Vec<u64> {
    raw.into_iter().filter_map(|r| r.parse().ok()).collect()
}
