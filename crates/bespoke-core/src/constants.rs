//! Claves del almacén compartido.
//!
//! Coordinadores y workers leen y escriben las mismas claves; cambiar un
//! nombre aquí rompe la compatibilidad con datos ya almacenados.

pub const TASK_ID_COUNTER_KEY: &str = "coordinator:id-counter";
pub const PENDING_TASKS_KEY: &str = "coordinator:pending-tasks";
pub const RUNNING_TASKS_KEY: &str = "coordinator:running-tasks";
pub const COMPLETE_TASKS_KEY: &str = "coordinator:complete-tasks";

/// fingerprint -> id de job QC.
pub const QC_TASK_IDS_KEY: &str = "qcgenerator:task-ids";
/// id de job QC -> tipo declarado.
pub const QC_TYPES_KEY: &str = "qcgenerator:types";

pub fn task_key(id: u64) -> String {
    format!("coordinator:task:{id}")
}

pub fn parameter_cache_key(fingerprint: &str) -> String {
    format!("optimizer:parameters:{fingerprint}")
}

pub fn job_key(family: &str, id: &str) -> String {
    format!("worker:{family}:job:{id}")
}

pub fn queue_key(family: &str) -> String {
    format!("worker:{family}:queue")
}
