use bespoke_core::{TaskRepository, WorkerServices};
use std::sync::Arc;

#[derive(Clone)]
pub struct CoordinatorState {
    pub repo: TaskRepository,
    /// Prefijo de rutas, usado para construir los enlaces `self`.
    pub prefix: String,
}

#[derive(Clone)]
pub struct WorkerState {
    pub services: Arc<WorkerServices>,
}
