//! Plano worker: cola de jobs en el almacén, servicio por familia y el
//! seam `WorkerClient` que usan los stages.
mod client;
mod queue;
mod service;

pub use client::{LocalWorkerClient, WorkerClient};
pub use queue::{JobQueue, JobRecord};
pub use service::{WorkerService, WorkerServices};
