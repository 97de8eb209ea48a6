//! bespoke-core: orquestación de stages y cachés por contenido.
//!
//! Un `Task` avanza stage a stage mediante ticks del `CycleScheduler`; el
//! `Poller` aplica esos ticks sobre el registro de tareas activas. El trabajo
//! costoso vive en servicios worker alcanzados a través de `WorkerClient`.
pub mod cache;
pub mod constants;
pub mod errors;
pub mod hashing;
pub mod poller;
pub mod scheduler;
pub mod stage;
pub mod status;
pub mod store;
pub mod task;
pub mod wire;
pub mod worker;

pub use cache::{ParameterCache, QcComputeCache};
pub use errors::{CoreError, StoreError, TransportError};
pub use poller::{PassReport, Poller, PollerSettings};
pub use scheduler::{CycleOutcome, CycleScheduler, EnterPolicy};
pub use stage::{RetainSmirks, RetryPolicy, SmirksRegenerator, Stage, StageContext, StageServices};
pub use status::Status;
pub use store::{blocking, InMemoryStore, KeyValueStore};
pub use task::{Task, TaskRepository};
pub use wire::{JobHandle, JobReport, WorkerFamily};
pub use worker::{JobQueue, JobRecord, LocalWorkerClient, WorkerClient, WorkerService, WorkerServices};
