//! Superficie HTTP (axum).
//!
//! Dos routers que se sirven en listeners separados:
//! - coordinador: `{prefix}/optimizations` y `/healthz`.
//! - workers: `{prefix}/{family}` para `fragmentations`, `qc-calcs` y
//!   `optimizations`.
pub mod error;
pub mod routes;
pub mod service;
pub mod state;

pub use error::{ApiError, GatewayError};
pub use routes::{coordinator_router, worker_router};
pub use service::serve;
pub use state::{CoordinatorState, WorkerState};
