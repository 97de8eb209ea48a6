//! bespokeflow-rust
//!
//! Proceso coordinador de ajustes bespoke de campos de fuerza:
//! - `config`: configuración desde el entorno.
//! - `logging`: subscriber de `tracing` para los binarios.
//! - `app`: cableado de almacén, workers, gateway y poller.
//!
//! La lógica vive en los crates `bespoke-*`; este crate sólo los une.

pub mod app;
pub mod config;
pub mod errors;
pub mod logging;

pub use app::App;
pub use config::{AppConfig, GatewayConfig, WorkerConfig};
pub use errors::{AppError, ConfigError};
