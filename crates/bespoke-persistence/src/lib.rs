//! bespoke-persistence
//!
//! Implementación Postgres (Diesel + r2d2) del `KeyValueStore` del core, para
//! que varios coordinadores y workers compartan cachés, registro y jobs.
//!
//! Módulos:
//! - `pg`: pool, reintentos y `PgKeyValueStore`.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_pool, build_pool_from_env, ConnectionProvider, PgKeyValueStore, PgPool, PoolProvider};
