//! Almacén clave-valor compartido entre coordinadores y workers.
//!
//! Sólo operaciones atómicas sobre una clave: no hay transacciones entre
//! claves. Las escrituras que lo necesitan son idempotentes o de tipo
//! "sólo si falta".
mod memory;

pub use memory::InMemoryStore;

use std::collections::BTreeMap;

use crate::errors::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

pub trait KeyValueStore: Send + Sync {
    // strings
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    /// Devuelve `true` si la clave no existía y se escribió.
    fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<bool>;
    /// Incrementa el contador (0 si no existe) y devuelve el nuevo valor.
    fn incr(&self, key: &str) -> StoreResult<i64>;

    // hashes
    fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>>;
    fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()>;
    fn hset_if_absent(&self, key: &str, field: &str, value: &str) -> StoreResult<bool>;
    fn hgetall(&self, key: &str) -> StoreResult<BTreeMap<String, String>>;

    // lists
    fn rpush(&self, key: &str, value: &str) -> StoreResult<()>;
    fn lpop(&self, key: &str) -> StoreResult<Option<String>>;
    fn lrange_all(&self, key: &str) -> StoreResult<Vec<String>>;
    /// Elimina todas las apariciones de `value`; devuelve cuántas.
    fn lrem(&self, key: &str, value: &str) -> StoreResult<usize>;
    fn llen(&self, key: &str) -> StoreResult<usize>;

    /// Libera recursos del backend (pool de conexiones, etc.).
    fn close(&self) {}
}

/// Ejecuta operaciones de almacén fuera del runtime async: las
/// implementaciones pueden bloquear (Diesel, espera de pool, backoff).
pub async fn blocking<T, E, F>(op: F) -> Result<T, E>
    where F: FnOnce() -> Result<T, E> + Send + 'static,
          T: Send + 'static,
          E: From<StoreError> + Send + 'static
{
    match tokio::task::spawn_blocking(op).await {
        Ok(result) => result,
        Err(e) => Err(E::from(StoreError::Backend(format!("blocking store task failed: {e}")))),
    }
}
