//! Configuración de conexión desde variables de entorno.
//! Convención `DATABASE_URL` y parámetros opcionales de pool.

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;

use crate::error::PersistenceError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, PersistenceError> {
        Lazy::force(&DOTENV_LOADED);
        let url = env::var("DATABASE_URL").map_err(|_| PersistenceError::Config("DATABASE_URL not set".into()))?;
        Ok(Self { url,
                  min_connections: pool_size("DATABASE_MIN_CONNECTIONS", 2)?,
                  max_connections: pool_size("DATABASE_MAX_CONNECTIONS", 16)? })
    }

    /// `None` si no hay `DATABASE_URL` (el proceso usa el almacén en memoria).
    pub fn from_env_optional() -> Result<Option<Self>, PersistenceError> {
        Lazy::force(&DOTENV_LOADED);
        if env::var("DATABASE_URL").is_err() {
            return Ok(None);
        }
        Self::from_env().map(Some)
    }
}

fn pool_size(var: &str, default: u32) -> Result<u32, PersistenceError> {
    match env::var(var) {
        Ok(v) => v.trim()
                  .parse()
                  .map_err(|_| PersistenceError::Config(format!("{var} must be a positive integer, got {v:?}"))),
        Err(_) => Ok(default),
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
