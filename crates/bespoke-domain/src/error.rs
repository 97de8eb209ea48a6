use thiserror::Error;

/// Error del dominio: entradas que no cumplen las reglas del esquema.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    ValidationError(String),
}
