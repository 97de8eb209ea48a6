//! Errores del core.
//!
//! Dentro de un stage ningún error cruza como `Err`: se convierte en
//! `status = errored` + mensaje. `StoreError` sí se propaga hacia repositorio,
//! poller y gateway.

use bespoke_domain::DomainError;
use thiserror::Error;

/// Fallo del almacén clave-valor compartido.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
    #[error("store codec error: {0}")]
    Codec(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Codec(e.to_string())
    }
}

/// Fallo al hablar con un servicio worker.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection to worker service failed: {0}")]
    Connection(String),
    #[error("worker service responded {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed worker response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Sin respuesta o 5xx: puede resolverse reintentando.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Connection(_) => true,
            TransportError::Status { status, .. } => *status >= 500,
            TransportError::Decode(_) => false,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("task {0} not found")]
    TaskNotFound(u64),
    #[error("job {0} not found")]
    JobNotFound(String),
    #[error("job {0} has no recorded type")]
    UnknownJobType(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

impl CoreError {
    /// Código HTTP equivalente (gateway y cliente local comparten criterio).
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::TaskNotFound(_) | CoreError::JobNotFound(_) => 404,
            CoreError::InvalidRequest(_) | CoreError::Domain(_) | CoreError::Serialization(_) => 422,
            CoreError::UnknownJobType(_) | CoreError::Store(_) => 500,
        }
    }
}
