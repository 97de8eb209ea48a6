use bespoke_core::{CoreError, TransportError};
use bespoke_gateway::GatewayError;
use bespoke_persistence::PersistenceError;
use thiserror::Error;

use super::ConfigError;

/// Errores de arranque y ejecución del proceso coordinador.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("persistencia: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("cliente de workers: {0}")]
    Transport(#[from] TransportError),
    #[error("gateway: {0}")]
    Gateway(#[from] GatewayError),
    #[error("poller: {0}")]
    Poller(#[from] CoreError),
    #[error("tarea interna: {0}")]
    Join(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_is_wrapped() {
        let err: AppError = TransportError::Connection("refused".into()).into();
        assert!(err.to_string().starts_with("cliente de workers:"));
    }

    #[test]
    fn config_error_is_transparent() {
        let inner = ConfigError::Invalid { key: "K".into(),
                                           value: "v".into(),
                                           expected: "bool" };
        let text = inner.to_string();
        let err: AppError = inner.into();
        assert_eq!(err.to_string(), text);
    }
}
