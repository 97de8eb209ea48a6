//! Inicialización de logging para los binarios.
//! Las librerías emiten por la fachada `log`; el subscriber la reenvía.
use tracing_subscriber::EnvFilter;

/// Instala el subscriber global (`RUST_LOG`, por defecto `default_filter`).
/// Llamadas repetidas no tienen efecto.
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).try_init();
}
