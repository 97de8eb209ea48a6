mod coordinator;
mod workers;

use axum::Router;

pub use coordinator::coordinator_router;
pub use workers::worker_router;

use crate::error::ApiError;

/// Monta `inner` bajo `prefix` (axum no permite anidar en la raíz).
pub(crate) fn mount(prefix: &str, inner: Router) -> Router {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        Router::new().merge(inner)
    } else if prefix.starts_with('/') {
        Router::new().nest(prefix, inner)
    } else {
        Router::new().nest(&format!("/{prefix}"), inner)
    }
}

/// Ejecuta operaciones de almacén (posiblemente bloqueantes) fuera del
/// runtime async.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
    where F: FnOnce() -> Result<T, ApiError> + Send + 'static,
          T: Send + 'static
{
    tokio::task::spawn_blocking(f).await
                                  .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?
}
