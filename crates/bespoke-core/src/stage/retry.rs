use log::warn;
use std::future::Future;
use std::time::Duration;

use crate::errors::TransportError;

/// Presupuesto de reintentos por tipo de stage para errores transitorios.
///
/// Sólo se reintentan fallos de conexión y respuestas 5xx; un job que el
/// worker reporta como fallido nunca se reintenta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub fragmentation: u32,
    pub qc_generation: u32,
    pub optimization: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { fragmentation: 2,
               qc_generation: 2,
               optimization: 1,
               backoff: Duration::from_millis(50) }
    }
}

impl RetryPolicy {
    /// Sin reintentos: el primer fallo es definitivo.
    pub fn none() -> Self {
        Self { fragmentation: 0,
               qc_generation: 0,
               optimization: 0,
               backoff: Duration::ZERO }
    }
}

/// Ejecuta `op` reintentando errores transitorios hasta `budget` veces con
/// backoff lineal (`backoff * intento`).
pub async fn with_retry<T, F, Fut>(budget: u32, backoff: Duration, label: &str, mut op: F) -> Result<T, TransportError>
    where F: FnMut() -> Fut,
          Fut: Future<Output = Result<T, TransportError>>
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt < budget => {
                attempt += 1;
                warn!("transient worker error op={} attempt={}/{} error={}", label, attempt, budget, e);
                tokio::time::sleep(backoff * attempt).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_transient_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let out = with_retry(2, Duration::ZERO, "test", move || async move {
                      let n = calls.fetch_add(1, Ordering::SeqCst);
                      if n < 2 {
                          Err(TransportError::Connection("refused".into()))
                      } else {
                          Ok(n)
                      }
                  }).await;
        assert_eq!(out, Ok(2));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn budget_exhausted_returns_last_error() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let out: Result<(), _> = with_retry(1, Duration::ZERO, "test", move || async move {
                                     calls.fetch_add(1, Ordering::SeqCst);
                                     Err(TransportError::Status { status: 502, body: "bad gateway".into() })
                                 }).await;
        assert!(out.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let out: Result<(), _> = with_retry(5, Duration::ZERO, "test", move || async move {
                                     calls.fetch_add(1, Ordering::SeqCst);
                                     Err(TransportError::Status { status: 422, body: "invalid".into() })
                                 }).await;
        assert!(out.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
