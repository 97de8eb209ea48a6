//! Traducción común de respuestas `reqwest` a `TransportError`.
use bespoke_core::TransportError;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) fn build_client() -> Result<Client, TransportError> {
    Client::builder().timeout(REQUEST_TIMEOUT)
                     .connect_timeout(CONNECT_TIMEOUT)
                     .build()
                     .map_err(|e| TransportError::Connection(e.to_string()))
}

/// Une base y prefijo sin barras duplicadas.
pub(crate) fn join(base: &str, prefix: &str) -> String {
    let base = base.trim_end_matches('/');
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{prefix}")
    }
}

pub(crate) fn send_error(e: reqwest::Error) -> TransportError {
    // sin respuesta: conexión, timeout o error de request
    TransportError::Connection(e.to_string())
}

pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::Status { status: status.as_u16(),
                                            body });
    }
    response.json::<T>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::join;

    #[test]
    fn join_normalizes_slashes() {
        assert_eq!(join("http://h:8000/", "/api/v1"), "http://h:8000/api/v1");
        assert_eq!(join("http://h:8000", "api/v1/"), "http://h:8000/api/v1");
        assert_eq!(join("http://h:8000", ""), "http://h:8000");
    }
}
