use axum::Router;
use log::info;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::error::GatewayError;

/// Sirve `router` en `addr` hasta que `shutdown` pase a `true`.
pub async fn serve(name: &'static str,
                   addr: SocketAddr,
                   router: Router,
                   mut shutdown: watch::Receiver<bool>)
                   -> Result<(), GatewayError> {
    let listener = TcpListener::bind(addr).await
                                          .map_err(|source| GatewayError::Bind { addr, source })?;
    info!("{} listening on {}", name, listener.local_addr()?);
    axum::serve(listener, router).with_graceful_shutdown(async move {
                                     let _ = shutdown.wait_for(|stop| *stop).await;
                                 })
                                 .await?;
    info!("{} stopped", name);
    Ok(())
}
