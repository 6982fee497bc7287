//! Listener setup and graceful shutdown.

use crate::{
    config::{ListenerMode, ServerConfig},
    error::ServerError,
};
use axum::{Router, ServiceExt, extract::Request};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::normalize_path::NormalizePath;
use tracing::{info, warn};

/// Time allowed for in-flight TLS connections to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Serves `app` until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns [`ServerError::Tls`] if the serving certificate cannot be loaded
/// and [`ServerError::Io`] if the listener fails.
pub async fn serve(config: &ServerConfig, app: NormalizePath<Router>) -> Result<(), ServerError> {
    let service = ServiceExt::<Request>::into_make_service(app);

    match &config.listener {
        ListenerMode::Plaintext => {
            let listener = TcpListener::bind(config.listen_addr).await?;
            info!("Listening on http://{}", config.listen_addr);
            axum::serve(listener, service)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        ListenerMode::Tls {
            cert_path,
            key_path,
        } => {
            let tls = RustlsConfig::from_pem_file(cert_path, key_path)
                .await
                .map_err(ServerError::Tls)?;

            let handle = Handle::new();
            let shutdown = handle.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
            });

            info!("Listening on https://{}", config.listen_addr);
            axum_server::bind_rustls(config.listen_addr, tls)
                .handle(handle)
                .serve(service)
                .await?;
        }
    }

    info!("Server stopped");
    Ok(())
}

/// Completes on the first SIGINT or SIGTERM.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => info!("Received SIGINT, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
