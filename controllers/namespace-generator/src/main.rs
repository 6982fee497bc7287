//! Namespace Generator
//!
//! ArgoCD ApplicationSet plugin generator serving the names of cluster
//! namespaces that match a label selector.

use namespace_generator::{
    ApiKey, CacheSource, GenerateHandler, LazyCache, ListenerMode, ServerConfig, ServerError, app,
    router, server::serve,
};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Namespace Generator");

    // kube and axum-server both use rustls; pick ring before either builds a config
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        debug!("rustls crypto provider already installed");
    }

    let config = ServerConfig::from_env()?;

    info!("Configuration:");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Key file: {}", config.key_path.display());
    match &config.listener {
        ListenerMode::Plaintext => info!("  TLS: disabled"),
        ListenerMode::Tls { cert_path, .. } => info!("  TLS: {}", cert_path.display()),
    }
    match config.sync_timeout {
        Some(timeout) => info!("  Sync timeout: {:?}", timeout),
        None => info!("  Sync timeout: none"),
    }

    let key = ApiKey::load(&config.key_path)
        .await
        .map_err(|source| ServerError::KeyFile {
            path: config.key_path.clone(),
            source,
        })?;

    // Connect now so an unreachable cluster stops startup instead of failing requests
    let source = LazyCache::new();
    source.acquire().await?;

    let handler = GenerateHandler::new(Arc::new(source), config.sync_timeout);
    serve(&config, app(router(handler, key))).await
}
