//! Server startup errors.
//!
//! These end the process: no request could succeed while any of them holds.
//! Per-request failures are [`crate::handler::HandlerError`].

use namespace_cache::CacheError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the namespace generator from starting or serving.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Credential file could not be read
    #[error("Failed to read key file {path}: {source}")]
    KeyFile {
        /// Configured key path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Cluster cache could not be created
    #[error("Namespace cache error: {0}")]
    Cache(#[from] CacheError),

    /// Serving certificate or key could not be loaded
    #[error("TLS configuration error: {0}")]
    Tls(std::io::Error),

    /// Listener bind or accept failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
