//! Environment configuration.

use crate::error::ServerError;
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Credential file used when `NS_GEN_KEY_PATH` is unset or empty.
pub const DEFAULT_KEY_PATH: &str = "/mnt/key";
/// Listen address used when `NS_GEN_LISTEN_ADDR` is unset.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";
/// Serving certificate (PEM) in TLS mode.
pub const TLS_CERT_PATH: &str = "/mnt/serving-certs/tls.crt";
/// Serving private key (PEM) in TLS mode.
pub const TLS_KEY_PATH: &str = "/mnt/serving-certs/tls.key";
/// Default bound on the per-request wait for the initial cache sync.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(30);

const KEY_PATH_VAR: &str = "NS_GEN_KEY_PATH";
const USE_HTTP_VAR: &str = "NS_GEN_USE_HTTP";
const LISTEN_ADDR_VAR: &str = "NS_GEN_LISTEN_ADDR";
const SYNC_TIMEOUT_VAR: &str = "NS_GEN_SYNC_TIMEOUT_SECS";

/// How the listener speaks to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerMode {
    /// Plain HTTP
    Plaintext,
    /// HTTPS with the given PEM files
    Tls {
        /// Certificate chain
        cert_path: PathBuf,
        /// Private key
        key_path: PathBuf,
    },
}

/// Server settings resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// File holding the shared API key
    pub key_path: PathBuf,
    /// Socket to listen on
    pub listen_addr: SocketAddr,
    /// Plaintext or TLS
    pub listener: ListenerMode,
    /// Bound on waiting for the initial cache sync; `None` waits forever
    pub sync_timeout: Option<Duration>,
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidConfig`] for unparseable values.
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of
    /// a variable if it is set.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidConfig`] for unparseable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServerError> {
        let key_path = lookup(KEY_PATH_VAR)
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| DEFAULT_KEY_PATH.to_string())
            .into();

        // Presence alone selects plaintext, whatever the value.
        let listener = if lookup(USE_HTTP_VAR).is_some() {
            ListenerMode::Plaintext
        } else {
            ListenerMode::Tls {
                cert_path: TLS_CERT_PATH.into(),
                key_path: TLS_KEY_PATH.into(),
            }
        };

        let listen_addr = lookup(LISTEN_ADDR_VAR).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr.parse().map_err(|e| {
            ServerError::InvalidConfig(format!("{LISTEN_ADDR_VAR}={listen_addr:?}: {e}"))
        })?;

        let sync_timeout = match lookup(SYNC_TIMEOUT_VAR) {
            None => Some(DEFAULT_SYNC_TIMEOUT),
            Some(secs) => match secs.parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(e) => {
                    return Err(ServerError::InvalidConfig(format!(
                        "{SYNC_TIMEOUT_VAR}={secs:?}: {e}"
                    )));
                }
            },
        };

        Ok(Self {
            key_path,
            listen_addr,
            listener,
            sync_timeout,
        })
    }
}
