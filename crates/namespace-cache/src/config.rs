//! Cluster connection configuration.
//!
//! Connecting is two-phase: resolve a [`ConnectionConfig`] from the ambient
//! environment, then [`ConnectionConfig::connect`] it into a running
//! [`NamespaceCache`].

use crate::cache::NamespaceCache;
use crate::error::CacheError;
use kube::Client;
use tracing::info;

/// Resolved cluster connection settings.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    kube: kube::Config,
}

impl ConnectionConfig {
    /// Infers the configuration: in-cluster service account first, then the
    /// local kubeconfig (`KUBECONFIG` or `~/.kube/config`).
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Config`] if neither source is usable.
    pub async fn infer() -> Result<Self, CacheError> {
        let kube = kube::Config::infer().await?;
        Ok(Self { kube })
    }

    /// API server URL this configuration points at.
    #[must_use]
    pub fn cluster_url(&self) -> String {
        self.kube.cluster_url.to_string()
    }

    /// Connects to the API server and starts the namespace sync loop.
    ///
    /// The server version is fetched first so an unreachable or unauthorized
    /// cluster fails here rather than inside the background watch.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the client cannot be built or
    /// the API server cannot be reached.
    pub async fn connect(&self) -> Result<NamespaceCache, CacheError> {
        info!("Connecting to Kubernetes API at {}", self.cluster_url());
        let client = Client::try_from(self.kube.clone())?;

        let version = client.apiserver_version().await?;
        info!("Connected to Kubernetes {}", version.git_version);

        Ok(NamespaceCache::spawn(client))
    }
}

impl From<kube::Config> for ConnectionConfig {
    fn from(kube: kube::Config) -> Self {
        Self { kube }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_to_unreachable_cluster_fails() {
        let url = "http://127.0.0.1:1".parse().unwrap();
        let config = ConnectionConfig::from(kube::Config::new(url));
        assert!(config.cluster_url().starts_with("http://127.0.0.1:1"));

        let err = config.connect().await.unwrap_err();
        assert!(matches!(err, CacheError::Connection(_)), "unexpected error: {err}");
    }

    #[tokio::test]
    #[ignore] // Requires a reachable cluster (in-cluster or kubeconfig)
    async fn test_connect_and_sync() {
        let cache = ConnectionConfig::infer().await.unwrap().connect().await.unwrap();
        assert!(cache.wait_until_synced().await);
        assert!(!cache.list(&crate::Selector::everything()).is_empty());
    }
}
