//! Acquisition of the namespace cache.
//!
//! The handler asks a [`CacheSource`] for a lister on every request. The
//! production source, [`LazyCache`], connects once and hands out the same
//! cache afterwards.

use async_trait::async_trait;
use namespace_cache::{CacheError, ConnectionConfig, NamespaceCache, NamespaceLister};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Produces the namespace lister a request should query.
#[async_trait]
pub trait CacheSource: Send + Sync {
    /// Returns the lister, connecting first if needed.
    ///
    /// # Errors
    ///
    /// Returns the configuration or connection error if no lister can be
    /// produced.
    async fn acquire(&self) -> Result<Arc<dyn NamespaceLister>, CacheError>;
}

/// An already-built lister is its own source.
#[async_trait]
impl<L: NamespaceLister + 'static> CacheSource for Arc<L> {
    async fn acquire(&self) -> Result<Arc<dyn NamespaceLister>, CacheError> {
        Ok(Arc::clone(self) as Arc<dyn NamespaceLister>)
    }
}

/// Connects to the cluster on first use and memoises the cache.
///
/// A failed connection is not memoised; the next `acquire` tries again.
#[derive(Debug, Default)]
pub struct LazyCache {
    cache: OnceCell<Arc<NamespaceCache>>,
}

impl LazyCache {
    /// Creates an unconnected source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once a connection has succeeded.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.cache.initialized()
    }
}

#[async_trait]
impl CacheSource for LazyCache {
    async fn acquire(&self) -> Result<Arc<dyn NamespaceLister>, CacheError> {
        let cache = self
            .cache
            .get_or_try_init(|| async {
                let config = ConnectionConfig::infer().await?;
                let cache = config.connect().await?;
                info!("Namespace cache started");
                Ok::<_, CacheError>(Arc::new(cache))
            })
            .await?;
        Ok(Arc::clone(cache) as Arc<dyn NamespaceLister>)
    }
}
