//! Query capability over cached namespaces.
//!
//! Request handling depends on this trait rather than on [`NamespaceCache`]
//! so it can be exercised without a cluster.

use crate::cache::{NamespaceCache, NamespaceEntry};
use crate::error::CacheError;
use crate::selector::Selector;

/// Read access to a synchronized set of namespaces.
#[async_trait::async_trait]
pub trait NamespaceLister: Send + Sync {
    /// Waits until the initial synchronization has completed; `false` if it
    /// never will.
    async fn wait_until_synced(&self) -> bool;

    /// Namespaces matching `selector`, in the lister's native order.
    ///
    /// # Errors
    ///
    /// Implementations whose backing session can fail report it here.
    fn list(&self, selector: &Selector) -> Result<Vec<NamespaceEntry>, CacheError>;
}

#[async_trait::async_trait]
impl NamespaceLister for NamespaceCache {
    async fn wait_until_synced(&self) -> bool {
        Self::wait_until_synced(self).await
    }

    fn list(&self, selector: &Selector) -> Result<Vec<NamespaceEntry>, CacheError> {
        // The store is local, so a lost watch leaves stale data rather than an error.
        Ok(Self::list(self, selector))
    }
}
