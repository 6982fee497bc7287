//! Reflector-backed namespace cache.
//!
//! The sync loop is the store's only writer. It runs as a detached tokio
//! task for the life of the process; it is never joined and is abandoned,
//! not drained, at shutdown. Watch errors are retried with the default
//! backoff while the store keeps serving its last known state.

use crate::selector::{Labels, Selector};
use futures::{Stream, StreamExt};
use k8s_openapi::api::core::v1::Namespace;
use kube::{Api, Client, ResourceExt};
use kube_runtime::{
    WatchStreamExt,
    reflector::{self, Store},
    watcher,
};
use tracing::{debug, error, info, warn};

/// One cached namespace: its name and labels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceEntry {
    /// Cluster-unique namespace name
    pub name: String,
    /// Namespace labels
    pub labels: Labels,
}

/// Read-only view of the cluster's namespaces.
///
/// Cloning is cheap; clones share the same store.
#[derive(Clone)]
pub struct NamespaceCache {
    store: Store<Namespace>,
}

impl std::fmt::Debug for NamespaceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceCache")
            .field("namespaces", &self.store.len())
            .finish()
    }
}

impl NamespaceCache {
    /// Starts the sync loop against `client` and returns the cache.
    ///
    /// Must be called within a tokio runtime. The returned cache is empty
    /// until the initial listing completes; see
    /// [`NamespaceCache::wait_until_synced`].
    #[must_use]
    pub fn spawn(client: Client) -> Self {
        let api: Api<Namespace> = Api::all(client);
        let (store, writer) = reflector::store();

        let events = watcher(api, watcher::Config::default())
            .default_backoff()
            .reflect(writer);
        tokio::spawn(sync(events));

        Self { store }
    }

    /// Wraps an existing reflector store.
    #[must_use]
    pub fn from_store(store: Store<Namespace>) -> Self {
        Self { store }
    }

    /// Waits for the initial listing to be applied.
    ///
    /// Returns `false` if the sync loop ended before the first full list,
    /// in which case the cache will never become synced.
    pub async fn wait_until_synced(&self) -> bool {
        self.store.wait_until_ready().await.is_ok()
    }

    /// Namespaces whose labels satisfy `selector`, in API server list order
    /// (ascending name). This is the cache's native order; callers keep it.
    ///
    /// Reads only a snapshot of the local store, so it never waits on the
    /// sync loop and is safe to call from any number of tasks.
    #[must_use]
    pub fn list(&self, selector: &Selector) -> Vec<NamespaceEntry> {
        let mut entries = self
            .store
            .state()
            .into_iter()
            .filter(|ns| selector.matches(ns.labels()))
            .map(|ns| NamespaceEntry {
                name: ns.name_any(),
                labels: ns.labels().clone(),
            })
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// Number of cached namespaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true when no namespaces are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

/// Drives the reflector stream; each item has already been applied to the
/// store by the time it is seen here.
async fn sync<S>(events: S)
where
    S: Stream<Item = Result<watcher::Event<Namespace>, watcher::Error>>,
{
    info!("Starting Namespace watcher");

    let mut events = Box::pin(events);
    while let Some(event) = events.next().await {
        match event {
            Ok(watcher::Event::Apply(ns)) => {
                debug!("Namespace applied: {}", ns.name_any());
            }
            Ok(watcher::Event::Delete(ns)) => {
                debug!("Namespace deleted: {}", ns.name_any());
            }
            Ok(watcher::Event::Init) => {
                info!("Namespace watcher initialized");
            }
            Ok(watcher::Event::InitApply(ns)) => {
                debug!("Namespace init apply: {}", ns.name_any());
            }
            Ok(watcher::Event::InitDone) => {
                info!("Namespace watcher initialization complete");
            }
            Err(e) => {
                warn!("Namespace watcher stream error (serving last known state): {}", e);
            }
        }
    }

    error!("Namespace watcher stream ended; cache will no longer be updated");
}

#[cfg(any(test, feature = "test-util"))]
mod test_util {
    use super::NamespaceCache;
    use k8s_openapi::{api::core::v1::Namespace, apimachinery::pkg::apis::meta::v1::ObjectMeta};
    use kube_runtime::{reflector, watcher};

    /// Builds a `Namespace` object with the given labels.
    #[must_use]
    pub fn namespace(name: &str, labels: &[(&str, &str)]) -> Namespace {
        Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: (!labels.is_empty()).then(|| {
                    labels
                        .iter()
                        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                        .collect()
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    impl NamespaceCache {
        /// A cache already synced with exactly `namespaces`.
        #[must_use]
        pub fn from_namespaces(namespaces: impl IntoIterator<Item = Namespace>) -> Self {
            let (store, mut writer) = reflector::store();
            writer.apply_watcher_event(&watcher::Event::Init);
            for ns in namespaces {
                writer.apply_watcher_event(&watcher::Event::InitApply(ns));
            }
            writer.apply_watcher_event(&watcher::Event::InitDone);
            Self::from_store(store)
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
pub use test_util::namespace;
