//! Namespace Cache
//!
//! Read-only, in-memory mirror of the cluster's `Namespace` objects.
//!
//! A background watch (initial list + change notifications) keeps a
//! `kube_runtime` reflector store current; queries evaluate a label
//! [`Selector`] against the local store and never touch the network.
//!
//! # Example
//!
//! ```no_run
//! use namespace_cache::{ConnectionConfig, Requirement, Selector};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = ConnectionConfig::infer().await?.connect().await?;
//! if cache.wait_until_synced().await {
//!     let selector: Selector = [Requirement::equals("konflux.ci/type", "user")?]
//!         .into_iter()
//!         .collect();
//!     for entry in cache.list(&selector) {
//!         println!("{}", entry.name);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod lister;
pub mod selector;

pub use cache::{NamespaceCache, NamespaceEntry};
pub use config::ConnectionConfig;
pub use error::{CacheError, SelectorError};
pub use lister::NamespaceLister;
pub use selector::{Operator, Requirement, Selector};
