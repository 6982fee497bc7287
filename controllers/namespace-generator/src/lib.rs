//! Namespace Generator
//!
//! ApplicationSet plugin generator that answers `getparams.execute` with the
//! cluster namespaces matching a label selector.
//!
//! Each request runs a straight pipeline, failing early at any stage:
//! decode → translate selector → acquire cache → wait for sync → query → respond.
//! The only state is the namespace cache, shared read-only by all requests.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod routes;
pub mod server;
pub mod source;

pub use auth::ApiKey;
pub use config::{ListenerMode, ServerConfig};
pub use error::ServerError;
pub use handler::{GenerateHandler, HandlerError};
pub use routes::{app, router};
pub use source::{CacheSource, LazyCache};
