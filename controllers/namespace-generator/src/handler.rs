//! `getparams.execute` request handling.

use crate::source::CacheSource;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use generator_api::{GenerateRequest, GenerateResponse, LabelSelector};
use namespace_cache::{CacheError, NamespaceLister, Requirement, Selector, SelectorError};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::debug;

/// Per-request failures, one per pipeline stage.
///
/// Responses carry only the status code; details are for the server log.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Body is not a well-formed `GenerateRequest`
    #[error("Failed to parse request body: {0}")]
    Decode(#[source] serde_json::Error),

    /// Label selector cannot be represented
    #[error("Failed to parse label selector: {0}")]
    Selector(#[from] SelectorError),

    /// Namespace cache could not be obtained
    #[error("Failed to get namespace cache: {0}")]
    Acquire(#[source] CacheError),

    /// Initial cache sync can no longer complete
    #[error("Namespace cache failed to sync")]
    NotSynced,

    /// Initial cache sync did not complete in time
    #[error("Namespace cache not synced after {0:?}")]
    SyncTimeout(Duration),

    /// Cache query failed
    #[error("Failed to list namespaces: {0}")]
    Query(#[source] CacheError),
}

impl HandlerError {
    /// Status code returned to the client.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Decode(_) | Self::Selector(_) => StatusCode::BAD_REQUEST,
            Self::Acquire(_) | Self::NotSynced | Self::SyncTimeout(_) | Self::Query(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Pipeline stage that failed, for logging.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Selector(_) => "selector",
            Self::Acquire(_) => "acquire",
            Self::NotSynced | Self::SyncTimeout(_) => "sync",
            Self::Query(_) => "query",
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}

/// Stateless processor for generate requests.
#[derive(Clone)]
pub struct GenerateHandler {
    source: Arc<dyn CacheSource>,
    sync_timeout: Option<Duration>,
}

impl std::fmt::Debug for GenerateHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerateHandler")
            .field("sync_timeout", &self.sync_timeout)
            .finish_non_exhaustive()
    }
}

impl GenerateHandler {
    /// Creates a handler querying caches from `source`. Each request waits
    /// at most `sync_timeout` for the initial sync, or indefinitely if `None`.
    pub fn new(source: Arc<dyn CacheSource>, sync_timeout: Option<Duration>) -> Self {
        Self {
            source,
            sync_timeout,
        }
    }

    /// Runs the full pipeline on a raw request body.
    ///
    /// # Errors
    ///
    /// Returns the [`HandlerError`] of the first stage that fails.
    pub async fn execute(&self, body: &[u8]) -> Result<GenerateResponse, HandlerError> {
        let request = GenerateRequest::from_slice(body).map_err(HandlerError::Decode)?;
        let selector = to_selector(request.label_selector())?;
        debug!(
            "ApplicationSet {:?} selecting namespaces with {}",
            request.application_set_name, selector
        );

        let lister = self.source.acquire().await.map_err(HandlerError::Acquire)?;
        self.wait_until_synced(lister.as_ref()).await?;

        let entries = lister.list(&selector).map_err(HandlerError::Query)?;
        Ok(entries.into_iter().map(|entry| entry.name).collect())
    }

    async fn wait_until_synced(&self, lister: &dyn NamespaceLister) -> Result<(), HandlerError> {
        let synced = match self.sync_timeout {
            Some(timeout) => tokio::time::timeout(timeout, lister.wait_until_synced())
                .await
                .map_err(|_elapsed| HandlerError::SyncTimeout(timeout))?,
            None => lister.wait_until_synced().await,
        };
        if synced { Ok(()) } else { Err(HandlerError::NotSynced) }
    }
}

/// Translates the wire selector into the cache's selector.
///
/// `matchLabels` become exact-match requirements, followed by the
/// expressions in request order.
///
/// # Errors
///
/// Returns the first invalid key, value, operator or value set.
pub fn to_selector(selector: &LabelSelector) -> Result<Selector, SelectorError> {
    let labels = selector
        .match_labels
        .iter()
        .map(|(key, value)| Requirement::equals(key.as_str(), value.as_str()));
    let expressions = selector.match_expressions.iter().map(|expr| {
        Requirement::parse(expr.key.as_str(), &expr.operator, expr.values.iter().map(String::as_str))
    });
    labels.chain(expressions).collect()
}
