//! HTTP surface.
//!
//! - `GET /health`: liveness, no authentication
//! - `POST /api/v1/getparams.execute`: generator endpoint, key-authenticated

use crate::{
    auth::{ApiKey, require_key},
    handler::GenerateHandler,
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Request, State, rejection::BytesRejection},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tower::{Layer, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    normalize_path::{NormalizePath, NormalizePathLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, error, info_span};

/// Path of the generator endpoint.
pub const EXECUTE_PATH: &str = "/api/v1/getparams.execute";
/// Path of the liveness endpoint.
pub const HEALTH_PATH: &str = "/health";
/// Largest accepted request body; larger bodies get `413`.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Builds the routes with request-id, tracing and panic layers.
pub fn router(handler: GenerateHandler, key: ApiKey) -> Router {
    let api = Router::new()
        .route("/v1/getparams.execute", post(execute))
        .route_layer(middleware::from_fn_with_state(key, require_key))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(Arc::new(handler));

    Router::new()
        .route(HEALTH_PATH, get(health))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &Request| {
                            let request_id = request
                                .headers()
                                .get("x-request-id")
                                .and_then(|id| id.to_str().ok())
                                .unwrap_or_default();
                            info_span!(
                                "request",
                                method = %request.method(),
                                uri = %request.uri(),
                                request_id,
                            )
                        })
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CatchPanicLayer::new()),
        )
}

/// Wraps `router` so `/health/` and `/api/v1/getparams.execute/` resolve like
/// their slash-less forms. Trimming must happen before routing, so it sits
/// outside the router.
pub fn app(router: Router) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn execute(
    State(handler): State<Arc<GenerateHandler>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            error!(stage = "read", "Request failed: {}", rejection);
            return rejection.status().into_response();
        }
    };
    match handler.execute(&body).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            error!(stage = e.stage(), "Request failed: {}", e);
            e.into_response()
        }
    }
}
