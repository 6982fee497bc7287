//! Shared-key authentication for `/api` routes.
//!
//! Clients send `Authorization: Bearer <key>`. The scheme is matched
//! case-insensitively and the key is compared in constant time against the
//! raw bytes of the key file. The file is re-read on every request, so a
//! rotated Secret takes effect without a restart.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use subtle::ConstantTimeEq;
use tracing::{error, warn};

const SCHEME: &[u8] = b"Bearer";

/// The secret every `/api` request must present.
#[derive(Clone)]
pub struct ApiKey(Source);

#[derive(Clone)]
enum Source {
    Fixed(Arc<[u8]>),
    File(Arc<Path>),
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Source::Fixed(_) => f.debug_tuple("ApiKey").field(&"<redacted>").finish(),
            Source::File(path) => f.debug_tuple("ApiKey").field(path).finish(),
        }
    }
}

impl ApiKey {
    /// Wraps key bytes as-is; the key never changes.
    pub fn new(key: impl Into<Arc<[u8]>>) -> Self {
        Self(Source::Fixed(key.into()))
    }

    /// A key backed by the file at `path`. Its full contents, including any
    /// trailing newline, are the key.
    ///
    /// The file is read once here so a missing key fails startup, and again
    /// for every request.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub async fn load(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path: PathBuf = path.into();
        tokio::fs::read(&path).await?;
        Ok(Self(Source::File(path.into())))
    }

    /// The key as of now.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if a file-backed key cannot be read.
    pub async fn current(&self) -> std::io::Result<Arc<[u8]>> {
        match &self.0 {
            Source::Fixed(key) => Ok(Arc::clone(key)),
            Source::File(path) => Ok(tokio::fs::read(path).await?.into()),
        }
    }

    /// Constant-time comparison against the current key; keys of different
    /// length never match.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if a file-backed key cannot be read.
    pub async fn verify(&self, presented: &[u8]) -> std::io::Result<bool> {
        let key = self.current().await?;
        Ok(key.as_ref().ct_eq(presented).into())
    }
}

/// Extracts the key from an `Authorization` header.
///
/// `Bearer` with nothing after it yields an empty key, since HTTP parsers
/// strip the trailing space of `Bearer `.
#[must_use]
pub fn bearer_key(headers: &HeaderMap) -> Option<&[u8]> {
    let value = headers.get(AUTHORIZATION)?.as_bytes();
    if value.len() < SCHEME.len() || !value[..SCHEME.len()].eq_ignore_ascii_case(SCHEME) {
        return None;
    }
    match &value[SCHEME.len()..] {
        [] => Some(b"".as_slice()),
        [b' ', key @ ..] => Some(key),
        _ => None,
    }
}

/// Middleware rejecting requests without the configured key with `401`.
///
/// Runs before the body is read, so unauthenticated requests never reach
/// request decoding. A key file that has become unreadable is a `500`.
pub async fn require_key(State(key): State<ApiKey>, request: Request, next: Next) -> Response {
    let presented = match bearer_key(request.headers()) {
        Some(presented) => presented.to_vec(),
        None => {
            warn!("Rejected request: missing or malformed Authorization header");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };
    match key.verify(&presented).await {
        Ok(true) => next.run(request).await,
        Ok(false) => {
            warn!("Rejected request: invalid API key");
            StatusCode::UNAUTHORIZED.into_response()
        }
        Err(e) => {
            error!("Failed to read API key file: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(authorization: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(authorization));
        headers
    }

    #[test]
    fn test_bearer_key_extraction() {
        assert_eq!(bearer_key(&headers("Bearer password")), Some(&b"password"[..]));
        assert_eq!(bearer_key(&headers("bearer password")), Some(&b"password"[..]));
        assert_eq!(bearer_key(&headers("BEARER not a password")), Some(&b"not a password"[..]));
        assert_eq!(bearer_key(&headers("Bearer  spaced")), Some(&b" spaced"[..]));
        assert_eq!(bearer_key(&headers("Bearer ")), Some(&b""[..]));
        assert_eq!(bearer_key(&headers("Bearer")), Some(&b""[..]));
    }

    #[test]
    fn test_bearer_key_rejects_other_schemes() {
        assert_eq!(bearer_key(&HeaderMap::new()), None);
        assert_eq!(bearer_key(&headers("Basic cGFzc3dvcmQ=")), None);
        assert_eq!(bearer_key(&headers("Bearerpassword")), None);
        assert_eq!(bearer_key(&headers("Bear")), None);
        assert_eq!(bearer_key(&headers("password")), None);
    }

    #[tokio::test]
    async fn test_verify_is_byte_exact() {
        let key = ApiKey::new(&b"password"[..]);
        assert!(key.verify(b"password").await.unwrap());
        assert!(!key.verify(b"Password").await.unwrap());
        assert!(!key.verify(b"password\n").await.unwrap());
        assert!(!key.verify(b"pass").await.unwrap());
        assert!(!key.verify(b"").await.unwrap());

        let with_newline = ApiKey::new(&b"password\n"[..]);
        assert!(!with_newline.verify(b"password").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_key_matches_only_empty() {
        let key = ApiKey::new(Vec::<u8>::new());
        assert!(key.verify(b"").await.unwrap());
        assert!(!key.verify(b"x").await.unwrap());
    }

    #[test]
    fn test_debug_redacts_key() {
        let key = ApiKey::new(&b"password"[..]);
        assert!(!format!("{key:?}").contains("password"));
    }

    fn key_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ns-gen-key-{name}-{}", std::process::id()))
    }

    #[tokio::test]
    async fn test_load_reads_raw_file_contents() {
        let path = key_file("raw");
        tokio::fs::write(&path, b"password\n").await.unwrap();

        let key = ApiKey::load(&path).await.unwrap();
        let accepts_newline = key.verify(b"password\n").await.unwrap();
        let accepts_trimmed = key.verify(b"password").await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert!(accepts_newline);
        assert!(!accepts_trimmed);
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        assert!(ApiKey::load(key_file("missing")).await.is_err());
    }

    mod middleware {
        use super::*;
        use axum::{Router, body::Body, middleware::from_fn_with_state, routing::get};
        use tower::ServiceExt;

        async fn status(key: &ApiKey, authorization: &'static str) -> StatusCode {
            let app = Router::new()
                .route("/", get(|| async { StatusCode::OK }))
                .route_layer(from_fn_with_state(key.clone(), require_key));
            let request = axum::http::Request::get("/")
                .header(AUTHORIZATION, authorization)
                .body(Body::empty())
                .unwrap();
            app.oneshot(request).await.unwrap().status()
        }

        #[tokio::test]
        async fn test_rotated_key_file_takes_effect() {
            let path = key_file("rotate");
            tokio::fs::write(&path, b"first").await.unwrap();
            let key = ApiKey::load(&path).await.unwrap();

            let before = status(&key, "Bearer first").await;
            tokio::fs::write(&path, b"second").await.unwrap();
            let old_after = status(&key, "Bearer first").await;
            let new_after = status(&key, "Bearer second").await;
            tokio::fs::remove_file(&path).await.unwrap();

            assert_eq!(before, StatusCode::OK);
            assert_eq!(old_after, StatusCode::UNAUTHORIZED);
            assert_eq!(new_after, StatusCode::OK);
        }

        #[tokio::test]
        async fn test_unreadable_key_file_is_server_error() {
            let path = key_file("vanish");
            tokio::fs::write(&path, b"password").await.unwrap();
            let key = ApiKey::load(&path).await.unwrap();
            tokio::fs::remove_file(&path).await.unwrap();

            assert_eq!(status(&key, "Bearer password").await, StatusCode::INTERNAL_SERVER_ERROR);
        }

        #[tokio::test]
        async fn test_malformed_header_skips_key_file() {
            let path = key_file("unused");
            tokio::fs::write(&path, b"password").await.unwrap();
            let key = ApiKey::load(&path).await.unwrap();
            tokio::fs::remove_file(&path).await.unwrap();

            assert_eq!(status(&key, "Basic password").await, StatusCode::UNAUTHORIZED);
        }

        #[tokio::test]
        async fn test_fixed_key() {
            let key = ApiKey::new(&b"password"[..]);
            assert_eq!(status(&key, "bearer password").await, StatusCode::OK);
            assert_eq!(status(&key, "Bearer nope").await, StatusCode::UNAUTHORIZED);
        }
    }
}
