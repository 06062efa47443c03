//! HTTP route handlers for the rewrite server.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::header::{self, HeaderMap, HeaderName};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use tower_http::services::ServeDir;

use super::state::AppState;

/// Request headers passed through to the backend.
const FORWARDED_HEADERS: [HeaderName; 5] = [
    header::CONTENT_TYPE,
    header::ACCEPT,
    header::CACHE_CONTROL,
    header::PRAGMA,
    header::EXPIRES,
];

/// Create the router. `/api/*` is only routed when rewriting is enabled.
pub fn create_router(state: Arc<AppState>, static_dir: Option<&FsPath>) -> Router {
    let mut router = Router::new().route("/health", get(health_check));

    if state.rewrites_enabled() {
        router = router.route("/api/{*path}", any(rewrite_api));
    }

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router.with_state(state)
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mental-coach",
        "version": env!("CARGO_PKG_VERSION"),
        "mode": state.mode.as_str(),
        "rewrites": state.rewrites_enabled(),
    }))
}

/// JSON error body readable by the client's `detail` lookup.
fn error_response(status: StatusCode, detail: String) -> Response {
    (status, Json(serde_json::json!({ "detail": detail }))).into_response()
}

/// Forward `/api/<path>` to the backend and relay its answer.
async fn rewrite_api(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let url = match state.rewrite_url(&path, query.as_deref()) {
        Ok(url) => url,
        Err(e) => return error_response(StatusCode::BAD_GATEWAY, e.to_string()),
    };

    tracing::debug!(%method, %url, "rewriting API request");

    let mut request = state.client.request(method, url);
    for name in &FORWARDED_HEADERS {
        if let Some(value) = headers.get(name) {
            request = request.header(name.clone(), value.clone());
        }
    }

    let upstream = match request.body(body).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Backend unreachable: {e}");
            return error_response(StatusCode::BAD_GATEWAY, format!("Backend unreachable: {e}"));
        }
    };

    let status = upstream.status();
    let content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();
    let bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            return error_response(StatusCode::BAD_GATEWAY, format!("Backend response error: {e}"));
        }
    };

    let mut response = (status, bytes).into_response();
    if let Some(value) = content_type {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
}
