//! Built frontend serving and the service-worker cache policy.
//!
//! ```text
//! GET  /sw-policy                 policy document for the worker script
//! POST /sw-policy/classify        strategy for one request
//! POST /sw-policy/stale-caches    caches to delete on activation
//! POST /sw-policy/control         caches to drop for a control message
//! GET  /*                         files from FRONTEND_DIR, SPA fallback
//! ```

use std::path::Path;

use axum::extract::{Request, State};
use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use koinonia_core::cache_policy::{
    cache_control_for, classify, policy_document, stale_caches, ControlMessage, PolicyDocument,
    RequestInfo, Strategy,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::services::{ServeDir, ServeFile};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

pub fn policy_router() -> Router<AppState> {
    Router::new()
        .route("/sw-policy", get(get_policy))
        .route("/sw-policy/classify", post(classify_request))
        .route("/sw-policy/stale-caches", post(list_stale_caches))
        .route("/sw-policy/control", post(control_message))
}

/// Static file service for the built frontend. Unknown paths fall back to
/// `index.html` so client-side routes resolve.
pub fn static_files(dir: &Path) -> Router<AppState> {
    let serve = ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")));
    let service = ServiceBuilder::new()
        .layer(middleware::from_fn(apply_cache_control))
        .service(serve);
    Router::new().fallback_service(service)
}

async fn apply_cache_control(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;
    if response.status().is_success() {
        if let Ok(value) = HeaderValue::from_str(&cache_control_for(&path)) {
            response.headers_mut().insert(CACHE_CONTROL, value);
        }
    }
    response
}

/// GET /sw-policy
pub async fn get_policy(State(state): State<AppState>) -> Json<PolicyDocument> {
    Json(policy_document(state.config.backend_hostname.clone()))
}

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    #[serde(default = "default_method")]
    pub method: String,
    pub origin: String,
    pub path: String,
    pub accept: Option<String>,
    #[serde(default)]
    pub is_navigation: bool,
    /// Origin the worker is installed on.
    pub app_origin: String,
}

fn default_method() -> String {
    "GET".into()
}

/// POST /sw-policy/classify
pub async fn classify_request(
    State(state): State<AppState>,
    Json(input): Json<ClassifyRequest>,
) -> Json<DataResponse<Strategy>> {
    let request = RequestInfo {
        method: &input.method,
        origin: &input.origin,
        path: &input.path,
        accept: input.accept.as_deref(),
        is_navigation: input.is_navigation,
    };
    let strategy = classify(
        &request,
        &input.app_origin,
        state.config.backend_hostname.as_deref(),
    );
    Json(DataResponse { data: strategy })
}

#[derive(Debug, Deserialize)]
pub struct StaleCachesRequest {
    pub existing: Vec<String>,
}

/// POST /sw-policy/stale-caches
pub async fn list_stale_caches(
    Json(input): Json<StaleCachesRequest>,
) -> Json<DataResponse<Vec<String>>> {
    Json(DataResponse {
        data: stale_caches(&input.existing),
    })
}

#[derive(Debug, Deserialize)]
pub struct ControlRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ControlResponse {
    pub message: ControlMessage,
    pub clear: &'static [&'static str],
}

/// POST /sw-policy/control
pub async fn control_message(
    Json(input): Json<ControlRequest>,
) -> AppResult<Json<DataResponse<ControlResponse>>> {
    let message = ControlMessage::parse(&input.message)?;
    Ok(Json(DataResponse {
        data: ControlResponse {
            message,
            clear: message.caches_to_clear(),
        },
    }))
}
