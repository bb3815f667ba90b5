//! Route definitions for churches.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::church;
use crate::state::AppState;

/// Routes mounted at `/master/churches` (master only).
///
/// ```text
/// GET    /                 -> list
/// POST   /                 -> create
/// GET    /{id}             -> get_by_id
/// PUT    /{id}             -> update
/// POST   /{id}/activate    -> activate
/// POST   /{id}/deactivate  -> deactivate
/// POST   /{id}/admin       -> create_admin
/// ```
pub fn master_router() -> Router<AppState> {
    Router::new()
        .route("/", get(church::list).post(church::create))
        .route("/{id}", get(church::get_by_id).put(church::update))
        .route("/{id}/activate", post(church::activate))
        .route("/{id}/deactivate", post(church::deactivate))
        .route("/{id}/admin", post(church::create_admin))
}

/// Routes mounted at `/church` (the caller's own church).
///
/// ```text
/// GET    /           -> get_current
/// PUT    /           -> update_current (admin)
/// GET    /activity   -> activity (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(church::get_current).put(church::update_current))
        .route("/activity", get(church::activity))
}
