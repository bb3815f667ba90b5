//! Route definitions for the `/invites` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::invite;
use crate::state::AppState;

/// Routes mounted at `/invites`.
///
/// ```text
/// GET    /          -> list (admin)
/// POST   /          -> create (admin)
/// POST   /accept    -> accept (public)
/// DELETE /{id}      -> revoke (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(invite::list).post(invite::create))
        .route("/accept", post(invite::accept))
        .route("/{id}", delete(invite::revoke))
}
