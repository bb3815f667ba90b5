//! Route definitions for church members.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use koinonia_core::storage::MAX_AVATAR_BYTES;

use crate::handlers::member;
use crate::state::AppState;

/// Multipart framing on top of the largest accepted picture.
const AVATAR_BODY_LIMIT: usize = MAX_AVATAR_BYTES + 64 * 1024;

/// Routes mounted at `/members`.
///
/// ```text
/// GET    /                        -> list
/// GET    /{user_id}               -> get_by_id
/// GET    /{user_id}/profile       -> get_profile
/// POST   /{user_id}/profile       -> create_profile (self or leader)
/// PUT    /{user_id}/profile       -> update_profile (self or leader)
/// POST   /{user_id}/avatar        -> upload_avatar (self or leader, multipart)
/// PUT    /{user_id}/role          -> change_role (admin)
/// POST   /{user_id}/activate      -> activate (admin)
/// POST   /{user_id}/deactivate    -> deactivate (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(member::list))
        .route("/{user_id}", get(member::get_by_id))
        .route(
            "/{user_id}/profile",
            get(member::get_profile)
                .post(member::create_profile)
                .put(member::update_profile),
        )
        .route(
            "/{user_id}/avatar",
            post(member::upload_avatar).layer(DefaultBodyLimit::max(AVATAR_BODY_LIMIT)),
        )
        .route("/{user_id}/role", put(member::change_role))
        .route("/{user_id}/activate", post(member::activate))
        .route("/{user_id}/deactivate", post(member::deactivate))
}

/// Routes mounted at `/roles`.
///
/// ```text
/// GET    /    -> list_roles
/// ```
pub fn roles_router() -> Router<AppState> {
    Router::new().route("/", get(member::list_roles))
}
