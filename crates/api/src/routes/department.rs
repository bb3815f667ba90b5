//! Route definitions for the `/departments` resource.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::department;
use crate::state::AppState;

/// Routes mounted at `/departments`.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> create (leader)
/// GET    /tree                      -> tree
/// GET    /{id}                      -> get_by_id
/// PUT    /{id}                      -> update (leader)
/// DELETE /{id}                      -> delete (leader)
/// GET    /{id}/members              -> list_members
/// POST   /{id}/members              -> add_member
/// DELETE /{id}/members/{user_id}    -> remove_member
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(department::list).post(department::create))
        .route("/tree", get(department::tree))
        .route(
            "/{id}",
            get(department::get_by_id)
                .put(department::update)
                .delete(department::delete),
        )
        .route(
            "/{id}/members",
            get(department::list_members).post(department::add_member),
        )
        .route("/{id}/members/{user_id}", delete(department::remove_member))
}
