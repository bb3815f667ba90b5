//! Route definitions for the `/songs` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::song;
use crate::state::AppState;

/// Routes mounted at `/songs`.
///
/// ```text
/// GET    /        -> list
/// POST   /        -> create (leader)
/// GET    /{id}    -> get_by_id
/// PUT    /{id}    -> update (leader)
/// DELETE /{id}    -> delete (leader)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(song::list).post(song::create))
        .route(
            "/{id}",
            get(song::get_by_id).put(song::update).delete(song::delete),
        )
}
