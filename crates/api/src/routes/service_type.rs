//! Route definitions for the `/service-types` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::service_type;
use crate::state::AppState;

/// Routes mounted at `/service-types`.
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
        .route("/", get(service_type::list).post(service_type::create))
        .route(
            "/{id}",
            get(service_type::get_by_id)
                .put(service_type::update)
                .delete(service_type::delete),
        )
}
