//! Route definitions for staffing suggestions.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::suggestion;
use crate::state::AppState;

/// Routes mounted at `/suggestions` (leader).
///
/// ```text
/// POST   /               -> suggest
/// POST   /team           -> balanced_team
/// GET    /departments    -> departments
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(suggestion::suggest))
        .route("/team", post(suggestion::balanced_team))
        .route("/departments", get(suggestion::departments))
}
