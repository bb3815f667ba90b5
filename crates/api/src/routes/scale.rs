//! Route definitions for the `/scales` resource.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::scale;
use crate::state::AppState;

/// Routes mounted at `/scales`.
///
/// ```text
/// GET    /                              -> list
/// POST   /                              -> create (leader)
/// GET    /mine                          -> list_mine
/// GET    /{id}                          -> get_by_id
/// PUT    /{id}                          -> update (leader)
/// DELETE /{id}                          -> delete (leader)
/// POST   /{id}/status                   -> change_status (leader)
/// POST   /{id}/respond                  -> respond (assigned member)
///
/// POST   /{id}/members                  -> add_member (leader)
/// DELETE /{id}/members/{member_id}      -> remove_member (leader)
/// POST   /{id}/songs                    -> add_song (leader)
/// DELETE /{id}/songs/{entry_id}         -> remove_song (leader)
/// POST   /{id}/agenda                   -> add_agenda_item (leader)
/// PUT    /{id}/agenda/{item_id}         -> update_agenda_item (leader)
/// DELETE /{id}/agenda/{item_id}         -> remove_agenda_item (leader)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(scale::list).post(scale::create))
        .route("/mine", get(scale::list_mine))
        .route(
            "/{id}",
            get(scale::get_by_id).put(scale::update).delete(scale::delete),
        )
        .route("/{id}/status", post(scale::change_status))
        .route("/{id}/respond", post(scale::respond))
        // Team
        .route("/{id}/members", post(scale::add_member))
        .route("/{id}/members/{member_id}", delete(scale::remove_member))
        // Setlist
        .route("/{id}/songs", post(scale::add_song))
        .route("/{id}/songs/{entry_id}", delete(scale::remove_song))
        // Agenda
        .route("/{id}/agenda", post(scale::add_agenda_item))
        .route(
            "/{id}/agenda/{item_id}",
            put(scale::update_agenda_item).delete(scale::remove_agenda_item),
        )
}
