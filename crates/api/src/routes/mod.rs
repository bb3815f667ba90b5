pub mod auth;
pub mod church;
pub mod course;
pub mod department;
pub mod health;
pub mod invite;
pub mod member;
pub mod notification;
pub mod scale;
pub mod service_type;
pub mod song;
pub mod suggestion;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                           WebSocket
///
/// /auth/login                                   login (public)
/// /auth/refresh                                 refresh (public)
/// /auth/logout                                  logout
/// /auth/me                                      current user and profile
/// /auth/password                                change own password
///
/// /master/churches                              list, create (master only)
/// /master/churches/{id}                         get, update
/// /master/churches/{id}/activate                activate
/// /master/churches/{id}/deactivate              deactivate
/// /master/churches/{id}/admin                   create the church admin
///
/// /church                                       own church: get, update (admin)
/// /church/activity                              recent activity (admin)
///
/// /departments                                  list, create
/// /departments/tree                             nested tree
/// /departments/{id}                             get, update, delete
/// /departments/{id}/members                     list, join/add
/// /departments/{id}/members/{user_id}           leave/remove
///
/// /members                                      list
/// /members/{user_id}                            get
/// /members/{user_id}/profile                    get, create, update
/// /members/{user_id}/avatar                     upload (multipart)
/// /members/{user_id}/role                       change role (admin)
/// /members/{user_id}/activate                   activate (admin)
/// /members/{user_id}/deactivate                 deactivate (admin)
/// /roles                                        list
///
/// /songs                                        list, create
/// /songs/{id}                                   get, update, delete
/// /service-types                                list, create
/// /service-types/{id}                           get, update, delete
/// /courses                                      list, create
/// /courses/{id}                                 get, update, delete
///
/// /scales                                       list, create
/// /scales/mine                                  scales the caller serves on
/// /scales/{id}                                  get, update, delete
/// /scales/{id}/status                           workflow transition
/// /scales/{id}/respond                          confirm or decline
/// /scales/{id}/members[/{member_id}]            team
/// /scales/{id}/songs[/{entry_id}]               setlist
/// /scales/{id}/agenda[/{item_id}]               agenda
///
/// /suggestions                                  top candidates per role
/// /suggestions/team                             one candidate per role
/// /suggestions/departments                      built-in role lists
///
/// /invites                                      list, create (admin)
/// /invites/accept                               accept (public)
/// /invites/{id}                                 revoke (admin)
///
/// /notifications                                list
/// /notifications/unread-count                   unread count
/// /notifications/read-all                       mark all read
/// /notifications/{id}/read                      mark one read
/// /notifications/{id}                           delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // WebSocket endpoint.
        .route("/ws", get(ws::ws_handler))
        // Auth routes (login/refresh are public; the rest need a token).
        .nest("/auth", auth::router())
        // Platform administration.
        .nest("/master/churches", church::master_router())
        // Tenant-scoped resources.
        .nest("/church", church::router())
        .nest("/departments", department::router())
        .nest("/members", member::router())
        .nest("/roles", member::roles_router())
        .nest("/songs", song::router())
        .nest("/service-types", service_type::router())
        .nest("/courses", course::router())
        .nest("/scales", scale::router())
        .nest("/suggestions", suggestion::router())
        .nest("/invites", invite::router())
        .nest("/notifications", notification::router())
}
