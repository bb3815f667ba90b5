use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use koinonia_core::error::CoreError;
use koinonia_core::session_store::{SessionAction, SessionUser, Topic};
use koinonia_core::types::DbId;
use serde::Deserialize;

use crate::auth::jwt::validate_token;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::tenant::resolve_church;
use crate::realtime::department_snapshot;
use crate::state::AppState;
use crate::ws::protocol::{error_message, pong_message, session_message, ClientCommand};

/// Query string of the upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Access token; browsers can not set headers on WebSocket upgrades.
    pub token: String,
    /// Church to watch. Only masters may name a church other than their own.
    pub church_id: Option<DbId>,
}

/// GET /api/v1/ws?token=<access token>
///
/// Authenticates before upgrading, then registers the connection with
/// `WsManager` and runs a sender task plus the inbound command loop.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> AppResult<Response> {
    let claims = validate_token(&params.token, &state.config.jwt)
        .map_err(|_| AppError::Core(CoreError::Unauthorized("Invalid or expired token".into())))?;
    let user = AuthUser::from(claims);

    if let Some(requested) = params.church_id {
        resolve_church(&user, Some(requested))?;
    }

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state, user, params.church_id))
        .into_response())
}

async fn handle_socket(
    socket: WebSocket,
    state: AppState,
    user: AuthUser,
    church_id: Option<DbId>,
) {
    let ws_manager = state.ws_manager.clone();
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id = user.user_id, "WebSocket connected");

    let session_user = SessionUser {
        user_id: user.user_id,
        role: user.role.clone(),
        home_church_id: user.church_id,
    };
    let mut rx = ws_manager.add(conn_id.clone(), Some(session_user)).await;

    if church_id.is_some() {
        if let Err(e) = ws_manager
            .dispatch(&conn_id, SessionAction::SetChurch(church_id))
            .await
        {
            tracing::warn!(conn_id = %conn_id, error = %e, "Initial church rejected");
        }
    }

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                if !handle_command(&state, &conn_id, text.as_str()).await {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Apply one client command. Returns `false` when the connection should close.
async fn handle_command(state: &AppState, conn_id: &str, text: &str) -> bool {
    let ws_manager = &state.ws_manager;

    let command = match ClientCommand::parse(text) {
        Ok(command) => command,
        Err(e) => {
            ws_manager.send_to(conn_id, error_message(&e)).await;
            return true;
        }
    };

    let Some(action) = command.action() else {
        ws_manager.send_to(conn_id, pong_message()).await;
        return true;
    };

    let session = match ws_manager.dispatch(conn_id, action).await {
        Ok(session) => session,
        Err(e) => {
            ws_manager.send_to(conn_id, error_message(&e.to_string())).await;
            return true;
        }
    };
    ws_manager.send_to(conn_id, session_message(&session)).await;

    if command == ClientCommand::SignOut {
        return false;
    }

    // New department followers get the current list right away.
    if let (ClientCommand::Subscribe { topic: Topic::Departments }, Some(church_id)) =
        (&command, session.church_id)
    {
        match department_snapshot(&state.pool, church_id).await {
            Ok(msg) => {
                ws_manager.send_to(conn_id, msg).await;
            }
            Err(e) => {
                tracing::error!(conn_id, church_id, error = %e, "Department snapshot failed");
            }
        }
    }
    true
}
