//! JSON messages exchanged over the WebSocket.
//!
//! Clients send [`ClientCommand`]s; the server answers with a
//! `{"type":"session", ...}` snapshot or a `{"type":"error", ...}` frame, and
//! pushes `departments.reloaded` and `notification` frames on its own.

use axum::extract::ws::Message;
use koinonia_core::session_store::{SessionAction, SessionState, Topic};
use koinonia_core::types::DbId;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    Subscribe { topic: Topic },
    Unsubscribe { topic: Topic },
    SetChurch { church_id: Option<DbId> },
    SelectDepartment { department_id: Option<DbId> },
    Ping,
    SignOut,
}

impl ClientCommand {
    /// Parse a text frame.
    pub fn parse(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("Invalid command: {e}"))
    }

    /// The session action this command maps to. `Ping` touches no state.
    pub fn action(&self) -> Option<SessionAction> {
        match *self {
            ClientCommand::Subscribe { topic } => Some(SessionAction::Subscribe(topic)),
            ClientCommand::Unsubscribe { topic } => Some(SessionAction::Unsubscribe(topic)),
            ClientCommand::SetChurch { church_id } => Some(SessionAction::SetChurch(church_id)),
            ClientCommand::SelectDepartment { department_id } => {
                Some(SessionAction::SelectDepartment(department_id))
            }
            ClientCommand::Ping => None,
            ClientCommand::SignOut => Some(SessionAction::Reset),
        }
    }
}

pub fn session_message(state: &SessionState) -> Message {
    text(json!({ "type": "session", "data": state }))
}

pub fn error_message(error: &str) -> Message {
    text(json!({ "type": "error", "error": error }))
}

pub fn pong_message() -> Message {
    text(json!({ "type": "pong" }))
}

pub fn text(value: serde_json::Value) -> Message {
    Message::Text(value.to_string().into())
}
