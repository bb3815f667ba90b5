use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use koinonia_core::error::CoreError;
use koinonia_core::session_store::{SessionAction, SessionState, SessionStore, SessionUser, Topic};
use koinonia_core::types::{DbId, Timestamp};
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// One live WebSocket connection.
pub struct WsConnection {
    /// Who is connected and what they follow.
    pub session: SessionStore,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    pub connected_at: Timestamp,
}

/// Manages all active WebSocket connections.
///
/// Thread-safe via interior `RwLock`; wrap in `Arc` and share.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection, signing `user` into its session.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(
        &self,
        conn_id: String,
        user: Option<SessionUser>,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut session = SessionStore::new();
        if let Some(user) = user {
            // SetUser never fails.
            let _ = session.dispatch(SessionAction::SetUser(user));
        }
        let conn = WsConnection {
            session,
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Apply a session action to one connection and return the new state.
    pub async fn dispatch(
        &self,
        conn_id: &str,
        action: SessionAction,
    ) -> Result<SessionState, CoreError> {
        let mut conns = self.connections.write().await;
        let conn = conns
            .get_mut(conn_id)
            .ok_or_else(|| CoreError::Internal(format!("Unknown connection {conn_id}")))?;
        conn.session.dispatch(action).cloned()
    }

    /// Snapshot of a connection's session.
    pub async fn session(&self, conn_id: &str) -> Option<SessionState> {
        self.connections
            .read()
            .await
            .get(conn_id)
            .map(|conn| conn.session.state().clone())
    }

    /// Connection ids signed in as `user_id`.
    pub async fn get_by_user(&self, user_id: DbId) -> Vec<String> {
        self.connections
            .read()
            .await
            .iter()
            .filter(|(_, conn)| conn.session.state().user_id() == Some(user_id))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Send a message to a single connection. Returns `false` if it is gone.
    pub async fn send_to(&self, conn_id: &str, message: Message) -> bool {
        match self.connections.read().await.get(conn_id) {
            Some(conn) => conn.sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Send a message to every connection of a user.
    ///
    /// Returns the number of connections the message was sent to.
    pub async fn send_to_user(&self, user_id: DbId, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values() {
            if conn.session.state().user_id() == Some(user_id) {
                let _ = conn.sender.send(message.clone());
                count += 1;
            }
        }
        count
    }

    /// Send a message to every connection whose session follows `topic`
    /// in `church_id`. Returns the number of recipients.
    pub async fn send_to_topic(&self, church_id: DbId, topic: Topic, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values() {
            if conn.session.state().follows(church_id, topic) {
                let _ = conn.sender.send(message.clone());
                count += 1;
            }
        }
        count
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Ping every connection and drop the ones whose writer task is gone.
    ///
    /// Returns the number of connections dropped.
    pub async fn ping_all(&self) -> usize {
        let mut conns = self.connections.write().await;
        let before = conns.len();
        conns.retain(|_, conn| conn.sender.send(Message::Ping(Bytes::new())).is_ok());
        before - conns.len()
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
