use std::sync::Arc;

use crate::config::ServerConfig;
use crate::storage::AvatarStore;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind `Arc` or already shared.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: koinonia_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// Centralized event bus for publishing platform events.
    pub event_bus: Arc<koinonia_events::EventBus>,
    /// Where uploaded avatars are written.
    pub avatar_store: Arc<dyn AvatarStore>,
}
