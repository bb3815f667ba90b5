use std::sync::Arc;
use std::time::Duration;

use crate::ws::manager::WsManager;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Ping every client on a fixed interval, pruning connections that went
/// away without a Close frame.
///
/// Runs until aborted through the returned handle during shutdown.
pub fn start_heartbeat(ws_manager: Arc<WsManager>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let pruned = ws_manager.ping_all().await;
            if pruned > 0 {
                tracing::info!(pruned, "Dropped stale WebSocket connections");
            }
            let count = ws_manager.connection_count().await;
            tracing::debug!(count, "WebSocket heartbeat");
        }
    })
}
