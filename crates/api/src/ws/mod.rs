//! WebSocket infrastructure for real-time updates.
//!
//! Connection management with a per-connection session store, the client
//! command protocol, heartbeat pings, and the HTTP upgrade handler.

mod handler;
mod heartbeat;
pub mod manager;
pub mod protocol;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
