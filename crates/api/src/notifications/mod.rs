//! Notification routing.
//!
//! The [`NotificationRouter`] subscribes to the event bus and turns scale,
//! invite and department events into stored notifications pushed over
//! WebSocket.

pub mod router;

pub use router::NotificationRouter;
