//! Realtime department relay.
//!
//! Any department change in a church triggers a full reload of that church's
//! department list, pushed to every WebSocket session following the
//! `departments` topic there. Changes that arrive while a church's reload is
//! running do not start a second one; they mark it to run once more after the
//! current pass, so followers always end on a list read after the last change.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::ws::Message;
use koinonia_core::event_names::is_department_change;
use koinonia_core::session_store::Topic;
use koinonia_core::types::DbId;
use koinonia_db::repositories::DepartmentRepo;
use koinonia_db::DbPool;
use koinonia_events::PlatformEvent;
use serde_json::json;
use tokio::sync::broadcast;

use crate::ws::protocol::text;
use crate::ws::WsManager;

pub const DEPARTMENTS_RELOADED: &str = "departments.reloaded";

/// Churches with a reload in progress, each flagged when another change came
/// in during it.
#[derive(Debug, Clone, Default)]
pub struct ReloadGate {
    churches: Arc<Mutex<HashMap<DbId, bool>>>,
}

impl ReloadGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<DbId, bool>> {
        self.churches.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Claim the church. While another reload holds it, flag that reload to
    /// run again and return `None`.
    pub fn try_begin(&self, church_id: DbId) -> Option<ReloadPermit> {
        match self.lock().entry(church_id) {
            Entry::Occupied(mut held) => {
                *held.get_mut() = true;
                None
            }
            Entry::Vacant(slot) => {
                slot.insert(false);
                Some(ReloadPermit {
                    gate: self.clone(),
                    church_id,
                    released: false,
                })
            }
        }
    }

    pub fn is_in_flight(&self, church_id: DbId) -> bool {
        self.lock().contains_key(&church_id)
    }
}

/// Holds a church's reload slot. Released when dropped.
#[derive(Debug)]
pub struct ReloadPermit {
    gate: ReloadGate,
    church_id: DbId,
    released: bool,
}

impl ReloadPermit {
    /// Called after each pass. Returns `true` (and clears the flag) when a
    /// change came in during the pass; otherwise releases the church in the
    /// same critical section and returns `false`.
    pub fn rerun_or_release(&mut self) -> bool {
        let mut churches = self.gate.lock();
        if let Some(changed) = churches.get_mut(&self.church_id) {
            if *changed {
                *changed = false;
                return true;
            }
        }
        churches.remove(&self.church_id);
        self.released = true;
        false
    }
}

impl Drop for ReloadPermit {
    fn drop(&mut self) {
        if !self.released {
            self.gate.lock().remove(&self.church_id);
        }
    }
}

/// Load the church's departments and wrap them in a `departments.reloaded`
/// frame.
pub async fn department_snapshot(pool: &DbPool, church_id: DbId) -> Result<Message, sqlx::Error> {
    let departments = DepartmentRepo::list_by_church(pool, church_id).await?;
    Ok(text(json!({
        "type": DEPARTMENTS_RELOADED,
        "church_id": church_id,
        "data": departments,
    })))
}

pub struct RealtimeRelay {
    pool: DbPool,
    ws_manager: Arc<WsManager>,
    gate: ReloadGate,
}

impl RealtimeRelay {
    pub fn new(pool: DbPool, ws_manager: Arc<WsManager>) -> Self {
        Self {
            pool,
            ws_manager,
            gate: ReloadGate::new(),
        }
    }

    /// Consume bus events until the bus closes.
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.on_event(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Realtime relay lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, realtime relay shutting down");
                    break;
                }
            }
        }
    }

    fn on_event(&self, event: &PlatformEvent) {
        if !is_department_change(&event.event_type) {
            return;
        }
        let Some(church_id) = event.church_id else {
            return;
        };
        let Some(mut permit) = self.gate.try_begin(church_id) else {
            tracing::debug!(church_id, "Department reload in flight, marked to run again");
            return;
        };

        let pool = self.pool.clone();
        let ws_manager = Arc::clone(&self.ws_manager);
        tokio::spawn(async move {
            loop {
                match reload_departments(&pool, &ws_manager, church_id).await {
                    Ok(recipients) => {
                        tracing::debug!(church_id, recipients, "Departments reloaded");
                    }
                    Err(e) => {
                        tracing::error!(church_id, error = %e, "Department reload failed");
                    }
                }
                if !permit.rerun_or_release() {
                    break;
                }
            }
        });
    }
}

/// Push the current department list to every follower of the church.
pub async fn reload_departments(
    pool: &DbPool,
    ws_manager: &WsManager,
    church_id: DbId,
) -> Result<usize, sqlx::Error> {
    let msg = department_snapshot(pool, church_id).await?;
    Ok(ws_manager
        .send_to_topic(church_id, Topic::Departments, msg)
        .await)
}
