//! Day-before reminders for published scales.
//!
//! Every run looks for published scales happening tomorrow that have not
//! been reminded yet, stamps them and publishes `scale.reminder_due`; the
//! notification router turns that into one notification per assigned member.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use koinonia_core::event_names::SCALE_REMINDER_DUE;
use koinonia_db::models::scale::Scale;
use koinonia_db::repositories::ScaleRepo;
use koinonia_db::DbPool;
use koinonia_events::{EventBus, PlatformEvent};
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// How often the reminder job runs.
const REMINDER_INTERVAL: Duration = Duration::from_secs(3600);

/// Run the reminder loop until `cancel` is triggered.
pub async fn run(pool: DbPool, event_bus: Arc<EventBus>, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = REMINDER_INTERVAL.as_secs(),
        "Scale reminder job started"
    );

    let mut interval = tokio::time::interval(REMINDER_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Scale reminder job stopping");
                break;
            }
            _ = interval.tick() => {
                match send_due_reminders(&pool, &event_bus).await {
                    Ok(0) => tracing::debug!("Scale reminders: nothing due"),
                    Ok(sent) => tracing::info!(sent, "Scale reminders: published"),
                    Err(e) => tracing::error!(error = %e, "Scale reminders: run failed"),
                }
            }
        }
    }
}

/// Publish a reminder event for every scale due tomorrow. Returns how many
/// were published.
pub async fn send_due_reminders(
    pool: &DbPool,
    event_bus: &EventBus,
) -> Result<usize, sqlx::Error> {
    let tomorrow = Utc::now().date_naive() + chrono::Duration::days(1);
    let mut sent = 0;
    for scale in ScaleRepo::due_for_reminder(pool, tomorrow).await? {
        // Another instance may have claimed it between the select and here.
        if !ScaleRepo::mark_reminded(pool, scale.id).await? {
            continue;
        }
        event_bus.publish(reminder_event(&scale));
        sent += 1;
    }
    Ok(sent)
}

fn reminder_event(scale: &Scale) -> PlatformEvent {
    PlatformEvent::new(SCALE_REMINDER_DUE)
        .with_church(scale.church_id)
        .with_source("scale", scale.id)
        .with_payload(json!({
            "scale_id": scale.id,
            "title": scale.title,
            "scale_date": scale.scale_date.format("%d/%m/%Y").to_string(),
            "scale_time": scale.scale_time,
        }))
}
