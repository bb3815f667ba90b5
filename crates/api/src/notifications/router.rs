//! Event-to-notification routing.
//!
//! [`NotificationRouter`] subscribes to the event bus, works out who an event
//! concerns, stores one notification row per recipient and pushes it to any
//! open WebSocket of that user.

use std::collections::BTreeMap;
use std::sync::Arc;

use koinonia_core::event_names::{
    INVITE_ACCEPTED, MEMBER_JOINED_DEPARTMENT, SCALE_MEMBER_DECLINED, SCALE_PUBLISHED,
    SCALE_REMINDER_DUE, SCALE_UPDATED,
};
use koinonia_core::notification::{self, NotificationContent};
use koinonia_core::roles::ROLE_ADMIN;
use koinonia_core::scale::CONFIRMATION_DECLINED;
use koinonia_core::types::DbId;
use koinonia_db::models::notification::{CreateNotification, Notification};
use koinonia_db::repositories::{DepartmentRepo, NotificationRepo, ScaleMemberRepo, UserRepo};
use koinonia_db::DbPool;
use koinonia_events::PlatformEvent;
use serde_json::json;
use tokio::sync::broadcast;

use crate::ws::protocol::text;
use crate::ws::WsManager;

/// A notification addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub user_id: DbId,
    pub content: NotificationContent,
}

pub struct NotificationRouter {
    pool: DbPool,
    ws_manager: Arc<WsManager>,
}

impl NotificationRouter {
    pub fn new(pool: DbPool, ws_manager: Arc<WsManager>) -> Self {
        Self { pool, ws_manager }
    }

    /// Run the routing loop until the [`EventBus`](koinonia_events::EventBus)
    /// is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Store and push every notification an event produces.
    pub async fn route_event(&self, event: &PlatformEvent) -> Result<usize, sqlx::Error> {
        let deliveries = self.determine_deliveries(event).await?;
        let count = deliveries.len();
        for delivery in deliveries {
            self.deliver(event.church_id, delivery).await?;
        }
        if count > 0 {
            tracing::debug!(event_type = %event.event_type, count, "Notifications delivered");
        }
        Ok(count)
    }

    async fn determine_deliveries(
        &self,
        event: &PlatformEvent,
    ) -> Result<Vec<Delivery>, sqlx::Error> {
        let scale_id = event.payload_id("scale_id").or(event.source_entity_id);
        let title = event.payload_str("title").unwrap_or_default();

        let deliveries = match event.event_type.as_str() {
            SCALE_PUBLISHED => {
                let Some(scale_id) = scale_id else {
                    return Ok(vec![]);
                };
                let date = event.payload_str("scale_date").unwrap_or_default();
                self.functions_by_member(scale_id)
                    .await?
                    .into_iter()
                    .map(|(user_id, functions)| Delivery {
                        user_id,
                        content: notification::scale_published(
                            scale_id,
                            title,
                            date,
                            &functions.join(", "),
                        ),
                    })
                    .collect()
            }

            SCALE_UPDATED => {
                let Some(scale_id) = scale_id else {
                    return Ok(vec![]);
                };
                if event.payload_str("status") != Some(koinonia_core::scale::STATUS_PUBLISHED) {
                    return Ok(vec![]);
                }
                self.functions_by_member(scale_id)
                    .await?
                    .into_keys()
                    .map(|user_id| Delivery {
                        user_id,
                        content: notification::scale_updated(scale_id, title),
                    })
                    .collect()
            }

            SCALE_REMINDER_DUE => {
                let Some(scale_id) = scale_id else {
                    return Ok(vec![]);
                };
                let date = event.payload_str("scale_date").unwrap_or_default();
                let time = event.payload_str("scale_time").unwrap_or_default();
                self.functions_by_member(scale_id)
                    .await?
                    .into_keys()
                    .map(|user_id| Delivery {
                        user_id,
                        content: notification::scale_reminder(scale_id, title, date, time),
                    })
                    .collect()
            }

            SCALE_MEMBER_DECLINED => {
                let (Some(scale_id), Some(department_id)) =
                    (scale_id, event.payload_id("department_id"))
                else {
                    return Ok(vec![]);
                };
                let member_name = event.payload_str("member_name").unwrap_or_default();
                let mut targets = DepartmentRepo::leader_ids(&self.pool, department_id).await?;
                if targets.is_empty() {
                    if let Some(church_id) = event.church_id {
                        targets =
                            UserRepo::list_ids_with_roles(&self.pool, church_id, &[ROLE_ADMIN])
                                .await?;
                    }
                }
                addressed(
                    targets,
                    event.actor_user_id,
                    notification::scale_declined(scale_id, title, member_name),
                )
            }

            INVITE_ACCEPTED => {
                let Some(church_id) = event.church_id else {
                    return Ok(vec![]);
                };
                let email = event.payload_str("email").unwrap_or_default();
                let admins =
                    UserRepo::list_ids_with_roles(&self.pool, church_id, &[ROLE_ADMIN]).await?;
                addressed(admins, event.actor_user_id, notification::invite_accepted(email))
            }

            MEMBER_JOINED_DEPARTMENT => {
                let Some(department_id) = event.payload_id("department_id") else {
                    return Ok(vec![]);
                };
                let name = event.payload_str("department_name").unwrap_or_default();
                let member_name = event.payload_str("member_name").unwrap_or_default();
                let mut leaders = DepartmentRepo::leader_ids(&self.pool, department_id).await?;
                if let Some(joined) = event.payload_id("user_id") {
                    leaders.retain(|id| *id != joined);
                }
                addressed(
                    leaders,
                    event.actor_user_id,
                    notification::department_joined(department_id, name, member_name),
                )
            }

            _ => vec![],
        };
        Ok(deliveries)
    }

    /// Active assignments of a scale grouped per member. Declined
    /// assignments are left out.
    async fn functions_by_member(
        &self,
        scale_id: DbId,
    ) -> Result<BTreeMap<DbId, Vec<String>>, sqlx::Error> {
        let mut grouped: BTreeMap<DbId, Vec<String>> = BTreeMap::new();
        for member in ScaleMemberRepo::list_for_scale(&self.pool, scale_id).await? {
            if member.confirmation == CONFIRMATION_DECLINED {
                continue;
            }
            grouped
                .entry(member.user_id)
                .or_default()
                .push(member.function_name);
        }
        Ok(grouped)
    }

    async fn deliver(
        &self,
        church_id: Option<DbId>,
        delivery: Delivery,
    ) -> Result<Notification, sqlx::Error> {
        let input = CreateNotification {
            user_id: delivery.user_id,
            church_id,
            kind: delivery.content.kind.to_string(),
            title: delivery.content.title,
            message: delivery.content.message,
            link: delivery.content.link,
        };
        let created = NotificationRepo::create(&self.pool, &input).await?;

        let msg = json!({
            "type": "notification",
            "data": created,
        });
        self.ws_manager
            .send_to_user(delivery.user_id, text(msg))
            .await;
        Ok(created)
    }
}

/// One delivery per target, skipping whoever caused the event.
fn addressed(
    targets: Vec<DbId>,
    actor: Option<DbId>,
    content: NotificationContent,
) -> Vec<Delivery> {
    let mut targets = targets;
    targets.sort_unstable();
    targets.dedup();
    targets
        .into_iter()
        .filter(|id| Some(*id) != actor)
        .map(|user_id| Delivery {
            user_id,
            content: content.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_is_not_notified_and_targets_are_unique() {
        let content = notification::invite_accepted("ana@example.com");
        let deliveries = addressed(vec![3, 1, 3, 2], Some(2), content);
        let ids: Vec<DbId> = deliveries.iter().map(|d| d.user_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
