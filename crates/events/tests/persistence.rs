//! The persistence loop writes bus events to the `events` table and stops
//! when the bus is dropped.

use koinonia_db::models::church::CreateChurch;
use koinonia_db::repositories::{ChurchRepo, EventRepo};
use koinonia_events::{EventBus, EventPersistence, PlatformEvent};
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn events_are_persisted_until_bus_closes(pool: PgPool) {
    let church = ChurchRepo::create(
        &pool,
        &CreateChurch {
            name: "Igreja Central".to_string(),
            slug: None,
            city: None,
            state: None,
            address: None,
            phone: None,
            email: None,
            logo_url: None,
        },
        "igreja-central",
    )
    .await
    .unwrap();

    let bus = EventBus::default();
    let handle = tokio::spawn(EventPersistence::run(pool.clone(), bus.subscribe()));

    bus.publish(
        PlatformEvent::new("department.created")
            .with_church(church.id)
            .with_source("department", 1)
            .with_payload(serde_json::json!({"name": "Louvor"})),
    );
    bus.publish(PlatformEvent::new("scale.published").with_church(church.id));

    drop(bus);
    handle.await.unwrap();

    let events = EventRepo::list_recent(&pool, church.id, None, 10, 0).await.unwrap();
    assert_eq!(events.len(), 2);
    let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
    assert!(types.contains(&"department.created"));
    assert!(types.contains(&"scale.published"));
    let created = events
        .iter()
        .find(|e| e.event_type == "department.created")
        .unwrap();
    assert_eq!(created.payload["name"], "Louvor");
    assert_eq!(created.source_entity_type.as_deref(), Some("department"));

    let scales = EventRepo::list_recent(&pool, church.id, Some("scale"), 10, 0)
        .await
        .unwrap();
    assert_eq!(scales.len(), 1);
    assert_eq!(scales[0].event_type, "scale.published");
}
