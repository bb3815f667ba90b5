//! Unit tests for `WsManager`.
//!
//! These exercise the connection manager directly, without HTTP upgrades:
//! add/remove, per-user and per-topic delivery, session actions, the
//! heartbeat and shutdown.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use koinonia_api::ws::{start_heartbeat, WsManager};
use koinonia_core::session_store::{SessionAction, SessionUser, Topic};

fn member(user_id: i64, church_id: i64) -> Option<SessionUser> {
    Some(SessionUser {
        user_id,
        role: "member".into(),
        home_church_id: Some(church_id),
    })
}

fn text(body: &str) -> Message {
    Message::Text(body.to_string().into())
}

#[tokio::test]
async fn new_manager_has_zero_connections() {
    let manager = WsManager::new();

    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn add_and_remove_track_the_count() {
    let manager = WsManager::new();

    let _rx = manager.add("conn-1".to_string(), None).await;
    assert_eq!(manager.connection_count().await, 1);

    manager.remove("nonexistent").await;
    assert_eq!(manager.connection_count().await, 1);

    manager.remove("conn-1").await;
    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn send_to_user_reaches_every_tab() {
    let manager = WsManager::new();
    let mut rx_a = manager.add("tab-a".to_string(), member(7, 1)).await;
    let mut rx_b = manager.add("tab-b".to_string(), member(7, 1)).await;
    let mut rx_other = manager.add("other".to_string(), member(8, 1)).await;

    let sent = manager.send_to_user(7, text("hello")).await;

    assert_eq!(sent, 2);
    assert!(rx_a.try_recv().is_ok());
    assert!(rx_b.try_recv().is_ok());
    assert!(rx_other.try_recv().is_err());
}

#[tokio::test]
async fn topics_are_scoped_to_the_active_church() {
    let manager = WsManager::new();
    let mut grace = manager.add("grace".to_string(), member(1, 10)).await;
    let mut hope = manager.add("hope".to_string(), member(2, 20)).await;

    manager
        .dispatch("grace", SessionAction::Subscribe(Topic::Departments))
        .await
        .unwrap();
    manager
        .dispatch("hope", SessionAction::Subscribe(Topic::Departments))
        .await
        .unwrap();

    let sent = manager
        .send_to_topic(10, Topic::Departments, text("reload"))
        .await;

    assert_eq!(sent, 1);
    assert!(grace.try_recv().is_ok());
    assert!(hope.try_recv().is_err());
}

#[tokio::test]
async fn unsubscribed_sessions_stop_receiving() {
    let manager = WsManager::new();
    let mut rx = manager.add("conn".to_string(), member(1, 10)).await;
    manager
        .dispatch("conn", SessionAction::Subscribe(Topic::Scales))
        .await
        .unwrap();
    manager
        .dispatch("conn", SessionAction::Unsubscribe(Topic::Scales))
        .await
        .unwrap();

    let sent = manager.send_to_topic(10, Topic::Scales, text("x")).await;

    assert_eq!(sent, 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn dispatch_to_unknown_connection_fails() {
    let manager = WsManager::new();

    let result = manager
        .dispatch("ghost", SessionAction::Subscribe(Topic::Scales))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn sign_out_detaches_the_user() {
    let manager = WsManager::new();
    let _rx = manager.add("conn".to_string(), member(5, 10)).await;
    assert_eq!(manager.get_by_user(5).await, vec!["conn".to_string()]);

    manager.dispatch("conn", SessionAction::Reset).await.unwrap();

    assert!(manager.get_by_user(5).await.is_empty());
    let session = manager.session("conn").await.unwrap();
    assert!(session.user.is_none());
}

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();
    let mut rx = manager.add("conn-1".to_string(), None).await;

    manager.shutdown_all().await;

    assert_eq!(manager.connection_count().await, 0);
    assert!(matches!(rx.recv().await, Some(Message::Close(None))));
}

#[tokio::test]
async fn ping_all_prunes_connections_whose_receiver_is_gone() {
    let manager = WsManager::new();
    let mut alive = manager.add("alive".to_string(), member(1, 10)).await;
    let gone = manager.add("gone".to_string(), member(2, 10)).await;
    drop(gone);

    assert_eq!(manager.ping_all().await, 1);

    assert_eq!(manager.connection_count().await, 1);
    assert!(matches!(alive.recv().await, Some(Message::Ping(_))));
}

#[tokio::test]
async fn heartbeat_pings_and_prunes_on_its_first_tick() {
    let manager = Arc::new(WsManager::new());
    let mut alive = manager.add("alive".to_string(), member(1, 10)).await;
    drop(manager.add("gone".to_string(), member(2, 10)).await);

    let heartbeat = start_heartbeat(Arc::clone(&manager));

    let frame = tokio::time::timeout(Duration::from_secs(5), alive.recv())
        .await
        .expect("first tick fires immediately");
    assert!(matches!(frame, Some(Message::Ping(_))));
    assert_eq!(manager.connection_count().await, 1);

    heartbeat.abort();
    assert!(heartbeat.await.unwrap_err().is_cancelled());
}
