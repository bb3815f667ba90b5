//! Integration test for the realtime department relay: a department written
//! over HTTP reaches a WebSocket session following the `departments` topic.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use axum::http::StatusCode;
use common::{post_json_auth, seed_church};
use koinonia_api::realtime::{RealtimeRelay, DEPARTMENTS_RELOADED};
use koinonia_core::session_store::{SessionAction, SessionUser, Topic};
use serde_json::json;
use sqlx::PgPool;
use tokio::sync::mpsc;

async fn next_frame(rx: &mut mpsc::UnboundedReceiver<Message>) -> serde_json::Value {
    let message = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("relay frame within five seconds")
        .expect("connection still open");
    match message {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn created_department_is_pushed_to_followers(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let state = common::test_state(pool.clone());

    let follower = SessionUser {
        user_id: fx.member.id,
        role: "member".into(),
        home_church_id: Some(fx.church.id),
    };
    let mut rx = state
        .ws_manager
        .add("member-tab".to_string(), Some(follower))
        .await;
    state
        .ws_manager
        .dispatch("member-tab", SessionAction::Subscribe(Topic::Departments))
        .await
        .unwrap();

    let relay = RealtimeRelay::new(pool.clone(), Arc::clone(&state.ws_manager));
    let relay_task = tokio::spawn(relay.run(state.event_bus.subscribe()));

    let app = common::build_test_app_with(state.clone());
    let response = post_json_auth(
        app,
        "/api/v1/departments",
        json!({ "name": "Louvor" }),
        &fx.leader_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let frame = next_frame(&mut rx).await;
    assert_eq!(frame["type"], DEPARTMENTS_RELOADED);
    assert_eq!(frame["church_id"], fx.church.id);
    let departments = frame["data"].as_array().unwrap();
    assert_eq!(departments.len(), 1);
    assert_eq!(departments[0]["name"], "Louvor");

    relay_task.abort();
}

#[sqlx::test(migrations = "../db/migrations")]
async fn other_churches_do_not_hear_the_reload(pool: PgPool) {
    let grace = seed_church(&pool, "Grace").await;
    let hope = seed_church(&pool, "Hope").await;
    let state = common::test_state(pool.clone());

    let outsider = SessionUser {
        user_id: hope.member.id,
        role: "member".into(),
        home_church_id: Some(hope.church.id),
    };
    let mut rx = state
        .ws_manager
        .add("hope-tab".to_string(), Some(outsider))
        .await;
    state
        .ws_manager
        .dispatch("hope-tab", SessionAction::Subscribe(Topic::Departments))
        .await
        .unwrap();

    let relay = RealtimeRelay::new(pool.clone(), Arc::clone(&state.ws_manager));
    let relay_task = tokio::spawn(relay.run(state.event_bus.subscribe()));

    let app = common::build_test_app_with(state.clone());
    let response = post_json_auth(
        app,
        "/api/v1/departments",
        json!({ "name": "Louvor" }),
        &grace.leader_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let waited = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(waited.is_err(), "a different church received the reload");

    relay_task.abort();
}
