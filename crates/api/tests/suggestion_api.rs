//! Integration tests for staffing suggestions over live and sample candidates.

mod common;

use axum::http::StatusCode;
use common::{body_json, get_auth, post_json_auth, seed_church};
use serde_json::json;
use sqlx::PgPool;

fn requirement(roles: &[&str]) -> serde_json::Value {
    json!({
        "department": "Louvor",
        "time": "19:00",
        "date": "2030-03-10",
        "roles": roles,
    })
}

#[sqlx::test(migrations = "../db/migrations")]
async fn suggestions_are_leader_only(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/v1/suggestions",
        requirement(&["Vocal"]),
        &fx.member_token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sample_roster_fills_the_louvor_table(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let app = common::build_test_app(pool);

    // No explicit roles: the department's own list applies.
    let body = json!({ "department": "Louvor", "time": "19:00", "date": "2030-03-10" });
    let response =
        post_json_auth(app, "/api/v1/suggestions?source=sample", body, &fx.leader_token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["source"], "sample");
    let suggestions = json["data"]["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 7);
    for role in suggestions {
        assert!(role["candidates"].as_array().unwrap().len() <= 3);
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn live_candidates_come_from_profiles(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        &format!("/api/v1/members/{}/profile", fx.member.id),
        json!({
            "full_name": "Ana Costa",
            "functions": ["Vocal"],
            "skill_level": "avançado",
            "preferred_times": ["19:00"],
        }),
        &fx.member_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/suggestions",
        requirement(&["Vocal", "Bateria"]),
        &fx.leader_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["source"], "live");

    let suggestions = json["data"]["suggestions"].as_array().unwrap();
    let vocal = suggestions.iter().find(|s| s["role"] == "Vocal").unwrap();
    assert_eq!(vocal["candidates"][0]["member_id"], fx.member.id);
    assert_eq!(vocal["candidates"][0]["name"], "Ana Costa");
    // Nobody plays drums: the role is listed with no candidates.
    let drums = suggestions.iter().find(|s| s["role"] == "Bateria").unwrap();
    assert!(drums["candidates"].as_array().unwrap().is_empty());

    // The balanced team leaves unfilled roles out.
    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/suggestions/team",
        requirement(&["Vocal", "Bateria"]),
        &fx.leader_token,
    )
    .await;
    let team = body_json(response).await["data"]["team"].clone();
    let team = team.as_array().unwrap();
    assert_eq!(team.len(), 1);
    assert_eq!(team[0]["role"], "Vocal");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn bad_time_is_rejected(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let app = common::build_test_app(pool);

    let body = json!({ "department": "Louvor", "time": "7pm", "date": "2030-03-10" });
    let response = post_json_auth(app, "/api/v1/suggestions", body, &fx.leader_token).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn departments_lists_role_tables(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/v1/suggestions/departments", &fx.leader_token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let louvor = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["department"] == "Louvor")
        .cloned()
        .unwrap();
    assert!(louvor["roles"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r == "Bateria"));
}
