//! Integration tests for platform administration and church scoping.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_user, get_auth, post_json, post_json_auth, seed_church, token_for,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn church_admins_can_not_reach_master_routes(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/v1/master/churches", &fx.admin_token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn master_onboards_a_church(pool: PgPool) {
    let master = create_user(&pool, None, "root", "master").await;
    let token = token_for(&master, "master");

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/master/churches",
        json!({ "name": "Igreja da Esperança", "city": "Recife" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let church = body_json(response).await["data"].clone();
    assert_eq!(church["slug"], "igreja-da-esperanca");
    let church_id = church["id"].as_i64().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        &format!("/api/v1/master/churches/{church_id}/admin"),
        json!({
            "username": "pastor",
            "email": "pastor@esperanca.org",
            "password": "senha-do-pastor",
            "full_name": "Pastor João",
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // The new admin signs in straight away.
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "login": "pastor", "password": "senha-do-pastor" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["user"]["role"], "admin");

    let app = common::build_test_app(pool);
    let list = body_json(get_auth(app, "/api/v1/master/churches", &token).await).await;
    let listed = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == church_id)
        .cloned()
        .unwrap();
    assert_eq!(listed["member_count"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deactivation_blocks_sign_in(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let master = create_user(&pool, None, "root", "master").await;
    let token = token_for(&master, "master");

    let app = common::build_test_app(pool.clone());
    let session = body_json(
        post_json(
            app,
            "/api/v1/auth/login",
            json!({ "login": fx.member.username, "password": common::TEST_PASSWORD }),
        )
        .await,
    )
    .await;
    let refresh_token = session["refresh_token"].as_str().unwrap().to_string();

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        &format!("/api/v1/master/churches/{}/deactivate", fx.church.id),
        json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["is_active"], false);

    // Open sessions die with the church.
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/auth/refresh",
        json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "login": fx.member.username, "password": common::TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn master_picks_the_church_per_request(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let master = create_user(&pool, None, "root", "master").await;
    let token = token_for(&master, "master");

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/departments", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool);
    let response = get_auth(
        app,
        &format!("/api/v1/departments?church_id={}", fx.church.id),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn members_can_not_switch_churches(pool: PgPool) {
    let grace = seed_church(&pool, "Grace").await;
    let hope = seed_church(&pool, "Hope").await;
    let app = common::build_test_app(pool);

    let response = get_auth(
        app,
        &format!("/api/v1/departments?church_id={}", hope.church.id),
        &grace.member_token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
