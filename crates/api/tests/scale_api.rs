//! Integration tests for scales: workflow, team answers, setlist and agenda.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, delete_auth, get_auth, post_json_auth, put_json_auth, seed_church, Fixture};
use serde_json::json;
use sqlx::PgPool;

/// A department plus a draft scale a week from now. Returns the scale id.
async fn draft_scale(pool: &PgPool, fx: &Fixture) -> i64 {
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/departments",
        json!({ "name": "Louvor" }),
        &fx.leader_token,
    )
    .await;
    let department = body_json(response).await["data"].clone();

    let date = (Utc::now() + Duration::days(7)).date_naive();
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/scales",
        json!({
            "department_id": department["id"],
            "title": "Culto de domingo",
            "scale_date": date,
            "scale_time": "19:00",
        }),
        &fx.leader_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let scale = body_json(response).await["data"].clone();
    assert_eq!(scale["status"], "draft");
    scale["id"].as_i64().unwrap()
}

async fn assign(pool: &PgPool, fx: &Fixture, scale_id: i64, user_id: i64, function: &str) {
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        &format!("/api/v1/scales/{scale_id}/members"),
        json!({ "user_id": user_id, "function_name": function }),
        &fx.leader_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn set_status(pool: &PgPool, fx: &Fixture, scale_id: i64, status: &str) -> StatusCode {
    let app = common::build_test_app(pool.clone());
    post_json_auth(
        app,
        &format!("/api/v1/scales/{scale_id}/status"),
        json!({ "status": status }),
        &fx.leader_token,
    )
    .await
    .status()
}

async fn respond(pool: &PgPool, token: &str, scale_id: i64, answer: &str) -> StatusCode {
    let app = common::build_test_app(pool.clone());
    post_json_auth(
        app,
        &format!("/api/v1/scales/{scale_id}/respond"),
        json!({ "confirmation": answer }),
        token,
    )
    .await
    .status()
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn invalid_time_is_rejected(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let app = common::build_test_app(pool.clone());
    let department = body_json(
        post_json_auth(
            app,
            "/api/v1/departments",
            json!({ "name": "Louvor" }),
            &fx.leader_token,
        )
        .await,
    )
    .await["data"]
        .clone();

    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/scales",
        json!({
            "department_id": department["id"],
            "title": "Culto",
            "scale_date": "2030-01-06",
            "scale_time": "25:00",
        }),
        &fx.leader_token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn draft_can_not_jump_to_completed(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let scale_id = draft_scale(&pool, &fx).await;

    assert_eq!(set_status(&pool, &fx, scale_id, "completed").await, StatusCode::CONFLICT);
    assert_eq!(set_status(&pool, &fx, scale_id, "published").await, StatusCode::OK);
    assert_eq!(set_status(&pool, &fx, scale_id, "completed").await, StatusCode::OK);
    // Completed is terminal.
    assert_eq!(set_status(&pool, &fx, scale_id, "draft").await, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn racing_transitions_let_only_one_through(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let scale_id = draft_scale(&pool, &fx).await;
    assert_eq!(set_status(&pool, &fx, scale_id, "published").await, StatusCode::OK);

    let (back_to_draft, complete) = tokio::join!(
        set_status(&pool, &fx, scale_id, "draft"),
        set_status(&pool, &fx, scale_id, "completed"),
    );
    let outcomes = [back_to_draft, complete];
    assert_eq!(outcomes.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(outcomes.iter().filter(|s| **s == StatusCode::CONFLICT).count(), 1);

    let app = common::build_test_app(pool);
    let response = get_auth(app, &format!("/api/v1/scales/{scale_id}"), &fx.leader_token).await;
    let expected = if back_to_draft == StatusCode::OK { "draft" } else { "completed" };
    assert_eq!(body_json(response).await["data"]["status"], expected);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn completed_scales_are_read_only(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let scale_id = draft_scale(&pool, &fx).await;
    set_status(&pool, &fx, scale_id, "published").await;
    set_status(&pool, &fx, scale_id, "completed").await;

    let app = common::build_test_app(pool);
    let response = put_json_auth(
        app,
        &format!("/api/v1/scales/{scale_id}"),
        json!({ "title": "Outro título" }),
        &fx.leader_token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn members_can_not_manage_scales(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let scale_id = draft_scale(&pool, &fx).await;

    let app = common::build_test_app(pool);
    let response = delete_auth(app, &format!("/api/v1/scales/{scale_id}"), &fx.member_token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn answers_need_a_published_scale(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let scale_id = draft_scale(&pool, &fx).await;
    assign(&pool, &fx, scale_id, fx.member.id, "Vocal").await;

    assert_eq!(
        respond(&pool, &fx.member_token, scale_id, "confirmed").await,
        StatusCode::CONFLICT
    );

    set_status(&pool, &fx, scale_id, "published").await;
    assert_eq!(
        respond(&pool, &fx.member_token, scale_id, "pending").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        respond(&pool, &fx.member_token, scale_id, "confirmed").await,
        StatusCode::OK
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn only_assigned_members_answer(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let scale_id = draft_scale(&pool, &fx).await;
    assign(&pool, &fx, scale_id, fx.member.id, "Vocal").await;
    set_status(&pool, &fx, scale_id, "published").await;

    assert_eq!(
        respond(&pool, &fx.admin_token, scale_id, "declined").await,
        StatusCode::FORBIDDEN
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn rescheduling_resets_answers(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let scale_id = draft_scale(&pool, &fx).await;
    // Two functions for the same person are allowed.
    assign(&pool, &fx, scale_id, fx.member.id, "Vocal").await;
    assign(&pool, &fx, scale_id, fx.member.id, "Violão").await;
    set_status(&pool, &fx, scale_id, "published").await;
    respond(&pool, &fx.member_token, scale_id, "confirmed").await;

    let app = common::build_test_app(pool.clone());
    let response = put_json_auth(
        app,
        &format!("/api/v1/scales/{scale_id}"),
        json!({ "scale_time": "18:30" }),
        &fx.leader_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool);
    let detail = body_json(
        get_auth(app, &format!("/api/v1/scales/{scale_id}"), &fx.member_token).await,
    )
    .await["data"]
        .clone();
    let members = detail["members"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert!(members.iter().all(|m| m["confirmation"] == "pending"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn mine_lists_published_assignments(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let scale_id = draft_scale(&pool, &fx).await;
    assign(&pool, &fx, scale_id, fx.member.id, "Vocal").await;

    let app = common::build_test_app(pool.clone());
    let mine = body_json(get_auth(app, "/api/v1/scales/mine", &fx.member_token).await).await;
    assert!(mine["data"].as_array().unwrap().is_empty());

    set_status(&pool, &fx, scale_id, "published").await;
    let app = common::build_test_app(pool);
    let mine = body_json(get_auth(app, "/api/v1/scales/mine", &fx.member_token).await).await;
    assert_eq!(mine["data"][0]["id"], scale_id);
}

// ---------------------------------------------------------------------------
// Setlist / agenda
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn detail_sums_agenda_minutes(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let scale_id = draft_scale(&pool, &fx).await;

    for (title, minutes) in [("Louvor", 25), ("Palavra", 40)] {
        let app = common::build_test_app(pool.clone());
        let response = post_json_auth(
            app,
            &format!("/api/v1/scales/{scale_id}/agenda"),
            json!({ "title": title, "duration_minutes": minutes }),
            &fx.leader_token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        &format!("/api/v1/scales/{scale_id}/agenda"),
        json!({ "title": "Avisos", "duration_minutes": 0 }),
        &fx.leader_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let app = common::build_test_app(pool);
    let detail = body_json(
        get_auth(app, &format!("/api/v1/scales/{scale_id}"), &fx.leader_token).await,
    )
    .await["data"]
        .clone();
    assert_eq!(detail["agenda"].as_array().unwrap().len(), 2);
    assert_eq!(detail["agenda_total_minutes"], 65);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn setlist_uses_church_songs(pool: PgPool) {
    let fx = seed_church(&pool, "Grace").await;
    let scale_id = draft_scale(&pool, &fx).await;

    let app = common::build_test_app(pool.clone());
    let song = body_json(
        post_json_auth(
            app,
            "/api/v1/songs",
            json!({ "title": "Grande é o Senhor", "song_key": "G" }),
            &fx.leader_token,
        )
        .await,
    )
    .await["data"]
        .clone();

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        &format!("/api/v1/scales/{scale_id}/songs"),
        json!({ "song_id": song["id"] }),
        &fx.leader_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = common::build_test_app(pool);
    let detail = body_json(
        get_auth(app, &format!("/api/v1/scales/{scale_id}"), &fx.member_token).await,
    )
    .await["data"]
        .clone();
    assert_eq!(detail["songs"][0]["title"], "Grande é o Senhor");
}
