#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use koinonia_api::auth::jwt::{generate_access_token, JwtConfig};
use koinonia_api::auth::password::hash_password;
use koinonia_api::config::ServerConfig;
use koinonia_api::router::build_app_router;
use koinonia_api::state::AppState;
use koinonia_api::storage::LocalAvatarStore;
use koinonia_api::ws::WsManager;
use koinonia_db::models::church::{Church, CreateChurch};
use koinonia_db::models::user::{CreateUser, User};
use koinonia_db::repositories::{ChurchRepo, RoleRepo, UserRepo};
use koinonia_events::EventBus;

/// Password every seeded user gets.
pub const TEST_PASSWORD: &str = "Str0ng-Passw0rd!";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        storage_dir: std::env::temp_dir().join("koinonia-test-storage"),
        public_base_url: "http://localhost:3000".to_string(),
        frontend_dir: None,
        backend_hostname: Some("api.koinonia.test".to_string()),
        jwt: JwtConfig {
            secret: "test-secret-do-not-use-in-production".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
    }
}

pub fn test_state(pool: PgPool) -> AppState {
    let config = test_config();
    let avatar_store = Arc::new(LocalAvatarStore::new(
        config.storage_dir.clone(),
        config.public_base_url.clone(),
    ));
    AppState {
        pool,
        config: Arc::new(config),
        ws_manager: Arc::new(WsManager::new()),
        event_bus: Arc::new(EventBus::default()),
        avatar_store,
    }
}

/// Build the full application router through the same builder `main.rs`
/// uses, so tests exercise the production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(test_state(pool))
}

/// Like [`build_test_app`], for tests that need to hold on to the state's
/// WebSocket manager or event bus.
pub fn build_test_app_with(state: AppState) -> Router {
    build_app_router(state, &test_config())
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

pub async fn create_church(pool: &PgPool, name: &str) -> Church {
    let slug = name.to_lowercase().replace(' ', "-");
    let input = CreateChurch {
        name: name.to_string(),
        slug: None,
        city: None,
        state: None,
        address: None,
        phone: None,
        email: None,
        logo_url: None,
    };
    ChurchRepo::create(pool, &input, &slug)
        .await
        .expect("church creation should succeed")
}

/// Insert a user with [`TEST_PASSWORD`] directly in the database.
pub async fn create_user(
    pool: &PgPool,
    church_id: Option<i64>,
    username: &str,
    role: &str,
) -> User {
    let role = RoleRepo::find_by_name(pool, role)
        .await
        .unwrap()
        .expect("roles are seeded by migrations");
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@test.com"),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        role_id: role.id,
        church_id,
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

/// Mint an access token for `user` without going through login.
pub fn token_for(user: &User, role: &str) -> String {
    generate_access_token(user.id, role, user.church_id, &test_config().jwt).unwrap()
}

/// A church with one user per tenant role. Tokens are ready to use.
pub struct Fixture {
    pub church: Church,
    pub admin: User,
    pub admin_token: String,
    pub leader: User,
    pub leader_token: String,
    pub member: User,
    pub member_token: String,
}

pub async fn seed_church(pool: &PgPool, name: &str) -> Fixture {
    let church = create_church(pool, name).await;
    let prefix = church.slug.replace('-', "_");
    let admin = create_user(pool, Some(church.id), &format!("{prefix}_admin"), "admin").await;
    let leader = create_user(pool, Some(church.id), &format!("{prefix}_leader"), "leader").await;
    let member = create_user(pool, Some(church.id), &format!("{prefix}_member"), "member").await;
    Fixture {
        admin_token: token_for(&admin, "admin"),
        leader_token: token_for(&leader, "leader"),
        member_token: token_for(&member, "member"),
        church,
        admin,
        leader,
        member,
    }
}
