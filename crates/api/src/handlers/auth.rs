//! Handlers for the `/auth` resource (login, refresh, logout, me, password).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use koinonia_core::error::CoreError;
use koinonia_core::event_names::USER_LOGIN;
use koinonia_core::roles::ROLE_MASTER;
use koinonia_core::types::DbId;
use koinonia_db::models::profile::{CreateProfile, Profile};
use koinonia_db::models::session::CreateSession;
use koinonia_db::models::user::{CreateUser, User, UserResponse};
use koinonia_db::repositories::{ChurchRepo, ProfileRepo, RoleRepo, SessionRepo, UserRepo};
use koinonia_events::PlatformEvent;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Maximum consecutive failed login attempts before locking the account.
const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Duration in minutes to lock an account after exceeding failed attempts.
const LOCK_DURATION_MINS: i64 = 15;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`. `login` is a username or an email.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username", alias = "email")]
    pub login: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Successful authentication response returned by login, refresh and
/// invite acceptance.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub role: String,
    pub church_id: Option<DbId>,
}

/// The signed-in user with their member profile.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
    pub profile: Option<Profile>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with username or email plus password.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = UserRepo::find_by_login(&state.pool, input.login.trim())
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid username or password".into(),
            ))
        })?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    if let Some(locked_until) = user.locked_until {
        if locked_until > Utc::now() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Account is temporarily locked. Try again later.".into(),
            )));
        }
    }

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        let failed = UserRepo::increment_failed_login(&state.pool, user.id).await?;
        if failed >= MAX_FAILED_ATTEMPTS {
            let lock_until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
            UserRepo::lock_account(&state.pool, user.id, lock_until).await?;
            tracing::warn!(user_id = user.id, failed, "Account locked after failed logins");
        }

        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid username or password".into(),
        )));
    }

    let role = resolve_role(&state, &user).await?;
    ensure_church_active(&state, &user, &role).await?;

    UserRepo::record_successful_login(&state.pool, user.id).await?;

    let mut event = PlatformEvent::new(USER_LOGIN)
        .with_source("user", user.id)
        .with_actor(user.id);
    if let Some(church_id) = user.church_id {
        event = event.with_church(church_id);
    }
    state.event_bus.publish(event);

    let response = create_auth_response(&state, &user, &role).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid refresh token for a new token pair. The old session is
/// revoked.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let token_hash = hash_refresh_token(&input.refresh_token);

    let session = SessionRepo::consume(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let role = resolve_role(&state, &user).await?;
    ensure_church_active(&state, &user, &role).await?;

    let response = create_auth_response(&state, &user, &role).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/logout
///
/// Revoke every session of the caller. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<MeResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or(CoreError::not_found("User", auth_user.user_id))?;
    let role = resolve_role(&state, &user).await?;

    let profile = match user.church_id {
        Some(church_id) => ProfileRepo::find_by_user(&state.pool, user.id, church_id).await?,
        None => None,
    };

    Ok(Json(DataResponse {
        data: MeResponse {
            user: UserResponse::from_user(&user, &role),
            profile,
        },
    }))
}

/// POST /api/v1/auth/password
///
/// Change the caller's password. Other sessions are revoked.
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    let user = UserRepo::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or(CoreError::not_found("User", auth_user.user_id))?;

    let current_ok = verify_password(&input.current_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !current_ok {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Current password is incorrect".into(),
        )));
    }

    validate_password_strength(&input.new_password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    UserRepo::set_password_hash(&state.pool, user.id, &hash).await?;
    SessionRepo::revoke_all_for_user(&state.pool, user.id).await?;

    tracing::info!(user_id = user.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn resolve_role(state: &AppState, user: &User) -> AppResult<String> {
    UserRepo::role_name(&state.pool, user.id)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("User {} has no role", user.id)))
}

/// Members of a deactivated church can not sign in. Masters have no church.
async fn ensure_church_active(state: &AppState, user: &User, role: &str) -> AppResult<()> {
    if role == ROLE_MASTER {
        return Ok(());
    }
    let Some(church_id) = user.church_id else {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is not linked to a church".into(),
        )));
    };
    let church = ChurchRepo::find_by_id(&state.pool, church_id)
        .await?
        .ok_or(CoreError::not_found("Church", church_id))?;
    if !church.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Church is deactivated".into(),
        )));
    }
    Ok(())
}

/// A new church account with its member profile.
pub(crate) struct NewAccount<'a> {
    pub church_id: DbId,
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: &'a str,
    pub full_name: &'a str,
}

/// Create a user and its profile in `church_id`, as one write.
pub(crate) async fn register_account(state: &AppState, account: NewAccount<'_>) -> AppResult<User> {
    let church_id = account.church_id;
    let role = account.role;
    let (user, profile) = prepare_account(state, account).await?;
    let user = UserRepo::create_with_profile(&state.pool, &user, church_id, &profile).await?;

    tracing::info!(user_id = user.id, church_id, role, "Account created");
    Ok(user)
}

/// Validate a new account and build the rows for it, without writing
/// anything.
pub(crate) async fn prepare_account(
    state: &AppState,
    account: NewAccount<'_>,
) -> AppResult<(CreateUser, CreateProfile)> {
    validate_password_strength(account.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let username = account.username.trim();
    if username.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "username must not be empty".into(),
        )));
    }

    let role = RoleRepo::find_by_name(&state.pool, account.role)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Role '{}' is not seeded", account.role)))?;

    let password_hash = hash_password(account.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = CreateUser {
        username: username.to_string(),
        email: account.email.trim().to_lowercase(),
        password_hash,
        role_id: role.id,
        church_id: Some(account.church_id),
    };

    let full_name = match account.full_name.trim() {
        "" => username,
        name => name,
    };
    let profile = CreateProfile {
        full_name: full_name.to_string(),
        phone: None,
        birth_date: None,
        functions: Vec::new(),
        skill_level: None,
        preferred_times: Vec::new(),
        notes: None,
    };
    Ok((user, profile))
}

/// Generate access + refresh tokens, persist a session row, and build the response.
pub(crate) async fn create_auth_response(
    state: &AppState,
    user: &User,
    role: &str,
) -> AppResult<AuthResponse> {
    let access_token = generate_access_token(user.id, role, user.church_id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();

    let expires_at =
        Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);

    let session_input = CreateSession {
        user_id: user.id,
        church_id: user.church_id,
        refresh_token_hash: refresh_hash,
        expires_at,
    };
    SessionRepo::create(&state.pool, &session_input).await?;

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh_plaintext,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user: UserInfo {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: role.to_string(),
            church_id: user.church_id,
        },
    })
}
