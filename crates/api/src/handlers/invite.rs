//! Handlers for church invitations.
//!
//! Admins create invites for an email address and role; the plaintext token
//! is returned once and travels to the invitee out of band. Accepting an
//! invite is public: it creates the account and signs it in.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use koinonia_core::error::CoreError;
use koinonia_core::event_names::{INVITE_ACCEPTED, INVITE_CREATED, INVITE_REVOKED};
use koinonia_core::invite::{ensure_acceptable, expiry_days, generate_token, hash_token};
use koinonia_core::roles::{can_assign, ROLE_MEMBER};
use koinonia_core::types::DbId;
use koinonia_db::models::invite::{CreateInvite, InviteResponse};
use koinonia_db::repositories::{ChurchRepo, DepartmentRepo, InviteRepo, RoleRepo, UserRepo};
use koinonia_events::PlatformEvent;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::handlers::auth::{create_auth_response, prepare_account, AuthResponse, NewAccount};
use crate::middleware::tenant::TenantAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateInviteRequest {
    pub email: String,
    /// Defaults to `member`.
    pub role: Option<String>,
    pub department_id: Option<DbId>,
    /// Clamped to 1..=30, default 7.
    pub expires_in_days: Option<i64>,
}

/// The created invite plus its token. The token is never shown again.
#[derive(Debug, Serialize)]
pub struct CreatedInvite {
    #[serde(flatten)]
    pub invite: InviteResponse,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct AcceptInviteRequest {
    pub token: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

fn valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

/// POST /api/v1/invites
pub async fn create(
    TenantAdmin(tenant): TenantAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateInviteRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<CreatedInvite>>)> {
    let email = input.email.trim().to_lowercase();
    if !valid_email(&email) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Invalid email address '{email}'"
        ))));
    }
    if UserRepo::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "A user with this email already exists".into(),
        )));
    }

    let role_name = input.role.as_deref().unwrap_or(ROLE_MEMBER);
    if !can_assign(&tenant.user.role, role_name) {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Role '{role_name}' can not be granted by '{}'",
            tenant.user.role
        ))));
    }
    let role = RoleRepo::find_by_name(&state.pool, role_name)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(format!("Unknown role '{role_name}'")))
        })?;

    if let Some(department_id) = input.department_id {
        DepartmentRepo::find_in_church(&state.pool, department_id, tenant.church_id)
            .await?
            .ok_or(CoreError::not_found("Department", department_id))?;
    }

    let (token, token_hash) = generate_token();
    let expires_at = Utc::now() + chrono::Duration::days(expiry_days(input.expires_in_days));

    let invite = InviteRepo::create(
        &state.pool,
        &CreateInvite {
            church_id: tenant.church_id,
            email,
            role_id: role.id,
            department_id: input.department_id,
            token_hash,
            invited_by: Some(tenant.user_id()),
            expires_at,
        },
    )
    .await?;

    state.event_bus.publish(
        PlatformEvent::new(INVITE_CREATED)
            .with_church(tenant.church_id)
            .with_source("invite", invite.id)
            .with_actor(tenant.user_id())
            .with_payload(json!({ "email": invite.email, "role": role.name })),
    );
    tracing::info!(invite_id = invite.id, church_id = tenant.church_id, "Invite created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedInvite {
                invite: InviteResponse::new(invite, Utc::now()),
                token,
            },
        }),
    ))
}

/// GET /api/v1/invites
pub async fn list(
    TenantAdmin(tenant): TenantAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<InviteResponse>>>> {
    let now = Utc::now();
    let invites = InviteRepo::list_by_church(&state.pool, tenant.church_id)
        .await?
        .into_iter()
        .map(|invite| InviteResponse::new(invite, now))
        .collect();
    Ok(Json(DataResponse { data: invites }))
}

/// DELETE /api/v1/invites/{id}
///
/// Only pending invites can be revoked.
pub async fn revoke(
    TenantAdmin(tenant): TenantAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<InviteResponse>>> {
    let invite = InviteRepo::revoke(&state.pool, id, tenant.church_id)
        .await?
        .ok_or(CoreError::not_found("Invite", id))?;

    state.event_bus.publish(
        PlatformEvent::new(INVITE_REVOKED)
            .with_church(tenant.church_id)
            .with_source("invite", id)
            .with_actor(tenant.user_id()),
    );

    Ok(Json(DataResponse {
        data: InviteResponse::new(invite, Utc::now()),
    }))
}

/// POST /api/v1/invites/accept
///
/// Public. Creates the account described by the invite and returns a
/// signed-in session.
pub async fn accept(
    State(state): State<AppState>,
    Json(input): Json<AcceptInviteRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let invite = InviteRepo::find_by_token_hash(&state.pool, &hash_token(input.token.trim()))
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Invalid invite token".into())))?;
    ensure_acceptable(invite.state(Utc::now()))?;

    let church = ChurchRepo::find_by_id(&state.pool, invite.church_id)
        .await?
        .ok_or(CoreError::not_found("Church", invite.church_id))?;
    if !church.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Church is deactivated".into(),
        )));
    }

    let role = RoleRepo::find_by_id(&state.pool, invite.role_id)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Invite {} has no role", invite.id)))?;

    let (new_user, profile) = prepare_account(
        &state,
        NewAccount {
            church_id: invite.church_id,
            username: &input.username,
            email: &invite.email,
            password: &input.password,
            role: &role.name,
            full_name: &input.full_name,
        },
    )
    .await?;
    if UserRepo::find_by_login(&state.pool, &new_user.username)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(
            "Username is already taken".into(),
        )));
    }

    // Claim, account and department membership commit together; a failure
    // in any of them leaves the invite pending.
    let user = InviteRepo::accept(&state.pool, &invite, &new_user, &profile)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict("Invite is no longer valid".into()))
        })?;
    tracing::info!(
        user_id = user.id,
        church_id = invite.church_id,
        invite_id = invite.id,
        "Invite accepted"
    );

    state.event_bus.publish(
        PlatformEvent::new(INVITE_ACCEPTED)
            .with_church(invite.church_id)
            .with_source("invite", invite.id)
            .with_actor(user.id)
            .with_payload(json!({ "email": invite.email, "user_id": user.id })),
    );

    let response = create_auth_response(&state, &user, &role.name).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(valid_email("ana@igreja.org"));
        assert!(!valid_email("ana"));
        assert!(!valid_email("@igreja.org"));
        assert!(!valid_email("ana@localhost"));
    }
}
