//! Handlers for church members: listings, profiles, avatars and roles.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use koinonia_core::error::CoreError;
use koinonia_core::event_names::MEMBER_ROLE_CHANGED;
use koinonia_core::roles::{can_assign, ROLE_ADMIN, ROLE_LEADER};
use koinonia_core::storage::{avatar_key, validate_avatar};
use koinonia_core::suggestion::SkillLevel;
use koinonia_core::types::DbId;
use koinonia_core::validation::{require_non_empty, validate_times};
use koinonia_db::models::profile::{CreateProfile, Member, Profile, UpdateProfile};
use koinonia_db::models::role::Role;
use koinonia_db::models::user::{UpdateUser, User};
use koinonia_db::repositories::{ProfileRepo, RoleRepo, SessionRepo, UserRepo};
use koinonia_events::PlatformEvent;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::tenant::{Tenant, TenantAdmin};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

fn member_not_found(user_id: DbId) -> AppError {
    AppError::Core(CoreError::not_found("Member", user_id))
}

async fn user_in_church(state: &AppState, user_id: DbId, church_id: DbId) -> AppResult<User> {
    UserRepo::find_in_church(&state.pool, user_id, church_id)
        .await?
        .ok_or_else(|| member_not_found(user_id))
}

/// Profile edits are allowed on yourself, or on anyone when leader or above.
fn ensure_can_edit(tenant: &Tenant, user_id: DbId) -> AppResult<()> {
    if user_id == tenant.user_id() {
        return Ok(());
    }
    tenant.require(ROLE_LEADER)
}

/// Store skill levels in their canonical spelling.
fn normalize_skill(skill: &mut Option<String>) -> AppResult<()> {
    if let Some(value) = skill.as_deref() {
        *skill = Some(SkillLevel::from_str_value(value.trim())?.as_str().to_string());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// GET /api/v1/members
pub async fn list(
    tenant: Tenant,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Member>>>> {
    let members = ProfileRepo::list_members(&state.pool, tenant.church_id).await?;
    Ok(Json(DataResponse { data: members }))
}

/// GET /api/v1/members/{user_id}
pub async fn get_by_id(
    tenant: Tenant,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Member>>> {
    let member = ProfileRepo::find_member(&state.pool, user_id, tenant.church_id)
        .await?
        .ok_or_else(|| member_not_found(user_id))?;
    Ok(Json(DataResponse { data: member }))
}

/// GET /api/v1/roles
pub async fn list_roles(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Role>>>> {
    let roles = RoleRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: roles }))
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// GET /api/v1/members/{user_id}/profile
pub async fn get_profile(
    tenant: Tenant,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Profile>>> {
    let profile = ProfileRepo::find_by_user(&state.pool, user_id, tenant.church_id)
        .await?
        .ok_or(CoreError::not_found("Profile", user_id))?;
    Ok(Json(DataResponse { data: profile }))
}

/// POST /api/v1/members/{user_id}/profile
///
/// Create the profile of a user that has none yet.
pub async fn create_profile(
    tenant: Tenant,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Json(mut input): Json<CreateProfile>,
) -> AppResult<(StatusCode, Json<DataResponse<Profile>>)> {
    ensure_can_edit(&tenant, user_id)?;
    input.validate()?;
    require_non_empty("full_name", &input.full_name)?;
    validate_times("preferred_times", &input.preferred_times)?;
    normalize_skill(&mut input.skill_level)?;
    user_in_church(&state, user_id, tenant.church_id).await?;

    let profile = ProfileRepo::create(&state.pool, user_id, tenant.church_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: profile })))
}

/// PUT /api/v1/members/{user_id}/profile
pub async fn update_profile(
    tenant: Tenant,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Json(mut input): Json<UpdateProfile>,
) -> AppResult<Json<DataResponse<Profile>>> {
    ensure_can_edit(&tenant, user_id)?;
    if let Some(name) = &input.full_name {
        require_non_empty("full_name", name)?;
    }
    if let Some(times) = &input.preferred_times {
        validate_times("preferred_times", times)?;
    }
    normalize_skill(&mut input.skill_level)?;

    let profile = ProfileRepo::update(&state.pool, user_id, tenant.church_id, &input)
        .await?
        .ok_or(CoreError::not_found("Profile", user_id))?;
    Ok(Json(DataResponse { data: profile }))
}

/// POST /api/v1/members/{user_id}/avatar
///
/// Multipart upload with a single `file` field. The previous picture is
/// removed from storage once the profile points at the new one.
pub async fn upload_avatar(
    tenant: Tenant,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<Profile>>> {
    ensure_can_edit(&tenant, user_id)?;

    let existing = ProfileRepo::find_by_user(&state.pool, user_id, tenant.church_id)
        .await?
        .ok_or(CoreError::not_found("Profile", user_id))?;

    let mut upload: Option<(String, Option<String>, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        upload = Some((file_name, content_type, bytes.to_vec()));
    }

    let (file_name, content_type, bytes) =
        upload.ok_or_else(|| AppError::BadRequest("Missing 'file' field".into()))?;
    let ext = validate_avatar(&file_name, content_type.as_deref(), bytes.len())?;

    let key = avatar_key(tenant.church_id, user_id, Utc::now().timestamp(), ext);
    state.avatar_store.put(&key, &bytes).await?;

    let url = state.avatar_store.url_for(&key);
    let profile = ProfileRepo::set_avatar_url(&state.pool, user_id, tenant.church_id, &url)
        .await?
        .ok_or(CoreError::not_found("Profile", user_id))?;

    if let Some(old_key) = existing
        .avatar_url
        .as_deref()
        .and_then(|old| state.avatar_store.key_for(old))
    {
        if old_key != key {
            if let Err(e) = state.avatar_store.delete(&old_key).await {
                tracing::warn!(key = %old_key, error = %e, "Failed to delete old avatar");
            }
        }
    }

    tracing::info!(user_id, church_id = tenant.church_id, key = %key, "Avatar uploaded");
    Ok(Json(DataResponse { data: profile }))
}

// ---------------------------------------------------------------------------
// Administration
// ---------------------------------------------------------------------------

/// PUT /api/v1/members/{user_id}/role
pub async fn change_role(
    TenantAdmin(tenant): TenantAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Json(input): Json<ChangeRoleRequest>,
) -> AppResult<Json<DataResponse<Member>>> {
    if user_id == tenant.user_id() {
        return Err(AppError::Core(CoreError::Validation(
            "You can not change your own role".into(),
        )));
    }
    user_in_church(&state, user_id, tenant.church_id).await?;

    let current = UserRepo::role_name(&state.pool, user_id)
        .await?
        .unwrap_or_default();
    if !can_assign(&tenant.user.role, &input.role) || !can_assign(&tenant.user.role, &current) {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Role '{}' can not be assigned by '{}'",
            input.role, tenant.user.role
        ))));
    }

    let role = RoleRepo::find_by_name(&state.pool, &input.role)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(format!("Unknown role '{}'", input.role)))
        })?;

    let update = UpdateUser {
        role_id: Some(role.id),
        ..Default::default()
    };
    UserRepo::update(&state.pool, user_id, &update)
        .await?
        .ok_or_else(|| member_not_found(user_id))?;

    // Tokens carry the role; force a fresh sign-in.
    SessionRepo::revoke_all_for_user(&state.pool, user_id).await?;

    state.event_bus.publish(
        PlatformEvent::new(MEMBER_ROLE_CHANGED)
            .with_church(tenant.church_id)
            .with_source("user", user_id)
            .with_actor(tenant.user_id())
            .with_payload(json!({ "from": current, "to": role.name })),
    );

    let member = ProfileRepo::find_member(&state.pool, user_id, tenant.church_id)
        .await?
        .ok_or_else(|| member_not_found(user_id))?;
    Ok(Json(DataResponse { data: member }))
}

/// POST /api/v1/members/{user_id}/activate
pub async fn activate(
    TenantAdmin(tenant): TenantAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Member>>> {
    set_active(&state, &tenant, user_id, true).await
}

/// POST /api/v1/members/{user_id}/deactivate
///
/// Deactivated members can not sign in; their sessions are revoked.
pub async fn deactivate(
    TenantAdmin(tenant): TenantAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Member>>> {
    if user_id == tenant.user_id() {
        return Err(AppError::Core(CoreError::Validation(
            "You can not deactivate yourself".into(),
        )));
    }
    set_active(&state, &tenant, user_id, false).await
}

async fn set_active(
    state: &AppState,
    tenant: &Tenant,
    user_id: DbId,
    is_active: bool,
) -> AppResult<Json<DataResponse<Member>>> {
    user_in_church(state, user_id, tenant.church_id).await?;

    let current = UserRepo::role_name(&state.pool, user_id)
        .await?
        .unwrap_or_default();
    if current == ROLE_ADMIN && !tenant.user.is_master() && !is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only master users can deactivate administrators".into(),
        )));
    }

    let update = UpdateUser {
        is_active: Some(is_active),
        ..Default::default()
    };
    UserRepo::update(&state.pool, user_id, &update)
        .await?
        .ok_or_else(|| member_not_found(user_id))?;
    if !is_active {
        SessionRepo::revoke_all_for_user(&state.pool, user_id).await?;
    }
    tracing::info!(user_id, church_id = tenant.church_id, is_active, "Member status changed");

    let member = ProfileRepo::find_member(&state.pool, user_id, tenant.church_id)
        .await?
        .ok_or_else(|| member_not_found(user_id))?;
    Ok(Json(DataResponse { data: member }))
}
