//! Handlers for churches.
//!
//! The `/master/churches` endpoints are cross-tenant and require the master
//! role. `/church` works on the caller's own church.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use koinonia_core::error::CoreError;
use koinonia_core::event_names::{CHURCH_CREATED, CHURCH_UPDATED};
use koinonia_core::notification::page_bounds;
use koinonia_core::roles::ROLE_ADMIN;
use koinonia_core::types::DbId;
use koinonia_core::validation::{slugify, validate_slug};
use koinonia_db::models::church::{Church, ChurchWithStats, CreateChurch, UpdateChurch};
use koinonia_db::models::event::Event;
use koinonia_db::models::user::UserResponse;
use koinonia_db::repositories::{ChurchRepo, EventRepo, SessionRepo};
use koinonia_events::PlatformEvent;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::auth::{register_account, NewAccount};
use crate::middleware::rbac::RequireMaster;
use crate::middleware::tenant::{Tenant, TenantAdmin};
use crate::query::ActivityParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /master/churches/{id}/admin`.
#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
}

fn church_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::not_found("Church", id))
}

fn checked_slug(slug: Option<&str>, name: &str) -> AppResult<String> {
    let slug = match slug {
        Some(s) => s.trim().to_string(),
        None => slugify(name),
    };
    validate_slug(&slug)?;
    Ok(slug)
}

// ---------------------------------------------------------------------------
// Master
// ---------------------------------------------------------------------------

/// GET /api/v1/master/churches
pub async fn list(
    RequireMaster(_master): RequireMaster,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ChurchWithStats>>>> {
    let churches = ChurchRepo::list_with_stats(&state.pool).await?;
    Ok(Json(DataResponse { data: churches }))
}

/// GET /api/v1/master/churches/{id}
pub async fn get_by_id(
    RequireMaster(_master): RequireMaster,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ChurchWithStats>>> {
    let church = ChurchRepo::find_with_stats(&state.pool, id)
        .await?
        .ok_or_else(|| church_not_found(id))?;
    Ok(Json(DataResponse { data: church }))
}

/// POST /api/v1/master/churches
///
/// The slug is derived from the name when not given.
pub async fn create(
    RequireMaster(master): RequireMaster,
    State(state): State<AppState>,
    Json(input): Json<CreateChurch>,
) -> AppResult<(StatusCode, Json<DataResponse<Church>>)> {
    input.validate()?;
    let slug = checked_slug(input.slug.as_deref(), &input.name)?;

    let church = ChurchRepo::create(&state.pool, &input, &slug).await?;

    state.event_bus.publish(
        PlatformEvent::new(CHURCH_CREATED)
            .with_church(church.id)
            .with_source("church", church.id)
            .with_actor(master.user_id)
            .with_payload(json!({ "name": church.name, "slug": church.slug })),
    );
    tracing::info!(church_id = church.id, slug = %church.slug, "Church created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: church })))
}

/// PUT /api/v1/master/churches/{id}
pub async fn update(
    RequireMaster(master): RequireMaster,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateChurch>,
) -> AppResult<Json<DataResponse<Church>>> {
    let church = apply_update(&state, id, master.user_id, input).await?;
    Ok(Json(DataResponse { data: church }))
}

/// POST /api/v1/master/churches/{id}/activate
pub async fn activate(
    RequireMaster(_master): RequireMaster,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Church>>> {
    let church = ChurchRepo::set_active(&state.pool, id, true)
        .await?
        .ok_or_else(|| church_not_found(id))?;
    tracing::info!(church_id = id, "Church activated");
    Ok(Json(DataResponse { data: church }))
}

/// POST /api/v1/master/churches/{id}/deactivate
///
/// Members of a deactivated church can no longer sign in.
pub async fn deactivate(
    RequireMaster(_master): RequireMaster,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Church>>> {
    let church = ChurchRepo::set_active(&state.pool, id, false)
        .await?
        .ok_or_else(|| church_not_found(id))?;
    let revoked = SessionRepo::revoke_all_for_church(&state.pool, id).await?;
    tracing::info!(church_id = id, revoked_sessions = revoked, "Church deactivated");
    Ok(Json(DataResponse { data: church }))
}

/// POST /api/v1/master/churches/{id}/admin
///
/// Create an administrator account for the church.
pub async fn create_admin(
    RequireMaster(_master): RequireMaster,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateAdminRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    ChurchRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| church_not_found(id))?;

    let user = register_account(
        &state,
        NewAccount {
            church_id: id,
            username: &input.username,
            email: &input.email,
            password: &input.password,
            role: ROLE_ADMIN,
            full_name: &input.full_name,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from_user(&user, ROLE_ADMIN),
        }),
    ))
}

// ---------------------------------------------------------------------------
// Own church
// ---------------------------------------------------------------------------

/// GET /api/v1/church
pub async fn get_current(
    tenant: Tenant,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ChurchWithStats>>> {
    let church = ChurchRepo::find_with_stats(&state.pool, tenant.church_id)
        .await?
        .ok_or_else(|| church_not_found(tenant.church_id))?;
    Ok(Json(DataResponse { data: church }))
}

/// PUT /api/v1/church
pub async fn update_current(
    TenantAdmin(tenant): TenantAdmin,
    State(state): State<AppState>,
    Json(input): Json<UpdateChurch>,
) -> AppResult<Json<DataResponse<Church>>> {
    let church = apply_update(&state, tenant.church_id, tenant.user_id(), input).await?;
    Ok(Json(DataResponse { data: church }))
}

/// GET /api/v1/church/activity
///
/// Recent platform events of the church, newest first, optionally limited
/// to one `?category=`.
pub async fn activity(
    TenantAdmin(tenant): TenantAdmin,
    State(state): State<AppState>,
    Query(params): Query<ActivityParams>,
) -> AppResult<Json<DataResponse<Vec<Event>>>> {
    let (limit, offset) = page_bounds(params.limit, params.offset);
    let category = params
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let events =
        EventRepo::list_recent(&state.pool, tenant.church_id, category, limit, offset).await?;
    Ok(Json(DataResponse { data: events }))
}

async fn apply_update(
    state: &AppState,
    id: DbId,
    actor: DbId,
    mut input: UpdateChurch,
) -> AppResult<Church> {
    if let Some(name) = &input.name {
        if name.trim().is_empty() {
            return Err(AppError::Core(CoreError::Validation(
                "name must not be empty".into(),
            )));
        }
    }
    if let Some(slug) = input.slug.take() {
        input.slug = Some(checked_slug(Some(&slug), "")?);
    }

    let church = ChurchRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| church_not_found(id))?;

    state.event_bus.publish(
        PlatformEvent::new(CHURCH_UPDATED)
            .with_church(id)
            .with_source("church", id)
            .with_actor(actor),
    );
    Ok(church)
}
