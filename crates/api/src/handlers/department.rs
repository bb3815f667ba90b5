//! Handlers for the `/departments` resource and its memberships.
//!
//! Every write publishes a `department.*` event; the realtime relay turns
//! those into list reloads for connected clients.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use koinonia_core::department::{nest, validate_parent, DepartmentNode, ParentInfo};
use koinonia_core::error::CoreError;
use koinonia_core::event_names::{
    DEPARTMENT_CREATED, DEPARTMENT_DELETED, DEPARTMENT_UPDATED, MEMBER_JOINED_DEPARTMENT,
    MEMBER_LEFT_DEPARTMENT,
};
use koinonia_core::roles::ROLE_LEADER;
use koinonia_core::types::DbId;
use koinonia_core::validation::{require_non_empty, validate_color};
use koinonia_db::models::department::{CreateDepartment, Department, UpdateDepartment};
use koinonia_db::models::membership::{CreateMembership, DepartmentMember, UserDepartment};
use koinonia_db::repositories::{DepartmentRepo, MembershipRepo, ProfileRepo, UserRepo};
use koinonia_events::PlatformEvent;
use serde_json::json;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::tenant::{Tenant, TenantLeader};
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::not_found("Department", id))
}

async fn load(state: &AppState, id: DbId, church_id: DbId) -> AppResult<Department> {
    DepartmentRepo::find_in_church(&state.pool, id, church_id)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Look up a prospective parent. Departments of other churches are reported
/// by `validate_parent`.
async fn parent_info(state: &AppState, parent_id: DbId) -> AppResult<ParentInfo> {
    let parent = DepartmentRepo::find_by_id(&state.pool, parent_id)
        .await?
        .ok_or_else(|| not_found(parent_id))?;
    Ok(ParentInfo {
        id: parent.id,
        church_id: parent.church_id,
        parent_id: parent.parent_id,
    })
}

async fn ensure_leader_in_church(
    state: &AppState,
    leader_id: Option<DbId>,
    church_id: DbId,
) -> AppResult<()> {
    if let Some(user_id) = leader_id {
        UserRepo::find_in_church(&state.pool, user_id, church_id)
            .await?
            .ok_or(CoreError::not_found("User", user_id))?;
    }
    Ok(())
}

fn department_event(event_type: &str, tenant: &Tenant, department_id: DbId) -> PlatformEvent {
    PlatformEvent::new(event_type)
        .with_church(tenant.church_id)
        .with_source("department", department_id)
        .with_actor(tenant.user_id())
}

// ---------------------------------------------------------------------------
// Departments
// ---------------------------------------------------------------------------

/// GET /api/v1/departments
pub async fn list(
    tenant: Tenant,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Department>>>> {
    let departments = DepartmentRepo::list_by_church(&state.pool, tenant.church_id).await?;
    Ok(Json(DataResponse { data: departments }))
}

/// GET /api/v1/departments/tree
///
/// Top-level departments with their sub-departments.
pub async fn tree(
    tenant: Tenant,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<DepartmentNode<Department>>>>> {
    let departments = DepartmentRepo::list_by_church(&state.pool, tenant.church_id).await?;
    Ok(Json(DataResponse {
        data: nest(&departments),
    }))
}

/// GET /api/v1/departments/{id}
pub async fn get_by_id(
    tenant: Tenant,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Department>>> {
    let department = load(&state, id, tenant.church_id).await?;
    Ok(Json(DataResponse { data: department }))
}

/// POST /api/v1/departments
pub async fn create(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Json(input): Json<CreateDepartment>,
) -> AppResult<(StatusCode, Json<DataResponse<Department>>)> {
    input.validate()?;
    require_non_empty("name", &input.name)?;
    if let Some(color) = &input.color {
        validate_color(color)?;
    }

    let parent = match input.parent_id {
        Some(parent_id) => Some(parent_info(&state, parent_id).await?),
        None => None,
    };
    validate_parent(tenant.church_id, None, false, parent)?;
    ensure_leader_in_church(&state, input.leader_user_id, tenant.church_id).await?;

    let department = DepartmentRepo::create(&state.pool, tenant.church_id, &input).await?;

    state.event_bus.publish(
        department_event(DEPARTMENT_CREATED, &tenant, department.id)
            .with_payload(json!({ "name": department.name })),
    );
    tracing::info!(
        department_id = department.id,
        church_id = tenant.church_id,
        "Department created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: department })))
}

/// PUT /api/v1/departments/{id}
pub async fn update(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateDepartment>,
) -> AppResult<Json<DataResponse<Department>>> {
    load(&state, id, tenant.church_id).await?;

    if let Some(name) = &input.name {
        require_non_empty("name", name)?;
    }
    if let Some(color) = &input.color {
        validate_color(color)?;
    }
    if let Some(Some(parent_id)) = input.parent_id {
        let parent = parent_info(&state, parent_id).await?;
        let has_children = DepartmentRepo::has_children(&state.pool, id).await?;
        validate_parent(tenant.church_id, Some(id), has_children, Some(parent))?;
    }
    if let Some(leader) = input.leader_user_id {
        ensure_leader_in_church(&state, leader, tenant.church_id).await?;
    }

    let department = DepartmentRepo::update(&state.pool, id, tenant.church_id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;

    state
        .event_bus
        .publish(department_event(DEPARTMENT_UPDATED, &tenant, id));

    Ok(Json(DataResponse { data: department }))
}

/// DELETE /api/v1/departments/{id}
///
/// Sub-departments and memberships go with it.
pub async fn delete(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = DepartmentRepo::delete(&state.pool, id, tenant.church_id).await?;
    if !deleted {
        return Err(not_found(id));
    }

    state
        .event_bus
        .publish(department_event(DEPARTMENT_DELETED, &tenant, id));
    tracing::info!(department_id = id, church_id = tenant.church_id, "Department deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Memberships
// ---------------------------------------------------------------------------

/// GET /api/v1/departments/{id}/members
pub async fn list_members(
    tenant: Tenant,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<DepartmentMember>>>> {
    load(&state, id, tenant.church_id).await?;
    let members = MembershipRepo::list_for_department(&state.pool, id).await?;
    Ok(Json(DataResponse { data: members }))
}

/// POST /api/v1/departments/{id}/members
///
/// Leaders add anyone of the church; other members may only join
/// themselves, never as leader.
pub async fn add_member(
    tenant: Tenant,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateMembership>,
) -> AppResult<(StatusCode, Json<DataResponse<UserDepartment>>)> {
    let is_leader = tenant.user.has_at_least(ROLE_LEADER);
    if !is_leader && (input.user_id != tenant.user_id() || input.is_leader) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only leaders can add other members".into(),
        )));
    }

    let department = load(&state, id, tenant.church_id).await?;
    UserRepo::find_in_church(&state.pool, input.user_id, tenant.church_id)
        .await?
        .ok_or(CoreError::not_found("User", input.user_id))?;

    let membership = MembershipRepo::add(&state.pool, id, &input).await?;

    let member_name = ProfileRepo::display_name(&state.pool, input.user_id)
        .await?
        .unwrap_or_default();
    state.event_bus.publish(
        department_event(MEMBER_JOINED_DEPARTMENT, &tenant, id).with_payload(json!({
            "department_id": id,
            "department_name": department.name,
            "user_id": input.user_id,
            "member_name": member_name,
        })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: membership })))
}

/// DELETE /api/v1/departments/{id}/members/{user_id}
///
/// Leaders remove anyone; members may leave on their own.
pub async fn remove_member(
    tenant: Tenant,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    if user_id != tenant.user_id() {
        tenant.require(ROLE_LEADER)?;
    }
    load(&state, id, tenant.church_id).await?;

    let removed = MembershipRepo::remove(&state.pool, id, user_id).await?;
    if !removed {
        return Err(AppError::Core(CoreError::not_found("Membership", user_id)));
    }

    state.event_bus.publish(
        department_event(MEMBER_LEFT_DEPARTMENT, &tenant, id)
            .with_payload(json!({ "department_id": id, "user_id": user_id })),
    );

    Ok(StatusCode::NO_CONTENT)
}
