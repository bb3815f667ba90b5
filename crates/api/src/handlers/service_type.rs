//! Handlers for the `/service-types` resource (recurring services such as
//! the Sunday morning worship).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use koinonia_core::error::CoreError;
use koinonia_core::types::DbId;
use koinonia_core::validation::{
    require_non_empty, validate_color, validate_day_of_week, validate_time,
};
use koinonia_db::models::service_type::{CreateServiceType, ServiceType, UpdateServiceType};
use koinonia_db::repositories::ServiceTypeRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::tenant::{Tenant, TenantLeader};
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::not_found("ServiceType", id))
}

fn check_schedule(
    day_of_week: Option<i16>,
    default_time: Option<&str>,
    color: Option<&str>,
) -> AppResult<()> {
    if let Some(day) = day_of_week {
        validate_day_of_week(day)?;
    }
    if let Some(time) = default_time {
        validate_time("default_time", time)?;
    }
    if let Some(color) = color {
        validate_color(color)?;
    }
    Ok(())
}

/// GET /api/v1/service-types
pub async fn list(
    tenant: Tenant,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ServiceType>>>> {
    let items = ServiceTypeRepo::list_by_church(&state.pool, tenant.church_id).await?;
    Ok(Json(DataResponse { data: items }))
}

/// GET /api/v1/service-types/{id}
pub async fn get_by_id(
    tenant: Tenant,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ServiceType>>> {
    let item = ServiceTypeRepo::find_in_church(&state.pool, id, tenant.church_id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: item }))
}

/// POST /api/v1/service-types
pub async fn create(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Json(input): Json<CreateServiceType>,
) -> AppResult<(StatusCode, Json<DataResponse<ServiceType>>)> {
    input.validate()?;
    require_non_empty("name", &input.name)?;
    check_schedule(
        input.day_of_week,
        input.default_time.as_deref(),
        input.color.as_deref(),
    )?;
    let item = ServiceTypeRepo::create(&state.pool, tenant.church_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: item })))
}

/// PUT /api/v1/service-types/{id}
pub async fn update(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateServiceType>,
) -> AppResult<Json<DataResponse<ServiceType>>> {
    if let Some(name) = &input.name {
        require_non_empty("name", name)?;
    }
    check_schedule(
        input.day_of_week,
        input.default_time.as_deref(),
        input.color.as_deref(),
    )?;
    let item = ServiceTypeRepo::update(&state.pool, id, tenant.church_id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: item }))
}

/// DELETE /api/v1/service-types/{id}
///
/// Scales of this type keep existing without one.
pub async fn delete(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if ServiceTypeRepo::delete(&state.pool, id, tenant.church_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
