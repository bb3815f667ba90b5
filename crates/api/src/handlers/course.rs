//! Handlers for the `/courses` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use koinonia_core::error::CoreError;
use koinonia_core::types::{DbId, Date};
use koinonia_core::validation::require_non_empty;
use koinonia_db::models::course::{Course, CreateCourse, UpdateCourse};
use koinonia_db::repositories::CourseRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::tenant::{Tenant, TenantLeader};
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::not_found("Course", id))
}

fn check_dates(start: Option<Date>, end: Option<Date>) -> AppResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(AppError::Core(CoreError::Validation(
                "end_date must not be before start_date".into(),
            )));
        }
    }
    Ok(())
}

/// GET /api/v1/courses
pub async fn list(
    tenant: Tenant,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Course>>>> {
    let courses = CourseRepo::list_by_church(&state.pool, tenant.church_id).await?;
    Ok(Json(DataResponse { data: courses }))
}

/// GET /api/v1/courses/{id}
pub async fn get_by_id(
    tenant: Tenant,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Course>>> {
    let course = CourseRepo::find_in_church(&state.pool, id, tenant.church_id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: course }))
}

/// POST /api/v1/courses
pub async fn create(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Json(input): Json<CreateCourse>,
) -> AppResult<(StatusCode, Json<DataResponse<Course>>)> {
    input.validate()?;
    require_non_empty("name", &input.name)?;
    check_dates(input.start_date, input.end_date)?;
    let course = CourseRepo::create(&state.pool, tenant.church_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: course })))
}

/// PUT /api/v1/courses/{id}
pub async fn update(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCourse>,
) -> AppResult<Json<DataResponse<Course>>> {
    if let Some(name) = &input.name {
        require_non_empty("name", name)?;
    }
    let existing = CourseRepo::find_in_church(&state.pool, id, tenant.church_id)
        .await?
        .ok_or_else(|| not_found(id))?;
    check_dates(
        input.start_date.or(existing.start_date),
        input.end_date.or(existing.end_date),
    )?;

    let course = CourseRepo::update(&state.pool, id, tenant.church_id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: course }))
}

/// DELETE /api/v1/courses/{id}
pub async fn delete(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if CourseRepo::delete(&state.pool, id, tenant.church_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
