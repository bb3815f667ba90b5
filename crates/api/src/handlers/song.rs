//! Handlers for the `/songs` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use koinonia_core::error::CoreError;
use koinonia_core::types::DbId;
use koinonia_core::validation::require_non_empty;
use koinonia_db::models::song::{CreateSong, Song, SongFilter, UpdateSong};
use koinonia_db::repositories::SongRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::tenant::{Tenant, TenantLeader};
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::not_found("Song", id))
}

/// GET /api/v1/songs?search=&tag=&include_inactive=
pub async fn list(
    tenant: Tenant,
    State(state): State<AppState>,
    Query(filter): Query<SongFilter>,
) -> AppResult<Json<DataResponse<Vec<Song>>>> {
    let songs = SongRepo::list_by_church(&state.pool, tenant.church_id, &filter).await?;
    Ok(Json(DataResponse { data: songs }))
}

/// GET /api/v1/songs/{id}
pub async fn get_by_id(
    tenant: Tenant,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Song>>> {
    let song = SongRepo::find_in_church(&state.pool, id, tenant.church_id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: song }))
}

/// POST /api/v1/songs
pub async fn create(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Json(input): Json<CreateSong>,
) -> AppResult<(StatusCode, Json<DataResponse<Song>>)> {
    input.validate()?;
    require_non_empty("title", &input.title)?;
    let song = SongRepo::create(&state.pool, tenant.church_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: song })))
}

/// PUT /api/v1/songs/{id}
pub async fn update(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateSong>,
) -> AppResult<Json<DataResponse<Song>>> {
    if let Some(title) = &input.title {
        require_non_empty("title", title)?;
    }
    if let Some(bpm) = input.bpm {
        if !(1..=400).contains(&bpm) {
            return Err(AppError::Core(CoreError::Validation(
                "bpm must be between 1 and 400".into(),
            )));
        }
    }
    let song = SongRepo::update(&state.pool, id, tenant.church_id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: song }))
}

/// DELETE /api/v1/songs/{id}
pub async fn delete(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if SongRepo::delete(&state.pool, id, tenant.church_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
