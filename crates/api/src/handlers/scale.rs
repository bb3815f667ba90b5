//! Handlers for the `/scales` resource: service rosters with their assigned
//! members, songs and agenda.
//!
//! A scale moves `draft -> published -> completed` (and may go back from
//! published to draft). Completed scales are read-only.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use koinonia_core::error::CoreError;
use koinonia_core::event_names::{
    SCALE_COMPLETED, SCALE_CREATED, SCALE_DELETED, SCALE_MEMBER_CONFIRMED,
    SCALE_MEMBER_DECLINED, SCALE_PUBLISHED, SCALE_UPDATED,
};
use koinonia_core::scale::{
    agenda_total_minutes, ensure_editable, validate_agenda_item, validate_response,
    validate_transition, Confirmation, ScaleStatus, STATUS_PUBLISHED,
};
use koinonia_core::types::DbId;
use koinonia_core::validation::{require_non_empty, validate_time};
use koinonia_db::models::scale::{
    AgendaItem, CreateAgendaItem, CreateScale, CreateScaleMember, CreateScaleSong, Scale,
    ScaleDetail, ScaleFilter, ScaleMember, ScaleSong, UpdateAgendaItem, UpdateScale,
};
use koinonia_db::repositories::{
    AgendaItemRepo, DepartmentRepo, ProfileRepo, ScaleMemberRepo, ScaleRepo, ScaleSongRepo,
    ServiceTypeRepo, SongRepo, UserRepo,
};
use koinonia_events::PlatformEvent;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::tenant::{Tenant, TenantLeader};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// Body of `POST /scales/{id}/respond`: `confirmed` or `declined`.
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub confirmation: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(id: DbId) -> CoreError {
    CoreError::not_found("Scale", id)
}

async fn load(state: &AppState, id: DbId, church_id: DbId) -> AppResult<Scale> {
    let scale = ScaleRepo::find_in_church(&state.pool, id, church_id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(scale)
}

/// Load a scale that may still be changed.
async fn load_editable(state: &AppState, id: DbId, church_id: DbId) -> AppResult<Scale> {
    let scale = load(state, id, church_id).await?;
    ensure_editable(&scale.status)?;
    Ok(scale)
}

/// Explain a guarded write on scale `id` that touched nothing: the scale is
/// gone, it stopped accepting changes, or the row itself is `missing`.
async fn explain_miss(state: &AppState, id: DbId, church_id: DbId, missing: CoreError) -> AppError {
    match load_editable(state, id, church_id).await {
        Ok(_) => AppError::Core(missing),
        Err(err) => err,
    }
}

/// Payload shared by every scale event. Dates use the `dd/mm/yyyy` form
/// shown in notifications.
pub(crate) fn scale_payload(scale: &Scale) -> serde_json::Value {
    json!({
        "scale_id": scale.id,
        "title": scale.title,
        "department_id": scale.department_id,
        "scale_date": scale.scale_date.format("%d/%m/%Y").to_string(),
        "scale_time": scale.scale_time,
        "status": scale.status,
    })
}

fn scale_event(event_type: &str, scale: &Scale, actor: DbId) -> PlatformEvent {
    PlatformEvent::new(event_type)
        .with_church(scale.church_id)
        .with_source("scale", scale.id)
        .with_actor(actor)
        .with_payload(scale_payload(scale))
}

async fn detail(state: &AppState, scale: Scale) -> AppResult<ScaleDetail> {
    let members = ScaleMemberRepo::list_for_scale(&state.pool, scale.id).await?;
    let songs = ScaleSongRepo::list_for_scale(&state.pool, scale.id).await?;
    let agenda = AgendaItemRepo::list_for_scale(&state.pool, scale.id).await?;
    let durations: Vec<i32> = agenda.iter().map(|item| item.duration_minutes).collect();
    Ok(ScaleDetail {
        scale,
        members,
        songs,
        agenda_total_minutes: agenda_total_minutes(&durations),
        agenda,
    })
}

async fn ensure_service_type(
    state: &AppState,
    service_type_id: Option<DbId>,
    church_id: DbId,
) -> AppResult<()> {
    if let Some(id) = service_type_id {
        ServiceTypeRepo::find_in_church(&state.pool, id, church_id)
            .await?
            .ok_or(CoreError::not_found("ServiceType", id))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Scales
// ---------------------------------------------------------------------------

/// GET /api/v1/scales?department_id=&status=&from=&to=
pub async fn list(
    tenant: Tenant,
    State(state): State<AppState>,
    Query(filter): Query<ScaleFilter>,
) -> AppResult<Json<DataResponse<Vec<Scale>>>> {
    if let Some(status) = &filter.status {
        ScaleStatus::from_str_value(status)?;
    }
    let scales = ScaleRepo::list_by_church(&state.pool, tenant.church_id, &filter).await?;
    Ok(Json(DataResponse { data: scales }))
}

/// GET /api/v1/scales/mine
///
/// Upcoming published scales the caller is assigned to.
pub async fn list_mine(
    tenant: Tenant,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Scale>>>> {
    let today = Utc::now().date_naive();
    let scales =
        ScaleRepo::list_for_member(&state.pool, tenant.user_id(), tenant.church_id, today).await?;
    Ok(Json(DataResponse { data: scales }))
}

/// GET /api/v1/scales/{id}
pub async fn get_by_id(
    tenant: Tenant,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ScaleDetail>>> {
    let scale = load(&state, id, tenant.church_id).await?;
    Ok(Json(DataResponse {
        data: detail(&state, scale).await?,
    }))
}

/// POST /api/v1/scales
///
/// New scales start as drafts.
pub async fn create(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Json(input): Json<CreateScale>,
) -> AppResult<(StatusCode, Json<DataResponse<Scale>>)> {
    input.validate()?;
    require_non_empty("title", &input.title)?;
    validate_time("scale_time", &input.scale_time)?;

    DepartmentRepo::find_in_church(&state.pool, input.department_id, tenant.church_id)
        .await?
        .ok_or(CoreError::not_found("Department", input.department_id))?;
    ensure_service_type(&state, input.service_type_id, tenant.church_id).await?;

    let scale = ScaleRepo::create(&state.pool, tenant.church_id, tenant.user_id(), &input).await?;

    state
        .event_bus
        .publish(scale_event(SCALE_CREATED, &scale, tenant.user_id()));
    tracing::info!(scale_id = scale.id, church_id = tenant.church_id, "Scale created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: scale })))
}

/// PUT /api/v1/scales/{id}
///
/// Moving a published scale to another date or time puts every answer back
/// to pending.
pub async fn update(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateScale>,
) -> AppResult<Json<DataResponse<Scale>>> {
    let existing = load_editable(&state, id, tenant.church_id).await?;

    if let Some(title) = &input.title {
        require_non_empty("title", title)?;
    }
    if let Some(time) = &input.scale_time {
        validate_time("scale_time", time)?;
    }
    if let Some(service_type_id) = input.service_type_id {
        ensure_service_type(&state, service_type_id, tenant.church_id).await?;
    }

    let Some(scale) = ScaleRepo::update(&state.pool, id, tenant.church_id, &input).await? else {
        return Err(explain_miss(&state, id, tenant.church_id, not_found(id)).await);
    };

    let rescheduled =
        scale.scale_date != existing.scale_date || scale.scale_time != existing.scale_time;
    if rescheduled && scale.status == STATUS_PUBLISHED {
        let reset = ScaleMemberRepo::reset_confirmations(&state.pool, id).await?;
        tracing::info!(scale_id = id, reset, "Scale rescheduled, answers reset");
    }

    state
        .event_bus
        .publish(scale_event(SCALE_UPDATED, &scale, tenant.user_id()));

    Ok(Json(DataResponse { data: scale }))
}

/// DELETE /api/v1/scales/{id}
pub async fn delete(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let scale = load_editable(&state, id, tenant.church_id).await?;
    if !ScaleRepo::delete(&state.pool, id, tenant.church_id).await? {
        return Err(explain_miss(&state, id, tenant.church_id, not_found(id)).await);
    }

    state
        .event_bus
        .publish(scale_event(SCALE_DELETED, &scale, tenant.user_id()));
    tracing::info!(scale_id = id, church_id = tenant.church_id, "Scale deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/scales/{id}/status
///
/// Publishing notifies the assigned members. Going back to draft clears
/// their answers. The write only lands if the scale is still in the status
/// the transition was checked against; otherwise the caller gets a conflict.
pub async fn change_status(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<StatusRequest>,
) -> AppResult<Json<DataResponse<Scale>>> {
    let existing = load(&state, id, tenant.church_id).await?;
    let target = validate_transition(&existing.status, &input.status)?;

    let updated = ScaleRepo::set_status(
        &state.pool,
        id,
        tenant.church_id,
        &existing.status,
        target.as_str(),
    )
    .await?;
    let Some(scale) = updated else {
        let current = load(&state, id, tenant.church_id).await?;
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Scale status changed to '{}' while it was being updated",
            current.status
        ))));
    };

    let event_type = match target {
        ScaleStatus::Published => SCALE_PUBLISHED,
        ScaleStatus::Completed => SCALE_COMPLETED,
        ScaleStatus::Draft => {
            ScaleMemberRepo::reset_confirmations(&state.pool, id).await?;
            SCALE_UPDATED
        }
    };
    state
        .event_bus
        .publish(scale_event(event_type, &scale, tenant.user_id()));
    tracing::info!(
        scale_id = id,
        from = %existing.status,
        to = %scale.status,
        "Scale status changed"
    );

    Ok(Json(DataResponse { data: scale }))
}

/// POST /api/v1/scales/{id}/respond
///
/// The caller confirms or declines all of their assignments on the scale.
pub async fn respond(
    tenant: Tenant,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RespondRequest>,
) -> AppResult<Json<DataResponse<Vec<ScaleMember>>>> {
    let scale = load(&state, id, tenant.church_id).await?;
    let answer = validate_response(&scale.status, &input.confirmation)?;

    let updated =
        ScaleMemberRepo::respond(&state.pool, id, tenant.user_id(), answer.as_str()).await?;
    if updated == 0 {
        // The scale may have left `published` since it was loaded.
        let current = load(&state, id, tenant.church_id).await?;
        validate_response(&current.status, &input.confirmation)?;
        return Err(AppError::Core(CoreError::Forbidden(
            "You are not assigned to this scale".into(),
        )));
    }

    let member_name = ProfileRepo::display_name(&state.pool, tenant.user_id())
        .await?
        .unwrap_or_default();
    let event_type = match answer {
        Confirmation::Declined => SCALE_MEMBER_DECLINED,
        _ => SCALE_MEMBER_CONFIRMED,
    };
    let mut payload = scale_payload(&scale);
    payload["member_name"] = json!(member_name);
    state.event_bus.publish(
        PlatformEvent::new(event_type)
            .with_church(scale.church_id)
            .with_source("scale", scale.id)
            .with_actor(tenant.user_id())
            .with_payload(payload),
    );

    let members = ScaleMemberRepo::list_for_scale(&state.pool, id).await?;
    Ok(Json(DataResponse { data: members }))
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

/// POST /api/v1/scales/{id}/members
///
/// The same person may hold several functions on one scale.
pub async fn add_member(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateScaleMember>,
) -> AppResult<(StatusCode, Json<DataResponse<ScaleMember>>)> {
    input.validate()?;
    require_non_empty("function_name", &input.function_name)?;
    load_editable(&state, id, tenant.church_id).await?;
    UserRepo::find_in_church(&state.pool, input.user_id, tenant.church_id)
        .await?
        .ok_or(CoreError::not_found("User", input.user_id))?;

    let Some(member_id) = ScaleMemberRepo::add(&state.pool, id, &input).await? else {
        return Err(explain_miss(&state, id, tenant.church_id, not_found(id)).await);
    };
    let member = ScaleMemberRepo::find(&state.pool, id, member_id)
        .await?
        .ok_or(CoreError::not_found("ScaleMember", member_id))?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: member })))
}

/// DELETE /api/v1/scales/{id}/members/{member_id}
pub async fn remove_member(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Path((id, member_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    load_editable(&state, id, tenant.church_id).await?;
    if ScaleMemberRepo::remove(&state.pool, id, member_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        let missing = CoreError::not_found("ScaleMember", member_id);
        Err(explain_miss(&state, id, tenant.church_id, missing).await)
    }
}

// ---------------------------------------------------------------------------
// Songs
// ---------------------------------------------------------------------------

/// POST /api/v1/scales/{id}/songs
pub async fn add_song(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateScaleSong>,
) -> AppResult<(StatusCode, Json<DataResponse<ScaleSong>>)> {
    load_editable(&state, id, tenant.church_id).await?;
    SongRepo::find_in_church(&state.pool, input.song_id, tenant.church_id)
        .await?
        .ok_or(CoreError::not_found("Song", input.song_id))?;

    let Some(entry_id) = ScaleSongRepo::add(&state.pool, id, &input).await? else {
        return Err(explain_miss(&state, id, tenant.church_id, not_found(id)).await);
    };
    let song = ScaleSongRepo::list_for_scale(&state.pool, id)
        .await?
        .into_iter()
        .find(|s| s.id == entry_id)
        .ok_or(CoreError::not_found("ScaleSong", entry_id))?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: song })))
}

/// DELETE /api/v1/scales/{id}/songs/{entry_id}
pub async fn remove_song(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Path((id, entry_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    load_editable(&state, id, tenant.church_id).await?;
    if ScaleSongRepo::remove(&state.pool, id, entry_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        let missing = CoreError::not_found("ScaleSong", entry_id);
        Err(explain_miss(&state, id, tenant.church_id, missing).await)
    }
}

// ---------------------------------------------------------------------------
// Agenda
// ---------------------------------------------------------------------------

/// POST /api/v1/scales/{id}/agenda
pub async fn add_agenda_item(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CreateAgendaItem>,
) -> AppResult<(StatusCode, Json<DataResponse<AgendaItem>>)> {
    validate_agenda_item(&input.title, input.duration_minutes)?;
    load_editable(&state, id, tenant.church_id).await?;
    let Some(item) = AgendaItemRepo::add(&state.pool, id, &input).await? else {
        return Err(explain_miss(&state, id, tenant.church_id, not_found(id)).await);
    };
    Ok((StatusCode::CREATED, Json(DataResponse { data: item })))
}

/// PUT /api/v1/scales/{id}/agenda/{item_id}
pub async fn update_agenda_item(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Path((id, item_id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateAgendaItem>,
) -> AppResult<Json<DataResponse<AgendaItem>>> {
    load_editable(&state, id, tenant.church_id).await?;
    let existing = AgendaItemRepo::find(&state.pool, id, item_id)
        .await?
        .ok_or(CoreError::not_found("AgendaItem", item_id))?;
    validate_agenda_item(
        input.title.as_deref().unwrap_or(&existing.title),
        input.duration_minutes.unwrap_or(existing.duration_minutes),
    )?;

    let Some(item) = AgendaItemRepo::update(&state.pool, id, item_id, &input).await? else {
        let missing = CoreError::not_found("AgendaItem", item_id);
        return Err(explain_miss(&state, id, tenant.church_id, missing).await);
    };
    Ok(Json(DataResponse { data: item }))
}

/// DELETE /api/v1/scales/{id}/agenda/{item_id}
pub async fn remove_agenda_item(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Path((id, item_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    load_editable(&state, id, tenant.church_id).await?;
    if AgendaItemRepo::remove(&state.pool, id, item_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        let missing = CoreError::not_found("AgendaItem", item_id);
        Err(explain_miss(&state, id, tenant.church_id, missing).await)
    }
}
