//! Handlers for staffing suggestions.
//!
//! Candidates come either from the church's own scale history (`live`, the
//! default) or from the built-in demonstration roster (`sample`).

use axum::extract::{Query, State};
use axum::Json;
use koinonia_core::error::CoreError;
use koinonia_core::suggestion::{
    department_roles, generate_balanced_team, generate_scale_suggestions, known_departments,
    sample_roster, CandidateProfile, RoleSuggestions, ScaleRequirement, TeamAssignment,
};
use koinonia_core::types::DbId;
use koinonia_core::validation::{require_non_empty, validate_time};
use koinonia_db::repositories::{CandidateRepo, DepartmentRepo};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::tenant::TenantLeader;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    #[default]
    Live,
    Sample,
}

/// Query string of the suggestion endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SuggestionParams {
    #[serde(default)]
    pub source: CandidateSource,
    /// Limit live candidates to members of this department.
    pub department_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub source: CandidateSource,
    pub candidates_considered: usize,
    pub suggestions: Vec<RoleSuggestions>,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub source: CandidateSource,
    pub candidates_considered: usize,
    pub team: Vec<TeamAssignment>,
}

#[derive(Debug, Serialize)]
pub struct DepartmentRoles {
    pub department: &'static str,
    pub roles: &'static [&'static str],
}

async fn candidates(
    state: &AppState,
    church_id: DbId,
    params: &SuggestionParams,
    requirement: &ScaleRequirement,
) -> AppResult<Vec<CandidateProfile>> {
    require_non_empty("department", &requirement.department)?;
    validate_time("time", &requirement.time)?;

    match params.source {
        CandidateSource::Sample => Ok(sample_roster(requirement.date)),
        CandidateSource::Live => {
            if let Some(department_id) = params.department_id {
                DepartmentRepo::find_in_church(&state.pool, department_id, church_id)
                    .await?
                    .ok_or(CoreError::not_found("Department", department_id))?;
            }
            let stats = CandidateRepo::list_stats(
                &state.pool,
                church_id,
                params.department_id,
                requirement.date,
            )
            .await?;
            Ok(stats.into_iter().map(|s| s.into_profile()).collect())
        }
    }
}

/// POST /api/v1/suggestions?source=live|sample&department_id=
///
/// Top three candidates per role of the requirement.
pub async fn suggest(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Query(params): Query<SuggestionParams>,
    Json(requirement): Json<ScaleRequirement>,
) -> AppResult<Json<DataResponse<SuggestionResponse>>> {
    let pool = candidates(&state, tenant.church_id, &params, &requirement).await?;
    let suggestions = generate_scale_suggestions(&requirement, &pool);
    tracing::debug!(
        church_id = tenant.church_id,
        department = %requirement.department,
        candidates = pool.len(),
        roles = suggestions.len(),
        "Scale suggestions generated"
    );
    Ok(Json(DataResponse {
        data: SuggestionResponse {
            source: params.source,
            candidates_considered: pool.len(),
            suggestions,
        },
    }))
}

/// POST /api/v1/suggestions/team?source=live|sample&department_id=
///
/// The best candidate per role. Roles nobody can fill are left out.
pub async fn balanced_team(
    TenantLeader(tenant): TenantLeader,
    State(state): State<AppState>,
    Query(params): Query<SuggestionParams>,
    Json(requirement): Json<ScaleRequirement>,
) -> AppResult<Json<DataResponse<TeamResponse>>> {
    let pool = candidates(&state, tenant.church_id, &params, &requirement).await?;
    let team = generate_balanced_team(&requirement, &pool);
    Ok(Json(DataResponse {
        data: TeamResponse {
            source: params.source,
            candidates_considered: pool.len(),
            team,
        },
    }))
}

/// GET /api/v1/suggestions/departments
///
/// Departments with a built-in role list.
pub async fn departments(
    TenantLeader(_tenant): TenantLeader,
) -> Json<DataResponse<Vec<DepartmentRoles>>> {
    let data = known_departments()
        .into_iter()
        .map(|department| DepartmentRoles {
            department,
            roles: department_roles(department),
        })
        .collect();
    Json(DataResponse { data })
}
