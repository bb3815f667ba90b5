//! Participation statistics used to feed the staffing heuristic.

use koinonia_core::scale::confirmation_rate;
use koinonia_core::suggestion::{CandidateProfile, SkillLevel};
use koinonia_core::types::{Date, DbId};
use serde::Serialize;
use sqlx::FromRow;

/// One department member with aggregated scale history.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CandidateStats {
    pub user_id: DbId,
    pub full_name: String,
    pub functions: Vec<String>,
    pub skill_level: Option<String>,
    pub preferred_times: Vec<String>,
    pub confirmed_count: i64,
    pub declined_count: i64,
    /// Assignments on scales that were published or completed.
    pub total_scales: i64,
    pub last_participation: Option<Date>,
}

impl CandidateStats {
    /// Convert to the heuristic's input. Unparseable skill levels count as
    /// unknown.
    pub fn into_profile(self) -> CandidateProfile {
        CandidateProfile {
            member_id: self.user_id,
            name: self.full_name,
            functions: self.functions,
            skill_level: self
                .skill_level
                .as_deref()
                .and_then(|s| SkillLevel::from_str_value(s).ok()),
            preferred_times: self.preferred_times,
            confirmation_rate: confirmation_rate(self.confirmed_count, self.declined_count),
            total_scales: self.total_scales,
            last_participation: self.last_participation,
        }
    }
}
