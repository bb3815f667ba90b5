//! Member profile models.

use koinonia_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `profiles` table (1:1 with `users`).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Profile {
    pub id: DbId,
    pub user_id: DbId,
    pub church_id: DbId,
    pub full_name: String,
    pub phone: Option<String>,
    pub birth_date: Option<Date>,
    pub avatar_url: Option<String>,
    /// Functions the member performs, e.g. `Bateria`, `Vocal`.
    pub functions: Vec<String>,
    /// `iniciante`, `intermediário` or `avançado`.
    pub skill_level: Option<String>,
    /// `HH:MM` entries.
    pub preferred_times: Vec<String>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A church member as listed by the members screen: user, role and profile.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Member {
    pub user_id: DbId,
    pub username: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub functions: Option<Vec<String>>,
    pub skill_level: Option<String>,
    pub preferred_times: Option<Vec<String>>,
    pub created_at: Timestamp,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProfile {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    pub phone: Option<String>,
    pub birth_date: Option<Date>,
    #[serde(default)]
    pub functions: Vec<String>,
    pub skill_level: Option<String>,
    #[serde(default)]
    pub preferred_times: Vec<String>,
    pub notes: Option<String>,
}

/// DTO for updating a profile. All fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfile {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<Date>,
    pub functions: Option<Vec<String>>,
    pub skill_level: Option<String>,
    pub preferred_times: Option<Vec<String>>,
    pub notes: Option<String>,
}
