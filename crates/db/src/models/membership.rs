//! Department membership models.

use koinonia_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `user_departments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserDepartment {
    pub id: DbId,
    pub user_id: DbId,
    pub department_id: DbId,
    pub is_leader: bool,
    pub joined_at: Timestamp,
}

/// A membership joined with the member's name, for department rosters.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DepartmentMember {
    pub id: DbId,
    pub user_id: DbId,
    pub department_id: DbId,
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_leader: bool,
    pub joined_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateMembership {
    pub user_id: DbId,
    #[serde(default)]
    pub is_leader: bool,
}
