//! Department models and DTOs.

use koinonia_core::department::Hierarchical;
use koinonia_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `departments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Department {
    pub id: DbId,
    pub church_id: DbId,
    pub parent_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub leader_user_id: Option<DbId>,
    pub is_active: bool,
    pub member_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Hierarchical for Department {
    fn id(&self) -> DbId {
        self.id
    }

    fn parent_id(&self) -> Option<DbId> {
        self.parent_id
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDepartment {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub parent_id: Option<DbId>,
    pub leader_user_id: Option<DbId>,
}

/// DTO for updating a department.
///
/// `parent_id` and `leader_user_id` accept an explicit `null` to detach.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateDepartment {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub parent_id: Option<Option<DbId>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub leader_user_id: Option<Option<DbId>>,
    pub is_active: Option<bool>,
}
