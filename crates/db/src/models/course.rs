//! Course models.

use koinonia_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `courses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Course {
    pub id: DbId,
    pub church_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub instructor: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub max_students: Option<i32>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourse {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub instructor: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    #[validate(range(min = 1))]
    pub max_students: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCourse {
    pub name: Option<String>,
    pub description: Option<String>,
    pub instructor: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub max_students: Option<i32>,
    pub is_active: Option<bool>,
}
