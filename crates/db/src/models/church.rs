//! Church (tenant) models and DTOs.

use koinonia_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `churches` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Church {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub logo_url: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A church together with headline counts, for the master overview.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChurchWithStats {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub church: Church,
    pub member_count: i64,
    pub department_count: i64,
    pub song_count: i64,
    pub scale_count: i64,
}

/// DTO for creating a church. The slug is derived from the name when absent.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateChurch {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub slug: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub logo_url: Option<String>,
}

/// DTO for updating a church. All fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateChurch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub logo_url: Option<String>,
}
