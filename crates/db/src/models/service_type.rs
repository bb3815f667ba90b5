//! Service type models (e.g. Sunday morning worship).

use koinonia_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `service_types` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ServiceType {
    pub id: DbId,
    pub church_id: DbId,
    pub name: String,
    pub description: Option<String>,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: Option<i16>,
    /// `HH:MM`.
    pub default_time: Option<String>,
    pub color: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateServiceType {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub description: Option<String>,
    pub day_of_week: Option<i16>,
    pub default_time: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateServiceType {
    pub name: Option<String>,
    pub description: Option<String>,
    pub day_of_week: Option<i16>,
    pub default_time: Option<String>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
}
