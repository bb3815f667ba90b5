//! Scale (service roster) models: the scale itself, assigned members,
//! the song list and the agenda.

use koinonia_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `scales` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Scale {
    pub id: DbId,
    pub church_id: DbId,
    pub department_id: DbId,
    pub service_type_id: Option<DbId>,
    pub title: String,
    pub scale_date: Date,
    /// `HH:MM`.
    pub scale_time: String,
    /// `draft`, `published` or `completed`.
    pub status: String,
    pub notes: Option<String>,
    pub created_by: Option<DbId>,
    pub published_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateScale {
    pub department_id: DbId,
    pub service_type_id: Option<DbId>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub scale_date: Date,
    pub scale_time: String,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateScale {
    #[serde(default, deserialize_with = "super::double_option")]
    pub service_type_id: Option<Option<DbId>>,
    pub title: Option<String>,
    pub scale_date: Option<Date>,
    pub scale_time: Option<String>,
    pub notes: Option<String>,
}

/// Filters for the scale list.
#[derive(Debug, Default, Deserialize)]
pub struct ScaleFilter {
    pub department_id: Option<DbId>,
    pub status: Option<String>,
    pub from: Option<Date>,
    pub to: Option<Date>,
}

/// A row from `scale_members` joined with the member's display name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScaleMember {
    pub id: DbId,
    pub scale_id: DbId,
    pub user_id: DbId,
    pub member_name: String,
    pub function_name: String,
    /// `pending`, `confirmed` or `declined`.
    pub confirmation: String,
    pub responded_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateScaleMember {
    pub user_id: DbId,
    #[validate(length(min = 1, max = 80))]
    pub function_name: String,
}

/// A row from `scale_songs` joined with the song's title and artist.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScaleSong {
    pub id: DbId,
    pub scale_id: DbId,
    pub song_id: DbId,
    pub title: String,
    pub artist: Option<String>,
    pub position: i32,
    /// Key for this service; falls back to the song's default key.
    pub song_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateScaleSong {
    pub song_id: DbId,
    pub position: Option<i32>,
    pub song_key: Option<String>,
}

/// A row from the `scale_agenda_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AgendaItem {
    pub id: DbId,
    pub scale_id: DbId,
    pub position: i32,
    pub title: String,
    pub duration_minutes: i32,
    pub responsible: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAgendaItem {
    pub title: String,
    pub duration_minutes: i32,
    pub position: Option<i32>,
    pub responsible: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAgendaItem {
    pub title: Option<String>,
    pub duration_minutes: Option<i32>,
    pub position: Option<i32>,
    pub responsible: Option<String>,
}

/// A scale with everything attached to it, as returned by the detail view.
#[derive(Debug, Clone, Serialize)]
pub struct ScaleDetail {
    #[serde(flatten)]
    pub scale: Scale,
    pub members: Vec<ScaleMember>,
    pub songs: Vec<ScaleSong>,
    pub agenda: Vec<AgendaItem>,
    pub agenda_total_minutes: i32,
}
