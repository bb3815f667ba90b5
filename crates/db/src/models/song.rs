//! Song repertoire models.

use koinonia_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `songs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Song {
    pub id: DbId,
    pub church_id: DbId,
    pub title: String,
    pub artist: Option<String>,
    pub song_key: Option<String>,
    pub bpm: Option<i32>,
    pub tags: Vec<String>,
    pub lyrics_url: Option<String>,
    pub chords_url: Option<String>,
    pub video_url: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSong {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub artist: Option<String>,
    pub song_key: Option<String>,
    #[validate(range(min = 1, max = 400))]
    pub bpm: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[validate(url)]
    pub lyrics_url: Option<String>,
    #[validate(url)]
    pub chords_url: Option<String>,
    #[validate(url)]
    pub video_url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSong {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub song_key: Option<String>,
    pub bpm: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub lyrics_url: Option<String>,
    pub chords_url: Option<String>,
    pub video_url: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

/// Filters for the song list.
#[derive(Debug, Default, Deserialize)]
pub struct SongFilter {
    /// Case-insensitive match on title or artist.
    pub search: Option<String>,
    pub tag: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}
