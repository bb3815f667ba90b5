//! Repository for the `songs` table.

use koinonia_core::types::DbId;
use sqlx::PgPool;

use crate::models::song::{CreateSong, Song, SongFilter, UpdateSong};

const COLUMNS: &str = "id, church_id, title, artist, song_key, bpm, tags, lyrics_url, \
                       chords_url, video_url, notes, is_active, created_at, updated_at";

pub struct SongRepo;

impl SongRepo {
    pub async fn create(
        pool: &PgPool,
        church_id: DbId,
        input: &CreateSong,
    ) -> Result<Song, sqlx::Error> {
        let query = format!(
            "INSERT INTO songs
                (church_id, title, artist, song_key, bpm, tags, lyrics_url, chords_url,
                 video_url, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Song>(&query)
            .bind(church_id)
            .bind(&input.title)
            .bind(&input.artist)
            .bind(&input.song_key)
            .bind(input.bpm)
            .bind(&input.tags)
            .bind(&input.lyrics_url)
            .bind(&input.chords_url)
            .bind(&input.video_url)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    pub async fn find_in_church(
        pool: &PgPool,
        id: DbId,
        church_id: DbId,
    ) -> Result<Option<Song>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM songs WHERE id = $1 AND church_id = $2");
        sqlx::query_as::<_, Song>(&query)
            .bind(id)
            .bind(church_id)
            .fetch_optional(pool)
            .await
    }

    /// Songs of a church by title, optionally filtered by text and tag.
    pub async fn list_by_church(
        pool: &PgPool,
        church_id: DbId,
        filter: &SongFilter,
    ) -> Result<Vec<Song>, sqlx::Error> {
        let pattern = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));
        let query = format!(
            "SELECT {COLUMNS} FROM songs
             WHERE church_id = $1
               AND ($2::TEXT IS NULL OR title ILIKE $2 OR artist ILIKE $2)
               AND ($3::TEXT IS NULL OR $3 = ANY(tags))
               AND ($4 OR is_active)
             ORDER BY title"
        );
        sqlx::query_as::<_, Song>(&query)
            .bind(church_id)
            .bind(pattern)
            .bind(&filter.tag)
            .bind(filter.include_inactive)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        church_id: DbId,
        input: &UpdateSong,
    ) -> Result<Option<Song>, sqlx::Error> {
        let query = format!(
            "UPDATE songs SET
                title = COALESCE($3, title),
                artist = COALESCE($4, artist),
                song_key = COALESCE($5, song_key),
                bpm = COALESCE($6, bpm),
                tags = COALESCE($7, tags),
                lyrics_url = COALESCE($8, lyrics_url),
                chords_url = COALESCE($9, chords_url),
                video_url = COALESCE($10, video_url),
                notes = COALESCE($11, notes),
                is_active = COALESCE($12, is_active)
             WHERE id = $1 AND church_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Song>(&query)
            .bind(id)
            .bind(church_id)
            .bind(&input.title)
            .bind(&input.artist)
            .bind(&input.song_key)
            .bind(input.bpm)
            .bind(&input.tags)
            .bind(&input.lyrics_url)
            .bind(&input.chords_url)
            .bind(&input.video_url)
            .bind(&input.notes)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId, church_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM songs WHERE id = $1 AND church_id = $2")
            .bind(id)
            .bind(church_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
