//! Repositories for `scales` and the rows attached to a scale.
//!
//! Child repositories take a `scale_id` the caller has already resolved
//! within its church. Their writes re-check the scale's status in the same
//! statement, so a scale completed in the meantime is never changed; a
//! `None`, `false` or zero count then means either the row is missing or the
//! scale no longer accepts changes.

use koinonia_core::types::{Date, DbId};
use sqlx::PgPool;

use crate::models::scale::{
    AgendaItem, CreateAgendaItem, CreateScale, CreateScaleMember, CreateScaleSong, Scale,
    ScaleFilter, ScaleMember, ScaleSong, UpdateAgendaItem, UpdateScale,
};

/// Guard for writes to rows attached to scale `$1`.
const SCALE_EDITABLE: &str =
    "EXISTS (SELECT 1 FROM scales WHERE id = $1 AND status <> 'completed')";

const COLUMNS: &str = "id, church_id, department_id, service_type_id, title, scale_date, \
                       scale_time, status, notes, created_by, published_at, created_at, updated_at";

pub struct ScaleRepo;

impl ScaleRepo {
    pub async fn create(
        pool: &PgPool,
        church_id: DbId,
        created_by: DbId,
        input: &CreateScale,
    ) -> Result<Scale, sqlx::Error> {
        let query = format!(
            "INSERT INTO scales
                (church_id, department_id, service_type_id, title, scale_date, scale_time,
                 notes, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Scale>(&query)
            .bind(church_id)
            .bind(input.department_id)
            .bind(input.service_type_id)
            .bind(&input.title)
            .bind(input.scale_date)
            .bind(&input.scale_time)
            .bind(&input.notes)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_in_church(
        pool: &PgPool,
        id: DbId,
        church_id: DbId,
    ) -> Result<Option<Scale>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scales WHERE id = $1 AND church_id = $2");
        sqlx::query_as::<_, Scale>(&query)
            .bind(id)
            .bind(church_id)
            .fetch_optional(pool)
            .await
    }

    /// Scales of a church by date and time, with optional filters.
    pub async fn list_by_church(
        pool: &PgPool,
        church_id: DbId,
        filter: &ScaleFilter,
    ) -> Result<Vec<Scale>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scales
             WHERE church_id = $1
               AND ($2::BIGINT IS NULL OR department_id = $2)
               AND ($3::TEXT IS NULL OR status = $3)
               AND ($4::DATE IS NULL OR scale_date >= $4)
               AND ($5::DATE IS NULL OR scale_date <= $5)
             ORDER BY scale_date, scale_time, id"
        );
        sqlx::query_as::<_, Scale>(&query)
            .bind(church_id)
            .bind(filter.department_id)
            .bind(&filter.status)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_all(pool)
            .await
    }

    /// Published scales a user is assigned to, from `from` onwards.
    pub async fn list_for_member(
        pool: &PgPool,
        user_id: DbId,
        church_id: DbId,
        from: Date,
    ) -> Result<Vec<Scale>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scales
             WHERE church_id = $2
               AND status = 'published'
               AND scale_date >= $3
               AND id IN (SELECT scale_id FROM scale_members WHERE user_id = $1)
             ORDER BY scale_date, scale_time"
        );
        sqlx::query_as::<_, Scale>(&query)
            .bind(user_id)
            .bind(church_id)
            .bind(from)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        church_id: DbId,
        input: &UpdateScale,
    ) -> Result<Option<Scale>, sqlx::Error> {
        let query = format!(
            "UPDATE scales SET
                service_type_id = CASE WHEN $3 THEN $4 ELSE service_type_id END,
                title = COALESCE($5, title),
                scale_date = COALESCE($6, scale_date),
                scale_time = COALESCE($7, scale_time),
                notes = COALESCE($8, notes)
             WHERE id = $1 AND church_id = $2 AND status <> 'completed'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Scale>(&query)
            .bind(id)
            .bind(church_id)
            .bind(input.service_type_id.is_some())
            .bind(input.service_type_id.flatten())
            .bind(&input.title)
            .bind(input.scale_date)
            .bind(&input.scale_time)
            .bind(&input.notes)
            .fetch_optional(pool)
            .await
    }

    /// Move a scale from `expected` to `status`. `published_at` is stamped on
    /// publish and cleared when the scale goes back to draft.
    ///
    /// Returns `None` when the scale is missing or no longer in `expected`.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        church_id: DbId,
        expected: &str,
        status: &str,
    ) -> Result<Option<Scale>, sqlx::Error> {
        let query = format!(
            "UPDATE scales SET
                status = $3,
                published_at = CASE
                    WHEN $3 = 'published' THEN NOW()
                    WHEN $3 = 'draft' THEN NULL
                    ELSE published_at
                END,
                reminder_sent_at = CASE WHEN $3 = 'draft' THEN NULL ELSE reminder_sent_at END
             WHERE id = $1 AND church_id = $2 AND status = $4
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Scale>(&query)
            .bind(id)
            .bind(church_id)
            .bind(status)
            .bind(expected)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId, church_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM scales WHERE id = $1 AND church_id = $2 AND status <> 'completed'",
        )
        .bind(id)
            .bind(church_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Published scales on `date`, across every church, that have not had a
    /// reminder sent yet.
    pub async fn due_for_reminder(pool: &PgPool, date: Date) -> Result<Vec<Scale>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scales
             WHERE scale_date = $1 AND status = 'published' AND reminder_sent_at IS NULL
             ORDER BY scale_time, id"
        );
        sqlx::query_as::<_, Scale>(&query)
            .bind(date)
            .fetch_all(pool)
            .await
    }

    /// Stamp the reminder time. Returns `false` if it was already stamped.
    pub async fn mark_reminded(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE scales SET reminder_sent_at = NOW()
             WHERE id = $1 AND reminder_sent_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

const MEMBER_SELECT: &str = "\
    SELECT sm.id, sm.scale_id, sm.user_id, COALESCE(p.full_name, u.username) AS member_name, \
           sm.function_name, sm.confirmation, sm.responded_at, sm.created_at \
    FROM scale_members sm \
    JOIN users u ON u.id = sm.user_id \
    LEFT JOIN profiles p ON p.user_id = sm.user_id";

pub struct ScaleMemberRepo;

impl ScaleMemberRepo {
    /// Assign a member. Returns the new row's id; a duplicate assignment
    /// trips `uq_scale_members_scale_user_function`.
    pub async fn add(
        pool: &PgPool,
        scale_id: DbId,
        input: &CreateScaleMember,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let query = format!(
            "INSERT INTO scale_members (scale_id, user_id, function_name)
             SELECT $1, $2, $3
             WHERE {SCALE_EDITABLE}
             RETURNING id"
        );
        sqlx::query_scalar(&query)
            .bind(scale_id)
            .bind(input.user_id)
            .bind(&input.function_name)
            .fetch_optional(pool)
            .await
    }

    pub async fn find(
        pool: &PgPool,
        scale_id: DbId,
        id: DbId,
    ) -> Result<Option<ScaleMember>, sqlx::Error> {
        let query = format!("{MEMBER_SELECT} WHERE sm.scale_id = $1 AND sm.id = $2");
        sqlx::query_as::<_, ScaleMember>(&query)
            .bind(scale_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_scale(
        pool: &PgPool,
        scale_id: DbId,
    ) -> Result<Vec<ScaleMember>, sqlx::Error> {
        let query = format!("{MEMBER_SELECT} WHERE sm.scale_id = $1 ORDER BY sm.function_name, sm.id");
        sqlx::query_as::<_, ScaleMember>(&query)
            .bind(scale_id)
            .fetch_all(pool)
            .await
    }

    /// Record a member's answer on all of their assignments for a scale.
    /// Returns the number of assignments updated, zero unless the scale is
    /// published.
    pub async fn respond(
        pool: &PgPool,
        scale_id: DbId,
        user_id: DbId,
        confirmation: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE scale_members SET confirmation = $3, responded_at = NOW()
             WHERE scale_id = $1 AND user_id = $2
               AND EXISTS (SELECT 1 FROM scales WHERE id = $1 AND status = 'published')",
        )
        .bind(scale_id)
        .bind(user_id)
        .bind(confirmation)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Put every answer on a scale back to pending, after it was edited.
    pub async fn reset_confirmations(pool: &PgPool, scale_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE scale_members SET confirmation = 'pending', responded_at = NULL
             WHERE scale_id = $1 AND confirmation <> 'pending'",
        )
        .bind(scale_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn remove(pool: &PgPool, scale_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let query = format!(
            "DELETE FROM scale_members WHERE scale_id = $1 AND id = $2 AND {SCALE_EDITABLE}"
        );
        let result = sqlx::query(&query)
            .bind(scale_id)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

const SONG_SELECT: &str = "\
    SELECT ss.id, ss.scale_id, ss.song_id, s.title, s.artist, ss.position, \
           COALESCE(ss.song_key, s.song_key) AS song_key \
    FROM scale_songs ss \
    JOIN songs s ON s.id = ss.song_id";

pub struct ScaleSongRepo;

impl ScaleSongRepo {
    /// Append a song. Without an explicit position it goes to the end.
    pub async fn add(
        pool: &PgPool,
        scale_id: DbId,
        input: &CreateScaleSong,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let query = format!(
            "INSERT INTO scale_songs (scale_id, song_id, position, song_key)
             SELECT $1, $2,
                    COALESCE($3, (SELECT COALESCE(MAX(position) + 1, 0)
                                  FROM scale_songs WHERE scale_id = $1)),
                    $4
             WHERE {SCALE_EDITABLE}
             RETURNING id"
        );
        sqlx::query_scalar(&query)
            .bind(scale_id)
            .bind(input.song_id)
            .bind(input.position)
            .bind(&input.song_key)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_scale(
        pool: &PgPool,
        scale_id: DbId,
    ) -> Result<Vec<ScaleSong>, sqlx::Error> {
        let query = format!("{SONG_SELECT} WHERE ss.scale_id = $1 ORDER BY ss.position, ss.id");
        sqlx::query_as::<_, ScaleSong>(&query)
            .bind(scale_id)
            .fetch_all(pool)
            .await
    }

    pub async fn remove(pool: &PgPool, scale_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let query = format!(
            "DELETE FROM scale_songs WHERE scale_id = $1 AND id = $2 AND {SCALE_EDITABLE}"
        );
        let result = sqlx::query(&query)
            .bind(scale_id)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

const AGENDA_COLUMNS: &str = "id, scale_id, position, title, duration_minutes, responsible";

pub struct AgendaItemRepo;

impl AgendaItemRepo {
    /// Append an agenda item. Without an explicit position it goes to the end.
    pub async fn add(
        pool: &PgPool,
        scale_id: DbId,
        input: &CreateAgendaItem,
    ) -> Result<Option<AgendaItem>, sqlx::Error> {
        let query = format!(
            "INSERT INTO scale_agenda_items (scale_id, position, title, duration_minutes, responsible)
             SELECT $1,
                    COALESCE($2, (SELECT COALESCE(MAX(position) + 1, 0)
                                  FROM scale_agenda_items WHERE scale_id = $1)),
                    $3, $4, $5
             WHERE {SCALE_EDITABLE}
             RETURNING {AGENDA_COLUMNS}"
        );
        sqlx::query_as::<_, AgendaItem>(&query)
            .bind(scale_id)
            .bind(input.position)
            .bind(&input.title)
            .bind(input.duration_minutes)
            .bind(&input.responsible)
            .fetch_optional(pool)
            .await
    }

    pub async fn find(
        pool: &PgPool,
        scale_id: DbId,
        id: DbId,
    ) -> Result<Option<AgendaItem>, sqlx::Error> {
        let query = format!(
            "SELECT {AGENDA_COLUMNS} FROM scale_agenda_items WHERE scale_id = $1 AND id = $2"
        );
        sqlx::query_as::<_, AgendaItem>(&query)
            .bind(scale_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_scale(
        pool: &PgPool,
        scale_id: DbId,
    ) -> Result<Vec<AgendaItem>, sqlx::Error> {
        let query = format!(
            "SELECT {AGENDA_COLUMNS} FROM scale_agenda_items
             WHERE scale_id = $1
             ORDER BY position, id"
        );
        sqlx::query_as::<_, AgendaItem>(&query)
            .bind(scale_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        scale_id: DbId,
        id: DbId,
        input: &UpdateAgendaItem,
    ) -> Result<Option<AgendaItem>, sqlx::Error> {
        let query = format!(
            "UPDATE scale_agenda_items SET
                title = COALESCE($3, title),
                duration_minutes = COALESCE($4, duration_minutes),
                position = COALESCE($5, position),
                responsible = COALESCE($6, responsible)
             WHERE scale_id = $1 AND id = $2 AND {SCALE_EDITABLE}
             RETURNING {AGENDA_COLUMNS}"
        );
        sqlx::query_as::<_, AgendaItem>(&query)
            .bind(scale_id)
            .bind(id)
            .bind(&input.title)
            .bind(input.duration_minutes)
            .bind(input.position)
            .bind(&input.responsible)
            .fetch_optional(pool)
            .await
    }

    pub async fn remove(pool: &PgPool, scale_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let query = format!(
            "DELETE FROM scale_agenda_items WHERE scale_id = $1 AND id = $2 AND {SCALE_EDITABLE}"
        );
        let result = sqlx::query(&query)
            .bind(scale_id)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
