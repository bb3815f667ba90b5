//! Repository for the `churches` table.

use koinonia_core::types::DbId;
use sqlx::PgPool;

use crate::models::church::{Church, ChurchWithStats, CreateChurch, UpdateChurch};

const COLUMNS: &str = "id, name, slug, city, state, address, phone, email, logo_url, \
                       is_active, created_at, updated_at";

/// Per-church counts appended to [`COLUMNS`] for the master overview.
const STATS: &str = "\
    (SELECT COUNT(*) FROM users u WHERE u.church_id = churches.id) AS member_count, \
    (SELECT COUNT(*) FROM departments d WHERE d.church_id = churches.id) AS department_count, \
    (SELECT COUNT(*) FROM songs s WHERE s.church_id = churches.id) AS song_count, \
    (SELECT COUNT(*) FROM scales sc WHERE sc.church_id = churches.id) AS scale_count";

pub struct ChurchRepo;

impl ChurchRepo {
    /// Insert a church with an already resolved slug.
    pub async fn create(
        pool: &PgPool,
        input: &CreateChurch,
        slug: &str,
    ) -> Result<Church, sqlx::Error> {
        let query = format!(
            "INSERT INTO churches (name, slug, city, state, address, phone, email, logo_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Church>(&query)
            .bind(&input.name)
            .bind(slug)
            .bind(&input.city)
            .bind(&input.state)
            .bind(&input.address)
            .bind(&input.phone)
            .bind(&input.email)
            .bind(&input.logo_url)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Church>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM churches WHERE id = $1");
        sqlx::query_as::<_, Church>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Every church with member/department/song/scale counts, by name.
    pub async fn list_with_stats(pool: &PgPool) -> Result<Vec<ChurchWithStats>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS}, {STATS} FROM churches ORDER BY name");
        sqlx::query_as::<_, ChurchWithStats>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn find_with_stats(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ChurchWithStats>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS}, {STATS} FROM churches WHERE id = $1");
        sqlx::query_as::<_, ChurchWithStats>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update a church. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateChurch,
    ) -> Result<Option<Church>, sqlx::Error> {
        let query = format!(
            "UPDATE churches SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                city = COALESCE($4, city),
                state = COALESCE($5, state),
                address = COALESCE($6, address),
                phone = COALESCE($7, phone),
                email = COALESCE($8, email),
                logo_url = COALESCE($9, logo_url)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Church>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.city)
            .bind(&input.state)
            .bind(&input.address)
            .bind(&input.phone)
            .bind(&input.email)
            .bind(&input.logo_url)
            .fetch_optional(pool)
            .await
    }

    /// Activate or deactivate a church.
    pub async fn set_active(
        pool: &PgPool,
        id: DbId,
        is_active: bool,
    ) -> Result<Option<Church>, sqlx::Error> {
        let query = format!("UPDATE churches SET is_active = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Church>(&query)
            .bind(id)
            .bind(is_active)
            .fetch_optional(pool)
            .await
    }
}
