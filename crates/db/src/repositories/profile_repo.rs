//! Repository for the `profiles` table and the member listing.

use koinonia_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::profile::{CreateProfile, Member, Profile, UpdateProfile};

const COLUMNS: &str = "id, user_id, church_id, full_name, phone, birth_date, avatar_url, \
                       functions, skill_level, preferred_times, notes, created_at, updated_at";

const MEMBER_SELECT: &str = "\
    SELECT u.id AS user_id, u.username, u.email, r.name AS role, u.is_active, \
           p.full_name, p.phone, p.avatar_url, p.functions, p.skill_level, \
           p.preferred_times, u.created_at \
    FROM users u \
    JOIN roles r ON r.id = u.role_id \
    LEFT JOIN profiles p ON p.user_id = u.id";

pub struct ProfileRepo;

impl ProfileRepo {
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        church_id: DbId,
        input: &CreateProfile,
    ) -> Result<Profile, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let profile = Self::create_inner(&mut tx, user_id, church_id, input).await?;
        tx.commit().await?;
        Ok(profile)
    }

    /// Insert a profile within an existing transaction.
    pub(crate) async fn create_inner(
        tx: &mut Transaction<'_, Postgres>,
        user_id: DbId,
        church_id: DbId,
        input: &CreateProfile,
    ) -> Result<Profile, sqlx::Error> {
        let query = format!(
            "INSERT INTO profiles
                (user_id, church_id, full_name, phone, birth_date, functions, skill_level,
                 preferred_times, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Profile>(&query)
            .bind(user_id)
            .bind(church_id)
            .bind(&input.full_name)
            .bind(&input.phone)
            .bind(input.birth_date)
            .bind(&input.functions)
            .bind(&input.skill_level)
            .bind(&input.preferred_times)
            .bind(&input.notes)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
        church_id: DbId,
    ) -> Result<Option<Profile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM profiles WHERE user_id = $1 AND church_id = $2");
        sqlx::query_as::<_, Profile>(&query)
            .bind(user_id)
            .bind(church_id)
            .fetch_optional(pool)
            .await
    }

    /// Update a profile. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        church_id: DbId,
        input: &UpdateProfile,
    ) -> Result<Option<Profile>, sqlx::Error> {
        let query = format!(
            "UPDATE profiles SET
                full_name = COALESCE($3, full_name),
                phone = COALESCE($4, phone),
                birth_date = COALESCE($5, birth_date),
                functions = COALESCE($6, functions),
                skill_level = COALESCE($7, skill_level),
                preferred_times = COALESCE($8, preferred_times),
                notes = COALESCE($9, notes)
             WHERE user_id = $1 AND church_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Profile>(&query)
            .bind(user_id)
            .bind(church_id)
            .bind(&input.full_name)
            .bind(&input.phone)
            .bind(input.birth_date)
            .bind(&input.functions)
            .bind(&input.skill_level)
            .bind(&input.preferred_times)
            .bind(&input.notes)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_avatar_url(
        pool: &PgPool,
        user_id: DbId,
        church_id: DbId,
        avatar_url: &str,
    ) -> Result<Option<Profile>, sqlx::Error> {
        let query = format!(
            "UPDATE profiles SET avatar_url = $3
             WHERE user_id = $1 AND church_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Profile>(&query)
            .bind(user_id)
            .bind(church_id)
            .bind(avatar_url)
            .fetch_optional(pool)
            .await
    }

    /// Every user of a church with their profile (if any), by name.
    pub async fn list_members(pool: &PgPool, church_id: DbId) -> Result<Vec<Member>, sqlx::Error> {
        let query = format!(
            "{MEMBER_SELECT} WHERE u.church_id = $1 ORDER BY COALESCE(p.full_name, u.username)"
        );
        sqlx::query_as::<_, Member>(&query)
            .bind(church_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_member(
        pool: &PgPool,
        user_id: DbId,
        church_id: DbId,
    ) -> Result<Option<Member>, sqlx::Error> {
        let query = format!("{MEMBER_SELECT} WHERE u.id = $1 AND u.church_id = $2");
        sqlx::query_as::<_, Member>(&query)
            .bind(user_id)
            .bind(church_id)
            .fetch_optional(pool)
            .await
    }

    /// Display name for a user: profile name, falling back to the username.
    pub async fn display_name(pool: &PgPool, user_id: DbId) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COALESCE(p.full_name, u.username)
             FROM users u LEFT JOIN profiles p ON p.user_id = u.id
             WHERE u.id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}
