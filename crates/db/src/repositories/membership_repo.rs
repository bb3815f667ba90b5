//! Repository for the `user_departments` table.

use koinonia_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::membership::{CreateMembership, DepartmentMember, UserDepartment};

const COLUMNS: &str = "id, user_id, department_id, is_leader, joined_at";

pub struct MembershipRepo;

impl MembershipRepo {
    /// Add a user to a department. A duplicate trips
    /// `uq_user_departments_user_department`.
    pub async fn add(
        pool: &PgPool,
        department_id: DbId,
        input: &CreateMembership,
    ) -> Result<UserDepartment, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let membership = Self::add_inner(&mut tx, department_id, input).await?;
        tx.commit().await?;
        Ok(membership)
    }

    /// Add a membership within an existing transaction.
    pub(crate) async fn add_inner(
        tx: &mut Transaction<'_, Postgres>,
        department_id: DbId,
        input: &CreateMembership,
    ) -> Result<UserDepartment, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_departments (user_id, department_id, is_leader)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserDepartment>(&query)
            .bind(input.user_id)
            .bind(department_id)
            .bind(input.is_leader)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn list_for_department(
        pool: &PgPool,
        department_id: DbId,
    ) -> Result<Vec<DepartmentMember>, sqlx::Error> {
        sqlx::query_as::<_, DepartmentMember>(
            "SELECT ud.id, ud.user_id, ud.department_id, u.username, p.full_name,
                    p.avatar_url, ud.is_leader, ud.joined_at
             FROM user_departments ud
             JOIN users u ON u.id = ud.user_id
             LEFT JOIN profiles p ON p.user_id = ud.user_id
             WHERE ud.department_id = $1
             ORDER BY ud.is_leader DESC, COALESCE(p.full_name, u.username)",
        )
        .bind(department_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<UserDepartment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_departments WHERE user_id = $1 ORDER BY joined_at"
        );
        sqlx::query_as::<_, UserDepartment>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn is_member(
        pool: &PgPool,
        department_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM user_departments WHERE department_id = $1 AND user_id = $2
             )",
        )
        .bind(department_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Remove a user from a department. Returns `true` if a row was removed.
    pub async fn remove(
        pool: &PgPool,
        department_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM user_departments WHERE department_id = $1 AND user_id = $2")
                .bind(department_id)
                .bind(user_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
