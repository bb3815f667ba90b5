//! Repository for the `departments` table.

use koinonia_core::types::DbId;
use sqlx::PgPool;

use crate::models::department::{CreateDepartment, Department, UpdateDepartment};

/// Column list, including the live member count. Unaliased so it works in
/// both `SELECT ... FROM departments` and `RETURNING`.
const COLUMNS: &str = "id, church_id, parent_id, name, description, color, leader_user_id, \
    is_active, \
    (SELECT COUNT(*) FROM user_departments ud WHERE ud.department_id = departments.id) \
        AS member_count, \
    created_at, updated_at";

pub struct DepartmentRepo;

impl DepartmentRepo {
    pub async fn create(
        pool: &PgPool,
        church_id: DbId,
        input: &CreateDepartment,
    ) -> Result<Department, sqlx::Error> {
        let query = format!(
            "INSERT INTO departments (church_id, name, description, color, parent_id, leader_user_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Department>(&query)
            .bind(church_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.color)
            .bind(input.parent_id)
            .bind(input.leader_user_id)
            .fetch_one(pool)
            .await
    }

    /// Find a department by id, regardless of church. Used to validate
    /// parents before the tenant check.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Department>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM departments WHERE id = $1");
        sqlx::query_as::<_, Department>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_in_church(
        pool: &PgPool,
        id: DbId,
        church_id: DbId,
    ) -> Result<Option<Department>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM departments WHERE id = $1 AND church_id = $2");
        sqlx::query_as::<_, Department>(&query)
            .bind(id)
            .bind(church_id)
            .fetch_optional(pool)
            .await
    }

    /// Full department list of a church: top-level departments first, then
    /// by name.
    pub async fn list_by_church(
        pool: &PgPool,
        church_id: DbId,
    ) -> Result<Vec<Department>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM departments
             WHERE church_id = $1
             ORDER BY parent_id NULLS FIRST, name"
        );
        sqlx::query_as::<_, Department>(&query)
            .bind(church_id)
            .fetch_all(pool)
            .await
    }

    pub async fn has_children(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM departments WHERE parent_id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Update a department. `Some(None)` on `parent_id` / `leader_user_id`
    /// clears the column.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        church_id: DbId,
        input: &UpdateDepartment,
    ) -> Result<Option<Department>, sqlx::Error> {
        let query = format!(
            "UPDATE departments SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                color = COALESCE($5, color),
                parent_id = CASE WHEN $6 THEN $7 ELSE parent_id END,
                leader_user_id = CASE WHEN $8 THEN $9 ELSE leader_user_id END,
                is_active = COALESCE($10, is_active)
             WHERE id = $1 AND church_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Department>(&query)
            .bind(id)
            .bind(church_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.color)
            .bind(input.parent_id.is_some())
            .bind(input.parent_id.flatten())
            .bind(input.leader_user_id.is_some())
            .bind(input.leader_user_id.flatten())
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Delete a department (sub-departments cascade). Returns `true` if a
    /// row was removed.
    pub async fn delete(pool: &PgPool, id: DbId, church_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1 AND church_id = $2")
            .bind(id)
            .bind(church_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Users that lead a department: its `leader_user_id` plus memberships
    /// flagged `is_leader`.
    pub async fn leader_ids(pool: &PgPool, id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT leader_user_id FROM departments
             WHERE id = $1 AND leader_user_id IS NOT NULL
             UNION
             SELECT user_id FROM user_departments
             WHERE department_id = $1 AND is_leader = true",
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }
}
