//! Repository for the `courses` table.

use koinonia_core::types::DbId;
use sqlx::PgPool;

use crate::models::course::{Course, CreateCourse, UpdateCourse};

const COLUMNS: &str = "id, church_id, name, description, instructor, start_date, end_date, \
                       max_students, is_active, created_at, updated_at";

pub struct CourseRepo;

impl CourseRepo {
    pub async fn create(
        pool: &PgPool,
        church_id: DbId,
        input: &CreateCourse,
    ) -> Result<Course, sqlx::Error> {
        let query = format!(
            "INSERT INTO courses
                (church_id, name, description, instructor, start_date, end_date, max_students)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Course>(&query)
            .bind(church_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.instructor)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.max_students)
            .fetch_one(pool)
            .await
    }

    pub async fn find_in_church(
        pool: &PgPool,
        id: DbId,
        church_id: DbId,
    ) -> Result<Option<Course>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM courses WHERE id = $1 AND church_id = $2");
        sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .bind(church_id)
            .fetch_optional(pool)
            .await
    }

    /// Courses of a church, upcoming first.
    pub async fn list_by_church(
        pool: &PgPool,
        church_id: DbId,
    ) -> Result<Vec<Course>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM courses
             WHERE church_id = $1
             ORDER BY start_date NULLS LAST, name"
        );
        sqlx::query_as::<_, Course>(&query)
            .bind(church_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        church_id: DbId,
        input: &UpdateCourse,
    ) -> Result<Option<Course>, sqlx::Error> {
        let query = format!(
            "UPDATE courses SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                instructor = COALESCE($5, instructor),
                start_date = COALESCE($6, start_date),
                end_date = COALESCE($7, end_date),
                max_students = COALESCE($8, max_students),
                is_active = COALESCE($9, is_active)
             WHERE id = $1 AND church_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .bind(church_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.instructor)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.max_students)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId, church_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1 AND church_id = $2")
            .bind(id)
            .bind(church_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
