//! Repository for the `service_types` table.

use koinonia_core::types::DbId;
use sqlx::PgPool;

use crate::models::service_type::{CreateServiceType, ServiceType, UpdateServiceType};

const COLUMNS: &str = "id, church_id, name, description, day_of_week, default_time, color, \
                       is_active, created_at, updated_at";

pub struct ServiceTypeRepo;

impl ServiceTypeRepo {
    pub async fn create(
        pool: &PgPool,
        church_id: DbId,
        input: &CreateServiceType,
    ) -> Result<ServiceType, sqlx::Error> {
        let query = format!(
            "INSERT INTO service_types (church_id, name, description, day_of_week, default_time, color)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ServiceType>(&query)
            .bind(church_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.day_of_week)
            .bind(&input.default_time)
            .bind(&input.color)
            .fetch_one(pool)
            .await
    }

    pub async fn find_in_church(
        pool: &PgPool,
        id: DbId,
        church_id: DbId,
    ) -> Result<Option<ServiceType>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM service_types WHERE id = $1 AND church_id = $2");
        sqlx::query_as::<_, ServiceType>(&query)
            .bind(id)
            .bind(church_id)
            .fetch_optional(pool)
            .await
    }

    /// Service types of a church in weekday order, undated ones last.
    pub async fn list_by_church(
        pool: &PgPool,
        church_id: DbId,
    ) -> Result<Vec<ServiceType>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM service_types
             WHERE church_id = $1
             ORDER BY day_of_week NULLS LAST, default_time NULLS LAST, name"
        );
        sqlx::query_as::<_, ServiceType>(&query)
            .bind(church_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        church_id: DbId,
        input: &UpdateServiceType,
    ) -> Result<Option<ServiceType>, sqlx::Error> {
        let query = format!(
            "UPDATE service_types SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                day_of_week = COALESCE($5, day_of_week),
                default_time = COALESCE($6, default_time),
                color = COALESCE($7, color),
                is_active = COALESCE($8, is_active)
             WHERE id = $1 AND church_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ServiceType>(&query)
            .bind(id)
            .bind(church_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.day_of_week)
            .bind(&input.default_time)
            .bind(&input.color)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId, church_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM service_types WHERE id = $1 AND church_id = $2")
            .bind(id)
            .bind(church_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
