//! Aggregates scale history into candidate statistics.

use koinonia_core::types::{Date, DbId};
use sqlx::PgPool;

use crate::models::candidate::CandidateStats;

pub struct CandidateRepo;

impl CandidateRepo {
    /// Active members of a church (optionally only those of one department)
    /// with their participation history up to `reference`.
    ///
    /// Only published or completed scales count as participation; answers
    /// count on any scale.
    pub async fn list_stats(
        pool: &PgPool,
        church_id: DbId,
        department_id: Option<DbId>,
        reference: Date,
    ) -> Result<Vec<CandidateStats>, sqlx::Error> {
        sqlx::query_as::<_, CandidateStats>(
            "SELECT u.id AS user_id,
                    COALESCE(p.full_name, u.username) AS full_name,
                    COALESCE(p.functions, '{}') AS functions,
                    p.skill_level,
                    COALESCE(p.preferred_times, '{}') AS preferred_times,
                    COUNT(sm.id) FILTER (WHERE sm.confirmation = 'confirmed') AS confirmed_count,
                    COUNT(sm.id) FILTER (WHERE sm.confirmation = 'declined') AS declined_count,
                    COUNT(sm.id) FILTER (
                        WHERE s.status IN ('published', 'completed') AND s.scale_date <= $3
                    ) AS total_scales,
                    MAX(s.scale_date) FILTER (
                        WHERE s.status IN ('published', 'completed') AND s.scale_date <= $3
                    ) AS last_participation
             FROM users u
             LEFT JOIN profiles p ON p.user_id = u.id
             LEFT JOIN scale_members sm ON sm.user_id = u.id
             LEFT JOIN scales s ON s.id = sm.scale_id
             WHERE u.church_id = $1
               AND u.is_active = true
               AND ($2::BIGINT IS NULL OR EXISTS (
                    SELECT 1 FROM user_departments ud
                    WHERE ud.user_id = u.id AND ud.department_id = $2
               ))
             GROUP BY u.id, u.username, p.full_name, p.functions, p.skill_level, p.preferred_times
             ORDER BY u.id",
        )
        .bind(church_id)
        .bind(department_id)
        .bind(reference)
        .fetch_all(pool)
        .await
    }
}
