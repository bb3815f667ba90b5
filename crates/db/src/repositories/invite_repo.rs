//! Repository for the `invites` table.

use koinonia_core::types::DbId;
use sqlx::PgPool;

use crate::models::invite::{CreateInvite, Invite};
use crate::models::membership::CreateMembership;
use crate::models::profile::CreateProfile;
use crate::models::user::{CreateUser, User};
use crate::repositories::{MembershipRepo, ProfileRepo, UserRepo};

const COLUMNS: &str = "id, church_id, email, role_id, department_id, token_hash, invited_by, \
                       expires_at, accepted_at, revoked_at, created_at";

pub struct InviteRepo;

impl InviteRepo {
    pub async fn create(pool: &PgPool, input: &CreateInvite) -> Result<Invite, sqlx::Error> {
        let query = format!(
            "INSERT INTO invites
                (church_id, email, role_id, department_id, token_hash, invited_by, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Invite>(&query)
            .bind(input.church_id)
            .bind(&input.email)
            .bind(input.role_id)
            .bind(input.department_id)
            .bind(&input.token_hash)
            .bind(input.invited_by)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Invites of a church, newest first.
    pub async fn list_by_church(pool: &PgPool, church_id: DbId) -> Result<Vec<Invite>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM invites WHERE church_id = $1 ORDER BY created_at DESC");
        sqlx::query_as::<_, Invite>(&query)
            .bind(church_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_token_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<Invite>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM invites WHERE token_hash = $1");
        sqlx::query_as::<_, Invite>(&query)
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    /// Revoke a pending invite. Returns `None` when it does not exist in the
    /// church or is no longer pending.
    pub async fn revoke(
        pool: &PgPool,
        id: DbId,
        church_id: DbId,
    ) -> Result<Option<Invite>, sqlx::Error> {
        let query = format!(
            "UPDATE invites SET revoked_at = NOW()
             WHERE id = $1 AND church_id = $2
               AND accepted_at IS NULL AND revoked_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Invite>(&query)
            .bind(id)
            .bind(church_id)
            .fetch_optional(pool)
            .await
    }

    /// Accept an invite: claim it, create the user and its profile, and join
    /// the invite's department if it names one, all in one transaction.
    ///
    /// Returns `None` when the invite was already accepted, revoked or
    /// expired. Any failure leaves the invite pending.
    pub async fn accept(
        pool: &PgPool,
        invite: &Invite,
        user: &CreateUser,
        profile: &CreateProfile,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let claimed = sqlx::query(
            "UPDATE invites SET accepted_at = NOW()
             WHERE id = $1 AND accepted_at IS NULL AND revoked_at IS NULL AND expires_at > NOW()",
        )
        .bind(invite.id)
        .execute(&mut *tx)
        .await?;
        if claimed.rows_affected() == 0 {
            return Ok(None);
        }

        let created = UserRepo::create_inner(&mut tx, user).await?;
        ProfileRepo::create_inner(&mut tx, created.id, invite.church_id, profile).await?;
        if let Some(department_id) = invite.department_id {
            let membership = CreateMembership {
                user_id: created.id,
                is_leader: false,
            };
            MembershipRepo::add_inner(&mut tx, department_id, &membership).await?;
        }

        tx.commit().await?;
        Ok(Some(created))
    }
}
