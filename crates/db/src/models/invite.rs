//! Invite models.

use koinonia_core::invite::{invite_state, InviteState};
use koinonia_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `invites` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Invite {
    pub id: DbId,
    pub church_id: DbId,
    pub email: String,
    pub role_id: DbId,
    pub department_id: Option<DbId>,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub invited_by: Option<DbId>,
    pub expires_at: Timestamp,
    pub accepted_at: Option<Timestamp>,
    pub revoked_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Invite {
    pub fn state(&self, now: Timestamp) -> InviteState {
        invite_state(self.accepted_at, self.revoked_at, self.expires_at, now)
    }
}

/// Invite with its derived state, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct InviteResponse {
    #[serde(flatten)]
    pub invite: Invite,
    pub state: InviteState,
}

impl InviteResponse {
    pub fn new(invite: Invite, now: Timestamp) -> Self {
        let state = invite.state(now);
        Self { invite, state }
    }
}

#[derive(Debug)]
pub struct CreateInvite {
    pub church_id: DbId,
    pub email: String,
    pub role_id: DbId,
    pub department_id: Option<DbId>,
    pub token_hash: String,
    pub invited_by: Option<DbId>,
    pub expires_at: Timestamp,
}
