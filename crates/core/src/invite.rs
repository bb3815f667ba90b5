//! Church invitations.
//!
//! An invite carries a random token that is shown once; only its SHA-256
//! hash is stored. State is derived from timestamps rather than stored.

use rand::Rng;
use serde::Serialize;

use crate::error::CoreError;
use crate::hashing::secret_digest;
use crate::types::Timestamp;

/// Days an invite stays valid when no expiry is given.
pub const DEFAULT_EXPIRY_DAYS: i64 = 7;

/// Upper bound for a custom expiry.
pub const MAX_EXPIRY_DAYS: i64 = 30;

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteState {
    Pending,
    Accepted,
    Expired,
    Revoked,
}

/// Derive the state of an invite at `now`. Acceptance wins over revocation
/// and expiry because it is irreversible.
pub fn invite_state(
    accepted_at: Option<Timestamp>,
    revoked_at: Option<Timestamp>,
    expires_at: Timestamp,
    now: Timestamp,
) -> InviteState {
    if accepted_at.is_some() {
        InviteState::Accepted
    } else if revoked_at.is_some() {
        InviteState::Revoked
    } else if now >= expires_at {
        InviteState::Expired
    } else {
        InviteState::Pending
    }
}

/// Ensure an invite can still be accepted.
pub fn ensure_acceptable(state: InviteState) -> Result<(), CoreError> {
    match state {
        InviteState::Pending => Ok(()),
        InviteState::Accepted => Err(CoreError::Conflict("Invite was already used".into())),
        InviteState::Expired => Err(CoreError::Conflict("Invite has expired".into())),
        InviteState::Revoked => Err(CoreError::Conflict("Invite was revoked".into())),
    }
}

/// Clamp a requested expiry to `1..=MAX_EXPIRY_DAYS`, defaulting to
/// [`DEFAULT_EXPIRY_DAYS`].
pub fn expiry_days(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_EXPIRY_DAYS)
        .clamp(1, MAX_EXPIRY_DAYS)
}

/// Generate a token. Returns `(plaintext, sha256_hex)`.
pub fn generate_token() -> (String, String) {
    let bytes: [u8; TOKEN_BYTES] = rand::rng().random();
    let plaintext: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    let hash = hash_token(&plaintext);
    (plaintext, hash)
}

pub fn hash_token(token: &str) -> String {
    secret_digest(token)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn state_derivation() {
        let now = Utc::now();
        let later = now + Duration::days(1);
        assert_eq!(invite_state(None, None, later, now), InviteState::Pending);
        assert_eq!(invite_state(None, None, now, now), InviteState::Expired);
        assert_eq!(invite_state(None, Some(now), later, now), InviteState::Revoked);
        assert_eq!(
            invite_state(Some(now), Some(now), now, now),
            InviteState::Accepted
        );
    }

    #[test]
    fn only_pending_invites_are_acceptable() {
        assert!(ensure_acceptable(InviteState::Pending).is_ok());
        assert!(ensure_acceptable(InviteState::Expired).is_err());
        assert!(ensure_acceptable(InviteState::Revoked).is_err());
        assert!(ensure_acceptable(InviteState::Accepted).is_err());
    }

    #[test]
    fn expiry_is_clamped() {
        assert_eq!(expiry_days(None), 7);
        assert_eq!(expiry_days(Some(0)), 1);
        assert_eq!(expiry_days(Some(90)), 30);
    }

    #[test]
    fn tokens_hash_consistently() {
        let (plain, hash) = generate_token();
        assert_eq!(plain.len(), TOKEN_BYTES * 2);
        assert_eq!(hash, hash_token(&plain));
        assert_eq!(hash.len(), 64);
        let (other, _) = generate_token();
        assert_ne!(plain, other);
    }
}
