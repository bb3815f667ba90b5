//! Well-known role name constants and their ranking.
//!
//! These must match the seed data in `20260301000002_create_roles.sql`.

pub const ROLE_MASTER: &str = "master";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_LEADER: &str = "leader";
pub const ROLE_MEMBER: &str = "member";

/// All valid role names, highest privilege first.
pub const VALID_ROLES: &[&str] = &[ROLE_MASTER, ROLE_ADMIN, ROLE_LEADER, ROLE_MEMBER];

/// Numeric rank of a role. Unknown roles rank below `member`.
pub fn rank(role: &str) -> u8 {
    match role {
        ROLE_MASTER => 4,
        ROLE_ADMIN => 3,
        ROLE_LEADER => 2,
        ROLE_MEMBER => 1,
        _ => 0,
    }
}

/// Whether `role` grants at least the privileges of `minimum`.
pub fn has_at_least(role: &str, minimum: &str) -> bool {
    rank(role) >= rank(minimum) && rank(role) > 0
}

/// Whether `actor` may assign `target` to another user.
///
/// Nobody hands out a role above their own, and `master` is never assigned
/// through the tenant API.
pub fn can_assign(actor: &str, target: &str) -> bool {
    VALID_ROLES.contains(&target)
        && target != ROLE_MASTER
        && has_at_least(actor, ROLE_ADMIN)
        && rank(target) <= rank(actor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranking_is_ordered() {
        assert!(has_at_least(ROLE_MASTER, ROLE_ADMIN));
        assert!(has_at_least(ROLE_ADMIN, ROLE_LEADER));
        assert!(has_at_least(ROLE_LEADER, ROLE_LEADER));
        assert!(!has_at_least(ROLE_MEMBER, ROLE_LEADER));
    }

    #[test]
    fn unknown_role_has_no_privileges() {
        assert!(!has_at_least("guest", ROLE_MEMBER));
        assert_eq!(rank("guest"), 0);
    }

    #[test]
    fn admins_assign_up_to_their_rank() {
        assert!(can_assign(ROLE_ADMIN, ROLE_LEADER));
        assert!(can_assign(ROLE_ADMIN, ROLE_ADMIN));
        assert!(!can_assign(ROLE_ADMIN, ROLE_MASTER));
        assert!(!can_assign(ROLE_LEADER, ROLE_MEMBER));
        assert!(!can_assign(ROLE_ADMIN, "owner"));
    }
}
