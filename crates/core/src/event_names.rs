//! Canonical event type names published on the bus.

pub const DEPARTMENT_CREATED: &str = "department.created";
pub const DEPARTMENT_UPDATED: &str = "department.updated";
pub const DEPARTMENT_DELETED: &str = "department.deleted";
pub const MEMBER_JOINED_DEPARTMENT: &str = "department.member_joined";
pub const MEMBER_LEFT_DEPARTMENT: &str = "department.member_left";

pub const SCALE_CREATED: &str = "scale.created";
pub const SCALE_PUBLISHED: &str = "scale.published";
pub const SCALE_UPDATED: &str = "scale.updated";
pub const SCALE_COMPLETED: &str = "scale.completed";
pub const SCALE_DELETED: &str = "scale.deleted";
/// Published scale happening the next day; emitted once per scale.
pub const SCALE_REMINDER_DUE: &str = "scale.reminder_due";
pub const SCALE_MEMBER_DECLINED: &str = "scale.member_declined";
pub const SCALE_MEMBER_CONFIRMED: &str = "scale.member_confirmed";

pub const INVITE_CREATED: &str = "invite.created";
pub const INVITE_ACCEPTED: &str = "invite.accepted";
pub const INVITE_REVOKED: &str = "invite.revoked";

pub const MEMBER_ROLE_CHANGED: &str = "member.role_changed";

pub const CHURCH_CREATED: &str = "church.created";
pub const CHURCH_UPDATED: &str = "church.updated";

pub const USER_LOGIN: &str = "user.login";

/// Events that change a church's department list.
pub fn is_department_change(event_type: &str) -> bool {
    event_type.starts_with("department.")
}
