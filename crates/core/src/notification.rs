//! Notification kinds and their Portuguese templates.

use serde::Serialize;

pub const KIND_SCALE_PUBLISHED: &str = "scale_published";
pub const KIND_SCALE_UPDATED: &str = "scale_updated";
pub const KIND_SCALE_REMINDER: &str = "scale_reminder";
pub const KIND_SCALE_DECLINED: &str = "scale_declined";
pub const KIND_INVITE_ACCEPTED: &str = "invite_accepted";
pub const KIND_DEPARTMENT_JOINED: &str = "department_joined";

pub const VALID_KINDS: &[&str] = &[
    KIND_SCALE_PUBLISHED,
    KIND_SCALE_UPDATED,
    KIND_SCALE_REMINDER,
    KIND_SCALE_DECLINED,
    KIND_INVITE_ACCEPTED,
    KIND_DEPARTMENT_JOINED,
];

/// Default page size for notification listings.
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Rendered notification ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationContent {
    pub kind: &'static str,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

fn scale_link(scale_id: i64) -> Option<String> {
    Some(format!("/scales/{scale_id}"))
}

pub fn scale_published(
    scale_id: i64,
    scale_title: &str,
    date: &str,
    function: &str,
) -> NotificationContent {
    NotificationContent {
        kind: KIND_SCALE_PUBLISHED,
        title: "Nova escala publicada".into(),
        message: format!("Você foi escalado como {function} em \"{scale_title}\" no dia {date}."),
        link: scale_link(scale_id),
    }
}

pub fn scale_updated(scale_id: i64, scale_title: &str) -> NotificationContent {
    NotificationContent {
        kind: KIND_SCALE_UPDATED,
        title: "Escala atualizada".into(),
        message: format!("A escala \"{scale_title}\" foi alterada."),
        link: scale_link(scale_id),
    }
}

pub fn scale_reminder(
    scale_id: i64,
    scale_title: &str,
    date: &str,
    time: &str,
) -> NotificationContent {
    NotificationContent {
        kind: KIND_SCALE_REMINDER,
        title: "Lembrete de escala".into(),
        message: format!("Você está escalado em \"{scale_title}\" no dia {date} às {time}."),
        link: scale_link(scale_id),
    }
}

pub fn scale_declined(scale_id: i64, scale_title: &str, member_name: &str) -> NotificationContent {
    NotificationContent {
        kind: KIND_SCALE_DECLINED,
        title: "Escala recusada".into(),
        message: format!("{member_name} recusou a participação em \"{scale_title}\"."),
        link: scale_link(scale_id),
    }
}

pub fn invite_accepted(email: &str) -> NotificationContent {
    NotificationContent {
        kind: KIND_INVITE_ACCEPTED,
        title: "Convite aceito".into(),
        message: format!("{email} aceitou o convite e agora faz parte da igreja."),
        link: Some("/members".into()),
    }
}

pub fn department_joined(
    department_id: i64,
    department_name: &str,
    member_name: &str,
) -> NotificationContent {
    NotificationContent {
        kind: KIND_DEPARTMENT_JOINED,
        title: "Novo membro no departamento".into(),
        message: format!("{member_name} entrou no departamento {department_name}."),
        link: Some(format!("/departments/{department_id}")),
    }
}

/// Clamp pagination parameters to `(limit, offset)`.
pub fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_use_known_kinds() {
        let all = [
            scale_published(1, "Culto", "2026-03-01", "Bateria"),
            scale_updated(1, "Culto"),
            scale_reminder(1, "Culto", "2026-03-01", "09:00"),
            scale_declined(1, "Culto", "Ana"),
            invite_accepted("ana@example.com"),
            department_joined(2, "Louvor", "Ana"),
        ];
        for n in &all {
            assert!(VALID_KINDS.contains(&n.kind));
            assert!(!n.title.is_empty());
        }
    }

    #[test]
    fn published_message_mentions_function() {
        let n = scale_published(5, "Culto de domingo", "2026-03-01", "Bateria");
        assert!(n.message.contains("Bateria"));
        assert_eq!(n.link.as_deref(), Some("/scales/5"));
    }

    #[test]
    fn page_bounds_are_clamped() {
        assert_eq!(page_bounds(None, None), (20, 0));
        assert_eq!(page_bounds(Some(500), Some(-3)), (100, 0));
        assert_eq!(page_bounds(Some(0), Some(40)), (1, 40));
    }
}
