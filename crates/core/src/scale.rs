//! Scale (service roster) workflow rules.
//!
//! A scale moves `draft -> published -> completed`; a published scale may be
//! pulled back to draft for edits. Completed scales are frozen.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_PUBLISHED: &str = "published";
pub const STATUS_COMPLETED: &str = "completed";

pub const VALID_STATUSES: &[&str] = &[STATUS_DRAFT, STATUS_PUBLISHED, STATUS_COMPLETED];

pub const CONFIRMATION_PENDING: &str = "pending";
pub const CONFIRMATION_CONFIRMED: &str = "confirmed";
pub const CONFIRMATION_DECLINED: &str = "declined";

pub const VALID_CONFIRMATIONS: &[&str] = &[
    CONFIRMATION_PENDING,
    CONFIRMATION_CONFIRMED,
    CONFIRMATION_DECLINED,
];

/// Longest agenda item accepted, in minutes.
pub const MAX_AGENDA_ITEM_MINUTES: i32 = 600;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleStatus {
    Draft,
    Published,
    Completed,
}

impl ScaleStatus {
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            STATUS_DRAFT => Ok(Self::Draft),
            STATUS_PUBLISHED => Ok(Self::Published),
            STATUS_COMPLETED => Ok(Self::Completed),
            other => Err(CoreError::Validation(format!(
                "Invalid scale status '{other}'. Must be one of: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => STATUS_DRAFT,
            Self::Published => STATUS_PUBLISHED,
            Self::Completed => STATUS_COMPLETED,
        }
    }

    /// Statuses reachable from `self`.
    pub fn valid_transitions(self) -> &'static [ScaleStatus] {
        match self {
            Self::Draft => &[Self::Published],
            Self::Published => &[Self::Draft, Self::Completed],
            Self::Completed => &[],
        }
    }

    pub fn can_transition(self, to: ScaleStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Whether members, songs and agenda may still be edited.
    pub fn is_editable(self) -> bool {
        self != Self::Completed
    }
}

/// Validate a status change given the stored and requested values.
pub fn validate_transition(from: &str, to: &str) -> Result<ScaleStatus, CoreError> {
    let from_status = ScaleStatus::from_str_value(from)?;
    let to_status = ScaleStatus::from_str_value(to)?;
    if from_status.can_transition(to_status) {
        Ok(to_status)
    } else {
        Err(CoreError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Reject edits to a completed scale.
pub fn ensure_editable(status: &str) -> Result<(), CoreError> {
    if ScaleStatus::from_str_value(status)?.is_editable() {
        Ok(())
    } else {
        Err(CoreError::Conflict(
            "Completed scales can no longer be changed".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Confirmation
// ---------------------------------------------------------------------------

/// A member's answer to an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confirmation {
    Pending,
    Confirmed,
    Declined,
}

impl Confirmation {
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            CONFIRMATION_PENDING => Ok(Self::Pending),
            CONFIRMATION_CONFIRMED => Ok(Self::Confirmed),
            CONFIRMATION_DECLINED => Ok(Self::Declined),
            other => Err(CoreError::Validation(format!(
                "Invalid confirmation '{other}'. Must be one of: {}",
                VALID_CONFIRMATIONS.join(", ")
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => CONFIRMATION_PENDING,
            Self::Confirmed => CONFIRMATION_CONFIRMED,
            Self::Declined => CONFIRMATION_DECLINED,
        }
    }
}

/// Members answer only once the scale is published, and only with a
/// definitive value.
pub fn validate_response(scale_status: &str, answer: &str) -> Result<Confirmation, CoreError> {
    if ScaleStatus::from_str_value(scale_status)? != ScaleStatus::Published {
        return Err(CoreError::Conflict(
            "Only published scales accept confirmations".into(),
        ));
    }
    match Confirmation::from_str_value(answer)? {
        Confirmation::Pending => Err(CoreError::Validation(
            "Answer must be 'confirmed' or 'declined'".into(),
        )),
        other => Ok(other),
    }
}

/// Share of responded assignments that were confirmed. `0.0` without any
/// responses.
pub fn confirmation_rate(confirmed: i64, declined: i64) -> f64 {
    let responded = confirmed + declined;
    if responded <= 0 {
        return 0.0;
    }
    confirmed as f64 / responded as f64
}

// ---------------------------------------------------------------------------
// Agenda
// ---------------------------------------------------------------------------

pub fn validate_agenda_item(title: &str, duration_minutes: i32) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Agenda item title is required".into()));
    }
    if !(1..=MAX_AGENDA_ITEM_MINUTES).contains(&duration_minutes) {
        return Err(CoreError::Validation(format!(
            "Agenda item duration must be between 1 and {MAX_AGENDA_ITEM_MINUTES} minutes"
        )));
    }
    Ok(())
}

/// Total planned minutes of an agenda.
pub fn agenda_total_minutes(durations: &[i32]) -> i32 {
    durations.iter().sum()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn forward_transitions() {
        assert!(validate_transition("draft", "published").is_ok());
        assert!(validate_transition("published", "completed").is_ok());
        assert!(validate_transition("published", "draft").is_ok());
    }

    #[test]
    fn completed_is_terminal() {
        for to in VALID_STATUSES {
            assert_matches!(
                validate_transition("completed", to),
                Err(CoreError::InvalidTransition { .. })
            );
        }
    }

    #[test]
    fn draft_can_not_skip_publication() {
        assert_matches!(
            validate_transition("draft", "completed"),
            Err(CoreError::InvalidTransition { .. })
        );
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        assert_matches!(
            validate_transition("draft", "archived"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn completed_scales_are_frozen() {
        assert!(ensure_editable("draft").is_ok());
        assert!(ensure_editable("published").is_ok());
        assert_matches!(ensure_editable("completed"), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn responses_only_on_published_scales() {
        assert_eq!(
            validate_response("published", "confirmed").unwrap(),
            Confirmation::Confirmed
        );
        assert!(validate_response("draft", "confirmed").is_err());
        assert!(validate_response("published", "pending").is_err());
    }

    #[test]
    fn confirmation_rate_handles_no_history() {
        assert_eq!(confirmation_rate(0, 0), 0.0);
        assert_eq!(confirmation_rate(3, 1), 0.75);
    }

    #[test]
    fn agenda_items() {
        assert!(validate_agenda_item("Louvor", 25).is_ok());
        assert!(validate_agenda_item(" ", 25).is_err());
        assert!(validate_agenda_item("Pregação", 0).is_err());
        assert!(validate_agenda_item("Vigília", 601).is_err());
        assert_eq!(agenda_total_minutes(&[25, 40, 5]), 70);
    }
}
