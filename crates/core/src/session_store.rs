//! Per-session state container with typed actions.
//!
//! Holds who is connected, which church they are looking at, the selected
//! department, and which realtime topics they follow. State only changes
//! through [`SessionAction`]s applied by [`SessionStore::dispatch`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::ROLE_MASTER;
use crate::types::DbId;

/// Realtime topics a session can follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Departments,
    Scales,
    Notifications,
}

/// The authenticated user behind a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub user_id: DbId,
    pub role: String,
    /// The church the account belongs to; `None` for master users.
    pub home_church_id: Option<DbId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub user: Option<SessionUser>,
    pub church_id: Option<DbId>,
    pub selected_department_id: Option<DbId>,
    pub topics: BTreeSet<Topic>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Sign a user in. Their home church becomes the active church and the
    /// notification topic is followed by default.
    SetUser(SessionUser),
    SetChurch(Option<DbId>),
    SelectDepartment(Option<DbId>),
    Subscribe(Topic),
    Unsubscribe(Topic),
    Reset,
}

impl SessionState {
    /// Whether realtime messages about `topic` in `church_id` reach this session.
    pub fn follows(&self, church_id: DbId, topic: Topic) -> bool {
        self.church_id == Some(church_id) && self.topics.contains(&topic)
    }

    pub fn user_id(&self) -> Option<DbId> {
        self.user.as_ref().map(|u| u.user_id)
    }
}

/// Owner of a [`SessionState`].
#[derive(Debug, Default)]
pub struct SessionStore {
    state: SessionState,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Apply an action, enforcing tenant boundaries.
    ///
    /// Only master users may look at a church other than their own, and
    /// nothing but `SetUser` / `Reset` is accepted before sign-in.
    pub fn dispatch(&mut self, action: SessionAction) -> Result<&SessionState, CoreError> {
        match action {
            SessionAction::SetUser(user) => {
                self.state = SessionState {
                    church_id: user.home_church_id,
                    user: Some(user),
                    selected_department_id: None,
                    topics: BTreeSet::from([Topic::Notifications]),
                };
            }
            SessionAction::Reset => {
                self.state = SessionState::default();
            }
            SessionAction::SetChurch(church_id) => {
                let user = self.require_user()?;
                if user.role != ROLE_MASTER && church_id != user.home_church_id {
                    return Err(CoreError::Forbidden(
                        "Only master users can switch churches".into(),
                    ));
                }
                self.state.church_id = church_id;
                self.state.selected_department_id = None;
            }
            SessionAction::SelectDepartment(department_id) => {
                self.require_user()?;
                self.state.selected_department_id = department_id;
            }
            SessionAction::Subscribe(topic) => {
                self.require_user()?;
                self.state.topics.insert(topic);
            }
            SessionAction::Unsubscribe(topic) => {
                self.require_user()?;
                self.state.topics.remove(&topic);
            }
        }
        Ok(&self.state)
    }

    fn require_user(&self) -> Result<&SessionUser, CoreError> {
        self.state
            .user
            .as_ref()
            .ok_or_else(|| CoreError::Unauthorized("Session is not signed in".into()))
    }
}
