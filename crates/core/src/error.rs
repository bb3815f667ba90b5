//! Domain error taxonomy shared by every crate in the workspace.

use crate::types::DbId;

/// Errors raised by domain rules. The API layer maps each variant to an
/// HTTP status; repositories never produce these directly.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for [`CoreError::NotFound`].
    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        Self::NotFound { entity, id }
    }

    /// A caller tried to touch a row that belongs to another church.
    ///
    /// Reported as not-found so tenants can not discover each other's ids.
    pub fn other_tenant(entity: &'static str, id: DbId) -> Self {
        Self::NotFound { entity, id }
    }
}
