//! Shared query parameter types for API handlers.

use koinonia_core::types::DbId;
use serde::Deserialize;

/// Filters of the church activity log.
#[derive(Debug, Default, Deserialize)]
pub struct ActivityParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Event type prefix, e.g. `scale` or `department`.
    pub category: Option<String>,
}

/// `?church_id=` override accepted from master users on tenant routes.
#[derive(Debug, Default, Deserialize)]
pub struct ChurchScope {
    pub church_id: Option<DbId>,
}
