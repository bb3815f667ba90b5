//! Role-based access control (RBAC) for platform-level routes.
//!
//! Church-scoped routes use the wrappers in [`super::tenant`] instead.
//! Roles rank `master > admin > leader > member`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use koinonia_core::error::CoreError;
use koinonia_core::roles::ROLE_MASTER;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

async fn require_role(
    parts: &mut Parts,
    state: &AppState,
    minimum: &str,
    message: &str,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if !user.has_at_least(minimum) {
        return Err(AppError::Core(CoreError::Forbidden(message.into())));
    }
    Ok(user)
}

/// Requires the `master` role (cross-tenant administration).
///
/// ```ignore
/// async fn list_churches(RequireMaster(user): RequireMaster) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireMaster(pub AuthUser);

impl FromRequestParts<AppState> for RequireMaster {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_role(parts, state, ROLE_MASTER, "Master role required")
            .await
            .map(RequireMaster)
    }
}
