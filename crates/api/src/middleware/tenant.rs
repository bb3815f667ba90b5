//! Tenant resolution.
//!
//! Every church-scoped route works on exactly one church. Regular users are
//! pinned to the church in their token; master users name the church with
//! `?church_id=`.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use koinonia_core::error::CoreError;
use koinonia_core::roles::{ROLE_ADMIN, ROLE_LEADER};
use koinonia_core::types::DbId;
use koinonia_db::repositories::ChurchRepo;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::query::ChurchScope;
use crate::state::AppState;

/// The caller and the church the request is scoped to.
#[derive(Debug, Clone)]
pub struct Tenant {
    pub user: AuthUser,
    pub church_id: DbId,
}

impl Tenant {
    pub fn user_id(&self) -> DbId {
        self.user.user_id
    }

    /// Reject with 403 unless the caller ranks at least `minimum`.
    pub fn require(&self, minimum: &str) -> Result<(), AppError> {
        if self.user.has_at_least(minimum) {
            Ok(())
        } else {
            Err(AppError::Core(CoreError::Forbidden(format!(
                "Role '{minimum}' or higher required"
            ))))
        }
    }
}

impl FromRequestParts<AppState> for Tenant {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let Query(scope) = Query::<ChurchScope>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let church_id = resolve_church(&user, scope.church_id)?;

        if user.is_master() {
            ChurchRepo::find_by_id(&state.pool, church_id)
                .await?
                .ok_or(CoreError::not_found("Church", church_id))?;
        }

        Ok(Tenant { user, church_id })
    }
}

/// Pick the church for a request from the caller and the optional override.
pub fn resolve_church(user: &AuthUser, requested: Option<DbId>) -> Result<DbId, AppError> {
    if user.is_master() {
        return requested.ok_or_else(|| {
            AppError::BadRequest("Master users must pass ?church_id=".into())
        });
    }

    let home = user.church_id.ok_or_else(|| {
        AppError::Core(CoreError::Forbidden("Account is not linked to a church".into()))
    })?;

    match requested {
        Some(other) if other != home => Err(AppError::Core(CoreError::Forbidden(
            "Only master users can access other churches".into(),
        ))),
        _ => Ok(home),
    }
}

/// A [`Tenant`] whose caller is `leader` or above. Used on write routes.
pub struct TenantLeader(pub Tenant);

impl FromRequestParts<AppState> for TenantLeader {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let tenant = Tenant::from_request_parts(parts, state).await?;
        tenant.require(ROLE_LEADER)?;
        Ok(TenantLeader(tenant))
    }
}

/// A [`Tenant`] whose caller is `admin` or above.
pub struct TenantAdmin(pub Tenant);

impl FromRequestParts<AppState> for TenantAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let tenant = Tenant::from_request_parts(parts, state).await?;
        tenant.require(ROLE_ADMIN)?;
        Ok(TenantAdmin(tenant))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use koinonia_core::roles::{ROLE_MASTER, ROLE_MEMBER};

    use super::*;

    fn user(role: &str, church_id: Option<DbId>) -> AuthUser {
        AuthUser {
            user_id: 1,
            role: role.into(),
            church_id,
        }
    }

    #[test]
    fn members_stay_in_their_church() {
        let member = user(ROLE_MEMBER, Some(3));
        assert_eq!(resolve_church(&member, None).unwrap(), 3);
        assert_eq!(resolve_church(&member, Some(3)).unwrap(), 3);
        assert_matches!(
            resolve_church(&member, Some(4)),
            Err(AppError::Core(CoreError::Forbidden(_)))
        );
    }

    #[test]
    fn masters_must_pick_a_church() {
        let master = user(ROLE_MASTER, None);
        assert_matches!(resolve_church(&master, None), Err(AppError::BadRequest(_)));
        assert_eq!(resolve_church(&master, Some(9)).unwrap(), 9);
    }

    #[test]
    fn unlinked_accounts_are_rejected() {
        assert_matches!(
            resolve_church(&user(ROLE_ADMIN, None), None),
            Err(AppError::Core(CoreError::Forbidden(_)))
        );
    }
}
