//! Authentication, authorization and tenant-scoping extractors.
//!
//! - [`auth::AuthUser`] -- the caller, from a JWT Bearer token.
//! - [`rbac`] -- `RequireMaster` for platform administration.
//! - [`tenant`] -- the church a request operates on, with `TenantLeader` and
//!   `TenantAdmin` minimum-role wrappers.

pub mod auth;
pub mod rbac;
pub mod tenant;
