//! Koinonia domain core.
//!
//! Pure domain logic with no internal dependencies: shared types, error
//! taxonomy, role ranking, the scale workflow, the staffing suggestion
//! heuristic, department hierarchy rules, and the small policy modules
//! (caching, storage keys, invites, notification templates) used by the
//! database and API crates.

pub mod cache_policy;
pub mod department;
pub mod error;
pub mod event_names;
pub mod hashing;
pub mod invite;
pub mod notification;
pub mod roles;
pub mod scale;
pub mod session_store;
pub mod storage;
pub mod suggestion;
pub mod types;
pub mod validation;
