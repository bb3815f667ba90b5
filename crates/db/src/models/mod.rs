//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts, checked with `validator`
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod candidate;
pub mod church;
pub mod course;
pub mod department;
pub mod event;
pub mod invite;
pub mod membership;
pub mod notification;
pub mod profile;
pub mod role;
pub mod scale;
pub mod service_type;
pub mod session;
pub mod song;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Deserialize a field that distinguishes "absent" from an explicit `null`.
///
/// Absent stays `None`; `null` becomes `Some(None)`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
