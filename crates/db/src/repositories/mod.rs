//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Tenant-scoped tables take
//! the caller's `church_id` and filter on it in every statement.

pub mod candidate_repo;
pub mod church_repo;
pub mod course_repo;
pub mod department_repo;
pub mod event_repo;
pub mod invite_repo;
pub mod membership_repo;
pub mod notification_repo;
pub mod profile_repo;
pub mod role_repo;
pub mod scale_repo;
pub mod service_type_repo;
pub mod session_repo;
pub mod song_repo;
pub mod user_repo;

pub use candidate_repo::CandidateRepo;
pub use church_repo::ChurchRepo;
pub use course_repo::CourseRepo;
pub use department_repo::DepartmentRepo;
pub use event_repo::EventRepo;
pub use invite_repo::InviteRepo;
pub use membership_repo::MembershipRepo;
pub use notification_repo::NotificationRepo;
pub use profile_repo::ProfileRepo;
pub use role_repo::RoleRepo;
pub use scale_repo::{AgendaItemRepo, ScaleMemberRepo, ScaleRepo, ScaleSongRepo};
pub use service_type_repo::ServiceTypeRepo;
pub use session_repo::SessionRepo;
pub use song_repo::SongRepo;
pub use user_repo::UserRepo;
