//! HTTP handlers, one module per resource.

pub mod auth;
pub mod church;
pub mod course;
pub mod department;
pub mod invite;
pub mod member;
pub mod notification;
pub mod scale;
pub mod service_type;
pub mod song;
pub mod suggestion;
