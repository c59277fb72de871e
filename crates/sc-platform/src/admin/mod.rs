//! Admin Aggregate

pub mod api;
pub mod entity;
pub mod repository;

pub use api::{admin_router, AdminState};
pub use entity::Admin;
pub use repository::AdminRepository;
