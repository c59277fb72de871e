//! User Aggregate

pub mod api;
pub mod entity;
pub mod repository;

pub use api::{user_router, UserState};
pub use entity::{User, UserResponse};
pub use repository::UserRepository;
