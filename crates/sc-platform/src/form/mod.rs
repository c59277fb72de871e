//! Feedback Form Aggregate

pub mod entity;
pub mod repository;

pub use entity::{Form, FormResponse};
pub use repository::FormRepository;
