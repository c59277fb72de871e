//! Shared Module
//!
//! Cross-cutting concerns and shared utilities.

pub mod api_common;
pub mod error;
pub mod health_api;
pub mod indexes;
pub mod middleware;

pub use api_common::{DeletedResponse, MessageResponse, SignInRequest, SignInResponse};
pub use error::{PlatformError, Result};
pub use health_api::health_router;
pub use indexes::initialize_indexes;
pub use middleware::{AdminAuth, AppState, AuthLayer, UserAuth};
