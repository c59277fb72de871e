//! SecureCore Platform
//!
//! Accounts, feedback forms and the SMS messaging APIs:
//! - Admin and user sign-in with JWT sessions
//! - User management and form review for admins
//! - Feedback submission with an automatic thank-you SMS
//! - Spreadsheet broadcasts, single sends and delivery reports
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `repository` - Data access
//! - `api` - REST endpoints

pub mod admin;
pub mod form;
pub mod user;

pub mod auth;
pub mod messaging;

pub mod router;
pub mod seed;
pub mod shared;

pub use shared::error::{PlatformError, Result};

pub use admin::{Admin, AdminRepository, AdminState};
pub use form::{Form, FormRepository};
pub use user::{User, UserRepository, UserState};

pub use auth::{AuthConfig, AuthService, PasswordService, Role};
pub use messaging::MessagingState;
pub use router::api_router;
pub use seed::BootstrapAdminSeeder;
pub use shared::middleware::{AdminAuth, AppState, AuthLayer, UserAuth};
