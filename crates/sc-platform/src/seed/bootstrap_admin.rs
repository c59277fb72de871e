//! Bootstrap Admin Seeder
//!
//! Creates the configured admin account on startup when it does not exist
//! yet. Admins have no sign-up endpoint, so this is how the first one is made.

use std::sync::Arc;
use tracing::{info, warn};

use crate::admin::{Admin, AdminRepository};
use crate::auth::PasswordService;
use crate::shared::error::Result;

pub struct BootstrapAdminSeeder {
    admin_repo: Arc<AdminRepository>,
    password_service: Arc<PasswordService>,
}

impl BootstrapAdminSeeder {
    pub fn new(admin_repo: Arc<AdminRepository>, password_service: Arc<PasswordService>) -> Self {
        Self {
            admin_repo,
            password_service,
        }
    }

    /// Returns true when an admin was created.
    pub async fn seed(&self, username: Option<&str>, password: Option<&str>) -> Result<bool> {
        let (Some(username), Some(password)) = (
            username.map(str::trim).filter(|u| !u.is_empty()),
            password.filter(|p| !p.is_empty()),
        ) else {
            warn!("No bootstrap admin configured; set SECURECORE_ADMIN_USERNAME and SECURECORE_ADMIN_PASSWORD to create one");
            return Ok(false);
        };

        if self.admin_repo.find_by_username(username).await?.is_some() {
            return Ok(false);
        }

        let password_hash = self.password_service.hash_password(password)?;
        let admin = Admin::new(username, password_hash);
        self.admin_repo.insert(&admin).await?;

        info!(admin_id = %admin.id, username, "Bootstrap admin created");
        Ok(true)
    }
}
