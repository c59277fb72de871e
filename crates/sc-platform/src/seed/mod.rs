//! Startup Seeding

pub mod bootstrap_admin;

pub use bootstrap_admin::BootstrapAdminSeeder;
