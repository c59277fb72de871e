//! Shared building blocks for the SecureCore services.

pub mod logging;

pub use logging::{init_logging, LogFormat};
