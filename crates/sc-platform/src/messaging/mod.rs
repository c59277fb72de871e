//! SMS Messaging
//!
//! HTTP surface over the `sc-sms` gateway and broadcast orchestrator.

pub mod api;
pub mod spreadsheet;

pub use api::{messaging_router, MessagingState};
