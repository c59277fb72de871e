//! SecureCore SMS
//!
//! Phone normalization, DLT template lookup, the Fast2SMS gateway client
//! and the batched broadcast orchestrator.

pub mod broadcast;
pub mod error;
pub mod gateway;
pub mod phone;
pub mod template;

pub use broadcast::{
    collect_recipients, phone_field, BatchResult, BatchSummary, BroadcastConfig, BroadcastOrchestrator, SheetRow,
    PHONE_FIELDS,
};
pub use error::{Result, SmsError};
pub use gateway::{
    send_single, DispatchReceipt, DispatchRequest, DispatchResult, Fast2SmsClient, GatewayResponse, MessageBody,
    SmsGateway, SmsGatewayConfig, API_VERSION, DLT_ROUTE,
};
pub use phone::{join_numbers, normalize, PhoneNumber};
pub use template::TemplateCatalog;
