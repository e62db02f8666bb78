//! API key management for integrations such as the WhatsApp assistant

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
