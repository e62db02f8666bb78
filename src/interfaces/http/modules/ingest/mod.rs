//! Ingest module: the assistant records every WhatsApp message here

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
