//! Conversations module: inbox, agent takeover and session maintenance

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
