//! Analytics module: dashboard summary and daily activity

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
