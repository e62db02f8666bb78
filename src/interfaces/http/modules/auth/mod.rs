//! Authentication module: login, current agent, password change

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
