//! Properties module: listing CRUD and status changes

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
