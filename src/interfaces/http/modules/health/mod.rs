//! Liveness and dependency health

pub mod handlers;

pub use handlers::*;
