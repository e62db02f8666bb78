//! Identity module: agent accounts and authentication

pub mod service;

pub use service::{AuthResult, IdentityService, NewAgent, MIN_PASSWORD_LEN};
