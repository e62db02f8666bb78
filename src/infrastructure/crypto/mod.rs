//! Credentials: agent passwords, JWTs, integration API keys

pub mod api_key;
pub mod jwt;
pub mod password;
