//! Integration API keys

pub mod model;
pub mod repository;

pub use model::{ApiKey, NewApiKey, KNOWN_SCOPES, SCOPE_ADMIN, SCOPE_INGEST, SCOPE_READ};
pub use repository::ApiKeyRepository;
