pub mod analytics;
pub mod api_keys;
pub mod auth;
pub mod conversations;
pub mod health;
pub mod ingest;
pub mod metrics;
pub mod properties;
pub mod request_id;
pub mod users;
