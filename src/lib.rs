//! # Realty Admin Service
//!
//! Admin portal backend for a WhatsApp real-estate sales assistant. Agents
//! manage property listings and take over customer conversations from the
//! assistant; the assistant records its traffic through the ingest API.
//!
//! ## Architecture
//!
//! - **domain**: Entities, state rules and repository/session-store ports
//! - **application**: Use-case services (identity, properties, conversations, analytics)
//! - **infrastructure**: SeaORM persistence, session stores, crypto
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: Process lifecycle and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, resolve_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig};

// Re-export API router
pub use interfaces::http::{create_api_router, ApiContext};
