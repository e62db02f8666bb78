//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod analytics_repository;
pub mod api_key_repository;
pub mod conversation_repository;
pub mod property_repository;
pub mod repository_provider;
pub mod user_repository;

pub use analytics_repository::SeaOrmAnalyticsRepository;
pub use api_key_repository::SeaOrmApiKeyRepository;
pub use conversation_repository::SeaOrmConversationRepository;
pub use property_repository::SeaOrmPropertyRepository;
pub use repository_provider::{RepositoryProvider, SeaOrmRepositoryProvider};
pub use user_repository::SeaOrmUserRepository;

use sea_orm::{DbErr, SqlErr};

use crate::shared::DomainError;

/// Map a write error, reporting unique-key violations as conflicts.
pub(crate) fn conflict_or_db(e: DbErr, what: &str) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => DomainError::Conflict(what.to_string()),
        _ => DomainError::from(e),
    }
}

/// Trimmed search text; blank means no filter
pub(crate) fn search_term(search: &Option<String>) -> Option<&str> {
    search.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
