//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::{
    AnalyticsRepository, ApiKeyRepository, ConversationRepository, PropertyRepository,
    UserRepository,
};

pub use crate::domain::RepositoryProvider;

use super::analytics_repository::SeaOrmAnalyticsRepository;
use super::api_key_repository::SeaOrmApiKeyRepository;
use super::conversation_repository::SeaOrmConversationRepository;
use super::property_repository::SeaOrmPropertyRepository;
use super::user_repository::SeaOrmUserRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
pub struct SeaOrmRepositoryProvider {
    users: SeaOrmUserRepository,
    api_keys: SeaOrmApiKeyRepository,
    properties: SeaOrmPropertyRepository,
    conversations: SeaOrmConversationRepository,
    analytics: SeaOrmAnalyticsRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: SeaOrmUserRepository::new(db.clone()),
            api_keys: SeaOrmApiKeyRepository::new(db.clone()),
            properties: SeaOrmPropertyRepository::new(db.clone()),
            conversations: SeaOrmConversationRepository::new(db.clone()),
            analytics: SeaOrmAnalyticsRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn api_keys(&self) -> &dyn ApiKeyRepository {
        &self.api_keys
    }

    fn properties(&self) -> &dyn PropertyRepository {
        &self.properties
    }

    fn conversations(&self) -> &dyn ConversationRepository {
        &self.conversations
    }

    fn analytics(&self) -> &dyn AnalyticsRepository {
        &self.analytics
    }
}
