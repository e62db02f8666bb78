use async_trait::async_trait;

use super::{ApiKey, NewApiKey};
use crate::shared::DomainResult;

#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    async fn create(&self, key: NewApiKey) -> DomainResult<ApiKey>;
    async fn find_by_hash(&self, key_hash: &str) -> DomainResult<Option<ApiKey>>;
    /// All keys, newest first
    async fn list(&self) -> DomainResult<Vec<ApiKey>>;
    async fn revoke(&self, id: &str) -> DomainResult<()>;
    async fn touch_last_used(&self, id: &str) -> DomainResult<()>;
}
