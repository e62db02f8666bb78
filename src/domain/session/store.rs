use async_trait::async_trait;

use super::ConversationSession;
use crate::shared::DomainResult;

/// Key-value store holding one session document per customer phone
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, phone: &str) -> DomainResult<Option<ConversationSession>>;

    /// Overwrite the document, keeping any expiry the assistant set on it.
    async fn put(&self, session: &ConversationSession) -> DomainResult<()>;

    /// Check the backend is reachable.
    async fn ping(&self) -> DomainResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str;
}
