use async_trait::async_trait;

use chrono::{DateTime, Utc};

use super::{
    AppendedMessage, Conversation, ConversationFilter, ConversationInclude, ConversationView,
    Message, NewMessage, StatusChange,
};
use crate::shared::{DomainResult, PaginatedResult, PaginationParams};

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn create(&self, customer_phone: &str, customer_name: Option<String>)
        -> DomainResult<Conversation>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Conversation>>;
    async fn find_by_phone(&self, customer_phone: &str) -> DomainResult<Option<Conversation>>;
    /// Conversation plus its assigned agent
    async fn find_view(&self, id: i32) -> DomainResult<Option<ConversationView>>;

    async fn list(
        &self,
        filter: &ConversationFilter,
        include: ConversationInclude,
        params: &PaginationParams,
    ) -> DomainResult<PaginatedResult<ConversationView>>;

    async fn list_messages(
        &self,
        conversation_id: i32,
        params: &PaginationParams,
    ) -> DomainResult<PaginatedResult<Message>>;

    /// Write the status fields of `change` if the stored status still
    /// matches `change.expected`. A conversation changed by another writer
    /// in the meantime yields `InvalidTransition`.
    async fn apply_status(&self, change: &StatusChange) -> DomainResult<()>;

    /// Set or clear the handling agent without touching the status.
    async fn assign(&self, id: i32, agent_id: Option<String>, at: DateTime<Utc>)
        -> DomainResult<()>;

    /// Insert the message and, in the same transaction, advance
    /// `last_message_at`, fill `customer_name` when still unknown and
    /// reopen a closed conversation on an inbound message. The status is
    /// not otherwise written.
    async fn append_message(
        &self,
        conversation_id: i32,
        customer_name: Option<String>,
        message: NewMessage,
    ) -> DomainResult<AppendedMessage>;
}
