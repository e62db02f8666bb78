//! Conversation handling for agents and the WhatsApp assistant
//!
//! Status changes are committed to the database first and then mirrored
//! into the assistant's session document. A mirroring failure is logged
//! and counted but does not undo the committed change; the operator can
//! repair the document with a session reset.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::domain::{
    AppendedMessage, Conversation, ConversationFilter, ConversationInclude, ConversationSession,
    ConversationView, DomainError, DomainResult, Message, MessageDirection, MessageSender,
    NewMessage, RepositoryProvider, SessionStore, User,
};
use crate::shared::{PaginatedResult, PaginationParams};

/// Message reported by the assistant
#[derive(Debug, Clone)]
pub struct IngestMessage {
    pub customer_phone: String,
    pub customer_name: Option<String>,
    pub direction: MessageDirection,
    pub sender: MessageSender,
    pub body: String,
    pub whatsapp_message_id: Option<String>,
    /// Defaults to now
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub conversation: Conversation,
    pub message: Message,
    /// First message from this phone
    pub created: bool,
    /// A closed conversation was reopened by this message
    pub reopened: bool,
}

pub struct ConversationService {
    repos: Arc<dyn RepositoryProvider>,
    sessions: Arc<dyn SessionStore>,
}

impl ConversationService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { repos, sessions }
    }

    pub fn session_backend(&self) -> &'static str {
        self.sessions.backend_name()
    }

    async fn require(&self, id: i32) -> DomainResult<Conversation> {
        self.repos
            .conversations()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Conversation", "id", id))
    }

    async fn require_active_agent(&self, agent_id: &str) -> DomainResult<User> {
        let agent = self
            .repos
            .users()
            .find_by_id(agent_id)
            .await?
            .ok_or_else(|| DomainError::Validation(format!("agent '{}' does not exist", agent_id)))?;
        if !agent.is_active {
            return Err(DomainError::Validation(format!(
                "agent '{}' is deactivated",
                agent.username
            )));
        }
        Ok(agent)
    }

    // ── Queries ─────────────────────────────────────────────────

    pub async fn list(
        &self,
        filter: &ConversationFilter,
        include: ConversationInclude,
        params: &PaginationParams,
    ) -> DomainResult<PaginatedResult<ConversationView>> {
        self.repos.conversations().list(filter, include, params).await
    }

    pub async fn get(&self, id: i32) -> DomainResult<ConversationView> {
        self.repos
            .conversations()
            .find_view(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Conversation", "id", id))
    }

    pub async fn messages(
        &self,
        id: i32,
        params: &PaginationParams,
    ) -> DomainResult<PaginatedResult<Message>> {
        self.require(id).await?;
        self.repos.conversations().list_messages(id, params).await
    }

    // ── Agent actions ───────────────────────────────────────────

    /// Send a reply as `agent`. Closed conversations cannot be replied to.
    pub async fn reply(&self, id: i32, agent: &User, body: &str) -> DomainResult<Message> {
        let conversation = self.require(id).await?;
        conversation.ensure_can_reply()?;

        let now = Utc::now();
        let message = NewMessage {
            direction: MessageDirection::Outbound,
            sender: MessageSender::Agent,
            agent_id: Some(agent.id.clone()),
            body: body.trim().to_string(),
            whatsapp_message_id: None,
            created_at: now,
        };
        message.validate()?;

        let appended = self.repos.conversations().append_message(id, None, message).await?;

        info!(conversation_id = id, agent = %agent.username, "Agent replied");
        Ok(appended.message)
    }

    /// Assign or, with `None`, unassign the handling agent.
    pub async fn assign(&self, id: i32, agent_id: Option<String>) -> DomainResult<ConversationView> {
        if let Some(agent_id) = &agent_id {
            self.require_active_agent(agent_id).await?;
        }
        self.repos.conversations().assign(id, agent_id.clone(), Utc::now()).await?;

        info!(conversation_id = id, agent_id = ?agent_id, "Conversation assigned");
        self.get(id).await
    }

    pub async fn escalate(
        &self,
        id: i32,
        reason: &str,
        agent_id: Option<String>,
    ) -> DomainResult<ConversationView> {
        let reason = reason.trim().to_string();
        if reason.is_empty() {
            return Err(DomainError::Validation("escalation reason must not be empty".into()));
        }
        if let Some(agent_id) = &agent_id {
            self.require_active_agent(agent_id).await?;
        }

        let mut conversation = self.require(id).await?;
        let now = Utc::now();
        let change = conversation.escalate(reason.clone(), agent_id.clone(), now)?;
        self.repos.conversations().apply_status(&change).await?;
        info!(conversation_id = id, %reason, "Conversation escalated");

        self.mirror(&conversation, "escalate", move |session, at| {
            session.escalate(reason.clone(), agent_id.clone(), at)
        })
        .await;
        self.get(id).await
    }

    /// Hand the conversation back to the assistant.
    pub async fn resolve(&self, id: i32) -> DomainResult<ConversationView> {
        let mut conversation = self.require(id).await?;
        let change = conversation.resolve(Utc::now())?;
        self.repos.conversations().apply_status(&change).await?;
        info!(conversation_id = id, "Conversation resolved");

        self.mirror(&conversation, "resolve", |session, at| session.resolve(at)).await;
        self.get(id).await
    }

    pub async fn close(&self, id: i32) -> DomainResult<ConversationView> {
        let mut conversation = self.require(id).await?;
        let change = conversation.close(Utc::now())?;
        self.repos.conversations().apply_status(&change).await?;
        info!(conversation_id = id, "Conversation closed");

        self.mirror(&conversation, "close", |session, at| session.close(at)).await;
        self.get(id).await
    }

    // ── Assistant ingest ────────────────────────────────────────

    /// Record a message from the assistant, opening the conversation on
    /// first contact and reopening it when a closed one gets a new
    /// inbound message.
    pub async fn ingest(&self, incoming: IngestMessage) -> DomainResult<IngestOutcome> {
        let phone = incoming.customer_phone.trim().to_string();
        if phone.is_empty() {
            return Err(DomainError::Validation("customer_phone must not be empty".into()));
        }
        if incoming.sender == MessageSender::Agent {
            return Err(DomainError::Validation(
                "agent messages are sent through the reply endpoint".into(),
            ));
        }

        let sent_at = incoming.sent_at.unwrap_or_else(Utc::now);
        let message = NewMessage {
            direction: incoming.direction,
            sender: incoming.sender,
            agent_id: None,
            body: incoming.body,
            whatsapp_message_id: incoming.whatsapp_message_id,
            created_at: sent_at,
        };
        message.validate()?;

        let conversations = self.repos.conversations();
        let (conversation, created) = match conversations.find_by_phone(&phone).await? {
            Some(existing) => (existing, false),
            None => match conversations.create(&phone, incoming.customer_name.clone()).await {
                Ok(created) => (created, true),
                // Lost a race with a concurrent first message
                Err(DomainError::Conflict(_)) => {
                    let existing = conversations
                        .find_by_phone(&phone)
                        .await?
                        .ok_or_else(|| DomainError::not_found("Conversation", "customer_phone", &phone))?;
                    (existing, false)
                }
                Err(e) => return Err(e),
            },
        };

        let AppendedMessage { message, reopened } = conversations
            .append_message(conversation.id, incoming.customer_name, message)
            .await?;
        let conversation = self.require(conversation.id).await?;

        if created {
            info!(conversation_id = conversation.id, phone = %phone, "New conversation");
        }
        if reopened {
            info!(conversation_id = conversation.id, "Closed conversation reopened by customer");
        }
        metrics::counter!("ingested_messages_total", "direction" => message.direction.as_str())
            .increment(1);

        Ok(IngestOutcome {
            conversation,
            message,
            created,
            reopened,
        })
    }

    // ── Session store ───────────────────────────────────────────

    pub async fn session(&self, id: i32) -> DomainResult<ConversationSession> {
        let conversation = self.require(id).await?;
        self.sessions
            .get(&conversation.customer_phone)
            .await?
            .ok_or_else(|| DomainError::not_found("Session", "phone", &conversation.customer_phone))
    }

    /// Force conversation and session back to active.
    pub async fn reset_session(&self, id: i32) -> DomainResult<ConversationSession> {
        let conversation = self.require(id).await?;
        let phone = conversation.customer_phone.clone();
        self.reset(&phone, Some(conversation)).await
    }

    /// Reset by phone; works even when only the session document exists.
    pub async fn reset_session_by_phone(&self, phone: &str) -> DomainResult<ConversationSession> {
        let conversation = self.repos.conversations().find_by_phone(phone).await?;
        self.reset(phone, conversation).await
    }

    /// The session is written before the conversation. Both writes are
    /// idempotent, so a reset that fails halfway can simply be repeated.
    async fn reset(
        &self,
        phone: &str,
        conversation: Option<Conversation>,
    ) -> DomainResult<ConversationSession> {
        let now = Utc::now();
        let existing = self.sessions.get(phone).await?;
        if conversation.is_none() && existing.is_none() {
            return Err(DomainError::not_found("Session", "phone", phone));
        }

        let mut session = existing.unwrap_or_else(|| ConversationSession::new(phone, now));
        session.reset(now);
        self.sessions.put(&session).await?;

        if let Some(mut conversation) = conversation {
            let change = conversation.reset(now);
            self.repos.conversations().apply_status(&change).await?;
        }

        info!(%phone, "Session reset");
        Ok(session)
    }

    async fn mirror<F>(&self, conversation: &Conversation, action: &'static str, apply: F)
    where
        F: Fn(&mut ConversationSession, DateTime<Utc>) -> DomainResult<()> + Send + Sync,
    {
        let phone = conversation.customer_phone.as_str();
        if let Err(e) = self.try_mirror(phone, action, &apply).await {
            warn!(
                %phone,
                action,
                error = %e,
                "Failed to mirror conversation status into session store"
            );
            metrics::counter!("session_mirror_failures_total", "action" => action).increment(1);
        }
    }

    async fn try_mirror<F>(&self, phone: &str, action: &'static str, apply: &F) -> DomainResult<()>
    where
        F: Fn(&mut ConversationSession, DateTime<Utc>) -> DomainResult<()> + Send + Sync,
    {
        let now = Utc::now();
        let mut session = self
            .sessions
            .get(phone)
            .await?
            .unwrap_or_else(|| ConversationSession::new(phone, now));

        match apply(&mut session, now) {
            Ok(()) => {}
            Err(DomainError::InvalidTransition(reason)) => {
                // Session drifted from the database; the database wins
                debug!(%phone, action, %reason, "Session out of sync, resetting before mirroring");
                session.reset(now);
                apply(&mut session, now)?;
            }
            Err(e) => return Err(e),
        }

        self.sessions.put(&session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::domain::{ConversationStatus, NewUser, SessionState, UserRole};
    use crate::infrastructure::database::repositories::SeaOrmRepositoryProvider;
    use crate::infrastructure::database::test_db;
    use crate::infrastructure::session::MemorySessionStore;
    use crate::shared::SortOrder;

    struct BrokenStore;

    #[async_trait]
    impl SessionStore for BrokenStore {
        async fn get(&self, _phone: &str) -> DomainResult<Option<ConversationSession>> {
            Err(DomainError::SessionStore("connection refused".into()))
        }

        async fn put(&self, _session: &ConversationSession) -> DomainResult<()> {
            Err(DomainError::SessionStore("connection refused".into()))
        }

        fn backend_name(&self) -> &'static str {
            "broken"
        }
    }

    /// Reads work, writes fail
    struct ReadOnlyStore(MemorySessionStore);

    #[async_trait]
    impl SessionStore for ReadOnlyStore {
        async fn get(&self, phone: &str) -> DomainResult<Option<ConversationSession>> {
            self.0.get(phone).await
        }

        async fn put(&self, _session: &ConversationSession) -> DomainResult<()> {
            Err(DomainError::SessionStore("READONLY replica".into()))
        }

        fn backend_name(&self) -> &'static str {
            "read-only"
        }
    }

    struct Fixture {
        svc: ConversationService,
        repos: Arc<SeaOrmRepositoryProvider>,
        store: Arc<MemorySessionStore>,
    }

    async fn fixture() -> Fixture {
        let repos = Arc::new(SeaOrmRepositoryProvider::new(test_db().await));
        let store = Arc::new(MemorySessionStore::new());
        Fixture {
            svc: ConversationService::new(repos.clone(), store.clone()),
            repos,
            store,
        }
    }

    async fn agent(repos: &SeaOrmRepositoryProvider, username: &str) -> User {
        repos
            .users()
            .create(NewUser {
                username: username.into(),
                email: format!("{}@example.com", username),
                full_name: None,
                phone: None,
                password_hash: "hash".into(),
                role: UserRole::Agent,
            })
            .await
            .unwrap()
    }

    fn inbound(phone: &str, body: &str) -> IngestMessage {
        IngestMessage {
            customer_phone: phone.into(),
            customer_name: Some("Ana".into()),
            direction: MessageDirection::Inbound,
            sender: MessageSender::Customer,
            body: body.into(),
            whatsapp_message_id: Some("wamid.1".into()),
            sent_at: None,
        }
    }

    fn first_page() -> PaginationParams {
        PaginationParams::new(1, 50, "created_at", SortOrder::Asc)
    }

    #[tokio::test]
    async fn ingest_opens_then_appends() {
        let f = fixture().await;

        let first = f.svc.ingest(inbound("34600111222", "hola")).await.unwrap();
        assert!(first.created);
        assert_eq!(first.conversation.customer_name.as_deref(), Some("Ana"));

        let reply = IngestMessage {
            direction: MessageDirection::Outbound,
            sender: MessageSender::Assistant,
            body: "¡Hola! ¿En qué puedo ayudarte?".into(),
            ..inbound("34600111222", "")
        };
        let second = f.svc.ingest(reply).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.conversation.id, first.conversation.id);

        let messages = f.svc.messages(first.conversation.id, &first_page()).await.unwrap();
        assert_eq!(messages.pagination.total, 2);
        assert_eq!(messages.items[1].sender, MessageSender::Assistant);
    }

    #[tokio::test]
    async fn ingest_rejects_inconsistent_messages() {
        let f = fixture().await;
        let wrong_sender = IngestMessage {
            sender: MessageSender::Assistant,
            ..inbound("1", "hi")
        };
        assert!(f.svc.ingest(wrong_sender).await.is_err());

        let agent_sender = IngestMessage {
            direction: MessageDirection::Outbound,
            sender: MessageSender::Agent,
            ..inbound("1", "hi")
        };
        assert!(f.svc.ingest(agent_sender).await.is_err());
        assert!(f.svc.ingest(inbound("1", "   ")).await.is_err());
        assert!(f.repos.conversations().find_by_phone("1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn escalate_resolve_close_are_mirrored() {
        let f = fixture().await;
        let maria = agent(&f.repos, "maria").await;
        let id = f.svc.ingest(inbound("34600111222", "quiero visitar")).await.unwrap().conversation.id;

        let view = f.svc.escalate(id, "wants a visit", Some(maria.id.clone())).await.unwrap();
        assert_eq!(view.conversation.status, ConversationStatus::Escalated);
        assert_eq!(view.agent.map(|a| a.username), Some("maria".to_string()));

        let session = f.svc.session(id).await.unwrap();
        assert_eq!(session.state(), SessionState::Escalated);
        assert_eq!(
            session.escalation().and_then(|e| e.agent_id.clone()),
            Some(maria.id.clone())
        );

        let err = f.svc.escalate(id, "again", None).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));

        f.svc.resolve(id).await.unwrap();
        assert_eq!(f.svc.session(id).await.unwrap().state(), SessionState::Active);

        f.svc.close(id).await.unwrap();
        let session = f.svc.session(id).await.unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.is_consistent());
    }

    #[tokio::test]
    async fn mirroring_preserves_assistant_fields_and_repairs_drift() {
        let f = fixture().await;
        let id = f.svc.ingest(inbound("34600111222", "hola")).await.unwrap().conversation.id;
        // Assistant thinks the chat is closed and keeps its own fields
        f.store.insert_raw(
            "34600111222",
            r#"{"phone":"34600111222","state":"CLOSED","language":"es"}"#,
        );

        f.svc.escalate(id, "pricing", None).await.unwrap();

        let session = f.svc.session(id).await.unwrap();
        assert_eq!(session.state(), SessionState::Escalated);
        assert_eq!(session.extra.get("language").and_then(|v| v.as_str()), Some("es"));
    }

    #[tokio::test]
    async fn session_store_outage_does_not_fail_transition() {
        let repos = Arc::new(SeaOrmRepositoryProvider::new(test_db().await));
        let svc = ConversationService::new(repos, Arc::new(BrokenStore));
        let id = svc.ingest(inbound("34600111222", "hola")).await.unwrap().conversation.id;

        let view = svc.escalate(id, "visit", None).await.unwrap();
        assert_eq!(view.conversation.status, ConversationStatus::Escalated);

        let err = svc.reset_session(id).await.unwrap_err();
        assert!(matches!(err, DomainError::SessionStore(_)));
    }

    #[tokio::test]
    async fn failed_session_write_leaves_conversation_untouched() {
        let repos = Arc::new(SeaOrmRepositoryProvider::new(test_db().await));
        let svc = ConversationService::new(repos, Arc::new(ReadOnlyStore(MemorySessionStore::new())));
        let id = svc.ingest(inbound("34600111222", "hola")).await.unwrap().conversation.id;
        svc.escalate(id, "visit", None).await.unwrap();

        let err = svc.reset_session(id).await.unwrap_err();
        assert!(matches!(err, DomainError::SessionStore(_)));

        let view = svc.get(id).await.unwrap();
        assert_eq!(view.conversation.status, ConversationStatus::Escalated);
        assert_eq!(view.conversation.escalation_reason.as_deref(), Some("visit"));
    }

    #[tokio::test]
    async fn ingest_after_escalation_keeps_it() {
        let f = fixture().await;
        let id = f.svc.ingest(inbound("34600111222", "hola")).await.unwrap().conversation.id;
        f.svc.escalate(id, "wants a visit", None).await.unwrap();

        let outcome = f.svc.ingest(inbound("34600111222", "¿cuándo?")).await.unwrap();
        assert!(!outcome.reopened);
        assert_eq!(outcome.conversation.status, ConversationStatus::Escalated);

        let stored = f.repos.conversations().find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.status, ConversationStatus::Escalated);
        assert_eq!(stored.escalation_reason.as_deref(), Some("wants a visit"));
        assert_eq!(f.svc.session(id).await.unwrap().state(), SessionState::Escalated);
    }

    #[tokio::test]
    async fn transition_from_stale_read_is_rejected() {
        let f = fixture().await;
        let id = f.svc.ingest(inbound("34600111222", "hola")).await.unwrap().conversation.id;
        let mut stale = f.repos.conversations().find_by_id(id).await.unwrap().unwrap();

        f.svc.close(id).await.unwrap();
        let change = stale.escalate("visit".into(), None, Utc::now()).unwrap();
        let err = f.repos.conversations().apply_status(&change).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
        assert_eq!(f.svc.get(id).await.unwrap().conversation.status, ConversationStatus::Closed);
    }

    #[tokio::test]
    async fn reply_rules() {
        let f = fixture().await;
        let maria = agent(&f.repos, "maria").await;
        let id = f.svc.ingest(inbound("34600111222", "hola")).await.unwrap().conversation.id;

        let message = f.svc.reply(id, &maria, "  Te llamo ahora  ").await.unwrap();
        assert_eq!(message.sender, MessageSender::Agent);
        assert_eq!(message.agent_id.as_deref(), Some(maria.id.as_str()));
        assert_eq!(message.body, "Te llamo ahora");

        assert!(f.svc.reply(id, &maria, "   ").await.is_err());

        f.svc.close(id).await.unwrap();
        let err = f.svc.reply(id, &maria, "hello?").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn inbound_message_reopens_closed_conversation() {
        let f = fixture().await;
        let id = f.svc.ingest(inbound("34600111222", "hola")).await.unwrap().conversation.id;
        f.svc.close(id).await.unwrap();

        let outcome = f.svc.ingest(inbound("34600111222", "sigo interesada")).await.unwrap();
        assert!(outcome.reopened);
        assert_eq!(outcome.conversation.status, ConversationStatus::Active);
        assert_eq!(f.svc.get(id).await.unwrap().conversation.status, ConversationStatus::Active);
    }

    #[tokio::test]
    async fn assign_requires_active_agent() {
        let f = fixture().await;
        let maria = agent(&f.repos, "maria").await;
        let id = f.svc.ingest(inbound("34600111222", "hola")).await.unwrap().conversation.id;

        assert!(f.svc.assign(id, Some("ghost".into())).await.is_err());

        let view = f.svc.assign(id, Some(maria.id.clone())).await.unwrap();
        assert_eq!(view.conversation.assigned_agent_id, Some(maria.id));

        let view = f.svc.assign(id, None).await.unwrap();
        assert!(view.agent.is_none());
    }

    #[tokio::test]
    async fn reset_restores_conversation_and_session() {
        let f = fixture().await;
        let id = f.svc.ingest(inbound("34600111222", "hola")).await.unwrap().conversation.id;
        f.svc.escalate(id, "visit", None).await.unwrap();

        let session = f.svc.reset_session_by_phone("34600111222").await.unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert!(session.escalation().is_none());

        let view = f.svc.get(id).await.unwrap();
        assert_eq!(view.conversation.status, ConversationStatus::Active);
        assert!(view.conversation.escalation_reason.is_none());

        let err = f.svc.reset_session_by_phone("000").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
