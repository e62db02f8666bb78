use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{ConversationSession, SessionStore};
use crate::shared::DomainResult;

/// Process-local store for development and tests.
///
/// Documents are kept serialized so reads see exactly what a redis
/// backend would return.
#[derive(Default)]
pub struct MemorySessionStore {
    documents: DashMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw document as the assistant would write it.
    pub fn insert_raw(&self, phone: &str, raw: impl Into<String>) {
        self.documents.insert(phone.to_string(), raw.into());
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, phone: &str) -> DomainResult<Option<ConversationSession>> {
        let raw = match self.documents.get(phone) {
            Some(entry) => entry.value().clone(),
            None => return Ok(None),
        };
        ConversationSession::from_json(&raw).map(Some)
    }

    async fn put(&self, session: &ConversationSession) -> DomainResult<()> {
        let raw = session.to_json()?;
        self.documents.insert(session.phone.clone(), raw);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::SessionState;
    use crate::shared::DomainError;

    #[tokio::test]
    async fn missing_session_is_none() {
        let store = MemorySessionStore::new();
        assert!(store.get("34600111222").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_then_get_keeps_assistant_fields() {
        let store = MemorySessionStore::new();
        store.insert_raw(
            "34600111222",
            r#"{"phone":"34600111222","state":"ACTIVE","language":"es","cart":[1,2]}"#,
        );

        let mut session = store.get("34600111222").await.unwrap().unwrap();
        session
            .escalate("wants a visit", Some("agent-1".into()), Utc::now())
            .unwrap();
        store.put(&session).await.unwrap();

        let stored = store.get("34600111222").await.unwrap().unwrap();
        assert_eq!(stored.state(), SessionState::Escalated);
        assert_eq!(stored.extra.get("language").and_then(|v| v.as_str()), Some("es"));
        assert!(stored.extra.contains_key("cart"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn corrupt_document_is_a_store_error() {
        let store = MemorySessionStore::new();
        store.insert_raw("1", "not json");
        let err = store.get("1").await.unwrap_err();
        assert!(matches!(err, DomainError::SessionStore(_)));
    }
}
