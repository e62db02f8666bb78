use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::shared::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    #[serde(alias = "active")]
    Active,
    #[serde(alias = "escalated")]
    Escalated,
    #[serde(alias = "closed")]
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Escalated => "ESCALATED",
            Self::Closed => "CLOSED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escalation {
    pub reason: String,
    pub escalated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

/// Session document; `state == ESCALATED` exactly when `escalation` is set.
///
/// Documents written by the assistant are accepted even when they break
/// that rule, so [`reset`](Self::reset) can repair them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub phone: String,
    state: SessionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    escalation: Option<Escalation>,
    #[serde(default = "Utc::now")]
    updated_at: DateTime<Utc>,
    /// Fields owned by the assistant
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConversationSession {
    pub fn new(phone: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            phone: phone.into(),
            state: SessionState::Active,
            escalation: None,
            updated_at: now,
            extra: Map::new(),
        }
    }

    pub fn from_json(raw: &str) -> DomainResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| DomainError::SessionStore(format!("malformed session document: {}", e)))
    }

    pub fn to_json(&self) -> DomainResult<String> {
        serde_json::to_string(self)
            .map_err(|e| DomainError::SessionStore(format!("failed to encode session: {}", e)))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn escalation(&self) -> Option<&Escalation> {
        self.escalation.as_ref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_consistent(&self) -> bool {
        (self.state == SessionState::Escalated) == self.escalation.is_some()
    }

    fn transition_error(&self, action: &str) -> DomainError {
        DomainError::InvalidTransition(format!(
            "cannot {} session {} in state {}",
            action,
            self.phone,
            self.state.as_str()
        ))
    }

    pub fn escalate(
        &mut self,
        reason: impl Into<String>,
        agent_id: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if self.state != SessionState::Active {
            return Err(self.transition_error("escalate"));
        }
        self.state = SessionState::Escalated;
        self.escalation = Some(Escalation {
            reason: reason.into(),
            escalated_at: now,
            agent_id,
        });
        self.updated_at = now;
        Ok(())
    }

    pub fn resolve(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.state != SessionState::Escalated {
            return Err(self.transition_error("resolve"));
        }
        self.state = SessionState::Active;
        self.escalation = None;
        self.updated_at = now;
        Ok(())
    }

    pub fn close(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.state == SessionState::Closed {
            return Err(self.transition_error("close"));
        }
        self.state = SessionState::Closed;
        self.escalation = None;
        self.updated_at = now;
        Ok(())
    }

    /// Back to ACTIVE with no escalation, whatever the current document says.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.state = SessionState::Active;
        self.escalation = None;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_session_is_active_and_consistent() {
        let s = ConversationSession::new("34600111222", Utc::now());
        assert_eq!(s.state(), SessionState::Active);
        assert!(s.escalation().is_none());
        assert!(s.is_consistent());
    }

    #[test]
    fn transitions_keep_invariant() {
        let now = Utc::now();
        let mut s = ConversationSession::new("34600111222", now);

        s.escalate("asked for a human", Some("agent-1".into()), now).unwrap();
        assert_eq!(s.state(), SessionState::Escalated);
        assert_eq!(s.escalation().unwrap().agent_id.as_deref(), Some("agent-1"));
        assert!(s.is_consistent());

        assert!(s.escalate("again", None, now).is_err());

        s.resolve(now).unwrap();
        assert_eq!(s.state(), SessionState::Active);
        assert!(s.is_consistent());
        assert!(s.resolve(now).is_err());

        s.escalate("visit", None, now).unwrap();
        s.close(now).unwrap();
        assert_eq!(s.state(), SessionState::Closed);
        assert!(s.escalation().is_none());
        assert!(s.close(now).is_err());
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let raw = json!({
            "phone": "34600111222",
            "state": "ACTIVE",
            "updated_at": "2026-03-01T10:00:00Z",
            "language": "es",
            "history": [{"role": "user", "text": "hola"}],
            "budget": {"max": 300000}
        })
        .to_string();

        let mut s = ConversationSession::from_json(&raw).unwrap();
        s.escalate("wants to negotiate", None, Utc::now()).unwrap();

        let written: Value = serde_json::from_str(&s.to_json().unwrap()).unwrap();
        assert_eq!(written["language"], "es");
        assert_eq!(written["history"][0]["text"], "hola");
        assert_eq!(written["budget"]["max"], 300000);
        assert_eq!(written["state"], "ESCALATED");
        assert_eq!(written["escalation"]["reason"], "wants to negotiate");
    }

    #[test]
    fn reset_repairs_inconsistent_document() {
        let raw = json!({
            "phone": "34600111222",
            "state": "ESCALATED",
            "updated_at": "2026-03-01T10:00:00Z"
        })
        .to_string();

        let mut s = ConversationSession::from_json(&raw).unwrap();
        assert!(!s.is_consistent());

        s.reset(Utc::now());
        assert_eq!(s.state(), SessionState::Active);
        assert!(s.is_consistent());

        let written: Value = serde_json::from_str(&s.to_json().unwrap()).unwrap();
        assert!(written.get("escalation").is_none());
    }

    #[test]
    fn lowercase_state_and_missing_timestamp_are_accepted() {
        let s = ConversationSession::from_json(r#"{"phone":"1","state":"closed"}"#).unwrap();
        assert_eq!(s.state(), SessionState::Closed);
    }

    #[test]
    fn garbage_is_a_session_store_error() {
        let err = ConversationSession::from_json("not json").unwrap_err();
        assert!(matches!(err, DomainError::SessionStore(_)));
    }
}
