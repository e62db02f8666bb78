use chrono::{DateTime, Utc};

use crate::domain::user::User;
use crate::shared::{DomainError, DomainResult};

string_enum! {
    pub enum ConversationStatus {
        Active => "active",
        Escalated => "escalated",
        Closed => "closed",
    }
}

string_enum! {
    pub enum MessageDirection {
        Inbound => "inbound",
        Outbound => "outbound",
    }
}

string_enum! {
    pub enum MessageSender {
        Customer => "customer",
        Assistant => "assistant",
        Agent => "agent",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: i32,
    /// WhatsApp id of the customer, unique per conversation
    pub customer_phone: String,
    pub customer_name: Option<String>,
    pub status: ConversationStatus,
    pub assigned_agent_id: Option<String>,
    pub escalation_reason: Option<String>,
    pub escalated_at: Option<DateTime<Utc>>,
    pub interested_property_id: Option<i32>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    fn transition_error(&self, action: &str) -> DomainError {
        DomainError::InvalidTransition(format!(
            "cannot {} conversation {} while it is {}",
            action, self.id, self.status
        ))
    }

    /// The write that persists the current status fields, guarded by the
    /// status they were computed from.
    fn status_change(
        &self,
        expected: Option<ConversationStatus>,
        assigned_agent_id: Option<String>,
    ) -> StatusChange {
        StatusChange {
            conversation_id: self.id,
            expected,
            status: self.status,
            escalation_reason: self.escalation_reason.clone(),
            escalated_at: self.escalated_at,
            assigned_agent_id,
            updated_at: self.updated_at,
        }
    }

    /// Hand the conversation to a human agent. Only from `active`.
    pub fn escalate(
        &mut self,
        reason: String,
        agent_id: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<StatusChange> {
        if self.status != ConversationStatus::Active {
            return Err(self.transition_error("escalate"));
        }
        self.status = ConversationStatus::Escalated;
        self.escalation_reason = Some(reason);
        self.escalated_at = Some(now);
        if let Some(agent_id) = &agent_id {
            self.assigned_agent_id = Some(agent_id.clone());
        }
        self.updated_at = now;
        Ok(self.status_change(Some(ConversationStatus::Active), agent_id))
    }

    /// Give the conversation back to the assistant. Only from `escalated`.
    pub fn resolve(&mut self, now: DateTime<Utc>) -> DomainResult<StatusChange> {
        if self.status != ConversationStatus::Escalated {
            return Err(self.transition_error("resolve"));
        }
        self.status = ConversationStatus::Active;
        self.clear_escalation();
        self.updated_at = now;
        Ok(self.status_change(Some(ConversationStatus::Escalated), None))
    }

    pub fn close(&mut self, now: DateTime<Utc>) -> DomainResult<StatusChange> {
        let from = self.status;
        if from == ConversationStatus::Closed {
            return Err(self.transition_error("close"));
        }
        self.status = ConversationStatus::Closed;
        self.clear_escalation();
        self.updated_at = now;
        Ok(self.status_change(Some(from), None))
    }

    /// Operator override: back to `active` from any state.
    pub fn reset(&mut self, now: DateTime<Utc>) -> StatusChange {
        self.status = ConversationStatus::Active;
        self.clear_escalation();
        self.updated_at = now;
        self.status_change(None, None)
    }

    pub fn ensure_can_reply(&self) -> DomainResult<()> {
        if self.status == ConversationStatus::Closed {
            return Err(self.transition_error("reply to"));
        }
        Ok(())
    }

    fn clear_escalation(&mut self) {
        self.escalation_reason = None;
        self.escalated_at = None;
    }
}

/// Status fields to write for one transition. Applied only while the
/// stored status still equals `expected`; `None` applies unconditionally.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub conversation_id: i32,
    pub expected: Option<ConversationStatus>,
    pub status: ConversationStatus,
    pub escalation_reason: Option<String>,
    pub escalated_at: Option<DateTime<Utc>>,
    /// Written only when set; clearing goes through assignment
    pub assigned_agent_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Result of appending a message to a conversation
#[derive(Debug, Clone)]
pub struct AppendedMessage {
    pub message: Message,
    /// An inbound message moved the conversation from `closed` to `active`
    pub reopened: bool,
}

/// A conversation with its assigned agent, when requested
#[derive(Debug, Clone)]
pub struct ConversationView {
    pub conversation: Conversation,
    pub agent: Option<User>,
}

/// Relations to load with a conversation listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversationInclude {
    pub agent: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ConversationFilter {
    pub status: Option<ConversationStatus>,
    pub assigned_agent_id: Option<String>,
    /// Substring of customer phone or name
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: i32,
    pub conversation_id: i32,
    pub direction: MessageDirection,
    pub sender: MessageSender,
    pub agent_id: Option<String>,
    pub body: String,
    pub whatsapp_message_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub direction: MessageDirection,
    pub sender: MessageSender,
    pub agent_id: Option<String>,
    pub body: String,
    pub whatsapp_message_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewMessage {
    pub fn validate(&self) -> DomainResult<()> {
        if self.body.trim().is_empty() {
            return Err(DomainError::Validation("message body must not be empty".into()));
        }
        let consistent = matches!(
            (self.direction, self.sender),
            (MessageDirection::Inbound, MessageSender::Customer)
                | (MessageDirection::Outbound, MessageSender::Assistant)
                | (MessageDirection::Outbound, MessageSender::Agent)
        );
        if !consistent {
            return Err(DomainError::Validation(format!(
                "{} messages cannot be sent by {}",
                self.direction, self.sender
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn conversation(status: ConversationStatus) -> Conversation {
        let now = Utc::now();
        Conversation {
            id: 7,
            customer_phone: "34600111222".into(),
            customer_name: Some("Ana".into()),
            status,
            assigned_agent_id: None,
            escalation_reason: None,
            escalated_at: None,
            interested_property_id: None,
            last_message_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn escalate_only_from_active() {
        let now = Utc::now();
        let mut c = conversation(ConversationStatus::Active);
        c.escalate("wants a visit".into(), Some("agent-1".into()), now).unwrap();

        assert_eq!(c.status, ConversationStatus::Escalated);
        assert_eq!(c.escalation_reason.as_deref(), Some("wants a visit"));
        assert_eq!(c.escalated_at, Some(now));
        assert_eq!(c.assigned_agent_id.as_deref(), Some("agent-1"));

        let err = c.escalate("again".into(), None, now).unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));

        let mut closed = conversation(ConversationStatus::Closed);
        assert!(closed.escalate("x".into(), None, now).is_err());
    }

    #[test]
    fn escalate_without_agent_keeps_assignment() {
        let mut c = conversation(ConversationStatus::Active);
        c.assigned_agent_id = Some("agent-2".into());
        c.escalate("pricing".into(), None, Utc::now()).unwrap();
        assert_eq!(c.assigned_agent_id.as_deref(), Some("agent-2"));
    }

    #[test]
    fn resolve_clears_escalation() {
        let now = Utc::now();
        let mut c = conversation(ConversationStatus::Active);
        c.escalate("visit".into(), Some("agent-1".into()), now).unwrap();
        c.resolve(now).unwrap();

        assert_eq!(c.status, ConversationStatus::Active);
        assert!(c.escalation_reason.is_none());
        assert!(c.escalated_at.is_none());
        assert_eq!(c.assigned_agent_id.as_deref(), Some("agent-1"));

        assert!(c.resolve(now).is_err());
    }

    #[test]
    fn close_from_active_or_escalated() {
        let now = Utc::now();
        let mut active = conversation(ConversationStatus::Active);
        active.close(now).unwrap();
        assert_eq!(active.status, ConversationStatus::Closed);

        let mut escalated = conversation(ConversationStatus::Active);
        escalated.escalate("visit".into(), None, now).unwrap();
        escalated.close(now).unwrap();
        assert_eq!(escalated.status, ConversationStatus::Closed);
        assert!(escalated.escalation_reason.is_none());

        assert!(escalated.close(now).is_err());
    }

    #[test]
    fn transitions_are_guarded_by_their_starting_status() {
        let now = Utc::now();
        let mut c = conversation(ConversationStatus::Active);

        let change = c.escalate("visit".into(), None, now).unwrap();
        assert_eq!(change.expected, Some(ConversationStatus::Active));
        assert_eq!(change.status, ConversationStatus::Escalated);
        assert_eq!(change.escalation_reason.as_deref(), Some("visit"));
        assert!(change.assigned_agent_id.is_none());

        let change = c.close(now + Duration::minutes(1)).unwrap();
        assert_eq!(change.expected, Some(ConversationStatus::Escalated));
        assert_eq!(change.status, ConversationStatus::Closed);
        assert!(change.escalated_at.is_none());
        assert_eq!(change.updated_at, now + Duration::minutes(1));

        assert_eq!(c.reset(now).expected, None);
    }

    #[test]
    fn replies_to_closed_conversations_are_rejected() {
        assert!(conversation(ConversationStatus::Active).ensure_can_reply().is_ok());
        assert!(conversation(ConversationStatus::Escalated).ensure_can_reply().is_ok());
        assert!(conversation(ConversationStatus::Closed).ensure_can_reply().is_err());
    }

    #[test]
    fn reset_returns_to_active_from_anywhere() {
        let now = Utc::now();
        let mut c = conversation(ConversationStatus::Active);
        c.escalate("visit".into(), None, now).unwrap();
        c.reset(now);
        assert_eq!(c.status, ConversationStatus::Active);
        assert!(c.escalated_at.is_none());
    }

    #[test]
    fn message_direction_and_sender_must_agree() {
        let msg = |direction, sender| NewMessage {
            direction,
            sender,
            agent_id: None,
            body: "hola".into(),
            whatsapp_message_id: None,
            created_at: Utc::now(),
        };

        assert!(msg(MessageDirection::Inbound, MessageSender::Customer).validate().is_ok());
        assert!(msg(MessageDirection::Outbound, MessageSender::Agent).validate().is_ok());
        assert!(msg(MessageDirection::Inbound, MessageSender::Agent).validate().is_err());
        assert!(msg(MessageDirection::Outbound, MessageSender::Customer).validate().is_err());

        let mut blank = msg(MessageDirection::Inbound, MessageSender::Customer);
        blank.body = "  ".into();
        assert!(blank.validate().is_err());
    }
}
