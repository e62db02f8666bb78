//! Conversation DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::{Conversation, ConversationSession, ConversationView, Message, User};

/// Assigned agent, included on request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AgentSummaryDto {
    pub id: String,
    pub username: String,
    pub display_name: String,
}

impl From<User> for AgentSummaryDto {
    fn from(u: User) -> Self {
        Self {
            display_name: u.display_name().to_string(),
            id: u.id,
            username: u.username,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConversationDto {
    pub id: i32,
    pub customer_phone: String,
    pub customer_name: Option<String>,
    /// active, escalated or closed
    pub status: String,
    pub assigned_agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_agent: Option<AgentSummaryDto>,
    pub escalation_reason: Option<String>,
    pub escalated_at: Option<DateTime<Utc>>,
    pub interested_property_id: Option<i32>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationDto {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            customer_phone: c.customer_phone,
            customer_name: c.customer_name,
            status: c.status.as_str().to_string(),
            assigned_agent_id: c.assigned_agent_id,
            assigned_agent: None,
            escalation_reason: c.escalation_reason,
            escalated_at: c.escalated_at,
            interested_property_id: c.interested_property_id,
            last_message_at: c.last_message_at,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

impl From<ConversationView> for ConversationDto {
    fn from(view: ConversationView) -> Self {
        let mut dto = Self::from(view.conversation);
        dto.assigned_agent = view.agent.map(AgentSummaryDto::from);
        dto
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageDto {
    pub id: i32,
    pub conversation_id: i32,
    /// inbound or outbound
    pub direction: String,
    /// customer, assistant or agent
    pub sender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_message_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageDto {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            direction: m.direction.as_str().to_string(),
            sender: m.sender.as_str().to_string(),
            agent_id: m.agent_id,
            body: m.body,
            whatsapp_message_id: m.whatsapp_message_id,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EscalationDto {
    pub reason: String,
    pub escalated_at: DateTime<Utc>,
    pub agent_id: Option<String>,
}

/// Assistant session document for the conversation's customer
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionDto {
    pub phone: String,
    /// ACTIVE, ESCALATED or CLOSED
    pub state: String,
    pub escalation: Option<EscalationDto>,
    pub updated_at: DateTime<Utc>,
    /// Fields written by the assistant, as stored
    #[schema(value_type = Object)]
    pub extra: Value,
}

impl From<ConversationSession> for SessionDto {
    fn from(s: ConversationSession) -> Self {
        Self {
            state: s.state().as_str().to_string(),
            escalation: s.escalation().map(|e| EscalationDto {
                reason: e.reason.clone(),
                escalated_at: e.escalated_at,
                agent_id: e.agent_id.clone(),
            }),
            updated_at: s.updated_at(),
            phone: s.phone,
            extra: Value::Object(s.extra),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReplyRequest {
    #[validate(length(min = 1, max = 4096, message = "body must be 1-4096 characters"))]
    pub body: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AssignRequest {
    /// Agent to assign; `null` unassigns
    pub agent_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EscalateRequest {
    #[validate(length(min = 1, max = 500, message = "reason must be 1-500 characters"))]
    pub reason: String,
    /// Defaults to the calling agent
    pub agent_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListConversationsParams {
    /// 1-based page number (default 1)
    pub page: Option<u32>,
    /// Page size (default from config, at most `pagination.max_limit`)
    pub limit: Option<u32>,
    /// last_message_at, created_at or updated_at
    pub sort_by: Option<String>,
    /// asc or desc
    pub sort_order: Option<String>,
    /// active, escalated or closed
    pub status: Option<String>,
    pub assigned_agent_id: Option<String>,
    /// Substring of customer phone or name
    pub search: Option<String>,
    /// `agent` to embed the assigned agent
    pub include: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListMessagesParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// created_at or id
    pub sort_by: Option<String>,
    /// asc (default) or desc
    pub sort_order: Option<String>,
}
