//! Assistant ingest DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::IngestOutcome;
use crate::interfaces::http::modules::conversations::{ConversationDto, MessageDto};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "customer_phone": "34600111222",
    "customer_name": "Ana",
    "direction": "inbound",
    "sender": "customer",
    "body": "Is the flat on Calle Colón still available?",
    "whatsapp_message_id": "wamid.HBgLMzQ2MDA"
}))]
pub struct IngestMessageRequest {
    /// WhatsApp id of the customer
    #[validate(length(min = 5, max = 32, message = "customer_phone must be 5-32 characters"))]
    pub customer_phone: String,
    #[validate(length(max = 100))]
    pub customer_name: Option<String>,
    /// inbound or outbound
    pub direction: String,
    /// customer or assistant
    pub sender: String,
    #[validate(length(min = 1, max = 4096, message = "body must be 1-4096 characters"))]
    pub body: String,
    #[validate(length(max = 128))]
    pub whatsapp_message_id: Option<String>,
    /// When the message was sent; defaults to now
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    pub conversation: ConversationDto,
    pub message: MessageDto,
    /// First message from this customer
    pub created: bool,
    /// A closed conversation was reopened
    pub reopened: bool,
}

impl From<IngestOutcome> for IngestResponse {
    fn from(outcome: IngestOutcome) -> Self {
        Self {
            conversation: outcome.conversation.into(),
            message: outcome.message.into(),
            created: outcome.created,
            reopened: outcome.reopened,
        }
    }
}
