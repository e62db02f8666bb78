//! Message ingest for the WhatsApp assistant

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use super::dto::{IngestMessageRequest, IngestResponse};
use crate::application::{ConversationService, IngestMessage};
use crate::domain::{MessageDirection, MessageSender};
use crate::interfaces::http::common::{error_response, ApiResponse, ValidatedJson};

#[derive(Clone)]
pub struct IngestHandlerState {
    pub conversations: Arc<ConversationService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/ingest/messages",
    tag = "Ingest",
    security(("api_key" = [])),
    request_body = IngestMessageRequest,
    responses(
        (status = 201, description = "Message recorded on a new conversation", body = ApiResponse<IngestResponse>),
        (status = 200, description = "Message recorded", body = ApiResponse<IngestResponse>),
        (status = 400, description = "Unknown direction/sender or inconsistent pair"),
        (status = 403, description = "Key lacks the 'ingest' scope")
    )
)]
pub async fn ingest_message(
    State(state): State<IngestHandlerState>,
    ValidatedJson(request): ValidatedJson<IngestMessageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<IngestResponse>>), (StatusCode, Json<ApiResponse<IngestResponse>>)>
{
    let incoming = IngestMessage {
        direction: request
            .direction
            .parse::<MessageDirection>()
            .map_err(error_response)?,
        sender: request.sender.parse::<MessageSender>().map_err(error_response)?,
        customer_phone: request.customer_phone,
        customer_name: request.customer_name,
        body: request.body,
        whatsapp_message_id: request.whatsapp_message_id,
        sent_at: request.sent_at,
    };

    let outcome = state.conversations.ingest(incoming).await.map_err(error_response)?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ApiResponse::success(outcome.into()))))
}
