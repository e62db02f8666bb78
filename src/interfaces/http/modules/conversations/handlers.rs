//! Conversation handlers: listing, agent actions and the assistant session

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{
    AssignRequest, ConversationDto, EscalateRequest, ListConversationsParams,
    ListMessagesParams, MessageDto, ReplyRequest, SessionDto,
};
use crate::application::{ConversationService, IdentityService};
use crate::config::PaginationConfig;
use crate::domain::{ConversationFilter, ConversationInclude};
use crate::interfaces::http::common::{
    error_response, pagination_params, parse_enum, ApiResponse, ApiResult, PaginatedResponse,
    ValidatedJson,
};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::shared::{DomainError, DomainResult, SortOrder};

#[derive(Clone)]
pub struct ConversationHandlerState {
    pub conversations: Arc<ConversationService>,
    pub identity: Arc<IdentityService>,
    pub pagination: PaginationConfig,
}

fn parse_include(raw: Option<&str>) -> DomainResult<ConversationInclude> {
    let mut include = ConversationInclude::default();
    for part in raw.unwrap_or_default().split(',').map(str::trim) {
        match part {
            "" => {}
            "agent" => include.agent = true,
            other => {
                return Err(DomainError::InvalidParameter(format!(
                    "unknown include '{}', expected 'agent'",
                    other
                )))
            }
        }
    }
    Ok(include)
}

#[utoipa::path(
    get,
    path = "/api/v1/conversations",
    tag = "Conversations",
    security(("bearer_auth" = []), ("api_key" = [])),
    params(ListConversationsParams),
    responses(
        (status = 200, description = "One page of conversations", body = ApiResponse<PaginatedResponse<ConversationDto>>),
        (status = 400, description = "Invalid filter or pagination")
    )
)]
pub async fn list_conversations(
    State(state): State<ConversationHandlerState>,
    Query(params): Query<ListConversationsParams>,
) -> ApiResult<PaginatedResponse<ConversationDto>> {
    let pagination = pagination_params(
        &state.pagination,
        params.page,
        params.limit,
        params.sort_by,
        params.sort_order.as_deref(),
        ("last_message_at", SortOrder::Desc),
    )
    .map_err(error_response)?;
    let include = parse_include(params.include.as_deref()).map_err(error_response)?;
    let filter = ConversationFilter {
        status: parse_enum(params.status.as_deref()).map_err(error_response)?,
        assigned_agent_id: params.assigned_agent_id,
        search: params.search,
    };

    let page = state
        .conversations
        .list(&filter, include, &pagination)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(PaginatedResponse::from_result(
        page,
        ConversationDto::from,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/conversations/{id}",
    tag = "Conversations",
    security(("bearer_auth" = []), ("api_key" = [])),
    params(("id" = i32, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Conversation with its assigned agent", body = ApiResponse<ConversationDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_conversation(
    State(state): State<ConversationHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<ConversationDto> {
    let view = state.conversations.get(id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::success(view.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/conversations/{id}/messages",
    tag = "Conversations",
    security(("bearer_auth" = []), ("api_key" = [])),
    params(("id" = i32, Path, description = "Conversation ID"), ListMessagesParams),
    responses(
        (status = 200, description = "One page of messages, oldest first by default", body = ApiResponse<PaginatedResponse<MessageDto>>),
        (status = 404, description = "Not found")
    )
)]
pub async fn list_messages(
    State(state): State<ConversationHandlerState>,
    Path(id): Path<i32>,
    Query(params): Query<ListMessagesParams>,
) -> ApiResult<PaginatedResponse<MessageDto>> {
    let pagination = pagination_params(
        &state.pagination,
        params.page,
        params.limit,
        params.sort_by,
        params.sort_order.as_deref(),
        ("created_at", SortOrder::Asc),
    )
    .map_err(error_response)?;

    let page = state
        .conversations
        .messages(id, &pagination)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(PaginatedResponse::from_result(page, MessageDto::from))))
}

#[utoipa::path(
    post,
    path = "/api/v1/conversations/{id}/messages",
    tag = "Conversations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Conversation ID")),
    request_body = ReplyRequest,
    responses(
        (status = 201, description = "Reply recorded", body = ApiResponse<MessageDto>),
        (status = 403, description = "Replies need an agent login"),
        (status = 409, description = "Conversation is closed")
    )
)]
pub async fn reply(
    State(state): State<ConversationHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<ReplyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MessageDto>>), (StatusCode, Json<ApiResponse<MessageDto>>)> {
    let Some(agent_id) = user.user_id() else {
        return Err(error_response(DomainError::Forbidden(
            "Replies must be sent by an agent".into(),
        )));
    };
    let agent = state.identity.me(agent_id).await.map_err(error_response)?;

    let message = state
        .conversations
        .reply(id, &agent, &request.body)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(message.into()))))
}

#[utoipa::path(
    put,
    path = "/api/v1/conversations/{id}/assign",
    tag = "Conversations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Conversation ID")),
    request_body = AssignRequest,
    responses(
        (status = 200, description = "Assignment changed", body = ApiResponse<ConversationDto>),
        (status = 400, description = "Unknown or deactivated agent"),
        (status = 404, description = "Not found")
    )
)]
pub async fn assign(
    State(state): State<ConversationHandlerState>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<AssignRequest>,
) -> ApiResult<ConversationDto> {
    let view = state
        .conversations
        .assign(id, request.agent_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(view.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/conversations/{id}/escalate",
    tag = "Conversations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Conversation ID")),
    request_body = EscalateRequest,
    responses(
        (status = 200, description = "Conversation taken over by an agent", body = ApiResponse<ConversationDto>),
        (status = 409, description = "Conversation is not active")
    )
)]
pub async fn escalate(
    State(state): State<ConversationHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<EscalateRequest>,
) -> ApiResult<ConversationDto> {
    let agent_id = request
        .agent_id
        .or_else(|| user.user_id().map(String::from));

    let view = state
        .conversations
        .escalate(id, &request.reason, agent_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(view.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/conversations/{id}/resolve",
    tag = "Conversations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Conversation handed back to the assistant", body = ApiResponse<ConversationDto>),
        (status = 409, description = "Conversation is not escalated")
    )
)]
pub async fn resolve(
    State(state): State<ConversationHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<ConversationDto> {
    let view = state.conversations.resolve(id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::success(view.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/conversations/{id}/close",
    tag = "Conversations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Conversation closed", body = ApiResponse<ConversationDto>),
        (status = 409, description = "Already closed")
    )
)]
pub async fn close(
    State(state): State<ConversationHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<ConversationDto> {
    let view = state.conversations.close(id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::success(view.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/conversations/{id}/session",
    tag = "Conversations",
    security(("bearer_auth" = []), ("api_key" = [])),
    params(("id" = i32, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Assistant session document", body = ApiResponse<SessionDto>),
        (status = 404, description = "No conversation or no session"),
        (status = 503, description = "Session store unavailable")
    )
)]
pub async fn get_session(
    State(state): State<ConversationHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<SessionDto> {
    let session = state.conversations.session(id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::success(session.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/conversations/{id}/session/reset",
    tag = "Conversations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Conversation and session forced back to active", body = ApiResponse<SessionDto>),
        (status = 404, description = "Not found"),
        (status = 503, description = "Session store unavailable")
    )
)]
pub async fn reset_session(
    State(state): State<ConversationHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<SessionDto> {
    let session = state
        .conversations
        .reset_session(id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(session.into())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_accepts_agent_only() {
        assert!(!parse_include(None).unwrap().agent);
        assert!(parse_include(Some("agent")).unwrap().agent);
        assert!(parse_include(Some(" agent , ")).unwrap().agent);
        assert!(matches!(
            parse_include(Some("messages")),
            Err(DomainError::InvalidParameter(_))
        ));
    }
}
