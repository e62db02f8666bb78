//! API key management handlers (admin only)

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{Duration, Utc};

use super::dto::{ApiKeyResponse, CreateApiKeyRequest, CreatedApiKeyResponse};
use crate::application::ApiKeyService;
use crate::interfaces::http::common::{
    error_response, ApiResponse, ApiResult, EmptyData, ValidatedJson,
};
use crate::interfaces::http::middleware::AuthenticatedUser;

#[derive(Clone)]
pub struct ApiKeyHandlerState {
    pub api_keys: Arc<ApiKeyService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/api-keys",
    tag = "API Keys",
    security(("bearer_auth" = [])),
    request_body = CreateApiKeyRequest,
    responses(
        (status = 201, description = "Key created; the full key is only shown here", body = ApiResponse<CreatedApiKeyResponse>),
        (status = 400, description = "Unknown scope"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_api_key(
    State(state): State<ApiKeyHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateApiKeyRequest>,
) -> Result<
    (StatusCode, Json<ApiResponse<CreatedApiKeyResponse>>),
    (StatusCode, Json<ApiResponse<CreatedApiKeyResponse>>),
> {
    let expires_at = request
        .expires_in_days
        .map(|days| Utc::now() + Duration::days(days));

    let created = state
        .api_keys
        .create(
            &request.name,
            request.scopes,
            user.user_id().map(String::from),
            expires_at,
        )
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created.into()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/api-keys",
    tag = "API Keys",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All keys, newest first", body = ApiResponse<Vec<ApiKeyResponse>>)
    )
)]
pub async fn list_api_keys(State(state): State<ApiKeyHandlerState>) -> ApiResult<Vec<ApiKeyResponse>> {
    let keys = state.api_keys.list().await.map_err(error_response)?;
    Ok(Json(ApiResponse::success(
        keys.into_iter().map(ApiKeyResponse::from).collect(),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/api-keys/{id}",
    tag = "API Keys",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "API key ID")),
    responses(
        (status = 200, description = "Key revoked", body = ApiResponse<EmptyData>),
        (status = 404, description = "Not found")
    )
)]
pub async fn revoke_api_key(
    State(state): State<ApiKeyHandlerState>,
    Path(id): Path<String>,
) -> ApiResult<EmptyData> {
    state.api_keys.revoke(&id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::success(EmptyData {})))
}
