//! Authentication API handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};

use super::dto::{ChangePasswordRequest, LoginRequest, LoginResponse};
use crate::application::IdentityService;
use crate::interfaces::http::common::{
    error_response, ApiResponse, ApiResult, EmptyData, ValidatedJson,
};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::modules::users::UserDto;

#[derive(Clone)]
pub struct AuthHandlerState {
    pub identity: Arc<IdentityService>,
}

/// Agent id of the caller; API keys have no account to act on
fn agent_id<T>(user: &AuthenticatedUser) -> Result<&str, (StatusCode, Json<ApiResponse<T>>)> {
    user.user_id().ok_or_else(|| {
        (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("This endpoint requires an agent login")),
        )
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Successful login", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials or disabled account"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn login(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let auth = state
        .identity
        .login(&request.username, &request.password)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(auth.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current agent", body = ApiResponse<UserDto>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Called with an API key")
    )
)]
pub async fn get_current_user(
    State(state): State<AuthHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<UserDto> {
    let id = agent_id(&user)?;
    let me = state.identity.me(id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::success(me.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/change-password",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<EmptyData>),
        (status = 401, description = "Invalid current password"),
        (status = 422, description = "New password too short")
    )
)]
pub async fn change_password(
    State(state): State<AuthHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<EmptyData> {
    let id = agent_id(&user)?;
    state
        .identity
        .change_password(id, &request.current_password, &request.new_password)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(EmptyData {})))
}
