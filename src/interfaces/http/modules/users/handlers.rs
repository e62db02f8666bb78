//! Agent management handlers
//!
//! Admin-only. Delegates to [`IdentityService`].

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{CreateUserRequest, ListUsersParams, UpdateUserRequest, UserDto};
use crate::application::{IdentityService, NewAgent};
use crate::config::PaginationConfig;
use crate::domain::{UserChanges, UserFilter, UserRole};
use crate::interfaces::http::common::{
    error_response, pagination_params, parse_enum, ApiResponse, ApiResult, EmptyData,
    PaginatedResponse, ValidatedJson,
};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::shared::SortOrder;

#[derive(Clone)]
pub struct UserHandlerState {
    pub identity: Arc<IdentityService>,
    pub pagination: PaginationConfig,
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(ListUsersParams),
    responses(
        (status = 200, description = "Agent list", body = ApiResponse<PaginatedResponse<UserDto>>),
        (status = 400, description = "Invalid filter or pagination"),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_users(
    State(state): State<UserHandlerState>,
    Query(params): Query<ListUsersParams>,
) -> ApiResult<PaginatedResponse<UserDto>> {
    let pagination = pagination_params(
        &state.pagination,
        params.page,
        params.limit,
        params.sort_by,
        params.sort_order.as_deref(),
        ("created_at", SortOrder::Desc),
    )
    .map_err(error_response)?;
    let filter = UserFilter {
        search: params.search,
        role: parse_enum::<UserRole>(params.role.as_deref()).map_err(error_response)?,
        is_active: params.is_active,
    };

    let page = state
        .identity
        .list_users(&filter, &pagination)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(PaginatedResponse::from_result(page, UserDto::from))))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Agent details", body = ApiResponse<UserDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_user(
    State(state): State<UserHandlerState>,
    Path(id): Path<String>,
) -> ApiResult<UserDto> {
    let user = state.identity.get_user(&id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::success(user.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Agent created", body = ApiResponse<UserDto>),
        (status = 400, description = "Invalid role"),
        (status = 409, description = "Username or email taken"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_user(
    State(state): State<UserHandlerState>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), (StatusCode, Json<ApiResponse<UserDto>>)> {
    let role = parse_enum::<UserRole>(request.role.as_deref())
        .map_err(error_response)?
        .unwrap_or_default();

    let user = state
        .identity
        .create_user(NewAgent {
            username: request.username,
            email: request.email,
            password: request.password,
            full_name: request.full_name,
            phone: request.phone,
            role,
        })
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user.into()))))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Agent updated", body = ApiResponse<UserDto>),
        (status = 403, description = "Cannot deactivate yourself"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_user(
    State(state): State<UserHandlerState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<UserDto> {
    let changes = UserChanges {
        email: request.email,
        full_name: request.full_name,
        phone: request.phone,
        role: parse_enum::<UserRole>(request.role.as_deref()).map_err(error_response)?,
        is_active: request.is_active,
    };

    let user = state
        .identity
        .update_user(&actor.principal_id, &id, changes)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(user.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Agent deleted", body = ApiResponse<EmptyData>),
        (status = 403, description = "Cannot delete yourself"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_user(
    State(state): State<UserHandlerState>,
    Extension(actor): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<EmptyData> {
    state
        .identity
        .delete_user(&actor.principal_id, &id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(EmptyData {})))
}
