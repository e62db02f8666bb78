use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::shared::{DomainError, PaginatedResult, PaginationMeta};

/// Standard API response envelope
///
/// Success: `{"success": true, "data": {...}}`,
/// failure: `{"success": false, "data": null, "error": "message"}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    /// Payload, `null` on error
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler result carrying the envelope on both sides
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<T>>)>;

/// Empty payload for operations without return data
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct EmptyData {}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct PaginationMetaDto {
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
    /// Matching records across all pages
    pub total: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

impl From<PaginationMeta> for PaginationMetaDto {
    fn from(m: PaginationMeta) -> Self {
        Self {
            page: m.page,
            limit: m.limit,
            total: m.total,
            total_pages: m.total_pages,
            has_more: m.has_more,
        }
    }
}

/// One page of items with its metadata
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMetaDto,
}

impl<T> PaginatedResponse<T> {
    pub fn from_result<U>(result: PaginatedResult<U>, f: impl FnMut(U) -> T) -> Self {
        Self {
            pagination: result.pagination.into(),
            items: result.items.into_iter().map(f).collect(),
        }
    }
}

pub fn status_for(e: &DomainError) -> StatusCode {
    match e {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Validation(_) | DomainError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
        DomainError::Conflict(_) | DomainError::InvalidTransition(_) => StatusCode::CONFLICT,
        DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::Database(_) | DomainError::SessionStore(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Map a domain error onto its status code and error envelope.
pub fn error_response<T>(e: DomainError) -> (StatusCode, Json<ApiResponse<T>>) {
    let status = status_for(&e);
    if e.is_transient() {
        error!(error = %e, "Backend failure while handling request");
    }
    (status, Json(ApiResponse::error(e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::InvalidParameter;

    #[test]
    fn domain_errors_map_to_status_codes() {
        let cases = [
            (DomainError::not_found("User", "id", "u-1"), StatusCode::NOT_FOUND),
            (DomainError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (InvalidParameter("limit".into()).into(), StatusCode::BAD_REQUEST),
            (DomainError::Conflict("x".into()), StatusCode::CONFLICT),
            (DomainError::InvalidTransition("x".into()), StatusCode::CONFLICT),
            (DomainError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (DomainError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (DomainError::Database("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (DomainError::SessionStore("down".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (error, expected) in cases {
            assert_eq!(status_for(&error), expected, "{:?}", error);
        }
    }

    #[test]
    fn error_envelope_has_no_data() {
        let (status, Json(body)) = error_response::<EmptyData>(DomainError::Forbidden("no".into()));
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(!body.success);
        assert!(body.data.is_none());

        let json = serde_json::to_value(&ApiResponse::success(EmptyData {})).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": {}}));
    }
}
