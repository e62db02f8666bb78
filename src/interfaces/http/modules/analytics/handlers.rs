//! Analytics handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use super::dto::{ActivityParams, AnalyticsSummary, DailyActivityDto};
use crate::application::AnalyticsService;
use crate::interfaces::http::common::{error_response, ApiResponse, ApiResult};

#[derive(Clone)]
pub struct AnalyticsHandlerState {
    pub analytics: Arc<AnalyticsService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/summary",
    tag = "Analytics",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status = 200, description = "Dashboard summary", body = ApiResponse<AnalyticsSummary>)
    )
)]
pub async fn get_summary(State(state): State<AnalyticsHandlerState>) -> ApiResult<AnalyticsSummary> {
    let summary = state.analytics.summary().await.map_err(error_response)?;
    Ok(Json(ApiResponse::success(summary.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/activity",
    tag = "Analytics",
    security(("bearer_auth" = []), ("api_key" = [])),
    params(ActivityParams),
    responses(
        (status = 200, description = "Per-day activity, oldest day first", body = ApiResponse<Vec<DailyActivityDto>>),
        (status = 400, description = "days out of range")
    )
)]
pub async fn get_activity(
    State(state): State<AnalyticsHandlerState>,
    Query(params): Query<ActivityParams>,
) -> ApiResult<Vec<DailyActivityDto>> {
    let days = state
        .analytics
        .activity(params.days)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(
        days.into_iter().map(DailyActivityDto::from).collect(),
    )))
}
