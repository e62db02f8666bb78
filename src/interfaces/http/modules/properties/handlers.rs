//! Property listing handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    CreatePropertyRequest, ListPropertiesParams, PropertyDto, UpdatePropertyRequest,
    UpdateStatusRequest,
};
use crate::application::PropertyService;
use crate::config::PaginationConfig;
use crate::domain::{
    ListingType, NewProperty, PropertyChanges, PropertyFilter, PropertyStatus, PropertyType,
};
use crate::interfaces::http::common::{
    error_response, pagination_params, parse_enum, ApiResponse, ApiResult, EmptyData,
    PaginatedResponse, ValidatedJson,
};
use crate::shared::SortOrder;

#[derive(Clone)]
pub struct PropertyHandlerState {
    pub properties: Arc<PropertyService>,
    pub pagination: PaginationConfig,
}

#[utoipa::path(
    get,
    path = "/api/v1/properties",
    tag = "Properties",
    security(("bearer_auth" = []), ("api_key" = [])),
    params(ListPropertiesParams),
    responses(
        (status = 200, description = "One page of listings", body = ApiResponse<PaginatedResponse<PropertyDto>>),
        (status = 400, description = "Invalid filter or pagination")
    )
)]
pub async fn list_properties(
    State(state): State<PropertyHandlerState>,
    Query(params): Query<ListPropertiesParams>,
) -> ApiResult<PaginatedResponse<PropertyDto>> {
    let pagination = pagination_params(
        &state.pagination,
        params.page,
        params.limit,
        params.sort_by,
        params.sort_order.as_deref(),
        ("created_at", SortOrder::Desc),
    )
    .map_err(error_response)?;
    let filter = PropertyFilter {
        search: params.search,
        status: parse_enum(params.status.as_deref()).map_err(error_response)?,
        property_type: parse_enum(params.property_type.as_deref()).map_err(error_response)?,
        listing_type: parse_enum(params.listing_type.as_deref()).map_err(error_response)?,
        city: params.city,
        min_price: params.min_price,
        max_price: params.max_price,
        min_bedrooms: params.min_bedrooms,
        agent_id: params.agent_id,
    };

    let page = state
        .properties
        .list(&filter, &pagination)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(PaginatedResponse::from_result(page, PropertyDto::from))))
}

#[utoipa::path(
    get,
    path = "/api/v1/properties/{id}",
    tag = "Properties",
    security(("bearer_auth" = []), ("api_key" = [])),
    params(("id" = i32, Path, description = "Property ID")),
    responses(
        (status = 200, description = "Listing details", body = ApiResponse<PropertyDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_property(
    State(state): State<PropertyHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<PropertyDto> {
    let property = state.properties.get(id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::success(property.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/properties",
    tag = "Properties",
    security(("bearer_auth" = [])),
    request_body = CreatePropertyRequest,
    responses(
        (status = 201, description = "Listing created", body = ApiResponse<PropertyDto>),
        (status = 400, description = "Unknown type/status or missing agent"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_property(
    State(state): State<PropertyHandlerState>,
    ValidatedJson(request): ValidatedJson<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PropertyDto>>), (StatusCode, Json<ApiResponse<PropertyDto>>)>
{
    let property = NewProperty {
        property_type: request
            .property_type
            .parse::<PropertyType>()
            .map_err(error_response)?,
        listing_type: request
            .listing_type
            .parse::<ListingType>()
            .map_err(error_response)?,
        status: parse_enum::<PropertyStatus>(request.status.as_deref())
            .map_err(error_response)?
            .unwrap_or(PropertyStatus::Available),
        title: request.title,
        description: request.description,
        price: request.price,
        currency: request.currency.to_uppercase(),
        bedrooms: request.bedrooms,
        bathrooms: request.bathrooms,
        area_sqm: request.area_sqm,
        city: request.city,
        address: request.address,
        agent_id: request.agent_id,
    };

    let created = state.properties.create(property).await.map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created.into()))))
}

#[utoipa::path(
    put,
    path = "/api/v1/properties/{id}",
    tag = "Properties",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Property ID")),
    request_body = UpdatePropertyRequest,
    responses(
        (status = 200, description = "Listing updated", body = ApiResponse<PropertyDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_property(
    State(state): State<PropertyHandlerState>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdatePropertyRequest>,
) -> ApiResult<PropertyDto> {
    let changes = PropertyChanges {
        property_type: parse_enum(request.property_type.as_deref()).map_err(error_response)?,
        listing_type: parse_enum(request.listing_type.as_deref()).map_err(error_response)?,
        title: request.title,
        description: request.description,
        price: request.price,
        currency: request.currency.map(|c| c.to_uppercase()),
        bedrooms: request.bedrooms,
        bathrooms: request.bathrooms,
        area_sqm: request.area_sqm,
        city: request.city,
        address: request.address,
        agent_id: request.agent_id,
    };

    let property = state
        .properties
        .update(id, changes)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(property.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/properties/{id}/status",
    tag = "Properties",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Property ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<PropertyDto>),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_property_status(
    State(state): State<PropertyHandlerState>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateStatusRequest>,
) -> ApiResult<PropertyDto> {
    let status = request.status.parse::<PropertyStatus>().map_err(error_response)?;
    let property = state
        .properties
        .set_status(id, status)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::success(property.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/properties/{id}",
    tag = "Properties",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Property ID")),
    responses(
        (status = 200, description = "Listing deleted", body = ApiResponse<EmptyData>),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_property(
    State(state): State<PropertyHandlerState>,
    Path(id): Path<i32>,
) -> ApiResult<EmptyData> {
    state.properties.delete(id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::success(EmptyData {})))
}
