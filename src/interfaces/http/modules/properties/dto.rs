//! Property listing DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::Property;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PropertyDto {
    pub id: i32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// apartment, house, villa, land or commercial
    pub property_type: String,
    /// sale or rent
    pub listing_type: String,
    /// available, reserved, sold, rented or off_market
    pub status: String,
    /// Minor currency units
    pub price: i64,
    pub currency: String,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area_sqm: Option<i32>,
    pub city: String,
    pub address: Option<String>,
    pub agent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Property> for PropertyDto {
    fn from(p: Property) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            property_type: p.property_type.as_str().to_string(),
            listing_type: p.listing_type.as_str().to_string(),
            status: p.status.as_str().to_string(),
            price: p.price,
            currency: p.currency,
            bedrooms: p.bedrooms,
            bathrooms: p.bathrooms,
            area_sqm: p.area_sqm,
            city: p.city,
            address: p.address,
            agent_id: p.agent_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "title": "Two-bedroom flat with sea view",
    "property_type": "apartment",
    "listing_type": "sale",
    "price": 24500000,
    "currency": "EUR",
    "bedrooms": 2,
    "city": "Valencia"
}))]
pub struct CreatePropertyRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub property_type: String,
    pub listing_type: String,
    /// Defaults to `available`
    pub status: Option<String>,
    #[validate(range(min = 0, message = "price must not be negative"))]
    pub price: i64,
    #[validate(length(equal = 3, message = "currency must be a 3-letter ISO code"))]
    pub currency: String,
    #[validate(range(min = 0))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0))]
    pub bathrooms: Option<i32>,
    #[validate(range(min = 0))]
    pub area_sqm: Option<i32>,
    #[validate(length(min = 1, max = 100, message = "city is required"))]
    pub city: String,
    pub address: Option<String>,
    pub agent_id: Option<String>,
}

/// Partial update; omitted fields are left unchanged
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePropertyRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub property_type: Option<String>,
    pub listing_type: Option<String>,
    #[validate(range(min = 0, message = "price must not be negative"))]
    pub price: Option<i64>,
    #[validate(length(equal = 3, message = "currency must be a 3-letter ISO code"))]
    pub currency: Option<String>,
    #[validate(range(min = 0))]
    pub bedrooms: Option<i32>,
    #[validate(range(min = 0))]
    pub bathrooms: Option<i32>,
    #[validate(range(min = 0))]
    pub area_sqm: Option<i32>,
    #[validate(length(min = 1, max = 100, message = "city is required"))]
    pub city: Option<String>,
    pub address: Option<String>,
    pub agent_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPropertiesParams {
    /// 1-based page number (default 1)
    pub page: Option<u32>,
    /// Page size (default from config, at most `pagination.max_limit`)
    pub limit: Option<u32>,
    /// created_at, updated_at, price, title, bedrooms or area_sqm
    pub sort_by: Option<String>,
    /// asc or desc
    pub sort_order: Option<String>,
    /// Substring of title, address or city
    pub search: Option<String>,
    pub status: Option<String>,
    pub property_type: Option<String>,
    pub listing_type: Option<String>,
    pub city: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_bedrooms: Option<i32>,
    pub agent_id: Option<String>,
}
