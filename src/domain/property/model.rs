//! Property domain entity

use chrono::{DateTime, Utc};

use crate::shared::{DomainError, DomainResult};

string_enum! {
    pub enum PropertyType {
        Apartment => "apartment",
        House => "house",
        Villa => "villa",
        Land => "land",
        Commercial => "commercial",
    }
}

string_enum! {
    pub enum ListingType {
        Sale => "sale",
        Rent => "rent",
    }
}

string_enum! {
    pub enum PropertyStatus {
        Available => "available",
        Reserved => "reserved",
        Sold => "sold",
        Rented => "rented",
        OffMarket => "off_market",
    }
}

pub const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct Property {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub status: PropertyStatus,
    /// Minor currency units
    pub price: i64,
    /// ISO 4217
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

#[derive(Debug, Clone)]
pub struct NewProperty {
    pub title: String,
    pub description: Option<String>,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub status: PropertyStatus,
    pub price: i64,
    pub currency: String,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area_sqm: Option<i32>,
    pub city: String,
    pub address: Option<String>,
    pub agent_id: Option<String>,
}

impl NewProperty {
    pub fn validate(&self) -> DomainResult<()> {
        validate_title(&self.title)?;
        validate_price(self.price)?;
        validate_currency(&self.currency)?;
        if self.city.trim().is_empty() {
            return Err(DomainError::Validation("city must not be empty".into()));
        }
        Ok(())
    }
}

/// Partial update; `None` leaves the field unchanged
#[derive(Debug, Clone, Default)]
pub struct PropertyChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub property_type: Option<PropertyType>,
    pub listing_type: Option<ListingType>,
    pub price: Option<i64>,
    pub currency: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area_sqm: Option<i32>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub agent_id: Option<String>,
}

impl PropertyChanges {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(currency) = &self.currency {
            validate_currency(currency)?;
        }
        if matches!(&self.city, Some(city) if city.trim().is_empty()) {
            return Err(DomainError::Validation("city must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PropertyFilter {
    /// Substring of title, address or city
    pub search: Option<String>,
    pub status: Option<PropertyStatus>,
    pub property_type: Option<PropertyType>,
    pub listing_type: Option<ListingType>,
    pub city: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_bedrooms: Option<i32>,
    pub agent_id: Option<String>,
}

impl PropertyFilter {
    pub fn validate(&self) -> DomainResult<()> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(DomainError::InvalidParameter(format!(
                    "min_price ({}) is greater than max_price ({})",
                    min, max
                )));
            }
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> DomainResult<()> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::Validation("title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(DomainError::Validation(format!(
            "title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(())
}

fn validate_price(price: i64) -> DomainResult<()> {
    if price < 0 {
        return Err(DomainError::Validation("price must not be negative".into()));
    }
    Ok(())
}

fn validate_currency(currency: &str) -> DomainResult<()> {
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(DomainError::Validation(format!(
            "currency must be a 3-letter ISO code, got '{}'",
            currency
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_property() -> NewProperty {
        NewProperty {
            title: "Sea view flat".into(),
            description: None,
            property_type: PropertyType::Apartment,
            listing_type: ListingType::Sale,
            status: PropertyStatus::Available,
            price: 250_000_00,
            currency: "EUR".into(),
            bedrooms: Some(2),
            bathrooms: Some(1),
            area_sqm: Some(74),
            city: "Valencia".into(),
            address: None,
            agent_id: None,
        }
    }

    #[test]
    fn status_strings_round_trip() {
        for status in PropertyStatus::ALL {
            assert_eq!(status.as_str().parse::<PropertyStatus>().unwrap(), *status);
        }
        assert_eq!(PropertyStatus::OffMarket.as_str(), "off_market");
        assert!("gone".parse::<PropertyStatus>().is_err());
    }

    #[test]
    fn valid_property_passes() {
        assert!(new_property().validate().is_ok());
    }

    #[test]
    fn rejects_blank_or_long_title() {
        let mut p = new_property();
        p.title = "   ".into();
        assert!(p.validate().is_err());

        p.title = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_negative_price_and_bad_currency() {
        let mut p = new_property();
        p.price = -1;
        assert!(p.validate().is_err());

        let mut p = new_property();
        p.currency = "euro".into();
        assert!(p.validate().is_err());
    }

    #[test]
    fn changes_validate_only_present_fields() {
        assert!(PropertyChanges::default().validate().is_ok());

        let changes = PropertyChanges {
            price: Some(-5),
            ..Default::default()
        };
        assert!(changes.validate().is_err());
    }

    #[test]
    fn filter_rejects_inverted_price_range() {
        let filter = PropertyFilter {
            min_price: Some(500),
            max_price: Some(100),
            ..Default::default()
        };
        assert!(matches!(filter.validate(), Err(DomainError::InvalidParameter(_))));
    }
}
