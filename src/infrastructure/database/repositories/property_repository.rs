use async_trait::async_trait;
use chrono::Utc;
use log::info;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Set};

use super::search_term;
use crate::domain::{
    ListingType, NewProperty, Property, PropertyChanges, PropertyFilter, PropertyRepository,
    PropertyStatus, PropertyType,
};
use crate::infrastructure::database::entities::property;
use crate::infrastructure::database::listing::{SeaOrmListing, SortColumns};
use crate::shared::{paginate, DomainError, DomainResult, PaginatedResult, PaginationParams};

const SORT_COLUMNS: SortColumns<property::Entity> = &[
    ("created_at", property::Column::CreatedAt),
    ("updated_at", property::Column::UpdatedAt),
    ("price", property::Column::Price),
    ("title", property::Column::Title),
    ("bedrooms", property::Column::Bedrooms),
    ("area_sqm", property::Column::AreaSqm),
];

pub struct SeaOrmPropertyRepository {
    db: DatabaseConnection,
}

impl SeaOrmPropertyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(&self, id: i32) -> DomainResult<property::Model> {
        property::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("Property", "id", id))
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(crate) fn status_to_domain(s: property::PropertyStatus) -> PropertyStatus {
    match s {
        property::PropertyStatus::Available => PropertyStatus::Available,
        property::PropertyStatus::Reserved => PropertyStatus::Reserved,
        property::PropertyStatus::Sold => PropertyStatus::Sold,
        property::PropertyStatus::Rented => PropertyStatus::Rented,
        property::PropertyStatus::OffMarket => PropertyStatus::OffMarket,
    }
}

pub(crate) fn status_to_entity(s: PropertyStatus) -> property::PropertyStatus {
    match s {
        PropertyStatus::Available => property::PropertyStatus::Available,
        PropertyStatus::Reserved => property::PropertyStatus::Reserved,
        PropertyStatus::Sold => property::PropertyStatus::Sold,
        PropertyStatus::Rented => property::PropertyStatus::Rented,
        PropertyStatus::OffMarket => property::PropertyStatus::OffMarket,
    }
}

fn type_to_domain(t: property::PropertyType) -> PropertyType {
    match t {
        property::PropertyType::Apartment => PropertyType::Apartment,
        property::PropertyType::House => PropertyType::House,
        property::PropertyType::Villa => PropertyType::Villa,
        property::PropertyType::Land => PropertyType::Land,
        property::PropertyType::Commercial => PropertyType::Commercial,
    }
}

fn type_to_entity(t: PropertyType) -> property::PropertyType {
    match t {
        PropertyType::Apartment => property::PropertyType::Apartment,
        PropertyType::House => property::PropertyType::House,
        PropertyType::Villa => property::PropertyType::Villa,
        PropertyType::Land => property::PropertyType::Land,
        PropertyType::Commercial => property::PropertyType::Commercial,
    }
}

fn listing_to_domain(l: property::ListingType) -> ListingType {
    match l {
        property::ListingType::Sale => ListingType::Sale,
        property::ListingType::Rent => ListingType::Rent,
    }
}

fn listing_to_entity(l: ListingType) -> property::ListingType {
    match l {
        ListingType::Sale => property::ListingType::Sale,
        ListingType::Rent => property::ListingType::Rent,
    }
}

fn property_model_to_domain(m: property::Model) -> Property {
    Property {
        id: m.id,
        title: m.title,
        description: m.description,
        property_type: type_to_domain(m.property_type),
        listing_type: listing_to_domain(m.listing_type),
        status: status_to_domain(m.status),
        price: m.price,
        currency: m.currency,
        bedrooms: m.bedrooms,
        bathrooms: m.bathrooms,
        area_sqm: m.area_sqm,
        city: m.city,
        address: m.address,
        agent_id: m.agent_id,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

fn filter_condition(filter: &PropertyFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(search) = search_term(&filter.search) {
        cond = cond.add(
            Condition::any()
                .add(property::Column::Title.contains(search))
                .add(property::Column::Address.contains(search))
                .add(property::Column::City.contains(search)),
        );
    }
    if let Some(status) = filter.status {
        cond = cond.add(property::Column::Status.eq(status_to_entity(status)));
    }
    if let Some(t) = filter.property_type {
        cond = cond.add(property::Column::PropertyType.eq(type_to_entity(t)));
    }
    if let Some(l) = filter.listing_type {
        cond = cond.add(property::Column::ListingType.eq(listing_to_entity(l)));
    }
    if let Some(city) = search_term(&filter.city) {
        cond = cond.add(property::Column::City.eq(city));
    }
    if let Some(min) = filter.min_price {
        cond = cond.add(property::Column::Price.gte(min));
    }
    if let Some(max) = filter.max_price {
        cond = cond.add(property::Column::Price.lte(max));
    }
    if let Some(min) = filter.min_bedrooms {
        cond = cond.add(property::Column::Bedrooms.gte(min));
    }
    if let Some(agent_id) = &filter.agent_id {
        cond = cond.add(property::Column::AgentId.eq(agent_id.as_str()));
    }
    cond
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl PropertyRepository for SeaOrmPropertyRepository {
    async fn create(&self, p: NewProperty) -> DomainResult<Property> {
        let now = Utc::now();
        let model = property::ActiveModel {
            title: Set(p.title.trim().to_string()),
            description: Set(p.description),
            property_type: Set(type_to_entity(p.property_type)),
            listing_type: Set(listing_to_entity(p.listing_type)),
            status: Set(status_to_entity(p.status)),
            price: Set(p.price),
            currency: Set(p.currency),
            bedrooms: Set(p.bedrooms),
            bathrooms: Set(p.bathrooms),
            area_sqm: Set(p.area_sqm),
            city: Set(p.city),
            address: Set(p.address),
            agent_id: Set(p.agent_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!("Property created: {} ({})", model.title, model.id);
        Ok(property_model_to_domain(model))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Property>> {
        let model = property::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(property_model_to_domain))
    }

    async fn list(
        &self,
        filter: &PropertyFilter,
        params: &PaginationParams,
    ) -> DomainResult<PaginatedResult<Property>> {
        let listing = SeaOrmListing::<property::Entity>::new(&self.db, SORT_COLUMNS);
        let page =
            paginate::<_, _, property::Model>(&listing, &filter_condition(filter), &(), params)
                .await?;
        Ok(page.map(property_model_to_domain))
    }

    async fn update(&self, id: i32, c: PropertyChanges) -> DomainResult<Property> {
        let mut active: property::ActiveModel = self.find_model(id).await?.into();

        if let Some(title) = c.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = c.description {
            active.description = Set(Some(description));
        }
        if let Some(t) = c.property_type {
            active.property_type = Set(type_to_entity(t));
        }
        if let Some(l) = c.listing_type {
            active.listing_type = Set(listing_to_entity(l));
        }
        if let Some(price) = c.price {
            active.price = Set(price);
        }
        if let Some(currency) = c.currency {
            active.currency = Set(currency);
        }
        if let Some(bedrooms) = c.bedrooms {
            active.bedrooms = Set(Some(bedrooms));
        }
        if let Some(bathrooms) = c.bathrooms {
            active.bathrooms = Set(Some(bathrooms));
        }
        if let Some(area) = c.area_sqm {
            active.area_sqm = Set(Some(area));
        }
        if let Some(city) = c.city {
            active.city = Set(city);
        }
        if let Some(address) = c.address {
            active.address = Set(Some(address));
        }
        if let Some(agent_id) = c.agent_id {
            active.agent_id = Set(Some(agent_id));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.db).await?;
        Ok(property_model_to_domain(updated))
    }

    async fn set_status(&self, id: i32, status: PropertyStatus) -> DomainResult<Property> {
        let mut active: property::ActiveModel = self.find_model(id).await?.into();
        active.status = Set(status_to_entity(status));
        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.db).await?;
        info!("Property {} status -> {}", id, status);
        Ok(property_model_to_domain(updated))
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        let result = property::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Property", "id", id));
        }
        info!("Property deleted: {}", id);
        Ok(())
    }
}
