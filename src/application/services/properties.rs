//! Property listings

use std::sync::Arc;

use tracing::info;

use crate::domain::{
    DomainError, DomainResult, NewProperty, Property, PropertyChanges, PropertyFilter,
    PropertyStatus, RepositoryProvider,
};
use crate::shared::{PaginatedResult, PaginationParams};

pub struct PropertyService {
    repos: Arc<dyn RepositoryProvider>,
}

impl PropertyService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Agents referenced by a listing must exist.
    async fn check_agent(&self, agent_id: Option<&str>) -> DomainResult<()> {
        if let Some(id) = agent_id {
            if self.repos.users().find_by_id(id).await?.is_none() {
                return Err(DomainError::Validation(format!("agent '{}' does not exist", id)));
            }
        }
        Ok(())
    }

    pub async fn list(
        &self,
        filter: &PropertyFilter,
        params: &PaginationParams,
    ) -> DomainResult<PaginatedResult<Property>> {
        filter.validate()?;
        self.repos.properties().list(filter, params).await
    }

    pub async fn get(&self, id: i32) -> DomainResult<Property> {
        self.repos
            .properties()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Property", "id", id))
    }

    pub async fn create(&self, property: NewProperty) -> DomainResult<Property> {
        property.validate()?;
        self.check_agent(property.agent_id.as_deref()).await?;

        let created = self.repos.properties().create(property).await?;
        info!(property_id = created.id, title = %created.title, "Property created");
        Ok(created)
    }

    pub async fn update(&self, id: i32, changes: PropertyChanges) -> DomainResult<Property> {
        changes.validate()?;
        self.check_agent(changes.agent_id.as_deref()).await?;
        self.repos.properties().update(id, changes).await
    }

    pub async fn set_status(&self, id: i32, status: PropertyStatus) -> DomainResult<Property> {
        let property = self.repos.properties().set_status(id, status).await?;
        info!(property_id = id, status = %status, "Property status changed");
        Ok(property)
    }

    pub async fn delete(&self, id: i32) -> DomainResult<()> {
        self.repos.properties().delete(id).await?;
        info!(property_id = id, "Property deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::{ListingType, PropertyType};
    use crate::infrastructure::database::repositories::SeaOrmRepositoryProvider;
    use crate::infrastructure::database::test_db;
    use crate::shared::SortOrder;

    async fn service() -> PropertyService {
        PropertyService::new(Arc::new(SeaOrmRepositoryProvider::new(test_db().await)))
    }

    fn listing(title: &str, price: i64) -> NewProperty {
        NewProperty {
            title: title.into(),
            description: None,
            property_type: PropertyType::Apartment,
            listing_type: ListingType::Rent,
            status: PropertyStatus::Available,
            price,
            currency: "EUR".into(),
            bedrooms: Some(1),
            bathrooms: Some(1),
            area_sqm: Some(45),
            city: "Sevilla".into(),
            address: None,
            agent_id: None,
        }
    }

    #[tokio::test]
    async fn invalid_listing_is_rejected() {
        let svc = service().await;
        let err = svc.create(listing("", 900_00)).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let mut unknown_agent = listing("Loft", 900_00);
        unknown_agent.agent_id = Some("ghost".into());
        assert!(svc.create(unknown_agent).await.is_err());
    }

    #[tokio::test]
    async fn inverted_price_range_is_invalid_parameter() {
        let svc = service().await;
        let filter = PropertyFilter {
            min_price: Some(10),
            max_price: Some(5),
            ..Default::default()
        };
        let params = PaginationParams::new(1, 20, "created_at", SortOrder::Desc);
        let err = svc.list(&filter, &params).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn status_change_and_delete() {
        let svc = service().await;
        let created = svc.create(listing("Loft", 900_00)).await.unwrap();

        let rented = svc.set_status(created.id, PropertyStatus::Rented).await.unwrap();
        assert_eq!(rented.status, PropertyStatus::Rented);

        svc.delete(created.id).await.unwrap();
        assert!(matches!(
            svc.get(created.id).await.unwrap_err(),
            DomainError::NotFound { .. }
        ));
    }
}
