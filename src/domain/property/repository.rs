use async_trait::async_trait;

use super::{NewProperty, Property, PropertyChanges, PropertyFilter, PropertyStatus};
use crate::shared::{DomainResult, PaginatedResult, PaginationParams};

#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn create(&self, property: NewProperty) -> DomainResult<Property>;
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Property>>;
    async fn list(
        &self,
        filter: &PropertyFilter,
        params: &PaginationParams,
    ) -> DomainResult<PaginatedResult<Property>>;
    async fn update(&self, id: i32, changes: PropertyChanges) -> DomainResult<Property>;
    async fn set_status(&self, id: i32, status: PropertyStatus) -> DomainResult<Property>;
    async fn delete(&self, id: i32) -> DomainResult<()>;
}
