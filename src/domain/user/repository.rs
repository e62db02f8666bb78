use async_trait::async_trait;

use super::{NewUser, User, UserChanges, UserFilter};
use crate::shared::{DomainResult, PaginatedResult, PaginationParams};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> DomainResult<User>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>>;
    async fn list(
        &self,
        filter: &UserFilter,
        params: &PaginationParams,
    ) -> DomainResult<PaginatedResult<User>>;
    async fn count(&self) -> DomainResult<u64>;

    async fn update(&self, id: &str, changes: UserChanges) -> DomainResult<User>;
    async fn update_password(&self, id: &str, password_hash: &str) -> DomainResult<()>;
    async fn touch_last_login(&self, id: &str) -> DomainResult<()>;
    async fn delete(&self, id: &str) -> DomainResult<()>;
}
