use async_trait::async_trait;
use chrono::Utc;
use log::info;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};

use super::{conflict_or_db, search_term};
use crate::domain::{NewUser, User, UserChanges, UserFilter, UserRepository, UserRole};
use crate::infrastructure::database::entities::user;
use crate::infrastructure::database::listing::{SeaOrmListing, SortColumns};
use crate::shared::{paginate, DomainError, DomainResult, PaginatedResult, PaginationParams};

const SORT_COLUMNS: SortColumns<user::Entity> = &[
    ("username", user::Column::Username),
    ("email", user::Column::Email),
    ("created_at", user::Column::CreatedAt),
    ("last_login_at", user::Column::LastLoginAt),
];

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(&self, id: &str) -> DomainResult<user::Model> {
        user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", id))
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(crate) fn role_to_domain(role: user::UserRole) -> UserRole {
    match role {
        user::UserRole::Admin => UserRole::Admin,
        user::UserRole::Agent => UserRole::Agent,
    }
}

fn role_to_entity(role: UserRole) -> user::UserRole {
    match role {
        UserRole::Admin => user::UserRole::Admin,
        UserRole::Agent => user::UserRole::Agent,
    }
}

pub(crate) fn user_model_to_domain(model: user::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        full_name: model.full_name,
        phone: model.phone,
        password_hash: model.password_hash,
        role: role_to_domain(model.role),
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
        last_login_at: model.last_login_at,
    }
}

fn filter_condition(filter: &UserFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(search) = search_term(&filter.search) {
        cond = cond.add(
            Condition::any()
                .add(user::Column::Username.contains(search))
                .add(user::Column::Email.contains(search))
                .add(user::Column::FullName.contains(search)),
        );
    }
    if let Some(role) = filter.role {
        cond = cond.add(user::Column::Role.eq(role_to_entity(role)));
    }
    if let Some(is_active) = filter.is_active {
        cond = cond.add(user::Column::IsActive.eq(is_active));
    }
    cond
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn create(&self, new_user: NewUser) -> DomainResult<User> {
        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            username: Set(new_user.username),
            email: Set(new_user.email),
            full_name: Set(new_user.full_name),
            phone: Set(new_user.phone),
            password_hash: Set(new_user.password_hash),
            role: Set(role_to_entity(new_user.role)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            last_login_at: Set(None),
        }
        .insert(&self.db)
        .await
        .map_err(|e| conflict_or_db(e, "Username or email already exists"))?;

        info!("User created: {} ({})", model.username, model.id);
        Ok(user_model_to_domain(model))
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(user_model_to_domain))
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?;
        Ok(model.map(user_model_to_domain))
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(model.map(user_model_to_domain))
    }

    async fn list(
        &self,
        filter: &UserFilter,
        params: &PaginationParams,
    ) -> DomainResult<PaginatedResult<User>> {
        let listing = SeaOrmListing::<user::Entity>::new(&self.db, SORT_COLUMNS);
        let page = paginate::<_, _, user::Model>(&listing, &filter_condition(filter), &(), params)
            .await?;
        Ok(page.map(user_model_to_domain))
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(user::Entity::find().count(&self.db).await?)
    }

    async fn update(&self, id: &str, changes: UserChanges) -> DomainResult<User> {
        let mut active: user::ActiveModel = self.find_model(id).await?.into();

        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(full_name) = changes.full_name {
            active.full_name = Set(Some(full_name));
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(role) = changes.role {
            active.role = Set(role_to_entity(role));
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| conflict_or_db(e, "Email already exists"))?;
        Ok(user_model_to_domain(updated))
    }

    async fn update_password(&self, id: &str, password_hash: &str) -> DomainResult<()> {
        let mut active: user::ActiveModel = self.find_model(id).await?.into();
        active.password_hash = Set(password_hash.to_string());
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await?;
        Ok(())
    }

    async fn touch_last_login(&self, id: &str) -> DomainResult<()> {
        let mut active: user::ActiveModel = self.find_model(id).await?.into();
        active.last_login_at = Set(Some(Utc::now()));
        active.update(&self.db).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let result = user::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("User", "id", id));
        }
        info!("User deleted: {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::test_db;
    use crate::shared::SortOrder;

    fn new_user(username: &str, role: UserRole) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            full_name: None,
            phone: None,
            password_hash: "hash".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn create_and_find() {
        let repo = SeaOrmUserRepository::new(test_db().await);
        let created = repo.create(new_user("maria", UserRole::Agent)).await.unwrap();

        let by_name = repo.find_by_username("maria").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
        assert!(by_name.is_active);

        let by_email = repo.find_by_email("maria@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_username_is_conflict() {
        let repo = SeaOrmUserRepository::new(test_db().await);
        repo.create(new_user("maria", UserRole::Agent)).await.unwrap();

        let mut dup = new_user("maria", UserRole::Agent);
        dup.email = "other@example.com".into();
        let err = repo.create(dup).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_filters_and_sorts() {
        let repo = SeaOrmUserRepository::new(test_db().await);
        for name in ["carla", "alba", "bruno"] {
            repo.create(new_user(name, UserRole::Agent)).await.unwrap();
        }
        repo.create(new_user("zadmin", UserRole::Admin)).await.unwrap();

        let filter = UserFilter {
            role: Some(UserRole::Agent),
            ..Default::default()
        };
        let params = PaginationParams::new(1, 2, "username", SortOrder::Asc);
        let page = repo.list(&filter, &params).await.unwrap();

        let names: Vec<_> = page.items.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alba", "bruno"]);
        assert_eq!(page.pagination.total, 3);
        assert!(page.pagination.has_more);

        let search = UserFilter {
            search: Some("run".into()),
            ..Default::default()
        };
        let page = repo.list(&search, &params).await.unwrap();
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.items[0].username, "bruno");
    }

    #[tokio::test]
    async fn list_rejects_password_hash_sort() {
        let repo = SeaOrmUserRepository::new(test_db().await);
        let params = PaginationParams::new(1, 10, "password_hash", SortOrder::Asc);
        let err = repo.list(&UserFilter::default(), &params).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn update_and_delete() {
        let repo = SeaOrmUserRepository::new(test_db().await);
        let user = repo.create(new_user("maria", UserRole::Agent)).await.unwrap();

        let changes = UserChanges {
            full_name: Some("Maria Lopez".into()),
            is_active: Some(false),
            ..Default::default()
        };
        let updated = repo.update(&user.id, changes).await.unwrap();
        assert_eq!(updated.full_name.as_deref(), Some("Maria Lopez"));
        assert!(!updated.is_active);

        repo.delete(&user.id).await.unwrap();
        assert!(repo.find_by_id(&user.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&user.id).await.unwrap_err(),
            DomainError::NotFound { .. }
        ));
    }
}
