use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::conflict_or_db;
use crate::domain::{ApiKey, ApiKeyRepository, NewApiKey};
use crate::infrastructure::database::entities::api_key;
use crate::shared::{DomainError, DomainResult};

pub struct SeaOrmApiKeyRepository {
    db: DatabaseConnection,
}

impl SeaOrmApiKeyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn key_model_to_domain(model: api_key::Model) -> ApiKey {
    let scopes = serde_json::from_str(&model.scopes).unwrap_or_else(|e| {
        warn!("API key {} has unreadable scopes: {}", model.id, e);
        Vec::new()
    });
    ApiKey {
        id: model.id,
        name: model.name,
        prefix: model.prefix,
        key_hash: model.key_hash,
        created_by: model.created_by,
        scopes,
        revoked_at: model.revoked_at,
        created_at: model.created_at,
        expires_at: model.expires_at,
        last_used_at: model.last_used_at,
    }
}

#[async_trait]
impl ApiKeyRepository for SeaOrmApiKeyRepository {
    async fn create(&self, key: NewApiKey) -> DomainResult<ApiKey> {
        let scopes = serde_json::to_string(&key.scopes)
            .map_err(|e| DomainError::Validation(format!("invalid scopes: {}", e)))?;

        let model = api_key::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            name: Set(key.name),
            prefix: Set(key.prefix),
            key_hash: Set(key.key_hash),
            created_by: Set(key.created_by),
            scopes: Set(scopes),
            revoked_at: Set(None),
            created_at: Set(Utc::now()),
            expires_at: Set(key.expires_at),
            last_used_at: Set(None),
        }
        .insert(&self.db)
        .await
        .map_err(|e| conflict_or_db(e, "API key already exists"))?;

        info!("API key created: {} ({})", model.name, model.prefix);
        Ok(key_model_to_domain(model))
    }

    async fn find_by_hash(&self, key_hash: &str) -> DomainResult<Option<ApiKey>> {
        let model = api_key::Entity::find()
            .filter(api_key::Column::KeyHash.eq(key_hash))
            .one(&self.db)
            .await?;
        Ok(model.map(key_model_to_domain))
    }

    async fn list(&self) -> DomainResult<Vec<ApiKey>> {
        let models = api_key::Entity::find()
            .order_by_desc(api_key::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(key_model_to_domain).collect())
    }

    async fn revoke(&self, id: &str) -> DomainResult<()> {
        let model = api_key::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("ApiKey", "id", id))?;

        // Keep the first revocation time
        if model.revoked_at.is_some() {
            return Ok(());
        }
        let mut active: api_key::ActiveModel = model.into();
        active.revoked_at = Set(Some(Utc::now()));
        active.update(&self.db).await?;
        info!("API key revoked: {}", id);
        Ok(())
    }

    async fn touch_last_used(&self, id: &str) -> DomainResult<()> {
        api_key::Entity::update_many()
            .col_expr(
                api_key::Column::LastUsedAt,
                sea_orm::sea_query::Expr::value(Some(Utc::now())),
            )
            .filter(api_key::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
