//! Integration API key management

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::{ApiKey, DomainError, DomainResult, NewApiKey, RepositoryProvider, KNOWN_SCOPES};
use crate::infrastructure::crypto::api_key::{generate_api_key, hash_api_key};

/// A new key together with its secret, which is never retrievable again
#[derive(Debug, Clone)]
pub struct CreatedApiKey {
    pub api_key: ApiKey,
    pub key: String,
}

pub struct ApiKeyService {
    repos: Arc<dyn RepositoryProvider>,
}

impl ApiKeyService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn create(
        &self,
        name: &str,
        scopes: Vec<String>,
        created_by: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> DomainResult<CreatedApiKey> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation("API key name must not be empty".into()));
        }
        if scopes.is_empty() {
            return Err(DomainError::Validation("At least one scope is required".into()));
        }
        if let Some(unknown) = scopes.iter().find(|s| !KNOWN_SCOPES.contains(&s.as_str())) {
            return Err(DomainError::Validation(format!(
                "unknown scope '{}', expected one of {}",
                unknown,
                KNOWN_SCOPES.join(", ")
            )));
        }
        if matches!(expires_at, Some(at) if at <= Utc::now()) {
            return Err(DomainError::Validation("expires_at must be in the future".into()));
        }

        let generated = generate_api_key(name);
        let api_key = self
            .repos
            .api_keys()
            .create(NewApiKey {
                name: name.to_string(),
                prefix: generated.prefix,
                key_hash: generated.key_hash,
                created_by,
                scopes,
                expires_at,
            })
            .await?;

        info!(key_id = %api_key.id, name = %api_key.name, scopes = ?api_key.scopes, "API key created");
        Ok(CreatedApiKey {
            api_key,
            key: generated.key,
        })
    }

    pub async fn list(&self) -> DomainResult<Vec<ApiKey>> {
        self.repos.api_keys().list().await
    }

    pub async fn revoke(&self, id: &str) -> DomainResult<()> {
        self.repos.api_keys().revoke(id).await?;
        info!(key_id = id, "API key revoked");
        Ok(())
    }

    /// Resolve a presented key to a usable stored key.
    pub async fn authenticate(&self, raw_key: &str) -> DomainResult<ApiKey> {
        let keys = self.repos.api_keys();
        let Some(api_key) = keys.find_by_hash(&hash_api_key(raw_key)).await? else {
            return Err(DomainError::Unauthorized("Invalid API key".into()));
        };

        if !api_key.is_usable(Utc::now()) {
            warn!(key_id = %api_key.id, "Revoked or expired API key presented");
            return Err(DomainError::Unauthorized("API key is revoked or expired".into()));
        }

        keys.touch_last_used(&api_key.id).await?;
        Ok(api_key)
    }
}
