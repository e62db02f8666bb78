//! API key DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::CreatedApiKey;
use crate::domain::ApiKey;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "WhatsApp assistant",
    "scopes": ["ingest"],
    "expires_in_days": 365
}))]
pub struct CreateApiKeyRequest {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    /// Any of `ingest`, `read`, `admin`
    #[validate(length(min = 1, message = "at least one scope is required"))]
    pub scopes: Vec<String>,
    #[validate(range(min = 1, max = 3650))]
    pub expires_in_days: Option<i64>,
}

/// Stored key metadata; the secret itself is never returned again
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiKeyResponse {
    pub id: String,
    pub name: String,
    pub prefix: String,
    pub scopes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl From<ApiKey> for ApiKeyResponse {
    fn from(k: ApiKey) -> Self {
        let is_active = !k.is_revoked();
        Self {
            id: k.id,
            name: k.name,
            prefix: k.prefix,
            scopes: k.scopes,
            created_by: k.created_by,
            is_active,
            created_at: k.created_at,
            expires_at: k.expires_at,
            last_used_at: k.last_used_at,
            revoked_at: k.revoked_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedApiKeyResponse {
    /// Full key; shown only in this response
    pub key: String,
    pub api_key: ApiKeyResponse,
}

impl From<CreatedApiKey> for CreatedApiKeyResponse {
    fn from(created: CreatedApiKey) -> Self {
        Self {
            key: created.key,
            api_key: created.api_key.into(),
        }
    }
}
