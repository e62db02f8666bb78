use chrono::{DateTime, Utc};

/// Record inbound/outbound WhatsApp messages
pub const SCOPE_INGEST: &str = "ingest";
/// Read-only access to the admin API
pub const SCOPE_READ: &str = "read";
/// Full admin API access
pub const SCOPE_ADMIN: &str = "admin";

pub const KNOWN_SCOPES: &[&str] = &[SCOPE_INGEST, SCOPE_READ, SCOPE_ADMIN];

/// Stored API key; the secret itself is never kept, only its hash
#[derive(Debug, Clone)]
pub struct ApiKey {
    pub id: String,
    pub name: String,
    /// Display prefix, e.g. `rlty_whatsapp-bot_a1b2c3d4...`
    pub prefix: String,
    pub key_hash: String,
    /// Agent who issued the key
    pub created_by: Option<String>,
    pub scopes: Vec<String>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Not revoked and not past its expiry
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && self.expires_at.map_or(true, |exp| exp > now)
    }

    /// `admin` implies every other scope
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope || s == SCOPE_ADMIN)
    }
}

#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub name: String,
    pub prefix: String,
    pub key_hash: String,
    pub created_by: Option<String>,
    pub scopes: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn key(scopes: &[&str]) -> ApiKey {
        ApiKey {
            id: "k-1".into(),
            name: "bot".into(),
            prefix: "rlty_bot_abcd1234...".into(),
            key_hash: "hash".into(),
            created_by: None,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            revoked_at: None,
            created_at: Utc::now(),
            expires_at: None,
            last_used_at: None,
        }
    }

    #[test]
    fn admin_scope_implies_others() {
        assert!(key(&[SCOPE_ADMIN]).has_scope(SCOPE_INGEST));
        assert!(key(&[SCOPE_INGEST]).has_scope(SCOPE_INGEST));
        assert!(!key(&[SCOPE_READ]).has_scope(SCOPE_INGEST));
    }

    #[test]
    fn expired_or_revoked_keys_are_unusable() {
        let now = Utc::now();
        let mut k = key(&[SCOPE_INGEST]);
        assert!(k.is_usable(now));

        k.expires_at = Some(now - Duration::minutes(1));
        assert!(!k.is_usable(now));

        k.expires_at = Some(now + Duration::days(1));
        k.revoked_at = Some(now);
        assert!(!k.is_usable(now));
    }
}
