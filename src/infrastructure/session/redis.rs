use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{cmd, AsyncCommands, Client, RedisError};
use tracing::debug;

use crate::domain::{ConversationSession, SessionStore};
use crate::shared::{DomainError, DomainResult};

/// Sessions shared with the WhatsApp assistant through redis.
///
/// One JSON document per phone under `<prefix><phone>`. Writes keep the
/// key's TTL so the assistant's own expiry still applies.
pub struct RedisSessionStore {
    client: Client,
    key_prefix: String,
}

fn store_error(e: RedisError) -> DomainError {
    DomainError::SessionStore(e.to_string())
}

impl RedisSessionStore {
    pub fn open(url: &str, key_prefix: &str) -> DomainResult<Self> {
        let client = Client::open(url).map_err(store_error)?;
        Ok(Self {
            client,
            key_prefix: key_prefix.to_string(),
        })
    }

    fn key(&self, phone: &str) -> String {
        format!("{}{}", self.key_prefix, phone)
    }

    async fn connection(&self) -> DomainResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(store_error)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, phone: &str) -> DomainResult<Option<ConversationSession>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(self.key(phone)).await.map_err(store_error)?;
        raw.as_deref().map(ConversationSession::from_json).transpose()
    }

    async fn put(&self, session: &ConversationSession) -> DomainResult<()> {
        let key = self.key(&session.phone);
        let raw = session.to_json()?;
        let mut conn = self.connection().await?;
        cmd("SET")
            .arg(&key)
            .arg(raw)
            .arg("KEEPTTL")
            .query_async::<()>(&mut conn)
            .await
            .map_err(store_error)?;
        debug!(%key, state = session.state().as_str(), "Session written");
        Ok(())
    }

    async fn ping(&self) -> DomainResult<()> {
        let mut conn = self.connection().await?;
        cmd("PING").query_async::<()>(&mut conn).await.map_err(store_error)
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_use_configured_prefix() {
        let store = RedisSessionStore::open("redis://127.0.0.1:6379/0", "wa:session:").unwrap();
        assert_eq!(store.key("34600111222"), "wa:session:34600111222");
    }

    #[test]
    fn malformed_url_is_rejected() {
        assert!(RedisSessionStore::open("not a url", "session:").is_err());
    }
}
