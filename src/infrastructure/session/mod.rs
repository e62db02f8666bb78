//! Conversation session store backends

mod memory;
mod redis;

pub use self::memory::MemorySessionStore;
pub use self::redis::RedisSessionStore;

use std::sync::Arc;

use tracing::info;

use crate::config::{SessionBackend, SessionConfig};
use crate::domain::SessionStore;
use crate::shared::{DomainError, DomainResult};

/// Build the store selected by `[session]` in the config.
pub fn build_session_store(config: &SessionConfig) -> DomainResult<Arc<dyn SessionStore>> {
    match config.backend {
        SessionBackend::Memory => {
            info!("Using in-memory session store");
            Ok(Arc::new(MemorySessionStore::new()))
        }
        SessionBackend::Redis => {
            let url = config.redis_url.as_deref().ok_or_else(|| {
                DomainError::SessionStore("session.redis_url is not set".to_string())
            })?;
            info!(prefix = %config.key_prefix, "Using redis session store");
            Ok(Arc::new(RedisSessionStore::open(url, &config.key_prefix)?))
        }
    }
}
