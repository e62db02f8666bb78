//! Repository provider port
//!
//! Services take a `RepositoryProvider` and ask it for only the
//! repositories they use.

use super::analytics::AnalyticsRepository;
use super::api_key::ApiKeyRepository;
use super::conversation::ConversationRepository;
use super::property::PropertyRepository;
use super::user::UserRepository;

/// Access to all per-aggregate repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) -> DomainResult<()> {
///     let agent = repos.users().find_by_username("maria").await?;
///     let chat = repos.conversations().find_by_phone("34600111222").await?;
///     Ok(())
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn users(&self) -> &dyn UserRepository;
    fn api_keys(&self) -> &dyn ApiKeyRepository;
    fn properties(&self) -> &dyn PropertyRepository;
    fn conversations(&self) -> &dyn ConversationRepository;
    fn analytics(&self) -> &dyn AnalyticsRepository;
}
