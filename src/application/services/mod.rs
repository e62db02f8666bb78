//! Application services

mod analytics;
mod api_keys;
mod conversations;
mod properties;

pub use analytics::AnalyticsService;
pub use api_keys::{ApiKeyService, CreatedApiKey};
pub use conversations::{ConversationService, IngestMessage, IngestOutcome};
pub use properties::PropertyService;
