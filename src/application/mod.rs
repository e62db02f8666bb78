//! Application layer: use-case services called by the HTTP handlers and CLI

pub mod identity;
pub mod services;

pub use identity::{AuthResult, IdentityService, NewAgent};
pub use services::{
    AnalyticsService, ApiKeyService, ConversationService, CreatedApiKey, IngestMessage,
    IngestOutcome, PropertyService,
};
