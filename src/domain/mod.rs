//! Domain layer: entities, state rules and repository ports

/// String-backed enum with `as_str`, `Display`, `FromStr` and `ALL`.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident => $value:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name { $($(#[$vmeta])* $variant),+ }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self { $($name::$variant => $value),+ }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::shared::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    other => Err($crate::shared::DomainError::Validation(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

pub mod analytics;
pub mod api_key;
pub mod conversation;
pub mod property;
pub mod repositories;
pub mod session;
pub mod user;

pub use analytics::{AnalyticsRepository, DailyActivity, Summary};
pub use api_key::{
    ApiKey, ApiKeyRepository, NewApiKey, KNOWN_SCOPES, SCOPE_ADMIN, SCOPE_INGEST, SCOPE_READ,
};
pub use conversation::{
    AppendedMessage, Conversation, ConversationFilter, ConversationInclude,
    ConversationRepository, ConversationStatus, ConversationView, Message, MessageDirection,
    MessageSender, NewMessage, StatusChange,
};
pub use property::{
    ListingType, NewProperty, Property, PropertyChanges, PropertyFilter, PropertyRepository,
    PropertyStatus, PropertyType,
};
pub use repositories::RepositoryProvider;
pub use session::{ConversationSession, Escalation, SessionState, SessionStore};
pub use user::{NewUser, User, UserChanges, UserFilter, UserRepository, UserRole};

pub use crate::shared::{DomainError, DomainResult};
