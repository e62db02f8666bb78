//! Database entities module

pub mod api_key;
pub mod conversation;
pub mod message;
pub mod property;
pub mod user;

pub use api_key::Entity as ApiKey;
pub use conversation::Entity as Conversation;
pub use message::Entity as Message;
pub use property::Entity as Property;
pub use user::Entity as User;
