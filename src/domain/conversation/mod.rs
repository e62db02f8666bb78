//! Customer conversations held by the WhatsApp assistant
//!
//! A conversation is `active` while the assistant answers, `escalated`
//! while a human agent has taken over, and `closed` once finished. An
//! inbound message reopens a closed conversation.

pub mod model;
pub mod repository;

pub use model::{
    AppendedMessage, Conversation, ConversationFilter, ConversationInclude, ConversationStatus,
    ConversationView, Message, MessageDirection, MessageSender, NewMessage, StatusChange,
};
pub use repository::ConversationRepository;
