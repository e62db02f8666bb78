//! Assistant-side conversation session
//!
//! The WhatsApp assistant keeps one JSON document per customer in the
//! session store. The admin service only touches the fields it owns
//! (`state`, `escalation`, `updated_at`) and writes every other field back
//! as it found it.

pub mod model;
pub mod store;

pub use model::{ConversationSession, Escalation, SessionState};
pub use store::SessionStore;
