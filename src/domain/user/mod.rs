//! Agent accounts
//!
//! Admins manage agents; both log in to the portal.

pub mod model;
pub mod repository;

pub use model::{NewUser, User, UserChanges, UserFilter, UserRole};
pub use repository::UserRepository;
