//! HTTP REST API
//!
//! - `common`: response envelope, error mapping, query and body extractors
//! - `middleware`: authentication (JWT + API key) and permission guards
//! - `modules`: DTOs and handlers per resource
//! - `router`: route table, shared context and Swagger documentation

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiContext, ApiDoc};
