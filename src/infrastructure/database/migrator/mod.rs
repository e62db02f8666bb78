//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users;
mod m20250101_000002_create_api_keys;
mod m20250101_000003_create_properties;
mod m20250101_000004_create_conversations;
mod m20250101_000005_create_messages;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users::Migration),
            Box::new(m20250101_000002_create_api_keys::Migration),
            Box::new(m20250101_000003_create_properties::Migration),
            Box::new(m20250101_000004_create_conversations::Migration),
            Box::new(m20250101_000005_create_messages::Migration),
        ]
    }
}
