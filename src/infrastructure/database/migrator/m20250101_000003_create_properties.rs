//! Create properties table

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Properties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Properties::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Properties::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Properties::Description).text().null())
                    .col(ColumnDef::new(Properties::PropertyType).string_len(20).not_null())
                    .col(ColumnDef::new(Properties::ListingType).string_len(10).not_null())
                    .col(
                        ColumnDef::new(Properties::Status)
                            .string_len(20)
                            .not_null()
                            .default("available"),
                    )
                    .col(ColumnDef::new(Properties::Price).big_integer().not_null())
                    .col(
                        ColumnDef::new(Properties::Currency)
                            .string_len(3)
                            .not_null()
                            .default("EUR"),
                    )
                    .col(ColumnDef::new(Properties::Bedrooms).integer().null())
                    .col(ColumnDef::new(Properties::Bathrooms).integer().null())
                    .col(ColumnDef::new(Properties::AreaSqm).integer().null())
                    .col(ColumnDef::new(Properties::City).string_len(100).not_null())
                    .col(ColumnDef::new(Properties::Address).string_len(255).null())
                    .col(ColumnDef::new(Properties::AgentId).string().null())
                    .col(
                        ColumnDef::new(Properties::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Properties::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_properties_agent_id")
                            .from(Properties::Table, Properties::AgentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_properties_status")
                    .table(Properties::Table)
                    .col(Properties::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_properties_city")
                    .table(Properties::Table)
                    .col(Properties::City)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Properties::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Properties {
    Table,
    Id,
    Title,
    Description,
    PropertyType,
    ListingType,
    Status,
    Price,
    Currency,
    Bedrooms,
    Bathrooms,
    AreaSqm,
    City,
    Address,
    AgentId,
    CreatedAt,
    UpdatedAt,
}
