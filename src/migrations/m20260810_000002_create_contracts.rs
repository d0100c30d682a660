//! Migration: Create contracts read model

use sea_orm_migration::prelude::*;

use super::m20260810_000001_create_agents::Agents;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Contracts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contracts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contracts::AgentId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Contracts::PropertyLabel)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Contracts::CustomerName).string().not_null())
                    .col(
                        ColumnDef::new(Contracts::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Contracts::Amount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Contracts::StartDate).date().not_null())
                    .col(ColumnDef::new(Contracts::EndDate).date().null())
                    .col(
                        ColumnDef::new(Contracts::IncreaseFrequency)
                            .string()
                            .null(),
                    )
                    .col(ColumnDef::new(Contracts::LastIncreaseDate).date().null())
                    .col(
                        ColumnDef::new(Contracts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Contracts::Table, Contracts::AgentId)
                            .to(Agents::Table, Agents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contracts_status_end_date")
                    .table(Contracts::Table)
                    .col(Contracts::Status)
                    .col(Contracts::EndDate)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Contracts::Table).if_exists().to_owned())
            .await
    }
}

#[derive(Iden)]
#[iden = "contracts"]
pub enum Contracts {
    Table,
    Id,
    #[iden = "agent_id"]
    AgentId,
    #[iden = "property_label"]
    PropertyLabel,
    #[iden = "customer_name"]
    CustomerName,
    Status,
    Amount,
    #[iden = "start_date"]
    StartDate,
    #[iden = "end_date"]
    EndDate,
    #[iden = "increase_frequency"]
    IncreaseFrequency,
    #[iden = "last_increase_date"]
    LastIncreaseDate,
    #[iden = "created_at"]
    CreatedAt,
}
