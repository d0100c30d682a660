//! Migration: Create notifications table

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
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Notifications::AgentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notifications::Kind).string().not_null())
                    .col(ColumnDef::new(Notifications::RelatedKind).string().null())
                    .col(
                        ColumnDef::new(Notifications::RelatedId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Notifications::TriggerBucket)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notifications::Priority)
                            .string()
                            .not_null()
                            .default("normal"),
                    )
                    .col(ColumnDef::new(Notifications::Title).string().not_null())
                    .col(ColumnDef::new(Notifications::Message).string().not_null())
                    .col(ColumnDef::new(Notifications::Metadata).string().null())
                    .col(
                        ColumnDef::new(Notifications::Channel)
                            .string()
                            .not_null()
                            .default("in_app"),
                    )
                    .col(
                        ColumnDef::new(Notifications::Emailed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Notifications::BatchId).big_integer().null())
                    .col(
                        ColumnDef::new(Notifications::Read)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notifications::ReadAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Notifications::Table, Notifications::AgentId)
                            .to(Agents::Table, Agents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_agent_read")
                    .table(Notifications::Table)
                    .col(Notifications::AgentId)
                    .col(Notifications::Read)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_batch")
                    .table(Notifications::Table)
                    .col(Notifications::BatchId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_created")
                    .table(Notifications::Table)
                    .col(Notifications::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(Notifications::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
#[iden = "notifications"]
pub enum Notifications {
    Table,
    Id,
    #[iden = "agent_id"]
    AgentId,
    Kind,
    #[iden = "related_kind"]
    RelatedKind,
    #[iden = "related_id"]
    RelatedId,
    #[iden = "trigger_bucket"]
    TriggerBucket,
    Priority,
    Title,
    Message,
    Metadata,
    Channel,
    Emailed,
    #[iden = "batch_id"]
    BatchId,
    Read,
    #[iden = "read_at"]
    ReadAt,
    #[iden = "created_at"]
    CreatedAt,
}
