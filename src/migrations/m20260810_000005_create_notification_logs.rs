//! Migration: Create notification_logs table
//!
//! The unique index is the concurrency guard for notification
//! deduplication: concurrent runs race on insert and exactly one wins.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NotificationLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NotificationLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(NotificationLogs::Kind).string().not_null())
                    .col(
                        ColumnDef::new(NotificationLogs::RelatedKind)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NotificationLogs::RelatedId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NotificationLogs::TriggerBucket)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(NotificationLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_notification_logs_dedup_key")
                    .table(NotificationLogs::Table)
                    .col(NotificationLogs::Kind)
                    .col(NotificationLogs::RelatedKind)
                    .col(NotificationLogs::RelatedId)
                    .col(NotificationLogs::TriggerBucket)
                    .unique()
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
                    .table(NotificationLogs::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
#[iden = "notification_logs"]
pub enum NotificationLogs {
    Table,
    Id,
    Kind,
    #[iden = "related_kind"]
    RelatedKind,
    #[iden = "related_id"]
    RelatedId,
    #[iden = "trigger_bucket"]
    TriggerBucket,
    #[iden = "created_at"]
    CreatedAt,
}
