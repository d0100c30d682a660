//! Notification deduplication log.
//!
//! The guard is the storage layer's unique index on
//! (kind, related_kind, related_id, trigger_bucket): `record` is an
//! insert-or-conflict, so two overlapping runs (scheduled + manual,
//! or two worker processes) racing on the same key get exactly one
//! winner without any in-process locking. A conflict is the expected
//! "already notified" signal, not an error.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TryInsertResult};

use crate::error::Result;
use crate::models::notification::{EntityRef, NotificationKind};
use crate::models::notification_log;

pub struct DedupLog;

impl DedupLog {
    /// Whether this exact (kind, entity, bucket) alert was already
    /// issued. Advisory only; `record` remains the authoritative
    /// check-and-act.
    pub async fn has_notified<C: ConnectionTrait>(
        conn: &C,
        kind: NotificationKind,
        entity: EntityRef,
        bucket_key: &str,
    ) -> Result<bool> {
        let count = notification_log::Entity::find()
            .filter(notification_log::Column::Kind.eq(kind.as_str()))
            .filter(notification_log::Column::RelatedKind.eq(entity.kind()))
            .filter(notification_log::Column::RelatedId.eq(entity.id()))
            .filter(notification_log::Column::TriggerBucket.eq(bucket_key))
            .count(conn)
            .await?;

        Ok(count > 0)
    }

    /// Record that this alert was issued. Returns false when the key
    /// already existed (someone else won the race, or a previous run
    /// already notified).
    pub async fn record<C: ConnectionTrait>(
        conn: &C,
        kind: NotificationKind,
        entity: EntityRef,
        bucket_key: &str,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let log = notification_log::ActiveModel {
            kind: Set(kind.as_str().to_string()),
            related_kind: Set(entity.kind().to_string()),
            related_id: Set(entity.id()),
            trigger_bucket: Set(bucket_key.to_string()),
            created_at: Set(at),
            ..Default::default()
        };

        let result = notification_log::Entity::insert(log)
            .on_conflict(
                OnConflict::columns([
                    notification_log::Column::Kind,
                    notification_log::Column::RelatedKind,
                    notification_log::Column::RelatedId,
                    notification_log::Column::TriggerBucket,
                ])
                .do_nothing()
                .to_owned(),
            )
            .do_nothing()
            .exec(conn)
            .await?;

        Ok(matches!(result, TryInsertResult::Inserted(_)))
    }
}
