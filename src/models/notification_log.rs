use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Deduplication record: "this exact alert was already issued."
///
/// Uniqueness on (kind, related_kind, related_id, trigger_bucket) is
/// enforced by the storage layer; rows are inserted once per bucket
/// crossing and never updated.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub kind: String,
    pub related_kind: String,
    pub related_id: i64,
    pub trigger_bucket: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
