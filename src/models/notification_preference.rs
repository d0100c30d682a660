use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-agent, per-kind notification preference. Absence of a row means
/// the default: enabled, in-app only, delivered immediately.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(table_name = "notification_preferences")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub agent_id: i64,
    pub kind: String,
    pub enabled: bool,
    pub channel: String,
    /// false = hold email delivery for the digest batch run
    pub immediate: bool,
    #[schema(value_type = String)]
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
