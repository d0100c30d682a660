use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub agent_id: i64,
    pub kind: String,
    pub related_kind: Option<String>,
    pub related_id: Option<i64>,
    /// Scoped dedup bucket this notification was created for
    pub trigger_bucket: String,
    pub priority: String,
    pub title: String,
    pub message: String,
    /// JSON blob with computed values (days remaining/overdue, amounts)
    pub metadata: Option<String>,
    /// Channel resolved from the agent's preference at creation time
    pub channel: String,
    pub emailed: bool,
    pub batch_id: Option<i64>,
    pub read: bool,
    #[schema(value_type = Option<String>)]
    pub read_at: Option<DateTimeUtc>,
    #[schema(value_type = String)]
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Notification kinds, one per business rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ContractExpiring,
    ContractExpired,
    InvoiceOverdue,
    RentIncreaseDue,
    InvoiceDueSoon,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ContractExpiring => "contract_expiring",
            NotificationKind::ContractExpired => "contract_expired",
            NotificationKind::InvoiceOverdue => "invoice_overdue",
            NotificationKind::RentIncreaseDue => "rent_increase_due",
            NotificationKind::InvoiceDueSoon => "invoice_due_soon",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "contract_expiring" => Some(NotificationKind::ContractExpiring),
            "contract_expired" => Some(NotificationKind::ContractExpired),
            "invoice_overdue" => Some(NotificationKind::InvoiceOverdue),
            "rent_increase_due" => Some(NotificationKind::RentIncreaseDue),
            "invoice_due_soon" => Some(NotificationKind::InvoiceDueSoon),
            _ => None,
        }
    }

    pub fn all() -> Vec<NotificationKind> {
        vec![
            NotificationKind::ContractExpiring,
            NotificationKind::ContractExpired,
            NotificationKind::InvoiceOverdue,
            NotificationKind::RentIncreaseDue,
            NotificationKind::InvoiceDueSoon,
        ]
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Notification priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tagged reference to the entity a notification is about, so
/// consumers can exhaustively handle the known kinds instead of
/// chasing a dynamically-typed foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Contract(i64),
    Invoice(i64),
}

impl EntityRef {
    pub fn kind(&self) -> &'static str {
        match self {
            EntityRef::Contract(_) => "contract",
            EntityRef::Invoice(_) => "invoice",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            EntityRef::Contract(id) | EntityRef::Invoice(id) => *id,
        }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}
