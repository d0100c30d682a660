use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Read model over the invoicing store. Scanned by the due-soon and
/// overdue checkers; never written by the notification engine.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub number: String,
    /// Invoices raised outside a contract have no agent to notify
    pub contract_id: Option<i64>,
    pub customer_name: String,
    #[schema(value_type = String)]
    pub amount_total: Decimal,
    #[schema(value_type = String)]
    pub amount_paid: Decimal,
    pub status: String,
    #[schema(value_type = String)]
    pub due_date: Date,
    #[schema(value_type = String)]
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn balance(&self) -> Decimal {
        self.amount_total - self.amount_paid
    }
}

/// Invoice lifecycle states. Only validated and sent invoices are
/// eligible for reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Validated,
    Sent,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Validated => "validated",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    /// States in which reminder notifications apply
    pub fn open_states() -> [&'static str; 2] {
        [InvoiceStatus::Validated.as_str(), InvoiceStatus::Sent.as_str()]
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
