use chrono::{Months, NaiveDate};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Read model over the contract store. The notification engine scans
/// these rows and never writes them.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(table_name = "contracts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub agent_id: i64,
    pub property_label: String,
    pub customer_name: String,
    pub status: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    #[schema(value_type = String)]
    pub start_date: Date,
    #[schema(value_type = Option<String>)]
    pub end_date: Option<Date>,
    /// Rental increase clause, if any
    pub increase_frequency: Option<String>,
    /// Date the last increase took effect; None when no increase has
    /// been applied yet
    #[schema(value_type = Option<String>)]
    pub last_increase_date: Option<Date>,
    #[schema(value_type = String)]
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Contract status values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Active,
    Closed,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Active => "active",
            ContractStatus::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How often a rental contract's amount is adjusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncreaseFrequency {
    Monthly,
    Quarterly,
    SemiAnnually,
    Annually,
}

impl IncreaseFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncreaseFrequency::Monthly => "monthly",
            IncreaseFrequency::Quarterly => "quarterly",
            IncreaseFrequency::SemiAnnually => "semi_annually",
            IncreaseFrequency::Annually => "annually",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "monthly" => Some(IncreaseFrequency::Monthly),
            "quarterly" => Some(IncreaseFrequency::Quarterly),
            "semi_annually" => Some(IncreaseFrequency::SemiAnnually),
            "annually" => Some(IncreaseFrequency::Annually),
            _ => None,
        }
    }

    pub fn months(&self) -> u32 {
        match self {
            IncreaseFrequency::Monthly => 1,
            IncreaseFrequency::Quarterly => 3,
            IncreaseFrequency::SemiAnnually => 6,
            IncreaseFrequency::Annually => 12,
        }
    }

    /// One interval past `from`. Day-of-month is clamped to the end of
    /// the target month (Jan 31 + 1 month = Feb 28/29).
    pub fn next_after(&self, from: NaiveDate) -> NaiveDate {
        from + Months::new(self.months())
    }
}

impl std::fmt::Display for IncreaseFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
