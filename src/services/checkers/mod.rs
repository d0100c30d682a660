//! Rule checkers: stateless evaluators that scan the contract and
//! invoice read models for a given `as_of` date and report matches.
//!
//! Checkers never write anything. Each match carries the trigger
//! bucket it crossed plus the computed metadata the notification
//! service needs to compose a message; deduplication happens later,
//! keyed on (kind, entity, bucket key).

mod contract_expiration;
mod invoice_due_soon;
mod invoice_overdue;
mod rent_increase;

pub use contract_expiration::ContractExpirationChecker;
pub use invoice_due_soon::InvoiceDueSoonChecker;
pub use invoice_overdue::InvoiceOverdueChecker;
pub use rent_increase::RentIncreaseChecker;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::notification::{EntityRef, NotificationKind, Priority};

/// A discrete threshold crossing detected by a checker. Distinct
/// buckets for the same entity dedup independently, which is what
/// allows severity escalation to re-notify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerBucket {
    ExpiresIn30Days,
    ExpiresIn7Days,
    Expired,
    Overdue,
    OverdueUrgent,
    OverdueCritical,
    IncreaseDueIn7Days,
    IncreaseOverdue,
    DueIn7Days,
    DueIn3Days,
}

impl TriggerBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerBucket::ExpiresIn30Days => "expires_in_30_days",
            TriggerBucket::ExpiresIn7Days => "expires_in_7_days",
            TriggerBucket::Expired => "expired",
            TriggerBucket::Overdue => "overdue",
            TriggerBucket::OverdueUrgent => "overdue_urgent",
            TriggerBucket::OverdueCritical => "overdue_critical",
            TriggerBucket::IncreaseDueIn7Days => "increase_due_in_7_days",
            TriggerBucket::IncreaseOverdue => "increase_overdue",
            TriggerBucket::DueIn7Days => "due_in_7_days",
            TriggerBucket::DueIn3Days => "due_in_3_days",
        }
    }

    /// The notification kind this bucket belongs to
    pub fn kind(&self) -> NotificationKind {
        match self {
            TriggerBucket::ExpiresIn30Days | TriggerBucket::ExpiresIn7Days => {
                NotificationKind::ContractExpiring
            }
            TriggerBucket::Expired => NotificationKind::ContractExpired,
            TriggerBucket::Overdue
            | TriggerBucket::OverdueUrgent
            | TriggerBucket::OverdueCritical => NotificationKind::InvoiceOverdue,
            TriggerBucket::IncreaseDueIn7Days | TriggerBucket::IncreaseOverdue => {
                NotificationKind::RentIncreaseDue
            }
            TriggerBucket::DueIn7Days | TriggerBucket::DueIn3Days => {
                NotificationKind::InvoiceDueSoon
            }
        }
    }

    pub fn priority(&self) -> Priority {
        match self {
            TriggerBucket::DueIn7Days => Priority::Low,
            TriggerBucket::ExpiresIn30Days
            | TriggerBucket::Overdue
            | TriggerBucket::IncreaseDueIn7Days
            | TriggerBucket::DueIn3Days => Priority::Normal,
            TriggerBucket::ExpiresIn7Days
            | TriggerBucket::OverdueUrgent
            | TriggerBucket::IncreaseOverdue => Priority::High,
            TriggerBucket::Expired | TriggerBucket::OverdueCritical => Priority::Urgent,
        }
    }
}

impl std::fmt::Display for TriggerBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Values computed during the scan, persisted as the notification's
/// metadata and interpolated into its message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchMetadata {
    /// Days until the trigger date; negative once past it
    pub days: i64,
    /// Outstanding balance (invoices) or current rent (contracts)
    pub amount: Option<Decimal>,
    /// Invoice number or property label
    pub reference: String,
    pub customer: String,
    /// The date the rule fired on (end date, due date, or computed
    /// next increase date)
    pub date: NaiveDate,
}

/// One entity crossing one trigger bucket
#[derive(Debug, Clone)]
pub struct Match {
    pub agent_id: i64,
    pub entity: EntityRef,
    pub bucket: TriggerBucket,
    /// Dedup key: the bucket name, scoped by the cycle date where the
    /// rule recurs (contract renewals, rent increase periods)
    pub bucket_key: String,
    pub metadata: MatchMetadata,
}

impl Match {
    pub fn kind(&self) -> NotificationKind {
        self.bucket.kind()
    }

    pub fn priority(&self) -> Priority {
        self.bucket.priority()
    }
}

/// A record the checker could not evaluate and stepped over
#[derive(Debug, Clone)]
pub struct Skip {
    pub entity: EntityRef,
    pub reason: String,
}

/// Outcome of one checker pass
#[derive(Debug, Default)]
pub struct Scan {
    pub matches: Vec<Match>,
    pub skipped: Vec<Skip>,
}
