use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::error::Result;
use crate::models::contract::{self, ContractStatus, IncreaseFrequency};
use crate::models::notification::EntityRef;

use super::{Match, MatchMetadata, Scan, Skip, TriggerBucket};

/// Detects rental contracts whose periodic increase is due within a
/// week or already overdue.
///
/// The next increase date is never stored: it is one interval past the
/// last applied increase (or past the start date when none has been
/// applied). Once the back office applies an increase and
/// `last_increase_date` moves, the recurrence yields the following
/// cycle, and the cycle date inside the bucket key lets each
/// occurrence notify exactly once.
pub struct RentIncreaseChecker;

impl RentIncreaseChecker {
    pub async fn find_matches(&self, db: &DatabaseConnection, as_of: NaiveDate) -> Result<Scan> {
        let contracts = contract::Entity::find()
            .filter(contract::Column::Status.eq(ContractStatus::Active.as_str()))
            .filter(contract::Column::IncreaseFrequency.is_not_null())
            .all(db)
            .await?;

        let mut scan = Scan::default();

        for c in contracts {
            let entity = EntityRef::Contract(c.id);

            let Some(raw) = c.increase_frequency.as_deref() else {
                continue;
            };
            let Some(frequency) = IncreaseFrequency::parse(raw) else {
                scan.skipped.push(Skip {
                    entity,
                    reason: format!("unknown increase frequency {:?}", raw),
                });
                continue;
            };

            let next_increase = Self::next_increase_date(&c, frequency);
            let days = (next_increase - as_of).num_days();
            let bucket = if days < 0 {
                TriggerBucket::IncreaseOverdue
            } else if days <= 7 {
                TriggerBucket::IncreaseDueIn7Days
            } else {
                continue;
            };

            scan.matches.push(Match {
                agent_id: c.agent_id,
                entity,
                bucket,
                bucket_key: format!("{}:{}", bucket.as_str(), next_increase),
                metadata: MatchMetadata {
                    days,
                    amount: Some(c.amount),
                    reference: c.property_label.clone(),
                    customer: c.customer_name.clone(),
                    date: next_increase,
                },
            });
        }

        Ok(scan)
    }

    /// One interval past the last applied increase, or past the
    /// contract start when no increase has happened yet
    pub fn next_increase_date(c: &contract::Model, frequency: IncreaseFrequency) -> NaiveDate {
        let base = c.last_increase_date.unwrap_or(c.start_date);
        frequency.next_after(base)
    }
}
