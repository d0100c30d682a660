use chrono::{Duration, NaiveDate};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};

use crate::error::Result;
use crate::models::contract::{self, ContractStatus};
use crate::models::notification::EntityRef;

use super::{Match, MatchMetadata, Scan, Skip, TriggerBucket};

/// Detects contracts approaching or past their end date.
///
/// The 30-day and 7-day buckets fire on exact day-count equality, so a
/// contract crosses each warning exactly once instead of re-firing
/// every day past the threshold. The `expired` bucket matches every
/// run while the contract stays active; the dedup log keeps it to one
/// notification per end date.
pub struct ContractExpirationChecker;

impl ContractExpirationChecker {
    pub async fn find_matches(&self, db: &DatabaseConnection, as_of: NaiveDate) -> Result<Scan> {
        let warn_30 = as_of + Duration::days(30);
        let warn_7 = as_of + Duration::days(7);

        let contracts = contract::Entity::find()
            .filter(contract::Column::Status.eq(ContractStatus::Active.as_str()))
            .filter(contract::Column::EndDate.is_not_null())
            .filter(
                Condition::any()
                    .add(contract::Column::EndDate.eq(warn_30))
                    .add(contract::Column::EndDate.eq(warn_7))
                    .add(contract::Column::EndDate.lt(as_of)),
            )
            .all(db)
            .await?;

        let mut scan = Scan::default();

        for c in contracts {
            let entity = EntityRef::Contract(c.id);

            let Some(end_date) = c.end_date else {
                // Filtered above; guard anyway
                continue;
            };
            if end_date < c.start_date {
                scan.skipped.push(Skip {
                    entity,
                    reason: format!(
                        "end date {} precedes start date {}",
                        end_date, c.start_date
                    ),
                });
                continue;
            }

            let days = (end_date - as_of).num_days();
            let bucket = if days == 30 {
                TriggerBucket::ExpiresIn30Days
            } else if days == 7 {
                TriggerBucket::ExpiresIn7Days
            } else if days < 0 {
                TriggerBucket::Expired
            } else {
                continue;
            };

            scan.matches.push(Match {
                agent_id: c.agent_id,
                entity,
                bucket,
                // Scoped by end date: a renewed contract starts a fresh
                // bucket cycle
                bucket_key: format!("{}:{}", bucket.as_str(), end_date),
                metadata: MatchMetadata {
                    days,
                    amount: Some(c.amount),
                    reference: c.property_label.clone(),
                    customer: c.customer_name.clone(),
                    date: end_date,
                },
            });
        }

        Ok(scan)
    }
}
