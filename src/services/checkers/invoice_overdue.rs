use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::error::Result;
use crate::models::contract;
use crate::models::invoice::{self, InvoiceStatus};
use crate::models::notification::EntityRef;

use super::{Match, MatchMetadata, Scan, Skip, TriggerBucket};

/// Detects unpaid invoices past their due date, bucketed by severity.
///
/// An invoice sits in exactly one bucket per run, but crossing into a
/// higher-severity bucket produces a fresh dedup key, so escalation
/// re-notifies on purpose.
pub struct InvoiceOverdueChecker;

impl InvoiceOverdueChecker {
    pub async fn find_matches(&self, db: &DatabaseConnection, as_of: NaiveDate) -> Result<Scan> {
        let invoices = invoice::Entity::find()
            .filter(invoice::Column::Status.is_in(InvoiceStatus::open_states()))
            .filter(invoice::Column::DueDate.lt(as_of))
            .all(db)
            .await?;

        let agents = contract_agents(db, &invoices).await?;
        let mut scan = Scan::default();

        for inv in invoices {
            let entity = EntityRef::Invoice(inv.id);

            if inv.balance() <= Decimal::ZERO {
                continue;
            }

            let Some(agent_id) = inv.contract_id.and_then(|cid| agents.get(&cid).copied())
            else {
                scan.skipped.push(Skip {
                    entity,
                    reason: "no contract, cannot resolve an agent to notify".to_string(),
                });
                continue;
            };

            let days_overdue = (as_of - inv.due_date).num_days();
            let bucket = if days_overdue > 30 {
                TriggerBucket::OverdueCritical
            } else if days_overdue > 7 {
                TriggerBucket::OverdueUrgent
            } else {
                TriggerBucket::Overdue
            };

            scan.matches.push(Match {
                agent_id,
                entity,
                bucket,
                bucket_key: bucket.as_str().to_string(),
                metadata: MatchMetadata {
                    days: -days_overdue,
                    amount: Some(inv.balance()),
                    reference: inv.number.clone(),
                    customer: inv.customer_name.clone(),
                    date: inv.due_date,
                },
            });
        }

        Ok(scan)
    }
}

/// Resolve each invoice's contract to its agent in one query
pub(super) async fn contract_agents(
    db: &DatabaseConnection,
    invoices: &[invoice::Model],
) -> Result<HashMap<i64, i64>> {
    let contract_ids: Vec<i64> = invoices.iter().filter_map(|i| i.contract_id).collect();
    if contract_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let contracts = contract::Entity::find()
        .filter(contract::Column::Id.is_in(contract_ids))
        .all(db)
        .await?;

    Ok(contracts.into_iter().map(|c| (c.id, c.agent_id)).collect())
}
