use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::error::Result;
use crate::models::invoice::{self, InvoiceStatus};
use crate::models::notification::EntityRef;

use super::invoice_overdue::contract_agents;
use super::{Match, MatchMetadata, Scan, Skip, TriggerBucket};

/// Advance reminders for unpaid invoices with an upcoming due date:
/// `due_in_3_days` covers 0–3 days out, `due_in_7_days` covers 4–7.
pub struct InvoiceDueSoonChecker;

impl InvoiceDueSoonChecker {
    pub async fn find_matches(&self, db: &DatabaseConnection, as_of: NaiveDate) -> Result<Scan> {
        let horizon = as_of + Duration::days(7);

        let invoices = invoice::Entity::find()
            .filter(invoice::Column::Status.is_in(InvoiceStatus::open_states()))
            .filter(invoice::Column::DueDate.gte(as_of))
            .filter(invoice::Column::DueDate.lte(horizon))
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

            let days = (inv.due_date - as_of).num_days();
            let bucket = if days <= 3 {
                TriggerBucket::DueIn3Days
            } else {
                TriggerBucket::DueIn7Days
            };

            scan.matches.push(Match {
                agent_id,
                entity,
                bucket,
                bucket_key: bucket.as_str().to_string(),
                metadata: MatchMetadata {
                    days,
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
