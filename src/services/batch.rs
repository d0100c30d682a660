//! Digest batching: groups pending email-channel notifications into one
//! BatchNotification per recipient and delivers each as a single email.
//!
//! Delivery is at-least-once. A batch is marked sent only after the
//! email went out; when the confirmation write fails the batch stays
//! unsent and the next run re-sends the digest. Failed batches keep
//! their members and are retried as a unit on the next run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;

use crate::error::Result;
use crate::models::batch_notification::{self, BatchStatus};
use crate::models::{agent, notification};
use crate::services::notification::{DeliveryMessage, NotificationService};

/// Outcome for one recipient's digest
#[derive(Debug, Clone, Serialize)]
pub struct RecipientOutcome {
    pub agent_id: i64,
    pub batch_id: i64,
    pub notifications: usize,
    pub sent: bool,
    pub error: Option<String>,
}

/// Summary of one batch run
#[derive(Debug, Default, Serialize)]
pub struct BatchRunReport {
    pub batches_sent: usize,
    pub batches_failed: usize,
    pub notifications_delivered: usize,
    pub recipients: Vec<RecipientOutcome>,
}

#[derive(Clone)]
pub struct BatchProcessor {
    service: NotificationService,
}

impl BatchProcessor {
    pub fn new(service: NotificationService) -> Self {
        Self { service }
    }

    /// Run one digest pass: retry unsent batches from earlier runs,
    /// then group newly pending notifications and send one digest per
    /// recipient. A failure for one recipient never aborts the run.
    pub async fn process_batches(&self, as_of: DateTime<Utc>) -> Result<BatchRunReport> {
        let db = self.service.db();
        let mut report = BatchRunReport::default();

        // Batches left unsent by previous runs
        let unsent = batch_notification::Entity::find()
            .filter(batch_notification::Column::Status.ne(BatchStatus::Sent.as_str()))
            .order_by_asc(batch_notification::Column::Id)
            .all(db)
            .await?;

        for batch in unsent {
            let members = notification::Entity::find()
                .filter(notification::Column::BatchId.eq(batch.id))
                .order_by_asc(notification::Column::CreatedAt)
                .all(db)
                .await?;
            let outcome = self.deliver_batch(batch, members).await?;
            report.push(outcome);
        }

        // Newly pending notifications, one batch per recipient
        let pending = notification::Entity::find()
            .filter(notification::Column::BatchId.is_null())
            .filter(notification::Column::Emailed.eq(false))
            .filter(notification::Column::Channel.is_in(["email", "both"]))
            .order_by_asc(notification::Column::CreatedAt)
            .all(db)
            .await?;

        let mut by_agent: BTreeMap<i64, Vec<notification::Model>> = BTreeMap::new();
        for n in pending {
            by_agent.entry(n.agent_id).or_default().push(n);
        }

        for (agent_id, members) in by_agent {
            let batch = batch_notification::ActiveModel {
                agent_id: Set(agent_id),
                status: Set(BatchStatus::Pending.as_str().to_string()),
                scheduled_at: Set(as_of),
                sent_at: Set(None),
                error_message: Set(None),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await?;

            let ids: Vec<i64> = members.iter().map(|n| n.id).collect();
            notification::Entity::update_many()
                .filter(notification::Column::Id.is_in(ids))
                .col_expr(
                    notification::Column::BatchId,
                    sea_orm::sea_query::Expr::value(batch.id),
                )
                .exec(db)
                .await?;

            let outcome = self.deliver_batch(batch, members).await?;
            report.push(outcome);
        }

        Ok(report)
    }

    /// Send one digest and record the result. Only transport and
    /// bookkeeping errors for this recipient end up in the outcome;
    /// storage errors still propagate.
    async fn deliver_batch(
        &self,
        batch: batch_notification::Model,
        members: Vec<notification::Model>,
    ) -> Result<RecipientOutcome> {
        let db = self.service.db();

        if members.is_empty() {
            // Nothing left to deliver (members were emailed immediately
            // in the meantime); close the batch out
            self.mark_batch(&batch, BatchStatus::Sent, None).await?;
            return Ok(RecipientOutcome {
                agent_id: batch.agent_id,
                batch_id: batch.id,
                notifications: 0,
                sent: true,
                error: None,
            });
        }

        let agent = agent::Entity::find_by_id(batch.agent_id).one(db).await?;
        let Some(agent) = agent else {
            self.mark_batch(&batch, BatchStatus::Failed, Some("agent not found"))
                .await?;
            return Ok(RecipientOutcome {
                agent_id: batch.agent_id,
                batch_id: batch.id,
                notifications: members.len(),
                sent: false,
                error: Some("agent not found".to_string()),
            });
        };

        let message = DeliveryMessage {
            recipient: agent.email,
            subject: format!("PropAlert digest: {} notification(s)", members.len()),
            body: compose_digest(&members),
        };

        let result = self.service.deliver(&message).await;
        if result.success {
            self.mark_batch(&batch, BatchStatus::Sent, None).await?;

            let ids: Vec<i64> = members.iter().map(|n| n.id).collect();
            notification::Entity::update_many()
                .filter(notification::Column::Id.is_in(ids))
                .col_expr(
                    notification::Column::Emailed,
                    sea_orm::sea_query::Expr::value(true),
                )
                .exec(db)
                .await?;

            Ok(RecipientOutcome {
                agent_id: batch.agent_id,
                batch_id: batch.id,
                notifications: members.len(),
                sent: true,
                error: None,
            })
        } else {
            let error = result
                .error
                .unwrap_or_else(|| "unknown delivery error".to_string());
            tracing::warn!(
                batch_id = batch.id,
                agent_id = batch.agent_id,
                error = %error,
                "Digest delivery failed, batch stays pending for the next run"
            );
            self.mark_batch(&batch, BatchStatus::Failed, Some(&error))
                .await?;

            Ok(RecipientOutcome {
                agent_id: batch.agent_id,
                batch_id: batch.id,
                notifications: members.len(),
                sent: false,
                error: Some(error),
            })
        }
    }

    async fn mark_batch(
        &self,
        batch: &batch_notification::Model,
        status: BatchStatus,
        error: Option<&str>,
    ) -> Result<()> {
        let mut active: batch_notification::ActiveModel = batch.clone().into();
        active.status = Set(status.as_str().to_string());
        active.error_message = Set(error.map(|e| e.to_string()));
        if status == BatchStatus::Sent {
            active.sent_at = Set(Some(Utc::now()));
        }
        active.update(self.service.db()).await?;
        Ok(())
    }
}

impl BatchRunReport {
    fn push(&mut self, outcome: RecipientOutcome) {
        if outcome.sent {
            self.batches_sent += 1;
            self.notifications_delivered += outcome.notifications;
        } else {
            self.batches_failed += 1;
        }
        self.recipients.push(outcome);
    }
}

/// One digest body listing every member notification
fn compose_digest(members: &[notification::Model]) -> String {
    let mut body = String::from("Your pending notifications:\n");
    for n in members {
        body.push_str(&format!("\n- [{}] {}\n  {}\n", n.priority, n.title, n.message));
    }
    body.push_str("\n---\nSent by PropAlert");
    body
}
