mod email;

pub use email::EmailProvider;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::CONFIG;
use crate::error::{AppError, Result};
use crate::models::notification::{self, NotificationKind};
use crate::models::{agent, notification_preference};
use crate::services::checkers::Match;
use crate::services::dedup::DedupLog;

/// Delivery channels for a notification kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    InApp,
    Email,
    Both,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::InApp => "in_app",
            Channel::Email => "email",
            Channel::Both => "both",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "in_app" => Some(Channel::InApp),
            "email" => Some(Channel::Email),
            "both" => Some(Channel::Both),
            _ => None,
        }
    }

    pub fn email(&self) -> bool {
        matches!(self, Channel::Email | Channel::Both)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An agent's effective preference for one notification kind. A
/// missing preference row resolves to this explicit default rather
/// than being treated as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPreference {
    pub enabled: bool,
    pub channel: Channel,
    pub immediate: bool,
}

impl Default for ResolvedPreference {
    fn default() -> Self {
        Self {
            enabled: true,
            channel: Channel::InApp,
            immediate: true,
        }
    }
}

/// Message handed to a delivery provider
#[derive(Debug, Clone)]
pub struct DeliveryMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Result of one send attempt
#[derive(Debug)]
pub struct SendResult {
    pub success: bool,
    pub error: Option<String>,
}

/// Send-or-fail contract the engine sees; SMTP details stay behind it
#[async_trait]
pub trait DeliveryProvider: Send + Sync {
    async fn send(&self, message: &DeliveryMessage) -> SendResult;
}

/// Creates notifications for checker matches and serves the agent
/// inbox. Creation couples the dedup-log insert and the notification
/// insert in one transaction so concurrent runs cannot double-notify.
pub struct NotificationService {
    db: DatabaseConnection,
    provider: Arc<RwLock<Option<Arc<dyn DeliveryProvider>>>>,
    send_timeout: Duration,
}

impl NotificationService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            provider: Arc::new(RwLock::new(None)),
            send_timeout: CONFIG.smtp.send_timeout,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    pub(crate) fn provider_handle(&self) -> Arc<RwLock<Option<Arc<dyn DeliveryProvider>>>> {
        Arc::clone(&self.provider)
    }

    pub async fn set_provider(&self, provider: Arc<dyn DeliveryProvider>) {
        let mut lock = self.provider.write().await;
        *lock = Some(provider);
    }

    /// Initialize the SMTP provider from configuration, if configured
    pub async fn init_provider(&self) -> Result<()> {
        match EmailProvider::from_config(&CONFIG.smtp) {
            Ok(Some(provider)) => {
                self.set_provider(Arc::new(provider)).await;
                tracing::info!("Email delivery provider initialized");
            }
            Ok(None) => {
                tracing::info!("No SMTP host configured, email delivery disabled");
            }
            Err(e) => {
                return Err(AppError::Internal(format!(
                    "Failed to initialize email provider: {}",
                    e
                )));
            }
        }
        Ok(())
    }

    /// Turn a checker match into a persisted notification.
    ///
    /// Returns None, creating nothing, when the agent opted out of the
    /// kind or the (kind, entity, bucket) key was already notified.
    pub async fn notify(&self, m: &Match) -> Result<Option<notification::Model>> {
        let kind = m.kind();

        let pref = self.preference(m.agent_id, kind).await?;
        if !pref.enabled {
            tracing::debug!(
                agent_id = m.agent_id,
                kind = kind.as_str(),
                "Agent opted out, skipping notification"
            );
            return Ok(None);
        }

        let now = Utc::now();
        let (title, message) = compose_message(m);

        let txn = self.db.begin().await?;

        let recorded = DedupLog::record(&txn, kind, m.entity, &m.bucket_key, now).await?;
        if !recorded {
            txn.commit().await?;
            tracing::debug!(
                entity = %m.entity,
                bucket = %m.bucket_key,
                "Already notified for this bucket"
            );
            return Ok(None);
        }

        let created = notification::ActiveModel {
            agent_id: Set(m.agent_id),
            kind: Set(kind.as_str().to_string()),
            related_kind: Set(Some(m.entity.kind().to_string())),
            related_id: Set(Some(m.entity.id())),
            trigger_bucket: Set(m.bucket_key.clone()),
            priority: Set(m.priority().as_str().to_string()),
            title: Set(title),
            message: Set(message),
            metadata: Set(Some(serde_json::to_string(&m.metadata)?)),
            channel: Set(pref.channel.as_str().to_string()),
            emailed: Set(false),
            batch_id: Set(None),
            read: Set(false),
            read_at: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        if pref.channel.email() && pref.immediate {
            // Best effort: a failed immediate send leaves the row
            // unemailed and the next batch run picks it up
            self.send_immediate(&created).await;
        }

        Ok(Some(created))
    }

    async fn send_immediate(&self, n: &notification::Model) {
        let agent = match agent::Entity::find_by_id(n.agent_id).one(&self.db).await {
            Ok(Some(agent)) => agent,
            Ok(None) => {
                tracing::warn!(agent_id = n.agent_id, "Agent vanished before delivery");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load agent for immediate delivery");
                return;
            }
        };

        let message = DeliveryMessage {
            recipient: agent.email,
            subject: n.title.clone(),
            body: format!("{}\n\n---\nPriority: {}\nSent by PropAlert", n.message, n.priority),
        };

        let result = self.deliver(&message).await;
        if result.success {
            let update = notification::ActiveModel {
                id: Set(n.id),
                emailed: Set(true),
                ..Default::default()
            };
            if let Err(e) = update.update(&self.db).await {
                tracing::warn!(error = %e, notification_id = n.id, "Failed to mark as emailed");
            }
        } else {
            tracing::warn!(
                notification_id = n.id,
                error = ?result.error,
                "Immediate email delivery failed, deferring to batch run"
            );
        }
    }

    /// Send through the configured provider under the send timeout
    pub(crate) async fn deliver(&self, message: &DeliveryMessage) -> SendResult {
        let provider = {
            let lock = self.provider.read().await;
            lock.as_ref().cloned()
        };

        let Some(provider) = provider else {
            return SendResult {
                success: false,
                error: Some("No delivery provider configured".to_string()),
            };
        };

        match tokio::time::timeout(self.send_timeout, provider.send(message)).await {
            Ok(result) => result,
            Err(_) => SendResult {
                success: false,
                error: Some(format!(
                    "Delivery timed out after {:?}",
                    self.send_timeout
                )),
            },
        }
    }

    /// The agent's effective preference for a kind (explicit default
    /// when no row exists)
    pub async fn preference(
        &self,
        agent_id: i64,
        kind: NotificationKind,
    ) -> Result<ResolvedPreference> {
        let row = notification_preference::Entity::find()
            .filter(notification_preference::Column::AgentId.eq(agent_id))
            .filter(notification_preference::Column::Kind.eq(kind.as_str()))
            .one(&self.db)
            .await?;

        Ok(match row {
            Some(p) => ResolvedPreference {
                enabled: p.enabled,
                channel: Channel::parse(&p.channel).unwrap_or(Channel::InApp),
                immediate: p.immediate,
            },
            None => ResolvedPreference::default(),
        })
    }

    /// Effective preferences for every kind, for the preferences endpoint
    pub async fn preferences(
        &self,
        agent_id: i64,
    ) -> Result<Vec<(NotificationKind, ResolvedPreference)>> {
        let rows = notification_preference::Entity::find()
            .filter(notification_preference::Column::AgentId.eq(agent_id))
            .all(&self.db)
            .await?;

        Ok(NotificationKind::all()
            .into_iter()
            .map(|kind| {
                let resolved = rows
                    .iter()
                    .find(|r| r.kind == kind.as_str())
                    .map(|p| ResolvedPreference {
                        enabled: p.enabled,
                        channel: Channel::parse(&p.channel).unwrap_or(Channel::InApp),
                        immediate: p.immediate,
                    })
                    .unwrap_or_default();
                (kind, resolved)
            })
            .collect())
    }

    /// Create or update an agent's preference for one kind
    pub async fn set_preference(
        &self,
        agent_id: i64,
        kind: NotificationKind,
        pref: ResolvedPreference,
    ) -> Result<notification_preference::Model> {
        let existing = notification_preference::Entity::find()
            .filter(notification_preference::Column::AgentId.eq(agent_id))
            .filter(notification_preference::Column::Kind.eq(kind.as_str()))
            .one(&self.db)
            .await?;

        let now = Utc::now();
        let model = match existing {
            Some(row) => {
                let mut active: notification_preference::ActiveModel = row.into();
                active.enabled = Set(pref.enabled);
                active.channel = Set(pref.channel.as_str().to_string());
                active.immediate = Set(pref.immediate);
                active.updated_at = Set(now);
                active.update(&self.db).await?
            }
            None => {
                notification_preference::ActiveModel {
                    agent_id: Set(agent_id),
                    kind: Set(kind.as_str().to_string()),
                    enabled: Set(pref.enabled),
                    channel: Set(pref.channel.as_str().to_string()),
                    immediate: Set(pref.immediate),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.db)
                .await?
            }
        };

        Ok(model)
    }

    /// Get notifications for an agent, newest first
    pub async fn agent_notifications(
        &self,
        agent_id: i64,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<notification::Model>> {
        let notifications = notification::Entity::find()
            .filter(notification::Column::AgentId.eq(agent_id))
            .order_by_desc(notification::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(notifications)
    }

    /// Get unread notification count for an agent
    pub async fn unread_count(&self, agent_id: i64) -> Result<u64> {
        let count = notification::Entity::find()
            .filter(notification::Column::AgentId.eq(agent_id))
            .filter(notification::Column::Read.eq(false))
            .count(&self.db)
            .await?;

        Ok(count)
    }

    /// Mark a notification as read. Idempotent: the read flag flips
    /// once and read_at keeps its first value.
    pub async fn mark_as_read(&self, notification_id: i64, agent_id: i64) -> Result<()> {
        let n = notification::Entity::find_by_id(notification_id)
            .filter(notification::Column::AgentId.eq(agent_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        if n.read {
            return Ok(());
        }

        let mut active: notification::ActiveModel = n.into();
        active.read = Set(true);
        active.read_at = Set(Some(Utc::now()));
        active.update(&self.db).await?;

        Ok(())
    }

    /// Mark all unread notifications as read for an agent
    pub async fn mark_all_as_read(&self, agent_id: i64) -> Result<u64> {
        let result = notification::Entity::update_many()
            .filter(notification::Column::AgentId.eq(agent_id))
            .filter(notification::Column::Read.eq(false))
            .col_expr(
                notification::Column::Read,
                sea_orm::sea_query::Expr::value(true),
            )
            .col_expr(
                notification::Column::ReadAt,
                sea_orm::sea_query::Expr::value(Utc::now()),
            )
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

impl Clone for NotificationService {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            provider: Arc::clone(&self.provider),
            send_timeout: self.send_timeout,
        }
    }
}

/// Compose the title and body for a match, per bucket
fn compose_message(m: &Match) -> (String, String) {
    use crate::services::checkers::TriggerBucket;

    let meta = &m.metadata;
    let amount = meta
        .amount
        .map(|a| format!("${}", a))
        .unwrap_or_else(|| "-".to_string());
    let date = meta.date.format("%d/%m/%Y");

    match m.bucket {
        TriggerBucket::ExpiresIn30Days => (
            format!("Contract Approaching Expiry - {}", meta.reference),
            format!(
                "The contract for '{}' with {} expires in {} days ({}). Consider starting the renewal process.",
                meta.reference, meta.customer, meta.days, date
            ),
        ),
        TriggerBucket::ExpiresIn7Days => (
            format!("Contract Expires Soon - {}", meta.reference),
            format!(
                "The contract for '{}' with {} expires in {} days ({}). Renewal or termination is required.",
                meta.reference, meta.customer, meta.days, date
            ),
        ),
        TriggerBucket::Expired => (
            format!("Contract Expired - {}", meta.reference),
            format!(
                "The contract for '{}' with {} expired on {}. Immediate action is required.",
                meta.reference, meta.customer, date
            ),
        ),
        TriggerBucket::Overdue => (
            format!("Invoice Overdue - {}", meta.reference),
            format!(
                "Invoice {} for {} is {} day(s) overdue. Outstanding balance: {}.",
                meta.reference,
                meta.customer,
                -meta.days,
                amount
            ),
        ),
        TriggerBucket::OverdueUrgent => (
            format!("Invoice Urgently Overdue - {}", meta.reference),
            format!(
                "Invoice {} for {} is {} days overdue. Outstanding balance: {}. Contacting the customer is recommended.",
                meta.reference,
                meta.customer,
                -meta.days,
                amount
            ),
        ),
        TriggerBucket::OverdueCritical => (
            format!("Invoice Critically Overdue - {}", meta.reference),
            format!(
                "Invoice {} for {} is {} days overdue. Outstanding balance: {}. Urgent collection action is required.",
                meta.reference,
                meta.customer,
                -meta.days,
                amount
            ),
        ),
        TriggerBucket::IncreaseDueIn7Days => (
            format!("Rent Increase Upcoming - {}", meta.reference),
            format!(
                "The rent increase for '{}' with {} is scheduled for {} ({} day(s)). Current amount: {}. Prepare the new amount.",
                meta.reference, meta.customer, date, meta.days, amount
            ),
        ),
        TriggerBucket::IncreaseOverdue => (
            format!("Rent Increase Overdue - {}", meta.reference),
            format!(
                "The rent increase for '{}' with {} was scheduled for {} ({} day(s) ago). Current amount: {}. Process the increase urgently.",
                meta.reference,
                meta.customer,
                date,
                -meta.days,
                amount
            ),
        ),
        TriggerBucket::DueIn7Days => (
            format!("Payment Reminder - {}", meta.reference),
            format!(
                "Invoice {} for {} is due in {} days ({}). Outstanding balance: {}.",
                meta.reference, meta.customer, meta.days, date, amount
            ),
        ),
        TriggerBucket::DueIn3Days => (
            format!("Invoice Due Soon - {}", meta.reference),
            format!(
                "Invoice {} for {} is due in {} day(s) ({}). Outstanding balance: {}. Reminding the customer is recommended.",
                meta.reference, meta.customer, meta.days, date, amount
            ),
        ),
    }
}
