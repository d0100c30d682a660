//! Scheduled job entrypoints.
//!
//! Each checker and the digest batch run is one explicit entrypoint
//! taking an optional `as_of` override (current date when None), so a
//! cron trigger, the in-process scheduler, the HTTP trigger, and tests
//! all share the same code path. Transient failures are retried with
//! short backoff; data problems are skipped per record and only
//! reported in the summary.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::services::batch::{BatchProcessor, BatchRunReport};
use crate::services::checkers::{
    ContractExpirationChecker, InvoiceDueSoonChecker, InvoiceOverdueChecker, RentIncreaseChecker,
    Scan,
};
use crate::services::notification::NotificationService;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF_MS: u64 = 500;

/// Counts reported by one checker run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RunSummary {
    /// Entities matching a trigger bucket
    pub matched: usize,
    /// Notifications actually created
    pub notified: usize,
    /// Matches suppressed (opt-out or already notified) plus records
    /// the checker stepped over
    pub skipped: usize,
    /// Matches that errored while notifying
    pub failed: usize,
}

#[derive(Debug, Clone, Copy)]
enum CheckerJob {
    ContractExpiration,
    InvoiceOverdue,
    RentIncrease,
    InvoiceDueSoon,
}

impl CheckerJob {
    fn name(&self) -> &'static str {
        match self {
            CheckerJob::ContractExpiration => "contract_expiration",
            CheckerJob::InvoiceOverdue => "invoice_overdue",
            CheckerJob::RentIncrease => "rent_increase",
            CheckerJob::InvoiceDueSoon => "invoice_due_soon",
        }
    }
}

pub async fn run_contract_expiration_check(
    service: &NotificationService,
    as_of: Option<NaiveDate>,
) -> Result<RunSummary> {
    run_checker_with_retries(service, CheckerJob::ContractExpiration, as_of).await
}

pub async fn run_invoice_overdue_check(
    service: &NotificationService,
    as_of: Option<NaiveDate>,
) -> Result<RunSummary> {
    run_checker_with_retries(service, CheckerJob::InvoiceOverdue, as_of).await
}

pub async fn run_rent_increase_check(
    service: &NotificationService,
    as_of: Option<NaiveDate>,
) -> Result<RunSummary> {
    run_checker_with_retries(service, CheckerJob::RentIncrease, as_of).await
}

pub async fn run_invoice_due_soon_check(
    service: &NotificationService,
    as_of: Option<NaiveDate>,
) -> Result<RunSummary> {
    run_checker_with_retries(service, CheckerJob::InvoiceDueSoon, as_of).await
}

/// Run one digest batch pass
pub async fn run_batch_dispatch(
    processor: &BatchProcessor,
    as_of: Option<DateTime<Utc>>,
) -> Result<BatchRunReport> {
    let as_of = as_of.unwrap_or_else(Utc::now);

    let report = with_retries("batch_dispatch", || processor.process_batches(as_of)).await?;

    tracing::info!(
        job = "batch_dispatch",
        as_of = %as_of,
        batches_sent = report.batches_sent,
        batches_failed = report.batches_failed,
        notifications_delivered = report.notifications_delivered,
        "Batch run completed"
    );

    Ok(report)
}

async fn run_checker_with_retries(
    service: &NotificationService,
    job: CheckerJob,
    as_of: Option<NaiveDate>,
) -> Result<RunSummary> {
    with_retries(job.name(), || run_checker(service, job, as_of)).await
}

async fn run_checker(
    service: &NotificationService,
    job: CheckerJob,
    as_of: Option<NaiveDate>,
) -> Result<RunSummary> {
    let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
    let db = service.db();

    let scan: Scan = match job {
        CheckerJob::ContractExpiration => {
            ContractExpirationChecker.find_matches(db, as_of).await?
        }
        CheckerJob::InvoiceOverdue => InvoiceOverdueChecker.find_matches(db, as_of).await?,
        CheckerJob::RentIncrease => RentIncreaseChecker.find_matches(db, as_of).await?,
        CheckerJob::InvoiceDueSoon => InvoiceDueSoonChecker.find_matches(db, as_of).await?,
    };

    let mut summary = RunSummary {
        matched: scan.matches.len(),
        skipped: scan.skipped.len(),
        ..Default::default()
    };

    for skip in &scan.skipped {
        tracing::warn!(
            job = job.name(),
            entity = %skip.entity,
            reason = %skip.reason,
            "Skipped malformed record"
        );
    }

    for m in &scan.matches {
        match service.notify(m).await {
            Ok(Some(_)) => summary.notified += 1,
            Ok(None) => summary.skipped += 1,
            Err(e) => {
                summary.failed += 1;
                tracing::warn!(
                    job = job.name(),
                    entity = %m.entity,
                    bucket = %m.bucket_key,
                    error = %e,
                    "Failed to create notification"
                );
            }
        }
    }

    tracing::info!(
        job = job.name(),
        as_of = %as_of,
        matched = summary.matched,
        notified = summary.notified,
        skipped = summary.skipped,
        failed = summary.failed,
        "Checker run completed"
    );

    Ok(summary)
}

/// Retry transient failures up to MAX_ATTEMPTS with exponential
/// backoff; permanent errors propagate immediately.
async fn with_retries<T, F, Fut>(job: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                let backoff =
                    Duration::from_millis(RETRY_BACKOFF_MS * 2u64.pow(attempt - 1));
                tracing::warn!(
                    job,
                    attempt,
                    error = %e,
                    backoff_ms = backoff.as_millis() as u64,
                    "Transient failure, retrying"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
