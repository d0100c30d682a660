//! Periodic task scheduler
//!
//! A simple scheduler for running the checker and batch jobs at
//! regular intervals. Each task runs on its own tokio interval; a run
//! that exceeds the configured deadline is abandoned and re-attempted
//! on the next tick. Correctness under overlap (a manual HTTP trigger
//! racing a scheduled run) comes from the dedup log's unique index,
//! not from anything here.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::config::scheduler::SchedulerConfig;
use crate::services::batch::BatchProcessor;
use crate::services::jobs;
use crate::services::notification::NotificationService;

/// Trait for periodic background tasks
#[async_trait]
pub trait PeriodicTask: Send + Sync {
    /// Task name for logging
    fn name(&self) -> &'static str;

    /// How often to run
    fn interval(&self) -> Duration;

    /// Execute the task
    async fn run(&self) -> anyhow::Result<()>;
}

/// Start all periodic tasks
pub fn start_scheduler(
    service: NotificationService,
    processor: BatchProcessor,
    config: &SchedulerConfig,
) {
    let checker_interval = config.checker_interval;
    let batch_interval = config.batch_interval;
    let deadline = config.run_deadline;

    let tasks: Vec<Box<dyn PeriodicTask>> = vec![
        Box::new(ContractExpirationTask {
            service: service.clone(),
            interval: checker_interval,
        }),
        Box::new(InvoiceOverdueTask {
            service: service.clone(),
            interval: checker_interval,
        }),
        Box::new(RentIncreaseTask {
            service: service.clone(),
            interval: checker_interval,
        }),
        Box::new(InvoiceDueSoonTask {
            service,
            interval: checker_interval,
        }),
        Box::new(BatchDispatchTask {
            processor: Arc::new(processor),
            interval: batch_interval,
        }),
    ];

    for task in tasks {
        tokio::spawn(async move {
            run_task(task, deadline).await;
        });
    }

    tracing::info!("Periodic task scheduler started");
}

/// Run a single task on its interval
async fn run_task(task: Box<dyn PeriodicTask>, deadline: Duration) {
    let mut ticker = interval(task.interval());

    // Skip the first immediate tick
    ticker.tick().await;

    loop {
        ticker.tick().await;

        tracing::debug!(task = task.name(), "Running periodic task");

        match tokio::time::timeout(deadline, task.run()).await {
            Ok(Ok(())) => {
                tracing::debug!(task = task.name(), "Periodic task completed");
            }
            Ok(Err(e)) => {
                tracing::error!(task = task.name(), error = %e, "Periodic task failed");
            }
            Err(_) => {
                tracing::error!(
                    task = task.name(),
                    deadline_secs = deadline.as_secs(),
                    "Periodic task exceeded its deadline, abandoned until next tick"
                );
            }
        }
    }
}

struct ContractExpirationTask {
    service: NotificationService,
    interval: Duration,
}

#[async_trait]
impl PeriodicTask for ContractExpirationTask {
    fn name(&self) -> &'static str {
        "contract_expiration"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> anyhow::Result<()> {
        jobs::run_contract_expiration_check(&self.service, None).await?;
        Ok(())
    }
}

struct InvoiceOverdueTask {
    service: NotificationService,
    interval: Duration,
}

#[async_trait]
impl PeriodicTask for InvoiceOverdueTask {
    fn name(&self) -> &'static str {
        "invoice_overdue"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> anyhow::Result<()> {
        jobs::run_invoice_overdue_check(&self.service, None).await?;
        Ok(())
    }
}

struct RentIncreaseTask {
    service: NotificationService,
    interval: Duration,
}

#[async_trait]
impl PeriodicTask for RentIncreaseTask {
    fn name(&self) -> &'static str {
        "rent_increase"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> anyhow::Result<()> {
        jobs::run_rent_increase_check(&self.service, None).await?;
        Ok(())
    }
}

struct InvoiceDueSoonTask {
    service: NotificationService,
    interval: Duration,
}

#[async_trait]
impl PeriodicTask for InvoiceDueSoonTask {
    fn name(&self) -> &'static str {
        "invoice_due_soon"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> anyhow::Result<()> {
        jobs::run_invoice_due_soon_check(&self.service, None).await?;
        Ok(())
    }
}

struct BatchDispatchTask {
    processor: Arc<BatchProcessor>,
    interval: Duration,
}

#[async_trait]
impl PeriodicTask for BatchDispatchTask {
    fn name(&self) -> &'static str {
        "batch_dispatch"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> anyhow::Result<()> {
        jobs::run_batch_dispatch(&self.processor, None).await?;
        Ok(())
    }
}
