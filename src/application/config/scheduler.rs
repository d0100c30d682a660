use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Disable with `PROPALERT_SCHEDULER_ENABLED=false` (e.g. when a
    /// cron-driven deployment triggers jobs over HTTP instead).
    pub enabled: bool,
    /// Interval between checker runs.
    pub checker_interval: Duration,
    /// Interval between digest batch runs.
    pub batch_interval: Duration,
    /// A run exceeding this deadline is abandoned and retried on the
    /// next tick.
    pub run_deadline: Duration,
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("PROPALERT_SCHEDULER_ENABLED")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(true),
            checker_interval: Duration::from_secs(
                env::var("PROPALERT_CHECKER_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60 * 60 * 24),
            ),
            batch_interval: Duration::from_secs(
                env::var("PROPALERT_BATCH_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60 * 60 * 24),
            ),
            run_deadline: Duration::from_secs(
                env::var("PROPALERT_RUN_DEADLINE_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60 * 15),
            ),
        }
    }
}
