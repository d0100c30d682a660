use std::env;
use std::time::Duration;

/// SMTP settings for the email delivery provider.
///
/// When `PROPALERT_SMTP_HOST` is unset the provider is not constructed and
/// email-channel notifications stay queued for the batch run.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
    pub from_name: String,
    pub use_tls: bool,
    /// Wall-clock limit applied to every send call.
    pub send_timeout: Duration,
}

impl SmtpConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("PROPALERT_SMTP_HOST").ok(),
            port: env::var("PROPALERT_SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            username: env::var("PROPALERT_SMTP_USERNAME").unwrap_or_default(),
            password: env::var("PROPALERT_SMTP_PASSWORD").unwrap_or_default(),
            from_address: env::var("PROPALERT_SMTP_FROM")
                .unwrap_or_else(|_| "noreply@localhost".to_string()),
            from_name: env::var("PROPALERT_SMTP_FROM_NAME")
                .unwrap_or_else(|_| "PropAlert".to_string()),
            use_tls: env::var("PROPALERT_SMTP_TLS")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(true),
            send_timeout: Duration::from_secs(
                env::var("PROPALERT_SMTP_SEND_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}
