//! Application configuration
//!
//! Every setting can come from a CLI flag or an environment variable; a
//! `.env` file is loaded first when present.

use std::time::Duration;

use clap::Args;

use crate::{
    database::RetryPolicy,
    payments::{PaymentError, SimulatedPaymentGateway},
};

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(
        long,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact,
        global = true
    )]
    pub log_format: LogFormat,
}

/// Database settings.
#[derive(Debug, Clone, Args)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,
}

/// Transaction retry settings.
#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// Attempts per unit of work when transactions conflict
    #[arg(long, env = "STORE_RETRY_ATTEMPTS", default_value_t = 5)]
    pub store_retry_attempts: u32,

    /// Backoff before the first retry, in milliseconds; grows linearly
    #[arg(long, env = "STORE_RETRY_BACKOFF_MS", default_value_t = 25)]
    pub store_retry_backoff_ms: u64,
}

impl StoreConfig {
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.store_retry_attempts,
            backoff: Duration::from_millis(self.store_retry_backoff_ms),
        }
    }
}

/// Simulated payment gateway settings.
#[derive(Debug, Clone, Args)]
pub struct PaymentConfig {
    /// Probability that a payment is approved, between 0 and 1
    #[arg(long, env = "PAYMENT_APPROVAL_RATE", default_value_t = SimulatedPaymentGateway::DEFAULT_APPROVAL_RATE)]
    pub payment_approval_rate: f64,

    /// Simulated gateway latency in milliseconds
    #[arg(long, env = "PAYMENT_LATENCY_MS", default_value_t = 0)]
    pub payment_latency_ms: u64,
}

impl PaymentConfig {
    /// # Errors
    ///
    /// Returns an error when the approval rate is not a probability.
    pub fn gateway(&self) -> Result<SimulatedPaymentGateway, PaymentError> {
        SimulatedPaymentGateway::new(
            self.payment_approval_rate,
            Duration::from_millis(self.payment_latency_ms),
        )
    }
}

/// Everything needed to assemble an [`AppContext`](crate::context::AppContext).
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub store: StoreConfig,

    #[command(flatten)]
    pub payments: PaymentConfig,
}
