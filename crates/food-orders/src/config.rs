//! Configuration management for the order pipeline.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::retry::RetryPolicy;
use crate::worker::WorkerSettings;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Orders table name (`ORDERS_TABLE`)
    pub orders_table: String,
    /// Notification topic (`ORDER_TOPIC`)
    pub order_topic: String,
    /// Simulated preparation time (`PREPARATION_DELAY_MS`)
    pub preparation_delay: Duration,
    /// Consumer checkpoint file (`FEED_CHECKPOINT_PATH`); in memory when unset
    pub checkpoint_path: Option<PathBuf>,
    /// Max events per feed read (`FEED_BATCH_SIZE`)
    pub feed_batch_size: usize,
    /// Attempts for the conditional update (`UPDATE_MAX_ATTEMPTS`)
    pub update_max_attempts: u32,
    /// Attempts for publishing a notification (`NOTIFY_MAX_ATTEMPTS`)
    pub notify_max_attempts: u32,
    /// First backoff delay of both retry loops (`RETRY_INITIAL_DELAY_MS`). Backoff is capped at
    /// 5 s, or at this delay when it is longer.
    pub retry_initial_delay: Duration,
    /// HTTP bind host (`HOST`)
    pub host: String,
    /// HTTP bind port (`PORT`)
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            orders_table: "orders".to_string(),
            order_topic: "order-status-updates".to_string(),
            preparation_delay: Duration::from_secs(10),
            checkpoint_path: None,
            feed_batch_size: 100,
            update_max_attempts: 5,
            notify_max_attempts: 3,
            retry_initial_delay: Duration::from_millis(100),
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable is set to a value that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let text = |name: &str, default: String| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default)
        };

        let feed_batch_size = parse(&lookup, "FEED_BATCH_SIZE", defaults.feed_batch_size)?;
        let update_max_attempts =
            parse(&lookup, "UPDATE_MAX_ATTEMPTS", defaults.update_max_attempts)?;
        let notify_max_attempts =
            parse(&lookup, "NOTIFY_MAX_ATTEMPTS", defaults.notify_max_attempts)?;

        Ok(Self {
            orders_table: text("ORDERS_TABLE", defaults.orders_table),
            order_topic: text("ORDER_TOPIC", defaults.order_topic),
            preparation_delay: Duration::from_millis(parse(
                &lookup,
                "PREPARATION_DELAY_MS",
                10_000,
            )?),
            checkpoint_path: lookup("FEED_CHECKPOINT_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            feed_batch_size: positive("FEED_BATCH_SIZE", feed_batch_size)?,
            update_max_attempts: positive("UPDATE_MAX_ATTEMPTS", update_max_attempts)?,
            notify_max_attempts: positive("NOTIFY_MAX_ATTEMPTS", notify_max_attempts)?,
            retry_initial_delay: Duration::from_millis(parse(
                &lookup,
                "RETRY_INITIAL_DELAY_MS",
                100,
            )?),
            host: text("HOST", defaults.host),
            port: parse(&lookup, "PORT", defaults.port)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            preparation_delay: self.preparation_delay,
            batch_size: self.feed_batch_size,
            update_retry: self.retry_policy(self.update_max_attempts),
        }
    }

    pub fn notify_retry(&self) -> RetryPolicy {
        self.retry_policy(self.notify_max_attempts)
    }

    fn retry_policy(&self, attempts: u32) -> RetryPolicy {
        let policy = RetryPolicy::new().with_max_attempts(attempts);
        let max_delay = policy.max_delay().max(self.retry_initial_delay);
        policy
            .with_initial_delay(self.retry_initial_delay)
            .with_max_delay(max_delay)
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) if value.trim().is_empty() => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
            expected: "a non-negative integer",
        }),
    }
}

fn positive<T: Default + PartialEq + ToString>(
    name: &'static str,
    value: T,
) -> Result<T, ConfigError> {
    if value == T::default() {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            expected: "a positive integer",
        });
    }
    Ok(value)
}
