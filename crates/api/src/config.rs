//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `OUTBOX_INTERVAL_MS` — outbox polling interval (default: `5000`)
/// - `OUTBOX_BATCH_SIZE` — records drained per cycle (default: `50`)
/// - `RESERVATION_TIMEOUT_MS` — saga response timeout (default: `30000`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub outbox_interval_ms: u64,
    pub outbox_batch_size: usize,
    pub reservation_timeout_ms: u64,
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parsed("PORT", 3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            outbox_interval_ms: env_parsed("OUTBOX_INTERVAL_MS", 5000),
            outbox_batch_size: env_parsed("OUTBOX_BATCH_SIZE", 50),
            reservation_timeout_ms: env_parsed("RESERVATION_TIMEOUT_MS", 30_000),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Interval between outbox publisher cycles.
    pub fn outbox_interval(&self) -> Duration {
        Duration::from_millis(self.outbox_interval_ms)
    }

    /// How long the saga waits for a reservation response.
    pub fn reservation_timeout(&self) -> Duration {
        Duration::from_millis(self.reservation_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            outbox_interval_ms: 5000,
            outbox_batch_size: 50,
            reservation_timeout_ms: 30_000,
        }
    }
}
