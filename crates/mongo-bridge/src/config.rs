//! Driver registration options

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{BridgeError, Result};

/// Connect timeout applied to every driver (5s)
pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Socket timeout applied to every driver (10s)
pub const SOCKET_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Whole milliseconds of `duration`, saturating at `u64::MAX`
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn default_connect_timeout_ms() -> u64 {
    millis(CONNECT_TIMEOUT)
}

fn default_socket_timeout_ms() -> u64 {
    millis(SOCKET_TIMEOUT)
}

/// Options accepted by `Driver::register`
///
/// Field names follow the application config files this is usually loaded
/// from (`max_poll` / `min_poll` are the pool bounds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterOptions {
    /// Connection URI (`mongodb://...` or `mongodb+srv://...`)
    pub url: String,
    /// Default database
    pub database: String,
    /// Maximum number of pooled connections
    pub max_poll: u32,
    /// Minimum number of pooled connections
    pub min_poll: u32,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_socket_timeout_ms")]
    pub socket_timeout_ms: u64,
    /// Application name for server logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
}

impl RegisterOptions {
    pub fn new(url: impl Into<String>, database: impl Into<String>, max_poll: u32, min_poll: u32) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            max_poll,
            min_poll,
            connect_timeout_ms: default_connect_timeout_ms(),
            socket_timeout_ms: default_socket_timeout_ms(),
            app_name: None,
        }
    }

    /// Override both timeouts
    pub fn with_timeouts(mut self, connect: Duration, socket: Duration) -> Self {
        self.connect_timeout_ms = millis(connect);
        self.socket_timeout_ms = millis(socket);
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn socket_timeout(&self) -> Duration {
        Duration::from_millis(self.socket_timeout_ms)
    }

    /// Load options from `MONGODB_URL`, `MONGODB_DATABASE`,
    /// `MONGODB_MAX_POOL` and `MONGODB_MIN_POOL`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| {
                BridgeError::Configuration(format!("Missing environment variable {}", key))
            })
        };
        let pool_size = |key: &str, default: u32| match lookup(key) {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                BridgeError::Configuration(format!("{} must be a positive integer, got '{}'", key, raw))
            }),
            None => Ok(default),
        };

        let options = Self::new(
            required("MONGODB_URL")?,
            required("MONGODB_DATABASE")?,
            pool_size("MONGODB_MAX_POOL", 10)?,
            pool_size("MONGODB_MIN_POOL", 0)?,
        );
        options.validate()?;
        Ok(options)
    }

    /// Reject options the client would only fail on later
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(BridgeError::Configuration("Connection URL cannot be empty".to_string()));
        }
        if self.database.trim().is_empty() {
            return Err(BridgeError::Configuration("Database name cannot be empty".to_string()));
        }
        if self.min_poll > self.max_poll {
            return Err(BridgeError::Configuration(format!(
                "min_poll ({}) cannot exceed max_poll ({})",
                self.min_poll, self.max_poll
            )));
        }
        Ok(())
    }
}
