//! # Shelfcode Configuration
//!
//! File configuration for the database, the allocation retry policy and
//! label geometry.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SHELFCODE_DB_PATH=/var/lib/shelfcode/shelfcode.db                  │
//! │     SHELFCODE_DB_MAX_CONNECTIONS=8                                     │
//! │     SHELFCODE_ALLOC_MAX_ATTEMPTS=10                                    │
//! │     SHELFCODE_ALLOC_TIMEOUT_MS=2000                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/shelfcode/shelfcode.toml (Linux)                         │
//! │     ~/Library/Application Support/com.shelfcode.shelfcode/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/shelfcode/shelfcode.db"
//! max_connections = 5
//! busy_timeout_ms = 5000
//!
//! [allocation]
//! max_attempts = 5
//! initial_backoff_ms = 10
//! max_backoff_ms = 250
//! attempt_timeout_ms = 10000
//!
//! [label]
//! module_width = 2.0
//! bar_height = 60.0
//! quiet_zone = 9
//! ```

use serde::{Deserialize, Serialize};
use shelfcode_core::LabelGeometry;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::allocator::RetryPolicy;
use crate::pool::DbConfig;

// =============================================================================
// Errors
// =============================================================================

/// Failures while loading or saving the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is present but unusable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Database Settings
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to the platform data dir.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Lock wait per statement (milliseconds).
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// Data dir of the platform, falling back to the working directory.
pub fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "shelfcode", "shelfcode")
        .map(|dirs| dirs.data_dir().join("shelfcode.db"))
        .unwrap_or_else(|| PathBuf::from("shelfcode.db"))
}

fn default_max_connections() -> u32 {
    5
}
fn default_min_connections() -> u32 {
    1
}
fn default_busy_timeout() -> u64 {
    5000
}
fn default_connect_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            busy_timeout_ms: default_busy_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

// =============================================================================
// Allocation Settings
// =============================================================================

/// `[allocation]` section: retry policy of contended allocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,

    /// Must exceed `database.busy_timeout_ms`.
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}
fn default_initial_backoff() -> u64 {
    10
}
fn default_max_backoff() -> u64 {
    250
}
fn default_attempt_timeout() -> u64 {
    10000
}

impl Default for AllocationSettings {
    fn default() -> Self {
        AllocationSettings {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            attempt_timeout_ms: default_attempt_timeout(),
        }
    }
}

impl AllocationSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            attempt_timeout: Duration::from_millis(self.attempt_timeout_ms),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShelfcodeConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub allocation: AllocationSettings,

    #[serde(default)]
    pub label: LabelGeometry,
}

impl ShelfcodeConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, else the platform config dir)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }

        if self.allocation.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "allocation.max_attempts must be greater than 0".into(),
            ));
        }

        if self.allocation.initial_backoff_ms > self.allocation.max_backoff_ms {
            return Err(ConfigError::Invalid(
                "allocation.initial_backoff_ms exceeds max_backoff_ms".into(),
            ));
        }

        // A lock wait that outlives the attempt turns every busy database into
        // a timeout.
        if self.allocation.attempt_timeout_ms <= self.database.busy_timeout_ms {
            return Err(ConfigError::Invalid(format!(
                "allocation.attempt_timeout_ms ({}) must exceed database.busy_timeout_ms ({})",
                self.allocation.attempt_timeout_ms, self.database.busy_timeout_ms
            )));
        }

        if let Some(field) = self.label.first_invalid_field() {
            return Err(ConfigError::Invalid(format!(
                "label.{field} must be a positive length"
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key/value source.
    fn apply_overrides_from(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("SHELFCODE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = var("SHELFCODE_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring SHELFCODE_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(attempts) = var("SHELFCODE_ALLOC_MAX_ATTEMPTS") {
            match attempts.parse::<u32>() {
                Ok(n) => self.allocation.max_attempts = n,
                Err(_) => warn!(value = %attempts, "Ignoring SHELFCODE_ALLOC_MAX_ATTEMPTS"),
            }
        }

        if let Some(timeout) = var("SHELFCODE_ALLOC_TIMEOUT_MS") {
            match timeout.parse::<u64>() {
                Ok(ms) => self.allocation.attempt_timeout_ms = ms,
                Err(_) => warn!(value = %timeout, "Ignoring SHELFCODE_ALLOC_TIMEOUT_MS"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "shelfcode", "shelfcode")
            .map(|dirs| dirs.config_dir().join("shelfcode.toml"))
    }

    /// Builds the pool configuration from the `[database]` and
    /// `[allocation]` sections.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
            .retry_policy(self.allocation.retry_policy())
    }
}
