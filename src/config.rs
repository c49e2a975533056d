/*!
 * Configuration types for rmbridge
 */

use rmbridge_connect::{ConnectOptions, DEFAULT_RM_ADDRESS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BridgeError, Result};
use crate::poll::PollPolicy;

/// Default location of the job tracker's system directory
pub const DEFAULT_SYSTEM_DIR: &str = "/tmp/rmbridge/mapred/system";

/// Default filesystem URI reported to legacy clients
pub const DEFAULT_FS: &str = "file:///";

/// Main configuration for the delegate and the CLI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub resource_manager: ResourceManagerConfig,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub staging: StagingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where and how to reach the resource manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceManagerConfig {
    /// `host:port` of the client service
    #[serde(default = "default_address")]
    pub address: String,

    /// Bearer token sent with every request
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Server name to verify; enables TLS
    #[serde(default)]
    pub tls_domain: Option<String>,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ResourceManagerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            auth_token: None,
            tls_domain: None,
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Coordinator readiness polling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Pause between two coordinator queries
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,

    /// Give up after this many seconds (None = wait forever)
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            deadline_secs: None,
        }
    }
}

/// Staging, system directory and filesystem name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Staging area for job resources (required by `staging-dir`)
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    #[serde(default = "default_system_dir")]
    pub system_dir: PathBuf,

    #[serde(default = "default_fs")]
    pub default_fs: String,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            staging_dir: None,
            system_dir: default_system_dir(),
            default_fs: default_fs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

fn default_address() -> String {
    DEFAULT_RM_ADDRESS.to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_system_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SYSTEM_DIR)
}

fn default_fs() -> String {
    DEFAULT_FS.to_string()
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config: BridgeConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| BridgeError::Configuration(format!("Cannot serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Default config file location (`~/.config/rmbridge/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rmbridge").join("config.toml"))
    }

    /// Check values that serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        if self.resource_manager.address.trim().is_empty() {
            return Err(BridgeError::Configuration(
                "resource_manager.address must not be empty".to_string(),
            ));
        }
        if self.poll.interval_ms == 0 {
            return Err(BridgeError::Configuration(
                "poll.interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.resource_manager.connect_timeout_secs == 0
            || self.resource_manager.request_timeout_secs == 0
        {
            return Err(BridgeError::Configuration(
                "resource manager timeouts must be greater than zero".to_string(),
            ));
        }
        if self.staging.system_dir.as_os_str().is_empty() {
            return Err(BridgeError::Configuration(
                "staging.system_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Connection settings for `rmbridge_connect::connect`
    pub fn connect_options(&self) -> ConnectOptions {
        let rm = &self.resource_manager;
        ConnectOptions {
            address: rm.address.clone(),
            auth_token: rm.auth_token.clone(),
            tls_domain: rm.tls_domain.clone(),
            connect_timeout: Duration::from_secs(rm.connect_timeout_secs),
            request_timeout: Duration::from_secs(rm.request_timeout_secs),
        }
    }

    /// Poll policy for coordinator readiness
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll.interval_ms),
            deadline: self.poll.deadline_secs.map(Duration::from_secs),
        }
    }
}
