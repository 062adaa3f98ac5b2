//! Configuration module for BackupBox.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, saving, validation, defaults, and a builder pattern for
//! programmatic use. The ordered list of backed-up folders lives in the same
//! file and is rewritten after every add/remove.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::folder::FolderSet;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for BackupBox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
    /// Folders to back up, in synchronization order.
    pub folders: FolderSet,
}

/// Remote store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the storage server, without the `/api` suffix.
    pub base_url: String,
    /// Application namespace used in every storage URL.
    pub app_id: String,
    /// Optional bearer token sent with every request.
    pub access_token: Option<String>,
}

/// Synchronization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Pause between two consecutive uploads, in milliseconds.
    pub upload_delay_ms: u64,
    /// Files larger than this (in bytes) are never uploaded.
    pub max_file_size: u64,
    /// Delay before the next scheduled run after a run completes.
    pub schedule_interval_secs: u64,
    /// Interval between two scans of the watch loop.
    pub watch_interval_secs: u64,
    /// Maximum directory nesting the walker descends into.
    pub max_depth: usize,
    /// Whether the daemon runs a sync right after startup.
    pub run_on_start: bool,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

/// Default ceiling for a single uploaded file (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Config::load() / save()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Write the configuration to `path`.
    ///
    /// The file is written next to its destination and renamed over it, so a
    /// crash never leaves a truncated configuration behind.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }

        let yaml = serde_yaml::to_string(self).context("Failed to serialize config")?;
        let tmp = path.with_extension("yaml.tmp");
        std::fs::write(&tmp, yaml)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/backupbox/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("backupbox")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            app_id: "backupbox".to_string(),
            access_token: None,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            upload_delay_ms: 1000,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            schedule_interval_secs: 300,
            watch_interval_secs: 30,
            max_depth: 64,
            run_on_start: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.max_depth"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. Folder paths are
    /// not checked for existence: an unreachable folder is reported by the
    /// synchronization run itself.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- remote ---
        if !(self.remote.base_url.starts_with("http://")
            || self.remote.base_url.starts_with("https://"))
        {
            errors.push(ValidationError {
                field: "remote.base_url".into(),
                message: format!("must be an http(s) URL, got '{}'", self.remote.base_url),
            });
        }
        if self.remote.app_id.trim().is_empty() || self.remote.app_id.contains('/') {
            errors.push(ValidationError {
                field: "remote.app_id".into(),
                message: "must be a non-empty name without '/'".into(),
            });
        }
        if matches!(&self.remote.access_token, Some(t) if t.trim().is_empty()) {
            errors.push(ValidationError {
                field: "remote.access_token".into(),
                message: "must not be empty when set".into(),
            });
        }

        // --- sync ---
        if self.sync.max_file_size == 0 {
            errors.push(ValidationError {
                field: "sync.max_file_size".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.schedule_interval_secs == 0 {
            errors.push(ValidationError {
                field: "sync.schedule_interval_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.watch_interval_secs == 0 {
            errors.push(ValidationError {
                field: "sync.watch_interval_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.max_depth == 0 {
            errors.push(ValidationError {
                field: "sync.max_depth".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        // --- folders ---
        for (i, folder) in self.folders.iter().enumerate() {
            if !folder.local_path.is_absolute() {
                errors.push(ValidationError {
                    field: format!("folders[{i}].local_path"),
                    message: format!(
                        "must be an absolute path, got '{}'",
                        folder.local_path.display()
                    ),
                });
            }
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use backupbox_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .remote_base_url("https://backup.example.com")
///     .sync_upload_delay_ms(250)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- remote ---

    pub fn remote_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.remote.base_url = url.into();
        self
    }

    pub fn remote_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.config.remote.app_id = app_id.into();
        self
    }

    pub fn remote_access_token(mut self, token: impl Into<String>) -> Self {
        self.config.remote.access_token = Some(token.into());
        self
    }

    // --- sync ---

    pub fn sync_upload_delay_ms(mut self, ms: u64) -> Self {
        self.config.sync.upload_delay_ms = ms;
        self
    }

    pub fn sync_max_file_size(mut self, bytes: u64) -> Self {
        self.config.sync.max_file_size = bytes;
        self
    }

    pub fn sync_schedule_interval_secs(mut self, secs: u64) -> Self {
        self.config.sync.schedule_interval_secs = secs;
        self
    }

    pub fn sync_watch_interval_secs(mut self, secs: u64) -> Self {
        self.config.sync.watch_interval_secs = secs;
        self
    }

    pub fn sync_max_depth(mut self, depth: usize) -> Self {
        self.config.sync.max_depth = depth;
        self
    }

    pub fn sync_run_on_start(mut self, run: bool) -> Self {
        self.config.sync.run_on_start = run;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- folders ---

    pub fn folders(mut self, folders: FolderSet) -> Self {
        self.config.folders = folders;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
