//! Configuration system for the executor client
//!
//! Sources, highest precedence first:
//! 1. Environment variables (EXECUTOR_* prefix, logging and HTTP tuning only)
//! 2. Configuration file (JSON)
//! 3. Default values
//!
//! `backend_url` can only come from the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::task::TaskDefinition;

/// File name looked up next to the executable
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Main executor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Base URL of the backend receiving reports
    pub backend_url: String,

    /// HTTP client settings
    pub http: HttpSettings,

    /// Logging configuration
    pub logging: LoggingSettings,

    /// Simulated task (built-in demo task when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskDefinition>,
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Whole-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Extra attempts for transient failures (0 = fail on first error)
    pub max_retries: u32,

    /// First retry delay in milliseconds
    pub retry_initial_delay_ms: u64,

    /// Upper bound for a single retry delay in milliseconds
    pub retry_max_delay_ms: u64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (None = console only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

// Default implementations

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            http: HttpSettings::default(),
            logging: LoggingSettings::default(),
            task: None,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            max_retries: 0,
            retry_initial_delay_ms: 500,
            retry_max_delay_ms: 5000,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_files: 5,
            json_format: false,
        }
    }
}

impl HttpSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_initial_delay(&self) -> Duration {
        Duration::from_millis(self.retry_initial_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }
}

impl ExecutorConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = Self::resolve_path(config_path)?;
        debug!(path = %path.display(), "Loading configuration file");

        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::config_not_found(&path),
            _ => Error::IoRead {
                path: path.clone(),
                source: e,
            },
        })?;

        let mut config = Self::from_json(&content)?;
        config.apply_env_overrides();
        config.expand_paths();
        config.validate()?;

        Ok(config)
    }

    /// Parse a configuration document without touching the environment
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::ConfigParse {
            message: e.to_string(),
            source: e,
        })
    }

    /// Explicit path (with `~` expanded) or `config.json` beside the executable
    fn resolve_path(explicit_path: Option<&str>) -> Result<PathBuf> {
        if let Some(path) = explicit_path {
            return Ok(PathBuf::from(expand_path(path)));
        }

        let exe = std::env::current_exe()
            .map_err(|e| Error::Internal(format!("Cannot locate executable: {}", e)))?;
        let dir = exe.parent().unwrap_or(Path::new("."));
        Ok(dir.join(CONFIG_FILE_NAME))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Logging settings
        if let Ok(val) = std::env::var("EXECUTOR_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("EXECUTOR_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("EXECUTOR_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }

        // HTTP settings
        if let Ok(val) = std::env::var("EXECUTOR_REQUEST_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.http.request_timeout_secs = n;
            }
        }
        if let Ok(val) = std::env::var("EXECUTOR_MAX_RETRIES") {
            if let Ok(n) = val.parse() {
                self.http.max_retries = n;
            }
        }
    }

    /// Expand ~ and environment variables in paths
    fn expand_paths(&mut self) {
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.backend_url.trim().is_empty() {
            return Err(Error::config_field_invalid(
                "backend_url",
                "backend_url is required",
            ));
        }

        let url = Url::parse(&self.backend_url).map_err(|e| {
            Error::config_field_invalid(
                "backend_url",
                format!("backend_url '{}' is not a valid URL: {}", self.backend_url, e),
            )
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::config_field_invalid(
                "backend_url",
                "backend_url must start with http:// or https://",
            ));
        }

        if self.http.request_timeout_secs == 0 {
            return Err(Error::config_field_invalid(
                "http.request_timeout_secs",
                "request timeout must be at least 1 second",
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        if let Some(ref task) = self.task {
            task.validate()?;
        }

        Ok(())
    }

    /// Backend base URL without trailing slashes
    pub fn base_url(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }

    /// The task to simulate
    pub fn task(&self) -> TaskDefinition {
        self.task.clone().unwrap_or_else(TaskDefinition::demo)
    }
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Write a starter configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = ExecutorConfig::resolve_path(path)?;

    if config_path.exists() && !force {
        return Err(Error::config_validation(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    fs::write(&config_path, generate_default_config()?).map_err(|e| Error::IoWrite {
        path: config_path.clone(),
        source: e,
    })?;

    Ok(config_path)
}

/// Starter configuration: a local backend and the demo task spelled out
fn generate_default_config() -> Result<String> {
    let config = ExecutorConfig {
        backend_url: "http://localhost:8000".to_string(),
        task: Some(TaskDefinition::demo()),
        ..Default::default()
    };
    let mut content = serde_json::to_string_pretty(&config)?;
    content.push('\n');
    Ok(content)
}
