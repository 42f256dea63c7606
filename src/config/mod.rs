//! Configuration management for mongoq
//!
//! Configuration is read from a TOML file (by default
//! `~/.mongoq/config.toml`). Every field has a default, so a missing file or
//! a partial file is fine. Command-line arguments override file values.
//!
//! ```toml
//! [connection]
//! default_uri = "mongodb://localhost:27017"
//! timeout = 10
//!
//! [query]
//! page_size = 50
//! max_query_limit = 1000
//!
//! [display]
//! format = "json-pretty"
//! table_style = "psql"
//!
//! [profiles.local]
//! host = "localhost"
//! database = "test"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::connection::ConnectionProfile;
use crate::error::{ConfigError, Result};
use crate::executor::{DEFAULT_PAGE_SIZE, MAX_QUERY_LIMIT, QueryLimits};
use crate::formatter::TableStyle;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Connection configuration
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Query defaults
    #[serde(default)]
    pub query: QueryConfig,

    /// Display configuration
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Named connection profiles
    #[serde(default)]
    pub profiles: BTreeMap<String, ConnectionProfile>,
}

/// Connection-related configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Default MongoDB connection URI
    #[serde(default = "default_uri")]
    pub default_uri: String,

    /// Connect and server selection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Maximum pool size
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,

    /// Minimum pool size
    #[serde(default = "default_min_pool_size")]
    pub min_pool_size: u32,

    /// Application name reported to the server
    #[serde(default = "default_app_name")]
    pub app_name: String,
}

/// Query defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Rows per page when none is given on the command line
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// Row cap for structured queries
    #[serde(default = "default_max_query_limit")]
    pub max_query_limit: i64,
}

/// Display and output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Output format (json, json-pretty, table)
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Enable colored output
    #[serde(default = "default_color_output")]
    pub color_output: bool,

    /// Maximum width of a table cell
    #[serde(default = "default_max_cell_width")]
    pub max_cell_width: usize,

    /// Border style of table output (modern, ascii, psql)
    #[serde(default = "default_table_style")]
    pub table_style: TableStyle,
}

/// Output format options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Single-line relaxed extended JSON, one document per line
    Json,

    /// Indented relaxed extended JSON
    JsonPretty,

    /// ASCII table, one column per top-level field
    Table,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_max_pool_size() -> u32 {
    10
}

fn default_min_pool_size() -> u32 {
    0
}

fn default_app_name() -> String {
    "mongoq".to_string()
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn default_max_query_limit() -> i64 {
    MAX_QUERY_LIMIT
}

fn default_format() -> OutputFormat {
    OutputFormat::JsonPretty
}

fn default_color_output() -> bool {
    true
}

fn default_max_cell_width() -> usize {
    40
}

fn default_table_style() -> TableStyle {
    TableStyle::Modern
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    false
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            default_uri: default_uri(),
            timeout: default_timeout(),
            max_pool_size: default_max_pool_size(),
            min_pool_size: default_min_pool_size(),
            app_name: default_app_name(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_query_limit: default_max_query_limit(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            color_output: default_color_output(),
            max_cell_width: default_max_cell_width(),
            table_style: default_table_style(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// With an explicit path the file must exist. Without one the default
    /// path is tried and defaults are used when it is absent.
    ///
    /// # Arguments
    /// * `path` - Optional path to a TOML configuration file
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded and validated configuration or error
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::default_path(), false),
        };

        if !path.exists() {
            if required {
                return Err(ConfigError::FileNotFound(path.display().to_string()).into());
            }
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        tracing::debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - Path to default configuration file
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".mongoq")
            .join("config.toml")
    }

    /// Save configuration to a file, creating parent directories
    ///
    /// # Arguments
    /// * `path` - Path where to save the configuration
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if !crate::utils::validate::is_valid_connection_uri(&self.connection.default_uri) {
            return Err(invalid("connection.default_uri", &self.connection.default_uri));
        }
        if self.connection.min_pool_size > self.connection.max_pool_size {
            return Err(invalid(
                "connection.min_pool_size",
                &self.connection.min_pool_size.to_string(),
            ));
        }
        if self.query.page_size == 0 {
            return Err(invalid("query.page_size", "0"));
        }
        if self.query.max_query_limit <= 0 {
            return Err(invalid(
                "query.max_query_limit",
                &self.query.max_query_limit.to_string(),
            ));
        }
        Ok(())
    }

    /// Dispatcher limits derived from the `[query]` section
    pub fn query_limits(&self) -> QueryLimits {
        QueryLimits {
            max_query_limit: self.query.max_query_limit,
        }
    }

    /// Look up a named connection profile, with its name filled in
    pub fn profile(&self, name: &str) -> Option<ConnectionProfile> {
        self.profiles.get(name).map(|profile| ConnectionProfile {
            name: name.to_string(),
            ..profile.clone()
        })
    }
}

fn invalid(field: &str, value: &str) -> crate::error::MongoqError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
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
