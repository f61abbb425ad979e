//! Configuration Loading
//!
//! Resolves where the client sends its requests, and the log filter the CLI
//! installs, from multiple sources.
//!
//! # Priority Order
//!
//! Configuration values are resolved in this order (highest priority first):
//!
//! 1. **CLI arguments**: passed in through [`ConfigOverrides`]
//! 2. **Environment variables**: `CHATSTREAM_ENDPOINT`
//! 3. **TOML config file**: `--config <path>`, else
//!    `$XDG_CONFIG_HOME/chatstream/config.toml`
//! 4. **Defaults**: `http://localhost:8000/chat`
//!
//! # Config File Format
//!
//! ```toml
//! [client]
//! endpoint = "http://localhost:8000/chat"
//!
//! [logging]
//! filter = "chatstream=debug"
//! ```

use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Endpoint used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/chat";

/// Environment variable overriding the endpoint
pub const ENDPOINT_ENV: &str = "CHATSTREAM_ENDPOINT";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path that failed to read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value is present but unusable
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Where a configuration value came from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value came from CLI argument
    Cli,
    /// Value came from environment variable
    Env,
    /// Value came from TOML config file
    File,
    /// Value is the default
    #[default]
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// What the core needs to open streams: the endpoint URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Absolute `http`/`https` URL requests are POSTed to
    pub endpoint: Url,
}

impl ClientConfig {
    /// Create a configuration for an endpoint, validating it
    pub fn new(endpoint: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
        })
    }

    /// Configuration for [`DEFAULT_ENDPOINT`]
    pub fn local() -> Result<Self, ConfigError> {
        Self::new(DEFAULT_ENDPOINT)
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::ValidationError(format!("endpoint '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        "http" | "https" => Err(ConfigError::ValidationError(format!(
            "endpoint '{raw}' has no host"
        ))),
        other => Err(ConfigError::ValidationError(format!(
            "endpoint '{raw}' uses unsupported scheme '{other}'"
        ))),
    }
}

// =============================================================================
// TOML File Structure
// =============================================================================

/// Root of the TOML config file
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// `[client]` section
    pub client: ClientToml,
    /// `[logging]` section
    pub logging: LoggingToml,
}

/// `[client]` section
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClientToml {
    /// Endpoint URL
    pub endpoint: Option<String>,
}

/// `[logging]` section
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoggingToml {
    /// `tracing-subscriber` `EnvFilter` directive
    pub filter: Option<String>,
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/chatstream/config.toml`, or `None` when the
/// platform has no config directory.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("chatstream").join("config.toml"))
}

/// Read and parse a config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ConfigFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), "Loaded config file");
    Ok(file)
}

/// Locate and read the config file
///
/// An explicit path must exist. The default path is optional: if nothing is
/// there, defaults apply.
fn read_config_file(explicit: Option<&Path>) -> Result<Option<(PathBuf, ConfigFile)>, ConfigError> {
    if let Some(path) = explicit {
        return Ok(Some((path.to_path_buf(), load_config_file(path)?)));
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            let file = load_config_file(&path)?;
            Ok(Some((path, file)))
        }
        Some(path) => {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Command-line overrides, the highest-priority source
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Endpoint override
    pub endpoint: Option<String>,
    /// Explicit config file path
    pub config_path: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set endpoint override
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set config file path
    #[must_use]
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }
}

/// Fully resolved configuration
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    /// Client configuration for the core
    pub client: ClientConfig,
    /// Where the endpoint came from
    pub endpoint_source: ConfigSource,
    /// Log filter from the config file, if any
    pub log_filter: Option<String>,
    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,
}

/// Load configuration from all sources
///
/// Reads the config file, then `CHATSTREAM_ENDPOINT`, then applies
/// `overrides`.
pub fn load_config(overrides: &ConfigOverrides) -> Result<ResolvedConfig, ConfigError> {
    let file = read_config_file(overrides.config_path.as_deref())?;
    let env_endpoint = std::env::var(ENDPOINT_ENV).ok();
    resolve_config(overrides, file, env_endpoint.as_deref())
}

/// Merge already-gathered sources by priority
pub fn resolve_config(
    overrides: &ConfigOverrides,
    file: Option<(PathBuf, ConfigFile)>,
    env_endpoint: Option<&str>,
) -> Result<ResolvedConfig, ConfigError> {
    let (config_file_path, file) = match file {
        Some((path, file)) => (Some(path), file),
        None => (None, ConfigFile::default()),
    };

    let env_endpoint = env_endpoint.filter(|value| !value.trim().is_empty());

    let (raw, endpoint_source) = if let Some(endpoint) = overrides.endpoint.as_deref() {
        (Some(endpoint), ConfigSource::Cli)
    } else if let Some(endpoint) = env_endpoint {
        (Some(endpoint), ConfigSource::Env)
    } else if let Some(endpoint) = file.client.endpoint.as_deref() {
        (Some(endpoint), ConfigSource::File)
    } else {
        (None, ConfigSource::Default)
    };

    let client = ClientConfig::new(raw.unwrap_or(DEFAULT_ENDPOINT))?;

    info!(
        endpoint = %client.endpoint,
        source = %endpoint_source,
        "Configuration resolved"
    );

    Ok(ResolvedConfig {
        client,
        endpoint_source,
        log_filter: file.logging.filter,
        config_file_path,
    })
}

// =============================================================================
// Tests
// =============================================================================
