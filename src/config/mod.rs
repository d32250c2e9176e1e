//! Configuration management.
//!
//! Settings come from an optional TOML file overlaid with environment
//! variables prefixed `LINEAR_MCP_`, using `__` between section and key:
//!
//! ```toml
//! [linear]
//! api_key = "lin_api_..."
//! api_url = "https://api.linear.app/graphql"
//! timeout_secs = 30
//! max_retries = 3
//!
//! [server]
//! name = "linear-mcp"
//! host = "127.0.0.1"
//! port = 8080
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```
//!
//! `LINEAR_MCP_LINEAR__API_KEY` overrides `linear.api_key`; the plain
//! `LINEAR_API_KEY` variable is used when no key is configured at all.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::tracker::DEFAULT_API_URL;
use crate::utils::RetryConfig;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "linear-mcp.toml";

const ENV_PREFIX: &str = "LINEAR_MCP";
const API_KEY_ENV: &str = "LINEAR_API_KEY";
const REDACTED: &str = "<redacted>";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub linear: LinearConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Linear API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConfig {
    /// Personal API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first attempt on network errors and rate limits
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

/// MCP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Name reported to MCP clients
    #[serde(default = "default_server_name")]
    pub name: String,

    /// Bind address for the HTTP transport
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_server_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Load from `path` (if any) and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Load from `path` (if any) and `env`, or the process environment when `env` is `None`
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            tracing::debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env.clone()),
        );

        let mut config: Config = builder.build()?.try_deserialize()?;

        if config.linear.api_key.is_none() {
            config.linear.api_key = match &env {
                Some(vars) => vars.get(API_KEY_ENV).cloned(),
                None => std::env::var(API_KEY_ENV).ok(),
            };
        }
        config.linear.api_key = config
            .linear
            .api_key
            .take()
            .filter(|k| !k.trim().is_empty());

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges the deserializer cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.linear.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "linear.timeout_secs must be greater than zero".into(),
            ));
        }
        if !self.linear.api_url.starts_with("http://") && !self.linear.api_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid(format!(
                "linear.api_url must be an http(s) URL, got '{}'",
                self.linear.api_url
            )));
        }
        if self.server.name.trim().is_empty() {
            return Err(ConfigError::Invalid("server.name must not be empty".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.linear.timeout_secs)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::with_retries(self.linear.max_retries)
    }

    /// HTTP transport bind address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|_| {
                ConfigError::Invalid(format!(
                    "server.host '{}' is not an IP address",
                    self.server.host
                ))
            })
    }

    /// Render as TOML with the API key redacted
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        if shown.linear.api_key.is_some() {
            shown.linear.api_key = Some(REDACTED.to_string());
        }
        Ok(toml::to_string_pretty(&shown)?)
    }

    /// Write as TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Per-user configuration file, e.g. `~/.config/linear-mcp/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("config.toml"))
}

/// Resolve the configuration file to load.
///
/// An explicit path is returned as given; otherwise `./linear-mcp.toml` and
/// then the per-user file are used if they exist.
pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    user_config_path().filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_with_env(None, env(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.linear.api_url, DEFAULT_API_URL);
        assert_eq!(config.retry_config().max_attempts, 4);
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[linear]
api_key = "lin_api_file"
timeout_secs = 10

[server]
port = 9000

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        let config = Config::load_with_env(Some(&path), env(&[])).unwrap();
        assert_eq!(config.linear.api_key.as_deref(), Some("lin_api_file"));
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.linear.max_retries, 3);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9000\n").unwrap();

        let config = Config::load_with_env(
            Some(&path),
            env(&[
                ("LINEAR_MCP_SERVER__PORT", "9100"),
                ("LINEAR_MCP_LINEAR__API_KEY", "lin_api_env"),
                ("LINEAR_API_KEY", "lin_api_fallback"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.linear.api_key.as_deref(), Some("lin_api_env"));
    }

    #[test]
    fn test_plain_api_key_fallback() {
        let config =
            Config::load_with_env(None, env(&[("LINEAR_API_KEY", "lin_api_plain")])).unwrap();
        assert_eq!(config.linear.api_key.as_deref(), Some("lin_api_plain"));

        let config = Config::load_with_env(None, env(&[("LINEAR_API_KEY", " ")])).unwrap();
        assert!(config.linear.api_key.is_none());
    }

    #[test]
    fn test_invalid_values() {
        let result = Config::load_with_env(None, env(&[("LINEAR_MCP_LINEAR__TIMEOUT_SECS", "0")]));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "invalid = toml = content").unwrap();
        assert!(matches!(
            Config::load_with_env(Some(&path), env(&[])),
            Err(ConfigError::Load(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let path = PathBuf::from("/nonexistent/linear-mcp.toml");
        assert!(Config::load_with_env(Some(&path), env(&[])).is_err());
        assert_eq!(find_config_file(Some(&path)), Some(path));
    }

    #[test]
    fn test_to_toml_redacts_key() {
        let mut config = Config::default();
        config.linear.api_key = Some("lin_api_secret".into());

        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains(REDACTED));
        assert!(!rendered.contains("lin_api_secret"));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.server.port = 7000;
        config.save(&path).unwrap();

        let loaded = Config::load_with_env(Some(&path), env(&[])).unwrap();
        assert_eq!(loaded.server.port, 7000);
    }

    #[test]
    fn test_socket_addr_rejects_hostname() {
        let mut config = Config::default();
        config.server.host = "localhost".into();
        assert!(matches!(config.socket_addr(), Err(ConfigError::Invalid(_))));
    }
}
