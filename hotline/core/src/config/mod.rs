//! TOML Configuration File Support
//!
//! Centralized configuration loading for the client core, supporting a TOML
//! file at `~/.config/hotline/client.toml`.
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. CLI arguments (applied by the caller through [`ConfigOverrides`])
//! 2. Environment variables (`HOTLINE_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [api]
//! base_url = "https://hotline.example.com/api"
//! request_timeout_secs = 30
//!
//! [chat]
//! message_limit = 50
//! correlation_window_secs = 120
//!
//! [player]
//! skip_interval_secs = 15
//! now_playing_album = "Hal's Hotline"
//!
//! [user]
//! profile_path = "/home/me/.local/share/hotline/profile.json"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default REST base URL (local development server)
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
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
// TOML Configuration Structures
// =============================================================================

/// `[api]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiToml {
    /// REST base URL, including the `/api` prefix
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

/// `[chat]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatToml {
    /// How many recent messages a subscription keeps
    pub message_limit: Option<usize>,

    /// How far back a server echo may be stamped relative to the local send
    pub correlation_window_secs: Option<u64>,
}

/// `[player]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerToml {
    /// Skip forward/backward step in seconds
    pub skip_interval_secs: Option<u64>,

    /// Album title shown on the lock screen
    pub now_playing_album: Option<String>,
}

/// `[user]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserToml {
    /// Where the device-local profile is persisted
    pub profile_path: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientToml {
    /// REST section
    pub api: ApiToml,
    /// Chat section
    pub chat: ChatToml,
    /// Player section
    pub player: PlayerToml,
    /// User section
    pub user: UserToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// REST base URL (no trailing slash)
    pub api_base_url: String,

    /// Per-request timeout for REST calls
    pub request_timeout: Duration,

    /// Messages kept per chat subscription
    pub message_limit: usize,

    /// Correlation window for optimistic chat entries
    pub correlation_window: Duration,

    /// Skip forward/backward step
    pub skip_interval: Duration,

    /// Album title pushed with now-playing metadata
    pub now_playing_album: String,

    /// Profile file location
    pub profile_path: Option<PathBuf>,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(120),
            message_limit: 50,
            correlation_window: Duration::from_secs(120),
            skip_interval: Duration::from_secs(15),
            now_playing_album: "Hal's Hotline".to_string(),
            profile_path: default_profile_path(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Reject values the client cannot work with
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(ConfigError::ValidationError(format!(
                "api.base_url must be an http(s) URL, got {:?}",
                self.api_base_url
            )));
        }
        if self.message_limit == 0 {
            return Err(ConfigError::ValidationError(
                "chat.message_limit must be at least 1".to_string(),
            ));
        }
        if self.skip_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "player.skip_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/hotline/client.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("hotline").join("client.toml"))
}

/// Get the default profile path (`$XDG_DATA_HOME/hotline/profile.json`)
#[must_use]
pub fn default_profile_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("hotline").join("profile.json"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path, then apply the environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed, or
/// if the merged configuration fails validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ClientConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

fn load_config_with_env(
    path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientConfig, ConfigError> {
    let mut config = ClientConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ClientToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

fn apply_toml_config(config: &mut ClientConfig, toml: &ClientToml) {
    if let Some(ref url) = toml.api.base_url {
        config.api_base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(secs) = toml.api.request_timeout_secs {
        config.request_timeout = Duration::from_secs(secs);
    }

    if let Some(limit) = toml.chat.message_limit {
        config.message_limit = limit;
    }
    if let Some(secs) = toml.chat.correlation_window_secs {
        config.correlation_window = Duration::from_secs(secs);
    }

    if let Some(secs) = toml.player.skip_interval_secs {
        config.skip_interval = Duration::from_secs(secs);
    }
    if let Some(ref album) = toml.player.now_playing_album {
        config.now_playing_album.clone_from(album);
    }

    if let Some(ref path) = toml.user.profile_path {
        config.profile_path = Some(PathBuf::from(path));
    }
}

fn apply_env_config(config: &mut ClientConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(url) = env("HOTLINE_API_URL") {
        config.api_base_url = url.trim_end_matches('/').to_string();
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = env("HOTLINE_REQUEST_TIMEOUT") {
        if let Ok(secs) = timeout.parse::<u64>() {
            config.request_timeout = Duration::from_secs(secs);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(limit) = env("HOTLINE_MESSAGE_LIMIT") {
        if let Ok(n) = limit.parse::<usize>() {
            config.message_limit = n;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(interval) = env("HOTLINE_SKIP_INTERVAL") {
        if let Ok(secs) = interval.parse::<u64>() {
            config.skip_interval = Duration::from_secs(secs);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(path) = env("HOTLINE_PROFILE_PATH") {
        config.profile_path = Some(PathBuf::from(path));
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// REST base URL override
    pub api_base_url: Option<String>,

    /// Message limit override
    pub message_limit: Option<usize>,

    /// Profile path override
    pub profile_path: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set REST base URL override
    #[must_use]
    pub fn with_api_base_url(mut self, url: String) -> Self {
        self.api_base_url = Some(url);
        self
    }

    /// Set message limit override
    #[must_use]
    pub fn with_message_limit(mut self, limit: usize) -> Self {
        self.message_limit = Some(limit);
        self
    }

    /// Set profile path override
    #[must_use]
    pub fn with_profile_path(mut self, path: PathBuf) -> Self {
        self.profile_path = Some(path);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut ClientConfig) {
        if self.api_base_url.is_some() || self.message_limit.is_some() || self.profile_path.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.api_base_url {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(limit) = self.message_limit {
            config.message_limit = limit;
        }
        if let Some(ref path) = self.profile_path {
            config.profile_path = Some(path.clone());
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();

        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.message_limit, 50);
        assert_eq!(config.skip_interval, Duration::from_secs(15));
        assert_eq!(config.now_playing_album, "Hal's Hotline");
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config_with_env(
            Some(PathBuf::from("/nonexistent/hotline/client.toml")),
            no_env,
        )
        .unwrap();

        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[api]
base_url = "https://hal.example.com/api/"
request_timeout_secs = 10

[chat]
message_limit = 20

[player]
skip_interval_secs = 30
"#
        )
        .unwrap();

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();

        assert_eq!(config.api_base_url, "https://hal.example.com/api");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.message_limit, 20);
        assert_eq!(config.skip_interval, Duration::from_secs(30));
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[chat]\nmessage_limit = 20").unwrap();

        let env: HashMap<&str, &str> = [("HOTLINE_MESSAGE_LIMIT", "75")].into_iter().collect();
        let config = load_config_with_env(Some(file.path().to_path_buf()), |key| {
            env.get(key).map(ToString::to_string)
        })
        .unwrap();

        assert_eq!(config.message_limit, 75);
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_unparseable_env_value_is_ignored() {
        let config = load_config_with_env(None, |key| {
            (key == "HOTLINE_SKIP_INTERVAL").then(|| "soon".to_string())
        })
        .unwrap();

        assert_eq!(config.skip_interval, Duration::from_secs(15));
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[chat\nmessage_limit = ").unwrap();

        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_zero_message_limit_fails_validation() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[chat]\nmessage_limit = 0").unwrap();

        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = ClientConfig::default();
        ConfigOverrides::new()
            .with_api_base_url("http://10.0.2.2:3000/api/".to_string())
            .with_message_limit(10)
            .apply(&mut config);

        assert_eq!(config.api_base_url, "http://10.0.2.2:3000/api");
        assert_eq!(config.message_limit, 10);
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_empty_overrides_keep_source() {
        let mut config = ClientConfig::default();
        ConfigOverrides::new().apply(&mut config);
        assert_eq!(config.source(), ConfigSource::Default);
    }
}
