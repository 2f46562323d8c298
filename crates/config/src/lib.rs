//! Configuration loading, validation, and management for GroupWarden.
//!
//! Loads configuration from `~/.groupwarden/config.toml` with environment
//! variable overrides. Validates all settings at startup. The resulting
//! value is handed to the reconciler once and never re-read.

use groupwarden_core::{IsolationCheck, UserErrorPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.groupwarden/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Mealie server connection
    #[serde(default)]
    pub mealie: MealieConfig,

    /// Poll schedule
    #[serde(default)]
    pub poll: PollConfig,

    /// Reconciliation policy
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Retry policy for idempotent HTTP calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MealieConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token for the admin API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Page size used when listing groups
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:9000".into()
}
fn default_per_page() -> u32 {
    100
}
fn default_timeout_secs() -> u64 {
    30
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for MealieConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MealieConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("per_page", &self.per_page)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for MealieConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            per_page: default_per_page(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Stop the daemon on the first failed tick instead of logging it
    #[serde(default)]
    pub fail_fast: bool,
}

fn default_interval_ms() -> u64 {
    1000
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            fail_fast: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default)]
    pub isolation_check: IsolationCheck,

    #[serde(default)]
    pub on_user_error: UserErrorPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per call, 1 = no retry
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    1
}
fn default_initial_backoff_ms() -> u64 {
    200
}
fn default_max_backoff_ms() -> u64 {
    5000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Load from `path` (or the default path), then apply process environment
    /// overrides:
    /// - `GROUPWARDEN_API_KEY` / `MEALIE_API_KEY`
    /// - `MEALIE_URL`
    /// - `POLLING_INTERVAL` (milliseconds)
    /// - `MEALIE_API_PER_PAGE`
    /// - `LOGGING_LEVEL` (`DEBUG` also turns on fail-fast)
    /// - `GROUPWARDEN_FAIL_FAST`
    pub fn load_with_path(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Like [`AppConfig::load_with_path`], reading variables through `lookup`.
    ///
    /// Validation runs once, after the overrides.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_path = Self::config_path();
        let path = path.unwrap_or(&default_path);
        let mut config = Self::load_from(path)?;
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a specific file path. A missing file yields the defaults.
    ///
    /// The result is not validated; call [`AppConfig::validate`] once all
    /// overrides are applied.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GROUPWARDEN_API_KEY").or_else(|| lookup("MEALIE_API_KEY")) {
            self.mealie.api_key = Some(key);
        }

        if let Some(url) = lookup("MEALIE_URL") {
            self.mealie.base_url = url;
        }

        if let Some(raw) = lookup("POLLING_INTERVAL") {
            self.poll.interval_ms = parse_env("POLLING_INTERVAL", &raw)?;
        }

        if let Some(raw) = lookup("MEALIE_API_PER_PAGE") {
            self.mealie.per_page = parse_env("MEALIE_API_PER_PAGE", &raw)?;
        }

        if let Some(level) = lookup("LOGGING_LEVEL") {
            let level = match level.trim().to_lowercase().as_str() {
                "warning" => "warn".to_string(),
                "critical" | "fatal" => "error".to_string(),
                other => other.to_string(),
            };
            if level == "debug" {
                self.poll.fail_fast = true;
            }
            self.logging.level = level;
        }

        if let Some(raw) = lookup("GROUPWARDEN_FAIL_FAST") {
            self.poll.fail_fast = matches!(
                raw.to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".groupwarden")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll.interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "poll.interval_ms must be > 0".into(),
            ));
        }

        if self.mealie.per_page == 0 {
            return Err(ConfigError::ValidationError(
                "mealie.per_page must be > 0".into(),
            ));
        }

        if !self.mealie.base_url.starts_with("http://")
            && !self.mealie.base_url.starts_with("https://")
        {
            return Err(ConfigError::ValidationError(format!(
                "mealie.base_url must start with http:// or https://, got '{}'",
                self.mealie.base_url
            )));
        }

        if self.mealie.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "mealie.timeout_secs must be > 0".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be >= 1".into(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be \"pretty\" or \"json\", got '{}'",
                self.logging.format
            )));
        }

        Ok(())
    }

    /// The API key, or [`ConfigError::MissingCredential`] when none is set.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        match self.mealie.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingCredential),
        }
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| {
        ConfigError::ValidationError(format!("{name} must be a positive integer, got '{raw}'"))
    })
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("MEALIE_API_KEY is not set")]
    MissingCredential,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.mealie.base_url, "http://localhost:9000");
        assert_eq!(config.mealie.per_page, 100);
        assert_eq!(config.poll.interval_ms, 1000);
        assert!(!config.poll.fail_fast);
        assert_eq!(config.reconcile.isolation_check, IsolationCheck::Structural);
        assert_eq!(config.reconcile.on_user_error, UserErrorPolicy::AbortTick);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.mealie.base_url, config.mealie.base_url);
        assert_eq!(parsed.poll.interval_ms, config.poll.interval_ms);
    }

    #[test]
    fn zero_interval_rejected() {
        let mut config = AppConfig::default();
        config.poll.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_base_url_rejected() {
        let mut config = AppConfig::default();
        config.mealie.base_url = "localhost:9000".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        let config = result.unwrap();
        assert_eq!(config.mealie.per_page, 100);
    }

    #[test]
    fn config_file_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[mealie]
base_url = "https://mealie.example.com"
api_key = "secret-token"
per_page = 50

[poll]
interval_ms = 30000

[reconcile]
isolation_check = "legacy_substring"
on_user_error = "continue"

[retry]
max_attempts = 3
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.mealie.base_url, "https://mealie.example.com");
        assert_eq!(config.require_api_key().unwrap(), "secret-token");
        assert_eq!(config.mealie.per_page, 50);
        assert_eq!(config.poll.interval(), Duration::from_secs(30));
        assert_eq!(
            config.reconcile.isolation_check,
            IsolationCheck::LegacySubstring
        );
        assert_eq!(config.reconcile.on_user_error, UserErrorPolicy::Continue);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.initial_backoff_ms, 200);
    }

    #[test]
    fn invalid_toml_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[poll\ninterval_ms = ").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let vars = env(&[
            ("MEALIE_API_KEY", "from-env"),
            ("MEALIE_URL", "http://mealie:9000"),
            ("POLLING_INTERVAL", "2500"),
            ("MEALIE_API_PER_PAGE", "25"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.require_api_key().unwrap(), "from-env");
        assert_eq!(config.mealie.base_url, "http://mealie:9000");
        assert_eq!(config.poll.interval_ms, 2500);
        assert_eq!(config.mealie.per_page, 25);
        assert!(!config.poll.fail_fast);
    }

    #[test]
    fn groupwarden_key_wins_over_mealie_key() {
        let vars = env(&[("GROUPWARDEN_API_KEY", "gw"), ("MEALIE_API_KEY", "mealie")]);
        let mut config = AppConfig::default();
        config.apply_env(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.require_api_key().unwrap(), "gw");
    }

    #[test]
    fn debug_logging_level_enables_fail_fast() {
        let vars = env(&[("LOGGING_LEVEL", "DEBUG")]);
        let mut config = AppConfig::default();
        config.apply_env(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(config.poll.fail_fast);

        let vars = env(&[("LOGGING_LEVEL", "DEBUG"), ("GROUPWARDEN_FAIL_FAST", "false")]);
        let mut config = AppConfig::default();
        config.apply_env(|k| vars.get(k).cloned()).unwrap();
        assert!(!config.poll.fail_fast);
    }

    #[test]
    fn python_level_names_map_to_filter_directives() {
        for (raw, expected) in [("WARNING", "warn"), ("CRITICAL", "error"), ("Info", "info")] {
            let vars = env(&[("LOGGING_LEVEL", raw)]);
            let mut config = AppConfig::default();
            config.apply_env(|k| vars.get(k).cloned()).unwrap();
            assert_eq!(config.logging.level, expected);
            assert!(!config.poll.fail_fast);
        }
    }

    #[test]
    fn env_override_rescues_invalid_file_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[mealie]\nper_page = 0\n").unwrap();

        let vars = env(&[("MEALIE_API_PER_PAGE", "25")]);
        let config = AppConfig::load_with_env(Some(&path), |k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.mealie.per_page, 25);

        let err = AppConfig::load_with_env(Some(&path), |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn non_numeric_interval_rejected() {
        let vars = env(&[("POLLING_INTERVAL", "soon")]);
        let mut config = AppConfig::default();
        let err = config.apply_env(|k| vars.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("POLLING_INTERVAL"));
    }

    #[test]
    fn missing_or_blank_credential() {
        let mut config = AppConfig::default();
        assert!(matches!(
            config.require_api_key(),
            Err(ConfigError::MissingCredential)
        ));
        config.mealie.api_key = Some("  ".into());
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let mut config = AppConfig::default();
        config.mealie.api_key = Some("super-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("localhost:9000"));
        assert!(toml_str.contains("interval_ms"));
        assert!(!toml_str.contains("api_key"));
    }
}
