//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/pagetrail/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/pagetrail/` (~/.config/pagetrail/)
//! - State/Logs: `$XDG_STATE_HOME/pagetrail/` (~/.local/state/pagetrail/)
//!
//! Tracker options are merged over defaults exactly once, in
//! [`TrackerOptions::resolve`]. The resulting [`TrackerConfig`] is immutable and
//! is handed to each observer at construction time.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Tracker options (endpoint, feature toggles)
    #[serde(default)]
    pub tracker: TrackerOptions,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Caller-supplied tracker options.
///
/// Every field is optional; unset fields fall back to the defaults when the
/// options are resolved. Both snake_case and the camelCase names used by page
/// scripts are accepted.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct TrackerOptions {
    /// Collector endpoint URL (required)
    pub endpoint: Option<String>,

    /// Verbose local logging of every outgoing record
    pub debug: Option<bool>,

    #[serde(alias = "trackClicks")]
    pub track_clicks: Option<bool>,

    #[serde(alias = "trackScroll")]
    pub track_scroll: Option<bool>,

    #[serde(alias = "trackForms")]
    pub track_forms: Option<bool>,

    /// Quiet period before a section check runs (ms)
    #[serde(alias = "scrollDebounceMs")]
    pub scroll_debounce_ms: Option<u64>,

    /// Delay of the section check after initialization (ms)
    #[serde(alias = "initialCheckMs")]
    pub initial_check_ms: Option<u64>,

    /// HTTP request timeout in seconds
    #[serde(alias = "timeoutSecs")]
    pub timeout_secs: Option<u64>,
}

impl TrackerOptions {
    /// Options with only an endpoint set.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..Default::default()
        }
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merged_with(&self, other: &TrackerOptions) -> TrackerOptions {
        TrackerOptions {
            endpoint: other.endpoint.clone().or_else(|| self.endpoint.clone()),
            debug: other.debug.or(self.debug),
            track_clicks: other.track_clicks.or(self.track_clicks),
            track_scroll: other.track_scroll.or(self.track_scroll),
            track_forms: other.track_forms.or(self.track_forms),
            scroll_debounce_ms: other.scroll_debounce_ms.or(self.scroll_debounce_ms),
            initial_check_ms: other.initial_check_ms.or(self.initial_check_ms),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
        }
    }

    /// Merge over defaults and validate.
    ///
    /// Fails with [`Error::Config`] when no non-empty endpoint is configured.
    pub fn resolve(&self) -> Result<TrackerConfig> {
        let endpoint = self
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| Error::Config("tracker.endpoint is required".to_string()))?
            .to_string();

        let defaults = TrackerConfig::defaults_for(endpoint);
        Ok(TrackerConfig {
            debug: self.debug.unwrap_or(defaults.debug),
            track_clicks: self.track_clicks.unwrap_or(defaults.track_clicks),
            track_scroll: self.track_scroll.unwrap_or(defaults.track_scroll),
            track_forms: self.track_forms.unwrap_or(defaults.track_forms),
            scroll_debounce: self
                .scroll_debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.scroll_debounce),
            initial_check_delay: self
                .initial_check_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_check_delay),
            timeout: self
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            ..defaults
        })
    }
}

/// Resolved, read-only tracker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub endpoint: String,
    pub debug: bool,
    pub track_clicks: bool,
    pub track_scroll: bool,
    pub track_forms: bool,
    pub scroll_debounce: Duration,
    pub initial_check_delay: Duration,
    pub timeout: Duration,
}

impl TrackerConfig {
    fn defaults_for(endpoint: String) -> Self {
        Self {
            endpoint,
            debug: false,
            track_clicks: true,
            track_scroll: true,
            track_forms: true,
            scroll_debounce: Duration::from_millis(default_scroll_debounce_ms()),
            initial_check_delay: Duration::from_millis(default_initial_check_ms()),
            timeout: Duration::from_secs(default_timeout_secs()),
        }
    }
}

fn default_scroll_debounce_ms() -> u64 {
    200
}

fn default_initial_check_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/pagetrail/config.toml` (~/.config/pagetrail/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("pagetrail").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/pagetrail/` (~/.local/state/pagetrail/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("pagetrail")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("pagetrail.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.tracker.endpoint.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.max_files, 5);
    }

    #[test]
    fn test_resolve_requires_endpoint() {
        assert!(TrackerOptions::default().resolve().is_err());

        let blank = TrackerOptions::with_endpoint("   ");
        assert!(matches!(blank.resolve(), Err(Error::Config(_))));
    }

    #[test]
    fn test_resolve_applies_defaults() {
        let config = TrackerOptions::with_endpoint("https://collector.example/e")
            .resolve()
            .unwrap();
        assert_eq!(config.endpoint, "https://collector.example/e");
        assert!(!config.debug);
        assert!(config.track_clicks);
        assert!(config.track_scroll);
        assert!(config.track_forms);
        assert_eq!(config.scroll_debounce, Duration::from_millis(200));
        assert_eq!(config.initial_check_delay, Duration::from_secs(1));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_merged_with_prefers_overlay() {
        let base = TrackerOptions {
            endpoint: Some("https://a.example".to_string()),
            track_forms: Some(false),
            ..Default::default()
        };
        let overlay = TrackerOptions {
            endpoint: Some("https://b.example".to_string()),
            debug: Some(true),
            ..Default::default()
        };

        let merged = base.merged_with(&overlay);
        assert_eq!(merged.endpoint.as_deref(), Some("https://b.example"));
        assert_eq!(merged.debug, Some(true));
        assert_eq!(merged.track_forms, Some(false));
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[tracker]
endpoint = "https://collector.example/e"
debug = true
trackScroll = false
track_forms = false
scroll_debounce_ms = 50

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let tracker = config.tracker.resolve().unwrap();

        assert!(tracker.debug);
        assert!(tracker.track_clicks);
        assert!(!tracker.track_scroll);
        assert!(!tracker.track_forms);
        assert_eq!(tracker.scroll_debounce, Duration::from_millis(50));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tracker]\nendpoint = \"https://c.example\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.tracker.endpoint.as_deref(), Some("https://c.example"));
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tracker\nendpoint = ").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
