//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/tracelens/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/tracelens/` (~/.config/tracelens/)
//! - State/Logs: `$XDG_STATE_HOME/tracelens/` (~/.local/state/tracelens/)
//!
//! Detector window sizes are configuration, not code: the two
//! "correction" definitions (streaming lookback vs. pairwise distance)
//! are independent knobs so that tuning one never changes the metric
//! reported by the other.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

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
    /// Pattern detection and aggregation parameters
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Transcript discovery configuration
    #[serde(default)]
    pub scan: ScanConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Pattern detection and example selection parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Forward window for each stage of the execute-explore-modify scan
    #[serde(default = "default_cycle_window")]
    pub cycle_window: usize,

    /// Forward window for spotting a Bash retry after a failure
    #[serde(default = "default_retry_window")]
    pub retry_window: usize,

    /// Lookback (in tool events) for the streaming immediate-correction
    /// counter
    #[serde(default = "default_correction_lookback")]
    pub correction_lookback: usize,

    /// Max index distance between two same-file edits for the pairwise
    /// correction-sequence detector
    #[serde(default = "default_correction_pair_distance")]
    pub correction_pair_distance: usize,

    /// Matches retained per pattern kind in the stored report
    #[serde(default = "default_stored_example_cap")]
    pub stored_example_cap: usize,

    /// Matches rendered per pattern kind in the inline text report
    #[serde(default = "default_inline_example_cap")]
    pub inline_example_cap: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cycle_window: default_cycle_window(),
            retry_window: default_retry_window(),
            correction_lookback: default_correction_lookback(),
            correction_pair_distance: default_correction_pair_distance(),
            stored_example_cap: default_stored_example_cap(),
            inline_example_cap: default_inline_example_cap(),
        }
    }
}

fn default_cycle_window() -> usize {
    4
}

fn default_retry_window() -> usize {
    4
}

fn default_correction_lookback() -> usize {
    5
}

fn default_correction_pair_distance() -> usize {
    10
}

fn default_stored_example_cap() -> usize {
    5
}

fn default_inline_example_cap() -> usize {
    3
}

/// Transcript discovery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Root directory to scan (default: ~/.claude/projects)
    pub root: Option<PathBuf>,

    /// Files whose name contains this marker are agent sub-sessions
    /// and excluded from the scan
    #[serde(default = "default_exclude_marker")]
    pub exclude_marker: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: None,
            exclude_marker: default_exclude_marker(),
        }
    }
}

impl ScanConfig {
    /// Effective scan root: configured value or ~/.claude/projects.
    pub fn effective_root(&self) -> PathBuf {
        self.root
            .clone()
            .unwrap_or_else(|| home_dir().join(".claude").join("projects"))
    }
}

fn default_exclude_marker() -> String {
    "agent-".to_string()
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
    /// `$XDG_CONFIG_HOME/tracelens/config.toml`
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("tracelens").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/tracelens/`
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("tracelens")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("tracelens.log")
    }
}
