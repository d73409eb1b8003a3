//! Configuration loading and validation for Dossier.
//!
//! Loads configuration from `~/.dossier/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.dossier/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Canonical zone for day comparisons (`UTC`, `+05:30`, `-0800`).
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Currency marker for money values
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Upcoming-window horizon when `days_ahead` is omitted
    #[serde(default = "default_days_ahead")]
    pub default_days_ahead: u32,

    /// Record store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Per-domain settings, keyed by domain name
    #[serde(default)]
    pub domains: BTreeMap<String, DomainConfig>,
}

fn default_timezone() -> String {
    "+00:00".into()
}
fn default_currency() -> String {
    "$".into()
}
fn default_days_ahead() -> u32 {
    7
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "memory" (built-in sample data) or "file" (JSONL directory)
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Directory of `<collection>.jsonl` files for the file backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

fn default_store_backend() -> String {
    "memory".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            data_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Collection → statuses that end a record's lifecycle
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub terminal_statuses: BTreeMap<String, Vec<String>>,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            terminal_statuses: BTreeMap::new(),
        }
    }
}

pub const STORE_BACKENDS: [&str; 2] = ["memory", "file"];

impl AppConfig {
    /// Load configuration from the default path (~/.dossier/config.toml),
    /// then apply `DOSSIER_*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
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

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// `DOSSIER_TIMEZONE`, `DOSSIER_CURRENCY`, `DOSSIER_STORE` and
    /// `DOSSIER_DATA_DIR` win over the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(tz) = lookup("DOSSIER_TIMEZONE") {
            self.timezone = tz;
        }
        if let Some(currency) = lookup("DOSSIER_CURRENCY") {
            self.currency = currency;
        }
        if let Some(backend) = lookup("DOSSIER_STORE") {
            self.store.backend = backend;
        }
        if let Some(dir) = lookup("DOSSIER_DATA_DIR") {
            self.store.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".dossier")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// The JSONL data directory (configured, or `~/.dossier/data`).
    pub fn data_dir(&self) -> PathBuf {
        self.store
            .data_dir
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("data"))
    }

    /// The canonical zone as a fixed offset.
    pub fn zone(&self) -> Result<FixedOffset, ConfigError> {
        parse_timezone(&self.timezone)
    }

    /// Whether a domain is enabled (domains are enabled unless configured off).
    pub fn domain_enabled(&self, name: &str) -> bool {
        self.domains.get(name).is_none_or(|d| d.enabled)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.zone()?;

        if self.currency.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "currency must not be empty".into(),
            ));
        }

        if !STORE_BACKENDS.contains(&self.store.backend.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown store backend '{}' (expected one of: {})",
                self.store.backend,
                STORE_BACKENDS.join(", ")
            )));
        }

        Ok(())
    }

    /// Reject `[domains.<name>]` sections for domains that do not exist.
    pub fn validate_domains(&self, known: &[&str]) -> Result<(), ConfigError> {
        match self.domains.keys().find(|name| !known.contains(&name.as_str())) {
            Some(name) => Err(ConfigError::ValidationError(format!(
                "unknown domain '{name}' (expected one of: {})",
                known.join(", ")
            ))),
            None => Ok(()),
        }
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            currency: default_currency(),
            default_days_ahead: default_days_ahead(),
            store: StoreConfig::default(),
            domains: BTreeMap::new(),
        }
    }
}

/// Parse `UTC`, `Z`, `±HH:MM` or `±HHMM` into a fixed offset.
pub fn parse_timezone(text: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || {
        ConfigError::ValidationError(format!(
            "invalid timezone '{text}' (expected UTC, Z, +HH:MM or +HHMM)"
        ))
    };

    let text = text.trim();
    if text.eq_ignore_ascii_case("utc") || text.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match text.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    let well_formed = digits.len() == 4
        && digits.chars().all(|c| c.is_ascii_digit())
        && (rest.len() == 4 || rest.as_bytes().get(2) == Some(&b':'));
    if !well_formed {
        return Err(invalid());
    }

    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
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
}
