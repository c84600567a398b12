//! Configuration loading
//!
//! Resolution order for every setting: environment variable → TOML file →
//! compiled default. The TOML file itself is located by
//! command-line path → `HRFB_CONFIG` → `<config_dir>/hrfb/config.toml`.
//! A missing file is not an error; defaults are used with a warning.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const ENV_CONFIG_PATH: &str = "HRFB_CONFIG";
pub const ENV_SERVICE_ACCOUNT_JSON: &str = "GOOGLE_SERVICE_ACCOUNT_JSON";
pub const ENV_SERVICE_ACCOUNT_FILE: &str = "GOOGLE_SERVICE_ACCOUNT_FILE";
pub const ENV_SHEETS_ID: &str = "GOOGLE_SHEETS_ID";
pub const ENV_SHEETS_RANGE: &str = "GOOGLE_SHEETS_RANGE";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_DATABASE_PATH: &str = "HRFB_DATABASE_PATH";
pub const ENV_BIND: &str = "HRFB_BIND";
pub const ENV_SYNC_INTERVAL_SECS: &str = "HRFB_SYNC_INTERVAL_SECS";

pub const DEFAULT_BIND: &str = "127.0.0.1:5780";
pub const DEFAULT_SHEETS_RANGE: &str = "Form Responses 1!A:K";
pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub google: GoogleConfig,
    pub sentiment: SentimentConfig,
    pub sync: SyncConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Feedback store location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; defaults to `<data_local_dir>/hrfb/feedback.db`
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_database_path)
    }
}

/// Spreadsheet source and service-account settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// Inline service-account JSON bundle
    pub service_account_json: Option<String>,
    /// Path to a service-account JSON file (used when no inline bundle)
    pub service_account_file: Option<PathBuf>,
    pub spreadsheet_id: Option<String>,
    pub range: String,
    pub sheets_base_url: String,
    /// Overrides the bundle's `token_uri`
    pub token_uri: Option<String>,
    /// Offset applied to sheet timestamps that carry none
    pub sheet_utc_offset_minutes: i32,
    /// Validate the header row against the column schema on every pass
    pub strict_schema: bool,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            service_account_json: None,
            service_account_file: None,
            spreadsheet_id: None,
            range: DEFAULT_SHEETS_RANGE.to_string(),
            sheets_base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            token_uri: None,
            sheet_utc_offset_minutes: 0,
            strict_schema: true,
        }
    }
}

/// Where the service-account bundle comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceAccountSource {
    Inline(String),
    File(PathBuf),
    Missing,
}

impl GoogleConfig {
    pub fn service_account_source(&self) -> ServiceAccountSource {
        if let Some(json) = self.service_account_json.as_ref().filter(|s| is_present(s)) {
            return ServiceAccountSource::Inline(json.clone());
        }
        match &self.service_account_file {
            Some(path) => ServiceAccountSource::File(path.clone()),
            None => ServiceAccountSource::Missing,
        }
    }
}

/// Remote sentiment model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Absence selects the non-remote strategy; never fatal
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Run the keyword heuristic when no model key is configured
    pub heuristic_without_model: bool,
    /// Maximum classification calls in flight during one pass
    pub concurrency: usize,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            heuristic_without_model: false,
            concurrency: 4,
        }
    }
}

impl SentimentConfig {
    pub fn configured_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| is_present(k))
    }
}

/// Pass scheduling and outbound request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Run a pass every N seconds in-process; `None` means invocation only
    pub interval_secs: Option<u64>,
    pub request_timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: None,
            request_timeout_secs: 30,
        }
    }
}

impl TomlConfig {
    /// Load configuration from file (if any) and apply environment overrides
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let mut config = match locate_config_file(cli_path) {
            Some(path) => Self::from_file(&path)?,
            None => {
                warn!("No configuration file found, using defaults");
                Self::default()
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML file
    ///
    /// A path that does not exist yields defaults; a file that exists but
    /// does not parse is an error.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply environment overrides through a lookup function
    ///
    /// Empty or whitespace-only values count as unset.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| is_present(v));

        if let Some(v) = get(ENV_SERVICE_ACCOUNT_JSON) {
            self.google.service_account_json = Some(v);
        }
        if let Some(v) = get(ENV_SERVICE_ACCOUNT_FILE) {
            self.google.service_account_file = Some(PathBuf::from(v));
        }
        if let Some(v) = get(ENV_SHEETS_ID) {
            self.google.spreadsheet_id = Some(v);
        }
        if let Some(v) = get(ENV_SHEETS_RANGE) {
            self.google.range = v;
        }
        if let Some(v) = get(ENV_OPENAI_API_KEY) {
            self.sentiment.api_key = Some(v);
        }
        if let Some(v) = get(ENV_DATABASE_PATH) {
            self.database.path = Some(PathBuf::from(v));
        }
        if let Some(v) = get(ENV_BIND) {
            self.server.bind = v;
        }
        if let Some(v) = get(ENV_SYNC_INTERVAL_SECS) {
            let secs = v.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("{} must be a whole number of seconds: {}", ENV_SYNC_INTERVAL_SECS, e))
            })?;
            self.sync.interval_secs = Some(secs);
        }
        Ok(())
    }

    /// Presence checks required before the service can start
    ///
    /// The service-account bundle is deliberately not checked here: its
    /// absence fails each pass with an authentication error instead.
    pub fn validate(&self) -> Result<()> {
        match self.google.spreadsheet_id.as_deref() {
            Some(id) if is_present(id) => {}
            _ => {
                return Err(Error::Config(format!(
                    "Spreadsheet id not configured. Set {} or google.spreadsheet_id",
                    ENV_SHEETS_ID
                )))
            }
        }
        if self.sentiment.concurrency == 0 {
            return Err(Error::Config("sentiment.concurrency must be at least 1".to_string()));
        }
        if self.sync.interval_secs == Some(0) {
            return Err(Error::Config("sync.interval_secs must be at least 1".to_string()));
        }
        crate::time::offset_from_minutes(self.google.sheet_utc_offset_minutes)?;
        Ok(())
    }
}

/// Locate the TOML configuration file
pub fn locate_config_file(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }
    if let Some(path) = std::env::var(ENV_CONFIG_PATH).ok().filter(|v| is_present(v)) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|d| d.join("hrfb").join("config.toml"))
        .filter(|p| p.exists())
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("hrfb"))
        .unwrap_or_else(|| PathBuf::from("./hrfb_data"))
        .join("feedback.db")
}

/// Non-empty, non-whitespace
pub fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}
