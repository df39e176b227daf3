//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a TOML file. Resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "SBE_ROOT_FOLDER";

/// Environment variable carrying the Steamsets API key
pub const API_KEY_ENV: &str = "SBE_STEAMSETS_API_KEY";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "sbe.db";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the cache database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Master switch; when false no discovered items are processed
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub enricher: EnricherSettings,

    #[serde(default)]
    pub remote: RemoteSettings,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            enabled: true,
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
            enricher: EnricherSettings::default(),
            remote: RemoteSettings::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Cache policy and fetch pacing
///
/// `degraded_ttl_secs` applies to entries produced by a fetch cycle in which
/// at least one remote call failed. When omitted it equals `ttl_secs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnricherSettings {
    /// Maximum cache entry age in seconds (default: 7 days)
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// TTL for degraded entries in seconds (default: same as `ttl_secs`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded_ttl_secs: Option<u64>,

    /// Fraction of the TTL after which a valid entry is refreshed in the background
    #[serde(default = "default_soft_refresh_fraction")]
    pub soft_refresh_fraction: f64,

    /// Delay before each enrichment call (D1)
    #[serde(default = "default_enrichment_delay_ms")]
    pub enrichment_delay_ms: u64,

    /// Delay before each crafted-status call (D2)
    #[serde(default = "default_crafted_delay_ms")]
    pub crafted_delay_ms: u64,

    /// Per-request timeout; omitted means remote calls are never timed out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for EnricherSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            degraded_ttl_secs: None,
            soft_refresh_fraction: default_soft_refresh_fraction(),
            enrichment_delay_ms: default_enrichment_delay_ms(),
            crafted_delay_ms: default_crafted_delay_ms(),
            request_timeout_secs: None,
        }
    }
}

impl EnricherSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn degraded_ttl(&self) -> Duration {
        Duration::from_secs(self.degraded_ttl_secs.unwrap_or(self.ttl_secs))
    }

    pub fn enrichment_delay(&self) -> Duration {
        Duration::from_millis(self.enrichment_delay_ms)
    }

    pub fn crafted_delay(&self) -> Duration {
        Duration::from_millis(self.crafted_delay_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Reject settings the cache policy cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.ttl_secs == 0 {
            return Err(Error::Config("enricher.ttl_secs must be greater than 0".to_string()));
        }
        if self.degraded_ttl_secs == Some(0) {
            return Err(Error::Config(
                "enricher.degraded_ttl_secs must be greater than 0".to_string(),
            ));
        }
        if !(self.soft_refresh_fraction > 0.0 && self.soft_refresh_fraction <= 1.0) {
            return Err(Error::Config(format!(
                "enricher.soft_refresh_fraction must be in (0, 1], got {}",
                self.soft_refresh_fraction
            )));
        }
        Ok(())
    }
}

/// Remote service endpoints and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    #[serde(default = "default_steamsets_url")]
    pub steamsets_url: String,

    #[serde(default = "default_badge_info_url")]
    pub badge_info_url: String,

    /// Steamsets API key (overridden by `SBE_STEAMSETS_API_KEY`)
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_image_cdn_url")]
    pub image_cdn_url: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            steamsets_url: default_steamsets_url(),
            badge_info_url: default_badge_info_url(),
            api_key: String::new(),
            image_cdn_url: default_image_cdn_url(),
        }
    }
}

impl RemoteSettings {
    /// Resolve the API key: environment first, then TOML
    ///
    /// An empty key is allowed; the remote decides whether to accept it.
    pub fn resolve_api_key(&self) -> String {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => {
                info!("Steamsets API key loaded from environment variable");
                key
            }
            _ => {
                if self.api_key.trim().is_empty() {
                    warn!("Steamsets API key not configured; enrichment calls may be rejected");
                }
                self.api_key.clone()
            }
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5730
}

fn default_ttl_secs() -> u64 {
    7 * SECONDS_PER_DAY
}

fn default_soft_refresh_fraction() -> f64 {
    0.5
}

fn default_enrichment_delay_ms() -> u64 {
    1000
}

fn default_crafted_delay_ms() -> u64 {
    200
}

fn default_steamsets_url() -> String {
    "https://api.steamsets.com/v1/app.listBadges".to_string()
}

fn default_badge_info_url() -> String {
    "https://steamcommunity.com/my/ajaxgetbadgeinfo/".to_string()
}

fn default_image_cdn_url() -> String {
    "https://cdn.fastly.steamstatic.com/steamcommunity/public/images/items".to_string()
}

/// Load and validate a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.enricher.validate()?;
    Ok(config)
}

/// Resolve the bootstrap configuration
///
/// An explicit path must load. Without one, the platform config file is used
/// when present, otherwise built-in defaults.
pub fn resolve_config(cli_path: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = cli_path {
        info!("Loading config from {}", path.display());
        return load_toml_config(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            info!("Loading config from {}", path.display());
            load_toml_config(&path)
        }
        _ => {
            info!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Platform config file path (`<config dir>/sbe/sbe-enricher.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sbe").join("sbe-enricher.toml"))
}

/// Root folder resolution: CLI → environment → TOML → OS default
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    get_default_root_folder()
}

/// Database path inside a root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE)
}

/// Get OS-dependent default root folder path
fn get_default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("sbe"))
        .unwrap_or_else(|| PathBuf::from("./sbe_data"))
}

/// Write config atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}
