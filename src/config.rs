//! Configuration loading for the narration client.
//!
//! All user-tunable settings are centralized here and loaded from
//! `conf/config.toml` if present. Any missing or invalid entries fall back to
//! sensible defaults so the UI can still launch.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

pub const MIN_VOLUME: f32 = 0.0;
pub const MAX_VOLUME: f32 = 2.0;

pub const CONFIG_PATH: &str = "conf/config.toml";

pub fn config_path() -> std::path::PathBuf {
    std::path::PathBuf::from(CONFIG_PATH)
}

/// High-level app configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct AppConfig {
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_voice_id")]
    pub default_voice_id: String,
    #[serde(default)]
    pub theme: ThemeMode,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
    #[serde(default = "default_cache_audio")]
    pub cache_audio: bool,
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            backend_url: default_backend_url(),
            request_timeout_secs: default_request_timeout_secs(),
            language: default_language(),
            default_voice_id: default_voice_id(),
            theme: ThemeMode::Day,
            volume: default_volume(),
            preview_chars: default_preview_chars(),
            cache_audio: default_cache_audio(),
            log_level: default_log_level(),
        }
    }
}

/// Theme mode.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeMode {
    Day,
    Night,
}

impl Default for ThemeMode {
    fn default() -> Self {
        ThemeMode::Day
    }
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ThemeMode::Day => "Day",
            ThemeMode::Night => "Night",
        };
        write!(f, "{}", label)
    }
}

/// Load configuration from the given path, falling back to defaults on error.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&contents) {
        Ok(cfg) => {
            debug!("Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err}");
            AppConfig::default()
        }
    }
}

/// Persist the current settings. Errors are logged and swallowed so a
/// read-only install never breaks the UI.
pub fn save_config(path: &Path, config: &AppConfig) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match toml::to_string(config) {
        Ok(contents) => {
            if let Err(err) = fs::write(path, contents) {
                warn!(path = %path.display(), "Failed to save config: {err}");
            }
        }
        Err(err) => warn!("Failed to serialize config: {err}"),
    }
}

/// Bring out-of-range values back into usable territory.
pub fn clamp_config(config: &mut AppConfig) {
    config.volume = config.volume.clamp(MIN_VOLUME, MAX_VOLUME);
    config.request_timeout_secs = config.request_timeout_secs.clamp(5, 600);
    config.preview_chars = config.preview_chars.clamp(40, 2000);
    let trimmed = config.backend_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        config.backend_url = default_backend_url();
    } else {
        config.backend_url = trimmed.to_string();
    }
    if config.default_voice_id.trim().is_empty() {
        config.default_voice_id = default_voice_id();
    }
    if config.language.trim().is_empty() {
        config.language = default_language();
    }
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_voice_id() -> String {
    crate::voices::FALLBACK_VOICE_ID.to_string()
}

fn default_volume() -> f32 {
    1.0
}

fn default_preview_chars() -> usize {
    200
}

fn default_cache_audio() -> bool {
    true
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
