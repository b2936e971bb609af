use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FukaboriConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    pub dive: DiveConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    pub default_user: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    /// Prefer the GEMINI_API_KEY env var; the config file is a fallback.
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DiveConfig {
    /// Maximum child depth per root — a session asks exactly this many questions.
    pub max_depth: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScoringConfig {
    pub enabled: bool,
    /// Texts shorter than this (in chars, after extraction) skip the API call.
    pub min_text_len: usize,
    /// Score assigned to too-short texts.
    pub short_text_score: f64,
    /// Meter level at which a small-step plan is triggered.
    pub meter_threshold: f64,
}

impl Default for FukaboriConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            storage: StorageConfig::default(),
            llm: LlmConfig::default(),
            dive: DiveConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_fukabori_dir()
            .join("notes.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            default_user: "default".into(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".into(),
            model: "gemini-2.5-flash".into(),
            api_key: None,
        }
    }
}

impl Default for DiveConfig {
    fn default() -> Self {
        Self { max_depth: 5 }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_text_len: 10,
            short_text_score: 0.1,
            meter_threshold: 1.0,
        }
    }
}

/// Returns `~/.fukabori/`
pub fn default_fukabori_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".fukabori")
}

/// Returns the default config file path: `~/.fukabori/config.toml`
pub fn default_config_path() -> PathBuf {
    default_fukabori_dir().join("config.toml")
}

impl FukaboriConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            FukaboriConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (FUKABORI_DB, FUKABORI_USER,
    /// FUKABORI_LOG_LEVEL, GEMINI_API_KEY).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("FUKABORI_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("FUKABORI_USER") {
            self.storage.default_user = val;
        }
        if let Ok(val) = std::env::var("FUKABORI_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("GEMINI_API_KEY") {
            if !val.is_empty() {
                self.llm.api_key = Some(val);
            }
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
