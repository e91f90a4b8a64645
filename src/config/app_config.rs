//! Application configuration
//!
//! Resolution order: built-in defaults, then an optional YAML file, then
//! environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::{Result, TtsError};
use crate::engine::HttpEngineConfig;
use crate::progress::ReporterOptions;
use crate::voice::{Language, DEFAULT_OUTPUT_FILE};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Model identifier passed to the engine
    pub model_id: String,
    /// Device hint for the engine ("cuda:0", "cpu")
    pub device: Option<String>,
    /// Inference server base URL
    pub engine_url: String,
    /// Whole-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Where reference samples are looked up
    pub reference_audio_dir: PathBuf,
    /// Where bare output file names are written
    pub output_dir: PathBuf,
    pub default_language: String,
    pub default_output_file: PathBuf,
    /// Hugging Face token for gated models
    pub hf_token: Option<String>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub x_vector_only: bool,
    /// Progress line settings
    pub progress: ProgressConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_id: crate::DEFAULT_MODEL_ID.to_string(),
            device: None,
            engine_url: "http://127.0.0.1:7861".to_string(),
            request_timeout_secs: 600,
            reference_audio_dir: PathBuf::from("reference_audio"),
            output_dir: PathBuf::from("outputs"),
            default_language: Language::default().name().to_string(),
            default_output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            hf_token: None,
            log_level: "info".to_string(),
            x_vector_only: true,
            progress: ProgressConfig::default(),
        }
    }
}

/// Progress reporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub tick_interval_ms: u64,
    pub join_timeout_ms: u64,
    /// Print "Generated N tokens in X.Xs" when done
    pub summary: bool,
    pub unit_label: String,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 120,
            join_timeout_ms: 1000,
            summary: true,
            unit_label: "tokens".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| TtsError::Config {
            message: format!("Failed to read config file: {}", e),
            path: Some(path.to_path_buf()),
        })?;
        serde_yaml::from_str(&content).map_err(|e| TtsError::Config {
            message: format!("Failed to parse config YAML: {}", e),
            path: Some(path.to_path_buf()),
        })
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// File (or defaults when `path` is `None`), then environment, then validation
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("MODEL_ID") {
            self.model_id = v;
        }
        if let Some(v) = get("DEVICE") {
            self.device = Some(v);
        }
        if let Some(v) = get("MIMIC_ENGINE_URL") {
            self.engine_url = v;
        }
        if let Some(v) = get("REFERENCE_AUDIO_DIR") {
            self.reference_audio_dir = PathBuf::from(v);
        }
        if let Some(v) = get("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
        if let Some(v) = get("DEFAULT_LANGUAGE") {
            self.default_language = v;
        }
        if let Some(v) = get("DEFAULT_OUTPUT_FILE") {
            self.default_output_file = PathBuf::from(v);
        }
        if let Some(v) = get("HF_TOKEN") {
            self.hf_token = Some(v);
        }
        if let Some(v) = get("MIMIC_LOG_LEVEL") {
            self.log_level = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.default_language
            .parse::<Language>()
            .map_err(|e| TtsError::Config {
                message: format!("default_language: {}", e),
                path: None,
            })?;

        if self.progress.tick_interval_ms == 0 {
            return Err(TtsError::Config {
                message: "progress.tick_interval_ms must be positive".to_string(),
                path: None,
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(TtsError::Config {
                message: "request_timeout_secs must be positive".to_string(),
                path: None,
            });
        }
        Ok(())
    }

    /// Reporter options derived from the `progress` section
    pub fn reporter_options(&self) -> ReporterOptions {
        ReporterOptions {
            tick_interval: Duration::from_millis(self.progress.tick_interval_ms),
            join_timeout: Duration::from_millis(self.progress.join_timeout_ms),
            unit_label: self.progress.unit_label.clone(),
            summary: self.progress.summary,
            ..ReporterOptions::default()
        }
    }

    /// Place a bare file name (`hola.wav`) under `output_dir`. Absolute
    /// paths and paths with a directory part are kept as given.
    pub fn resolve_output(&self, path: &Path) -> PathBuf {
        let bare = path
            .parent()
            .map_or(true, |parent| parent.as_os_str().is_empty());
        if path.is_relative() && bare {
            self.output_dir.join(path)
        } else {
            path.to_path_buf()
        }
    }

    /// Settings for the HTTP engine binding
    pub fn http_engine_config(&self) -> HttpEngineConfig {
        if self.hf_token.is_none() {
            warn!("HF_TOKEN is not set; gated models may fail to download on the server");
        }
        HttpEngineConfig {
            base_url: self.engine_url.clone(),
            model_id: self.model_id.clone(),
            device: self.device.clone(),
            hf_token: self.hf_token.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}
