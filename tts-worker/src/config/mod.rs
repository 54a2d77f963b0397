use crate::models::{AttentionBackend, Dtype, PretrainedSpec};
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Pretrained weights loaded when nothing else is configured.
pub const DEFAULT_MODEL_NAME: &str = "Qwen/Qwen3-TTS-12Hz-1.7B-Base";

/// Sidecar the `http` backend talks to by default (same container).
pub const DEFAULT_INFERENCE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub common: core_config::Config,
    pub model: ModelConfig,
    pub synthesis: SynthesisConfig,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Pretrained weights identifier (e.g., Qwen/Qwen3-TTS-12Hz-1.7B-Base)
    pub name: String,
    /// Compute device (e.g., cuda:0)
    pub device: String,
    pub dtype: Dtype,
    pub attention: AttentionBackend,
    /// Which provider implementation serves the model
    pub backend: ModelBackend,
    /// Base URL of the inference sidecar, used by the `http` backend
    pub inference_url: String,
    /// Load the model in the background at process start
    pub preload: bool,
}

#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    /// Language hint passed to the model ("auto" = detect)
    pub language: String,
    /// Directory for decoded reference clips; system temp dir when unset
    pub temp_dir: Option<PathBuf>,
}

/// Model provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelBackend {
    Http,
    Mock,
}

impl FromStr for ModelBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(ModelBackend::Http),
            "mock" => Ok(ModelBackend::Mock),
            other => Err(format!("unsupported model backend '{}'", other)),
        }
    }
}

impl fmt::Display for ModelBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelBackend::Http => f.write_str("http"),
            ModelBackend::Mock => f.write_str("mock"),
        }
    }
}

impl WorkerConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(WorkerConfig {
            common: common_config,
            model: ModelConfig {
                name: get_env("TTS_MODEL_NAME", Some(DEFAULT_MODEL_NAME), is_prod)?,
                device: get_env("TTS_MODEL_DEVICE", Some("cuda:0"), is_prod)?,
                dtype: parse_env("TTS_MODEL_DTYPE", Some("bfloat16"), is_prod)?,
                attention: parse_env("TTS_ATTENTION_BACKEND", Some("flash_attention_2"), is_prod)?,
                backend: parse_env("TTS_MODEL_BACKEND", Some("http"), is_prod)?,
                inference_url: get_env("TTS_INFERENCE_URL", Some(DEFAULT_INFERENCE_URL), is_prod)?,
                preload: parse_bool(&get_env("TTS_PRELOAD_MODEL", Some("true"), is_prod)?)
                    .map_err(|e| config_error("TTS_PRELOAD_MODEL", e))?,
            },
            synthesis: SynthesisConfig {
                language: get_env("TTS_LANGUAGE", Some("auto"), is_prod)?,
                temp_dir: env::var("TTS_TEMP_DIR")
                    .ok()
                    .filter(|dir| !dir.is_empty())
                    .map(PathBuf::from),
            },
        })
    }

    /// Arguments for `from_pretrained`.
    pub fn pretrained_spec(&self) -> PretrainedSpec {
        PretrainedSpec {
            name: self.model.name.clone(),
            device: self.model.device.clone(),
            dtype: self.model.dtype,
            attention: self.model.attention,
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: Option<&str>, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr<Err = String>,
{
    get_env(key, default, is_prod)?
        .parse()
        .map_err(|e| config_error(key, e))
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected a boolean, got '{}'", other)),
    }
}

fn config_error(key: &str, message: String) -> AppError {
    AppError::ConfigError(anyhow::anyhow!("{}: {}", key, message))
}
