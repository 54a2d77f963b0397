//! Job payloads exchanged with the serverless runtime.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A job envelope as dispatched by the runtime.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Job {
    /// Job ID assigned by the runtime, if any.
    #[serde(default)]
    pub id: Option<String>,

    /// Raw job input; parsed into [`JobInput`] by the handler.
    #[serde(default)]
    pub input: Option<Value>,
}

/// The `input` mapping of a job.
///
/// Empty strings are treated the same as absent fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobInput {
    /// Text to synthesize.
    #[serde(default)]
    pub text: Option<String>,

    /// Remote reference clip, passed to the model unchanged.
    #[serde(default)]
    pub reference_audio_url: Option<String>,

    /// Inline reference clip, optionally prefixed with a data-URL header.
    #[serde(default)]
    pub reference_audio_base64: Option<String>,

    /// Transcript of the reference clip.
    #[serde(default)]
    pub reference_text: Option<String>,
}

impl JobInput {
    /// Parse the raw `input` value. A missing or null input is an empty mapping.
    pub fn from_value(value: Option<Value>) -> Result<Self, serde_json::Error> {
        match value {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(value) => serde_json::from_value(value),
        }
    }

    /// Whether the raw `input` asks for a status report. Checked before
    /// parsing, so the rest of the mapping is never looked at.
    pub fn is_health_check(value: Option<&Value>) -> bool {
        value
            .and_then(|v| v.get("health_check"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Successful synthesis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechOutput {
    /// Base64-encoded WAV.
    pub audio_base64: String,
    pub sample_rate: u32,
    /// Duration in seconds.
    pub duration: f64,
    /// Echo of the input text.
    pub text: String,
}

/// Health-check report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
    pub model_loaded: bool,
}

impl HealthStatus {
    pub fn healthy(model_loaded: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            message: "TTS handler ready".to_string(),
            model_loaded,
        }
    }
}

/// Exactly one response shape per job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobOutput {
    Success(SpeechOutput),
    Health(HealthStatus),
    Error { error: String },
}

impl JobOutput {
    pub fn error(message: impl Into<String>) -> Self {
        JobOutput::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, JobOutput::Error { .. })
    }
}
