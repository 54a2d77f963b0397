//! Types shared with the model collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric precision the weights are loaded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Float32,
    Float16,
    Bfloat16,
}

impl Dtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dtype::Float32 => "float32",
            Dtype::Float16 => "float16",
            Dtype::Bfloat16 => "bfloat16",
        }
    }
}

impl FromStr for Dtype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "float32" | "fp32" => Ok(Dtype::Float32),
            "float16" | "fp16" => Ok(Dtype::Float16),
            "bfloat16" | "bf16" => Ok(Dtype::Bfloat16),
            other => Err(format!("unsupported dtype '{}'", other)),
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attention kernel requested from the model runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttentionBackend {
    #[serde(rename = "eager")]
    Eager,
    #[serde(rename = "sdpa")]
    Sdpa,
    #[serde(rename = "flash_attention_2")]
    FlashAttention2,
}

impl AttentionBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttentionBackend::Eager => "eager",
            AttentionBackend::Sdpa => "sdpa",
            AttentionBackend::FlashAttention2 => "flash_attention_2",
        }
    }
}

impl FromStr for AttentionBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eager" => Ok(AttentionBackend::Eager),
            "sdpa" => Ok(AttentionBackend::Sdpa),
            "flash_attention_2" | "flash-attention-2" => Ok(AttentionBackend::FlashAttention2),
            other => Err(format!("unsupported attention backend '{}'", other)),
        }
    }
}

impl fmt::Display for AttentionBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to construct a model from named pretrained weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PretrainedSpec {
    pub name: String,
    pub device: String,
    pub dtype: Dtype,
    #[serde(rename = "attn_implementation")]
    pub attention: AttentionBackend,
}

/// Arguments of a voice-clone generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceCloneRequest {
    pub text: String,
    pub language: String,
    /// URL or local file path of the reference clip.
    pub ref_audio: Option<String>,
    pub ref_text: Option<String>,
}

/// Raw model output: a batch of waveforms sharing one sample rate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratedSpeech {
    pub waveforms: Vec<Vec<f32>>,
    pub sample_rate: u32,
}
