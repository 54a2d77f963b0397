//! Speech model abstractions and implementations.
//!
//! The worker only sees two capabilities of the TTS runtime: constructing a
//! model from named pretrained weights and running voice-clone generation.
//! Backends are swappable behind these traits (HTTP sidecar, mock).

pub mod http;
pub mod mock;

use crate::models::{GeneratedSpeech, PretrainedSpec, VoiceCloneRequest};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Model load failed: {0}")]
    LoadFailed(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::LoadFailed(_) => "load_failed",
            ProviderError::GenerationFailed(_) => "generation_failed",
            ProviderError::InvalidRequest(_) => "invalid_request",
            ProviderError::NetworkError(_) => "network",
        }
    }
}

/// Constructs a ready-to-use model. Loading is expensive; callers cache the
/// result.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// Load named pretrained weights onto a device.
    async fn from_pretrained(
        &self,
        spec: &PretrainedSpec,
    ) -> Result<Arc<dyn SpeechModel>, ProviderError>;
}

/// A loaded TTS model. Read-only once constructed.
#[async_trait]
pub trait SpeechModel: Send + Sync {
    /// Generate speech, optionally cloning the voice of a reference clip.
    async fn generate_voice_clone(
        &self,
        request: &VoiceCloneRequest,
    ) -> Result<GeneratedSpeech, ProviderError>;
}
