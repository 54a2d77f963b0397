//! Per-job error taxonomy.
//!
//! Every variant is turned into an `{"error": <message>}` output by the job
//! handler; none of them leave the handler.

use crate::services::providers::ProviderError;
use thiserror::Error;

/// Malformed or incomplete job input.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No text provided")]
    MissingText,

    #[error("reference_text is required when using reference audio")]
    MissingReferenceText,

    #[error("reference_audio_url or reference_audio_base64 is required when providing reference_text")]
    MissingReferenceAudio,
}

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid reference_audio_base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error(transparent)]
    Model(#[from] ProviderError),

    #[error("Failed to write reference audio: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode audio: {0}")]
    Encode(#[from] hound::Error),
}

impl HandlerError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerError::InvalidInput(_) | HandlerError::Validation(_) => "validation",
            HandlerError::Decode(_) => "decode",
            HandlerError::Model(_) => "model",
            HandlerError::Io(_) => "io",
            HandlerError::Encode(_) => "encode",
        }
    }
}
