//! Job input validation and normalization.
//!
//! Runs before the model is touched: a request that fails here never loads
//! the model and never creates a temp file.

use crate::error::{HandlerError, ValidationError};
use crate::models::JobInput;
use base64::Engine;

/// Where the reference clip comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceAudio {
    /// Remote clip, handed to the model unchanged.
    Url(String),
    /// Decoded inline clip.
    Inline(Vec<u8>),
}

/// Reference clip plus its transcript. Always present together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceReference {
    pub audio: ReferenceAudio,
    pub text: String,
}

/// A validated synthesis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    pub reference: Option<VoiceReference>,
}

impl SpeechRequest {
    pub fn reference_text(&self) -> Option<&str> {
        self.reference.as_ref().map(|r| r.text.as_str())
    }
}

/// Validate a job input and decode any inline reference audio.
///
/// The URL form wins when both reference-audio fields are set.
pub fn normalize(input: JobInput) -> Result<SpeechRequest, HandlerError> {
    let text = non_empty(input.text).ok_or(ValidationError::MissingText)?;

    let url = non_empty(input.reference_audio_url);
    let inline = non_empty(input.reference_audio_base64);
    let reference_text = non_empty(input.reference_text);

    let reference = match (url, inline, reference_text) {
        (None, None, None) => None,
        (None, None, Some(_)) => return Err(ValidationError::MissingReferenceAudio.into()),
        (_, _, None) => return Err(ValidationError::MissingReferenceText.into()),
        (Some(url), _, Some(text)) => Some(VoiceReference {
            audio: ReferenceAudio::Url(url),
            text,
        }),
        (None, Some(payload), Some(text)) => Some(VoiceReference {
            audio: ReferenceAudio::Inline(decode_base64_audio(&payload)?),
            text,
        }),
    };

    Ok(SpeechRequest { text, reference })
}

/// Decode a standard-base64 payload, dropping a leading data-URL header
/// (everything up to the first comma) and any ASCII whitespace.
pub fn decode_base64_audio(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let data = strip_data_url_prefix(payload);
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD.decode(compact)
}

fn strip_data_url_prefix(payload: &str) -> &str {
    payload
        .split_once(',')
        .map(|(_, data)| data)
        .unwrap_or(payload)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
