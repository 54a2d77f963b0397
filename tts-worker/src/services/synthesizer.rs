//! Thin wrapper over the model's voice-clone call.

use crate::models::VoiceCloneRequest;
use crate::services::providers::{ProviderError, SpeechModel};

/// A single generated waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Run generation and take the first waveform of the batch.
///
/// Errors from the model are returned as-is; translation into a job output
/// happens in the job handler.
pub async fn synthesize(
    model: &dyn SpeechModel,
    text: &str,
    language: &str,
    ref_audio: Option<&str>,
    ref_text: Option<&str>,
) -> Result<Waveform, ProviderError> {
    let request = VoiceCloneRequest {
        text: text.to_string(),
        language: language.to_string(),
        ref_audio: ref_audio.map(str::to_string),
        ref_text: ref_text.map(str::to_string),
    };

    let generated = model.generate_voice_clone(&request).await?;

    if generated.sample_rate == 0 {
        return Err(ProviderError::GenerationFailed(
            "model returned a sample rate of 0".to_string(),
        ));
    }

    let samples = generated
        .waveforms
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::GenerationFailed("model returned no waveforms".to_string()))?;

    Ok(Waveform {
        samples,
        sample_rate: generated.sample_rate,
    })
}
