//! Mock model for local runs and tests.
//!
//! Produces a deterministic tone whose length grows with the input text.

use super::{ModelLoader, ProviderError, SpeechModel};
use crate::models::{GeneratedSpeech, PretrainedSpec, VoiceCloneRequest};
use async_trait::async_trait;
use std::f32::consts::TAU;
use std::path::Path;
use std::sync::Arc;

/// Output rate of the mock model (matches the 12Hz codec family).
pub const MOCK_SAMPLE_RATE: u32 = 24_000;

const SECONDS_PER_CHAR: f32 = 0.06;
const MIN_SECONDS: f32 = 0.25;
const TONE_HZ: f32 = 220.0;
const AMPLITUDE: f32 = 0.3;

/// Mock loader for testing.
pub struct MockModelLoader {
    enabled: bool,
}

impl MockModelLoader {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl ModelLoader for MockModelLoader {
    async fn from_pretrained(
        &self,
        spec: &PretrainedSpec,
    ) -> Result<Arc<dyn SpeechModel>, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock model loader not enabled".to_string(),
            ));
        }

        tracing::debug!(model = %spec.name, device = %spec.device, "Loading mock model");
        Ok(Arc::new(MockSpeechModel::new(MOCK_SAMPLE_RATE)))
    }
}

/// Mock speech model.
pub struct MockSpeechModel {
    sample_rate: u32,
}

impl MockSpeechModel {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    fn tone(&self, text: &str) -> Vec<f32> {
        let seconds = (text.chars().count() as f32 * SECONDS_PER_CHAR).max(MIN_SECONDS);
        let len = (seconds * self.sample_rate as f32) as usize;
        let step = TAU * TONE_HZ / self.sample_rate as f32;
        (0..len)
            .map(|i| AMPLITUDE * (step * i as f32).sin())
            .collect()
    }
}

#[async_trait]
impl SpeechModel for MockSpeechModel {
    async fn generate_voice_clone(
        &self,
        request: &VoiceCloneRequest,
    ) -> Result<GeneratedSpeech, ProviderError> {
        if request.text.is_empty() {
            return Err(ProviderError::InvalidRequest("empty text".to_string()));
        }

        // Local reference clips must be readable, like the real model.
        if let Some(reference) = request.ref_audio.as_deref() {
            let is_remote = reference.starts_with("http://") || reference.starts_with("https://");
            if !is_remote && !Path::new(reference).is_file() {
                return Err(ProviderError::GenerationFailed(format!(
                    "reference audio not found: {}",
                    reference
                )));
            }
        }

        Ok(GeneratedSpeech {
            waveforms: vec![self.tone(&request.text)],
            sample_rate: self.sample_rate,
        })
    }
}
