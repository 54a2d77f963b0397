//! HTTP-backed model provider.
//!
//! Talks to an inference sidecar that hosts the TTS weights on the GPU.
//! `POST /v1/models/load` returns a model handle id, `POST /v1/generate`
//! runs voice-clone generation against that handle and returns float
//! samples.

use super::{ModelLoader, ProviderError, SpeechModel};
use crate::models::{GeneratedSpeech, PretrainedSpec, VoiceCloneRequest};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Loading weights onto a device can take minutes on a cold node.
const LOAD_TIMEOUT: Duration = Duration::from_secs(900);
const GENERATE_TIMEOUT: Duration = Duration::from_secs(300);

/// HTTP model loader configuration.
#[derive(Debug, Clone)]
pub struct HttpModelConfig {
    /// Base URL of the sidecar, without trailing slash.
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
struct LoadResponse {
    model_id: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model_id: &'a str,
    #[serde(flatten)]
    request: &'a VoiceCloneRequest,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Loader that asks the sidecar to construct the model.
pub struct HttpModelLoader {
    config: HttpModelConfig,
    client: Client,
}

impl HttpModelLoader {
    pub fn new(config: HttpModelConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config: HttpModelConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
            },
            client,
        })
    }
}

#[async_trait]
impl ModelLoader for HttpModelLoader {
    async fn from_pretrained(
        &self,
        spec: &PretrainedSpec,
    ) -> Result<Arc<dyn SpeechModel>, ProviderError> {
        let url = format!("{}/v1/models/load", self.config.base_url);

        tracing::debug!(
            url = %url,
            model = %spec.name,
            device = %spec.device,
            dtype = %spec.dtype,
            attention = %spec.attention,
            "Requesting model load from inference sidecar"
        );

        let response = self
            .client
            .post(&url)
            .timeout(LOAD_TIMEOUT)
            .json(spec)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let response = check_status(response, ProviderError::LoadFailed).await?;
        let body: LoadResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::LoadFailed(format!("Failed to parse response: {}", e)))?;

        Ok(Arc::new(HttpSpeechModel {
            base_url: self.config.base_url.clone(),
            model_id: body.model_id,
            client: self.client.clone(),
        }))
    }
}

/// Handle to a model living in the sidecar.
pub struct HttpSpeechModel {
    base_url: String,
    model_id: String,
    client: Client,
}

impl HttpSpeechModel {
    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[async_trait]
impl SpeechModel for HttpSpeechModel {
    async fn generate_voice_clone(
        &self,
        request: &VoiceCloneRequest,
    ) -> Result<GeneratedSpeech, ProviderError> {
        let url = format!("{}/v1/generate", self.base_url);
        let body = GenerateRequest {
            model_id: &self.model_id,
            request,
        };

        let response = self
            .client
            .post(&url)
            .timeout(GENERATE_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let response = check_status(response, ProviderError::GenerationFailed).await?;
        response.json().await.map_err(|e| {
            ProviderError::GenerationFailed(format!("Failed to parse response: {}", e))
        })
    }
}

/// Turn a non-2xx sidecar response into a provider error, preferring the
/// sidecar's own `{"error": ...}` message.
async fn check_status(
    response: Response,
    on_error: fn(String) -> ProviderError,
) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&error_text)
        .map(|body| body.error)
        .unwrap_or(error_text);

    if status.is_client_error() {
        return Err(ProviderError::InvalidRequest(format!("{}: {}", status, message)));
    }

    Err(on_error(format!("{}: {}", status, message)))
}
