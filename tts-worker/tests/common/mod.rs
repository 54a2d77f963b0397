#![allow(dead_code)]

use async_trait::async_trait;
use service_core::config::Config as CoreConfig;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tts_worker::config::{ModelBackend, ModelConfig, SynthesisConfig, WorkerConfig};
use tts_worker::context::AppContext;
use tts_worker::models::{
    AttentionBackend, Dtype, GeneratedSpeech, PretrainedSpec, VoiceCloneRequest,
};
use tts_worker::services::encoder::encode_wav_base64;
use tts_worker::services::providers::mock::{MockSpeechModel, MOCK_SAMPLE_RATE};
use tts_worker::services::providers::{ModelLoader, ProviderError, SpeechModel};
use tts_worker::startup::Application;

pub fn test_config(temp_dir: &Path) -> WorkerConfig {
    WorkerConfig {
        common: CoreConfig { port: 0 },
        model: ModelConfig {
            name: "test/tts-model".to_string(),
            device: "cpu".to_string(),
            dtype: Dtype::Float32,
            attention: AttentionBackend::Eager,
            backend: ModelBackend::Mock,
            inference_url: "http://127.0.0.1:1".to_string(),
            preload: false,
        },
        synthesis: SynthesisConfig {
            language: "auto".to_string(),
            temp_dir: Some(temp_dir.to_path_buf()),
        },
    }
}

/// One observed generation call.
#[derive(Debug, Clone)]
pub struct ObservedCall {
    pub text: String,
    pub language: String,
    pub ref_audio: Option<String>,
    pub ref_text: Option<String>,
    /// Whether `ref_audio` named an existing local file at call time.
    pub ref_file_existed: bool,
}

/// Mock model that records what it was asked and can be told to fail.
pub struct RecordingModel {
    inner: MockSpeechModel,
    fail_with: Option<String>,
    pub calls: Mutex<Vec<ObservedCall>>,
}

impl RecordingModel {
    pub fn new() -> Self {
        Self {
            inner: MockSpeechModel::new(MOCK_SAMPLE_RATE),
            fail_with: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<ObservedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechModel for RecordingModel {
    async fn generate_voice_clone(
        &self,
        request: &VoiceCloneRequest,
    ) -> Result<GeneratedSpeech, ProviderError> {
        let ref_file_existed = request
            .ref_audio
            .as_deref()
            .map(|p| Path::new(p).is_file())
            .unwrap_or(false);

        self.calls.lock().unwrap().push(ObservedCall {
            text: request.text.clone(),
            language: request.language.clone(),
            ref_audio: request.ref_audio.clone(),
            ref_text: request.ref_text.clone(),
            ref_file_existed,
        });

        if let Some(message) = &self.fail_with {
            return Err(ProviderError::GenerationFailed(message.clone()));
        }
        self.inner.generate_voice_clone(request).await
    }
}

/// Loader that counts loads, can fail the first N attempts, and takes a
/// while so concurrent callers overlap.
pub struct CountingLoader {
    pub loads: AtomicUsize,
    failures_remaining: AtomicUsize,
    delay: Duration,
    pub model: Arc<RecordingModel>,
    pub last_spec: Mutex<Option<PretrainedSpec>>,
}

impl CountingLoader {
    pub fn new(model: RecordingModel) -> Arc<Self> {
        Self::with_failures(model, 0)
    }

    pub fn with_failures(model: RecordingModel, failures: usize) -> Arc<Self> {
        Arc::new(Self {
            loads: AtomicUsize::new(0),
            failures_remaining: AtomicUsize::new(failures),
            delay: Duration::from_millis(50),
            model: Arc::new(model),
            last_spec: Mutex::new(None),
        })
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelLoader for CountingLoader {
    async fn from_pretrained(
        &self,
        spec: &PretrainedSpec,
    ) -> Result<Arc<dyn SpeechModel>, ProviderError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        *self.last_spec.lock().unwrap() = Some(spec.clone());
        tokio::time::sleep(self.delay).await;

        let failed = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(ProviderError::LoadFailed("CUDA device unavailable".to_string()));
        }

        Ok(self.model.clone())
    }
}

/// A context wired to `loader`, writing temp files under `temp_dir`.
pub fn context(temp_dir: &Path, loader: Arc<CountingLoader>) -> AppContext {
    AppContext::new(&test_config(temp_dir), loader)
}

pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

/// A short base64 WAV clip usable as reference audio.
pub fn reference_clip_base64() -> String {
    let samples: Vec<f32> = (0..2400).map(|i| (i as f32 / 10.0).sin() * 0.2).collect();
    encode_wav_base64(&samples, 24_000).unwrap()
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub context: Arc<AppContext>,
    pub loader: Arc<CountingLoader>,
    pub temp_dir: tempfile::TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(CountingLoader::new(RecordingModel::new())).await
    }

    pub async fn spawn_with(loader: Arc<CountingLoader>) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = test_config(temp_dir.path());

        let app = Application::build_with_loader(config, loader.clone())
            .await
            .expect("Failed to build test application");

        let port = app.http_port();
        let context = app.context();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        Self {
            address,
            port,
            context,
            loader,
            temp_dir,
        }
    }

    pub async fn run_sync(&self, body: serde_json::Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/runsync", self.address))
            .json(&body)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .expect("Failed to send request")
    }
}
