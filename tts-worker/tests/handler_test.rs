mod common;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{context, files_in, reference_clip_base64, CountingLoader, RecordingModel};
use serde_json::json;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tts_worker::context::AppContext;
use tts_worker::handlers::handle_job;
use tts_worker::models::{
    GeneratedSpeech, HealthStatus, JobOutput, PretrainedSpec, SpeechOutput, VoiceCloneRequest,
};
use tts_worker::services::providers::{ModelLoader, ProviderError, SpeechModel};

fn expect_success(output: JobOutput) -> SpeechOutput {
    match output {
        JobOutput::Success(speech) => speech,
        other => panic!("expected success, got {:?}", other),
    }
}

fn expect_error(output: JobOutput) -> String {
    match output {
        JobOutput::Error { error } => error,
        other => panic!("expected error, got {:?}", other),
    }
}

fn read_wav(audio_base64: &str) -> (hound::WavSpec, Vec<i16>) {
    let bytes = STANDARD.decode(audio_base64).unwrap();
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
    let spec = reader.spec();
    let samples = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    (spec, samples)
}

#[tokio::test]
async fn plain_text_job_returns_wav_audio() {
    let dir = tempfile::tempdir().unwrap();
    let loader = CountingLoader::new(RecordingModel::new());
    let ctx = context(dir.path(), loader.clone());

    let speech = expect_success(handle_job(&ctx, Some(json!({"text": "hello"}))).await);

    assert_eq!(speech.text, "hello");
    assert_eq!(speech.sample_rate, 24_000);

    let (spec, samples) = read_wav(&speech.audio_base64);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_rate, speech.sample_rate);
    assert!(!samples.is_empty());

    let expected = samples.len() as f64 / speech.sample_rate as f64;
    assert!((speech.duration - expected).abs() < 1e-9);

    let calls = loader.model.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].text, "hello");
    assert_eq!(calls[0].language, "auto");
    assert!(calls[0].ref_audio.is_none());
    assert!(calls[0].ref_text.is_none());
}

#[tokio::test]
async fn output_serializes_to_the_success_shape() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), CountingLoader::new(RecordingModel::new()));

    let output = handle_job(&ctx, Some(json!({"text": "hello"}))).await;
    let value = serde_json::to_value(&output).unwrap();
    let object = value.as_object().unwrap();

    let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["audio_base64", "duration", "sample_rate", "text"]);
    assert!(object["duration"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn missing_text_is_rejected_before_anything_else() {
    let dir = tempfile::tempdir().unwrap();
    let loader = CountingLoader::new(RecordingModel::new());
    let ctx = context(dir.path(), loader.clone());

    for input in [
        None,
        Some(json!({})),
        Some(json!({"text": ""})),
        Some(json!({"reference_audio_base64": reference_clip_base64(), "reference_text": "hi"})),
    ] {
        let error = expect_error(handle_job(&ctx, input).await);
        assert_eq!(error, "No text provided");
    }

    assert_eq!(loader.load_count(), 0);
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn reference_audio_needs_a_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let loader = CountingLoader::new(RecordingModel::new());
    let ctx = context(dir.path(), loader.clone());

    let error = expect_error(
        handle_job(
            &ctx,
            Some(json!({"text": "hi", "reference_audio_url": "https://example.com/ref.wav"})),
        )
        .await,
    );
    assert_eq!(error, "reference_text is required when using reference audio");

    let error = expect_error(
        handle_job(
            &ctx,
            Some(json!({"text": "hi", "reference_audio_base64": reference_clip_base64()})),
        )
        .await,
    );
    assert_eq!(error, "reference_text is required when using reference audio");

    assert_eq!(loader.load_count(), 0);
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn transcript_needs_reference_audio() {
    let dir = tempfile::tempdir().unwrap();
    let loader = CountingLoader::new(RecordingModel::new());
    let ctx = context(dir.path(), loader.clone());

    let error = expect_error(
        handle_job(&ctx, Some(json!({"text": "hi", "reference_text": "hello there"}))).await,
    );
    assert_eq!(
        error,
        "reference_audio_url or reference_audio_base64 is required when providing reference_text"
    );
    assert_eq!(loader.load_count(), 0);
}

#[tokio::test]
async fn wrongly_typed_input_is_an_error_output() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path(), CountingLoader::new(RecordingModel::new()));

    let error = expect_error(handle_job(&ctx, Some(json!({"text": 42}))).await);
    assert!(error.starts_with("Invalid input:"), "{}", error);

    let error = expect_error(handle_job(&ctx, Some(json!("just a string"))).await);
    assert!(error.starts_with("Invalid input:"), "{}", error);
}

#[tokio::test]
async fn malformed_base64_fails_without_loading_or_writing() {
    let dir = tempfile::tempdir().unwrap();
    let loader = CountingLoader::new(RecordingModel::new());
    let ctx = context(dir.path(), loader.clone());

    let error = expect_error(
        handle_job(
            &ctx,
            Some(json!({
                "text": "hi",
                "reference_audio_base64": "this is not base64!!",
                "reference_text": "hello"
            })),
        )
        .await,
    );

    assert!(error.starts_with("Invalid reference_audio_base64:"), "{}", error);
    assert_eq!(loader.load_count(), 0);
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn inline_reference_reaches_the_model_as_a_file_and_is_cleaned_up() {
    let dir = tempfile::tempdir().unwrap();
    let loader = CountingLoader::new(RecordingModel::new());
    let ctx = context(dir.path(), loader.clone());
    let clip = reference_clip_base64();

    let speech = expect_success(
        handle_job(
            &ctx,
            Some(json!({
                "text": "clone me",
                "reference_audio_base64": clip,
                "reference_text": "a short sample"
            })),
        )
        .await,
    );
    assert_eq!(speech.text, "clone me");

    let calls = loader.model.calls();
    assert_eq!(calls.len(), 1);
    let ref_path = calls[0].ref_audio.clone().unwrap();
    assert!(calls[0].ref_file_existed);
    assert!(Path::new(&ref_path).starts_with(dir.path()));
    assert!(ref_path.ends_with(".wav"));
    assert_eq!(calls[0].ref_text.as_deref(), Some("a short sample"));

    assert!(!Path::new(&ref_path).exists());
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn data_url_payload_is_written_byte_for_byte() {
    /// Copies the reference file aside while it still exists.
    struct CopyingModel {
        inner: RecordingModel,
        copy: std::sync::Mutex<Option<Vec<u8>>>,
    }

    #[async_trait::async_trait]
    impl SpeechModel for CopyingModel {
        async fn generate_voice_clone(
            &self,
            request: &VoiceCloneRequest,
        ) -> Result<GeneratedSpeech, ProviderError> {
            if let Some(path) = request.ref_audio.as_deref() {
                *self.copy.lock().unwrap() = Some(std::fs::read(path).unwrap());
            }
            self.inner.generate_voice_clone(request).await
        }
    }

    struct CopyingLoader(Arc<CopyingModel>);

    #[async_trait::async_trait]
    impl ModelLoader for CopyingLoader {
        async fn from_pretrained(
            &self,
            _spec: &PretrainedSpec,
        ) -> Result<Arc<dyn SpeechModel>, ProviderError> {
            Ok(self.0.clone())
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(CopyingModel {
        inner: RecordingModel::new(),
        copy: std::sync::Mutex::new(None),
    });
    let config = common::test_config(dir.path());
    let ctx = AppContext::new(&config, Arc::new(CopyingLoader(model.clone())));

    let clip = reference_clip_base64();
    let original = STANDARD.decode(&clip).unwrap();

    expect_success(
        handle_job(
            &ctx,
            Some(json!({
                "text": "hi",
                "reference_audio_base64": format!("data:audio/wav;base64,{}", clip),
                "reference_text": "sample"
            })),
        )
        .await,
    );

    let written = model.copy.lock().unwrap().take().unwrap();
    assert_eq!(written, original);
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn temp_file_is_removed_when_generation_fails() {
    let dir = tempfile::tempdir().unwrap();
    let loader = CountingLoader::new(RecordingModel::failing("CUDA out of memory"));
    let ctx = context(dir.path(), loader.clone());

    let error = expect_error(
        handle_job(
            &ctx,
            Some(json!({
                "text": "hi",
                "reference_audio_base64": reference_clip_base64(),
                "reference_text": "sample"
            })),
        )
        .await,
    );

    assert_eq!(error, "Generation failed: CUDA out of memory");
    let calls = loader.model.calls();
    assert!(calls[0].ref_file_existed);
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn reference_url_is_passed_through_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let loader = CountingLoader::new(RecordingModel::new());
    let ctx = context(dir.path(), loader.clone());

    expect_success(
        handle_job(
            &ctx,
            Some(json!({
                "text": "hi",
                "reference_audio_url": "https://example.com/voice.wav",
                "reference_audio_base64": reference_clip_base64(),
                "reference_text": "sample"
            })),
        )
        .await,
    );

    let calls = loader.model.calls();
    assert_eq!(
        calls[0].ref_audio.as_deref(),
        Some("https://example.com/voice.wav")
    );
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn health_check_does_not_load_the_model() {
    let dir = tempfile::tempdir().unwrap();
    let loader = CountingLoader::new(RecordingModel::new());
    let ctx = context(dir.path(), loader.clone());

    let output = handle_job(&ctx, Some(json!({"health_check": true, "text": "ignored"}))).await;
    assert_eq!(output, JobOutput::Health(HealthStatus::healthy(false)));

    let output = handle_job(&ctx, Some(json!({"health_check": true, "text": 42}))).await;
    assert!(matches!(output, JobOutput::Health(_)));
    assert_eq!(loader.load_count(), 0);

    expect_success(handle_job(&ctx, Some(json!({"text": "warm up"}))).await);

    let output = handle_job(&ctx, Some(json!({"health_check": true}))).await;
    let value = serde_json::to_value(&output).unwrap();
    assert_eq!(
        value,
        json!({"status": "healthy", "message": "TTS handler ready", "model_loaded": true})
    );
    assert_eq!(loader.load_count(), 1);
}

#[tokio::test]
async fn failed_load_is_reported_and_retried() {
    let dir = tempfile::tempdir().unwrap();
    let loader = CountingLoader::with_failures(RecordingModel::new(), 1);
    let ctx = context(dir.path(), loader.clone());

    let error = expect_error(handle_job(&ctx, Some(json!({"text": "first"}))).await);
    assert_eq!(error, "Model load failed: CUDA device unavailable");
    assert!(!ctx.model.is_loaded());

    expect_success(handle_job(&ctx, Some(json!({"text": "second"}))).await);
    assert!(ctx.model.is_loaded());
    assert_eq!(loader.load_count(), 2);
}

#[tokio::test]
async fn model_is_loaded_with_configured_settings() {
    let dir = tempfile::tempdir().unwrap();
    let loader = CountingLoader::new(RecordingModel::new());
    let ctx = context(dir.path(), loader.clone());

    expect_success(handle_job(&ctx, Some(json!({"text": "hi"}))).await);

    let spec = loader.last_spec.lock().unwrap().clone().unwrap();
    assert_eq!(spec.name, "test/tts-model");
    assert_eq!(spec.device, "cpu");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cold_jobs_share_one_load() {
    let dir = tempfile::tempdir().unwrap();
    let loader = CountingLoader::new(RecordingModel::new());
    let ctx = Arc::new(context(dir.path(), loader.clone()));
    let clip = reference_clip_base64();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ctx = Arc::clone(&ctx);
            let input = if i % 2 == 0 {
                json!({"text": format!("job {}", i)})
            } else {
                json!({
                    "text": format!("job {}", i),
                    "reference_audio_base64": clip.clone(),
                    "reference_text": "sample"
                })
            };
            tokio::spawn(async move { handle_job(&ctx, Some(input)).await })
        })
        .collect();

    let outputs = futures::future::join_all(handles).await;
    for (i, output) in outputs.into_iter().enumerate() {
        let speech = expect_success(output.unwrap());
        assert_eq!(speech.text, format!("job {}", i));
    }

    assert_eq!(loader.load_count(), 1);

    let calls = loader.model.calls();
    let mut paths: Vec<_> = calls.iter().filter_map(|c| c.ref_audio.clone()).collect();
    assert_eq!(paths.len(), 4);
    assert!(calls.iter().filter(|c| c.ref_audio.is_some()).all(|c| c.ref_file_existed));
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 4);
    assert!(files_in(dir.path()).is_empty());
}
