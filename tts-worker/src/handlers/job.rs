//! Per-job orchestration.
//!
//! `input -> health check | normalize -> load model -> materialize reference
//! -> synthesize -> encode`. Every failure becomes an error output here; the
//! reference temp file is dropped (and deleted) before the output is returned.

use crate::context::AppContext;
use crate::error::HandlerError;
use crate::models::{HealthStatus, JobInput, JobOutput, SpeechOutput};
use crate::services::encoder::encode_wav_base64;
use crate::services::{metrics, normalize, synthesize};
use serde_json::Value;
use std::time::Instant;

const TEXT_PREVIEW_CHARS: usize = 50;

/// Handle one job `input` mapping and produce exactly one output.
pub async fn handle_job(ctx: &AppContext, input: Option<Value>) -> JobOutput {
    let start = Instant::now();

    if JobInput::is_health_check(input.as_ref()) {
        metrics::record_job("health_check", start.elapsed().as_secs_f64());
        return JobOutput::Health(HealthStatus::healthy(ctx.model.is_loaded()));
    }

    let output = match JobInput::from_value(input) {
        Ok(input) => run(ctx, input).await,
        Err(e) => Err(HandlerError::from(e)),
    };

    match output {
        Ok(speech) => {
            metrics::record_job("success", start.elapsed().as_secs_f64());
            JobOutput::Success(speech)
        }
        Err(e) => {
            metrics::record_job("error", start.elapsed().as_secs_f64());
            metrics::record_job_error(e.kind());
            match &e {
                HandlerError::InvalidInput(_) | HandlerError::Validation(_) => {
                    tracing::info!(error = %e, "Rejected job input");
                }
                _ => tracing::error!(error = %e, kind = e.kind(), "Error generating speech"),
            }
            JobOutput::error(e.to_string())
        }
    }
}

async fn run(ctx: &AppContext, input: JobInput) -> Result<SpeechOutput, HandlerError> {
    let request = normalize(input)?;
    let model = ctx.model.ensure_loaded().await?;

    // Held until the end of this function; dropping it deletes the temp file.
    let reference = ctx
        .materializer
        .materialize(request.reference.as_ref().map(|r| &r.audio))?;

    tracing::info!(
        text_preview = %preview(&request.text),
        text_chars = request.text.chars().count(),
        with_reference = reference.locator().is_some(),
        "Generating speech"
    );
    let started = Instant::now();

    let waveform = synthesize(
        model.as_ref(),
        &request.text,
        &ctx.language,
        reference.locator(),
        request.reference_text(),
    )
    .await?;

    let duration = waveform.duration_secs();
    let audio_base64 = encode_wav_base64(&waveform.samples, waveform.sample_rate)?;

    metrics::record_audio_seconds(duration);
    tracing::info!(
        samples = waveform.samples.len(),
        sample_rate = waveform.sample_rate,
        duration_secs = duration,
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Speech generated"
    );

    Ok(SpeechOutput {
        audio_base64,
        sample_rate: waveform.sample_rate,
        duration,
        text: request.text,
    })
}

fn preview(text: &str) -> String {
    text.chars().take(TEXT_PREVIEW_CHARS).collect()
}
