//! Prometheus metrics for the TTS worker.
//!
//! Recording helpers are no-ops until [`init_metrics`] has run, so library
//! code and tests can call them unconditionally.

use prometheus::{
    Counter, Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{Mutex, OnceLock};

static INIT_LOCK: Mutex<()> = Mutex::new(());

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Job metrics
pub static TTS_JOBS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static TTS_JOB_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static TTS_JOB_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Model metrics
pub static TTS_MODEL_LOADS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static TTS_MODEL_LOAD_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static TTS_SYNTHESIZED_AUDIO_SECONDS_TOTAL: OnceLock<Counter> = OnceLock::new();

/// Initialize all metrics. Safe to call more than once.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let _guard = INIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let jobs_total = IntCounterVec::new(
        Opts::new("tts_jobs_total", "Total number of jobs handled"),
        &["outcome"], // success, error, health_check
    )?;

    let job_duration = HistogramVec::new(
        HistogramOpts::new("tts_job_duration_seconds", "Job duration in seconds")
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["outcome"],
    )?;

    let job_errors = IntCounterVec::new(
        Opts::new("tts_job_errors_total", "Total job errors by kind"),
        &["kind"], // validation, decode, model, io, encode
    )?;

    let model_loads = IntCounterVec::new(
        Opts::new("tts_model_loads_total", "Model load attempts"),
        &["result"], // success, failure
    )?;

    let model_load_duration = HistogramVec::new(
        HistogramOpts::new(
            "tts_model_load_duration_seconds",
            "Model load duration in seconds",
        )
        .buckets(vec![0.1, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["result"],
    )?;

    let audio_seconds = Counter::new(
        "tts_synthesized_audio_seconds_total",
        "Total seconds of audio synthesized",
    )?;

    registry.register(Box::new(jobs_total.clone()))?;
    registry.register(Box::new(job_duration.clone()))?;
    registry.register(Box::new(job_errors.clone()))?;
    registry.register(Box::new(model_loads.clone()))?;
    registry.register(Box::new(model_load_duration.clone()))?;
    registry.register(Box::new(audio_seconds.clone()))?;

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = TTS_JOBS_TOTAL.set(jobs_total);
    let _ = TTS_JOB_DURATION_SECONDS.set(job_duration);
    let _ = TTS_JOB_ERRORS_TOTAL.set(job_errors);
    let _ = TTS_MODEL_LOADS_TOTAL.set(model_loads);
    let _ = TTS_MODEL_LOAD_DURATION_SECONDS.set(model_load_duration);
    let _ = TTS_SYNTHESIZED_AUDIO_SECONDS_TOTAL.set(audio_seconds);

    tracing::info!("Prometheus metrics initialized");
    Ok(())
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

// Helper functions for recording metrics

/// Record a finished job.
pub fn record_job(outcome: &str, duration_secs: f64) {
    if let Some(counter) = TTS_JOBS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
    if let Some(histogram) = TTS_JOB_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[outcome])
            .observe(duration_secs);
    }
}

/// Record a job error by kind.
pub fn record_job_error(kind: &str) {
    if let Some(counter) = TTS_JOB_ERRORS_TOTAL.get() {
        counter.with_label_values(&[kind]).inc();
    }
}

/// Record a model load attempt.
pub fn record_model_load(result: &str, duration_secs: f64) {
    if let Some(counter) = TTS_MODEL_LOADS_TOTAL.get() {
        counter.with_label_values(&[result]).inc();
    }
    if let Some(histogram) = TTS_MODEL_LOAD_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[result])
            .observe(duration_secs);
    }
}

/// Record seconds of audio produced.
pub fn record_audio_seconds(seconds: f64) {
    if let Some(counter) = TTS_SYNTHESIZED_AUDIO_SECONDS_TOTAL.get() {
        counter.inc_by(seconds);
    }
}
