//! Domain models for the TTS worker.

pub mod job;
pub mod speech;

pub use job::{HealthStatus, Job, JobInput, JobOutput, SpeechOutput};
pub use speech::{AttentionBackend, Dtype, GeneratedSpeech, PretrainedSpec, VoiceCloneRequest};
