pub mod encoder;
pub mod metrics;
pub mod model_context;
pub mod normalizer;
pub mod providers;
pub mod reference_audio;
pub mod synthesizer;

pub use model_context::ModelContext;
pub use normalizer::{normalize, ReferenceAudio, SpeechRequest, VoiceReference};
pub use reference_audio::{MaterializedReference, ReferenceAudioMaterializer, TempAudioFile};
pub use synthesizer::{synthesize, Waveform};
