//! Application context handed to every job.

use crate::config::WorkerConfig;
use crate::services::providers::ModelLoader;
use crate::services::{ModelContext, ReferenceAudioMaterializer};
use std::sync::Arc;

/// Everything a job needs: the shared model handle, the temp-file writer,
/// and the language hint.
pub struct AppContext {
    pub model: ModelContext,
    pub materializer: ReferenceAudioMaterializer,
    pub language: String,
}

impl AppContext {
    pub fn new(config: &WorkerConfig, loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            model: ModelContext::new(loader, config.pretrained_spec()),
            materializer: ReferenceAudioMaterializer::new(config.synthesis.temp_dir.clone()),
            language: config.synthesis.language.clone(),
        }
    }

    /// Start loading the model in the background. A failure is logged and
    /// left for the next job to retry.
    pub fn spawn_preload(self: &Arc<Self>) {
        let ctx = Arc::clone(self);
        tokio::spawn(async move {
            tracing::info!("Pre-loading model");
            if let Err(e) = ctx.model.ensure_loaded().await {
                tracing::warn!(error = %e, "Could not pre-load model");
            }
        });
    }
}
