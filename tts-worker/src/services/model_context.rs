//! Process-wide model handle with single-flight lazy loading.
//!
//! The first caller loads the model; concurrent callers wait for that load
//! and share its result. A failed load leaves the handle empty, so the next
//! caller tries again.

use crate::models::PretrainedSpec;
use crate::services::metrics;
use crate::services::providers::{ModelLoader, ProviderError, SpeechModel};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;

pub struct ModelContext {
    loader: Arc<dyn ModelLoader>,
    spec: PretrainedSpec,
    model: OnceCell<Arc<dyn SpeechModel>>,
}

impl ModelContext {
    pub fn new(loader: Arc<dyn ModelLoader>, spec: PretrainedSpec) -> Self {
        Self {
            loader,
            spec,
            model: OnceCell::new(),
        }
    }

    pub fn spec(&self) -> &PretrainedSpec {
        &self.spec
    }

    /// Whether a model is loaded. Never triggers a load.
    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    /// Return the loaded model, loading it first if needed.
    pub async fn ensure_loaded(&self) -> Result<Arc<dyn SpeechModel>, ProviderError> {
        let model = self
            .model
            .get_or_try_init(|| async {
                tracing::info!(
                    model = %self.spec.name,
                    device = %self.spec.device,
                    dtype = %self.spec.dtype,
                    attention = %self.spec.attention,
                    "Loading TTS model"
                );
                let start = Instant::now();

                match self.loader.from_pretrained(&self.spec).await {
                    Ok(model) => {
                        let elapsed = start.elapsed().as_secs_f64();
                        metrics::record_model_load("success", elapsed);
                        tracing::info!(
                            model = %self.spec.name,
                            elapsed_secs = elapsed,
                            "TTS model loaded"
                        );
                        Ok(model)
                    }
                    Err(e) => {
                        metrics::record_model_load("failure", start.elapsed().as_secs_f64());
                        tracing::error!(model = %self.spec.name, error = %e, "Failed to load TTS model");
                        Err(e)
                    }
                }
            })
            .await?;

        Ok(Arc::clone(model))
    }
}
