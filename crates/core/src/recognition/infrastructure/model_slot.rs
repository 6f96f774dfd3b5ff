use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use tokio::task::JoinHandle;

use crate::recognition::domain::descriptor_extractor::DescriptorExtractor;
use crate::recognition::domain::face_descriptor::FaceDescriptor;
use crate::recognition::infrastructure::onnx_descriptor_extractor::OnnxDescriptorExtractor;
use crate::recognition::infrastructure::onnx_face_locator::DEFAULT_CONFIDENCE;
use crate::shared::constants::{
    EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, FACE_MODEL_NAME, FACE_MODEL_URL,
};
use crate::shared::frame::Frame;
use crate::shared::model_resolver;
use crate::shared::BoxError;

pub type ExtractorLoader =
    Box<dyn FnOnce() -> Result<Box<dyn DescriptorExtractor>, String> + Send + 'static>;

/// Extractor that becomes available once its models finish loading.
///
/// Loaded at most once, in the background, at startup; afterwards shared
/// read-only by every recognition call. Until then `is_ready()` is false.
pub struct ModelSlot {
    extractor: OnceLock<Box<dyn DescriptorExtractor>>,
    failure: OnceLock<String>,
}

impl ModelSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            extractor: OnceLock::new(),
            failure: OnceLock::new(),
        })
    }

    /// Runs `loader` on the blocking pool and installs its extractor.
    pub fn spawn_load(self: &Arc<Self>, loader: ExtractorLoader) -> JoinHandle<()> {
        let slot = Arc::clone(self);
        tokio::task::spawn_blocking(move || match loader() {
            Ok(extractor) => {
                if slot.extractor.set(extractor).is_err() {
                    log::warn!("Face models were already loaded; ignoring second load");
                } else {
                    log::info!("Face models loaded");
                }
            }
            Err(e) => {
                log::error!("Failed to load face models: {e}");
                let _ = slot.failure.set(e);
            }
        })
    }

    /// Error message from a failed load, if any.
    pub fn load_failure(&self) -> Option<&str> {
        self.failure.get().map(String::as_str)
    }
}

impl DescriptorExtractor for ModelSlot {
    fn is_ready(&self) -> bool {
        self.extractor.get().is_some_and(|e| e.is_ready())
    }

    fn extract(&self, frame: &Frame) -> Result<Option<FaceDescriptor>, BoxError> {
        match self.extractor.get() {
            Some(extractor) => extractor.extract(frame),
            None => Err("Face models not loaded".into()),
        }
    }
}

/// Loader that resolves (downloading if needed) and opens the ONNX models.
pub fn onnx_loader(models_dir: Option<PathBuf>) -> ExtractorLoader {
    Box::new(move || {
        let bundled = models_dir.as_deref();
        let face_model = model_resolver::resolve(FACE_MODEL_NAME, FACE_MODEL_URL, bundled, None)
            .map_err(|e| e.to_string())?;
        let embedding_model =
            model_resolver::resolve(EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, bundled, None)
                .map_err(|e| e.to_string())?;
        let extractor =
            OnnxDescriptorExtractor::from_model_paths(&face_model, &embedding_model, DEFAULT_CONFIDENCE)
                .map_err(|e| e.to_string())?;
        Ok(Box::new(extractor) as Box<dyn DescriptorExtractor>)
    })
}
