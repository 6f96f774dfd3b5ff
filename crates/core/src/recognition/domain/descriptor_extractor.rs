use crate::recognition::domain::face_descriptor::FaceDescriptor;
use crate::shared::frame::Frame;
use crate::shared::BoxError;

/// Domain interface for single-face descriptor extraction.
///
/// Implementations hold loaded models and are shared read-only across
/// recognition calls, hence `&self` and `Sync`.
pub trait DescriptorExtractor: Send + Sync {
    /// Whether the underlying models have finished loading.
    fn is_ready(&self) -> bool {
        true
    }

    /// Returns the descriptor of the most prominent face, or `None` when no
    /// face is found.
    fn extract(&self, frame: &Frame) -> Result<Option<FaceDescriptor>, BoxError>;
}
