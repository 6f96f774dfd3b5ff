use crate::shared::frame::Frame;
use crate::shared::BoxError;

/// A live capture source that yields its current frame on demand.
///
/// The source's lifecycle (opening the camera, tearing it down) belongs to
/// the caller; the liveness estimator only samples it.
pub trait VideoSource: Send {
    fn current_frame(&mut self) -> Result<Frame, BoxError>;
}
