use std::sync::Arc;

use crate::liveness::domain::video_source::VideoSource;
use crate::pipeline::attempt_observer::AttemptObserver;
use crate::pipeline::evaluate_liveness_use_case::EvaluateLivenessUseCase;
use crate::pipeline::recognize_face_use_case::RecognizeFaceUseCase;
use crate::recognition::domain::outcome::{Location, RecognitionOutcome};
use crate::recognition::domain::recognition_error::RecognitionError;

/// Terminal check-in: liveness gate, then audited recognition of one
/// fresh frame from the same source.
pub struct CheckInUseCase {
    liveness: EvaluateLivenessUseCase,
    recognize: RecognizeFaceUseCase,
    observer: Arc<dyn AttemptObserver>,
}

impl CheckInUseCase {
    pub fn new(
        liveness: EvaluateLivenessUseCase,
        recognize: RecognizeFaceUseCase,
        observer: Arc<dyn AttemptObserver>,
    ) -> Self {
        Self {
            liveness,
            recognize,
            observer,
        }
    }

    /// A failed liveness check is returned without an audit record; the
    /// caller decides whether to retry.
    pub async fn execute(
        &self,
        source: &mut dyn VideoSource,
        location: Option<Location>,
    ) -> RecognitionOutcome {
        let liveness = self.liveness.execute(source).await;
        if !liveness.passed {
            return self.reject(RecognitionError::LivenessFailed);
        }

        let frame = match source.current_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("Could not capture check-in frame: {e}");
                return self.reject(RecognitionError::Processing(e.to_string()));
            }
        };
        self.recognize.execute(&frame, location).await
    }

    fn reject(&self, error: RecognitionError) -> RecognitionOutcome {
        let outcome = RecognitionOutcome::failed(&error, None);
        self.observer.attempt_recorded(&outcome, None);
        outcome
    }
}
