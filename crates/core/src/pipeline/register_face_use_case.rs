use std::sync::Arc;

use chrono::Utc;

use crate::pipeline::attempt_observer::AttemptObserver;
use crate::recognition::domain::descriptor_extractor::DescriptorExtractor;
use crate::recognition::domain::outcome::RegistrationOutcome;
use crate::recognition::domain::profile_store::ProfileStore;
use crate::recognition::domain::recognition_error::RecognitionError;
use crate::shared::frame::Frame;

/// Enrollment: extract a descriptor and attach it to an existing profile.
/// Registration is not audited.
pub struct RegisterFaceUseCase {
    extractor: Arc<dyn DescriptorExtractor>,
    store: Arc<dyn ProfileStore>,
    observer: Arc<dyn AttemptObserver>,
}

impl RegisterFaceUseCase {
    pub fn new(
        extractor: Arc<dyn DescriptorExtractor>,
        store: Arc<dyn ProfileStore>,
        observer: Arc<dyn AttemptObserver>,
    ) -> Self {
        Self {
            extractor,
            store,
            observer,
        }
    }

    pub async fn execute(&self, frame: &Frame, user_id: &str) -> RegistrationOutcome {
        let outcome = match self.register(frame, user_id).await {
            Ok(()) => RegistrationOutcome::registered(),
            Err(e) => {
                match &e {
                    RecognitionError::Processing(_) => log::error!("Registration failed: {e}"),
                    _ => log::info!("Registration rejected: {e}"),
                }
                RegistrationOutcome::failed(&e)
            }
        };
        self.observer.registration_completed(user_id, &outcome);
        outcome
    }

    async fn register(&self, frame: &Frame, user_id: &str) -> Result<(), RecognitionError> {
        if !self.extractor.is_ready() {
            return Err(RecognitionError::ModelsNotReady);
        }
        if user_id.trim().is_empty() {
            return Err(RecognitionError::Processing("empty user id".into()));
        }

        let descriptor = match self.extractor.extract(frame) {
            Ok(Some(descriptor)) => descriptor,
            Ok(None) => return Err(RecognitionError::NoFaceDetected),
            Err(e) => {
                log::warn!("Descriptor extraction failed, treating as no face: {e}");
                return Err(RecognitionError::NoFaceDetected);
            }
        };
        if !descriptor.is_valid() {
            return Err(RecognitionError::Processing(
                "extractor produced a malformed descriptor".into(),
            ));
        }

        self.store
            .save_descriptor(user_id, &descriptor, Utc::now())
            .await
            .map_err(|e| RecognitionError::Processing(e.to_string()))?;
        log::debug!("Stored {}-d descriptor for {user_id}", descriptor.len());
        Ok(())
    }
}
