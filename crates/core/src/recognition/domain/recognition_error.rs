use thiserror::Error;

/// Failure taxonomy of the recognition workflow.
///
/// None of these escape a use case: each is folded into an outcome, and
/// the upload/write variants are only ever logged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecognitionError {
    #[error("face models are not loaded yet")]
    ModelsNotReady,
    #[error("no face detected in the captured image")]
    NoFaceDetected,
    #[error("no registered profile matched the face")]
    NoMatch,
    #[error("match query failed: {0}")]
    RemoteError(String),
    #[error("evidence upload failed: {0}")]
    EvidenceUploadFailure(String),
    #[error("audit write failed: {0}")]
    AuditWriteFailure(String),
    #[error("liveness check failed")]
    LivenessFailed,
    #[error("processing error: {0}")]
    Processing(String),
}

impl RecognitionError {
    /// Short message shown to the person at the terminal.
    pub fn user_message(&self) -> &'static str {
        match self {
            RecognitionError::ModelsNotReady => "models not loaded",
            RecognitionError::NoFaceDetected => "no face detected",
            RecognitionError::NoMatch => "no user found",
            RecognitionError::RemoteError(_) => "match query failed",
            RecognitionError::LivenessFailed => "liveness check failed",
            RecognitionError::EvidenceUploadFailure(_)
            | RecognitionError::AuditWriteFailure(_)
            | RecognitionError::Processing(_) => "processing error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RecognitionError::ModelsNotReady, "models not loaded")]
    #[case(RecognitionError::NoFaceDetected, "no face detected")]
    #[case(RecognitionError::NoMatch, "no user found")]
    #[case(RecognitionError::RemoteError("timeout".into()), "match query failed")]
    #[case(RecognitionError::LivenessFailed, "liveness check failed")]
    #[case(RecognitionError::Processing("bad".into()), "processing error")]
    fn test_user_messages(#[case] err: RecognitionError, #[case] expected: &str) {
        assert_eq!(err.user_message(), expected);
    }

    #[test]
    fn test_display_keeps_detail() {
        let err = RecognitionError::RemoteError("connection refused".into());
        assert_eq!(err.to_string(), "match query failed: connection refused");
    }
}
