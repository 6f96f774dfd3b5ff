use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recognition::domain::face_descriptor::FaceDescriptor;

/// One candidate returned by a matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub profile_id: String,
    pub full_name: String,
    pub similarity_score: f64,
}

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("match request failed: {0}")]
    Transport(String),
    #[error("match endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode match response: {0}")]
    Decode(String),
    #[error("profile store unavailable: {0}")]
    Store(String),
}

/// Similarity search over registered descriptors.
///
/// Candidates come back ordered best-first; callers treat index 0 as the
/// best match.
#[async_trait]
pub trait FaceMatcher: Send + Sync {
    async fn query(
        &self,
        descriptor: &FaceDescriptor,
        threshold: f64,
    ) -> Result<Vec<MatchCandidate>, MatchError>;
}

/// True when candidates are in non-increasing similarity order.
pub fn is_ranked(candidates: &[MatchCandidate]) -> bool {
    candidates
        .windows(2)
        .all(|w| w[0].similarity_score >= w[1].similarity_score)
}
