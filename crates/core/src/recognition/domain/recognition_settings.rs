use serde::{Deserialize, Serialize};

use crate::shared::constants::{DEFAULT_EVIDENCE_QUALITY, DEFAULT_SIMILARITY_THRESHOLD};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    /// Minimum cosine similarity for a candidate to count as a match.
    pub similarity_threshold: f64,
    /// JPEG quality (1-100) of stored evidence images.
    pub evidence_quality: u8,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            evidence_quality: DEFAULT_EVIDENCE_QUALITY,
        }
    }
}
