use std::sync::Arc;

use async_trait::async_trait;

use crate::recognition::domain::face_descriptor::FaceDescriptor;
use crate::recognition::domain::face_matcher::{FaceMatcher, MatchCandidate, MatchError};
use crate::recognition::infrastructure::json_profile_store::JsonProfileStore;

/// Brute-force cosine matcher over the descriptors in a [`JsonProfileStore`].
///
/// Stand-in for the remote vector search when running offline; returns
/// candidates at or above the threshold, best first.
pub struct LocalFaceMatcher {
    store: Arc<JsonProfileStore>,
    max_candidates: usize,
}

impl LocalFaceMatcher {
    pub fn new(store: Arc<JsonProfileStore>) -> Self {
        Self {
            store,
            max_candidates: 5,
        }
    }

    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates.max(1);
        self
    }
}

#[async_trait]
impl FaceMatcher for LocalFaceMatcher {
    async fn query(
        &self,
        descriptor: &FaceDescriptor,
        threshold: f64,
    ) -> Result<Vec<MatchCandidate>, MatchError> {
        let profiles = self
            .store
            .profiles()
            .await
            .map_err(|e| MatchError::Store(e.to_string()))?;

        let mut candidates: Vec<MatchCandidate> = profiles
            .into_iter()
            .filter_map(|profile| {
                let stored = profile.face_descriptor.as_ref()?;
                let similarity = descriptor.similarity(stored);
                (similarity >= threshold).then(|| MatchCandidate {
                    profile_id: profile.id.clone(),
                    full_name: profile.full_name.clone(),
                    similarity_score: similarity,
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(self.max_candidates);
        Ok(candidates)
    }
}
