use async_trait::async_trait;
use serde::Serialize;

use crate::recognition::domain::face_descriptor::FaceDescriptor;
use crate::recognition::domain::face_matcher::{FaceMatcher, MatchCandidate, MatchError};

#[derive(Serialize)]
struct MatchRequest<'a> {
    query_descriptor: &'a [f32],
    match_threshold: f64,
}

/// Remote vector search exposed as a JSON RPC endpoint.
///
/// POSTs `{query_descriptor, match_threshold}` and expects a JSON array of
/// `{profile_id, full_name, similarity_score}` ordered best first. No
/// timeout is applied beyond the client's defaults.
pub struct HttpFaceMatcher {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpFaceMatcher {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            api_key: None,
        }
    }

    /// Sends the key as both `apikey` and bearer token, the convention of
    /// hosted Postgres RPC gateways.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[async_trait]
impl FaceMatcher for HttpFaceMatcher {
    async fn query(
        &self,
        descriptor: &FaceDescriptor,
        threshold: f64,
    ) -> Result<Vec<MatchCandidate>, MatchError> {
        let body = MatchRequest {
            query_descriptor: descriptor.as_slice(),
            match_threshold: threshold,
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MatchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MatchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let candidates: Vec<MatchCandidate> = response
            .json()
            .await
            .map_err(|e| MatchError::Decode(e.to_string()))?;
        log::debug!("Matcher returned {} candidates", candidates.len());
        Ok(candidates)
    }
}
