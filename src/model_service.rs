use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::collaborators::{
    CollaboratorError, Explainer, Explanation, FeatureStore, KeywordAnalyzer, Prediction,
    Predictor, VideoComment, VideoMetadata,
};
use crate::config::AnalyzerConfig;
use crate::normalizer::CanonicalResponse;

const SERVICE: &str = "model service";

/// Client for the remote service that owns feature extraction, the decline
/// model, attribution and keyword analysis. All state on that side is keyed
/// by request id.
#[derive(Clone)]
pub struct ModelServiceClient {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub request_id: &'a str,
    pub metadata: &'a VideoMetadata,
    pub comments: &'a [VideoComment],
}

#[derive(Debug, Clone, Serialize)]
struct RequestRef<'a> {
    request_id: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct TopicRef<'a> {
    topic: &'a str,
}

impl ModelServiceClient {
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, String> {
        let timeout = Duration::from_millis(config.model_service.timeout_ms);
        ModelServiceClient::new(config.model_service.endpoint.clone(), timeout)
    }

    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| format!("failed to build model service client: {}", err))?;
        Ok(Self { endpoint, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, CollaboratorError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|err| CollaboratorError::Request {
                service: SERVICE,
                message: err.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status {
                service: SERVICE,
                status: status.as_u16(),
                detail: detail.trim().to_string(),
            });
        }
        Ok(response)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, CollaboratorError> {
        self.post(path, body)
            .await?
            .json::<T>()
            .await
            .map_err(|err| CollaboratorError::Decode {
                service: SERVICE,
                message: err.to_string(),
            })
    }
}

#[async_trait]
impl FeatureStore for ModelServiceClient {
    async fn register(
        &self,
        request_id: &str,
        metadata: &VideoMetadata,
        comments: &[VideoComment],
    ) -> Result<(), CollaboratorError> {
        let request = RegisterRequest {
            request_id,
            metadata,
            comments,
        };
        self.post("features", &request).await.map(|_| ())
    }
}

#[async_trait]
impl Predictor for ModelServiceClient {
    async fn predict(&self, request_id: &str) -> Result<Prediction, CollaboratorError> {
        self.post_json("predict", &RequestRef { request_id }).await
    }
}

#[async_trait]
impl Explainer for ModelServiceClient {
    async fn explain(&self, request_id: &str) -> Result<Explanation, CollaboratorError> {
        self.post_json("explain", &RequestRef { request_id }).await
    }
}

#[async_trait]
impl KeywordAnalyzer for ModelServiceClient {
    /// A `204 No Content` or a `null` body means the service has no data for
    /// the topic.
    async fn analyze(&self, topic: &str) -> Result<Option<CanonicalResponse>, CollaboratorError> {
        let response = self.post("trend", &TopicRef { topic }).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        response
            .json::<Option<CanonicalResponse>>()
            .await
            .map_err(|err| CollaboratorError::Decode {
                service: SERVICE,
                message: err.to_string(),
            })
    }
}
