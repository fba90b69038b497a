//! Ports for everything the pipeline calls but does not own.
//!
//! Each port is an async trait shared as `Arc<dyn ...>` so the orchestrator
//! can be wired with HTTP clients in production and stubs in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::normalizer::CanonicalResponse;
use crate::RawDriver;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{service} request failed: {message}")]
    Request { service: &'static str, message: String },
    #[error("{service} error: {status} {detail}")]
    Status {
        service: &'static str,
        status: u16,
        detail: String,
    },
    #[error("{service} response parse failed: {message}")]
    Decode { service: &'static str, message: String },
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("{0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: Option<String>,
    pub channel_title: Option<String>,
    pub published_at: Option<String>,
    pub tags: Vec<String>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoComment {
    pub author: String,
    pub text: String,
    pub like_count: u64,
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "declineRisk")]
    pub decline_risk: f64,
    #[serde(rename = "timeWindow")]
    pub time_window: String,
}

/// Attribution for one prediction. `feature_breakdown` arrives sorted by
/// descending absolute contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    #[serde(rename = "primaryDriver")]
    pub primary_driver: String,
    #[serde(rename = "featureBreakdown")]
    pub feature_breakdown: Vec<RawDriver>,
}

#[async_trait]
pub trait VideoPlatform: Send + Sync {
    /// `Ok(None)` means the platform knows no such video.
    async fn metadata(&self, video_id: &str) -> Result<Option<VideoMetadata>, CollaboratorError>;
    async fn comments(&self, video_id: &str) -> Result<Vec<VideoComment>, CollaboratorError>;
}

#[async_trait]
pub trait FeatureStore: Send + Sync {
    /// Idempotent per `request_id`.
    async fn register(
        &self,
        request_id: &str,
        metadata: &VideoMetadata,
        comments: &[VideoComment],
    ) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, request_id: &str) -> Result<Prediction, CollaboratorError>;
}

#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(&self, request_id: &str) -> Result<Explanation, CollaboratorError>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, driver: &str, risk: f64) -> Result<String, CollaboratorError>;

    /// Short description of a raw feature, used in signal rows.
    fn feature_explanation(&self, feature: &str) -> Option<String>;
}

#[async_trait]
pub trait ActionRecommender: Send + Sync {
    async fn recommend(&self, driver: &str) -> Result<String, CollaboratorError>;
}

#[async_trait]
pub trait KeywordAnalyzer: Send + Sync {
    async fn analyze(&self, topic: &str) -> Result<Option<CanonicalResponse>, CollaboratorError>;
}

/// The full set of collaborators a [`crate::TrendAnalyzer`] talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub platform: Arc<dyn VideoPlatform>,
    pub features: Arc<dyn FeatureStore>,
    pub predictor: Arc<dyn Predictor>,
    pub explainer: Arc<dyn Explainer>,
    pub text: Arc<dyn TextGenerator>,
    pub actions: Arc<dyn ActionRecommender>,
    pub keyword: Arc<dyn KeywordAnalyzer>,
}

impl Collaborators {
    /// Every collaborator reports itself unconfigured, so every request ends in
    /// simulation.
    pub fn offline() -> Self {
        let narrator = Arc::new(crate::narration::TemplateNarrator);
        Self {
            platform: Arc::new(Unconfigured("video platform")),
            features: Arc::new(Unconfigured("model service")),
            predictor: Arc::new(Unconfigured("model service")),
            explainer: Arc::new(Unconfigured("model service")),
            text: narrator.clone(),
            actions: narrator,
            keyword: Arc::new(NoKeywordAnalysis),
        }
    }
}

/// Stand-in for a collaborator whose credentials or endpoint are missing.
#[derive(Debug, Clone, Copy)]
pub struct Unconfigured(pub &'static str);

#[async_trait]
impl VideoPlatform for Unconfigured {
    async fn metadata(&self, _video_id: &str) -> Result<Option<VideoMetadata>, CollaboratorError> {
        Err(CollaboratorError::NotConfigured(self.0))
    }

    async fn comments(&self, _video_id: &str) -> Result<Vec<VideoComment>, CollaboratorError> {
        Err(CollaboratorError::NotConfigured(self.0))
    }
}

#[async_trait]
impl FeatureStore for Unconfigured {
    async fn register(
        &self,
        _request_id: &str,
        _metadata: &VideoMetadata,
        _comments: &[VideoComment],
    ) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::NotConfigured(self.0))
    }
}

#[async_trait]
impl Predictor for Unconfigured {
    async fn predict(&self, _request_id: &str) -> Result<Prediction, CollaboratorError> {
        Err(CollaboratorError::NotConfigured(self.0))
    }
}

#[async_trait]
impl Explainer for Unconfigured {
    async fn explain(&self, _request_id: &str) -> Result<Explanation, CollaboratorError> {
        Err(CollaboratorError::NotConfigured(self.0))
    }
}

/// Keyword analysis that never has an answer.
#[derive(Debug, Clone, Copy)]
pub struct NoKeywordAnalysis;

#[async_trait]
impl KeywordAnalyzer for NoKeywordAnalysis {
    async fn analyze(&self, _topic: &str) -> Result<Option<CanonicalResponse>, CollaboratorError> {
        Ok(None)
    }
}
