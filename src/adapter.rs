use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::collaborators::{CollaboratorError, Collaborators};
use crate::entropy::EntropySource;
use crate::normalizer::{is_low_risk, sanitize_risk, AnalysisResult, RawAnalysis, STABLE_DRIVER};
use crate::VideoReference;

/// Runs the real-data sequence for one video: metadata, comments, feature
/// registration, prediction, attribution and narration.
pub struct RealDataAdapter {
    collaborators: Collaborators,
    entropy: Arc<dyn EntropySource>,
}

impl RealDataAdapter {
    pub fn new(collaborators: Collaborators, entropy: Arc<dyn EntropySource>) -> Self {
        Self {
            collaborators,
            entropy,
        }
    }

    /// `Ok(None)` when the platform has no metadata for the id, so the caller
    /// can treat the topic as a plain keyword.
    pub async fn resolve(
        &self,
        reference: &VideoReference,
    ) -> Result<Option<AnalysisResult>, CollaboratorError> {
        let video_id = reference.video_id.as_str();
        let c = &self.collaborators;

        let metadata = match c.platform.metadata(video_id).await? {
            Some(metadata) => metadata,
            None => {
                info!(video_id, "no metadata for video id");
                return Ok(None);
            }
        };

        let comments = match c.platform.comments(video_id).await {
            Ok(comments) => comments,
            Err(err) => {
                warn!(video_id, error = %err, "comment fetch failed, continuing without comments");
                Vec::new()
            }
        };

        let request_id = Uuid::new_v4().to_string();
        debug!(
            video_id,
            request_id = request_id.as_str(),
            comments = comments.len(),
            "registering features"
        );
        c.features.register(&request_id, &metadata, &comments).await?;

        let prediction = c.predictor.predict(&request_id).await?;
        let explanation = c.explainer.explain(&request_id).await?;

        let risk = sanitize_risk(prediction.decline_risk);
        let mut primary_driver = explanation.primary_driver.clone();
        if is_low_risk(risk) {
            primary_driver = STABLE_DRIVER.to_string();
        }
        let explanation_text = c.text.generate(&primary_driver, risk).await?;
        let action = c.actions.recommend(&primary_driver).await?;

        info!(
            video_id,
            request_id = request_id.as_str(),
            decline_risk = risk,
            primary_driver = primary_driver.as_str(),
            "real-data analysis complete"
        );

        let raw = RawAnalysis {
            title: metadata.title,
            prediction,
            explanation,
            primary_driver,
            explanation_text,
            action,
        };
        let text = c.text.clone();
        Ok(Some(AnalysisResult::from_real(
            &raw,
            |feature| text.feature_explanation(feature),
            self.entropy.as_ref(),
        )))
    }
}
