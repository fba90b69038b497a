use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::adapter::RealDataAdapter;
use crate::classifier::classify;
use crate::collaborators::{Collaborators, KeywordAnalyzer};
use crate::config::{AnalyzerConfig, NarrationMode};
use crate::entropy::{EntropySource, ThreadEntropy};
use crate::model_service::ModelServiceClient;
use crate::narration::LlmNarrator;
use crate::normalizer::{AnalysisResult, CanonicalResponse};
use crate::simulator::simulate;
use crate::youtube::YoutubeClient;
use crate::TopicRequest;

/// Routes a topic through real data, keyword analysis or simulation and
/// returns exactly one of their results. Holds no per-request state.
pub struct TrendAnalyzer {
    adapter: RealDataAdapter,
    keyword: Arc<dyn KeywordAnalyzer>,
    simulation_delay: Duration,
}

impl TrendAnalyzer {
    pub fn new(
        collaborators: Collaborators,
        entropy: Arc<dyn EntropySource>,
        simulation_delay: Duration,
    ) -> Self {
        let keyword = collaborators.keyword.clone();
        Self {
            adapter: RealDataAdapter::new(collaborators, entropy),
            keyword,
            simulation_delay,
        }
    }

    /// Wires the HTTP collaborators described by `config`. Anything without
    /// credentials or an endpoint is left unconfigured and falls through to
    /// simulation at request time.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, String> {
        let mut collaborators = Collaborators::offline();
        match YoutubeClient::from_env(&config.youtube)? {
            Some(client) => collaborators.platform = Arc::new(client),
            None => warn!("YOUTUBE_API_KEY is not set; video links will be simulated"),
        }

        if config.model_service.enabled {
            let model = Arc::new(ModelServiceClient::from_config(config)?);
            collaborators.features = model.clone();
            collaborators.predictor = model.clone();
            collaborators.explainer = model.clone();
            collaborators.keyword = model;
        }

        if config.narration.to_mode() == NarrationMode::Llm {
            match LlmNarrator::from_env() {
                Some(narrator) => {
                    let narrator = Arc::new(narrator);
                    collaborators.text = narrator.clone();
                    collaborators.actions = narrator;
                }
                None => warn!("NARRATOR_API_KEY is not set; using template narration"),
            }
        }

        Ok(Self::new(
            collaborators,
            Arc::new(ThreadEntropy),
            config.simulation.delay(),
        ))
    }

    /// Never fails: simulation is the terminal fallback for every input.
    pub async fn analyze(&self, request: &TopicRequest) -> CanonicalResponse {
        let topic = request.topic.as_str();

        if let Some(reference) = classify(topic) {
            match self.adapter.resolve(&reference).await {
                Ok(Some(result)) => return result.into_response(),
                Ok(None) => info!(
                    video_id = reference.video_id.as_str(),
                    "video not found, treating topic as keyword"
                ),
                Err(err) => warn!(
                    video_id = reference.video_id.as_str(),
                    error = %err,
                    "real-data analysis failed, falling back"
                ),
            }
        }

        match self.keyword.analyze(topic).await {
            Ok(Some(response)) => match response.check_bounds() {
                Ok(()) => return response,
                Err(reason) => warn!(
                    reason = reason.as_str(),
                    "keyword analysis returned an out-of-range response, falling back to simulation"
                ),
            },
            Ok(None) => {}
            Err(err) => warn!(error = %err, "keyword analysis failed, falling back to simulation"),
        }

        if !self.simulation_delay.is_zero() {
            tokio::time::sleep(self.simulation_delay).await;
        }
        info!(time_window = request.time_window.as_str(), "serving simulated analysis");
        simulated_response(topic)
    }
}

pub fn simulated_response(topic: &str) -> CanonicalResponse {
    AnalysisResult::from_scenario(simulate(topic)).into_response()
}
