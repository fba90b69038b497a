use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use trend_decline::collaborators::{
    CollaboratorError, Collaborators, Explainer, Explanation, FeatureStore, KeywordAnalyzer,
    Prediction, Predictor, VideoComment, VideoMetadata, VideoPlatform,
};
use trend_decline::entropy::FixedEntropy;
use trend_decline::normalizer::stable_breakdown;
use trend_decline::pipeline::simulated_response;
use trend_decline::{CanonicalResponse, InputType, RawDriver, TopicRequest, TrendAnalyzer};

const VIDEO_TOPIC: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

struct StubPlatform {
    title: Option<String>,
    found: bool,
    comments_fail: bool,
    metadata_calls: AtomicUsize,
}

impl StubPlatform {
    fn with_title(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            found: true,
            comments_fail: false,
            metadata_calls: AtomicUsize::new(0),
        }
    }

    fn missing() -> Self {
        Self {
            title: None,
            found: false,
            comments_fail: false,
            metadata_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VideoPlatform for StubPlatform {
    async fn metadata(&self, video_id: &str) -> Result<Option<VideoMetadata>, CollaboratorError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if !self.found {
            return Ok(None);
        }
        Ok(Some(VideoMetadata {
            video_id: video_id.to_string(),
            title: self.title.clone(),
            ..VideoMetadata::default()
        }))
    }

    async fn comments(&self, _video_id: &str) -> Result<Vec<VideoComment>, CollaboratorError> {
        if self.comments_fail {
            return Err(CollaboratorError::Unavailable("comments disabled".to_string()));
        }
        Ok(vec![VideoComment {
            author: "fan".to_string(),
            text: "still listening".to_string(),
            like_count: 3,
            published_at: None,
        }])
    }
}

struct StubModel {
    decline_risk: f64,
    fail_predict: bool,
    seen_ids: Mutex<Vec<String>>,
}

impl StubModel {
    fn with_risk(decline_risk: f64) -> Self {
        Self {
            decline_risk,
            fail_predict: false,
            seen_ids: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, request_id: &str) {
        self.seen_ids.lock().unwrap().push(request_id.to_string());
    }
}

#[async_trait]
impl FeatureStore for StubModel {
    async fn register(
        &self,
        request_id: &str,
        _metadata: &VideoMetadata,
        comments: &[VideoComment],
    ) -> Result<(), CollaboratorError> {
        assert!(comments.len() <= 1);
        self.record(request_id);
        Ok(())
    }
}

#[async_trait]
impl Predictor for StubModel {
    async fn predict(&self, request_id: &str) -> Result<Prediction, CollaboratorError> {
        self.record(request_id);
        if self.fail_predict {
            return Err(CollaboratorError::Status {
                service: "model service",
                status: 500,
                detail: "boom".to_string(),
            });
        }
        Ok(Prediction {
            decline_risk: self.decline_risk,
            time_window: "36h".to_string(),
        })
    }
}

#[async_trait]
impl Explainer for StubModel {
    async fn explain(&self, request_id: &str) -> Result<Explanation, CollaboratorError> {
        self.record(request_id);
        Ok(Explanation {
            primary_driver: "engagement_decay_rate".to_string(),
            feature_breakdown: vec![
                driver("engagement_decay_rate", 0.6, 0.7),
                driver("fatigue_keyword_ratio", 0.3, 0.35),
                driver("trend_age", 0.1, 45.0),
                driver("engagement_per_view", -0.05, 0.02),
            ],
        })
    }
}

enum KeywordBehaviour {
    Nothing,
    Fail,
    Answer(CanonicalResponse),
}

struct StubKeyword {
    behaviour: KeywordBehaviour,
    calls: AtomicUsize,
}

impl StubKeyword {
    fn new(behaviour: KeywordBehaviour) -> Self {
        Self {
            behaviour,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl KeywordAnalyzer for StubKeyword {
    async fn analyze(&self, _topic: &str) -> Result<Option<CanonicalResponse>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            KeywordBehaviour::Nothing => Ok(None),
            KeywordBehaviour::Fail => Err(CollaboratorError::Unavailable("offline".to_string())),
            KeywordBehaviour::Answer(response) => Ok(Some(response.clone())),
        }
    }
}

fn driver(feature: &str, contribution: f64, value: f64) -> RawDriver {
    RawDriver {
        feature: feature.to_string(),
        contribution,
        value,
    }
}

fn analyzer(
    platform: Arc<StubPlatform>,
    model: Arc<StubModel>,
    keyword: Arc<StubKeyword>,
    jitter: f64,
) -> TrendAnalyzer {
    let mut collaborators = Collaborators::offline();
    collaborators.platform = platform;
    collaborators.features = model.clone();
    collaborators.predictor = model.clone();
    collaborators.explainer = model;
    collaborators.keyword = keyword;
    TrendAnalyzer::new(collaborators, Arc::new(FixedEntropy(jitter)), Duration::ZERO)
}

fn offline_analyzer() -> TrendAnalyzer {
    TrendAnalyzer::new(
        Collaborators::offline(),
        Arc::new(FixedEntropy(0.5)),
        Duration::ZERO,
    )
}

#[tokio::test]
async fn short_keyword_serves_low_risk_simulation() {
    let response = offline_analyzer().analyze(&TopicRequest::new("ab")).await;
    assert_eq!(response.input_type, InputType::Keyword);
    assert_eq!(response.primary_driver, "Organic Growth");
    assert_eq!(response.time_window, "Stable (> 30 Days)");
    assert_eq!(response.detected_trend, "Ab");
    assert_eq!(response.trend.len(), 24);
    assert_eq!(response.feature_breakdown.get("Organic Growth"), Some(0.70));
}

#[tokio::test]
async fn keyword_lengths_select_scenarios() {
    let analyzer = offline_analyzer();

    let high = analyzer.analyze(&TopicRequest::new("abc")).await;
    assert_eq!(high.primary_driver, "Audience Fatigue");
    assert_eq!(high.time_window, "< 24 Hours");
    assert!((80..=95).contains(&high.decline_risk));
    assert_eq!(high.insight.decline_risk.label(), "High");

    let medium = analyzer.analyze(&TopicRequest::new("abcd")).await;
    assert_eq!(medium.primary_driver, "Content Saturation");
    assert_eq!(medium.time_window, "3-7 Days");
    assert!((40..=60).contains(&medium.decline_risk));
}

#[tokio::test]
async fn empty_topic_is_simulated() {
    let response = offline_analyzer().analyze(&TopicRequest::new("")).await;
    assert_eq!(response.input_type, InputType::Keyword);
    assert_eq!(response.detected_trend, "");
    assert_eq!(response.trend.len(), 24);
}

#[tokio::test]
async fn video_link_routes_to_real_data() {
    let platform = Arc::new(StubPlatform::with_title(
        "Rick Astley - Never Gonna Give You Up (Official Music Video)",
    ));
    let model = Arc::new(StubModel::with_risk(64.2));
    let keyword = Arc::new(StubKeyword::new(KeywordBehaviour::Nothing));
    let analyzer = analyzer(platform.clone(), model.clone(), keyword.clone(), 0.5);

    let response = analyzer.analyze(&TopicRequest::new(VIDEO_TOPIC)).await;

    assert_eq!(response.input_type, InputType::YoutubeUrl);
    assert_eq!(response.detected_trend, "Never Gonna Give You Up");
    assert_eq!(response.decline_risk, 64);
    assert_eq!(response.time_window, "36 hours");
    assert_eq!(response.primary_driver, "Engagement Decay");
    assert_eq!(response.feature_breakdown.get("Engagement Decay"), Some(0.6));
    assert_eq!(response.feature_breakdown.get("Audience Fatigue"), Some(0.3));
    assert_eq!(response.feature_breakdown.get("Market Maturity"), Some(0.1));
    assert!((response.confidence - 0.9).abs() < 1e-9);
    assert_eq!(response.insight.signals[0].status, "Critical");
    assert_eq!(response.insight.decline_drivers.len(), 4);
    assert_eq!(response.insight.decline_drivers[2].value, 45);
    assert_eq!(response.insight.actions[1], "Review audience segment");
    assert_eq!(response.trend.len(), 24);

    assert_eq!(platform.metadata_calls.load(Ordering::SeqCst), 1);
    assert_eq!(keyword.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn every_model_call_shares_one_request_id() {
    let platform = Arc::new(StubPlatform::with_title("Song"));
    let model = Arc::new(StubModel::with_risk(50.0));
    let keyword = Arc::new(StubKeyword::new(KeywordBehaviour::Nothing));
    let analyzer = analyzer(platform, model.clone(), keyword, 0.5);

    analyzer.analyze(&TopicRequest::new(VIDEO_TOPIC)).await;
    analyzer.analyze(&TopicRequest::new(VIDEO_TOPIC)).await;

    let ids = model.seen_ids.lock().unwrap().clone();
    assert_eq!(ids.len(), 6);
    assert!(ids[..3].iter().all(|id| *id == ids[0]));
    assert!(ids[3..].iter().all(|id| *id == ids[3]));
    assert_ne!(ids[0], ids[3]);
}

#[tokio::test]
async fn low_risk_video_uses_stable_override() {
    let platform = Arc::new(StubPlatform::with_title(
        "Luis Fonsi - Despacito ft. Daddy Yankee",
    ));
    let model = Arc::new(StubModel::with_risk(20.0));
    let keyword = Arc::new(StubKeyword::new(KeywordBehaviour::Nothing));
    let analyzer = analyzer(platform, model, keyword, 0.99);

    let response = analyzer.analyze(&TopicRequest::new(VIDEO_TOPIC)).await;

    assert_eq!(response.primary_driver, "Stable Engagement");
    assert_eq!(response.feature_breakdown, stable_breakdown());
    assert_eq!(response.feature_breakdown.get("Engagement Decay"), Some(0.55));
    assert_eq!(response.time_window, "72 hours");
    assert_eq!(response.confidence, 0.89);
    assert_eq!(response.detected_trend, "Despacito Music Trend");
    assert_eq!(response.recommended_action, "Maintain current strategy");
    assert!(response.explanation.starts_with("Decline risk is LOW"));
    assert!(response
        .insight
        .signals
        .iter()
        .all(|signal| signal.status == "Warning"));
}

#[tokio::test]
async fn failed_comment_fetch_still_resolves() {
    let mut platform = StubPlatform::with_title("Song");
    platform.comments_fail = true;
    let analyzer = analyzer(
        Arc::new(platform),
        Arc::new(StubModel::with_risk(80.0)),
        Arc::new(StubKeyword::new(KeywordBehaviour::Nothing)),
        0.5,
    );

    let response = analyzer.analyze(&TopicRequest::new(VIDEO_TOPIC)).await;
    assert_eq!(response.input_type, InputType::YoutubeUrl);
    assert_eq!(response.insight.decline_risk.label(), "High");
}

#[tokio::test]
async fn unknown_video_falls_through_to_keyword_path() {
    let keyword = Arc::new(StubKeyword::new(KeywordBehaviour::Nothing));
    let analyzer = analyzer(
        Arc::new(StubPlatform::missing()),
        Arc::new(StubModel::with_risk(80.0)),
        keyword.clone(),
        0.5,
    );

    let response = analyzer.analyze(&TopicRequest::new(VIDEO_TOPIC)).await;

    assert_eq!(response.input_type, InputType::Keyword);
    assert_eq!(keyword.calls.load(Ordering::SeqCst), 1);
    assert_eq!(response, simulated_response(VIDEO_TOPIC));
}

#[tokio::test]
async fn model_failure_degrades_to_simulation() {
    let model = StubModel {
        decline_risk: 80.0,
        fail_predict: true,
        seen_ids: Mutex::new(Vec::new()),
    };
    let analyzer = analyzer(
        Arc::new(StubPlatform::with_title("Song")),
        Arc::new(model),
        Arc::new(StubKeyword::new(KeywordBehaviour::Nothing)),
        0.5,
    );

    let response = analyzer.analyze(&TopicRequest::new(VIDEO_TOPIC)).await;
    assert_eq!(response.input_type, InputType::Keyword);
    assert_eq!(response.trend.len(), 24);
}

#[tokio::test]
async fn keyword_analysis_answer_bypasses_simulation() {
    let mut canned = simulated_response("abc");
    canned.detected_trend = "From Keyword Service".to_string();
    let analyzer = analyzer(
        Arc::new(StubPlatform::missing()),
        Arc::new(StubModel::with_risk(50.0)),
        Arc::new(StubKeyword::new(KeywordBehaviour::Answer(canned.clone()))),
        0.5,
    );

    let response = analyzer.analyze(&TopicRequest::new("ab")).await;
    assert_eq!(response, canned);
}

#[tokio::test]
async fn out_of_range_keyword_answer_falls_back_to_simulation() {
    let mut risky = simulated_response("abc");
    risky.decline_risk = 250;
    risky.trend.clear();

    let mut short = simulated_response("abc");
    short.trend.truncate(23);

    for canned in [risky, short] {
        let keyword = Arc::new(StubKeyword::new(KeywordBehaviour::Answer(canned)));
        let analyzer = analyzer(
            Arc::new(StubPlatform::missing()),
            Arc::new(StubModel::with_risk(50.0)),
            keyword.clone(),
            0.5,
        );

        let response = analyzer.analyze(&TopicRequest::new("ab")).await;
        assert_eq!(keyword.calls.load(Ordering::SeqCst), 1);
        assert_eq!(response, simulated_response("ab"));
        assert!(response.decline_risk <= 100);
        assert_eq!(response.trend.len(), 24);
    }
}

#[tokio::test]
async fn keyword_analysis_failure_is_swallowed() {
    let keyword = Arc::new(StubKeyword::new(KeywordBehaviour::Fail));
    let analyzer = analyzer(
        Arc::new(StubPlatform::missing()),
        Arc::new(StubModel::with_risk(50.0)),
        keyword.clone(),
        0.5,
    );

    let response = analyzer.analyze(&TopicRequest::new("ab")).await;
    assert_eq!(response.primary_driver, "Organic Growth");
    assert_eq!(keyword.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unconfigured_platform_simulates_video_links() {
    let response = offline_analyzer()
        .analyze(&TopicRequest::new("watch?v=dQw4w9WgXcQ"))
        .await;
    assert_eq!(response.input_type, InputType::Keyword);
    assert_eq!(response.detected_trend, "Watch?V=Dqw4W9Wgxcq");
}

#[tokio::test]
async fn concurrent_simulations_do_not_interfere() {
    let analyzer = Arc::new(offline_analyzer());
    let expected = simulated_response("abcdef");

    let mut handles = Vec::new();
    for topic in ["abcdef", "ghijkl", "mnopqr", "stuvwx", "yzabcd", "efghij"] {
        let analyzer = analyzer.clone();
        handles.push(tokio::spawn(async move {
            analyzer.analyze(&TopicRequest::new(topic)).await
        }));
    }

    for handle in handles {
        let response = handle.await.unwrap();
        assert_eq!(response.trend, expected.trend);
        assert_eq!(response.decline_risk, expected.decline_risk);
    }
}

#[tokio::test(start_paused = true)]
async fn simulation_delay_suspends_without_blocking() {
    let analyzer = TrendAnalyzer::new(
        Collaborators::offline(),
        Arc::new(FixedEntropy(0.5)),
        Duration::from_millis(1500),
    );
    let started = tokio::time::Instant::now();
    let response = analyzer.analyze(&TopicRequest::new("ab")).await;
    assert!(started.elapsed() >= Duration::from_millis(1500));
    assert_eq!(response.primary_driver, "Organic Growth");
}
