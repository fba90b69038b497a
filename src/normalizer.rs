//! Maps raw collaborator output and simulated scenarios into the one response
//! shape every path returns.

use serde::{Deserialize, Serialize};

use crate::collaborators::{Explanation, Prediction};
use crate::entropy::EntropySource;
use crate::simulator::Scenario;
use crate::{
    round2, title_case, DriverBar, FeatureBreakdown, InputType, RawDriver, RiskBucket, Signal,
    TrendPoint,
};

pub const STABLE_DRIVER: &str = "stable_engagement";
pub const STABLE_DRIVER_LABEL: &str = "Stable Engagement";
pub const DEFAULT_TITLE: &str = "YouTube Analysis";

const LOW_RISK_WINDOW: &str = "72 hours";
const LOW_RISK_CONFIDENCE: f64 = 0.89;
const BASE_CONFIDENCE: f64 = 0.85;
const CONFIDENCE_JITTER: f64 = 0.1;
const MUSIC_SUFFIX: &str = "Music Trend";
const MUSIC_SUFFIX_MAX_LEN: usize = 25;
const BREAKDOWN_LEN: usize = 3;
const DRIVER_BAR_LEN: usize = 5;
const SERIES_LEN: i64 = 24;
const GENERIC_FEATURE_NOTE: &str = "Feature impact on trend stability.";

const TITLE_NOISE: [&str; 8] = ["ft.", "feat", "(official", "video", "lyrics", "audio", "|", "["];

const FEATURE_LABELS: [(&str, &str); 6] = [
    ("fatigue_keyword_ratio", "Audience Fatigue"),
    ("engagement_decay_rate", "Engagement Decay"),
    ("format_repetition_score", "Content Saturation"),
    ("trend_age", "Market Maturity"),
    ("engagement_per_view", "Interaction Quality"),
    ("comment_sentiment_score", "Sentiment Shift"),
];

/// Display label for a raw feature name. Unknown names have underscores
/// replaced by spaces and are title-cased.
pub fn feature_label(feature: &str) -> String {
    FEATURE_LABELS
        .iter()
        .find(|(name, _)| *name == feature)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| title_case(&feature.replace('_', " ")))
}

pub fn is_low_risk(risk: f64) -> bool {
    risk < 35.0
}

/// Turns a raw video title into a short trend name.
pub fn clean_title(raw_title: &str, risk: f64) -> String {
    let mut title = raw_title.to_lowercase();
    for noise in TITLE_NOISE {
        if let Some(idx) = title.find(noise) {
            title.truncate(idx);
        }
    }

    if let Some(idx) = title.rfind('-') {
        title = title[idx + 1..].to_string();
    }

    let mut title = title_case(title.trim());
    if is_low_risk(risk)
        && !title.contains(MUSIC_SUFFIX)
        && title.chars().count() < MUSIC_SUFFIX_MAX_LEN
    {
        title = format!("{} {}", title, MUSIC_SUFFIX);
    }
    title
}

pub fn format_time_window(window: &str, risk: f64) -> String {
    if is_low_risk(risk) {
        return LOW_RISK_WINDOW.to_string();
    }
    format!("{} hours", window.trim_end_matches('h'))
}

pub fn confidence(risk: f64, entropy: &dyn EntropySource) -> f64 {
    if is_low_risk(risk) {
        return LOW_RISK_CONFIDENCE;
    }
    BASE_CONFIDENCE + entropy.next_unit() * CONFIDENCE_JITTER
}

/// Sum of the positive contributions across every driver, not just the
/// displayed ones.
pub fn positive_contribution_total(drivers: &[RawDriver]) -> f64 {
    drivers
        .iter()
        .map(|driver| driver.contribution.max(0.0))
        .sum()
}

fn share_of(contribution: f64, total: f64) -> f64 {
    if total > 0.0 {
        contribution / total
    } else {
        0.0
    }
}

/// Top-three drivers as fractions of the positive total, rounded to two
/// decimals. The fractions need not sum to one.
pub fn normalize_breakdown(drivers: &[RawDriver]) -> FeatureBreakdown {
    let total = positive_contribution_total(drivers);
    drivers
        .iter()
        .take(BREAKDOWN_LEN)
        .map(|driver| {
            (
                feature_label(&driver.feature),
                round2(share_of(driver.contribution, total)),
            )
        })
        .collect()
}

pub fn stable_breakdown() -> FeatureBreakdown {
    [
        ("Audience Fatigue", 0.20),
        ("Content Saturation", 0.25),
        ("Engagement Decay", 0.55),
    ]
    .into_iter()
    .collect()
}

pub fn build_signals<F>(drivers: &[RawDriver], primary_driver: &str, describe: F) -> Vec<Signal>
where
    F: Fn(&str) -> Option<String>,
{
    let total = positive_contribution_total(drivers);
    drivers
        .iter()
        .take(BREAKDOWN_LEN)
        .map(|driver| {
            let status = if driver.feature == primary_driver {
                "Critical"
            } else {
                "Warning"
            };
            let note = describe(&driver.feature).unwrap_or_else(|| GENERIC_FEATURE_NOTE.to_string());
            let impact = (share_of(driver.contribution, total) * 100.0) as i64;
            Signal {
                metric: feature_label(&driver.feature),
                status: status.to_string(),
                explanation: format!("{} Impact: {}%", note, impact),
            }
        })
        .collect()
}

/// Values below one are read as fractions and scaled to percent; anything
/// else is taken as a percentage already.
pub fn bar_value(value: f64) -> i64 {
    let scaled = if value < 1.0 { value * 100.0 } else { value };
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(0.0, 100.0) as i64
}

pub fn build_driver_bars(drivers: &[RawDriver]) -> Vec<DriverBar> {
    drivers
        .iter()
        .take(DRIVER_BAR_LEN)
        .map(|driver| DriverBar {
            label: feature_label(&driver.feature),
            value: bar_value(driver.value),
            full_mark: 100,
        })
        .collect()
}

/// Straight-line projection from the predicted risk, oldest point first.
pub fn projected_trend(risk: f64) -> Vec<TrendPoint> {
    (1..=SERIES_LEN)
        .rev()
        .map(|hours_ago| {
            let value = 1000.0 * (1.0 - hours_ago as f64 * risk / 2000.0);
            TrendPoint {
                timestamp: format!("{}h ago", hours_ago),
                value: (value as i64).max(0),
            }
        })
        .collect()
}

/// Clamps a collaborator risk into `[0, 100]`; NaN reads as zero.
pub fn sanitize_risk(risk: f64) -> f64 {
    if risk.is_nan() {
        return 0.0;
    }
    risk.clamp(0.0, 100.0)
}

/// What the real-data adapter gathered for one video.
#[derive(Debug, Clone)]
pub struct RawAnalysis {
    pub title: Option<String>,
    pub prediction: Prediction,
    pub explanation: Explanation,
    /// Raw driver name after the low-risk override has been applied.
    pub primary_driver: String,
    pub explanation_text: String,
    pub action: String,
}

/// The single internal result every path converges on.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub input_type: InputType,
    pub detected_trend: String,
    pub risk_score: u8,
    pub bucket: RiskBucket,
    pub decline_probability: f64,
    pub time_window: String,
    pub primary_driver: String,
    pub feature_breakdown: FeatureBreakdown,
    pub explanation: String,
    pub recommended_action: String,
    pub confidence: f64,
    pub signals: Vec<Signal>,
    pub decline_drivers: Vec<DriverBar>,
    pub actions: Vec<String>,
    pub trend: Vec<TrendPoint>,
}

impl AnalysisResult {
    pub fn from_real<F>(raw: &RawAnalysis, describe: F, entropy: &dyn EntropySource) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let risk = sanitize_risk(raw.prediction.decline_risk);
        let drivers = &raw.explanation.feature_breakdown;
        let low_risk = is_low_risk(risk);

        let (primary_driver, feature_breakdown) = if low_risk {
            (STABLE_DRIVER_LABEL.to_string(), stable_breakdown())
        } else {
            (feature_label(&raw.primary_driver), normalize_breakdown(drivers))
        };

        let title = raw.title.as_deref().unwrap_or(DEFAULT_TITLE);

        Self {
            input_type: InputType::YoutubeUrl,
            detected_trend: clean_title(title, risk),
            risk_score: risk as u8,
            bucket: RiskBucket::from_score(risk),
            decline_probability: risk / 100.0,
            time_window: format_time_window(&raw.prediction.time_window, risk),
            primary_driver,
            feature_breakdown,
            explanation: raw.explanation_text.clone(),
            recommended_action: raw.action.clone(),
            confidence: confidence(risk, entropy),
            signals: build_signals(drivers, &raw.primary_driver, describe),
            decline_drivers: build_driver_bars(drivers),
            actions: vec![
                raw.action.clone(),
                "Review audience segment".to_string(),
                "Audit content format".to_string(),
            ],
            trend: projected_trend(risk),
        }
    }

    pub fn from_scenario(scenario: Scenario) -> Self {
        let recommended_action = scenario.recommended_action().to_string();
        Self {
            input_type: InputType::Keyword,
            detected_trend: scenario.detected_trend,
            risk_score: scenario.risk_score,
            bucket: scenario.bucket,
            decline_probability: scenario.decline_probability,
            time_window: scenario.time_window_label,
            primary_driver: scenario.primary_driver,
            feature_breakdown: scenario.feature_breakdown,
            explanation: scenario.explanation,
            recommended_action,
            confidence: scenario.confidence,
            signals: scenario.signals,
            decline_drivers: scenario.driver_bars,
            actions: scenario.actions,
            trend: scenario.trend,
        }
    }

    /// Legacy nested view consumed by older dashboard components.
    pub fn insight(&self) -> Insight {
        Insight {
            risk_score: self.risk_score,
            decline_risk: self.bucket,
            decline_probability: self.decline_probability,
            predicted_time_to_decline: self.time_window.clone(),
            summary: self.explanation.clone(),
            signals: self.signals.clone(),
            decline_drivers: self.decline_drivers.clone(),
            actions: self.actions.clone(),
        }
    }

    pub fn into_response(self) -> CanonicalResponse {
        let insight = self.insight();
        CanonicalResponse {
            input_type: self.input_type,
            detected_trend: self.detected_trend,
            decline_risk: self.risk_score,
            time_window: self.time_window,
            primary_driver: self.primary_driver,
            feature_breakdown: self.feature_breakdown,
            explanation: self.explanation,
            recommended_action: self.recommended_action,
            confidence: self.confidence,
            insight,
            trend: self.trend,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "riskScore")]
    pub risk_score: u8,
    #[serde(rename = "declineRisk")]
    pub decline_risk: RiskBucket,
    pub decline_probability: f64,
    pub predicted_time_to_decline: String,
    pub summary: String,
    pub signals: Vec<Signal>,
    pub decline_drivers: Vec<DriverBar>,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalResponse {
    pub input_type: InputType,
    pub detected_trend: String,
    pub decline_risk: u8,
    pub time_window: String,
    pub primary_driver: String,
    pub feature_breakdown: FeatureBreakdown,
    pub explanation: String,
    pub recommended_action: String,
    pub confidence: f64,
    pub insight: Insight,
    pub trend: Vec<TrendPoint>,
}

impl CanonicalResponse {
    /// Rejects responses whose risk leaves `[0, 100]` or whose trend is not
    /// 24 non-negative points. Only externally sourced responses can fail.
    pub fn check_bounds(&self) -> Result<(), String> {
        if self.decline_risk > 100 || self.insight.risk_score > 100 {
            return Err(format!(
                "decline risk {} / {} outside 0..=100",
                self.decline_risk, self.insight.risk_score
            ));
        }
        if self.trend.len() != SERIES_LEN as usize {
            return Err(format!("trend has {} points", self.trend.len()));
        }
        if self.trend.iter().any(|point| point.value < 0) {
            return Err("trend contains negative values".to_string());
        }
        Ok(())
    }
}
