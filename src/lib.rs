pub mod adapter;
pub mod classifier;
pub mod collaborators;
pub mod config;
pub mod entropy;
pub mod model_service;
pub mod narration;
pub mod normalizer;
pub mod pipeline;
pub mod server;
pub mod simulator;
pub mod youtube;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub use classifier::{classify, VideoReference};
pub use normalizer::{AnalysisResult, CanonicalResponse, Insight};
pub use pipeline::TrendAnalyzer;
pub use simulator::{simulate, Scenario};

pub const DEFAULT_TIME_WINDOW: &str = "48h";

/// One analysis request. `time_window` is advisory and never changes routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRequest {
    pub topic: String,
    pub time_window: String,
}

impl TopicRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            time_window: DEFAULT_TIME_WINDOW.to_string(),
        }
    }

    pub fn with_time_window(mut self, time_window: impl Into<String>) -> Self {
        self.time_window = time_window.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputType {
    #[serde(rename = "keyword")]
    Keyword,
    #[serde(rename = "youtube_url")]
    YoutubeUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBucket {
    Low,
    Medium,
    High,
}

impl RiskBucket {
    pub fn from_score(score: f64) -> Self {
        if score < 35.0 {
            RiskBucket::Low
        } else if score > 75.0 {
            RiskBucket::High
        } else {
            RiskBucket::Medium
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskBucket::Low => "Low",
            RiskBucket::Medium => "Medium",
            RiskBucket::High => "High",
        }
    }
}

/// A named signal returned by the explanation collaborator.
///
/// `value` is either a fraction in `[0, 1)` or an absolute figure; consumers
/// tell the two apart with a `< 1` check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDriver {
    pub feature: String,
    pub contribution: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub timestamp: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub metric: String,
    pub status: String,
    pub explanation: String,
}

impl Signal {
    pub fn new(metric: &str, status: &str, explanation: impl Into<String>) -> Self {
        Self {
            metric: metric.to_string(),
            status: status.to_string(),
            explanation: explanation.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverBar {
    pub label: String,
    pub value: i64,
    #[serde(rename = "fullMark")]
    pub full_mark: i64,
}

impl DriverBar {
    pub fn new(label: &str, value: i64) -> Self {
        Self {
            label: label.to_string(),
            value,
            full_mark: 100,
        }
    }
}

/// Label to fraction attribution, kept in insertion order on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureBreakdown(Vec<(String, f64)>);

impl FeatureBreakdown {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Later inserts under an existing label overwrite its value in place.
    pub fn insert(&mut self, label: impl Into<String>, fraction: f64) {
        let label = label.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == label) {
            Some(entry) => entry.1 = fraction,
            None => self.0.push((label, fraction)),
        }
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, fraction)| *fraction)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(label, fraction)| (label.as_str(), *fraction))
    }

    pub fn total(&self) -> f64 {
        self.0.iter().map(|(_, fraction)| fraction).sum()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for FeatureBreakdown {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut breakdown = FeatureBreakdown::new();
        for (label, fraction) in iter {
            breakdown.insert(label, fraction);
        }
        breakdown
    }
}

impl Serialize for FeatureBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, fraction) in self.iter() {
            map.serialize_entry(label, &fraction)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FeatureBreakdown {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BreakdownVisitor;

        impl<'de> Visitor<'de> for BreakdownVisitor {
            type Value = FeatureBreakdown;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of label to fraction")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut breakdown = FeatureBreakdown::new();
                while let Some((label, fraction)) = access.next_entry::<String, f64>()? {
                    breakdown.insert(label, fraction);
                }
                Ok(breakdown)
            }
        }

        deserializer.deserialize_map(BreakdownVisitor)
    }
}

/// Capitalises the first cased character of every word and lowercases the
/// rest. Any character without case ends a word, so `"rock'n roll"` becomes
/// `"Rock'N Roll"` and `"中a"` becomes `"中A"`.
pub fn title_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut previous_cased = false;
    for ch in value.chars() {
        if ch.is_lowercase() || ch.is_uppercase() {
            if previous_cased {
                result.extend(ch.to_lowercase());
            } else {
                result.extend(ch.to_uppercase());
            }
            previous_cased = true;
        } else {
            result.push(ch);
            previous_cased = false;
        }
    }
    result
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
