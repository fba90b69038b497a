use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{title_case, DriverBar, FeatureBreakdown, RiskBucket, Signal, TrendPoint};

const SERIES_LEN: usize = 24;
const BASE_VALUE: i64 = 1000;

/// A synthetic decline scenario. Built once per keyword request and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub detected_trend: String,
    pub risk_score: u8,
    pub bucket: RiskBucket,
    pub decline_probability: f64,
    pub time_window_label: String,
    pub primary_driver: String,
    pub feature_breakdown: FeatureBreakdown,
    pub explanation: String,
    pub confidence: f64,
    pub signals: Vec<Signal>,
    pub driver_bars: Vec<DriverBar>,
    pub actions: Vec<String>,
    pub trend: Vec<TrendPoint>,
}

impl Scenario {
    pub fn recommended_action(&self) -> &str {
        self.actions.first().map(String::as_str).unwrap_or_default()
    }
}

/// Seed derived from the lowercased topic's length in characters. Topics of
/// equal length share a seed.
pub fn topic_seed(topic: &str) -> u64 {
    topic.to_lowercase().chars().count() as u64
}

/// Builds the scenario for a keyword topic.
///
/// Every draw comes from one generator seeded with [`topic_seed`], in a fixed
/// order: the 24 series points, then velocity drop, fatigue level and the
/// risk jitter. Repeated calls with topics of the same length return the same
/// numbers.
pub fn simulate(topic: &str) -> Scenario {
    let topic = topic.to_lowercase();
    let seed = topic_seed(&topic);
    let mut rng = StdRng::seed_from_u64(seed);

    let trend = generate_trend(&mut rng, seed);

    let velocity_drop: i64 = rng.gen_range(15..=45);
    let fatigue_level: i64 = rng.gen_range(60..=90);

    let detected_trend = title_case(&topic);
    match seed % 3 {
        0 => high_risk(&mut rng, detected_trend, trend, velocity_drop, fatigue_level),
        1 => medium_risk(&mut rng, detected_trend, trend),
        _ => low_risk(&mut rng, &topic, detected_trend, trend),
    }
}

fn generate_trend(rng: &mut StdRng, seed: u64) -> Vec<TrendPoint> {
    let mut history = Vec::with_capacity(SERIES_LEN);
    for idx in 0..SERIES_LEN {
        let noise: i64 = rng.gen_range(-50..=50);
        let decay_factor: i64 = if seed % 2 == 0 {
            rng.gen_range(30..=50)
        } else {
            rng.gen_range(-15..=-5)
        };
        let decay = idx as i64 * decay_factor;
        history.push(TrendPoint {
            timestamp: format!("{}h ago", idx),
            value: (BASE_VALUE - decay + noise).max(0),
        });
    }
    // Oldest point first.
    history.reverse();
    history
}

fn high_risk(
    rng: &mut StdRng,
    detected_trend: String,
    trend: Vec<TrendPoint>,
    velocity_drop: i64,
    fatigue_level: i64,
) -> Scenario {
    let risk_score = 80 + rng.gen_range(0..=15u8);
    Scenario {
        detected_trend,
        risk_score,
        bucket: RiskBucket::High,
        decline_probability: 0.85,
        time_window_label: "< 24 Hours".to_string(),
        primary_driver: "Audience Fatigue".to_string(),
        feature_breakdown: [
            ("Audience Fatigue", 0.65),
            ("Content Saturation", 0.25),
            ("Engagement Decay", 0.10),
        ]
        .into_iter()
        .collect(),
        explanation: format!(
            "Decline risk is HIGH. Engagement velocity has plummeted by -{}% (Simulated).",
            velocity_drop
        ),
        confidence: 0.92,
        signals: vec![
            Signal::new(
                "Engagement Velocity",
                "Critical",
                format!("Dropped by {}% in 24h.", velocity_drop),
            ),
            Signal::new(
                "Audience Fatigue",
                "Warning",
                format!("Fatigue level at {}% (High).", fatigue_level),
            ),
        ],
        driver_bars: vec![
            DriverBar::new("Saturation", 90),
            DriverBar::new("Fatigue", fatigue_level),
            DriverBar::new("Sentiment", 30),
            DriverBar::new("Algo Shift", 60),
            DriverBar::new("Disengage", 95),
        ],
        actions: strings(&["Stop ad spend immediately", "Pivot content strategy", "Exit trend"]),
        trend,
    }
}

fn medium_risk(rng: &mut StdRng, detected_trend: String, trend: Vec<TrendPoint>) -> Scenario {
    let risk_score = 40 + rng.gen_range(0..=20u8);
    Scenario {
        detected_trend,
        risk_score,
        bucket: RiskBucket::Medium,
        decline_probability: 0.45,
        time_window_label: "3-7 Days".to_string(),
        primary_driver: "Content Saturation".to_string(),
        feature_breakdown: [
            ("Content Saturation", 0.50),
            ("Audience Fatigue", 0.30),
            ("Engagement Decay", 0.20),
        ]
        .into_iter()
        .collect(),
        explanation: "Decline risk is MEDIUM. Engagement is flat (0% growth).".to_string(),
        confidence: 0.78,
        signals: vec![
            Signal::new("Engagement Velocity", "Warning", "Stagnant (0-2% growth)."),
            Signal::new("Audience Fatigue", "Fair", "Moderate fatigue detected."),
        ],
        driver_bars: vec![
            DriverBar::new("Saturation", 60),
            DriverBar::new("Fatigue", 45),
            DriverBar::new("Sentiment", 50),
            DriverBar::new("Algo Shift", 40),
            DriverBar::new("Disengage", 30),
        ],
        actions: strings(&["Refresh creatives", "Run contest", "A/B test new angles"]),
        trend,
    }
}

fn low_risk(
    rng: &mut StdRng,
    topic: &str,
    detected_trend: String,
    trend: Vec<TrendPoint>,
) -> Scenario {
    let risk_score = 10 + rng.gen_range(0..=20u8);
    Scenario {
        detected_trend,
        risk_score,
        bucket: RiskBucket::Low,
        decline_probability: 0.10,
        time_window_label: "Stable (> 30 Days)".to_string(),
        primary_driver: "Organic Growth".to_string(),
        feature_breakdown: [
            ("Organic Growth", 0.70),
            ("Sentiment Polarity", 0.20),
            ("Viral Index", 0.10),
        ]
        .into_iter()
        .collect(),
        explanation: format!(
            "Decline risk is LOW. '{}' is showing healthy organic growth (Simulated).",
            topic
        ),
        confidence: 0.85,
        signals: vec![
            Signal::new("Engagement Drop", "Normal", "Growth is steady."),
            Signal::new("Audience Fatigue", "Normal", "Sentiment is positive."),
        ],
        driver_bars: vec![
            DriverBar::new("Saturation", 20),
            DriverBar::new("Fatigue", 15),
            DriverBar::new("Sentiment", 90),
            DriverBar::new("Algo Shift", 10),
            DriverBar::new("Disengage", 5),
        ],
        actions: strings(&["Scale up content", "Engage with influencers", "Ride the wave"]),
        trend,
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
