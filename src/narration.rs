use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

use crate::collaborators::{ActionRecommender, CollaboratorError, TextGenerator};
use crate::normalizer::{feature_label, STABLE_DRIVER};
use crate::RiskBucket;

const FEATURE_NOTES: [(&str, &str); 7] = [
    (
        "fatigue_keyword_ratio",
        "Comments increasingly mention boredom or overexposure.",
    ),
    (
        "engagement_decay_rate",
        "Likes and comments per hour are falling off.",
    ),
    (
        "format_repetition_score",
        "The format is being copied widely and losing novelty.",
    ),
    ("trend_age", "The trend has been circulating for a long time."),
    (
        "engagement_per_view",
        "Fewer viewers interact after watching.",
    ),
    (
        "comment_sentiment_score",
        "Comment sentiment is drifting negative.",
    ),
    (
        STABLE_DRIVER,
        "Engagement is holding steady with no sign of fatigue.",
    ),
];

const DRIVER_ACTIONS: [(&str, &str); 7] = [
    ("fatigue_keyword_ratio", "Rotate in fresh creative angles"),
    ("engagement_decay_rate", "Re-engage the audience with a call to action"),
    ("format_repetition_score", "Differentiate the content format"),
    ("trend_age", "Plan the successor campaign now"),
    ("engagement_per_view", "Tighten hooks in the first seconds"),
    ("comment_sentiment_score", "Address audience concerns directly"),
    (STABLE_DRIVER, "Maintain current strategy"),
];

const DEFAULT_ACTION: &str = "Monitor engagement closely";

fn lookup(table: &[(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, text)| *text)
}

fn risk_level(risk: f64) -> String {
    RiskBucket::from_score(risk).label().to_uppercase()
}

/// Fixed-phrase narrator that needs no network access.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

impl TemplateNarrator {
    pub fn narrate(&self, driver: &str, risk: f64) -> String {
        let note = lookup(&FEATURE_NOTES, driver)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} is the main factor.", feature_label(driver)));
        format!(
            "Decline risk is {} ({}%). {}",
            risk_level(risk),
            risk.round() as i64,
            note
        )
    }
}

#[async_trait]
impl TextGenerator for TemplateNarrator {
    async fn generate(&self, driver: &str, risk: f64) -> Result<String, CollaboratorError> {
        Ok(self.narrate(driver, risk))
    }

    fn feature_explanation(&self, feature: &str) -> Option<String> {
        lookup(&FEATURE_NOTES, feature).map(str::to_string)
    }
}

#[async_trait]
impl ActionRecommender for TemplateNarrator {
    async fn recommend(&self, driver: &str) -> Result<String, CollaboratorError> {
        Ok(lookup(&DRIVER_ACTIONS, driver)
            .unwrap_or(DEFAULT_ACTION)
            .to_string())
    }
}

/// Writes explanations through an OpenAI-compatible chat endpoint. Falls back
/// to [`TemplateNarrator`] when the call fails.
#[derive(Clone)]
pub struct LlmNarrator {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    fallback: TemplateNarrator,
}

impl LlmNarrator {
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("NARRATOR_API_KEY").ok()?;
        let api_base =
            env::var("NARRATOR_API_BASE").unwrap_or_else(|_| "https://api.x.ai/v1".to_string());
        let model = env::var("NARRATOR_MODEL").unwrap_or_else(|_| "grok-2-latest".to_string());
        Some(Self {
            client: reqwest::Client::new(),
            api_key,
            api_base,
            model,
            fallback: TemplateNarrator,
        })
    }

    async fn complete(&self, driver: &str, risk: f64) -> Result<String, CollaboratorError> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: 0.3,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!(
                        "Primary driver: {}\nDecline risk: {:.0}/100",
                        feature_label(driver),
                        risk
                    ),
                },
            ],
        };

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|err| CollaboratorError::Request {
                service: "narrator",
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status {
                service: "narrator",
                status: status.as_u16(),
                detail: detail.trim().to_string(),
            });
        }

        let body: ChatResponse = response.json().await.map_err(|err| CollaboratorError::Decode {
            service: "narrator",
            message: err.to_string(),
        })?;

        let content = body
            .choices
            .first()
            .map(|choice| choice.message.content.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(CollaboratorError::Decode {
                service: "narrator",
                message: "response missing content".to_string(),
            });
        }
        Ok(content)
    }
}

#[async_trait]
impl TextGenerator for LlmNarrator {
    async fn generate(&self, driver: &str, risk: f64) -> Result<String, CollaboratorError> {
        match self.complete(driver, risk).await {
            Ok(text) => Ok(text),
            Err(err) => {
                warn!(error = %err, driver, "narrator call failed, using template text");
                Ok(self.fallback.narrate(driver, risk))
            }
        }
    }

    fn feature_explanation(&self, feature: &str) -> Option<String> {
        self.fallback.feature_explanation(feature)
    }
}

#[async_trait]
impl ActionRecommender for LlmNarrator {
    async fn recommend(&self, driver: &str) -> Result<String, CollaboratorError> {
        self.fallback.recommend(driver).await
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

fn system_prompt() -> String {
    let prompt = r#"You explain engagement decline risk for social video trends.
Given the primary driver and a 0-100 decline risk, reply with two plain sentences:
- first, state the risk level (LOW, MEDIUM or HIGH) and the score;
- second, explain how the driver is affecting engagement.
No markdown, no lists, no more than 60 words."#;
    prompt.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn template_text_names_level_and_driver() {
        let narrator = TemplateNarrator;
        let text = narrator.generate("fatigue_keyword_ratio", 82.4).await.unwrap();
        assert_eq!(
            text,
            "Decline risk is HIGH (82%). Comments increasingly mention boredom or overexposure."
        );

        let text = narrator.generate("view_velocity", 50.0).await.unwrap();
        assert_eq!(text, "Decline risk is MEDIUM (50%). View Velocity is the main factor.");
    }

    #[test]
    fn risk_level_follows_bucket_boundaries() {
        assert_eq!(risk_level(34.9), "LOW");
        assert_eq!(risk_level(35.0), "MEDIUM");
        assert_eq!(risk_level(75.0), "MEDIUM");
        assert_eq!(risk_level(75.1), "HIGH");
    }

    #[tokio::test]
    async fn template_actions_cover_sentinel_and_unknowns() {
        let narrator = TemplateNarrator;
        assert_eq!(
            narrator.recommend(STABLE_DRIVER).await.unwrap(),
            "Maintain current strategy"
        );
        assert_eq!(narrator.recommend("unknown").await.unwrap(), DEFAULT_ACTION);
    }

    #[test]
    fn feature_notes_only_for_known_features() {
        let narrator = TemplateNarrator;
        assert!(narrator.feature_explanation("trend_age").is_some());
        assert!(narrator.feature_explanation("unknown").is_none());
    }
}
