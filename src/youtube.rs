use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::collaborators::{CollaboratorError, VideoComment, VideoMetadata, VideoPlatform};
use crate::config::YoutubeConfig;

const SERVICE: &str = "YouTube API";

#[derive(Clone)]
pub struct YoutubeClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    comment_limit: u32,
}

/// Outcome of probing the configured API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCheck {
    Missing,
    Placeholder,
    Active { sample_title: Option<String> },
    Rejected {
        status: u16,
        message: String,
        reason: String,
    },
}

impl YoutubeClient {
    pub fn from_env(config: &YoutubeConfig) -> Result<Option<Self>, String> {
        let api_key = match api_key_from_env() {
            Some(key) if !is_placeholder(&key) => key,
            _ => return Ok(None),
        };
        Self::new(config, api_key).map(Some)
    }

    pub fn new(config: &YoutubeConfig, api_key: String) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| format!("failed to build YouTube client: {}", err))?;
        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            api_key,
            comment_limit: config.comment_limit,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CollaboratorError> {
        let response = self
            .client
            .get(format!("{}/{}", self.api_base.trim_end_matches('/'), path))
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|err| CollaboratorError::Request {
                service: SERVICE,
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorEnvelope>(&error_body)
                .ok()
                .and_then(|envelope| envelope.error)
                .and_then(|error| error.message)
                .unwrap_or_else(|| error_body.trim().to_string());
            return Err(CollaboratorError::Status {
                service: SERVICE,
                status: status.as_u16(),
                detail,
            });
        }

        response.json().await.map_err(|err| CollaboratorError::Decode {
            service: SERVICE,
            message: err.to_string(),
        })
    }

    pub async fn check_key(config: &YoutubeConfig) -> Result<KeyCheck, String> {
        let api_key = match api_key_from_env() {
            None => return Ok(KeyCheck::Missing),
            Some(key) if is_placeholder(&key) => return Ok(KeyCheck::Placeholder),
            Some(key) => key,
        };
        let client = Self::new(config, api_key)?;

        let response = client
            .client
            .get(format!("{}/videos", client.api_base.trim_end_matches('/')))
            .query(&[
                ("part", "snippet"),
                ("chart", "mostPopular"),
                ("maxResults", "1"),
                ("key", client.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|err| format!("request failed: {}", err))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.is_success() {
            let sample_title = serde_json::from_str::<VideoListResponse>(&body)
                .ok()
                .and_then(|list| list.items.into_iter().next())
                .and_then(|item| item.snippet)
                .and_then(|snippet| snippet.title);
            return Ok(KeyCheck::Active { sample_title });
        }

        let error = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .and_then(|envelope| envelope.error);
        let message = error
            .as_ref()
            .and_then(|error| error.message.clone())
            .unwrap_or_else(|| "Unknown Error".to_string());
        let reason = error
            .and_then(|error| error.errors.into_iter().next())
            .and_then(|detail| detail.reason)
            .unwrap_or_else(|| "N/A".to_string());
        Ok(KeyCheck::Rejected {
            status: status.as_u16(),
            message,
            reason,
        })
    }
}

#[async_trait]
impl VideoPlatform for YoutubeClient {
    async fn metadata(&self, video_id: &str) -> Result<Option<VideoMetadata>, CollaboratorError> {
        let body: VideoListResponse = self
            .get(
                "videos",
                &[
                    ("part", "snippet,statistics".to_string()),
                    ("id", video_id.to_string()),
                ],
            )
            .await?;
        Ok(body.items.into_iter().next().map(VideoMetadata::from))
    }

    async fn comments(&self, video_id: &str) -> Result<Vec<VideoComment>, CollaboratorError> {
        let body: CommentThreadResponse = self
            .get(
                "commentThreads",
                &[
                    ("part", "snippet".to_string()),
                    ("videoId", video_id.to_string()),
                    ("maxResults", self.comment_limit.to_string()),
                    ("order", "relevance".to_string()),
                    ("textFormat", "plainText".to_string()),
                ],
            )
            .await?;
        Ok(body
            .items
            .into_iter()
            .filter_map(|thread| thread.snippet)
            .filter_map(|snippet| snippet.top_level_comment)
            .filter_map(|comment| comment.snippet)
            .map(VideoComment::from)
            .collect())
    }
}

fn api_key_from_env() -> Option<String> {
    env::var("YOUTUBE_API_KEY")
        .ok()
        .map(|value| decode_key(value.trim().to_string()))
        .filter(|value| !value.is_empty())
}

fn is_placeholder(key: &str) -> bool {
    key.contains("your_")
}

fn decode_key(value: String) -> String {
    if value.contains('%') {
        match urlencoding::decode(&value) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => value,
        }
    } else {
        value
    }
}

fn parse_count(value: Option<String>) -> Option<u64> {
    value.and_then(|raw| raw.parse::<u64>().ok())
}

impl From<VideoItem> for VideoMetadata {
    fn from(item: VideoItem) -> Self {
        let snippet = item.snippet.unwrap_or_default();
        let statistics = item.statistics.unwrap_or_default();
        Self {
            video_id: item.id,
            title: snippet.title,
            channel_title: snippet.channel_title,
            published_at: snippet.published_at,
            tags: snippet.tags.unwrap_or_default(),
            view_count: parse_count(statistics.view_count),
            like_count: parse_count(statistics.like_count),
            comment_count: parse_count(statistics.comment_count),
        }
    }
}

impl From<CommentSnippet> for VideoComment {
    fn from(snippet: CommentSnippet) -> Self {
        Self {
            author: snippet.author_display_name.unwrap_or_default(),
            text: snippet
                .text_original
                .or(snippet.text_display)
                .unwrap_or_default(),
            like_count: snippet.like_count.unwrap_or(0),
            published_at: snippet.published_at,
        }
    }
}

#[derive(Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Deserialize)]
struct VideoItem {
    id: String,
    snippet: Option<VideoSnippet>,
    statistics: Option<VideoStatistics>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: Option<String>,
    channel_title: Option<String>,
    published_at: Option<String>,
    tags: Option<Vec<String>>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Deserialize)]
struct CommentThreadResponse {
    #[serde(default)]
    items: Vec<CommentThread>,
}

#[derive(Deserialize)]
struct CommentThread {
    snippet: Option<CommentThreadSnippet>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: Option<TopLevelComment>,
}

#[derive(Deserialize)]
struct TopLevelComment {
    snippet: Option<CommentSnippet>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    author_display_name: Option<String>,
    text_display: Option<String>,
    text_original: Option<String>,
    like_count: Option<u64>,
    published_at: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    reason: Option<String>,
}
