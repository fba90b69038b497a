use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

use crate::normalizer::CanonicalResponse;
use crate::{TopicRequest, TrendAnalyzer, DEFAULT_TIME_WINDOW};

#[derive(Clone)]
struct AppState {
    analyzer: Arc<TrendAnalyzer>,
}

#[derive(Debug, Deserialize)]
pub struct ApiAnalyzeRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub topic: Option<String>,
    #[serde(rename = "timeWindow", default, deserialize_with = "lenient_text")]
    pub time_window: Option<String>,
}

/// Accepts any JSON value. Strings pass through, `null` reads as absent and
/// everything else is kept as its JSON text, so `123` becomes `"123"`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

impl ApiAnalyzeRequest {
    pub fn into_request(self) -> TopicRequest {
        TopicRequest::new(self.topic.unwrap_or_default()).with_time_window(
            self.time_window
                .filter(|window| !window.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TIME_WINDOW.to_string()),
        )
    }
}

#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub web_root: Option<String>,
}

pub fn router(analyzer: Arc<TrendAnalyzer>, web_root: Option<&str>) -> Router {
    let state = AppState { analyzer };

    let app = Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze_handler))
        .with_state(state);

    let app = match web_root {
        Some(web_root) => {
            let index_path = format!("{}/index.html", web_root.trim_end_matches('/'));
            let static_service =
                ServeDir::new(web_root).not_found_service(ServeFile::new(index_path));
            app.fallback_service(static_service)
        }
        None => app,
    };

    app.layer(CorsLayer::permissive())
}

pub async fn serve(options: ServeOptions, analyzer: Arc<TrendAnalyzer>) -> Result<(), String> {
    let app = router(analyzer, options.web_root.as_deref());

    let addr: SocketAddr = format!("{}:{}", options.host, options.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| format!("failed to bind server: {}", err))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .await
        .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn analyze_handler(
    State(state): State<AppState>,
    Json(request): Json<ApiAnalyzeRequest>,
) -> Json<CanonicalResponse> {
    let request = request.into_request();
    Json(state.analyzer.analyze(&request).await)
}
