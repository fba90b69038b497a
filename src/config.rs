use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub delay_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { delay_ms: 1500 }
    }
}

impl SimulationConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelServiceConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_ms: u64,
}

impl Default for ModelServiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://localhost:8100".to_string(),
            timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    pub api_base: String,
    pub comment_limit: u32,
    pub timeout_ms: u64,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            comment_limit: 100,
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationMode {
    Template,
    Llm,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    pub mode: String,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            mode: "template".to_string(),
        }
    }
}

impl NarrationConfig {
    pub fn to_mode(&self) -> NarrationMode {
        match self.mode.to_lowercase().as_str() {
            "llm" => NarrationMode::Llm,
            _ => NarrationMode::Template,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub simulation: SimulationConfig,
    pub model_service: ModelServiceConfig,
    pub youtube: YoutubeConfig,
    pub narration: NarrationConfig,
}

impl AnalyzerConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), String> {
        let config_path = path.or_else(default_config_path);
        let mut config = if let Some(path) = config_path.as_ref() {
            if path.exists() {
                Self::read(path)?
            } else {
                AnalyzerConfig::default()
            }
        } else {
            AnalyzerConfig::default()
        };

        config.apply_env_overrides();
        Ok((config, config_path))
    }

    pub fn read(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|err| format!("failed to read config: {}", err))?;
        toml::from_str(&contents).map_err(|err| format!("failed to parse config: {}", err))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(delay) = env::var("SIMULATION_DELAY_MS") {
            if let Ok(value) = delay.parse::<u64>() {
                self.simulation.delay_ms = value;
            }
        }
        if let Ok(enabled) = env::var("MODEL_SERVICE_ENABLED") {
            if let Ok(value) = enabled.parse::<bool>() {
                self.model_service.enabled = value;
            }
        }
        if let Ok(endpoint) = env::var("MODEL_SERVICE_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                self.model_service.endpoint = endpoint;
            }
        }
        if let Ok(timeout) = env::var("MODEL_SERVICE_TIMEOUT_MS") {
            if let Ok(value) = timeout.parse::<u64>() {
                self.model_service.timeout_ms = value;
            }
        }
        if let Ok(api_base) = env::var("YOUTUBE_API_BASE") {
            if !api_base.trim().is_empty() {
                self.youtube.api_base = api_base;
            }
        }
        if let Ok(mode) = env::var("NARRATION_MODE") {
            if !mode.trim().is_empty() {
                self.narration.mode = mode;
            }
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    env::var("TREND_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/analyzer.toml")))
}
