use std::path::Path;
use std::time::Duration;
use serde::Deserialize;
use log::{info, warn};
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    OpenAI,
    Sample,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub provider: Option<AiProvider>,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl AiConfig {
    /// Provider actually used: an explicit choice wins, otherwise OpenAI when a key is present.
    pub fn effective_provider(&self) -> AiProvider {
        match (self.provider, self.api_key()) {
            (Some(AiProvider::OpenAI), None) => {
                warn!("OpenAI provider selected but no API key found - falling back to sample questions");
                AiProvider::Sample
            }
            (Some(provider), _) => provider,
            (None, Some(_)) => AiProvider::OpenAI,
            (None, None) => AiProvider::Sample,
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterviewSettings {
    pub tick_millis: u64,
}

impl InterviewSettings {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub ai: AiConfig,
    pub interview: InterviewSettings,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ai: AiConfig {
                provider: None,
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4".to_string(),
                timeout_secs: 30,
            },
            interview: InterviewSettings { tick_millis: 1000 },
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then `interview.toml` (or `path`) if present, then `INTERVIEW__*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Don't fail if .env doesn't exist

        let defaults = AppConfig::default();
        let file_source = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("interview").required(false),
        };

        let mut loaded: AppConfig = Config::builder()
            .set_default("ai.base_url", defaults.ai.base_url)?
            .set_default("ai.model", defaults.ai.model)?
            .set_default("ai.timeout_secs", defaults.ai.timeout_secs)?
            .set_default("interview.tick_millis", defaults.interview.tick_millis)?
            .set_default("log_level", defaults.log_level)?
            .add_source(file_source)
            .add_source(Environment::with_prefix("INTERVIEW").separator("__"))
            .build()?
            .try_deserialize()?;

        if loaded.ai.api_key().is_none() {
            loaded.ai.api_key = std::env::var("OPENAI_API_KEY").ok();
        }

        Ok(loaded)
    }

    pub fn summary(&self) -> String {
        format!(
            "provider: {:?}, model: {}, tick: {}ms, api key: {}",
            self.ai.effective_provider(),
            self.ai.model,
            self.interview.tick_millis,
            if self.ai.api_key().is_some() { "set" } else { "not set" }
        )
    }

    /// Logs the effective settings. Call once a logger is installed.
    pub fn log_summary(&self) {
        info!("Configuration loaded ({})", self.summary());
    }
}
