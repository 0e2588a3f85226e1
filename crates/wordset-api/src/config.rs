use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;
use wordset_ai::OpenAiConfig;
use wordset_db::DatabaseConfig;
use wordset_service::FillConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub openai: OpenAiSettings,
    pub fill: FillSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub port: u16,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FillSettings {
    pub deadline_secs: u64,
    pub finalize_timeout_secs: u64,
    pub max_in_flight: usize,
}

impl AppConfig {
    /// Defaults, then an optional `wordset.toml`, then `WORDSET__*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::with_name("wordset").required(false))
            .add_source(
                Environment::with_prefix("WORDSET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let database = DatabaseConfig::default();
        let openai = OpenAiConfig::new("");
        let fill = FillConfig::default();

        Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.request_timeout_secs", 10)?
            .set_default("database.url", database.url)?
            .set_default("database.max_connections", database.max_connections as i64)?
            .set_default("openai.model", openai.model)?
            .set_default("openai.api_url", openai.api_url)?
            .set_default("openai.max_tokens", openai.max_tokens as i64)?
            .set_default("fill.deadline_secs", fill.deadline.as_secs() as i64)?
            .set_default(
                "fill.finalize_timeout_secs",
                fill.finalize_timeout.as_secs() as i64,
            )?
            .set_default("fill.max_in_flight", fill.max_in_flight as i64)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
        }
    }

    /// OpenAI client settings, or `None` when no API key is configured
    pub fn openai_config(&self) -> Option<OpenAiConfig> {
        let api_key = self.openai.api_key.as_deref().filter(|key| !key.is_empty())?;

        let mut config = OpenAiConfig::new(api_key);
        config.model = self.openai.model.clone();
        config.api_url = self.openai.api_url.clone();
        config.max_tokens = self.openai.max_tokens;
        Some(config)
    }

    pub fn fill_config(&self) -> FillConfig {
        FillConfig {
            deadline: Duration::from_secs(self.fill.deadline_secs),
            finalize_timeout: Duration::from_secs(self.fill.finalize_timeout_secs),
            max_in_flight: self.fill.max_in_flight,
        }
    }
}
