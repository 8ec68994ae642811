use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use scribe_llm::{OutputMode, ProviderConfig};

#[derive(Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    pub llm: LlmConfig,
    pub prompt: PromptConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub llm_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on the time to first response byte. Streaming bodies are
    /// not cut off by it.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    #[serde(default)]
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptConfig {
    /// Markdown file holding the system prompt, read once at startup
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub mode: OutputMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. Built-in defaults
    /// 2. config/default.toml
    /// 3. config/{ENV}.toml (if ENV is set)
    /// 4. SCRIBE__-prefixed environment variables (e.g. SCRIBE__OUTPUT__MODE=typed)
    /// 5. LLM_URL and LLM_MODEL_ID
    ///
    /// LLM_API_KEY is read from the environment only.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000_i64)?
            .set_default("llm.base_url", "https://api.openai.com/v1")?
            .set_default("prompt.path", "prompts/system.md")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("SCRIBE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("llm.base_url", std::env::var("LLM_URL").ok())?
            .set_override_option("llm.model", std::env::var("LLM_MODEL_ID").ok())?;

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        cfg.llm_api_key = std::env::var("LLM_API_KEY").map_err(|_| {
            ConfigError::Message("LLM_API_KEY environment variable is required".to_string())
        })?;

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        builder.build()?.try_deserialize()
    }

    pub fn provider(&self) -> ProviderConfig {
        let provider = ProviderConfig::new(
            self.llm.base_url.clone(),
            self.llm.model.clone(),
            self.llm_api_key.clone(),
        );

        match self.llm.connect_timeout_secs {
            Some(secs) => provider.with_connect_timeout(secs),
            None => provider,
        }
    }

    pub fn load_system_prompt(&self) -> Result<String, ConfigError> {
        let path = &self.prompt.path;
        let prompt = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Message(format!("Failed to read system prompt {}: {}", path.display(), e))
        })?;

        if prompt.trim().is_empty() {
            return Err(ConfigError::Message(format!(
                "System prompt {} is empty",
                path.display()
            )));
        }

        Ok(prompt)
    }
}
