use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;

/// Runtime configuration, built once at startup and passed into the agent.
/// Environment variables provide defaults; an optional JSON file overrides
/// them field by field.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub agent_name: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub memory_file: String,
    pub max_memory_entries: usize,
    pub api_key: String,
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FileOverrides {
    #[serde(default)]
    agent_name: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    max_tokens: Option<u32>,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    memory_file: Option<String>,
    #[serde(default)]
    max_memory_entries: Option<usize>,
    #[serde(default)]
    openai_api_key: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
}

impl AgentConfig {
    pub fn load(config_file: Option<&Path>) -> Result<Self, AppError> {
        let mut config = Self {
            agent_name: env_or("AGENT_NAME", "AIAssistant"),
            model: env_or("AGENT_MODEL", "gpt-4o-mini"),
            max_tokens: env_parsed("MAX_TOKENS", 2000)?,
            temperature: env_parsed("TEMPERATURE", 0.7)?,
            memory_file: env_or("MEMORY_FILE", "agent_memory.json"),
            max_memory_entries: env_parsed("MAX_MEMORY_ENTRIES", 100)?,
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            base_url: std::env::var("OPENAI_BASE_URL").ok().filter(|s| !s.trim().is_empty()),
        };

        if let Some(path) = config_file {
            let text = std::fs::read_to_string(path)
                .map_err(|e| AppError::Message(format!("Cannot read config file {}: {e}", path.display())))?;
            let overrides: FileOverrides = serde_json::from_str(&text)
                .map_err(|e| AppError::Message(format!("Invalid config file {}: {e}", path.display())))?;
            config.apply(overrides);
        }

        Ok(config)
    }

    fn apply(&mut self, overrides: FileOverrides) {
        if let Some(v) = overrides.agent_name {
            self.agent_name = v;
        }
        if let Some(v) = overrides.model {
            self.model = v;
        }
        if let Some(v) = overrides.max_tokens {
            self.max_tokens = v;
        }
        if let Some(v) = overrides.temperature {
            self.temperature = v;
        }
        if let Some(v) = overrides.memory_file {
            self.memory_file = v;
        }
        if let Some(v) = overrides.max_memory_entries {
            self.max_memory_entries = v;
        }
        if let Some(v) = overrides.openai_api_key {
            self.api_key = v;
        }
        if let Some(v) = overrides.base_url {
            self.base_url = Some(v);
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).ok().filter(|s| !s.is_empty()).unwrap_or_else(|| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Message(format!("Invalid value for {key}: {e}"))),
        _ => Ok(default),
    }
}
