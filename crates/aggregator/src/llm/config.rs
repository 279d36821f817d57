use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: ProviderConfig,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProviderConfig {
    #[serde(rename = "openai")]
    OpenAi {
        model: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        api_key: Option<String>, // If not provided, use OPENAI_API_KEY env var
    },
}

fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    16_000
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_timeout_seconds() -> u64 {
    120
}
fn default_concurrent_requests() -> usize {
    4
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::OpenAi {
                model: "gpt-4o".to_string(),
                api_key: None,
            },
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            retry_attempts: default_retry_attempts(),
            timeout_seconds: default_timeout_seconds(),
            concurrent_requests: default_concurrent_requests(),
        }
    }
}

impl LlmConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(model) = std::env::var("KASANE_LLM_MODEL") {
            let ProviderConfig::OpenAi { model: ref mut m, .. } = config.provider;
            *m = model;
        }

        if let Ok(temp) = std::env::var("KASANE_LLM_TEMPERATURE") {
            if let Ok(t) = temp.parse::<f32>() {
                config.temperature = t;
            }
        }

        if let Ok(timeout) = std::env::var("KASANE_LLM_TIMEOUT") {
            if let Ok(t) = timeout.parse::<u64>() {
                config.timeout_seconds = t;
            }
        }

        Ok(config)
    }

    pub fn save_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

pub const EXAMPLE_CONFIG: &str = r#"
# LLM configuration

provider:
  type: openai
  model: gpt-4o
  # api_key: sk-...  # Optional, defaults to OPENAI_API_KEY env var

temperature: 0.2
max_tokens: 16000
retry_attempts: 3
timeout_seconds: 120
concurrent_requests: 4
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LlmConfig::default();
        assert!(matches!(config.provider, ProviderConfig::OpenAi { .. }));
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.concurrent_requests, 4);
    }

    #[test]
    fn test_example_config_parses() {
        let config: LlmConfig = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        let ProviderConfig::OpenAi { model, .. } = config.provider;
        assert_eq!(model, "gpt-4o");
    }

    #[test]
    fn test_config_round_trip() {
        let config = LlmConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: LlmConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.max_tokens, parsed.max_tokens);
    }
}
