use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::PaperfetchError;

pub const DEFAULT_CONFIG_FILE: &str = "paperfetch.json";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub download_dir: String,
    pub max_sentences: Option<usize>,
    pub llm: LlmConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: "datasets".to_string(),
            max_sentences: None,
            llm: LlmConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    /// Name of the environment variable the API key is read from.
    pub api_key_env: String,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            api_key_env: "PAPERFETCH_API_KEY".to_string(),
            max_retries: 3,
            retry_delay_ms: 2000,
            timeout_secs: 60,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Resolve the effective config. An explicitly given path must exist;
    /// the default `paperfetch.json` is optional and its absence means
    /// built-in defaults.
    pub fn resolve(path: Option<&str>) -> Result<Config, PaperfetchError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| PaperfetchError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| PaperfetchError::ConfigParse(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.download_dir, "datasets");
        assert_eq!(config.llm.max_retries, 3);
        assert!(config.max_sentences.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"download_dir": "data", "llm": {"model": "qwen2"}}"#).unwrap();
        assert_eq!(config.download_dir, "data");
        assert_eq!(config.llm.model, "qwen2");
        assert_eq!(config.llm.max_retries, 3);
    }
}
