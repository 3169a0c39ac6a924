use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ai::{gemini, hosted};
use crate::context::DEFAULT_SUBJECT;
use crate::provider::Provider;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// User settings, stored as JSON under the platform config directory.
///
/// Every field is optional; accessors fill in defaults so an empty file (or
/// none at all) is a valid configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub provider: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub gemini_base_url: Option<String>,
    pub api_base_url: Option<String>,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub context_path: Option<PathBuf>,
    pub subject_name: Option<String>,
    pub greeting: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some(Provider::default().as_str().to_string()),
            ..Self::default()
        }
    }

    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::get_config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Invalid config file {:?}", path))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Environment variables win over the file, as API keys usually live there
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY").filter(|k| !k.is_empty()) {
            self.gemini_api_key = Some(key);
        }
        if let Some(provider) = lookup("RESUME_CHAT_PROVIDER") {
            self.provider = Some(provider);
        }
        if let Some(url) = lookup("RESUME_CHAT_API_URL") {
            self.api_base_url = Some(url);
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    pub fn log_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("resume-chat.log"))
    }

    fn config_dir() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("resume-chat"))
    }

    pub fn provider(&self) -> Provider {
        match self.provider.as_deref() {
            Some(name) => Provider::parse(name).unwrap_or_else(|| {
                tracing::warn!(provider = name, "Unknown provider in config, using default");
                Provider::default()
            }),
            None => Provider::default(),
        }
    }

    pub fn gemini_api_key(&self) -> Option<&str> {
        self.gemini_api_key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn gemini_model(&self) -> String {
        self.gemini_model
            .clone()
            .unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string())
    }

    pub fn gemini_base_url(&self) -> String {
        self.gemini_base_url
            .clone()
            .unwrap_or_else(|| gemini::DEFAULT_BASE_URL.to_string())
    }

    pub fn api_base_url(&self) -> String {
        self.api_base_url
            .clone()
            .unwrap_or_else(|| hosted::DEFAULT_BASE_URL.to_string())
    }

    pub fn temperature(&self) -> f64 {
        self.temperature.unwrap_or(gemini::DEFAULT_TEMPERATURE)
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
            .unwrap_or(gemini::DEFAULT_MAX_OUTPUT_TOKENS)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1))
    }

    pub fn subject_name(&self) -> String {
        self.subject_name
            .clone()
            .unwrap_or_else(|| DEFAULT_SUBJECT.to_string())
    }

    pub fn greeting(&self) -> String {
        self.greeting.clone().unwrap_or_else(|| {
            format!(
                "👋 Hi! I'm an AI assistant for {}. I can answer questions about experience, skills, \
                 projects, and background. What would you like to know?",
                self.subject_name()
            )
        })
    }

    /// Copy safe to print: the API key is reduced to its last four characters
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        masked.gemini_api_key = self.gemini_api_key.as_ref().map(|key| {
            let tail: String = key
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("****{}", tail)
        });
        masked
    }
}
