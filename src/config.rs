//! Configuration management for smart-ats

use crate::error::{Result, SmartAtsError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub retry: RetryConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Gemini model identifier, e.g. `gemini-1.5-flash`
    pub name: String,
    pub endpoint: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color_output: bool,
    pub show_tips: bool,
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
    Html,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig {
                name: "gemini-1.5-flash".to_string(),
                endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
                api_key_env: "GOOGLE_API_KEY".to_string(),
                timeout_secs: 60,
            },
            retry: RetryConfig {
                max_attempts: 3,
                delay_ms: 2000,
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                color_output: true,
                show_tips: true,
                debug: false,
            },
        }
    }
}

impl RetryConfig {
    /// Attempts are never fewer than one, whatever the file says.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    /// A missing file is created with the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| SmartAtsError::Configuration(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| SmartAtsError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("smart-ats")
            .join("config.toml")
    }

    /// Set a single value addressed as `section.key`.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "model.name" => self.model.name = non_empty(key, value)?,
            "model.endpoint" => self.model.endpoint = non_empty(key, value)?,
            "model.api_key_env" => self.model.api_key_env = non_empty(key, value)?,
            "model.timeout_secs" => self.model.timeout_secs = parse_value(key, value)?,
            "retry.max_attempts" => {
                let attempts: u32 = parse_value(key, value)?;
                if attempts == 0 {
                    return Err(SmartAtsError::Configuration(
                        "retry.max_attempts must be at least 1".to_string(),
                    ));
                }
                self.retry.max_attempts = attempts;
            }
            "retry.delay_ms" => self.retry.delay_ms = parse_value(key, value)?,
            "output.format" => {
                self.output.format = crate::cli::parse_output_format(value)
                    .map_err(SmartAtsError::Configuration)?;
            }
            "output.color_output" => self.output.color_output = parse_value(key, value)?,
            "output.show_tips" => self.output.show_tips = parse_value(key, value)?,
            "output.debug" => self.output.debug = parse_value(key, value)?,
            _ => {
                return Err(SmartAtsError::Configuration(format!("Unknown configuration key: {}", key)));
            }
        }
        Ok(())
    }
}

fn non_empty(key: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SmartAtsError::Configuration(format!("{} cannot be empty", key)));
    }
    Ok(value.to_string())
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| SmartAtsError::Configuration(format!("Invalid value '{}' for {}: {}", value, key, e)))
}
