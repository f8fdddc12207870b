//! ReviewBot configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main ReviewBot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Homework status API
    pub api: ApiConfig,

    /// Telegram delivery
    pub telegram: TelegramConfig,

    /// Poll loop settings
    pub poll: PollConfig,

    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .reviewbot.yml
        let local_config = PathBuf::from(".reviewbot.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/reviewbot/reviewbot.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("reviewbot").join("reviewbot.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Homework status API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Status endpoint URL
    pub endpoint: String,

    /// Environment variable containing the OAuth token
    #[serde(rename = "token-env")]
    pub token_env: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://practicum.yandex.ru/api/user_api/homework_statuses/".to_string(),
            token_env: "PRACTICUM_TOKEN".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Telegram Bot API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable containing the bot token
    #[serde(rename = "token-env")]
    pub token_env: String,

    /// Environment variable containing the destination chat id
    #[serde(rename = "chat-id-env")]
    pub chat_id_env: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.telegram.org".to_string(),
            token_env: "TELEGRAM_TOKEN".to_string(),
            chat_id_env: "TELEGRAM_CHAT_ID".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl TelegramConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Poll loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds to sleep between cycles
    #[serde(rename = "interval-secs")]
    pub interval_secs: u64,

    /// Forward failed cycles to the chat
    #[serde(rename = "notify-errors")]
    pub notify_errors: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 600,
            notify_errors: true,
        }
    }
}

impl PollConfig {
    /// Get the poll interval as a Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Credentials read once from the environment at startup
#[derive(Clone)]
pub struct Secrets {
    pub api_token: String,
    pub telegram_token: String,
    pub chat_id: String,
}

impl Secrets {
    /// Read all three secrets, failing with every missing variable named
    pub fn from_env(config: &Config) -> Result<Self> {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let api_token = read(&config.api.token_env);
        let telegram_token = read(&config.telegram.token_env);
        let chat_id = read(&config.telegram.chat_id_env);

        match (api_token, telegram_token, chat_id) {
            (Some(api_token), Some(telegram_token), Some(chat_id)) => Ok(Self {
                api_token,
                telegram_token,
                chat_id,
            }),
            (a, t, c) => {
                let missing: Vec<&str> = [
                    (a.is_none(), config.api.token_env.as_str()),
                    (t.is_none(), config.telegram.token_env.as_str()),
                    (c.is_none(), config.telegram.chat_id_env.as_str()),
                ]
                .into_iter()
                .filter_map(|(absent, name)| absent.then_some(name))
                .collect();
                Err(eyre::eyre!(
                    "Missing required environment variables: {}",
                    missing.join(", ")
                ))
            }
        }
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("api_token", &mask(&self.api_token))
            .field("telegram_token", &mask(&self.telegram_token))
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Hide all but the last four characters of a secret
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}
