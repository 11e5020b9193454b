//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::errors::ConfigError;

/// Placeholder replaced with the sender's name in the apology message
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Whether the config was read from disk or fell back to defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    Defaults,
}

/// Bot configuration. Built once at startup, then shared read-only.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub telegram: TelegramConfig,
    pub grpc: GrpcConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    /// Deadline for handling a single chat update
    pub timeout_seconds: u64,
    /// Long-poll wait passed to getUpdates
    pub poll_timeout_seconds: u64,
    pub messages: BotMessages,
}

/// Fixed notices shown to chat participants
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotMessages {
    pub panic: String,
    pub unknown_command: String,
    pub group_chat: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TelegramConfig {
    pub api_url: String,
    /// Name of the environment variable holding the bot token
    pub token_env: String,
    /// Fallback file holding the bot token
    pub token_file: PathBuf,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GrpcConfig {
    pub listener: String,
    /// Deadline for a single RPC, separate from the update deadline
    pub timeout_seconds: u64,
    pub mode: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for the rolling log file; stdout only when unset
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "bidoof-bot".to_string(),
            timeout_seconds: 10,
            poll_timeout_seconds: 30,
            messages: BotMessages::default(),
        }
    }
}

impl Default for BotMessages {
    fn default() -> Self {
        Self {
            panic: "Sorry {name}, Bidoof tripped over something. Please try again later.".to_string(),
            unknown_command: "Bidoof does not know that command.".to_string(),
            group_chat: "Bidoof only talks in private chats.".to_string(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.telegram.org".to_string(),
            token_env: "TELEGRAM_BOT_TOKEN".to_string(),
            token_file: PathBuf::from(".telegram-token"),
            request_timeout_seconds: 10,
        }
    }
}

impl Default for GrpcConfig {
    fn default() -> Self {
        Self {
            listener: "127.0.0.1:50051".to_string(),
            timeout_seconds: 10,
            mode: "development".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("bidoof-bot.db"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "bidoof-bot.log".to_string(),
        }
    }
}

impl BotConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl BotMessages {
    pub fn apology_for(&self, name: &str) -> String {
        self.panic.replace(NAME_PLACEHOLDER, name)
    }
}

impl TelegramConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Token from the configured env var, else from the token file with line breaks stripped.
    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        if let Ok(token) = std::env::var(&self.token_env) {
            let token = token.trim().to_string();
            if !token.is_empty() {
                return Ok(token);
            }
        }

        match std::fs::read_to_string(&self.token_file) {
            Ok(content) => {
                let token = content.replace(['\n', '\r'], "");
                if token.is_empty() {
                    Err(ConfigError::MissingField(format!(
                        "bot token ({} is empty)",
                        self.token_file.display()
                    )))
                } else {
                    Ok(token)
                }
            }
            Err(_) => Err(ConfigError::MissingField(format!(
                "bot token (set {} or create {})",
                self.token_env,
                self.token_file.display()
            ))),
        }
    }
}

impl GrpcConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn is_production(&self) -> bool {
        self.mode == "production"
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when it exists, otherwise start from defaults; env overrides apply either way.
    ///
    /// Runs before logging is installed, so the caller reports the source.
    pub fn load_or_default(path: impl Into<PathBuf>) -> Result<(Self, ConfigSource), ConfigError> {
        let path = path.into();
        let (config, source) = if path.exists() {
            (Self::load(&path)?, ConfigSource::File)
        } else {
            (Config::default(), ConfigSource::Defaults)
        };
        let config = config.with_env_overrides();
        config.validate()?;
        Ok((config, source))
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var("BIDOOF_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }

        if let Ok(listener) = std::env::var("BIDOOF_GRPC_LISTENER") {
            self.grpc.listener = listener;
        }

        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue("bot.timeout-seconds must be > 0".to_string()));
        }
        if self.grpc.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue("grpc.timeout-seconds must be > 0".to_string()));
        }
        if self.telegram.token_env.is_empty() {
            return Err(ConfigError::MissingField("telegram.token-env".to_string()));
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }
}
