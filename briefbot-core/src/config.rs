//! Configuration system for Briefbot.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> explicit config file -> environment.
//! Configuration is loaded from `~/.config/briefbot/config.toml` and/or
//! `.briefbot/config.toml` in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::channels::email::EmailConfig;
use crate::channels::telegram::TelegramConfig;
use crate::error::ConfigError;

/// Conventional environment variable names and the settings they populate.
pub const CONVENTIONAL_ENV_VARS: &[(&str, &str)] = &[
    ("TELEGRAM_TOKEN", "telegram.bot_token"),
    ("SERPAPI_API_KEY", "search.api_key"),
    ("GEMINI_API_KEY", "llm.api_key"),
    ("EMAIL_USER", "email.username"),
    ("EMAIL_PASSWORD", "email.password"),
];

const REDACTED: &str = "********";

/// Top-level configuration for the bot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    pub telegram: TelegramConfig,
    pub search: SearchConfig,
    pub llm: LlmConfig,
    pub email: EmailConfig,
    pub report: ReportConfig,
}

/// Configuration for the web search provider (SerpAPI).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub api_key: String,
    pub endpoint: String,
    /// SerpAPI engine name.
    pub engine: String,
    /// Number of results fed to the summarizer.
    pub result_limit: usize,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://serpapi.com/search".to_string(),
            engine: "google".to_string(),
            result_limit: 3,
            timeout_secs: 30,
        }
    }
}

/// Configuration for the summarization model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    /// Gemini API root; an empty value also selects the public endpoint.
    #[serde(default)]
    pub base_url: String,
    pub timeout_secs: u64,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-1.5-flash".to_string(),
            base_url: crate::providers::gemini::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 60,
            temperature: 0.3,
        }
    }
}

/// Configuration for PDF report rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory holding the TrueType font family. When unset, common
    /// system font directories are tried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_dir: Option<PathBuf>,
    /// Font family base name, e.g. `LiberationSans` for `LiberationSans-Regular.ttf`.
    pub font_family: String,
    pub filename: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            font_dir: None,
            font_family: "LiberationSans".to_string(),
            filename: crate::types::Report::DEFAULT_FILENAME.to_string(),
        }
    }
}

impl BotConfig {
    /// Check that every required setting is present.
    ///
    /// The bot must not start polling when this fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("telegram.bot_token", &self.telegram.bot_token),
            ("search.api_key", &self.search.api_key),
            ("llm.api_key", &self.llm.api_key),
            ("email.username", &self.email.username),
            ("email.password", &self.email.password),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ConfigError::MissingField {
                field: field.to_string(),
            });
        }

        if self.search.result_limit == 0 {
            return Err(ConfigError::Invalid {
                message: "search.result_limit must be at least 1".to_string(),
            });
        }
        if self.email.smtp_host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "email.smtp_host must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Copy with every secret masked, for display.
    pub fn redacted(&self) -> Self {
        fn mask(value: &str) -> String {
            if value.is_empty() {
                String::new()
            } else {
                REDACTED.to_string()
            }
        }

        let mut copy = self.clone();
        copy.telegram.bot_token = mask(&self.telegram.bot_token);
        copy.search.api_key = mask(&self.search.api_key);
        copy.llm.api_key = mask(&self.llm.api_key);
        copy.email.password = mask(&self.email.password);
        copy
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }
}

/// Path of the user-level config file, if a config directory can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "briefbot", "briefbot")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Conventional environment variables (`TELEGRAM_TOKEN`, `GEMINI_API_KEY`, ...)
/// 2. Environment variables prefixed with `BRIEFBOT_` (`BRIEFBOT_LLM__MODEL`)
/// 3. Explicit config file (`--config`)
/// 4. Workspace-local config (`.briefbot/config.toml`)
/// 5. User config (`~/.config/briefbot/config.toml`)
/// 6. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
) -> Result<BotConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(BotConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".briefbot").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = config_file {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment
        .merge(Env::prefixed("BRIEFBOT_").split("__"))
        .merge(Env::raw().filter_map(|key| {
            let key = key.as_str().to_ascii_uppercase();
            CONVENTIONAL_ENV_VARS
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, path)| (*path).into())
        }));

    figment.extract().map_err(Box::new)
}
