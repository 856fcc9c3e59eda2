#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};

use crate::utils::error::{Result, UiError};
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_DELAY_MS: u64 = 200;
pub const MAX_TIMEOUT_DELAY_MS: u64 = 10_000;

fn default_timeout_delay_ms() -> u64 {
    DEFAULT_TIMEOUT_DELAY_MS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub client: ClientSection,
    #[serde(default)]
    pub auth: AuthSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSection {
    pub base_url: String,
    #[serde(default = "default_timeout_delay_ms")]
    pub timeout_delay_ms: u64,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSection {
    pub token: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: ClientSection {
                base_url: base_url.into(),
                timeout_delay_ms: DEFAULT_TIMEOUT_DELAY_MS,
                user_agent: None,
            },
            auth: AuthSection::default(),
        }
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(UiError::IoError)?;
        Self::from_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| UiError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換 ${VAR} 形式的環境變數，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| UiError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn timeout_delay(&self) -> Duration {
        Duration::from_millis(self.client.timeout_delay_ms)
    }

    /// Configured token, ignoring blanks and placeholders whose variable was not set.
    pub fn token(&self) -> Option<&str> {
        self.auth
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && !(t.starts_with("${") && t.ends_with('}')))
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> Result<()> {
        validate_url("client.base_url", &self.client.base_url)?;
        validate_range(
            "client.timeout_delay_ms",
            self.client.timeout_delay_ms,
            0,
            MAX_TIMEOUT_DELAY_MS,
        )?;
        if let Some(agent) = &self.client.user_agent {
            validate_non_empty_string("client.user_agent", agent)?;
        }
        Ok(())
    }
}
