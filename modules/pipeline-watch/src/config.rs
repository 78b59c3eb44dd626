use std::env;
use std::str::FromStr;
use std::time::Duration;

use pipeline_client::ApiConfig;
use tracing::info;

use crate::error::{Result, WatchError};

/// Log output format, selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(WatchError::Config(format!(
                "LOG_FORMAT must be 'text' or 'json', got '{other}'"
            ))),
        }
    }
}

/// Watcher configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Pipeline API
    pub api_url: String,
    pub api_key: String,
    pub http_timeout: Duration,

    // Logging
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let http_timeout_secs: u64 = match lookup("PIPELINE_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                WatchError::Config(format!(
                    "PIPELINE_HTTP_TIMEOUT_SECS must be a number, got '{raw}'"
                ))
            })?,
            None => 30,
        };
        if http_timeout_secs == 0 {
            return Err(WatchError::Config(
                "PIPELINE_HTTP_TIMEOUT_SECS must be positive".into(),
            ));
        }

        Ok(Self {
            api_url: required(&lookup, "PIPELINE_API_URL")?,
            api_key: required(&lookup, "PIPELINE_API_KEY")?,
            http_timeout: Duration::from_secs(http_timeout_secs),
            log_format: lookup("LOG_FORMAT")
                .map(|raw| raw.parse::<LogFormat>())
                .transpose()?
                .unwrap_or_default(),
        })
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(&self.api_url, &self.api_key).with_timeout(self.http_timeout)
    }

    /// Log the effective config without leaking the API key.
    pub fn log_redacted(&self) {
        info!(
            api_url = self.api_url.as_str(),
            api_key = redact(&self.api_key).as_str(),
            http_timeout_secs = self.http_timeout.as_secs(),
            log_format = ?self.log_format,
            "Loaded config"
        );
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(WatchError::Config(format!(
            "{key} environment variable is required"
        ))),
    }
}

fn redact(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}
