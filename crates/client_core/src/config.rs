use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_CHAT_URL: &str = "http://127.0.0.1:8501";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);
pub const DEFAULT_FEEDBACK_TTL: Duration = Duration::from_millis(3000);
pub const CONFIG_FILE_NAME: &str = "caregiver.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field} '{value}': {source}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        source: url::ParseError,
    },
    #[error("{field} must use http or https, got '{value}'")]
    UnsupportedScheme { field: &'static str, value: String },
    #[error("failed to parse {path}: {source}")]
    File {
        path: String,
        source: toml::de::Error,
    },
}

/// Connection settings shared by every screen-level controller.
///
/// Built once at startup and handed out behind an `Arc`; nothing in the crate
/// keeps its own copy of the server address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: Url,
    pub chat_url: Url,
    pub poll_interval: Duration,
    pub feedback_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            chat_url: Url::parse(DEFAULT_CHAT_URL).expect("default chat url is valid"),
            poll_interval: DEFAULT_POLL_INTERVAL,
            feedback_ttl: DEFAULT_FEEDBACK_TTL,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_http_url("base_url", raw)?;
        Ok(self)
    }

    pub fn with_chat_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.chat_url = parse_http_url("chat_url", raw)?;
        Ok(self)
    }

    /// Resolves a hub route below `base_url`, keeping any path prefix the base
    /// carries (`http://host/api` + `data` -> `http://host/api/data`).
    pub fn endpoint(&self, route: &str) -> Result<Url, url::ParseError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(route.trim_start_matches('/'))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ClientConfigFile {
    base_url: Option<String>,
    chat_url: Option<String>,
    poll_interval_ms: Option<u64>,
    feedback_ttl_ms: Option<u64>,
}

/// Defaults, then `caregiver.toml` in the working directory, then
/// `AID4ALL_*` environment variables.
pub fn load_client_config() -> Result<ClientConfig, ConfigError> {
    load_client_config_from(Path::new(CONFIG_FILE_NAME), |key| std::env::var(key).ok())
}

pub fn load_client_config_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientConfig, ConfigError> {
    let mut config = ClientConfig::default();

    if let Ok(raw) = fs::read_to_string(path) {
        let file_cfg: ClientConfigFile =
            toml::from_str(&raw).map_err(|source| ConfigError::File {
                path: path.display().to_string(),
                source,
            })?;
        if let Some(v) = file_cfg.base_url {
            config = config.with_base_url(&v)?;
        }
        if let Some(v) = file_cfg.chat_url {
            config = config.with_chat_url(&v)?;
        }
        match file_cfg.poll_interval_ms {
            Some(0) => warn!(path = %path.display(), "ignoring poll_interval_ms = 0"),
            Some(ms) => config.poll_interval = Duration::from_millis(ms),
            None => {}
        }
        if let Some(ms) = file_cfg.feedback_ttl_ms {
            config.feedback_ttl = Duration::from_millis(ms);
        }
    }

    if let Some(v) = env("AID4ALL_BASE_URL") {
        config = config.with_base_url(&v)?;
    }
    if let Some(v) = env("AID4ALL_CHAT_URL") {
        config = config.with_chat_url(&v)?;
    }
    if let Some(v) = env("AID4ALL_POLL_INTERVAL_MS") {
        match v.parse::<u64>() {
            Ok(ms) if ms > 0 => config.poll_interval = Duration::from_millis(ms),
            _ => warn!(value = %v, "ignoring invalid AID4ALL_POLL_INTERVAL_MS"),
        }
    }
    if let Some(v) = env("AID4ALL_FEEDBACK_TTL_MS") {
        match v.parse::<u64>() {
            Ok(ms) => config.feedback_ttl = Duration::from_millis(ms),
            Err(_) => warn!(value = %v, "ignoring invalid AID4ALL_FEEDBACK_TTL_MS"),
        }
    }

    Ok(config)
}

fn parse_http_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        field,
        value: raw.to_string(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme {
            field,
            value: raw.to_string(),
        });
    }
    Ok(url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
