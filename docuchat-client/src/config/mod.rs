use client_core::config::{self as core_config, TelemetrySettings};
use client_core::error::ClientError;
use config::builder::{ConfigBuilder, DefaultState};
use serde::Deserialize;
use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// Environment variable holding the API base URL.
pub const API_URL_ENV: &str = "DOCUCHAT_API_URL";

const CONFIG_FILE: &str = "docuchat";

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub api: ApiSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    /// Base URL every endpoint path is appended to, e.g. http://localhost:8000/api/v1.
    pub base_url: String,
    pub poll_interval_ms: u64,
    /// Pause between observing `completed` and switching to chat.
    pub ready_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            poll_interval_ms: 2000,
            ready_delay_ms: 500,
            request_timeout_secs: 30,
        }
    }
}

impl ApiSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn ready_delay(&self) -> Duration {
        Duration::from_millis(self.ready_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> Result<(), ClientError> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            ClientError::ConfigError(anyhow::anyhow!(
                "Invalid API base URL '{}': {}",
                self.base_url,
                e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::ConfigError(anyhow::anyhow!(
                "API base URL must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(ClientError::ConfigError(anyhow::anyhow!(
                "api.poll_interval_ms must be greater than zero"
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ClientError::ConfigError(anyhow::anyhow!(
                "api.request_timeout_secs must be greater than zero"
            )));
        }
        Ok(())
    }
}

impl ClientConfig {
    pub fn load() -> Result<Self, ClientError> {
        Self::from_builder(core_config::builder(CONFIG_FILE), env::var(API_URL_ENV).ok())
    }

    /// Resolve settings from `builder`, applying defaults underneath and the
    /// explicit API URL override on top.
    pub fn from_builder(
        builder: ConfigBuilder<DefaultState>,
        api_url: Option<String>,
    ) -> Result<Self, ClientError> {
        let defaults = ApiSettings::default();

        let mut builder = builder
            .set_default("api.base_url", defaults.base_url)?
            .set_default("api.poll_interval_ms", defaults.poll_interval_ms as i64)?
            .set_default("api.ready_delay_ms", defaults.ready_delay_ms as i64)?
            .set_default("api.request_timeout_secs", defaults.request_timeout_secs as i64)?;

        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            builder = builder.set_override("api.base_url", url)?;
        }

        let settings = builder.build()?.try_deserialize::<ClientConfig>()?;
        settings.api.validate()?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    #[test]
    fn test_defaults() {
        let settings = ClientConfig::from_builder(Config::builder(), None).unwrap();
        assert_eq!(settings.api.base_url, DEFAULT_API_URL);
        assert_eq!(settings.api.poll_interval(), Duration::from_millis(2000));
        assert_eq!(settings.api.ready_delay(), Duration::from_millis(500));
        assert_eq!(settings.telemetry.log_level, "warn");
    }

    #[test]
    fn test_file_values_and_url_override() {
        let builder = Config::builder().add_source(File::from_str(
            "api:\n  base_url: http://files.example:9000/api/v1\n  poll_interval_ms: 250\n",
            FileFormat::Yaml,
        ));

        let settings = ClientConfig::from_builder(
            builder,
            Some("https://docuchat.example.com/api/v1".to_string()),
        )
        .unwrap();

        assert_eq!(settings.api.base_url, "https://docuchat.example.com/api/v1");
        assert_eq!(settings.api.poll_interval_ms, 250);
        assert_eq!(settings.api.ready_delay_ms, 500);
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let settings =
            ClientConfig::from_builder(Config::builder(), Some("  ".to_string())).unwrap();
        assert_eq!(settings.api.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = ClientConfig::from_builder(Config::builder(), Some("not a url".to_string()));
        assert!(matches!(result, Err(ClientError::ConfigError(_))));

        let result =
            ClientConfig::from_builder(Config::builder(), Some("ftp://example.com".to_string()));
        assert!(matches!(result, Err(ClientError::ConfigError(_))));
    }

    #[test]
    fn test_zero_durations_rejected() {
        let zero_timeout = Config::builder().add_source(File::from_str(
            "api:\n  request_timeout_secs: 0\n",
            FileFormat::Yaml,
        ));
        let result = ClientConfig::from_builder(zero_timeout, None);
        assert!(matches!(result, Err(ClientError::ConfigError(_))));

        let zero_interval = Config::builder().add_source(File::from_str(
            "api:\n  poll_interval_ms: 0\n",
            FileFormat::Yaml,
        ));
        let result = ClientConfig::from_builder(zero_interval, None);
        assert!(matches!(result, Err(ClientError::ConfigError(_))));
    }
}
