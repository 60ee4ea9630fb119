use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Settings for log output and trace export.
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP gRPC collector (e.g. http://localhost:4317). Export is disabled when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

/// Layered configuration sources shared by every binary in the workspace.
///
/// Precedence, lowest first: defaults set by the caller, an optional
/// `<file_stem>.{yaml,toml,json}` in the working directory, then `APP_`
/// prefixed environment variables using `__` as the nesting separator
/// (`APP_API__BASE_URL` maps to `api.base_url`). A `.env` file is loaded first
/// so its values participate as environment variables.
pub fn builder(file_stem: &str) -> ConfigBuilder<DefaultState> {
    dotenvy::dotenv().ok();

    Config::builder()
        .add_source(File::with_name(file_stem).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
}
