use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use secrecy::Secret;
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

const APP_ENVIRONMENT: &str = "APP_ENVIRONMENT";
const ENV_PREFIX: &str = "APP";
const ENV_SEPARATOR: &str = "__";
const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
const RESOURCES_DIR: &str = "resources";
const ANY_ORIGIN: &str = "*";

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "weather", version, about = "Current weather lookup service")]
pub struct CliOptions {
    /// Explicit configuration file, layered over the resources defaults.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Secrets file (e.g., holding `provider.api_key`), layered over the configuration.
    #[arg(short, long)]
    pub secrets: Option<PathBuf>,

    /// Selects `resources/<environment>` overrides.
    #[arg(short, long, env = APP_ENVIRONMENT)]
    pub environment: Option<String>,
}

impl CliOptions {
    pub const fn env_app_environment() -> &'static str {
        APP_ENVIRONMENT
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api: HttpApiSettings,
    pub provider: ProviderSettings,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpApiSettings {
    pub server: HttpServerSettings,

    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,

    #[serde(default)]
    pub cors: CorsSettings,
}

/// Browser origins allowed to call the API. `*` allows any origin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self { allowed_origins: vec![ANY_ORIGIN.to_string()] }
    }
}

impl CorsSettings {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty()
            || self.allowed_origins.iter().any(|origin| origin == ANY_ORIGIN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpServerSettings {
    pub host: String,
    pub port: u16,
}

impl HttpServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    pub base_url: Url,
    pub api_key: Secret<String>,

    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
}

impl Settings {
    #[tracing::instrument(level = "debug")]
    pub fn load(options: &CliOptions) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("api.server.host", "0.0.0.0")?
            .set_default("api.server.port", 5000)?
            .set_default("api.timeout", 30)?
            .set_default("api.cors.allowed_origins", vec![ANY_ORIGIN])?
            .set_default("provider.base_url", "https://api.openweathermap.org")?
            .set_default("provider.timeout", 10)?
            .add_source(File::with_name(&format!("{RESOURCES_DIR}/application")).required(false));

        if let Some(environment) = options.environment.as_deref() {
            tracing::info!("loading {environment} environment overrides");
            builder = builder.add_source(
                File::with_name(&format!("{RESOURCES_DIR}/{environment}")).required(false),
            );
        }

        if let Some(config) = options.config.as_deref() {
            builder = builder.add_source(File::from(config));
        }

        if let Some(secrets) = options.secrets.as_deref() {
            builder = builder.add_source(File::from(secrets));
        }

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .set_override_option("provider.api_key", std::env::var(API_KEY_ENV).ok())?
            .build()?
            .try_deserialize()
    }
}
