use std::env;
use std::env::current_dir;
use std::fmt::Display;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::ApiCredential;
use crate::newsletter_client::NewsletterClient;

/// Env var holding the provider token. Takes precedence over
/// `newsletter_api.api_key` in the yaml files.
pub const API_KEY_ENV_VAR: &str = "BUTTONDOWN_API_KEY";

/// Global configuration, loaded from `configuration/*.yaml`. See
/// `get_configuration`.
#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub newsletter_api: NewsletterApiSettings,
}

/// Server configuration
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    /// Should be localhost on dev machine, 0.0.0.0 on prod
    pub host: String,

    /// 0 lets the OS pick a port (used by tests)
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

/// Newsletter provider (Buttondown) configuration
#[derive(Deserialize, Clone)]
pub struct NewsletterApiSettings {
    pub base_url: String,

    /// Optional so that the server still starts without it; every subscribe
    /// request is then answered with a 500 until it is set.
    #[serde(default)]
    pub api_key: Option<Secret<String>>,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,

    /// Tag used when the form does not send a `source`
    pub default_tag: String,
}

impl NewsletterApiSettings {
    /// `None` if the key is unset or blank
    pub fn credential(&self) -> Option<ApiCredential> {
        self.api_key.as_ref().and_then(ApiCredential::parse)
    }

    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn client(&self) -> Result<NewsletterClient, reqwest::Error> {
        NewsletterClient::new(self.base_url.clone(), self.timeout())
    }
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!(
                "{e} is not a supported environment. Use either `local` or `production`"
            )),
        }
    }
}

/// Load yaml configuration files at `<project_root>/configuration`, then
/// `APP_`-prefixed env vars, then `BUTTONDOWN_API_KEY`.
///
/// Apart from the API key, all fields must be present, otherwise the server
/// will not start.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let cfg_dir = current_dir()
        .map_err(|e| ConfigError::Message(format!("could not get current dir: {e}")))?
        .join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".to_string())
        .try_into()
        .map_err(ConfigError::Message)?;

    let settings = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        // env vars are -always- strings, hence `serde-aux` for numeric fields
        //
        // `APP_APPLICATION__PORT=5001` -> `Settings.application.port`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override_option("newsletter_api.api_key", env::var(API_KEY_ENV_VAR).ok())?
        .build()?;

    settings.try_deserialize::<Settings>()
}
