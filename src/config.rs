use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

/// Environment variables that must be present and non-empty at startup.
pub const REQUIRED_VARS: &[&str] = &[
    "APP_ENV",
    "PORT",
    "MONGO_URI",
    "MONGO_DATABASE",
    "JWT_SECRET",
    "JWT_REFRESH_SECRET",
    "ADMIN_SECRET",
    "DISCORD_SECRET",
    "MISTRAL_API_KEY",
    "MISTRAL_AGENT_ID",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Variable {0} is not defined")]
    Missing(String),

    #[error("Variable {0} is empty")]
    Empty(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}

/// Server configuration read from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// `development` exposes internal error details in responses.
    pub app_env: String,
    pub port: u16,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    /// Signup secret that grants the admin role.
    pub admin_secret: String,
    /// Shared secret the Discord bot sends in the `discord_secret` header.
    pub discord_secret: String,
    pub mistral_api_key: String,
    pub mistral_agent_id: String,
    #[serde(default = "default_mistral_api_url")]
    pub mistral_api_url: String,
}

fn default_mistral_api_url() -> String {
    "https://api.mistral.ai".to_string()
}

impl AppConfig {
    /// Build the config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Build the config from explicit key/value pairs (useful for testing).
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();

        for key in REQUIRED_VARS {
            match vars.get(*key) {
                None => return Err(ConfigError::Missing(key.to_string())),
                Some(value) if value.trim().is_empty() => {
                    return Err(ConfigError::Empty(key.to_string()))
                }
                Some(_) => {}
            }
        }

        if vars["PORT"].trim().parse::<u16>().is_err() {
            return Err(ConfigError::Invalid("Variable PORT is not a number".into()));
        }

        let settings = config::Config::builder()
            .add_source(config::Environment::default().source(Some(vars)))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("development")
    }
}
