use crate::feed::LikeErrorPolicy;
use serde::Deserialize;
use std::{num::NonZeroU32, time::Duration};
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const ENV_PREFIX: &str = "STORYFEED_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
}

/// Client settings, read from `STORYFEED_`-prefixed environment variables.
#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
pub struct ClientConfig {
    pub api_base_url: Url,
    #[serde(default = "default_page_size")]
    pub page_size: NonZeroU32,
    #[serde(default)]
    pub like_error_policy: LikeErrorPolicy,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_page_size() -> NonZeroU32 {
    NonZeroU32::new(10).unwrap_or(NonZeroU32::MIN)
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Loads `.env` if there is one, then reads the environment.
pub fn load() -> Result<ClientConfig, ConfigError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .env file found");
        } else {
            return Err(e.into());
        }
    }

    envy::prefixed(ENV_PREFIX)
        .from_env()
        .map_err(ConfigError::from)
}
