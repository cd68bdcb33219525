use tracing::{info, warn};

use crate::{ApiError, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8010";
pub const API_URL_ENV: &str = "ONG_RADAR_API_URL";

/// Where and how to reach the organization backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Scheme and authority, without a trailing slash.
    pub base_url: String,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            user_agent: concat!("ong-radar/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ApiConfig {
    pub fn builder() -> ApiConfigBuilder {
        ApiConfigBuilder::new()
    }

    /// Defaults, with the base url taken from `ONG_RADAR_API_URL` when set.
    pub fn from_env() -> Result<Self> {
        match std::env::var(API_URL_ENV) {
            Ok(url) => {
                info!(url, "Using backend url from {API_URL_ENV}");
                ApiConfigBuilder::new().base_url(url).build()
            }
            Err(_) => {
                warn!("{API_URL_ENV} not set, using default: {DEFAULT_API_URL}");
                Ok(Self::default())
            }
        }
    }

    pub fn search_url(&self) -> String {
        format!("{}/ongs/search", self.base_url)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiConfigBuilder {
    config: ApiConfig,
}

impl ApiConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    pub fn build(self) -> Result<ApiConfig> {
        let url = &self.config.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://"))
            || url.split("://").nth(1).is_none_or(str::is_empty)
        {
            return Err(ApiError::InvalidBaseUrl(url.clone()));
        }
        Ok(self.config)
    }
}
